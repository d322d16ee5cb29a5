use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Job-board platforms with a built-in collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Greenhouse,
    Lever,
    Ashby,
    Workday,
    SmartRecruiters,
    BambooHr,
    Dover,
    Polymer,
    Pinpoint,
    Avature,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Greenhouse,
        Platform::Lever,
        Platform::Ashby,
        Platform::Workday,
        Platform::SmartRecruiters,
        Platform::BambooHr,
        Platform::Dover,
        Platform::Polymer,
        Platform::Pinpoint,
        Platform::Avature,
    ];

    /// Tag used both in the config `type` field and in the `source` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::Ashby => "ashby",
            Platform::Workday => "workday",
            Platform::SmartRecruiters => "smartrecruiters",
            Platform::BambooHr => "bamboo",
            Platform::Dover => "dover",
            Platform::Polymer => "polymer",
            Platform::Pinpoint => "pinpoint",
            Platform::Avature => "avature",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnsupportedType(s.to_string()))
    }
}

/// One entry of the `companies` list in the YAML config.
///
/// Every field is optional at the serde level so that a bad entry only skips
/// itself; the runner validates what each platform needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceEntry {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub greenhouse_url: Option<String>,
    pub client_id: Option<String>,
    pub cf_clearance: Option<String>,
    pub subdomain: Option<String>,
}

impl SourceEntry {
    /// Friendly company name written into every record from this entry.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown")
    }

    pub fn platform(&self) -> Result<Platform, ConfigError> {
        let kind = self
            .kind
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "type" })?;
        kind.trim().parse()
    }

    /// The configured board URL, or a `MissingField` error naming it.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        non_empty(self.url.as_deref()).ok_or(ConfigError::MissingField { field: "url" })
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_platform_tag() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "icims".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported type 'icims'");
    }

    #[test]
    fn missing_name_falls_back_to_unknown() {
        let entry = SourceEntry {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(entry.display_name(), "Unknown");
    }

    #[test]
    fn missing_type_is_reported() {
        let entry = SourceEntry::default();
        assert!(matches!(
            entry.platform(),
            Err(ConfigError::MissingField { field: "type" })
        ));
    }
}
