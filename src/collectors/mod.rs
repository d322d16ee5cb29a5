// Collector module.
// Defines the trait, the platform registry and the runner for job-board collectors.

pub mod ashby;
pub mod avature;
pub mod bamboohr;
pub mod dover;
pub mod extract;
pub mod greenhouse;
pub mod http;
pub mod lever;
pub mod pinpoint;
pub mod polymer;
pub mod runner;
pub mod smartrecruiters;
pub mod workday;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use url::Url;

use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

/// Canonical record every collector produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedJob {
    pub source: Platform,
    pub company: String,
    pub job_id: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Where a collector fetches from, derived from a config entry without any
/// network access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Platform-local board identifier: token, account slug, subdomain, client id.
    pub board: String,
    /// Data endpoint (API URL or listing page).
    pub endpoint: Url,
    /// Public board page. Session bootstrap, Referer, and base for relative links.
    pub site: Url,
    /// Static cookie value sent with every request, if configured.
    pub cookie: Option<String>,
}

/// Trait that all job-board collectors implement.
#[async_trait]
pub trait JobCollector: Send + Sync {
    fn platform(&self) -> Platform;

    /// Turn a configured entry into the locator the platform's API needs.
    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError>;

    /// Fetch every posting on the board. Fails as a whole on transport
    /// errors, non-success statuses and malformed documents.
    async fn collect(&self, client: &Client, locator: &Locator)
    -> Result<Vec<CollectedJob>, FetchError>;
}

/// Maps a platform to its collector.
pub trait CollectorRegistry: Send + Sync {
    fn collector(&self, platform: Platform) -> &dyn JobCollector;
}

/// The collectors shipped with the crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinRegistry;

impl CollectorRegistry for BuiltinRegistry {
    fn collector(&self, platform: Platform) -> &dyn JobCollector {
        match platform {
            Platform::Greenhouse => &greenhouse::Greenhouse,
            Platform::Lever => &lever::Lever,
            Platform::Ashby => &ashby::Ashby,
            Platform::Workday => &workday::Workday,
            Platform::SmartRecruiters => &smartrecruiters::SmartRecruiters,
            Platform::BambooHr => &bamboohr::BambooHr,
            Platform::Dover => &dover::Dover,
            Platform::Polymer => &polymer::Polymer,
            Platform::Pinpoint => &pinpoint::Pinpoint,
            Platform::Avature => &avature::Avature,
        }
    }
}

/// Path segment escaping for board identifiers spliced into API URLs.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Non-empty path segments of a URL, in order.
pub(crate) fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// First label of the host (`acme` in `acme.bamboohr.com`).
pub(crate) fn first_host_label(url: &Url) -> Option<&str> {
    url.host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
}

pub(crate) fn invalid(url: &Url, reason: &str) -> ConfigError {
    ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Build a canonical record, or `None` when there is no usable title.
/// `company` starts as the board identifier; the runner relabels it.
pub(crate) fn collected(
    source: Platform,
    locator: &Locator,
    job_id: String,
    title: Option<String>,
    location: Option<String>,
    url: Option<String>,
) -> Option<CollectedJob> {
    let title = title.filter(|t| !t.trim().is_empty())?;
    Some(CollectedJob {
        source,
        company: locator.board.clone(),
        job_id,
        title: Some(title),
        location,
        url,
    })
}
