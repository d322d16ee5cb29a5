use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, encode_segment, extract, first_host_label,
    http, invalid, parse_url, path_segments,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

const API_BASE: &str = "https://api.smartrecruiters.com/v1/companies";
const PUBLIC_BASE: &str = "https://jobs.smartrecruiters.com";
pub const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 100;

pub struct SmartRecruiters;

#[async_trait]
impl JobCollector for SmartRecruiters {
    fn platform(&self) -> Platform {
        Platform::SmartRecruiters
    }

    /// https://jobs.smartrecruiters.com/Acme -> "Acme";
    /// https://acme.smartrecruiters.com/ -> "acme".
    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let configured = parse_url(entry.require_url()?)?;
        let company = path_segments(&configured)
            .first()
            .copied()
            .or_else(|| first_host_label(&configured))
            .map(String::from)
            .ok_or_else(|| invalid(&configured, "no company identifier"))?;
        let segment = encode_segment(&company);
        Ok(Locator {
            endpoint: parse_url(&format!("{API_BASE}/{segment}/postings"))?,
            site: parse_url(&format!("{PUBLIC_BASE}/{segment}/"))?,
            board: company,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let mut jobs = Vec::new();
        let mut offset = 0;

        for _ in 0..MAX_PAGES {
            let request = client
                .get(locator.endpoint.clone())
                .query(&[("limit", PAGE_SIZE), ("offset", offset)]);
            let data = http::json(request).await?;
            let postings = extract::array(&data, &["content"]).ok_or_else(|| {
                FetchError::Malformed("missing 'content' array".to_string())
            })?;
            if postings.is_empty() {
                break;
            }
            jobs.extend(postings.iter().filter_map(|p| parse_posting(p, locator)));
            // A short page is the last one.
            if postings.len() < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(jobs)
    }
}

fn parse_posting(posting: &Value, locator: &Locator) -> Option<CollectedJob> {
    let job_id = extract::text(posting, &["id", "uuid", "ref"])?;
    let url = extract::text(posting, &["postingUrl", "applyUrl"])
        .or_else(|| extract::absolute_url(&locator.site, &encode_id(&job_id)))
        .or_else(|| extract::text(posting, &["ref"]));
    collected(
        Platform::SmartRecruiters,
        locator,
        job_id,
        extract::text(posting, &["name", "title"]),
        extract::location(posting, &["location"]),
        url,
    )
}

/// Ids that are themselves URLs (the `ref` fallback) must not be joined as paths.
fn encode_id(job_id: &str) -> String {
    if job_id.contains("://") {
        String::new()
    } else {
        encode_segment(job_id)
    }
}
