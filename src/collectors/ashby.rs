use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, encode_segment, extract, http, invalid,
    parse_url, path_segments,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

const API_BASE: &str = "https://api.ashbyhq.com/posting-api/job-board";

pub struct Ashby;

#[async_trait]
impl JobCollector for Ashby {
    fn platform(&self) -> Platform {
        Platform::Ashby
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let site = parse_url(entry.require_url()?)?;
        // https://jobs.ashbyhq.com/companyName -> "companyName"
        let board = path_segments(&site)
            .last()
            .map(|s| s.to_string())
            .ok_or_else(|| invalid(&site, "no board name in path"))?;
        let endpoint = parse_url(&format!("{API_BASE}/{}", encode_segment(&board)))?;
        Ok(Locator {
            board,
            endpoint,
            site,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let data = http::json(client.get(locator.endpoint.clone())).await?;
        parse_board(&data, locator)
    }
}

fn parse_board(data: &Value, locator: &Locator) -> Result<Vec<CollectedJob>, FetchError> {
    let jobs = extract::array(data, &["jobs", "jobPostings"])
        .ok_or_else(|| FetchError::Malformed("missing 'jobs' array".to_string()))?;
    Ok(jobs.iter().filter_map(|job| parse_job(job, locator)).collect())
}

fn parse_job(job: &Value, locator: &Locator) -> Option<CollectedJob> {
    let title = extract::text(job, &["title"]);
    let link = extract::text(job, &["applyUrl", "jobUrl"]);
    let location = extract::location(job, &["location", "address.postalAddress"]).or_else(|| {
        job.get("isRemote")
            .and_then(Value::as_bool)
            .filter(|remote| *remote)
            .map(|_| "Remote".to_string())
    });
    collected(
        Platform::Ashby,
        locator,
        derive_id(job, title.as_deref()),
        title,
        location,
        link,
    )
}

/// Ashby does not promise an id on every tenant. Prefer the posting id, then
/// the posting's path segment (skipping the trailing `/application` of apply
/// links), then `title_publishedAt`.
fn derive_id(job: &Value, title: Option<&str>) -> String {
    if let Some(id) = extract::text(job, &["id", "jobId"]) {
        return id;
    }
    let from_link = extract::text(job, &["jobUrl", "applyUrl"])
        .as_deref()
        .and_then(|link| Url::parse(link).ok())
        .and_then(|url| {
            path_segments(&url)
                .into_iter()
                .rev()
                .find(|segment| *segment != "application")
                .map(String::from)
        });
    from_link.unwrap_or_else(|| {
        format!(
            "{}_{}",
            title.unwrap_or_default(),
            extract::text(job, &["publishedAt", "publishedDate"]).unwrap_or_default()
        )
    })
}
