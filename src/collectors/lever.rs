use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, encode_segment, extract, http, invalid,
    parse_url, path_segments,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

const API_BASE: &str = "https://api.lever.co/v0/postings";

pub struct Lever;

#[async_trait]
impl JobCollector for Lever {
    fn platform(&self) -> Platform {
        Platform::Lever
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let site = parse_url(entry.require_url()?)?;
        // https://jobs.lever.co/tahoebio-ai/ -> "tahoebio-ai"
        let account = path_segments(&site)
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| invalid(&site, "no account in path"))?;
        let endpoint = parse_url(&format!(
            "{API_BASE}/{}?mode=json",
            encode_segment(&account)
        ))?;
        Ok(Locator {
            board: account,
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
        parse_postings(&data, locator)
    }
}

/// Lever answers with a bare JSON array of postings.
fn parse_postings(data: &Value, locator: &Locator) -> Result<Vec<CollectedJob>, FetchError> {
    let postings = data
        .as_array()
        .ok_or_else(|| FetchError::Malformed("expected a list of postings".to_string()))?;
    Ok(postings
        .iter()
        .filter_map(|posting| parse_posting(posting, locator))
        .collect())
}

fn parse_posting(posting: &Value, locator: &Locator) -> Option<CollectedJob> {
    let job_id = extract::text(posting, &["id", "postingId", "text"])?;
    collected(
        Platform::Lever,
        locator,
        job_id,
        extract::text(posting, &["text", "title"]),
        extract::location(
            posting,
            &["categories.location", "categories.allLocations", "location"],
        ),
        extract::text(posting, &["hostedUrl", "applyUrl"]),
    )
}
