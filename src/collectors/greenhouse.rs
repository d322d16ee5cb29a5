use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, encode_segment, extract, http, invalid,
    parse_url, path_segments,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry, non_empty};

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

pub struct Greenhouse;

#[async_trait]
impl JobCollector for Greenhouse {
    fn platform(&self) -> Platform {
        Platform::Greenhouse
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let raw = non_empty(entry.greenhouse_url.as_deref())
            .or_else(|| non_empty(entry.url.as_deref()))
            .ok_or(ConfigError::MissingField {
                field: "greenhouse_url",
            })?;
        let site = parse_url(raw)?;
        // https://job-boards.greenhouse.io/cellarity -> "cellarity"
        let token = path_segments(&site)
            .last()
            .map(|s| s.to_string())
            .ok_or_else(|| invalid(&site, "no board token in path"))?;
        let endpoint = parse_url(&format!("{API_BASE}/{}/jobs", encode_segment(&token)))?;
        Ok(Locator {
            board: token,
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
    let jobs = extract::array(data, &["jobs"])
        .ok_or_else(|| FetchError::Malformed("missing 'jobs' array".to_string()))?;
    Ok(jobs.iter().filter_map(|job| parse_job(job, locator)).collect())
}

fn parse_job(job: &Value, locator: &Locator) -> Option<CollectedJob> {
    let url = extract::text(job, &["absolute_url", "url"]);
    let job_id = extract::text(job, &["id", "internal_job_id"]).or_else(|| url.clone())?;
    collected(
        Platform::Greenhouse,
        locator,
        job_id,
        extract::text(job, &["title", "name"]),
        extract::location(job, &["location", "offices"]),
        url.map(|u| absolutize(&locator.site, u)),
    )
}

fn absolutize(site: &Url, link: String) -> String {
    extract::absolute_url(site, &link).unwrap_or(link)
}
