use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, extract, first_host_label, http, parse_url,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry, non_empty};

pub struct BambooHr;

#[async_trait]
impl JobCollector for BambooHr {
    fn platform(&self) -> Platform {
        Platform::BambooHr
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let subdomain = match non_empty(entry.subdomain.as_deref()) {
            Some(sub) => sub.to_string(),
            // https://acme.bamboohr.com/careers -> "acme"
            None => {
                let raw = non_empty(entry.url.as_deref())
                    .ok_or(ConfigError::MissingField { field: "subdomain" })?;
                let url = parse_url(raw)?;
                first_host_label(&url)
                    .ok_or(ConfigError::MissingField { field: "subdomain" })?
                    .to_string()
            }
        };
        let site = parse_url(&format!("https://{subdomain}.bamboohr.com/"))?;
        Ok(Locator {
            endpoint: site.join("careers/list?format=json").map_err(|e| {
                ConfigError::InvalidUrl {
                    url: site.to_string(),
                    reason: e.to_string(),
                }
            })?,
            site,
            board: subdomain,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let data = http::json(client.get(locator.endpoint.clone())).await?;
        parse_listing(&data, locator)
    }
}

/// The listing is a bare array on some tenants and wrapped in `result` or
/// `jobs` on others.
fn parse_listing(data: &Value, locator: &Locator) -> Result<Vec<CollectedJob>, FetchError> {
    let jobs = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => extract::array(data, &["jobs", "result"])
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => return Err(FetchError::Malformed("unexpected listing shape".to_string())),
    };
    Ok(jobs
        .iter()
        .filter(|job| job.is_object())
        .filter_map(|job| parse_job(job, locator))
        .collect())
}

fn parse_job(job: &Value, locator: &Locator) -> Option<CollectedJob> {
    let id = extract::text(job, &["id", "jobId", "jobOpeningId", "job_id"]);
    let title = extract::text(job, &["jobOpeningName", "title"]);
    let url = match extract::text(job, &["url", "jobOpeningUrl", "jobUrl"]) {
        Some(link) => extract::absolute_url(&locator.site, &link),
        None => id
            .as_deref()
            .and_then(|id| extract::absolute_url(&locator.site, &format!("/careers/{id}"))),
    };
    let job_id = id.or_else(|| url.clone()).or_else(|| title.clone())?;
    collected(
        Platform::BambooHr,
        locator,
        job_id,
        title,
        extract::location(job, &["location", "locationName", "atsLocation"]),
        url,
    )
}
