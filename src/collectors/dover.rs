use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde_json::Value;

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, encode_segment, extract, http, parse_url,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry, non_empty};

const SITE: &str = "https://app.dover.com/";

pub struct Dover;

#[async_trait]
impl JobCollector for Dover {
    fn platform(&self) -> Platform {
        Platform::Dover
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let client_id = non_empty(entry.client_id.as_deref())
            .ok_or(ConfigError::MissingField { field: "client_id" })?;
        let segment = encode_segment(client_id);
        Ok(Locator {
            board: client_id.to_string(),
            endpoint: parse_url(&format!(
                "{SITE}api/v1/job-groups/{segment}/job-groups"
            ))?,
            site: parse_url(SITE)?,
            cookie: non_empty(entry.cf_clearance.as_deref()).map(String::from),
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let mut request = client.get(locator.endpoint.clone());
        if let Some(clearance) = &locator.cookie {
            request = request.header(COOKIE, format!("cf_clearance={clearance}"));
        }
        let data = http::json(request).await?;
        parse_groups(&data, locator)
    }
}

fn parse_groups(data: &Value, locator: &Locator) -> Result<Vec<CollectedJob>, FetchError> {
    let groups = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => extract::array(data, &["jobGroups", "jobs"])
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => return Err(FetchError::Malformed("unexpected job-groups shape".to_string())),
    };

    let mut jobs = Vec::new();
    for group in groups.iter().filter(|g| g.is_object()) {
        match extract::array(group, &["jobs"]).filter(|jobs| !jobs.is_empty()) {
            Some(members) => jobs.extend(
                members
                    .iter()
                    .filter(|job| job.is_object())
                    .filter_map(|job| parse_job(job, locator)),
            ),
            // A group without members may itself be a posting.
            None => jobs.extend(parse_job(group, locator)),
        }
    }
    Ok(jobs)
}

fn parse_job(job: &Value, locator: &Locator) -> Option<CollectedJob> {
    let id = extract::text(job, &["id", "jobId", "job_id"]);
    let title = extract::text(job, &["title", "name", "jobTitle"]);
    let url = match extract::text(job, &["url", "jobUrl", "applyUrl"]) {
        Some(link) => extract::absolute_url(&locator.site, &link),
        None => id
            .as_deref()
            .and_then(|id| extract::absolute_url(&locator.site, &format!("/jobs/{id}"))),
    };
    let job_id = id.or_else(|| url.clone()).or_else(|| title.clone())?;
    collected(
        Platform::Dover,
        locator,
        job_id,
        title,
        extract::location(job, &["location", "locationName", "locations", "city"]),
        url,
    )
}
