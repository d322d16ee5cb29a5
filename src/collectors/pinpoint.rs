use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::collectors::{CollectedJob, JobCollector, Locator, collected, extract, http, parse_url};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

pub const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 100;

pub struct Pinpoint;

#[async_trait]
impl JobCollector for Pinpoint {
    fn platform(&self) -> Platform {
        Platform::Pinpoint
    }

    /// Accepts either the board root or its `postings.json` feed:
    /// https://acme.pinpointhq.com/postings.json -> base https://acme.pinpointhq.com
    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let raw = entry.require_url()?;
        let base = raw
            .strip_suffix("/postings.json")
            .unwrap_or(raw)
            .trim_end_matches('/');
        let endpoint = if raw.contains("/postings.json") {
            parse_url(raw)?
        } else {
            parse_url(&format!("{base}/postings.json"))?
        };
        Ok(Locator {
            board: base.to_string(),
            endpoint,
            site: parse_url(&format!("{base}/"))?,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let mut jobs = Vec::new();

        for page in 1..=MAX_PAGES {
            let request = client
                .get(locator.endpoint.clone())
                .query(&[("page", page), ("per_page", PAGE_SIZE)]);
            let data = http::json(request).await?;
            let (postings, wrapped) = match &data {
                Value::Object(_) => (
                    extract::array(&data, &["data"])
                        .map(Vec::as_slice)
                        .unwrap_or_default(),
                    true,
                ),
                Value::Array(items) => (items.as_slice(), false),
                _ => return Err(FetchError::Malformed("unexpected postings shape".to_string())),
            };
            if postings.is_empty() {
                break;
            }
            jobs.extend(
                postings
                    .iter()
                    .filter(|p| p.is_object())
                    .filter_map(|p| parse_posting(p, locator)),
            );
            // A bare list carries no pagination; a wrapped page ends when short.
            if !wrapped || postings.len() < PAGE_SIZE {
                break;
            }
        }

        Ok(jobs)
    }
}

fn parse_posting(posting: &Value, locator: &Locator) -> Option<CollectedJob> {
    let id = extract::text(posting, &["id", "uuid"]);
    let url = id
        .as_deref()
        .and_then(|id| extract::absolute_url(&locator.site, &format!("en/postings/{id}")));
    let title = extract::text(posting, &["title", "name"]);
    let job_id = id.or_else(|| url.clone()).or_else(|| title.clone())?;
    collected(
        Platform::Pinpoint,
        locator,
        job_id,
        title,
        extract::location(posting, &["location", "locations"]),
        url,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::collectors::testing;

    #[test]
    fn feed_url_and_board_root_resolve_alike() {
        let feed = Pinpoint
            .resolve_locator(&testing::entry("pinpoint", "https://bighat.pinpointhq.com/postings.json"))
            .unwrap();
        let root = Pinpoint
            .resolve_locator(&testing::entry("pinpoint", "https://bighat.pinpointhq.com/"))
            .unwrap();
        assert_eq!(feed, root);
        assert_eq!(feed.endpoint.as_str(), "https://bighat.pinpointhq.com/postings.json");
        assert_eq!(feed.board, "https://bighat.pinpointhq.com");
    }

    #[test]
    fn builds_posting_urls_and_locations() {
        let loc = testing::locator(
            "https://bighat.pinpointhq.com",
            "https://bighat.pinpointhq.com/postings.json",
            "https://bighat.pinpointhq.com/",
        );
        let posting = json!({
            "id": 812, "title": "Protein Engineer",
            "location": { "city": "San Mateo", "province": "California" }
        });
        let job = parse_posting(&posting, &loc).unwrap();
        assert_eq!(job.job_id, "812");
        assert_eq!(
            job.url.as_deref(),
            Some("https://bighat.pinpointhq.com/en/postings/812")
        );
        assert_eq!(job.location.as_deref(), Some("San Mateo, California"));

        let listed = json!({ "uuid": "u-1", "name": "Scientist", "locations": ["Remote"] });
        let job = parse_posting(&listed, &loc).unwrap();
        assert_eq!(job.location.as_deref(), Some("Remote"));
    }
}
