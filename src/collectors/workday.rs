use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use serde_json::{Value, json};

use crate::collectors::{
    CollectedJob, JobCollector, Locator, collected, extract, first_host_label, http, invalid,
    parse_url, path_segments,
};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

const PAGE_SIZE: usize = 20;
/// Guards against a server that never returns an empty page.
const MAX_PAGES: usize = 50;

pub struct Workday;

#[async_trait]
impl JobCollector for Workday {
    fn platform(&self) -> Platform {
        Platform::Workday
    }

    /// https://vrtx.wd501.myworkdayjobs.com/vertex_careers
    /// -> https://vrtx.wd501.myworkdayjobs.com/wday/cxs/vrtx/vertex_careers/jobs
    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let site = parse_url(entry.require_url()?)?;
        let tenant = first_host_label(&site)
            .ok_or_else(|| invalid(&site, "no tenant in host"))?
            .to_string();
        let segments: Vec<&str> = path_segments(&site)
            .into_iter()
            .skip_while(|s| is_locale(s))
            .collect();
        if segments.is_empty() {
            return Err(invalid(&site, "no career site in path"));
        }
        let career_site = segments.join("/");
        let mut endpoint = site.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        endpoint.set_path(&format!("/wday/cxs/{tenant}/{career_site}/jobs"));
        Ok(Locator {
            board: format!("{tenant}/{career_site}"),
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
        // The CXS API rejects calls without the session cookies set by the
        // public careers page.
        http::touch(client.get(locator.site.clone())).await?;

        let origin = locator.site.origin().ascii_serialization();
        let mut jobs = Vec::new();
        let mut offset = 0;
        let mut total = None;

        for _ in 0..MAX_PAGES {
            let payload = json!({
                "appliedFacets": {},
                "limit": PAGE_SIZE,
                "offset": offset,
                "searchText": "",
            });
            let request = client
                .post(locator.endpoint.clone())
                .header(ACCEPT, "application/json")
                .header(ORIGIN, &origin)
                .header(REFERER, locator.site.as_str())
                .json(&payload);
            let data = http::json(request).await?;
            let page = parse_page(&data, locator)?;
            if page.count == 0 {
                break;
            }
            // Workday reports the total on the first page only.
            total = total.or(page.total.filter(|t| *t > 0));
            jobs.extend(page.jobs);
            offset += PAGE_SIZE;
            if total.is_some_and(|t| offset as u64 >= t) {
                break;
            }
        }

        tracing::debug!("workday {}: {} postings", locator.board, jobs.len());
        Ok(jobs)
    }
}

struct Page {
    jobs: Vec<CollectedJob>,
    count: usize,
    total: Option<u64>,
}

fn parse_page(data: &Value, locator: &Locator) -> Result<Page, FetchError> {
    if !data.is_object() {
        return Err(FetchError::Malformed("expected a JSON object".to_string()));
    }
    let postings = extract::array(data, &["jobPostings", "items", "postings"])
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(Page {
        jobs: postings
            .iter()
            .filter_map(|p| parse_posting(p, locator))
            .collect(),
        count: postings.len(),
        total: data.get("total").and_then(Value::as_u64),
    })
}

fn parse_posting(posting: &Value, locator: &Locator) -> Option<CollectedJob> {
    let title = extract::text(posting, &["title", "jobTitle"]);
    // externalPath is usually relative: /job/Boston-MA/Scientist_REQ-123
    let path = extract::text(posting, &["externalPath", "url"]);
    let job_id = extract::text(posting, &["id", "jobReqId"])
        .or_else(|| path.clone())
        .or_else(|| title.clone())?;
    let url = path.map(|p| {
        if p.starts_with('/') {
            extract::absolute_url(&locator.site, &p).unwrap_or(p)
        } else {
            p
        }
    });
    collected(
        Platform::Workday,
        locator,
        job_id,
        title,
        extract::location(posting, &["locationsText", "location"]),
        url,
    )
}

fn is_locale(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'-'
        && bytes[..2].iter().all(u8::is_ascii_lowercase)
        && bytes[3..].iter().all(u8::is_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing;

    #[test]
    fn builds_cxs_endpoint() {
        let entry = testing::entry("workday", "https://vrtx.wd501.myworkdayjobs.com/vertex_careers");
        let loc = Workday.resolve_locator(&entry).unwrap();
        assert_eq!(
            loc.endpoint.as_str(),
            "https://vrtx.wd501.myworkdayjobs.com/wday/cxs/vrtx/vertex_careers/jobs"
        );
        assert_eq!(loc.board, "vrtx/vertex_careers");
        assert_eq!(loc.site.as_str(), "https://vrtx.wd501.myworkdayjobs.com/vertex_careers");
    }

    #[test]
    fn locale_prefix_is_skipped() {
        let entry = testing::entry(
            "workday",
            "https://acme.wd1.myworkdayjobs.com/en-US/External?q=x",
        );
        let loc = Workday.resolve_locator(&entry).unwrap();
        assert_eq!(
            loc.endpoint.as_str(),
            "https://acme.wd1.myworkdayjobs.com/wday/cxs/acme/External/jobs"
        );
    }

    #[test]
    fn host_only_url_is_invalid() {
        let entry = testing::entry("workday", "https://acme.wd1.myworkdayjobs.com/");
        assert!(Workday.resolve_locator(&entry).is_err());
    }

    #[test]
    fn relative_paths_become_absolute_and_serve_as_id() {
        let loc = testing::locator(
            "acme/External",
            "https://acme.wd1.myworkdayjobs.com/wday/cxs/acme/External/jobs",
            "https://acme.wd1.myworkdayjobs.com/External",
        );
        let data = serde_json::json!({
            "total": 2,
            "jobPostings": [
                { "title": "Scientist", "locationsText": "Boston, MA",
                  "externalPath": "/job/Boston-MA/Scientist_R-1" },
                { "title": "Engineer", "locationsText": "2 Locations",
                  "externalPath": "/job/Remote/Engineer_R-2", "jobReqId": "R-2" }
            ]
        });
        let page = parse_page(&data, &loc).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.total, Some(2));
        assert_eq!(page.jobs[0].job_id, "/job/Boston-MA/Scientist_R-1");
        assert_eq!(
            page.jobs[0].url.as_deref(),
            Some("https://acme.wd1.myworkdayjobs.com/job/Boston-MA/Scientist_R-1")
        );
        assert_eq!(page.jobs[1].job_id, "R-2");
    }

    #[test]
    fn recognises_locales() {
        assert!(is_locale("en-US"));
        assert!(!is_locale("External"));
        assert!(!is_locale("EN-us"));
    }
}
