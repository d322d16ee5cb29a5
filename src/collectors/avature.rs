use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::collectors::polymer::visible_text;
use crate::collectors::{CollectedJob, JobCollector, Locator, collected, extract, http, parse_url};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

pub const PAGE_SIZE: usize = 6;
const MAX_PAGES: usize = 100;

static TITLE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3 a").expect("valid title selector"));
/// Listing metadata reads like "Ref #12345 • Posted 11-Aug-2025 • On-Site".
static REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ref\s*#\s*([0-9]+)").expect("valid ref pattern"));
static WORK_MODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Posted.*?\x{2022}\s*(On-Site|Hybrid|Remote)\b").expect("valid work mode pattern")
});

pub struct Avature;

#[async_trait]
impl JobCollector for Avature {
    fn platform(&self) -> Platform {
        Platform::Avature
    }

    /// https://broadinstitute.avature.net/en_US/careers
    /// -> https://broadinstitute.avature.net/en_US/careers/SearchJobs/
    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let base = entry.require_url()?.trim_end_matches('/');
        Ok(Locator {
            board: base.to_string(),
            endpoint: parse_url(&format!("{base}/SearchJobs/"))?,
            site: parse_url(&format!("{base}/"))?,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let mut jobs: Vec<CollectedJob> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset = 0;

        for _ in 0..MAX_PAGES {
            let request = client
                .get(locator.endpoint.clone())
                .query(&[("jobOffset", offset), ("jobRecordsPerPage", PAGE_SIZE)]);
            let body = http::text(request).await?;
            let page = parse_page(&body, locator);
            if page.links == 0 {
                break;
            }
            // Some boards ignore the offset and repeat the last page forever.
            // Untitled listings still count, so a page of them does not end the walk.
            let fresh: HashSet<String> = page
                .ids
                .into_iter()
                .filter(|id| !seen.contains(id))
                .collect();
            if fresh.is_empty() {
                break;
            }
            jobs.extend(
                page.jobs
                    .into_iter()
                    .filter(|job| fresh.contains(&job.job_id) && seen.insert(job.job_id.clone())),
            );
            seen.extend(fresh);
            offset += PAGE_SIZE;
        }

        Ok(jobs)
    }
}

struct Page {
    jobs: Vec<CollectedJob>,
    /// Ids of every linked listing, titled or not.
    ids: Vec<String>,
    links: usize,
}

fn parse_page(body: &str, locator: &Locator) -> Page {
    let doc = Html::parse_document(body);
    let links: Vec<ElementRef<'_>> = doc.select(&TITLE_LINKS).collect();
    let mut page = Page {
        jobs: Vec::new(),
        ids: Vec::new(),
        links: links.len(),
    };
    for link in &links {
        if let Some((id, job)) = parse_link(*link, locator) {
            page.ids.push(id);
            page.jobs.extend(job);
        }
    }
    page
}

/// The listing's id, plus its record when the link carries a title.
fn parse_link(link: ElementRef<'_>, locator: &Locator) -> Option<(String, Option<CollectedJob>)> {
    let title = visible_text(link);
    let url = extract::absolute_url(&locator.site, link.value().attr("href").unwrap_or_default())?;
    let meta = link
        .parent()
        .and_then(ElementRef::wrap)
        .map(visible_text)
        .unwrap_or_default();
    let job_id = REF
        .captures(&meta)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| url.clone());
    // The work mode is the only location hint the listing carries.
    let location = WORK_MODE.captures(&meta).map(|c| c[1].to_string());
    let job = collected(
        Platform::Avature,
        locator,
        job_id.clone(),
        Some(title),
        location,
        Some(url),
    );
    Some((job_id, job))
}
