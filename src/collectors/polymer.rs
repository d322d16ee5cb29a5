use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::collectors::{CollectedJob, JobCollector, Locator, collected, extract, http, parse_url};
use crate::error::{ConfigError, FetchError};
use crate::models::source::{Platform, SourceEntry};

/// Posting links end in a numeric id: `/12345` or `https://jobs.acme.com/12345/`.
static POSTING_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{3,})/?$").expect("valid posting href pattern"));
static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));

pub struct Polymer;

#[async_trait]
impl JobCollector for Polymer {
    fn platform(&self) -> Platform {
        Platform::Polymer
    }

    fn resolve_locator(&self, entry: &SourceEntry) -> Result<Locator, ConfigError> {
        let raw = entry.require_url()?;
        let site = parse_url(raw)?;
        Ok(Locator {
            board: raw.to_string(),
            endpoint: site.clone(),
            site,
            cookie: None,
        })
    }

    async fn collect(
        &self,
        client: &Client,
        locator: &Locator,
    ) -> Result<Vec<CollectedJob>, FetchError> {
        let body = http::text(client.get(locator.endpoint.clone())).await?;
        Ok(parse_board(&body, locator))
    }
}

fn parse_board(body: &str, locator: &Locator) -> Vec<CollectedJob> {
    let doc = Html::parse_document(body);
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();

    for link in doc.select(&LINKS) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(id) = POSTING_HREF.captures(href).map(|c| c[1].to_string()) else {
            continue;
        };
        let title = visible_text(link);
        if title.is_empty() || seen.contains(&id) {
            continue;
        }
        let url = extract::absolute_url(&locator.site, href);
        if let Some(job) = collected(Platform::Polymer, locator, id.clone(), Some(title), None, url)
        {
            seen.insert(id);
            jobs.push(job);
        }
    }
    jobs
}

/// Element text with whitespace runs collapsed.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
