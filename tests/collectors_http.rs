//! Collectors against local stand-ins for the platform endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use serde_json::{Value, json};
use url::Url;

use jobsweep::collectors::avature::{self, Avature};
use jobsweep::collectors::dover::Dover;
use jobsweep::collectors::http::HttpSettings;
use jobsweep::collectors::lever::Lever;
use jobsweep::collectors::pinpoint::Pinpoint;
use jobsweep::collectors::smartrecruiters::SmartRecruiters;
use jobsweep::collectors::workday::Workday;
use jobsweep::collectors::{JobCollector, Locator};
use jobsweep::error::FetchError;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn locator(addr: SocketAddr, endpoint: &str, site: &str) -> Locator {
    Locator {
        board: "acme".into(),
        endpoint: Url::parse(&format!("http://{addr}{endpoint}")).unwrap(),
        site: Url::parse(&format!("http://{addr}{site}")).unwrap(),
        cookie: None,
    }
}

fn postings(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| json!({ "id": format!("p{i}"), "name": format!("Engineer {i}"), "title": format!("Engineer {i}") }))
        .collect()
}

/// Page sizes served in order; anything past the end is an empty page.
const PAGES: [usize; 3] = [100, 100, 37];

#[derive(Clone, Default)]
struct Counter(Arc<AtomicUsize>);

impl Counter {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn page_of(index: usize) -> Vec<Value> {
    let start: usize = PAGES.iter().take(index).sum();
    postings(start, PAGES.get(index).copied().unwrap_or(0))
}

async fn smartrecruiters_page(
    State(counter): State<Counter>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    counter.hit();
    let limit: usize = params["limit"].parse().unwrap();
    let offset: usize = params["offset"].parse().unwrap();
    assert_eq!(limit, 100);
    Json(json!({ "offset": offset, "limit": limit, "content": page_of(offset / limit) }))
}

#[tokio::test]
async fn smartrecruiters_stops_on_short_page() {
    let counter = Counter::default();
    let app = Router::new()
        .route("/v1/companies/acme/postings", get(smartrecruiters_page))
        .with_state(counter.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let loc = locator(addr, "/v1/companies/acme/postings", "/acme/");
    let jobs = SmartRecruiters.collect(&client, &loc).await.unwrap();

    assert_eq!(counter.count(), 3);
    assert_eq!(jobs.len(), 237);
    assert_eq!(jobs[236].job_id, "p236");
    assert_eq!(jobs[0].url.as_deref(), Some(format!("http://{addr}/acme/p0").as_str()));
}

async fn pinpoint_page(
    State(counter): State<Counter>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    counter.hit();
    let page: usize = params["page"].parse().unwrap();
    assert_eq!(params["per_page"], "100");
    Json(json!({ "data": page_of(page - 1) }))
}

#[tokio::test]
async fn pinpoint_follows_pages_until_short() {
    let counter = Counter::default();
    let app = Router::new()
        .route("/postings.json", get(pinpoint_page))
        .with_state(counter.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let loc = locator(addr, "/postings.json", "/");
    let jobs = Pinpoint.collect(&client, &loc).await.unwrap();

    assert_eq!(counter.count(), 3);
    assert_eq!(jobs.len(), 237);
    assert_eq!(
        jobs[0].url.as_deref(),
        Some(format!("http://{addr}/en/postings/p0").as_str())
    );
}

#[tokio::test]
async fn pinpoint_bare_list_is_a_single_page() {
    let counter = Counter::default();
    let app = Router::new()
        .route(
            "/postings.json",
            get(|State(counter): State<Counter>| async move {
                counter.hit();
                Json(Value::Array(postings(0, 100)))
            }),
        )
        .with_state(counter.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let jobs = Pinpoint
        .collect(&client, &locator(addr, "/postings.json", "/"))
        .await
        .unwrap();
    assert_eq!(counter.count(), 1);
    assert_eq!(jobs.len(), 100);
}

const SESSION: &str = "wd-session=seeded";

async fn workday_landing() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, format!("{SESSION}; Path=/"))],
        "<html>careers</html>",
    )
}

async fn workday_jobs(
    State(counter): State<Counter>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    counter.hit();
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !cookie.contains(SESSION) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let offset = body["offset"].as_u64().unwrap() as usize;
    let limit = body["limit"].as_u64().unwrap() as usize;
    let end = 45.min(offset + limit);
    let postings: Vec<Value> = (offset..end)
        .map(|i| {
            json!({
                "title": format!("Scientist {i}"),
                "externalPath": format!("/job/Boston/Scientist_R-{i}"),
                "locationsText": "Boston, MA",
            })
        })
        .collect();
    // Like the real API, only the first page reports the total.
    let total = if offset == 0 { 45 } else { 0 };
    Ok(Json(json!({ "total": total, "jobPostings": postings })))
}

#[tokio::test]
async fn workday_bootstraps_session_then_pages_to_total() {
    let counter = Counter::default();
    let app = Router::new()
        .route("/External", get(workday_landing))
        .route("/wday/cxs/acme/External/jobs", post(workday_jobs))
        .with_state(counter.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let loc = locator(addr, "/wday/cxs/acme/External/jobs", "/External");
    let jobs = Workday.collect(&client, &loc).await.unwrap();

    assert_eq!(counter.count(), 3);
    assert_eq!(jobs.len(), 45);
    assert_eq!(jobs[0].job_id, "/job/Boston/Scientist_R-0");
    assert_eq!(
        jobs[0].url.as_deref(),
        Some(format!("http://{addr}/job/Boston/Scientist_R-0").as_str())
    );
}

#[tokio::test]
async fn workday_without_session_fails_the_source() {
    let counter = Counter::default();
    let app = Router::new()
        .route("/External", get(|| async { "no cookie here" }))
        .route("/wday/cxs/acme/External/jobs", post(workday_jobs))
        .with_state(counter.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let loc = locator(addr, "/wday/cxs/acme/External/jobs", "/External");
    let err = Workday.collect(&client, &loc).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Status { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
    ));
}

#[tokio::test]
async fn malformed_json_and_error_status_are_fetch_errors() {
    let app = Router::new()
        .route(
            "/broken",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{\"jobs\": [") }),
        )
        .route("/down", get(|| async { StatusCode::BAD_GATEWAY }));
    let addr = serve(app).await;
    let client = HttpSettings::default().session().unwrap();

    let err = Lever
        .collect(&client, &locator(addr, "/broken", "/"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err}");

    let err = Lever
        .collect(&client, &locator(addr, "/down", "/"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { .. }), "{err}");
}

/// One Avature search page of six listings starting at `start`.
fn avature_listing(start: usize, titled: bool) -> String {
    (start..start + avature::PAGE_SIZE)
        .map(|i| {
            let title = if titled { format!("Research Associate {i}") } else { String::new() };
            format!(
                "<div class=\"result\"><h3><a href=\"JobDetail/Role-{i}/{i}\">{title}</a>\
                 <span>Ref #{i} \u{2022} Posted 1-Oct-2025 \u{2022} Remote</span></h3></div>"
            )
        })
        .collect()
}

#[derive(Clone)]
struct AvatureBoard {
    counter: Counter,
    pages: Arc<Vec<String>>,
    honours_offset: bool,
}

async fn avature_search(
    State(board): State<AvatureBoard>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    board.counter.hit();
    assert_eq!(params["jobRecordsPerPage"], "6");
    let offset: usize = params["jobOffset"].parse().unwrap();
    let index = if board.honours_offset { offset / avature::PAGE_SIZE } else { 0 };
    Html(
        board
            .pages
            .get(index)
            .cloned()
            .unwrap_or_else(|| "<p>No results</p>".to_string()),
    )
}

async fn collect_avature(pages: Vec<String>, honours_offset: bool) -> (usize, Vec<String>) {
    let board = AvatureBoard {
        counter: Counter::default(),
        pages: Arc::new(pages),
        honours_offset,
    };
    let app = Router::new()
        .route("/careers/SearchJobs/", get(avature_search))
        .with_state(board.clone());
    let addr = serve(app).await;

    let client = HttpSettings::default().session().unwrap();
    let loc = locator(addr, "/careers/SearchJobs/", "/careers/");
    let jobs = Avature.collect(&client, &loc).await.unwrap();
    (board.counter.count(), jobs.into_iter().map(|j| j.job_id).collect())
}

#[tokio::test]
async fn avature_stops_on_empty_page() {
    let pages = vec![avature_listing(0, true), avature_listing(6, true)];
    let (requests, ids) = collect_avature(pages, true).await;
    assert_eq!(requests, 3);
    assert_eq!(ids.len(), 12);
    assert_eq!(ids[0], "0");
    assert_eq!(ids[11], "11");
}

#[tokio::test]
async fn avature_stops_when_offset_is_ignored() {
    let pages = vec![avature_listing(0, true), avature_listing(6, true)];
    let (requests, ids) = collect_avature(pages, false).await;
    assert_eq!(requests, 2);
    assert_eq!(ids.len(), 6);
}

#[tokio::test]
async fn avature_walks_past_a_page_of_untitled_listings() {
    let pages = vec![avature_listing(0, false), avature_listing(6, true)];
    let (requests, ids) = collect_avature(pages, true).await;
    assert_eq!(requests, 3);
    assert_eq!(ids, ["6", "7", "8", "9", "10", "11"]);
}

async fn dover_groups(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !cookie.contains("cf_clearance=token-123") {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(json!([{
        "name": "Research",
        "jobs": [
            { "id": "d1", "title": "Protein Scientist", "location": "South San Francisco, CA" },
            { "id": "d2", "title": "ML Engineer" }
        ]
    }])))
}

#[tokio::test]
async fn dover_sends_clearance_cookie() {
    let app = Router::new().route("/api/v1/job-groups/c0ffee/job-groups", get(dover_groups));
    let addr = serve(app).await;
    let client = HttpSettings::default().session().unwrap();

    let mut loc = locator(addr, "/api/v1/job-groups/c0ffee/job-groups", "/");
    loc.cookie = Some("token-123".into());
    let jobs = Dover.collect(&client, &loc).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].location.as_deref(), Some("South San Francisco, CA"));
    assert_eq!(
        jobs[1].url.as_deref(),
        Some(format!("http://{addr}/jobs/d2").as_str())
    );

    loc.cookie = None;
    let err = Dover.collect(&client, &loc).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Status { status, .. } if status == reqwest::StatusCode::FORBIDDEN
    ));
}
