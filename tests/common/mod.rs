//! Stand-in for the portal and its image host, served from 127.0.0.1 on a random port.
//!
//! Logos live under `/logos/<id>.gif`. [`FLAKY_ID`] answers 500 twice before
//! succeeding, [`MISSING_ID`] is always 404. The home page hands out a session
//! cookie that `/jobapi/v3/search` insists on; [`BROKEN_GROUP`] always answers 500.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

pub const FLAKY_ID: u64 = 13;
pub const MISSING_ID: u64 = 404;
pub const BROKEN_GROUP: u64 = 666;
pub const SESSION_COOKIE: &str = "nauk_sid=ok";

#[derive(Default)]
pub struct Hits {
    logos: Mutex<HashMap<u64, usize>>,
    searches: Mutex<Vec<u64>>,
}

impl Hits {
    pub fn logo(&self, id: u64) -> usize {
        self.logos.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn logos_total(&self) -> usize {
        self.logos.lock().unwrap().values().sum()
    }

    pub fn searches(&self) -> Vec<u64> {
        self.searches.lock().unwrap().clone()
    }
}

pub struct Remote {
    pub base: String,
    pub hits: Arc<Hits>,
}

impl Remote {
    pub fn logo_base(&self) -> String {
        format!("{}/logos", self.base)
    }

    pub fn search_url(&self) -> String {
        format!("{}/jobapi/v3/search", self.base)
    }
}

pub fn logo_body(id: u64) -> Vec<u8> {
    format!("GIF89a-{id}").into_bytes()
}

pub async fn start() -> Remote {
    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/", get(home))
        .route("/logos/{file}", get(logo))
        .route("/jobapi/v3/search", get(search))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Remote {
        base: format!("http://{addr}"),
        hits,
    }
}

async fn home() -> impl IntoResponse {
    (
        AppendHeaders([
            (header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/; HttpOnly")),
            (header::SET_COOKIE, "lang=en; Path=/".to_string()),
        ]),
        "<html><body>portal</body></html>",
    )
}

async fn logo(
    State(hits): State<Arc<Hits>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = file.strip_suffix(".gif").and_then(|id| id.parse::<u64>().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let seen = {
        let mut logos = hits.logos.lock().unwrap();
        let count = logos.entry(id).or_default();
        *count += 1;
        *count
    };

    if !headers.contains_key(header::USER_AGENT) {
        return StatusCode::FORBIDDEN.into_response();
    }
    match id {
        MISSING_ID => StatusCode::NOT_FOUND.into_response(),
        FLAKY_ID if seen <= 2 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => ([(header::CONTENT_TYPE, "image/gif")], logo_body(id)).into_response(),
    }
}

async fn search(
    State(hits): State<Arc<Hits>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let Some(group) = params.get("groupId").and_then(|id| id.parse::<u64>().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    hits.searches.lock().unwrap().push(group);

    let has_session = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookie| cookie.split("; ").any(|pair| pair == SESSION_COOKIE));
    let app_id = headers.get("appid").and_then(|value| value.to_str().ok());
    if !has_session || app_id != Some("109") {
        return StatusCode::FORBIDDEN.into_response();
    }
    if group == BROKEN_GROUP {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let body = format!(
        r#"{{"noOfJobs":1,"groupId":{group},"pageSize":{},"jobDetails":[{{"title":"Rust developer"}}]}}"#,
        params.get("noOfResults").map(String::as_str).unwrap_or("0")
    );
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
