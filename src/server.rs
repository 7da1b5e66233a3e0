// src/server.rs

//! The sheet-data proxy service.
//!
//! `GET /api/sheet-data` reads the sheet, normalizes it and answers with the
//! record array. `OPTIONS` on the same path is a bare preflight. Every
//! answer from these routes carries the permissive CORS headers.

use crate::fetch::{FetchError, SheetSource};
use crate::records::normalize_rows;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc, time::Instant};
use tracing::{error, info};
use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

pub const SERVICE_NAME: &str = "dealerdesk";

pub const FETCH_FAILED: &str = "Failed to fetch data from Google Sheet";
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

pub const ALLOWED_METHODS: &str = "GET,OPTIONS";
pub const ALLOWED_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
     Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn fetch_failed(err: &FetchError) -> Self {
        let details = err.to_string();
        Self {
            error: FETCH_FAILED.to_string(),
            details: if details.trim().is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                details
            },
        }
    }
}

pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME
    })))
}

async fn sheet_data<S: SheetSource>(source: Arc<S>) -> Result<warp::reply::Response, Rejection> {
    let start = Instant::now();
    match source.fetch_rows().await {
        Ok(rows) => {
            let records = normalize_rows(rows);
            info!(
                records = records.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Served sheet data"
            );
            Ok(warp::reply::json(&records).into_response())
        }
        Err(e) => {
            error!(error = %e, elapsed_ms = start.elapsed().as_millis() as u64, "API Error");
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorResponse::fetch_failed(&e)),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}

fn with_source<S: SheetSource + 'static>(
    source: Arc<S>,
) -> impl Filter<Extract = (Arc<S>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&source))
}

pub fn routes<S: SheetSource + 'static>(
    source: Arc<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path!("health").and(warp::get()).and_then(health_check);

    let preflight = warp::path!("api" / "sheet-data")
        .and(warp::options())
        .map(|| warp::reply::with_status(warp::reply(), StatusCode::OK));

    let data = warp::path!("api" / "sheet-data")
        .and(warp::get())
        .and(with_source(source))
        .and_then(sheet_data::<S>);

    health
        .or(preflight)
        .or(data)
        .with(warp::reply::with::headers(cors_headers()))
}
