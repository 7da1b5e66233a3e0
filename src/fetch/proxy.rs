// src/fetch/proxy.rs

//! Client side of the sheet-data endpoint: one GET, records out.

use crate::records::{from_json_objects, Record};
use crate::server::ErrorResponse;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The service answered with an error document or a non-2xx status.
    #[error("{error}: {details}")]
    Service {
        status: u16,
        error: String,
        details: String,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetch the normalized record array from `endpoint`.
#[instrument(level = "info", skip(client, endpoint), fields(%endpoint))]
pub async fn load_records(client: &Client, endpoint: &Url) -> Result<Vec<Record>, ProxyError> {
    let transport = |source| ProxyError::Transport {
        url: endpoint.clone(),
        source,
    };

    let resp = client
        .get(endpoint.clone())
        .send()
        .await
        .map_err(transport)?;
    let status = resp.status();

    if !status.is_success() {
        let body = resp
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        return Err(match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(doc) => ProxyError::Service {
                status: status.as_u16(),
                error: doc.error,
                details: doc.details,
            },
            Err(_) => ProxyError::Service {
                status: status.as_u16(),
                error: format!("HTTP error! status: {}", status.as_u16()),
                details: body,
            },
        });
    }

    let objects: Vec<Map<String, Value>> = resp.json().await.map_err(transport)?;
    let records = from_json_objects(objects);
    info!(records = records.len(), "Loaded records");
    Ok(records)
}
