// src/fetch/sheets.rs

use super::{Credentials, CredentialsError, FetchError, SheetSource};
use crate::records::{cell_text, RawRow};
use anyhow::{anyhow, Context, Result};
use google_cloud_auth::{project::Config, token::DefaultTokenSourceProvider};
use google_cloud_token::TokenSourceProvider;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::Value;
use std::{fmt, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

const SHEETS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Which sheet, and where the Sheets API lives.
#[derive(Debug, Clone)]
pub struct SheetLocation {
    pub api_base: Url,
    pub spreadsheet_id: String,
    pub range: String,
}

impl SheetLocation {
    /// `{api_base}/v4/spreadsheets/{id}/values/{range}`, each segment escaped.
    pub fn values_url(&self) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as an API base", self.api_base))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        Ok(url)
    }
}

#[derive(Clone)]
pub enum AuthMode {
    /// Mint a read-only token from the environment's service account on
    /// every request.
    ServiceAccount,
    /// Send this `Authorization` value as-is (emulators, tests).
    Fixed(String),
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::ServiceAccount => f.write_str("ServiceAccount"),
            AuthMode::Fixed(_) => f.write_str("Fixed(<redacted>)"),
        }
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

enum Failure {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

/// Reads one range of one spreadsheet through the Sheets v4 values API.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: Client,
    location: SheetLocation,
    auth: AuthMode,
    max_retries: u32,
    initial_backoff: Duration,
}

impl GoogleSheets {
    pub fn new(client: Client, location: SheetLocation) -> Self {
        Self {
            client,
            location,
            auth: AuthMode::ServiceAccount,
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Retries apply to transport failures and 5xx answers only.
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn location(&self) -> &SheetLocation {
        &self.location
    }

    #[instrument(
        level = "info",
        skip(self),
        fields(spreadsheet = %self.location.spreadsheet_id, range = %self.location.range)
    )]
    async fn read_rows(&self) -> Result<Vec<RawRow>, FetchError> {
        let authorization = match &self.auth {
            AuthMode::Fixed(value) => value.clone(),
            AuthMode::ServiceAccount => access_token(&Credentials::from_env()?).await?,
        };
        let url = self.location.values_url().map_err(FetchError::Upstream)?;
        let range = self
            .get_values_with_retry(&url, &authorization)
            .await
            .map_err(FetchError::Upstream)?;

        let rows = rows_from_values(range.values.unwrap_or_default());
        if rows.is_empty() {
            info!("No data found.");
        } else {
            info!(rows = rows.len(), "Fetched sheet rows");
        }
        Ok(rows)
    }

    async fn get_values_with_retry(&self, url: &Url, authorization: &str) -> Result<ValueRange> {
        let mut attempts = 0;
        loop {
            match self.get_values(url, authorization).await {
                Ok(range) => return Ok(range),
                Err(Failure::Retryable(e)) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = self.initial_backoff * 2u32.pow(attempts - 1);
                    warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                    sleep(backoff).await;
                }
                Err(Failure::Retryable(e)) => {
                    error!(%url, error = %e, "Exhausted retries");
                    return Err(e);
                }
                Err(Failure::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn get_values(&self, url: &Url, authorization: &str) -> Result<ValueRange, Failure> {
        debug!(%url, "Fetching sheet values");
        let resp = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))
            .map_err(Failure::Retryable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            let e = anyhow!("Sheets API returned {status}: {message}");
            return Err(if status.is_server_error() {
                Failure::Retryable(e)
            } else {
                Failure::Fatal(e)
            });
        }

        resp.json::<ValueRange>()
            .await
            .with_context(|| format!("Decoding values from {url}"))
            .map_err(Failure::Fatal)
    }
}

impl SheetSource for GoogleSheets {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<RawRow>, FetchError>> + Send {
        self.read_rows()
    }
}

/// `Authorization` header value ("Bearer …") for the read-only scope.
async fn access_token(credentials: &Credentials) -> Result<String, FetchError> {
    let file = credentials.to_credentials_file()?;
    let config = Config::default().with_scopes(SHEETS_SCOPES);
    let provider = DefaultTokenSourceProvider::new_with_credentials(config, Box::new(file))
        .await
        .map_err(|e| CredentialsError::Rejected(e.to_string()))?;
    provider
        .token_source()
        .token()
        .await
        .map_err(|e| FetchError::Upstream(anyhow!("Requesting access token: {e}")))
}

/// Cell matrix of a `values` response as raw rows. Rows keep their ragged
/// lengths; `null` cells are absent.
pub fn rows_from_values(values: Vec<Vec<Value>>) -> Vec<RawRow> {
    values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use warp::{http::StatusCode, Filter, Reply};

    /// Answers one request with `status_line` and a body cut short of its
    /// declared length.
    async fn truncated_reply(status_line: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/plain\r\ncontent-length: 64\r\n\r\npartial"
            );
            socket.write_all(head.as_bytes()).await.unwrap();
        });
        addr
    }

    fn location(base: &str, range: &str) -> SheetLocation {
        SheetLocation {
            api_base: Url::parse(base).unwrap(),
            spreadsheet_id: "sheet-123".into(),
            range: range.into(),
        }
    }

    fn sheets(base: Url) -> GoogleSheets {
        GoogleSheets::new(Client::new(), location(base.as_str(), "Sheet1"))
            .with_auth(AuthMode::Fixed("Bearer test-token".into()))
            .with_retries(2, Duration::from_millis(1))
    }

    #[test]
    fn values_url_escapes_segments() {
        let url = location(DEFAULT_API_BASE, "Orders 2024!A:Z")
            .values_url()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Orders%202024!A:Z"
        );

        let nested = location("http://localhost:9000/proxy/", "Sheet1")
            .values_url()
            .unwrap();
        assert_eq!(nested.path(), "/proxy/v4/spreadsheets/sheet-123/values/Sheet1");
    }

    #[test]
    fn converts_cells_to_raw_rows() {
        let rows = rows_from_values(vec![
            vec![json!("Customer Name"), json!("Total Vehicle Value")],
            vec![json!("Jane Doe"), json!(2150000)],
            vec![json!("John Roe"), Value::Null],
            vec![json!("Asha Rao")],
        ]);
        assert_eq!(rows[1][1].as_deref(), Some("2150000"));
        assert_eq!(rows[2][1], None);
        assert_eq!(rows[3].len(), 1);
    }

    #[tokio::test]
    async fn reads_values_with_authorization() {
        let api = warp::path!("v4" / "spreadsheets" / String / "values" / String)
            .and(warp::header::<String>("authorization"))
            .map(|id: String, range: String, auth: String| {
                assert_eq!(id, "sheet-123");
                assert_eq!(range, "Sheet1");
                assert_eq!(auth, "Bearer test-token");
                warp::reply::json(&json!({
                    "range": "Sheet1!A1:B3",
                    "majorDimension": "ROWS",
                    "values": [["Customer Name", "Mobile"], ["Jane Doe", "9990001111"], ["John Roe"]]
                }))
            });
        let (addr, serving) = warp::serve(api).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        let rows = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0].as_deref(), Some("Jane Doe"));
        assert_eq!(rows[2], vec![Some("John Roe".to_string())]);
    }

    #[tokio::test]
    async fn empty_range_has_no_rows() {
        let api = warp::any().map(|| warp::reply::json(&json!({ "range": "Sheet1!A1:Z1000" })));
        let (addr, serving) = warp::serve(api).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        let rows = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let api = warp::any().map(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                warp::reply::with_status("backend unavailable", StatusCode::SERVICE_UNAVAILABLE)
                    .into_response()
            } else {
                warp::reply::json(&json!({ "values": [["Customer Name"], ["Jane Doe"]] }))
                    .into_response()
            }
        });
        let (addr, serving) = warp::serve(api).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        let rows = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let api = warp::any().map(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "error": {
                        "code": 403,
                        "message": "The caller does not have permission",
                        "status": "PERMISSION_DENIED"
                    }
                })),
                StatusCode::FORBIDDEN,
            )
        });
        let (addr, serving) = warp::serve(api).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        let err = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)));
        assert!(err
            .to_string()
            .contains("The caller does not have permission"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_the_retry_budget() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let api = warp::any().map(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR)
        });
        let (addr, serving) = warp::serve(api).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        let err = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn debug_hides_fixed_authorization() {
        let shown = format!("{:?}", AuthMode::Fixed("Bearer secret".into()));
        assert!(!shown.contains("secret"));
    }

    #[tokio::test]
    async fn unreadable_error_bodies_are_reported() {
        let addr = truncated_reply("403 Forbidden").await;
        let err = sheets(Url::parse(&format!("http://{addr}")).unwrap())
            .fetch_rows()
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"), "{message}");
        assert!(message.contains("<unreadable body:"), "{message}");
    }
}
