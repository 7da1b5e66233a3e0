// src/fetch/credentials.rs

use serde::Deserialize;
use serde_json::{json, Value};
use std::{env, fmt};
use thiserror::Error;

pub const CREDENTIALS_JSON_VAR: &str = "GOOGLE_SHEETS_CREDENTIALS";
pub const CLIENT_EMAIL_VAR: &str = "GOOGLE_SERVICE_ACCOUNT_EMAIL";
pub const PRIVATE_KEY_VAR: &str = "GOOGLE_PRIVATE_KEY";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error(
        "The GOOGLE_SHEETS_CREDENTIALS environment variable is not set \
         (and neither are GOOGLE_SERVICE_ACCOUNT_EMAIL and GOOGLE_PRIVATE_KEY)."
    )]
    Missing,
    #[error("{present} is set but {missing} is not.")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
    #[error("The GOOGLE_SHEETS_CREDENTIALS environment variable is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Service-account credentials are missing `{0}`.")]
    MissingField(&'static str),
    #[error("Service-account credentials were rejected: {0}")]
    Rejected(String),
}

/// Service-account identity used to mint a read-only Sheets token.
#[derive(Clone)]
pub struct Credentials {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub project_id: Option<String>,
    pub token_uri: Option<String>,
}

#[derive(Deserialize)]
struct RawCredentials {
    client_email: Option<String>,
    private_key: Option<String>,
    private_key_id: Option<String>,
    project_id: Option<String>,
    token_uri: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment. Called per request,
    /// so a fixed-up environment takes effect without a restart.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::resolve(
            env::var(CREDENTIALS_JSON_VAR).ok(),
            env::var(CLIENT_EMAIL_VAR).ok(),
            env::var(PRIVATE_KEY_VAR).ok(),
        )
    }

    /// The JSON blob wins over the discrete pair. Blank values count as unset.
    pub fn resolve(
        blob: Option<String>,
        client_email: Option<String>,
        private_key: Option<String>,
    ) -> Result<Self, CredentialsError> {
        let set = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(blob) = set(blob) {
            return Self::from_json(&blob);
        }
        match (set(client_email), set(private_key)) {
            (Some(client_email), Some(private_key)) => Ok(Self {
                client_email: client_email.trim().to_string(),
                private_key: normalize_key(&private_key),
                private_key_id: None,
                project_id: None,
                token_uri: None,
            }),
            (Some(_), None) => Err(CredentialsError::Incomplete {
                present: CLIENT_EMAIL_VAR,
                missing: PRIVATE_KEY_VAR,
            }),
            (None, Some(_)) => Err(CredentialsError::Incomplete {
                present: PRIVATE_KEY_VAR,
                missing: CLIENT_EMAIL_VAR,
            }),
            (None, None) => Err(CredentialsError::Missing),
        }
    }

    /// Parse a service-account key file. Hosts that store the blob as a JSON
    /// string of JSON are handled by decoding twice.
    pub fn from_json(blob: &str) -> Result<Self, CredentialsError> {
        let value = match serde_json::from_str(blob.trim()).map_err(CredentialsError::InvalidJson)? {
            Value::String(inner) => {
                serde_json::from_str(&inner).map_err(CredentialsError::InvalidJson)?
            }
            other => other,
        };
        let raw: RawCredentials =
            serde_json::from_value(value).map_err(CredentialsError::InvalidJson)?;

        let client_email = raw
            .client_email
            .filter(|s| !s.trim().is_empty())
            .ok_or(CredentialsError::MissingField("client_email"))?;
        let private_key = raw
            .private_key
            .filter(|s| !s.trim().is_empty())
            .ok_or(CredentialsError::MissingField("private_key"))?;

        Ok(Self {
            client_email,
            private_key: normalize_key(&private_key),
            private_key_id: raw.private_key_id,
            project_id: raw.project_id,
            token_uri: raw.token_uri,
        })
    }

    /// The key-file shape `google-cloud-auth` expects.
    pub(crate) fn to_credentials_file(
        &self,
    ) -> Result<google_cloud_auth::credentials::CredentialsFile, CredentialsError> {
        let file = json!({
            "type": "service_account",
            "client_email": self.client_email,
            "private_key": self.private_key,
            "private_key_id": self.private_key_id,
            "project_id": self.project_id,
            "token_uri": self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI),
        });
        serde_json::from_value(file).map_err(|e| CredentialsError::Rejected(e.to_string()))
    }
}

/// Env stores often keep PEM newlines as a literal `\n`.
fn normalize_key(key: &str) -> String {
    key.replace("\\n", "\n").trim().to_string()
}
