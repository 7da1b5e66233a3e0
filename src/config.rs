// src/config.rs

use crate::fetch::{sheets::DEFAULT_API_BASE, SheetLocation};
use anyhow::{Context, Result};
use std::env;
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SPREADSHEET_ID: &str = "1mfi0JtuIT032ss2I9XdQKFdlGnxrhkyMZJR6iWUIAOE";
pub const DEFAULT_RANGE: &str = "Sheet1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Service settings from the environment. Credentials are not part of it:
/// they are resolved per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub spreadsheet_id: String,
    pub range: String,
    pub log_level: String,
    pub api_base: Url,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a TCP port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };
        let api_base = get("SHEETS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(api_base.trim())
            .with_context(|| format!("SHEETS_API_BASE is not a URL: {api_base:?}"))?;

        let config = Self {
            port,
            spreadsheet_id: get("SPREADSHEET_ID")
                .unwrap_or_else(|| DEFAULT_SPREADSHEET_ID.to_string()),
            range: get("SHEET_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            api_base,
        };
        // Fail at startup rather than on the first request.
        config
            .location()
            .values_url()
            .context("SHEETS_API_BASE cannot carry a Sheets path")?;
        Ok(config)
    }

    pub fn location(&self) -> SheetLocation {
        SheetLocation {
            api_base: self.api_base.clone(),
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: self.range.clone(),
        }
    }
}
