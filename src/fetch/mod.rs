// src/fetch/mod.rs

//! Getting rows out of the order sheet.
//!
//! [`SheetSource`] is the seam the HTTP service is written against;
//! [`GoogleSheets`] is the production implementation and tests plug in
//! canned sources.

pub mod credentials;
pub mod proxy;
pub mod sheets;

pub use credentials::{Credentials, CredentialsError};
pub use sheets::{AuthMode, GoogleSheets, SheetLocation};

use crate::records::RawRow;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Credentials are absent or unusable. Nothing was sent upstream.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    /// The token service or the Sheets API failed or refused.
    #[error("{0:#}")]
    Upstream(anyhow::Error),
}

/// Something that yields the sheet's raw rows, header row first.
pub trait SheetSource: Send + Sync {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<RawRow>, FetchError>> + Send;
}
