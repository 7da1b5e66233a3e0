// src/export.rs

use crate::records::{Field, Record};
use crate::search::ResultSet;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::{io, path::Path, string::FromUtf8Error};
use thiserror::Error;
use tracing::info;

/// Default download name for an export.
pub const EXPORT_FILE_NAME: &str = "dealership_search_results.csv";

pub const EXPORT_HEADERS: [&str; 9] = [
    "Customer Name",
    "Mobile",
    "Vehicle",
    "Color",
    "Interior",
    "Channel",
    "Finance",
    "Status",
    "Amount",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("export is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// The curated column projection for one record. Absent values are empty.
pub fn export_row(record: &Record) -> [String; 9] {
    let text = |field: Field| record.get(field).unwrap_or_default().to_string();
    let vehicle = [Field::ModelText, Field::ModelSeries]
        .into_iter()
        .filter_map(|f| record.get(f))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    [
        text(Field::CustomerName),
        text(Field::Mobile),
        vehicle,
        text(Field::Color),
        text(Field::InteriorColor),
        text(Field::Channel),
        text(Field::FinanceMode),
        text(Field::ApplicationStatus),
        text(Field::TotalVehicleValue),
    ]
}

/// Header line plus one comma-separated line per record, `\n`-joined.
///
/// Fields holding a comma, quote, CR or LF are double-quoted with inner
/// quotes doubled (RFC 4180), so a stray comma cannot shift columns.
pub fn to_delimited_text(results: &ResultSet) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for record in results.iter() {
        writer.write_record(export_row(record))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    // Lines are joined, not terminated.
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Write the export blob for `results` to `path`.
pub fn write_export(path: impl AsRef<Path>, results: &ResultSet) -> Result<(), ExportError> {
    let path = path.as_ref();
    let text = to_delimited_text(results)?;
    std::fs::write(path, text)?;
    info!(path = %path.display(), rows = results.len(), "export written");
    Ok(())
}
