// src/records/mod.rs

//! Row normalization: raw sheet rows → [`Record`]s keyed by sanitized header.

mod field;

pub use field::Field;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// One sheet row as the Sheets API hands it over. Trailing empty cells are
/// usually omitted upstream, so rows can be shorter than the header.
pub type RawRow = Vec<Option<String>>;

/// Strip every whitespace character from a header cell.
pub fn sanitize_header(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Column layout shared by every record of one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Distinct sanitized keys, in first-appearance order.
    keys: Vec<String>,
    /// For each source column, the key slot it writes into.
    columns: Vec<usize>,
    /// Key slot of each well-known field, if the sheet has it.
    known: [Option<usize>; Field::COUNT],
}

impl Header {
    /// Build a header from the raw first row.
    ///
    /// Two cells that sanitize to the same key share one slot; the later
    /// column wins when rows are zipped against it.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut keys: Vec<String> = Vec::new();
        let mut columns = Vec::new();
        for cell in cells {
            let key = sanitize_header(cell.as_deref().unwrap_or_default());
            let slot = match keys.iter().position(|k| *k == key) {
                Some(slot) => {
                    debug!(key = %key, "duplicate header, later column overwrites");
                    slot
                }
                None => {
                    keys.push(key);
                    keys.len() - 1
                }
            };
            columns.push(slot);
        }
        Self::with_layout(keys, columns)
    }

    /// Build a header from already-sanitized, distinct keys.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for key in keys {
            if !distinct.contains(&key) {
                distinct.push(key);
            }
        }
        let columns = (0..distinct.len()).collect();
        Self::with_layout(distinct, columns)
    }

    fn with_layout(keys: Vec<String>, columns: Vec<usize>) -> Self {
        let mut known = [None; Field::COUNT];
        for (slot, key) in keys.iter().enumerate() {
            if let Some(field) = Field::from_key(key) {
                known[field.slot()] = Some(slot);
            }
        }
        Self {
            keys,
            columns,
            known,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn has(&self, field: Field) -> bool {
        self.known[field.slot()].is_some()
    }

    /// Well-known fields this sheet does not carry. A non-empty result usually
    /// means a header was renamed upstream.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

/// One normalized sheet row. Identity is positional; records are immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    header: Arc<Header>,
    values: Vec<Option<String>>,
}

impl Record {
    /// Zip a raw row against `header`. Short rows leave trailing keys absent;
    /// extra cells are dropped.
    pub fn from_row(header: Arc<Header>, row: RawRow) -> Self {
        let mut values = vec![None; header.keys.len()];
        let mut cells = row.into_iter();
        for &slot in &header.columns {
            values[slot] = cells.next().flatten();
        }
        Self { header, values }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.header.known[field.slot()].and_then(|slot| self.values[slot].as_deref())
    }

    /// Look up any column by sanitized key, known or not.
    pub fn column(&self, key: &str) -> Option<&str> {
        self.header
            .position(key)
            .and_then(|slot| self.values[slot].as_deref())
    }

    /// Present values in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .keys
            .iter()
            .zip(&self.values)
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Present values of columns that are not a well-known [`Field`].
    pub fn extra(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| Field::from_key(k).is_none())
    }

    /// `TotalVehicleValue` as a number; thousands separators are ignored.
    pub fn total_value(&self) -> Option<f64> {
        let raw = self.get(Field::TotalVehicleValue)?;
        let cleaned: String = raw
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        cleaned.parse().ok()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.values.iter().filter(|v| v.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Normalize raw sheet rows. The first row is the header; no rows or a
/// header-only sheet gives an empty result.
pub fn normalize_rows(rows: Vec<RawRow>) -> Vec<Record> {
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Vec::new();
    };
    let header = Arc::new(Header::from_cells(first));
    warn_on_drift(&header);

    rows.map(|row| Record::from_row(Arc::clone(&header), row))
        .collect()
}

/// Rebuild records from the proxy's JSON array. Absent members stay absent;
/// the header is the union of keys in first-appearance order.
pub fn from_json_objects(objects: Vec<Map<String, Value>>) -> Vec<Record> {
    let header = Arc::new(Header::from_keys(
        objects.iter().flat_map(|o| o.keys().cloned()),
    ));
    if !objects.is_empty() {
        warn_on_drift(&header);
    }

    objects
        .into_iter()
        .map(|mut object| {
            let values = header
                .keys
                .iter()
                .map(|k| object.remove(k).and_then(cell_text))
                .collect();
            Record {
                header: Arc::clone(&header),
                values,
            }
        })
        .collect()
}

/// Text of one JSON cell; `null` is absent, other scalars are stringified.
pub(crate) fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn warn_on_drift(header: &Header) {
    let missing = header.missing_fields();
    if !missing.is_empty() {
        warn!(?missing, "sheet header lacks well-known columns");
    }
}
