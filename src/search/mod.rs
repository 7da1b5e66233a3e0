// src/search/mod.rs

//! Client-side filter engine over the resident record set.

pub mod date_parser;
pub mod quick;

use crate::records::{Field, Record};
use chrono::NaiveDate;
use date_parser::parse_sheet_date;
use std::sync::Arc;
use tracing::debug;

/// Fields the free-text query is tried against, in order.
const QUERY_FIELDS: [Field; 6] = [
    Field::CustomerName,
    Field::Mobile,
    Field::ModelText,
    Field::InvoiceNumber,
    Field::VehicleId,
    Field::CustomerId,
];

/// Inclusive date window on `DocumentDate`. Only active when both ends are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }

    pub fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// User-chosen search constraints, applied conjunctively. An empty string
/// means "no constraint" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub query: String,
    pub vehicle_color: String,
    pub interior_color: String,
    pub model_line: String,
    pub transmission: String,
    pub fuel_type: String,
    pub channel: String,
    pub main_outlet: String,
    pub finance_mode: String,
    pub application_status: String,
    pub date_range: DateRange,
}

impl FilterSpec {
    pub fn cleared() -> Self {
        Self::default()
    }

    /// True when no dimension carries a value. A single date bound counts as
    /// a value here even though the range predicate needs both ends.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
            && self.main_outlet.is_empty()
            && self.exact_constraints().iter().all(|(_, v)| v.is_empty())
            && self.date_range.is_unset()
    }

    fn exact_constraints(&self) -> [(Field, &str); 8] {
        [
            (Field::Color, self.vehicle_color.as_str()),
            (Field::InteriorColor, self.interior_color.as_str()),
            (Field::ModelLine, self.model_line.as_str()),
            (Field::Transmission, self.transmission.as_str()),
            (Field::FuelType, self.fuel_type.as_str()),
            (Field::Channel, self.channel.as_str()),
            (Field::FinanceMode, self.finance_mode.as_str()),
            (Field::ApplicationStatus, self.application_status.as_str()),
        ]
    }

    /// Every active predicate holds for `record`.
    pub fn matches(&self, record: &Record) -> bool {
        self.compile().matches(record)
    }

    fn compile(&self) -> Compiled<'_> {
        Compiled {
            query: (!self.query.is_empty()).then(|| self.query.to_lowercase()),
            exact: self.exact_constraints(),
            outlet: (!self.main_outlet.is_empty()).then(|| self.main_outlet.to_lowercase()),
            dates: self.date_range.bounds(),
        }
    }
}

/// A spec with its lowercased needles computed once per search.
struct Compiled<'a> {
    query: Option<String>,
    exact: [(Field, &'a str); 8],
    outlet: Option<String>,
    dates: Option<(NaiveDate, NaiveDate)>,
}

impl Compiled<'_> {
    fn matches(&self, record: &Record) -> bool {
        self.query_matches(record)
            && self.exact_matches(record)
            && self.outlet_matches(record)
            && self.date_matches(record)
    }

    fn query_matches(&self, record: &Record) -> bool {
        let Some(needle) = &self.query else {
            return true;
        };
        QUERY_FIELDS
            .iter()
            .any(|f| record.get(*f).is_some_and(|v| contains_folded(v, needle)))
    }

    fn exact_matches(&self, record: &Record) -> bool {
        self.exact
            .iter()
            .filter(|(_, wanted)| !wanted.is_empty())
            .all(|(field, wanted)| record.get(*field) == Some(*wanted))
    }

    fn outlet_matches(&self, record: &Record) -> bool {
        let Some(needle) = &self.outlet else {
            return true;
        };
        record
            .get(Field::MainOutlet)
            .is_some_and(|v| contains_folded(v, needle))
    }

    fn date_matches(&self, record: &Record) -> bool {
        let Some((start, end)) = self.dates else {
            return true;
        };
        record
            .get(Field::DocumentDate)
            .and_then(parse_sheet_date)
            .is_some_and(|d| start <= d && d <= end)
    }
}

fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Records that satisfied a [`FilterSpec`], in sheet order. Shares the
/// resident record set and holds only positions into it.
#[derive(Debug, Clone)]
pub struct ResultSet {
    records: Arc<[Record]>,
    positions: Vec<usize>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            positions: Vec::new(),
        }
    }

    /// Every record, unfiltered.
    pub fn all(records: Arc<[Record]>) -> Self {
        let positions = (0..records.len()).collect();
        Self { records, positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Row positions in the source record set.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.positions.get(index).map(|&p| &self.records[p])
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Record> + DoubleEndedIterator + '_ {
        self.positions.iter().map(|&p| &self.records[p])
    }

    /// Size of the record set this result was drawn from.
    pub fn source_len(&self) -> usize {
        self.records.len()
    }
}

/// Run `spec` over `records`. Total: missing fields never match, nothing throws.
pub fn match_records(records: &Arc<[Record]>, spec: &FilterSpec) -> ResultSet {
    let compiled = spec.compile();
    let positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| compiled.matches(r))
        .map(|(i, _)| i)
        .collect();
    debug!(
        total = records.len(),
        matched = positions.len(),
        "filter applied"
    );
    ResultSet {
        records: Arc::clone(records),
        positions,
    }
}
