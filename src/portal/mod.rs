// src/portal/mod.rs

//! Portal state as explicit transitions.
//!
//! Every user action goes through [`PortalState::apply`], which derives a new
//! state from the previous one. Views only ever borrow a state.

use crate::export::{self, ExportError};
use crate::pager::{self, Navigation, Page, PageError};
use crate::records::Record;
use crate::search::{match_records, quick::QuickFilter, FilterSpec, ResultSet};
use chrono::NaiveDate;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    /// The one fetch of this load finished.
    Loaded(Arc<[Record]>),
    LoadFailed(String),
    Search(FilterSpec),
    /// Overlay a preset on the current filters and search.
    QuickFilter { filter: QuickFilter, today: NaiveDate },
    SetPageSize(NonZeroUsize),
    GoToPage(usize),
    NextPage,
    PrevPage,
    /// Back to the search screen; loaded records are kept.
    Reset,
}

/// What the results area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loading,
    LoadFailed(String),
    NotSearched,
    /// The sheet itself has no data rows.
    NoData,
    /// There is data, but nothing matches the filters.
    NoMatches,
    Matches(usize),
}

#[derive(Debug, Clone)]
pub struct PortalState {
    records: Arc<[Record]>,
    load: LoadStatus,
    filters: FilterSpec,
    searched: bool,
    results: ResultSet,
    page_size: NonZeroUsize,
    page: usize,
}

impl Default for PortalState {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalState {
    pub fn new() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            load: LoadStatus::Loading,
            filters: FilterSpec::default(),
            searched: false,
            results: ResultSet::empty(),
            page_size: pager::default_page_size(),
            page: 1,
        }
    }

    pub fn apply(&self, action: Action) -> Self {
        let mut next = self.clone();
        match action {
            Action::Loaded(records) => {
                info!(records = records.len(), "records loaded");
                next.records = records;
                next.load = LoadStatus::Loaded;
                if next.searched {
                    next.rerun();
                }
            }
            Action::LoadFailed(reason) => {
                warn!(%reason, "record load failed");
                next.records = Arc::from(Vec::new());
                next.load = LoadStatus::Failed(reason);
                next.results = ResultSet::empty();
                next.page = 1;
            }
            Action::Search(filters) => {
                next.filters = filters;
                next.searched = true;
                next.rerun();
            }
            Action::QuickFilter { filter, today } => {
                debug!(preset = %filter, "quick filter");
                next.filters = filter.apply(&self.filters, today);
                next.searched = true;
                next.rerun();
            }
            Action::SetPageSize(size) => {
                next.page_size = size;
                next.page = 1;
            }
            Action::GoToPage(requested) => next.page = self.navigation().jump(requested).page(),
            Action::NextPage => next.page = self.navigation().next().page(),
            Action::PrevPage => next.page = self.navigation().prev().page(),
            Action::Reset => {
                next.filters = FilterSpec::cleared();
                next.searched = false;
                next.results = ResultSet::empty();
                next.page = 1;
            }
        }
        next
    }

    fn rerun(&mut self) {
        self.results = match_records(&self.records, &self.filters);
        self.page = 1;
    }

    pub fn records(&self) -> &Arc<[Record]> {
        &self.records
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn has_searched(&self) -> bool {
        self.searched
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn navigation(&self) -> Navigation {
        Navigation::new(
            self.page,
            pager::total_pages(self.results.len(), self.page_size),
        )
    }

    pub fn current_page(&self) -> Result<Page<'_>, PageError> {
        pager::page(&self.results, self.page_size, self.page)
    }

    pub fn export(&self) -> Result<String, ExportError> {
        export::to_delimited_text(&self.results)
    }

    pub fn outcome(&self) -> Outcome {
        match &self.load {
            LoadStatus::Loading => Outcome::Loading,
            LoadStatus::Failed(reason) => Outcome::LoadFailed(reason.clone()),
            LoadStatus::Loaded if !self.searched => Outcome::NotSearched,
            LoadStatus::Loaded if self.records.is_empty() => Outcome::NoData,
            LoadStatus::Loaded if self.results.is_empty() => Outcome::NoMatches,
            LoadStatus::Loaded => Outcome::Matches(self.results.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{normalize_rows, Field};

    fn loaded(n: usize) -> PortalState {
        let mut rows = vec![vec![
            Some("Customer Name".to_string()),
            Some("Fuel Type Description".to_string()),
        ]];
        rows.extend((0..n).map(|i| {
            let fuel = if i % 2 == 0 { "Electric" } else { "Petrol" };
            vec![Some(format!("customer {i}")), Some(fuel.to_string())]
        }));
        PortalState::new().apply(Action::Loaded(Arc::from(normalize_rows(rows))))
    }

    fn search_all() -> Action {
        Action::Search(FilterSpec::default())
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn starts_loading_then_waits_for_a_search() {
        assert_eq!(PortalState::new().outcome(), Outcome::Loading);
        let state = loaded(3);
        assert_eq!(state.outcome(), Outcome::NotSearched);
        assert_eq!(state.apply(search_all()).outcome(), Outcome::Matches(3));
    }

    #[test]
    fn no_data_and_no_matches_are_distinct() {
        assert_eq!(loaded(0).apply(search_all()).outcome(), Outcome::NoData);

        let nothing = Action::Search(FilterSpec {
            query: "zzz".into(),
            ..Default::default()
        });
        assert_eq!(loaded(3).apply(nothing).outcome(), Outcome::NoMatches);
    }

    #[test]
    fn load_failure_is_reported() {
        let state = PortalState::new().apply(Action::LoadFailed("HTTP 500".into()));
        assert_eq!(state.outcome(), Outcome::LoadFailed("HTTP 500".into()));
    }

    #[test]
    fn transitions_do_not_touch_the_previous_state() {
        let before = loaded(30).apply(search_all());
        let after = before.apply(Action::NextPage);
        assert_eq!(before.page_number(), 1);
        assert_eq!(after.page_number(), 2);
    }

    #[test]
    fn changing_page_size_resets_to_first_page() {
        let state = loaded(60)
            .apply(search_all())
            .apply(Action::GoToPage(4))
            .apply(Action::SetPageSize(size(25)));
        assert_eq!(state.page_number(), 1);
        assert_eq!(state.navigation().total_pages(), 3);
    }

    #[test]
    fn navigation_clamps_before_slicing() {
        let state = loaded(23).apply(search_all());
        assert_eq!(state.apply(Action::GoToPage(0)).page_number(), 1);
        assert_eq!(state.apply(Action::GoToPage(99)).page_number(), 3);
        assert_eq!(state.apply(Action::PrevPage).page_number(), 1);

        let last = state.apply(Action::GoToPage(3));
        assert_eq!(last.apply(Action::NextPage).page_number(), 3);
        let page = last.current_page().unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.range(), Some((21, 23)));
    }

    #[test]
    fn new_search_starts_on_page_one() {
        let state = loaded(30)
            .apply(search_all())
            .apply(Action::GoToPage(3))
            .apply(Action::Search(FilterSpec {
                fuel_type: "Electric".into(),
                ..Default::default()
            }));
        assert_eq!(state.page_number(), 1);
        assert_eq!(state.outcome(), Outcome::Matches(15));
        assert!(state
            .results()
            .iter()
            .all(|r| r.get(Field::FuelType) == Some("Electric")));
    }

    #[test]
    fn quick_filter_overlays_current_filters() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let state = loaded(10)
            .apply(Action::Search(FilterSpec {
                query: "customer 1".into(),
                ..Default::default()
            }))
            .apply(Action::QuickFilter {
                filter: QuickFilter::ElectricVehicles,
                today,
            });
        assert_eq!(state.filters().query, "customer 1");
        assert_eq!(state.filters().fuel_type, "Electric");
        // "customer 1" is Petrol; nothing else contains the query.
        assert_eq!(state.outcome(), Outcome::NoMatches);
    }

    #[test]
    fn reset_keeps_records_but_clears_the_search() {
        let state = loaded(5)
            .apply(Action::Search(FilterSpec {
                query: "customer".into(),
                ..Default::default()
            }))
            .apply(Action::Reset);
        assert_eq!(state.outcome(), Outcome::NotSearched);
        assert!(state.filters().is_empty());
        assert_eq!(state.records().len(), 5);
    }

    #[test]
    fn search_before_load_is_rerun_once_records_arrive() {
        let rows = vec![
            vec![Some("Customer Name".to_string())],
            vec![Some("Jane Doe".to_string())],
        ];
        let state = PortalState::new()
            .apply(Action::Search(FilterSpec {
                query: "jane".into(),
                ..Default::default()
            }))
            .apply(Action::Loaded(Arc::from(normalize_rows(rows))));
        assert_eq!(state.outcome(), Outcome::Matches(1));
    }

    #[test]
    fn exports_the_current_results() {
        let state = loaded(2).apply(search_all());
        assert_eq!(state.export().unwrap().lines().count(), 3);
    }
}
