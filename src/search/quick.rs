use super::{DateRange, FilterSpec};
use chrono::NaiveDate;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Canned searches offered next to the search box. Each one overlays the
/// current spec instead of replacing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    TodaysApproved,
    PendingApplications,
    ElectricVehicles,
    WalkInCustomers,
}

#[derive(Debug, Error)]
#[error("unknown quick filter `{0}` (expected one of: today-deliveries, pending-applications, electric-vehicles, walk-in-customers)")]
pub struct UnknownQuickFilter(String);

impl QuickFilter {
    pub const ALL: [QuickFilter; 4] = [
        QuickFilter::TodaysApproved,
        QuickFilter::PendingApplications,
        QuickFilter::ElectricVehicles,
        QuickFilter::WalkInCustomers,
    ];

    pub fn id(self) -> &'static str {
        match self {
            QuickFilter::TodaysApproved => "today-deliveries",
            QuickFilter::PendingApplications => "pending-applications",
            QuickFilter::ElectricVehicles => "electric-vehicles",
            QuickFilter::WalkInCustomers => "walk-in-customers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuickFilter::TodaysApproved => "Today's Approved",
            QuickFilter::PendingApplications => "Pending Applications",
            QuickFilter::ElectricVehicles => "Electric Vehicles",
            QuickFilter::WalkInCustomers => "Walk-in Customers",
        }
    }

    /// `base` with this preset's constraints written over it.
    pub fn apply(self, base: &FilterSpec, today: NaiveDate) -> FilterSpec {
        let mut spec = base.clone();
        match self {
            QuickFilter::TodaysApproved => {
                spec.application_status = "Approved".into();
                spec.date_range = DateRange::between(today, today);
            }
            QuickFilter::PendingApplications => spec.application_status = "Pending".into(),
            QuickFilter::ElectricVehicles => spec.fuel_type = "Electric".into(),
            QuickFilter::WalkInCustomers => spec.channel = "WALK-IN".into(),
        }
        spec
    }
}

impl fmt::Display for QuickFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QuickFilter {
    type Err = UnknownQuickFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.id() == s.trim())
            .ok_or_else(|| UnknownQuickFilter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_overlay_the_current_spec() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let base = FilterSpec {
            query: "jane".into(),
            fuel_type: "Petrol".into(),
            ..Default::default()
        };

        let spec = QuickFilter::TodaysApproved.apply(&base, today);
        assert_eq!(spec.query, "jane");
        assert_eq!(spec.application_status, "Approved");
        assert_eq!(spec.date_range.bounds(), Some((today, today)));

        let spec = QuickFilter::ElectricVehicles.apply(&base, today);
        assert_eq!(spec.fuel_type, "Electric");
        assert!(spec.date_range.is_unset());

        assert_eq!(
            QuickFilter::WalkInCustomers.apply(&base, today).channel,
            "WALK-IN"
        );
        assert_eq!(
            QuickFilter::PendingApplications
                .apply(&base, today)
                .application_status,
            "Pending"
        );
    }

    #[test]
    fn parses_ids() {
        for q in QuickFilter::ALL {
            assert_eq!(q.id().parse::<QuickFilter>().unwrap(), q);
        }
        assert!("everything".parse::<QuickFilter>().is_err());
    }
}
