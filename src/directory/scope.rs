// 🌍 Location Scope - country (and US state) partition
//
// Scoping is a precondition, not a soft filter: without a country, or a US
// query without a state, the directory returns nothing at all.

use super::record::{normalize_region, BankRecord};
use serde::{Deserialize, Serialize};

/// Country whose directory is further partitioned by state
pub const STATE_SCOPED_COUNTRY: &str = "US";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationScope {
    pub country: Option<String>,
    pub state: Option<String>,
}

impl LocationScope {
    /// Normalizes codes; blank strings count as absent
    pub fn new(country: Option<&str>, state: Option<&str>) -> Self {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        LocationScope {
            country: clean(country).map(|c| c.to_uppercase()),
            state: clean(state).map(|s| normalize_region(&s)),
        }
    }

    pub fn country(code: &str) -> Self {
        LocationScope::new(Some(code), None)
    }

    pub fn us_state(state: &str) -> Self {
        LocationScope::new(Some(STATE_SCOPED_COUNTRY), Some(state))
    }

    pub fn requires_state(&self) -> bool {
        self.country.as_deref() == Some(STATE_SCOPED_COUNTRY)
    }

    /// True when a query may be issued for this scope
    pub fn is_complete(&self) -> bool {
        match &self.country {
            None => false,
            Some(_) if self.requires_state() => self.state.is_some(),
            Some(_) => true,
        }
    }

    pub fn contains(&self, record: &BankRecord) -> bool {
        let Some(country) = &self.country else {
            return false;
        };
        if !record.country_codes.contains(country) {
            return false;
        }
        if !self.requires_state() {
            return true;
        }
        match &self.state {
            Some(state) => record.state_license_tags.contains(state),
            None => false,
        }
    }
}

/// Records inside the scope; an incomplete scope yields nothing
pub fn scope(records: Vec<BankRecord>, location: &LocationScope) -> Vec<BankRecord> {
    if !location.is_complete() {
        tracing::debug!(?location, "incomplete location scope, no results");
        return Vec::new();
    }
    records
        .into_iter()
        .filter(|r| location.contains(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<BankRecord> {
        vec![
            BankRecord::new("gb", "Triodos").in_country("GB"),
            BankRecord::new("us-ca", "Beneficial State").in_country("US").licensed_in("CA"),
            BankRecord::new("us-ny", "Amalgamated").in_country("US").licensed_in("NY"),
            BankRecord::new("multi", "Global").in_country("GB").in_country("US").licensed_in("CA"),
        ]
    }

    fn ids(records: &[BankRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_no_country_no_results() {
        assert!(scope(records(), &LocationScope::default()).is_empty());
        assert!(scope(records(), &LocationScope::new(Some("  "), None)).is_empty());
    }

    #[test]
    fn test_us_without_state_no_results() {
        let location = LocationScope::country("us");
        assert!(location.requires_state());
        assert!(!location.is_complete());
        assert!(scope(records(), &location).is_empty());
    }

    #[test]
    fn test_country_scope() {
        let result = scope(records(), &LocationScope::country("gb"));
        assert_eq!(ids(&result), vec!["gb", "multi"]);
    }

    #[test]
    fn test_us_state_scope() {
        let result = scope(records(), &LocationScope::us_state("us-ca"));
        assert_eq!(ids(&result), vec!["us-ca", "multi"]);
    }

    #[test]
    fn test_state_ignored_outside_us() {
        let location = LocationScope::new(Some("GB"), Some("CA"));
        assert!(location.is_complete());
        assert_eq!(ids(&scope(records(), &location)), vec!["gb", "multi"]);
    }
}
