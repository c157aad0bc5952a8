// 🏦 Bank Directory
// Scope → search → filter → sort over backend bank records, plus the session
// that drives requests and the display projection of the results.

pub mod display;
pub mod filter;
pub mod geo;
pub mod record;
pub mod scope;
pub mod search;
pub mod session;
pub mod sort;
pub mod source;

pub use display::{
    deposit_protection_display, extract_features, interest_rate_display, BankCard, ExclusionRule,
    FeatureExclusions, FeatureGroup, NO_VALUE,
};
pub use filter::{
    filter, CategoryFilter, CustomerKey, DepositKey, FilterEntry, FilterKey, FilterState, LoanKey,
    ServiceKey, UnknownFilter,
};
pub use geo::{default_scope, GeoLocation};
pub use record::{BankRecord, HarvestCategory, HarvestData, RatingCategory};
pub use scope::{scope, LocationScope, STATE_SCOPED_COUNTRY};
pub use search::{search, FuzzyMatcher, DEFAULT_SEARCH_THRESHOLD};
pub use session::{DirectorySession, DirectoryState, Dispatch, RequestTicket, Resolution};
pub use sort::{collate_names, compare_ranked, sort, COLLATION_LOCALE};
pub use source::{
    parse_backend_response, parse_backend_str, DirectoryRequest, DirectorySource, FileSource,
    SnapshotSource,
};

/// Full pipeline: `sort(filter(search(scope(records), query), filters))`
pub fn rank(
    records: Vec<BankRecord>,
    request: &DirectoryRequest,
    matcher: &FuzzyMatcher,
) -> Vec<BankRecord> {
    let scoped = scope(records, &request.location);
    let matched = matcher.search(scoped, &request.query);
    sort(filter(matched, &request.filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_composition() {
        let mut bofa = BankRecord::new("bofa", "Bank of America").in_country("US").licensed_in("CA");
        bofa.add_alias("BofA");
        let records = vec![
            BankRecord::new("gb", "Barclays").in_country("GB"),
            bofa,
            BankRecord::new("ny", "Bank of the West").in_country("US").licensed_in("NY"),
            BankRecord::new("ca", "Amerant").in_country("US").licensed_in("CA").ranked(true, None),
        ];

        let request = DirectoryRequest::new(LocationScope::us_state("CA"));
        let ranked = rank(records.clone(), &request, &FuzzyMatcher::default());
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ca", "bofa"]);

        let request = request.with_query("bofa");
        let ranked = rank(records, &request, &FuzzyMatcher::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "bofa");
    }
}
