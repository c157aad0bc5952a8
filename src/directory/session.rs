// 🔄 Directory Session - request lifecycle with last-request-wins
//
// Idle ──dispatch──▶ Loading{g} ──resolve(g, Ok)──▶ Loaded | Empty
//                        │
//                        └──resolve(g, Err)──▶ Error ──retry──▶ Loading{g+1}
//
// Each dispatch bumps the generation. A response for an older generation is
// reported as Stale and leaves the state untouched.

use super::display::{BankCard, FeatureExclusions};
use super::filter::FilterState;
use super::rank;
use super::record::BankRecord;
use super::scope::LocationScope;
use super::search::FuzzyMatcher;
use super::source::{DirectoryRequest, DirectorySource};
use crate::error::DirectoryError;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DirectoryState {
    Idle,
    Loading {
        generation: u64,
    },
    /// Always non-empty, already ranked
    #[serde(rename_all = "camelCase")]
    Loaded {
        results: Vec<BankRecord>,
        fetched_at: DateTime<Utc>,
    },
    Error {
        message: String,
    },
    Empty,
}

impl DirectoryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DirectoryState::Loading { .. })
    }

    pub fn results(&self) -> &[BankRecord] {
        match self {
            DirectoryState::Loaded { results, .. } => results,
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DirectoryState::Idle => "idle",
            DirectoryState::Loading { .. } => "loading",
            DirectoryState::Loaded { .. } => "loaded",
            DirectoryState::Error { .. } => "error",
            DirectoryState::Empty => "empty",
        }
    }
}

/// A fetch the caller must perform and hand back to [`DirectorySession::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub generation: u64,
    pub request: DirectoryRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Fetch(RequestTicket),
    /// Location out of scope: no fetch, state is Empty
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct DirectorySession {
    request: DirectoryRequest,
    state: DirectoryState,
    generation: u64,
    matcher: FuzzyMatcher,
}

impl DirectorySession {
    pub fn new(matcher: FuzzyMatcher) -> Self {
        DirectorySession {
            request: DirectoryRequest::default(),
            state: DirectoryState::Idle,
            generation: 0,
            matcher,
        }
    }

    pub fn with_location(mut self, location: LocationScope) -> Self {
        self.request.location = location;
        self
    }

    pub fn request(&self) -> &DirectoryRequest {
        &self.request
    }

    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn set_location(&mut self, location: LocationScope) -> Dispatch {
        self.request.location = location;
        self.dispatch()
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Dispatch {
        self.request.query = query.into();
        self.dispatch()
    }

    pub fn set_filters(&mut self, filters: FilterState) -> Dispatch {
        self.request.filters = filters;
        self.dispatch()
    }

    /// Edit the filters in place, then dispatch
    pub fn update_filters<F>(&mut self, edit: F) -> Dispatch
    where
        F: FnOnce(&mut FilterState),
    {
        edit(&mut self.request.filters);
        self.dispatch()
    }

    /// Start a new generation for the current request
    pub fn dispatch(&mut self) -> Dispatch {
        self.generation += 1;

        if !self.request.location.is_complete() {
            tracing::debug!(generation = self.generation, "location incomplete, skipping fetch");
            self.state = DirectoryState::Empty;
            return Dispatch::Skipped;
        }

        self.state = DirectoryState::Loading {
            generation: self.generation,
        };
        Dispatch::Fetch(RequestTicket {
            generation: self.generation,
            request: self.request.clone(),
        })
    }

    /// Manual retry after an error; there is no automatic one
    pub fn retry(&mut self) -> Dispatch {
        self.dispatch()
    }

    /// Apply a fetch outcome if it belongs to the latest generation
    pub fn resolve(
        &mut self,
        generation: u64,
        outcome: Result<Vec<BankRecord>, DirectoryError>,
    ) -> Resolution {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale response");
            return Resolution::Stale;
        }

        self.state = match outcome {
            Ok(records) => {
                let results = rank(records, &self.request, &self.matcher);
                if results.is_empty() {
                    DirectoryState::Empty
                } else {
                    DirectoryState::Loaded {
                        results,
                        fetched_at: Utc::now(),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "directory fetch failed");
                DirectoryState::Error {
                    message: e.user_message(),
                }
            }
        };
        Resolution::Applied
    }

    /// Perform a dispatched fetch synchronously
    pub fn complete(&mut self, dispatch: Dispatch, source: &dyn DirectorySource) -> &DirectoryState {
        if let Dispatch::Fetch(ticket) = dispatch {
            let outcome = source.fetch(&ticket.request);
            self.resolve(ticket.generation, outcome);
        }
        &self.state
    }

    /// Dispatch the current request and fetch it
    pub fn run(&mut self, source: &dyn DirectorySource) -> &DirectoryState {
        let dispatch = self.dispatch();
        self.complete(dispatch, source)
    }

    /// Cards for the current results
    pub fn cards(&self, exclusions: &FeatureExclusions) -> Vec<BankCard> {
        let country = self.request.location.country.as_deref();
        self.state
            .results()
            .iter()
            .map(|r| BankCard::from_record(r, country, exclusions))
            .collect()
    }
}

impl Default for DirectorySession {
    fn default() -> Self {
        DirectorySession::new(FuzzyMatcher::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::source::SnapshotSource;
    use std::cell::Cell;

    fn snapshot() -> SnapshotSource {
        SnapshotSource::new(vec![
            BankRecord::new("1", "Zeta Bank").in_country("GB"),
            BankRecord::new("2", "Alpha Bank").in_country("GB").ranked(true, None),
            BankRecord::new("3", "Golden State").in_country("US").licensed_in("CA"),
        ])
    }

    struct FailingSource {
        calls: Cell<u32>,
    }

    impl DirectorySource for FailingSource {
        fn fetch(&self, _request: &DirectoryRequest) -> Result<Vec<BankRecord>, DirectoryError> {
            self.calls.set(self.calls.get() + 1);
            Err(DirectoryError::fetch("connection reset"))
        }
    }

    fn ids(state: &DirectoryState) -> Vec<&str> {
        state.results().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_starts_idle() {
        let session = DirectorySession::default();
        assert_eq!(session.state(), &DirectoryState::Idle);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_run_loads_ranked_results() {
        let mut session = DirectorySession::default().with_location(LocationScope::country("GB"));
        let state = session.run(&snapshot());
        assert_eq!(ids(state), vec!["2", "1"]);
        assert_eq!(state.label(), "loaded");
    }

    #[test]
    fn test_change_enters_loading() {
        let mut session = DirectorySession::default();
        let dispatch = session.set_location(LocationScope::country("GB"));
        assert!(matches!(dispatch, Dispatch::Fetch(RequestTicket { generation: 1, .. })));
        assert_eq!(session.state(), &DirectoryState::Loading { generation: 1 });
    }

    #[test]
    fn test_incomplete_location_skips_fetch() {
        let mut session = DirectorySession::default();
        assert_eq!(session.set_location(LocationScope::country("US")), Dispatch::Skipped);
        assert_eq!(session.state(), &DirectoryState::Empty);

        assert_eq!(session.set_location(LocationScope::default()), Dispatch::Skipped);
        assert_eq!(session.state(), &DirectoryState::Empty);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut session = DirectorySession::default().with_location(LocationScope::country("GB"));
        let source = snapshot();

        let first = session.set_query("zeta");
        let second = session.set_query("alpha");

        let (Dispatch::Fetch(first), Dispatch::Fetch(second)) = (first, second) else {
            panic!("expected fetches");
        };

        let late = source.fetch(&first.request);
        let fresh = source.fetch(&second.request);

        assert_eq!(session.resolve(second.generation, fresh), Resolution::Applied);
        assert_eq!(session.resolve(first.generation, late), Resolution::Stale);
        assert_eq!(ids(session.state()), vec!["2"]);
    }

    #[test]
    fn test_zero_results_is_empty() {
        let mut session = DirectorySession::default().with_location(LocationScope::country("DE"));
        assert_eq!(session.run(&snapshot()), &DirectoryState::Empty);
    }

    #[test]
    fn test_error_then_manual_retry() {
        let mut session = DirectorySession::default().with_location(LocationScope::country("GB"));
        let failing = FailingSource { calls: Cell::new(0) };

        let state = session.run(&failing);
        assert_eq!(
            state,
            &DirectoryState::Error {
                message: "We couldn't load banks right now. Please try again.".to_string()
            }
        );
        assert_eq!(failing.calls.get(), 1);

        let retry = session.retry();
        let state = session.complete(retry, &snapshot());
        assert_eq!(ids(state), vec!["2", "1"]);
        assert_eq!(failing.calls.get(), 1);
    }

    #[test]
    fn test_filters_applied() {
        let mut session = DirectorySession::default().with_location(LocationScope::us_state("CA"));
        let dispatch = session.update_filters(|f| {
            f.enable("services:mobile_banking").unwrap();
        });
        let state = session.complete(dispatch, &snapshot());
        assert_eq!(state, &DirectoryState::Empty);

        let dispatch = session.update_filters(FilterState::reset);
        assert_eq!(ids(session.complete(dispatch, &snapshot())), vec!["3"]);
    }

    #[test]
    fn test_cards_follow_results() {
        let mut session = DirectorySession::default().with_location(LocationScope::country("GB"));
        session.run(&snapshot());
        let cards = session.cards(&FeatureExclusions::default());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "Alpha Bank");
        assert!(cards[0].top_pick);
    }
}
