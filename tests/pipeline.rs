// End-to-end: backend snapshot → session → cards, and slice documents → nodes

use bank_directory::config::AppConfig;
use bank_directory::directory::{
    rank, BankCard, DirectoryRequest, DirectorySession, DirectorySource, DirectoryState,
    FeatureExclusions, FileSource, FilterState, FuzzyMatcher, LocationScope, SnapshotSource,
    NO_VALUE,
};
use bank_directory::slices::{
    slices_from_document, Diagnostic, RenderOptions, RenderedNode, SliceRegistry,
};
use std::io::Write;
use std::path::PathBuf;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
}

fn snapshot() -> SnapshotSource {
    SnapshotSource::from_file(&demo("banks.json")).unwrap()
}

fn run(location: LocationScope, query: &str, filters: &[&str]) -> (DirectoryState, Vec<BankCard>) {
    let mut state = FilterState::default();
    for spec in filters {
        state.enable(spec).unwrap();
    }

    let mut session = DirectorySession::default().with_location(location);
    session.set_query(query);
    session.set_filters(state);
    session.run(&snapshot());
    (session.state().clone(), session.cards(&FeatureExclusions::default()))
}

fn ids(cards: &[BankCard]) -> Vec<&str> {
    cards.iter().map(|c| c.id.as_str()).collect()
}

// ============================================================================
// DIRECTORY
// ============================================================================

#[test]
fn test_demo_snapshot_skips_malformed_node() {
    assert_eq!(snapshot().len(), 4);
}

#[test]
fn test_gb_ranking() {
    let (state, cards) = run(LocationScope::country("GB"), "", &[]);
    assert_eq!(state.label(), "loaded");
    assert_eq!(ids(&cards), vec!["triodos-gb", "ecology", "big-bank"]);
}

#[test]
fn test_gb_card_fields() {
    let (_, cards) = run(LocationScope::country("GB"), "", &[]);

    let triodos = &cards[0];
    assert!(triodos.top_pick);
    assert_eq!(triodos.interest_rate, "Up to 4%");
    assert_eq!(triodos.deposit_protection, "YES");

    let loans = triodos
        .features
        .iter()
        .find(|g| g.label == "Loan products")
        .unwrap();
    assert_eq!(loans.features, vec!["Mortgages"]);

    assert_eq!(cards[1].interest_rate, "Up to 4.25%");
    assert_eq!(cards[2].interest_rate, NO_VALUE);
    assert_eq!(cards[2].deposit_protection, NO_VALUE);
    assert!(cards[2].features.is_empty());
}

#[test]
fn test_credit_cards_listed_outside_excluded_countries() {
    let (_, cards) = run(LocationScope::country("NL"), "", &[]);
    assert_eq!(ids(&cards), vec!["triodos-gb"]);

    let loans = cards[0]
        .features
        .iter()
        .find(|g| g.label == "Loan products")
        .unwrap();
    assert_eq!(loans.features, vec!["Credit cards", "Mortgages"]);
}

#[test]
fn test_us_state_scoping() {
    let (_, cards) = run(LocationScope::us_state("CA"), "", &[]);
    assert_eq!(ids(&cards), vec!["beneficial", "big-bank"]);

    let (_, cards) = run(LocationScope::us_state("ny"), "", &[]);
    assert_eq!(ids(&cards), vec!["big-bank"]);

    let (state, cards) = run(LocationScope::country("US"), "", &[]);
    assert_eq!(state, DirectoryState::Empty);
    assert!(cards.is_empty());
}

#[test]
fn test_filters_require_offered_data() {
    let (_, cards) = run(LocationScope::us_state("CA"), "", &["services:local_branches"]);
    assert_eq!(ids(&cards), vec!["beneficial"]);

    let (_, cards) = run(
        LocationScope::country("GB"),
        "",
        &["depositProducts:savings", "loanProducts:mortgages"],
    );
    assert_eq!(ids(&cards), vec!["triodos-gb", "ecology"]);

    let (state, _) = run(LocationScope::country("GB"), "", &["depositProducts:term_deposits"]);
    assert_eq!(state, DirectoryState::Empty);
}

#[test]
fn test_fuzzy_query() {
    let (_, cards) = run(LocationScope::country("GB"), "ecolgy", &[]);
    assert_eq!(ids(&cards), vec!["ecology"]);

    let (_, cards) = run(LocationScope::country("GB"), "big bank", &[]);
    assert_eq!(ids(&cards), vec!["big-bank"]);

    let (_, cards) = run(LocationScope::country("GB"), "triodos", &[]);
    assert_eq!(ids(&cards), vec!["triodos-gb"]);
}

#[test]
fn test_rank_matches_session() {
    let request = DirectoryRequest::new(LocationScope::country("GB")).with_query("bank");
    let ranked = rank(snapshot().records().to_vec(), &request, &FuzzyMatcher::default());
    let ranked_ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ranked_ids, vec!["triodos-gb", "big-bank"]);
}

#[test]
fn test_file_source_retry_after_fix() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ broken").unwrap();

    let source = FileSource::new(file.path());
    let mut session = DirectorySession::default().with_location(LocationScope::country("GB"));
    assert!(matches!(session.run(&source), DirectoryState::Error { .. }));

    let mut fixed = std::fs::File::create(file.path()).unwrap();
    write!(fixed, r#"[{{"id":"a","name":"Alpha","countryCodes":["GB"]}}]"#).unwrap();
    drop(fixed);

    let retry = session.retry();
    let state = session.complete(retry, &source);
    assert_eq!(state.results().len(), 1);
    assert!(source.fetch(&DirectoryRequest::default()).is_ok());
}

#[test]
fn test_configured_threshold_changes_matches() {
    let mut config = AppConfig::default();
    config.search.threshold = 0.0;

    let mut session =
        DirectorySession::new(config.matcher()).with_location(LocationScope::country("GB"));
    session.set_query("ecolgy");
    assert_eq!(session.run(&snapshot()), &DirectoryState::Empty);
}

// ============================================================================
// SLICES
// ============================================================================

fn demo_slices() -> Vec<bank_directory::slices::Slice> {
    let content = std::fs::read_to_string(demo("slices.json")).unwrap();
    slices_from_document(&serde_json::from_str(&content).unwrap())
}

#[test]
fn test_demo_document_renders_in_order() {
    let report = SliceRegistry::new(RenderOptions::development()).render_report(&demo_slices());

    let kinds: Vec<&str> = report.nodes.iter().map(RenderedNode::kind).collect();
    assert_eq!(
        kinds,
        vec!["text", "image", "quote", "table", "accordion", "unknown"]
    );

    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::NestedAccordionDropped,
            Diagnostic::UnknownTag {
                tag: "mystery_slice".to_string(),
                nested: false
            },
        ]
    );
}

#[test]
fn test_demo_accordion_keeps_one_level() {
    let nodes = SliceRegistry::default().render(&demo_slices());
    let RenderedNode::Accordion { title, panels } = &nodes[4] else {
        panic!("expected accordion, got {:?}", nodes[4]);
    };

    assert_eq!(title.as_deref(), Some("Frequently asked questions"));
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].content.len(), 1);
    assert_eq!(panels[0].content[0].kind(), "button");
}

#[test]
fn test_demo_table_header() {
    let nodes = SliceRegistry::default().render(&demo_slices());
    assert_eq!(
        nodes[3],
        RenderedNode::Table {
            header: Some(vec!["Bank".to_string(), "Fossil fuel financing".to_string()]),
            rows: vec![
                vec!["Green Bank".to_string(), "None".to_string()],
                vec!["Big Bank".to_string(), "$40bn".to_string()],
            ],
        }
    );
}

#[test]
fn test_production_render_has_no_diagnostics() {
    let report = SliceRegistry::new(RenderOptions::production()).render_report(&demo_slices());
    assert_eq!(report.nodes.len(), 6);
    assert!(report.diagnostics.is_empty());
    assert!(report.nodes[5].is_placeholder());
}
