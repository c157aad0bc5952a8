// 📥 Directory Source - where bank records come from
//
// Backend payloads are either a GraphQL-style connection
//   { "data": { "brands": { "edges": [ { "node": {...} } ] } } }
// or a bare array of records. Records are decoded one by one; a node that
// does not decode is skipped with a warning.

use super::record::BankRecord;
use super::scope::LocationScope;
use super::filter::FilterState;
use crate::error::DirectoryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

// ============================================================================
// REQUEST / TRAIT
// ============================================================================

/// Everything the directory needs to produce a result list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryRequest {
    pub location: LocationScope,
    pub query: String,
    pub filters: FilterState,
}

impl DirectoryRequest {
    pub fn new(location: LocationScope) -> Self {
        DirectoryRequest {
            location,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }
}

/// Backend seam. Implementations may ignore the request and return a
/// superset; the pipeline scopes, searches and filters afterwards.
pub trait DirectorySource {
    fn fetch(&self, request: &DirectoryRequest) -> Result<Vec<BankRecord>, DirectoryError>;
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

/// Decode a backend response value into records
pub fn parse_backend_response(response: &Value) -> Result<Vec<BankRecord>, DirectoryError> {
    let nodes: Vec<&Value> = if let Some(array) = response.as_array() {
        array.iter().collect()
    } else if let Some(edges) = response
        .pointer("/data/brands/edges")
        .and_then(Value::as_array)
    {
        edges.iter().filter_map(|edge| edge.get("node")).collect()
    } else if let Some(message) = response
        .pointer("/errors/0/message")
        .and_then(Value::as_str)
    {
        return Err(DirectoryError::fetch(message));
    } else {
        return Err(DirectoryError::fetch("unexpected response shape"));
    };

    let total = nodes.len();
    let records: Vec<BankRecord> = nodes
        .into_iter()
        .enumerate()
        .filter_map(|(index, node)| match BankRecord::deserialize(node) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed bank record");
                None
            }
        })
        .collect();

    tracing::debug!(total, decoded = records.len(), "parsed backend response");
    Ok(records)
}

/// Decode a backend response from raw JSON text
pub fn parse_backend_str(json: &str) -> Result<Vec<BankRecord>, DirectoryError> {
    let value: Value = serde_json::from_str(json)?;
    parse_backend_response(&value)
}

fn read_snapshot(path: &Path) -> Result<Vec<BankRecord>, DirectoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_backend_str(&content)
}

// ============================================================================
// SOURCES
// ============================================================================

/// Records held in memory (loaded once)
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    records: Vec<BankRecord>,
}

impl SnapshotSource {
    pub fn new(records: Vec<BankRecord>) -> Self {
        SnapshotSource { records }
    }

    pub fn from_file(path: &Path) -> Result<Self, DirectoryError> {
        let records = read_snapshot(path)?;
        tracing::info!(path = %path.display(), count = records.len(), "loaded bank snapshot");
        Ok(SnapshotSource { records })
    }

    pub fn records(&self) -> &[BankRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DirectorySource for SnapshotSource {
    fn fetch(&self, _request: &DirectoryRequest) -> Result<Vec<BankRecord>, DirectoryError> {
        Ok(self.records.clone())
    }
}

/// Re-reads the snapshot file on every fetch, so a retry sees fixes on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DirectorySource for FileSource {
    fn fetch(&self, _request: &DirectoryRequest) -> Result<Vec<BankRecord>, DirectoryError> {
        read_snapshot(&self.path)
    }
}
