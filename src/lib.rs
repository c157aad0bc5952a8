// Bank Directory - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod directory;
pub mod error;
pub mod slices;
pub mod telemetry;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{build_config, AppConfig, CliOverrides, ConfigError, Environment, LogLevel};
pub use directory::{
    rank, BankCard, BankRecord, DirectoryRequest, DirectorySession, DirectorySource,
    DirectoryState, FeatureExclusions, FilterState, FuzzyMatcher, LocationScope, SnapshotSource,
};
pub use error::DirectoryError;
pub use slices::{parse_slices, RenderOptions, RenderReport, RenderedNode, Slice, SliceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
