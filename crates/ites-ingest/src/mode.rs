//! Operating modes
//!
//! Modes are totally ordered; each one performs strictly more side effects
//! than the one before it. Callers ask intent questions instead of comparing
//! modes directly.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Skip datasets entirely; only protocol test cases are loaded
    NoData,
    /// Fetch and fingerprint datasets without touching the cluster
    NoIndex,
    /// Delete existing collections, templates and pipelines, then load
    Reindex,
    /// Load, reusing collections that already exist
    Index,
}

impl OperatingMode {
    /// Whether datasets are fetched (and fingerprinted) at all
    pub fn performs_fetch(self) -> bool {
        self >= OperatingMode::NoIndex
    }

    /// Whether the cluster is mutated
    pub fn performs_writes(self) -> bool {
        self >= OperatingMode::Reindex
    }

    /// Whether existing cluster state is destroyed before loading
    pub fn performs_destructive_reset(self) -> bool {
        self == OperatingMode::Reindex
    }

    /// Whether an existing collection is kept as is
    pub fn reuses_existing(self) -> bool {
        self == OperatingMode::Index
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperatingMode::NoData => "no-data",
            OperatingMode::NoIndex => "no-index",
            OperatingMode::Reindex => "reindex",
            OperatingMode::Index => "index",
        };
        f.write_str(name)
    }
}
