//! Engine configuration types
//!
//! Where snapshot documents are written and when. Everything has a default so an
//! empty configuration is valid.

use crate::snapshot::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the decode-and-aggregate engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory receiving the snapshot documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name of the cell/pack document
    #[serde(default = "default_cell_pack_file")]
    pub cell_pack_file: String,

    /// File name of the bus/drive-unit document
    #[serde(default = "default_bus_file")]
    pub bus_file: String,

    /// When snapshots are flushed
    #[serde(default)]
    pub publish: PublishPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cell_pack_file() -> String {
    "cell_data.json".to_string()
}

fn default_bus_file() -> String {
    "main_data.json".to_string()
}

/// Snapshot flush policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PublishPolicy {
    /// Flush the owning document after every successful decode
    #[default]
    OnDecode,
    /// Flush changed documents on a fixed wall-clock interval
    Interval { interval_ms: u64 },
}

impl PublishPolicy {
    /// Tick length for the interval policy
    pub fn interval(&self) -> Option<Duration> {
        match self {
            PublishPolicy::OnDecode => None,
            PublishPolicy::Interval { interval_ms } => Some(Duration::from_millis((*interval_ms).max(1))),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cell_pack_file: default_cell_pack_file(),
            bus_file: default_bus_file(),
            publish: PublishPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Builder method: set both document file names
    pub fn with_file_names(mut self, cell_pack: impl Into<String>, bus: impl Into<String>) -> Self {
        self.cell_pack_file = cell_pack.into();
        self.bus_file = bus.into();
        self
    }

    /// Builder method: flush after every decode
    pub fn with_publish_on_decode(mut self) -> Self {
        self.publish = PublishPolicy::OnDecode;
        self
    }

    /// Builder method: flush on a fixed interval
    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish = PublishPolicy::Interval { interval_ms: interval.as_millis() as u64 };
        self
    }

    /// Full path of a document
    pub fn document_path(&self, document: DocumentKind) -> PathBuf {
        match document {
            DocumentKind::CellPack => self.data_dir.join(&self.cell_pack_file),
            DocumentKind::Bus => self.data_dir.join(&self.bus_file),
        }
    }
}
