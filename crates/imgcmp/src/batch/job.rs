use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifying fields copied verbatim from a job into its result
/// (e.g. `tc`, `uuid`).
pub type Passthrough = Map<String, Value>;

/// One unit of batch work: a primary image and the baselines it may match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffJob {
    /// Primary image reference (path or URL).
    #[serde(rename = "img")]
    pub image: String,
    /// Candidate baselines, tried in order. First exact match wins.
    #[serde(default)]
    pub baselines: Vec<String>,
    #[serde(flatten)]
    pub passthrough: Passthrough,
}

impl DiffJob {
    pub fn label(&self) -> String {
        label_for(&self.passthrough, &self.image)
    }
}

/// Short display name: `tc` or `uuid` when present, else the image.
pub fn label_for(passthrough: &Passthrough, image: &str) -> String {
    ["tc", "uuid"]
        .iter()
        .find_map(|k| passthrough.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .unwrap_or(image)
        .to_string()
}

/// Batch input document: `{"diffs": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub diffs: Vec<DiffJob>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }
}
