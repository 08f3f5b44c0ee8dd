//! Lookup and planning tools used by the agents.
//!
//! Each tool sits behind a small synchronous trait so agents can be tested
//! against fixed data. The default implementations read JSON datasets from
//! disk and fall back to the samples compiled into the binary.

pub mod calendar;
pub mod civic_data;
pub mod grant_finder;
pub mod impact;
pub mod timeline;

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ToolError;

pub use calendar::{CalendarTool, EventDraft, EventScheduler};
pub use civic_data::{CivicDataSource, CivicDataTool, CivicMetric, CivicProfile};
pub use grant_finder::{Grant, GrantFinderTool, GrantSearch, DEFAULT_MAX_RESULTS};
pub use impact::{ImpactEstimate, ImpactEstimator, ImpactSimulatorTool};
pub use timeline::{Milestone, TimelineBuilderTool, TimelinePlanner};

/// Reads `path` when it exists, otherwise parses the bundled sample.
pub(crate) fn load_dataset<T: DeserializeOwned>(
    name: &str,
    path: &Path,
    bundled: &'static str,
) -> Result<T, ToolError> {
    let raw = if path.exists() {
        std::fs::read_to_string(path).map_err(|source| ToolError::DatasetRead {
            path: path.display().to_string(),
            source,
        })?
    } else {
        tracing::debug!(dataset = name, path = %path.display(), "Dataset not found; using bundled sample");
        bundled.to_string()
    };

    parse_dataset(name, &raw)
}

pub(crate) fn parse_dataset<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T, ToolError> {
    serde_json::from_str(raw).map_err(|source| ToolError::InvalidDataset {
        name: name.to_string(),
        source,
    })
}
