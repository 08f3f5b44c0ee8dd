//! Civic emissions metrics by city.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

const BUNDLED_DATASET: &str = include_str!("../../data/city_emissions_sample.json");

/// Note attached to profiles with no matching rows.
pub const NO_DATA_NOTE: &str =
    "No local data available in sample set; consider switching to live API.";

/// One emissions metric for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CivicMetric {
    pub sector: String,
    pub metric: String,
    pub unit: String,
    pub value: f64,
    pub year: i32,
}

/// Metrics known for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CivicProfile {
    pub city: String,
    pub state: String,
    pub metrics: Vec<CivicMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Source of civic metrics.
pub trait CivicDataSource: Send + Sync {
    /// Returns every metric recorded for `city` in `region`.
    fn city_profile(&self, city: &str, region: &str) -> CivicProfile;
}

#[derive(Debug, Clone, Deserialize)]
struct CivicRow {
    city: String,
    state: String,
    #[serde(flatten)]
    metric: CivicMetric,
}

/// Civic data backed by a JSON table of rows.
#[derive(Debug, Clone)]
pub struct CivicDataTool {
    rows: Vec<CivicRow>,
}

impl CivicDataTool {
    /// Loads the table at `path`, or the bundled sample if it is missing.
    pub fn from_path(path: &Path) -> Result<Self, ToolError> {
        let rows = super::load_dataset("civic data", path, BUNDLED_DATASET)?;
        Ok(Self { rows })
    }

    /// The bundled sample table.
    pub fn bundled() -> Result<Self, ToolError> {
        let rows = super::parse_dataset("civic data", BUNDLED_DATASET)?;
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl CivicDataSource for CivicDataTool {
    fn city_profile(&self, city: &str, region: &str) -> CivicProfile {
        let metrics: Vec<CivicMetric> = self
            .rows
            .iter()
            .filter(|row| row.city.eq_ignore_ascii_case(city) && row.state.eq_ignore_ascii_case(region))
            .map(|row| row.metric.clone())
            .collect();

        let notes = metrics.is_empty().then(|| NO_DATA_NOTE.to_string());
        CivicProfile {
            city: city.to_string(),
            state: region.to_string(),
            metrics,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oakland_has_metrics() {
        let tool = CivicDataTool::bundled().expect("bundled dataset parses");
        let profile = tool.city_profile("Oakland", "CA");

        assert_eq!(profile.city, "Oakland");
        assert!(!profile.metrics.is_empty());
        assert!(profile.notes.is_none());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let tool = CivicDataTool::bundled().expect("bundled dataset parses");
        let profile = tool.city_profile("oakland", "ca");
        assert!(!profile.metrics.is_empty());
        assert_eq!(profile.state, "ca");
    }

    #[test]
    fn test_unknown_city_gets_note() {
        let tool = CivicDataTool::bundled().expect("bundled dataset parses");
        let profile = tool.city_profile("Springfield", "IL");

        assert!(profile.metrics.is_empty());
        assert_eq!(profile.notes.as_deref(), Some(NO_DATA_NOTE));
    }

    #[test]
    fn test_missing_path_uses_bundled_sample() {
        let tool = CivicDataTool::from_path(Path::new("/nonexistent/civic.json"))
            .expect("falls back to bundled data");
        assert!(!tool.is_empty());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("civic.json");
        std::fs::write(&path, "{\"not\": \"rows\"}").expect("write");

        assert!(matches!(
            CivicDataTool::from_path(&path),
            Err(ToolError::InvalidDataset { .. })
        ));
    }
}
