//! Grant catalogue search.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

const BUNDLED_CATALOG: &str = include_str!("../../data/grants_catalog_sample.json");

/// Default cap on search results.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A grant opportunity from the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub title: String,
    pub provider: String,
    #[serde(default)]
    pub max_award_usd: Option<u64>,
    #[serde(default)]
    pub match_required: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// State codes, `US-XX` codes or `US`. Empty means unrestricted.
    #[serde(default)]
    pub geography: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Grant {
    fn matches_keywords(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let tags: HashSet<String> = self.tags.iter().map(|t| t.to_lowercase()).collect();
        keywords.iter().any(|k| tags.contains(&k.to_lowercase()))
    }

    fn available_in(&self, region: &str) -> bool {
        if self.geography.is_empty() {
            return true;
        }
        let region = region.to_uppercase();
        let prefixed = format!("US-{}", region);
        self.geography.iter().any(|geo| {
            let geo = geo.to_uppercase();
            geo == region || geo == prefixed || geo == "US"
        })
    }
}

/// Search over grant opportunities.
pub trait GrantSearch: Send + Sync {
    /// Grants in catalogue order that match any keyword and are open to
    /// `region`, capped at `max_results`.
    fn search(&self, city: &str, region: &str, keywords: &[String], max_results: usize)
        -> Vec<Grant>;
}

/// Grant search over a JSON catalogue.
#[derive(Debug, Clone)]
pub struct GrantFinderTool {
    grants: Vec<Grant>,
}

impl GrantFinderTool {
    /// Loads the catalogue at `path`, or the bundled sample if it is missing.
    pub fn from_path(path: &Path) -> Result<Self, ToolError> {
        let grants = super::load_dataset("grant catalogue", path, BUNDLED_CATALOG)?;
        Ok(Self { grants })
    }

    /// The bundled sample catalogue.
    pub fn bundled() -> Result<Self, ToolError> {
        let grants = super::parse_dataset("grant catalogue", BUNDLED_CATALOG)?;
        Ok(Self { grants })
    }

    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }
}

impl GrantSearch for GrantFinderTool {
    fn search(
        &self,
        _city: &str,
        region: &str,
        keywords: &[String],
        max_results: usize,
    ) -> Vec<Grant> {
        self.grants
            .iter()
            .filter(|grant| grant.matches_keywords(keywords))
            .filter(|grant| grant.available_in(region))
            .take(max_results)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn grant(id: &str, tags: &[&str], geography: &[&str]) -> Grant {
        Grant {
            id: id.to_string(),
            title: id.to_string(),
            provider: "Test".to_string(),
            max_award_usd: None,
            match_required: None,
            deadline: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            geography: geography.iter().map(|g| g.to_string()).collect(),
            url: None,
        }
    }

    #[test]
    fn test_solar_search_in_california() {
        let tool = GrantFinderTool::bundled().expect("bundled catalogue parses");
        let results = tool.search("Oakland", "CA", &keywords(&["solar"]), DEFAULT_MAX_RESULTS);

        assert!(!results.is_empty());
        assert!(results.iter().any(|g| g.title.to_lowercase().contains("solar")));
    }

    #[test]
    fn test_tag_match_ignores_case() {
        let tool = GrantFinderTool::new(vec![grant("a", &["Solar"], &[])]);
        assert_eq!(tool.search("X", "CA", &keywords(&["SOLAR"]), 5).len(), 1);
    }

    #[test]
    fn test_geography_filter() {
        let tool = GrantFinderTool::new(vec![
            grant("open", &["solar"], &[]),
            grant("national", &["solar"], &["US"]),
            grant("state", &["solar"], &["ca"]),
            grant("prefixed", &["solar"], &["US-CA"]),
            grant("elsewhere", &["solar"], &["US-TX", "NM"]),
        ]);

        let ids: Vec<_> = tool
            .search("Oakland", "CA", &keywords(&["solar"]), 10)
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["open", "national", "state", "prefixed"]);
    }

    #[test]
    fn test_empty_keywords_match_everything() {
        let tool = GrantFinderTool::new(vec![grant("a", &["x"], &[]), grant("b", &[], &[])]);
        assert_eq!(tool.search("X", "CA", &[], 5).len(), 2);
    }

    #[test]
    fn test_results_are_capped() {
        let grants = (0..8).map(|i| grant(&i.to_string(), &["solar"], &[])).collect();
        let tool = GrantFinderTool::new(grants);

        let results = tool.search("X", "CA", &keywords(&["solar"]), 3);
        let ids: Vec<_> = results.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }
}
