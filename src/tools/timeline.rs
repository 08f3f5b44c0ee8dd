//! Milestone timelines for an initiative.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A dated milestone with an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub owner: String,
}

/// Builds a milestone timeline for an initiative.
pub trait TimelinePlanner: Send + Sync {
    fn build(&self, initiative: &str) -> Vec<Milestone>;
}

struct Phase {
    name: &'static str,
    start_week: u64,
    duration_weeks: u64,
    owner: &'static str,
}

const BASELINE: [Phase; 6] = [
    Phase { name: "Kickoff meeting & resource inventory", start_week: 1, duration_weeks: 1, owner: "Community lead" },
    Phase { name: "Feasibility research & site assessment", start_week: 2, duration_weeks: 2, owner: "Policy research pod" },
    Phase { name: "Grant preparation & submission", start_week: 4, duration_weeks: 3, owner: "Funding team" },
    Phase { name: "Community outreach & volunteer onboarding", start_week: 4, duration_weeks: 4, owner: "Communications" },
    Phase { name: "Implementation sprint", start_week: 8, duration_weeks: 4, owner: "Operations" },
    Phase { name: "Measurement & celebration event", start_week: 12, duration_weeks: 2, owner: "All stakeholders" },
];

const SOLAR_PHASE: Phase = Phase { name: "Solar contractor RFP & selection", start_week: 4, duration_weeks: 2, owner: "Facilities" };
const TREE_PHASE: Phase = Phase { name: "Nursery partnership & species selection", start_week: 4, duration_weeks: 2, owner: "Urban forestry" };

/// Position initiative-specific phases are inserted at.
const SPECIALIZED_PHASE_INDEX: usize = 3;

/// Week-based timeline anchored at a start date.
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilderTool {
    start: Option<NaiveDate>,
}

impl TimelineBuilderTool {
    /// A builder anchored at today's UTC date.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder anchored at a fixed date.
    pub fn starting_on(start: NaiveDate) -> Self {
        Self { start: Some(start) }
    }

    fn anchor(&self) -> NaiveDate {
        self.start.unwrap_or_else(|| Utc::now().date_naive())
    }
}

impl TimelinePlanner for TimelineBuilderTool {
    fn build(&self, initiative: &str) -> Vec<Milestone> {
        let mut phases: Vec<&Phase> = BASELINE.iter().collect();
        let initiative = initiative.to_lowercase();
        if initiative.contains("solar") {
            phases.insert(SPECIALIZED_PHASE_INDEX, &SOLAR_PHASE);
        } else if initiative.contains("tree") {
            phases.insert(SPECIALIZED_PHASE_INDEX, &TREE_PHASE);
        }

        let anchor = self.anchor();
        phases
            .into_iter()
            .map(|phase| {
                let start = anchor + Days::new((phase.start_week - 1) * 7);
                let end = start + Days::new(phase.duration_weeks * 7);
                Milestone {
                    name: phase.name.to_string(),
                    start_date: start.format(DATE_FORMAT).to_string(),
                    end_date: end.format(DATE_FORMAT).to_string(),
                    owner: phase.owner.to_string(),
                }
            })
            .collect()
    }
}
