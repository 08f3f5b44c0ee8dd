//! Draft volunteer events for timeline milestones.

use serde::{Deserialize, Serialize};

use super::timeline::Milestone;

const VOLUNTEER_SLOTS: u32 = 20;

/// A calendar event awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start: String,
    pub end: String,
    pub location: String,
    pub volunteer_slots: u32,
    pub status: String,
}

/// Turns a timeline into calendar events.
pub trait EventScheduler: Send + Sync {
    fn create_events(&self, timeline: &[Milestone], city: &str) -> Vec<EventDraft>;
}

/// One draft event per milestone at the community center.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarTool;

impl CalendarTool {
    pub fn new() -> Self {
        Self
    }
}

impl EventScheduler for CalendarTool {
    fn create_events(&self, timeline: &[Milestone], city: &str) -> Vec<EventDraft> {
        timeline
            .iter()
            .map(|milestone| EventDraft {
                title: format!("{} - {}", city, milestone.name),
                start: milestone.start_date.clone(),
                end: milestone.end_date.clone(),
                location: format!("{} Community Center", city),
                volunteer_slots: VOLUNTEER_SLOTS,
                status: "draft".to_string(),
            })
            .collect()
    }
}
