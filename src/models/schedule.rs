use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source of unique ids for newly created sequences and rules.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, prefix: &str) -> String;
}

/// Random v4 ids, e.g. `seq_5b0c...`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4())
    }
}

/// Deterministic ids scoped to one generator instance (`seq_1`, `seq_2`, ...).
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{n}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSequence {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub screens: Vec<String>,
    pub interval_seconds: u64,
    pub pause_on_interaction_seconds: u64,
}

impl ScreenSequence {
    pub fn create(ids: &dyn IdGenerator, name: impl Into<String>) -> Self {
        Self {
            id: ids.next_id("seq"),
            name: name.into(),
            enabled: true,
            screens: Vec::new(),
            interval_seconds: 30,
            pause_on_interaction_seconds: 60,
        }
    }

    /// Enabled and has at least one screen.
    pub fn is_eligible(&self) -> bool {
        self.enabled && !self.screens.is_empty()
    }

    pub fn position_of(&self, path: &str) -> Option<usize> {
        self.screens.iter().position(|screen| screen == path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpecificNavigation {
    pub id: String,
    pub enabled: bool,
    pub screen: String,
    /// `HH:MM`, 24-hour local time.
    pub time: String,
    /// Informational only; the override ends when the rule stops matching.
    pub duration_minutes: u64,
    /// Weekday indices, 0 = Sunday. `None` means every day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<u8>>,
}

impl TimeSpecificNavigation {
    pub fn create(
        ids: &dyn IdGenerator,
        screen: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: ids.next_id("tsn"),
            enabled: true,
            screen: screen.into(),
            time: time.into(),
            duration_minutes: 60,
            days: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub sequences: Vec<ScreenSequence>,
    pub time_specific: Vec<TimeSpecificNavigation>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sequences: vec![ScreenSequence {
                id: "default".into(),
                name: "Daily Rotation".into(),
                enabled: true,
                screens: vec!["/calendar".into(), "/tasks".into(), "/recipe".into()],
                interval_seconds: 60,
                pause_on_interaction_seconds: 120,
            }],
            time_specific: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    /// First enabled sequence with screens, in list order.
    pub fn first_eligible(&self) -> Option<&ScreenSequence> {
        self.sequences.iter().find(|sequence| sequence.is_eligible())
    }

    pub fn sequence(&self, id: &str) -> Option<&ScreenSequence> {
        self.sequences.iter().find(|sequence| sequence.id == id)
    }
}
