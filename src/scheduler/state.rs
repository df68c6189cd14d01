use serde::{Deserialize, Serialize};

use crate::models::TimeSpecificNavigation;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerStatus {
    #[default]
    Stopped,
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Forward,
    Back,
}

impl Step {
    /// Wraparound step within `len` screens.
    pub fn apply(self, index: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self {
            Step::Forward => (index % len + 1) % len,
            Step::Back => (index % len + len - 1) % len,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub status: SchedulerStatus,
    pub current_sequence_id: Option<String>,
    pub current_index: usize,
    /// Advisory seconds until the next automatic advance.
    pub time_until_next_nav: u64,
    pub active_time_specific: Option<TimeSpecificNavigation>,
    /// Whether the hosting surface is on screen. Survives `stop()`.
    #[serde(skip)]
    pub visible: bool,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            status: SchedulerStatus::Stopped,
            current_sequence_id: None,
            current_index: 0,
            time_until_next_nav: 0,
            active_time_specific: None,
            visible: true,
        }
    }
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.status != SchedulerStatus::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.status == SchedulerStatus::Paused
    }

    /// Automatic rotation is allowed right now.
    pub fn should_rotate(&self) -> bool {
        self.status == SchedulerStatus::Active
            && self.active_time_specific.is_none()
            && self.visible
    }

    pub fn begin_run(&mut self, sequence_id: String, index: usize, interval_secs: u64) {
        *self = Self {
            status: SchedulerStatus::Active,
            current_sequence_id: Some(sequence_id),
            current_index: index,
            time_until_next_nav: interval_secs,
            active_time_specific: None,
            visible: self.visible,
        };
    }

    pub fn stop(&mut self) {
        *self = Self {
            visible: self.visible,
            ..Self::default()
        };
    }

    /// One display second; wraps back to the full interval instead of going negative.
    pub fn tick_countdown(&mut self, interval_secs: u64) {
        self.time_until_next_nav = match self.time_until_next_nav.checked_sub(1) {
            Some(remaining) => remaining,
            None => interval_secs,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_both_ways() {
        assert_eq!(Step::Forward.apply(2, 3), 0);
        assert_eq!(Step::Forward.apply(0, 3), 1);
        assert_eq!(Step::Back.apply(0, 3), 2);
        assert_eq!(Step::Back.apply(2, 3), 1);
        assert_eq!(Step::Back.apply(0, 1), 0);
        assert_eq!(Step::Forward.apply(0, 0), 0);
    }

    #[test]
    fn countdown_resets_instead_of_going_negative() {
        let mut state = SchedulerState::new();
        state.begin_run("s1".into(), 0, 2);
        state.tick_countdown(2);
        assert_eq!(state.time_until_next_nav, 1);
        state.tick_countdown(2);
        assert_eq!(state.time_until_next_nav, 0);
        state.tick_countdown(2);
        assert_eq!(state.time_until_next_nav, 2);
    }

    #[test]
    fn stop_keeps_visibility_only() {
        let mut state = SchedulerState::new();
        state.visible = false;
        state.begin_run("s1".into(), 2, 60);
        assert!(state.is_active());
        assert!(!state.should_rotate());

        state.stop();
        assert_eq!(state.status, SchedulerStatus::Stopped);
        assert_eq!(state.current_sequence_id, None);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.time_until_next_nav, 0);
        assert!(!state.visible);
    }

    #[test]
    fn paused_or_overridden_state_does_not_rotate() {
        let mut state = SchedulerState::new();
        state.begin_run("s1".into(), 0, 60);
        assert!(state.should_rotate());

        state.status = SchedulerStatus::Paused;
        assert!(state.is_active());
        assert!(!state.should_rotate());

        state.status = SchedulerStatus::Active;
        state.active_time_specific = Some(TimeSpecificNavigation {
            id: "t1".into(),
            enabled: true,
            screen: "/recipe".into(),
            time: "18:00".into(),
            duration_minutes: 30,
            days: None,
        });
        assert!(!state.should_rotate());
    }
}
