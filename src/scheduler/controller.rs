use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::models::{ScheduleConfig, ScreenSequence, TimeSpecificNavigation};

use super::{
    host::{Clock, Router},
    state::{SchedulerState, SchedulerStatus, Step},
    time_match::find_active_rule,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const TIME_CHECK_INTERVAL_SECS: u64 = 60;
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub current_sequence_id: Option<String>,
    pub current_index: usize,
    pub time_until_next_nav: u64,
    pub active_time_specific: Option<TimeSpecificNavigation>,
}

impl From<&SchedulerState> for SchedulerSnapshot {
    fn from(state: &SchedulerState) -> Self {
        Self {
            is_active: state.is_active(),
            is_paused: state.is_paused(),
            current_sequence_id: state.current_sequence_id.clone(),
            current_index: state.current_index,
            time_until_next_nav: state.time_until_next_nav,
            active_time_specific: state.active_time_specific.clone(),
        }
    }
}

/// Rotates a kiosk display through the first eligible screen sequence,
/// yielding to time-specific overrides.
#[derive(Clone)]
pub struct SchedulerController {
    inner: Arc<Inner>,
}

struct Inner {
    config: ScheduleConfig,
    router: Arc<dyn Router>,
    clock: Arc<dyn Clock>,
    shared: Mutex<Shared>,
    time_check_interval: Duration,
}

struct Shared {
    state: SchedulerState,
    timers: Timers,
}

/// Task handles plus epochs. A timer task only acts while the epoch it was
/// spawned with is still current, checked under the state lock.
#[derive(Default)]
struct Timers {
    run_epoch: u64,
    rotation_epoch: u64,
    countdown_epoch: u64,
    rotation: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    time_check: Option<JoinHandle<()>>,
}

impl Timers {
    /// Rotation and countdown always stop together.
    fn cancel_rotation(&mut self) {
        self.rotation_epoch = self.rotation_epoch.wrapping_add(1);
        if let Some(handle) = self.rotation.take() {
            handle.abort();
        }
        self.cancel_countdown();
    }

    fn cancel_countdown(&mut self) {
        self.countdown_epoch = self.countdown_epoch.wrapping_add(1);
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_rotation();
        self.run_epoch = self.run_epoch.wrapping_add(1);
        if let Some(handle) = self.time_check.take() {
            handle.abort();
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl SchedulerController {
    pub fn new(config: ScheduleConfig, router: Arc<dyn Router>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                router,
                clock,
                shared: Mutex::new(Shared {
                    state: SchedulerState::new(),
                    timers: Timers::default(),
                }),
                time_check_interval: Duration::from_secs(TIME_CHECK_INTERVAL_SECS),
            }),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.inner.config
    }

    pub async fn snapshot(&self) -> SchedulerSnapshot {
        let shared = self.inner.shared.lock().await;
        SchedulerSnapshot::from(&shared.state)
    }

    /// Screens in the sequence currently being rotated, 0 when stopped.
    pub async fn screen_count(&self) -> usize {
        let shared = self.inner.shared.lock().await;
        self.inner
            .sequence_for(&shared.state)
            .map_or(0, |sequence| sequence.screens.len())
    }

    /// Selects the first eligible sequence and begins rotating. Does not navigate.
    pub async fn start(&self) {
        let inner = &self.inner;
        let Some(sequence) = inner.config.first_eligible() else {
            log_info!("no eligible screen sequence; scheduler stays stopped");
            return;
        };

        let current_path = inner.router.current_path();
        let index = sequence.position_of(&current_path).unwrap_or(0);

        let mut shared = inner.shared.lock().await;
        shared.timers.cancel_all();
        shared
            .state
            .begin_run(sequence.id.clone(), index, sequence.interval_seconds);
        inner.spawn_time_check(&mut shared);
        if shared.state.should_rotate() {
            inner.spawn_rotation(&mut shared, sequence.interval_seconds);
        }

        log_info!(
            "scheduler started: sequence {} at index {} ({}), every {}s",
            sequence.id,
            index,
            current_path,
            sequence.interval_seconds
        );
    }

    pub async fn stop(&self) {
        let mut shared = self.inner.shared.lock().await;
        shared.timers.cancel_all();
        if shared.state.is_active() {
            log_info!("scheduler stopped");
        }
        shared.state.stop();
    }

    /// Returns whether this call moved a running scheduler into the paused state.
    pub async fn pause(&self) -> bool {
        let mut shared = self.inner.shared.lock().await;
        if shared.state.status != SchedulerStatus::Active {
            return false;
        }
        shared.state.status = SchedulerStatus::Paused;
        shared.timers.cancel_rotation();
        log_info!("scheduler paused");
        true
    }

    /// Restarts rotation from a full interval.
    pub async fn resume(&self) {
        let inner = &self.inner;
        let mut shared = inner.shared.lock().await;
        if shared.state.status != SchedulerStatus::Paused {
            return;
        }
        shared.state.status = SchedulerStatus::Active;
        if let Some(sequence) = inner.sequence_for(&shared.state) {
            shared.state.time_until_next_nav = sequence.interval_seconds;
            if shared.state.should_rotate() {
                inner.spawn_rotation(&mut shared, sequence.interval_seconds);
            }
        }
        log_info!("scheduler resumed");
    }

    pub async fn navigate_to_next(&self) {
        self.navigate_manually(Step::Forward).await;
    }

    pub async fn navigate_to_previous(&self) {
        self.navigate_manually(Step::Back).await;
    }

    /// Host visibility signal. Hiding stops the rotation timers at once;
    /// showing again restarts them from a full interval.
    pub async fn set_visible(&self, visible: bool) {
        let inner = &self.inner;
        let mut shared = inner.shared.lock().await;
        if shared.state.visible == visible {
            return;
        }
        shared.state.visible = visible;
        log_debug!("display visibility changed: {visible}");

        if !visible {
            shared.timers.cancel_rotation();
        } else if shared.state.should_rotate() {
            if let Some(sequence) = inner.sequence_for(&shared.state) {
                inner.spawn_rotation(&mut shared, sequence.interval_seconds);
            }
        }
    }

    async fn navigate_manually(&self, step: Step) {
        let inner = &self.inner;
        let mut shared = inner.shared.lock().await;
        if !shared.state.is_active() {
            return;
        }
        let Some(sequence) = inner.sequence_for(&shared.state) else {
            return;
        };

        inner.advance(&mut shared.state, sequence, step);
        // The next automatic advance is a full interval after any navigation.
        if shared.state.should_rotate() {
            inner.spawn_rotation(&mut shared, sequence.interval_seconds);
        }
    }
}

impl Inner {
    fn sequence_for(&self, state: &SchedulerState) -> Option<&ScreenSequence> {
        let id = state.current_sequence_id.as_deref()?;
        self.config.sequence(id)
    }

    fn advance(&self, state: &mut SchedulerState, sequence: &ScreenSequence, step: Step) {
        let index = step.apply(state.current_index, sequence.screens.len());
        let Some(path) = sequence.screens.get(index) else {
            return;
        };
        state.current_index = index;
        state.time_until_next_nav = sequence.interval_seconds;
        log_info!("navigating to {path} ({}/{})", index + 1, sequence.screens.len());
        self.router.navigate(path);
    }

    fn spawn_rotation(self: &Arc<Self>, shared: &mut Shared, interval_secs: u64) {
        shared.timers.cancel_rotation();
        shared.state.time_until_next_nav = interval_secs;

        let epoch = shared.timers.rotation_epoch;
        let period = Duration::from_secs(interval_secs.max(1));
        let weak = Arc::downgrade(self);

        shared.timers.rotation = Some(tokio::spawn(rotation_loop(weak, epoch, period)));
        self.spawn_countdown(shared);
    }

    /// Restarts the one-second countdown in phase with the latest navigation.
    fn spawn_countdown(self: &Arc<Self>, shared: &mut Shared) {
        shared.timers.cancel_countdown();
        let epoch = shared.timers.countdown_epoch;
        let weak = Arc::downgrade(self);
        shared.timers.countdown = Some(tokio::spawn(countdown_loop(weak, epoch)));
    }

    fn spawn_time_check(self: &Arc<Self>, shared: &mut Shared) {
        if let Some(handle) = shared.timers.time_check.take() {
            handle.abort();
        }
        let epoch = shared.timers.run_epoch;
        let period = self.time_check_interval;
        let weak = Arc::downgrade(self);
        shared.timers.time_check = Some(tokio::spawn(time_check_loop(weak, epoch, period)));
    }

    /// Returns false once the rotation this tick belongs to has been cancelled.
    async fn auto_advance(self: &Arc<Self>, epoch: u64) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.timers.rotation_epoch != epoch || !shared.state.should_rotate() {
            return false;
        }
        let Some(sequence) = self.sequence_for(&shared.state) else {
            return false;
        };
        self.advance(&mut shared.state, sequence, Step::Forward);
        // A countdown tick due at this same instant would eat the first second.
        self.spawn_countdown(&mut shared);
        true
    }

    async fn tick_countdown(&self, epoch: u64) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.timers.countdown_epoch != epoch {
            return false;
        }
        let Some(interval) = self
            .sequence_for(&shared.state)
            .map(|sequence| sequence.interval_seconds)
        else {
            return false;
        };
        shared.state.tick_countdown(interval);
        true
    }

    async fn check_time_specific(self: &Arc<Self>, epoch: u64) -> bool {
        let now = self.clock.now();
        let mut shared = self.shared.lock().await;
        if shared.timers.run_epoch != epoch || !shared.state.is_active() {
            return false;
        }

        match find_active_rule(&self.config.time_specific, &now) {
            Some(rule) => {
                let already_active = shared
                    .state
                    .active_time_specific
                    .as_ref()
                    .is_some_and(|active| active.id == rule.id);
                if !already_active {
                    log_info!("time-specific rule {} active at {}, showing {}", rule.id, rule.time, rule.screen);
                    shared.state.active_time_specific = Some(rule.clone());
                    shared.timers.cancel_rotation();
                    self.router.navigate(&rule.screen);
                }
            }
            None => {
                if let Some(previous) = shared.state.active_time_specific.take() {
                    log_info!("time-specific rule {} no longer matches; rotation resumes", previous.id);
                    if shared.state.should_rotate() {
                        if let Some(sequence) = self.sequence_for(&shared.state) {
                            self.spawn_rotation(&mut shared, sequence.interval_seconds);
                        }
                    }
                }
            }
        }
        true
    }
}

async fn rotation_loop(inner: Weak<Inner>, epoch: u64, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(strong) = inner.upgrade() else {
            break;
        };
        if !strong.auto_advance(epoch).await {
            break;
        }
    }
}

async fn countdown_loop(inner: Weak<Inner>, epoch: u64) {
    let mut ticker = time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(strong) = inner.upgrade() else {
            break;
        };
        if !strong.tick_countdown(epoch).await {
            break;
        }
    }
}

async fn time_check_loop(inner: Weak<Inner>, epoch: u64, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(strong) = inner.upgrade() else {
            break;
        };
        if !strong.check_time_specific(epoch).await {
            break;
        }
    }
}
