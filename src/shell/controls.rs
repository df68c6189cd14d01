use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time};

use crate::scheduler::SchedulerSnapshot;

pub const AUTO_HIDE_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Previous,
    TogglePause,
    Next,
}

/// What the floating controls show. Hidden controls stay mounted; only
/// `visible` flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
    pub visible: bool,
    pub previous_label: &'static str,
    pub toggle_label: &'static str,
    pub next_label: &'static str,
    pub position: String,
}

impl ControlsView {
    /// `None` while the scheduler is stopped.
    pub fn render(snapshot: &SchedulerSnapshot, total_screens: usize, visible: bool) -> Option<Self> {
        if !snapshot.is_active {
            return None;
        }
        Some(Self {
            visible,
            previous_label: "Previous",
            toggle_label: if snapshot.is_paused { "Resume" } else { "Pause" },
            next_label: "Next",
            position: format!("{} / {}", snapshot.current_index + 1, total_screens),
        })
    }
}

struct HideTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct ControlsInner {
    hide_after: Duration,
    visible: watch::Sender<bool>,
    hide: Mutex<HideTimer>,
}

/// Visibility of the floating controls: shown on pointer movement, hidden
/// after `hide_after` without any.
pub struct NavigationControls {
    inner: Arc<ControlsInner>,
}

impl NavigationControls {
    pub fn new(hide_after: Duration) -> Self {
        let (visible, _) = watch::channel(true);
        Self {
            inner: Arc::new(ControlsInner {
                hide_after,
                visible,
                hide: Mutex::new(HideTimer {
                    generation: 0,
                    handle: None,
                }),
            }),
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Shows the controls and restarts the hide countdown.
    pub fn pointer_moved(&self) {
        let mut hide = lock(&self.inner.hide);
        hide.generation = hide.generation.wrapping_add(1);
        if let Some(handle) = hide.handle.take() {
            handle.abort();
        }
        self.inner.visible.send_replace(true);

        let generation = hide.generation;
        let inner = self.inner.clone();
        hide.handle = Some(tokio::spawn(async move {
            time::sleep(inner.hide_after).await;
            let hide = lock(&inner.hide);
            if hide.generation == generation {
                inner.visible.send_replace(false);
            }
        }));
    }

    /// Drops any pending hide countdown and shows the controls.
    pub fn reset(&self) {
        let mut hide = lock(&self.inner.hide);
        hide.generation = hide.generation.wrapping_add(1);
        if let Some(handle) = hide.handle.take() {
            handle.abort();
        }
        self.inner.visible.send_replace(true);
    }

    pub fn view(&self, snapshot: &SchedulerSnapshot, total_screens: usize) -> Option<ControlsView> {
        ControlsView::render(snapshot, total_screens, self.is_visible())
    }
}

impl Default for NavigationControls {
    fn default() -> Self {
        Self::new(AUTO_HIDE_AFTER)
    }
}

impl Drop for NavigationControls {
    fn drop(&mut self) {
        self.reset();
    }
}

fn lock(hide: &Mutex<HideTimer>) -> MutexGuard<'_, HideTimer> {
    match hide.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
