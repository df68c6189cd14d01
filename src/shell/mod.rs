pub mod controls;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use log::{debug, info};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    interaction::{InteractionDetector, InteractionSignal},
    scheduler::SchedulerController,
};

pub use controls::{ControlAction, ControlsView, NavigationControls};

const DEFAULT_INTERACTION_PAUSE_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    Other,
}

/// Kiosk presentation layer: the scheduler plus the interaction detector
/// and the floating navigation controls.
pub struct KioskShell {
    scheduler: SchedulerController,
    detector: InteractionDetector,
    controls: NavigationControls,
    /// Set only while the current pause was caused by the detector.
    paused_by_interaction: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl KioskShell {
    pub fn new(scheduler: SchedulerController) -> Self {
        let pause_secs = scheduler
            .config()
            .first_eligible()
            .map_or(DEFAULT_INTERACTION_PAUSE_SECS, |sequence| {
                sequence.pause_on_interaction_seconds
            });

        Self {
            scheduler,
            detector: InteractionDetector::new(Duration::from_secs(pause_secs)),
            controls: NavigationControls::default(),
            paused_by_interaction: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn scheduler(&self) -> &SchedulerController {
        &self.scheduler
    }

    pub fn detector(&self) -> &InteractionDetector {
        &self.detector
    }

    pub fn controls(&self) -> &NavigationControls {
        &self.controls
    }

    /// Forwards detector pauses and host visibility into the scheduler.
    /// Re-attaching replaces the previous wiring.
    pub fn attach(&self, visibility: watch::Receiver<bool>) {
        let mut tasks = self.lock_tasks();
        for handle in tasks.drain(..) {
            handle.abort();
        }

        tasks.push(tokio::spawn(forward_interaction(
            self.detector.subscribe(),
            self.scheduler.clone(),
            self.paused_by_interaction.clone(),
        )));
        tasks.push(tokio::spawn(forward_visibility(
            visibility,
            self.scheduler.clone(),
        )));

        self.controls.pointer_moved();
        debug!("kiosk shell attached");
    }

    pub fn detach(&self) {
        for handle in self.lock_tasks().drain(..) {
            handle.abort();
        }
        self.detector.detach();
        self.controls.reset();
        self.paused_by_interaction.store(false, Ordering::SeqCst);
        debug!("kiosk shell detached");
    }

    /// Starts rotation; the detector listens only while the scheduler runs.
    pub async fn start(&self) {
        self.scheduler.start().await;
        if self.scheduler.snapshot().await.is_active {
            self.detector.attach();
        }
    }

    pub async fn stop(&self) {
        self.detector.detach();
        self.paused_by_interaction.store(false, Ordering::SeqCst);
        self.scheduler.stop().await;
    }

    pub async fn toggle_pause(&self) {
        // Manual toggles own the pause from here on.
        self.paused_by_interaction.store(false, Ordering::SeqCst);
        if self.scheduler.snapshot().await.is_paused {
            self.scheduler.resume().await;
        } else {
            self.scheduler.pause().await;
        }
    }

    pub async fn press(&self, action: ControlAction) {
        match action {
            ControlAction::Previous => self.scheduler.navigate_to_previous().await,
            ControlAction::TogglePause => self.toggle_pause().await,
            ControlAction::Next => self.scheduler.navigate_to_next().await,
        }
    }

    /// Keyboard shortcuts while the scheduler runs. Any other key counts as
    /// an interaction. Returns whether the key was consumed as a shortcut.
    pub async fn handle_key(&self, key: Key) -> bool {
        let action = match key {
            Key::ArrowLeft => ControlAction::Previous,
            Key::ArrowRight => ControlAction::Next,
            Key::Space => ControlAction::TogglePause,
            Key::Other => {
                self.interaction(InteractionSignal::KeyDown);
                return false;
            }
        };
        if !self.scheduler.snapshot().await.is_active {
            return false;
        }
        self.press(action).await;
        true
    }

    pub fn interaction(&self, signal: InteractionSignal) {
        self.detector.notify(signal);
    }

    pub fn pointer_moved(&self) {
        self.controls.pointer_moved();
    }

    pub async fn controls_view(&self) -> Option<ControlsView> {
        let snapshot = self.scheduler.snapshot().await;
        let total = self.scheduler.screen_count().await;
        self.controls.view(&snapshot, total)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for KioskShell {
    fn drop(&mut self) {
        for handle in self.lock_tasks().drain(..) {
            handle.abort();
        }
    }
}

async fn forward_interaction(
    mut paused: watch::Receiver<bool>,
    scheduler: SchedulerController,
    paused_by_interaction: Arc<AtomicBool>,
) {
    while paused.changed().await.is_ok() {
        let interacting = *paused.borrow_and_update();
        if interacting {
            if scheduler.pause().await {
                paused_by_interaction.store(true, Ordering::SeqCst);
            }
        } else if paused_by_interaction.swap(false, Ordering::SeqCst) {
            info!("interaction quiet period over; resuming rotation");
            scheduler.resume().await;
        }
    }
}

async fn forward_visibility(mut visible: watch::Receiver<bool>, scheduler: SchedulerController) {
    let initial = *visible.borrow_and_update();
    scheduler.set_visible(initial).await;
    while visible.changed().await.is_ok() {
        let now_visible = *visible.borrow_and_update();
        scheduler.set_visible(now_visible).await;
    }
}
