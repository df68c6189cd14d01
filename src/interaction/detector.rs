use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// User-interaction kinds that count as "someone is using the screen".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionSignal {
    PointerDown,
    Click,
    Scroll,
    KeyDown,
    TouchStart,
    Wheel,
}

struct Listener {
    signals: mpsc::UnboundedSender<u64>,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Reports whether the user interacted within the last `pause_duration`.
///
/// Every signal sets the paused flag and restarts the quiet-period countdown;
/// the flag clears once a full quiet period passes without signals.
pub struct InteractionDetector {
    pause_duration: Duration,
    paused: watch::Sender<bool>,
    /// Bumped by every accepted signal. Setting and clearing `paused`
    /// both happen under this lock.
    activity: Arc<Mutex<u64>>,
    listener: Mutex<Option<Listener>>,
}

impl InteractionDetector {
    pub fn new(pause_duration: Duration) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            pause_duration,
            paused,
            activity: Arc::new(Mutex::new(0)),
            listener: Mutex::new(None),
        }
    }

    pub fn pause_duration(&self) -> Duration {
        self.pause_duration
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.paused.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.lock_listener().is_some()
    }

    /// Starts listening. A no-op when already attached.
    pub fn attach(&self) {
        let mut listener = self.lock_listener();
        if listener.is_some() {
            return;
        }

        let (signals, signal_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(expiry_loop(
            signal_rx,
            self.paused.clone(),
            self.activity.clone(),
            self.pause_duration,
            cancel_token.clone(),
        ));

        *listener = Some(Listener {
            signals,
            cancel_token,
            handle,
        });
        log_debug!("interaction detector attached ({:?} quiet period)", self.pause_duration);
    }

    /// Stops listening and forgets any interaction seen so far.
    pub fn detach(&self) {
        if let Some(listener) = self.lock_listener().take() {
            listener.cancel_token.cancel();
            listener.handle.abort();
            log_debug!("interaction detector detached");
        }
        self.paused.send_replace(false);
    }

    /// Signal handler; ignored while detached.
    pub fn notify(&self, signal: InteractionSignal) {
        let listener = self.lock_listener();
        let Some(listener) = listener.as_ref() else {
            return;
        };

        let mut generation = lock(&self.activity);
        *generation = generation.wrapping_add(1);
        if listener.signals.send(*generation).is_ok() && !self.paused.send_replace(true) {
            log_info!("user interaction ({signal:?}); pausing rotation");
        }
    }

    fn lock_listener(&self) -> MutexGuard<'_, Option<Listener>> {
        lock(&self.listener)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Drop for InteractionDetector {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn expiry_loop(
    mut signals: mpsc::UnboundedReceiver<u64>,
    paused: watch::Sender<bool>,
    activity: Arc<Mutex<u64>>,
    pause_duration: Duration,
    cancel_token: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;
    let mut armed_generation = 0;
    loop {
        let expiry = async move {
            match deadline {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            signal = signals.recv() => match signal {
                Some(generation) => {
                    armed_generation = generation;
                    deadline = Some(Instant::now() + pause_duration);
                }
                None => break,
            },
            _ = expiry => {
                deadline = None;
                // A signal that raced the deadline is still queued; it re-arms next turn.
                let generation = lock(&activity);
                if *generation == armed_generation {
                    paused.send_replace(false);
                    log_info!("no interaction for {:?}; rotation may resume", pause_duration);
                }
            }
        }
    }
}
