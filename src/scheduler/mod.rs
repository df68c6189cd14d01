pub mod controller;
pub mod host;
pub mod state;
pub mod time_match;

pub use controller::{SchedulerController, SchedulerSnapshot};
pub use host::{Clock, Router, SystemClock};
pub use state::{SchedulerState, SchedulerStatus};
