use chrono::{Local, NaiveDateTime};

/// Navigation capability of the hosting application.
///
/// `navigate` is fire-and-forget: the scheduler never waits on it and
/// assumes `current_path` reflects the request once it returns.
pub trait Router: Send + Sync {
    fn navigate(&self, path: &str);
    fn current_path(&self) -> String;
}

/// Local wall-clock source; no timezone normalization.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::{Clock, Router};

    /// Records every navigation request.
    pub struct RecordingRouter {
        current: Mutex<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRouter {
        pub fn at(path: &str) -> Self {
            Self {
                current: Mutex::new(path.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Router for RecordingRouter {
        fn navigate(&self, path: &str) {
            *self.current.lock().unwrap() = path.to_string();
            self.calls.lock().unwrap().push(path.to_string());
        }

        fn current_path(&self) -> String {
            self.current.lock().unwrap().clone()
        }
    }

    /// Wall clock that only moves when told to.
    pub struct ManualClock {
        now: Mutex<NaiveDateTime>,
    }

    impl ManualClock {
        /// Saturday 2026-10-17 at `hour:minute:00`.
        pub fn at(hour: u32, minute: u32) -> Self {
            let now = NaiveDate::from_ymd_opt(2026, 10, 17)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap();
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn advance_minutes(&self, minutes: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::minutes(minutes);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.now.lock().unwrap()
        }
    }
}
