use std::sync::Mutex;

use log::info;

use crate::{scheduler::Router, shell::Key};

/// Router for the headless runner: remembers the current path and logs
/// every navigation instead of rendering it.
pub struct ConsoleRouter {
    current: Mutex<String>,
}

impl ConsoleRouter {
    pub fn new(start_path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(start_path.into()),
        }
    }
}

impl Router for ConsoleRouter {
    fn navigate(&self, path: &str) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        info!("-> {path}");
        *current = path.to_string();
    }

    fn current_path(&self) -> String {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Key(Key),
}

impl ConsoleCommand {
    /// Any line that is not a known command counts as a key press.
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "left" => Self::Key(Key::ArrowLeft),
            "right" => Self::Key(Key::ArrowRight),
            "space" => Self::Key(Key::Space),
            _ => Self::Key(Key::Other),
        }
    }
}
