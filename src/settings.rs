use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::{db::Database, models::ScheduleConfig};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const SCHEDULE_CONFIG_KEY: &str = "screen-scheduler-config";

const DEFAULT_DB_PATH: &str = "hearthboard.sqlite3";
const DEFAULT_START_PATH: &str = "/calendar";

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskSettings {
    pub db_path: PathBuf,
    pub start_path: String,
    pub debug: bool,
}

impl KioskSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("HEARTHBOARD_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            db_path: lookup("HEARTHBOARD_DB")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            start_path: lookup("HEARTHBOARD_START_PATH")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_START_PATH.to_string()),
            debug,
        }
    }
}

/// Loads and saves the schedule as one JSON blob.
#[derive(Clone)]
pub struct ScheduleStore {
    db: Database,
}

impl ScheduleStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stored config, or the built-in default when absent or malformed.
    pub async fn load(&self) -> ScheduleConfig {
        let blob = match self.db.get_blob(SCHEDULE_CONFIG_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                log_info!("No stored schedule; using built-in default");
                return ScheduleConfig::default();
            }
            Err(err) => {
                log_warn!("Failed to read stored schedule, using default: {err:#}");
                return ScheduleConfig::default();
            }
        };

        match parse_config(&blob.value) {
            Ok(config) => config,
            Err(err) => {
                log_warn!("Stored schedule is malformed, using default: {err:#}");
                ScheduleConfig::default()
            }
        }
    }

    /// Best effort: failures are logged and otherwise ignored.
    pub async fn save(&self, config: &ScheduleConfig) {
        if let Err(err) = self.try_save(config).await {
            log_warn!("Failed to persist schedule: {err:#}");
        }
    }

    async fn try_save(&self, config: &ScheduleConfig) -> Result<()> {
        let encoded = serde_json::to_string(config).context("failed to encode schedule")?;
        self.db.put_blob(SCHEDULE_CONFIG_KEY, encoded).await
    }
}

fn parse_config(raw: &str) -> Result<ScheduleConfig> {
    let value: Value = serde_json::from_str(raw).context("schedule is not valid JSON")?;
    for field in ["sequences", "timeSpecific"] {
        if !value.get(field).is_some_and(Value::is_array) {
            bail!("schedule is missing the `{field}` array");
        }
    }
    serde_json::from_value(value).context("schedule entries do not match the expected shape")
}

#[cfg(test)]
mod tests {
    use crate::{
        db::testing::temp_db_path,
        models::{ScreenSequence, SequentialIds, TimeSpecificNavigation},
    };

    use super::*;

    fn store() -> (ScheduleStore, Database) {
        let db = Database::new(temp_db_path()).unwrap();
        (ScheduleStore::new(db.clone()), db)
    }

    #[tokio::test]
    async fn missing_blob_loads_default() {
        let (store, _) = store();
        assert_eq!(store.load().await, ScheduleConfig::default());
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let (store, _) = store();
        let ids = SequentialIds::default();
        let mut sequence = ScreenSequence::create(&ids, "Evening");
        sequence.screens = vec!["/recipe".into(), "/tasks".into()];
        let mut rule = TimeSpecificNavigation::create(&ids, "/recipe", "17:30");
        rule.days = Some(vec![1, 2, 3, 4, 5]);
        let config = ScheduleConfig {
            sequences: vec![sequence],
            time_specific: vec![rule],
        };

        store.save(&config).await;
        assert_eq!(store.load().await, config);
    }

    #[tokio::test]
    async fn config_missing_an_array_is_replaced_wholesale() {
        let (store, db) = store();
        db.put_blob(
            SCHEDULE_CONFIG_KEY,
            r#"{"sequences":[{"id":"s1","name":"x","enabled":true,"screens":["/tasks"],"intervalSeconds":5,"pauseOnInteractionSeconds":5}]}"#.into(),
        )
        .await
        .unwrap();
        assert_eq!(store.load().await, ScheduleConfig::default());
    }

    #[tokio::test]
    async fn garbage_and_wrong_shapes_load_default() {
        let (store, db) = store();
        for raw in [
            "not json",
            "[]",
            r#"{"sequences":{},"timeSpecific":[]}"#,
            r#"{"sequences":[{"id":"s1"}],"timeSpecific":[]}"#,
        ] {
            db.put_blob(SCHEDULE_CONFIG_KEY, raw.into()).await.unwrap();
            assert_eq!(store.load().await, ScheduleConfig::default(), "{raw}");
        }
    }

    #[test]
    fn empty_arrays_are_valid() {
        let config = parse_config(r#"{"sequences":[],"timeSpecific":[]}"#).unwrap();
        assert!(config.sequences.is_empty());
        assert!(config.first_eligible().is_none());
    }

    #[test]
    fn settings_defaults_and_overrides() {
        let defaults = KioskSettings::from_lookup(|_| None);
        assert_eq!(defaults.db_path, PathBuf::from("hearthboard.sqlite3"));
        assert_eq!(defaults.start_path, "/calendar");
        assert!(!defaults.debug);

        let custom = KioskSettings::from_lookup(|name| match name {
            "HEARTHBOARD_DB" => Some("/var/lib/hearthboard/store.sqlite3".into()),
            "HEARTHBOARD_START_PATH" => Some("/tasks".into()),
            "HEARTHBOARD_DEBUG" => Some("TRUE".into()),
            _ => None,
        });
        assert_eq!(custom.db_path, PathBuf::from("/var/lib/hearthboard/store.sqlite3"));
        assert_eq!(custom.start_path, "/tasks");
        assert!(custom.debug);
    }
}
