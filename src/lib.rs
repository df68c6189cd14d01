mod console;
pub mod db;
pub mod interaction;
pub mod models;
pub mod scheduler;
pub mod settings;
pub mod shell;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    sync::watch,
};

use console::{ConsoleCommand, ConsoleRouter};
use db::Database;
use scheduler::{SchedulerController, SystemClock};
use settings::{KioskSettings, ScheduleStore};
use shell::KioskShell;

pub fn run() -> Result<()> {
    let settings = KioskSettings::from_env();

    // Initialize logging (reads RUST_LOG env var)
    let default_level = if settings.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    info!("Hearthboard starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_kiosk(settings))
}

async fn run_kiosk(settings: KioskSettings) -> Result<()> {
    let database = Database::new(settings.db_path.clone())?;
    let store = ScheduleStore::new(database);
    let config = store.load().await;
    // Seeds the default on first run so it can be edited in place.
    store.save(&config).await;

    let router = Arc::new(ConsoleRouter::new(settings.start_path.clone()));
    let scheduler = SchedulerController::new(config, router, Arc::new(SystemClock));
    let shell = KioskShell::new(scheduler);

    // No window to hide on a console; the host is always visible.
    let (_visibility, visibility_rx) = watch::channel(true);
    shell.attach(visibility_rx);
    shell.start().await;
    log_snapshot(&shell).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(err) = result {
                    error!("Failed to listen for Ctrl-C: {err}");
                }
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    dispatch(&shell, ConsoleCommand::parse(&line)).await;
                    log_snapshot(&shell).await;
                }
                Ok(None) => {
                    debug!("stdin closed; waiting for Ctrl-C");
                    stdin_open = false;
                }
                Err(err) => {
                    error!("Failed to read stdin: {err}");
                    stdin_open = false;
                }
            },
        }
    }

    info!("Shutting down");
    shell.stop().await;
    shell.detach();
    Ok(())
}

async fn dispatch(shell: &KioskShell, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Start => shell.start().await,
        ConsoleCommand::Stop => shell.stop().await,
        ConsoleCommand::Key(key) => {
            shell.handle_key(key).await;
        }
    }
}

async fn log_snapshot(shell: &KioskShell) {
    let snapshot = shell.scheduler().snapshot().await;
    match serde_json::to_string(&snapshot) {
        Ok(json) => debug!("scheduler: {json}"),
        Err(err) => error!("Failed to encode scheduler snapshot: {err}"),
    }
}
