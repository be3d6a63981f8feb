//! tidingsd - The tidings background service
//!
//! This is the main entry point for the tidingsd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Schedule engine and coordinators
//! - Host adapter (local timers and display command)
//!
//! The same binary also offers one-shot subcommands to schedule, cancel and
//! list notifications. Those only touch the store; a running daemon picks the
//! changes up on its next restore pass (SIGHUP).

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidings_api::NotificationRequest;
use tidings_config::{load_config_or_default, Settings};
use tidings_core::{
    ClearCoordinator, ClearOutcome, FireCoordinator, FireOutcome, RestoreCoordinator, ScheduleEngine,
};
use tidings_host_api::{Clock, HostAdapter, HostEvent, SystemClock};
use tidings_host_local::LocalHost;
use tidings_store::{NotificationStore, SqliteStore};
use tidings_util::{default_config_path, format_millis, NotificationId, DATABASE_FILENAME, SECOND_MILLIS};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// tidingsd - Persistent, restart-safe notification scheduling
#[derive(Parser, Debug)]
#[command(name = "tidingsd")]
#[command(about = "Persistent, restart-safe notification scheduling", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/tidings/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set TIDINGS_DATA_DIR env var)
    #[arg(short, long, env = "TIDINGS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the service (default)
    Run,

    /// Persist a notification request
    Schedule(ScheduleArgs),

    /// Cancel a notification
    Cancel {
        #[arg(long)]
        id: NotificationId,
    },

    /// List persisted notifications
    List,

    /// Run a single restore pass and exit
    Restore,
}

#[derive(clap::Args, Debug)]
struct ScheduleArgs {
    #[arg(long)]
    id: NotificationId,

    /// Trigger time in epoch milliseconds
    #[arg(long, conflicts_with = "in_secs")]
    at: Option<i64>,

    /// Trigger this many seconds from now
    #[arg(long)]
    in_secs: Option<i64>,

    /// Repeat interval in milliseconds
    #[arg(long, default_value_t = 0)]
    repeat_ms: i64,

    /// Deliver even while the device is idle
    #[arg(long)]
    idle: bool,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    body: Option<String>,
}

impl ScheduleArgs {
    fn to_request(&self, now: i64) -> NotificationRequest {
        let at_time = match (self.at, self.in_secs) {
            (Some(at), _) => at,
            (None, Some(secs)) => now.saturating_add(secs.saturating_mul(SECOND_MILLIS)),
            (None, None) => 0,
        };

        let mut request = NotificationRequest::new(self.id)
            .with_at_time(at_time)
            .with_repeat_interval(self.repeat_ms)
            .with_alert_while_idle(self.idle);
        if let Some(title) = &self.title {
            request = request.with_field("title", title.as_str());
        }
        if let Some(body) = &self.body {
            request = request.with_field("body", body.as_str());
        }
        request
    }
}

/// Main service state
struct Service {
    engine: ScheduleEngine,
    host: Arc<LocalHost>,
    clock: Arc<dyn Clock>,
}

impl Service {
    fn new(settings: &Settings, store: Arc<dyn NotificationStore>) -> Result<Self> {
        let host = Arc::new(
            LocalHost::new(settings.display.command.clone()).context("Failed to create local host")?,
        );

        match &settings.display.command {
            Some(command) => info!(program = %command.program, "Display command configured"),
            None => info!("No display command configured, notifications are logged only"),
        }

        let engine = ScheduleEngine::new(store, host.clone());

        Ok(Self {
            engine,
            host,
            clock: Arc::new(SystemClock),
        })
    }

    fn restore_pass(&self) {
        match RestoreCoordinator::new(&self.engine).restore(self.clock.now_millis()) {
            Ok(report) if !report.is_clean() => warn!(
                malformed = ?report.malformed,
                failed = ?report.failed,
                "Restore pass finished with problems"
            ),
            Ok(report) => debug!(processed = report.processed.len(), "Restore pass finished"),
            Err(e) => error!(error = %e, "Restore pass failed"),
        }
    }

    fn handle_host_event(&self, event: HostEvent) {
        let now = self.clock.now_millis();

        match event {
            HostEvent::WakeFired { id } => match FireCoordinator::new(&self.engine).on_fired(id, now) {
                Ok(FireOutcome::Delivered(_)) => {}
                Ok(FireOutcome::Missing) => {
                    // Stale wake for a request that is gone
                    if let Err(e) = self.host.disarm_wake(id) {
                        warn!(id = %id, error = %e, "Failed to disarm stale wake");
                    }
                }
                Err(e) => warn!(id = %id, error = %e, "Failed to deliver fired notification"),
            },
            HostEvent::Dismissed { id } => match ClearCoordinator::new(&self.engine).on_cleared(id, now) {
                Ok(ClearOutcome::Missing) => debug!(id = %id, "Dismissal for unknown notification"),
                Ok(_) => {}
                Err(e) => warn!(id = %id, error = %e, "Failed to handle dismissal"),
            },
        }
    }

    async fn run(self) -> Result<()> {
        let mut host_events = self
            .host
            .subscribe()
            .context("Host event stream already taken")?;

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        self.restore_pass();

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }

                // SIGHUP - pick up requests written by other invocations
                _ = sighup.recv() => {
                    info!("Received SIGHUP, running restore pass");
                    self.restore_pass();
                }

                Some(event) = host_events.recv() => {
                    debug!(event = ?event, "Host event");
                    self.handle_host_event(event);
                }
            }
        }

        info!("Shutting down tidingsd");
        Ok(())
    }
}

fn open_store(data_dir: &Path) -> Result<Arc<SqliteStore>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(store))
}

fn schedule(store: &dyn NotificationStore, args: &ScheduleArgs, now: i64) -> Result<()> {
    let request = args.to_request(now);
    request.validate()?;
    store.save(&request)?;

    info!(id = %request.id, at_time = request.at_time, "Notification request saved");
    println!("Scheduled notification {}", request.id);
    if request.at_time != 0 {
        println!("  at {}", format_millis(request.at_time));
    }
    println!("Send SIGHUP to a running tidingsd to apply it.");
    Ok(())
}

fn list(store: &dyn NotificationStore) -> Result<()> {
    let history = store.fired_snapshot()?;
    let entries = store.get_all_raw()?;

    if entries.is_empty() {
        println!("No notifications");
        return Ok(());
    }

    for (id, json) in entries {
        let Ok(request) = NotificationRequest::from_json(&json) else {
            println!("{id:>6}  <malformed>");
            continue;
        };

        let when = if request.is_immediate() {
            "immediate".to_string()
        } else {
            format_millis(request.at_time)
        };
        let repeat = if request.is_repeating() {
            format!("every {}ms", request.repeat_interval)
        } else {
            "once".to_string()
        };
        let fired = history
            .get(&id)
            .map(|at| format_millis(*at))
            .unwrap_or_else(|| "never".to_string());

        println!(
            "{id:>6}  {when}  {repeat}{}  last fired: {fired}  {}",
            if request.alert_while_idle { " (idle)" } else { "" },
            request.title().unwrap_or(""),
        );
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let level = args.log_level.as_deref().unwrap_or(&settings.service.log_level);
    init_logging(level, args.log_json);

    if tidings_util::is_mock_time_active() {
        warn!("Mock time is active; wakes are scheduled against the shifted clock");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        "tidingsd starting"
    );

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.service.data_dir.clone());
    let store = open_store(&data_dir)?;
    let now = SystemClock.now_millis();

    match args.command.unwrap_or(Cmd::Run) {
        Cmd::Run => Service::new(&settings, store)?.run().await,
        Cmd::Schedule(schedule_args) => schedule(store.as_ref(), &schedule_args, now),
        Cmd::Cancel { id } => {
            if store.get_raw(id)?.is_none() {
                bail!("No notification with id {id}");
            }
            store.remove(id)?;
            println!("Cancelled notification {id}");
            Ok(())
        }
        Cmd::List => list(store.as_ref()),
        Cmd::Restore => {
            let service = Service::new(&settings, store)?;
            let report = RestoreCoordinator::new(&service.engine).restore(now)?;
            println!(
                "Restored {} notifications ({} malformed, {} failed)",
                report.processed.len(),
                report.malformed.len(),
                report.failed.len()
            );
            Ok(())
        }
    }
}
