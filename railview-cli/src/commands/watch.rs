//! Watch command - follow the live simulation until Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::common::{alert_filter, print_alerts, print_positions, ConnectArgs, SeverityArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the watch command.
pub struct WatchArgs {
    pub connect: ConnectArgs,
    pub show_all: bool,
    pub severities: Vec<SeverityArg>,
    /// Seconds between status prints.
    pub print_interval: u64,
    /// Also print every train's interpolated position.
    pub positions: bool,
}

/// Run the watch command.
pub fn run(args: WatchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&args.connect)?;
    runner.log_startup("watch");
    let config = runner.config();

    println!("Railview v{}", railview::VERSION);
    println!("================");
    println!();
    println!("Server:    {}", config.server.base_url);
    println!("Transport: {}", config.server.transport);
    if let Some(file) = &config.logging.file {
        println!("Log file:  {}", file.display());
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let filter = alert_filter(args.show_all, &args.severities);
    let print_interval = Duration::from_secs(args.print_interval.max(1));
    let show_positions = args.positions;

    runner.with_dashboard(|app| async move {
        app.set_alert_filter(filter);
        app.start_cadence()?;

        let mut last_print: Option<Instant> = None;
        while !shutdown.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;

            if last_print.is_some_and(|t| t.elapsed() < print_interval) {
                continue;
            }
            last_print = Some(Instant::now());

            let status = app.status();
            let tick = status
                .sync
                .tick
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            let error = status
                .sync
                .error
                .as_ref()
                .map(|e| format!(" | Error: {}", e))
                .unwrap_or_default();
            println!(
                "[{}] Tick {} | Trains: {} | Applied: {} | Stale: {} | Failures: {}{}",
                status.sync.feed,
                tick,
                status.tracked_trains,
                status.sync.stats.applied,
                status.sync.stats.stale_discarded,
                status.sync.stats.failures,
                error
            );
            if show_positions {
                print_positions(&app.positions());
            }
            print_alerts(&app.alerts());
            println!();
        }

        let stats = app.sync().stats();
        println!();
        println!("Session Summary");
        println!("───────────────");
        println!("  Snapshots applied:   {}", stats.applied);
        println!("  Stale discarded:     {}", stats.stale_discarded);
        println!("  Superseded requests: {}", stats.superseded);
        println!("  Failed requests:     {}", stats.failures);
        Ok(())
    })
}
