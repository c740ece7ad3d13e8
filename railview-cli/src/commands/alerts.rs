//! Alerts command - show the alert feed, optionally inspecting one conflict.

use super::common::{alert_filter, print_alerts, ConnectArgs, SeverityArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the alerts command.
pub struct AlertsArgs {
    pub connect: ConnectArgs,
    pub show_all: bool,
    pub severities: Vec<SeverityArg>,
    pub inspect: Option<String>,
}

/// Run the alerts command against the current server state.
pub fn run(args: AlertsArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&args.connect)?;
    runner.log_startup("alerts");
    let filter = alert_filter(args.show_all, &args.severities);

    runner.with_dashboard(|app| async move {
        app.set_alert_filter(filter);
        app.refresh().await?;
        print_alerts(&app.alerts());

        if let Some(conflict_id) = args.inspect {
            let inspection = app.inspect(&conflict_id).await?;
            let conflict = &inspection.conflict;

            println!();
            println!("Conflict {}", conflict.conflict_id);
            println!("  Source:   {}", conflict.source);
            println!("  Type:     {}", conflict.conflict_type);
            println!("  Location: {}", conflict.location);
            println!("  Trains:   {}", conflict.involved_trains.join(", "));
            if let Some(horizon) = conflict.prediction_horizon_min {
                println!("  Horizon:  {} min", horizon);
            }
            if !conflict.explanation.is_empty() {
                println!("  {}", conflict.explanation);
            }
            println!();
            if inspection.options.is_empty() {
                println!("No resolution options available");
            } else {
                println!("Resolution options:");
                for option in &inspection.options {
                    println!("  {}. {}", option.rank, option.action);
                }
            }
            app.dismiss();
        }
        Ok(())
    })
}
