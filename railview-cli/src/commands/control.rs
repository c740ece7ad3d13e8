//! One-shot simulation control: step, multi-step, reset and state.

use railview::sync::FetchOutcome;

use super::common::{print_alerts, print_positions, ConnectArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// A single control request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Fetch the current state without advancing.
    State,
    Step,
    MultiStep(u32),
    Reset,
}

impl ControlAction {
    fn name(&self) -> &'static str {
        match self {
            ControlAction::State => "state",
            ControlAction::Step => "step",
            ControlAction::MultiStep(_) => "multi-step",
            ControlAction::Reset => "reset",
        }
    }
}

/// Run one control action and print the resulting snapshot summary.
pub fn run(action: ControlAction, args: ConnectArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&args)?;
    runner.log_startup(action.name());

    runner.with_dashboard(|app| async move {
        let outcome = match action {
            ControlAction::State => app.refresh().await?,
            ControlAction::Step => app.step().await?,
            ControlAction::MultiStep(n) => app.multi_step(n).await?,
            ControlAction::Reset => app.reset().await?,
        };

        match outcome {
            FetchOutcome::Applied(tick) => println!("Tick {}", tick),
            FetchOutcome::Stale { tick, last_applied } => {
                println!("Server returned tick {} (already at {})", tick, last_applied)
            }
            FetchOutcome::Superseded => println!("Request superseded"),
        }

        if let Some(snapshot) = app.sync().snapshot() {
            if !snapshot.simulation_time.is_empty() {
                println!("Simulation time: {}", snapshot.simulation_time);
            }
            println!(
                "Trains: {} | Predictions: {} | Detections: {}",
                snapshot.trains.len(),
                snapshot.predictions.len(),
                snapshot.detections.len()
            );
        }
        println!();
        print_positions(&app.positions());
        println!();
        print_alerts(&app.alerts());
        Ok(())
    })
}
