//! The conflict aggregator and its freeze state machine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use super::classify::{colour_of, effective_severity, AlertColour, RiskLevel};
use super::config::{AlertConfig, AlertFilter};
use super::risk::RiskSummary;
use crate::model::{Conflict, Severity, Snapshot};
use crate::sync::CadenceControl;

/// One classified entry of the alert feed.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertItem {
    pub conflict: Conflict,
    pub severity: Severity,
    pub risk: RiskLevel,
    pub colour: AlertColour,
    /// Tick at which this conflict id was first observed in the current run.
    pub first_seen_tick: u64,
}

impl AlertItem {
    fn classify(conflict: Conflict, first_seen_tick: u64) -> Self {
        Self {
            severity: effective_severity(&conflict),
            risk: RiskLevel::from_probability(conflict.probability),
            colour: colour_of(&conflict),
            first_seen_tick,
            conflict,
        }
    }

    pub fn id(&self) -> &str {
        &self.conflict.conflict_id
    }
}

/// The alert feed as presented.
///
/// `predictions` holds the full filtered and sorted set; only
/// [`displayed_predictions`](Self::displayed_predictions) is capped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertViewState {
    /// Detections, most severe first.
    pub detections: Vec<AlertItem>,
    /// Predictions passing the filter, most probable first.
    pub predictions: Vec<AlertItem>,
    pub display_cap: usize,
    pub risk: RiskSummary,
    /// Tick of the snapshot this view was computed from.
    pub tick: Option<u64>,
    pub frozen: bool,
}

impl AlertViewState {
    pub fn displayed_detections(&self) -> &[AlertItem] {
        &self.detections
    }

    pub fn displayed_predictions(&self) -> &[AlertItem] {
        &self.predictions[..self.predictions.len().min(self.display_cap)]
    }

    /// Size of the full filtered prediction set.
    pub fn total_predictions(&self) -> usize {
        self.predictions.len()
    }

    /// Displayed items in feed order: detections first, then predictions.
    pub fn items(&self) -> impl Iterator<Item = &AlertItem> {
        self.detections.iter().chain(self.displayed_predictions())
    }

    /// Ids in feed order.
    pub fn ids(&self) -> Vec<&str> {
        self.items().map(AlertItem::id).collect()
    }

    pub fn find(&self, conflict_id: &str) -> Option<&AlertItem> {
        self.detections
            .iter()
            .chain(self.predictions.iter())
            .find(|item| item.id() == conflict_id)
    }
}

/// The conflict currently under inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionState {
    pub conflict_id: String,
    /// Whether the latest snapshot still carries this conflict.
    pub still_active: bool,
}

/// Merges predictions and detections into a stable, ranked alert feed.
///
/// # State machine
///
/// ```text
/// Live --[freeze / freeze_on(id)]--> Frozen     (pause requested)
/// Frozen --[ingest]--> Frozen                   (view unchanged, latest kept)
/// Frozen --[unfreeze]--> Live                   (resume requested, recompute)
/// any --[reset]--> Live (empty)
/// ```
pub struct ConflictAggregator {
    config: AlertConfig,
    filter: AlertFilter,
    view: AlertViewState,
    latest: Option<Arc<Snapshot>>,
    first_seen: HashMap<String, u64>,
    frozen: bool,
    inspected: Option<String>,
    cadence: Option<CadenceControl>,
}

impl ConflictAggregator {
    pub fn new(config: AlertConfig) -> Self {
        let view = AlertViewState {
            display_cap: config.cap(AlertFilter::default().mode),
            ..AlertViewState::default()
        };
        Self {
            config,
            filter: AlertFilter::default(),
            view,
            latest: None,
            first_seen: HashMap::new(),
            frozen: false,
            inspected: None,
            cadence: None,
        }
    }

    /// Couple freeze transitions to a cadence pause/resume signal.
    pub fn with_cadence(mut self, cadence: CadenceControl) -> Self {
        self.cadence = Some(cadence);
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn filter(&self) -> &AlertFilter {
        &self.filter
    }

    /// Change the filter. A frozen view picks it up on unfreeze.
    pub fn set_filter(&mut self, filter: AlertFilter) {
        self.filter = filter;
        if !self.frozen {
            self.recompute();
        }
    }

    /// Accept a new authoritative snapshot.
    pub fn ingest(&mut self, snapshot: Arc<Snapshot>) {
        let tick = snapshot.tick_number;
        for conflict in snapshot.detections.iter().chain(&snapshot.predictions) {
            self.first_seen
                .entry(conflict.conflict_id.clone())
                .or_insert(tick);
        }
        self.latest = Some(snapshot);

        if self.frozen {
            debug!(tick, "Alert view frozen, snapshot held");
        } else {
            self.recompute();
        }
    }

    /// The view as presented.
    pub fn view(&self) -> &AlertViewState {
        &self.view
    }

    /// The full alert set as of the latest snapshot, ignoring freeze.
    pub fn live_view(&self) -> AlertViewState {
        self.compute()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze the view while the operator inspects `conflict_id`.
    pub fn freeze_on(&mut self, conflict_id: impl Into<String>) {
        let conflict_id = conflict_id.into();
        info!(conflict_id = %conflict_id, "Inspecting conflict");
        self.inspected = Some(conflict_id);
        self.freeze();
    }

    /// Hold the displayed list stable. Pauses the cadence on transition.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        self.view.frozen = true;
        if let Some(cadence) = &self.cadence {
            cadence.pause();
        }
        debug!("Alert view frozen");
    }

    /// Return to live updates, recomputing from the latest snapshot.
    pub fn unfreeze(&mut self) {
        self.inspected = None;
        if !self.frozen {
            return;
        }
        self.frozen = false;
        if let Some(cadence) = &self.cadence {
            cadence.resume();
        }
        self.recompute();
        debug!("Alert view live");
    }

    /// The conflict under inspection, if any.
    pub fn inspection(&self) -> Option<InspectionState> {
        let conflict_id = self.inspected.clone()?;
        let still_active = self.latest_contains(&conflict_id);
        Some(InspectionState {
            conflict_id,
            still_active,
        })
    }

    /// Latest authoritative copy of a conflict, falling back to the displayed one.
    pub fn conflict(&self, conflict_id: &str) -> Option<Conflict> {
        self.latest
            .as_ref()
            .and_then(|s| {
                s.detections
                    .iter()
                    .chain(&s.predictions)
                    .rev()
                    .find(|c| c.conflict_id == conflict_id)
                    .cloned()
            })
            .or_else(|| self.view.find(conflict_id).map(|i| i.conflict.clone()))
    }

    /// Drop all state from the previous run.
    pub fn reset(&mut self) {
        let was_frozen = self.frozen;
        self.latest = None;
        self.first_seen.clear();
        self.inspected = None;
        self.frozen = false;
        if was_frozen {
            if let Some(cadence) = &self.cadence {
                cadence.resume();
            }
        }
        self.recompute();
        debug!("Alert feed reset");
    }

    fn latest_contains(&self, conflict_id: &str) -> bool {
        self.latest.as_ref().is_some_and(|s| {
            s.detections
                .iter()
                .chain(&s.predictions)
                .any(|c| c.conflict_id == conflict_id)
        })
    }

    fn recompute(&mut self) {
        self.view = self.compute();
    }

    fn compute(&self) -> AlertViewState {
        let mut view = AlertViewState {
            display_cap: self.config.cap(self.filter.mode),
            frozen: self.frozen,
            ..AlertViewState::default()
        };
        let Some(snapshot) = &self.latest else {
            return view;
        };
        view.tick = Some(snapshot.tick_number);
        view.risk = RiskSummary::from_predictions(&snapshot.predictions);

        view.detections = dedup_last(&snapshot.detections)
            .into_iter()
            .map(|c| self.item(c, snapshot.tick_number))
            .collect();
        view.detections
            .sort_by(|a, b| b.severity.cmp(&a.severity));

        let detected: HashSet<&str> = view.detections.iter().map(AlertItem::id).collect();
        let mut predictions: Vec<AlertItem> = dedup_last(&snapshot.predictions)
            .into_iter()
            .filter(|c| !detected.contains(c.conflict_id.as_str()))
            .map(|c| self.item(c, snapshot.tick_number))
            .filter(|item| self.passes_filter(item))
            .collect();
        predictions.sort_by(|a, b| b.conflict.probability.total_cmp(&a.conflict.probability));
        view.predictions = predictions;

        view
    }

    fn item(&self, conflict: &Conflict, tick: u64) -> AlertItem {
        let first_seen = self
            .first_seen
            .get(&conflict.conflict_id)
            .copied()
            .unwrap_or(tick);
        AlertItem::classify(conflict.clone(), first_seen)
    }

    fn passes_filter(&self, item: &AlertItem) -> bool {
        if self.filter.has_severity_filter() {
            self.filter.severities.contains(&item.severity)
        } else {
            item.conflict.probability >= self.config.probability_floor
        }
    }
}

/// Keep one entry per id: the last occurrence's data at the first occurrence's position.
fn dedup_last(conflicts: &[Conflict]) -> Vec<&Conflict> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<&Conflict> = Vec::with_capacity(conflicts.len());
    for conflict in conflicts {
        match index.get(conflict.conflict_id.as_str()) {
            Some(&i) => out[i] = conflict,
            None => {
                index.insert(conflict.conflict_id.as_str(), out.len());
                out.push(conflict);
            }
        }
    }
    out
}
