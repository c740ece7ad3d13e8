//! Inspection workflow.
//!
//! Couples an operator's inspect/dismiss actions to the aggregator's freeze
//! state and asks an external [`ResolutionAdvisor`] for ranked options. The
//! recommendation logic itself lives outside this crate.

use thiserror::Error;
use tracing::{debug, info};

use crate::alerts::ConflictAggregator;
use crate::model::Conflict;
use crate::sync::BoxFuture;

/// Errors from the inspection workflow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// The conflict is not in the displayed feed.
    #[error("Unknown conflict: {0}")]
    UnknownConflict(String),

    /// The resolution advisor failed.
    #[error("Resolution advisor failed: {0}")]
    Advisor(String),
}

/// One ranked way to resolve a conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOption {
    /// 1-based rank, best first.
    pub rank: usize,
    pub action: String,
}

/// External collaborator that proposes resolutions for a conflict.
pub trait ResolutionAdvisor: Send + Sync {
    fn advise<'a>(
        &'a self,
        conflict: &'a Conflict,
    ) -> BoxFuture<'a, Result<Vec<ResolutionOption>, WorkflowError>>;
}

/// Ranks the conflict's own `resolution_suggestions` in server order.
#[derive(Debug, Clone, Default)]
pub struct SuggestionAdvisor;

impl ResolutionAdvisor for SuggestionAdvisor {
    fn advise<'a>(
        &'a self,
        conflict: &'a Conflict,
    ) -> BoxFuture<'a, Result<Vec<ResolutionOption>, WorkflowError>> {
        Box::pin(async move {
            Ok(conflict
                .resolution_suggestions
                .iter()
                .filter(|s| !s.trim().is_empty())
                .enumerate()
                .map(|(i, action)| ResolutionOption {
                    rank: i + 1,
                    action: action.clone(),
                })
                .collect())
        })
    }
}

/// Tracks which conflict the operator has open.
#[derive(Debug, Default)]
pub struct InspectionWorkflow {
    open: Option<String>,
}

impl InspectionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a conflict from the displayed feed, freezing the aggregator.
    ///
    /// Returns the latest authoritative copy of the conflict.
    pub fn inspect(
        &mut self,
        aggregator: &mut ConflictAggregator,
        conflict_id: &str,
    ) -> Result<Conflict, WorkflowError> {
        if aggregator.view().find(conflict_id).is_none() {
            return Err(WorkflowError::UnknownConflict(conflict_id.to_string()));
        }
        let conflict = aggregator
            .conflict(conflict_id)
            .ok_or_else(|| WorkflowError::UnknownConflict(conflict_id.to_string()))?;

        aggregator.freeze_on(conflict_id);
        self.open = Some(conflict_id.to_string());
        info!(conflict_id, "Inspection opened");
        Ok(conflict)
    }

    /// Close the open inspection and return the feed to live updates.
    pub fn dismiss(&mut self, aggregator: &mut ConflictAggregator) {
        if let Some(conflict_id) = self.open.take() {
            debug!(conflict_id = %conflict_id, "Inspection dismissed");
        }
        aggregator.unfreeze();
    }

    pub fn open(&self) -> Option<&str> {
        self.open.as_deref()
    }

    /// Forget the open inspection without touching the aggregator.
    pub fn clear(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::alerts::AlertConfig;
    use crate::model::{ConflictSource, Snapshot};

    fn aggregator_with(conflicts: Vec<Conflict>) -> ConflictAggregator {
        let mut aggregator = ConflictAggregator::new(AlertConfig::default());
        aggregator.ingest(Arc::new(Snapshot {
            predictions: conflicts,
            ..Snapshot::at_tick(1)
        }));
        aggregator
    }

    #[test]
    fn test_inspect_freezes_and_dismiss_unfreezes() {
        let mut aggregator =
            aggregator_with(vec![Conflict::new("P1", ConflictSource::Prediction, 0.7)]);
        let mut workflow = InspectionWorkflow::new();

        let conflict = workflow.inspect(&mut aggregator, "P1").unwrap();
        assert_eq!(conflict.conflict_id, "P1");
        assert!(aggregator.is_frozen());
        assert_eq!(workflow.open(), Some("P1"));

        workflow.dismiss(&mut aggregator);
        assert!(!aggregator.is_frozen());
        assert!(workflow.open().is_none());
    }

    #[test]
    fn test_inspect_unknown_conflict() {
        let mut aggregator = aggregator_with(vec![]);
        let mut workflow = InspectionWorkflow::new();
        assert_eq!(
            workflow.inspect(&mut aggregator, "nope"),
            Err(WorkflowError::UnknownConflict("nope".to_string()))
        );
        assert!(!aggregator.is_frozen());
    }

    #[tokio::test]
    async fn test_suggestion_advisor_ranks_in_order() {
        let mut conflict = Conflict::new("P1", ConflictSource::Prediction, 0.7);
        conflict.resolution_suggestions = vec![
            "Hold IC 501 at Milano Centrale".to_string(),
            " ".to_string(),
            "Reroute R 2231 via platform 4".to_string(),
        ];

        let options = SuggestionAdvisor.advise(&conflict).await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].rank, 1);
        assert_eq!(options[1].rank, 2);
        assert_eq!(options[1].action, "Reroute R 2231 via platform 4");
    }
}
