//! Submission flow state machine.
//!
//! One logical flow per run: collect a snapshot, ask for consent, submit at
//! most once. The frontend drives the flow through three calls
//! (`request_collection`, `decline`, `request_submission`) and renders
//! whatever `state()` says — it holds no pipeline logic of its own.
//!
//! The guard is consulted before consent is ever requested and marked only
//! after a confirmed success, so "submit at most once" holds even across
//! crashes mid-upload. A `Failed` flow may be re-driven within the same run;
//! it resends the exact snapshot the user reviewed and consented to.

use crate::collect::{self, DiagnosticRecord};
use crate::guard::SubmissionGuard;
use crate::upload::{SubmissionOutcome, Uploader};
use tracing::{info, warn};

/// Observable state of the submission flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing happened yet.
    Idle,
    /// Collection in progress.
    Collecting,
    /// Record available, waiting for the user's decision.
    AwaitingConsent,
    /// Upload in flight.
    Submitting,
    /// Terminal: delivered (now or in an earlier run).
    Submitted {
        /// Outcome of the upload, `None` when the guard was already marked
        /// at startup and no upload happened this run.
        outcome: Option<SubmissionOutcome>,
        /// Set when the upload succeeded but the marker could not be
        /// persisted; a future run will offer submission again.
        guard_error: Option<String>,
    },
    /// Terminal: user opted out. Nothing was sent or persisted.
    Declined,
    /// Upload failed; may be re-driven, the guard stays unmarked.
    Failed(SubmissionOutcome),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Submitted { .. } | FlowState::Declined
        )
    }
}

/// The collection → review → idempotent submission pipeline.
pub struct SubmissionFlow<U> {
    state: FlowState,
    record: Option<DiagnosticRecord>,
    guard: SubmissionGuard,
    uploader: U,
}

impl<U: Uploader> SubmissionFlow<U> {
    pub fn new(guard: SubmissionGuard, uploader: U) -> Self {
        Self {
            state: FlowState::Idle,
            record: None,
            guard,
            uploader,
        }
    }

    /// Current flow state, for rendering.
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// The collected snapshot, once collection has run.
    pub fn record(&self) -> Option<&DiagnosticRecord> {
        self.record.as_ref()
    }

    /// Collect the snapshot and decide whether submission is offered.
    ///
    /// When the guard is already marked the flow terminates at `Submitted`
    /// directly, without prompting and without any upload. Accepted only
    /// from `Idle`; otherwise a no-op.
    pub fn request_collection(&mut self) -> &FlowState {
        if !matches!(self.state, FlowState::Idle) {
            return &self.state;
        }
        self.state = FlowState::Collecting;
        self.record = Some(collect::collect());

        self.state = if self.guard.is_already_submitted() {
            info!("installation already submitted, not offering again");
            FlowState::Submitted {
                outcome: None,
                guard_error: None,
            }
        } else {
            FlowState::AwaitingConsent
        };
        &self.state
    }

    /// User opted out. Terminal, nothing is sent or persisted.
    pub fn decline(&mut self) -> &FlowState {
        if matches!(self.state, FlowState::AwaitingConsent) {
            self.state = FlowState::Declined;
        }
        &self.state
    }

    /// User opted in: perform the one transmission attempt.
    ///
    /// Accepted from `AwaitingConsent`, and from `Failed` for a manual
    /// retry of the reviewed snapshot. The call blocks until one outcome
    /// is produced; no concurrent attempt is possible.
    pub fn request_submission(&mut self, endpoint: &str) -> &FlowState {
        if !matches!(
            self.state,
            FlowState::AwaitingConsent | FlowState::Failed(_)
        ) {
            return &self.state;
        }
        let Some(record) = self.record.clone() else {
            // Unreachable through the public API: consent implies collection.
            return &self.state;
        };

        self.state = FlowState::Submitting;
        let outcome = self.uploader.submit(endpoint, &record);
        info!(%outcome, "submission attempt finished");

        self.state = match outcome {
            SubmissionOutcome::Success { .. } => {
                let guard_error = self.guard.mark_submitted().err().map(|e| e.to_string());
                if let Some(error) = &guard_error {
                    warn!(%error, "submission delivered but marker not persisted");
                }
                FlowState::Submitted {
                    outcome: Some(outcome),
                    guard_error,
                }
            }
            failure => FlowState::Failed(failure),
        };
        &self.state
    }
}
