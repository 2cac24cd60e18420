use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;
use crate::token::Eligibility;

#[derive(Clone, Debug)]
pub enum RefreshOutcome {
    Success,
    Rejected,
    Skipped,
}

/// Structured events for one refresh cycle, correlated by `attempt_id`.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self, waiting: usize) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            waiting,
            "refresh.start"
        );
    }

    pub fn emit_queued(&self, path: &str) {
        event!(
            Level::DEBUG,
            attempt_id = %self.attempt_id,
            context = %self.context,
            path,
            "refresh.queued"
        );
    }

    pub fn emit_skipped(&self, reason: Eligibility) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            reason = ?reason,
            outcome = ?RefreshOutcome::Skipped,
            "refresh.skipped"
        );
    }

    pub fn emit_success(&self, replayed: usize) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            outcome = ?RefreshOutcome::Success,
            replayed,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &Error, rejected: usize) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            outcome = ?RefreshOutcome::Rejected,
            rejected,
            error = %error,
            "refresh.failure"
        );
    }
}
