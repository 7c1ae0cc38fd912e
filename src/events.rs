//! # Ceremony Events
//!
//! The orchestrator reports what it is doing through [`CeremonyObserver`]
//! instead of printing. Callers plug in whatever they need (UI status line,
//! metrics, test recorder); [`TracingObserver`] is the default and forwards
//! everything to `tracing`.

use crate::ceremony::{CeremonyKind, CeremonyState};
use crate::error::ErrorKind;
use uuid::Uuid;

/// Something observable happened during a ceremony
#[derive(Debug, Clone, PartialEq)]
pub enum CeremonyEvent {
    /// The state machine moved
    Transition {
        ceremony_id: Uuid,
        kind: CeremonyKind,
        from: CeremonyState,
        to: CeremonyState,
    },
    /// The ceremony ended in `Failed`
    Failed {
        ceremony_id: Uuid,
        kind: CeremonyKind,
        error: ErrorKind,
        message: String,
    },
    /// A ceremony could not start because another one is running
    Rejected {
        kind: CeremonyKind,
        running: Uuid,
    },
}

pub trait CeremonyObserver: Send + Sync {
    fn on_event(&self, event: &CeremonyEvent);
}

/// Logs ceremony events with `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CeremonyObserver for TracingObserver {
    fn on_event(&self, event: &CeremonyEvent) {
        match event {
            CeremonyEvent::Transition {
                ceremony_id,
                kind,
                from,
                to,
            } => {
                tracing::debug!(%ceremony_id, ?kind, ?from, ?to, "ceremony transition");
            }
            CeremonyEvent::Failed {
                ceremony_id,
                kind,
                error,
                message,
            } => {
                tracing::warn!(%ceremony_id, ?kind, ?error, "ceremony failed: {}", message);
            }
            CeremonyEvent::Rejected { kind, running } => {
                tracing::warn!(?kind, %running, "ceremony rejected: another is in progress");
            }
        }
    }
}
