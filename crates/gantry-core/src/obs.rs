//! Structured observability hooks for action invocations.
//!
//! Each invocation runs inside an [`InvocationSpan`] tagged with a fresh
//! invocation id, the action name, and the target. Lifecycle events are
//! emitted as `event = "action.*"` fields.

use tracing::{info, warn};

use crate::action::{ActionKind, TargetDescriptor};

/// Span covering a single action invocation.
///
/// Not an entered guard: it is attached to the invocation future with
/// `tracing::Instrument`, so it stays correct across `.await` points.
pub struct InvocationSpan {
    invocation_id: String,
    span: tracing::Span,
}

impl InvocationSpan {
    pub fn new(action: ActionKind, target: &TargetDescriptor) -> Self {
        let invocation_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "gantry.action",
            invocation_id = %invocation_id,
            action = %action,
            target = %target,
        );
        Self {
            invocation_id,
            span,
        }
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}

pub fn emit_action_invoked(action: ActionKind, target: &TargetDescriptor) {
    info!(event = "action.invoked", action = %action, target = %target);
}

pub fn emit_action_completed(action: ActionKind, target: &TargetDescriptor, duration_ms: u64) {
    info!(
        event = "action.completed",
        action = %action,
        target = %target,
        duration_ms = duration_ms,
    );
}

pub fn emit_validation_failed(
    action: ActionKind,
    target: &TargetDescriptor,
    error: &dyn std::fmt::Display,
) {
    warn!(event = "action.validation_failed", action = %action, target = %target, error = %error);
}

pub fn emit_provider_failed(
    action: ActionKind,
    target: &TargetDescriptor,
    error: &dyn std::fmt::Display,
) {
    warn!(event = "action.provider_failed", action = %action, target = %target, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_ids_are_unique() {
        let target = TargetDescriptor::module("local", "module-a");
        let a = InvocationSpan::new(ActionKind::Build, &target);
        let b = InvocationSpan::new(ActionKind::Build, &target);
        assert_ne!(a.invocation_id(), b.invocation_id());
    }
}
