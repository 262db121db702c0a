//! The action dispatch surface.
//!
//! `ActionDispatcher` routes an invocation to the registered provider and
//! validates whatever the provider returns against the result contract of
//! the invoked action. Callers only ever see validated results.

use std::sync::Arc;
use std::time::Instant;

use gantry_core::{
    emit_action_completed, emit_action_invoked, emit_provider_failed, emit_validation_failed,
    Action, ActionKind, ContractCatalog, InvocationSpan, TargetDescriptor, ValidatedResult,
};
use tracing::Instrument;

use crate::error::{DispatchError, Result};
use crate::logs::{self, ServiceLogStream};
use crate::provider::{ActionRequest, Params};
use crate::registry::ProviderRegistry;

/// Routes invocations to providers and validates their results.
///
/// Cheap to clone; the registry and catalog are shared read-only.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    registry: Arc<ProviderRegistry>,
    catalog: Arc<ContractCatalog>,
}

impl ActionDispatcher {
    pub fn new(registry: ProviderRegistry, catalog: ContractCatalog) -> Self {
        Self {
            registry: Arc::new(registry),
            catalog: Arc::new(catalog),
        }
    }

    /// Dispatcher using the built-in contract for every action.
    pub fn with_builtin_catalog(registry: ProviderRegistry) -> Self {
        Self::new(registry, ContractCatalog::builtin())
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ContractCatalog {
        &self.catalog
    }

    /// Invoke an action and return its validated result.
    pub async fn invoke(
        &self,
        action: ActionKind,
        target: TargetDescriptor,
        params: Params,
    ) -> Result<ValidatedResult> {
        self.dispatch(ActionRequest::new(action, target, params))
            .await
    }

    /// Invoke an action given by its wire name, e.g. `"getBuildStatus"`.
    pub async fn invoke_named(
        &self,
        action: &str,
        target: TargetDescriptor,
        params: Params,
    ) -> Result<ValidatedResult> {
        let action: ActionKind = action.parse()?;
        self.invoke(action, target, params).await
    }

    /// Invoke a typed action and decode its validated result.
    pub async fn call<A: Action>(
        &self,
        target: TargetDescriptor,
        params: Params,
    ) -> Result<A::Output> {
        let validated = self.invoke(A::KIND, target, params).await?;
        Ok(validated.decode::<A::Output>()?)
    }

    /// Invoke `getServiceLogs` and stream the entries the provider emits.
    ///
    /// Returns only after the provider's `handle` returns. A provider that
    /// follows logs must send from a spawned task holding a clone of the
    /// request's [`LogSink`](crate::LogSink); the stream ends when the last
    /// clone is dropped.
    pub async fn service_logs(
        &self,
        target: TargetDescriptor,
        params: Params,
    ) -> Result<ServiceLogStream> {
        let (sink, receiver) = logs::channel(&target.name);
        let mut request = ActionRequest::new(ActionKind::GetServiceLogs, target, params);
        request.log_sink = Some(sink);
        let result = self.dispatch(request).await?;
        Ok(ServiceLogStream::new(result, receiver))
    }

    async fn dispatch(&self, request: ActionRequest) -> Result<ValidatedResult> {
        let invocation = InvocationSpan::new(request.action, &request.target);
        self.dispatch_inner(request)
            .instrument(invocation.span())
            .await
    }

    async fn dispatch_inner(&self, request: ActionRequest) -> Result<ValidatedResult> {
        let action = request.action;
        let target = request.target.clone();

        let expected = action.target_kind();
        if target.kind != expected {
            return Err(DispatchError::TargetMismatch {
                action,
                expected,
                actual: target.kind,
            });
        }
        let provider = self.registry.resolve(&target.provider, action)?;
        let contract = self.catalog.contract(action)?;

        emit_action_invoked(action, &target);
        let started = Instant::now();

        let raw = match provider.handle(request).await {
            Ok(raw) => raw,
            Err(err) => {
                emit_provider_failed(action, &target, &err);
                return Err(DispatchError::Provider(err));
            }
        };

        match contract.validate(raw) {
            Ok(validated) => {
                emit_action_completed(action, &target, started.elapsed().as_millis() as u64);
                Ok(validated)
            }
            Err(err) => {
                emit_validation_failed(action, &target, &err);
                Err(DispatchError::Validation(err))
            }
        }
    }
}
