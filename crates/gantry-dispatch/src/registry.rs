//! Provider registry: which provider implements which actions.
//!
//! Built once through [`RegistryBuilder`] and immutable afterwards, so lookups
//! during dispatch need no locking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use gantry_core::ActionKind;
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::provider::Provider;

struct Registration {
    provider: Arc<dyn Provider>,
    actions: BTreeSet<ActionKind>,
}

/// Collects providers before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    providers: BTreeMap<String, Registration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name.
    ///
    /// Rejects a second provider with the same name and a provider that
    /// declares no actions.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<&mut Self> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(DispatchError::DuplicateProvider { provider: name });
        }
        let actions: BTreeSet<ActionKind> = provider.supported_actions().into_iter().collect();
        if actions.is_empty() {
            return Err(DispatchError::EmptyCapabilities { provider: name });
        }
        debug!(provider = %name, actions = actions.len(), "registered provider");
        self.providers
            .insert(name, Registration { provider, actions });
        Ok(self)
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}

/// Immutable mapping of provider name to provider and its capabilities.
pub struct ProviderRegistry {
    providers: BTreeMap<String, Registration>,
}

impl ProviderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the provider that must handle `action` for `provider_name`.
    pub fn resolve(&self, provider_name: &str, action: ActionKind) -> Result<Arc<dyn Provider>> {
        let registration =
            self.providers
                .get(provider_name)
                .ok_or_else(|| DispatchError::UnknownProvider {
                    provider: provider_name.to_string(),
                })?;
        if !registration.actions.contains(&action) {
            return Err(DispatchError::NoSuchCapability {
                provider: provider_name.to_string(),
                action,
            });
        }
        Ok(Arc::clone(&registration.provider))
    }

    pub fn supports(&self, provider_name: &str, action: ActionKind) -> bool {
        self.providers
            .get(provider_name)
            .is_some_and(|r| r.actions.contains(&action))
    }

    /// Registered provider names, sorted.
    pub fn providers(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Actions a provider declared, sorted; `None` for an unknown provider.
    pub fn capabilities(&self, provider_name: &str) -> Option<Vec<ActionKind>> {
        self.providers
            .get(provider_name)
            .map(|r| r.actions.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.providers.iter().map(|(name, r)| (name, &r.actions)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ActionRequest;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StaticProvider {
        name: &'static str,
        actions: Vec<ActionKind>,
    }

    #[async_trait]
    impl Provider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn supported_actions(&self) -> Vec<ActionKind> {
            self.actions.clone()
        }

        async fn handle(&self, _request: ActionRequest) -> anyhow::Result<Value> {
            Ok(json!({}))
        }
    }

    fn provider(name: &'static str, actions: &[ActionKind]) -> Arc<dyn Provider> {
        Arc::new(StaticProvider {
            name,
            actions: actions.to_vec(),
        })
    }

    #[test]
    fn test_resolve_known_capability() {
        let mut builder = ProviderRegistry::builder();
        builder
            .register(provider("local", &[ActionKind::Build, ActionKind::TestModule]))
            .unwrap();
        let registry = builder.build();

        assert!(registry.resolve("local", ActionKind::Build).is_ok());
        assert!(registry.supports("local", ActionKind::TestModule));
        assert_eq!(
            registry.capabilities("local").unwrap(),
            vec![ActionKind::Build, ActionKind::TestModule]
        );
    }

    #[test]
    fn test_unknown_provider_and_missing_capability() {
        let mut builder = ProviderRegistry::builder();
        builder.register(provider("local", &[ActionKind::Build])).unwrap();
        let registry = builder.build();

        assert!(matches!(
            registry.resolve("k8s", ActionKind::Build),
            Err(DispatchError::UnknownProvider { .. })
        ));
        assert!(matches!(
            registry.resolve("local", ActionKind::DeployService),
            Err(DispatchError::NoSuchCapability {
                action: ActionKind::DeployService,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_and_empty_registrations_rejected() {
        let mut builder = ProviderRegistry::builder();
        builder.register(provider("local", &[ActionKind::Build])).unwrap();
        assert!(matches!(
            builder.register(provider("local", &[ActionKind::RunTask])),
            Err(DispatchError::DuplicateProvider { .. })
        ));
        assert!(matches!(
            builder.register(provider("empty", &[])),
            Err(DispatchError::EmptyCapabilities { .. })
        ));

        let registry = builder.build();
        assert_eq!(registry.providers(), vec!["local"]);
        assert!(!registry.supports("local", ActionKind::RunTask));
    }
}
