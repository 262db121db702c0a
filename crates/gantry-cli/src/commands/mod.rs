//! Built-in commands.

use std::collections::HashSet;
use std::sync::Arc;

use gantry_dispatch::{ModuleDefinition, Params, ProjectConfig};
use serde_json::{json, Value};

use crate::command::CommandRegistry;
use crate::error::{CommandError, Result};

pub mod build;
pub mod config;
pub mod describe;
pub mod env;
pub mod exec;
pub mod logs;
pub mod run;
pub mod test;

/// Registry holding every built-in command.
pub fn builtin() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register(Arc::new(config::ConfigGetCommand))
        .register(Arc::new(config::ConfigSetCommand))
        .register(Arc::new(config::ConfigDeleteCommand))
        .register(Arc::new(env::EnvStatusCommand))
        .register(Arc::new(env::EnvPrepareCommand))
        .register(Arc::new(env::EnvCleanupCommand))
        .register(Arc::new(build::BuildCommand))
        .register(Arc::new(test::TestCommand))
        .register(Arc::new(logs::LogsCommand))
        .register(Arc::new(exec::ExecCommand))
        .register(Arc::new(run::RunTaskCommand))
        .register(Arc::new(describe::DescribeTypeCommand));
    registry
}

/// Build an action parameter map from a JSON object literal.
pub(crate) fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Parameters addressing a dotted configuration key, e.g. `db.password`.
pub(crate) fn key_params(key: &str) -> Params {
    let segments: Vec<&str> = key.split('.').collect();
    params(json!({ "key": segments }))
}

/// Modules to process, dependencies before dependents.
///
/// With `only`, the named module and everything it depends on.
pub(crate) fn build_order<'p>(
    project: &'p ProjectConfig,
    only: Option<&str>,
) -> Result<Vec<&'p ModuleDefinition>> {
    let roots: Vec<&ModuleDefinition> = match only {
        Some(name) => vec![project.module(name).ok_or_else(|| {
            CommandError::not_found(format!("Could not find module {name}"), name)
        })?],
        None => project.modules.iter().collect(),
    };

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for root in roots {
        visit(project, root, &mut seen, &mut order);
    }
    Ok(order)
}

fn visit<'p>(
    project: &'p ProjectConfig,
    module: &'p ModuleDefinition,
    seen: &mut HashSet<&'p str>,
    order: &mut Vec<&'p ModuleDefinition>,
) {
    if !seen.insert(module.name.as_str()) {
        return;
    }
    for dependency in &module.dependencies {
        if let Some(dependency) = project.module(dependency) {
            visit(project, dependency, seen, order);
        }
    }
    order.push(module);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_order_puts_dependencies_first() {
        let project = ProjectConfig::from_toml_str(
            r#"
name = "shop"
[[modules]]
name = "web"
dependencies = ["api"]
[[modules]]
name = "api"
dependencies = ["common"]
[[modules]]
name = "common"
[[modules]]
name = "docs"
"#,
        )
        .unwrap();

        let names = |order: Vec<&ModuleDefinition>| {
            order.into_iter().map(|m| m.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(
            names(build_order(&project, None).unwrap()),
            vec!["common", "api", "web", "docs"]
        );
        assert_eq!(
            names(build_order(&project, Some("api")).unwrap()),
            vec!["common", "api"]
        );
        assert!(build_order(&project, Some("ghost")).is_err());
    }

    #[test]
    fn test_key_params_split_on_dots() {
        assert_eq!(key_params("db.password")["key"], json!(["db", "password"]));
    }

    #[test]
    fn test_every_builtin_resolves() {
        let registry = builtin();
        for command in registry.commands() {
            let words: Vec<String> = command.name().iter().map(|w| w.to_string()).collect();
            let (resolved, rest) = registry.resolve(&words).unwrap();
            assert_eq!(resolved.name(), command.name());
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn test_help_is_rendered_by_clap_for_every_command() {
        let registry = builtin();
        let help = registry.help_text();
        assert_eq!(help.lines().count(), registry.commands().len());
        assert!(help.contains("<service> <command>..."), "{help}");

        let words: Vec<String> = ["config", "delete"].iter().map(|w| w.to_string()).collect();
        let usage = registry.command_help(&words).unwrap();
        assert!(usage.contains("<key>"), "{usage}");
        assert!(usage.contains("Delete"), "{usage}");
    }
}
