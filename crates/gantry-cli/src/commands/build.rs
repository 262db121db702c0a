//! `build [module]`: build modules in dependency order.

use async_trait::async_trait;
use gantry_core::{actions, BuildResult};
use gantry_dispatch::Params;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{build_order, params};
use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::Result;

pub struct BuildCommand;

/// Build one module unless its build is already ready.
pub(crate) async fn build_module(
    ctx: &CommandContext,
    module: &str,
    force: bool,
) -> Result<BuildResult> {
    let target = ctx.module_target(module);
    if !force {
        let status = ctx
            .call::<actions::GetBuildStatus>(target.clone(), Params::new())
            .await?;
        if status.ready {
            info!(module, "build is up to date");
            return Ok(BuildResult {
                fresh: Some(false),
                ..BuildResult::default()
            });
        }
    }
    let result = ctx
        .call::<actions::Build>(target, params(json!({ "force": force })))
        .await?;
    info!(module, fresh = result.is_fresh(), "built module");
    Ok(result)
}

#[async_trait]
impl Command for BuildCommand {
    fn name(&self) -> &'static [&'static str] {
        &["build"]
    }

    fn help(&self) -> &'static str {
        "Build modules, dependencies first"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::positional(
                "module",
                "Module to build (default: all modules)",
                ParameterType::String,
            )
            .optional(),
            ParameterSpec::flag("force", "Rebuild even if the build is up to date"),
        ]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let force = args.bool("force");
        let mut results = Map::new();
        for module in build_order(&ctx.project, args.string("module"))? {
            let result = build_module(ctx, &module.name, force).await?;
            results.insert(format!("build.{}", module.name), serde_json::to_value(result)?);
        }
        Ok(Value::Object(results))
    }
}
