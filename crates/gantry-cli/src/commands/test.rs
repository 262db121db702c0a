//! `test [module]`: build modules, then run their tests.

use async_trait::async_trait;
use gantry_core::actions;
use serde_json::{json, Map, Value};
use tracing::info;

use super::build::build_module;
use super::{build_order, params};
use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::{CommandError, Result};

pub struct TestCommand;

#[async_trait]
impl Command for TestCommand {
    fn name(&self) -> &'static [&'static str] {
        &["test"]
    }

    fn help(&self) -> &'static str {
        "Build modules and run their tests"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::positional(
                "module",
                "Module to test (default: all modules)",
                ParameterType::String,
            )
            .optional(),
            ParameterSpec::option("name", "Only run tests with this name", ParameterType::String),
            ParameterSpec::flag("force", "Re-run tests that already passed"),
            ParameterSpec::flag("force-build", "Rebuild modules before testing"),
        ]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let name_filter = args.string("name");
        let force = args.bool("force");
        let force_build = args.bool("force-build");
        let mut results = Map::new();
        let mut ran_any = false;

        let only = args.string("module");
        for module in build_order(&ctx.project, only)? {
            let build = build_module(ctx, &module.name, force_build).await?;
            results.insert(format!("build.{}", module.name), serde_json::to_value(build)?);

            // Dependencies of a named module are built, not tested.
            if only.map_or(false, |name| name != module.name) {
                continue;
            }

            let target = ctx.module_target(&module.name);
            for test in module
                .tests
                .iter()
                .filter(|t| name_filter.map_or(true, |name| t.name == name))
            {
                ran_any = true;
                let query = params(json!({ "testName": test.name }));
                if !force {
                    let previous = ctx
                        .call::<actions::GetTestResult>(target.clone(), query.clone())
                        .await?;
                    if let Some(previous) = previous.filter(|r| r.run.success) {
                        info!(module = %module.name, test = %test.name, "test already passed");
                        results.insert(
                            format!("test.{}.{}", module.name, test.name),
                            serde_json::to_value(previous)?,
                        );
                        continue;
                    }
                }

                let result = ctx
                    .call::<actions::TestModule>(target.clone(), query)
                    .await?;
                info!(
                    module = %module.name,
                    test = %test.name,
                    success = result.run.success,
                    "ran test"
                );
                results.insert(
                    format!("test.{}.{}", module.name, test.name),
                    serde_json::to_value(result)?,
                );
            }
        }

        if let (Some(name), false) = (name_filter, ran_any) {
            return Err(CommandError::not_found(
                format!("Could not find test {name}"),
                name,
            ));
        }
        Ok(Value::Object(results))
    }
}
