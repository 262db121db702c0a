//! `env status|prepare|cleanup`: environment lifecycle.

use async_trait::async_trait;
use gantry_core::actions;
use gantry_dispatch::Params;
use serde_json::{json, Value};
use tracing::info;

use crate::command::{Command, CommandContext, ParameterSpec, ParameterValues};
use crate::error::Result;

pub struct EnvStatusCommand;

#[async_trait]
impl Command for EnvStatusCommand {
    fn name(&self) -> &'static [&'static str] {
        &["env", "status"]
    }

    fn help(&self) -> &'static str {
        "Show the status of the environment"
    }

    async fn action(&self, ctx: &CommandContext, _args: &ParameterValues) -> Result<Value> {
        let status = ctx
            .call::<actions::GetEnvironmentStatus>(ctx.provider_target(), Params::new())
            .await?;
        Ok(serde_json::to_value(status)?)
    }
}

pub struct EnvPrepareCommand;

#[async_trait]
impl Command for EnvPrepareCommand {
    fn name(&self) -> &'static [&'static str] {
        &["env", "prepare"]
    }

    fn help(&self) -> &'static str {
        "Prepare the environment for deployments"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::flag(
            "force",
            "Prepare even if the environment reports ready",
        )]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let target = ctx.provider_target();
        let status = ctx
            .call::<actions::GetEnvironmentStatus>(target.clone(), Params::new())
            .await?;
        if status.can_proceed() && !args.bool("force") {
            info!(environment = %ctx.project.environment, "environment already ready");
            return Ok(json!({ "ready": true, "prepared": false }));
        }

        ctx.call::<actions::PrepareEnvironment>(target.clone(), Params::new())
            .await?;
        let status = ctx
            .call::<actions::GetEnvironmentStatus>(target, Params::new())
            .await?;
        info!(environment = %ctx.project.environment, ready = status.ready, "prepared environment");
        Ok(json!({ "ready": status.ready, "prepared": true }))
    }
}

pub struct EnvCleanupCommand;

#[async_trait]
impl Command for EnvCleanupCommand {
    fn name(&self) -> &'static [&'static str] {
        &["env", "cleanup"]
    }

    fn help(&self) -> &'static str {
        "Tear down the environment"
    }

    async fn action(&self, ctx: &CommandContext, _args: &ParameterValues) -> Result<Value> {
        ctx.call::<actions::CleanupEnvironment>(ctx.provider_target(), Params::new())
            .await?;
        Ok(json!({ "ok": true }))
    }
}
