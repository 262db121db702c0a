//! `exec <service> <command...>`: run a command inside a running service.

use async_trait::async_trait;
use gantry_core::actions;
use serde_json::{json, Value};

use super::params;
use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::Result;

pub struct ExecCommand;

#[async_trait]
impl Command for ExecCommand {
    fn name(&self) -> &'static [&'static str] {
        &["exec"]
    }

    fn help(&self) -> &'static str {
        "Execute a command in a running service"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::positional("service", "The service to exec in", ParameterType::String),
            ParameterSpec::positional("command", "The command to run", ParameterType::List),
        ]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let service = args.require("service")?;
        let command = args.list("command");
        let result = ctx
            .call::<actions::ExecInService>(
                ctx.service_target(service),
                params(json!({ "command": command })),
            )
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}
