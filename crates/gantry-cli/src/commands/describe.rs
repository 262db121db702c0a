//! `describe-type <type>`: documentation and schema for a module type.

use async_trait::async_trait;
use gantry_core::actions;
use gantry_dispatch::Params;
use serde_json::Value;

use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::Result;

pub struct DescribeTypeCommand;

#[async_trait]
impl Command for DescribeTypeCommand {
    fn name(&self) -> &'static [&'static str] {
        &["describe-type"]
    }

    fn help(&self) -> &'static str {
        "Show documentation and schema of a module type"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::positional(
            "type",
            "The module type to describe",
            ParameterType::String,
        )]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let module_type = args.require("type")?;
        let description = ctx
            .call::<actions::DescribeType>(ctx.module_target(module_type), Params::new())
            .await?;
        Ok(serde_json::to_value(description)?)
    }
}
