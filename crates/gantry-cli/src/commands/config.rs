//! `config get|set|delete`: provider-held configuration values.

use async_trait::async_trait;
use gantry_core::actions;
use serde_json::{json, Value};
use tracing::info;

use super::key_params;
use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::{CommandError, Result};

fn key_parameter() -> ParameterSpec {
    ParameterSpec::positional(
        "key",
        "The key of the configuration variable, dot-separated",
        ParameterType::String,
    )
}

pub struct ConfigGetCommand;

#[async_trait]
impl Command for ConfigGetCommand {
    fn name(&self) -> &'static [&'static str] {
        &["config", "get"]
    }

    fn help(&self) -> &'static str {
        "Get a configuration variable"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![key_parameter()]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let key = args.require("key")?;
        let result = ctx
            .call::<actions::GetSecret>(ctx.provider_target(), key_params(key))
            .await?;
        Ok(json!({ "key": key, "value": result.value }))
    }
}

pub struct ConfigSetCommand;

#[async_trait]
impl Command for ConfigSetCommand {
    fn name(&self) -> &'static [&'static str] {
        &["config", "set"]
    }

    fn help(&self) -> &'static str {
        "Set a configuration variable"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            key_parameter(),
            ParameterSpec::positional("value", "The value to store", ParameterType::String),
        ]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let key = args.require("key")?;
        let mut params = key_params(key);
        params.insert("value".into(), json!(args.require("value")?));
        ctx.call::<actions::SetSecret>(ctx.provider_target(), params)
            .await?;
        info!(key, "set config key");
        Ok(json!({ "ok": true }))
    }
}

pub struct ConfigDeleteCommand;

#[async_trait]
impl Command for ConfigDeleteCommand {
    fn name(&self) -> &'static [&'static str] {
        &["config", "delete"]
    }

    fn alias(&self) -> Option<&'static [&'static str]> {
        Some(&["config", "del"])
    }

    fn help(&self) -> &'static str {
        "Delete a configuration variable"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![key_parameter()]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let key = args.require("key")?;
        let result = ctx
            .call::<actions::DeleteSecret>(ctx.provider_target(), key_params(key))
            .await?;
        if !result.found {
            return Err(CommandError::not_found(
                format!("Could not find config key {key}"),
                key,
            ));
        }
        info!(key, "deleted config key");
        Ok(json!({ "ok": true }))
    }
}
