//! `logs <service>`: collect a service's log entries.

use async_trait::async_trait;
use futures::StreamExt;
use gantry_core::ServiceLogEntry;
use gantry_dispatch::Params;
use serde_json::Value;

use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::Result;

pub struct LogsCommand;

#[async_trait]
impl Command for LogsCommand {
    fn name(&self) -> &'static [&'static str] {
        &["logs"]
    }

    fn help(&self) -> &'static str {
        "Retrieve the logs of a service"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::positional(
            "service",
            "The service to read logs from",
            ParameterType::String,
        )]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let service = args.require("service")?;
        let stream = ctx
            .dispatcher
            .service_logs(ctx.service_target(service), Params::new())
            .await?;
        let entries: Vec<ServiceLogEntry> = stream.collect().await;
        Ok(serde_json::to_value(entries)?)
    }
}
