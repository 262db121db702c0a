//! `run task <task>`: run a task unless it is already done.

use async_trait::async_trait;
use gantry_core::actions;
use gantry_dispatch::Params;
use serde_json::{json, Value};
use tracing::info;

use crate::command::{Command, CommandContext, ParameterSpec, ParameterType, ParameterValues};
use crate::error::{CommandError, Result};

pub struct RunTaskCommand;

#[async_trait]
impl Command for RunTaskCommand {
    fn name(&self) -> &'static [&'static str] {
        &["run", "task"]
    }

    fn help(&self) -> &'static str {
        "Run a task"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::positional("task", "The task to run", ParameterType::String),
            ParameterSpec::flag("force", "Run the task even if it is already done"),
        ]
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value> {
        let task = args.require("task")?;
        if ctx.project.task(task).is_none() {
            return Err(CommandError::not_found(
                format!("Could not find task {task}"),
                task,
            ));
        }

        let target = ctx.task_target(task);
        if !args.bool("force") {
            let status = ctx
                .call::<actions::GetTaskStatus>(target.clone(), Params::new())
                .await?;
            if status.done {
                info!(task, "task already done");
                return Ok(json!({ "taskName": task, "done": true, "skipped": true }));
            }
        }

        let result = ctx.call::<actions::RunTask>(target, Params::new()).await?;
        info!(task, success = result.run.success, "ran task");
        Ok(serde_json::to_value(result)?)
    }
}
