//! Gantry CLI
//!
//! The command layer: named commands with declared parameters that turn
//! user input into validated provider actions.

pub mod command;
pub mod commands;
pub mod error;

use std::sync::Arc;

use gantry_dispatch::{ActionDispatcher, LocalProvider, ProjectConfig, ProviderRegistry};

pub use command::{
    parameter_parser, resolve_arguments, Command, CommandContext, CommandRegistry, ParameterSpec,
    ParameterType, ParameterValues,
};
pub use error::{CommandError, Result};

/// Context backed by a [`LocalProvider`] for `project`.
pub fn local_context(project: ProjectConfig) -> Result<CommandContext> {
    let provider = LocalProvider::new(project.clone())?;
    let mut builder = ProviderRegistry::builder();
    builder.register(Arc::new(provider))?;
    let dispatcher = ActionDispatcher::with_builtin_catalog(builder.build());
    Ok(CommandContext::new(dispatcher, project))
}
