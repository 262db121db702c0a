//! Gantry Dispatch
//!
//! Uniform, validated invocation of provider actions:
//! - `Provider`: the trait every provider implements
//! - `ProviderRegistry`: immutable map of providers to the actions they declare
//! - `ActionDispatcher`: routes invocations and validates every result
//! - `ServiceLogStream`: streamed `getServiceLogs` entries
//! - `LocalProvider`: in-memory provider driven by a `gantry.toml` project

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod local;
pub mod logs;
pub mod provider;
pub mod registry;

pub use config::{
    ModuleDefinition, ProjectConfig, ServiceDefinition, TaskDefinition, TestDefinition,
    PROJECT_FILE,
};
pub use dispatcher::ActionDispatcher;
pub use error::{ConfigError, DispatchError, Result};
pub use local::LocalProvider;
pub use logs::{LogSink, ServiceLogStream};
pub use provider::{ActionRequest, Params, Provider};
pub use registry::{ProviderRegistry, RegistryBuilder};
