//! Command definitions, argument resolution, and the command registry.
//!
//! A command is named by one or more words (`config delete`), declares its
//! parameters, and turns resolved arguments into action invocations.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use clap::builder::BoolishValueParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};
use gantry_core::{Action, TargetDescriptor};
use gantry_dispatch::{ActionDispatcher, Params, ProjectConfig};
use serde_json::Value;
use tracing::debug;

use crate::error::{CommandError, Result};

/// Type a parameter value is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Integer,
    Boolean,
    /// Comma-separated as an option; every remaining word as a positional.
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub required: bool,
    pub ty: ParameterType,
    pub positional: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn positional(name: &'static str, help: &'static str, ty: ParameterType) -> Self {
        Self {
            name,
            help,
            required: true,
            ty,
            positional: true,
            default: None,
        }
    }

    pub fn flag(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: false,
            ty: ParameterType::Boolean,
            positional: false,
            default: Some(Value::Bool(false)),
        }
    }

    pub fn option(name: &'static str, help: &'static str, ty: ParameterType) -> Self {
        Self {
            name,
            help,
            required: false,
            ty,
            positional: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// The clap argument for this parameter.
    pub fn arg(&self) -> Arg {
        let arg = Arg::new(self.name).help(self.help).required(self.required);
        let arg = if self.positional {
            arg
        } else {
            arg.long(self.name)
        };
        match (self.ty, self.positional) {
            (ParameterType::String, _) => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(String)),
            (ParameterType::Integer, _) => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(i64)),
            (ParameterType::Boolean, true) => arg
                .action(ArgAction::Set)
                .value_parser(BoolishValueParser::new()),
            // `--force` or `--force=false`; never swallows the next word.
            (ParameterType::Boolean, false) => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            (ParameterType::List, true) => arg
                .action(ArgAction::Append)
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(String)),
            (ParameterType::List, false) => arg
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(value_parser!(String)),
        }
    }

    fn read(&self, matches: &ArgMatches) -> Result<Option<Value>> {
        let lookup = |err: clap::parser::MatchesError| {
            CommandError::parameter(format!("{}: {err}", self.name))
        };
        let value = match self.ty {
            ParameterType::String => matches
                .try_get_one::<String>(self.name)
                .map_err(lookup)?
                .map(|s| Value::String(s.clone())),
            ParameterType::Integer => matches
                .try_get_one::<i64>(self.name)
                .map_err(lookup)?
                .map(|n| Value::from(*n)),
            ParameterType::Boolean => matches
                .try_get_one::<bool>(self.name)
                .map_err(lookup)?
                .map(|b| Value::Bool(*b)),
            ParameterType::List => matches
                .try_get_many::<String>(self.name)
                .map_err(lookup)?
                .map(|items| {
                    Value::Array(
                        items
                            .filter(|s| !s.is_empty())
                            .map(|s| Value::String(s.clone()))
                            .collect(),
                    )
                }),
        };
        Ok(value)
    }
}

/// Arguments after parsing, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues {
    values: BTreeMap<String, Value>,
}

impl ParameterValues {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// A required string parameter; parsing guarantees its presence.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.string(name)
            .ok_or_else(|| CommandError::parameter(format!("missing required parameter {name}")))
    }

    pub fn bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }
}

/// Build a clap parser for a parameter list.
///
/// Words are parsed without a binary name; `bin_name` only shows in usage.
pub fn parameter_parser(
    bin_name: String,
    about: &'static str,
    specs: &[ParameterSpec],
) -> ClapCommand {
    ClapCommand::new("gantry")
        .bin_name(bin_name)
        .about(about)
        .no_binary_name(true)
        .disable_version_flag(true)
        .args(specs.iter().map(ParameterSpec::arg))
}

/// Resolve raw words against parameter specs.
///
/// Accepts positionals in declaration order, `--key=value`, `--key value`,
/// `key=value` for declared options, and bare `--flag` for booleans. A
/// positional list takes every remaining word; `--` ends option parsing.
pub fn resolve_arguments(specs: &[ParameterSpec], raw: &[String]) -> Result<ParameterValues> {
    parse_with(parameter_parser("gantry".to_string(), "", specs), specs, raw)
}

fn parse_with(
    parser: ClapCommand,
    specs: &[ParameterSpec],
    raw: &[String],
) -> Result<ParameterValues> {
    let matches = parser
        .try_get_matches_from(option_words(specs, raw))
        .map_err(|err| CommandError::parameter(err.to_string().trim_end()))?;

    let mut values = ParameterValues::default();
    for spec in specs {
        match (spec.read(&matches)?, &spec.default) {
            (Some(value), _) => values.insert(spec.name, value),
            (None, Some(default)) => values.insert(spec.name, default.clone()),
            (None, None) => {}
        }
    }
    Ok(values)
}

/// Rewrite `key=value` words naming a declared option to `--key=value`.
fn option_words(specs: &[ParameterSpec], raw: &[String]) -> Vec<String> {
    let declared = |key: &str| specs.iter().any(|s| !s.positional && s.name == key);
    let mut options_done = false;
    raw.iter()
        .map(|word| {
            if word == "--" {
                options_done = true;
            }
            match word.split_once('=') {
                Some((key, _)) if !options_done && !word.starts_with('-') && declared(key) => {
                    format!("--{word}")
                }
                _ => word.clone(),
            }
        })
        .collect()
}

/// Everything a command needs to reach providers.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub dispatcher: ActionDispatcher,
    pub project: ProjectConfig,
}

impl CommandContext {
    pub fn new(dispatcher: ActionDispatcher, project: ProjectConfig) -> Self {
        Self {
            dispatcher,
            project,
        }
    }

    /// Name of the provider that handles this project's actions.
    pub fn provider(&self) -> &str {
        &self.project.provider
    }

    pub fn provider_target(&self) -> TargetDescriptor {
        TargetDescriptor::provider(self.provider())
    }

    pub fn module_target(&self, module: &str) -> TargetDescriptor {
        TargetDescriptor::module(self.provider(), module)
    }

    pub fn service_target(&self, service: &str) -> TargetDescriptor {
        TargetDescriptor::service(self.provider(), service)
    }

    pub fn task_target(&self, task: &str) -> TargetDescriptor {
        TargetDescriptor::task(self.provider(), task)
    }

    /// Invoke a typed action and decode its validated result.
    pub async fn call<A: Action>(&self, target: TargetDescriptor, params: Params) -> Result<A::Output> {
        Ok(self.dispatcher.call::<A>(target, params).await?)
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Words naming the command, e.g. `["config", "delete"]`.
    fn name(&self) -> &'static [&'static str];

    /// Alternative words, e.g. `["config", "del"]`.
    fn alias(&self) -> Option<&'static [&'static str]> {
        None
    }

    fn help(&self) -> &'static str;

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn action(&self, ctx: &CommandContext, args: &ParameterValues) -> Result<Value>;
}

/// Resolves command words to commands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Arc<dyn Command>) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    /// Longest match of a command name or alias against the leading words.
    ///
    /// Returns the command and the words left over as its arguments.
    pub fn resolve<'w>(&self, words: &'w [String]) -> Result<(Arc<dyn Command>, &'w [String])> {
        let fits = |name: &[&str]| {
            name.len() <= words.len() && name.iter().zip(words).all(|(n, w)| *n == w.as_str())
        };
        self.commands
            .iter()
            .filter_map(|command| {
                let names = std::iter::once(command.name()).chain(command.alias());
                names
                    .filter(|name| fits(name))
                    .map(|name| name.len())
                    .max()
                    .map(|len| (command, len))
            })
            .max_by_key(|(_, len)| *len)
            .map(|(command, len)| (Arc::clone(command), &words[len..]))
            .ok_or_else(|| CommandError::UnknownCommand(words.join(" ")))
    }

    /// Resolve, parse arguments, and run a command.
    pub async fn run(&self, ctx: &CommandContext, words: &[String]) -> Result<Value> {
        let (command, rest) = self.resolve(words)?;
        let specs = command.parameters();
        let args = parse_with(parser(command.as_ref(), &specs), &specs, rest)?;
        debug!(command = %command.name().join(" "), ?args, "running command");
        command.action(ctx, &args).await
    }

    /// One line per command: clap usage and help text.
    pub fn help_text(&self) -> String {
        let mut lines: Vec<String> = self
            .commands
            .iter()
            .map(|command| {
                let rendered = parser(command.as_ref(), &command.parameters())
                    .render_usage()
                    .to_string();
                let usage = rendered.strip_prefix("Usage: ").unwrap_or(&rendered);
                format!("  {usage:<44} {}", command.help())
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Full clap help for one command.
    pub fn command_help(&self, words: &[String]) -> Result<String> {
        let (command, _) = self.resolve(words)?;
        Ok(parser(command.as_ref(), &command.parameters())
            .render_help()
            .to_string())
    }
}

fn parser(command: &dyn Command, specs: &[ParameterSpec]) -> ClapCommand {
    parameter_parser(command.name().join(" "), command.help(), specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::positional("service", "Service name", ParameterType::String),
            ParameterSpec::positional("command", "Command to run", ParameterType::List),
            ParameterSpec::flag("interactive", "Attach a TTY"),
            ParameterSpec::option("replicas", "Replica count", ParameterType::Integer),
        ]
    }

    #[test]
    fn test_positionals_and_trailing_list() {
        let args = resolve_arguments(&specs(), &words(&["api", "echo", "hello", "world"])).unwrap();
        assert_eq!(args.string("service"), Some("api"));
        assert_eq!(args.list("command"), vec!["echo", "hello", "world"]);
        assert!(!args.bool("interactive"));
        assert_eq!(args.integer("replicas"), None);
    }

    #[test]
    fn test_option_forms() {
        for raw in [
            vec!["--replicas=3", "api", "ls"],
            vec!["--replicas", "3", "api", "ls"],
            vec!["api", "replicas=3", "ls"],
        ] {
            let args = resolve_arguments(&specs(), &words(&raw)).unwrap();
            assert_eq!(args.integer("replicas"), Some(3), "{raw:?}");
            assert_eq!(args.list("command"), vec!["ls"], "{raw:?}");
        }
    }

    #[test]
    fn test_bare_flag_and_double_dash() {
        let args = resolve_arguments(
            &specs(),
            &words(&["--interactive", "api", "--", "ls", "--all"]),
        )
        .unwrap();
        assert!(args.bool("interactive"));
        assert_eq!(args.list("command"), vec!["ls", "--all"]);
    }

    #[test]
    fn test_errors_name_the_parameter() {
        let err = resolve_arguments(&specs(), &words(&["api"])).unwrap_err();
        assert!(err.to_string().contains("<command>"));

        let err = resolve_arguments(&specs(), &words(&["--verbose", "api", "ls"])).unwrap_err();
        assert!(err.to_string().contains("--verbose"));

        let err =
            resolve_arguments(&specs(), &words(&["--replicas=many", "api", "ls"])).unwrap_err();
        assert!(err.to_string().contains("--replicas"));

        let err = resolve_arguments(&specs(), &words(&["--interactive", "api"])).unwrap_err();
        assert!(matches!(err, CommandError::Parameter(_)));
    }

    #[test]
    fn test_key_value_after_double_dash_stays_positional() {
        let args =
            resolve_arguments(&specs(), &words(&["api", "--", "replicas=3", "-x"])).unwrap();
        assert_eq!(args.integer("replicas"), None);
        assert_eq!(args.list("command"), vec!["replicas=3", "-x"]);
    }

    #[test]
    fn test_flag_accepts_explicit_value_without_swallowing_words() {
        let raw = words(&["--interactive=false", "api", "ls"]);
        let args = resolve_arguments(&specs(), &raw).unwrap();
        assert!(!args.bool("interactive"));

        let args = resolve_arguments(&specs(), &words(&["api", "interactive=yes", "ls"])).unwrap();
        assert!(args.bool("interactive"));
        assert_eq!(args.list("command"), vec!["ls"]);
    }

    #[test]
    fn test_parser_usage_lists_parameters() {
        let usage = parameter_parser("exec".to_string(), "Run a command", &specs())
            .render_usage()
            .to_string();
        assert!(usage.contains("exec"), "{usage}");
        assert!(usage.contains("<service>"), "{usage}");
        assert!(usage.contains("<command>"), "{usage}");
    }

    #[test]
    fn test_defaults_and_extra_positionals() {
        let specs = vec![
            ParameterSpec::positional("module", "Module", ParameterType::String).optional(),
            ParameterSpec::option("name", "Filter", ParameterType::String),
        ];
        let args = resolve_arguments(&specs, &[]).unwrap();
        assert_eq!(args.get("module"), None);

        let err = resolve_arguments(&specs, &words(&["a", "b"])).unwrap_err();
        assert!(matches!(err, CommandError::Parameter(_)));

        let args = resolve_arguments(&specs, &words(&["--name", "unit"])).unwrap();
        assert_eq!(args.get("name"), Some(&json!("unit")));
    }
}
