use std::ffi::OsString;
use std::marker::PhantomData;
use std::mem;
use std::path::PathBuf;

use clap::builder::Styles;
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::error::ParamError;
use crate::loader::ScriptLoader;
use crate::parameter::Parameter;
use crate::storage::Origin;
use crate::value::Value;

/// Id of the built-in `-p/--param-file` option.
pub const PARAM_FILE: &str = "param_file";
/// Id of the built-in `-c/--config-file` option.
pub const CONFIG_FILE: &str = "config_file";
/// Id of the built-in `-D/--define` option.
pub const DEFINE: &str = "define";

/// Command-line front end producing one populated parameter of type `P`.
///
/// Besides the built-in options, every argument registered through
/// [`add_argument`](ParameterCli::add_argument) is copied onto the parameter
/// under its clap id when the user supplies it.
pub struct ParameterCli<P> {
    command: Command,
    options: Vec<String>,
    matches: Option<ArgMatches>,
    _param: PhantomData<fn() -> P>,
}

impl<P: Parameter + Default> Default for ParameterCli<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Parameter + Default> ParameterCli<P> {
    pub fn new() -> Self {
        Self::with_args(|_| {})
    }

    /// Build the front end and let `load_args` register extra options.
    pub fn with_args<F: FnOnce(&mut Self)>(load_args: F) -> Self {
        let mut cli = ParameterCli {
            command: Self::load_default_args(Command::new("cdp-param")),
            options: Vec::new(),
            matches: None,
            _param: PhantomData,
        };
        load_args(&mut cli);
        cli
    }

    fn load_default_args(command: Command) -> Command {
        command
            .arg(
                Arg::new(PARAM_FILE)
                    .short('p')
                    .long("param-file")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .help("Lua script to load parameters from, before any other option"),
            )
            .arg(
                Arg::new(CONFIG_FILE)
                    .short('c')
                    .long("config-file")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .help("TOML or JSON file loaded before the parameter script"),
            )
            .arg(
                Arg::new(DEFINE)
                    .short('D')
                    .long("define")
                    .value_name("NAME=VALUE")
                    .action(ArgAction::Append)
                    .value_parser(parse_define)
                    .help("Set a parameter directly, overriding files"),
            )
    }

    /// Rename the underlying command, as shown in usage messages.
    pub fn name(&mut self, name: &'static str) -> &mut Self {
        self.command = mem::take(&mut self.command).name(name);
        self
    }

    /// Register an option. Its clap id is the attribute it fills.
    pub fn add_argument(&mut self, arg: Arg) -> &mut Self {
        self.options.push(arg.get_id().as_str().to_string());
        self.command = mem::take(&mut self.command).arg(arg);
        self
    }

    /// Parse `tokens` (without the program name) and keep the result.
    pub fn add_args_and_values<I, T>(&mut self, tokens: I) -> Result<(), ParamError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let bin = OsString::from(self.command.get_name());
        let argv = std::iter::once(bin).chain(tokens.into_iter().map(Into::into));
        let matches = self.command.try_get_matches_from_mut(argv)?;
        self.matches = Some(matches);
        Ok(())
    }

    pub fn matches(&self) -> Option<&ArgMatches> {
        self.matches.as_ref()
    }

    /// Build the parameter, loading scripts through the process-wide loader.
    pub fn get_parameter(&self) -> Result<P, ParamError> {
        self.build_parameter(|p, path| p.load_parameter_from_py(path))
    }

    /// Build the parameter, loading scripts through `loader`.
    pub fn get_parameter_with(&self, loader: &mut ScriptLoader) -> Result<P, ParamError> {
        self.build_parameter(|p, path| p.load_parameter_from_script(loader, path))
    }

    fn build_parameter<F>(&self, mut load_script: F) -> Result<P, ParamError>
    where
        F: FnMut(&mut P, &PathBuf) -> Result<(), ParamError>,
    {
        let matches = self.matches.as_ref().ok_or(ParamError::NotParsed)?;
        let mut parameter = P::default();

        if let Some(path) = matches.get_one::<PathBuf>(CONFIG_FILE) {
            parameter.load_parameter_from_config(path)?;
        }
        if let Some(path) = matches.get_one::<PathBuf>(PARAM_FILE) {
            load_script(&mut parameter, path)?;
        }
        if let Some(defines) = matches.get_many::<(String, String)>(DEFINE) {
            for (name, value) in defines {
                tracing::debug!(name = %name, value = %value, "applying define");
                parameter.set_attr_from(
                    name.clone(),
                    Value::Text(value.clone()),
                    Origin::CommandLine,
                )?;
            }
        }

        for arg in self.command.get_arguments() {
            let id = arg.get_id().as_str();
            if !self.options.iter().any(|o| o == id) {
                continue;
            }
            let from_default = match matches.value_source(id) {
                None => continue,
                Some(ValueSource::DefaultValue) => true,
                Some(_) => false,
            };
            if from_default && parameter.get_attr(id).is_some() {
                continue;
            }
            if let Some(value) = option_value(matches, arg) {
                tracing::debug!(name = %id, value = %value, "applying command-line option");
                parameter.set_attr_from(id.to_string(), value, Origin::CommandLine)?;
            }
        }
        Ok(parameter)
    }
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{}`", s)),
    }
}

fn option_value(matches: &ArgMatches, arg: &Arg) -> Option<Value> {
    let id = arg.get_id().as_str();
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => {
            return Some(Value::Boolean(matches.get_flag(id)))
        }
        ArgAction::Count => return Some(Value::Int(i64::from(matches.get_count(id)))),
        _ => {}
    }
    let raw: Vec<Value> = matches
        .get_raw(id)?
        .map(|s| Value::Text(s.to_string_lossy().into_owned()))
        .collect();
    let multiple = matches!(arg.get_action(), ArgAction::Append)
        || arg.get_num_args().is_some_and(|r| r.max_values() > 1);
    if multiple {
        Some(Value::List(raw))
    } else {
        raw.into_iter().next()
    }
}

/// Print clap's usage message and exit on a usage error; pass anything else
/// through.
pub fn exit_on_usage_error<T>(result: Result<T, ParamError>) -> Result<T, ParamError> {
    match result {
        Err(ParamError::Usage(e)) => e.exit(),
        other => other,
    }
}

/// Render the attributes of a parameter, one per line.
pub fn render_parameters<P: Parameter>(parameter: &P) -> String {
    let styles = Styles::default();
    let header = styles.get_header();
    let literal = styles.get_literal();
    format!("{}Parameters:{}\n", header.render(), header.render_reset())
        + &parameter
            .attributes()
            .iter()
            .map(|e| {
                format!(
                    "  {}{}{} = {}\t({})",
                    literal.render(),
                    e.key,
                    literal.render_reset(),
                    e.value(),
                    e.origin
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
}
