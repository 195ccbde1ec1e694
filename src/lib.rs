//! Configuration as code.
//!
//! A parameter script is a Lua chunk whose top-level globals become the
//! attributes of a [`Parameter`]. [`ParameterCli`] puts a command line in
//! front of it so users can point at a script, override single values, or
//! both.
//!
//! Scripts are executed, not parsed: they run with the privileges of the
//! host process and must be trusted.

#[cfg(test)]
#[macro_use]
extern crate proptest;

mod cfg;
mod cli;
mod error;
mod loader;
mod lua_value;
mod parameter;
mod storage;
mod value;

pub use crate::cfg::load_config_file;
pub use crate::cfg::AsNamespace;
pub use crate::cli::exit_on_usage_error;
pub use crate::cli::render_parameters;
pub use crate::cli::ParameterCli;
pub use crate::cli::{CONFIG_FILE, DEFINE, PARAM_FILE};
pub use crate::error::ParamError;
pub use crate::loader::derive_module_name;
pub use crate::loader::global_loader;
pub use crate::loader::{Module, Namespace, ScriptLoader, SCRIPT_EXTENSION};
pub use crate::parameter::Parameter;
pub use crate::storage::{Attributes, Entry, GetOrElse, Origin};
pub use crate::value::Value;
pub use clap;
