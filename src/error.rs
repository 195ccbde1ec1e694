use std::path::PathBuf;

/// Errors raised while loading, overriding or validating parameters.
///
/// Every variant is raised at the point of detection; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum ParamError {
    #[error("Parameter file {} not found.", .0.display())]
    NotFound(PathBuf),

    #[error("Filename cannot contain '.' outside extension: {0}")]
    MalformedName(String),

    #[error("No module named `{name}` on the search path {search_path:?}")]
    ModuleNotFound {
        name: String,
        search_path: Vec<PathBuf>,
    },

    #[error("Failed to read parameter script {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error while running parameter script {}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: mlua::Error,
    },

    #[error("Binding `{name}` holds a Lua {kind}, which is not a parameter value")]
    UnsupportedValue { name: String, kind: &'static str },

    #[error("`{0}` is not an accepted parameter name")]
    UnknownAttribute(String),

    #[error("Parameter `{0}` is not set")]
    MissingAttribute(String),

    #[error("Parameter `{name}` has the wrong type: {reason}")]
    TypeMismatch { name: String, reason: String },

    #[error("Invalid value for parameter `{name}`: {reason}")]
    Validation { name: String, reason: String },

    #[error("Failed to read config file")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("Command-line tokens have not been parsed yet")]
    NotParsed,
}

impl ParamError {
    /// Shorthand for the error `check_values` implementations return.
    pub fn invalid<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        ParamError::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, ParamError::Usage(_))
    }
}
