use std::path::Path;

use crate::cfg::load_config_file;
use crate::error::ParamError;
use crate::loader::{global_loader, Module, Namespace, ScriptLoader};
use crate::storage::{Attributes, GetOrElse, Origin};
use crate::value::Value;

/// A configuration object filled from a parameter script.
///
/// Implementors own an [`Attributes`] map and decide what a valid
/// configuration looks like in [`check_values`](Parameter::check_values).
/// Loading never validates on its own; call `check_values` or
/// [`validated`](Parameter::validated) once every source has been applied.
///
/// ```no_run
/// use cdp_parameter::{Attributes, ParamError, Parameter};
///
/// #[derive(Default)]
/// struct MyParameter {
///     attrs: Attributes,
/// }
///
/// impl Parameter for MyParameter {
///     fn attributes(&self) -> &Attributes {
///         &self.attrs
///     }
///
///     fn attributes_mut(&mut self) -> &mut Attributes {
///         &mut self.attrs
///     }
///
///     fn check_values(&self) -> Result<(), ParamError> {
///         Ok(())
///     }
/// }
///
/// let mut p = MyParameter::default();
/// p.load_parameter_from_py("params.lua")?;
/// # Ok::<(), ParamError>(())
/// ```
pub trait Parameter {
    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Check that every value currently set is valid.
    fn check_values(&self) -> Result<(), ParamError>;

    /// Names this parameter accepts. `None` accepts any name.
    fn allowed_names(&self) -> Option<&[&str]> {
        None
    }

    /// Load a parameter script through the process-wide [`ScriptLoader`].
    ///
    /// The script runs with the privileges of the host process.
    fn load_parameter_from_py<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ParamError>
    where
        Self: Sized,
    {
        let module = global_loader().import_user_parameter_file(path)?.clone();
        self.load_parameters_from_module(&module)
    }

    /// Load a parameter script through an explicit loader.
    fn load_parameter_from_script<P: AsRef<Path>>(
        &mut self,
        loader: &mut ScriptLoader,
        path: P,
    ) -> Result<(), ParamError>
    where
        Self: Sized,
    {
        let module = loader.import_user_parameter_file(path)?.clone();
        self.load_parameters_from_module(&module)
    }

    /// Load a static TOML or JSON file.
    fn load_parameter_from_config<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ParamError>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        let ns = load_config_file(path)?;
        self.load_parameters_from_namespace(&ns, Origin::ConfigFile(path.to_path_buf()))
    }

    fn load_parameters_from_module(&mut self, module: &Module) -> Result<(), ParamError> {
        self.load_parameters_from_namespace(&module.namespace, Origin::Script(module.path.clone()))
    }

    /// Copy every binding not starting with `__` onto this parameter.
    ///
    /// Existing attributes that the namespace doesn't mention are kept.
    fn load_parameters_from_namespace(
        &mut self,
        ns: &Namespace,
        origin: Origin,
    ) -> Result<(), ParamError> {
        for (name, value) in ns.iter().filter(|(name, _)| !name.starts_with("__")) {
            self.set_attr_from(name.clone(), value.clone(), origin.clone())?;
        }
        Ok(())
    }

    fn set_attr<K: Into<String>, V: Into<Value>>(
        &mut self,
        name: K,
        value: V,
    ) -> Result<(), ParamError>
    where
        Self: Sized,
    {
        self.set_attr_from(name.into(), value.into(), Origin::Program)
    }

    fn set_attr_from(
        &mut self,
        name: String,
        value: Value,
        origin: Origin,
    ) -> Result<(), ParamError> {
        if let Some(allowed) = self.allowed_names() {
            if !allowed.contains(&name.as_str()) {
                return Err(ParamError::UnknownAttribute(name));
            }
        }
        self.attributes_mut().put(name, value, origin);
        Ok(())
    }

    fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes().get(name)
    }

    fn origin(&self, name: &str) -> Option<&Origin> {
        self.attributes().get_entry(name).map(|e| &e.origin)
    }

    /// Read an attribute, converting it to `T`.
    fn get<T>(&self, name: &str) -> Result<T, ParamError>
    where
        Self: Sized,
        T: for<'a> TryFrom<&'a Value, Error = String>,
    {
        let value = self
            .get_attr(name)
            .ok_or_else(|| ParamError::MissingAttribute(name.to_string()))?;
        T::try_from(value).map_err(|reason| ParamError::TypeMismatch {
            name: name.to_string(),
            reason,
        })
    }

    fn get_or_else<T>(&self, name: &str, default: T) -> T
    where
        Self: Sized,
        T: for<'a> TryFrom<&'a Value>,
    {
        self.attributes().get_or_else(name, default)
    }

    /// Validate and hand the parameter back.
    fn validated(self) -> Result<Self, ParamError>
    where
        Self: Sized,
    {
        self.check_values()?;
        Ok(self)
    }
}
