//! Script loading.
//!
//! A [`ScriptLoader`] plays the part of an interpreter's module registry: it
//! keeps a search path and a cache of already imported modules keyed by their
//! derived name. Importing a script runs it once, with full host privileges,
//! in a fresh environment table that falls back to the Lua globals for
//! lookups. Only the bindings the script itself created end up in the
//! resulting [`Namespace`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use mlua::Lua;

use crate::error::ParamError;
use crate::lua_value::{collect_bindings, script_error};
use crate::value::Value;

/// Extension the import step looks for on the search path.
pub const SCRIPT_EXTENSION: &str = "lua";

/// The public bindings of an imported script, by name.
pub type Namespace = BTreeMap<String, Value>;

/// A script imported by a [`ScriptLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub path: PathBuf,
    pub namespace: Namespace,
}

#[derive(Debug, Default)]
pub struct ScriptLoader {
    search_path: Vec<PathBuf>,
    modules: HashMap<String, Module>,
}

lazy_static! {
    static ref GLOBAL_LOADER: Mutex<ScriptLoader> = Mutex::new(ScriptLoader::default());
}

/// The process-wide loader used by `Parameter::load_parameter_from_py`.
pub fn global_loader() -> MutexGuard<'static, ScriptLoader> {
    GLOBAL_LOADER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Derive the importable module name from the final segment of `path`.
///
/// `name` and `name.ext` are accepted, `name.with.dots` is not.
pub fn derive_module_name(path: &Path) -> Result<String, ParamError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ParamError::MalformedName(path.display().to_string()))?;
    let file_name = file_name
        .to_str()
        .ok_or_else(|| ParamError::MalformedName(path.display().to_string()))?;
    if file_name.matches('.').count() > 1 {
        return Err(ParamError::MalformedName(file_name.to_string()));
    }
    let stem = match file_name.split_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    if stem.is_empty() {
        return Err(ParamError::MalformedName(file_name.to_string()));
    }
    Ok(stem.to_string())
}

impl ScriptLoader {
    pub fn new() -> Self {
        ScriptLoader::default()
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Put `dir` at the front of the search path, moving it there if it is
    /// already present.
    pub fn prepend_search_path<P: Into<PathBuf>>(&mut self, dir: P) {
        let dir = dir.into();
        self.search_path.retain(|d| d != &dir);
        tracing::debug!(dir = %dir.display(), "prepending to script search path");
        self.search_path.insert(0, dir);
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Forget every imported module and the search path.
    pub fn reset(&mut self) {
        self.search_path.clear();
        self.modules.clear();
    }

    /// Check `path`, make its directory importable and import it by its
    /// derived module name.
    pub fn import_user_parameter_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<&Module, ParamError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ParamError::NotFound(path.to_path_buf()));
        }
        let name = derive_module_name(path)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.prepend_search_path(dir);
        self.import_module(&name)
    }

    /// Import `name` from the search path, or return the cached module.
    ///
    /// A second script with the same derived name is never executed; the
    /// first one imported wins for the lifetime of the loader.
    pub fn import_module(&mut self, name: &str) -> Result<&Module, ParamError> {
        if !self.modules.contains_key(name) {
            let path = self
                .find_module(name)
                .ok_or_else(|| ParamError::ModuleNotFound {
                    name: name.to_string(),
                    search_path: self.search_path.clone(),
                })?;
            let module = self.execute(name, &path)?;
            tracing::info!(
                module = %name,
                path = %path.display(),
                bindings = module.namespace.len(),
                "imported parameter script"
            );
            self.modules.insert(name.to_string(), module);
        } else {
            tracing::debug!(module = %name, "module already imported, reusing it");
        }
        self.modules
            .get(name)
            .ok_or_else(|| ParamError::ModuleNotFound {
                name: name.to_string(),
                search_path: self.search_path.clone(),
            })
    }

    fn find_module(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.{}", name, SCRIPT_EXTENSION);
        self.search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    fn package_path(&self) -> String {
        self.search_path
            .iter()
            .map(|dir| format!("{}/?.{}", dir.display(), SCRIPT_EXTENSION))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn execute(&self, name: &str, path: &Path) -> Result<Module, ParamError> {
        // Lua chunks are byte strings; no encoding is imposed on the file.
        let source = fs::read(path).map_err(|source| ParamError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lua = Lua::new();
        let env = self
            .prepare_environment(&lua, name, path)
            .map_err(|e| script_error(path, e))?;
        lua.load(source)
            .set_name(format!("@{}", path.display()))
            .set_environment(env.clone())
            .exec()
            .map_err(|e| script_error(path, e))?;

        let mut namespace = collect_bindings(path, &env)?;
        namespace.retain(|k, _| !k.starts_with("__"));
        Ok(Module {
            name: name.to_string(),
            path: path.to_path_buf(),
            namespace,
        })
    }

    fn prepare_environment(
        &self,
        lua: &Lua,
        name: &str,
        path: &Path,
    ) -> mlua::Result<mlua::Table> {
        let globals = lua.globals();
        let package: mlua::Table = globals.get("package")?;
        let default_path: String = package.get("path")?;
        package.set("path", format!("{};{}", self.package_path(), default_path))?;

        let env = lua.create_table()?;
        let meta = lua.create_table()?;
        meta.set("__index", globals)?;
        env.set_metatable(Some(meta));
        env.set("__name__", name)?;
        env.set("__file__", path.display().to_string())?;
        Ok(env)
    }
}
