use std::path::Path;

use mlua::Table;

use crate::error::ParamError;
use crate::loader::Namespace;
use crate::value::Value;

/// Collects the string-keyed bindings of a script environment table.
///
/// Nested string-keyed tables are flattened into dotted names, sequences
/// become lists. Functions, userdata and threads are not data and are left
/// out. Lua strings are byte strings: names and text values that are not
/// valid UTF-8 are converted lossily, invalid bytes becoming U+FFFD.
pub(crate) fn collect_bindings(
    path: &Path,
    env: &Table,
) -> Result<Namespace, ParamError> {
    let mut ns = Namespace::new();
    for pair in env.clone().pairs::<mlua::Value, mlua::Value>() {
        let (k, v) = pair.map_err(|e| script_error(path, e))?;
        let mlua::Value::String(k) = k else {
            continue;
        };
        unpack(path, &mut ns, String::from(k.to_string_lossy()), v)?;
    }
    Ok(ns)
}

pub(crate) fn script_error(path: &Path, source: mlua::Error) -> ParamError {
    ParamError::Script {
        path: path.to_path_buf(),
        source,
    }
}

fn unpack(
    path: &Path,
    ns: &mut Namespace,
    name: String,
    value: mlua::Value,
) -> Result<(), ParamError> {
    match value {
        mlua::Value::Nil => {}
        mlua::Value::Table(t) if is_sequence(path, &t)? => {
            let v = sequence_to_value(path, &name, &t)?;
            ns.insert(name, v);
        }
        mlua::Value::Table(t) => {
            for pair in t.clone().pairs::<mlua::Value, mlua::Value>() {
                let (k, v) = pair.map_err(|e| script_error(path, e))?;
                let key = match k {
                    mlua::Value::String(s) => String::from(s.to_string_lossy()),
                    mlua::Value::Integer(i) => i.to_string(),
                    _ => continue,
                };
                unpack(path, ns, format!("{}.{}", name, key), v)?;
            }
        }
        other => match scalar_to_value(&other) {
            Some(v) => {
                ns.insert(name, v);
            }
            None => {
                tracing::debug!(
                    name = %name,
                    kind = other.type_name(),
                    "skipping non-data binding"
                );
            }
        },
    }
    Ok(())
}

/// Empty tables count as sequences, so `vars = {}` reads back as an empty list.
fn is_sequence(path: &Path, t: &Table) -> Result<bool, ParamError> {
    let len = t.raw_len();
    let mut count = 0usize;
    for pair in t.clone().pairs::<mlua::Value, mlua::Value>() {
        let (k, _) = pair.map_err(|e| script_error(path, e))?;
        match k {
            mlua::Value::Integer(i) if i >= 1 && (i as usize) <= len => count += 1,
            _ => return Ok(false),
        }
    }
    Ok(count == len)
}

fn sequence_to_value(path: &Path, name: &str, t: &Table) -> Result<Value, ParamError> {
    let mut items = Vec::with_capacity(t.raw_len());
    for item in t.clone().sequence_values::<mlua::Value>() {
        let item = item.map_err(|e| script_error(path, e))?;
        let converted = match &item {
            mlua::Value::Table(inner) if is_sequence(path, inner)? => {
                sequence_to_value(path, name, inner)?
            }
            other => scalar_to_value(other).ok_or_else(|| ParamError::UnsupportedValue {
                name: name.to_string(),
                kind: other.type_name(),
            })?,
        };
        items.push(converted);
    }
    Ok(Value::List(items))
}

fn scalar_to_value(value: &mlua::Value) -> Option<Value> {
    match value {
        mlua::Value::Boolean(b) => Some(Value::Boolean(*b)),
        mlua::Value::Integer(i) => Some(Value::Int(i64::from(*i))),
        mlua::Value::Number(n) => Some(Value::Float(*n)),
        mlua::Value::String(s) => Some(Value::Text(s.to_string_lossy().into())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mlua::Lua;

    use super::collect_bindings;
    use crate::error::ParamError;
    use crate::loader::Namespace;
    use crate::value::Value;

    fn bindings(src: &str) -> Result<Namespace, ParamError> {
        let lua = Lua::new();
        let env = lua.create_table().unwrap();
        lua.load(src).set_environment(env.clone()).exec().unwrap();
        collect_bindings(Path::new("inline.lua"), &env)
    }

    #[test]
    fn test_scalars() {
        let ns = bindings("a = 1\nb = 2.5\nc = 'text'\nd = true").unwrap();
        assert_eq!(ns["a"], Value::Int(1));
        assert_eq!(ns["b"], Value::Float(2.5));
        assert_eq!(ns["c"], Value::from("text"));
        assert_eq!(ns["d"], Value::Boolean(true));
    }

    #[test]
    fn test_sequences_become_lists() {
        let ns = bindings("vars = {'v1', 'v2'}\nempty = {}\ngrid = {{1, 2}, {3}}").unwrap();
        assert_eq!(ns["vars"], Value::from(vec!["v1", "v2"]));
        assert_eq!(ns["empty"], Value::List(vec![]));
        assert_eq!(
            ns["grid"],
            Value::List(vec![Value::from(vec![1, 2]), Value::from(vec![3])])
        );
    }

    #[test]
    fn test_tables_flatten_into_dotted_names() {
        let ns = bindings("server = { host = 'localhost', tls = { enabled = false } }").unwrap();
        assert_eq!(ns["server.host"], Value::from("localhost"));
        assert_eq!(ns["server.tls.enabled"], Value::Boolean(false));
        assert!(!ns.contains_key("server"));
    }

    #[test]
    fn test_functions_are_skipped() {
        let ns = bindings("function helper() return 1 end\nx = helper()").unwrap();
        assert_eq!(ns.len(), 1);
        assert_eq!(ns["x"], Value::Int(1));
    }

    #[test]
    fn test_function_in_list_is_rejected() {
        let err = bindings("hooks = { function() end }").unwrap_err();
        assert!(matches!(
            err,
            ParamError::UnsupportedValue { ref name, kind: "function" } if name == "hooks"
        ));
    }
}
