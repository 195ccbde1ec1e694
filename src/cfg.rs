use std::path::Path;

use config::{self, File};

use crate::error::ParamError;
use crate::loader::Namespace;
use crate::value::Value;

/// Flatten a `config::Config` into the namespace shape a script produces.
pub trait AsNamespace {
    fn namespace(&self) -> Namespace;
}

impl AsNamespace for config::Config {
    fn namespace(&self) -> Namespace {
        let mut ns = Namespace::new();
        fn unpack(ns: &mut Namespace, prefix: Option<String>, value: config::Value) {
            match (prefix, value.kind) {
                (None, config::ValueKind::Table(v)) => v.into_iter().for_each(|(k, v)| {
                    unpack(ns, Some(k), v);
                }),
                (Some(prefix), config::ValueKind::Table(v)) => v.into_iter().for_each(|(k, v)| {
                    unpack(ns, Some(format!("{}.{}", prefix, k)), v);
                }),
                (Some(k), kind) => {
                    if let Some(v) = convert(kind) {
                        ns.insert(k, v);
                    }
                }
                (None, _) => {}
            };
        }
        unpack(&mut ns, None, self.cache.clone());
        ns
    }
}

fn convert(kind: config::ValueKind) -> Option<Value> {
    match kind {
        config::ValueKind::Nil => None,
        config::ValueKind::Boolean(v) => Some(Value::Boolean(v)),
        config::ValueKind::I64(v) => Some(Value::Int(v)),
        config::ValueKind::I128(v) => Some(int_or_text(v)),
        config::ValueKind::U64(v) => Some(int_or_text(v)),
        config::ValueKind::U128(v) => Some(int_or_text(v)),
        config::ValueKind::Float(v) => Some(Value::Float(v)),
        config::ValueKind::String(v) => Some(Value::Text(v)),
        config::ValueKind::Array(items) => Some(Value::List(
            items.into_iter().filter_map(|item| convert(item.kind)).collect(),
        )),
        config::ValueKind::Table(_) => None,
    }
}

fn int_or_text<T>(v: T) -> Value
where
    T: Copy + ToString,
    i64: TryFrom<T>,
{
    i64::try_from(v).map_or_else(|_| Value::Text(v.to_string()), Value::Int)
}

/// Read a TOML or JSON file (format picked from the extension).
pub fn load_config_file(path: &Path) -> Result<Namespace, ParamError> {
    if !path.is_file() {
        return Err(ParamError::NotFound(path.to_path_buf()));
    }
    let cfg = config::Config::builder()
        .add_source(File::from(path))
        .build()?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(cfg.namespace())
}

#[cfg(test)]
mod tests {
    use config::ConfigError;

    use super::AsNamespace;
    use crate::value::Value;

    #[test]
    fn test_create_namespace_from_config() -> Result<(), ConfigError> {
        let ns = config::Config::builder()
            .set_default("a", 1)?
            .set_default("b", "2")?
            .set_default("vars", vec!["v1", "v2"])?
            .set_default(
                "foo",
                config::Config::builder()
                    .set_default("a", 11)?
                    .set_default("b", "22")?
                    .build()?
                    .cache
                    .clone()
                    .into_table()?,
            )?
            .build()?
            .namespace();

        assert_eq!(Value::Int(1), ns["a"]);
        assert_eq!(Value::from("2"), ns["b"]);
        assert_eq!(Value::Int(11), ns["foo.a"]);
        assert_eq!(Value::from("22"), ns["foo.b"]);
        assert_eq!(Value::from(vec!["v1", "v2"]), ns["vars"]);
        assert!(!ns.contains_key("foo"));
        Ok(())
    }
}
