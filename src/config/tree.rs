//! Dotted-path access to a raw configuration tree

use serde_yaml::Value;
use std::path::Path;

use crate::error::GenerateError;

/// Resolve a dotted key path such as `form.fields.orders`
pub fn key_value<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(tree, |node, segment| match node {
            Value::Mapping(map) => map.get(segment),
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Resolve a dotted key path, falling back to `default` when absent
pub fn key_value_or(tree: &Value, path: &str, default: Value) -> Value {
    key_value(tree, path).cloned().unwrap_or(default)
}

/// Whether a top-level key is present (even when empty)
pub fn has_key(tree: &Value, key: &str) -> bool {
    matches!(tree, Value::Mapping(map) if map.contains_key(key))
}

/// Read a configuration file and select the block registered under `identifier`
pub fn load_block(file: &Path, identifier: &str) -> Result<Value, GenerateError> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| GenerateError::Config(format!("Cannot read {}: {}", file.display(), e)))?;
    parse_block(&content, file, identifier)
}

/// Select the block registered under `identifier` from configuration text
pub fn parse_block(content: &str, file: &Path, identifier: &str) -> Result<Value, GenerateError> {
    let root: Value = serde_yaml::from_str(content)
        .map_err(|e| GenerateError::Config(format!("Cannot parse {}: {}", file.display(), e)))?;

    match root {
        Value::Mapping(mut map) => map
            .remove(identifier)
            .ok_or_else(|| GenerateError::MissingIdentifier {
                identifier: identifier.to_string(),
                file: file.to_path_buf(),
            }),
        _ => Err(GenerateError::MissingIdentifier {
            identifier: identifier.to_string(),
            file: file.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONF: &str = r#"
main:
  plugin_name: store
  form:
    fields:
      orders:
        status: { label: State }
    tags: [a, b]
other:
  plugin_name: blog
"#;

    #[test]
    fn test_key_value_paths() {
        let block = parse_block(CONF, Path::new("conf.yml"), "main").unwrap();
        assert_eq!(
            key_value(&block, "form.fields.orders.status.label"),
            Some(&Value::from("State"))
        );
        assert_eq!(key_value(&block, "form.tags.1"), Some(&Value::from("b")));
        assert_eq!(key_value(&block, "form.missing"), None);
        assert_eq!(key_value(&block, "plugin_name.deeper"), None);
        assert_eq!(
            key_value_or(&block, "form.ignore_columns.orders", Value::Sequence(vec![])),
            Value::Sequence(vec![])
        );
        assert!(has_key(&block, "form"));
        assert!(!has_key(&block, "list"));
    }

    #[test]
    fn test_missing_identifier() {
        let err = parse_block(CONF, Path::new("conf.yml"), "nope").unwrap_err();
        match err {
            GenerateError::MissingIdentifier { identifier, file } => {
                assert_eq!(identifier, "nope");
                assert_eq!(file, Path::new("conf.yml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
