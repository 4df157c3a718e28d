use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use crate::error::GenerateError;

/// Variable name -> replacement text
pub type Variables = BTreeMap<String, String>;

const OPEN: &str = "{$";
const CLOSE: char = '}';

/// Replace every `{$name}` in `text` whose name is known.
///
/// Single pass: text coming from a replacement is never scanned again, and
/// unknown placeholders are kept verbatim.
pub fn resolve_str(text: &str, vars: &Variables) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];

        match after.find(CLOSE) {
            Some(end) => match vars.get(&after[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(OPEN);
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Resolve placeholders in every string leaf of a definition tree.
/// Mapping keys and non-string scalars are left alone.
pub fn resolve_tree(tree: &mut Value, vars: &Variables) {
    match tree {
        Value::String(s) => {
            if s.contains(OPEN) {
                *s = resolve_str(s, vars);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                resolve_tree(item, vars);
            }
        }
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                resolve_tree(v, vars);
            }
        }
        Value::Tagged(tagged) => resolve_tree(&mut tagged.value, vars),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Read the `variables` section of a configuration block
pub fn block_variables(block: &Value) -> Variables {
    block.get("variables").map(mapping_variables).unwrap_or_default()
}

/// Turn a mapping of scalars into a variable context.
/// Numbers and booleans are turned into their textual form; nested values are skipped.
pub fn mapping_variables(value: &Value) -> Variables {
    let Value::Mapping(map) = value else {
        return Variables::new();
    };

    map.iter()
        .filter_map(|(k, v)| {
            let name = k.as_str()?;
            let value = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((name.to_string(), value))
        })
        .collect()
}

/// Whole-block substitution run once before the block is parsed.
///
/// Every variable is replaced in turn, by plain substring replacement, in
/// string values and in string mapping keys, so table and column names used
/// as keys can be templated too. Non-string scalars are not touched. A key
/// rewritten into a name already present in the same mapping is an error.
pub fn substitute_block(block: &mut Value, vars: &Variables) -> Result<(), GenerateError> {
    if vars.is_empty() {
        return Ok(());
    }

    match block {
        Value::String(s) => {
            if s.contains(OPEN) {
                *s = substitute_str(s, vars);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                substitute_block(item, vars)?;
            }
        }
        Value::Mapping(map) => {
            let entries = std::mem::take(map);
            let mut rebuilt = Mapping::with_capacity(entries.len());
            for (mut k, mut v) in entries {
                if let Value::String(key) = &mut k {
                    if key.contains(OPEN) {
                        *key = substitute_str(key, vars);
                    }
                }
                if rebuilt.contains_key(&k) {
                    return Err(GenerateError::Config(format!(
                        "Duplicate key \"{}\" after variable substitution",
                        k.as_str().unwrap_or_default()
                    )));
                }
                substitute_block(&mut v, vars)?;
                rebuilt.insert(k, v);
            }
            *map = rebuilt;
        }
        Value::Tagged(tagged) => substitute_block(&mut tagged.value, vars)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }

    Ok(())
}

fn substitute_str(text: &str, vars: &Variables) -> String {
    let mut out = text.to_string();
    for (name, value) in vars {
        let placeholder = format!("{{${}}}", name);
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, value);
        }
    }
    out
}
