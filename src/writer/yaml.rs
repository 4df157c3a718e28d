use serde::Serialize;

use crate::error::GenerateError;
use crate::generator::{FormDefinition, LookupDefinition};

/// Serialize any artifact tree to YAML text
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, GenerateError> {
    Ok(serde_yaml::to_string(value)?)
}

/// Text of a form definition file
pub fn form_file(form: &FormDefinition) -> Result<String, GenerateError> {
    to_yaml(form)
}

/// Text of a lookup definition file; the identifier is written as a header comment
pub fn lookup_file(lookup: &LookupDefinition) -> Result<String, GenerateError> {
    let body = to_yaml(lookup)?;
    Ok(format!("# {}\n{}", lookup.identifier(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::LookupKey;
    use serde_yaml::Value;

    #[test]
    fn test_lookup_file_header_and_body() {
        let lookup = LookupDefinition {
            key: LookupKey {
                plugin: "store".into(),
                table: "customers".into(),
                column: "id".into(),
            },
            table: "customers".into(),
            column: "id".into(),
            query: "select id as value, concat(id, '. ', name) as label from customers".into(),
            display_column: "name".into(),
            search_column: "concat(id, '. ', name)".into(),
            render: "adaptive".into(),
            threshold: 200,
            security: Value::Null,
        };

        let text = lookup_file(&lookup).unwrap();
        assert!(text.starts_with("# store:generated/tablelist/customers.id\n"));

        let parsed: Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed["display_column"], Value::from("name"));
        assert_eq!(parsed["threshold"], Value::from(200));
        assert!(parsed.get("key").is_none());
    }
}
