//! Typed view of a generation configuration block
//!
//! A configuration file maps identifiers to blocks:
//!
//! ```yaml
//! main:
//!   plugin_name: store
//!   tables: [orders, customers]
//!   variables: { vendor: acme }
//!   ignore_columns: { orders: [legacy_ref] }
//!   form:
//!     target_dir: "{app_dir}/config/forms"
//!     fields_merge_specific:
//!       customers: { email: $contactFields }
//!     fields_merge_aliases:
//!       contactFields: { validators: { email: {} } }
//! ```

pub mod tree;

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::error::GenerateError;
use crate::resolve::{mapping_variables, Variables};
use crate::schema::DEFAULT_COMMON_MATCHES;

pub const DEFAULT_IDENTIFIER: &str = "main";
pub const DEFAULT_FORM_TITLE: &str = "{Label} form";
pub const DEFAULT_FORM_TARGET_DIR: &str = "{app_dir}/config/forms";
pub const DEFAULT_TABLE_LIST_TARGET_DIR: &str = "{app_dir}/config/table_list";
pub const APP_DIR_TAG: &str = "{app_dir}";

/// table -> column -> value
pub type PerColumn<T> = BTreeMap<String, BTreeMap<String, T>>;

/// Configuration block selected by identifier
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Namespace used in generated identifiers
    pub plugin_name: String,
    #[serde(default)]
    pub database_name: Option<String>,
    /// Target tables; empty means every table of the database
    #[serde(default)]
    pub tables: Vec<String>,
    /// Columns ignored by every generator, per table
    #[serde(default)]
    pub ignore_columns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub form: Option<FormConfig>,
}

impl GeneratorConfig {
    /// Parse an already variable-substituted block
    pub fn from_block(block: &Value) -> Result<Self, GenerateError> {
        serde_yaml::from_value(block.clone()).map_err(|e| GenerateError::Config(e.to_string()))
    }

    pub fn global_ignore_columns(&self, table: &str) -> &[String] {
        self.ignore_columns.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_common_matches")]
    pub common_representative_matches: Vec<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            common_representative_matches: default_common_matches(),
        }
    }
}

fn default_common_matches() -> Vec<String> {
    DEFAULT_COMMON_MATCHES.iter().map(|s| s.to_string()).collect()
}

/// The `form` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub target_dir: Option<String>,
    pub title: Option<String>,
    pub form_handler_class_general: Option<String>,
    pub form_handler_class_specific: BTreeMap<String, String>,
    pub ignore_columns: BTreeMap<String, Vec<String>>,
    /// Custom field overrides, the most specific layer
    pub fields: PerColumn<Value>,
    pub not_required: BTreeMap<String, Vec<String>>,
    pub variables: Value,
    pub fields_merge_specific: PerColumn<MergeOverride>,
    pub fields_merge_aliases: BTreeMap<String, Value>,
    pub on_success_handler: SuccessHandlerConfig,
    pub success_messages: Option<BTreeMap<String, String>>,
    pub security: Option<Value>,
    pub special_fields: SpecialFields,
}

impl FormConfig {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_FORM_TITLE)
    }

    pub fn target_dir(&self) -> &str {
        self.target_dir.as_deref().unwrap_or(DEFAULT_FORM_TARGET_DIR)
    }

    pub fn ignore_columns(&self, table: &str) -> &[String] {
        self.ignore_columns.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn not_required(&self, table: &str) -> &[String] {
        self.not_required.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// User variables available to field definitions
    pub fn custom_variables(&self) -> Variables {
        mapping_variables(&self.variables)
    }

    pub fn custom_field(&self, table: &str, column: &str) -> Option<&Value> {
        self.fields.get(table).and_then(|cols| cols.get(column))
    }

    pub fn merge_override(&self, table: &str, column: &str) -> Option<&MergeOverride> {
        self.fields_merge_specific
            .get(table)
            .and_then(|cols| cols.get(column))
    }

    pub fn handler_class(&self, table: &str) -> Option<&str> {
        self.form_handler_class_specific
            .get(table)
            .or(self.form_handler_class_general.as_ref())
            .map(String::as_str)
    }

    pub fn table_list(&self) -> &ChloroformExtensions {
        &self.special_fields.chloroform_extensions
    }
}

/// A merge override: inline fragment, or a reference to a named alias
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum MergeOverride {
    Inline(Value),
    AliasRef(String),
}

impl From<Value> for MergeOverride {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if s.starts_with('$') => MergeOverride::AliasRef(s[1..].to_string()),
            other => MergeOverride::Inline(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessHandlerConfig {
    #[serde(rename = "type", default = "default_handler_type")]
    pub handler_type: String,
}

impl Default for SuccessHandlerConfig {
    fn default() -> Self {
        Self {
            handler_type: default_handler_type(),
        }
    }
}

fn default_handler_type() -> String {
    "database".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpecialFields {
    pub chloroform_extensions: ChloroformExtensions,
}

/// Settings of foreign-key picker fields and their lookup definitions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChloroformExtensions {
    pub use_table_list: bool,
    pub target_dir: Option<String>,
    /// Merged over the default lookup security block
    pub security: Option<Value>,
}

impl Default for ChloroformExtensions {
    fn default() -> Self {
        Self {
            use_table_list: true,
            target_dir: None,
            security: None,
        }
    }
}

impl ChloroformExtensions {
    pub fn target_dir(&self) -> &str {
        self.target_dir.as_deref().unwrap_or(DEFAULT_TABLE_LIST_TARGET_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> GeneratorConfig {
        GeneratorConfig::from_block(&serde_yaml::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("plugin_name: store\nform: {}");
        let form = config.form.as_ref().unwrap();

        assert_eq!(form.title(), "{Label} form");
        assert_eq!(form.target_dir(), DEFAULT_FORM_TARGET_DIR);
        assert_eq!(form.on_success_handler.handler_type, "database");
        assert!(form.table_list().use_table_list);
        assert_eq!(config.list.common_representative_matches, vec!["name", "label", "identifier"]);
        assert!(config.global_ignore_columns("orders").is_empty());
    }

    #[test]
    fn test_merge_override_variants() {
        let config = parse(
            r#"
plugin_name: store
form:
  fields_merge_specific:
    customers:
      email: $contactFields
      phone: { label: Phone }
      note: "plain text"
"#,
        );
        let form = config.form.unwrap();
        assert_eq!(
            form.merge_override("customers", "email"),
            Some(&MergeOverride::AliasRef("contactFields".to_string()))
        );
        assert!(matches!(
            form.merge_override("customers", "phone"),
            Some(MergeOverride::Inline(Value::Mapping(_)))
        ));
        assert_eq!(
            form.merge_override("customers", "note"),
            Some(&MergeOverride::Inline(Value::from("plain text")))
        );
        assert_eq!(form.merge_override("customers", "missing"), None);
    }

    #[test]
    fn test_handler_class_precedence() {
        let config = parse(
            r#"
plugin_name: store
form:
  form_handler_class_general: App\Form\Handler
  form_handler_class_specific: { orders: App\Form\OrderHandler }
"#,
        );
        let form = config.form.unwrap();
        assert_eq!(form.handler_class("orders"), Some("App\\Form\\OrderHandler"));
        assert_eq!(form.handler_class("customers"), Some("App\\Form\\Handler"));
    }

    #[test]
    fn test_missing_plugin_name_is_rejected() {
        let block: Value = serde_yaml::from_str("form: {}").unwrap();
        assert!(matches!(
            GeneratorConfig::from_block(&block),
            Err(GenerateError::Config(_))
        ));
    }
}
