//! Per-table form definitions

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::registry::LookupRegistry;
use crate::config::{FormConfig, GeneratorConfig, MergeOverride};
use crate::debug::DebugLog;
use crate::error::{GenerateError, Result};
use crate::resolve::{classify, merge_all, resolve_tree, FieldKind, Variables};
use crate::schema::{SchemaInfoProvider, TableSchema};

/// Field type used for foreign-key pickers
pub const TABLE_LIST_TYPE: &str = "table_list";

/// Resolved definition of one form field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub label: String,
    pub kind: FieldKind,
    /// validator name -> parameters
    pub validators: Mapping,
    /// Everything else: picker settings, markers, custom keys
    pub extra: Mapping,
}

impl FieldDefinition {
    /// Tree form used as the base layer of the merge
    fn to_tree(&self) -> Value {
        let mut map = Mapping::new();
        map.insert("label".into(), self.label.clone().into());
        map.insert("type".into(), self.kind.as_str().into());
        map.insert("validators".into(), Value::Mapping(self.validators.clone()));
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        Value::Mapping(map)
    }

    /// Split a merged tree back into a definition. A `type` that names a
    /// field kind replaces the kind; any other `type` stays in `extra`.
    fn from_tree(tree: Value, fallback: &FieldDefinition, table: &str, column: &str) -> Result<Self> {
        let Value::Mapping(map) = tree else {
            return Err(not_a_mapping(table, column, "merged definition"));
        };

        let mut field = FieldDefinition {
            label: fallback.label.clone(),
            kind: fallback.kind,
            validators: Mapping::new(),
            extra: Mapping::new(),
        };

        for (key, value) in map {
            match key.as_str() {
                Some("label") => field.label = scalar_text(&value).unwrap_or_else(|| fallback.label.clone()),
                Some("validators") => field.validators = validators_from(value),
                Some("type") => match value.as_str().and_then(FieldKind::from_name) {
                    Some(kind) => field.kind = kind,
                    None => {
                        field.extra.insert(key, value);
                    }
                },
                _ => {
                    field.extra.insert(key, value);
                }
            }
        }

        Ok(field)
    }

    /// The `type` written to the artifact: an extra `type` (e.g. `table_list`) wins
    pub fn rendered_type(&self) -> &str {
        self.extra
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(self.kind.as_str())
    }

    pub fn has_validator(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }
}

impl Serialize for FieldDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("label", &self.label)?;
        map.serialize_entry("type", self.rendered_type())?;
        map.serialize_entry("validators", &self.validators)?;
        for (k, v) in &self.extra {
            if k.as_str() != Some("type") {
                map.serialize_entry(k, v)?;
            }
        }
        map.end()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Validators may be written as a mapping, a list of names or a single name
fn validators_from(value: Value) -> Mapping {
    match value {
        Value::Mapping(map) => map,
        Value::Sequence(names) => names
            .into_iter()
            .filter(|name| name.is_string())
            .map(|name| (name, Value::Mapping(Mapping::new())))
            .collect(),
        Value::String(name) => {
            let mut map = Mapping::new();
            map.insert(Value::String(name), Value::Mapping(Mapping::new()));
            map
        }
        _ => Mapping::new(),
    }
}

/// Complete form definition for one table
#[derive(Debug, Clone, PartialEq)]
pub struct FormDefinition {
    pub table: String,
    pub title: String,
    pub identifier: String,
    pub record_identifier_columns: Vec<String>,
    pub success_messages: BTreeMap<String, String>,
    pub security: Option<Value>,
    pub handler_class: Option<String>,
    /// Column -> field, in schema order
    pub fields: Vec<(String, FieldDefinition)>,
    pub success_handler: SuccessHandler,
}

impl FormDefinition {
    pub fn field(&self, column: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, f)| f)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Artifact file name
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.table)
    }
}

struct FieldMap<'a>(&'a [(String, FieldDefinition)]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(serde::Serialize)]
struct FormHandlerOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<&'a str>,
    id: &'a str,
    ric: &'a [String],
    fields: FieldMap<'a>,
}

impl Serialize for FormDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("success_messages", &self.success_messages)?;
        if let Some(security) = &self.security {
            map.serialize_entry("security", security)?;
        }
        map.serialize_entry(
            "form_handler",
            &FormHandlerOut {
                class: self.handler_class.as_deref(),
                id: &self.identifier,
                ric: &self.record_identifier_columns,
                fields: FieldMap(&self.fields),
            },
        )?;
        map.serialize_entry("on_success_handler", &self.success_handler)?;
        map.end()
    }
}

/// What happens after a successful submission
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuccessHandler {
    Database { params: DatabaseHandlerParams },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHandlerParams {
    pub table: String,
    pub plugin_name: String,
}

impl SuccessHandler {
    pub fn from_type(handler_type: &str, table: &str, plugin_name: &str) -> Result<Self> {
        match handler_type {
            "database" => Ok(SuccessHandler::Database {
                params: DatabaseHandlerParams {
                    table: table.to_string(),
                    plugin_name: plugin_name.to_string(),
                },
            }),
            other => Err(GenerateError::UnsupportedHandlerType(other.to_string())),
        }
    }
}

/// Tags usable in the form title
pub fn generic_tags(table: &str) -> Vec<(&'static str, String)> {
    let label = table.replace('_', " ");
    vec![
        ("{table}", table.to_string()),
        ("{Table}", ucfirst(table)),
        ("{label}", label.clone()),
        ("{Label}", ucfirst(&label)),
    ]
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `customer_id` -> `Customer id`
pub fn column_label(column: &str) -> String {
    ucfirst(&column.to_lowercase()).replace('_', " ")
}

fn default_success_messages() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "insert".to_string(),
            "The record has been successfully inserted.".to_string(),
        ),
        (
            "update".to_string(),
            "The record has been successfully updated.".to_string(),
        ),
    ])
}

/// Builds form definitions for the tables of a configuration block
pub struct FormBuilder<'a, P: SchemaInfoProvider + ?Sized> {
    config: &'a GeneratorConfig,
    form: &'a FormConfig,
    provider: &'a P,
    debug: &'a dyn DebugLog,
}

impl<'a, P: SchemaInfoProvider + ?Sized> FormBuilder<'a, P> {
    pub fn new(
        config: &'a GeneratorConfig,
        form: &'a FormConfig,
        provider: &'a P,
        debug: &'a dyn DebugLog,
    ) -> Self {
        Self {
            config,
            form,
            provider,
            debug,
        }
    }

    /// Build every table; the first failure aborts the whole batch
    pub fn build_all(&self, tables: &[String]) -> Result<(Vec<FormDefinition>, LookupRegistry)> {
        let mut registry = LookupRegistry::new(&self.config.plugin_name);
        let mut forms = Vec::with_capacity(tables.len());

        for table in tables {
            self.debug.log(&format!("Building form for table \"{}\".", table));
            forms.push(self.build_table(table, &mut registry)?);
        }

        Ok((forms, registry))
    }

    /// Build the form of one table, registering its picker lookups
    pub fn build_table(&self, table: &str, registry: &mut LookupRegistry) -> Result<FormDefinition> {
        let schema = self
            .provider
            .table_info(table, self.config.database_name.as_deref())?;

        let title = generic_tags(table)
            .into_iter()
            .fold(self.form.title().to_string(), |title, (tag, value)| {
                title.replace(tag, &value)
            });

        let mut vars = self.form.custom_variables();
        vars.insert("table".to_string(), table.to_string());
        vars.insert("field".to_string(), String::new());

        let mut fields = Vec::new();
        for column in working_columns(&schema, self.config, self.form) {
            vars.insert("field".to_string(), column.to_string());
            let field = self.build_field(&schema, column, &vars, registry)?;
            fields.push((column.to_string(), field));
        }
        vars.insert("field".to_string(), String::new());

        let security = self.form.security.clone().map(|mut security| {
            resolve_tree(&mut security, &vars);
            security
        });

        let success_handler = SuccessHandler::from_type(
            &self.form.on_success_handler.handler_type,
            table,
            &self.config.plugin_name,
        )?;

        Ok(FormDefinition {
            table: table.to_string(),
            title,
            identifier: format!("realgen-{}", table),
            record_identifier_columns: schema.ric(),
            success_messages: self
                .form
                .success_messages
                .clone()
                .unwrap_or_else(default_success_messages),
            security,
            handler_class: self.form.handler_class(table).map(str::to_string),
            fields,
            success_handler,
        })
    }

    fn build_field(
        &self,
        schema: &TableSchema,
        column: &str,
        vars: &Variables,
        registry: &mut LookupRegistry,
    ) -> Result<FieldDefinition> {
        let table = schema.table_name.as_str();
        let meta = schema.column(column);
        let sql_type = meta
            .and_then(|c| c.sql_type.as_deref())
            .ok_or_else(|| GenerateError::UnknownColumnType {
                table: table.to_string(),
                column: column.to_string(),
            })?;

        let required = !self.form.not_required(table).iter().any(|c| c == column);
        let base = base_field(column, sql_type, required);

        let special = match meta.and_then(|c| c.foreign_key.as_ref()) {
            Some(fk) if self.form.table_list().use_table_list => {
                table_list_fragment(registry.register(table, column, fk))
            }
            _ => Value::Null,
        };

        let merge_fragment = match self.form.merge_override(table, column) {
            Some(MergeOverride::AliasRef(alias)) => self
                .form
                .fields_merge_aliases
                .get(alias)
                .cloned()
                .ok_or_else(|| GenerateError::MissingAlias {
                    table: table.to_string(),
                    column: column.to_string(),
                    alias: alias.clone(),
                })?,
            Some(MergeOverride::Inline(fragment)) => fragment.clone(),
            None => Value::Null,
        };
        check_layer(&merge_fragment, table, column, "fields_merge_specific")?;

        let custom = self.form.custom_field(table, column).cloned().unwrap_or(Value::Null);
        check_layer(&custom, table, column, "fields")?;

        // least to most specific; empty layers change nothing
        let layers = [special, merge_fragment, custom]
            .into_iter()
            .filter(|layer| !layer.is_null());
        let mut tree = merge_all(base.to_tree(), layers);
        resolve_tree(&mut tree, vars);

        FieldDefinition::from_tree(tree, &base, table, column)
    }
}

/// Schema columns minus the ignored ones, in schema order
pub fn working_columns<'s>(schema: &'s TableSchema, config: &GeneratorConfig, form: &FormConfig) -> Vec<&'s str> {
    let table = schema.table_name.as_str();
    let mut ignored: BTreeSet<&str> = config
        .global_ignore_columns(table)
        .iter()
        .chain(form.ignore_columns(table))
        .map(String::as_str)
        .collect();
    if let Some(auto) = schema.auto_increment_column.as_deref() {
        ignored.insert(auto);
    }

    schema
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| !ignored.contains(name))
        .collect()
}

/// Schema-derived skeleton of a field, before any override
pub fn base_field(column: &str, sql_type: &str, required: bool) -> FieldDefinition {
    let kind = classify(sql_type);

    let mut validators = Mapping::new();
    if required {
        let name = match kind {
            FieldKind::Date => "requiredDate",
            FieldKind::Datetime => "requiredDatetime",
            _ => "required",
        };
        validators.insert(name.into(), Value::Mapping(Mapping::new()));
    }

    let mut extra = Mapping::new();
    if matches!(kind, FieldKind::Date | FieldKind::Datetime) {
        extra.insert("nullable".into(), false.into());
    }

    FieldDefinition {
        label: column_label(column),
        kind,
        validators,
        extra,
    }
}

/// Override layers are mappings; an empty (null) layer is skipped
fn check_layer(layer: &Value, table: &str, column: &str, source: &str) -> Result<()> {
    match layer {
        Value::Null | Value::Mapping(_) => Ok(()),
        _ => Err(not_a_mapping(table, column, source)),
    }
}

fn not_a_mapping(table: &str, column: &str, source: &str) -> GenerateError {
    GenerateError::Config(format!(
        "Field override for column {}, table {} must be a mapping ({})",
        column, table, source
    ))
}

fn table_list_fragment(identifier: String) -> Value {
    let mut map = Mapping::new();
    map.insert("type".into(), TABLE_LIST_TYPE.into());
    map.insert("tableListIdentifier".into(), identifier.into());
    Value::Mapping(map)
}
