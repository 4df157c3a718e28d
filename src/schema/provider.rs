use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::types::TableSchema;
use crate::error::SchemaError;

/// Source of table metadata for a generation run
pub trait SchemaInfoProvider {
    /// Get the schema of a table. `database` selects another database when
    /// the provider knows several.
    fn table_info(&self, table: &str, database: Option<&str>) -> Result<TableSchema, SchemaError>;

    /// List the tables of a database, in a stable order
    fn table_names(&self, database: Option<&str>) -> Result<Vec<String>, SchemaError>;
}

/// In-memory schema, built in code or loaded from a snapshot file
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    /// database name ("" for the default one) -> table name -> schema
    databases: BTreeMap<String, BTreeMap<String, TableSchema>>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    tables: Vec<TableSchema>,
    /// Tables of other databases, referenced by foreign keys
    #[serde(default)]
    databases: BTreeMap<String, Vec<TableSchema>>,
}

impl StaticSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the default database
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.insert(None, table);
        self
    }

    /// Add a table to a named database
    pub fn with_table_in(mut self, database: &str, table: TableSchema) -> Self {
        self.insert(Some(database), table);
        self
    }

    pub fn insert(&mut self, database: Option<&str>, table: TableSchema) {
        self.databases
            .entry(database.unwrap_or_default().to_string())
            .or_default()
            .insert(table.table_name.clone(), table.normalize());
    }

    /// Parse a YAML snapshot
    pub fn from_yaml(content: &str) -> Result<Self, SchemaError> {
        let snapshot: Snapshot =
            serde_yaml::from_str(content).map_err(|e| SchemaError::Snapshot(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Parse a JSON snapshot
    pub fn from_json(content: &str) -> Result<Self, SchemaError> {
        let snapshot: Snapshot =
            serde_json::from_str(content).map_err(|e| SchemaError::Snapshot(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a snapshot file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Snapshot(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut provider = Self::new();
        for table in snapshot.tables {
            provider.insert(None, table);
        }
        for (database, tables) in snapshot.databases {
            for table in tables {
                provider.insert(Some(&database), table);
            }
        }
        provider
    }
}

impl SchemaInfoProvider for StaticSchemaProvider {
    fn table_info(&self, table: &str, database: Option<&str>) -> Result<TableSchema, SchemaError> {
        self.databases
            .get(database.unwrap_or_default())
            .and_then(|tables| tables.get(table))
            .cloned()
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))
    }

    fn table_names(&self, database: Option<&str>) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .databases
            .get(database.unwrap_or_default())
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default())
    }
}
