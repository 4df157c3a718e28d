use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Foreign key reference attached to a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Database holding the referenced table (None: same database)
    #[serde(default, rename = "database", skip_serializing_if = "Option::is_none")]
    pub target_database: Option<String>,
    #[serde(rename = "table")]
    pub target_table: String,
    #[serde(rename = "column", default = "default_target_column")]
    pub target_column: String,
}

fn default_target_column() -> String {
    "id".to_string()
}

impl ForeignKeyRef {
    pub fn new(target_table: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            target_database: None,
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }

    /// Set the database of the referenced table
    pub fn in_database(self, database: impl Into<String>) -> Self {
        Self {
            target_database: Some(database.into()),
            ..self
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Declared SQL type, e.g. `varchar(64)`. None when the schema declares no type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    #[serde(default, rename = "primary_key")]
    pub is_primary_key_component: bool,
    #[serde(default, rename = "references", skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnMeta {
    /// Create a plain typed column
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: Some(sql_type.into()),
            is_primary_key_component: false,
            foreign_key: None,
        }
    }

    /// Create a column without a declared type
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            is_primary_key_component: false,
            foreign_key: None,
        }
    }

    /// Mark the column as part of the primary key
    pub fn primary(self) -> Self {
        Self {
            is_primary_key_component: true,
            ..self
        }
    }

    /// Attach a foreign key reference
    pub fn references(self, foreign_key: ForeignKeyRef) -> Self {
        Self {
            foreign_key: Some(foreign_key),
            ..self
        }
    }
}

/// Table schema as reported by a schema info provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(rename = "name")]
    pub table_name: String,
    pub columns: Vec<ColumnMeta>,
    /// Primary key columns in key order. Filled from the columns when empty.
    #[serde(default, rename = "primary_key", skip_serializing_if = "Vec::is_empty")]
    pub primary_key_columns: Vec<String>,
    #[serde(default, rename = "auto_increment", skip_serializing_if = "Option::is_none")]
    pub auto_increment_column: Option<String>,
    /// Unique indexes, each one an ordered list of columns
    #[serde(default, rename = "unique", skip_serializing_if = "Vec::is_empty")]
    pub unique_indexes: Vec<Vec<String>>,
}

impl TableSchema {
    /// Create a table from its columns; the primary key is taken from the
    /// columns flagged as primary key components
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnMeta>) -> Self {
        let primary_key_columns = columns
            .iter()
            .filter(|c| c.is_primary_key_component)
            .map(|c| c.name.clone())
            .collect();

        Self {
            table_name: table_name.into(),
            columns,
            primary_key_columns,
            auto_increment_column: None,
            unique_indexes: Vec::new(),
        }
    }

    /// Set the auto-incremented column
    pub fn auto_increment(self, column: impl Into<String>) -> Self {
        Self {
            auto_increment_column: Some(column.into()),
            ..self
        }
    }

    /// Add a unique index
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique_indexes
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Fill derived fields after deserialization
    pub(crate) fn normalize(mut self) -> Self {
        if self.primary_key_columns.is_empty() {
            self.primary_key_columns = self
                .columns
                .iter()
                .filter(|c| c.is_primary_key_component)
                .map(|c| c.name.clone())
                .collect();
        }
        for col in &mut self.columns {
            if self.primary_key_columns.contains(&col.name) {
                col.is_primary_key_component = true;
            }
        }
        self
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column name -> declared SQL type, for typed columns only
    pub fn types(&self) -> BTreeMap<&str, &str> {
        self.columns
            .iter()
            .filter_map(|c| c.sql_type.as_deref().map(|t| (c.name.as_str(), t)))
            .collect()
    }

    /// Column name -> foreign key reference
    pub fn foreign_keys(&self) -> BTreeMap<&str, &ForeignKeyRef> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c.name.as_str(), fk)))
            .collect()
    }

    /// Record identifier columns: the primary key, else the first unique
    /// index, else every column
    pub fn ric(&self) -> Vec<String> {
        let strict = self.strict_ric();
        if strict.is_empty() {
            self.columns.iter().map(|c| c.name.clone()).collect()
        } else {
            strict
        }
    }

    /// Record identifier columns that really identify a row: the primary
    /// key, else the first unique index, else nothing
    pub fn strict_ric(&self) -> Vec<String> {
        if !self.primary_key_columns.is_empty() {
            return self.primary_key_columns.clone();
        }
        self.unique_indexes.first().cloned().unwrap_or_default()
    }
}
