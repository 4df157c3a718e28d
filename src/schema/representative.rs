use super::provider::SchemaInfoProvider;
use super::types::TableSchema;
use crate::error::SchemaError;

/// Candidate names tried when no configuration overrides them
pub const DEFAULT_COMMON_MATCHES: &[&str] = &["name", "label", "identifier"];

/// Picks the column that best represents a row of a table to a human
pub trait RepresentativeColumnFinder {
    fn find_representative_column(&self, table: &str, database: Option<&str>) -> Result<String, SchemaError>;
}

/// Heuristic finder driven by an ordered list of common column names
pub struct CommonMatchFinder<'a, P: SchemaInfoProvider + ?Sized> {
    provider: &'a P,
    common_matches: Vec<String>,
}

impl<'a, P: SchemaInfoProvider + ?Sized> CommonMatchFinder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            common_matches: DEFAULT_COMMON_MATCHES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the candidate names; an empty list keeps the defaults
    pub fn with_common_matches(self, common_matches: Vec<String>) -> Self {
        if common_matches.is_empty() {
            return self;
        }
        Self {
            common_matches,
            ..self
        }
    }

    /// Choose a column of an already loaded table
    pub fn pick(&self, table: &TableSchema) -> Option<String> {
        let names = table.column_names();

        // exact match, in candidate order
        for candidate in &self.common_matches {
            if let Some(name) = names.iter().find(|n| n.eq_ignore_ascii_case(candidate)) {
                return Some(name.to_string());
            }
        }

        // partial match, e.g. "product_name"
        for candidate in &self.common_matches {
            let candidate = candidate.to_lowercase();
            if let Some(name) = names.iter().find(|n| n.to_lowercase().contains(&candidate)) {
                return Some(name.to_string());
            }
        }

        let text_like = table.columns.iter().find(|c| {
            !c.is_primary_key_component
                && c.foreign_key.is_none()
                && c.sql_type.as_deref().is_some_and(is_text_type)
        });
        if let Some(col) = text_like {
            return Some(col.name.clone());
        }

        table
            .primary_key_columns
            .first()
            .cloned()
            .or_else(|| names.first().map(|n| n.to_string()))
    }
}

fn is_text_type(sql_type: &str) -> bool {
    let keyword = sql_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    matches!(
        keyword.as_str(),
        "char" | "varchar" | "nchar" | "nvarchar" | "text" | "tinytext" | "mediumtext" | "longtext"
    )
}

impl<P: SchemaInfoProvider + ?Sized> RepresentativeColumnFinder for CommonMatchFinder<'_, P> {
    fn find_representative_column(&self, table: &str, database: Option<&str>) -> Result<String, SchemaError> {
        let schema = self.provider.table_info(table, database)?;
        self.pick(&schema)
            .ok_or_else(|| SchemaError::Snapshot(format!("Table {} has no columns", table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnMeta, StaticSchemaProvider};

    fn table(columns: Vec<ColumnMeta>) -> TableSchema {
        TableSchema::new("t", columns)
    }

    #[test]
    fn test_exact_match_follows_candidate_order() {
        let provider = StaticSchemaProvider::new();
        let finder = CommonMatchFinder::new(&provider);
        let t = table(vec![
            ColumnMeta::new("id", "int").primary(),
            ColumnMeta::new("label", "varchar(20)"),
            ColumnMeta::new("name", "varchar(20)"),
        ]);
        assert_eq!(finder.pick(&t).as_deref(), Some("name"));
    }

    #[test]
    fn test_partial_match() {
        let provider = StaticSchemaProvider::new();
        let finder = CommonMatchFinder::new(&provider);
        let t = table(vec![
            ColumnMeta::new("id", "int").primary(),
            ColumnMeta::new("product_name", "varchar(20)"),
        ]);
        assert_eq!(finder.pick(&t).as_deref(), Some("product_name"));
    }

    #[test]
    fn test_falls_back_to_text_column_then_key() {
        let provider = StaticSchemaProvider::new();
        let finder = CommonMatchFinder::new(&provider);

        let t = table(vec![
            ColumnMeta::new("id", "int").primary(),
            ColumnMeta::new("amount", "decimal(10,2)"),
            ColumnMeta::new("email", "varchar(128)"),
        ]);
        assert_eq!(finder.pick(&t).as_deref(), Some("email"));

        let t = table(vec![
            ColumnMeta::new("amount", "decimal(10,2)"),
            ColumnMeta::new("id", "int").primary(),
        ]);
        assert_eq!(finder.pick(&t).as_deref(), Some("id"));
    }

    #[test]
    fn test_custom_matches_through_provider() {
        let provider = StaticSchemaProvider::new().with_table(table(vec![
            ColumnMeta::new("id", "int").primary(),
            ColumnMeta::new("name", "varchar(20)"),
            ColumnMeta::new("title", "varchar(20)"),
        ]));
        let finder = CommonMatchFinder::new(&provider).with_common_matches(vec!["title".into()]);
        assert_eq!(finder.find_representative_column("t", None).unwrap(), "title");
        assert!(finder.find_representative_column("missing", None).is_err());
    }
}
