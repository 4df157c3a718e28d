use anyhow::{bail, Result};

use crate::error::GenerateError;

/// Narrows the configured target tables from the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TableFilter {
    #[default]
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl TableFilter {
    /// Build a filter from `--include` / `--exclude`
    pub fn from_options(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Result<Self> {
        match (include, exclude) {
            (Some(_), Some(_)) => {
                bail!("Cannot use both --include and --exclude at the same time");
            }
            (Some(include_list), None) => Ok(TableFilter::Include(include_list)),
            (None, Some(exclude_list)) => Ok(TableFilter::Exclude(exclude_list)),
            (None, None) => Ok(TableFilter::All),
        }
    }

    /// Apply the filter, keeping the order of `tables`
    pub fn apply(&self, tables: Vec<String>) -> Result<Vec<String>, GenerateError> {
        let named = match self {
            TableFilter::All => return Ok(tables),
            TableFilter::Include(names) | TableFilter::Exclude(names) => names,
        };

        // Validate all named tables exist
        if let Some(unknown) = named.iter().find(|n| !tables.contains(*n)) {
            return Err(GenerateError::Config(format!("Unknown table: {}", unknown)));
        }

        let keep_named = matches!(self, TableFilter::Include(_));
        Ok(tables
            .into_iter()
            .filter(|t| named.contains(t) == keep_named)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Vec<String> {
        vec!["orders".into(), "customers".into(), "products".into()]
    }

    #[test]
    fn test_include_keeps_configured_order() {
        let filter = TableFilter::Include(vec!["products".into(), "orders".into()]);
        assert_eq!(filter.apply(tables()).unwrap(), vec!["orders", "products"]);
    }

    #[test]
    fn test_exclude() {
        let filter = TableFilter::Exclude(vec!["customers".into()]);
        assert_eq!(filter.apply(tables()).unwrap(), vec!["orders", "products"]);
    }

    #[test]
    fn test_unknown_table_error() {
        let filter = TableFilter::Include(vec!["nonexistent".into()]);
        assert!(filter.apply(tables()).is_err());
    }

    #[test]
    fn test_both_options_rejected() {
        assert!(TableFilter::from_options(Some(vec![]), Some(vec![])).is_err());
        assert_eq!(TableFilter::from_options(None, None).unwrap(), TableFilter::All);
    }
}
