use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::provider::SchemaInfoProvider;
use super::types::{ColumnMeta, ForeignKeyRef, TableSchema};
use crate::error::SchemaError;

/// Reads table metadata from a SQLite database through its pragmas
pub struct SqliteSchemaProvider {
    conn: Connection,
}

impl SqliteSchemaProvider {
    /// Open a database file read-only
    pub fn open(db_path: &Path) -> Result<Self, SchemaError> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SchemaError::Query {
                table: db_path.display().to_string(),
                source,
            })?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn query_columns(&self, table: &str, database: Option<&str>) -> rusqlite::Result<Vec<RawColumn>> {
        let sql = format!("PRAGMA {}table_info({})", schema_prefix(database), quote(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(RawColumn {
                name: row.get(1)?,
                sql_type: row.get(2)?,
                pk_position: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    fn query_foreign_keys(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> rusqlite::Result<Vec<(String, String, Option<String>)>> {
        let sql = format!("PRAGMA {}foreign_key_list({})", schema_prefix(database), quote(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get(3)?, row.get(2)?, row.get(4)?)))?;
        rows.collect()
    }

    fn query_unique_indexes(&self, table: &str, database: Option<&str>) -> rusqlite::Result<Vec<Vec<String>>> {
        let prefix = schema_prefix(database);
        let sql = format!("PRAGMA {}index_list({})", prefix, quote(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<(String, bool, String)> = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?, row.get(3)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut indexes = Vec::new();
        // origin "pk" duplicates the primary key
        for (index_name, unique, origin) in names {
            if !unique || origin == "pk" {
                continue;
            }
            let sql = format!("PRAGMA {}index_info({})", prefix, quote(&index_name));
            let mut stmt = self.conn.prepare(&sql)?;
            let mut columns: Vec<(i64, String)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(2)?)))?
                .collect::<rusqlite::Result<_>>()?;
            columns.sort_by_key(|(seq, _)| *seq);
            indexes.push(columns.into_iter().map(|(_, name)| name).collect());
        }
        // index_list reports the most recent index first
        indexes.reverse();
        Ok(indexes)
    }

    fn primary_key_of(&self, table: &str, database: Option<&str>) -> Option<String> {
        let mut columns = self.query_columns(table, database).ok()?;
        columns.retain(|c| c.pk_position > 0);
        columns.sort_by_key(|c| c.pk_position);
        columns.into_iter().next().map(|c| c.name)
    }
}

struct RawColumn {
    name: String,
    sql_type: String,
    pk_position: i64,
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn schema_prefix(database: Option<&str>) -> String {
    match database {
        Some(db) => format!("{}.", quote(db)),
        None => String::new(),
    }
}

impl SchemaInfoProvider for SqliteSchemaProvider {
    fn table_info(&self, table: &str, database: Option<&str>) -> Result<TableSchema, SchemaError> {
        let wrap = |source| SchemaError::Query {
            table: table.to_string(),
            source,
        };

        let raw = self.query_columns(table, database).map_err(wrap)?;
        if raw.is_empty() {
            return Err(SchemaError::UnknownTable(table.to_string()));
        }

        let foreign_keys = self.query_foreign_keys(table, database).map_err(wrap)?;

        let mut primary: Vec<(i64, String)> = raw
            .iter()
            .filter(|c| c.pk_position > 0)
            .map(|c| (c.pk_position, c.name.clone()))
            .collect();
        primary.sort_by_key(|(pos, _)| *pos);
        let primary_key_columns: Vec<String> = primary.into_iter().map(|(_, name)| name).collect();

        let columns: Vec<ColumnMeta> = raw
            .iter()
            .map(|c| {
                let foreign_key = foreign_keys
                    .iter()
                    .find(|(from, _, _)| *from == c.name)
                    .map(|(_, target_table, target_column)| {
                        let target_column = target_column
                            .clone()
                            .or_else(|| self.primary_key_of(target_table, database))
                            .unwrap_or_else(|| "id".to_string());
                        let fk = ForeignKeyRef::new(target_table.clone(), target_column);
                        match database {
                            Some(db) => fk.in_database(db),
                            None => fk,
                        }
                    });

                ColumnMeta {
                    name: c.name.clone(),
                    sql_type: (!c.sql_type.trim().is_empty()).then(|| c.sql_type.to_lowercase()),
                    is_primary_key_component: c.pk_position > 0,
                    foreign_key,
                }
            })
            .collect();

        // A lone INTEGER primary key aliases the rowid and is assigned by SQLite
        let auto_increment_column = match primary_key_columns.as_slice() {
            [only] => raw
                .iter()
                .find(|c| &c.name == only)
                .filter(|c| c.sql_type.eq_ignore_ascii_case("integer"))
                .map(|c| c.name.clone()),
            _ => None,
        };

        let unique_indexes = self.query_unique_indexes(table, database).map_err(wrap)?;

        Ok(TableSchema {
            table_name: table.to_string(),
            columns,
            primary_key_columns,
            auto_increment_column,
            unique_indexes,
        })
    }

    fn table_names(&self, database: Option<&str>) -> Result<Vec<String>, SchemaError> {
        let sql = format!(
            "SELECT name FROM {}sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            schema_prefix(database)
        );
        let wrap = |source| SchemaError::Query {
            table: "sqlite_master".to_string(),
            source,
        };
        let mut stmt = self.conn.prepare(&sql).map_err(wrap)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(wrap)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(wrap)?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SqliteSchemaProvider {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (
                 id INTEGER PRIMARY KEY,
                 email VARCHAR(128) NOT NULL,
                 name TEXT,
                 UNIQUE (email)
             );
             CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 customer_id INT REFERENCES customers(id),
                 status VARCHAR(32),
                 created_at DATETIME,
                 notes
             );
             CREATE TABLE order_tags (
                 order_id INT REFERENCES orders,
                 tag VARCHAR(20),
                 PRIMARY KEY (order_id, tag)
             );",
        )
        .unwrap();
        SqliteSchemaProvider::from_connection(conn)
    }

    #[test]
    fn test_table_info_columns_and_keys() {
        let provider = provider();
        let orders = provider.table_info("orders", None).unwrap();

        assert_eq!(
            orders.column_names(),
            vec!["id", "customer_id", "status", "created_at", "notes"]
        );
        assert_eq!(orders.primary_key_columns, vec!["id"]);
        assert_eq!(orders.auto_increment_column.as_deref(), Some("id"));
        assert_eq!(orders.column("status").unwrap().sql_type.as_deref(), Some("varchar(32)"));
        assert_eq!(orders.column("notes").unwrap().sql_type, None);

        let fk = orders.column("customer_id").unwrap().foreign_key.clone().unwrap();
        assert_eq!(fk, ForeignKeyRef::new("customers", "id"));
    }

    #[test]
    fn test_composite_key_is_not_auto_increment() {
        let provider = provider();
        let tags = provider.table_info("order_tags", None).unwrap();
        assert_eq!(tags.primary_key_columns, vec!["order_id", "tag"]);
        assert_eq!(tags.auto_increment_column, None);

        // implicit target column resolves to the parent's primary key
        let fk = tags.column("order_id").unwrap().foreign_key.clone().unwrap();
        assert_eq!(fk.target_column, "id");
    }

    #[test]
    fn test_unique_indexes() {
        let provider = provider();
        let customers = provider.table_info("customers", None).unwrap();
        assert_eq!(customers.unique_indexes, vec![vec!["email".to_string()]]);
    }

    #[test]
    fn test_table_names_and_unknown_table() {
        let provider = provider();
        assert_eq!(
            provider.table_names(None).unwrap(),
            vec!["customers", "order_tags", "orders"]
        );
        assert!(matches!(
            provider.table_info("missing", None),
            Err(SchemaError::UnknownTable(_))
        ));
    }
}
