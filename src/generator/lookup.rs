//! Lookup ("table list") definitions for foreign-key pickers

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::registry::{LookupKey, LookupRegistry};
use crate::config::ChloroformExtensions;
use crate::debug::DebugLog;
use crate::error::Result;
use crate::resolve::{merge_concat, resolve_tree, Variables};
use crate::schema::RepresentativeColumnFinder;

/// Result count above which pickers switch to a searchable widget
pub const DEFAULT_THRESHOLD: u32 = 200;

/// Render hint: plain select below the threshold, autocomplete above it
pub const DEFAULT_RENDER: &str = "adaptive";

/// How to populate the picker of one foreign table column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupDefinition {
    #[serde(skip)]
    pub key: LookupKey,
    pub table: String,
    pub column: String,
    pub query: String,
    pub display_column: String,
    pub search_column: String,
    pub render: String,
    pub threshold: u32,
    pub security: Value,
}

impl LookupDefinition {
    pub fn identifier(&self) -> String {
        self.key.to_string()
    }
}

/// `{any: {micro_permission: "store.<table>.read"}}`
pub fn default_security(table: &str) -> Value {
    let mut any = Mapping::new();
    any.insert(
        "micro_permission".into(),
        format!("store.{}.read", table).into(),
    );
    let mut security = Mapping::new();
    security.insert("any".into(), Value::Mapping(any));
    Value::Mapping(security)
}

/// Turns the registry filled by the form builder into lookup definitions
pub struct LookupEmitter<'a, F: RepresentativeColumnFinder + ?Sized> {
    finder: &'a F,
    settings: &'a ChloroformExtensions,
    database: Option<&'a str>,
    debug: &'a dyn DebugLog,
}

impl<'a, F: RepresentativeColumnFinder + ?Sized> LookupEmitter<'a, F> {
    pub fn new(
        finder: &'a F,
        settings: &'a ChloroformExtensions,
        database: Option<&'a str>,
        debug: &'a dyn DebugLog,
    ) -> Self {
        Self {
            finder,
            settings,
            database,
            debug,
        }
    }

    /// One definition per distinct foreign table column, in discovery order
    pub fn emit(&self, registry: LookupRegistry) -> Result<Vec<LookupDefinition>> {
        if !self.settings.use_table_list {
            return Ok(Vec::new());
        }

        registry
            .targets()
            .into_iter()
            .map(|registration| {
                let database = registration
                    .foreign_key
                    .target_database
                    .as_deref()
                    .or(self.database);
                self.build(registration.key.clone(), database)
            })
            .collect()
    }

    fn build(&self, key: LookupKey, database: Option<&str>) -> Result<LookupDefinition> {
        let display = self.finder.find_representative_column(&key.table, database)?;
        self.debug.log(&format!(
            "Lookup {}: display column \"{}\".",
            key, display
        ));

        let label = format!("concat({}, '. ', {})", key.column, display);
        let query = format!(
            "select {} as value, {} as label from {}",
            key.column, label, key.table
        );

        let mut security = default_security(&key.table);
        if let Some(extra) = &self.settings.security {
            let mut extra = extra.clone();
            let vars = Variables::from([
                ("table".to_string(), key.table.clone()),
                ("column".to_string(), key.column.clone()),
            ]);
            resolve_tree(&mut extra, &vars);
            merge_concat(&mut security, extra);
        }

        Ok(LookupDefinition {
            table: key.table.clone(),
            column: key.column.clone(),
            query,
            display_column: display,
            search_column: label,
            render: DEFAULT_RENDER.to_string(),
            threshold: DEFAULT_THRESHOLD,
            security,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugLogger;
    use crate::error::SchemaError;
    use crate::schema::ForeignKeyRef;

    struct FixedFinder;

    impl RepresentativeColumnFinder for FixedFinder {
        fn find_representative_column(&self, table: &str, _database: Option<&str>) -> Result<String, SchemaError> {
            match table {
                "customers" => Ok("name".to_string()),
                "products" => Ok("label".to_string()),
                other => Err(SchemaError::UnknownTable(other.to_string())),
            }
        }
    }

    fn registry() -> LookupRegistry {
        let mut registry = LookupRegistry::new("store");
        registry.register("orders", "customer_id", &ForeignKeyRef::new("customers", "id"));
        registry.register("invoices", "customer_id", &ForeignKeyRef::new("customers", "id"));
        registry.register("orders", "product_id", &ForeignKeyRef::new("products", "id"));
        registry
    }

    #[test]
    fn test_emit_deduplicates_targets() {
        let settings = ChloroformExtensions::default();
        let debug = DebugLogger::disabled();
        let emitter = LookupEmitter::new(&FixedFinder, &settings, None, &debug);

        let lookups = emitter.emit(registry()).unwrap();
        let tables: Vec<_> = lookups.iter().map(|l| l.table.as_str()).collect();
        assert_eq!(tables, vec!["customers", "products"]);

        let customers = &lookups[0];
        assert_eq!(customers.identifier(), "store:generated/tablelist/customers.id");
        assert_eq!(
            customers.query,
            "select id as value, concat(id, '. ', name) as label from customers"
        );
        assert_eq!(customers.display_column, "name");
        assert_eq!(customers.search_column, "concat(id, '. ', name)");
        assert_eq!(customers.threshold, 200);
        assert_eq!(
            customers.security["any"]["micro_permission"],
            Value::from("store.customers.read")
        );
    }

    #[test]
    fn test_security_override_is_merged() {
        let settings = ChloroformExtensions {
            security: Some(
                serde_yaml::from_str("{any: {micro_permission: 'shop.{$table}.read'}, all: [csrf]}").unwrap(),
            ),
            ..ChloroformExtensions::default()
        };
        let debug = DebugLogger::disabled();
        let emitter = LookupEmitter::new(&FixedFinder, &settings, None, &debug);

        let lookups = emitter.emit(registry()).unwrap();
        let products = &lookups[1];
        assert_eq!(
            products.security["any"]["micro_permission"],
            Value::from("shop.products.read")
        );
        assert_eq!(products.security["all"][0], Value::from("csrf"));
    }

    #[test]
    fn test_disabled_table_list_emits_nothing() {
        let settings = ChloroformExtensions {
            use_table_list: false,
            ..ChloroformExtensions::default()
        };
        let debug = DebugLogger::disabled();
        let emitter = LookupEmitter::new(&FixedFinder, &settings, None, &debug);
        assert!(emitter.emit(registry()).unwrap().is_empty());
    }

    #[test]
    fn test_finder_failure_aborts() {
        let mut registry = LookupRegistry::new("store");
        registry.register("orders", "warehouse_id", &ForeignKeyRef::new("warehouses", "id"));
        let settings = ChloroformExtensions::default();
        let debug = DebugLogger::disabled();
        let emitter = LookupEmitter::new(&FixedFinder, &settings, None, &debug);
        assert!(emitter.emit(registry).is_err());
    }
}
