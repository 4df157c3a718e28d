use std::fmt;

use crate::schema::ForeignKeyRef;

/// Identity of a generated lookup: one per plugin, foreign table and column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub plugin: String,
    pub table: String,
    pub column: String,
}

impl LookupKey {
    pub fn new(plugin: &str, foreign_key: &ForeignKeyRef) -> Self {
        Self {
            plugin: plugin.to_string(),
            table: foreign_key.target_table.clone(),
            column: foreign_key.target_column.clone(),
        }
    }

    /// Artifact path relative to the lookup target directory
    pub fn relative_path(&self) -> String {
        format!(
            "{}/generated/tablelist/{}.{}.yml",
            self.plugin, self.table, self.column
        )
    }
}

/// `<plugin>:generated/tablelist/<table>.<column>`
impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:generated/tablelist/{}.{}",
            self.plugin, self.table, self.column
        )
    }
}

/// One foreign-key column that needs a picker
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRegistration {
    pub owner_table: String,
    pub column: String,
    pub key: LookupKey,
    pub foreign_key: ForeignKeyRef,
}

impl LookupRegistration {
    pub fn lookup_identifier(&self) -> String {
        self.key.to_string()
    }
}

/// Lookups discovered while building forms, in discovery order.
///
/// Filled by the form builder and then handed to the lookup emitter.
#[derive(Debug, Clone, Default)]
pub struct LookupRegistry {
    plugin: String,
    registrations: Vec<LookupRegistration>,
}

impl LookupRegistry {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            registrations: Vec::new(),
        }
    }

    /// Register a picker column and return its lookup identifier.
    /// Registering the same owner table and column again replaces the entry.
    pub fn register(&mut self, owner_table: &str, column: &str, foreign_key: &ForeignKeyRef) -> String {
        let registration = LookupRegistration {
            owner_table: owner_table.to_string(),
            column: column.to_string(),
            key: LookupKey::new(&self.plugin, foreign_key),
            foreign_key: foreign_key.clone(),
        };
        let identifier = registration.lookup_identifier();

        match self
            .registrations
            .iter_mut()
            .find(|r| r.owner_table == owner_table && r.column == column)
        {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }

        identifier
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn registrations(&self) -> &[LookupRegistration] {
        &self.registrations
    }

    /// Registrations made for one owner table
    pub fn for_owner<'a>(&'a self, owner_table: &'a str) -> impl Iterator<Item = &'a LookupRegistration> + 'a {
        self.registrations
            .iter()
            .filter(move |r| r.owner_table == owner_table)
    }

    /// Distinct lookup targets, in first-registration order
    pub fn targets(&self) -> Vec<&LookupRegistration> {
        let mut seen: Vec<&LookupKey> = Vec::new();
        let mut targets = Vec::new();
        for registration in &self.registrations {
            if !seen.contains(&&registration.key) {
                seen.push(&registration.key);
                targets.push(registration);
            }
        }
        targets
    }
}
