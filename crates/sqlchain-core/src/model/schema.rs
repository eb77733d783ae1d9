use crate::{model::EntityModel, sql::TableSource, traits::EntityKind};
use derive_more::Display;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

///
/// SchemaId
/// Process-unique identity of one `MappingSchema`; the plan cache partition key.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("schema#{_0}")]
pub struct SchemaId(u64);

///
/// MappingSchema
///
/// Naming policy that decides which table each entity reads from.
/// Every schema gets its own identity at construction, so two schemas never
/// share compiled plans even when their settings are equal. Share one
/// schema behind an `Arc` rather than rebuilding it per query.
///

#[derive(Debug)]
pub struct MappingSchema {
    id: SchemaId,
    name: String,
    qualifier: Option<String>,
    tables: BTreeMap<&'static str, String>,
    strict: bool,
}

impl MappingSchema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SchemaId(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            qualifier: None,
            tables: BTreeMap::new(),
            strict: false,
        }
    }

    /// Qualify every table with a database schema name.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Override the table an entity is read from.
    #[must_use]
    pub fn with_table<E: EntityKind>(mut self, table: impl Into<String>) -> Self {
        self.tables.insert(E::MODEL.path, table.into());
        self
    }

    /// Only resolve entities registered through `with_table`.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub const fn id(&self) -> SchemaId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the table source for an entity model under this schema.
    ///
    /// Returns `None` for an unregistered entity when the schema is strict.
    #[must_use]
    pub fn table_source(&self, model: &'static EntityModel) -> Option<TableSource> {
        let name = match self.tables.get(model.path) {
            Some(name) => name.clone(),
            None if self.strict => return None,
            None => model.table.to_string(),
        };

        Some(TableSource {
            qualifier: self.qualifier.clone(),
            name,
            model,
        })
    }
}
