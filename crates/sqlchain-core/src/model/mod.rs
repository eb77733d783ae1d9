//! Mapping metadata: entity models and the schema identity used to
//! partition compiled plans.

mod entity;
mod schema;


// re-exports
pub use entity::{EntityModel, FieldModel};
pub use schema::{MappingSchema, SchemaId};
