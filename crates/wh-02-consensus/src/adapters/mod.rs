//! Adapters for the consensus channel ports

mod hub;
mod schema;

pub use hub::StaticHub;
pub use schema::StructuralSchemaValidator;
