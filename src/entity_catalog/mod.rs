pub mod config;
pub mod entity_schema;
pub mod errors;

pub use config::{EntityCatalogConfig, Identifier};
pub use entity_schema::{EntityCatalog, EntityType, ForeignKey, Navigation, Property};
pub use errors::EntityCatalogError;
