//! # Entity Catalog Error Types
//!
//! Errors raised while loading, validating or querying the entity catalog.
//!
//! ## Error Categories
//!
//! - **Lookup Errors**: Missing entity types, properties or navigations
//! - **Mapping Errors**: Keys and foreign keys that do not line up
//! - **Configuration Errors**: File I/O and parsing issues during catalog loading
//!
//! ## Usage Patterns
//!
//! When returning lookup errors, use the context helpers so the message says
//! where the lookup happened:
//!
//! ```ignore
//! EntityCatalogError::entity_error_with_context(
//!     "Customer",
//!     "While resolving relationship Customer -> Order"
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EntityCatalogError {
    #[error("No entity type found for `{entity}`")]
    Entity { entity: String },
    #[error("Entity type `{entity}` is defined more than once")]
    DuplicateEntity { entity: String },
    #[error("Entity type `{entity}` declares unknown base type `{base}`")]
    UnknownBaseType { entity: String, base: String },
    #[error("Entity type `{entity}` has an inheritance cycle")]
    InheritanceCycle { entity: String },
    #[error("Property `{property}` not found on entity type `{entity}`")]
    Property { entity: String, property: String },
    #[error("Property `{property}` on `{entity}` has an unparseable type `{ty}`")]
    InvalidPropertyType {
        entity: String,
        property: String,
        ty: String,
    },
    #[error("Navigation `{navigation}` is defined more than once on `{entity}`")]
    DuplicateNavigation { entity: String, navigation: String },
    #[error(
        "Foreign key on `{dependent}` has {foreign_key} properties but principal key on `{principal}` has {principal_key}"
    )]
    KeyArity {
        dependent: String,
        principal: String,
        foreign_key: usize,
        principal_key: usize,
    },
    #[error(
        "Foreign key property `{dependent}.{foreign_key}` ({foreign_key_type}) does not match principal key `{principal}.{principal_key}` ({principal_key_type})"
    )]
    KeyType {
        dependent: String,
        foreign_key: String,
        foreign_key_type: String,
        principal: String,
        principal_key: String,
        principal_key_type: String,
    },
    #[error("Entity type `{entity}` has no key")]
    MissingKey { entity: String },
    #[error("Failed to read catalog file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid catalog: {message}")]
    InvalidConfig { message: String },
}

/// Helper methods for creating errors with context information
impl EntityCatalogError {
    /// Create an Entity error with context information
    ///
    /// # Example
    /// ```ignore
    /// EntityCatalogError::entity_error_with_context(
    ///     "Customer",
    ///     "While resolving relationship Customer -> Order"
    /// )
    /// ```
    pub fn entity_error_with_context(
        entity: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        EntityCatalogError::Entity {
            entity: format!("{}\n  Context: {}", entity.into(), context.into()),
        }
    }

    /// Create a Property error with context information
    pub fn property_error_with_context(
        entity: impl Into<String>,
        property: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        EntityCatalogError::Property {
            entity: entity.into(),
            property: format!("{}\n  Context: {}", property.into(), context.into()),
        }
    }
}
