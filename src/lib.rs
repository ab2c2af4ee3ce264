//! navrewrite - Collection-navigation rewriting for query expression trees
//!
//! This crate turns object-graph traversals in a query expression
//! (`c.Orders`, `c.Orders.Count`) into correlated subqueries over flat entity
//! sets, using the foreign keys of an entity mapping model:
//! - Entity catalogs (entity types, keys, relationships) loaded from YAML
//! - A typed expression IR with JSON (de)serialisation
//! - Alias-table driven binding of member chains to navigations
//! - The navigation rewrite pass itself

/// Debug print macro that only compiles in debug builds.
/// In release builds, this expands to nothing, so there's zero runtime cost.
#[macro_export]
macro_rules! debug_print {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        eprintln!($($arg)*);
    };
}

pub mod utils;

pub mod config;
pub mod entity_catalog;
pub mod query_planner;

pub use query_planner::rewrite_navigations;
