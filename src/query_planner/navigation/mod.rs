//! Navigation rewriting: collection navigations to correlated subqueries.

pub mod alias_mapping;
pub mod binder;
pub mod errors;
pub mod key_access;
pub mod rewriter;
pub mod subquery;


pub use alias_mapping::{
    AliasMapping, AliasTables, FoundNavigationPaths, NavigationPath, NavigationPathSpec,
    NavigationRoot,
};
pub use binder::{AliasTableBinder, NavigationBinder, NavigationBinding};
pub use errors::{NavigationRewriteError, NavigationRewriteResult};
pub use rewriter::NavigationRewriter;
