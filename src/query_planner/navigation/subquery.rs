use std::sync::Arc;

use log::debug;

use super::errors::{NavigationRewriteError, NavigationRewriteResult};
use super::key_access::key_equality;
use crate::entity_catalog::{EntityCatalog, Navigation};
use crate::query_planner::logical_expr::combinators::{and_also, lambda, not_null};
use crate::query_planner::logical_expr::operators::{entity_query, where_};
use crate::query_planner::logical_expr::{ExprRef, LogicalExpr, ParameterExpr};
use crate::query_planner::types::TypeRef;

/// Replace a collection navigation read off `outer` with
/// `Where(EntityQuery<Dependent>, d => ((outer != null) && (outerKey == d.ForeignKey)))`.
///
/// `inner` is the fresh parameter ranging over the dependent entity set; it
/// must be typed as the foreign key's dependent entity.
pub fn synthesize_subquery(
    catalog: &EntityCatalog,
    navigation: &Navigation,
    outer: &ExprRef,
    inner: ParameterExpr,
) -> NavigationRewriteResult<ExprRef> {
    let dependent = navigation.foreign_key.declaring_entity.as_str();
    catalog
        .entity(dependent)
        .map_err(|_| NavigationRewriteError::MissingEntity {
            entity: dependent.to_string(),
        })?;

    let inner_ref = Arc::new(LogicalExpr::Parameter(inner.clone()));
    let keys_match = key_equality(catalog, navigation, outer, &inner_ref)?;
    let predicate = and_also(not_null(outer), keys_match);

    debug!(
        "NavigationRewriter: {} on `{}` becomes a subquery over {}",
        navigation, outer, dependent
    );

    Ok(where_(
        &TypeRef::entity(dependent),
        entity_query(dependent),
        lambda(vec![inner], predicate),
    ))
}
