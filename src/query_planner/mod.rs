use crate::{
    config::RewriterConfig,
    entity_catalog::EntityCatalog,
    query_planner::{
        logical_expr::{ExprRef, ParameterExpr},
        navigation::{
            AliasMapping, FoundNavigationPaths, NavigationRewriteResult, NavigationRewriter,
        },
    },
};

pub mod logical_expr;
pub mod navigation;
pub mod transformed;
pub mod types;

/// Rewrite every collection navigation in `expr` into a correlated subquery.
///
/// `root` is the parameter the alias tables are relative to. The returned
/// tree is `expr` itself when nothing needed rewriting. Trees nested deeper
/// than `config.max_depth` are refused with `DepthExceeded`.
pub fn rewrite_navigations(
    expr: &ExprRef,
    catalog: &EntityCatalog,
    root: ParameterExpr,
    aliases: &AliasMapping,
    found_paths: &FoundNavigationPaths,
    config: &RewriterConfig,
) -> NavigationRewriteResult<ExprRef> {
    let rewritten = NavigationRewriter::new(catalog, root, aliases, found_paths, config)
        .rewrite(expr)?;
    Ok(rewritten.into_inner())
}
