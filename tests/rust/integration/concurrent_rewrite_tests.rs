//! Independent rewrite passes sharing one catalog across threads

#[cfg(test)]
mod concurrent_rewrite_tests {
    use std::sync::Arc;
    use std::thread;

    use navrewrite::config::RewriterConfig;
    use navrewrite::entity_catalog::{EntityCatalog, EntityCatalogConfig};
    use navrewrite::query_planner::logical_expr::combinators::{member, parameter};
    use navrewrite::query_planner::logical_expr::ParameterExpr;
    use navrewrite::query_planner::navigation::{
        AliasMapping, FoundNavigationPaths, NavigationRewriter,
    };
    use navrewrite::query_planner::types::TypeRef;

    const CATALOG: &str = r#"
entities:
  - name: Customer
    key: Id
    properties:
      Id: int
  - name: Order
    key: Id
    properties:
      Id: int
      CustomerId: int
relationships:
  - principal: Customer
    dependent: Order
    foreign_key: CustomerId
    principal_navigation: Orders
"#;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_catalog_shared_between_passes() {
        assert_send_sync::<EntityCatalog>();

        let catalog = Arc::new(
            EntityCatalogConfig::from_yaml_str(CATALOG)
                .unwrap()
                .to_catalog()
                .unwrap(),
        );
        let config = RewriterConfig::default();
        let aliases = AliasMapping::default();
        let found = FoundNavigationPaths::default();

        let results: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let catalog = Arc::clone(&catalog);
                    let (config, aliases, found) = (&config, &aliases, &found);
                    scope.spawn(move || {
                        let name = format!("c{}", i);
                        let root = ParameterExpr::new(name.clone(), TypeRef::entity("Customer"));
                        let c = parameter(name, TypeRef::entity("Customer"));
                        let expr = member(
                            &c,
                            "Orders",
                            TypeRef::sequence_of(TypeRef::entity("Order")),
                        );
                        NavigationRewriter::new(&catalog, root, aliases, found, config)
                            .rewrite(&expr)
                            .unwrap()
                            .into_inner()
                            .to_string()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (i, text) in results.iter().enumerate() {
            assert_eq!(
                text,
                &format!(
                    "Where(EntityQuery<Order>, order => ((c{i} != null) && (c{i}.Id == order.CustomerId)))"
                )
            );
        }
    }
}
