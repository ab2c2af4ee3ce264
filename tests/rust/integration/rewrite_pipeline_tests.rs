//! End-to-end navigation rewriting over serialized expressions and alias tables

#[cfg(test)]
mod rewrite_pipeline_tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::Result;
    use navrewrite::config::{RewriterConfig, SizeAccessorPolicy};
    use navrewrite::entity_catalog::{EntityCatalog, EntityCatalogConfig};
    use navrewrite::query_planner::logical_expr::visitors::{
        MemberAccessCollector, MethodCallCollector,
    };
    use navrewrite::query_planner::logical_expr::{ExprRef, LogicalExpr, ParameterExpr};
    use navrewrite::query_planner::navigation::{
        AliasMapping, AliasTables, FoundNavigationPaths, NavigationRewriteError,
    };
    use navrewrite::query_planner::types::TypeRef;
    use navrewrite::rewrite_navigations;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn shop() -> Result<EntityCatalog> {
        Ok(EntityCatalogConfig::from_yaml_file(fixture("shop.yaml"))?.to_catalog()?)
    }

    fn load_expr(name: &str) -> Result<ExprRef> {
        let json = fs::read_to_string(fixture(name))?;
        let expr: LogicalExpr = serde_json::from_str(&json)?;
        Ok(Arc::new(expr))
    }

    fn customer_root() -> ParameterExpr {
        ParameterExpr::new("c", TypeRef::entity("Customer"))
    }

    #[test]
    fn test_count_predicate_from_json() -> Result<()> {
        let catalog = shop()?;
        let expr = load_expr("customers_with_orders.json")?;
        assert_eq!(
            expr.to_string(),
            "Where(EntityQuery<Customer>, c => (c.Orders.Count > 2))"
        );

        let rewritten = rewrite_navigations(
            &expr,
            &catalog,
            customer_root(),
            &AliasMapping::default(),
            &FoundNavigationPaths::default(),
            &RewriterConfig::default(),
        )?;

        assert_eq!(
            rewritten.to_string(),
            "Where(EntityQuery<Customer>, c => (Count(Where(EntityQuery<Order>, \
             order => ((c != null) && (c.Id == order.CustomerId)))) > 2))"
        );
        // No collection navigation access survives the pass.
        assert!(!MemberAccessCollector::collect(&rewritten)
            .iter()
            .any(|path| path.ends_with(".Orders")));
        assert_eq!(
            MethodCallCollector::collect(&rewritten),
            vec!["Where", "Count", "Where"]
        );
        Ok(())
    }

    #[test]
    fn test_rewritten_tree_serializes_back() -> Result<()> {
        let catalog = shop()?;
        let expr = load_expr("customers_with_orders.json")?;
        let rewritten = rewrite_navigations(
            &expr,
            &catalog,
            customer_root(),
            &AliasMapping::default(),
            &FoundNavigationPaths::default(),
            &RewriterConfig::default(),
        )?;

        let json = serde_json::to_string(rewritten.as_ref())?;
        let reparsed: LogicalExpr = serde_json::from_str(&json)?;
        assert_eq!(&reparsed, rewritten.as_ref());
        Ok(())
    }

    #[test]
    fn test_transparent_identifier_fixture() -> Result<()> {
        let catalog = shop()?;
        let expr = load_expr("transparent_identifier.json")?;
        let aliases_json = fs::read_to_string(fixture("transparent_identifier_aliases.json"))?;
        let tables: AliasTables = serde_json::from_str(&aliases_json)?;
        let (aliases, found_paths) = tables.resolve(&catalog)?;
        assert_ne!(found_paths, FoundNavigationPaths::default());

        let root = ParameterExpr::new(
            "ti",
            TypeRef::Tuple(vec![TypeRef::entity("Customer"), TypeRef::entity("Order")]),
        );
        let rewritten = rewrite_navigations(
            &expr,
            &catalog,
            root,
            &aliases,
            &found_paths,
            &RewriterConfig::default(),
        )?;
        assert_eq!(
            rewritten.to_string(),
            "Where(EntityQuery<Order>, order => ((ti.Outer != null) && (ti.Outer.Id == order.CustomerId)))"
        );
        Ok(())
    }

    #[test]
    fn test_unknown_found_navigation_is_reported() -> Result<()> {
        let catalog = shop()?;
        let tables: AliasTables = serde_json::from_str(
            r#"{"found_navigation_paths": [{"root": {"Parameter": "c"}, "navigations": ["Customer.Invoices"]}]}"#,
        )?;
        assert_eq!(
            tables.resolve(&catalog).unwrap_err(),
            NavigationRewriteError::UnknownNavigation {
                navigation: "Customer.Invoices".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn test_config_fixture_drives_size_accessors() -> Result<()> {
        let catalog = shop()?;
        let config = RewriterConfig::from_yaml_file(fixture("rewriter.yaml"))?;
        assert_eq!(config.max_depth, 512);
        assert_eq!(config.unsupported_size_accessor, SizeAccessorPolicy::Fail);

        let json = r#"{
            "MemberAccess": {
                "target": {
                    "MemberAccess": {
                        "target": { "Parameter": { "name": "c", "ty": { "Entity": "Customer" } } },
                        "member": "Orders",
                        "ty": { "Sequence": { "Entity": "Order" } }
                    }
                },
                "member": "Length",
                "ty": { "Scalar": { "name": "int", "nullable": false } }
            }
        }"#;
        let expr: ExprRef = Arc::new(serde_json::from_str(json)?);
        let rewritten = rewrite_navigations(
            &expr,
            &catalog,
            customer_root(),
            &AliasMapping::default(),
            &FoundNavigationPaths::default(),
            &config,
        )?;
        assert!(rewritten.to_string().starts_with("Count(Where(EntityQuery<Order>"));
        Ok(())
    }

    #[test]
    fn test_expression_without_navigations_is_shared() -> Result<()> {
        let catalog = shop()?;
        let json = r#"{
            "MemberAccess": {
                "target": { "Parameter": { "name": "c", "ty": { "Entity": "Customer" } } },
                "member": "Name",
                "ty": { "Scalar": { "name": "string", "nullable": false } }
            }
        }"#;
        let expr: ExprRef = Arc::new(serde_json::from_str(json)?);
        let rewritten = rewrite_navigations(
            &expr,
            &catalog,
            customer_root(),
            &AliasMapping::default(),
            &FoundNavigationPaths::default(),
            &RewriterConfig::default(),
        )?;
        assert!(Arc::ptr_eq(&expr, &rewritten));
        Ok(())
    }
}
