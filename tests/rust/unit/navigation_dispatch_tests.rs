//! Unit tests for the call shapes the navigation rewriter dispatches on

#[cfg(test)]
mod navigation_dispatch_tests {
    use std::sync::Arc;

    use navrewrite::entity_catalog::EntityCatalogConfig;
    use navrewrite::query_planner::logical_expr::combinators::{lambda, member, parameter};
    use navrewrite::query_planner::logical_expr::operators::{
        is_eager_loading, is_list_exists, is_select_many_collection_only,
        is_select_many_with_result_selector,
    };
    use navrewrite::query_planner::logical_expr::{
        ExprRef, LogicalExpr, MethodCall, MethodOwner, MethodRef, ParameterExpr,
    };
    use navrewrite::query_planner::navigation::{
        AliasMapping, AliasTableBinder, FoundNavigationPaths, NavigationBinder,
    };
    use navrewrite::query_planner::types::TypeRef;
    use test_case::test_case;

    #[derive(Debug, PartialEq)]
    enum Shape {
        EagerLoading,
        SelectManyCollection,
        SelectManyResult,
        ListExists,
        Plain,
    }

    fn shape(call: &MethodCall) -> Shape {
        if is_eager_loading(call) {
            Shape::EagerLoading
        } else if is_select_many_collection_only(call) {
            Shape::SelectManyCollection
        } else if is_select_many_with_result_selector(call) {
            Shape::SelectManyResult
        } else if is_list_exists(call) {
            Shape::ListExists
        } else {
            Shape::Plain
        }
    }

    fn predicate() -> ExprRef {
        let t = ParameterExpr::new("t", TypeRef::scalar("string"));
        lambda(
            vec![t],
            Arc::new(LogicalExpr::Parameter(ParameterExpr::new(
                "flag",
                TypeRef::boolean(),
            ))),
        )
    }

    fn call(
        owner: MethodOwner,
        name: &str,
        generic: bool,
        arity: usize,
        receiver: bool,
    ) -> MethodCall {
        let type_args = if generic {
            vec![TypeRef::entity("Customer")]
        } else {
            vec![]
        };
        MethodCall {
            method: MethodRef::new(owner, name, type_args),
            receiver: receiver
                .then(|| parameter("tags", TypeRef::sequence_of(TypeRef::scalar("string")))),
            args: (0..arity).map(|_| predicate()).collect(),
            ty: TypeRef::boolean(),
        }
    }

    #[test_case(MethodOwner::EagerLoading, "Include", true, 2, false => Shape::EagerLoading; "include")]
    #[test_case(MethodOwner::EagerLoading, "ThenInclude", true, 2, false => Shape::EagerLoading; "then include")]
    #[test_case(MethodOwner::EagerLoading, "AsNoTracking", true, 1, false => Shape::Plain; "other eager loading name")]
    #[test_case(MethodOwner::Queryable, "SelectMany", true, 2, false => Shape::SelectManyCollection; "queryable select many")]
    #[test_case(MethodOwner::Enumerable, "SelectMany", true, 3, false => Shape::SelectManyResult; "enumerable select many with selector")]
    #[test_case(MethodOwner::Queryable, "SelectMany", false, 2, false => Shape::Plain; "open generic select many")]
    #[test_case(MethodOwner::List, "SelectMany", true, 2, false => Shape::Plain; "select many on list")]
    #[test_case(MethodOwner::List, "Exists", false, 1, true => Shape::ListExists; "list exists")]
    #[test_case(MethodOwner::List, "Exists", false, 1, false => Shape::Plain; "exists without receiver")]
    #[test_case(MethodOwner::Enumerable, "Exists", false, 1, true => Shape::Plain; "exists on enumerable")]
    #[test_case(MethodOwner::Queryable, "Where", true, 2, false => Shape::Plain; "where")]
    fn test_call_shape(
        owner: MethodOwner,
        name: &str,
        generic: bool,
        arity: usize,
        receiver: bool,
    ) -> Shape {
        shape(&call(owner, name, generic, arity, receiver))
    }

    #[test]
    fn test_exists_requires_lambda_predicate() {
        let mut exists = call(MethodOwner::List, "Exists", false, 1, true);
        exists.args = vec![parameter("pred", TypeRef::boolean())];
        assert_eq!(shape(&exists), Shape::Plain);
    }

    const CATALOG: &str = r#"
entities:
  - name: Customer
    key: Id
    properties:
      Id: int
      Name: string
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
    dependent_navigation: Customer
"#;

    #[test_case(&["Orders"] => Some("c.Orders".to_string()); "collection navigation")]
    #[test_case(&["Orders", "Count"] => None; "member of a collection")]
    #[test_case(&["Name"] => None; "scalar property")]
    #[test_case(&["Invoices"] => None; "unknown member")]
    fn test_binding_of_member_chain(segments: &[&str]) -> Option<String> {
        let catalog = EntityCatalogConfig::from_yaml_str(CATALOG)
            .unwrap()
            .to_catalog()
            .unwrap();
        let root = ParameterExpr::new("c", TypeRef::entity("Customer"));
        let aliases = AliasMapping::default();
        let found = FoundNavigationPaths::default();
        let binder = AliasTableBinder::new(&catalog, root, &aliases, &found);

        let mut expr = parameter("c", TypeRef::entity("Customer"));
        for segment in segments {
            expr = member(&expr, *segment, TypeRef::int());
        }
        binder.bind(&expr).map(|binding| binding.path.to_string())
    }

    #[test]
    fn test_binding_through_reference_navigation() {
        let catalog = EntityCatalogConfig::from_yaml_str(CATALOG)
            .unwrap()
            .to_catalog()
            .unwrap();
        let root = ParameterExpr::new("o", TypeRef::entity("Order"));
        let aliases = AliasMapping::default();
        let found = FoundNavigationPaths::default();
        let binder = AliasTableBinder::new(&catalog, root, &aliases, &found);

        let o = parameter("o", TypeRef::entity("Order"));
        let customer = member(&o, "Customer", TypeRef::entity("Customer"));
        let orders = member(
            &customer,
            "Orders",
            TypeRef::sequence_of(TypeRef::entity("Order")),
        );

        let binding = binder.bind(&orders).unwrap();
        assert_eq!(binding.root.name, "o");
        let last = binding.last_navigation().unwrap();
        assert!(last.is_collection);
        assert_eq!(last.to_string(), "Customer.Orders");
        assert_eq!(binding.path.navigations.len(), 2);
    }
}
