//! Unit tests for the textual type syntax used in catalog files

#[cfg(test)]
mod type_ref_tests {
    use navrewrite::query_planner::types::TypeRef;
    use test_case::test_case;

    #[test_case("int" => Some(TypeRef::int()); "plain scalar")]
    #[test_case("int?" => Some(TypeRef::nullable_scalar("int")); "nullable scalar")]
    #[test_case("  Guid? " => Some(TypeRef::nullable_scalar("Guid")); "surrounding whitespace")]
    #[test_case("date_time" => Some(TypeRef::scalar("date_time")); "underscore")]
    #[test_case("" => None; "empty")]
    #[test_case("?" => None; "bare question mark")]
    #[test_case("int??" => None; "double nullable")]
    #[test_case("List<int>" => None; "generic syntax")]
    #[test_case("Order.Id" => None; "dotted path")]
    fn test_parse(text: &str) -> Option<TypeRef> {
        TypeRef::parse(text)
    }

    #[test_case(TypeRef::nullable_scalar("decimal") => "decimal?"; "nullable scalar")]
    #[test_case(TypeRef::sequence_of(TypeRef::entity("Order")) => "Sequence<Order>"; "sequence")]
    #[test_case(TypeRef::queryable_of(TypeRef::entity("Order")) => "Queryable<Order>"; "queryable")]
    #[test_case(TypeRef::Tuple(vec![TypeRef::int(), TypeRef::entity("Customer")]) => "(int, Customer)"; "tuple")]
    #[test_case(TypeRef::Function { params: vec![TypeRef::entity("Order")], ret: Box::new(TypeRef::boolean()) } => "Func<Order, bool>"; "function")]
    fn test_display(ty: TypeRef) -> String {
        ty.to_string()
    }

    #[test]
    fn test_display_of_parsed_scalars_round_trips() {
        for text in ["int", "int?", "string", "Guid?"] {
            assert_eq!(TypeRef::parse(text).unwrap().to_string(), text);
        }
    }

    #[test_case(TypeRef::int() => false; "non-nullable scalar")]
    #[test_case(TypeRef::nullable_scalar("int") => true; "nullable scalar")]
    #[test_case(TypeRef::entity("Customer") => true; "entity")]
    #[test_case(TypeRef::sequence_of(TypeRef::int()) => true; "sequence")]
    fn test_is_nullable(ty: TypeRef) -> bool {
        ty.is_nullable()
    }
}
