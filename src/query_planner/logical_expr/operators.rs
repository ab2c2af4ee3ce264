//! Well-known query operators.
//!
//! Builders for the generic operators rewrite passes synthesise (`Where`,
//! `Count`, `Any`), plus recognisers for the call shapes passes must treat
//! specially (eager-loading markers, `SelectMany`, `List.Exists`). Builders
//! are parameterised by element type, which becomes the single generic
//! argument of the produced call.

use std::sync::Arc;

use super::{ExprRef, LogicalExpr, MethodCall, MethodOwner, MethodRef};
use crate::query_planner::types::TypeRef;

pub const WHERE: &str = "Where";
pub const COUNT: &str = "Count";
pub const ANY: &str = "Any";
pub const SELECT_MANY: &str = "SelectMany";
pub const INCLUDE: &str = "Include";
pub const THEN_INCLUDE: &str = "ThenInclude";
pub const EXISTS: &str = "Exists";

/// Query over all instances of `entity`.
pub fn entity_query(entity: &str) -> ExprRef {
    Arc::new(LogicalExpr::EntityQuery(entity.to_string()))
}

fn static_call(method: MethodRef, args: Vec<ExprRef>, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::MethodCall(MethodCall {
        method,
        receiver: None,
        args,
        ty,
    }))
}

/// `Queryable.Where<T>(source, predicate)`
pub fn where_(element: &TypeRef, source: ExprRef, predicate: ExprRef) -> ExprRef {
    static_call(
        MethodRef::new(MethodOwner::Queryable, WHERE, vec![element.clone()]),
        vec![source, predicate],
        TypeRef::queryable_of(element.clone()),
    )
}

/// `Queryable.Count<T>(source)`
pub fn count(element: &TypeRef, source: ExprRef) -> ExprRef {
    static_call(
        MethodRef::new(MethodOwner::Queryable, COUNT, vec![element.clone()]),
        vec![source],
        TypeRef::int(),
    )
}

/// `Any<T>(source, predicate)`. Queryable sources get the queryable operator,
/// anything else the in-memory one.
pub fn any(element: &TypeRef, source: ExprRef, predicate: ExprRef) -> ExprRef {
    let owner = if source.ty().is_queryable() {
        MethodOwner::Queryable
    } else {
        MethodOwner::Enumerable
    };
    static_call(
        MethodRef::new(owner, ANY, vec![element.clone()]),
        vec![source, predicate],
        TypeRef::boolean(),
    )
}

/// `Queryable.SelectMany<TSource, TCollection[, TResult]>(source, collection_selector[, result_selector])`
pub fn select_many(
    source_element: &TypeRef,
    collection_element: &TypeRef,
    source: ExprRef,
    collection_selector: ExprRef,
    result_selector: Option<(TypeRef, ExprRef)>,
) -> ExprRef {
    let mut type_args = vec![source_element.clone(), collection_element.clone()];
    let mut args = vec![source, collection_selector];
    let result_element = match result_selector {
        Some((result_ty, selector)) => {
            type_args.push(result_ty.clone());
            args.push(selector);
            result_ty
        }
        None => collection_element.clone(),
    };
    static_call(
        MethodRef::new(MethodOwner::Queryable, SELECT_MANY, type_args),
        args,
        TypeRef::queryable_of(result_element),
    )
}

/// Eager-loading marker: `Include<T, TProperty>(source, navigation_selector)`
pub fn include(
    element: &TypeRef,
    property: &TypeRef,
    source: ExprRef,
    navigation_selector: ExprRef,
) -> ExprRef {
    let ty = source.ty();
    static_call(
        MethodRef::new(
            MethodOwner::EagerLoading,
            INCLUDE,
            vec![element.clone(), property.clone()],
        ),
        vec![source, navigation_selector],
        ty,
    )
}

/// In-memory `list.Exists(predicate)`
pub fn list_exists(list: ExprRef, predicate: ExprRef) -> ExprRef {
    Arc::new(LogicalExpr::MethodCall(MethodCall {
        method: MethodRef::new(MethodOwner::List, EXISTS, vec![]),
        receiver: Some(list),
        args: vec![predicate],
        ty: TypeRef::boolean(),
    }))
}

pub fn is_eager_loading(call: &MethodCall) -> bool {
    call.method.owner == MethodOwner::EagerLoading
        && (call.method.name == INCLUDE || call.method.name == THEN_INCLUDE)
}

fn is_select_many(call: &MethodCall) -> bool {
    matches!(
        call.method.owner,
        MethodOwner::Queryable | MethodOwner::Enumerable
    ) && call.method.name == SELECT_MANY
        && call.method.is_closed_generic()
}

/// `SelectMany(source, collection_selector)`
pub fn is_select_many_collection_only(call: &MethodCall) -> bool {
    is_select_many(call) && call.args.len() == 2
}

/// `SelectMany(source, collection_selector, result_selector)`
pub fn is_select_many_with_result_selector(call: &MethodCall) -> bool {
    is_select_many(call) && call.args.len() == 3
}

/// Instance `list.Exists(predicate)` with a lambda predicate.
pub fn is_list_exists(call: &MethodCall) -> bool {
    call.method.is(&MethodOwner::List, EXISTS)
        && call.receiver.is_some()
        && call.args.len() == 1
        && call.args[0].as_lambda().is_some()
}
