//! Key-read expressions for correlation predicates.
//!
//! Reads an ordered list of key properties off an instance expression,
//! guards reads of properties declared on a subtype of the instance's static
//! type, coerces each outer/inner pair to a shared type and packs composite
//! keys into one order-preserving tuple.

use log::error;

use super::errors::{NavigationRewriteError, NavigationRewriteResult};
use crate::entity_catalog::{EntityCatalog, Navigation, Property};
use crate::query_planner::logical_expr::combinators::{
    conditional, convert, equal, member, null, tuple, type_is,
};
use crate::query_planner::logical_expr::ExprRef;
use crate::query_planner::types::TypeRef;

/// Read `property` off `instance`.
///
/// When the property is declared on a strict subtype of the instance's static
/// entity type the read becomes
/// `(x is Derived) ? Convert(Convert(x, Derived).Prop, T?) : null`.
pub fn read_property(
    catalog: &EntityCatalog,
    instance: &ExprRef,
    property: &Property,
) -> NavigationRewriteResult<ExprRef> {
    let declaring = property.declaring_entity.as_str();
    if catalog.get_entity(declaring).is_none() {
        return Err(NavigationRewriteError::MissingEntity {
            entity: declaring.to_string(),
        });
    }
    if catalog.find_property(declaring, &property.name).is_none() {
        return Err(NavigationRewriteError::MissingProperty {
            entity: declaring.to_string(),
            property: property.name.clone(),
        });
    }

    let instance_ty = instance.ty();
    let needs_guard = instance_ty.entity_name().is_some_and(|static_entity| {
        static_entity != declaring && catalog.is_assignable_from(static_entity, declaring)
    });
    if !needs_guard {
        return Ok(member(instance, property.name.clone(), property.ty.clone()));
    }

    let derived = TypeRef::entity(declaring);
    let nullable = property.ty.make_nullable();
    let downcast = convert(instance.clone(), derived.clone());
    let mut read = member(&downcast, property.name.clone(), property.ty.clone());
    if !property.ty.is_nullable() {
        read = convert(read, nullable.clone());
    }
    Ok(conditional(
        type_is(instance.clone(), derived),
        read,
        null(nullable),
    ))
}

pub fn read_key(
    catalog: &EntityCatalog,
    instance: &ExprRef,
    properties: &[Property],
) -> NavigationRewriteResult<Vec<ExprRef>> {
    properties
        .iter()
        .map(|property| read_property(catalog, instance, property))
        .collect()
}

/// Bring one outer/inner key part to a shared type by converting the
/// non-nullable side to nullable.
fn coerce_pair(
    navigation: &Navigation,
    position: usize,
    outer: ExprRef,
    inner: ExprRef,
) -> NavigationRewriteResult<(ExprRef, ExprRef)> {
    let outer_ty = outer.ty();
    let inner_ty = inner.ty();
    if outer_ty == inner_ty {
        return Ok((outer, inner));
    }
    if outer_ty.unwrap_nullable() != inner_ty.unwrap_nullable() {
        error!(
            "Key part {} of navigation {} cannot be compared: {} vs {}",
            position, navigation, outer_ty, inner_ty
        );
        return Err(NavigationRewriteError::KeyTypeMismatch {
            navigation: navigation.to_string(),
            position,
            outer: outer_ty.to_string(),
            inner: inner_ty.to_string(),
        });
    }
    if outer_ty.is_nullable() {
        Ok((outer, convert(inner, inner_ty.make_nullable())))
    } else {
        Ok((convert(outer, outer_ty.make_nullable()), inner))
    }
}

/// `outerKey == innerKey` for `navigation`, reading the principal key off
/// `outer` and the foreign key off `inner`.
pub fn key_equality(
    catalog: &EntityCatalog,
    navigation: &Navigation,
    outer: &ExprRef,
    inner: &ExprRef,
) -> NavigationRewriteResult<ExprRef> {
    let foreign_key = &navigation.foreign_key;
    let outer_parts = read_key(catalog, outer, &foreign_key.principal_key)?;
    let inner_parts = read_key(catalog, inner, &foreign_key.properties)?;

    if outer_parts.is_empty() || outer_parts.len() != inner_parts.len() {
        error!(
            "Navigation {} has {} principal key and {} foreign key properties",
            navigation,
            outer_parts.len(),
            inner_parts.len()
        );
        return Err(NavigationRewriteError::KeyArity {
            navigation: navigation.to_string(),
            principal: outer_parts.len(),
            dependent: inner_parts.len(),
        });
    }

    let mut outer_key = Vec::with_capacity(outer_parts.len());
    let mut inner_key = Vec::with_capacity(inner_parts.len());
    for (position, (o, i)) in outer_parts.into_iter().zip(inner_parts).enumerate() {
        let (o, i) = coerce_pair(navigation, position + 1, o, i)?;
        outer_key.push(o);
        inner_key.push(i);
    }

    let (outer_key, inner_key) = if outer_key.len() == 1 {
        (outer_key.swap_remove(0), inner_key.swap_remove(0))
    } else {
        (tuple(outer_key), tuple(inner_key))
    };
    Ok(equal(outer_key, inner_key))
}
