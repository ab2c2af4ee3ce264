//! Binding member-access chains to catalog navigations.
//!
//! `c.Orders`, `o.Customer.Orders` or `ti.Outer.Orders` are flattened into a
//! root parameter plus member segments, anchored at an entity type and then
//! walked segment by segment through the catalog's navigations. Anything that
//! does not walk cleanly is simply not a navigation access.

use std::sync::Arc;

use log::trace;

use super::alias_mapping::{AliasMapping, FoundNavigationPaths, NavigationPath, NavigationRoot};
use crate::entity_catalog::{EntityCatalog, Navigation};
use crate::query_planner::logical_expr::{LogicalExpr, ParameterExpr};

/// A member-access chain resolved to the navigations it traverses.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationBinding {
    /// Parameter the chain starts from in the expression.
    pub root: ParameterExpr,
    pub path: NavigationPath,
}

impl NavigationBinding {
    pub fn last_navigation(&self) -> Option<&Arc<Navigation>> {
        self.path.last()
    }
}

pub trait NavigationBinder {
    /// Resolve `expr` (a member access and its whole preceding chain).
    /// `None` means "not a navigation access", never an error.
    fn bind(&self, expr: &LogicalExpr) -> Option<NavigationBinding>;
}

/// Entity type a chain is anchored at, and how much of the chain the anchor covers.
struct Anchor {
    root: NavigationRoot,
    entity: String,
    consumed: usize,
    navigations: Vec<Arc<Navigation>>,
}

/// Binder driven by the alias tables of the surrounding pipeline.
pub struct AliasTableBinder<'a> {
    catalog: &'a EntityCatalog,
    root: ParameterExpr,
    aliases: &'a AliasMapping,
    found_paths: &'a FoundNavigationPaths,
}

impl<'a> AliasTableBinder<'a> {
    pub fn new(
        catalog: &'a EntityCatalog,
        root: ParameterExpr,
        aliases: &'a AliasMapping,
        found_paths: &'a FoundNavigationPaths,
    ) -> Self {
        Self {
            catalog,
            root,
            aliases,
            found_paths,
        }
    }

    fn anchor_pass_root(&self, segments: Vec<String>) -> Option<(Anchor, Vec<String>)> {
        let logical = match self.aliases.remap_transparent_identifier(&segments) {
            Some(remapped) => {
                trace!(
                    "AliasTableBinder: remapped accessor path {:?} to {:?}",
                    segments,
                    remapped
                );
                remapped
            }
            None => segments,
        };

        let by_entity = self.aliases.entity_for(&logical);
        let by_found_path = self.found_paths.longest_prefix(&self.root.name, &logical);

        let anchor = match (by_entity, by_found_path) {
            (Some((entity_len, _)), Some((path_len, path))) if path_len > entity_len => {
                Self::anchor_at_found_path(path_len, path)?
            }
            (Some((len, entity)), _) => Anchor {
                root: NavigationRoot::Alias(logical[..len].to_vec()),
                entity: entity.to_string(),
                consumed: len,
                navigations: Vec::new(),
            },
            (None, Some((len, path))) => Self::anchor_at_found_path(len, path)?,
            (None, None) => self.anchor_at_parameter(&self.root)?,
        };
        Some((anchor, logical))
    }

    fn anchor_at_found_path(len: usize, path: &NavigationPath) -> Option<Anchor> {
        let last = path.last()?;
        Some(Anchor {
            root: path.root.clone(),
            entity: last.target_entity.clone(),
            consumed: len,
            navigations: path.navigations.clone(),
        })
    }

    fn anchor_at_parameter(&self, param: &ParameterExpr) -> Option<Anchor> {
        let entity = param.ty.entity_name()?;
        self.catalog.get_entity(entity)?;
        Some(Anchor {
            root: NavigationRoot::Parameter(param.name.clone()),
            entity: entity.to_string(),
            consumed: 0,
            navigations: Vec::new(),
        })
    }
}

/// Split a member chain into its root parameter and member names, root first.
fn flatten_member_chain(expr: &LogicalExpr) -> Option<(&ParameterExpr, Vec<String>)> {
    let mut segments = Vec::new();
    let mut current = expr;
    loop {
        match current {
            LogicalExpr::MemberAccess(access) => {
                segments.push(access.member.clone());
                current = access.target.as_ref();
            }
            LogicalExpr::Parameter(param) => {
                segments.reverse();
                return Some((param, segments));
            }
            _ => return None,
        }
    }
}

impl NavigationBinder for AliasTableBinder<'_> {
    fn bind(&self, expr: &LogicalExpr) -> Option<NavigationBinding> {
        let (param, segments) = flatten_member_chain(expr)?;
        if segments.is_empty() {
            return None;
        }

        let (anchor, segments) = if param.name == self.root.name {
            self.anchor_pass_root(segments)?
        } else {
            (self.anchor_at_parameter(param)?, segments)
        };

        let mut entity = anchor.entity;
        let mut navigations = anchor.navigations;
        let mut walked = 0;
        let mut through_collection = false;
        for segment in &segments[anchor.consumed..] {
            if through_collection {
                trace!(
                    "AliasTableBinder: `{}` follows a collection navigation, not binding",
                    segment
                );
                return None;
            }
            let Some(navigation) = self.catalog.find_navigation_in_hierarchy(&entity, segment)
            else {
                trace!(
                    "AliasTableBinder: `{}` is not a navigation on `{}`",
                    segment,
                    entity
                );
                return None;
            };
            through_collection = navigation.is_collection;
            entity = navigation.target_entity.clone();
            navigations.push(Arc::clone(navigation));
            walked += 1;
        }

        if walked == 0 {
            return None;
        }

        let path = NavigationPath::new(anchor.root, navigations);
        trace!("AliasTableBinder: bound `{}` to {}", expr, path);
        Some(NavigationBinding {
            root: param.clone(),
            path,
        })
    }
}
