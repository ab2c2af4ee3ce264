use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::errors::EntityCatalogError;
use crate::query_planner::types::TypeRef;

/// Scalar property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub ty: TypeRef,
    /// Entity type that declares the property. For inherited properties this
    /// is the base type, not the entity the property was looked up on.
    pub declaring_entity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub base_type: Option<String>,
    /// Properties declared directly on this type (inherited ones are not repeated)
    pub properties: Vec<Property>,
    /// Ordered primary key property names; empty on derived types, which
    /// inherit the root's key
    pub primary_key: Vec<String>,
}

impl EntityType {
    pub fn declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Foreign key between a dependent and a principal entity type.
///
/// `properties[i]` on the dependent correlates to `principal_key[i]` on the
/// principal; both lists are ordered and have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Dependent entity type (the one that declares the foreign key columns)
    pub declaring_entity: String,
    pub properties: Vec<Property>,
    pub principal_entity: String,
    pub principal_key: Vec<Property>,
}

impl ForeignKey {
    pub fn is_composite(&self) -> bool {
        self.properties.len() > 1
    }
}

/// Relationship property on an entity type, backed by a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    pub name: String,
    pub declaring_entity: String,
    pub target_entity: String,
    pub is_collection: bool,
    #[serde(with = "crate::utils::serde_arc")]
    pub foreign_key: Arc<ForeignKey>,
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_entity, self.name)
    }
}

/// Immutable entity mapping model.
///
/// Built once from configuration and then shared read-only (it is `Send + Sync`)
/// between any number of concurrent rewrite passes.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    pub name: Option<String>,
    entities: HashMap<String, EntityType>,
    navigations: Vec<Arc<Navigation>>,
}

impl EntityCatalog {
    pub fn from_parts(
        name: Option<String>,
        entities: Vec<EntityType>,
        navigations: Vec<Arc<Navigation>>,
    ) -> Self {
        let entities = entities
            .into_iter()
            .map(|entity| (entity.name.clone(), entity))
            .collect();
        EntityCatalog {
            name,
            entities,
            navigations,
        }
    }

    pub fn entity(&self, name: &str) -> Result<&EntityType, EntityCatalogError> {
        self.entities
            .get(name)
            .ok_or_else(|| EntityCatalogError::Entity {
                entity: name.to_string(),
            })
    }

    pub fn get_entity(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn navigations(&self) -> &[Arc<Navigation>] {
        &self.navigations
    }

    /// The entity itself followed by its base types, most derived first.
    pub fn base_chain(&self, name: &str) -> Vec<&EntityType> {
        let mut chain = Vec::new();
        let mut current = self.entities.get(name);
        while let Some(entity) = current {
            // Validated catalogs are acyclic; the bound keeps a hand-built one from spinning.
            if chain.len() > self.entities.len() {
                log::warn!("Inheritance chain of '{}' does not terminate", name);
                break;
            }
            chain.push(entity);
            current = entity
                .base_type
                .as_deref()
                .and_then(|base| self.entities.get(base));
        }
        chain
    }

    /// Look up a property on `entity` or any of its base types.
    pub fn find_property(&self, entity: &str, property: &str) -> Option<&Property> {
        self.base_chain(entity)
            .into_iter()
            .find_map(|e| e.declared_property(property))
    }

    /// Look up a navigation on `entity` or any of its base types.
    pub fn find_navigation(&self, entity: &str, name: &str) -> Option<&Arc<Navigation>> {
        self.base_chain(entity).into_iter().find_map(|e| {
            self.navigations
                .iter()
                .find(|nav| nav.declaring_entity == e.name && nav.name == name)
        })
    }

    /// Like [`Self::find_navigation`], falling back to navigations declared on
    /// types derived from `entity` (first derived type by name wins).
    pub fn find_navigation_in_hierarchy(
        &self,
        entity: &str,
        name: &str,
    ) -> Option<&Arc<Navigation>> {
        self.find_navigation(entity, name).or_else(|| {
            self.entity_names()
                .into_iter()
                .filter(|candidate| {
                    *candidate != entity && self.is_assignable_from(entity, candidate)
                })
                .find_map(|derived| {
                    self.navigations
                        .iter()
                        .find(|nav| nav.declaring_entity == derived && nav.name == name)
                })
        })
    }

    /// Ordered primary key of `entity`, inherited from the root of its hierarchy.
    pub fn primary_key(&self, entity: &str) -> Result<Vec<Property>, EntityCatalogError> {
        let chain = self.base_chain(entity);
        let owner = chain
            .iter()
            .find(|e| !e.primary_key.is_empty())
            .ok_or_else(|| EntityCatalogError::MissingKey {
                entity: entity.to_string(),
            })?;
        owner
            .primary_key
            .iter()
            .map(|name| {
                self.find_property(&owner.name, name)
                    .cloned()
                    .ok_or_else(|| EntityCatalogError::Property {
                        entity: owner.name.clone(),
                        property: name.clone(),
                    })
            })
            .collect()
    }

    /// True when a value of entity type `derived` can be used where `base` is expected.
    pub fn is_assignable_from(&self, base: &str, derived: &str) -> bool {
        self.base_chain(derived).iter().any(|e| e.name == base)
    }
}
