/// Entity catalog configuration.
///
/// Catalogs are defined in YAML with the following structure:
///
/// ```yaml
/// name: shop                    # Catalog name
/// entities:
///   - name: Customer
///     key: Id                   # Single or composite ([A, B]) key
///     properties:
///       Id: int
///       Name: string
///   - name: VipCustomer
///     base: Customer            # Inherits key and properties
///     properties:
///       Tier: int
///   - name: Order
///     key: Id
///     properties:
///       Id: int
///       CustomerId: int?        # Trailing `?` marks a nullable scalar
/// relationships:
///   - principal: Customer
///     dependent: Order
///     foreign_key: CustomerId   # Ordered to match the principal key
///     principal_navigation: Orders
///     dependent_navigation: Customer
/// ```
///
/// # Usage
///
/// ```ignore
/// let config = EntityCatalogConfig::from_yaml_file("shop.yaml")?;
/// let catalog = config.to_catalog()?;
/// ```
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::entity_schema::{EntityCatalog, EntityType, ForeignKey, Navigation, Property};
use super::errors::EntityCatalogError;
use crate::query_planner::types::TypeRef;

/// Identifier type supporting both single and composite keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Identifier {
    /// Single property key
    Single(String),
    /// Composite key (ordered properties)
    Composite(Vec<String>),
}

impl Identifier {
    /// Get all properties in the identifier, in order
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Identifier::Single(col) => vec![col.as_str()],
            Identifier::Composite(cols) => cols.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Check if this is a composite identifier
    pub fn is_composite(&self) -> bool {
        matches!(self, Identifier::Composite(cols) if cols.len() > 1)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Single(s)
    }
}

impl From<Vec<String>> for Identifier {
    fn from(v: Vec<String>) -> Self {
        Identifier::Composite(v)
    }
}

/// Configuration for an entity catalog loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalogConfig {
    /// Optional catalog name
    #[serde(default)]
    pub name: Option<String>,
    pub entities: Vec<EntityDefinition>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
}

/// Entity type definition in catalog config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    /// Base entity type for mapped hierarchies
    #[serde(default)]
    pub base: Option<String>,
    /// Primary key; required on root types, forbidden on derived types
    #[serde(default)]
    pub key: Option<Identifier>,
    /// Property name → type (`int`, `int?`, `string`, ...)
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Relationship definition in catalog config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    pub principal: String,
    pub dependent: String,
    /// Foreign key properties on the dependent, in principal-key order
    pub foreign_key: Identifier,
    /// Optional: principal key properties; defaults to the principal's primary key
    #[serde(default)]
    pub principal_key: Option<Identifier>,
    /// Optional: navigation on the principal pointing at dependents
    #[serde(default)]
    pub principal_navigation: Option<String>,
    /// Optional: navigation on the dependent pointing at its principal
    #[serde(default)]
    pub dependent_navigation: Option<String>,
    /// One-to-one: the principal navigation is a reference, not a collection
    #[serde(default)]
    pub unique: bool,
}

impl EntityCatalogConfig {
    /// Load catalog configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, EntityCatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| EntityCatalogError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse catalog configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EntityCatalogError> {
        serde_yaml::from_str(yaml).map_err(|e| EntityCatalogError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Structural validation: names, hierarchy, keys and property types.
    ///
    /// Relationship key resolution is checked by [`Self::to_catalog`], which
    /// needs the inheritance-aware lookups of a built catalog.
    pub fn validate(&self) -> Result<(), EntityCatalogError> {
        if self.entities.is_empty() {
            return Err(EntityCatalogError::InvalidConfig {
                message: "Catalog must contain at least one entity definition".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(EntityCatalogError::DuplicateEntity {
                    entity: entity.name.clone(),
                });
            }
        }

        let by_name: HashMap<&str, &EntityDefinition> = self
            .entities
            .iter()
            .map(|e| (e.name.as_str(), e))
            .collect();

        for entity in &self.entities {
            for (property, ty) in &entity.properties {
                if TypeRef::parse(ty).is_none() {
                    return Err(EntityCatalogError::InvalidPropertyType {
                        entity: entity.name.clone(),
                        property: property.clone(),
                        ty: ty.clone(),
                    });
                }
            }

            match (&entity.base, &entity.key) {
                (Some(base), _) if !by_name.contains_key(base.as_str()) => {
                    return Err(EntityCatalogError::UnknownBaseType {
                        entity: entity.name.clone(),
                        base: base.clone(),
                    });
                }
                (Some(_), Some(_)) => {
                    return Err(EntityCatalogError::InvalidConfig {
                        message: format!(
                            "Derived entity type '{}' cannot redefine the key of its hierarchy",
                            entity.name
                        ),
                    });
                }
                (None, None) => {
                    return Err(EntityCatalogError::MissingKey {
                        entity: entity.name.clone(),
                    });
                }
                _ => {}
            }

            // Walk up the hierarchy; revisiting a type means a cycle.
            let mut visited = HashSet::new();
            let mut current = Some(entity);
            while let Some(e) = current {
                if !visited.insert(e.name.as_str()) {
                    return Err(EntityCatalogError::InheritanceCycle {
                        entity: entity.name.clone(),
                    });
                }
                current = e.base.as_deref().and_then(|b| by_name.get(b).copied());
            }
        }

        for rel in &self.relationships {
            for side in [&rel.principal, &rel.dependent] {
                if !by_name.contains_key(side.as_str()) {
                    return Err(EntityCatalogError::entity_error_with_context(
                        side.clone(),
                        format!(
                            "While resolving relationship {} -> {}",
                            rel.principal, rel.dependent
                        ),
                    ));
                }
            }
            if rel.principal_navigation.is_none() && rel.dependent_navigation.is_none() {
                log::warn!(
                    "Relationship {} -> {} declares no navigations and will not be traversable",
                    rel.principal,
                    rel.dependent
                );
            }
        }

        Ok(())
    }

    /// Build the immutable [`EntityCatalog`].
    pub fn to_catalog(&self) -> Result<EntityCatalog, EntityCatalogError> {
        self.validate()?;

        let mut entities = Vec::with_capacity(self.entities.len());
        for def in &self.entities {
            let mut properties: Vec<Property> = def
                .properties
                .iter()
                .map(|(name, ty)| {
                    TypeRef::parse(ty)
                        .map(|ty| Property {
                            name: name.clone(),
                            ty,
                            declaring_entity: def.name.clone(),
                        })
                        .ok_or_else(|| EntityCatalogError::InvalidPropertyType {
                            entity: def.name.clone(),
                            property: name.clone(),
                            ty: ty.clone(),
                        })
                })
                .collect::<Result<_, _>>()?;
            properties.sort_by(|a, b| a.name.cmp(&b.name));

            let primary_key: Vec<String> = def
                .key
                .as_ref()
                .map(|key| key.columns().into_iter().map(String::from).collect())
                .unwrap_or_default();

            entities.push(EntityType {
                name: def.name.clone(),
                base_type: def.base.clone(),
                properties,
                primary_key,
            });
        }

        // Keys and foreign keys resolve through inherited properties, so resolve
        // them against a catalog that already knows the hierarchy.
        let skeleton = EntityCatalog::from_parts(self.name.clone(), entities.clone(), vec![]);
        for entity in &entities {
            if entity.base_type.is_none() {
                skeleton.primary_key(&entity.name)?;
            }
        }

        let mut navigations: Vec<Arc<Navigation>> = Vec::new();
        let mut nav_names: HashSet<(String, String)> = HashSet::new();
        for rel in &self.relationships {
            let foreign_key = Arc::new(resolve_foreign_key(&skeleton, rel)?);

            let mut add = |nav: Navigation| -> Result<(), EntityCatalogError> {
                if !nav_names.insert((nav.declaring_entity.clone(), nav.name.clone())) {
                    return Err(EntityCatalogError::DuplicateNavigation {
                        entity: nav.declaring_entity,
                        navigation: nav.name,
                    });
                }
                log::debug!(
                    "Registered navigation {} -> {} (collection={})",
                    nav,
                    nav.target_entity,
                    nav.is_collection
                );
                navigations.push(Arc::new(nav));
                Ok(())
            };

            if let Some(name) = &rel.principal_navigation {
                add(Navigation {
                    name: name.clone(),
                    declaring_entity: rel.principal.clone(),
                    target_entity: rel.dependent.clone(),
                    is_collection: !rel.unique,
                    foreign_key: Arc::clone(&foreign_key),
                })?;
            }
            if let Some(name) = &rel.dependent_navigation {
                add(Navigation {
                    name: name.clone(),
                    declaring_entity: rel.dependent.clone(),
                    target_entity: rel.principal.clone(),
                    is_collection: false,
                    foreign_key: Arc::clone(&foreign_key),
                })?;
            }
        }

        Ok(EntityCatalog::from_parts(
            self.name.clone(),
            entities,
            navigations,
        ))
    }
}

fn resolve_foreign_key(
    catalog: &EntityCatalog,
    rel: &RelationshipDefinition,
) -> Result<ForeignKey, EntityCatalogError> {
    let context = format!(
        "While resolving relationship {} -> {}",
        rel.principal, rel.dependent
    );

    let principal_key = match &rel.principal_key {
        Some(key) => key
            .columns()
            .into_iter()
            .map(|name| {
                catalog
                    .find_property(&rel.principal, name)
                    .cloned()
                    .ok_or_else(|| {
                        EntityCatalogError::property_error_with_context(
                            rel.principal.clone(),
                            name,
                            context.clone(),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => catalog.primary_key(&rel.principal)?,
    };

    let properties = rel
        .foreign_key
        .columns()
        .into_iter()
        .map(|name| {
            catalog
                .find_property(&rel.dependent, name)
                .cloned()
                .ok_or_else(|| {
                    EntityCatalogError::property_error_with_context(
                        rel.dependent.clone(),
                        name,
                        context.clone(),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if properties.len() != principal_key.len() {
        return Err(EntityCatalogError::KeyArity {
            dependent: rel.dependent.clone(),
            principal: rel.principal.clone(),
            foreign_key: properties.len(),
            principal_key: principal_key.len(),
        });
    }

    // Foreign keys may be nullable where the principal key is not; anything
    // beyond that is a mapping error.
    for (fk, pk) in properties.iter().zip(&principal_key) {
        if fk.ty.unwrap_nullable() != pk.ty.unwrap_nullable() {
            return Err(EntityCatalogError::KeyType {
                dependent: rel.dependent.clone(),
                foreign_key: fk.name.clone(),
                foreign_key_type: fk.ty.to_string(),
                principal: rel.principal.clone(),
                principal_key: pk.name.clone(),
                principal_key_type: pk.ty.to_string(),
            });
        }
    }

    Ok(ForeignKey {
        declaring_entity: rel.dependent.clone(),
        properties,
        principal_entity: rel.principal.clone(),
        principal_key,
    })
}
