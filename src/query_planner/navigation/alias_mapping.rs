//! Alias tables handed to a navigation rewrite pass by the query-building
//! pipeline.
//!
//! Flattened query shapes put earlier range variables behind synthetic
//! composite records ("transparent identifiers"), so the member path that
//! reaches an entity in the expression (`ti.Outer.Orders`) no longer reads
//! like the path the pipeline originally tracked (`c.Orders`). These tables
//! translate between the two. All of them are ordered association lists:
//! lookups pick the longest matching prefix and ties go to the earlier entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::errors::{NavigationRewriteError, NavigationRewriteResult};
use crate::entity_catalog::{EntityCatalog, Navigation};

/// Where a navigation path starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationRoot {
    /// A lambda or query parameter, by name.
    Parameter(String),
    /// An original (pre-flattening) path below the pass root parameter.
    Alias(Vec<String>),
}

/// A root anchor plus the navigations traversed from it, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPath {
    pub root: NavigationRoot,
    pub navigations: Vec<Arc<Navigation>>,
}

impl NavigationPath {
    pub fn new(root: NavigationRoot, navigations: Vec<Arc<Navigation>>) -> Self {
        Self { root, navigations }
    }

    pub fn last(&self) -> Option<&Arc<Navigation>> {
        self.navigations.last()
    }

    /// Alias segments (if any) followed by the navigation names.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = match &self.root {
            NavigationRoot::Parameter(_) => Vec::new(),
            NavigationRoot::Alias(path) => path.clone(),
        };
        segments.extend(self.navigations.iter().map(|nav| nav.name.clone()));
        segments
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = match &self.root {
            NavigationRoot::Parameter(name) => vec![name.clone()],
            NavigationRoot::Alias(path) => path.clone(),
        };
        parts.extend(self.navigations.iter().map(|nav| nav.name.clone()));
        f.write_str(&parts.join("."))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMapping {
    /// `(original path, accessor path)`: an accessor path found in the
    /// expression is read back as the original path it stands for.
    #[serde(default)]
    pub transparent_identifier_accessor_mapping: Vec<(Vec<String>, Vec<String>)>,

    /// `(original path, entity type)`: the entity reached by an original path.
    #[serde(default)]
    pub entity_type_accessor_mapping: Vec<(Vec<String>, String)>,
}

fn is_prefix(prefix: &[String], segments: &[String]) -> bool {
    prefix.len() <= segments.len() && segments[..prefix.len()] == *prefix
}

impl AliasMapping {
    /// Rewrite the longest matching accessor prefix of `segments` back to its
    /// original path. `None` when no accessor path matches.
    pub fn remap_transparent_identifier(&self, segments: &[String]) -> Option<Vec<String>> {
        let mut best: Option<&(Vec<String>, Vec<String>)> = None;
        for entry in &self.transparent_identifier_accessor_mapping {
            let (_, accessor) = entry;
            if is_prefix(accessor, segments)
                && best.is_none_or(|(_, current)| accessor.len() > current.len())
            {
                best = Some(entry);
            }
        }
        best.map(|(original, accessor)| {
            let mut remapped = original.clone();
            remapped.extend_from_slice(&segments[accessor.len()..]);
            remapped
        })
    }

    /// Entity type reached by the longest mapped prefix of `segments`, with
    /// that prefix's length.
    pub fn entity_for(&self, segments: &[String]) -> Option<(usize, &str)> {
        let mut best: Option<(usize, &str)> = None;
        for (path, entity) in &self.entity_type_accessor_mapping {
            if is_prefix(path, segments) && best.is_none_or(|(len, _)| path.len() > len) {
                best = Some((path.len(), entity.as_str()));
            }
        }
        best
    }
}

/// Navigation paths the surrounding pipeline already tracks. Read-only for a pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoundNavigationPaths {
    paths: Vec<NavigationPath>,
}

impl FoundNavigationPaths {
    pub fn new(paths: Vec<NavigationPath>) -> Self {
        Self { paths }
    }

    /// Longest found path that prefixes `segments` below `root_param`, with
    /// the length of the prefix it covers.
    pub fn longest_prefix(
        &self,
        root_param: &str,
        segments: &[String],
    ) -> Option<(usize, &NavigationPath)> {
        let mut best: Option<(usize, &NavigationPath)> = None;
        for path in &self.paths {
            if path.navigations.is_empty() {
                continue;
            }
            if let NavigationRoot::Parameter(name) = &path.root {
                if name != root_param {
                    continue;
                }
            }
            let path_segments = path.path_segments();
            if is_prefix(&path_segments, segments)
                && best.is_none_or(|(len, _)| path_segments.len() > len)
            {
                best = Some((path_segments.len(), path));
            }
        }
        best
    }
}

/// Serialized form of a found navigation path; navigations are named
/// `Entity.Navigation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationPathSpec {
    pub root: NavigationRoot,
    pub navigations: Vec<String>,
}

/// Alias tables as loaded from JSON, before navigations are resolved
/// against a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasTables {
    #[serde(flatten)]
    pub mapping: AliasMapping,
    #[serde(default)]
    pub found_navigation_paths: Vec<NavigationPathSpec>,
}

impl AliasTables {
    pub fn resolve(
        self,
        catalog: &EntityCatalog,
    ) -> NavigationRewriteResult<(AliasMapping, FoundNavigationPaths)> {
        let mut paths = Vec::with_capacity(self.found_navigation_paths.len());
        for spec in self.found_navigation_paths {
            let navigations = spec
                .navigations
                .iter()
                .map(|qualified| {
                    qualified
                        .split_once('.')
                        .and_then(|(entity, name)| catalog.find_navigation(entity, name))
                        .cloned()
                        .ok_or_else(|| NavigationRewriteError::UnknownNavigation {
                            navigation: qualified.clone(),
                        })
                })
                .collect::<NavigationRewriteResult<Vec<_>>>()?;
            paths.push(NavigationPath::new(spec.root, navigations));
        }
        Ok((self.mapping, FoundNavigationPaths::new(paths)))
    }
}
