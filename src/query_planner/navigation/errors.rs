use thiserror::Error;

pub type NavigationRewriteResult<T> = Result<T, NavigationRewriteError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NavigationRewriteError {
    /// Outer and inner key parts differ by more than nullability. Correct
    /// catalogs never produce this.
    #[error(
        "Internal error: key part {position} of navigation `{navigation}` has type `{outer}` on the principal side but `{inner}` on the dependent side"
    )]
    KeyTypeMismatch {
        navigation: String,
        position: usize,
        outer: String,
        inner: String,
    },

    #[error(
        "Internal error: navigation `{navigation}` has {principal} principal key properties but {dependent} foreign key properties"
    )]
    KeyArity {
        navigation: String,
        principal: usize,
        dependent: usize,
    },

    #[error(
        "Member `{member}` of collection navigation `{target}` is not a supported size accessor"
    )]
    UnsupportedSizeAccessor { member: String, target: String },

    #[error("Entity type `{entity}` not found in catalog")]
    MissingEntity { entity: String },

    #[error("Property `{property}` not found on entity type `{entity}`")]
    MissingProperty { entity: String, property: String },

    #[error("Navigation `{navigation}` not found in catalog")]
    UnknownNavigation { navigation: String },

    #[error("Expression nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: u32 },

    #[error("Failed to start the rewrite worker thread: {reason}")]
    WorkerSpawn { reason: String },

    #[error("Invalid {node} node: {reason}")]
    InvalidNode { node: String, reason: String },
}

impl NavigationRewriteError {
    /// Errors caused by an inconsistent mapping model rather than by the input expression.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            NavigationRewriteError::KeyTypeMismatch { .. } | NavigationRewriteError::KeyArity { .. }
        )
    }
}
