use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type of an expression node.
///
/// Scalars carry their own nullability so key comparisons can be coerced to a
/// common type. Entities, sequences and tuples are reference-like and always
/// admit `null`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A primitive value type such as `int`, `string` or `Guid`.
    Scalar { name: String, nullable: bool },
    /// A mapped entity type, by catalog name.
    Entity(String),
    /// An in-memory sequence (list, collection, enumerable).
    Sequence(Box<TypeRef>),
    /// A translatable query over elements of the inner type.
    Queryable(Box<TypeRef>),
    /// Order-preserving anonymous tuple.
    Tuple(Vec<TypeRef>),
    /// Lambda signature: parameter types and return type.
    Function {
        params: Vec<TypeRef>,
        ret: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn scalar(name: &str) -> Self {
        TypeRef::Scalar {
            name: name.to_string(),
            nullable: false,
        }
    }

    pub fn nullable_scalar(name: &str) -> Self {
        TypeRef::Scalar {
            name: name.to_string(),
            nullable: true,
        }
    }

    pub fn boolean() -> Self {
        TypeRef::scalar("bool")
    }

    pub fn int() -> Self {
        TypeRef::scalar("int")
    }

    pub fn entity(name: &str) -> Self {
        TypeRef::Entity(name.to_string())
    }

    pub fn sequence_of(element: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(element))
    }

    pub fn queryable_of(element: TypeRef) -> Self {
        TypeRef::Queryable(Box::new(element))
    }

    /// Parse the compact textual form used in catalog configs: `int`, `int?`, `string`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, nullable) = match text.strip_suffix('?') {
            Some(stripped) => (stripped.trim(), true),
            None => (text, false),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        Some(TypeRef::Scalar {
            name: name.to_string(),
            nullable,
        })
    }

    /// Whether a `null` constant can inhabit this type.
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeRef::Scalar { nullable, .. } => *nullable,
            TypeRef::Entity(_)
            | TypeRef::Sequence(_)
            | TypeRef::Queryable(_)
            | TypeRef::Tuple(_)
            | TypeRef::Function { .. } => true,
        }
    }

    /// Nullable scalars are the only types that can be made nullable; all others already are.
    pub fn make_nullable(&self) -> Self {
        match self {
            TypeRef::Scalar { name, .. } => TypeRef::Scalar {
                name: name.clone(),
                nullable: true,
            },
            other => other.clone(),
        }
    }

    pub fn unwrap_nullable(&self) -> Self {
        match self {
            TypeRef::Scalar { name, .. } => TypeRef::Scalar {
                name: name.clone(),
                nullable: false,
            },
            other => other.clone(),
        }
    }

    /// Element type of a sequence or queryable, `None` for anything else.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Sequence(element) | TypeRef::Queryable(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_queryable(&self) -> bool {
        matches!(self, TypeRef::Queryable(_))
    }

    pub fn entity_name(&self) -> Option<&str> {
        match self {
            TypeRef::Entity(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar { name, nullable } => {
                write!(f, "{}", name)?;
                if *nullable {
                    f.write_str("?")?;
                }
                Ok(())
            }
            TypeRef::Entity(name) => f.write_str(name),
            TypeRef::Sequence(element) => write!(f, "Sequence<{}>", element),
            TypeRef::Queryable(element) => write!(f, "Queryable<{}>", element),
            TypeRef::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            TypeRef::Function { params, ret } => {
                f.write_str("Func<")?;
                for param in params {
                    write!(f, "{}, ", param)?;
                }
                write!(f, "{}>", ret)
            }
        }
    }
}
