//! Query expression IR.
//!
//! A closed set of node kinds covering what query-building front ends emit:
//! member accesses, method calls (query operators), lambdas, comparisons and
//! a handful of structural nodes. Children are held as [`ExprRef`] (`Arc`) so a
//! rewrite pass can hand back an untouched subtree by pointer, and callers can
//! observe that with [`Arc::ptr_eq`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::query_planner::types::TypeRef;
use crate::utils::serde_arc;

pub mod combinators;
pub mod operators;
pub mod visitors;

mod display;

/// Shared handle to an expression node.
pub type ExprRef = Arc<LogicalExpr>;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum LogicalExpr {
    /// A typed literal, including typed `null`.
    Constant(Constant),

    /// A lambda or query parameter, e.g. the `c` in `c => c.Orders`.
    Parameter(ParameterExpr),

    /// Field or property read: `target.member`.
    MemberAccess(MemberAccess),

    /// Static operator or instance method call.
    MethodCall(MethodCall),

    Lambda(LambdaExpr),

    /// `test ? if_true : if_false`
    Conditional(Conditional),

    /// Comparison or short-circuiting logical operator.
    Binary(BinaryExpr),

    Not(#[serde(with = "serde_arc")] ExprRef),

    /// Type conversion, used for nullability coercion and down-casts.
    Convert(ConvertExpr),

    /// Runtime type test: `operand is ty`.
    TypeIs(TypeIsExpr),

    /// Order-preserving anonymous tuple construction.
    New(NewExpr),

    /// Query over every instance of the named entity type.
    EntityQuery(String),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub value: Literal,
    pub ty: TypeRef,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct ParameterExpr {
    pub name: String,
    pub ty: TypeRef,
}

impl ParameterExpr {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    #[serde(with = "serde_arc")]
    pub target: ExprRef,
    pub member: String,
    pub ty: TypeRef,
}

/// Who declares a called method. Query operators are static and take their
/// source as the first argument; `List` methods are instance calls.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum MethodOwner {
    Queryable,
    Enumerable,
    List,
    /// Eager-loading markers (`Include`, `ThenInclude`).
    EagerLoading,
    Other(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: MethodOwner,
    pub name: String,
    /// Generic arguments; empty for a non-generic method or an open definition.
    #[serde(default)]
    pub type_args: Vec<TypeRef>,
}

impl MethodRef {
    pub fn new(owner: MethodOwner, name: impl Into<String>, type_args: Vec<TypeRef>) -> Self {
        Self {
            owner,
            name: name.into(),
            type_args,
        }
    }

    pub fn is_closed_generic(&self) -> bool {
        !self.type_args.is_empty()
    }

    pub fn is(&self, owner: &MethodOwner, name: &str) -> bool {
        &self.owner == owner && self.name == name
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: MethodRef,
    /// Instance receiver; `None` for static operators.
    #[serde(default, with = "serde_arc::option")]
    pub receiver: Option<ExprRef>,
    #[serde(with = "serde_arc::vec")]
    pub args: Vec<ExprRef>,
    pub ty: TypeRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LambdaExpr {
    pub params: Vec<ParameterExpr>,
    #[serde(with = "serde_arc")]
    pub body: ExprRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Conditional {
    #[serde(with = "serde_arc")]
    pub test: ExprRef,
    #[serde(with = "serde_arc")]
    pub if_true: ExprRef,
    #[serde(with = "serde_arc")]
    pub if_false: ExprRef,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Short-circuiting `&&`: the right operand is not evaluated when the left is false.
    AndAlso,
    OrElse,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::AndAlso => "&&",
            BinaryOperator::OrElse => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    #[serde(with = "serde_arc")]
    pub left: ExprRef,
    #[serde(with = "serde_arc")]
    pub right: ExprRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ConvertExpr {
    #[serde(with = "serde_arc")]
    pub operand: ExprRef,
    pub ty: TypeRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TypeIsExpr {
    #[serde(with = "serde_arc")]
    pub operand: ExprRef,
    pub ty: TypeRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    #[serde(with = "serde_arc")]
    pub value: ExprRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NewExpr {
    pub members: Vec<NewMember>,
}

impl LogicalExpr {
    /// Static type of this node.
    pub fn ty(&self) -> TypeRef {
        match self {
            LogicalExpr::Constant(c) => c.ty.clone(),
            LogicalExpr::Parameter(p) => p.ty.clone(),
            LogicalExpr::MemberAccess(m) => m.ty.clone(),
            LogicalExpr::MethodCall(call) => call.ty.clone(),
            LogicalExpr::Lambda(lambda) => TypeRef::Function {
                params: lambda.params.iter().map(|p| p.ty.clone()).collect(),
                ret: Box::new(lambda.body.ty()),
            },
            LogicalExpr::Conditional(cond) => cond.if_true.ty(),
            LogicalExpr::Binary(_) | LogicalExpr::Not(_) | LogicalExpr::TypeIs(_) => {
                TypeRef::boolean()
            }
            LogicalExpr::Convert(conv) => conv.ty.clone(),
            LogicalExpr::New(new) => {
                TypeRef::Tuple(new.members.iter().map(|m| m.value.ty()).collect())
            }
            LogicalExpr::EntityQuery(entity) => TypeRef::queryable_of(TypeRef::entity(entity)),
        }
    }

    pub fn as_member_access(&self) -> Option<&MemberAccess> {
        match self {
            LogicalExpr::MemberAccess(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_method_call(&self) -> Option<&MethodCall> {
        match self {
            LogicalExpr::MethodCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self {
            LogicalExpr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Direct child expressions; a method call's receiver comes before its arguments.
    pub fn children(&self) -> Vec<&ExprRef> {
        match self {
            LogicalExpr::MemberAccess(access) => vec![&access.target],
            LogicalExpr::MethodCall(call) => call.receiver.iter().chain(&call.args).collect(),
            LogicalExpr::Lambda(lambda) => vec![&lambda.body],
            LogicalExpr::Conditional(cond) => vec![&cond.test, &cond.if_true, &cond.if_false],
            LogicalExpr::Binary(bin) => vec![&bin.left, &bin.right],
            LogicalExpr::Not(operand) => vec![operand],
            LogicalExpr::Convert(conv) => vec![&conv.operand],
            LogicalExpr::TypeIs(test) => vec![&test.operand],
            LogicalExpr::New(new) => new.members.iter().map(|m| &m.value).collect(),
            LogicalExpr::Constant(_) | LogicalExpr::Parameter(_) | LogicalExpr::EntityQuery(_) => {
                vec![]
            }
        }
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(
            self,
            LogicalExpr::Constant(Constant {
                value: Literal::Null,
                ..
            })
        )
    }
}
