//! Node constructors for LogicalExpr
//!
//! Small helpers that build correctly-typed nodes and hand them back as
//! [`ExprRef`]. Rewrite passes use these instead of spelling out struct
//! literals so the synthesised trees stay uniform.
//!
//! # Example
//! ```ignore
//! use crate::query_planner::logical_expr::combinators::{and_also, equal, member, not_null};
//!
//! let c = parameter("c", TypeRef::entity("Customer"));
//! let pred = and_also(not_null(&c), equal(member(&c, "Id", TypeRef::int()), other_key));
//! ```

use std::sync::Arc;

use super::{
    BinaryExpr, BinaryOperator, Conditional, Constant, ConvertExpr, ExprRef, LambdaExpr, Literal,
    LogicalExpr, MemberAccess, NewExpr, NewMember, ParameterExpr, TypeIsExpr,
};
use crate::query_planner::types::TypeRef;

pub fn parameter(name: impl Into<String>, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::Parameter(ParameterExpr::new(name, ty)))
}

pub fn member(target: &ExprRef, member: impl Into<String>, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::MemberAccess(MemberAccess {
        target: Arc::clone(target),
        member: member.into(),
        ty,
    }))
}

/// Typed `null` constant.
pub fn null(ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::Constant(Constant {
        value: Literal::Null,
        ty,
    }))
}

pub fn constant(value: Literal, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::Constant(Constant { value, ty }))
}

pub fn binary(operator: BinaryOperator, left: ExprRef, right: ExprRef) -> ExprRef {
    Arc::new(LogicalExpr::Binary(BinaryExpr {
        operator,
        left,
        right,
    }))
}

/// Create an equality comparison: lhs == rhs
pub fn equal(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
    binary(BinaryOperator::Equal, lhs, rhs)
}

pub fn not_equal(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
    binary(BinaryOperator::NotEqual, lhs, rhs)
}

/// Short-circuiting conjunction; `rhs` only runs when `lhs` holds.
pub fn and_also(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
    binary(BinaryOperator::AndAlso, lhs, rhs)
}

/// `expr != null`, typed against the operand.
pub fn not_null(expr: &ExprRef) -> ExprRef {
    not_equal(Arc::clone(expr), null(expr.ty()))
}

pub fn not(expr: ExprRef) -> ExprRef {
    Arc::new(LogicalExpr::Not(expr))
}

pub fn convert(operand: ExprRef, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::Convert(ConvertExpr { operand, ty }))
}

pub fn type_is(operand: ExprRef, ty: TypeRef) -> ExprRef {
    Arc::new(LogicalExpr::TypeIs(TypeIsExpr { operand, ty }))
}

pub fn conditional(test: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
    Arc::new(LogicalExpr::Conditional(Conditional {
        test,
        if_true,
        if_false,
    }))
}

pub fn lambda(params: Vec<ParameterExpr>, body: ExprRef) -> ExprRef {
    Arc::new(LogicalExpr::Lambda(LambdaExpr { params, body }))
}

/// Anonymous tuple with positional member names `Item1..ItemN`.
pub fn tuple(values: Vec<ExprRef>) -> ExprRef {
    let members = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| NewMember {
            name: format!("Item{}", i + 1),
            value,
        })
        .collect();
    Arc::new(LogicalExpr::New(NewExpr { members }))
}

/// Flatten nested `&&` chains into their operands.
///
/// `(a && (b && c))` → `[a, b, c]`
pub fn flatten_and_also(expr: &ExprRef) -> Vec<ExprRef> {
    match expr.as_ref() {
        LogicalExpr::Binary(bin) if bin.operator == BinaryOperator::AndAlso => {
            let mut operands = flatten_and_also(&bin.left);
            operands.extend(flatten_and_also(&bin.right));
            operands
        }
        _ => vec![Arc::clone(expr)],
    }
}
