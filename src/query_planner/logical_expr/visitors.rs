//! Expression Visitor Pattern
//!
//! Read-only traversal of LogicalExpr trees. Rewriting passes transform trees
//! themselves; this module serves the passes and tools that only need to look:
//! collecting parameter names, member paths or called operators.
//!
//! # Example
//!
//! ```ignore
//! use crate::query_planner::logical_expr::visitors::{ExpressionVisitor, walk_expression};
//!
//! struct LambdaCounter(usize);
//!
//! impl ExpressionVisitor for LambdaCounter {
//!     type Output = ();
//!
//!     fn visit_lambda(&mut self, _lambda: &LambdaExpr) {
//!         self.0 += 1;
//!     }
//! }
//! ```

use std::collections::BTreeSet;

use super::{LambdaExpr, LogicalExpr, MemberAccess, MethodCall, ParameterExpr};

/// Trait for visiting LogicalExpr nodes.
///
/// Implementors override the `visit_*` methods for the nodes they care about.
/// The defaults do nothing.
pub trait ExpressionVisitor {
    type Output: Default;

    fn visit_parameter(&mut self, _param: &ParameterExpr) -> Self::Output {
        Self::Output::default()
    }

    fn visit_member_access(&mut self, _access: &MemberAccess) -> Self::Output {
        Self::Output::default()
    }

    fn visit_method_call(&mut self, _call: &MethodCall) -> Self::Output {
        Self::Output::default()
    }

    fn visit_lambda(&mut self, _lambda: &LambdaExpr) -> Self::Output {
        Self::Output::default()
    }

    /// Called for every other node kind.
    fn visit_other(&mut self, _expr: &LogicalExpr) -> Self::Output {
        Self::Output::default()
    }
}

/// Walk an expression tree pre-order, calling visitor methods for each node.
pub fn walk_expression<V: ExpressionVisitor>(expr: &LogicalExpr, visitor: &mut V) -> V::Output {
    match expr {
        LogicalExpr::Parameter(param) => visitor.visit_parameter(param),

        LogicalExpr::MemberAccess(access) => {
            let result = visitor.visit_member_access(access);
            walk_expression(&access.target, visitor);
            result
        }

        LogicalExpr::MethodCall(call) => {
            let result = visitor.visit_method_call(call);
            if let Some(receiver) = &call.receiver {
                walk_expression(receiver, visitor);
            }
            for arg in &call.args {
                walk_expression(arg, visitor);
            }
            result
        }

        LogicalExpr::Lambda(lambda) => {
            let result = visitor.visit_lambda(lambda);
            for param in &lambda.params {
                visitor.visit_parameter(param);
            }
            walk_expression(&lambda.body, visitor);
            result
        }

        LogicalExpr::Conditional(cond) => {
            let result = visitor.visit_other(expr);
            walk_expression(&cond.test, visitor);
            walk_expression(&cond.if_true, visitor);
            walk_expression(&cond.if_false, visitor);
            result
        }

        LogicalExpr::Binary(bin) => {
            let result = visitor.visit_other(expr);
            walk_expression(&bin.left, visitor);
            walk_expression(&bin.right, visitor);
            result
        }

        LogicalExpr::Not(operand) => {
            let result = visitor.visit_other(expr);
            walk_expression(operand, visitor);
            result
        }

        LogicalExpr::Convert(conv) => {
            let result = visitor.visit_other(expr);
            walk_expression(&conv.operand, visitor);
            result
        }

        LogicalExpr::TypeIs(test) => {
            let result = visitor.visit_other(expr);
            walk_expression(&test.operand, visitor);
            result
        }

        LogicalExpr::New(new) => {
            let result = visitor.visit_other(expr);
            for m in &new.members {
                walk_expression(&m.value, visitor);
            }
            result
        }

        // Leaf nodes
        LogicalExpr::Constant(_) | LogicalExpr::EntityQuery(_) => visitor.visit_other(expr),
    }
}

// =============================================================================
// Common Visitor Implementations
// =============================================================================

/// Collects every parameter name that appears in a tree, declared or referenced.
#[derive(Default)]
pub struct ParameterCollector {
    pub names: BTreeSet<String>,
}

impl ParameterCollector {
    pub fn collect(expr: &LogicalExpr) -> BTreeSet<String> {
        let mut collector = Self::default();
        walk_expression(expr, &mut collector);
        collector.names
    }
}

impl ExpressionVisitor for ParameterCollector {
    type Output = ();

    fn visit_parameter(&mut self, param: &ParameterExpr) {
        self.names.insert(param.name.clone());
    }
}

/// Collects the rendered text of every member access, outermost first.
///
/// `c.Orders.Count` yields `["c.Orders.Count", "c.Orders"]`.
#[derive(Default)]
pub struct MemberAccessCollector {
    pub paths: Vec<String>,
}

impl MemberAccessCollector {
    pub fn collect(expr: &LogicalExpr) -> Vec<String> {
        let mut collector = Self::default();
        walk_expression(expr, &mut collector);
        collector.paths
    }
}

impl ExpressionVisitor for MemberAccessCollector {
    type Output = ();

    fn visit_member_access(&mut self, access: &MemberAccess) {
        self.paths
            .push(format!("{}.{}", access.target, access.member));
    }
}

/// Collects the names of every called method, in pre-order.
#[derive(Default)]
pub struct MethodCallCollector {
    pub names: Vec<String>,
}

impl MethodCallCollector {
    pub fn collect(expr: &LogicalExpr) -> Vec<String> {
        let mut collector = Self::default();
        walk_expression(expr, &mut collector);
        collector.names
    }
}

impl ExpressionVisitor for MethodCallCollector {
    type Output = ();

    fn visit_method_call(&mut self, call: &MethodCall) {
        self.names.push(call.method.name.clone());
    }
}
