//! Collection-navigation rewriting.
//!
//! Walks an expression depth-first and replaces every collection navigation
//! access (`c.Orders`) with a correlated subquery over the dependent entity
//! set. `c.Orders.Count` becomes `Count(<subquery>)`. Subtrees without such
//! accesses come back as the very same `Arc`s.
//!
//! Method calls are dispatched in this order:
//! 1. eager-loading markers are left alone;
//! 2. `SelectMany(source, collectionSelector)` is left alone;
//! 3. `SelectMany(source, collectionSelector, resultSelector)` only has its
//!    result selector rewritten;
//! 4. `list.Exists(pred)` is desugared to `Any(list, pred)` and rewritten again;
//! 5. anything else is rewritten child by child.
//!
//! The walk recurses once per nesting level. It runs on a worker thread whose
//! stack is reserved from `max_depth`, and trees nested deeper than that are
//! refused with `DepthExceeded` before any rewriting starts.

use std::collections::HashSet;
use std::panic;
use std::sync::Arc;
use std::thread;

use log::{debug, error, warn};

use super::alias_mapping::{AliasMapping, FoundNavigationPaths};
use super::binder::{AliasTableBinder, NavigationBinder};
use super::errors::{NavigationRewriteError, NavigationRewriteResult};
use super::subquery::synthesize_subquery;
use crate::config::{RewriterConfig, SizeAccessorPolicy};
use crate::entity_catalog::EntityCatalog;
use crate::query_planner::logical_expr::combinators::{lambda, member};
use crate::query_planner::logical_expr::operators::{self, any, count};
use crate::query_planner::logical_expr::visitors::ParameterCollector;
use crate::query_planner::logical_expr::{
    BinaryExpr, Conditional, ConvertExpr, ExprRef, LambdaExpr, LogicalExpr, MemberAccess,
    MethodCall, NewExpr, NewMember, ParameterExpr, TypeIsExpr,
};
use crate::query_planner::transformed::Transformed;
use crate::query_planner::types::TypeRef;

/// Worker stack reserved per nesting level. Unoptimised builds spend several
/// KiB per level across `visit` and its dispatch helpers.
const STACK_PER_LEVEL: usize = 64 * 1024;

/// Worker stack reserved on top of the per-level budget.
const STACK_BASE: usize = 1024 * 1024;

pub struct NavigationRewriter<'a, B = AliasTableBinder<'a>> {
    catalog: &'a EntityCatalog,
    binder: B,
    config: &'a RewriterConfig,
    /// Parameter names in use by the tree being rewritten, plus every name
    /// handed out so far.
    reserved_names: HashSet<String>,
    depth: u32,
}

impl<'a> NavigationRewriter<'a> {
    pub fn new(
        catalog: &'a EntityCatalog,
        root: ParameterExpr,
        aliases: &'a AliasMapping,
        found_paths: &'a FoundNavigationPaths,
        config: &'a RewriterConfig,
    ) -> Self {
        let binder = AliasTableBinder::new(catalog, root, aliases, found_paths);
        Self::with_binder(catalog, binder, config)
    }
}

impl<'a, B: NavigationBinder> NavigationRewriter<'a, B> {
    pub fn with_binder(catalog: &'a EntityCatalog, binder: B, config: &'a RewriterConfig) -> Self {
        Self {
            catalog,
            binder,
            config,
            reserved_names: HashSet::new(),
            depth: 0,
        }
    }

    /// Rewrite `expr`. `Transformed::No` carries `expr` itself.
    pub fn rewrite(&mut self, expr: &ExprRef) -> NavigationRewriteResult<Transformed<ExprRef>>
    where
        B: Send,
    {
        let stack_size = STACK_BASE + self.config.max_depth as usize * STACK_PER_LEVEL;
        thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("navrewrite-walk".to_string())
                .stack_size(stack_size)
                .spawn_scoped(scope, move || self.rewrite_on_worker(expr))
                .map_err(|e| NavigationRewriteError::WorkerSpawn {
                    reason: e.to_string(),
                })?;
            worker
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }

    fn rewrite_on_worker(
        &mut self,
        expr: &ExprRef,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        if nesting_exceeds(expr, self.config.max_depth) {
            return Err(self.depth_exceeded());
        }
        debug!("Rewriting navigations in: {}", expr);

        self.reserved_names = ParameterCollector::collect(expr).into_iter().collect();
        self.depth = 0;
        let rewritten = self.visit(expr)?;

        if rewritten.is_yes() {
            debug!("Rewritten expression: {}", rewritten.as_inner());
        } else {
            debug!("No collection navigations found");
        }
        Ok(rewritten)
    }

    fn depth_exceeded(&self) -> NavigationRewriteError {
        error!(
            "NavigationRewriter: expression nesting exceeds max_depth={}",
            self.config.max_depth
        );
        NavigationRewriteError::DepthExceeded {
            max_depth: self.config.max_depth,
        }
    }

    fn visit(&mut self, expr: &ExprRef) -> NavigationRewriteResult<Transformed<ExprRef>> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(self.depth_exceeded());
        }

        let result = match expr.as_ref() {
            LogicalExpr::MethodCall(call) => self.visit_method_call(expr, call),
            LogicalExpr::MemberAccess(access) => self.visit_member_access(expr, access),
            _ => self.visit_children(expr),
        };

        self.depth -= 1;
        result
    }

    fn visit_method_call(
        &mut self,
        expr: &ExprRef,
        call: &MethodCall,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        if operators::is_eager_loading(call) {
            debug!(
                "NavigationRewriter: leaving eager-loading call {} untouched",
                call.method.name
            );
            return Ok(Transformed::No(Arc::clone(expr)));
        }

        if operators::is_select_many_collection_only(call) {
            return Ok(Transformed::No(Arc::clone(expr)));
        }

        if operators::is_select_many_with_result_selector(call) {
            return self.visit_result_selector(expr, call);
        }

        if operators::is_list_exists(call) {
            if let (Some(receiver), Some(predicate)) = (
                call.receiver.as_ref(),
                call.args.first().and_then(|arg| arg.as_lambda()),
            ) {
                return self.desugar_exists(receiver, predicate);
            }
        }

        self.visit_call_children(expr, call)
    }

    fn visit_result_selector(
        &mut self,
        expr: &ExprRef,
        call: &MethodCall,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        let selector = &call.args[2];
        if selector.as_lambda().is_none() {
            return Err(NavigationRewriteError::InvalidNode {
                node: operators::SELECT_MANY.to_string(),
                reason: format!("result selector `{}` is not a lambda", selector),
            });
        }

        match self.visit(selector)? {
            Transformed::No(_) => Ok(Transformed::No(Arc::clone(expr))),
            Transformed::Yes(rewritten) => {
                let mut args = call.args.clone();
                args[2] = rewritten;
                Ok(Transformed::Yes(Arc::new(LogicalExpr::MethodCall(
                    MethodCall {
                        method: call.method.clone(),
                        receiver: call.receiver.clone(),
                        args,
                        ty: call.ty.clone(),
                    },
                ))))
            }
        }
    }

    /// `list.Exists(x => p)` → `Any(list, x => p)`, then rewrite the result so a
    /// navigation receiver gets the usual treatment.
    fn desugar_exists(
        &mut self,
        receiver: &ExprRef,
        predicate: &LambdaExpr,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        let element = match (receiver.ty().element_type(), predicate.params.as_slice()) {
            (Some(element), [_]) => element.clone(),
            (None, [param]) => param.ty.clone(),
            _ => {
                return Err(NavigationRewriteError::InvalidNode {
                    node: operators::EXISTS.to_string(),
                    reason: format!(
                        "predicate must take exactly one parameter, found {}",
                        predicate.params.len()
                    ),
                });
            }
        };

        let rewrapped = lambda(predicate.params.clone(), Arc::clone(&predicate.body));
        let any_call = any(&element, Arc::clone(receiver), rewrapped);
        debug!("NavigationRewriter: desugared Exists to {}", any_call);

        Ok(Transformed::Yes(self.visit(&any_call)?.into_inner()))
    }

    fn visit_member_access(
        &mut self,
        expr: &ExprRef,
        access: &MemberAccess,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        if let Some(binding) = self.binder.bind(expr) {
            if let Some(navigation) = binding.last_navigation().filter(|nav| nav.is_collection) {
                let navigation = Arc::clone(navigation);
                let inner = self.fresh_parameter(&navigation.foreign_key.declaring_entity);
                let subquery =
                    synthesize_subquery(self.catalog, &navigation, &access.target, inner)?;
                return Ok(Transformed::Yes(subquery));
            }
        }

        let target = match self.visit(&access.target)? {
            Transformed::No(_) => return Ok(Transformed::No(Arc::clone(expr))),
            Transformed::Yes(target) => target,
        };

        let target_ty = target.ty();
        if self.config.is_size_accessor(&access.member) {
            if let Some(element) = target_ty.element_type() {
                debug!(
                    "NavigationRewriter: `{}` becomes a Count over the rewritten source",
                    expr
                );
                return Ok(Transformed::Yes(count(element, target)));
            }
        }

        if target_ty.is_queryable() {
            return match self.config.unsupported_size_accessor {
                SizeAccessorPolicy::Fail => {
                    error!(
                        "NavigationRewriter: `{}` is not a known size accessor on `{}`",
                        access.member, access.target
                    );
                    Err(NavigationRewriteError::UnsupportedSizeAccessor {
                        member: access.member.clone(),
                        target: access.target.to_string(),
                    })
                }
                SizeAccessorPolicy::PassThrough => {
                    warn!(
                        "NavigationRewriter: leaving `{}` unrewritten, `{}` is not a known size accessor",
                        expr, access.member
                    );
                    Ok(Transformed::No(Arc::clone(expr)))
                }
            };
        }

        Ok(Transformed::Yes(member(
            &target,
            access.member.clone(),
            access.ty.clone(),
        )))
    }

    fn visit_call_children(
        &mut self,
        expr: &ExprRef,
        call: &MethodCall,
    ) -> NavigationRewriteResult<Transformed<ExprRef>> {
        let receiver = match &call.receiver {
            Some(receiver) => Some(self.visit(receiver)?),
            None => None,
        };
        let args = self.visit_all(&call.args)?;

        let changed =
            receiver.as_ref().is_some_and(|r| r.is_yes()) || args.iter().any(|a| a.is_yes());
        if !changed {
            return Ok(Transformed::No(Arc::clone(expr)));
        }

        Ok(Transformed::Yes(Arc::new(LogicalExpr::MethodCall(
            MethodCall {
                method: call.method.clone(),
                receiver: receiver.map(Transformed::into_inner),
                args: args.into_iter().map(Transformed::into_inner).collect(),
                ty: call.ty.clone(),
            },
        ))))
    }

    fn visit_all(
        &mut self,
        exprs: &[ExprRef],
    ) -> NavigationRewriteResult<Vec<Transformed<ExprRef>>> {
        exprs.iter().map(|e| self.visit(e)).collect()
    }

    /// Structural recursion for every node kind without special handling.
    fn visit_children(&mut self, expr: &ExprRef) -> NavigationRewriteResult<Transformed<ExprRef>> {
        let rebuilt = match expr.as_ref() {
            LogicalExpr::Lambda(lambda_expr) => match self.visit(&lambda_expr.body)? {
                Transformed::No(_) => None,
                Transformed::Yes(body) => Some(LogicalExpr::Lambda(LambdaExpr {
                    params: lambda_expr.params.clone(),
                    body,
                })),
            },
            LogicalExpr::Conditional(cond) => {
                let test = self.visit(&cond.test)?;
                let if_true = self.visit(&cond.if_true)?;
                let if_false = self.visit(&cond.if_false)?;
                (test.is_yes() || if_true.is_yes() || if_false.is_yes()).then(|| {
                    LogicalExpr::Conditional(Conditional {
                        test: test.into_inner(),
                        if_true: if_true.into_inner(),
                        if_false: if_false.into_inner(),
                    })
                })
            }
            LogicalExpr::Binary(bin) => {
                let left = self.visit(&bin.left)?;
                let right = self.visit(&bin.right)?;
                (left.is_yes() || right.is_yes()).then(|| {
                    LogicalExpr::Binary(BinaryExpr {
                        operator: bin.operator,
                        left: left.into_inner(),
                        right: right.into_inner(),
                    })
                })
            }
            LogicalExpr::Not(operand) => match self.visit(operand)? {
                Transformed::No(_) => None,
                Transformed::Yes(operand) => Some(LogicalExpr::Not(operand)),
            },
            LogicalExpr::Convert(conv) => match self.visit(&conv.operand)? {
                Transformed::No(_) => None,
                Transformed::Yes(operand) => Some(LogicalExpr::Convert(ConvertExpr {
                    operand,
                    ty: conv.ty.clone(),
                })),
            },
            LogicalExpr::TypeIs(test) => match self.visit(&test.operand)? {
                Transformed::No(_) => None,
                Transformed::Yes(operand) => Some(LogicalExpr::TypeIs(TypeIsExpr {
                    operand,
                    ty: test.ty.clone(),
                })),
            },
            LogicalExpr::New(new) => {
                let values: Vec<ExprRef> =
                    new.members.iter().map(|m| Arc::clone(&m.value)).collect();
                let values = self.visit_all(&values)?;
                values.iter().any(|v| v.is_yes()).then(|| {
                    LogicalExpr::New(NewExpr {
                        members: new
                            .members
                            .iter()
                            .zip(values)
                            .map(|(m, value)| NewMember {
                                name: m.name.clone(),
                                value: value.into_inner(),
                            })
                            .collect(),
                    })
                })
            }
            LogicalExpr::MethodCall(call) => return self.visit_call_children(expr, call),
            LogicalExpr::MemberAccess(_)
            | LogicalExpr::Constant(_)
            | LogicalExpr::Parameter(_)
            | LogicalExpr::EntityQuery(_) => None,
        };

        Ok(match rebuilt {
            Some(node) => Transformed::Yes(Arc::new(node)),
            None => Transformed::No(Arc::clone(expr)),
        })
    }

    /// Parameter over `entity` named after it (`Order` → `order`), suffixed
    /// `_1`, `_2`, ... while the name is taken.
    fn fresh_parameter(&mut self, entity: &str) -> ParameterExpr {
        let mut chars = entity.chars();
        let base: String = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => "x".to_string(),
        };

        let mut name = base.clone();
        let mut suffix = 0;
        while self.reserved_names.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        self.reserved_names.insert(name.clone());
        ParameterExpr::new(name, TypeRef::entity(entity))
    }
}

/// Whether some root-to-leaf path of `expr` has more than `max_depth` nodes.
/// Recurses at most `max_depth + 1` levels.
fn nesting_exceeds(expr: &LogicalExpr, max_depth: u32) -> bool {
    max_depth == 0
        || expr
            .children()
            .into_iter()
            .any(|child| nesting_exceeds(child, max_depth - 1))
}
