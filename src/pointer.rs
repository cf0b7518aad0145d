//! # Node-Input Pointer Resolver
//!
//! Compiles one node-input slot — an ordered rule list with
//! first-success-wins semantics — into a fallback expression the
//! emitter renders as a coalesce chain.

use crate::context::{GraphContext, NodeHandle};
use crate::error::Result;
use crate::graph::InputRule;

/// A resolved value reference for one node-input slot.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerExpr {
    /// Explicit "no value" sentinel for an empty rule list.
    NoValue,
    /// A constant literal.
    Constant(serde_json::Value),
    /// A named output of another node.
    NodeOutput {
        /// The referenced node.
        node: NodeHandle,
        /// Name of the referenced output.
        output: String,
    },
    /// A workflow-level input variable.
    WorkflowInput(String),
    /// A stored secret.
    Secret(String),
    /// A node's live invocation counter.
    InvocationCount(NodeHandle),
    /// Left-associative fallback: the right side applies only when the
    /// left side fails to resolve at runtime.
    Coalesce(Box<PointerExpr>, Box<PointerExpr>),
}

/// Resolves an ordered rule list into one fallback expression.
///
/// Rules chain left-associatively: `r1.coalesce(r2).coalesce(r3)`. A
/// constant rule can never fail at runtime, so the chain is truncated
/// immediately after the first constant encountered; any rule after it
/// is unreachable and never consulted. An empty list resolves to
/// [`PointerExpr::NoValue`], not an error.
///
/// Rules referencing a node require it to be registered in `ctx`.
pub fn resolve_pointer(ctx: &GraphContext, rules: &[InputRule]) -> Result<PointerExpr> {
    let mut chain: Option<PointerExpr> = None;
    for rule in rules {
        let is_constant = matches!(rule, InputRule::Constant { .. });
        let resolved = resolve_rule(ctx, rule)?;
        chain = Some(match chain {
            None => resolved,
            Some(head) => PointerExpr::Coalesce(Box::new(head), Box::new(resolved)),
        });
        if is_constant {
            // Everything after a constant is unreachable.
            break;
        }
    }
    Ok(chain.unwrap_or(PointerExpr::NoValue))
}

/// Resolves one rule independently of its position in the chain.
fn resolve_rule(ctx: &GraphContext, rule: &InputRule) -> Result<PointerExpr> {
    match rule {
        InputRule::Constant { value } => Ok(PointerExpr::Constant(value.clone())),
        InputRule::NodeOutput { node_id, output } => Ok(PointerExpr::NodeOutput {
            node: ctx.lookup_node(node_id)?,
            output: output.clone(),
        }),
        InputRule::WorkflowInput { name } => Ok(PointerExpr::WorkflowInput(name.clone())),
        InputRule::Secret { name } => Ok(PointerExpr::Secret(name.clone())),
        InputRule::InvocationCount { node_id } => {
            Ok(PointerExpr::InvocationCount(ctx.lookup_node(node_id)?))
        }
    }
}
