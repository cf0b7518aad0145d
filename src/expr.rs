//! # Graph Expression IR
//!
//! The recursive expression the compiler builds from an edge list. A
//! compiled expression describes workflow control-flow topology only;
//! emitters render it into the SDK's graph-wiring statement.
//!
//! Expressions are immutable values: every merge step in the compiler
//! produces a new expression rather than rewriting one in place.

use crate::context::{GraphContext, NodeHandle, PortHandle};

/// Control-flow topology of a compiled workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphExpr {
    /// No nodes compiled yet.
    Empty,
    /// One compiled node, implicitly exposing its default port.
    Node(NodeHandle),
    /// A specific named port; valid only as the left operand of a
    /// [`GraphExpr::Sequence`].
    Port(PortHandle),
    /// The left operand executes before the right operand.
    Sequence(Box<GraphExpr>, Box<GraphExpr>),
    /// Independent sub-graphs with no relative ordering.
    Parallel(Vec<GraphExpr>),
}

/// One edge recovered by flattening a compiled expression.
///
/// `port` is `None` when the edge leaves through the source node's
/// default continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlatEdge {
    /// Node the edge leaves.
    pub source: NodeHandle,
    /// Named port the edge leaves through, if not the default.
    pub port: Option<PortHandle>,
    /// Node the edge enters.
    pub target: NodeHandle,
}

impl GraphExpr {
    /// Builds a sequence of two expressions.
    pub fn sequence(lhs: GraphExpr, rhs: GraphExpr) -> GraphExpr {
        GraphExpr::Sequence(Box::new(lhs), Box::new(rhs))
    }

    /// Builds a parallel set, splicing nested parallel members into the
    /// new set so fan groups stay flat.
    pub fn parallel(members: Vec<GraphExpr>) -> GraphExpr {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            match member {
                GraphExpr::Parallel(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        GraphExpr::Parallel(flat)
    }

    /// Nodes the expression starts at. For the whole compiled expression
    /// these are exactly the entrypoint's direct successors.
    pub fn entry_nodes(&self, ctx: &GraphContext) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.collect_entry_nodes(ctx, &mut out);
        out
    }

    fn collect_entry_nodes(&self, ctx: &GraphContext, out: &mut Vec<NodeHandle>) {
        match self {
            GraphExpr::Empty => {}
            GraphExpr::Node(n) => out.push(*n),
            GraphExpr::Port(p) => out.push(ctx.port(*p).owner),
            GraphExpr::Sequence(lhs, _) => lhs.collect_entry_nodes(ctx, out),
            GraphExpr::Parallel(members) => {
                for member in members {
                    member.collect_entry_nodes(ctx, out);
                }
            }
        }
    }

    /// Distinct nodes the expression ends at, in discovery order.
    pub fn terminal_nodes(&self, ctx: &GraphContext) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.collect_terminal_nodes(ctx, &mut out);
        out
    }

    fn collect_terminal_nodes(&self, ctx: &GraphContext, out: &mut Vec<NodeHandle>) {
        match self {
            GraphExpr::Empty => {}
            GraphExpr::Node(n) => {
                if !out.contains(n) {
                    out.push(*n);
                }
            }
            GraphExpr::Port(p) => {
                let owner = ctx.port(*p).owner;
                if !out.contains(&owner) {
                    out.push(owner);
                }
            }
            GraphExpr::Sequence(_, rhs) => rhs.collect_terminal_nodes(ctx, out),
            GraphExpr::Parallel(members) => {
                for member in members {
                    member.collect_terminal_nodes(ctx, out);
                }
            }
        }
    }

    /// Leaf expressions the expression ends at, without deduplication.
    pub(crate) fn terminal_leaves(&self) -> Vec<&GraphExpr> {
        let mut out = Vec::new();
        self.collect_terminal_leaves(&mut out);
        out
    }

    fn collect_terminal_leaves<'a>(&'a self, out: &mut Vec<&'a GraphExpr>) {
        match self {
            GraphExpr::Empty => {}
            GraphExpr::Node(_) | GraphExpr::Port(_) => out.push(self),
            GraphExpr::Sequence(_, rhs) => rhs.collect_terminal_leaves(out),
            GraphExpr::Parallel(members) => {
                for member in members {
                    member.collect_terminal_leaves(out);
                }
            }
        }
    }

    /// Whether the expression is a sequence at every branch, i.e. has a
    /// terminal that can be popped off.
    pub(crate) fn is_sequence_shaped(&self) -> bool {
        match self {
            GraphExpr::Sequence(..) => true,
            GraphExpr::Parallel(members) => members.iter().all(GraphExpr::is_sequence_shaped),
            _ => false,
        }
    }

    /// Removes the terminal leaf from a sequence-shaped expression.
    ///
    /// Callers must have checked [`GraphExpr::is_sequence_shaped`] and
    /// that all terminal leaves agree; leaves are returned unchanged
    /// otherwise.
    pub(crate) fn pop_terminal(self) -> GraphExpr {
        fn is_leaf(expr: &GraphExpr) -> bool {
            matches!(expr, GraphExpr::Node(_) | GraphExpr::Port(_))
        }
        match self {
            GraphExpr::Sequence(lhs, rhs) => match *rhs {
                ref leaf if is_leaf(leaf) => *lhs,
                GraphExpr::Parallel(ref members) if members.iter().all(is_leaf) => *lhs,
                other => GraphExpr::sequence(*lhs, other.pop_terminal()),
            },
            GraphExpr::Parallel(members) => {
                GraphExpr::parallel(members.into_iter().map(GraphExpr::pop_terminal).collect())
            }
            other => other,
        }
    }

    /// Flattens the expression back into its edge set.
    ///
    /// Together with [`GraphExpr::entry_nodes`] (the edges leaving the
    /// entrypoint) this reproduces the compiler's input minus dangling
    /// edges.
    pub fn flatten_edges(&self, ctx: &GraphContext) -> Vec<FlatEdge> {
        let mut out = Vec::new();
        self.collect_edges(ctx, &mut out);
        out
    }

    fn collect_edges(&self, ctx: &GraphContext, out: &mut Vec<FlatEdge>) {
        match self {
            GraphExpr::Empty | GraphExpr::Node(_) | GraphExpr::Port(_) => {}
            GraphExpr::Sequence(lhs, rhs) => {
                lhs.collect_edges(ctx, out);
                rhs.collect_edges(ctx, out);
                let mut entries = Vec::new();
                rhs.collect_entry_nodes(ctx, &mut entries);
                for (source, port) in lhs.exit_points(ctx) {
                    for &target in &entries {
                        out.push(FlatEdge { source, port, target });
                    }
                }
            }
            GraphExpr::Parallel(members) => {
                for member in members {
                    member.collect_edges(ctx, out);
                }
            }
        }
    }

    /// `(node, named port)` pairs downstream expressions attach to.
    fn exit_points(&self, ctx: &GraphContext) -> Vec<(NodeHandle, Option<PortHandle>)> {
        match self {
            GraphExpr::Empty => Vec::new(),
            GraphExpr::Node(n) => vec![(*n, None)],
            GraphExpr::Port(p) => vec![(ctx.port(*p).owner, Some(*p))],
            GraphExpr::Sequence(_, rhs) => rhs.exit_points(ctx),
            GraphExpr::Parallel(members) => members
                .iter()
                .flat_map(|member| member.exit_points(ctx))
                .collect(),
        }
    }
}
