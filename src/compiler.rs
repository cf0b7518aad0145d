//! # Graph Expression Compiler
//!
//! Main entry point for compiling a workflow's edge list into one
//! [`GraphExpr`] describing its control-flow topology.
//!
//! The compiler walks edges breadth-first from the entrypoint and merges
//! each one into the expression built so far. Merging is incremental and
//! pure: the attach step either produces a new expression, reports that
//! the edge has no attachment point, or fails hard when the attachment
//! point is ambiguous. Edges whose endpoints are not registered nodes
//! (dangling edges) are tolerated and skipped; edges process in
//! insertion order, so the result is deterministic for a fixed input
//! order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::context::{GraphContext, NodeHandle, PortHandle};
use crate::error::{CompileError, Result};
use crate::expr::GraphExpr;
use crate::graph::EdgeDescription;

/// Where a resolved edge leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeSource {
    /// The edge leaves the workflow entrypoint.
    Entry,
    /// The edge leaves a registered node through one of its ports.
    From { node: NodeHandle, port: PortHandle },
}

impl EdgeSource {
    fn node(self) -> Option<NodeHandle> {
        match self {
            EdgeSource::Entry => None,
            EdgeSource::From { node, .. } => Some(node),
        }
    }
}

/// An edge with both endpoints resolved against the context.
#[derive(Debug, Clone, Copy)]
struct ResolvedEdge<'a> {
    id: &'a str,
    source: EdgeSource,
    target: NodeHandle,
}

/// What the expression a subtree hangs off looks like from inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Ambient {
    /// No upstream anchor; the edge can only match subtree content.
    Detached,
    /// The subtree hangs off one upstream source (`None` = entrypoint).
    Source(Option<NodeHandle>),
    /// The subtree hangs off several distinct upstream nodes; an edge
    /// leaving any of them has no unique attachment point.
    Ambiguous(Vec<NodeHandle>),
}

/// Compiles the workflow's edge list into a single graph expression.
///
/// `entrypoint_id` is the designated start node; `edges` is the full
/// edge list in document order. Returns [`GraphExpr::Empty`] when there
/// is nothing to compile. Nodes unreachable from the entrypoint are
/// silently excluded.
///
/// The caller must have registered every node (and its ports) in `ctx`
/// beforehand; edges naming unregistered nodes are treated as dangling
/// and skipped.
pub fn compile_graph(
    ctx: &GraphContext,
    entrypoint_id: &str,
    edges: &[EdgeDescription],
) -> Result<GraphExpr> {
    tracing::info!(
        "[FLOWC] compiling graph: {} edges from entrypoint {}",
        edges.len(),
        entrypoint_id,
    );

    // Edge indices grouped by source node id, preserving document order.
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, edge) in edges.iter().enumerate() {
        by_source.entry(&edge.source_node_id).or_default().push(index);
    }

    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut queued: HashSet<usize> = HashSet::new();
    let mut processed: HashSet<usize> = HashSet::new();

    for &index in by_source.get(entrypoint_id).into_iter().flatten() {
        if queued.insert(index) {
            queue.push_back(index);
        }
    }

    let mut expr = GraphExpr::Empty;

    while let Some(index) = queue.pop_front() {
        let edge = &edges[index];
        processed.insert(index);

        let Ok(target) = ctx.lookup_node(&edge.target_node_id) else {
            tracing::debug!("[FLOWC] skipping edge {}: dangling target", edge.id);
            continue;
        };
        let source = if edge.source_node_id == entrypoint_id {
            EdgeSource::Entry
        } else {
            let Ok(node) = ctx.lookup_node(&edge.source_node_id) else {
                tracing::debug!("[FLOWC] skipping edge {}: dangling source", edge.id);
                continue;
            };
            let port = resolve_source_port(ctx, node, edge)?;
            EdgeSource::From { node, port }
        };
        let resolved = ResolvedEdge { id: &edge.id, source, target };

        match attach(ctx, &expr, &Ambient::Source(None), &resolved)? {
            Some(merged) => {
                expr = merged;
                // Frontier: follow every edge leaving any port of the target.
                for &next in by_source
                    .get(edge.target_node_id.as_str())
                    .into_iter()
                    .flatten()
                {
                    if !processed.contains(&next) && queued.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            None => {
                tracing::debug!("[FLOWC] edge {} has no attachment point", edge.id);
            }
        }
    }

    tracing::info!("[FLOWC] graph compilation complete");
    Ok(expr)
}

/// Resolves the port an edge leaves through on its source node.
///
/// An absent port id means the node's default continuation; a named port
/// id must resolve globally and belong to the source node.
fn resolve_source_port(
    ctx: &GraphContext,
    node: NodeHandle,
    edge: &EdgeDescription,
) -> Result<PortHandle> {
    match &edge.source_port_id {
        None => ctx.node(node).default_port.ok_or_else(|| {
            CompileError::PortNotFound(format!("default port of {}", edge.source_node_id))
        }),
        Some(port_id) => {
            let port = ctx.lookup_port(port_id)?;
            if ctx.port(port).owner != node {
                return Err(CompileError::PortNotFound(port_id.clone()));
            }
            Ok(port)
        }
    }
}

/// Attempts to merge one edge into an expression.
///
/// Returns the rewritten expression, or `None` when the edge has no
/// attachment point in this subtree. `ambient` describes what the
/// subtree hangs off, so an edge branching off the same upstream point
/// can become a parallel sibling.
fn attach(
    ctx: &GraphContext,
    expr: &GraphExpr,
    ambient: &Ambient,
    edge: &ResolvedEdge<'_>,
) -> Result<Option<GraphExpr>> {
    match expr {
        GraphExpr::Empty => Ok(Some(GraphExpr::Node(edge.target))),

        GraphExpr::Node(n) => {
            if let EdgeSource::From { node, port } = edge.source {
                if node == *n {
                    return Ok(Some(branch_from(ctx, node, port, edge.target)));
                }
            }
            Ok(match_ambient(ambient, edge)?.then(|| {
                GraphExpr::parallel(vec![expr.clone(), GraphExpr::Node(edge.target)])
            }))
        }

        GraphExpr::Port(p) => {
            // A port leaf stands for a named exit of its owner; another
            // edge leaving the same node grafts as a sibling branch.
            if let EdgeSource::From { node, port } = edge.source {
                if node == ctx.port(*p).owner {
                    return Ok(Some(branch_from(ctx, node, port, edge.target)));
                }
            }
            Ok(None)
        }

        GraphExpr::Sequence(lhs, rhs) => {
            // Branching off the head: graft onto the lhs, then put the
            // grafted branch next to the original sequence.
            if let Some(new_lhs) = attach(ctx, lhs, &Ambient::Detached, edge)? {
                let members = vec![expr.clone(), new_lhs];
                return Ok(Some(collapse_shared_source(members)));
            }
            // Otherwise descend into the rhs, which hangs off the lhs's
            // terminal node(s).
            let rhs_ambient = match lhs.terminal_nodes(ctx).as_slice() {
                [] => Ambient::Detached,
                [single] => Ambient::Source(Some(*single)),
                many => Ambient::Ambiguous(many.to_vec()),
            };
            match attach(ctx, rhs, &rhs_ambient, edge)? {
                Some(new_rhs) => Ok(Some(GraphExpr::sequence((**lhs).clone(), new_rhs))),
                None => Ok(None),
            }
        }

        GraphExpr::Parallel(members) => {
            for (index, member) in members.iter().enumerate() {
                if let Some(new_member) = attach(ctx, member, &Ambient::Detached, edge)? {
                    let mut merged = members.clone();
                    merged[index] = new_member;
                    return Ok(Some(collapse_shared_terminal(merged)));
                }
            }
            // No member accepted the edge; append a new branch when the
            // edge leaves the point the whole set hangs off.
            Ok(match_ambient(ambient, edge)?.then(|| {
                let mut merged = members.clone();
                merged.push(GraphExpr::Node(edge.target));
                GraphExpr::parallel(merged)
            }))
        }
    }
}

/// Whether an edge branches off the upstream point a subtree hangs from.
///
/// Matching an ambiguous multi-terminal anchor is the one hard,
/// non-recoverable merge failure.
fn match_ambient(ambient: &Ambient, edge: &ResolvedEdge<'_>) -> Result<bool> {
    match ambient {
        Ambient::Detached => Ok(false),
        Ambient::Source(source) => Ok(*source == edge.source.node()),
        Ambient::Ambiguous(nodes) => match edge.source.node() {
            Some(node) if nodes.contains(&node) => Err(CompileError::AmbiguousMerge {
                edge: edge.id.to_string(),
            }),
            _ => Ok(false),
        },
    }
}

/// New branch leaving `node` through `port` into `target`.
///
/// The default port continues from the node itself; a named port stands
/// in for the node on the left of the sequence.
fn branch_from(
    ctx: &GraphContext,
    node: NodeHandle,
    port: PortHandle,
    target: NodeHandle,
) -> GraphExpr {
    if ctx.port(port).is_default {
        GraphExpr::sequence(GraphExpr::Node(node), GraphExpr::Node(target))
    } else {
        GraphExpr::sequence(GraphExpr::Port(port), GraphExpr::Node(target))
    }
}

/// Collapses a parallel set whose branches all start at the same head
/// into `head >> parallel(tails)`, e.g. after a fan-out graft.
fn collapse_shared_source(members: Vec<GraphExpr>) -> GraphExpr {
    let heads: Vec<Option<&GraphExpr>> = members
        .iter()
        .map(|member| match member {
            GraphExpr::Sequence(lhs, _) => Some(lhs.as_ref()),
            _ => None,
        })
        .collect();
    let shared = match heads.first() {
        Some(Some(first)) if heads.iter().all(|head| *head == Some(*first)) => {
            Some((*first).clone())
        }
        _ => None,
    };
    match shared {
        Some(head) => {
            let tails = members
                .into_iter()
                .map(|member| match member {
                    GraphExpr::Sequence(_, rhs) => *rhs,
                    other => other,
                })
                .collect();
            GraphExpr::sequence(head, GraphExpr::parallel(tails))
        }
        None => GraphExpr::parallel(members),
    }
}

/// Collapses a parallel set whose branches all end at the same node into
/// `parallel(popped) >> terminal`, keeping fan-in flat.
fn collapse_shared_terminal(members: Vec<GraphExpr>) -> GraphExpr {
    let shared = members
        .iter()
        .all(GraphExpr::is_sequence_shaped)
        .then(|| {
            let mut leaves = members.iter().flat_map(|member| member.terminal_leaves());
            match leaves.next() {
                Some(GraphExpr::Node(first)) => {
                    let first = *first;
                    leaves
                        .all(|leaf| matches!(leaf, GraphExpr::Node(n) if *n == first))
                        .then_some(first)
                }
                _ => None,
            }
        })
        .flatten();
    match shared {
        Some(terminal) => {
            let popped = members.into_iter().map(GraphExpr::pop_terminal).collect();
            GraphExpr::sequence(GraphExpr::parallel(popped), GraphExpr::Node(terminal))
        }
        None => GraphExpr::parallel(members),
    }
}
