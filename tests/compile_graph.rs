//! Integration tests for graph expression compilation.
//!
//! Each test registers a small workflow in a fresh context, compiles its
//! edge list, and checks the resulting expression shape, its flattened
//! edge set, or the rendered SDK wiring statement.

use std::collections::HashSet;

use flowc::{
    compile_graph, BranchDescription, CompileError, EdgeDescription, FlatEdge, GraphContext,
    GraphExpr, NodeDescription, NodeKind, SdkRenderer,
};

const ENTRY: &str = "entry";

fn task(id: &str) -> NodeDescription {
    NodeDescription {
        id: id.to_string(),
        label: id.to_uppercase(),
        kind: NodeKind::Task,
        definition: None,
        source_handle: None,
        branches: Vec::new(),
        inputs: Default::default(),
    }
}

fn branch(id: &str, branches: &[(&str, &str)]) -> NodeDescription {
    NodeDescription {
        kind: NodeKind::Branch,
        branches: branches
            .iter()
            .map(|(branch_id, name)| BranchDescription {
                id: branch_id.to_string(),
                name: name.to_string(),
            })
            .collect(),
        ..task(id)
    }
}

fn edge(id: &str, source: &str, port: Option<&str>, target: &str) -> EdgeDescription {
    EdgeDescription {
        id: id.to_string(),
        source_node_id: source.to_string(),
        source_port_id: port.map(str::to_string),
        target_node_id: target.to_string(),
        target_port_id: None,
    }
}

fn context(nodes: &[NodeDescription]) -> GraphContext {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut ctx = GraphContext::new();
    for node in nodes {
        ctx.register(node).unwrap();
    }
    ctx
}

fn flat_set(ctx: &GraphContext, expr: &GraphExpr) -> HashSet<FlatEdge> {
    expr.flatten_edges(ctx).into_iter().collect()
}

#[test]
fn no_edges_compiles_to_empty() {
    let ctx = context(&[task("a")]);
    let expr = compile_graph(&ctx, ENTRY, &[]).unwrap();
    assert_eq!(expr, GraphExpr::Empty);
}

#[test]
fn single_node() {
    let ctx = context(&[task("a")]);
    let edges = [edge("e1", ENTRY, None, "a")];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();
    assert_eq!(expr, GraphExpr::Node(ctx.lookup_node("a").unwrap()));
}

#[test]
fn linear_chain_nests_to_the_right() {
    let ctx = context(&[task("a"), task("b"), task("c")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "a", None, "b"),
        edge("e3", "b", None, "c"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let (a, b, c) = (
        ctx.lookup_node("a").unwrap(),
        ctx.lookup_node("b").unwrap(),
        ctx.lookup_node("c").unwrap(),
    );
    let expected = GraphExpr::sequence(
        GraphExpr::Node(a),
        GraphExpr::sequence(GraphExpr::Node(b), GraphExpr::Node(c)),
    );
    assert_eq!(expr, expected);

    // Flattening recovers the input edge set: the entrypoint edge shows
    // up as the expression's entry node.
    assert_eq!(expr.entry_nodes(&ctx), vec![a]);
    let expected_edges: HashSet<FlatEdge> = [
        FlatEdge { source: a, port: None, target: b },
        FlatEdge { source: b, port: None, target: c },
    ]
    .into_iter()
    .collect();
    assert_eq!(flat_set(&ctx, &expr), expected_edges);
}

#[test]
fn fan_out_from_one_default_port() {
    let ctx = context(&[task("a"), task("b"), task("c")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "a", None, "b"),
        edge("e3", "a", None, "c"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let (a, b, c) = (
        ctx.lookup_node("a").unwrap(),
        ctx.lookup_node("b").unwrap(),
        ctx.lookup_node("c").unwrap(),
    );
    let expected = GraphExpr::sequence(
        GraphExpr::Node(a),
        GraphExpr::parallel(vec![GraphExpr::Node(b), GraphExpr::Node(c)]),
    );
    assert_eq!(expr, expected);
    assert_eq!(SdkRenderer::new(&ctx).render_graph(&expr), "A >> [B, C]");
}

#[test]
fn fan_out_fan_in_collapses_to_shared_terminal() {
    let ctx = context(&[task("a"), task("b"), task("c")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", ENTRY, None, "b"),
        edge("e3", "a", None, "c"),
        edge("e4", "b", None, "c"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let (a, b, c) = (
        ctx.lookup_node("a").unwrap(),
        ctx.lookup_node("b").unwrap(),
        ctx.lookup_node("c").unwrap(),
    );
    let expected = GraphExpr::sequence(
        GraphExpr::parallel(vec![GraphExpr::Node(a), GraphExpr::Node(b)]),
        GraphExpr::Node(c),
    );
    assert_eq!(expr, expected);
    assert_eq!(SdkRenderer::new(&ctx).render_graph(&expr), "[A, B] >> C");

    assert_eq!(expr.entry_nodes(&ctx), vec![a, b]);
    let expected_edges: HashSet<FlatEdge> = [
        FlatEdge { source: a, port: None, target: c },
        FlatEdge { source: b, port: None, target: c },
    ]
    .into_iter()
    .collect();
    assert_eq!(flat_set(&ctx, &expr), expected_edges);
}

#[test]
fn entry_fan_out_appends_parallel_members() {
    let ctx = context(&[task("a"), task("b"), task("c")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", ENTRY, None, "b"),
        edge("e3", ENTRY, None, "c"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();
    let expected = GraphExpr::parallel(vec![
        GraphExpr::Node(ctx.lookup_node("a").unwrap()),
        GraphExpr::Node(ctx.lookup_node("b").unwrap()),
        GraphExpr::Node(ctx.lookup_node("c").unwrap()),
    ]);
    assert_eq!(expr, expected);
}

#[test]
fn named_port_stands_in_for_its_node() {
    let ctx = context(&[
        branch("g", &[("g-yes", "yes"), ("g-no", "no")]),
        task("a"),
    ]);
    let edges = [
        edge("e1", ENTRY, None, "g"),
        edge("e2", "g", Some("g-yes"), "a"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let yes = ctx.lookup_port("g-yes").unwrap();
    let a = ctx.lookup_node("a").unwrap();
    assert_eq!(
        expr,
        GraphExpr::sequence(GraphExpr::Port(yes), GraphExpr::Node(a)),
    );
    assert_eq!(
        SdkRenderer::new(&ctx).render_graph(&expr),
        "G.port(\"yes\") >> A",
    );
}

#[test]
fn sibling_branches_stay_parallel() {
    let ctx = context(&[
        branch("g", &[("g-yes", "yes"), ("g-no", "no")]),
        task("a"),
        task("b"),
    ]);
    let edges = [
        edge("e1", ENTRY, None, "g"),
        edge("e2", "g", Some("g-yes"), "a"),
        edge("e3", "g", Some("g-no"), "b"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let yes = ctx.lookup_port("g-yes").unwrap();
    let no = ctx.lookup_port("g-no").unwrap();
    let a = ctx.lookup_node("a").unwrap();
    let b = ctx.lookup_node("b").unwrap();
    let expected = GraphExpr::parallel(vec![
        GraphExpr::sequence(GraphExpr::Port(yes), GraphExpr::Node(a)),
        GraphExpr::sequence(GraphExpr::Port(no), GraphExpr::Node(b)),
    ]);
    assert_eq!(expr, expected);
}

#[test]
fn same_named_port_fans_out() {
    let ctx = context(&[
        branch("g", &[("g-yes", "yes"), ("g-no", "no")]),
        task("a"),
        task("b"),
    ]);
    let edges = [
        edge("e1", ENTRY, None, "g"),
        edge("e2", "g", Some("g-yes"), "a"),
        edge("e3", "g", Some("g-yes"), "b"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let yes = ctx.lookup_port("g-yes").unwrap();
    let expected = GraphExpr::sequence(
        GraphExpr::Port(yes),
        GraphExpr::parallel(vec![
            GraphExpr::Node(ctx.lookup_node("a").unwrap()),
            GraphExpr::Node(ctx.lookup_node("b").unwrap()),
        ]),
    );
    assert_eq!(expr, expected);
}

#[test]
fn branches_reconverge_through_shared_terminal() {
    let ctx = context(&[
        branch("g", &[("g-yes", "yes"), ("g-no", "no")]),
        task("a"),
        task("b"),
        task("c"),
    ]);
    let edges = [
        edge("e1", ENTRY, None, "g"),
        edge("e2", "g", Some("g-yes"), "a"),
        edge("e3", "g", Some("g-no"), "b"),
        edge("e4", "a", None, "c"),
        edge("e5", "b", None, "c"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let yes = ctx.lookup_port("g-yes").unwrap();
    let no = ctx.lookup_port("g-no").unwrap();
    let (g, a, b, c) = (
        ctx.lookup_node("g").unwrap(),
        ctx.lookup_node("a").unwrap(),
        ctx.lookup_node("b").unwrap(),
        ctx.lookup_node("c").unwrap(),
    );
    let expected = GraphExpr::sequence(
        GraphExpr::parallel(vec![
            GraphExpr::sequence(GraphExpr::Port(yes), GraphExpr::Node(a)),
            GraphExpr::sequence(GraphExpr::Port(no), GraphExpr::Node(b)),
        ]),
        GraphExpr::Node(c),
    );
    assert_eq!(expr, expected);
    assert_eq!(
        SdkRenderer::new(&ctx).render_graph(&expr),
        "[G.port(\"yes\") >> A, G.port(\"no\") >> B] >> C",
    );

    // Soundness: the flattened edge set matches the input edge set.
    assert_eq!(expr.entry_nodes(&ctx), vec![g]);
    let expected_edges: HashSet<FlatEdge> = [
        FlatEdge { source: g, port: Some(yes), target: a },
        FlatEdge { source: g, port: Some(no), target: b },
        FlatEdge { source: a, port: None, target: c },
        FlatEdge { source: b, port: None, target: c },
    ]
    .into_iter()
    .collect();
    assert_eq!(flat_set(&ctx, &expr), expected_edges);
}

#[test]
fn dangling_edges_are_silently_excluded() {
    let ctx = context(&[task("a"), task("b")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "a", None, "ghost"),
        edge("e3", "a", None, "b"),
        edge("e4", "phantom", None, "b"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();
    let expected = GraphExpr::sequence(
        GraphExpr::Node(ctx.lookup_node("a").unwrap()),
        GraphExpr::Node(ctx.lookup_node("b").unwrap()),
    );
    assert_eq!(expr, expected);
}

#[test]
fn nodes_unreachable_from_the_entrypoint_are_excluded() {
    let ctx = context(&[task("a"), task("d"), task("e")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "d", None, "e"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();
    assert_eq!(expr, GraphExpr::Node(ctx.lookup_node("a").unwrap()));
}

#[test]
fn unknown_source_port_is_fatal() {
    let ctx = context(&[task("a"), task("b")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "a", Some("nope"), "b"),
    ];
    let err = compile_graph(&ctx, ENTRY, &edges).unwrap_err();
    assert!(matches!(err, CompileError::PortNotFound(id) if id == "nope"));
}

#[test]
fn port_of_another_node_is_fatal() {
    let ctx = context(&[task("a"), task("b")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        // b's default port id used on an edge leaving a
        edge("e2", "a", Some("b:default"), "b"),
    ];
    let err = compile_graph(&ctx, ENTRY, &edges).unwrap_err();
    assert!(matches!(err, CompileError::PortNotFound(id) if id == "b:default"));
}

#[test]
fn note_nodes_never_participate_in_sequences() {
    let mut sticky = task("sticky");
    sticky.kind = NodeKind::Note;
    let ctx = context(&[task("a"), sticky]);

    // A note with no edges simply never shows up.
    let edges = [edge("e1", ENTRY, None, "a")];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();
    assert_eq!(expr, GraphExpr::Node(ctx.lookup_node("a").unwrap()));

    // An edge leaving a note cannot resolve a port.
    let edges = [
        edge("e1", ENTRY, None, "sticky"),
        edge("e2", "sticky", None, "a"),
    ];
    let err = compile_graph(&ctx, ENTRY, &edges).unwrap_err();
    assert!(matches!(err, CompileError::PortNotFound(_)));
}

#[test]
fn compilation_is_deterministic() {
    let nodes = [
        branch("g", &[("g-yes", "yes"), ("g-no", "no")]),
        task("a"),
        task("b"),
        task("c"),
    ];
    let edges = [
        edge("e1", ENTRY, None, "g"),
        edge("e2", "g", Some("g-yes"), "a"),
        edge("e3", "g", Some("g-no"), "b"),
        edge("e4", "a", None, "c"),
        edge("e5", "b", None, "c"),
    ];
    let ctx = context(&nodes);
    let first = compile_graph(&ctx, ENTRY, &edges).unwrap();
    let second = compile_graph(&ctx, ENTRY, &edges).unwrap();
    assert_eq!(first, second);
}

#[test]
fn mid_chain_fan_out() {
    let ctx = context(&[task("a"), task("b"), task("c"), task("d")]);
    let edges = [
        edge("e1", ENTRY, None, "a"),
        edge("e2", "a", None, "b"),
        edge("e3", "b", None, "c"),
        edge("e4", "b", None, "d"),
    ];
    let expr = compile_graph(&ctx, ENTRY, &edges).unwrap();

    let (a, b, c, d) = (
        ctx.lookup_node("a").unwrap(),
        ctx.lookup_node("b").unwrap(),
        ctx.lookup_node("c").unwrap(),
        ctx.lookup_node("d").unwrap(),
    );
    let expected = GraphExpr::sequence(
        GraphExpr::Node(a),
        GraphExpr::sequence(
            GraphExpr::Node(b),
            GraphExpr::parallel(vec![GraphExpr::Node(c), GraphExpr::Node(d)]),
        ),
    );
    assert_eq!(expr, expected);
    assert_eq!(SdkRenderer::new(&ctx).render_graph(&expr), "A >> B >> [C, D]");
}
