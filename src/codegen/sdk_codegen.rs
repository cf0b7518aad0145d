//! # SDK Expression Renderer
//!
//! Renders a compiled [`GraphExpr`] into the SDK's graph-wiring
//! statement and a resolved [`PointerExpr`] into the SDK's
//! value-reference expression.
//!
//! Only topology and references are rendered here; per-node class
//! bodies and rich literal values are the emitter's concern. Constant
//! literals pass through in their JSON text form.

use crate::context::GraphContext;
use crate::expr::GraphExpr;
use crate::pointer::PointerExpr;

/// Renderer over one workflow's node/port context.
pub struct SdkRenderer<'a> {
    ctx: &'a GraphContext,
}

impl<'a> SdkRenderer<'a> {
    /// Creates a renderer for one compiled workflow.
    pub fn new(ctx: &'a GraphContext) -> Self {
        Self { ctx }
    }

    /// Renders a graph expression as the SDK's wiring statement.
    ///
    /// Sequences chain with `>>`, parallel sets render as `[a, b]`, and
    /// named ports render as `Class.port("name")`. An empty expression
    /// renders as an empty string.
    pub fn render_graph(&self, expr: &GraphExpr) -> String {
        match expr {
            GraphExpr::Empty => String::new(),
            GraphExpr::Node(n) => self.ctx.node(*n).class_name.clone(),
            GraphExpr::Port(p) => {
                let port = self.ctx.port(*p);
                format!(
                    "{}.port(\"{}\")",
                    self.ctx.node(port.owner).class_name,
                    port.name,
                )
            }
            GraphExpr::Sequence(lhs, rhs) => {
                format!("{} >> {}", self.render_graph(lhs), self.render_graph(rhs))
            }
            GraphExpr::Parallel(members) => {
                let rendered: Vec<String> =
                    members.iter().map(|member| self.render_graph(member)).collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }

    /// Renders a resolved input pointer as the SDK's value reference.
    ///
    /// Fallback chains render as `a.coalesce(b)`; the empty slot renders
    /// as the SDK's absent-value form.
    pub fn render_pointer(&self, expr: &PointerExpr) -> String {
        match expr {
            PointerExpr::NoValue => "None".to_string(),
            PointerExpr::Constant(value) => value.to_string(),
            PointerExpr::NodeOutput { node, output } => format!(
                "{}.output(\"{}\")",
                self.ctx.node(*node).class_name,
                output,
            ),
            PointerExpr::WorkflowInput(name) => format!("workflow_input(\"{name}\")"),
            PointerExpr::Secret(name) => format!("secret(\"{name}\")"),
            PointerExpr::InvocationCount(node) => {
                format!("{}.invocation_count()", self.ctx.node(*node).class_name)
            }
            PointerExpr::Coalesce(lhs, rhs) => format!(
                "{}.coalesce({})",
                self.render_pointer(lhs),
                self.render_pointer(rhs),
            ),
        }
    }
}
