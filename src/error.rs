//! # Compiler Errors
//!
//! Error types shared by the graph compiler, the node/port context,
//! and the pointer resolver.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while compiling a workflow graph.
///
/// None of these are caught internally; every failure propagates to the
/// caller, which decides whether to abort the whole run or record the
/// failure for one workflow and continue with the rest.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A referenced node id is not registered in the graph context.
    ///
    /// Dangling edge endpoints are the one exception: the compiler skips
    /// them silently instead of raising this.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A referenced port id does not resolve on the expected node.
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// A node was registered twice under the same id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// Two ports were indexed under the same id.
    #[error("duplicate port id: {0}")]
    DuplicatePort(String),

    /// An edge has no unique attachment point in the current expression.
    #[error("edge {edge} has no unique attachment point in the graph expression")]
    AmbiguousMerge {
        /// Id of the edge that could not be merged.
        edge: String,
    },

    /// An unrecognized node kind or port configuration.
    ///
    /// This is an exhaustiveness error in the document layer, not a data
    /// error the compiler can work around.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),
}
