//! # Workflow Code Generation
//!
//! Rendering of compiled graph expressions and resolved input pointers
//! into workflow-SDK source fragments.

mod sdk_codegen;

pub use sdk_codegen::*;
