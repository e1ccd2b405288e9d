//! # gomono-syntax
//!
//! The syntax tree consumed by the generics checker and produced by the
//! monomorphizer. Trees are built with [`builder::AstBuilder`]; there is no
//! parser in this crate.
//!
//! Child nodes are reference counted ([`ast::P`]) so that a rewritten tree
//! can share every subtree it did not change with the original.

pub mod ast;
pub mod builder;
pub mod visit;

pub use ast::*;
pub use builder::AstBuilder;
pub use visit::Visitor;
