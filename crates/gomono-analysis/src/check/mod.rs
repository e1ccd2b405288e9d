//! The checker.
//!
//! Checking runs in phases over a single file: package-level objects are
//! collected, type declarations and function signatures are resolved, and
//! function bodies are checked last. Instance placeholders created while
//! declarations are still being resolved are expanded by delayed actions
//! at the end of the signature phase.

mod call;
pub(crate) mod checker;
mod decl;
pub mod errors;
mod expr;
pub mod format;
mod infer;
mod interface;
mod stmt;
mod subst;
pub mod type_info;
mod typexpr;
mod unify;

pub use checker::{Checker, DeclInfo, ObjContext};
pub use errors::{CheckError, InferError, InstantiateError, InterfaceError, TypeError};
pub use infer::is_parameterized;
pub use subst::SubstMap;
pub use type_info::{Inferred, TypeAndValue, TypeInfo};
