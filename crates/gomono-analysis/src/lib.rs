//! # gomono-analysis
//!
//! Type model and checker for generic Go-like packages.
//!
//! The checker records, for every expression, its mode and type
//! ([`TypeInfo`]), the objects identifiers denote, and the type arguments
//! inferred or given at each generic call or instantiation. Generic named
//! types are instantiated through a per-session cache so that equal type
//! arguments always yield the same instance.
//!
//! # Example
//!
//! ```ignore
//! use gomono_analysis::Checker;
//! use gomono_common::TraceConfig;
//!
//! let mut checker = Checker::new(interner, TraceConfig::default());
//! match checker.check_file(&file) {
//!     Ok(_) => { /* checker.type_info() describes the package */ }
//!     Err(err) => { /* checker.take_diagnostics() explains why */ }
//! }
//! ```

pub mod arena;
pub mod check;
pub mod lookup;
pub mod obj;
pub mod objects;
pub mod operand;
pub mod package;
pub mod scope;
pub mod typ;
pub mod universe;

pub use check::{
    CheckError, Checker, InferError, Inferred, InstantiateError, SubstMap, TypeAndValue, TypeError,
    TypeInfo,
};
pub use lookup::{lookup_field_or_method, LookupResult};
pub use obj::{Builtin, EntityType, LangObj};
pub use objects::{ObjKey, PackageKey, ScopeKey, TCObjects, TypeKey};
pub use operand::{Operand, OperandMode};
pub use typ::{BasicType, Type};
