//! # gomono-translate
//!
//! Monomorphization of checked generic packages.
//!
//! The translator takes a file accepted by [`gomono_analysis::Checker`] and
//! produces an equivalent file with no generic declarations. Every distinct
//! instantiation of a generic function or type becomes an ordinary
//! declaration with a synthetic name (see [`naming`]), methods of generic
//! types are copied along with each type instance, and all uses are
//! rewritten to refer to the instances.
//!
//! # Example
//!
//! ```ignore
//! use gomono_translate::Translator;
//!
//! let (interner, ids) = builder.into_parts();
//! let mut checker = Checker::new(interner, TraceConfig::default());
//! checker.check_file(&file)?;
//! let out = Translator::new(&mut checker, &ids, TraceConfig::default()).translate_file(&file);
//! ```

pub mod error;
mod fold;
pub mod naming;
pub mod translator;
pub mod type_args;

pub use error::TranslateError;
pub use naming::{instance_name, InstanceKey, Registry};
pub use translator::{DeclId, TranslateOutput, Translator};
pub use type_args::TypeArgs;
