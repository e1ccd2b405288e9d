//! # gomono-common
//!
//! Infrastructure shared by the generics checker and the monomorphizer:
//! source spans, interned symbols, diagnostics and trace configuration.

pub mod config;
pub mod diagnostics;
pub mod source;
pub mod span;
pub mod symbol;

pub use config::TraceConfig;
pub use diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticSink, Label, Severity};
pub use source::{FileId, SourceFile, SourceMap};
pub use span::{BytePos, Span};
pub use symbol::{Symbol, SymbolInterner};
