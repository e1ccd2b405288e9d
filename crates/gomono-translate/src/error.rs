//! Failures of the monomorphizer.
//!
//! Error code range 3000-3099. A failure drops the declaration being
//! produced; sibling declarations and queued instances are still emitted.

use gomono_common::diagnostics::Diagnostic;
use gomono_common::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The generic object has no declaration syntax to copy.
    #[error("no declaration for generic {name}")]
    MissingDecl { name: String, span: Span },
    /// A type with no syntactic form, e.g. a leftover type parameter.
    #[error("cannot express type {typ} in syntax")]
    Unrepresentable { typ: String, span: Span },
    /// A node the checker did not annotate.
    #[error("no type recorded for {what}")]
    Unresolved { what: String, span: Span },
    #[error("got {got} type arguments but {name} has {want} type parameters")]
    Arity {
        name: String,
        got: usize,
        want: usize,
        span: Span,
    },
}

impl TranslateError {
    pub fn code(&self) -> u16 {
        match self {
            TranslateError::MissingDecl { .. } => 3000,
            TranslateError::Unrepresentable { .. } => 3001,
            TranslateError::Unresolved { .. } => 3002,
            TranslateError::Arity { .. } => 3003,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TranslateError::MissingDecl { span, .. }
            | TranslateError::Unrepresentable { span, .. }
            | TranslateError::Unresolved { span, .. }
            | TranslateError::Arity { span, .. } => *span,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_label(gomono_common::diagnostics::Label::primary(self.span()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_carries_code_and_span() {
        let err = TranslateError::Unrepresentable {
            typ: "T".to_string(),
            span: Span::from_u32(4, 5),
        };
        let diag = err.diagnostic();
        assert_eq!(diag.message, "cannot express type T in syntax");
        assert_eq!(diag.code, Some(3001));
        assert_eq!(diag.primary_span(), Some(Span::from_u32(4, 5)));
        assert!(diag.is_error());
    }

    #[test]
    fn test_arity_message() {
        let err = TranslateError::Arity {
            name: "Map".to_string(),
            got: 1,
            want: 2,
            span: Span::dummy(),
        };
        assert_eq!(err.to_string(), "got 1 type arguments but Map has 2 type parameters");
        assert_eq!(err.code(), 3003);
    }
}
