//! Diagnostic codes of the checker and the fatal per-site failures.
//!
//! Error code ranges:
//! - 2000-2099: Invalid operation errors
//! - 2100-2199: Generic instantiation and inference errors
//! - 2200-2299: Declaration/Scope errors
//! - 2300-2399: Function call errors
//! - 2400-2499: Type expression errors
//! - 2500-2599: Selector and statement errors
//! - 2900-2999: Soft errors (checking continues with a best-effort result)

use gomono_common::diagnostics::{Diagnostic, Label};
use gomono_common::span::Span;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TypeError {
    // === Invalid Operation (2000-2099) ===
    InvalidOp = 2000,
    CannotIndex = 2001,
    CannotSlice = 2002,
    CannotDereference = 2003,
    InvalidCompositeLitType = 2004,
    TypeAssertNotInterface = 2005,

    // === Generics (2100-2199) ===
    /// Wrong number of type arguments.
    ArityMismatch = 2100,
    /// A type parameter could not be inferred.
    CannotInfer = 2101,
    /// An argument's type does not match the parameter it is passed to.
    InferenceConflict = 2102,
    /// Type arguments given to something without type parameters.
    NotGeneric = 2103,
    /// A generic type used without instantiation.
    MissingTypeArgs = 2104,
    /// A generic function used as a value without instantiation.
    GenericFuncValue = 2105,

    // === Declaration/Scope (2200-2299) ===
    DuplicateMethod = 2200,
    NotAnInterface = 2201,
    Undeclared = 2202,
    Redeclared = 2203,
    IllegalCycle = 2204,
    BlankAsValue = 2205,
    InvalidReceiver = 2206,
    MethodRedeclared = 2207,

    // === Function Call (2300-2399) ===
    CannotCall = 2300,
    WrongArgCount = 2301,
    SpreadNonVariadic = 2302,
    BuiltinArgCount = 2303,

    // === Type Expression (2400-2499) ===
    NotAType = 2400,
    NotAnExpr = 2401,
    InvalidArrayLen = 2402,

    // === Selector/Statement (2500-2599) ===
    MissingFieldOrMethod = 2500,
    CannotRange = 2501,
    AssignmentMismatch = 2502,
    NonNameInShortDecl = 2503,

    // === Soft (2900-2999) ===
    /// A type argument does not satisfy its parameter's constraint.
    BoundViolation = 2900,
}

impl TypeError {
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Soft errors are reported but do not stop the site from producing a
    /// result.
    #[inline]
    pub fn is_soft(self) -> bool {
        self.code() >= 2900
    }

    pub fn message(self) -> &'static str {
        match self {
            TypeError::InvalidOp => "invalid operation",
            TypeError::CannotIndex => "cannot index expression",
            TypeError::CannotSlice => "cannot slice expression",
            TypeError::CannotDereference => "cannot dereference non-pointer",
            TypeError::InvalidCompositeLitType => "invalid composite literal type",
            TypeError::TypeAssertNotInterface => "type assertion requires interface type",

            TypeError::ArityMismatch => "wrong number of type arguments",
            TypeError::CannotInfer => "cannot infer type arguments",
            TypeError::InferenceConflict => "argument type does not match parameter",
            TypeError::NotGeneric => "not a generic type or function",
            TypeError::MissingTypeArgs => "cannot use generic type without instantiation",
            TypeError::GenericFuncValue => "cannot use generic function without instantiation",

            TypeError::DuplicateMethod => "duplicate method",
            TypeError::NotAnInterface => "is not an interface",
            TypeError::Undeclared => "undeclared name",
            TypeError::Redeclared => "redeclared in this block",
            TypeError::IllegalCycle => "illegal cycle in declaration",
            TypeError::BlankAsValue => "cannot use _ as value or type",
            TypeError::InvalidReceiver => "invalid receiver",
            TypeError::MethodRedeclared => "method already declared",

            TypeError::CannotCall => "cannot call non-function",
            TypeError::WrongArgCount => "wrong number of arguments in call",
            TypeError::SpreadNonVariadic => "cannot use ... in call to non-variadic function",
            TypeError::BuiltinArgCount => "wrong number of arguments for builtin",

            TypeError::NotAType => "not a type",
            TypeError::NotAnExpr => "is not an expression",
            TypeError::InvalidArrayLen => "array length must be a non-negative integer constant",

            TypeError::MissingFieldOrMethod => "missing field or method",
            TypeError::CannotRange => "cannot range over expression",
            TypeError::AssignmentMismatch => "assignment mismatch",
            TypeError::NonNameInShortDecl => "non-name on left side of :=",

            TypeError::BoundViolation => "type argument does not satisfy constraint",
        }
    }

    /// Creates a diagnostic with this error code (no location). Soft errors
    /// are still errors.
    pub fn diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.message()).with_code(self.code())
    }

    pub fn with_message(self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message).with_code(self.code())
    }

    pub fn at(self, span: impl Into<Span>) -> Diagnostic {
        self.diagnostic().with_label(Label::primary(span))
    }

    pub fn at_with_message(self, span: impl Into<Span>, message: impl Into<String>) -> Diagnostic {
        self.with_message(message).with_label(Label::primary(span))
    }
}

// ----------------------------------------------------------------------------
// Fatal per-site failures

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstantiateError {
    #[error("got {got} arguments but {want} type parameters")]
    Arity { got: usize, want: usize, span: Span },
    #[error("{name} is not a generic type")]
    NotGeneric { name: String, span: Span },
}

impl InstantiateError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            InstantiateError::Arity { span, .. } => {
                TypeError::ArityMismatch.at_with_message(*span, self.to_string())
            }
            InstantiateError::NotGeneric { span, .. } => {
                TypeError::NotGeneric.at_with_message(*span, self.to_string())
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferError {
    /// The argument at `span` cannot be unified with its parameter.
    #[error("{message}")]
    Conflict { message: String, span: Span },
    #[error("cannot infer {name} (declared at {declared})")]
    CannotInfer { name: String, declared: Span, span: Span },
    /// An argument was invalid; it has been reported already.
    #[error("invalid argument")]
    InvalidArgument,
}

impl InferError {
    /// `None` when the failure has been reported elsewhere.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            InferError::Conflict { span, .. } => {
                Some(TypeError::InferenceConflict.at_with_message(*span, self.to_string()))
            }
            InferError::CannotInfer { declared, span, .. } => Some(
                TypeError::CannotInfer
                    .at_with_message(*span, self.to_string())
                    .with_label(Label::secondary(*declared).with_message("type parameter declared here")),
            ),
            InferError::InvalidArgument => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("duplicate method {name}")]
    DuplicateMethod { name: String, span: Span, other: Span },
    #[error("{typ} is not an interface")]
    NotAnInterface { typ: String, span: Span },
}

impl InterfaceError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            InterfaceError::DuplicateMethod { span, other, .. } => {
                let d = TypeError::DuplicateMethod.at_with_message(*span, self.to_string());
                if other.is_dummy() {
                    d
                } else {
                    d.with_label(Label::secondary(*other).with_message("other declaration of"))
                }
            }
            InterfaceError::NotAnInterface { span, .. } => {
                TypeError::NotAnInterface.at_with_message(*span, self.to_string())
            }
        }
    }
}

/// Outcome of checking a whole file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("type checking failed with {0} error(s)")]
    CheckFailed(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_ranges() {
        assert_eq!(TypeError::InvalidOp.code(), 2000);
        assert_eq!(TypeError::ArityMismatch.code(), 2100);
        assert_eq!(TypeError::CannotInfer.code(), 2101);
        assert_eq!(TypeError::InferenceConflict.code(), 2102);
        assert_eq!(TypeError::DuplicateMethod.code(), 2200);
        assert_eq!(TypeError::NotAnInterface.code(), 2201);
        assert_eq!(TypeError::CannotCall.code(), 2300);
        assert_eq!(TypeError::NotAType.code(), 2400);
        assert_eq!(TypeError::MissingFieldOrMethod.code(), 2500);
        assert_eq!(TypeError::BoundViolation.code(), 2900);
    }

    #[test]
    fn test_is_soft() {
        assert!(TypeError::BoundViolation.is_soft());
        assert!(!TypeError::ArityMismatch.is_soft());
        assert!(!TypeError::CannotInfer.is_soft());
        assert!(TypeError::BoundViolation.diagnostic().is_error());
    }

    #[test]
    fn test_diagnostic_creation() {
        let diag = TypeError::CannotInfer.diagnostic();
        assert_eq!(diag.code, Some(2101));
        assert_eq!(diag.message, "cannot infer type arguments");

        let diag = TypeError::Undeclared.at_with_message(Span::from_u32(3, 5), "undeclared name: x");
        assert_eq!(diag.message, "undeclared name: x");
        assert_eq!(diag.primary_span(), Some(Span::from_u32(3, 5)));
    }

    #[test]
    fn test_fatal_errors_render() {
        let err = InstantiateError::Arity {
            got: 1,
            want: 2,
            span: Span::from_u32(0, 4),
        };
        assert_eq!(err.to_string(), "got 1 arguments but 2 type parameters");
        assert_eq!(err.diagnostic().code, Some(2100));

        assert!(InferError::InvalidArgument.diagnostic().is_none());

        let dup = InterfaceError::DuplicateMethod {
            name: "M".to_string(),
            span: Span::from_u32(10, 11),
            other: Span::from_u32(4, 5),
        };
        let diag = dup.diagnostic();
        assert_eq!(diag.message, "duplicate method M");
        assert_eq!(diag.labels.len(), 2);
    }
}
