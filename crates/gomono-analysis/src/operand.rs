//! Operands: the intermediate values expression checking passes around.

use std::fmt;

use gomono_common::span::Span;
use gomono_syntax::ast::{Expr, P};

use crate::obj::Builtin;
use crate::objects::{TCObjects, TypeKey};
use crate::typ;

/// Addressing mode of an operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandMode {
    Invalid,
    /// Result of a call without results.
    NoValue,
    Builtin(Builtin),
    TypeExpr,
    /// A literal or predeclared constant; the type is untyped or basic.
    Constant,
    /// An addressable variable.
    Variable,
    MapIndex,
    Value,
    /// A value that may be used in a comma-ok assignment.
    CommaOk,
}

impl OperandMode {
    pub fn is_value(self) -> bool {
        matches!(
            self,
            OperandMode::Constant
                | OperandMode::Variable
                | OperandMode::MapIndex
                | OperandMode::Value
                | OperandMode::CommaOk
        )
    }
}

impl fmt::Display for OperandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperandMode::Invalid => "invalid operand",
            OperandMode::NoValue => "no value",
            OperandMode::Builtin(_) => "built-in",
            OperandMode::TypeExpr => "type",
            OperandMode::Constant => "constant",
            OperandMode::Variable => "variable",
            OperandMode::MapIndex => "map index expression",
            OperandMode::Value => "value",
            OperandMode::CommaOk => "comma, ok expression",
        })
    }
}

#[derive(Clone, Debug)]
pub struct Operand {
    pub mode: OperandMode,
    pub typ: Option<TypeKey>,
    /// The expression the operand was computed from.
    pub expr: Option<P<Expr>>,
    pub span: Span,
    /// Leading type arguments of a partially instantiated generic function,
    /// e.g. `f[int]` when `f` has two type parameters.
    pub partial_targs: Option<Vec<TypeKey>>,
}

impl Default for Operand {
    fn default() -> Self {
        Self::new()
    }
}

impl Operand {
    pub fn new() -> Operand {
        Operand {
            mode: OperandMode::Invalid,
            typ: None,
            expr: None,
            span: Span::dummy(),
            partial_targs: None,
        }
    }

    pub fn with_mode(mode: OperandMode, typ: Option<TypeKey>) -> Operand {
        Operand {
            mode,
            typ,
            ..Operand::new()
        }
    }

    pub fn invalid(&self) -> bool {
        self.mode == OperandMode::Invalid
    }

    pub fn set_invalid(&mut self) {
        self.mode = OperandMode::Invalid;
        self.partial_targs = None;
    }

    pub fn is_nil(&self, objs: &TCObjects) -> bool {
        self.mode == OperandMode::Value
            && self.typ.is_some_and(|t| {
                objs.types[t]
                    .try_as_basic()
                    .is_some_and(|b| b.typ() == typ::BasicType::UntypedNil)
            })
    }

    /// Operand type, or the invalid type.
    pub fn typ_or_invalid(&self, objs: &TCObjects) -> TypeKey {
        self.typ.unwrap_or_else(|| objs.universe().invalid())
    }

    /// Human readable description used in diagnostics, e.g.
    /// `variable of type []int`.
    pub fn describe(&self, objs: &TCObjects) -> String {
        match (self.mode, self.typ) {
            (OperandMode::Invalid, _) | (OperandMode::NoValue, _) | (OperandMode::Builtin(_), _) => {
                self.mode.to_string()
            }
            (OperandMode::TypeExpr, Some(t)) => format!("type {}", typ::type_string(t, objs)),
            (mode, Some(t)) => format!("{} of type {}", mode, typ::type_string(t, objs)),
            (mode, None) => mode.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typ::BasicType;

    #[test]
    fn test_describe() {
        let objs = TCObjects::new();
        let int = objs.universe().basic(BasicType::Int);
        let x = Operand::with_mode(OperandMode::Variable, Some(int));
        assert_eq!(x.describe(&objs), "variable of type int");
        let t = Operand::with_mode(OperandMode::TypeExpr, Some(int));
        assert_eq!(t.describe(&objs), "type int");
        assert_eq!(Operand::new().describe(&objs), "invalid operand");
    }

    #[test]
    fn test_nil_operand() {
        let objs = TCObjects::new();
        let nil = objs.universe().basic(BasicType::UntypedNil);
        let x = Operand::with_mode(OperandMode::Value, Some(nil));
        assert!(x.is_nil(&objs));
        assert!(!OperandMode::NoValue.is_value());
    }
}
