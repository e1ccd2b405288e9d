//! Results of type checking, keyed by syntax node ids.

use std::collections::HashMap;

use gomono_syntax::ast::{ExprId, IdentId, TypeExprId};

use crate::objects::{ObjKey, TypeKey};
use crate::operand::OperandMode;

/// Mode and type of a checked expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAndValue {
    pub mode: OperandMode,
    pub typ: TypeKey,
}

impl TypeAndValue {
    pub fn new(mode: OperandMode, typ: TypeKey) -> Self {
        TypeAndValue { mode, typ }
    }
}

/// Type arguments and instantiated signature of a generic function use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inferred {
    pub targs: Vec<TypeKey>,
    pub sig: TypeKey,
}

#[derive(Debug, Default)]
pub struct TypeInfo {
    /// Types of expressions.
    pub types: HashMap<ExprId, TypeAndValue>,
    /// Resolved types of type expressions.
    pub type_exprs: HashMap<TypeExprId, TypeKey>,
    /// Identifiers that declare objects.
    pub defs: HashMap<IdentId, ObjKey>,
    /// Identifiers that refer to objects.
    pub uses: HashMap<IdentId, ObjKey>,
    /// Generic function uses: explicit instantiations `f[int]` are keyed by
    /// the index expression, calls completed by inference by the call.
    pub inferred: HashMap<ExprId, Inferred>,
}

impl TypeInfo {
    pub fn new() -> TypeInfo {
        TypeInfo::default()
    }

    pub fn record_type(&mut self, id: ExprId, mode: OperandMode, typ: TypeKey) {
        self.types.insert(id, TypeAndValue::new(mode, typ));
    }

    pub fn record_type_expr(&mut self, id: TypeExprId, typ: TypeKey) {
        self.type_exprs.insert(id, typ);
    }

    pub fn record_def(&mut self, id: IdentId, obj: ObjKey) {
        self.defs.insert(id, obj);
    }

    pub fn record_use(&mut self, id: IdentId, obj: ObjKey) {
        self.uses.insert(id, obj);
    }

    pub fn record_inferred(&mut self, id: ExprId, targs: Vec<TypeKey>, sig: TypeKey) {
        self.inferred.insert(id, Inferred { targs, sig });
    }

    pub fn expr_type(&self, id: ExprId) -> Option<TypeKey> {
        self.types.get(&id).map(|tv| tv.typ)
    }

    /// Object an identifier declares or refers to.
    pub fn object_of(&self, id: IdentId) -> Option<ObjKey> {
        self.defs.get(&id).or_else(|| self.uses.get(&id)).copied()
    }
}
