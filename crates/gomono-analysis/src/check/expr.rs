//! Expression checking.
//!
//! Every checked expression has its mode and type recorded in the
//! [`TypeInfo`](super::type_info::TypeInfo). Untyped constant expressions
//! are recorded with their untyped type first and updated once the context
//! fixes their final type.

use gomono_common::span::Span;
use gomono_syntax::ast::{BinaryOp, CompositeLit, Expr, ExprKind, Ident, LitKind, TypeExpr, UnaryOp, P};

use super::checker::Checker;
use super::errors::TypeError;
use super::format;
use crate::lookup::{lookup_field_or_method, LookupResult};
use crate::obj::EntityType;
use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, BasicInfo, BasicType, SignatureDetail, Type};

/// Shape of a composite literal's type.
enum LitShape {
    Struct(Vec<ObjKey>),
    Elems(TypeKey),
    Map(TypeKey, TypeKey),
    Invalid,
    Other,
}

impl Checker {
    /// Checks `e` as a single value.
    pub fn expr(&mut self, e: &P<Expr>) -> Operand {
        let mut x = self.raw_expr(e, false);
        self.exclude(&mut x, true);
        self.single_value(&mut x);
        x
    }

    /// Checks `e` as a value that may be a tuple of several values.
    pub(crate) fn multi_expr(&mut self, e: &P<Expr>) -> Operand {
        let mut x = self.raw_expr(e, false);
        self.exclude(&mut x, true);
        x
    }

    /// Checks `e` as a single value or a type.
    pub(crate) fn expr_or_type(&mut self, e: &P<Expr>) -> Operand {
        let mut x = self.raw_expr(e, false);
        self.exclude(&mut x, false);
        self.single_value(&mut x);
        x
    }

    /// Checks that `e` denotes a type.
    pub(crate) fn type_operand(&mut self, e: &P<Expr>) -> Option<TypeKey> {
        let x = self.expr_or_type(e);
        match x.mode {
            OperandMode::Invalid => None,
            OperandMode::TypeExpr => x.typ,
            _ => {
                let s = self.operand_string(&x);
                self.error_code_msg(TypeError::NotAType, e.span, format!("{} is not a type", s));
                None
            }
        }
    }

    /// Checks `e` and records its mode and type. With `allow_generic` set,
    /// uninstantiated generic functions and types are accepted.
    pub(crate) fn raw_expr(&mut self, e: &P<Expr>, allow_generic: bool) -> Operand {
        self.trace_expr(e);
        let mut x = Operand::new();
        self.expr_internal(&mut x, e);
        x.expr = Some(e.clone());
        x.span = e.span;
        if !allow_generic {
            self.non_generic(&mut x);
        }
        let t = match x.mode {
            OperandMode::Invalid => self.invalid_type(),
            _ => x.typ_or_invalid(&self.tc_objs),
        };
        self.result.record_type(e.id, x.mode, t);
        if self.trace() {
            self.trace_end();
            self.trace_print(&format!("=> {}", x.describe(&self.tc_objs)));
        }
        x
    }

    /// Checks expressions whose values are not needed.
    pub(crate) fn use_exprs(&mut self, list: &[P<Expr>]) {
        for e in list {
            self.raw_expr(e, true);
        }
    }

    fn exclude(&mut self, x: &mut Operand, no_types: bool) {
        let (code, what) = match x.mode {
            OperandMode::NoValue => (TypeError::InvalidOp, "used as value"),
            OperandMode::Builtin(_) => (TypeError::InvalidOp, "must be called"),
            OperandMode::TypeExpr if no_types => (TypeError::NotAnExpr, "is not an expression"),
            _ => return,
        };
        let s = self.expr_string(x);
        self.error_code_msg(code, x.span, format!("{} {}", s, what));
        x.set_invalid();
    }

    fn single_value(&mut self, x: &mut Operand) {
        if !x.mode.is_value() {
            return;
        }
        let Some(t) = x.typ else {
            return;
        };
        if let Some(tuple) = self.tc_objs.types[t].try_as_tuple() {
            if tuple.vars().len() != 1 {
                let s = self.expr_string(x);
                self.error_code_msg(
                    TypeError::InvalidOp,
                    x.span,
                    format!("multiple-value {} in single-value context", s),
                );
                x.set_invalid();
            }
        }
    }

    fn non_generic(&mut self, x: &mut Operand) {
        let Some(t) = x.typ else {
            return;
        };
        let (code, what) = match x.mode {
            OperandMode::TypeExpr if typ::is_generic(t, &self.tc_objs) => (TypeError::MissingTypeArgs, "type"),
            OperandMode::Value if is_generic_sig(t, &self.tc_objs) => (TypeError::GenericFuncValue, "function"),
            _ => return,
        };
        let s = self.expr_string(x);
        self.error_code_msg(code, x.span, format!("cannot use generic {} {} without instantiation", what, s));
        x.set_invalid();
    }

    fn expr_internal(&mut self, x: &mut Operand, e: &P<Expr>) {
        match &e.kind {
            ExprKind::Ident(ident) => self.ident(x, ident),
            ExprKind::BasicLit { kind, .. } => {
                let b = match kind {
                    LitKind::Int => BasicType::UntypedInt,
                    LitKind::Float => BasicType::UntypedFloat,
                    LitKind::Rune => BasicType::UntypedRune,
                    LitKind::String => BasicType::UntypedString,
                };
                x.mode = OperandMode::Constant;
                x.typ = Some(self.universe().basic(b));
            }
            ExprKind::FuncLit { sig, body } => {
                let parent = self.current_scope();
                let scope = self.tc_objs.new_scope(Some(parent), e.span, "function literal", true);
                let t = self.func_type(scope, None, Vec::new(), Vec::new(), sig);
                self.func_body(t, body);
                x.mode = OperandMode::Value;
                x.typ = Some(t);
            }
            ExprKind::CompositeLit(lit) => self.composite_lit(x, lit),
            ExprKind::Paren(inner) => {
                let y = self.raw_expr(inner, true);
                x.mode = y.mode;
                x.typ = y.typ;
                x.partial_targs = y.partial_targs;
            }
            ExprKind::Selector { expr, sel } => self.selector(x, expr, sel),
            ExprKind::Index { expr, indices } => self.index_expr(x, e, expr, indices),
            ExprKind::Slice { expr, low, high } => self.slice_expr(x, expr, low.as_ref(), high.as_ref()),
            ExprKind::TypeAssert { expr, ty } => self.type_assert(x, expr, ty),
            ExprKind::Unary { op, expr } => self.unary(x, *op, expr),
            ExprKind::Binary { op, left, right } => self.binary(x, *op, left, right),
            ExprKind::Call(call) => self.call_expr(x, e, call),
            ExprKind::TypeAsExpr(ty) => {
                let t = self.type_expr(ty);
                if !typ::is_invalid(t, &self.tc_objs) {
                    x.mode = OperandMode::TypeExpr;
                    x.typ = Some(t);
                }
            }
        }
    }

    fn ident(&mut self, x: &mut Operand, ident: &Ident) {
        let name = self.resolve_ident(ident).to_string();
        if name == "_" {
            self.error_code(TypeError::BlankAsValue, ident.span);
            return;
        }
        let Some(obj) = self.lookup(&name) else {
            self.error_code_msg(TypeError::Undeclared, ident.span, format!("undeclared name: {}", name));
            return;
        };
        self.result.record_use(ident.id, obj);

        let mode = match self.tc_objs.lobjs[obj].entity_type().clone() {
            EntityType::TypeName => OperandMode::TypeExpr,
            EntityType::Const => OperandMode::Constant,
            EntityType::Nil => OperandMode::Value,
            EntityType::Builtin(b) => {
                x.mode = OperandMode::Builtin(b);
                x.typ = Some(self.invalid_type());
                return;
            }
            EntityType::Var(_) => OperandMode::Variable,
            EntityType::Func { .. } => OperandMode::Value,
        };
        self.obj_decl(obj);
        match self.tc_objs.lobjs[obj].typ() {
            Some(t) => {
                x.mode = mode;
                x.typ = Some(t);
            }
            None => self.error_code_msg(
                TypeError::IllegalCycle,
                ident.span,
                format!("initialization cycle: {} refers to itself", name),
            ),
        }
    }

    fn composite_lit(&mut self, x: &mut Operand, lit: &CompositeLit) {
        let t = self.type_expr(&lit.ty);
        let u = self.under(t);
        let shape = match &self.tc_objs.types[u] {
            Type::Struct(s) => LitShape::Struct(s.fields().to_vec()),
            Type::Array(a) => LitShape::Elems(a.elem()),
            Type::Slice(s) => LitShape::Elems(s.elem()),
            Type::Map(m) => LitShape::Map(m.key(), m.elem()),
            _ if typ::is_invalid(u, &self.tc_objs) => LitShape::Invalid,
            _ => LitShape::Other,
        };

        match shape {
            LitShape::Struct(fields) => self.struct_lit(lit, &fields),
            LitShape::Elems(elem) => {
                for el in &lit.elems {
                    if let Some(key) = &el.key {
                        self.index_value(key);
                    }
                    let mut v = self.expr(&el.value);
                    self.assignment(&mut v, Some(elem), "array or slice literal");
                }
            }
            LitShape::Map(key_t, elem_t) => {
                for el in &lit.elems {
                    match &el.key {
                        Some(key) => {
                            let mut k = self.expr(key);
                            self.assignment(&mut k, Some(key_t), "map literal");
                        }
                        None => {
                            self.error_code_msg(TypeError::InvalidOp, el.value.span, "missing key in map literal")
                        }
                    }
                    let mut v = self.expr(&el.value);
                    self.assignment(&mut v, Some(elem_t), "map literal");
                }
            }
            LitShape::Invalid => {
                for el in &lit.elems {
                    self.raw_expr(&el.value, true);
                }
                return;
            }
            LitShape::Other => {
                self.error_code_msg(
                    TypeError::InvalidCompositeLitType,
                    lit.ty.span,
                    format!("invalid composite literal type {}", typ::type_string(t, &self.tc_objs)),
                );
                return;
            }
        }
        x.mode = OperandMode::Value;
        x.typ = Some(t);
    }

    fn struct_lit(&mut self, lit: &CompositeLit, fields: &[ObjKey]) {
        if lit.elems.iter().any(|el| el.key.is_some()) {
            for el in &lit.elems {
                let field = match el.key.as_ref().map(|k| &k.kind) {
                    Some(ExprKind::Ident(kid)) => {
                        let name = self.resolve_ident(kid).to_string();
                        let found = fields.iter().copied().find(|f| self.tc_objs.lobjs[*f].name() == name);
                        match found {
                            Some(f) => {
                                self.result.record_use(kid.id, f);
                                Some(f)
                            }
                            None => {
                                self.error_code_msg(
                                    TypeError::MissingFieldOrMethod,
                                    kid.span,
                                    format!("unknown field {} in struct literal", name),
                                );
                                None
                            }
                        }
                    }
                    Some(_) => {
                        self.error_code_msg(TypeError::InvalidOp, el.value.span, "invalid field name in struct literal");
                        None
                    }
                    None => {
                        self.error_code_msg(
                            TypeError::InvalidOp,
                            el.value.span,
                            "mixture of field:value and value elements in struct literal",
                        );
                        None
                    }
                };
                let mut v = self.expr(&el.value);
                if let Some(ft) = field.and_then(|f| self.tc_objs.lobjs[f].typ()) {
                    self.assignment(&mut v, Some(ft), "struct literal");
                }
            }
            return;
        }

        for (i, el) in lit.elems.iter().enumerate() {
            let mut v = self.expr(&el.value);
            if let Some(ft) = fields.get(i).and_then(|f| self.tc_objs.lobjs[*f].typ()) {
                self.assignment(&mut v, Some(ft), "struct literal");
            }
        }
        let n = lit.elems.len();
        if n > 0 && n != fields.len() {
            let msg = if n < fields.len() {
                "too few values in struct literal"
            } else {
                "too many values in struct literal"
            };
            self.error_code_msg(TypeError::InvalidOp, lit.ty.span, msg);
        }
    }

    fn selector(&mut self, x: &mut Operand, base: &P<Expr>, sel: &Ident) {
        let name = self.resolve_ident(sel).to_string();
        let y = self.expr_or_type(base);
        if y.invalid() {
            return;
        }
        let t = self.expand(y.typ_or_invalid(&self.tc_objs));
        let type_str = typ::type_string(t, &self.tc_objs);

        if y.mode == OperandMode::TypeExpr {
            match lookup_field_or_method(t, false, Some(self.pkg), &name, &self.tc_objs) {
                LookupResult::Method { obj, recv, .. } => {
                    self.result.record_use(sel.id, obj);
                    let mt = self.method_type(obj, recv);
                    x.mode = OperandMode::Value;
                    x.typ = Some(self.method_expr_type(t, mt));
                }
                LookupResult::PtrRecvRequired(obj) => {
                    self.result.record_use(sel.id, obj);
                    self.error_code_msg(
                        TypeError::InvalidOp,
                        sel.span,
                        format!(
                            "invalid method expression {}.{} (needs pointer receiver (*{}).{})",
                            type_str, name, type_str, name
                        ),
                    );
                }
                _ => self.error_code_msg(
                    TypeError::MissingFieldOrMethod,
                    sel.span,
                    format!("{}.{} undefined (type {} has no method {})", type_str, name, type_str, name),
                ),
            }
            return;
        }

        let addressable = y.mode == OperandMode::Variable;
        match lookup_field_or_method(t, addressable, Some(self.pkg), &name, &self.tc_objs) {
            LookupResult::Field { obj, indirect, .. } => {
                self.result.record_use(sel.id, obj);
                x.mode = if addressable || indirect {
                    OperandMode::Variable
                } else {
                    OperandMode::Value
                };
                x.typ = self.tc_objs.lobjs[obj].typ();
            }
            LookupResult::Method { obj, recv, .. } => {
                self.result.record_use(sel.id, obj);
                x.mode = OperandMode::Value;
                x.typ = Some(self.method_type(obj, recv));
            }
            LookupResult::PtrRecvRequired(obj) => {
                self.result.record_use(sel.id, obj);
                let s = self.expr_string(&y);
                self.error_code_msg(
                    TypeError::InvalidOp,
                    sel.span,
                    format!("cannot call pointer method {} on {}", name, s),
                );
            }
            LookupResult::Ambiguous(_) => self.error_code_msg(
                TypeError::MissingFieldOrMethod,
                sel.span,
                format!("ambiguous selector {}.{}", self.expr_string(&y), name),
            ),
            LookupResult::NotFound => self.error_code_msg(
                TypeError::MissingFieldOrMethod,
                sel.span,
                format!(
                    "{}.{} undefined (type {} has no field or method {})",
                    self.expr_string(&y),
                    name,
                    type_str,
                    name
                ),
            ),
        }
    }

    /// Function type of the method expression `T.m`: the receiver becomes
    /// the first parameter.
    fn method_expr_type(&mut self, recv: TypeKey, method: TypeKey) -> TypeKey {
        let Some(sig) = self.tc_objs.types[method].try_as_signature() else {
            return self.invalid_type();
        };
        let (params, results, variadic) = (sig.params(), sig.results(), sig.variadic());
        let mut vars = vec![self.tc_objs.new_var(Span::dummy(), Some(self.pkg), String::new(), Some(recv))];
        vars.extend_from_slice(typ::tuple_vars(params, &self.tc_objs));
        let params = self.tc_objs.new_t_tuple(vars);
        self.tc_objs
            .new_t_signature(SignatureDetail::new(None, None, params, results, variadic))
    }

    fn index_expr(&mut self, x: &mut Operand, e: &P<Expr>, base: &P<Expr>, indices: &[P<Expr>]) {
        let mut y = self.raw_expr(base, true);
        if y.invalid() {
            self.use_exprs(indices);
            return;
        }
        let t = y.typ_or_invalid(&self.tc_objs);

        if y.mode == OperandMode::TypeExpr {
            if !typ::is_generic(t, &self.tc_objs) {
                self.error_code_msg(
                    TypeError::NotGeneric,
                    base.span,
                    format!("{} is not a generic type", typ::type_string(t, &self.tc_objs)),
                );
                self.use_exprs(indices);
                return;
            }
            let Some(targs) = self.type_args(indices) else {
                return;
            };
            let poslist: Vec<_> = indices.iter().map(|i| i.span).collect();
            match self.instantiate(e.span, t, &targs, &poslist) {
                Ok(inst) => {
                    x.mode = OperandMode::TypeExpr;
                    x.typ = Some(inst);
                }
                Err(err) => self.emit(err.diagnostic()),
            }
            return;
        }

        if y.mode == OperandMode::Value && is_generic_sig(t, &self.tc_objs) {
            let want = self.tc_objs.types[t].try_as_signature().map_or(0, |s| s.tparams().len());
            let Some(targs) = self.type_args(indices) else {
                return;
            };
            if targs.len() > want {
                let s = self.expr_string(&y);
                self.error_code_msg(
                    TypeError::ArityMismatch,
                    e.span,
                    format!("got {} type arguments but {} has {} type parameters", targs.len(), s, want),
                );
                return;
            }
            if targs.len() < want {
                // completed by inference at the call
                x.mode = OperandMode::Value;
                x.typ = Some(t);
                x.partial_targs = Some(targs);
                return;
            }
            let poslist: Vec<_> = indices.iter().map(|i| i.span).collect();
            match self.instantiate(e.span, t, &targs, &poslist) {
                Ok(sig) => {
                    self.result.record_inferred(e.id, targs, sig);
                    x.mode = OperandMode::Value;
                    x.typ = Some(sig);
                }
                Err(err) => self.emit(err.diagnostic()),
            }
            return;
        }

        self.exclude(&mut y, true);
        self.single_value(&mut y);
        if y.invalid() {
            self.use_exprs(indices);
            return;
        }
        if indices.len() != 1 {
            self.error_code_msg(TypeError::InvalidOp, e.span, "unexpected comma; expecting ]");
            self.use_exprs(indices);
            return;
        }
        let index = &indices[0];

        let u = self.under(t);
        let objs = &self.tc_objs;
        let indexed = match &objs.types[u] {
            Type::Basic(b) if b.info() == BasicInfo::IsString => Some((OperandMode::Value, objs.universe().byte(), None)),
            Type::Array(a) if y.mode == OperandMode::Variable => Some((OperandMode::Variable, a.elem(), None)),
            Type::Array(a) => Some((OperandMode::Value, a.elem(), None)),
            Type::Slice(s) => Some((OperandMode::Variable, s.elem(), None)),
            Type::Map(m) => Some((OperandMode::MapIndex, m.elem(), Some(m.key()))),
            Type::Pointer(p) => objs.types[typ::underlying_type(p.base(), objs)]
                .try_as_array()
                .map(|a| (OperandMode::Variable, a.elem(), None)),
            _ => None,
        };
        let Some((mode, elem, map_key)) = indexed else {
            self.cannot_index(&y, index);
            return;
        };
        match map_key {
            Some(key) => {
                let mut k = self.expr(index);
                self.assignment(&mut k, Some(key), "map index");
            }
            None => self.index_value(index),
        }
        x.mode = mode;
        x.typ = Some(elem);
    }

    fn cannot_index(&mut self, y: &Operand, index: &P<Expr>) {
        let s = self.operand_string(y);
        self.error_code_msg(TypeError::CannotIndex, y.span, format!("cannot index {}", s));
        self.raw_expr(index, true);
    }

    /// Checks type arguments given in index position.
    fn type_args(&mut self, indices: &[P<Expr>]) -> Option<Vec<TypeKey>> {
        let targs: Vec<Option<TypeKey>> = indices.iter().map(|i| self.type_operand(i)).collect();
        targs.into_iter().collect()
    }

    /// Checks an index or slice bound: an integer value.
    pub(crate) fn index_value(&mut self, e: &P<Expr>) {
        let mut x = self.expr(e);
        if x.invalid() {
            return;
        }
        let int = self.universe().basic(BasicType::Int);
        self.convert_untyped(&mut x, int);
        if x.invalid() {
            return;
        }
        if !self.all_of(x.typ_or_invalid(&self.tc_objs), typ::is_integer) {
            let s = self.operand_string(&x);
            self.error_code_msg(TypeError::InvalidOp, e.span, format!("index {} must be integer", s));
        }
    }

    fn slice_expr(&mut self, x: &mut Operand, base: &P<Expr>, low: Option<&P<Expr>>, high: Option<&P<Expr>>) {
        let y = self.expr(base);
        for bound in [low, high].into_iter().flatten() {
            self.index_value(bound);
        }
        if y.invalid() {
            return;
        }
        let t = y.typ_or_invalid(&self.tc_objs);
        let u = self.under(t);
        let objs = &self.tc_objs;
        // Ok: the result type, Err: the element type of a sliced array
        let sliced = match &objs.types[u] {
            Type::Basic(b) if b.info() == BasicInfo::IsString && b.typ().is_untyped() => {
                Some(Ok(objs.universe().basic(BasicType::Str)))
            }
            Type::Basic(b) if b.info() == BasicInfo::IsString => Some(Ok(t)),
            Type::Array(a) if y.mode == OperandMode::Variable => Some(Err(a.elem())),
            Type::Slice(_) => Some(Ok(t)),
            Type::Pointer(p) => objs.types[typ::underlying_type(p.base(), objs)]
                .try_as_array()
                .map(|a| Err(a.elem())),
            _ => None,
        };
        let result = sliced.map(|r| match r {
            Ok(t) => t,
            Err(elem) => self.tc_objs.new_t_slice(elem),
        });
        match result {
            Some(t) => {
                x.mode = OperandMode::Value;
                x.typ = Some(t);
            }
            None => {
                let s = self.operand_string(&y);
                self.error_code_msg(TypeError::CannotSlice, y.span, format!("cannot slice {}", s));
            }
        }
    }

    fn type_assert(&mut self, x: &mut Operand, base: &P<Expr>, ty: &TypeExpr) {
        let y = self.expr(base);
        let t = self.type_expr(ty);
        if y.invalid() || typ::is_invalid(t, &self.tc_objs) {
            return;
        }
        let yt = y.typ_or_invalid(&self.tc_objs);
        if !typ::is_interface(yt, &self.tc_objs) || typ::is_type_param(yt, &self.tc_objs) {
            let s = self.operand_string(&y);
            self.error_code_msg(TypeError::TypeAssertNotInterface, y.span, format!("{} is not an interface", s));
            return;
        }
        if let Some((m, wrong)) = self.missing_method(t, yt, false) {
            let why = if wrong { "wrong type for method" } else { "missing method" };
            self.error_code_msg(
                TypeError::InvalidOp,
                ty.span,
                format!(
                    "impossible type assertion: {} does not implement {} ({} {})",
                    typ::type_string(t, &self.tc_objs),
                    typ::type_string(yt, &self.tc_objs),
                    why,
                    self.tc_objs.lobjs[m].name()
                ),
            );
            return;
        }
        x.mode = OperandMode::CommaOk;
        x.typ = Some(t);
    }

    fn unary(&mut self, x: &mut Operand, op: UnaryOp, inner: &P<Expr>) {
        match op {
            UnaryOp::Addr => {
                let y = self.expr(inner);
                if y.invalid() {
                    return;
                }
                if y.mode != OperandMode::Variable && !is_composite_lit(inner) {
                    let s = self.operand_string(&y);
                    self.error_code_msg(TypeError::InvalidOp, y.span, format!("cannot take address of {}", s));
                    return;
                }
                let t = y.typ_or_invalid(&self.tc_objs);
                x.mode = OperandMode::Value;
                x.typ = Some(self.tc_objs.new_t_pointer(t));
            }
            UnaryOp::Deref => {
                let y = self.expr_or_type(inner);
                if y.invalid() {
                    return;
                }
                let t = y.typ_or_invalid(&self.tc_objs);
                if y.mode == OperandMode::TypeExpr {
                    x.mode = OperandMode::TypeExpr;
                    x.typ = Some(self.tc_objs.new_t_pointer(t));
                    return;
                }
                let u = self.under(t);
                match self.tc_objs.types[u].try_as_pointer().map(|p| p.base()) {
                    Some(base) => {
                        x.mode = OperandMode::Variable;
                        x.typ = Some(base);
                    }
                    None => {
                        let s = self.operand_string(&y);
                        self.error_code_msg(TypeError::CannotDereference, y.span, format!("cannot indirect {}", s));
                    }
                }
            }
            _ => {
                let y = self.expr(inner);
                if y.invalid() {
                    return;
                }
                let t = y.typ_or_invalid(&self.tc_objs);
                let (pred, sym): (fn(TypeKey, &TCObjects) -> bool, &str) = match op {
                    UnaryOp::Neg => (typ::is_numeric, "-"),
                    UnaryOp::Pos => (typ::is_numeric, "+"),
                    UnaryOp::BitNot => (typ::is_integer, "^"),
                    _ => (typ::is_boolean, "!"),
                };
                if !self.all_of(t, pred) {
                    let s = self.operand_string(&y);
                    self.error_code_msg(TypeError::InvalidOp, y.span, format!("operator {} not defined on {}", sym, s));
                    return;
                }
                x.mode = if y.mode == OperandMode::Constant {
                    OperandMode::Constant
                } else {
                    OperandMode::Value
                };
                x.typ = Some(t);
            }
        }
    }

    pub(crate) fn binary(&mut self, x: &mut Operand, op: BinaryOp, left: &P<Expr>, right: &P<Expr>) {
        let mut a = self.expr(left);
        let mut b = self.expr(right);
        if a.invalid() || b.invalid() {
            return;
        }
        let both_constant = a.mode == OperandMode::Constant && b.mode == OperandMode::Constant;
        let result_mode = if both_constant {
            OperandMode::Constant
        } else {
            OperandMode::Value
        };

        if op.is_shift() {
            let uint = self.universe().basic(BasicType::Uint);
            self.convert_untyped(&mut b, uint);
            if b.invalid() {
                return;
            }
            if !self.all_of(b.typ_or_invalid(&self.tc_objs), typ::is_integer) {
                let s = self.operand_string(&b);
                self.error_code_msg(TypeError::InvalidOp, b.span, format!("shift count {} must be integer", s));
                return;
            }
            if !self.all_of(a.typ_or_invalid(&self.tc_objs), typ::is_integer) {
                let s = self.operand_string(&a);
                self.error_code_msg(TypeError::InvalidOp, a.span, format!("shifted operand {} must be integer", s));
                return;
            }
            x.mode = result_mode;
            x.typ = a.typ;
            return;
        }

        self.match_types(&mut a, &mut b);
        if a.invalid() || b.invalid() {
            return;
        }
        if op.is_comparison() {
            self.comparison(x, op, &mut a, &mut b, result_mode);
            return;
        }

        let (at, bt) = (a.typ_or_invalid(&self.tc_objs), b.typ_or_invalid(&self.tc_objs));
        if !typ::identical(at, bt, &self.tc_objs) {
            self.error_code_msg(
                TypeError::InvalidOp,
                a.span.merge(b.span),
                format!(
                    "invalid operation: mismatched types {} and {}",
                    typ::type_string(at, &self.tc_objs),
                    typ::type_string(bt, &self.tc_objs)
                ),
            );
            return;
        }
        let ok = match op {
            BinaryOp::Add => self.all_of(at, |t, objs| typ::is_numeric(t, objs) || typ::is_string(t, objs)),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => self.all_of(at, typ::is_numeric),
            BinaryOp::LogAnd | BinaryOp::LogOr => self.all_of(at, typ::is_boolean),
            _ => self.all_of(at, typ::is_integer),
        };
        if !ok {
            let s = self.operand_string(&a);
            self.error_code_msg(
                TypeError::InvalidOp,
                a.span,
                format!("operator {} not defined on {}", op.as_str(), s),
            );
            return;
        }
        x.mode = result_mode;
        x.typ = Some(at);
    }

    fn comparison(&mut self, x: &mut Operand, op: BinaryOp, a: &mut Operand, b: &mut Operand, mode: OperandMode) {
        let (at, bt) = (a.typ_or_invalid(&self.tc_objs), b.typ_or_invalid(&self.tc_objs));
        let problem = if !self.assignable_to(a, bt) && !self.assignable_to(b, at) {
            Some(format!(
                "mismatched types {} and {}",
                typ::type_string(at, &self.tc_objs),
                typ::type_string(bt, &self.tc_objs)
            ))
        } else if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
            let objs = &self.tc_objs;
            if a.is_nil(objs) || b.is_nil(objs) {
                let other = if a.is_nil(objs) { bt } else { at };
                (!typ::has_nil(other, objs))
                    .then(|| format!("mismatched types {} and untyped nil", typ::type_string(other, objs)))
            } else if !typ::comparable(at, objs) {
                Some(format!("operator {} not defined on {}", op.as_str(), typ::type_string(at, objs)))
            } else {
                None
            }
        } else if !self.all_of(at, typ::is_ordered) {
            Some(format!("operator {} not defined on {}", op.as_str(), typ::type_string(at, &self.tc_objs)))
        } else {
            None
        };
        if let Some(problem) = problem {
            self.error_code_msg(TypeError::InvalidOp, a.span.merge(b.span), format!("invalid operation: {}", problem));
            return;
        }

        // untyped operands of a comparison get their default types
        for y in [a, b] {
            let t = y.typ_or_invalid(&self.tc_objs);
            if typ::is_untyped(t, &self.tc_objs) && !y.is_nil(&self.tc_objs) {
                let d = typ::untyped_default_type(t, &self.tc_objs);
                self.convert_untyped(y, d);
            }
        }
        x.mode = mode;
        x.typ = Some(self.universe().basic(BasicType::UntypedBool));
    }

    /// Converts an untyped operand to the type of the other operand. Two
    /// untyped numeric operands take the larger kind.
    fn match_types(&mut self, a: &mut Operand, b: &mut Operand) {
        let (at, bt) = (a.typ_or_invalid(&self.tc_objs), b.typ_or_invalid(&self.tc_objs));
        let (au, bu) = (typ::is_untyped(at, &self.tc_objs), typ::is_untyped(bt, &self.tc_objs));
        if au && !bu {
            self.convert_untyped(a, bt);
        } else if bu && !au {
            self.convert_untyped(b, at);
        } else if au && bu {
            let (ra, rb) = (untyped_rank(at, &self.tc_objs), untyped_rank(bt, &self.tc_objs));
            if let (Some(ra), Some(rb)) = (ra, rb) {
                if ra < rb {
                    self.set_untyped(a, bt);
                } else if rb < ra {
                    self.set_untyped(b, at);
                }
            }
        }
    }

    fn set_untyped(&mut self, x: &mut Operand, t: TypeKey) {
        x.typ = Some(t);
        if let Some(e) = x.expr.clone() {
            self.update_expr_type(&e, t);
        }
    }

    /// Reports whether `pred` holds for `t`, or for every type a type
    /// parameter `t` admits.
    pub(crate) fn all_of(&mut self, t: TypeKey, pred: impl Fn(TypeKey, &TCObjects) -> bool) -> bool {
        let u = self.under(t);
        match self.tc_objs.types[u].try_as_type_param() {
            Some(p) => {
                let types = typ::bound_interface(p.bound(), &self.tc_objs)
                    .map(|i| i.type_set())
                    .unwrap_or_default();
                !types.is_empty() && types.into_iter().all(|t| pred(t, &self.tc_objs))
            }
            None => pred(u, &self.tc_objs),
        }
    }

    // =========================================================================
    // Assignability and untyped conversion
    // =========================================================================

    /// Checks that `x` can be assigned to a variable of type `target`. With
    /// no target, untyped values take their default type.
    pub(crate) fn assignment(&mut self, x: &mut Operand, target: Option<TypeKey>, context: &str) {
        self.single_value(x);
        if x.invalid() {
            return;
        }
        if !x.mode.is_value() {
            let s = self.expr_string(x);
            self.error_code_msg(TypeError::InvalidOp, x.span, format!("cannot assign {} in {}", s, context));
            x.set_invalid();
            return;
        }

        let xt = x.typ_or_invalid(&self.tc_objs);
        if typ::is_untyped(xt, &self.tc_objs) {
            let to = match target {
                Some(t) => t,
                None if x.is_nil(&self.tc_objs) => {
                    self.error_code_msg(TypeError::InvalidOp, x.span, format!("use of untyped nil in {}", context));
                    x.set_invalid();
                    return;
                }
                None => typ::untyped_default_type(xt, &self.tc_objs),
            };
            self.convert_untyped(x, to);
            if x.invalid() {
                return;
            }
        }
        let Some(t) = target else {
            return;
        };
        if typ::is_invalid(t, &self.tc_objs) {
            return;
        }
        if !self.assignable_to(x, t) {
            let s = self.operand_string(x);
            self.error_code_msg(
                TypeError::InvalidOp,
                x.span,
                format!("cannot use {} as {} value in {}", s, typ::type_string(t, &self.tc_objs), context),
            );
            x.set_invalid();
        }
    }

    /// Reports whether a value `x` is assignable to type `t`.
    pub(crate) fn assignable_to(&mut self, x: &Operand, t: TypeKey) -> bool {
        let v = x.typ_or_invalid(&self.tc_objs);
        if typ::is_invalid(v, &self.tc_objs) || typ::is_invalid(t, &self.tc_objs) {
            return true;
        }
        if typ::identical(v, t, &self.tc_objs) {
            return true;
        }
        let (vu, tu) = (self.under(v), self.under(t));
        let objs = &self.tc_objs;
        if typ::is_untyped(v, objs) {
            return match objs.types[tu].try_as_basic() {
                Some(b) => untyped_fits(v, b.info(), objs),
                None => x.is_nil(objs) && typ::has_nil(tu, objs) && !typ::is_type_param(tu, objs),
            };
        }
        let (v_param, t_param) = (typ::is_type_param(v, objs), typ::is_type_param(t, objs));
        let one_unnamed = !typ::is_named(v, objs) || !typ::is_named(t, objs);
        if typ::identical(vu, tu, objs) && one_unnamed && !v_param && !t_param {
            return true;
        }
        // a bidirectional channel value is assignable to a channel type
        // with the same element type
        if let (Some(vc), Some(tc)) = (objs.types[vu].try_as_chan(), objs.types[tu].try_as_chan()) {
            return vc.dir() == typ::ChanDir::SendRecv && typ::identical(vc.elem(), tc.elem(), objs) && one_unnamed;
        }
        let to_interface = objs.types[tu].try_as_interface().is_some() && !t_param;
        to_interface && self.missing_method(v, t, true).is_none()
    }

    /// Converts the untyped operand `x` to `target`, updating the recorded
    /// type of its expression. Typed operands are left alone.
    pub(crate) fn convert_untyped(&mut self, x: &mut Operand, target: TypeKey) {
        if x.invalid() {
            return;
        }
        let xt = x.typ_or_invalid(&self.tc_objs);
        if !typ::is_untyped(xt, &self.tc_objs) || typ::is_invalid(target, &self.tc_objs) {
            return;
        }
        if typ::is_untyped(target, &self.tc_objs) {
            let objs = &self.tc_objs;
            if let (Some(rx), Some(rt)) = (untyped_rank(xt, objs), untyped_rank(target, objs)) {
                if rx < rt {
                    self.set_untyped(x, target);
                }
                return;
            }
            if !typ::identical(xt, target, objs) {
                self.cannot_convert(x, target);
            }
            return;
        }

        let nil = x.is_nil(&self.tc_objs);
        let tu = self.under(target);
        let objs = &self.tc_objs;
        let to = match &objs.types[tu] {
            Type::Basic(b) if !nil && untyped_fits(xt, b.info(), objs) => Some(target),
            Type::Interface(_) if nil => Some(target),
            Type::Interface(_) => Some(typ::untyped_default_type(xt, objs)),
            Type::TypeParam(p) if !nil => {
                let types = typ::bound_interface(p.bound(), objs)
                    .map(|i| i.type_set())
                    .unwrap_or_default();
                let fits = !types.is_empty()
                    && types.iter().all(|t| {
                        let u = typ::underlying_type(*t, objs);
                        objs.types[u].try_as_basic().is_some_and(|b| untyped_fits(xt, b.info(), objs))
                    });
                fits.then_some(target)
            }
            Type::Pointer(_) | Type::Signature(_) | Type::Slice(_) | Type::Map(_) | Type::Chan(_) if nil => {
                Some(target)
            }
            _ => None,
        };
        match to {
            Some(t) => self.set_untyped(x, t),
            None => self.cannot_convert(x, target),
        }
    }

    fn cannot_convert(&mut self, x: &mut Operand, target: TypeKey) {
        let s = self.operand_string(x);
        self.error_code_msg(
            TypeError::InvalidOp,
            x.span,
            format!("cannot use {} as {} value", s, typ::type_string(target, &self.tc_objs)),
        );
        x.set_invalid();
    }

    /// Replaces the recorded untyped type of `e`, and of the untyped
    /// operands it was computed from, with `t`.
    pub(crate) fn update_expr_type(&mut self, e: &Expr, t: TypeKey) {
        let Some(old) = self.result.types.get(&e.id).copied() else {
            return;
        };
        if !typ::is_untyped(old.typ, &self.tc_objs) {
            return;
        }
        match &e.kind {
            ExprKind::Paren(inner) => self.update_expr_type(inner, t),
            ExprKind::Unary { op, expr } if !matches!(op, UnaryOp::Addr | UnaryOp::Deref) => {
                self.update_expr_type(expr, t)
            }
            ExprKind::Binary { op, left, right } if !op.is_comparison() => {
                self.update_expr_type(left, t);
                if !op.is_shift() {
                    self.update_expr_type(right, t);
                }
            }
            _ => {}
        }
        self.result.record_type(e.id, old.mode, t);
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    /// The source text of the operand's expression, or its description.
    pub(crate) fn expr_string(&self, x: &Operand) -> String {
        match &x.expr {
            Some(e) => format::format_expr(e, &self.interner),
            None => x.describe(&self.tc_objs),
        }
    }

    /// `expr (mode of type T)`
    pub(crate) fn operand_string(&self, x: &Operand) -> String {
        match &x.expr {
            Some(e) => format!(
                "{} ({})",
                format::format_expr(e, &self.interner),
                x.describe(&self.tc_objs)
            ),
            None => x.describe(&self.tc_objs),
        }
    }
}

/// A function signature that still has type parameters.
pub(crate) fn is_generic_sig(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[typ::resolved(t, objs)]
        .try_as_signature()
        .is_some_and(|s| !s.tparams().is_empty())
}

fn is_composite_lit(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::CompositeLit(_) => true,
        ExprKind::Paren(inner) => is_composite_lit(inner),
        _ => false,
    }
}

/// Order of untyped numeric kinds; a mixed expression takes the larger.
fn untyped_rank(t: TypeKey, objs: &TCObjects) -> Option<u8> {
    match objs.types[t].try_as_basic()?.typ() {
        BasicType::UntypedInt => Some(0),
        BasicType::UntypedRune => Some(1),
        BasicType::UntypedFloat => Some(2),
        _ => None,
    }
}

/// Reports whether a value of the untyped type `t` fits a basic type of
/// kind `info`. Constant values are not tracked, so any untyped number
/// fits any numeric type.
fn untyped_fits(t: TypeKey, info: BasicInfo, objs: &TCObjects) -> bool {
    let Some(b) = objs.types[t].try_as_basic() else {
        return false;
    };
    match b.typ() {
        BasicType::UntypedBool => info == BasicInfo::IsBoolean,
        BasicType::UntypedInt | BasicType::UntypedRune | BasicType::UntypedFloat => info.is_numeric(),
        BasicType::UntypedString => info == BasicInfo::IsString,
        _ => false,
    }
}
