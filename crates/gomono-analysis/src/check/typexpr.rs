//! Type expression resolution.
//!
//! Converts type expressions of the syntax tree into types. Applications
//! of generic types become instance placeholders that are expanded once
//! the declarations they depend on are resolved.

use std::collections::HashMap;

use gomono_common::span::Span;
use gomono_syntax::ast::{
    self, ExprKind, Field, FuncSig, Ident, InterfaceElem, LitKind, Param, TypeExpr, TypeExprKind,
    TypeParamField,
};

use super::checker::Checker;
use super::errors::TypeError;
use super::format;
use crate::objects::{ObjKey, ScopeKey, TypeKey};
use crate::operand::OperandMode;
use crate::typ::{self, ChanDir, SignatureDetail, Type};

impl Checker {
    /// Resolves the type expression `e` and records the result.
    pub fn type_expr(&mut self, e: &TypeExpr) -> TypeKey {
        if self.trace() {
            self.trace_print(&format!("type[ {} ]", format::format_type_expr(e, &self.interner)));
            *self.trace_indent.borrow_mut() += 1;
        }
        let t = self.type_expr_internal(e);
        self.result.record_type_expr(e.id, t);
        if self.trace() {
            self.trace_end();
            self.trace_print(&format!("=> {}", typ::type_string(t, &self.tc_objs)));
        }
        t
    }

    fn type_expr_internal(&mut self, e: &TypeExpr) -> TypeKey {
        match &e.kind {
            TypeExprKind::Ident(ident) => {
                let Some(t) = self.type_name(ident) else {
                    return self.invalid_type();
                };
                if typ::is_generic(t, &self.tc_objs) {
                    self.error_code_msg(
                        TypeError::MissingTypeArgs,
                        e.span,
                        format!(
                            "cannot use generic type {} without instantiation",
                            typ::type_string(t, &self.tc_objs)
                        ),
                    );
                    return self.invalid_type();
                }
                t
            }
            TypeExprKind::Instance { base, args } => self.instance_type(e, base, args),
            TypeExprKind::Array { len, elem } => {
                let elem = self.type_expr(elem);
                let n = self.array_len(len);
                self.tc_objs.new_t_array(elem, n)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.type_expr(elem);
                self.tc_objs.new_t_slice(elem)
            }
            TypeExprKind::Map { key, value } => {
                let k = self.type_expr(key);
                let v = self.type_expr(value);
                let span = key.span;
                self.later(Box::new(move |c: &mut Checker| {
                    let u = c.under(k);
                    let objs = &c.tc_objs;
                    if !typ::is_invalid(u, objs) && !typ::is_type_param(u, objs) && !typ::comparable(u, objs) {
                        c.error_code_msg(
                            TypeError::InvalidOp,
                            span,
                            format!("invalid map key type {}", typ::type_string(k, &c.tc_objs)),
                        );
                    }
                }));
                self.tc_objs.new_t_map(k, v)
            }
            TypeExprKind::Chan { dir, elem } => {
                let elem = self.type_expr(elem);
                let dir = match dir {
                    ast::ChanDir::Both => ChanDir::SendRecv,
                    ast::ChanDir::Send => ChanDir::SendOnly,
                    ast::ChanDir::Recv => ChanDir::RecvOnly,
                };
                self.tc_objs.new_t_chan(dir, elem)
            }
            TypeExprKind::Func(sig) => {
                let parent = self.current_scope();
                let scope = self.tc_objs.new_scope(Some(parent), e.span, "function type", true);
                self.func_type(scope, None, Vec::new(), Vec::new(), sig)
            }
            TypeExprKind::Struct(fields) => self.struct_type(fields),
            TypeExprKind::Pointer(base) => {
                let base = self.type_expr(base);
                self.tc_objs.new_t_pointer(base)
            }
            TypeExprKind::Interface(elems) => self.interface_type(elems),
        }
    }

    /// Resolves `ident` to the type it names. Generic types are returned
    /// uninstantiated.
    pub(crate) fn type_name(&mut self, ident: &Ident) -> Option<TypeKey> {
        let name = self.resolve_ident(ident).to_string();
        if name == "_" {
            self.error_code(TypeError::BlankAsValue, ident.span);
            return None;
        }
        let Some(obj) = self.lookup(&name) else {
            self.error_code_msg(TypeError::Undeclared, ident.span, format!("undeclared name: {}", name));
            return None;
        };
        self.result.record_use(ident.id, obj);
        if !self.tc_objs.lobjs[obj].is_type_name() {
            self.error_code_msg(TypeError::NotAType, ident.span, format!("{} is not a type", name));
            return None;
        }
        self.obj_decl(obj);
        self.tc_objs.lobjs[obj].typ()
    }

    fn instance_type(&mut self, e: &TypeExpr, base: &Ident, args: &[ast::P<TypeExpr>]) -> TypeKey {
        let Some(base_t) = self.type_name(base) else {
            for arg in args {
                self.type_expr(arg);
            }
            return self.invalid_type();
        };
        let want = match self.tc_objs.types[typ::resolved(base_t, &self.tc_objs)].try_as_named() {
            Some(n) if n.is_generic() => n.tparams().len(),
            _ => {
                self.error_code_msg(
                    TypeError::NotGeneric,
                    base.span,
                    format!("{} is not a generic type", typ::type_string(base_t, &self.tc_objs)),
                );
                return self.invalid_type();
            }
        };

        let targs: Vec<TypeKey> = args.iter().map(|a| self.type_expr(a)).collect();
        if targs.len() != want {
            self.error_code_msg(
                TypeError::ArityMismatch,
                e.span,
                format!("got {} arguments but {} type parameters", targs.len(), want),
            );
            return self.invalid_type();
        }
        if targs.iter().any(|t| typ::is_invalid(*t, &self.tc_objs)) {
            return self.invalid_type();
        }

        let poslist: Vec<Span> = args.iter().map(|a| a.span).collect();
        let inst = self.tc_objs.new_t_instance(base_t, targs, poslist, e.span);
        if self.eager {
            return self.expand(inst);
        }
        // the generic type may not be fully set up yet
        let id = e.id;
        self.later(Box::new(move |c: &mut Checker| {
            let t = c.expand(inst);
            c.result.record_type_expr(id, t);
        }));
        inst
    }

    fn array_len(&mut self, len: &ast::Expr) -> Option<u64> {
        if let ExprKind::BasicLit { kind: LitKind::Int, value } = &len.kind {
            let untyped_int = self.universe().basic(typ::BasicType::UntypedInt);
            self.result.record_type(len.id, OperandMode::Constant, untyped_int);
            if let Ok(n) = value.replace('_', "").parse::<u64>() {
                return Some(n);
            }
        }
        self.error_code(TypeError::InvalidArrayLen, len.span);
        None
    }

    fn struct_type(&mut self, fields: &[Field]) -> TypeKey {
        let mut objs = Vec::new();
        let mut tags = Vec::new();
        let mut seen: HashMap<String, Span> = HashMap::new();
        for field in fields {
            let t = self.type_expr(&field.ty);
            if field.names.is_empty() {
                let Some(name) = embedded_field_name(&field.ty) else {
                    self.error_code_msg(TypeError::InvalidOp, field.ty.span, "invalid embedded field type");
                    continue;
                };
                let name = self.resolve_ident(&name).to_string();
                if self.add_field_name(&mut seen, &name, field.span) {
                    let f = self.tc_objs.new_field(field.ty.span, Some(self.pkg), name, Some(t), true);
                    objs.push(f);
                    tags.push(field.tag.clone());
                }
                continue;
            }
            for ident in &field.names {
                let name = self.resolve_ident(ident).to_string();
                let f = self.tc_objs.new_field(ident.span, Some(self.pkg), name.clone(), Some(t), false);
                self.result.record_def(ident.id, f);
                if self.add_field_name(&mut seen, &name, ident.span) {
                    objs.push(f);
                    tags.push(field.tag.clone());
                }
            }
        }
        self.tc_objs.new_t_struct(objs, tags)
    }

    fn add_field_name(&mut self, seen: &mut HashMap<String, Span>, name: &str, span: Span) -> bool {
        if name == "_" {
            return true;
        }
        if seen.contains_key(name) {
            self.error_code_msg(TypeError::Redeclared, span, format!("{} redeclared", name));
            return false;
        }
        seen.insert(name.to_string(), span);
        true
    }

    fn interface_type(&mut self, elems: &[InterfaceElem]) -> TypeKey {
        let mut methods = Vec::new();
        let mut types = Vec::new();
        let mut embeddeds = Vec::new();
        let mut spans = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig, span } => {
                    let parent = self.current_scope();
                    let scope = self.tc_objs.new_scope(Some(parent), *span, "method", true);
                    let t = self.func_type(scope, None, Vec::new(), Vec::new(), sig);
                    let mname = self.resolve_ident(name).to_string();
                    let m = self.tc_objs.new_func(name.span, Some(self.pkg), mname, Some(t));
                    self.result.record_def(name.id, m);
                    methods.push(m);
                }
                InterfaceElem::Embedded(ty) => {
                    embeddeds.push(self.type_expr(ty));
                    spans.push(ty.span);
                }
                InterfaceElem::TypeList(list) => {
                    for ty in list {
                        let t = self.type_expr(ty);
                        if !typ::is_invalid(t, &self.tc_objs) {
                            types.push(t);
                        }
                    }
                }
            }
        }

        let iface = self.tc_objs.new_t_interface(methods, types, embeddeds);
        self.pos_map.insert(iface, spans);
        if self.eager {
            let _ = self.complete_interface(iface);
        } else {
            self.later(Box::new(move |c: &mut Checker| {
                // errors have been reported by completion
                let _ = c.complete_interface(iface);
            }));
        }
        iface
    }

    /// Builds a signature type. Parameters and results are declared in
    /// `scope`. The type of a variadic last parameter becomes a slice.
    pub(crate) fn func_type(
        &mut self,
        scope: ScopeKey,
        recv: Option<ObjKey>,
        rparams: Vec<ObjKey>,
        tparams: Vec<ObjKey>,
        sig: &FuncSig,
    ) -> TypeKey {
        let saved = self.octx.scope.replace(scope);
        let params = self.collect_params(scope, &sig.params, sig.variadic);
        let results = self.collect_params(scope, &sig.results, false);
        self.octx.scope = saved;

        let params = self.tc_objs.new_t_tuple(params);
        let results = self.tc_objs.new_t_tuple(results);
        let detail = SignatureDetail::new(Some(scope), recv, params, results, sig.variadic)
            .with_type_params(rparams, tparams);
        self.tc_objs.new_t_signature(detail)
    }

    fn collect_params(&mut self, scope: ScopeKey, list: &[Param], variadic: bool) -> Vec<ObjKey> {
        let mut vars = Vec::new();
        for (i, param) in list.iter().enumerate() {
            let mut t = self.type_expr(&param.ty);
            if variadic && i + 1 == list.len() {
                t = self.tc_objs.new_t_slice(t);
            }
            if param.names.is_empty() {
                vars.push(self.tc_objs.new_var(param.ty.span, Some(self.pkg), String::new(), Some(t)));
                continue;
            }
            for ident in &param.names {
                let name = self.resolve_ident(ident).to_string();
                let v = self.tc_objs.new_var(ident.span, Some(self.pkg), name, Some(t));
                self.declare(scope, Some(ident), v);
                vars.push(v);
            }
        }
        vars
    }

    /// Declares the type parameters of `fields` in `scope`. All names are
    /// declared before any bound is resolved so bounds may mention them.
    pub(crate) fn declare_type_params(&mut self, scope: ScopeKey, fields: &[TypeParamField]) -> Vec<ObjKey> {
        let any = self.universe().any();
        let mut tparams = Vec::new();
        let mut types = Vec::new();
        for field in fields {
            for ident in &field.names {
                let name = self.resolve_ident(ident).to_string();
                let obj = self.tc_objs.new_type_name(ident.span, Some(self.pkg), name, None);
                let id = self.next_tparam_id();
                let t = self.tc_objs.new_t_type_param(id, obj, tparams.len(), any);
                self.declare(scope, Some(ident), obj);
                tparams.push(obj);
                types.push(t);
            }
        }

        let saved = self.octx.scope.replace(scope);
        let mut index = 0;
        for field in fields {
            let bound = self.bound(&field.constraint);
            let group = types[index..index + field.names.len()].to_vec();
            index += field.names.len();
            for t in &group {
                set_bound(self, *t, bound);
            }
            let span = field.constraint.span;
            let check = move |c: &mut Checker| {
                let u = c.under(bound);
                if typ::is_invalid(u, &c.tc_objs) || c.tc_objs.types[u].try_as_interface().is_some() {
                    return;
                }
                c.error_code_msg(
                    TypeError::NotAnInterface,
                    span,
                    format!("{} is not an interface", typ::type_string(bound, &c.tc_objs)),
                );
                let any = c.universe().any();
                for t in &group {
                    set_bound(c, *t, any);
                }
            };
            if self.eager {
                check(self);
            } else {
                self.later(Box::new(check));
            }
        }
        self.octx.scope = saved;
        tparams
    }

    fn bound(&mut self, e: &TypeExpr) -> TypeKey {
        let t = self.type_expr(e);
        if typ::is_invalid(t, &self.tc_objs) {
            return self.universe().any();
        }
        t
    }
}

fn set_bound(c: &mut Checker, tparam: TypeKey, bound: TypeKey) {
    if let Type::TypeParam(p) = &mut c.tc_objs.types[tparam] {
        p.set_bound(bound);
    }
}

/// Name of the field declared by an embedded field type `T`, `*T`, `T[A]`
/// or `*T[A]`.
fn embedded_field_name(ty: &TypeExpr) -> Option<Ident> {
    match &ty.kind {
        TypeExprKind::Ident(name) => Some(*name),
        TypeExprKind::Instance { base, .. } => Some(*base),
        TypeExprKind::Pointer(inner) => match &inner.kind {
            TypeExprKind::Ident(name) => Some(*name),
            TypeExprKind::Instance { base, .. } => Some(*base),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_syntax::AstBuilder;

    fn checker(b: AstBuilder) -> Checker {
        let (interner, _) = b.into_parts();
        Checker::new(interner, TraceConfig::default())
    }

    #[test]
    fn test_composite_type_expressions() {
        let b = AstBuilder::new();
        let e = b.ty_map(b.ty_name("string"), b.ty_slice(b.ty_ptr(b.ty_name("int"))));
        let mut c = checker(b);
        let t = c.type_expr(&e);
        assert_eq!(typ::type_string(t, &c.tc_objs), "map[string][]*int");
        assert_eq!(c.result.type_exprs.get(&e.id), Some(&t));
        assert!(!c.has_errors());
    }

    #[test]
    fn test_variadic_parameter_is_a_slice() {
        let b = AstBuilder::new();
        let sig = b.variadic_sig(vec![b.param(&["xs"], b.ty_name("int"))], Vec::new());
        let e = b.ty_func(sig);
        let mut c = checker(b);
        let t = c.type_expr(&e);
        let sig = c.tc_objs.types[t].try_as_signature().unwrap();
        assert!(sig.variadic());
        let params = sig.param_vars(&c.tc_objs).to_vec();
        let pt = c.tc_objs.lobjs[params[0]].typ().unwrap();
        assert_eq!(typ::type_string(pt, &c.tc_objs), "[]int");
    }

    #[test]
    fn test_unknown_and_non_type_names() {
        let b = AstBuilder::new();
        let missing = b.ty_name("Missing");
        let value = b.ty_name("len");
        let mut c = checker(b);
        let t = c.type_expr(&missing);
        assert!(typ::is_invalid(t, &c.tc_objs));
        c.type_expr(&value);
        let diags = c.take_diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "undeclared name: Missing");
        assert_eq!(diags[1].message, "len is not a type");
    }

    #[test]
    fn test_array_length_must_be_literal() {
        let b = AstBuilder::new();
        let good = b.ty_array(4, b.ty_name("byte"));
        let bad = b.ty(TypeExprKind::Array {
            len: b.name("n"),
            elem: b.ty_name("int"),
        });
        let mut c = checker(b);
        let t = c.type_expr(&good);
        assert_eq!(c.tc_objs.types[t].try_as_array().unwrap().len(), Some(4));
        c.type_expr(&bad);
        assert_eq!(c.error_count(), 1);
    }

    #[test]
    fn test_type_params_and_bounds() {
        let b = AstBuilder::new();
        let fields = vec![
            b.tparam(&["K"], b.ty_name("comparable")),
            b.tparam(&["V"], b.ty_name("int")),
        ];
        let mut c = checker(b);
        let pkg_scope = c.pkg_scope();
        let scope = c.tc_objs.new_scope(Some(pkg_scope), Span::dummy(), "test", false);
        let tparams = c.declare_type_params(scope, &fields);
        c.process_delayed(0);
        assert_eq!(tparams.len(), 2);
        let k = c.tc_objs.lobjs[tparams[0]].typ().unwrap();
        let v = c.tc_objs.lobjs[tparams[1]].typ().unwrap();
        let comparable = c.universe().comparable();
        let any = c.universe().any();
        assert_eq!(c.tc_objs.types[k].try_as_type_param().unwrap().bound(), comparable);
        // a non-interface bound is reported and replaced
        assert_eq!(c.tc_objs.types[v].try_as_type_param().unwrap().bound(), any);
        let diags = c.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "int is not an interface");
    }
}
