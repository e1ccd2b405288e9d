//! Package-level declarations.
//!
//! Objects are collected first, then resolved lazily: resolving a
//! declaration resolves the declarations it refers to on demand. Type
//! declarations are resolved before function signatures, and function
//! bodies are checked last.

use gomono_common::span::Span;
use gomono_syntax::ast::{Decl, Expr, File, FuncDecl, Receiver, TypeDecl, TypeExprKind, VarDecl, P};

use super::checker::{Checker, DeclInfo, ObjContext};
use super::errors::TypeError;
use super::subst::SubstMap;
use crate::objects::{ObjKey, ScopeKey, TypeKey};
use crate::typ::{self, Type};

impl Checker {
    /// Declares every package-level name.
    pub(crate) fn collect_objects(&mut self, file: &File) {
        let pkg_scope = self.pkg_scope();
        for decl in &file.decls {
            match decl {
                Decl::Type(d) => {
                    let name = self.resolve_ident(&d.name).to_string();
                    let obj = self.tc_objs.new_type_name(d.name.span, Some(self.pkg), name, None);
                    self.tc_objs.new_t_named(obj, None, Vec::new());
                    self.declare(pkg_scope, Some(&d.name), obj);
                    self.decls.insert(obj, DeclInfo::Type(d.clone()));
                    self.decl_order.push(obj);
                }
                Decl::Func(d) => {
                    let name = self.resolve_ident(&d.name).to_string();
                    let obj = self.tc_objs.new_func(d.name.span, Some(self.pkg), name, None);
                    if d.recv.is_some() {
                        // methods are associated with their receiver type
                        // once the signature is resolved
                        self.result.record_def(d.name.id, obj);
                    } else {
                        self.declare(pkg_scope, Some(&d.name), obj);
                    }
                    self.decls.insert(obj, DeclInfo::Func(d.clone()));
                    self.decl_order.push(obj);
                }
                Decl::Var(d) => {
                    let vars: Vec<ObjKey> = d
                        .names
                        .iter()
                        .map(|ident| {
                            let name = self.resolve_ident(ident).to_string();
                            self.tc_objs.new_var(ident.span, Some(self.pkg), name, None)
                        })
                        .collect();
                    for (ident, v) in d.names.iter().zip(&vars) {
                        self.declare(pkg_scope, Some(ident), *v);
                        self.decls.insert(*v, DeclInfo::Var(d.clone(), vars.clone()));
                        self.decl_order.push(*v);
                    }
                }
            }
        }
    }

    pub(crate) fn package_types(&mut self) {
        for obj in self.decl_order.clone() {
            if matches!(self.decls.get(&obj), Some(DeclInfo::Type(_))) {
                self.obj_decl(obj);
            }
        }
    }

    pub(crate) fn package_signatures(&mut self) {
        for obj in self.decl_order.clone() {
            if matches!(self.decls.get(&obj), Some(DeclInfo::Func(_))) {
                self.obj_decl(obj);
            }
        }
    }

    /// Checks var initializers, then function bodies, in source order.
    pub(crate) fn package_bodies(&mut self) {
        let order = self.decl_order.clone();
        for obj in &order {
            if matches!(self.decls.get(obj), Some(DeclInfo::Var(..))) {
                self.obj_decl(*obj);
            }
        }
        for obj in order {
            let Some(DeclInfo::Func(d)) = self.decls.get(&obj).cloned() else {
                continue;
            };
            let (Some(body), Some(sig)) = (&d.body, self.tc_objs.lobjs[obj].typ()) else {
                continue;
            };
            if self.trace() {
                self.trace_print(&format!("--- body of {}", self.resolve_ident(&d.name)));
            }
            self.func_body(sig, body);
        }
    }

    /// Resolves the declaration of the package-level object `obj` unless it
    /// is resolved already or being resolved.
    pub(crate) fn obj_decl(&mut self, obj: ObjKey) {
        if self.resolved.contains(&obj) || self.resolving.contains(&obj) {
            return;
        }
        let Some(info) = self.decls.get(&obj).cloned() else {
            return;
        };
        if self.trace() {
            self.trace_print(&format!("-- declare {}", self.tc_objs.lobjs[obj].name()));
            *self.trace_indent.borrow_mut() += 1;
        }
        self.resolving.insert(obj);
        let saved = std::mem::replace(&mut self.octx, ObjContext::default());
        match info {
            DeclInfo::Type(d) => self.type_decl(obj, &d),
            DeclInfo::Func(d) => self.func_decl(obj, &d),
            DeclInfo::Var(d, lhs) => {
                for v in &lhs {
                    self.resolving.insert(*v);
                }
                self.var_decl(&d, &lhs);
                for v in lhs {
                    self.resolving.remove(&v);
                    self.resolved.insert(v);
                }
            }
        }
        self.octx = saved;
        self.resolving.remove(&obj);
        self.resolved.insert(obj);
        self.trace_end();
    }

    fn type_decl(&mut self, obj: ObjKey, d: &TypeDecl) {
        let Some(named) = self.tc_objs.lobjs[obj].typ() else {
            return;
        };
        if !d.tparams.is_empty() {
            let pkg_scope = self.pkg_scope();
            let scope = self.tc_objs.new_scope(Some(pkg_scope), d.span, "type parameters", false);
            let tparams = self.declare_type_params(scope, &d.tparams);
            if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
                n.set_tparams(tparams);
            }
            self.octx.scope = Some(scope);
        }

        let rhs = self.type_expr(&d.ty);
        let r = typ::resolved(rhs, &self.tc_objs);
        match &self.tc_objs.types[r] {
            Type::Instance(_) => self.set_underlying_later(named, rhs),
            Type::Named(n) => match n.underlying() {
                Some(u) => self.set_underlying(named, u),
                None if self.resolving.contains(&n.obj()) => {
                    let name = self.tc_objs.lobjs[obj].name().to_string();
                    self.error_code_msg(
                        TypeError::IllegalCycle,
                        d.name.span,
                        format!("invalid recursive type {}", name),
                    );
                    let invalid = self.invalid_type();
                    self.set_underlying(named, invalid);
                }
                None => self.set_underlying_later(named, rhs),
            },
            Type::TypeParam(_) => {
                self.error_code_msg(
                    TypeError::InvalidOp,
                    d.ty.span,
                    "cannot use a type parameter as RHS in type declaration",
                );
                let invalid = self.invalid_type();
                self.set_underlying(named, invalid);
            }
            _ => self.set_underlying(named, rhs),
        }
    }

    fn set_underlying(&mut self, named: TypeKey, u: TypeKey) {
        if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
            n.set_underlying(u);
        }
    }

    fn set_underlying_later(&mut self, named: TypeKey, rhs: TypeKey) {
        self.later(Box::new(move |c: &mut Checker| {
            let u = c.under(rhs);
            c.set_underlying(named, u);
        }));
    }

    fn func_decl(&mut self, obj: ObjKey, d: &FuncDecl) {
        let pkg_scope = self.pkg_scope();
        let scope = self.tc_objs.new_scope(Some(pkg_scope), d.span, "function", true);
        self.octx.scope = Some(scope);

        let mut rparams = Vec::new();
        let mut recv_var = None;
        let mut base = None;
        if let Some(recv) = &d.recv {
            if let Some((v, params, named, ptr)) = self.receiver(scope, recv) {
                recv_var = Some(v);
                rparams = params;
                base = Some((named, ptr));
            }
        }
        let tparams = self.declare_type_params(scope, &d.tparams);
        let sig = self.func_type(scope, recv_var, rparams, tparams, &d.sig);
        self.tc_objs.lobjs[obj].set_type(Some(sig));

        if let Some((named, ptr)) = base {
            self.add_method(named, obj, ptr);
        }
    }

    /// Declares the receiver of a method and its type parameters. Returns
    /// the receiver variable, the receiver type parameters, the base type
    /// and whether the receiver is a pointer.
    fn receiver(&mut self, scope: ScopeKey, recv: &Receiver) -> Option<(ObjKey, Vec<ObjKey>, TypeKey, bool)> {
        let Some((ptr, base_ident, rnames)) = recv.unpack() else {
            self.error_code_msg(TypeError::InvalidReceiver, recv.ty.span, "invalid receiver type");
            return None;
        };
        let base_name = self.resolve_ident(&base_ident).to_string();
        let pkg_scope = self.pkg_scope();
        let base_obj = match self.tc_objs.scopes[pkg_scope].lookup(&base_name) {
            Some(o) if self.tc_objs.lobjs[o].is_type_name() => o,
            Some(_) => {
                self.error_code_msg(TypeError::NotAType, base_ident.span, format!("{} is not a type", base_name));
                return None;
            }
            None => {
                self.error_code_msg(
                    TypeError::Undeclared,
                    base_ident.span,
                    format!("undeclared name: {}", base_name),
                );
                return None;
            }
        };
        self.result.record_use(base_ident.id, base_obj);
        self.obj_decl(base_obj);
        let base_t = self.tc_objs.lobjs[base_obj].typ()?;

        let Some(named) = self.tc_objs.types[base_t].try_as_named() else {
            self.error_code_msg(
                TypeError::InvalidReceiver,
                base_ident.span,
                format!("invalid receiver type {}", base_name),
            );
            return None;
        };
        let base_tparams = named.tparams().to_vec();
        let under = named.underlying();
        if under.is_some_and(|u| {
            matches!(self.tc_objs.types[u], Type::Pointer(_) | Type::Interface(_))
        }) {
            self.error_code_msg(
                TypeError::InvalidReceiver,
                base_ident.span,
                format!("invalid receiver type {} (pointer or interface type)", base_name),
            );
            return None;
        }
        if rnames.len() != base_tparams.len() {
            self.error_code_msg(
                TypeError::ArityMismatch,
                recv.ty.span,
                format!(
                    "got {} type parameters, but receiver base type declares {}",
                    rnames.len(),
                    base_tparams.len()
                ),
            );
            return None;
        }

        // receiver type parameters are new objects bounded like the base
        // type's parameters
        let any = self.universe().any();
        let mut rparams = Vec::with_capacity(rnames.len());
        let mut rtypes = Vec::with_capacity(rnames.len());
        for (i, ident) in rnames.iter().enumerate() {
            let name = self.resolve_ident(ident).to_string();
            let obj = self.tc_objs.new_type_name(ident.span, Some(self.pkg), name, None);
            let id = self.next_tparam_id();
            rtypes.push(self.tc_objs.new_t_type_param(id, obj, i, any));
            self.declare(scope, Some(ident), obj);
            rparams.push(obj);
        }
        let recv_t = if rparams.is_empty() {
            base_t
        } else {
            let smap = SubstMap::new(&base_tparams, &rtypes, &self.tc_objs);
            for (bp, rt) in base_tparams.iter().zip(&rtypes) {
                let Some(bound) = self.tc_objs.lobjs[*bp]
                    .typ()
                    .and_then(|t| self.tc_objs.types[t].try_as_type_param())
                    .map(|p| p.bound())
                else {
                    continue;
                };
                let bound = self.subst(recv.span, bound, &smap);
                if let Type::TypeParam(p) = &mut self.tc_objs.types[*rt] {
                    p.set_bound(bound);
                }
            }
            let inst = self.subst(recv.ty.span, base_t, &smap);
            if let TypeExprKind::Pointer(inner) = &recv.ty.kind {
                self.result.record_type_expr(inner.id, inst);
            }
            inst
        };
        let recv_ty = if ptr {
            self.tc_objs.new_t_pointer(recv_t)
        } else {
            recv_t
        };
        self.result.record_type_expr(recv.ty.id, recv_ty);

        let var = match &recv.name {
            Some(ident) => {
                let name = self.resolve_ident(ident).to_string();
                let v = self.tc_objs.new_var(ident.span, Some(self.pkg), name, Some(recv_ty));
                self.declare(scope, Some(ident), v);
                v
            }
            None => self.tc_objs.new_var(recv.span, Some(self.pkg), String::new(), Some(recv_ty)),
        };
        Some((var, rparams, base_t, ptr))
    }

    fn add_method(&mut self, named: TypeKey, method: ObjKey, ptr: bool) {
        let objs = &self.tc_objs;
        let name = objs.lobjs[method].name().to_string();
        if name == "_" {
            return;
        }
        let existing = objs.types[named]
            .try_as_named()
            .and_then(|n| n.methods().iter().find(|m| objs.lobjs[**m].name() == name).copied());
        if let Some(other) = existing {
            let type_name = typ::type_string(named, objs);
            let other_span = objs.lobjs[other].span();
            let mut diag = TypeError::MethodRedeclared.at_with_message(
                objs.lobjs[method].span(),
                format!("method {}.{} already declared", type_name, name),
            );
            if !other_span.is_dummy() {
                diag = diag.with_label(
                    gomono_common::diagnostics::Label::secondary(other_span).with_message("other declaration"),
                );
            }
            self.emit(diag);
            return;
        }
        self.tc_objs.lobjs[method].set_func_has_ptr_recv(ptr);
        if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
            n.add_method(method);
        }
    }

    /// Checks a var declaration and sets the types of the variables `lhs`
    /// it declares.
    pub(crate) fn var_decl(&mut self, d: &VarDecl, lhs: &[ObjKey]) {
        let declared = d.ty.as_ref().map(|ty| self.type_expr(ty));
        self.init_vars(lhs, declared, &d.values, d.span);
    }

    /// Types the variables `lhs` from a declared type and/or initializer
    /// expressions.
    pub(crate) fn init_vars(&mut self, lhs: &[ObjKey], declared: Option<TypeKey>, values: &[P<Expr>], span: Span) {
        let invalid = self.invalid_type();
        if values.is_empty() {
            for v in lhs {
                self.tc_objs.lobjs[*v].set_type(Some(declared.unwrap_or(invalid)));
            }
            return;
        }

        let Some(rhs) = self.rhs_operands(values, lhs.len(), span, false) else {
            for v in lhs {
                self.tc_objs.lobjs[*v].set_type(Some(invalid));
            }
            return;
        };
        let mut types = Vec::with_capacity(lhs.len());
        for mut x in rhs {
            self.assignment(&mut x, declared, "variable declaration");
            types.push(match declared {
                _ if x.invalid() => invalid,
                Some(t) => t,
                None => x.typ_or_invalid(&self.tc_objs),
            });
        }

        for (v, t) in lhs.iter().zip(types) {
            self.tc_objs.lobjs[*v].set_type(Some(t));
        }
    }

    pub(crate) fn assign_mismatch(&self, span: Span, vars: usize, values: usize) {
        self.error_code_msg(
            TypeError::AssignmentMismatch,
            span,
            format!("assignment mismatch: {} variable(s) but {} value(s)", vars, values),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_syntax::AstBuilder;

    fn check(b: AstBuilder, decls: Vec<Decl>) -> Checker {
        let file = b.file("main", decls);
        let (interner, _) = b.into_parts();
        let mut c = Checker::new(interner, TraceConfig::default());
        let _ = c.check_file(&file);
        c
    }

    fn named_type(c: &Checker, name: &str) -> TypeKey {
        let obj = c.tc_objs.scopes[c.pkg_scope()].lookup(name).unwrap();
        c.tc_objs.lobjs[obj].typ().unwrap()
    }

    #[test]
    fn test_forward_reference() {
        let b = AstBuilder::new();
        let decls = vec![
            b.type_decl("A", Vec::new(), b.ty_slice(b.ty_name("B"))),
            b.type_decl("B", Vec::new(), b.ty_name("int")),
        ];
        let c = check(b, decls);
        assert!(!c.has_errors());
        let a = named_type(&c, "A");
        let u = typ::underlying_type(a, &c.tc_objs);
        assert_eq!(typ::type_string(u, &c.tc_objs), "[]B");
    }

    #[test]
    fn test_invalid_recursive_type() {
        let b = AstBuilder::new();
        let decls = vec![
            b.type_decl("A", Vec::new(), b.ty_name("B")),
            b.type_decl("B", Vec::new(), b.ty_name("A")),
        ];
        let c = check(b, decls);
        let diags = c.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(TypeError::IllegalCycle.code()));
    }

    #[test]
    fn test_methods_attach_to_receiver_base() {
        let b = AstBuilder::new();
        let fields = vec![b.field(&["v"], b.ty_name("T"))];
        let decls = vec![
            b.type_decl("Box", vec![b.tparam(&["T"], b.ty_name("any"))], b.ty_struct(fields)),
            b.method_decl(
                "b",
                b.ty_ptr(b.ty_inst("Box", vec![b.ty_name("U")])),
                "Get",
                b.sig(Vec::new(), vec![b.anon(b.ty_name("U"))]),
                b.block(vec![b.ret(vec![b.sel(b.name("b"), "v")])]),
            ),
        ];
        let c = check(b, decls);
        assert!(!c.has_errors(), "{:?}", c.take_diagnostics());
        let bx = named_type(&c, "Box");
        let methods = c.tc_objs.types[bx].try_as_named().unwrap().methods().to_vec();
        assert_eq!(methods.len(), 1);
        let m = &c.tc_objs.lobjs[methods[0]];
        assert!(m.func_has_ptr_recv());
        let sig = c.tc_objs.types[m.typ().unwrap()].try_as_signature().unwrap();
        assert_eq!(sig.rparams().len(), 1);
        assert_eq!(c.tc_objs.lobjs[sig.rparams()[0]].name(), "U");
    }

    #[test]
    fn test_receiver_type_parameter_count() {
        let b = AstBuilder::new();
        let decls = vec![
            b.type_decl("Box", vec![b.tparam(&["T"], b.ty_name("any"))], b.ty_struct(Vec::new())),
            b.method_decl("b", b.ty_name("Box"), "M", b.sig(Vec::new(), Vec::new()), b.block(Vec::new())),
        ];
        let c = check(b, decls);
        let diags = c.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(TypeError::ArityMismatch.code()));
    }

    #[test]
    fn test_var_declarations() {
        let b = AstBuilder::new();
        let decls = vec![
            b.var_decl(&["x"], None, vec![b.int(1)]),
            b.var_decl(&["y"], Some(b.ty_name("float64")), vec![b.name("z")]),
            b.var_decl(&["z"], None, vec![b.float("1.5")]),
        ];
        let c = check(b, decls);
        assert!(!c.has_errors(), "{:?}", c.take_diagnostics());
        for (name, want) in [("x", "int"), ("y", "float64"), ("z", "float64")] {
            let t = named_type(&c, name);
            assert_eq!(typ::type_string(t, &c.tc_objs), want);
        }
    }
}
