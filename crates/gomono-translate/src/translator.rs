//! The monomorphization driver.
//!
//! A [`Translator`] rewrites every non-generic declaration of a checked
//! file. Each use of a generic function or type it meets is replaced by the
//! synthetic name of the matching instance, and the instance is queued.
//! Queued instances are copied from their generic declaration until no new
//! ones appear; the registry hands out one name per instance, so recursive
//! uses terminate.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gomono_analysis::check::DeclInfo;
use gomono_analysis::objects::{ObjKey, TypeKey};
use gomono_analysis::typ::{self, BasicType, ChanDir, Type};
use gomono_analysis::{Checker, Inferred, OperandMode};
use gomono_common::config::TraceConfig;
use gomono_common::diagnostics::{Diagnostic, DiagnosticSink};
use gomono_common::span::Span;
use gomono_syntax::ast::{
    self, Decl, Expr, ExprKind, Field, File, FuncDecl, FuncSig, Ident, InterfaceElem, LitKind, NodeIdGen, Param,
    Receiver, TypeDecl, TypeExpr, TypeExprKind, P,
};

use crate::error::TranslateError;
use crate::naming::{InstanceKey, Registry};
use crate::type_args::TypeArgs;

/// Position of a synthesized declaration in [`TranslateOutput::instances`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeclId(pub usize);

#[derive(Debug)]
pub struct TranslateOutput {
    /// The input without its generic declarations, followed by the instances.
    pub file: File,
    /// Synthesized declarations in emission order.
    pub instances: Vec<Decl>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslateOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// An instance whose name is handed out but whose declaration is not
/// written yet.
enum Pending {
    Func {
        generic: ObjKey,
        inst: ObjKey,
        targs: Vec<TypeKey>,
        span: Span,
    },
    Type {
        generic: ObjKey,
        inst: ObjKey,
        named: TypeKey,
        targs: Vec<TypeKey>,
        span: Span,
    },
}

/// Syntactic form of a type, extracted so the arena is not borrowed while
/// syntax is built.
enum Shape {
    Name(ObjKey),
    Instance,
    Pointer(TypeKey),
    Slice(TypeKey),
    Array(u64, TypeKey),
    Map(TypeKey, TypeKey),
    Chan(ast::ChanDir, TypeKey),
    Func(TypeKey),
    Struct(Vec<(ObjKey, Option<String>)>),
    Interface {
        methods: Vec<ObjKey>,
        embeddeds: Vec<TypeKey>,
        types: Vec<TypeKey>,
    },
}

pub struct Translator<'a> {
    pub(crate) checker: &'a mut Checker,
    pub(crate) ids: &'a NodeIdGen,
    config: TraceConfig,
    trace_indent: Rc<RefCell<usize>>,
    registry: Registry,
    worklist: VecDeque<Pending>,
    instances: Vec<Decl>,
    diagnostics: DiagnosticSink,
}

impl<'a> Translator<'a> {
    /// `ids` must be the generator the checked tree was built with, so new
    /// nodes never reuse an annotated id.
    pub fn new(checker: &'a mut Checker, ids: &'a NodeIdGen, config: TraceConfig) -> Translator<'a> {
        Translator {
            checker,
            ids,
            config,
            trace_indent: Rc::new(RefCell::new(0)),
            registry: Registry::new(),
            worklist: VecDeque::new(),
            instances: Vec::new(),
            diagnostics: DiagnosticSink::new(),
        }
    }

    pub fn checker(&self) -> &Checker {
        &*self.checker
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Monomorphizes `file`, which must have been checked by this
    /// translator's checker. Annotations of every new node are recorded in
    /// the checker's type info.
    pub fn translate_file(&mut self, file: &File) -> TranslateOutput {
        let ta = TypeArgs::empty();
        let mut decls = Vec::with_capacity(file.decls.len());
        for decl in &file.decls {
            if decl.is_generic() {
                if self.trace() {
                    self.trace_print(&format!("skip generic {}", self.decl_name(decl)));
                }
                continue;
            }
            match self.fold_decl(&ta, decl) {
                Ok(d) => decls.push(d),
                Err(err) => self.report(err),
            }
        }
        self.drain();

        let instances = std::mem::take(&mut self.instances);
        log::debug!(
            "translated package {}: {} declaration(s), {} instance(s)",
            self.checker.resolve_ident(&file.package),
            decls.len(),
            instances.len()
        );
        decls.extend(instances.iter().cloned());
        TranslateOutput {
            file: File {
                package: file.package,
                decls,
                span: file.span,
            },
            instances,
            diagnostics: self.diagnostics.take(),
        }
    }

    /// Writes queued instances until the queue is empty. Instances may
    /// queue further instances.
    fn drain(&mut self) {
        while let Some(pending) = self.worklist.pop_front() {
            let result = match pending {
                Pending::Func {
                    generic,
                    inst,
                    targs,
                    span,
                } => self
                    .type_arg_syntax(&targs, span)
                    .and_then(|syntax| self.instantiate_function(generic, inst, syntax, &targs))
                    .map(|_| ()),
                Pending::Type {
                    generic,
                    inst,
                    named,
                    targs,
                    span,
                } => self
                    .type_arg_syntax(&targs, span)
                    .and_then(|syntax| self.instantiate_type_decl(generic, inst, named, syntax, &targs))
                    .map(|_| ()),
            };
            if let Err(err) = result {
                self.report(err);
            }
        }
    }

    // =========================================================================
    // Instantiation
    // =========================================================================

    /// Writes the declaration of `inst`, the instance of the generic
    /// function `generic` for `targs`. `targ_syntax` stands in for the type
    /// parameters in the copy.
    pub fn instantiate_function(
        &mut self,
        generic: ObjKey,
        inst: ObjKey,
        targ_syntax: Vec<P<TypeExpr>>,
        targs: &[TypeKey],
    ) -> Result<DeclId, TranslateError> {
        let d = match self.checker.decls.get(&generic) {
            Some(DeclInfo::Func(d)) => d.clone(),
            _ => return Err(self.missing_decl(generic)),
        };
        let tparams = self.signature_params(generic, false);
        self.check_arity(generic, tparams.len(), targs.len(), d.span)?;
        let ta = TypeArgs::new(&tparams, targ_syntax, targs, &self.checker.tc_objs);

        let name = self.obj_name(inst);
        self.trace_begin(&format!("instantiate func {}", name));
        let result = self.copy_func(&ta, &d, None, &name, inst);
        self.trace_end();
        Ok(self.push_instance(Decl::Func(result?)))
    }

    /// Writes the declaration of `inst`, the instance `named` of the generic
    /// type `generic`, followed by one instance of each of its methods.
    pub fn instantiate_type_decl(
        &mut self,
        generic: ObjKey,
        inst: ObjKey,
        named: TypeKey,
        targ_syntax: Vec<P<TypeExpr>>,
        targs: &[TypeKey],
    ) -> Result<(DeclId, TypeKey), TranslateError> {
        let d = match self.checker.decls.get(&generic) {
            Some(DeclInfo::Type(d)) => d.clone(),
            _ => return Err(self.missing_decl(generic)),
        };
        let objs = &self.checker.tc_objs;
        let (tparams, methods) = objs.lobjs[generic]
            .typ()
            .and_then(|t| objs.types[t].try_as_named())
            .map(|n| (n.tparams().to_vec(), n.methods().to_vec()))
            .unwrap_or_default();
        self.check_arity(generic, tparams.len(), targs.len(), d.span)?;
        let ta = TypeArgs::new(&tparams, targ_syntax, targs, &self.checker.tc_objs);

        let name = self.obj_name(inst);
        self.trace_begin(&format!("instantiate type {}", name));
        let ty = self.fold_type_expr(&ta, &d.ty);
        self.trace_end();
        let decl = TypeDecl {
            name: self.def_ident(&name, inst, d.name.span),
            tparams: Vec::new(),
            ty: ty?,
            span: d.span,
        };
        let id = self.push_instance(Decl::Type(P::new(decl)));

        for method in methods {
            if let Err(err) = self.instantiate_method(method, inst, named, targs) {
                self.report(err);
            }
        }
        Ok((id, named))
    }

    /// Copies the method `method` of a generic type for the instance
    /// `named`, declared as `type_obj`. The receiver names the instance and
    /// keeps its pointer.
    fn instantiate_method(
        &mut self,
        method: ObjKey,
        type_obj: ObjKey,
        named: TypeKey,
        targs: &[TypeKey],
    ) -> Result<DeclId, TranslateError> {
        let d = match self.checker.decls.get(&method) {
            Some(DeclInfo::Func(d)) => d.clone(),
            _ => return Err(self.missing_decl(method)),
        };
        let Some(recv) = &d.recv else {
            return Err(self.missing_decl(method));
        };
        let rparams = self.signature_params(method, true);
        self.check_arity(method, rparams.len(), targs.len(), d.span)?;
        let syntax = self.type_arg_syntax(targs, d.span)?;
        let ta = TypeArgs::new(&rparams, syntax, targs, &self.checker.tc_objs);

        let ptr = matches!(recv.ty.kind, TypeExprKind::Pointer(_));
        let base = self.use_ident(type_obj, recv.ty.span);
        let mut ty = self.new_type_expr(TypeExprKind::Ident(base), recv.ty.span, named);
        if ptr {
            let ptr_t = self.checker.tc_objs.new_t_pointer(named);
            ty = self.new_type_expr(TypeExprKind::Pointer(ty), recv.ty.span, ptr_t);
        }
        let recv = Receiver {
            name: recv.name,
            ty,
            span: recv.span,
        };

        let name = self.obj_name(method);
        let sig = self.checker.method_type(method, Some(named));
        let pkg = Some(self.checker.pkg);
        let obj = self.checker.tc_objs.new_func(d.name.span, pkg, name.clone(), Some(sig));
        self.checker.tc_objs.lobjs[obj].set_func_has_ptr_recv(ptr);

        self.trace_begin(&format!("instantiate method {}.{}", self.obj_name(type_obj), name));
        let result = self.copy_func(&ta, &d, Some(recv), &name, obj);
        self.trace_end();
        Ok(self.push_instance(Decl::Func(result?)))
    }

    fn copy_func(
        &mut self,
        ta: &TypeArgs,
        d: &FuncDecl,
        recv: Option<Receiver>,
        name: &str,
        obj: ObjKey,
    ) -> Result<P<FuncDecl>, TranslateError> {
        let sig = self.fold_sig(ta, &d.sig)?;
        let body = match &d.body {
            Some(body) => Some(self.fold_block(ta, body)?),
            None => None,
        };
        Ok(P::new(FuncDecl {
            recv,
            name: self.def_ident(name, obj, d.name.span),
            tparams: Vec::new(),
            sig,
            body,
            span: d.span,
        }))
    }

    fn push_instance(&mut self, decl: Decl) -> DeclId {
        self.instances.push(decl);
        DeclId(self.instances.len() - 1)
    }

    fn type_arg_syntax(&mut self, targs: &[TypeKey], span: Span) -> Result<Vec<P<TypeExpr>>, TranslateError> {
        let mut syntax = Vec::with_capacity(targs.len());
        for t in targs {
            syntax.push(self.type_to_ast(*t, span)?);
        }
        Ok(syntax)
    }

    /// Type parameters of the function `obj`, or its receiver type
    /// parameters when `receiver` is set.
    fn signature_params(&self, obj: ObjKey, receiver: bool) -> Vec<ObjKey> {
        let objs = &self.checker.tc_objs;
        objs.lobjs[obj]
            .typ()
            .and_then(|t| objs.types[t].try_as_signature())
            .map(|s| if receiver { s.rparams().to_vec() } else { s.tparams().to_vec() })
            .unwrap_or_default()
    }

    fn check_arity(&self, generic: ObjKey, want: usize, got: usize, span: Span) -> Result<(), TranslateError> {
        if want == got {
            return Ok(());
        }
        Err(TranslateError::Arity {
            name: self.obj_name(generic),
            got,
            want,
            span,
        })
    }

    // =========================================================================
    // Instance requests
    // =========================================================================

    fn instance_key(&self, generic: ObjKey, targs: &[TypeKey]) -> InstanceKey {
        InstanceKey {
            generic,
            hash: typ::instance_hash(generic, targs, &self.checker.tc_objs),
        }
    }

    fn fresh_name(&self, generic: ObjKey, targs: &[TypeKey]) -> String {
        let objs = &self.checker.tc_objs;
        let args: Vec<String> = targs.iter().map(|t| typ::type_string(*t, objs)).collect();
        let scope = &objs.scopes[self.checker.pkg_scope()];
        self.registry
            .fresh_name(objs.lobjs[generic].name(), &args, |name| scope.lookup(name).is_some())
    }

    fn declare_instance(&mut self, key: InstanceKey, name: String, obj: ObjKey) {
        let scope = self.checker.pkg_scope();
        let prev = self.checker.tc_objs.scopes[scope].insert(name.clone(), obj);
        debug_assert!(prev.is_none(), "instance name {} already declared", name);
        self.checker.tc_objs.lobjs[obj].set_parent(Some(scope));
        log::debug!("new instance {}", name);
        self.registry.insert(key, name, obj);
    }

    /// Object of the instance of the generic function `generic` for
    /// `targs`. The first request queues the instance.
    pub(crate) fn request_function(&mut self, generic: ObjKey, targs: Vec<TypeKey>, sig: TypeKey, span: Span) -> ObjKey {
        let key = self.instance_key(generic, &targs);
        if let Some(obj) = self.registry.get(&key) {
            return obj;
        }
        let name = self.fresh_name(generic, &targs);
        let pkg = Some(self.checker.pkg);
        let obj = self.checker.tc_objs.new_func(span, pkg, name.clone(), Some(sig));
        self.declare_instance(key, name, obj);
        self.worklist.push_back(Pending::Func {
            generic,
            inst: obj,
            targs,
            span,
        });
        obj
    }

    /// Type name object of the instantiated named type `named`. The first
    /// request queues the instance.
    pub(crate) fn request_type(&mut self, named: TypeKey, span: Span) -> Result<ObjKey, TranslateError> {
        let objs = &self.checker.tc_objs;
        let Some((generic, targs)) = objs.types[named]
            .try_as_named()
            .filter(|n| n.is_instance())
            .map(|n| (n.obj(), n.targs().to_vec()))
        else {
            return Err(TranslateError::Unrepresentable {
                typ: typ::type_string(named, objs),
                span,
            });
        };
        let key = self.instance_key(generic, &targs);
        if let Some(obj) = self.registry.get(&key) {
            return Ok(obj);
        }
        let name = self.fresh_name(generic, &targs);
        let pkg = Some(self.checker.pkg);
        let obj = self.checker.tc_objs.new_type_name(span, pkg, name.clone(), Some(named));
        self.declare_instance(key, name, obj);
        self.worklist.push_back(Pending::Type {
            generic,
            inst: obj,
            named,
            targs,
            span,
        });
        Ok(obj)
    }

    /// Makes sure the instance behind an annotation is emitted even when no
    /// syntax names it.
    pub(crate) fn require_instance(&mut self, t: TypeKey, span: Span) -> Result<(), TranslateError> {
        let t = typ::resolved(t, &self.checker.tc_objs);
        let is_instance = self.checker.tc_objs.types[t]
            .try_as_named()
            .is_some_and(|n| n.is_instance());
        if is_instance {
            self.request_type(t, span)?;
        }
        Ok(())
    }

    /// Reference to the instance of `generic` described by `inferred`, with
    /// the type arguments of `ta` substituted.
    pub(crate) fn instance_ref(
        &mut self,
        ta: &TypeArgs,
        generic: ObjKey,
        inferred: &Inferred,
        span: Span,
    ) -> (P<Expr>, Inferred) {
        let targs: Vec<TypeKey> = inferred.targs.iter().map(|t| self.subst(ta, *t)).collect();
        let sig = self.subst(ta, inferred.sig);
        if self.trace() {
            let objs = &self.checker.tc_objs;
            self.trace_print(&format!(
                "use {}[{}]",
                objs.lobjs[generic].name(),
                typ::type_list_string(&targs, objs)
            ));
        }
        let obj = self.request_function(generic, targs.clone(), sig, span);
        let ident = self.use_ident(obj, span);
        let expr = self.new_expr(ExprKind::Ident(ident), span, Some((OperandMode::Value, sig)));
        self.checker.result.record_inferred(expr.id, targs.clone(), sig);
        (expr, Inferred { targs, sig })
    }

    // =========================================================================
    // Types to syntax
    // =========================================================================

    /// Syntax denoting `t`. Instantiated named types become the name of
    /// their instance, which is queued on first use.
    pub fn type_to_ast(&mut self, t: TypeKey, span: Span) -> Result<P<TypeExpr>, TranslateError> {
        let t = self.checker.expand(t);
        let t = typ::untyped_default_type(t, &self.checker.tc_objs);
        let kind = match self.shape(t, span)? {
            Shape::Name(obj) => TypeExprKind::Ident(self.use_ident(obj, span)),
            Shape::Instance => {
                let obj = self.request_type(t, span)?;
                TypeExprKind::Ident(self.use_ident(obj, span))
            }
            Shape::Pointer(base) => TypeExprKind::Pointer(self.type_to_ast(base, span)?),
            Shape::Slice(elem) => TypeExprKind::Slice(self.type_to_ast(elem, span)?),
            Shape::Array(len, elem) => TypeExprKind::Array {
                len: self.int_lit(len, span),
                elem: self.type_to_ast(elem, span)?,
            },
            Shape::Map(key, value) => TypeExprKind::Map {
                key: self.type_to_ast(key, span)?,
                value: self.type_to_ast(value, span)?,
            },
            Shape::Chan(dir, elem) => TypeExprKind::Chan {
                dir,
                elem: self.type_to_ast(elem, span)?,
            },
            Shape::Func(sig) => TypeExprKind::Func(self.sig_to_ast(sig, span)?),
            Shape::Struct(fields) => {
                let mut list = Vec::with_capacity(fields.len());
                for (field, tag) in fields {
                    let (name, embedded, ft) = {
                        let obj = &self.checker.tc_objs.lobjs[field];
                        (obj.name().to_string(), obj.var_embedded(), obj.typ())
                    };
                    let ft = ft.ok_or_else(|| TranslateError::Unresolved {
                        what: format!("field {}", name),
                        span,
                    })?;
                    let names = if embedded {
                        Vec::new()
                    } else {
                        vec![self.def_ident(&name, field, span)]
                    };
                    list.push(Field {
                        names,
                        ty: self.type_to_ast(ft, span)?,
                        tag,
                        span,
                    });
                }
                TypeExprKind::Struct(list)
            }
            Shape::Interface {
                methods,
                embeddeds,
                types,
            } => {
                let mut elems = Vec::new();
                for m in methods {
                    let (name, mt) = {
                        let obj = &self.checker.tc_objs.lobjs[m];
                        (obj.name().to_string(), obj.typ())
                    };
                    let mt = mt.ok_or_else(|| TranslateError::Unresolved {
                        what: format!("method {}", name),
                        span,
                    })?;
                    elems.push(InterfaceElem::Method {
                        name: self.def_ident(&name, m, span),
                        sig: self.sig_to_ast(mt, span)?,
                        span,
                    });
                }
                for e in embeddeds {
                    elems.push(InterfaceElem::Embedded(self.type_to_ast(e, span)?));
                }
                if !types.is_empty() {
                    let mut list = Vec::with_capacity(types.len());
                    for t in types {
                        list.push(self.type_to_ast(t, span)?);
                    }
                    elems.push(InterfaceElem::TypeList(list));
                }
                TypeExprKind::Interface(elems)
            }
        };
        Ok(self.new_type_expr(kind, span, t))
    }

    fn shape(&self, t: TypeKey, span: Span) -> Result<Shape, TranslateError> {
        let objs = &self.checker.tc_objs;
        let unrepresentable = || TranslateError::Unrepresentable {
            typ: typ::type_string(t, objs),
            span,
        };
        let shape = match &objs.types[t] {
            Type::Basic(b) if b.typ() == BasicType::Invalid => return Err(unrepresentable()),
            Type::Basic(b) => {
                let universe = self.checker.universe().scope();
                Shape::Name(objs.scopes[universe].lookup(b.name()).ok_or_else(unrepresentable)?)
            }
            Type::Named(n) if n.is_instance() => Shape::Instance,
            Type::Named(n) if n.is_generic() => return Err(unrepresentable()),
            Type::Named(n) => Shape::Name(n.obj()),
            Type::Pointer(p) => Shape::Pointer(p.base()),
            Type::Slice(s) => Shape::Slice(s.elem()),
            Type::Array(a) => Shape::Array(a.len().ok_or_else(unrepresentable)?, a.elem()),
            Type::Map(m) => Shape::Map(m.key(), m.elem()),
            Type::Chan(c) => {
                let dir = match c.dir() {
                    ChanDir::SendRecv => ast::ChanDir::Both,
                    ChanDir::SendOnly => ast::ChanDir::Send,
                    ChanDir::RecvOnly => ast::ChanDir::Recv,
                };
                Shape::Chan(dir, c.elem())
            }
            Type::Signature(_) => Shape::Func(t),
            Type::Struct(s) => Shape::Struct(s.fields().iter().copied().zip(s.tags().iter().cloned()).collect()),
            Type::Interface(i) => Shape::Interface {
                methods: i.methods().to_vec(),
                embeddeds: i.embeddeds().to_vec(),
                types: i.types().to_vec(),
            },
            Type::Tuple(_) | Type::TypeParam(_) | Type::Instance(_) => return Err(unrepresentable()),
        };
        Ok(shape)
    }

    /// Signature syntax with unnamed parameters. The variadic parameter is
    /// written with its element type.
    fn sig_to_ast(&mut self, sig: TypeKey, span: Span) -> Result<P<FuncSig>, TranslateError> {
        let objs = &self.checker.tc_objs;
        let Some(s) = objs.types[sig].try_as_signature() else {
            return Err(TranslateError::Unrepresentable {
                typ: typ::type_string(sig, objs),
                span,
            });
        };
        let variadic = s.variadic();
        let mut params = tuple_types(s.params(), &self.checker.tc_objs);
        let results = tuple_types(s.results(), &self.checker.tc_objs);
        if variadic {
            if let Some(last) = params.last_mut() {
                if let Some(elem) = objs.types[*last].try_as_slice().map(|s| s.elem()) {
                    *last = elem;
                }
            }
        }

        let mut param_list = Vec::with_capacity(params.len());
        for t in params {
            param_list.push(Param {
                names: Vec::new(),
                ty: self.type_to_ast(t, span)?,
                span,
            });
        }
        let mut result_list = Vec::with_capacity(results.len());
        for t in results {
            result_list.push(Param {
                names: Vec::new(),
                ty: self.type_to_ast(t, span)?,
                span,
            });
        }
        Ok(P::new(FuncSig {
            params: param_list,
            results: result_list,
            variadic,
            span,
        }))
    }

    fn int_lit(&mut self, value: u64, span: Span) -> P<Expr> {
        let untyped_int = self.checker.universe().basic(BasicType::UntypedInt);
        let kind = ExprKind::BasicLit {
            kind: LitKind::Int,
            value: value.to_string(),
        };
        self.new_expr(kind, span, Some((OperandMode::Constant, untyped_int)))
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    pub(crate) fn subst(&mut self, ta: &TypeArgs, t: TypeKey) -> TypeKey {
        let t = typ::resolved(t, &self.checker.tc_objs);
        self.checker.subst(Span::dummy(), t, ta.smap())
    }

    fn ident(&mut self, name: &str, span: Span) -> Ident {
        Ident {
            id: self.ids.ident(),
            symbol: self.checker.interner.intern(name),
            span,
        }
    }

    /// New identifier referring to `obj`.
    pub(crate) fn use_ident(&mut self, obj: ObjKey, span: Span) -> Ident {
        let name = self.obj_name(obj);
        let ident = self.ident(&name, span);
        self.checker.result.record_use(ident.id, obj);
        ident
    }

    /// New identifier declaring `obj`.
    fn def_ident(&mut self, name: &str, obj: ObjKey, span: Span) -> Ident {
        let ident = self.ident(name, span);
        self.checker.result.record_def(ident.id, obj);
        ident
    }

    pub(crate) fn new_expr(&mut self, kind: ExprKind, span: Span, typ: Option<(OperandMode, TypeKey)>) -> P<Expr> {
        let id = self.ids.expr();
        if let Some((mode, t)) = typ {
            self.checker.result.record_type(id, mode, t);
        }
        P::new(Expr { id, kind, span })
    }

    pub(crate) fn new_type_expr(&mut self, kind: TypeExprKind, span: Span, t: TypeKey) -> P<TypeExpr> {
        let id = self.ids.type_expr();
        self.checker.result.record_type_expr(id, t);
        P::new(TypeExpr { id, kind, span })
    }

    // =========================================================================
    // Diagnostics and tracing
    // =========================================================================

    pub(crate) fn report(&mut self, err: TranslateError) {
        log::debug!("translation failed: {}", err);
        self.diagnostics.emit(err.diagnostic());
    }

    fn missing_decl(&self, obj: ObjKey) -> TranslateError {
        TranslateError::MissingDecl {
            name: self.obj_name(obj),
            span: self.checker.tc_objs.lobjs[obj].span(),
        }
    }

    fn obj_name(&self, obj: ObjKey) -> String {
        self.checker.tc_objs.lobjs[obj].name().to_string()
    }

    fn decl_name(&self, decl: &Decl) -> String {
        match decl {
            Decl::Var(d) => d
                .names
                .iter()
                .map(|n| self.checker.resolve_ident(n))
                .collect::<Vec<_>>()
                .join(", "),
            Decl::Type(d) => self.checker.resolve_ident(&d.name).to_string(),
            Decl::Func(d) => self.checker.resolve_ident(&d.name).to_string(),
        }
    }

    pub(crate) fn trace(&self) -> bool {
        self.config.trace_translator
    }

    pub(crate) fn trace_print(&self, msg: &str) {
        let indent = *self.trace_indent.borrow();
        log::trace!("{}{}", ".  ".repeat(indent), msg);
    }

    fn trace_begin(&self, msg: &str) {
        if self.trace() {
            self.trace_print(msg);
            *self.trace_indent.borrow_mut() += 1;
        }
    }

    fn trace_end(&self) {
        if self.trace() {
            let mut indent = self.trace_indent.borrow_mut();
            *indent = indent.saturating_sub(1);
        }
    }
}

fn tuple_types(tuple: TypeKey, objs: &gomono_analysis::TCObjects) -> Vec<TypeKey> {
    objs.types[tuple]
        .try_as_tuple()
        .map(|t| t.vars().iter().filter_map(|v| objs.lobjs[*v].typ()).collect())
        .unwrap_or_default()
}
