//! The checker session.
//!
//! A [`Checker`] owns everything one checking session allocates: the object
//! and type arenas, the symbol interner, the collected diagnostics, the
//! recorded [`TypeInfo`] and the canonical instantiation cache. Independent
//! sessions share nothing.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use gomono_common::config::TraceConfig;
use gomono_common::diagnostics::{Diagnostic, DiagnosticSink};
use gomono_common::span::Span;
use gomono_common::symbol::{Symbol, SymbolInterner};
use gomono_syntax::ast::{Expr, File, FuncDecl, Ident, Stmt, TypeDecl, VarDecl, P};

use super::errors::{CheckError, TypeError};
use super::format;
use super::type_info::TypeInfo;
use crate::objects::{ObjKey, PackageKey, ScopeKey, TCObjects, TypeKey};
use crate::scope::Scope;
use crate::universe::Universe;

/// Context of the object whose body or initializer is being checked.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjContext {
    /// Signature of the enclosing function, if any.
    pub sig: Option<TypeKey>,
    /// Innermost scope for lookups.
    pub scope: Option<ScopeKey>,
}

/// Package-level declaration syntax of an object.
#[derive(Clone, Debug)]
pub enum DeclInfo {
    Type(P<TypeDecl>),
    Func(P<FuncDecl>),
    /// A var declaration together with every object it declares.
    Var(P<VarDecl>, Vec<ObjKey>),
}

pub type DelayedAction = Box<dyn FnOnce(&mut Checker)>;

pub struct Checker {
    pub tc_objs: TCObjects,
    pub interner: SymbolInterner,
    /// Diagnostics collector (interior mutability for &self reporting).
    pub diagnostics: RefCell<DiagnosticSink>,
    pub pkg: PackageKey,
    pub result: TypeInfo,
    pub config: TraceConfig,
    pub trace_indent: Rc<RefCell<usize>>,
    pub octx: ObjContext,
    /// Canonical instantiations of generic named types, keyed by
    /// [`crate::typ::instance_hash`].
    pub typ_map: HashMap<String, TypeKey>,
    /// Declaration syntax of package-level objects and methods.
    pub decls: HashMap<ObjKey, DeclInfo>,
    /// Package-level objects in source order.
    pub(crate) decl_order: Vec<ObjKey>,
    /// Spans of the embedded elements of interface types.
    pub(crate) pos_map: HashMap<TypeKey, Vec<Span>>,
    pub(crate) delayed: Vec<DelayedAction>,
    /// Objects whose declaration has been fully checked.
    pub(crate) resolved: HashSet<ObjKey>,
    /// Objects whose declaration is being checked.
    pub(crate) resolving: HashSet<ObjKey>,
    /// Set once function bodies are checked: instance placeholders are
    /// expanded as soon as they are created.
    pub(crate) eager: bool,
    next_tparam_id: u64,
}

impl Checker {
    pub fn new(interner: SymbolInterner, config: TraceConfig) -> Checker {
        let mut tc_objs = TCObjects::new();
        let pkg = tc_objs.new_package("main".to_string());
        Checker {
            tc_objs,
            interner,
            diagnostics: RefCell::new(DiagnosticSink::new()),
            pkg,
            result: TypeInfo::new(),
            config,
            trace_indent: Rc::new(RefCell::new(0)),
            octx: ObjContext::default(),
            typ_map: HashMap::new(),
            decls: HashMap::new(),
            decl_order: Vec::new(),
            pos_map: HashMap::new(),
            delayed: Vec::new(),
            resolved: HashSet::new(),
            resolving: HashSet::new(),
            eager: false,
            next_tparam_id: 0,
        }
    }

    pub fn universe(&self) -> &Universe {
        self.tc_objs.universe()
    }

    pub fn objects(&self) -> &TCObjects {
        &self.tc_objs
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.result
    }

    pub fn type_info_mut(&mut self) -> &mut TypeInfo {
        &mut self.result
    }

    pub fn resolve_symbol(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol).unwrap_or("<unknown>")
    }

    pub fn resolve_ident(&self, ident: &Ident) -> &str {
        self.resolve_symbol(ident.symbol)
    }

    pub fn invalid_type(&self) -> TypeKey {
        self.tc_objs.universe().invalid()
    }

    pub fn pkg_scope(&self) -> ScopeKey {
        self.tc_objs.pkgs[self.pkg].scope()
    }

    pub(crate) fn next_tparam_id(&mut self) -> u64 {
        let id = self.next_tparam_id;
        self.next_tparam_id += 1;
        id
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().emit(diagnostic);
    }

    pub(crate) fn error_code(&self, code: TypeError, span: Span) {
        self.emit(code.at(span));
    }

    pub(crate) fn error_code_msg(&self, code: TypeError, span: Span, msg: impl Into<String>) {
        self.emit(code.at_with_message(span, msg));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().error_count()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow_mut().take()
    }

    // =========================================================================
    // Tracing
    // =========================================================================

    pub(crate) fn trace(&self) -> bool {
        self.config.trace_checker
    }

    pub(crate) fn trace_print(&self, msg: &str) {
        let indent = *self.trace_indent.borrow();
        log::trace!("{}{}", ".  ".repeat(indent), msg);
    }

    pub(crate) fn trace_expr(&self, expr: &Expr) {
        if self.trace() {
            let s = format::format_expr(expr, &self.interner);
            self.trace_print(&format!("expr[ {} ]", s));
            *self.trace_indent.borrow_mut() += 1;
        }
    }

    pub(crate) fn trace_stmt(&self, stmt: &Stmt) {
        if self.trace() {
            let s = format::format_stmt(stmt, &self.interner);
            self.trace_print(&format!("stmt[ {} ]", s));
            *self.trace_indent.borrow_mut() += 1;
        }
    }

    pub(crate) fn trace_end(&self) {
        if self.trace() {
            let indent = &mut *self.trace_indent.borrow_mut();
            *indent = indent.saturating_sub(1);
        }
    }

    // =========================================================================
    // Scopes and delayed actions
    // =========================================================================

    /// Innermost scope of the current context.
    pub(crate) fn current_scope(&self) -> ScopeKey {
        self.octx.scope.unwrap_or_else(|| self.pkg_scope())
    }

    /// Looks `name` up from the current scope outwards.
    pub(crate) fn lookup(&self, name: &str) -> Option<ObjKey> {
        Scope::lookup_parent(self.current_scope(), name, &self.tc_objs).map(|(_, obj)| obj)
    }

    /// Declares `obj` in `scope`, reporting a redeclaration. Blank names are
    /// never declared.
    pub(crate) fn declare(&mut self, scope: ScopeKey, ident: Option<&Ident>, obj: ObjKey) {
        let name = self.tc_objs.lobjs[obj].name().to_string();
        if let Some(ident) = ident {
            self.result.record_def(ident.id, obj);
        }
        if name == "_" {
            return;
        }
        if let Some(other) = self.tc_objs.scopes[scope].insert(name.clone(), obj) {
            let span = self.tc_objs.lobjs[obj].span();
            let other_span = self.tc_objs.lobjs[other].span();
            let mut diag = TypeError::Redeclared.at_with_message(span, format!("{} redeclared in this block", name));
            if !other_span.is_dummy() {
                diag = diag.with_label(
                    gomono_common::diagnostics::Label::secondary(other_span)
                        .with_message(format!("other declaration of {}", name)),
                );
            }
            self.emit(diag);
            return;
        }
        self.tc_objs.lobjs[obj].set_parent(Some(scope));
    }

    pub(crate) fn later(&mut self, action: DelayedAction) {
        self.delayed.push(action);
    }

    /// Runs delayed actions starting at `top`, including the ones they
    /// schedule themselves.
    pub(crate) fn process_delayed(&mut self, top: usize) {
        while self.delayed.len() > top {
            let actions: Vec<DelayedAction> = self.delayed.drain(top..).collect();
            for action in actions {
                action(self);
            }
        }
    }

    // =========================================================================
    // Main entry point
    // =========================================================================

    /// Checks a single-file package. Diagnostics are collected in the
    /// session; the error lists how many of them are errors.
    pub fn check_file(&mut self, file: &File) -> Result<PackageKey, CheckError> {
        let name = self.resolve_ident(&file.package).to_string();
        self.tc_objs.pkgs[self.pkg].set_name(name);

        self.collect_objects(file);
        self.package_types();
        self.package_signatures();
        self.process_delayed(0);
        self.eager = true;
        self.package_bodies();
        self.process_delayed(0);

        let errors = self.error_count();
        if self.trace() {
            log::debug!(
                "checked package {}: {} instantiation(s), {} error(s)",
                self.tc_objs.pkgs[self.pkg],
                self.typ_map.len(),
                errors
            );
        }
        if errors > 0 {
            return Err(CheckError::CheckFailed(errors));
        }
        Ok(self.pkg)
    }
}
