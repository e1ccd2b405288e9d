//! Rewriting syntax under a set of type arguments.
//!
//! Every `fold_*` function returns its input unchanged (the same `P`) when
//! nothing below it changed, so rewritten non-generic code shares its
//! untouched subtrees with the input. A node is rebuilt with a fresh id when
//! a child was rebuilt, when substitution changes its annotation, or when
//! the type arguments ask for a full copy.

use gomono_analysis::objects::ObjKey;
use gomono_analysis::{OperandMode, TypeAndValue};
use gomono_syntax::ast::{
    Block, CallExpr, CompositeLit, Decl, Expr, ExprKind, Field, FuncDecl, FuncSig, Ident, InterfaceElem,
    KeyedElement, Param, Receiver, Stmt, StmtKind, TypeDecl, TypeExpr, TypeExprKind, VarDecl, P,
};

use crate::error::TranslateError;
use crate::translator::Translator;
use crate::type_args::TypeArgs;

type Result<T> = std::result::Result<T, TranslateError>;

fn same<T>(a: &P<T>, b: &P<T>) -> bool {
    P::ptr_eq(a, b)
}

fn unparen(e: &P<Expr>) -> &P<Expr> {
    match &e.kind {
        ExprKind::Paren(inner) => unparen(inner),
        _ => e,
    }
}

impl<'a> Translator<'a> {
    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn fold_decl(&mut self, ta: &TypeArgs, decl: &Decl) -> Result<Decl> {
        match decl {
            Decl::Var(d) => Ok(Decl::Var(self.fold_var_decl(ta, d)?)),
            Decl::Type(d) => {
                let ty = self.fold_type_expr(ta, &d.ty)?;
                if same(&ty, &d.ty) && !ta.copies_all() {
                    return Ok(decl.clone());
                }
                Ok(Decl::Type(P::new(TypeDecl {
                    name: d.name,
                    tparams: Vec::new(),
                    ty,
                    span: d.span,
                })))
            }
            Decl::Func(d) => {
                let mut changed = ta.copies_all();
                let recv = match &d.recv {
                    Some(r) => Some(Receiver {
                        name: r.name,
                        ty: self.child_type(ta, &r.ty, &mut changed)?,
                        span: r.span,
                    }),
                    None => None,
                };
                let sig = self.fold_sig(ta, &d.sig)?;
                changed |= !same(&sig, &d.sig);
                let body = match &d.body {
                    Some(b) => Some(self.child_block(ta, b, &mut changed)?),
                    None => None,
                };
                if !changed {
                    return Ok(decl.clone());
                }
                Ok(Decl::Func(P::new(FuncDecl {
                    recv,
                    name: d.name,
                    tparams: Vec::new(),
                    sig,
                    body,
                    span: d.span,
                })))
            }
        }
    }

    pub(crate) fn fold_var_decl(&mut self, ta: &TypeArgs, d: &P<VarDecl>) -> Result<P<VarDecl>> {
        let mut changed = ta.copies_all();
        let ty = match &d.ty {
            Some(t) => Some(self.child_type(ta, t, &mut changed)?),
            None => None,
        };
        let values = self.child_exprs(ta, &d.values, &mut changed)?;
        if !changed {
            return Ok(d.clone());
        }
        Ok(P::new(VarDecl {
            names: d.names.clone(),
            ty,
            values,
            span: d.span,
        }))
    }

    pub(crate) fn fold_sig(&mut self, ta: &TypeArgs, sig: &P<FuncSig>) -> Result<P<FuncSig>> {
        let mut changed = ta.copies_all();
        let params = self.fold_params(ta, &sig.params, &mut changed)?;
        let results = self.fold_params(ta, &sig.results, &mut changed)?;
        if !changed {
            return Ok(sig.clone());
        }
        Ok(P::new(FuncSig {
            params,
            results,
            variadic: sig.variadic,
            span: sig.span,
        }))
    }

    fn fold_params(&mut self, ta: &TypeArgs, params: &[Param], changed: &mut bool) -> Result<Vec<Param>> {
        let mut out = Vec::with_capacity(params.len());
        for p in params {
            out.push(Param {
                names: p.names.clone(),
                ty: self.child_type(ta, &p.ty, changed)?,
                span: p.span,
            });
        }
        Ok(out)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn fold_block(&mut self, ta: &TypeArgs, block: &P<Block>) -> Result<P<Block>> {
        let mut changed = ta.copies_all();
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for s in &block.stmts {
            stmts.push(self.child_stmt(ta, s, &mut changed)?);
        }
        if !changed {
            return Ok(block.clone());
        }
        Ok(P::new(Block { stmts, span: block.span }))
    }

    pub(crate) fn fold_stmt(&mut self, ta: &TypeArgs, stmt: &P<Stmt>) -> Result<P<Stmt>> {
        let mut changed = ta.copies_all();
        let c = &mut changed;
        let kind = match &stmt.kind {
            StmtKind::Empty => StmtKind::Empty,
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
            StmtKind::Block(b) => StmtKind::Block(self.child_block(ta, b, c)?),
            StmtKind::Var(d) => {
                let nd = self.fold_var_decl(ta, d)?;
                *c |= !same(&nd, d);
                StmtKind::Var(nd)
            }
            StmtKind::ShortVar { names, values } => StmtKind::ShortVar {
                names: names.clone(),
                values: self.child_exprs(ta, values, c)?,
            },
            StmtKind::Expr(e) => StmtKind::Expr(self.child_expr(ta, e, c)?),
            StmtKind::Assign { lhs, op, rhs } => StmtKind::Assign {
                lhs: self.child_exprs(ta, lhs, c)?,
                op: *op,
                rhs: self.child_exprs(ta, rhs, c)?,
            },
            StmtKind::IncDec { expr, inc } => StmtKind::IncDec {
                expr: self.child_expr(ta, expr, c)?,
                inc: *inc,
            },
            StmtKind::Return(values) => StmtKind::Return(self.child_exprs(ta, values, c)?),
            StmtKind::If { init, cond, then, els } => StmtKind::If {
                init: self.child_opt_stmt(ta, init, c)?,
                cond: self.child_expr(ta, cond, c)?,
                then: self.child_block(ta, then, c)?,
                els: self.child_opt_stmt(ta, els, c)?,
            },
            StmtKind::For { init, cond, post, body } => StmtKind::For {
                init: self.child_opt_stmt(ta, init, c)?,
                cond: self.child_opt_expr(ta, cond, c)?,
                post: self.child_opt_stmt(ta, post, c)?,
                body: self.child_block(ta, body, c)?,
            },
            StmtKind::Range { key, value, expr, body } => StmtKind::Range {
                key: *key,
                value: *value,
                expr: self.child_expr(ta, expr, c)?,
                body: self.child_block(ta, body, c)?,
            },
            StmtKind::Go(e) => StmtKind::Go(self.child_expr(ta, e, c)?),
            StmtKind::Defer(e) => StmtKind::Defer(self.child_expr(ta, e, c)?),
        };
        if !changed {
            return Ok(stmt.clone());
        }
        Ok(P::new(Stmt { kind, span: stmt.span }))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn fold_expr(&mut self, ta: &TypeArgs, e: &P<Expr>) -> Result<P<Expr>> {
        let tv = self.checker.result.types.get(&e.id).copied();

        if let Some(inferred) = self.checker.result.inferred.get(&e.id).cloned() {
            match &e.kind {
                // f[int, string]
                ExprKind::Index { expr, .. } => {
                    if let Some(generic) = self.generic_func(expr) {
                        let (ident, _) = self.instance_ref(ta, generic, &inferred, e.span);
                        return Ok(ident);
                    }
                }
                // f(x), f[int](x, y)
                ExprKind::Call(call) => {
                    let callee = match &unparen(&call.func).kind {
                        ExprKind::Index { expr, .. } => expr,
                        _ => &call.func,
                    };
                    if let Some(generic) = self.generic_func(callee) {
                        let (func, inferred) = self.instance_ref(ta, generic, &inferred, call.func.span);
                        let args = self.child_exprs(ta, &call.args, &mut true)?;
                        let kind = ExprKind::Call(CallExpr {
                            func,
                            args,
                            spread: call.spread,
                        });
                        let expr = self.rebuilt_expr(ta, e, kind, tv)?;
                        self.checker
                            .result
                            .record_inferred(expr.id, inferred.targs, inferred.sig);
                        return Ok(expr);
                    }
                }
                _ => {}
            }
        }

        if let Some(tv) = tv.filter(|tv| tv.mode == OperandMode::TypeExpr) {
            match &e.kind {
                ExprKind::Ident(ident) => {
                    let replacement = self.type_param_syntax(ta, ident).cloned();
                    if let Some(rep) = replacement {
                        let ty = self.renumber(&rep)?;
                        return self.rebuilt_expr(ta, e, ExprKind::TypeAsExpr(ty), Some(tv));
                    }
                }
                ExprKind::Index { .. } => {
                    let t = self.subst(ta, tv.typ);
                    let ty = self.type_to_ast(t, e.span)?;
                    return self.rebuilt_expr(ta, e, ExprKind::TypeAsExpr(ty), Some(tv));
                }
                _ => {}
            }
        }

        let mut changed = ta.copies_all();
        let c = &mut changed;
        let kind = match &e.kind {
            ExprKind::Ident(_) | ExprKind::BasicLit { .. } => e.kind.clone(),
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: self.child_expr(ta, left, c)?,
                right: self.child_expr(ta, right, c)?,
            },
            ExprKind::Unary { op, expr } => ExprKind::Unary {
                op: *op,
                expr: self.child_expr(ta, expr, c)?,
            },
            ExprKind::Call(call) => ExprKind::Call(CallExpr {
                func: self.child_expr(ta, &call.func, c)?,
                args: self.child_exprs(ta, &call.args, c)?,
                spread: call.spread,
            }),
            ExprKind::Index { expr, indices } => ExprKind::Index {
                expr: self.child_expr(ta, expr, c)?,
                indices: self.child_exprs(ta, indices, c)?,
            },
            ExprKind::Slice { expr, low, high } => ExprKind::Slice {
                expr: self.child_expr(ta, expr, c)?,
                low: self.child_opt_expr(ta, low, c)?,
                high: self.child_opt_expr(ta, high, c)?,
            },
            ExprKind::Selector { expr, sel } => ExprKind::Selector {
                expr: self.child_expr(ta, expr, c)?,
                sel: *sel,
            },
            ExprKind::TypeAssert { expr, ty } => ExprKind::TypeAssert {
                expr: self.child_expr(ta, expr, c)?,
                ty: self.child_type(ta, ty, c)?,
            },
            ExprKind::CompositeLit(lit) => {
                let ty = self.child_type(ta, &lit.ty, c)?;
                let mut elems = Vec::with_capacity(lit.elems.len());
                for el in &lit.elems {
                    elems.push(KeyedElement {
                        key: self.child_opt_expr(ta, &el.key, c)?,
                        value: self.child_expr(ta, &el.value, c)?,
                    });
                }
                ExprKind::CompositeLit(CompositeLit { ty, elems })
            }
            ExprKind::FuncLit { sig, body } => {
                let new_sig = self.fold_sig(ta, sig)?;
                *c |= !same(&new_sig, sig);
                ExprKind::FuncLit {
                    sig: new_sig,
                    body: self.child_block(ta, body, c)?,
                }
            }
            ExprKind::Paren(inner) => ExprKind::Paren(self.child_expr(ta, inner, c)?),
            ExprKind::TypeAsExpr(ty) => ExprKind::TypeAsExpr(self.child_type(ta, ty, c)?),
        };

        let new_tv = tv.map(|tv| TypeAndValue::new(tv.mode, self.subst(ta, tv.typ)));
        if let Some(tv) = new_tv {
            self.require_instance(tv.typ, e.span)?;
        }
        if !changed && new_tv == tv {
            return Ok(e.clone());
        }
        Ok(self.new_expr(kind, e.span, new_tv.map(|tv| (tv.mode, tv.typ))))
    }

    /// Replacement for `e` with the annotation of `e` substituted.
    fn rebuilt_expr(
        &mut self,
        ta: &TypeArgs,
        e: &P<Expr>,
        kind: ExprKind,
        tv: Option<TypeAndValue>,
    ) -> Result<P<Expr>> {
        let annotation = match tv {
            Some(tv) => {
                let t = self.subst(ta, tv.typ);
                self.require_instance(t, e.span)?;
                Some((tv.mode, t))
            }
            None => None,
        };
        Ok(self.new_expr(kind, e.span, annotation))
    }

    /// The generic function an identifier callee refers to.
    fn generic_func(&self, e: &P<Expr>) -> Option<ObjKey> {
        let ExprKind::Ident(ident) = &unparen(e).kind else {
            return None;
        };
        let obj = *self.checker.result.uses.get(&ident.id)?;
        let objs = &self.checker.tc_objs;
        let lobj = &objs.lobjs[obj];
        if !lobj.is_func() {
            return None;
        }
        let generic = lobj
            .typ()
            .and_then(|t| objs.types[t].try_as_signature())
            .is_some_and(|s| !s.tparams().is_empty());
        generic.then_some(obj)
    }

    fn type_param_syntax<'t>(&self, ta: &'t TypeArgs, ident: &Ident) -> Option<&'t P<TypeExpr>> {
        let obj = self.checker.result.uses.get(&ident.id)?;
        ta.syntax(*obj)
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    pub(crate) fn fold_type_expr(&mut self, ta: &TypeArgs, te: &P<TypeExpr>) -> Result<P<TypeExpr>> {
        let recorded = self.checker.result.type_exprs.get(&te.id).copied();
        let mut changed = ta.copies_all();
        let c = &mut changed;
        let kind = match &te.kind {
            TypeExprKind::Ident(ident) => {
                if let Some(rep) = self.type_param_syntax(ta, ident).cloned() {
                    return self.renumber(&rep);
                }
                TypeExprKind::Ident(*ident)
            }
            TypeExprKind::Instance { base, .. } => {
                let Some(t) = recorded else {
                    return Err(TranslateError::Unresolved {
                        what: format!("instantiation of {}", self.checker.resolve_ident(base)),
                        span: te.span,
                    });
                };
                let t = self.subst(ta, t);
                return self.type_to_ast(t, te.span);
            }
            TypeExprKind::Array { len, elem } => TypeExprKind::Array {
                len: self.child_expr(ta, len, c)?,
                elem: self.child_type(ta, elem, c)?,
            },
            TypeExprKind::Slice(elem) => TypeExprKind::Slice(self.child_type(ta, elem, c)?),
            TypeExprKind::Map { key, value } => TypeExprKind::Map {
                key: self.child_type(ta, key, c)?,
                value: self.child_type(ta, value, c)?,
            },
            TypeExprKind::Chan { dir, elem } => TypeExprKind::Chan {
                dir: *dir,
                elem: self.child_type(ta, elem, c)?,
            },
            TypeExprKind::Func(sig) => {
                let new_sig = self.fold_sig(ta, sig)?;
                *c |= !same(&new_sig, sig);
                TypeExprKind::Func(new_sig)
            }
            TypeExprKind::Struct(fields) => {
                let mut list = Vec::with_capacity(fields.len());
                for f in fields {
                    list.push(Field {
                        names: f.names.clone(),
                        ty: self.child_type(ta, &f.ty, c)?,
                        tag: f.tag.clone(),
                        span: f.span,
                    });
                }
                TypeExprKind::Struct(list)
            }
            TypeExprKind::Pointer(base) => TypeExprKind::Pointer(self.child_type(ta, base, c)?),
            TypeExprKind::Interface(elems) => {
                let mut list = Vec::with_capacity(elems.len());
                for el in elems {
                    list.push(match el {
                        InterfaceElem::Method { name, sig, span } => {
                            let new_sig = self.fold_sig(ta, sig)?;
                            *c |= !same(&new_sig, sig);
                            InterfaceElem::Method {
                                name: *name,
                                sig: new_sig,
                                span: *span,
                            }
                        }
                        InterfaceElem::Embedded(t) => InterfaceElem::Embedded(self.child_type(ta, t, c)?),
                        InterfaceElem::TypeList(types) => {
                            let mut out = Vec::with_capacity(types.len());
                            for t in types {
                                out.push(self.child_type(ta, t, c)?);
                            }
                            InterfaceElem::TypeList(out)
                        }
                    });
                }
                TypeExprKind::Interface(list)
            }
        };

        let new_t = recorded.map(|t| self.subst(ta, t));
        if !changed && new_t == recorded {
            return Ok(te.clone());
        }
        Ok(match new_t {
            Some(t) => self.new_type_expr(kind, te.span, t),
            None => P::new(TypeExpr {
                id: self.ids.type_expr(),
                kind,
                span: te.span,
            }),
        })
    }

    /// A copy of replacement syntax with fresh ids, so each use of a type
    /// parameter gets its own nodes.
    fn renumber(&mut self, te: &P<TypeExpr>) -> Result<P<TypeExpr>> {
        self.fold_type_expr(&TypeArgs::renumbering(), te)
    }

    // =========================================================================
    // Children
    // =========================================================================

    fn child_expr(&mut self, ta: &TypeArgs, e: &P<Expr>, changed: &mut bool) -> Result<P<Expr>> {
        let new = self.fold_expr(ta, e)?;
        *changed |= !same(&new, e);
        Ok(new)
    }

    fn child_exprs(&mut self, ta: &TypeArgs, list: &[P<Expr>], changed: &mut bool) -> Result<Vec<P<Expr>>> {
        list.iter().map(|e| self.child_expr(ta, e, changed)).collect()
    }

    fn child_opt_expr(&mut self, ta: &TypeArgs, e: &Option<P<Expr>>, changed: &mut bool) -> Result<Option<P<Expr>>> {
        e.as_ref().map(|e| self.child_expr(ta, e, changed)).transpose()
    }

    fn child_type(&mut self, ta: &TypeArgs, te: &P<TypeExpr>, changed: &mut bool) -> Result<P<TypeExpr>> {
        let new = self.fold_type_expr(ta, te)?;
        *changed |= !same(&new, te);
        Ok(new)
    }

    fn child_block(&mut self, ta: &TypeArgs, b: &P<Block>, changed: &mut bool) -> Result<P<Block>> {
        let new = self.fold_block(ta, b)?;
        *changed |= !same(&new, b);
        Ok(new)
    }

    fn child_stmt(&mut self, ta: &TypeArgs, s: &P<Stmt>, changed: &mut bool) -> Result<P<Stmt>> {
        let new = self.fold_stmt(ta, s)?;
        *changed |= !same(&new, s);
        Ok(new)
    }

    fn child_opt_stmt(&mut self, ta: &TypeArgs, s: &Option<P<Stmt>>, changed: &mut bool) -> Result<Option<P<Stmt>>> {
        s.as_ref().map(|s| self.child_stmt(ta, s, changed)).transpose()
    }
}
