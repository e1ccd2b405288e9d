//! Function bodies and statements.

use std::collections::HashSet;

use gomono_common::span::Span;
use gomono_syntax::ast::{BinaryOp, Block, Expr, ExprKind, Ident, Stmt, StmtKind, VarDecl, P};

use super::checker::{Checker, ObjContext};
use super::errors::TypeError;
use crate::objects::{ObjKey, ScopeKey, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, BasicInfo, BasicType, Type};

impl Checker {
    /// Checks the body of a function with signature `sig`. The body shares
    /// the scope of the parameters.
    pub(crate) fn func_body(&mut self, sig: TypeKey, body: &Block) {
        let scope = self.tc_objs.types[sig]
            .try_as_signature()
            .and_then(|s| s.scope())
            .or(self.octx.scope);
        let saved = std::mem::replace(&mut self.octx, ObjContext { sig: Some(sig), scope });
        self.stmt_list(&body.stmts);
        self.octx = saved;
    }

    fn stmt_list(&mut self, stmts: &[P<Stmt>]) {
        for s in stmts {
            self.stmt(s);
        }
    }

    fn open_scope(&mut self, span: Span, comment: &str) -> Option<ScopeKey> {
        let parent = self.current_scope();
        let scope = self.tc_objs.new_scope(Some(parent), span, comment, false);
        self.octx.scope.replace(scope)
    }

    fn close_scope(&mut self, saved: Option<ScopeKey>) {
        self.octx.scope = saved;
    }

    fn block(&mut self, b: &Block) {
        let saved = self.open_scope(b.span, "block");
        self.stmt_list(&b.stmts);
        self.close_scope(saved);
    }

    fn stmt(&mut self, s: &Stmt) {
        self.trace_stmt(s);
        match &s.kind {
            StmtKind::Empty | StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Block(b) => self.block(b),
            StmtKind::Var(d) => self.local_var_decl(d),
            StmtKind::ShortVar { names, values } => self.short_var_decl(names, values, s.span),
            StmtKind::Expr(e) => self.expr_stmt(e),
            StmtKind::Assign { lhs, op: None, rhs } => self.assign_stmt(lhs, rhs, s.span),
            StmtKind::Assign { lhs, op: Some(op), rhs } => self.op_assign_stmt(lhs, *op, rhs, s.span),
            StmtKind::IncDec { expr, inc } => self.inc_dec_stmt(expr, *inc),
            StmtKind::Return(values) => self.return_stmt(values, s.span),
            StmtKind::If { init, cond, then, els } => {
                let saved = self.open_scope(s.span, "if");
                if let Some(init) = init {
                    self.stmt(init);
                }
                self.condition(cond, "if statement");
                self.block(then);
                if let Some(els) = els {
                    self.stmt(els);
                }
                self.close_scope(saved);
            }
            StmtKind::For { init, cond, post, body } => {
                let saved = self.open_scope(s.span, "for");
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(cond) = cond {
                    self.condition(cond, "for statement");
                }
                if let Some(post) = post {
                    self.stmt(post);
                }
                self.block(body);
                self.close_scope(saved);
            }
            StmtKind::Range { key, value, expr, body } => {
                self.range_stmt(key.as_ref(), value.as_ref(), expr, body, s.span)
            }
            StmtKind::Go(e) => self.call_stmt(e, "go"),
            StmtKind::Defer(e) => self.call_stmt(e, "defer"),
        }
        self.trace_end();
    }

    fn local_var_decl(&mut self, d: &VarDecl) {
        let vars: Vec<ObjKey> = d
            .names
            .iter()
            .map(|ident| {
                let name = self.resolve_ident(ident).to_string();
                self.tc_objs.new_var(ident.span, Some(self.pkg), name, None)
            })
            .collect();
        self.var_decl(d, &vars);
        // the variables are in scope after the declaration only
        let scope = self.current_scope();
        for (ident, v) in d.names.iter().zip(vars) {
            self.declare(scope, Some(ident), v);
        }
    }

    fn short_var_decl(&mut self, names: &[Ident], values: &[P<Expr>], span: Span) {
        let scope = self.current_scope();
        let mut seen = HashSet::new();
        let mut lhs = Vec::with_capacity(names.len());
        let mut new_vars = Vec::new();
        for ident in names {
            let name = self.resolve_ident(ident).to_string();
            if name != "_" && !seen.insert(name.clone()) {
                self.error_code_msg(
                    TypeError::Redeclared,
                    ident.span,
                    format!("{} repeated on left side of :=", name),
                );
            }
            let existing = match name.as_str() {
                "_" => None,
                _ => self.tc_objs.scopes[scope].lookup(&name),
            };
            match existing {
                Some(obj) if self.tc_objs.lobjs[obj].is_var() => {
                    self.result.record_use(ident.id, obj);
                    lhs.push((obj, false));
                }
                Some(_) => {
                    self.error_code_msg(TypeError::InvalidOp, ident.span, format!("cannot assign to {}", name));
                    let v = self.tc_objs.new_var(ident.span, Some(self.pkg), name, None);
                    lhs.push((v, true));
                }
                None => {
                    let blank = name == "_";
                    let v = self.tc_objs.new_var(ident.span, Some(self.pkg), name, None);
                    if !blank {
                        new_vars.push(v);
                    }
                    lhs.push((v, true));
                }
            }
        }

        let invalid = self.invalid_type();
        match self.rhs_operands(values, lhs.len(), span, false) {
            Some(rhs) => {
                for ((v, fresh), mut x) in lhs.iter().copied().zip(rhs) {
                    if fresh {
                        self.assignment(&mut x, None, "assignment");
                        let t = if x.invalid() { invalid } else { x.typ_or_invalid(&self.tc_objs) };
                        self.tc_objs.lobjs[v].set_type(Some(t));
                    } else {
                        let t = self.tc_objs.lobjs[v].typ();
                        self.assignment(&mut x, t, "assignment");
                    }
                }
            }
            None => {
                for (v, fresh) in &lhs {
                    if *fresh {
                        self.tc_objs.lobjs[*v].set_type(Some(invalid));
                    }
                }
            }
        }

        if new_vars.is_empty() {
            self.error_code_msg(TypeError::InvalidOp, span, "no new variables on left side of :=");
        }
        for (ident, (v, fresh)) in names.iter().zip(lhs) {
            if fresh {
                self.declare(scope, Some(ident), v);
            }
        }
    }

    /// Evaluates the right-hand side of an assignment to `n` targets. A
    /// single multi-valued call or comma-ok expression can provide several
    /// values.
    pub(crate) fn rhs_operands(
        &mut self,
        values: &[P<Expr>],
        n: usize,
        span: Span,
        returning: bool,
    ) -> Option<Vec<Operand>> {
        if let ([value], true) = (values, n != 1) {
            let x = self.multi_expr(value);
            if x.invalid() {
                return None;
            }
            if n == 2 && matches!(x.mode, OperandMode::MapIndex | OperandMode::CommaOk) {
                let mut ok = Operand::with_mode(
                    OperandMode::Value,
                    Some(self.universe().basic(BasicType::UntypedBool)),
                );
                ok.span = x.span;
                let mut first = x;
                first.mode = OperandMode::Value;
                return Some(vec![first, ok]);
            }
            let t = x.typ_or_invalid(&self.tc_objs);
            let got = match self.tc_objs.types[t].try_as_tuple() {
                Some(tuple) if tuple.vars().len() == n => {
                    let ops = tuple
                        .vars()
                        .iter()
                        .map(|v| {
                            let mut op = Operand::with_mode(OperandMode::Value, self.tc_objs.lobjs[*v].typ());
                            op.span = x.span;
                            op
                        })
                        .collect();
                    return Some(ops);
                }
                Some(tuple) => tuple.vars().len(),
                None => 1,
            };
            self.count_mismatch(span, n, got, returning);
            return None;
        }

        let ops: Vec<Operand> = values.iter().map(|v| self.expr(v)).collect();
        if ops.len() != n {
            self.count_mismatch(span, n, ops.len(), returning);
            return None;
        }
        Some(ops)
    }

    fn count_mismatch(&self, span: Span, want: usize, have: usize, returning: bool) {
        if returning {
            self.error_code_msg(
                TypeError::WrongArgCount,
                span,
                format!("wrong number of return values (have {}, want {})", have, want),
            );
        } else {
            self.assign_mismatch(span, want, have);
        }
    }

    fn assign_stmt(&mut self, lhs: &[P<Expr>], rhs: &[P<Expr>], span: Span) {
        match self.rhs_operands(rhs, lhs.len(), span, false) {
            Some(values) => {
                for (l, mut x) in lhs.iter().zip(values) {
                    self.assign_var(l, &mut x);
                }
            }
            None => {
                for l in lhs {
                    if !is_blank(l, self) {
                        self.expr(l);
                    }
                }
            }
        }
    }

    fn op_assign_stmt(&mut self, lhs: &[P<Expr>], op: BinaryOp, rhs: &[P<Expr>], span: Span) {
        let ([l], [r]) = (lhs, rhs) else {
            self.error_code_msg(
                TypeError::InvalidOp,
                span,
                format!("assignment operation {}= requires single-valued expressions", op.as_str()),
            );
            return;
        };
        let mut x = Operand::new();
        self.binary(&mut x, op, l, r);
        if x.invalid() {
            return;
        }
        x.span = span;
        self.assign_var(l, &mut x);
    }

    fn inc_dec_stmt(&mut self, e: &P<Expr>, inc: bool) {
        let x = self.expr(e);
        if x.invalid() {
            return;
        }
        let op = if inc { "++" } else { "--" };
        if !self.all_of(x.typ_or_invalid(&self.tc_objs), typ::is_numeric) {
            let s = self.operand_string(&x);
            self.error_code_msg(TypeError::InvalidOp, e.span, format!("invalid operation: {}{} (non-numeric type)", s, op));
            return;
        }
        if !matches!(x.mode, OperandMode::Variable | OperandMode::MapIndex) {
            let s = self.operand_string(&x);
            self.error_code_msg(TypeError::InvalidOp, e.span, format!("cannot assign to {}", s));
        }
    }

    /// Assigns `x` to the target `lhs`. The blank identifier accepts any
    /// value.
    fn assign_var(&mut self, lhs: &P<Expr>, x: &mut Operand) {
        if is_blank(lhs, self) {
            self.assignment(x, None, "assignment to _");
            return;
        }
        let z = self.expr(lhs);
        if z.invalid() {
            return;
        }
        if !matches!(z.mode, OperandMode::Variable | OperandMode::MapIndex) {
            let s = self.operand_string(&z);
            self.error_code_msg(TypeError::InvalidOp, z.span, format!("cannot assign to {}", s));
            return;
        }
        self.assignment(x, z.typ, "assignment");
    }

    fn return_stmt(&mut self, values: &[P<Expr>], span: Span) {
        let Some(sig) = self.octx.sig else {
            return;
        };
        let results = self.tc_objs.types[sig]
            .try_as_signature()
            .map(|s| typ::tuple_vars(s.results(), &self.tc_objs).to_vec())
            .unwrap_or_default();
        if values.is_empty() {
            let named = results.first().is_some_and(|r| !self.tc_objs.lobjs[*r].name().is_empty());
            if !results.is_empty() && !named {
                self.count_mismatch(span, results.len(), 0, true);
            }
            return;
        }
        if results.is_empty() {
            self.use_exprs(values);
            self.error_code_msg(TypeError::WrongArgCount, span, "too many return values");
            return;
        }
        let Some(ops) = self.rhs_operands(values, results.len(), span, true) else {
            return;
        };
        for (r, mut x) in results.into_iter().zip(ops) {
            let t = self.tc_objs.lobjs[r].typ();
            self.assignment(&mut x, t, "return statement");
        }
    }

    fn condition(&mut self, cond: &P<Expr>, context: &str) {
        let mut x = self.expr(cond);
        if x.invalid() {
            return;
        }
        let t = x.typ_or_invalid(&self.tc_objs);
        if !self.all_of(t, typ::is_boolean) {
            let s = self.operand_string(&x);
            self.error_code_msg(TypeError::InvalidOp, cond.span, format!("non-boolean condition {} in {}", s, context));
            return;
        }
        let d = typ::untyped_default_type(t, &self.tc_objs);
        self.convert_untyped(&mut x, d);
    }

    fn range_stmt(&mut self, key: Option<&Ident>, value: Option<&Ident>, e: &P<Expr>, body: &Block, span: Span) {
        let saved = self.open_scope(span, "range");
        let mut x = self.expr(e);
        let invalid = self.invalid_type();
        let (kt, vt) = if x.invalid() {
            (invalid, Some(invalid))
        } else {
            let t = x.typ_or_invalid(&self.tc_objs);
            let d = typ::untyped_default_type(t, &self.tc_objs);
            self.convert_untyped(&mut x, d);
            let u = self.under(d);
            let objs = &self.tc_objs;
            let int = objs.universe().basic(BasicType::Int);
            let iteration = match &objs.types[u] {
                Type::Basic(b) if b.info() == BasicInfo::IsString => Some((int, Some(objs.universe().rune()))),
                Type::Array(a) => Some((int, Some(a.elem()))),
                Type::Slice(s) => Some((int, Some(s.elem()))),
                Type::Map(m) => Some((m.key(), Some(m.elem()))),
                Type::Chan(c) => Some((c.elem(), None)),
                Type::Pointer(p) => objs.types[typ::underlying_type(p.base(), objs)]
                    .try_as_array()
                    .map(|a| (int, Some(a.elem()))),
                _ => None,
            };
            match iteration {
                Some((kt, None)) if value.is_some() => {
                    let s = self.operand_string(&x);
                    self.error_code_msg(
                        TypeError::CannotRange,
                        e.span,
                        format!("range over {} permits only one iteration variable", s),
                    );
                    (kt, Some(invalid))
                }
                Some(kv) => kv,
                None => {
                    let s = self.operand_string(&x);
                    self.error_code_msg(TypeError::CannotRange, e.span, format!("cannot range over {}", s));
                    (invalid, Some(invalid))
                }
            }
        };

        let scope = self.current_scope();
        let vars: Vec<(&Ident, TypeKey)> = [(key, Some(kt)), (value, vt)]
            .into_iter()
            .filter_map(|(ident, t)| Some((ident?, t.unwrap_or(invalid))))
            .collect();
        for (ident, t) in vars {
            let name = self.resolve_ident(ident).to_string();
            let v = self.tc_objs.new_var(ident.span, Some(self.pkg), name, Some(t));
            self.declare(scope, Some(ident), v);
        }
        self.block(body);
        self.close_scope(saved);
    }

    fn expr_stmt(&mut self, e: &P<Expr>) {
        let x = self.raw_expr(e, false);
        if x.invalid() {
            return;
        }
        let builtin_callee = match &unparen(e).kind {
            ExprKind::Call(call) => Some(
                self.result
                    .types
                    .get(&call.func.id)
                    .is_some_and(|tv| matches!(tv.mode, OperandMode::Builtin(_))),
            ),
            _ => None,
        };
        let unused = match builtin_callee {
            None => true,
            Some(builtin) => builtin && x.mode != OperandMode::NoValue,
        };
        if unused {
            let s = self.expr_string(&x);
            self.error_code_msg(TypeError::InvalidOp, e.span, format!("{} is not used", s));
        }
    }

    fn call_stmt(&mut self, e: &P<Expr>, keyword: &str) {
        if !matches!(unparen(e).kind, ExprKind::Call(_)) {
            self.error_code_msg(
                TypeError::InvalidOp,
                e.span,
                format!("expression in {} must be function call", keyword),
            );
        }
        self.raw_expr(e, false);
    }
}

fn unparen(e: &Expr) -> &Expr {
    match &e.kind {
        ExprKind::Paren(inner) => unparen(inner),
        _ => e,
    }
}

fn is_blank(e: &Expr, c: &Checker) -> bool {
    matches!(&e.kind, ExprKind::Ident(ident) if c.resolve_ident(ident) == "_")
}

#[cfg(test)]
mod tests {
    use gomono_common::config::TraceConfig;
    use gomono_syntax::ast::Decl;
    use gomono_syntax::AstBuilder;

    use super::*;

    fn check_body(build: impl FnOnce(&AstBuilder) -> Vec<P<Stmt>>) -> Vec<String> {
        let b = AstBuilder::new();
        let stmts = build(&b);
        let body = b.block(stmts);
        let decls: Vec<Decl> = vec![b.func_decl("main", Vec::new(), b.sig(Vec::new(), Vec::new()), body)];
        let file = b.file("main", decls);
        let (interner, _) = b.into_parts();
        let mut c = Checker::new(interner, TraceConfig::default());
        let _ = c.check_file(&file);
        c.take_diagnostics().into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn test_short_var_needs_new_variable() {
        let msgs = check_body(|b| {
            vec![
                b.short_var(&["x"], vec![b.int(1)]),
                b.short_var(&["x"], vec![b.int(2)]),
                b.expr_stmt(b.call(b.name("println"), vec![b.name("x")])),
            ]
        });
        assert_eq!(msgs, vec!["no new variables on left side of :=".to_string()]);
    }

    #[test]
    fn test_comma_ok_and_range() {
        let msgs = check_body(|b| {
            let m = b.composite(b.ty_map(b.ty_name("string"), b.ty_name("int")), Vec::new());
            let lookup = b.index(b.name("m"), vec![b.string("k")]);
            let use_both = b.call(b.name("println"), vec![b.name("v"), b.name("ok"), b.name("i"), b.name("r")]);
            vec![
                b.short_var(&["m"], vec![m]),
                b.short_var(&["v", "ok"], vec![lookup]),
                b.range(Some("i"), Some("r"), b.string("abc"), b.block(vec![b.expr_stmt(use_both)])),
            ]
        });
        assert!(msgs.is_empty(), "{:?}", msgs);
    }

    #[test]
    fn test_wrong_return_count() {
        let b = AstBuilder::new();
        let int = b.ty_name("int");
        let sig = b.sig(Vec::new(), vec![b.anon(int)]);
        let body = b.block(vec![b.ret(vec![b.int(1), b.int(2)])]);
        let file = b.file("main", vec![b.func_decl("f", Vec::new(), sig, body)]);
        let (interner, _) = b.into_parts();
        let mut c = Checker::new(interner, TraceConfig::default());
        let _ = c.check_file(&file);
        let msgs: Vec<String> = c.take_diagnostics().into_iter().map(|d| d.message).collect();
        assert_eq!(msgs, vec!["wrong number of return values (have 2, want 1)".to_string()]);
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let msgs = check_body(|b| {
            vec![b.if_stmt(b.int(1), b.block(Vec::new()), None)]
        });
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("non-boolean condition"), "{}", msgs[0]);
    }

    #[test]
    fn test_unused_expression() {
        let msgs = check_body(|b| {
            vec![
                b.short_var(&["s"], vec![b.string("go")]),
                b.expr_stmt(b.call(b.name("len"), vec![b.name("s")])),
            ]
        });
        assert_eq!(msgs, vec!["len(s) is not used".to_string()]);
    }
}
