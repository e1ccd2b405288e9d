//! Programmatic tree construction.
//!
//! Every node gets a fresh id and a distinct non-dummy span, so diagnostics
//! and annotations on hand-built trees behave as they would on parsed ones.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gomono_common::span::Span;
use gomono_common::symbol::{Symbol, SymbolInterner};

use crate::ast::*;

pub struct AstBuilder {
    interner: RefCell<SymbolInterner>,
    ids: NodeIdGen,
    pos: Cell<u32>,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::with_interner(SymbolInterner::new())
    }

    pub fn with_interner(interner: SymbolInterner) -> Self {
        Self {
            interner: RefCell::new(interner),
            ids: NodeIdGen::new(),
            pos: Cell::new(1),
        }
    }

    pub fn ids(&self) -> &NodeIdGen {
        &self.ids
    }

    /// Hands the interner and id generator over to the checking session.
    pub fn into_parts(self) -> (SymbolInterner, NodeIdGen) {
        (self.interner.into_inner(), self.ids)
    }

    pub fn sym(&self, name: &str) -> Symbol {
        self.interner.borrow_mut().intern(name)
    }

    fn next_span(&self) -> Span {
        let start = self.pos.get();
        self.pos.set(start + 2);
        Span::from_u32(start, start + 1)
    }

    pub fn ident(&self, name: &str) -> Ident {
        Ident {
            id: self.ids.ident(),
            symbol: self.sym(name),
            span: self.next_span(),
        }
    }

    fn idents(&self, names: &[&str]) -> Vec<Ident> {
        names.iter().map(|n| self.ident(n)).collect()
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    pub fn ty(&self, kind: TypeExprKind) -> P<TypeExpr> {
        Rc::new(TypeExpr {
            id: self.ids.type_expr(),
            kind,
            span: self.next_span(),
        })
    }

    pub fn ty_name(&self, name: &str) -> P<TypeExpr> {
        self.ty(TypeExprKind::Ident(self.ident(name)))
    }

    pub fn ty_inst(&self, base: &str, args: Vec<P<TypeExpr>>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Instance {
            base: self.ident(base),
            args,
        })
    }

    pub fn ty_ptr(&self, elem: P<TypeExpr>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Pointer(elem))
    }

    pub fn ty_slice(&self, elem: P<TypeExpr>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Slice(elem))
    }

    pub fn ty_array(&self, len: i64, elem: P<TypeExpr>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Array {
            len: self.int(len),
            elem,
        })
    }

    pub fn ty_map(&self, key: P<TypeExpr>, value: P<TypeExpr>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Map { key, value })
    }

    pub fn ty_chan(&self, dir: ChanDir, elem: P<TypeExpr>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Chan { dir, elem })
    }

    pub fn ty_func(&self, sig: P<FuncSig>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Func(sig))
    }

    pub fn ty_struct(&self, fields: Vec<Field>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Struct(fields))
    }

    pub fn ty_interface(&self, elems: Vec<InterfaceElem>) -> P<TypeExpr> {
        self.ty(TypeExprKind::Interface(elems))
    }

    pub fn field(&self, names: &[&str], ty: P<TypeExpr>) -> Field {
        Field {
            names: self.idents(names),
            ty,
            tag: None,
            span: self.next_span(),
        }
    }

    pub fn embedded(&self, ty: P<TypeExpr>) -> Field {
        self.field(&[], ty)
    }

    pub fn method_elem(&self, name: &str, sig: P<FuncSig>) -> InterfaceElem {
        InterfaceElem::Method {
            name: self.ident(name),
            sig,
            span: self.next_span(),
        }
    }

    pub fn embed_elem(&self, ty: P<TypeExpr>) -> InterfaceElem {
        InterfaceElem::Embedded(ty)
    }

    pub fn type_list(&self, types: Vec<P<TypeExpr>>) -> InterfaceElem {
        InterfaceElem::TypeList(types)
    }

    // ========================================================================
    // Signatures and parameters
    // ========================================================================

    pub fn param(&self, names: &[&str], ty: P<TypeExpr>) -> Param {
        Param {
            names: self.idents(names),
            ty,
            span: self.next_span(),
        }
    }

    /// Unnamed parameter or result.
    pub fn anon(&self, ty: P<TypeExpr>) -> Param {
        self.param(&[], ty)
    }

    pub fn sig(&self, params: Vec<Param>, results: Vec<Param>) -> P<FuncSig> {
        Rc::new(FuncSig {
            params,
            results,
            variadic: false,
            span: self.next_span(),
        })
    }

    pub fn variadic_sig(&self, params: Vec<Param>, results: Vec<Param>) -> P<FuncSig> {
        Rc::new(FuncSig {
            params,
            results,
            variadic: true,
            span: self.next_span(),
        })
    }

    pub fn tparam(&self, names: &[&str], constraint: P<TypeExpr>) -> TypeParamField {
        TypeParamField {
            names: self.idents(names),
            constraint,
            span: self.next_span(),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn expr(&self, kind: ExprKind) -> P<Expr> {
        Rc::new(Expr {
            id: self.ids.expr(),
            kind,
            span: self.next_span(),
        })
    }

    pub fn name(&self, name: &str) -> P<Expr> {
        self.expr(ExprKind::Ident(self.ident(name)))
    }

    fn lit(&self, kind: LitKind, value: String) -> P<Expr> {
        self.expr(ExprKind::BasicLit { kind, value })
    }

    pub fn int(&self, value: i64) -> P<Expr> {
        self.lit(LitKind::Int, value.to_string())
    }

    pub fn float(&self, value: &str) -> P<Expr> {
        self.lit(LitKind::Float, value.to_string())
    }

    pub fn rune(&self, value: char) -> P<Expr> {
        self.lit(LitKind::Rune, format!("{:?}", value))
    }

    pub fn string(&self, value: &str) -> P<Expr> {
        self.lit(LitKind::String, format!("{:?}", value))
    }

    pub fn call(&self, func: P<Expr>, args: Vec<P<Expr>>) -> P<Expr> {
        self.expr(ExprKind::Call(CallExpr {
            func,
            args,
            spread: false,
        }))
    }

    pub fn call_spread(&self, func: P<Expr>, args: Vec<P<Expr>>) -> P<Expr> {
        self.expr(ExprKind::Call(CallExpr {
            func,
            args,
            spread: true,
        }))
    }

    pub fn index(&self, expr: P<Expr>, indices: Vec<P<Expr>>) -> P<Expr> {
        self.expr(ExprKind::Index { expr, indices })
    }

    pub fn slice_expr(&self, expr: P<Expr>, low: Option<P<Expr>>, high: Option<P<Expr>>) -> P<Expr> {
        self.expr(ExprKind::Slice { expr, low, high })
    }

    pub fn sel(&self, expr: P<Expr>, name: &str) -> P<Expr> {
        self.expr(ExprKind::Selector {
            expr,
            sel: self.ident(name),
        })
    }

    pub fn binary(&self, op: BinaryOp, left: P<Expr>, right: P<Expr>) -> P<Expr> {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&self, op: UnaryOp, expr: P<Expr>) -> P<Expr> {
        self.expr(ExprKind::Unary { op, expr })
    }

    pub fn paren(&self, expr: P<Expr>) -> P<Expr> {
        self.expr(ExprKind::Paren(expr))
    }

    pub fn type_assert(&self, expr: P<Expr>, ty: P<TypeExpr>) -> P<Expr> {
        self.expr(ExprKind::TypeAssert { expr, ty })
    }

    pub fn composite(&self, ty: P<TypeExpr>, elems: Vec<KeyedElement>) -> P<Expr> {
        self.expr(ExprKind::CompositeLit(CompositeLit { ty, elems }))
    }

    pub fn elem(&self, value: P<Expr>) -> KeyedElement {
        KeyedElement { key: None, value }
    }

    /// `key: value`; struct literal keys are field names.
    pub fn keyed(&self, key: &str, value: P<Expr>) -> KeyedElement {
        KeyedElement {
            key: Some(self.name(key)),
            value,
        }
    }

    pub fn func_lit(&self, sig: P<FuncSig>, body: P<Block>) -> P<Expr> {
        self.expr(ExprKind::FuncLit { sig, body })
    }

    pub fn type_expr(&self, ty: P<TypeExpr>) -> P<Expr> {
        self.expr(ExprKind::TypeAsExpr(ty))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn stmt(&self, kind: StmtKind) -> P<Stmt> {
        Rc::new(Stmt {
            kind,
            span: self.next_span(),
        })
    }

    pub fn block(&self, stmts: Vec<P<Stmt>>) -> P<Block> {
        Rc::new(Block {
            stmts,
            span: self.next_span(),
        })
    }

    pub fn ret(&self, values: Vec<P<Expr>>) -> P<Stmt> {
        self.stmt(StmtKind::Return(values))
    }

    pub fn expr_stmt(&self, expr: P<Expr>) -> P<Stmt> {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn short_var(&self, names: &[&str], values: Vec<P<Expr>>) -> P<Stmt> {
        self.stmt(StmtKind::ShortVar {
            names: self.idents(names),
            values,
        })
    }

    pub fn var_stmt(&self, names: &[&str], ty: Option<P<TypeExpr>>, values: Vec<P<Expr>>) -> P<Stmt> {
        self.stmt(StmtKind::Var(self.var_spec(names, ty, values)))
    }

    pub fn assign(&self, lhs: Vec<P<Expr>>, rhs: Vec<P<Expr>>) -> P<Stmt> {
        self.stmt(StmtKind::Assign { lhs, op: None, rhs })
    }

    pub fn op_assign(&self, lhs: P<Expr>, op: BinaryOp, rhs: P<Expr>) -> P<Stmt> {
        self.stmt(StmtKind::Assign {
            lhs: vec![lhs],
            op: Some(op),
            rhs: vec![rhs],
        })
    }

    pub fn inc(&self, expr: P<Expr>) -> P<Stmt> {
        self.stmt(StmtKind::IncDec { expr, inc: true })
    }

    pub fn if_stmt(&self, cond: P<Expr>, then: P<Block>, els: Option<P<Stmt>>) -> P<Stmt> {
        self.stmt(StmtKind::If {
            init: None,
            cond,
            then,
            els,
        })
    }

    pub fn for_stmt(
        &self,
        init: Option<P<Stmt>>,
        cond: Option<P<Expr>>,
        post: Option<P<Stmt>>,
        body: P<Block>,
    ) -> P<Stmt> {
        self.stmt(StmtKind::For { init, cond, post, body })
    }

    pub fn range(&self, key: Option<&str>, value: Option<&str>, expr: P<Expr>, body: P<Block>) -> P<Stmt> {
        self.stmt(StmtKind::Range {
            key: key.map(|k| self.ident(k)),
            value: value.map(|v| self.ident(v)),
            expr,
            body,
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn var_spec(&self, names: &[&str], ty: Option<P<TypeExpr>>, values: Vec<P<Expr>>) -> P<VarDecl> {
        Rc::new(VarDecl {
            names: self.idents(names),
            ty,
            values,
            span: self.next_span(),
        })
    }

    pub fn var_decl(&self, names: &[&str], ty: Option<P<TypeExpr>>, values: Vec<P<Expr>>) -> Decl {
        Decl::Var(self.var_spec(names, ty, values))
    }

    pub fn type_decl(&self, name: &str, tparams: Vec<TypeParamField>, ty: P<TypeExpr>) -> Decl {
        Decl::Type(Rc::new(TypeDecl {
            name: self.ident(name),
            tparams,
            ty,
            span: self.next_span(),
        }))
    }

    pub fn func_decl(
        &self,
        name: &str,
        tparams: Vec<TypeParamField>,
        sig: P<FuncSig>,
        body: P<Block>,
    ) -> Decl {
        Decl::Func(Rc::new(FuncDecl {
            recv: None,
            name: self.ident(name),
            tparams,
            sig,
            body: Some(body),
            span: self.next_span(),
        }))
    }

    /// `func (recv_name recv_ty) name sig body`
    pub fn method_decl(
        &self,
        recv_name: &str,
        recv_ty: P<TypeExpr>,
        name: &str,
        sig: P<FuncSig>,
        body: P<Block>,
    ) -> Decl {
        let recv = Receiver {
            name: Some(self.ident(recv_name)),
            ty: recv_ty,
            span: self.next_span(),
        };
        Decl::Func(Rc::new(FuncDecl {
            recv: Some(recv),
            name: self.ident(name),
            tparams: Vec::new(),
            sig,
            body: Some(body),
            span: self.next_span(),
        }))
    }

    pub fn file(&self, package: &str, decls: Vec<Decl>) -> File {
        File {
            package: self.ident(package),
            decls,
            span: self.next_span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let b = AstBuilder::new();
        let x = b.name("x");
        let y = b.name("x");
        assert_ne!(x.id, y.id);
        match (&x.kind, &y.kind) {
            (ExprKind::Ident(a), ExprKind::Ident(c)) => {
                assert_ne!(a.id, c.id);
                assert_eq!(a.symbol, c.symbol);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_spans_are_distinct_and_real() {
        let b = AstBuilder::new();
        let a = b.ident("a");
        let c = b.ident("c");
        assert!(!a.span.is_dummy());
        assert!(a.span.end.0 <= c.span.start.0);
    }

    #[test]
    fn test_receiver_unpack() {
        let b = AstBuilder::new();
        let recv_ty = b.ty_ptr(b.ty_inst("Pair", vec![b.ty_name("A"), b.ty_name("B")]));
        let decl = b.method_decl("p", recv_ty, "First", b.sig(vec![], vec![]), b.block(vec![]));
        let Decl::Func(f) = &decl else { unreachable!() };
        let recv = f.recv.as_ref().unwrap();
        let (ptr, base, params) = recv.unpack().unwrap();
        assert!(ptr);
        assert_eq!(base.symbol, b.sym("Pair"));
        assert_eq!(params.len(), 2);
        assert!(decl.is_generic());
    }

    #[test]
    fn test_into_parts_keeps_symbols() {
        let b = AstBuilder::new();
        let sym = b.sym("Stack");
        let (interner, ids) = b.into_parts();
        assert_eq!(interner.resolve(sym), Some("Stack"));
        let next = ids.expr();
        assert_eq!(next, ExprId(0));
    }
}
