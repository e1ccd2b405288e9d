//! Read-only traversal.
//!
//! Override the `visit_*` methods of interest and call the matching
//! `walk_*` function to keep descending.

use crate::ast::*;

pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_sig(&mut self, sig: &FuncSig) {
        walk_sig(self, sig);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        walk_type_expr(self, ty);
    }

    fn visit_ident(&mut self, _ident: &Ident) {}
}

pub fn walk_file<V: Visitor>(visitor: &mut V, file: &File) {
    for decl in &file.decls {
        visitor.visit_decl(decl);
    }
}

fn walk_tparams<V: Visitor>(visitor: &mut V, tparams: &[TypeParamField]) {
    for field in tparams {
        for name in &field.names {
            visitor.visit_ident(name);
        }
        visitor.visit_type_expr(&field.constraint);
    }
}

fn walk_var_decl<V: Visitor>(visitor: &mut V, decl: &VarDecl) {
    for name in &decl.names {
        visitor.visit_ident(name);
    }
    if let Some(ty) = &decl.ty {
        visitor.visit_type_expr(ty);
    }
    for value in &decl.values {
        visitor.visit_expr(value);
    }
}

pub fn walk_decl<V: Visitor>(visitor: &mut V, decl: &Decl) {
    match decl {
        Decl::Var(d) => walk_var_decl(visitor, d),
        Decl::Type(d) => {
            visitor.visit_ident(&d.name);
            walk_tparams(visitor, &d.tparams);
            visitor.visit_type_expr(&d.ty);
        }
        Decl::Func(d) => {
            if let Some(recv) = &d.recv {
                if let Some(name) = &recv.name {
                    visitor.visit_ident(name);
                }
                visitor.visit_type_expr(&recv.ty);
            }
            visitor.visit_ident(&d.name);
            walk_tparams(visitor, &d.tparams);
            visitor.visit_sig(&d.sig);
            if let Some(body) = &d.body {
                visitor.visit_block(body);
            }
        }
    }
}

pub fn walk_sig<V: Visitor>(visitor: &mut V, sig: &FuncSig) {
    for param in sig.params.iter().chain(&sig.results) {
        for name in &param.names {
            visitor.visit_ident(name);
        }
        visitor.visit_type_expr(&param.ty);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Empty | StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Block(b) => visitor.visit_block(b),
        StmtKind::Var(d) => walk_var_decl(visitor, d),
        StmtKind::ShortVar { names, values } => {
            for name in names {
                visitor.visit_ident(name);
            }
            for value in values {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Expr(e) | StmtKind::Go(e) | StmtKind::Defer(e) => visitor.visit_expr(e),
        StmtKind::Assign { lhs, rhs, .. } => {
            for e in lhs.iter().chain(rhs) {
                visitor.visit_expr(e);
            }
        }
        StmtKind::IncDec { expr, .. } => visitor.visit_expr(expr),
        StmtKind::Return(values) => {
            for value in values {
                visitor.visit_expr(value);
            }
        }
        StmtKind::If { init, cond, then, els } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            visitor.visit_expr(cond);
            visitor.visit_block(then);
            if let Some(els) = els {
                visitor.visit_stmt(els);
            }
        }
        StmtKind::For { init, cond, post, body } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
            if let Some(post) = post {
                visitor.visit_stmt(post);
            }
            visitor.visit_block(body);
        }
        StmtKind::Range { key, value, expr, body } => {
            for name in key.iter().chain(value) {
                visitor.visit_ident(name);
            }
            visitor.visit_expr(expr);
            visitor.visit_block(body);
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Ident(i) => visitor.visit_ident(i),
        ExprKind::BasicLit { .. } => {}
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Unary { expr, .. } | ExprKind::Paren(expr) => visitor.visit_expr(expr),
        ExprKind::Call(call) => {
            visitor.visit_expr(&call.func);
            for arg in &call.args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Index { expr, indices } => {
            visitor.visit_expr(expr);
            for index in indices {
                visitor.visit_expr(index);
            }
        }
        ExprKind::Slice { expr, low, high } => {
            visitor.visit_expr(expr);
            for e in low.iter().chain(high) {
                visitor.visit_expr(e);
            }
        }
        ExprKind::Selector { expr, sel } => {
            visitor.visit_expr(expr);
            visitor.visit_ident(sel);
        }
        ExprKind::TypeAssert { expr, ty } => {
            visitor.visit_expr(expr);
            visitor.visit_type_expr(ty);
        }
        ExprKind::CompositeLit(lit) => {
            visitor.visit_type_expr(&lit.ty);
            for elem in &lit.elems {
                if let Some(key) = &elem.key {
                    visitor.visit_expr(key);
                }
                visitor.visit_expr(&elem.value);
            }
        }
        ExprKind::FuncLit { sig, body } => {
            visitor.visit_sig(sig);
            visitor.visit_block(body);
        }
        ExprKind::TypeAsExpr(ty) => visitor.visit_type_expr(ty),
    }
}

pub fn walk_type_expr<V: Visitor>(visitor: &mut V, ty: &TypeExpr) {
    match &ty.kind {
        TypeExprKind::Ident(i) => visitor.visit_ident(i),
        TypeExprKind::Instance { base, args } => {
            visitor.visit_ident(base);
            for arg in args {
                visitor.visit_type_expr(arg);
            }
        }
        TypeExprKind::Array { len, elem } => {
            visitor.visit_expr(len);
            visitor.visit_type_expr(elem);
        }
        TypeExprKind::Slice(elem) | TypeExprKind::Pointer(elem) | TypeExprKind::Chan { elem, .. } => {
            visitor.visit_type_expr(elem)
        }
        TypeExprKind::Map { key, value } => {
            visitor.visit_type_expr(key);
            visitor.visit_type_expr(value);
        }
        TypeExprKind::Func(sig) => visitor.visit_sig(sig),
        TypeExprKind::Struct(fields) => {
            for field in fields {
                for name in &field.names {
                    visitor.visit_ident(name);
                }
                visitor.visit_type_expr(&field.ty);
            }
        }
        TypeExprKind::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { name, sig, .. } => {
                        visitor.visit_ident(name);
                        visitor.visit_sig(sig);
                    }
                    InterfaceElem::Embedded(ty) => visitor.visit_type_expr(ty),
                    InterfaceElem::TypeList(types) => {
                        for ty in types {
                            visitor.visit_type_expr(ty);
                        }
                    }
                }
            }
        }
    }
}
