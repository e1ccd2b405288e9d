//! Compact source rendering of syntax nodes for traces and diagnostics.

use gomono_common::symbol::{Symbol, SymbolInterner};
use gomono_syntax::ast::*;

fn sym(s: Symbol, interner: &SymbolInterner) -> &str {
    interner.resolve(s).unwrap_or("<unknown>")
}

pub fn format_expr(expr: &Expr, interner: &SymbolInterner) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, interner);
    out
}

pub fn format_type_expr(ty: &TypeExpr, interner: &SymbolInterner) -> String {
    let mut out = String::new();
    write_type_expr(&mut out, ty, interner);
    out
}

pub fn format_stmt(stmt: &Stmt, interner: &SymbolInterner) -> String {
    match &stmt.kind {
        StmtKind::Empty => String::new(),
        StmtKind::Block(_) => "{...}".to_string(),
        StmtKind::Var(d) => format!("var {}", idents(&d.names, interner)),
        StmtKind::ShortVar { names, values } => {
            format!("{} := {}", idents(names, interner), exprs(values, interner))
        }
        StmtKind::Expr(e) => format_expr(e, interner),
        StmtKind::Assign { lhs, op, rhs } => {
            let op = op.map(|o| o.as_str()).unwrap_or("");
            format!("{} {}= {}", exprs(lhs, interner), op, exprs(rhs, interner))
        }
        StmtKind::IncDec { expr, inc } => {
            format!("{}{}", format_expr(expr, interner), if *inc { "++" } else { "--" })
        }
        StmtKind::Return(values) => format!("return {}", exprs(values, interner)),
        StmtKind::If { cond, .. } => format!("if {} {{...}}", format_expr(cond, interner)),
        StmtKind::For { .. } => "for {...}".to_string(),
        StmtKind::Range { expr, .. } => format!("for range {} {{...}}", format_expr(expr, interner)),
        StmtKind::Go(e) => format!("go {}", format_expr(e, interner)),
        StmtKind::Defer(e) => format!("defer {}", format_expr(e, interner)),
        StmtKind::Break => "break".to_string(),
        StmtKind::Continue => "continue".to_string(),
    }
}

fn idents(names: &[Ident], interner: &SymbolInterner) -> String {
    names
        .iter()
        .map(|n| sym(n.symbol, interner))
        .collect::<Vec<_>>()
        .join(", ")
}

fn exprs(list: &[P<Expr>], interner: &SymbolInterner) -> String {
    list.iter()
        .map(|e| format_expr(e, interner))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_expr(out: &mut String, expr: &Expr, interner: &SymbolInterner) {
    match &expr.kind {
        ExprKind::Ident(id) => out.push_str(sym(id.symbol, interner)),
        ExprKind::BasicLit { value, .. } => out.push_str(value),
        ExprKind::Binary { op, left, right } => {
            write_expr(out, left, interner);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(out, right, interner);
        }
        ExprKind::Unary { op, expr } => {
            out.push_str(match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "!",
                UnaryOp::BitNot => "^",
                UnaryOp::Addr => "&",
                UnaryOp::Deref => "*",
            });
            write_expr(out, expr, interner);
        }
        ExprKind::Call(call) => {
            write_expr(out, &call.func, interner);
            out.push('(');
            out.push_str(&exprs(&call.args, interner));
            if call.spread {
                out.push_str("...");
            }
            out.push(')');
        }
        ExprKind::Index { expr, indices } => {
            write_expr(out, expr, interner);
            out.push('[');
            out.push_str(&exprs(indices, interner));
            out.push(']');
        }
        ExprKind::Slice { expr, low, high } => {
            write_expr(out, expr, interner);
            out.push('[');
            if let Some(l) = low {
                write_expr(out, l, interner);
            }
            out.push(':');
            if let Some(h) = high {
                write_expr(out, h, interner);
            }
            out.push(']');
        }
        ExprKind::Selector { expr, sel } => {
            write_expr(out, expr, interner);
            out.push('.');
            out.push_str(sym(sel.symbol, interner));
        }
        ExprKind::TypeAssert { expr, ty } => {
            write_expr(out, expr, interner);
            out.push_str(".(");
            write_type_expr(out, ty, interner);
            out.push(')');
        }
        ExprKind::CompositeLit(lit) => {
            write_type_expr(out, &lit.ty, interner);
            out.push_str("{…}");
        }
        ExprKind::FuncLit { .. } => out.push_str("func literal"),
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner, interner);
            out.push(')');
        }
        ExprKind::TypeAsExpr(ty) => write_type_expr(out, ty, interner),
    }
}

fn write_type_expr(out: &mut String, ty: &TypeExpr, interner: &SymbolInterner) {
    match &ty.kind {
        TypeExprKind::Ident(id) => out.push_str(sym(id.symbol, interner)),
        TypeExprKind::Instance { base, args } => {
            out.push_str(sym(base.symbol, interner));
            out.push('[');
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type_expr(out, a, interner);
            }
            out.push(']');
        }
        TypeExprKind::Array { len, elem } => {
            out.push('[');
            write_expr(out, len, interner);
            out.push(']');
            write_type_expr(out, elem, interner);
        }
        TypeExprKind::Slice(elem) => {
            out.push_str("[]");
            write_type_expr(out, elem, interner);
        }
        TypeExprKind::Map { key, value } => {
            out.push_str("map[");
            write_type_expr(out, key, interner);
            out.push(']');
            write_type_expr(out, value, interner);
        }
        TypeExprKind::Chan { dir, elem } => {
            out.push_str(match dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            write_type_expr(out, elem, interner);
        }
        TypeExprKind::Func(_) => out.push_str("func(…)"),
        TypeExprKind::Struct(_) => out.push_str("struct{…}"),
        TypeExprKind::Pointer(base) => {
            out.push('*');
            write_type_expr(out, base, interner);
        }
        TypeExprKind::Interface(elems) if elems.is_empty() => out.push_str("interface{}"),
        TypeExprKind::Interface(_) => out.push_str("interface{…}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_syntax::builder::AstBuilder;

    #[test]
    fn test_format_call_and_instance() {
        let b = AstBuilder::new();
        let f = b.index(b.name("Map"), vec![b.name("int")]);
        let call = b.call(f, vec![b.name("xs"), b.int(1)]);
        let ty = b.ty_ptr(b.ty_inst("List", vec![b.ty_name("T")]));
        let (interner, _) = b.into_parts();
        assert_eq!(format_expr(&call, &interner), "Map[int](xs, 1)");
        assert_eq!(format_type_expr(&ty, &interner), "*List[T]");
    }
}
