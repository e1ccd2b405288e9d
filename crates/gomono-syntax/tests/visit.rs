use gomono_syntax::visit::{walk_expr, Visitor};
use gomono_syntax::*;

#[derive(Default)]
struct NameCollector {
    names: Vec<gomono_common::Symbol>,
    calls: usize,
}

impl Visitor for NameCollector {
    fn visit_expr(&mut self, expr: &Expr) {
        if matches!(expr.kind, ExprKind::Call(_)) {
            self.calls += 1;
        }
        walk_expr(self, expr);
    }

    fn visit_ident(&mut self, ident: &Ident) {
        self.names.push(ident.symbol);
    }
}

#[test]
fn visitor_reaches_every_identifier() {
    let b = AstBuilder::new();
    // func Map[T, U any](xs []T, f func(T) U) []U {
    //     var out []U
    //     for _, x := range xs { out = append(out, f(x)) }
    //     return out
    // }
    let tparams = vec![b.tparam(&["T", "U"], b.ty_name("any"))];
    let fn_ty = b.ty_func(b.sig(vec![b.anon(b.ty_name("T"))], vec![b.anon(b.ty_name("U"))]));
    let sig = b.sig(
        vec![b.param(&["xs"], b.ty_slice(b.ty_name("T"))), b.param(&["f"], fn_ty)],
        vec![b.anon(b.ty_slice(b.ty_name("U")))],
    );
    let body = b.block(vec![
        b.var_stmt(&["out"], Some(b.ty_slice(b.ty_name("U"))), vec![]),
        b.range(
            Some("_"),
            Some("x"),
            b.name("xs"),
            b.block(vec![b.assign(
                vec![b.name("out")],
                vec![b.call(b.name("append"), vec![b.name("out"), b.call(b.name("f"), vec![b.name("x")])])],
            )]),
        ),
        b.ret(vec![b.name("out")]),
    ]);
    let file = b.file("main", vec![b.func_decl("Map", tparams, sig, body)]);

    let mut collector = NameCollector::default();
    collector.visit_file(&file);

    assert_eq!(collector.calls, 2);
    let count = |name: &str| collector.names.iter().filter(|s| **s == b.sym(name)).count();
    assert_eq!(count("T"), 3);
    assert_eq!(count("U"), 4);
    assert_eq!(count("out"), 4);
    assert_eq!(count("Map"), 1);
}

#[test]
fn generic_detection_covers_receivers() {
    let b = AstBuilder::new();
    let plain = b.func_decl("f", vec![], b.sig(vec![], vec![]), b.block(vec![]));
    let generic_ty = b.type_decl(
        "Box",
        vec![b.tparam(&["T"], b.ty_name("any"))],
        b.ty_struct(vec![b.field(&["v"], b.ty_name("T"))]),
    );
    let method = b.method_decl(
        "b",
        b.ty_inst("Box", vec![b.ty_name("T")]),
        "Get",
        b.sig(vec![], vec![b.anon(b.ty_name("T"))]),
        b.block(vec![b.ret(vec![b.sel(b.name("b"), "v")])]),
    );
    let plain_method = b.method_decl("c", b.ty_name("Counter"), "Inc", b.sig(vec![], vec![]), b.block(vec![]));
    assert!(!plain.is_generic());
    assert!(generic_ty.is_generic());
    assert!(method.is_generic());
    assert!(!plain_method.is_generic());
}
