//! Monomorphizing checked packages end to end.

use gomono_analysis::{typ, Checker};
use gomono_common::TraceConfig;
use gomono_syntax::ast::*;
use gomono_syntax::visit::{walk_expr, walk_type_expr, Visitor};
use gomono_syntax::AstBuilder;
use gomono_translate::{TranslateOutput, Translator};

fn translate(build: impl FnOnce(&AstBuilder) -> Vec<Decl>) -> (Checker, TranslateOutput) {
    let b = AstBuilder::new();
    let decls = build(&b);
    let file = b.file("main", decls);
    let (interner, ids) = b.into_parts();
    let mut checker = Checker::new(interner, TraceConfig::default());
    checker.check_file(&file).expect("package checks");
    let out = Translator::new(&mut checker, &ids, TraceConfig::default()).translate_file(&file);
    (checker, out)
}

fn decl_name(c: &Checker, decl: &Decl) -> String {
    match decl {
        Decl::Var(d) => c.resolve_ident(&d.names[0]).to_string(),
        Decl::Type(d) => c.resolve_ident(&d.name).to_string(),
        Decl::Func(d) => c.resolve_ident(&d.name).to_string(),
    }
}

fn names(c: &Checker, decls: &[Decl]) -> Vec<String> {
    decls.iter().map(|d| decl_name(c, d)).collect()
}

fn func(decl: &Decl) -> &FuncDecl {
    match decl {
        Decl::Func(d) => d,
        other => panic!("expected a function, got {:?}", other),
    }
}

fn var_value(decl: &Decl) -> &P<Expr> {
    match decl {
        Decl::Var(d) => &d.values[0],
        other => panic!("expected a var, got {:?}", other),
    }
}

fn callee_name(c: &Checker, e: &Expr) -> String {
    let ExprKind::Call(call) = &e.kind else {
        panic!("expected a call, got {:?}", e.kind);
    };
    let ExprKind::Ident(ident) = &call.func.kind else {
        panic!("expected an identifier callee, got {:?}", call.func.kind);
    };
    c.resolve_ident(ident).to_string()
}

fn type_name(c: &Checker, te: &TypeExpr) -> String {
    match &te.kind {
        TypeExprKind::Ident(ident) => c.resolve_ident(ident).to_string(),
        other => panic!("expected a type name, got {:?}", other),
    }
}

fn expr_type(c: &Checker, e: &Expr) -> String {
    let t = c.type_info().expr_type(e.id).expect("annotated");
    typ::type_string(t, c.objects())
}

fn returned(d: &FuncDecl) -> &P<Expr> {
    let body = d.body.as_ref().expect("body");
    match &body.stmts.last().expect("statement").kind {
        StmtKind::Return(values) => &values[0],
        other => panic!("expected a return, got {:?}", other),
    }
}

/// `func id[T any](x T) T { return x }`
fn id_decl(b: &AstBuilder) -> Decl {
    b.func_decl(
        "id",
        vec![b.tparam(&["T"], b.ty_name("any"))],
        b.sig(vec![b.param(&["x"], b.ty_name("T"))], vec![b.anon(b.ty_name("T"))]),
        b.block(vec![b.ret(vec![b.name("x")])]),
    )
}

/// Fails on generic syntax left in a translated file.
#[derive(Default)]
struct GenericSyntax {
    found: Vec<String>,
}

impl Visitor for GenericSyntax {
    fn visit_decl(&mut self, decl: &Decl) {
        if decl.is_generic() {
            self.found.push(format!("generic declaration at {:?}", decl.span()));
        }
        gomono_syntax::visit::walk_decl(self, decl);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Index { .. } = expr.kind {
            self.found.push(format!("index expression at {:?}", expr.span));
        }
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        if let TypeExprKind::Instance { .. } = ty.kind {
            self.found.push(format!("instantiated type at {:?}", ty.span));
        }
        walk_type_expr(self, ty);
    }
}

fn assert_no_generic_syntax(out: &TranslateOutput) {
    let mut v = GenericSyntax::default();
    v.visit_file(&out.file);
    assert!(v.found.is_empty(), "{:?}", v.found);
}

#[test]
fn test_function_instances_are_shared() {
    // var a = id(1); var b = id[int](2); var s = id("s")
    let (c, out) = translate(|b| {
        vec![
            id_decl(b),
            b.var_decl(&["a"], None, vec![b.call(b.name("id"), vec![b.int(1)])]),
            b.var_decl(&["b"], None, vec![b.call(b.index(b.name("id"), vec![b.name("int")]), vec![b.int(2)])]),
            b.var_decl(&["s"], None, vec![b.call(b.name("id"), vec![b.string("s")])]),
        ]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(
        names(&c, &out.instances),
        vec!["instantiate٠٠id٠٠int", "instantiate٠٠id٠٠string"]
    );
    assert_eq!(
        names(&c, &out.file.decls),
        vec!["a", "b", "s", "instantiate٠٠id٠٠int", "instantiate٠٠id٠٠string"]
    );

    let decls = &out.file.decls;
    assert_eq!(callee_name(&c, var_value(&decls[0])), "instantiate٠٠id٠٠int");
    assert_eq!(callee_name(&c, var_value(&decls[1])), "instantiate٠٠id٠٠int");
    assert_eq!(callee_name(&c, var_value(&decls[2])), "instantiate٠٠id٠٠string");
    assert_eq!(expr_type(&c, var_value(&decls[0])), "int");

    let int_id = func(&out.instances[0]);
    assert!(int_id.tparams.is_empty());
    assert_eq!(type_name(&c, &int_id.sig.params[0].ty), "int");
    assert_eq!(type_name(&c, &int_id.sig.results[0].ty), "int");
    assert_eq!(expr_type(&c, returned(int_id)), "int");
    assert_eq!(expr_type(&c, returned(func(&out.instances[1]))), "string");
    assert_no_generic_syntax(&out);
}

#[test]
fn test_instance_names_avoid_package_names() {
    let (c, out) = translate(|b| {
        vec![
            id_decl(b),
            b.var_decl(&["instantiate٠٠id٠٠int"], Some(b.ty_name("int")), Vec::new()),
            b.var_decl(&["a"], None, vec![b.call(b.name("id"), vec![b.int(1)])]),
        ]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(names(&c, &out.instances), vec!["instantiate٠٠id٠٠int٠٠1"]);
    assert_eq!(callee_name(&c, var_value(&out.file.decls[1])), "instantiate٠٠id٠٠int٠٠1");
    let objs = c.objects();
    let existing = objs.scopes[c.pkg_scope()].lookup("instantiate٠٠id٠٠int").expect("declared");
    assert!(objs.lobjs[existing].is_var());
}

#[test]
fn test_rewritten_calls_record_type_arguments() {
    let (c, out) = translate(|b| vec![id_decl(b), b.var_decl(&["a"], None, vec![b.call(b.name("id"), vec![b.int(1)])])]);
    let call = var_value(&out.file.decls[0]);
    let inferred = c.type_info().inferred.get(&call.id).expect("recorded on the new call");
    assert_eq!(typ::type_list_string(&inferred.targs, c.objects()), "int");

    let ExprKind::Call(call) = &call.kind else {
        panic!("expected a call");
    };
    let ExprKind::Ident(callee) = &call.func.kind else {
        panic!("expected an identifier callee");
    };
    let inst = c.type_info().uses[&callee.id];
    assert_eq!(c.objects().lobjs[inst].typ(), Some(inferred.sig));
    assert_eq!(c.type_info().inferred[&call.func.id].targs, inferred.targs);
}

#[test]
fn test_instances_requested_from_instances() {
    // func Apply[T any](x T) T { return id(x) }
    // var r = Apply(3)
    let (c, out) = translate(|b| {
        let apply = b.func_decl(
            "Apply",
            vec![b.tparam(&["T"], b.ty_name("any"))],
            b.sig(vec![b.param(&["x"], b.ty_name("T"))], vec![b.anon(b.ty_name("T"))]),
            b.block(vec![b.ret(vec![b.call(b.name("id"), vec![b.name("x")])])]),
        );
        vec![id_decl(b), apply, b.var_decl(&["r"], None, vec![b.call(b.name("Apply"), vec![b.int(3)])])]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(
        names(&c, &out.instances),
        vec!["instantiate٠٠Apply٠٠int", "instantiate٠٠id٠٠int"]
    );
    let inner = returned(func(&out.instances[0]));
    assert_eq!(callee_name(&c, inner), "instantiate٠٠id٠٠int");
    assert_eq!(expr_type(&c, inner), "int");
    assert_no_generic_syntax(&out);
}

#[test]
fn test_type_instances_carry_their_methods() {
    // type Pair[A, B any] struct { first A; second B }
    // func (p Pair[X, Y]) First() X { return p.first }
    // var p = Pair[int, string]{first: 1, second: "x"}
    // var f = p.First()
    let (c, out) = translate(|b| {
        let fields = vec![b.field(&["first"], b.ty_name("A")), b.field(&["second"], b.ty_name("B"))];
        let pair = b.type_decl("Pair", vec![b.tparam(&["A", "B"], b.ty_name("any"))], b.ty_struct(fields));
        let first = b.method_decl(
            "p",
            b.ty_inst("Pair", vec![b.ty_name("X"), b.ty_name("Y")]),
            "First",
            b.sig(Vec::new(), vec![b.anon(b.ty_name("X"))]),
            b.block(vec![b.ret(vec![b.sel(b.name("p"), "first")])]),
        );
        let lit = b.composite(
            b.ty_inst("Pair", vec![b.ty_name("int"), b.ty_name("string")]),
            vec![b.keyed("first", b.int(1)), b.keyed("second", b.string("x"))],
        );
        let call = b.call(b.sel(b.name("p"), "First"), Vec::new());
        vec![pair, first, b.var_decl(&["p"], None, vec![lit]), b.var_decl(&["f"], None, vec![call])]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(names(&c, &out.instances), vec!["instantiate٠٠Pair٠٠int٠٠string", "First"]);

    let Decl::Type(pair) = &out.instances[0] else {
        panic!("expected a type declaration");
    };
    assert!(pair.tparams.is_empty());
    let TypeExprKind::Struct(fields) = &pair.ty.kind else {
        panic!("expected a struct");
    };
    assert_eq!(type_name(&c, &fields[0].ty), "int");
    assert_eq!(type_name(&c, &fields[1].ty), "string");

    let method = func(&out.instances[1]);
    let recv = method.recv.as_ref().expect("receiver");
    assert_eq!(type_name(&c, &recv.ty), "instantiate٠٠Pair٠٠int٠٠string");
    assert_eq!(c.resolve_ident(&recv.name.expect("named receiver")), "p");
    assert_eq!(type_name(&c, &method.sig.results[0].ty), "int");
    assert_eq!(expr_type(&c, returned(method)), "int");

    let Decl::Var(p) = &out.file.decls[0] else {
        panic!("expected a var");
    };
    let ExprKind::CompositeLit(lit) = &p.values[0].kind else {
        panic!("expected a composite literal");
    };
    assert_eq!(type_name(&c, &lit.ty), "instantiate٠٠Pair٠٠int٠٠string");
    assert_no_generic_syntax(&out);
}

#[test]
fn test_self_referential_type_is_instantiated_once() {
    // type List[T any] struct { next *List[T]; val T }
    // var a List[int]; var b List[int]
    let (c, out) = translate(|b| {
        let fields = vec![
            b.field(&["next"], b.ty_ptr(b.ty_inst("List", vec![b.ty_name("T")]))),
            b.field(&["val"], b.ty_name("T")),
        ];
        let list = b.type_decl("List", vec![b.tparam(&["T"], b.ty_name("any"))], b.ty_struct(fields));
        vec![
            list,
            b.var_decl(&["a"], Some(b.ty_inst("List", vec![b.ty_name("int")])), Vec::new()),
            b.var_decl(&["b"], Some(b.ty_inst("List", vec![b.ty_name("int")])), Vec::new()),
        ]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(names(&c, &out.instances), vec!["instantiate٠٠List٠٠int"]);

    let Decl::Type(list) = &out.instances[0] else {
        panic!("expected a type declaration");
    };
    let TypeExprKind::Struct(fields) = &list.ty.kind else {
        panic!("expected a struct");
    };
    let TypeExprKind::Pointer(base) = &fields[0].ty.kind else {
        panic!("expected a pointer");
    };
    assert_eq!(type_name(&c, base), "instantiate٠٠List٠٠int");
    assert_eq!(type_name(&c, &fields[1].ty), "int");
    assert_no_generic_syntax(&out);
}

#[test]
fn test_type_parameters_in_bodies_are_replaced() {
    // func zero[T any]() T { var z T; return z }
    // var f = zero[float64]()
    let (c, out) = translate(|b| {
        let zero = b.func_decl(
            "zero",
            vec![b.tparam(&["T"], b.ty_name("any"))],
            b.sig(Vec::new(), vec![b.anon(b.ty_name("T"))]),
            b.block(vec![b.var_stmt(&["z"], Some(b.ty_name("T")), Vec::new()), b.ret(vec![b.name("z")])]),
        );
        let call = b.call(b.index(b.name("zero"), vec![b.name("float64")]), Vec::new());
        vec![zero, b.var_decl(&["f"], None, vec![call])]
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(names(&c, &out.instances), vec!["instantiate٠٠zero٠٠float64"]);

    let zero = func(&out.instances[0]);
    let body = zero.body.as_ref().expect("body");
    let StmtKind::Var(z) = &body.stmts[0].kind else {
        panic!("expected a var statement");
    };
    assert_eq!(type_name(&c, z.ty.as_ref().expect("typed")), "float64");
    assert_eq!(expr_type(&c, returned(zero)), "float64");
}

#[test]
fn test_code_without_generics_is_kept() {
    // func double(x int) int { return x * 2 }
    let (c, out) = translate(|b| {
        vec![b.func_decl(
            "double",
            Vec::new(),
            b.sig(vec![b.param(&["x"], b.ty_name("int"))], vec![b.anon(b.ty_name("int"))]),
            b.block(vec![b.ret(vec![b.binary(BinaryOp::Mul, b.name("x"), b.int(2))])]),
        )]
    });
    assert!(out.instances.is_empty());
    assert_eq!(names(&c, &out.file.decls), vec!["double"]);
    assert!(!out.has_errors());
}
