//! Checking generic packages end to end.

use gomono_analysis::typ;
use gomono_analysis::{Checker, TypeError};
use gomono_common::{Diagnostic, TraceConfig};
use gomono_syntax::ast::{BinaryOp, Decl, Expr, P};
use gomono_syntax::AstBuilder;

fn check(build: impl FnOnce(&AstBuilder) -> Vec<Decl>) -> (Checker, Vec<Diagnostic>) {
    let b = AstBuilder::new();
    let decls = build(&b);
    let file = b.file("main", decls);
    let (interner, _) = b.into_parts();
    let mut checker = Checker::new(interner, TraceConfig::default());
    let _ = checker.check_file(&file);
    let diags = checker.take_diagnostics();
    (checker, diags)
}

fn var_type(c: &Checker, name: &str) -> gomono_analysis::TypeKey {
    let objs = c.objects();
    let obj = objs.scopes[c.pkg_scope()].lookup(name).expect("declared");
    typ::resolved(objs.lobjs[obj].typ().expect("typed"), objs)
}

fn type_of(c: &Checker, name: &str) -> String {
    typ::type_string(var_type(c, name), c.objects())
}

/// `type List[T any] struct { next *List[T]; val T }`
fn list_decl(b: &AstBuilder) -> Decl {
    let fields = vec![
        b.field(&["next"], b.ty_ptr(b.ty_inst("List", vec![b.ty_name("T")]))),
        b.field(&["val"], b.ty_name("T")),
    ];
    b.type_decl("List", vec![b.tparam(&["T"], b.ty_name("any"))], b.ty_struct(fields))
}

#[test]
fn test_self_referential_instance() {
    let (c, diags) = check(|b| {
        vec![
            list_decl(b),
            b.var_decl(&["a"], Some(b.ty_inst("List", vec![b.ty_name("int")])), Vec::new()),
            b.var_decl(&["b"], Some(b.ty_inst("List", vec![b.ty_name("int")])), Vec::new()),
            b.var_decl(&["s"], Some(b.ty_inst("List", vec![b.ty_name("string")])), Vec::new()),
        ]
    });
    assert!(diags.is_empty(), "{:?}", diags);

    let (a, bt, s) = (var_type(&c, "a"), var_type(&c, "b"), var_type(&c, "s"));
    assert_eq!(a, bt);
    assert_ne!(a, s);

    let objs = c.objects();
    let u = typ::underlying_type(a, objs);
    let fields = objs.types[u].try_as_struct().expect("struct").fields().to_vec();
    let next = objs.lobjs[fields[0]].typ().expect("typed");
    let base = objs.types[typ::resolved(next, objs)]
        .try_as_pointer()
        .expect("pointer")
        .base();
    assert_eq!(typ::resolved(base, objs), a);
    assert_eq!(typ::type_string(objs.lobjs[fields[1]].typ().unwrap(), objs), "int");
}

#[test]
fn test_missing_type_arguments() {
    let (_, diags) = check(|b| vec![list_decl(b), b.var_decl(&["l"], Some(b.ty_name("List")), Vec::new())]);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(TypeError::MissingTypeArgs.code()));
}

#[test]
fn test_methods_of_instances() {
    // type Pair[A, B any] struct { first A; second B }
    // func (p Pair[X, Y]) First() X { return p.first }
    // var p = Pair[int, string]{first: 1, second: "x"}
    // var f = p.First()
    let (c, diags) = check(|b| {
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
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(type_of(&c, "p"), "Pair[int, string]");
    assert_eq!(type_of(&c, "f"), "int");
}

/// `func Map[T, U any](xs []T, f func(T) U) []U`
fn map_decl(b: &AstBuilder) -> Decl {
    let f_ty = b.ty_func(b.sig(vec![b.anon(b.ty_name("T"))], vec![b.anon(b.ty_name("U"))]));
    let sig = b.sig(
        vec![b.param(&["xs"], b.ty_slice(b.ty_name("T"))), b.param(&["f"], f_ty)],
        vec![b.anon(b.ty_slice(b.ty_name("U")))],
    );
    let append = b.call(
        b.name("append"),
        vec![b.name("out"), b.call(b.name("f"), vec![b.name("x")])],
    );
    let body = b.block(vec![
        b.var_stmt(&["out"], Some(b.ty_slice(b.ty_name("U"))), Vec::new()),
        b.range(
            Some("_"),
            Some("x"),
            b.name("xs"),
            b.block(vec![b.assign(vec![b.name("out")], vec![append])]),
        ),
        b.ret(vec![b.name("out")]),
    ]);
    b.func_decl("Map", vec![b.tparam(&["T", "U"], b.ty_name("any"))], sig, body)
}

#[test]
fn test_inferred_and_partial_type_arguments() {
    let (c, diags) = check(|b| {
        let ints = b.composite(b.ty_slice(b.ty_name("int")), vec![b.elem(b.int(1)), b.elem(b.int(2))]);
        let to_string = b.func_lit(
            b.sig(vec![b.param(&["x"], b.ty_name("int"))], vec![b.anon(b.ty_name("string"))]),
            b.block(vec![b.ret(vec![b.string("s")])]),
        );
        let inferred = b.call(b.name("Map"), vec![ints, to_string]);

        let more = b.composite(b.ty_slice(b.ty_name("int")), vec![b.elem(b.int(3))]);
        let positive = b.func_lit(
            b.sig(vec![b.param(&["x"], b.ty_name("int"))], vec![b.anon(b.ty_name("bool"))]),
            b.block(vec![b.ret(vec![b.binary(BinaryOp::Gt, b.name("x"), b.int(0))])]),
        );
        let partial = b.call(b.index(b.name("Map"), vec![b.name("int")]), vec![more, positive]);
        vec![
            map_decl(b),
            b.var_decl(&["r"], None, vec![inferred]),
            b.var_decl(&["q"], None, vec![partial]),
        ]
    });
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(type_of(&c, "r"), "[]string");
    assert_eq!(type_of(&c, "q"), "[]bool");

    let objs = c.objects();
    let mut targs: Vec<String> = c
        .type_info()
        .inferred
        .values()
        .map(|inf| typ::type_list_string(&inf.targs, objs))
        .collect();
    targs.sort();
    assert_eq!(targs, vec!["int, bool".to_string(), "int, string".to_string()]);
}

#[test]
fn test_conflicting_arguments() {
    // func Eq[T comparable](a, b T) bool { return a == b }
    let (c, diags) = check(|b| {
        let sig = b.sig(vec![b.param(&["a", "b"], b.ty_name("T"))], vec![b.anon(b.ty_name("bool"))]);
        let body = b.block(vec![b.ret(vec![b.binary(BinaryOp::Eq, b.name("a"), b.name("b"))])]);
        let eq = b.func_decl("Eq", vec![b.tparam(&["T"], b.ty_name("comparable"))], sig, body);
        vec![
            eq,
            b.var_decl(&["i"], Some(b.ty_name("int")), Vec::new()),
            b.var_decl(&["s"], Some(b.ty_name("string")), Vec::new()),
            b.var_decl(&["same"], None, vec![b.call(b.name("Eq"), vec![b.name("i"), b.int(2)])]),
            b.var_decl(&["mixed"], None, vec![b.call(b.name("Eq"), vec![b.name("i"), b.name("s")])]),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::InferenceConflict.code()));
    assert_eq!(type_of(&c, "same"), "bool");
}

#[test]
fn test_bound_methods_are_checked() {
    // type Stringer interface { String() string }
    // type A struct{}; func (a A) String() string { return "a" }
    // type B struct{}
    // func Show[T Stringer](x T) string { return x.String() }
    let (c, diags) = check(|b| {
        let stringer = b.type_decl(
            "Stringer",
            Vec::new(),
            b.ty_interface(vec![b.method_elem("String", b.sig(Vec::new(), vec![b.anon(b.ty_name("string"))]))]),
        );
        let a = b.type_decl("A", Vec::new(), b.ty_struct(Vec::new()));
        let a_string = b.method_decl(
            "a",
            b.ty_name("A"),
            "String",
            b.sig(Vec::new(), vec![b.anon(b.ty_name("string"))]),
            b.block(vec![b.ret(vec![b.string("a")])]),
        );
        let bt = b.type_decl("B", Vec::new(), b.ty_struct(Vec::new()));
        let show = b.func_decl(
            "Show",
            vec![b.tparam(&["T"], b.ty_name("Stringer"))],
            b.sig(vec![b.param(&["x"], b.ty_name("T"))], vec![b.anon(b.ty_name("string"))]),
            b.block(vec![b.ret(vec![b.call(b.sel(b.name("x"), "String"), Vec::new())])]),
        );
        let ok = b.call(b.name("Show"), vec![b.composite(b.ty_name("A"), Vec::new())]);
        let bad = b.call(b.name("Show"), vec![b.composite(b.ty_name("B"), Vec::new())]);
        vec![
            stringer,
            a,
            a_string,
            bt,
            show,
            b.var_decl(&["s1"], None, vec![ok]),
            b.var_decl(&["s2"], None, vec![bad]),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::BoundViolation.code()));
    assert_eq!(diags[0].message, "B does not satisfy Stringer (missing method String)");
    // bound violations do not stop the call from being typed
    assert_eq!(type_of(&c, "s2"), "string");
}

#[test]
fn test_generic_function_value_needs_instantiation() {
    let (_, diags) = check(|b| {
        let sig = b.sig(vec![b.param(&["x"], b.ty_name("T"))], vec![b.anon(b.ty_name("T"))]);
        let id = b.func_decl(
            "id",
            vec![b.tparam(&["T"], b.ty_name("any"))],
            sig,
            b.block(vec![b.ret(vec![b.name("x")])]),
        );
        let inst = b.index(b.name("id"), vec![b.name("int")]);
        vec![id, b.var_decl(&["g"], None, vec![b.name("id")]), b.var_decl(&["h"], None, vec![inst])]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::GenericFuncValue.code()));
}

/// `type <name> interface { type <types...> }`
fn constraint_decl(b: &AstBuilder, name: &str, types: &[&str]) -> Decl {
    let list = types.iter().map(|t| b.ty_name(t)).collect();
    b.type_decl(name, Vec::new(), b.ty_interface(vec![b.type_list(list)]))
}

/// `func <name>[T <bound>](x T) T { return <body> }`
fn unary_decl(b: &AstBuilder, name: &str, bound: &str, body: P<Expr>) -> Decl {
    b.func_decl(
        name,
        vec![b.tparam(&["T"], b.ty_name(bound))],
        b.sig(vec![b.param(&["x"], b.ty_name("T"))], vec![b.anon(b.ty_name("T"))]),
        b.block(vec![b.ret(vec![body])]),
    )
}

#[test]
fn test_type_list_matches_underlying_type() {
    // type MyInt int
    // func Int[T interface{ type int }](x T) T
    // func Mine[T interface{ type MyInt }](x T) T
    let (c, diags) = check(|b| {
        vec![
            b.type_decl("MyInt", Vec::new(), b.ty_name("int")),
            constraint_decl(b, "Integer", &["int"]),
            constraint_decl(b, "OnlyMyInt", &["MyInt"]),
            unary_decl(b, "Int", "Integer", b.name("x")),
            unary_decl(b, "Mine", "OnlyMyInt", b.name("x")),
            b.var_decl(&["m"], Some(b.ty_name("MyInt")), Vec::new()),
            b.var_decl(&["ok"], None, vec![b.call(b.name("Int"), vec![b.name("m")])]),
            b.var_decl(&["bad"], None, vec![b.call(b.name("Mine"), vec![b.name("m")])]),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::BoundViolation.code()));
    assert_eq!(diags[0].message, "MyInt does not satisfy OnlyMyInt (int not found in [MyInt])");
    assert_eq!(type_of(&c, "ok"), "MyInt");
}

#[test]
fn test_type_list_rejects_other_types() {
    let (_, diags) = check(|b| {
        vec![
            constraint_decl(b, "Integer", &["int"]),
            unary_decl(b, "Int", "Integer", b.name("x")),
            b.var_decl(&["s"], Some(b.ty_name("string")), Vec::new()),
            b.var_decl(&["r"], None, vec![b.call(b.name("Int"), vec![b.name("s")])]),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::BoundViolation.code()));
    assert_eq!(diags[0].message, "string does not satisfy Integer (string not found in [int])");
}

#[test]
fn test_type_parameter_without_type_list() {
    // func Any[T any](x T) T { return Int(x) }
    let (_, diags) = check(|b| {
        vec![
            constraint_decl(b, "Integer", &["int"]),
            unary_decl(b, "Int", "Integer", b.name("x")),
            unary_decl(b, "Any", "any", b.call(b.name("Int"), vec![b.name("x")])),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::BoundViolation.code()));
    assert_eq!(diags[0].message, "T does not satisfy Integer (T has no type constraints)");
}

#[test]
fn test_type_parameter_list_not_a_subset() {
    // type Number interface { type int, float64 }
    // type Wide interface { Number }
    // func Num[T Number](x T) T { return Int(x) }
    // func Small[T Integer](x T) T { return Num(x) }
    // func Embedded[T Wide](x T) T { return Int(x) }
    let (_, diags) = check(|b| {
        vec![
            constraint_decl(b, "Integer", &["int"]),
            constraint_decl(b, "Number", &["int", "float64"]),
            b.type_decl("Wide", Vec::new(), b.ty_interface(vec![b.embed_elem(b.ty_name("Number"))])),
            unary_decl(b, "Int", "Integer", b.name("x")),
            unary_decl(b, "Num", "Number", b.call(b.name("Int"), vec![b.name("x")])),
            unary_decl(b, "Small", "Integer", b.call(b.name("Num"), vec![b.name("x")])),
            unary_decl(b, "Embedded", "Wide", b.call(b.name("Int"), vec![b.name("x")])),
        ]
    });
    assert_eq!(diags.len(), 2, "{:?}", diags);
    for d in &diags {
        assert_eq!(d.code, Some(TypeError::BoundViolation.code()));
    }
    assert_eq!(diags[0].message, "T does not satisfy Integer (T type constraint float64 not found in [int])");
    assert_eq!(diags[1].message, diags[0].message);
}

#[test]
fn test_comparable_bound() {
    let (_, diags) = check(|b| {
        let sig = b.sig(vec![b.param(&["a", "b"], b.ty_name("T"))], vec![b.anon(b.ty_name("bool"))]);
        let body = b.block(vec![b.ret(vec![b.binary(BinaryOp::Eq, b.name("a"), b.name("b"))])]);
        vec![
            b.func_decl("Eq", vec![b.tparam(&["T"], b.ty_name("comparable"))], sig, body),
            b.var_decl(&["xs"], Some(b.ty_slice(b.ty_name("int"))), Vec::new()),
            b.var_decl(&["i"], Some(b.ty_name("int")), Vec::new()),
            b.var_decl(&["ok"], None, vec![b.call(b.name("Eq"), vec![b.name("i"), b.name("i")])]),
            b.var_decl(&["bad"], None, vec![b.call(b.name("Eq"), vec![b.name("xs"), b.name("xs")])]),
        ]
    });
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].code, Some(TypeError::BoundViolation.code()));
    assert_eq!(diags[0].message, "[]int does not satisfy comparable");
}
