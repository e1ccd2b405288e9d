//! Calls, conversions and builtins.

use gomono_syntax::ast::{CallExpr, Expr, P};

use super::checker::Checker;
use super::errors::TypeError;
use crate::obj::Builtin;
use crate::objects::{TCObjects, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, BasicType, Type};

impl Checker {
    pub(crate) fn call_expr(&mut self, x: &mut Operand, e: &P<Expr>, call: &CallExpr) {
        let f = self.raw_expr(&call.func, true);
        match f.mode {
            OperandMode::Invalid => {
                self.use_exprs(&call.args);
                return;
            }
            OperandMode::TypeExpr => {
                self.conversion(x, &f, call, e);
                return;
            }
            OperandMode::Builtin(b) => {
                self.builtin(x, b, call, e);
                return;
            }
            _ => {}
        }

        let ft = f.typ_or_invalid(&self.tc_objs);
        let u = self.under(ft);
        let Some((tparams, variadic)) = self.tc_objs.types[u]
            .try_as_signature()
            .map(|s| (s.tparams().to_vec(), s.variadic()))
        else {
            let s = self.operand_string(&f);
            self.error_code_msg(TypeError::CannotCall, f.span, format!("invalid operation: cannot call non-function {}", s));
            self.use_exprs(&call.args);
            return;
        };

        let Some(mut args) = self.call_args(&call.args) else {
            return;
        };
        let callee = self.expr_string(&f);
        let Some(params) = self.adjust_params(u, variadic, &args, call, e, &callee) else {
            return;
        };

        let sig = if tparams.is_empty() {
            u
        } else {
            let prefix = f.partial_targs.clone().unwrap_or_default();
            let targs = match self.infer(e.span, &tparams, &prefix, &params, &args) {
                Ok(targs) => targs,
                Err(err) => {
                    if let Some(d) = err.diagnostic() {
                        self.emit(d);
                    }
                    return;
                }
            };
            match self.instantiate(call.func.span, u, &targs, &[]) {
                Ok(inst) => {
                    log::debug!("inferred {}", typ::type_list_string(&targs, &self.tc_objs));
                    self.result.record_inferred(e.id, targs, inst);
                    inst
                }
                Err(err) => {
                    self.emit(err.diagnostic());
                    return;
                }
            }
        };

        let params = if sig == u {
            params
        } else {
            match self.adjust_params(sig, variadic, &args, call, e, &callee) {
                Some(params) => params,
                None => return,
            }
        };
        for (arg, p) in args.iter_mut().zip(params) {
            self.assignment(arg, Some(p), "argument");
        }

        let results = self.tc_objs.types[sig].try_as_signature().map(|s| s.results());
        let vars = results.map_or(&[][..], |r| typ::tuple_vars(r, &self.tc_objs));
        match vars {
            [] => {
                x.mode = OperandMode::NoValue;
                x.typ = Some(self.universe().no_value_tuple());
            }
            [v] => {
                x.mode = OperandMode::Value;
                x.typ = self.tc_objs.lobjs[*v].typ();
            }
            _ => {
                x.mode = OperandMode::Value;
                x.typ = results;
            }
        }
    }

    /// Evaluates call arguments. A single call returning several values
    /// provides one argument per result.
    fn call_args(&mut self, args: &[P<Expr>]) -> Option<Vec<Operand>> {
        if let [arg] = args {
            let x = self.multi_expr(arg);
            if x.invalid() {
                return None;
            }
            let t = x.typ_or_invalid(&self.tc_objs);
            let Some(tuple) = self.tc_objs.types[t].try_as_tuple() else {
                return Some(vec![x]);
            };
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
        let ops: Vec<Operand> = args.iter().map(|a| self.expr(a)).collect();
        if ops.iter().any(|op| op.invalid()) {
            return None;
        }
        Some(ops)
    }

    /// Parameter types matched against `args` one to one. The variadic
    /// parameter is repeated unless the call spreads a slice.
    fn adjust_params(
        &mut self,
        sig: TypeKey,
        variadic: bool,
        args: &[Operand],
        call: &CallExpr,
        e: &P<Expr>,
        callee: &str,
    ) -> Option<Vec<TypeKey>> {
        let invalid = self.invalid_type();
        let params: Vec<TypeKey> = self.tc_objs.types[sig]
            .try_as_signature()
            .map(|s| typ::tuple_vars(s.params(), &self.tc_objs))
            .unwrap_or_default()
            .iter()
            .map(|v| self.tc_objs.lobjs[*v].typ().unwrap_or(invalid))
            .collect();

        if call.spread && !variadic {
            self.error_code_msg(
                TypeError::SpreadNonVariadic,
                e.span,
                format!("cannot use ... in call to non-variadic {}", callee),
            );
            return None;
        }
        let (n, nargs) = (params.len(), args.len());
        let params = if variadic && !call.spread {
            if nargs + 1 < n {
                self.arg_count_error(e, callee, true);
                return None;
            }
            let last = params[n - 1];
            let elem = self.tc_objs.types[last].try_as_slice().map_or(invalid, |s| s.elem());
            let mut adjusted = params[..n - 1].to_vec();
            adjusted.resize(nargs, elem);
            adjusted
        } else {
            if nargs != n {
                self.arg_count_error(e, callee, nargs < n);
                return None;
            }
            params
        };
        Some(params)
    }

    fn arg_count_error(&self, e: &P<Expr>, callee: &str, too_few: bool) {
        let what = if too_few { "not enough" } else { "too many" };
        self.error_code_msg(
            TypeError::WrongArgCount,
            e.span,
            format!("{} arguments in call to {}", what, callee),
        );
    }

    fn conversion(&mut self, x: &mut Operand, f: &Operand, call: &CallExpr, e: &P<Expr>) {
        let t = f.typ_or_invalid(&self.tc_objs);
        let type_str = typ::type_string(t, &self.tc_objs);
        if call.args.len() != 1 {
            let what = if call.args.is_empty() { "missing argument" } else { "too many arguments" };
            self.error_code_msg(TypeError::WrongArgCount, e.span, format!("{} in conversion to {}", what, type_str));
            self.use_exprs(&call.args);
            return;
        }
        let mut y = self.expr(&call.args[0]);
        if y.invalid() {
            return;
        }
        if !self.convertible(&mut y, t) {
            let s = self.operand_string(&y);
            self.error_code_msg(TypeError::InvalidOp, y.span, format!("cannot convert {} to {}", s, type_str));
            return;
        }
        let constant = y.mode == OperandMode::Constant
            && self.tc_objs.types[typ::resolved(t, &self.tc_objs)].try_as_basic().is_some();
        x.mode = if constant { OperandMode::Constant } else { OperandMode::Value };
        x.typ = Some(t);
    }

    /// Reports whether `y` can be converted to `t`. Untyped operands are
    /// given their final type. Conversions involving type parameters are
    /// accepted.
    fn convertible(&mut self, y: &mut Operand, t: TypeKey) -> bool {
        let v = y.typ_or_invalid(&self.tc_objs);
        if typ::is_type_param(v, &self.tc_objs) || typ::is_type_param(t, &self.tc_objs) {
            let d = typ::untyped_default_type(v, &self.tc_objs);
            self.convert_untyped(y, d);
            return true;
        }
        if typ::is_untyped(v, &self.tc_objs) {
            let target = if self.assignable_to(y, t) {
                t
            } else {
                typ::untyped_default_type(v, &self.tc_objs)
            };
            self.convert_untyped(y, target);
            if y.invalid() {
                return false;
            }
        }
        if self.assignable_to(y, t) {
            return true;
        }
        let v = y.typ_or_invalid(&self.tc_objs);
        let (vu, tu) = (self.under(v), self.under(t));
        let objs = &self.tc_objs;
        if typ::identical(vu, tu, objs) {
            return true;
        }
        if let (Some(pv), Some(pt)) = (objs.types[vu].try_as_pointer(), objs.types[tu].try_as_pointer()) {
            let (bv, bt) = (typ::underlying_type(pv.base(), objs), typ::underlying_type(pt.base(), objs));
            if typ::identical(bv, bt, objs) {
                return true;
            }
        }
        if typ::is_numeric(vu, objs) && typ::is_numeric(tu, objs) {
            return true;
        }
        if typ::is_string(tu, objs) && (typ::is_integer(vu, objs) || is_bytes_or_runes(vu, objs)) {
            return true;
        }
        typ::is_string(vu, objs) && is_bytes_or_runes(tu, objs)
    }

    fn builtin(&mut self, x: &mut Operand, b: Builtin, call: &CallExpr, e: &P<Expr>) {
        let (min, more) = b.arity();
        let n = call.args.len();
        if n < min || (!more && n > min) {
            let what = if n < min { "not enough" } else { "too many" };
            self.error_code_msg(
                TypeError::BuiltinArgCount,
                e.span,
                format!("{} arguments for {}(...) (expected {}, found {})", what, b.name(), min, n),
            );
            self.use_exprs(&call.args);
            return;
        }
        if call.spread && b != Builtin::Append {
            self.error_code_msg(
                TypeError::SpreadNonVariadic,
                e.span,
                format!("invalid use of ... with built-in {}", b.name()),
            );
            self.use_exprs(&call.args);
            return;
        }

        let int = self.universe().basic(BasicType::Int);
        let result = match b {
            Builtin::Len | Builtin::Cap => {
                let y = self.expr(&call.args[0]);
                if y.invalid() {
                    return;
                }
                let t = y.typ_or_invalid(&self.tc_objs);
                let is_len = b == Builtin::Len;
                if !self.all_of(t, |t, objs| has_length(t, is_len, objs)) {
                    let s = self.operand_string(&y);
                    self.error_code_msg(TypeError::InvalidOp, y.span, format!("invalid argument: {} for {}", s, b.name()));
                    return;
                }
                Some(int)
            }
            Builtin::Append => {
                let s = self.expr(&call.args[0]);
                if s.invalid() {
                    self.use_exprs(&call.args[1..]);
                    return;
                }
                let st = s.typ_or_invalid(&self.tc_objs);
                let su = self.under(st);
                let Some(elem) = self.tc_objs.types[su].try_as_slice().map(|s| s.elem()) else {
                    let desc = self.operand_string(&s);
                    self.error_code_msg(TypeError::InvalidOp, s.span, format!("invalid argument: {} is not a slice", desc));
                    self.use_exprs(&call.args[1..]);
                    return;
                };
                if call.spread {
                    if n != 2 {
                        self.error_code_msg(TypeError::BuiltinArgCount, e.span, "can only use ... with final argument");
                        self.use_exprs(&call.args[1..]);
                        return;
                    }
                    let mut y = self.expr(&call.args[1]);
                    let yt = y.typ_or_invalid(&self.tc_objs);
                    let string_to_bytes = elem == self.universe().byte() && typ::is_string(yt, &self.tc_objs);
                    if !string_to_bytes {
                        self.assignment(&mut y, Some(st), "argument to append");
                    }
                } else {
                    for arg in &call.args[1..] {
                        let mut y = self.expr(arg);
                        self.assignment(&mut y, Some(elem), "argument to append");
                    }
                }
                Some(st)
            }
            Builtin::Close => {
                let y = self.expr(&call.args[0]);
                if y.invalid() {
                    return;
                }
                let t = y.typ_or_invalid(&self.tc_objs);
                if !self.all_of(t, |t, objs| objs.types[t].try_as_chan().is_some()) {
                    let s = self.operand_string(&y);
                    self.error_code_msg(TypeError::InvalidOp, y.span, format!("invalid argument: {} is not a channel", s));
                    return;
                }
                None
            }
            Builtin::Copy => {
                let dst = self.expr(&call.args[0]);
                let src = self.expr(&call.args[1]);
                if dst.invalid() || src.invalid() {
                    return;
                }
                let (dt, st) = (dst.typ_or_invalid(&self.tc_objs), src.typ_or_invalid(&self.tc_objs));
                let (du, su) = (self.under(dt), self.under(st));
                let objs = &self.tc_objs;
                let dst_elem = objs.types[du].try_as_slice().map(|s| s.elem());
                let src_elem = match &objs.types[su] {
                    Type::Slice(s) => Some(s.elem()),
                    _ if typ::is_string(su, objs) => Some(objs.universe().byte()),
                    _ => None,
                };
                let ok = matches!((dst_elem, src_elem), (Some(d), Some(s)) if typ::identical(d, s, objs));
                if !ok {
                    self.error_code_msg(
                        TypeError::InvalidOp,
                        e.span,
                        format!(
                            "invalid argument: copy expects slice arguments; found {} and {}",
                            self.operand_string(&dst),
                            self.operand_string(&src)
                        ),
                    );
                    return;
                }
                Some(int)
            }
            Builtin::Delete => {
                let m = self.expr(&call.args[0]);
                let mut k = self.expr(&call.args[1]);
                if m.invalid() || k.invalid() {
                    return;
                }
                let mt = m.typ_or_invalid(&self.tc_objs);
                let mu = self.under(mt);
                let Some(key) = self.tc_objs.types[mu].try_as_map().map(|m| m.key()) else {
                    let s = self.operand_string(&m);
                    self.error_code_msg(TypeError::InvalidOp, m.span, format!("invalid argument: {} is not a map", s));
                    return;
                };
                self.assignment(&mut k, Some(key), "argument to delete");
                None
            }
            Builtin::Make => {
                let Some(t) = self.type_operand(&call.args[0]) else {
                    self.use_exprs(&call.args[1..]);
                    return;
                };
                let u = self.under(t);
                let min = match &self.tc_objs.types[u] {
                    Type::Slice(_) => 2,
                    Type::Map(_) | Type::Chan(_) => 1,
                    _ => 0,
                };
                if min == 0 {
                    self.error_code_msg(
                        TypeError::InvalidOp,
                        call.args[0].span,
                        format!("invalid argument: cannot make {}", typ::type_string(t, &self.tc_objs)),
                    );
                    self.use_exprs(&call.args[1..]);
                    return;
                }
                if n < min || n > 3 {
                    self.error_code_msg(
                        TypeError::BuiltinArgCount,
                        e.span,
                        format!(
                            "invalid operation: make({}) expects {} or {} arguments; found {}",
                            typ::type_string(t, &self.tc_objs),
                            min,
                            3,
                            n
                        ),
                    );
                    self.use_exprs(&call.args[1..]);
                    return;
                }
                for size in &call.args[1..] {
                    self.index_value(size);
                }
                Some(t)
            }
            Builtin::New => {
                let Some(t) = self.type_operand(&call.args[0]) else {
                    return;
                };
                Some(self.tc_objs.new_t_pointer(t))
            }
            Builtin::Panic => {
                let mut y = self.expr(&call.args[0]);
                let any = self.universe().any();
                self.assignment(&mut y, Some(any), "argument to panic");
                None
            }
            Builtin::Print | Builtin::Println => {
                for arg in &call.args {
                    let mut y = self.expr(arg);
                    self.assignment(&mut y, None, "argument to print");
                }
                None
            }
        };

        match result {
            Some(t) => {
                x.mode = OperandMode::Value;
                x.typ = Some(t);
            }
            None => {
                x.mode = OperandMode::NoValue;
                x.typ = Some(self.universe().no_value_tuple());
            }
        }
    }
}

/// `[]byte` or `[]rune`, possibly named.
fn is_bytes_or_runes(t: TypeKey, objs: &TCObjects) -> bool {
    let Some(s) = objs.types[typ::underlying_type(t, objs)].try_as_slice() else {
        return false;
    };
    let elem = typ::underlying_type(s.elem(), objs);
    objs.types[elem]
        .try_as_basic()
        .is_some_and(|b| matches!(b.typ().real_type(), BasicType::Uint8 | BasicType::Int32))
}

fn has_length(t: TypeKey, is_len: bool, objs: &TCObjects) -> bool {
    let u = typ::underlying_type(t, objs);
    match &objs.types[u] {
        Type::Basic(_) => is_len && typ::is_string(u, objs),
        Type::Array(_) | Type::Slice(_) | Type::Chan(_) => true,
        Type::Map(_) => is_len,
        Type::Pointer(p) => objs.types[typ::underlying_type(p.base(), objs)].try_as_array().is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use gomono_common::config::TraceConfig;
    use gomono_syntax::ast::{BinaryOp, Decl};
    use gomono_syntax::AstBuilder;

    use super::*;

    fn check(build: impl FnOnce(&AstBuilder) -> Vec<Decl>) -> (Checker, Vec<String>) {
        let b = AstBuilder::new();
        let decls = build(&b);
        let file = b.file("main", decls);
        let (interner, _) = b.into_parts();
        let mut c = Checker::new(interner, TraceConfig::default());
        let _ = c.check_file(&file);
        let msgs = c.take_diagnostics().into_iter().map(|d| d.message).collect();
        (c, msgs)
    }

    #[test]
    fn test_inferred_call_records_instance() {
        // func id[T any](x T) T { return x }
        // var y = id(1)
        let (c, msgs) = check(|b| {
            let t = b.ty_name("T");
            let any = b.ty_name("any");
            let sig = b.sig(vec![b.param(&["x"], t.clone())], vec![b.anon(t)]);
            let body = b.block(vec![b.ret(vec![b.name("x")])]);
            let id = b.func_decl("id", vec![b.tparam(&["T"], any)], sig, body);
            let call = b.call(b.name("id"), vec![b.int(1)]);
            vec![id, b.var_decl(&["y"], None, vec![call])]
        });
        assert!(msgs.is_empty(), "{:?}", msgs);
        let inferred: Vec<_> = c.type_info().inferred.values().collect();
        assert_eq!(inferred.len(), 1);
        let objs = c.objects();
        assert_eq!(typ::type_list_string(&inferred[0].targs, objs), "int");
        assert_eq!(typ::type_string(inferred[0].sig, objs), "func(x int) int");
    }

    #[test]
    fn test_argument_count() {
        let (_, msgs) = check(|b| {
            let int = b.ty_name("int");
            let sig = b.sig(vec![b.param(&["a", "b"], int)], vec![]);
            let f = b.func_decl("f", vec![], sig, b.block(vec![]));
            let bad = b.call(b.name("f"), vec![b.int(1)]);
            let body = b.block(vec![b.expr_stmt(bad)]);
            let g = b.func_decl("g", vec![], b.sig(vec![], vec![]), body);
            vec![f, g]
        });
        assert_eq!(msgs, vec!["not enough arguments in call to f".to_string()]);
    }

    #[test]
    fn test_variadic_and_builtins() {
        // func sum(xs ...int) int { return len(xs) }
        // var n = sum(1, 2, 3) + cap(make([]int, 4))
        let (c, msgs) = check(|b| {
            let int = b.ty_name("int");
            let sig = b.variadic_sig(vec![b.param(&["xs"], int.clone())], vec![b.anon(int.clone())]);
            let len = b.call(b.name("len"), vec![b.name("xs")]);
            let sum = b.func_decl("sum", vec![], sig, b.block(vec![b.ret(vec![len])]));
            let call = b.call(b.name("sum"), vec![b.int(1), b.int(2), b.int(3)]);
            let slice_ty = b.ty_slice(int);
            let make = b.call(b.name("make"), vec![b.type_expr(slice_ty), b.int(4)]);
            let cap = b.call(b.name("cap"), vec![make]);
            let total = b.binary(BinaryOp::Add, call, cap);
            vec![sum, b.var_decl(&["n"], None, vec![total])]
        });
        assert!(msgs.is_empty(), "{:?}", msgs);
        let n = c.lookup("n").unwrap();
        assert_eq!(typ::type_string(c.objects().lobjs[n].typ().unwrap(), c.objects()), "int");
    }

    #[test]
    fn test_conversion() {
        let (_, msgs) = check(|b| {
            let float = b.ty_name("float64");
            let ok = b.call(b.type_expr(float), vec![b.int(3)]);
            let string = b.ty_name("string");
            let bad = b.call(b.type_expr(string), vec![b.float("1.5")]);
            vec![b.var_decl(&["a"], None, vec![ok]), b.var_decl(&["s"], None, vec![bad])]
        });
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("cannot convert 1.5"), "{}", msgs[0]);
    }
}
