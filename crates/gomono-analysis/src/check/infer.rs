//! Type argument inference for calls of generic functions.

use std::collections::HashMap;

use gomono_common::span::Span;

use super::checker::Checker;
use super::errors::InferError;
use super::format;
use super::subst::SubstMap;
use super::unify::Unifier;
use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::operand::Operand;
use crate::typ::{self, Type};

impl Checker {
    /// Infers the type arguments for `tparams` from the call arguments
    /// `args` passed to parameters of type `params`. `prefix` holds type
    /// arguments given explicitly.
    ///
    /// Typed arguments are unified first. Untyped arguments are then used,
    /// with their default type, for parameters whose type is a bare type
    /// parameter still unbound after the first pass. Untyped nil never
    /// binds anything.
    pub fn infer(
        &mut self,
        span: Span,
        tparams: &[ObjKey],
        prefix: &[TypeKey],
        params: &[TypeKey],
        args: &[Operand],
    ) -> Result<Vec<TypeKey>, InferError> {
        debug_assert_eq!(params.len(), args.len());
        if self.trace() {
            self.trace_print(&format!(
                "-- infer {} from ({})",
                tparams
                    .iter()
                    .map(|p| self.tc_objs.lobjs[*p].name())
                    .collect::<Vec<_>>()
                    .join(", "),
                args.iter()
                    .map(|a| a.describe(&self.tc_objs))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if prefix.len() == tparams.len() {
            return Ok(prefix.to_vec());
        }

        let tparam_types: Vec<TypeKey> = tparams
            .iter()
            .filter_map(|p| self.tc_objs.lobjs[*p].typ())
            .collect();

        let mut u = Unifier::new(self, false, tparams);
        for (i, t) in prefix.iter().enumerate() {
            u.set(i, *t);
        }

        // typed arguments
        let mut untyped: Vec<usize> = Vec::new();
        for (i, (par, arg)) in params.iter().zip(args).enumerate() {
            if !is_parameterized(&tparam_types, *par, &u.checker().tc_objs) {
                continue;
            }
            if arg.invalid() {
                return Err(InferError::InvalidArgument);
            }
            let targ = arg.typ_or_invalid(&u.checker().tc_objs);
            if typ::is_typed(targ, &u.checker().tc_objs) {
                if !u.unify(*par, targ) {
                    return Err(conflict(&mut u, tparams, "type", *par, targ, arg));
                }
            } else {
                untyped.push(i);
            }
        }

        // untyped arguments for still unbound bare type parameters
        let snapshot: Vec<Option<TypeKey>> = u.bindings().to_vec();
        untyped.retain(|i| {
            let par = params[*i];
            u.index(par).is_some_and(|k| snapshot[k].is_none())
        });
        for i in untyped {
            let arg = &args[i];
            let targ = typ::untyped_default_type(arg.typ_or_invalid(&u.checker().tc_objs), &u.checker().tc_objs);
            if typ::is_typed(targ, &u.checker().tc_objs) && !u.unify(params[i], targ) {
                return Err(conflict(&mut u, tparams, "default type", params[i], targ, arg));
            }
        }

        let bindings = u.bindings().to_vec();
        let mut targs = Vec::with_capacity(tparams.len());
        for (p, b) in tparams.iter().zip(bindings) {
            match b {
                Some(t) => targs.push(t),
                None => {
                    let obj = &self.tc_objs.lobjs[*p];
                    return Err(InferError::CannotInfer {
                        name: obj.name().to_string(),
                        declared: obj.span(),
                        span,
                    });
                }
            }
        }
        if self.trace() {
            self.trace_print(&format!(
                "=> [{}]",
                typ::type_list_string(&targs, &self.tc_objs)
            ));
        }
        Ok(targs)
    }
}

/// Builds the message for an argument of type `targ` that does not unify
/// with its parameter type `par`.
fn conflict(
    u: &mut Unifier<'_>,
    tparams: &[ObjKey],
    kind: &str,
    par: TypeKey,
    targ: TypeKey,
    arg: &Operand,
) -> InferError {
    let bindings = u.bindings().to_vec();
    let checker = u.checker();
    let arg_str = arg
        .expr
        .as_ref()
        .map(|e| format::format_expr(e, &checker.interner))
        .unwrap_or_else(|| arg.describe(&checker.tc_objs));
    let targ_str = typ::type_string(targ, &checker.tc_objs);
    let par_str = typ::type_string(par, &checker.tc_objs);

    let message = if bindings.iter().all(Option::is_none) {
        let names: Vec<&str> = tparams.iter().map(|p| checker.tc_objs.lobjs[*p].name()).collect();
        format!(
            "{} {} of {} does not match {} (cannot infer {})",
            kind,
            targ_str,
            arg_str,
            par_str,
            names.join(", ")
        )
    } else {
        let smap = SubstMap::from_bindings(tparams, &bindings, &checker.tc_objs);
        let inferred = checker.subst(arg.span, par, &smap);
        if inferred != par {
            format!(
                "{} {} of {} does not match inferred type {} for {}",
                kind,
                targ_str,
                arg_str,
                typ::type_string(inferred, &checker.tc_objs),
                par_str
            )
        } else {
            format!("{} {} of {} does not match {}", kind, targ_str, arg_str, par_str)
        }
    };
    InferError::Conflict {
        message,
        span: arg.span,
    }
}

/// Reports whether `t` mentions any of the type parameters `tparams`.
pub fn is_parameterized(tparams: &[TypeKey], t: TypeKey, objs: &TCObjects) -> bool {
    Walker {
        tparams,
        objs,
        seen: HashMap::new(),
    }
    .walk(t)
}

struct Walker<'a> {
    tparams: &'a [TypeKey],
    objs: &'a TCObjects,
    seen: HashMap<TypeKey, bool>,
}

impl Walker<'_> {
    fn walk(&mut self, t: TypeKey) -> bool {
        if let Some(r) = self.seen.get(&t) {
            return *r;
        }
        self.seen.insert(t, false);
        let r = self.walk_inner(t);
        self.seen.insert(t, r);
        r
    }

    fn walk_o(&mut self, t: Option<TypeKey>) -> bool {
        t.is_some_and(|t| self.walk(t))
    }

    fn walk_list(&mut self, list: &[TypeKey]) -> bool {
        list.iter().any(|t| self.walk(*t))
    }

    fn walk_vars(&mut self, vars: &[ObjKey]) -> bool {
        let objs = self.objs;
        vars.iter().any(|v| self.walk_o(objs.lobjs[*v].typ()))
    }

    fn walk_inner(&mut self, t: TypeKey) -> bool {
        let objs = self.objs;
        match &objs.types[t] {
            Type::Basic(_) => false,
            Type::Array(a) => self.walk(a.elem()),
            Type::Slice(s) => self.walk(s.elem()),
            Type::Pointer(p) => self.walk(p.base()),
            Type::Struct(s) => self.walk_vars(s.fields()),
            Type::Tuple(tuple) => self.walk_vars(tuple.vars()),
            // own type parameters and receiver type parameters are
            // declared here, not used
            Type::Signature(sig) => self.walk(sig.params()) || self.walk(sig.results()),
            Type::Interface(iface) => {
                let methods = iface.method_set();
                let types = iface.type_set();
                self.walk_vars(&methods) || self.walk_list(&types) || self.walk_list(iface.embeddeds())
            }
            Type::Map(m) => self.walk(m.key()) || self.walk(m.elem()),
            Type::Chan(c) => self.walk(c.elem()),
            Type::Named(n) => self.walk_list(n.targs()),
            Type::TypeParam(_) => self.tparams.contains(&t),
            Type::Instance(i) => match i.value() {
                Some(v) => self.walk(v),
                None => self.walk_list(i.targs()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_common::symbol::SymbolInterner;

    use crate::operand::OperandMode;
    use crate::typ::BasicType;

    fn setup() -> (Checker, ObjKey, TypeKey) {
        let mut c = Checker::new(SymbolInterner::new(), TraceConfig::default());
        let obj = c.tc_objs.new_type_name(Span::from_u32(5, 6), None, "T".to_string(), None);
        let any = c.universe().any();
        let id = c.next_tparam_id();
        let t = c.tc_objs.new_t_type_param(id, obj, 0, any);
        (c, obj, t)
    }

    fn value(t: TypeKey) -> Operand {
        Operand::with_mode(OperandMode::Value, Some(t))
    }

    fn constant(t: TypeKey) -> Operand {
        Operand::with_mode(OperandMode::Constant, Some(t))
    }

    #[test]
    fn test_same_typed_arguments() {
        let (mut c, p, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let targs = c
            .infer(Span::dummy(), &[p], &[], &[t, t], &[value(int), value(int)])
            .unwrap();
        assert_eq!(targs, vec![int]);
    }

    #[test]
    fn test_conflicting_typed_arguments() {
        let (mut c, p, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let err = c
            .infer(Span::dummy(), &[p], &[], &[t, t], &[value(int), value(string)])
            .unwrap_err();
        match err {
            InferError::Conflict { message, .. } => {
                assert!(message.contains("does not match"), "{}", message);
                assert!(message.contains("string"), "{}", message);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_untyped_constants_use_default_type() {
        let (mut c, p, t) = setup();
        let untyped_int = c.universe().basic(BasicType::UntypedInt);
        let int = c.universe().basic(BasicType::Int);
        let targs = c
            .infer(
                Span::dummy(),
                &[p],
                &[],
                &[t, t],
                &[constant(untyped_int), constant(untyped_int)],
            )
            .unwrap();
        assert_eq!(targs, vec![int]);
    }

    #[test]
    fn test_typed_argument_wins_over_untyped() {
        let (mut c, p, t) = setup();
        let untyped_int = c.universe().basic(BasicType::UntypedInt);
        let float = c.universe().basic(BasicType::Float64);
        let targs = c
            .infer(Span::dummy(), &[p], &[], &[t, t], &[constant(untyped_int), value(float)])
            .unwrap();
        assert_eq!(targs, vec![float]);
    }

    #[test]
    fn test_nil_does_not_bind() {
        let (mut c, p, t) = setup();
        let nil = c.universe().basic(BasicType::UntypedNil);
        let err = c
            .infer(Span::from_u32(10, 20), &[p], &[], &[t], &[value(nil)])
            .unwrap_err();
        assert_eq!(
            err,
            InferError::CannotInfer {
                name: "T".to_string(),
                declared: Span::from_u32(5, 6),
                span: Span::from_u32(10, 20),
            }
        );
    }

    #[test]
    fn test_parameterized_through_composites() {
        let (mut c, _, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let slice = c.tc_objs.new_t_slice(t);
        let map = c.tc_objs.new_t_map(int, slice);
        assert!(is_parameterized(&[t], map, &c.tc_objs));
        let ints = c.tc_objs.new_t_slice(int);
        assert!(!is_parameterized(&[t], ints, &c.tc_objs));
    }
}
