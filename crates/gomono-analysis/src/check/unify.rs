//! Type unification.
//!
//! The unifier matches a parameter type against an argument type and binds
//! the type parameters it is solving for. Only type parameters on the
//! parameter side are variables.

use std::collections::HashSet;

use super::checker::Checker;
use crate::objects::{ObjKey, TypeKey};
use crate::typ::{self, Type};

pub(crate) struct Unifier<'a> {
    checker: &'a mut Checker,
    /// With `exact` unset, a defined type matches a type literal with the
    /// same structure and channel directions are ignored.
    exact: bool,
    tparams: Vec<TypeKey>,
    bindings: Vec<Option<TypeKey>>,
}

impl<'a> Unifier<'a> {
    pub fn new(checker: &'a mut Checker, exact: bool, tparams: &[ObjKey]) -> Unifier<'a> {
        let tparams: Vec<TypeKey> = tparams
            .iter()
            .map(|p| checker.tc_objs.lobjs[*p].typ().unwrap_or_else(|| checker.invalid_type()))
            .collect();
        let bindings = vec![None; tparams.len()];
        Unifier {
            checker,
            exact,
            tparams,
            bindings,
        }
    }

    pub fn checker(&mut self) -> &mut Checker {
        &mut *self.checker
    }

    pub fn bindings(&self) -> &[Option<TypeKey>] {
        &self.bindings
    }

    #[cfg(test)]
    pub fn binding(&self, i: usize) -> Option<TypeKey> {
        self.bindings.get(i).copied().flatten()
    }

    pub fn set(&mut self, i: usize, t: TypeKey) {
        self.bindings[i] = Some(t);
    }

    /// Position of `t` among the type parameters being solved for.
    pub fn index(&self, t: TypeKey) -> Option<usize> {
        self.tparams.iter().position(|p| *p == t)
    }

    /// Unbound type parameters are bound to the matching parts of `y`.
    pub fn unify(&mut self, x: TypeKey, y: TypeKey) -> bool {
        self.nify(x, y, &mut HashSet::new())
    }

    fn nify_eq(&mut self, x: TypeKey, y: TypeKey, p: &mut HashSet<(TypeKey, TypeKey)>) -> bool {
        x == y || self.nify(x, y, p)
    }

    fn nify(&mut self, x: TypeKey, y: TypeKey, p: &mut HashSet<(TypeKey, TypeKey)>) -> bool {
        let x = self.checker.expand(x);
        let y = self.checker.expand(y);

        if !self.exact {
            let objs = &self.checker.tc_objs;
            let x_named = objs.types[x].try_as_named().is_some();
            let y_named = objs.types[y].try_as_named().is_some();
            if x_named && !typ::is_named(y, objs) {
                let ux = typ::underlying_type(x, objs);
                return self.nify(ux, y, p);
            } else if y_named && !typ::is_named(x, objs) {
                let uy = typ::underlying_type(y, objs);
                return self.nify(x, uy, p);
            }
        }

        if let Some(i) = self.index(x) {
            return match self.bindings[i] {
                Some(bound) => self.nify_eq(bound, y, p),
                None => {
                    self.bindings[i] = Some(y);
                    true
                }
            };
        }

        let objs = &self.checker.tc_objs;
        match (&objs.types[x], &objs.types[y]) {
            (Type::Basic(bx), Type::Basic(by)) => bx.typ().real_type() == by.typ().real_type(),
            (Type::Array(ax), Type::Array(ay)) => {
                let (len_eq, ex, ey) = (ax.len() == ay.len(), ax.elem(), ay.elem());
                len_eq && self.nify(ex, ey, p)
            }
            (Type::Slice(sx), Type::Slice(sy)) => {
                let (ex, ey) = (sx.elem(), sy.elem());
                self.nify(ex, ey, p)
            }
            (Type::Pointer(px), Type::Pointer(py)) => {
                let (bx, by) = (px.base(), py.base());
                self.nify(bx, by, p)
            }
            (Type::Struct(sx), Type::Struct(sy)) => {
                if sx.fields().len() != sy.fields().len() {
                    return false;
                }
                let mut pairs = Vec::with_capacity(sx.fields().len());
                for (i, (f, g)) in sx.fields().iter().zip(sy.fields()).enumerate() {
                    let (of, og) = (&objs.lobjs[*f], &objs.lobjs[*g]);
                    if of.var_embedded() != og.var_embedded()
                        || sx.tag(i) != sy.tag(i)
                        || !of.same_id(og.pkg(), og.name(), objs)
                    {
                        return false;
                    }
                    match (of.typ(), og.typ()) {
                        (Some(a), Some(b)) => pairs.push((a, b)),
                        _ => return false,
                    }
                }
                pairs.into_iter().all(|(a, b)| self.nify(a, b, p))
            }
            (Type::Tuple(tx), Type::Tuple(ty)) => {
                if tx.vars().len() != ty.vars().len() {
                    return false;
                }
                let pairs: Option<Vec<(TypeKey, TypeKey)>> = tx
                    .vars()
                    .iter()
                    .zip(ty.vars())
                    .map(|(v, w)| Some((objs.lobjs[*v].typ()?, objs.lobjs[*w].typ()?)))
                    .collect();
                match pairs {
                    Some(pairs) => pairs.into_iter().all(|(a, b)| self.nify(a, b, p)),
                    None => false,
                }
            }
            (Type::Signature(sx), Type::Signature(sy)) => {
                if sx.tparams().len() != sy.tparams().len() || sx.variadic() != sy.variadic() {
                    return false;
                }
                let (px, py, rx, ry) = (sx.params(), sy.params(), sx.results(), sy.results());
                self.nify(px, py, p) && self.nify(rx, ry, p)
            }
            (Type::Interface(ix), Type::Interface(iy)) => {
                let (mx, my) = (ix.method_set(), iy.method_set());
                let (tx, ty) = (ix.type_set(), iy.type_set());
                if mx.len() != my.len() || tx.len() != ty.len() {
                    return false;
                }
                if !p.insert((x, y)) {
                    return true;
                }
                let mut pairs = Vec::with_capacity(mx.len() + tx.len());
                for (a, b) in mx.iter().zip(&my) {
                    let (oa, ob) = (&objs.lobjs[*a], &objs.lobjs[*b]);
                    if oa.id(objs) != ob.id(objs) {
                        return false;
                    }
                    match (oa.typ(), ob.typ()) {
                        (Some(a), Some(b)) => pairs.push((a, b)),
                        _ => return false,
                    }
                }
                pairs.extend(tx.into_iter().zip(ty));
                pairs.into_iter().all(|(a, b)| self.nify(a, b, p))
            }
            (Type::Map(mx), Type::Map(my)) => {
                let (kx, ky, ex, ey) = (mx.key(), my.key(), mx.elem(), my.elem());
                self.nify(kx, ky, p) && self.nify(ex, ey, p)
            }
            (Type::Chan(cx), Type::Chan(cy)) => {
                let dir_ok = !self.exact || cx.dir() == cy.dir();
                let (ex, ey) = (cx.elem(), cy.elem());
                dir_ok && self.nify(ex, ey, p)
            }
            (Type::Named(nx), Type::Named(ny)) => {
                if nx.obj() != ny.obj() || nx.targs().len() != ny.targs().len() {
                    return false;
                }
                let pairs: Vec<(TypeKey, TypeKey)> =
                    nx.targs().iter().copied().zip(ny.targs().iter().copied()).collect();
                pairs.into_iter().all(|(a, b)| self.nify(a, b, p))
            }
            // type parameters not being solved for are identical only to
            // themselves
            (Type::TypeParam(_), Type::TypeParam(_)) => x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_common::span::Span;
    use gomono_common::symbol::SymbolInterner;

    use crate::typ::{BasicType, ChanDir};

    fn setup() -> (Checker, ObjKey, TypeKey) {
        let mut c = Checker::new(SymbolInterner::new(), TraceConfig::default());
        let obj = c.tc_objs.new_type_name(Span::dummy(), None, "T".to_string(), None);
        let any = c.universe().any();
        let id = c.next_tparam_id();
        let t = c.tc_objs.new_t_type_param(id, obj, 0, any);
        (c, obj, t)
    }

    #[test]
    fn test_binds_nested_parameter() {
        let (mut c, p, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let param = c.tc_objs.new_t_map(string, t);
        let arg = c.tc_objs.new_t_map(string, int);
        let mut u = Unifier::new(&mut c, false, &[p]);
        assert!(u.unify(param, arg));
        assert_eq!(u.bindings(), &[Some(int)]);
    }

    #[test]
    fn test_existing_binding_must_match() {
        let (mut c, p, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let mut u = Unifier::new(&mut c, false, &[p]);
        assert!(u.unify(t, int));
        assert!(u.unify(t, int));
        assert!(!u.unify(t, string));
    }

    #[test]
    fn test_inexact_matches_underlying_and_direction() {
        let (mut c, p, t) = setup();
        let int = c.universe().basic(BasicType::Int);
        let slice_t = c.tc_objs.new_t_slice(t);
        let slice_int = c.tc_objs.new_t_slice(int);
        let obj = c.tc_objs.new_type_name(Span::dummy(), None, "Ints".to_string(), None);
        let ints = c.tc_objs.new_t_named(obj, Some(slice_int), Vec::new());

        let send = c.tc_objs.new_t_chan(ChanDir::SendOnly, t);
        let both = c.tc_objs.new_t_chan(ChanDir::SendRecv, int);

        let mut u = Unifier::new(&mut c, false, &[p]);
        assert!(u.unify(slice_t, ints));
        assert!(u.unify(send, both));
        assert_eq!(u.binding(0), Some(int));

        let mut exact = Unifier::new(&mut c, true, &[p]);
        assert!(!exact.unify(send, both));
    }
}
