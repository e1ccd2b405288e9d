//! Type substitution and instantiation.
//!
//! `subst` rewrites a type under a mapping from type parameters to types.
//! Unchanged subtrees keep their keys. Instantiations of generic named
//! types are canonicalized through the checker's `typ_map`, and the new
//! named type is registered there before its underlying type is
//! substituted, so self-referential types terminate.

use std::collections::HashMap;

use gomono_common::span::Span;

use super::checker::Checker;
use super::errors::{InstantiateError, TypeError};
use crate::lookup::{lookup_field_or_method, LookupResult};
use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::typ::{self, NamedDetail, SignatureDetail, Type, EQUALITY_METHOD};

/// Mapping from type parameters to their replacement types.
#[derive(Debug, Clone, Default)]
pub struct SubstMap {
    map: HashMap<TypeKey, TypeKey>,
    targs: Vec<TypeKey>,
}

impl SubstMap {
    /// Maps each of `tparams` (type name objects) to the type argument at
    /// the same position.
    pub fn new(tparams: &[ObjKey], targs: &[TypeKey], objs: &TCObjects) -> SubstMap {
        debug_assert_eq!(tparams.len(), targs.len());
        let map = tparams
            .iter()
            .zip(targs)
            .filter_map(|(p, t)| objs.lobjs[*p].typ().map(|pt| (pt, *t)))
            .collect();
        SubstMap {
            map,
            targs: targs.to_vec(),
        }
    }

    /// Like [`SubstMap::new`] but skipping positions without a binding.
    pub fn from_bindings(tparams: &[ObjKey], bindings: &[Option<TypeKey>], objs: &TCObjects) -> SubstMap {
        let map: HashMap<TypeKey, TypeKey> = tparams
            .iter()
            .zip(bindings)
            .filter_map(|(p, b)| Some((objs.lobjs[*p].typ()?, (*b)?)))
            .collect();
        SubstMap {
            map,
            targs: bindings.iter().flatten().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn lookup(&self, t: TypeKey) -> Option<TypeKey> {
        self.map.get(&t).copied()
    }

    pub fn targs(&self) -> &[TypeKey] {
        &self.targs
    }
}

struct Subster<'a> {
    checker: &'a mut Checker,
    span: Span,
    smap: &'a SubstMap,
    cache: HashMap<TypeKey, TypeKey>,
}

impl Subster<'_> {
    fn typ(&mut self, t: TypeKey) -> TypeKey {
        if let Some(r) = self.smap.lookup(t) {
            return r;
        }
        if let Some(r) = self.cache.get(&t) {
            return *r;
        }
        let objs = &self.checker.tc_objs;
        match &objs.types[t] {
            Type::Basic(_) | Type::TypeParam(_) => t,
            Type::Array(a) => {
                let (elem, len) = (a.elem(), a.len());
                let e = self.typ(elem);
                if e != elem {
                    return self.checker.tc_objs.new_t_array(e, len);
                }
                t
            }
            Type::Slice(s) => {
                let elem = s.elem();
                let e = self.typ(elem);
                if e != elem {
                    return self.checker.tc_objs.new_t_slice(e);
                }
                t
            }
            Type::Pointer(p) => {
                let base = p.base();
                let b = self.typ(base);
                if b != base {
                    return self.checker.tc_objs.new_t_pointer(b);
                }
                t
            }
            Type::Map(m) => {
                let (key, elem) = (m.key(), m.elem());
                let (k, e) = (self.typ(key), self.typ(elem));
                if k != key || e != elem {
                    return self.checker.tc_objs.new_t_map(k, e);
                }
                t
            }
            Type::Chan(c) => {
                let (dir, elem) = (c.dir(), c.elem());
                let e = self.typ(elem);
                if e != elem {
                    return self.checker.tc_objs.new_t_chan(dir, e);
                }
                t
            }
            Type::Struct(s) => {
                let (fields, tags) = (s.fields().to_vec(), s.tags().to_vec());
                match self.var_list(&fields) {
                    Some(new_fields) => self.checker.tc_objs.new_t_struct(new_fields, tags),
                    None => t,
                }
            }
            Type::Tuple(tuple) => {
                let vars = tuple.vars().to_vec();
                match self.var_list(&vars) {
                    Some(new_vars) => self.checker.tc_objs.new_t_tuple(new_vars),
                    None => t,
                }
            }
            Type::Signature(sig) => {
                let sig = sig.clone();
                let recv = sig.recv().map(|r| self.var(r));
                let params = self.typ(sig.params());
                let results = self.typ(sig.results());
                if recv == sig.recv() && params == sig.params() && results == sig.results() {
                    return t;
                }
                let detail = SignatureDetail::new(sig.scope(), recv, params, results, sig.variadic())
                    .with_type_params(sig.rparams().to_vec(), sig.tparams().to_vec());
                self.checker.tc_objs.new_t_signature(detail)
            }
            Type::Interface(iface) => {
                let (methods, types, embeddeds) = (
                    iface.methods().to_vec(),
                    iface.types().to_vec(),
                    iface.embeddeds().to_vec(),
                );
                let new_methods = self.func_list(&methods);
                let new_types = self.type_list(&types);
                let new_embeddeds = self.type_list(&embeddeds);
                if new_methods.is_none() && new_types.is_none() && new_embeddeds.is_none() {
                    return t;
                }
                let iface = self.checker.tc_objs.new_t_interface(
                    new_methods.unwrap_or(methods),
                    new_types.unwrap_or(types),
                    new_embeddeds.unwrap_or(embeddeds),
                );
                if let Some(spans) = self.checker.pos_map.get(&t).cloned() {
                    self.checker.pos_map.insert(iface, spans);
                }
                self.cache.insert(t, iface);
                if let Err(err) = self.checker.complete_interface(iface) {
                    log::debug!("substituted interface is malformed: {}", err);
                }
                iface
            }
            Type::Named(n) => {
                let (obj, tparams, targs, underlying) =
                    (n.obj(), n.tparams().to_vec(), n.targs().to_vec(), n.underlying());
                self.named(t, obj, tparams, targs, underlying)
            }
            Type::Instance(_) => {
                let v = self.checker.expand(t);
                self.typ(v)
            }
        }
    }

    fn named(
        &mut self,
        t: TypeKey,
        obj: ObjKey,
        tparams: Vec<ObjKey>,
        targs: Vec<TypeKey>,
        underlying: Option<TypeKey>,
    ) -> TypeKey {
        if tparams.is_empty() {
            return t;
        }
        let new_targs = if targs.is_empty() {
            self.smap.targs().to_vec()
        } else {
            match self.type_list(&targs) {
                Some(list) => list,
                None => return t,
            }
        };

        let hash = typ::instance_hash(obj, &new_targs, &self.checker.tc_objs);
        if let Some(named) = self.checker.typ_map.get(&hash) {
            return *named;
        }

        let mut detail = NamedDetail::new(obj, None, Vec::new());
        detail.set_tparams(tparams);
        detail.set_targs(new_targs);
        let named = self.checker.tc_objs.types.insert(Type::Named(detail));
        log::debug!("new instance {} ({})", typ::type_string(named, &self.checker.tc_objs), hash);
        self.checker.typ_map.insert(hash, named);
        self.cache.insert(t, named);

        if let Some(u) = underlying {
            let u = self.typ(u);
            let u = typ::underlying_type(u, &self.checker.tc_objs);
            if let Some(n) = self.checker.tc_objs.types[named].try_as_named_mut() {
                n.set_underlying(u);
            }
        }
        named
    }

    fn var(&mut self, v: ObjKey) -> ObjKey {
        let Some(t) = self.checker.tc_objs.lobjs[v].typ() else {
            return v;
        };
        let nt = self.typ(t);
        if nt == t {
            return v;
        }
        let mut copy = self.checker.tc_objs.lobjs[v].clone();
        copy.set_type(Some(nt));
        self.checker.tc_objs.lobjs.insert(copy)
    }

    /// Substituted copies of `vars`, or `None` when nothing changed.
    fn var_list(&mut self, vars: &[ObjKey]) -> Option<Vec<ObjKey>> {
        let new: Vec<ObjKey> = vars.iter().map(|v| self.var(*v)).collect();
        (new.as_slice() != vars).then_some(new)
    }

    fn func_list(&mut self, funcs: &[ObjKey]) -> Option<Vec<ObjKey>> {
        self.var_list(funcs)
    }

    fn type_list(&mut self, list: &[TypeKey]) -> Option<Vec<TypeKey>> {
        let new: Vec<TypeKey> = list.iter().map(|t| self.typ(*t)).collect();
        (new.as_slice() != list).then_some(new)
    }
}

impl Checker {
    /// Substitutes `smap` in `t`. An empty map returns `t` itself.
    pub fn subst(&mut self, span: Span, t: TypeKey, smap: &SubstMap) -> TypeKey {
        if smap.is_empty() {
            return t;
        }
        let mut subster = Subster {
            checker: self,
            span,
            smap,
            cache: HashMap::new(),
        };
        let result = subster.typ(t);
        if subster.checker.trace() {
            let objs = &subster.checker.tc_objs;
            subster.checker.trace_print(&format!(
                "-- subst {} => {} at {}",
                typ::type_string(t, objs),
                typ::type_string(result, objs),
                subster.span
            ));
        }
        result
    }

    /// Instantiates the generic type or function signature `t` with `targs`.
    /// `poslist` holds the positions of the type arguments for bound errors;
    /// missing positions fall back to `span`.
    ///
    /// Bound violations are reported as soft errors and do not fail the
    /// instantiation. A signature result has no type parameters left.
    pub fn instantiate(
        &mut self,
        span: Span,
        t: TypeKey,
        targs: &[TypeKey],
        poslist: &[Span],
    ) -> Result<TypeKey, InstantiateError> {
        let t = typ::resolved(t, &self.tc_objs);
        let tparams = match &self.tc_objs.types[t] {
            Type::Named(n) => n.tparams().to_vec(),
            Type::Signature(s) => s.tparams().to_vec(),
            _ => {
                return Err(InstantiateError::NotGeneric {
                    name: typ::type_string(t, &self.tc_objs),
                    span,
                })
            }
        };
        if targs.len() != tparams.len() {
            return Err(InstantiateError::Arity {
                got: targs.len(),
                want: tparams.len(),
                span,
            });
        }
        if tparams.is_empty() {
            return Ok(t);
        }

        let smap = SubstMap::new(&tparams, targs, &self.tc_objs);
        for (i, tpar) in tparams.iter().enumerate() {
            let pos = poslist.get(i).copied().unwrap_or(span);
            if !self.satisfies(pos, targs[i], *tpar, &smap) {
                break;
            }
        }

        let result = self.subst(span, t, &smap);
        let result = match &self.tc_objs.types[result] {
            Type::Signature(sig) if result == t => {
                let mut copy = sig.clone();
                copy.clear_tparams();
                self.tc_objs.new_t_signature(copy)
            }
            Type::Signature(_) => {
                if let Some(sig) = self.tc_objs.types[result].try_as_signature_mut() {
                    sig.clear_tparams();
                }
                result
            }
            _ => result,
        };
        log::debug!(
            "instantiated {}[{}] => {}",
            typ::type_string(t, &self.tc_objs),
            typ::type_list_string(targs, &self.tc_objs),
            typ::type_string(result, &self.tc_objs)
        );
        Ok(result)
    }

    /// Expands an instance placeholder once and memoizes the result; other
    /// types are returned unchanged. A failed expansion yields the invalid
    /// type.
    pub fn expand(&mut self, t: TypeKey) -> TypeKey {
        let Some(inst) = self.tc_objs.types[t].try_as_instance() else {
            return t;
        };
        if let Some(v) = inst.value() {
            return v;
        }
        let (base, targs, poslist, span) = (
            inst.base(),
            inst.targs().to_vec(),
            inst.poslist().to_vec(),
            inst.span(),
        );
        let v = match self.instantiate(span, base, &targs, &poslist) {
            Ok(v) => v,
            Err(err) => {
                self.emit(err.diagnostic());
                self.invalid_type()
            }
        };
        if let Some(inst) = self.tc_objs.types[t].try_as_instance() {
            if inst.value().is_none() {
                inst.set_value(v);
            }
        }
        typ::resolved(t, &self.tc_objs)
    }

    /// Fully expanded structural view of `t`.
    pub fn under(&mut self, t: TypeKey) -> TypeKey {
        let t = self.expand(t);
        typ::underlying_type(t, &self.tc_objs)
    }

    /// Reports whether `targ` satisfies the bound of the type parameter
    /// `tpar` (with sibling parameters substituted by `smap`). A violation
    /// is reported as a soft error.
    pub(crate) fn satisfies(&mut self, span: Span, targ: TypeKey, tpar: ObjKey, smap: &SubstMap) -> bool {
        let Some(bound) = self.tc_objs.lobjs[tpar]
            .typ()
            .and_then(|t| self.tc_objs.types[t].try_as_type_param())
            .map(|p| p.bound())
        else {
            return true;
        };
        let bound_name = typ::type_string(bound, &self.tc_objs);
        let bound = self.subst(span, bound, smap);
        let iface = self.under(bound);
        if typ::is_invalid(iface, &self.tc_objs) {
            return true;
        }
        if let Err(err) = self.complete_interface(iface) {
            log::debug!("bound {} is malformed: {}", bound_name, err);
        }
        if typ::is_empty_interface(iface, &self.tc_objs) {
            return true;
        }
        let Some(detail) = self.tc_objs.types[iface].try_as_interface() else {
            return true;
        };
        let (methods, types) = (detail.method_set(), detail.type_set());
        let targ_name = typ::type_string(targ, &self.tc_objs);

        if !methods.is_empty() {
            let (base, is_ptr) = typ::deref(targ, &self.tc_objs);
            if is_ptr && typ::is_type_param(base, &self.tc_objs) {
                self.error_code_msg(TypeError::BoundViolation, span, format!("{} has no methods", targ_name));
                return false;
            }
            if let Some((m, wrong)) = self.missing_method(targ, iface, true) {
                let mname = self.tc_objs.lobjs[m].name().to_string();
                let msg = if mname == EQUALITY_METHOD {
                    format!("{} does not satisfy comparable", targ_name)
                } else if wrong {
                    format!("{} does not satisfy {} (wrong type for method {})", targ_name, bound_name, mname)
                } else {
                    format!("{} does not satisfy {} (missing method {})", targ_name, bound_name, mname)
                };
                self.error_code_msg(TypeError::BoundViolation, span, msg);
                return false;
            }
        }

        if types.is_empty() {
            return true;
        }
        let list = format!("[{}]", typ::type_list_string(&types, &self.tc_objs));

        if let Some(own_bound) = self.tc_objs.types[typ::resolved(targ, &self.tc_objs)]
            .try_as_type_param()
            .map(|p| p.bound())
        {
            let own_iface = self.under(own_bound);
            if let Err(err) = self.complete_interface(own_iface) {
                log::debug!("bound of {} is malformed: {}", targ_name, err);
            }
            let own = typ::bound_interface(own_iface, &self.tc_objs)
                .map(|i| i.type_set())
                .unwrap_or_default();
            if own.is_empty() {
                self.error_code_msg(
                    TypeError::BoundViolation,
                    span,
                    format!("{} does not satisfy {} ({} has no type constraints)", targ_name, bound_name, targ_name),
                );
                return false;
            }
            for t in own {
                if !self.type_list_admits(&types, t) {
                    self.error_code_msg(
                        TypeError::BoundViolation,
                        span,
                        format!(
                            "{} does not satisfy {} ({} type constraint {} not found in {})",
                            targ_name,
                            bound_name,
                            targ_name,
                            typ::type_string(t, &self.tc_objs),
                            list
                        ),
                    );
                    return false;
                }
            }
            return true;
        }

        if !self.type_list_admits(&types, targ) {
            let u = self.under(targ);
            self.error_code_msg(
                TypeError::BoundViolation,
                span,
                format!(
                    "{} does not satisfy {} ({} not found in {})",
                    targ_name,
                    bound_name,
                    typ::type_string(u, &self.tc_objs),
                    list
                ),
            );
            return false;
        }
        true
    }

    /// The permitted types are matched against the underlying type only.
    fn type_list_admits(&mut self, types: &[TypeKey], t: TypeKey) -> bool {
        let u = self.under(t);
        typ::includes(types, u, &self.tc_objs)
    }

    /// Returns a method of the interface `iface` that `t` lacks, with a flag
    /// telling whether `t` has a method of that name with the wrong type.
    /// With `static` unset, methods an interface `t` lacks are ignored.
    pub fn missing_method(&mut self, t: TypeKey, iface: TypeKey, is_static: bool) -> Option<(ObjKey, bool)> {
        let iface = self.under(iface);
        if let Err(err) = self.complete_interface(iface) {
            log::debug!("interface is malformed: {}", err);
        }
        let methods = self.tc_objs.types[iface].try_as_interface()?.method_set();
        if methods.is_empty() {
            return None;
        }

        let tu = self.under(t);
        if let Some(own) = self.tc_objs.types[tu].try_as_interface() {
            let own_methods = own.method_set();
            for m in methods {
                if self.tc_objs.lobjs[m].name() == EQUALITY_METHOD {
                    continue;
                }
                let objs = &self.tc_objs;
                let (pkg, name) = (objs.lobjs[m].pkg(), objs.lobjs[m].name());
                let found = own_methods
                    .iter()
                    .find(|o| objs.lobjs[**o].same_id(pkg, name, objs));
                match found {
                    None if is_static => return Some((m, false)),
                    None => {}
                    Some(o) => {
                        if !typ::identical_o(objs.lobjs[*o].typ(), objs.lobjs[m].typ(), objs) {
                            return Some((m, true));
                        }
                    }
                }
            }
            return None;
        }

        for m in methods {
            let (pkg, name) = (self.tc_objs.lobjs[m].pkg(), self.tc_objs.lobjs[m].name().to_string());
            if name == EQUALITY_METHOD {
                if !typ::comparable(t, &self.tc_objs) {
                    return Some((m, false));
                }
                continue;
            }
            let (obj, recv) = match lookup_field_or_method(t, false, pkg, &name, &self.tc_objs) {
                LookupResult::Method { obj, recv, .. } => (obj, recv),
                LookupResult::PtrRecvRequired(_) => return Some((m, true)),
                _ => return Some((m, false)),
            };
            if !self.tc_objs.lobjs[obj].is_func() {
                return Some((m, false));
            }
            let ft = self.method_type(obj, recv);
            if !typ::identical_o(Some(ft), self.tc_objs.lobjs[m].typ(), &self.tc_objs) {
                return Some((m, true));
            }
        }
        None
    }

    /// Signature of the method `obj` as seen on `recv`. Methods of generic
    /// types are declared in terms of their receiver type parameters; for an
    /// instance these are replaced by its type arguments.
    pub fn method_type(&mut self, obj: ObjKey, recv: Option<TypeKey>) -> TypeKey {
        let Some(sig) = self.tc_objs.lobjs[obj].typ() else {
            return self.invalid_type();
        };
        let Some(recv) = recv else {
            return sig;
        };
        let rparams = match self.tc_objs.types[sig].try_as_signature() {
            Some(s) if !s.rparams().is_empty() => s.rparams().to_vec(),
            _ => return sig,
        };
        let recv = typ::resolved(recv, &self.tc_objs);
        let targs = match self.tc_objs.types[recv].try_as_named() {
            Some(n) if n.targs().len() == rparams.len() => n.targs().to_vec(),
            _ => return sig,
        };
        let smap = SubstMap::new(&rparams, &targs, &self.tc_objs);
        self.subst(Span::dummy(), sig, &smap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_common::symbol::SymbolInterner;

    use crate::typ::{BasicType, ChanDir};

    fn checker() -> Checker {
        Checker::new(SymbolInterner::new(), TraceConfig::default())
    }

    fn type_param(c: &mut Checker, name: &str, index: usize) -> (ObjKey, TypeKey) {
        let obj = c.tc_objs.new_type_name(Span::dummy(), None, name.to_string(), None);
        let id = c.next_tparam_id();
        let any = c.universe().any();
        let t = c.tc_objs.new_t_type_param(id, obj, index, any);
        (obj, t)
    }

    #[test]
    fn test_empty_map_is_identity() {
        let mut c = checker();
        let (_, t) = type_param(&mut c, "T", 0);
        let slice = c.tc_objs.new_t_slice(t);
        let empty = SubstMap::default();
        assert_eq!(c.subst(Span::dummy(), slice, &empty), slice);
        assert_eq!(c.subst(Span::dummy(), t, &empty), t);
    }

    #[test]
    fn test_unrelated_types_are_shared() {
        let mut c = checker();
        let (p, _) = type_param(&mut c, "T", 0);
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let smap = SubstMap::new(&[p], &[string], &c.tc_objs);

        let array = c.tc_objs.new_t_array(int, Some(3));
        let slice = c.tc_objs.new_t_slice(int);
        let ptr = c.tc_objs.new_t_pointer(int);
        let map = c.tc_objs.new_t_map(string, int);
        let chan = c.tc_objs.new_t_chan(ChanDir::SendRecv, int);
        let f = c.tc_objs.new_field(Span::dummy(), None, "x".to_string(), Some(int), false);
        let strukt = c.tc_objs.new_t_struct(vec![f], vec![None]);
        let v = c.tc_objs.new_var(Span::dummy(), None, "a".to_string(), Some(int));
        let tuple = c.tc_objs.new_t_tuple(vec![v]);
        let sig = c
            .tc_objs
            .new_t_signature(SignatureDetail::new(None, None, tuple, tuple, false));

        for t in [array, slice, ptr, map, chan, strukt, tuple, sig] {
            assert_eq!(c.subst(Span::dummy(), t, &smap), t);
        }
    }

    #[test]
    fn test_composites_are_rebuilt() {
        let mut c = checker();
        let (p, t) = type_param(&mut c, "T", 0);
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let map = c.tc_objs.new_t_map(string, t);
        let slice = c.tc_objs.new_t_slice(map);
        let smap = SubstMap::new(&[p], &[int], &c.tc_objs);

        let r = c.subst(Span::dummy(), slice, &smap);
        assert_ne!(r, slice);
        assert_eq!(typ::type_string(r, &c.tc_objs), "[]map[string]int");
    }

    #[test]
    fn test_arity_error_leaves_cache_untouched() {
        let mut c = checker();
        let (p, _) = type_param(&mut c, "T", 0);
        let obj = c.tc_objs.new_type_name(Span::dummy(), None, "Box".to_string(), None);
        let named = c.tc_objs.new_t_named(obj, None, Vec::new());
        if let Some(n) = c.tc_objs.types[named].try_as_named_mut() {
            n.set_tparams(vec![p]);
        }
        let int = c.universe().basic(BasicType::Int);
        let err = c.instantiate(Span::dummy(), named, &[int, int], &[]).unwrap_err();
        assert_eq!(err.to_string(), "got 2 arguments but 1 type parameters");
        assert!(c.typ_map.is_empty());
    }
}
