//! Interface completion.
//!
//! Completion computes the full method set and constraint type list of an
//! interface from its explicit elements and its embedded interfaces. The
//! result is stored once in the interface's completion slots.

use std::collections::HashMap;

use gomono_common::span::Span;

use super::checker::Checker;
use super::errors::InterfaceError;
use crate::objects::{ObjKey, TypeKey};
use crate::typ::{self, Type};

impl Checker {
    /// Completes the interface `t`. Completing an already complete interface
    /// does nothing; an interface reached again while it is being completed
    /// contributes an empty set.
    ///
    /// Every problem found is reported; the first one is returned.
    pub fn complete_interface(&mut self, t: TypeKey) -> Result<(), InterfaceError> {
        let t = typ::resolved(t, &self.tc_objs);
        let (methods, types, embeddeds) = match &self.tc_objs.types[t] {
            Type::Interface(iface) if !iface.is_complete() => (
                iface.methods().to_vec(),
                iface.types().to_vec(),
                iface.embeddeds().to_vec(),
            ),
            _ => return Ok(()),
        };
        if self.trace() {
            self.trace_print(&format!("-- complete {}", typ::type_string(t, &self.tc_objs)));
        }

        // in progress
        if let Type::Interface(iface) = &self.tc_objs.types[t] {
            iface.set_complete(Vec::new(), Vec::new());
        }

        let mut first: Option<InterfaceError> = None;

        let mut all_methods: Vec<ObjKey> = Vec::with_capacity(methods.len());
        let mut seen: HashMap<String, ObjKey> = HashMap::new();
        for m in methods {
            let mobj = &self.tc_objs.lobjs[m];
            let id = mobj.id(&self.tc_objs).into_owned();
            if let Some(other) = seen.get(&id) {
                let err = InterfaceError::DuplicateMethod {
                    name: mobj.name().to_string(),
                    span: mobj.span(),
                    other: self.tc_objs.lobjs[*other].span(),
                };
                record(self, &mut first, err);
                continue;
            }
            seen.insert(id, m);
            all_methods.push(m);
        }

        let mut all_types: Vec<TypeKey> = Vec::new();
        for x in types {
            if !typ::includes(&all_types, x, &self.tc_objs) {
                all_types.push(x);
            }
        }

        let spans = self.pos_map.get(&t).cloned().unwrap_or_default();
        for (i, e) in embeddeds.into_iter().enumerate() {
            let span = spans.get(i).copied().unwrap_or_else(Span::dummy);
            let u = self.under(e);
            if typ::is_invalid(u, &self.tc_objs) {
                continue;
            }
            if self.tc_objs.types[u].try_as_interface().is_none() {
                let err = InterfaceError::NotAnInterface {
                    typ: typ::type_string(e, &self.tc_objs),
                    span,
                };
                record(self, &mut first, err);
                continue;
            }
            if let Err(err) = self.complete_interface(u) {
                if first.is_none() {
                    first = Some(err);
                }
            }
            let Some(embedded) = self.tc_objs.types[u].try_as_interface() else {
                continue;
            };
            let (emethods, etypes) = (embedded.method_set(), embedded.type_set());

            for m in emethods {
                let id = self.tc_objs.lobjs[m].id(&self.tc_objs).into_owned();
                match seen.get(&id) {
                    Some(other) => {
                        let (mt, ot) = (self.tc_objs.lobjs[m].typ(), self.tc_objs.lobjs[*other].typ());
                        if !typ::identical_o(mt, ot, &self.tc_objs) {
                            let err = InterfaceError::DuplicateMethod {
                                name: self.tc_objs.lobjs[m].name().to_string(),
                                span,
                                other: self.tc_objs.lobjs[*other].span(),
                            };
                            record(self, &mut first, err);
                        }
                    }
                    None => {
                        seen.insert(id, m);
                        all_methods.push(m);
                    }
                }
            }
            for et in etypes {
                if !typ::includes(&all_types, et, &self.tc_objs) {
                    all_types.push(et);
                }
            }
        }

        let objs = &self.tc_objs;
        all_methods.sort_by_cached_key(|m| objs.lobjs[*m].id(objs).into_owned());
        all_types.sort_by_cached_key(|t| typ::sort_name(*t, objs));

        if let Type::Interface(iface) = &self.tc_objs.types[t] {
            iface.set_complete(all_methods, all_types);
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn record(checker: &Checker, first: &mut Option<InterfaceError>, err: InterfaceError) {
    checker.emit(err.diagnostic());
    if first.is_none() {
        *first = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::config::TraceConfig;
    use gomono_common::symbol::SymbolInterner;

    use crate::typ::{BasicType, SignatureDetail};

    fn method(c: &mut Checker, name: &str, result: Option<TypeKey>) -> ObjKey {
        let objs = &mut c.tc_objs;
        let params = objs.universe().no_value_tuple();
        let results = match result {
            Some(r) => {
                let v = objs.new_var(Span::dummy(), None, String::new(), Some(r));
                objs.new_t_tuple(vec![v])
            }
            None => params,
        };
        let sig = objs.new_t_signature(SignatureDetail::new(None, None, params, results, false));
        objs.new_func(Span::from_u32(1, 2), None, name.to_string(), Some(sig))
    }

    fn checker() -> Checker {
        Checker::new(SymbolInterner::new(), TraceConfig::default())
    }

    #[test]
    fn test_embedded_methods_are_merged_and_sorted() {
        let mut c = checker();
        let b = method(&mut c, "B", None);
        let inner = c.tc_objs.new_t_interface(vec![b], Vec::new(), Vec::new());
        let a = method(&mut c, "A", None);
        let outer = c.tc_objs.new_t_interface(vec![a], Vec::new(), vec![inner]);

        assert!(c.complete_interface(outer).is_ok());
        let iface = c.tc_objs.types[outer].try_as_interface().unwrap();
        assert_eq!(iface.all_methods().clone(), Some(vec![a, b]));
        assert!(!c.has_errors());
    }

    #[test]
    fn test_duplicate_explicit_method() {
        let mut c = checker();
        let m1 = method(&mut c, "M", None);
        let m2 = method(&mut c, "M", None);
        let t = c.tc_objs.new_t_interface(vec![m1, m2], Vec::new(), Vec::new());
        let err = c.complete_interface(t).unwrap_err();
        assert!(matches!(err, InterfaceError::DuplicateMethod { ref name, .. } if name == "M"));
        assert_eq!(c.error_count(), 1);
    }

    #[test]
    fn test_conflicting_embedded_signatures() {
        let mut c = checker();
        let int = c.universe().basic(BasicType::Int);
        let m1 = method(&mut c, "M", None);
        let m2 = method(&mut c, "M", Some(int));
        let i1 = c.tc_objs.new_t_interface(vec![m1], Vec::new(), Vec::new());
        let i2 = c.tc_objs.new_t_interface(vec![m2], Vec::new(), Vec::new());
        let t = c.tc_objs.new_t_interface(Vec::new(), Vec::new(), vec![i1, i2]);
        assert!(c.complete_interface(t).is_err());
    }

    #[test]
    fn test_embedding_a_non_interface() {
        let mut c = checker();
        let int = c.universe().basic(BasicType::Int);
        let t = c.tc_objs.new_t_interface(Vec::new(), Vec::new(), vec![int]);
        let err = c.complete_interface(t).unwrap_err();
        assert_eq!(err.to_string(), "int is not an interface");
    }

    #[test]
    fn test_type_lists_are_unioned() {
        let mut c = checker();
        let int = c.universe().basic(BasicType::Int);
        let string = c.universe().basic(BasicType::Str);
        let inner = c.tc_objs.new_t_interface(Vec::new(), vec![string, int], Vec::new());
        let t = c.tc_objs.new_t_interface(Vec::new(), vec![int], vec![inner]);
        c.complete_interface(t).unwrap();
        let iface = c.tc_objs.types[t].try_as_interface().unwrap();
        assert_eq!(iface.type_set(), vec![int, string]);
    }

    fn named(c: &mut Checker, name: &str) -> TypeKey {
        let obj = c.tc_objs.new_type_name(Span::dummy(), None, name.to_string(), None);
        c.tc_objs.new_t_named(obj, None, Vec::new())
    }

    fn set_underlying(c: &mut Checker, named: TypeKey, u: TypeKey) {
        if let Some(n) = c.tc_objs.types[named].try_as_named_mut() {
            n.set_underlying(u);
        }
    }

    #[test]
    fn test_mutually_embedded_interfaces() {
        // type I interface { J; M() }
        // type J interface { I }
        let mut c = checker();
        let (i, j) = (named(&mut c, "I"), named(&mut c, "J"));
        let m = method(&mut c, "M", None);
        let i_iface = c.tc_objs.new_t_interface(vec![m], Vec::new(), vec![j]);
        let j_iface = c.tc_objs.new_t_interface(Vec::new(), Vec::new(), vec![i]);
        set_underlying(&mut c, i, i_iface);
        set_underlying(&mut c, j, j_iface);

        assert!(!typ::is_empty_interface(j, &c.tc_objs));
        assert!(c.complete_interface(i_iface).is_ok());
        let iface = c.tc_objs.types[i_iface].try_as_interface().unwrap();
        assert_eq!(iface.all_methods().clone(), Some(vec![m]));
        assert!(c.tc_objs.types[j_iface].try_as_interface().unwrap().is_complete());
        assert!(!typ::is_empty_interface(i, &c.tc_objs));
        assert!(!c.has_errors());
    }

    #[test]
    fn test_empty_interface_cycle() {
        // type I interface { J }
        // type J interface { I }
        let mut c = checker();
        let (i, j) = (named(&mut c, "I"), named(&mut c, "J"));
        let i_iface = c.tc_objs.new_t_interface(Vec::new(), Vec::new(), vec![j]);
        let j_iface = c.tc_objs.new_t_interface(Vec::new(), Vec::new(), vec![i]);
        set_underlying(&mut c, i, i_iface);
        set_underlying(&mut c, j, j_iface);

        assert!(typ::is_empty_interface(i, &c.tc_objs));
        c.complete_interface(j_iface).unwrap();
        assert!(typ::is_empty_interface(j, &c.tc_objs));
    }
}
