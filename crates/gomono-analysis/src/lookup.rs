//! Field and method lookup.
//!
//! Breadth-first search through embedded fields, depth by depth. A name
//! found twice at the same depth is ambiguous; a name found at a shallower
//! depth shadows deeper ones.

use std::collections::{HashMap, HashSet};

use crate::objects::{ObjKey, PackageKey, TCObjects, TypeKey};
use crate::typ::{self, bound_interface, named_methods, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// A struct field. `indirect` is set when a pointer was followed on the
    /// way to the field.
    Field {
        obj: ObjKey,
        indices: Vec<usize>,
        indirect: bool,
    },
    /// A method. `recv` is the named type the method was found on, which is
    /// an instance when the method belongs to a generic type; interface and
    /// type parameter methods have none.
    Method {
        obj: ObjKey,
        recv: Option<TypeKey>,
        indices: Vec<usize>,
        indirect: bool,
    },
    Ambiguous(Vec<usize>),
    /// A method with a pointer receiver found on a value that is neither a
    /// pointer nor addressable.
    PtrRecvRequired(ObjKey),
    NotFound,
}

impl LookupResult {
    pub fn obj(&self) -> Option<ObjKey> {
        match self {
            LookupResult::Field { obj, .. }
            | LookupResult::Method { obj, .. }
            | LookupResult::PtrRecvRequired(obj) => Some(*obj),
            _ => None,
        }
    }

    pub fn indirect(&self) -> bool {
        match self {
            LookupResult::Field { indirect, .. } | LookupResult::Method { indirect, .. } => *indirect,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct EmbeddedType {
    typ: TypeKey,
    indices: Vec<usize>,
    indirect: bool,
    multiples: bool,
}

/// Looks up the field or method `name` of `t`. `pkg` qualifies unexported
/// names. A method with a pointer receiver is only found through a pointer
/// or on an `addressable` value.
pub fn lookup_field_or_method(
    t: TypeKey,
    addressable: bool,
    pkg: Option<PackageKey>,
    name: &str,
    objs: &TCObjects,
) -> LookupResult {
    match lookup_impl(t, pkg, name, objs) {
        LookupResult::Method { obj, indirect, .. }
            if !indirect && !addressable && objs.lobjs[obj].func_has_ptr_recv() =>
        {
            LookupResult::PtrRecvRequired(obj)
        }
        result => result,
    }
}

fn lookup_impl(t: TypeKey, pkg: Option<PackageKey>, name: &str, objs: &TCObjects) -> LookupResult {
    if name == "_" {
        return LookupResult::NotFound;
    }

    let (base, is_ptr) = typ::deref(t, objs);
    // pointers to interfaces and type parameters have no methods
    if is_ptr && (typ::is_interface(base, objs) || typ::is_type_param(base, objs)) {
        return LookupResult::NotFound;
    }

    let mut current = vec![EmbeddedType {
        typ: base,
        indices: Vec::new(),
        indirect: is_ptr,
        multiples: false,
    }];
    let mut seen: HashSet<TypeKey> = HashSet::new();

    while !current.is_empty() {
        let mut next: Vec<EmbeddedType> = Vec::new();
        let mut found: Option<LookupResult> = None;

        for e in &current {
            let mut t = typ::resolved(e.typ, objs);

            if let Type::Named(_) = &objs.types[t] {
                if !seen.insert(t) {
                    continue;
                }
                let methods = named_methods(t, objs);
                if let Some(i) = find_obj(methods, pkg, name, objs) {
                    let indices = with_index(&e.indices, i);
                    if e.multiples || found.is_some() {
                        return LookupResult::Ambiguous(indices);
                    }
                    found = Some(LookupResult::Method {
                        obj: methods[i],
                        recv: Some(t),
                        indices,
                        indirect: e.indirect,
                    });
                    continue;
                }
                t = typ::underlying_type(t, objs);
            }

            match &objs.types[t] {
                Type::Struct(s) => {
                    for (i, f) in s.fields().iter().enumerate() {
                        let field = &objs.lobjs[*f];
                        if field.same_id(pkg, name, objs) {
                            let indices = with_index(&e.indices, i);
                            if e.multiples || found.is_some() {
                                return LookupResult::Ambiguous(indices);
                            }
                            found = Some(LookupResult::Field {
                                obj: *f,
                                indices,
                                indirect: e.indirect,
                            });
                            continue;
                        }
                        if found.is_none() && field.var_embedded() {
                            if let Some(ft) = field.typ() {
                                let (ft, ptr) = typ::deref(ft, objs);
                                next.push(EmbeddedType {
                                    typ: ft,
                                    indices: with_index(&e.indices, i),
                                    indirect: e.indirect || ptr,
                                    multiples: e.multiples,
                                });
                            }
                        }
                    }
                }
                Type::Interface(iface) => {
                    let methods = iface.method_set();
                    if let Some(i) = find_obj(&methods, pkg, name, objs) {
                        let indices = with_index(&e.indices, i);
                        if e.multiples || found.is_some() {
                            return LookupResult::Ambiguous(indices);
                        }
                        found = Some(LookupResult::Method {
                            obj: methods[i],
                            recv: None,
                            indices,
                            indirect: e.indirect,
                        });
                    }
                }
                Type::TypeParam(p) => {
                    if let Some(iface) = bound_interface(p.bound(), objs) {
                        let methods = iface.method_set();
                        if let Some(i) = find_obj(&methods, pkg, name, objs) {
                            if e.multiples || found.is_some() {
                                return LookupResult::Ambiguous(with_index(&e.indices, i));
                            }
                            found = Some(LookupResult::Method {
                                obj: methods[i],
                                recv: None,
                                indices: with_index(&e.indices, i),
                                indirect: e.indirect,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(result) = found {
            return result;
        }
        current = consolidate_multiples(next, objs);
    }

    LookupResult::NotFound
}

fn find_obj(list: &[ObjKey], pkg: Option<PackageKey>, name: &str, objs: &TCObjects) -> Option<usize> {
    list.iter().position(|o| objs.lobjs[*o].same_id(pkg, name, objs))
}

fn with_index(indices: &[usize], i: usize) -> Vec<usize> {
    let mut v = Vec::with_capacity(indices.len() + 1);
    v.extend_from_slice(indices);
    v.push(i);
    v
}

/// Merges entries for the same type found along different paths at the
/// same depth, marking them as multiples.
fn consolidate_multiples(list: Vec<EmbeddedType>, objs: &TCObjects) -> Vec<EmbeddedType> {
    if list.len() <= 1 {
        return list;
    }
    let mut positions: HashMap<TypeKey, usize> = HashMap::new();
    let mut out: Vec<EmbeddedType> = Vec::with_capacity(list.len());
    for e in list {
        let key = typ::resolved(e.typ, objs);
        let existing = positions
            .iter()
            .find(|(k, _)| typ::identical(**k, key, objs))
            .map(|(_, i)| *i);
        match existing {
            Some(i) => out[i].multiples = true,
            None => {
                positions.insert(key, out.len());
                out.push(e);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomono_common::span::Span;

    use crate::typ::{BasicType, SignatureDetail};

    fn method(objs: &mut TCObjects, name: &str) -> ObjKey {
        let empty = objs.universe().no_value_tuple();
        let sig = objs.new_t_signature(SignatureDetail::new(None, None, empty, empty, false));
        objs.new_func(Span::dummy(), None, name.to_string(), Some(sig))
    }

    /// type Inner struct{ x int }; func (Inner) M()
    /// type Outer struct{ Inner; y string }
    fn setup() -> (TCObjects, TypeKey, TypeKey, ObjKey) {
        let mut objs = TCObjects::new();
        let int = objs.universe().basic(BasicType::Int);
        let string = objs.universe().basic(BasicType::Str);

        let x = objs.new_field(Span::dummy(), None, "x".to_string(), Some(int), false);
        let inner_struct = objs.new_t_struct(vec![x], vec![None]);
        let inner_obj = objs.new_type_name(Span::dummy(), None, "Inner".to_string(), None);
        let m = method(&mut objs, "M");
        let inner = objs.new_t_named(inner_obj, Some(inner_struct), vec![m]);

        let embedded = objs.new_field(Span::dummy(), None, "Inner".to_string(), Some(inner), true);
        let y = objs.new_field(Span::dummy(), None, "y".to_string(), Some(string), false);
        let outer_struct = objs.new_t_struct(vec![embedded, y], vec![None, None]);
        let outer_obj = objs.new_type_name(Span::dummy(), None, "Outer".to_string(), None);
        let outer = objs.new_t_named(outer_obj, Some(outer_struct), Vec::new());
        (objs, inner, outer, m)
    }

    #[test]
    fn test_direct_and_promoted_fields() {
        let (objs, _, outer, _) = setup();
        match lookup_field_or_method(outer, false, None, "y", &objs) {
            LookupResult::Field { indices, indirect, .. } => {
                assert_eq!(indices, vec![1]);
                assert!(!indirect);
            }
            other => panic!("unexpected {:?}", other),
        }
        match lookup_field_or_method(outer, false, None, "x", &objs) {
            LookupResult::Field { indices, .. } => assert_eq!(indices, vec![0, 0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_promoted_method() {
        let (objs, inner, outer, m) = setup();
        match lookup_field_or_method(outer, false, None, "M", &objs) {
            LookupResult::Method { obj, recv, indices, .. } => {
                assert_eq!(obj, m);
                assert_eq!(recv, Some(inner));
                assert_eq!(indices, vec![0, 0]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(lookup_field_or_method(outer, false, None, "Z", &objs), LookupResult::NotFound);
    }

    #[test]
    fn test_pointer_is_indirect() {
        let (mut objs, _, outer, _) = setup();
        let ptr = objs.new_t_pointer(outer);
        let result = lookup_field_or_method(ptr, false, None, "y", &objs);
        assert!(result.indirect());
    }

    #[test]
    fn test_ambiguous_at_same_depth() {
        let (mut objs, inner, _, _) = setup();
        let a = objs.new_field(Span::dummy(), None, "Inner".to_string(), Some(inner), true);
        let ptr = objs.new_t_pointer(inner);
        let b = objs.new_field(Span::dummy(), None, "Inner".to_string(), Some(ptr), true);
        let s = objs.new_t_struct(vec![a, b], vec![None, None]);
        assert!(matches!(
            lookup_field_or_method(s, false, None, "x", &objs),
            LookupResult::Ambiguous(_)
        ));
    }

    #[test]
    fn test_pointer_receiver_needs_address() {
        let (mut objs, inner, _, m) = setup();
        objs.lobjs[m].set_func_has_ptr_recv(true);
        assert_eq!(
            lookup_field_or_method(inner, false, None, "M", &objs),
            LookupResult::PtrRecvRequired(m)
        );
        assert_eq!(lookup_field_or_method(inner, true, None, "M", &objs).obj(), Some(m));
        let ptr = objs.new_t_pointer(inner);
        assert!(lookup_field_or_method(ptr, false, None, "M", &objs).indirect());
    }
}
