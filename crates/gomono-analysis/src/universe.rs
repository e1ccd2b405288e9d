//! Universe scope and predeclared types and objects.

use std::collections::HashMap;

use gomono_common::span::Span;

use crate::obj::{Builtin, LangObj};
use crate::objects::{ObjKey, ScopeKey, TCObjects, TypeKey};
use crate::typ::{BasicDetail, BasicType, SignatureDetail, Type, EQUALITY_METHOD};

/// Predeclared entities every package scope sees through its parent.
#[derive(Debug)]
pub struct Universe {
    scope: ScopeKey,
    types: HashMap<BasicType, TypeKey>,
    byte: TypeKey,
    rune: TypeKey,
    no_value_tuple: TypeKey,
    error: TypeKey,
    /// Named interface holding the equality marker method.
    comparable: TypeKey,
    /// The empty interface bound to the name `any`.
    any: TypeKey,
}

impl Universe {
    pub fn new(objs: &mut TCObjects) -> Universe {
        let scope = objs.new_scope(None, Span::dummy(), "universe", false);

        let types = Self::define_basic_types(scope, objs);
        let byte = types[&BasicType::Byte];
        let rune = types[&BasicType::Rune];
        let no_value_tuple = objs.new_t_tuple(Vec::new());

        let error = Self::define_error(&types, no_value_tuple, scope, objs);
        let comparable = Self::define_comparable(no_value_tuple, scope, objs);
        let any = objs.new_t_empty_interface();
        let any_obj = objs.new_type_name(Span::dummy(), None, "any".to_string(), Some(any));
        declare(scope, any_obj, objs);

        let untyped_bool = types[&BasicType::UntypedBool];
        for name in ["true", "false"] {
            let obj = objs.new_const(Span::dummy(), None, name.to_string(), Some(untyped_bool));
            declare(scope, obj, objs);
        }
        let nil = objs.lobjs.insert(LangObj::new_nil(types[&BasicType::UntypedNil]));
        declare(scope, nil, objs);

        let invalid = types[&BasicType::Invalid];
        for b in Builtin::ALL {
            let obj = objs.lobjs.insert(LangObj::new_builtin(b, invalid));
            declare(scope, obj, objs);
        }

        Universe {
            scope,
            types,
            byte,
            rune,
            no_value_tuple,
            error,
            comparable,
            any,
        }
    }

    fn define_basic_types(scope: ScopeKey, objs: &mut TCObjects) -> HashMap<BasicType, TypeKey> {
        use BasicType::*;
        let all = [
            Invalid, Bool, Int, Int8, Int16, Int32, Int64, Uint, Uint8, Uint16, Uint32, Uint64,
            Uintptr, Float32, Float64, Str, UntypedBool, UntypedInt, UntypedRune, UntypedFloat,
            UntypedString, UntypedNil, Byte, Rune,
        ];
        let mut types = HashMap::new();
        for b in all {
            let key = objs.types.insert(Type::Basic(BasicDetail::new(b)));
            types.insert(b, key);
            // untyped kinds and "invalid type" are not nameable
            if b != Invalid && !b.is_untyped() {
                let obj = objs.new_type_name(Span::dummy(), None, b.name().to_string(), Some(key));
                declare(scope, obj, objs);
            }
        }
        types
    }

    /// `type error interface{ Error() string }`
    fn define_error(
        types: &HashMap<BasicType, TypeKey>,
        no_value_tuple: TypeKey,
        scope: ScopeKey,
        objs: &mut TCObjects,
    ) -> TypeKey {
        let result = objs.new_var(Span::dummy(), None, String::new(), Some(types[&BasicType::Str]));
        let results = objs.new_t_tuple(vec![result]);
        let sig = objs.new_t_signature(SignatureDetail::new(None, None, no_value_tuple, results, false));
        let method = objs.new_func(Span::dummy(), None, "Error".to_string(), Some(sig));
        let iface = objs.new_t_interface(vec![method], Vec::new(), Vec::new());
        if let Type::Interface(detail) = &objs.types[iface] {
            detail.set_complete(vec![method], Vec::new());
        }
        let obj = objs.new_type_name(Span::dummy(), None, "error".to_string(), None);
        let named = objs.new_t_named(obj, Some(iface), Vec::new());
        declare(scope, obj, objs);
        named
    }

    /// `comparable` is an interface whose only method is the equality marker.
    /// Satisfying it means supporting `==`.
    fn define_comparable(no_value_tuple: TypeKey, scope: ScopeKey, objs: &mut TCObjects) -> TypeKey {
        let sig = objs.new_t_signature(SignatureDetail::new(
            None,
            None,
            no_value_tuple,
            no_value_tuple,
            false,
        ));
        let method = objs.new_func(Span::dummy(), None, EQUALITY_METHOD.to_string(), Some(sig));
        let iface = objs.new_t_interface(vec![method], Vec::new(), Vec::new());
        if let Type::Interface(detail) = &objs.types[iface] {
            detail.set_complete(vec![method], Vec::new());
        }
        let obj = objs.new_type_name(Span::dummy(), None, "comparable".to_string(), None);
        let named = objs.new_t_named(obj, Some(iface), Vec::new());
        declare(scope, obj, objs);
        named
    }

    pub fn scope(&self) -> ScopeKey {
        self.scope
    }

    pub fn types(&self) -> &HashMap<BasicType, TypeKey> {
        &self.types
    }

    pub fn basic(&self, b: BasicType) -> TypeKey {
        self.types[&b]
    }

    pub fn invalid(&self) -> TypeKey {
        self.types[&BasicType::Invalid]
    }

    pub fn byte(&self) -> TypeKey {
        self.byte
    }

    pub fn rune(&self) -> TypeKey {
        self.rune
    }

    pub fn no_value_tuple(&self) -> TypeKey {
        self.no_value_tuple
    }

    pub fn error(&self) -> TypeKey {
        self.error
    }

    pub fn comparable(&self) -> TypeKey {
        self.comparable
    }

    pub fn any(&self) -> TypeKey {
        self.any
    }
}

fn declare(scope: ScopeKey, obj: ObjKey, objs: &mut TCObjects) {
    let name = objs.lobjs[obj].name().to_string();
    objs.scopes[scope].insert(name, obj);
    objs.lobjs[obj].set_parent(Some(scope));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::EntityType;
    use crate::typ::{comparable, is_empty_interface};

    #[test]
    fn test_predeclared_names() {
        let objs = TCObjects::new();
        let univ = objs.universe();
        let scope = &objs.scopes[univ.scope()];
        for name in ["int", "string", "byte", "rune", "error", "any", "comparable", "len", "nil", "true"] {
            assert!(scope.lookup(name).is_some(), "{} missing", name);
        }
        assert!(scope.lookup("untyped int").is_none());
        assert!(scope.lookup("complex128").is_none());
    }

    #[test]
    fn test_builtins_are_declared() {
        let objs = TCObjects::new();
        let scope = &objs.scopes[objs.universe().scope()];
        let append = scope.lookup("append").unwrap();
        assert_eq!(objs.lobjs[append].entity_type(), &EntityType::Builtin(Builtin::Append));
    }

    #[test]
    fn test_any_and_comparable() {
        let objs = TCObjects::new();
        let univ = objs.universe();
        assert!(is_empty_interface(univ.any(), &objs));
        assert!(!is_empty_interface(univ.comparable(), &objs));
        assert!(comparable(univ.basic(BasicType::Str), &objs));
    }
}
