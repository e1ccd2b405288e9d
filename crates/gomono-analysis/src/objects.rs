//! Central container for everything a checking session allocates.
//!
//! Objects, types, scopes and packages live in arenas and refer to each
//! other through typed keys.

use gomono_common::span::Span;

use crate::arena::Arena;
use crate::obj::LangObj;
use crate::package::Package;
use crate::scope::Scope;
use crate::typ::{
    ArrayDetail, ChanDetail, ChanDir, InstanceDetail, InterfaceDetail, MapDetail, NamedDetail,
    PointerDetail, SignatureDetail, SliceDetail, StructDetail, TupleDetail, Type, TypeParamDetail,
};
use crate::universe::Universe;

crate::define_key! {
    /// Key for language objects (variables, functions, type names, ...).
    pub struct ObjKey;
    /// Key for types.
    pub struct TypeKey;
    /// Key for scopes.
    pub struct ScopeKey;
    /// Key for packages.
    pub struct PackageKey;
}

pub type LangObjs = Arena<ObjKey, LangObj>;
pub type Types = Arena<TypeKey, Type>;
pub type Scopes = Arena<ScopeKey, Scope>;
pub type Packages = Arena<PackageKey, Package>;

#[derive(Debug)]
pub struct TCObjects {
    pub lobjs: LangObjs,
    pub types: Types,
    pub scopes: Scopes,
    pub pkgs: Packages,
    /// Predeclared types and objects. Set once by [`TCObjects::new`].
    pub universe: Option<Universe>,
}

impl Default for TCObjects {
    fn default() -> Self {
        Self::new()
    }
}

impl TCObjects {
    pub fn new() -> Self {
        let mut objs = Self {
            lobjs: Arena::new(),
            types: Arena::new(),
            scopes: Arena::new(),
            pkgs: Arena::new(),
            universe: None,
        };
        objs.universe = Some(Universe::new(&mut objs));
        objs
    }

    pub fn universe(&self) -> &Universe {
        self.universe.as_ref().expect("universe not initialized")
    }

    // ------------------------------------------------------------------------
    // Scopes, packages and objects

    pub fn new_scope(
        &mut self,
        parent: Option<ScopeKey>,
        span: Span,
        comment: &str,
        is_func: bool,
    ) -> ScopeKey {
        self.scopes.insert(Scope::new(parent, span, comment, is_func))
    }

    pub fn new_package(&mut self, path: String) -> PackageKey {
        let parent = self.universe.as_ref().map(|u| u.scope());
        let scope = self.new_scope(parent, Span::dummy(), &format!("package {}", path), false);
        self.pkgs.insert(Package::new(path, scope))
    }

    pub fn new_const(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_const(span, pkg, name, typ))
    }

    pub fn new_type_name(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_type_name(span, pkg, name, typ))
    }

    pub fn new_var(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_var(span, pkg, name, typ))
    }

    pub fn new_field(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        embedded: bool,
    ) -> ObjKey {
        self.lobjs
            .insert(LangObj::new_field(span, pkg, name, typ, embedded))
    }

    pub fn new_func(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_func(span, pkg, name, typ))
    }

    // ------------------------------------------------------------------------
    // Types

    pub fn new_t_array(&mut self, elem: TypeKey, len: Option<u64>) -> TypeKey {
        self.types.insert(Type::Array(ArrayDetail::new(elem, len)))
    }

    pub fn new_t_slice(&mut self, elem: TypeKey) -> TypeKey {
        self.types.insert(Type::Slice(SliceDetail::new(elem)))
    }

    pub fn new_t_struct(&mut self, fields: Vec<ObjKey>, tags: Vec<Option<String>>) -> TypeKey {
        self.types.insert(Type::Struct(StructDetail::new(fields, tags)))
    }

    pub fn new_t_pointer(&mut self, base: TypeKey) -> TypeKey {
        self.types.insert(Type::Pointer(PointerDetail::new(base)))
    }

    pub fn new_t_tuple(&mut self, vars: Vec<ObjKey>) -> TypeKey {
        self.types.insert(Type::Tuple(TupleDetail::new(vars)))
    }

    pub fn new_t_signature(&mut self, detail: SignatureDetail) -> TypeKey {
        self.types.insert(Type::Signature(detail))
    }

    pub fn new_t_interface(
        &mut self,
        methods: Vec<ObjKey>,
        types: Vec<TypeKey>,
        embeddeds: Vec<TypeKey>,
    ) -> TypeKey {
        self.types
            .insert(Type::Interface(InterfaceDetail::new(methods, types, embeddeds)))
    }

    pub fn new_t_empty_interface(&mut self) -> TypeKey {
        self.types.insert(Type::Interface(InterfaceDetail::new_empty()))
    }

    pub fn new_t_map(&mut self, key: TypeKey, elem: TypeKey) -> TypeKey {
        self.types.insert(Type::Map(MapDetail::new(key, elem)))
    }

    pub fn new_t_chan(&mut self, dir: ChanDir, elem: TypeKey) -> TypeKey {
        self.types.insert(Type::Chan(ChanDetail::new(dir, elem)))
    }

    /// Creates a named type and, when `obj` has no type yet, binds it.
    pub fn new_t_named(
        &mut self,
        obj: ObjKey,
        underlying: Option<TypeKey>,
        methods: Vec<ObjKey>,
    ) -> TypeKey {
        let key = self
            .types
            .insert(Type::Named(NamedDetail::new(obj, underlying, methods)));
        let lobj = &mut self.lobjs[obj];
        if lobj.typ().is_none() {
            lobj.set_type(Some(key));
        }
        key
    }

    pub fn new_t_type_param(&mut self, id: u64, obj: ObjKey, index: usize, bound: TypeKey) -> TypeKey {
        let key = self
            .types
            .insert(Type::TypeParam(TypeParamDetail::new(id, obj, index, bound)));
        let lobj = &mut self.lobjs[obj];
        if lobj.typ().is_none() {
            lobj.set_type(Some(key));
        }
        key
    }

    pub fn new_t_instance(
        &mut self,
        base: TypeKey,
        targs: Vec<TypeKey>,
        poslist: Vec<Span>,
        span: Span,
    ) -> TypeKey {
        self.types
            .insert(Type::Instance(InstanceDetail::new(base, targs, poslist, span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typ::BasicType;

    #[test]
    fn test_universe_is_ready() {
        let objs = TCObjects::new();
        let univ = objs.universe();
        let int = univ.types()[&BasicType::Int];
        assert!(objs.types[int].try_as_basic().is_some());
        assert!(objs.scopes[univ.scope()].lookup("int").is_some());
    }

    #[test]
    fn test_named_binds_object() {
        let mut objs = TCObjects::new();
        let obj = objs.new_type_name(Span::dummy(), None, "Box".to_string(), None);
        let named = objs.new_t_named(obj, None, Vec::new());
        assert_eq!(objs.lobjs[obj].typ(), Some(named));

        // a second Named for the same object keeps the original binding
        let again = objs.new_t_named(obj, None, Vec::new());
        assert_ne!(again, named);
        assert_eq!(objs.lobjs[obj].typ(), Some(named));
    }

    #[test]
    fn test_package_scope_is_child_of_universe() {
        let mut objs = TCObjects::new();
        let pkg = objs.new_package("main".to_string());
        let scope = objs.pkgs[pkg].scope();
        assert_eq!(objs.scopes[scope].parent(), Some(objs.universe().scope()));
    }
}
