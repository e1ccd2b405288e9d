//! Type representations.
//!
//! Every type lives in the session arena and is referred to by a
//! [`TypeKey`]. Types are immutable once built, except for the slots that
//! are filled exactly once during construction: a named type's underlying
//! type, an interface's computed method and type sets, and the memo slot of
//! an instance placeholder.

use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt::{self, Write};

use gomono_common::span::Span;

use crate::objects::{ObjKey, ScopeKey, TCObjects, TypeKey};

/// Name of the method the predeclared `comparable` interface uses to mark
/// comparability.
pub const EQUALITY_METHOD: &str = "==";

#[derive(Debug)]
pub enum Type {
    Basic(BasicDetail),
    Array(ArrayDetail),
    Slice(SliceDetail),
    Struct(StructDetail),
    Pointer(PointerDetail),
    Tuple(TupleDetail),
    Signature(SignatureDetail),
    Interface(InterfaceDetail),
    Map(MapDetail),
    Chan(ChanDetail),
    Named(NamedDetail),
    TypeParam(TypeParamDetail),
    /// An application of a generic type whose expansion is deferred.
    Instance(InstanceDetail),
}

impl Type {
    pub fn try_as_basic(&self) -> Option<&BasicDetail> {
        match self {
            Type::Basic(b) => Some(b),
            _ => None,
        }
    }

    pub fn try_as_array(&self) -> Option<&ArrayDetail> {
        match self {
            Type::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn try_as_slice(&self) -> Option<&SliceDetail> {
        match self {
            Type::Slice(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_struct(&self) -> Option<&StructDetail> {
        match self {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_pointer(&self) -> Option<&PointerDetail> {
        match self {
            Type::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn try_as_tuple(&self) -> Option<&TupleDetail> {
        match self {
            Type::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn try_as_signature(&self) -> Option<&SignatureDetail> {
        match self {
            Type::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_signature_mut(&mut self) -> Option<&mut SignatureDetail> {
        match self {
            Type::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_interface(&self) -> Option<&InterfaceDetail> {
        match self {
            Type::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn try_as_map(&self) -> Option<&MapDetail> {
        match self {
            Type::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn try_as_chan(&self) -> Option<&ChanDetail> {
        match self {
            Type::Chan(c) => Some(c),
            _ => None,
        }
    }

    pub fn try_as_named(&self) -> Option<&NamedDetail> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn try_as_named_mut(&mut self) -> Option<&mut NamedDetail> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn try_as_type_param(&self) -> Option<&TypeParamDetail> {
        match self {
            Type::TypeParam(t) => Some(t),
            _ => None,
        }
    }

    pub fn try_as_type_param_mut(&mut self) -> Option<&mut TypeParamDetail> {
        match self {
            Type::TypeParam(t) => Some(t),
            _ => None,
        }
    }

    pub fn try_as_instance(&self) -> Option<&InstanceDetail> {
        match self {
            Type::Instance(i) => Some(i),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Basic types

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasicType {
    Invalid,
    // predeclared types
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Str,
    // types for untyped values
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
    // aliases
    Byte,
    Rune,
}

impl BasicType {
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicType::UntypedBool
                | BasicType::UntypedInt
                | BasicType::UntypedRune
                | BasicType::UntypedFloat
                | BasicType::UntypedString
                | BasicType::UntypedNil
        )
    }

    pub fn real_type(self) -> BasicType {
        match self {
            BasicType::Byte => BasicType::Uint8,
            BasicType::Rune => BasicType::Int32,
            _ => self,
        }
    }

    pub fn info(self) -> BasicInfo {
        match self {
            BasicType::Invalid | BasicType::UntypedNil => BasicInfo::IsInvalid,
            BasicType::Bool | BasicType::UntypedBool => BasicInfo::IsBoolean,
            BasicType::Float32 | BasicType::Float64 | BasicType::UntypedFloat => BasicInfo::IsFloat,
            BasicType::Str | BasicType::UntypedString => BasicInfo::IsString,
            _ => BasicInfo::IsInteger,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicType::Invalid => "invalid type",
            BasicType::Bool => "bool",
            BasicType::Int => "int",
            BasicType::Int8 => "int8",
            BasicType::Int16 => "int16",
            BasicType::Int32 => "int32",
            BasicType::Int64 => "int64",
            BasicType::Uint => "uint",
            BasicType::Uint8 => "uint8",
            BasicType::Uint16 => "uint16",
            BasicType::Uint32 => "uint32",
            BasicType::Uint64 => "uint64",
            BasicType::Uintptr => "uintptr",
            BasicType::Float32 => "float32",
            BasicType::Float64 => "float64",
            BasicType::Str => "string",
            BasicType::UntypedBool => "untyped bool",
            BasicType::UntypedInt => "untyped int",
            BasicType::UntypedRune => "untyped rune",
            BasicType::UntypedFloat => "untyped float",
            BasicType::UntypedString => "untyped string",
            BasicType::UntypedNil => "untyped nil",
            BasicType::Byte => "byte",
            BasicType::Rune => "rune",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BasicInfo {
    IsInvalid,
    IsBoolean,
    IsInteger,
    IsFloat,
    IsString,
}

impl BasicInfo {
    pub fn is_ordered(self) -> bool {
        matches!(self, BasicInfo::IsInteger | BasicInfo::IsFloat | BasicInfo::IsString)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BasicInfo::IsInteger | BasicInfo::IsFloat)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct BasicDetail {
    typ: BasicType,
}

impl BasicDetail {
    pub fn new(typ: BasicType) -> BasicDetail {
        BasicDetail { typ }
    }

    pub fn typ(&self) -> BasicType {
        self.typ
    }

    pub fn info(&self) -> BasicInfo {
        self.typ.info()
    }

    pub fn name(&self) -> &'static str {
        self.typ.name()
    }
}

// ----------------------------------------------------------------------------
// Composite types

#[derive(Debug)]
pub struct ArrayDetail {
    len: Option<u64>,
    elem: TypeKey,
}

impl ArrayDetail {
    pub fn new(elem: TypeKey, len: Option<u64>) -> ArrayDetail {
        ArrayDetail { len, elem }
    }

    pub fn len(&self) -> Option<u64> {
        self.len
    }

    pub fn elem(&self) -> TypeKey {
        self.elem
    }
}

#[derive(Debug)]
pub struct SliceDetail {
    elem: TypeKey,
}

impl SliceDetail {
    pub fn new(elem: TypeKey) -> SliceDetail {
        SliceDetail { elem }
    }

    pub fn elem(&self) -> TypeKey {
        self.elem
    }
}

#[derive(Debug)]
pub struct StructDetail {
    fields: Vec<ObjKey>,
    tags: Vec<Option<String>>,
}

impl StructDetail {
    pub fn new(fields: Vec<ObjKey>, tags: Vec<Option<String>>) -> StructDetail {
        StructDetail { fields, tags }
    }

    pub fn fields(&self) -> &[ObjKey] {
        &self.fields
    }

    pub fn tags(&self) -> &[Option<String>] {
        &self.tags
    }

    pub fn tag(&self, i: usize) -> Option<&str> {
        self.tags.get(i).and_then(|t| t.as_deref())
    }
}

#[derive(Debug)]
pub struct PointerDetail {
    base: TypeKey,
}

impl PointerDetail {
    pub fn new(base: TypeKey) -> PointerDetail {
        PointerDetail { base }
    }

    pub fn base(&self) -> TypeKey {
        self.base
    }
}

/// An ordered list of variables, used for parameter and result lists.
#[derive(Debug)]
pub struct TupleDetail {
    vars: Vec<ObjKey>,
}

impl TupleDetail {
    pub fn new(vars: Vec<ObjKey>) -> TupleDetail {
        TupleDetail { vars }
    }

    pub fn vars(&self) -> &[ObjKey] {
        &self.vars
    }
}

#[derive(Clone, Debug)]
pub struct SignatureDetail {
    scope: Option<ScopeKey>,
    recv: Option<ObjKey>,
    /// Receiver type parameters of a method on a generic type.
    rparams: Vec<ObjKey>,
    tparams: Vec<ObjKey>,
    params: TypeKey,
    results: TypeKey,
    variadic: bool,
}

impl SignatureDetail {
    pub fn new(
        scope: Option<ScopeKey>,
        recv: Option<ObjKey>,
        params: TypeKey,
        results: TypeKey,
        variadic: bool,
    ) -> SignatureDetail {
        SignatureDetail {
            scope,
            recv,
            rparams: Vec::new(),
            tparams: Vec::new(),
            params,
            results,
            variadic,
        }
    }

    pub fn with_type_params(mut self, rparams: Vec<ObjKey>, tparams: Vec<ObjKey>) -> SignatureDetail {
        self.rparams = rparams;
        self.tparams = tparams;
        self
    }

    pub fn scope(&self) -> Option<ScopeKey> {
        self.scope
    }

    pub fn recv(&self) -> Option<ObjKey> {
        self.recv
    }

    pub fn rparams(&self) -> &[ObjKey] {
        &self.rparams
    }

    pub fn tparams(&self) -> &[ObjKey] {
        &self.tparams
    }

    pub fn clear_tparams(&mut self) {
        self.tparams.clear();
    }

    pub fn params(&self) -> TypeKey {
        self.params
    }

    pub fn set_params(&mut self, params: TypeKey) {
        self.params = params;
    }

    pub fn results(&self) -> TypeKey {
        self.results
    }

    pub fn set_results(&mut self, results: TypeKey) {
        self.results = results;
    }

    pub fn variadic(&self) -> bool {
        self.variadic
    }

    pub fn param_vars<'a>(&self, objs: &'a TCObjects) -> &'a [ObjKey] {
        tuple_vars(self.params, objs)
    }

    pub fn result_vars<'a>(&self, objs: &'a TCObjects) -> &'a [ObjKey] {
        tuple_vars(self.results, objs)
    }
}

/// A structural interface. `methods`, `types` and `embeddeds` are what the
/// source spells out; `all_methods` and `all_types` are filled in once by
/// interface completion.
#[derive(Debug)]
pub struct InterfaceDetail {
    methods: Vec<ObjKey>,
    types: Vec<TypeKey>,
    embeddeds: Vec<TypeKey>,
    all_methods: RefCell<Option<Vec<ObjKey>>>,
    all_types: RefCell<Option<Vec<TypeKey>>>,
}

impl InterfaceDetail {
    pub fn new(methods: Vec<ObjKey>, types: Vec<TypeKey>, embeddeds: Vec<TypeKey>) -> InterfaceDetail {
        InterfaceDetail {
            methods,
            types,
            embeddeds,
            all_methods: RefCell::new(None),
            all_types: RefCell::new(None),
        }
    }

    pub fn new_empty() -> InterfaceDetail {
        InterfaceDetail {
            methods: Vec::new(),
            types: Vec::new(),
            embeddeds: Vec::new(),
            all_methods: RefCell::new(Some(Vec::new())),
            all_types: RefCell::new(Some(Vec::new())),
        }
    }

    pub fn methods(&self) -> &[ObjKey] {
        &self.methods
    }

    pub fn types(&self) -> &[TypeKey] {
        &self.types
    }

    pub fn embeddeds(&self) -> &[TypeKey] {
        &self.embeddeds
    }

    pub fn all_methods(&self) -> Ref<'_, Option<Vec<ObjKey>>> {
        self.all_methods.borrow()
    }

    pub fn all_types(&self) -> Ref<'_, Option<Vec<TypeKey>>> {
        self.all_types.borrow()
    }

    pub fn is_complete(&self) -> bool {
        self.all_methods.borrow().is_some()
    }

    pub fn set_complete(&self, methods: Vec<ObjKey>, types: Vec<TypeKey>) {
        *self.all_methods.borrow_mut() = Some(methods);
        *self.all_types.borrow_mut() = Some(types);
    }

    /// Method set after completion, or the explicit methods before it.
    pub fn method_set(&self) -> Vec<ObjKey> {
        self.all_methods
            .borrow()
            .clone()
            .unwrap_or_else(|| self.methods.clone())
    }

    /// Constraint type set after completion, or the explicit types before it.
    pub fn type_set(&self) -> Vec<TypeKey> {
        self.all_types
            .borrow()
            .clone()
            .unwrap_or_else(|| self.types.clone())
    }
}

#[derive(Debug)]
pub struct MapDetail {
    key: TypeKey,
    elem: TypeKey,
}

impl MapDetail {
    pub fn new(key: TypeKey, elem: TypeKey) -> MapDetail {
        MapDetail { key, elem }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn elem(&self) -> TypeKey {
        self.elem
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChanDir {
    SendRecv,
    SendOnly,
    RecvOnly,
}

#[derive(Debug)]
pub struct ChanDetail {
    dir: ChanDir,
    elem: TypeKey,
}

impl ChanDetail {
    pub fn new(dir: ChanDir, elem: TypeKey) -> ChanDetail {
        ChanDetail { dir, elem }
    }

    pub fn dir(&self) -> ChanDir {
        self.dir
    }

    pub fn elem(&self) -> TypeKey {
        self.elem
    }
}

/// A defined type. Instances of a generic type share the declaration
/// object (and through it the method list) with the generic type and carry
/// their own type arguments.
#[derive(Debug)]
pub struct NamedDetail {
    obj: ObjKey,
    underlying: Option<TypeKey>,
    tparams: Vec<ObjKey>,
    targs: Vec<TypeKey>,
    methods: Vec<ObjKey>,
}

impl NamedDetail {
    pub fn new(obj: ObjKey, underlying: Option<TypeKey>, methods: Vec<ObjKey>) -> NamedDetail {
        NamedDetail {
            obj,
            underlying,
            tparams: Vec::new(),
            targs: Vec::new(),
            methods,
        }
    }

    pub fn obj(&self) -> ObjKey {
        self.obj
    }

    pub fn underlying(&self) -> Option<TypeKey> {
        self.underlying
    }

    pub fn set_underlying(&mut self, t: TypeKey) {
        self.underlying = Some(t);
    }

    pub fn tparams(&self) -> &[ObjKey] {
        &self.tparams
    }

    pub fn set_tparams(&mut self, tparams: Vec<ObjKey>) {
        self.tparams = tparams;
    }

    pub fn targs(&self) -> &[TypeKey] {
        &self.targs
    }

    pub fn set_targs(&mut self, targs: Vec<TypeKey>) {
        self.targs = targs;
    }

    pub fn methods(&self) -> &[ObjKey] {
        &self.methods
    }

    pub fn add_method(&mut self, m: ObjKey) {
        self.methods.push(m);
    }

    /// Declared with type parameters but not instantiated.
    pub fn is_generic(&self) -> bool {
        !self.tparams.is_empty() && self.targs.is_empty()
    }

    pub fn is_instance(&self) -> bool {
        !self.targs.is_empty()
    }
}

#[derive(Debug)]
pub struct TypeParamDetail {
    id: u64,
    obj: ObjKey,
    index: usize,
    bound: TypeKey,
}

impl TypeParamDetail {
    pub fn new(id: u64, obj: ObjKey, index: usize, bound: TypeKey) -> TypeParamDetail {
        TypeParamDetail { id, obj, index, bound }
    }

    /// Unique within a checking session.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn obj(&self) -> ObjKey {
        self.obj
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The constraint as written; its underlying type is an interface.
    pub fn bound(&self) -> TypeKey {
        self.bound
    }

    pub fn set_bound(&mut self, bound: TypeKey) {
        self.bound = bound;
    }
}

#[derive(Debug)]
pub struct InstanceDetail {
    base: TypeKey,
    targs: Vec<TypeKey>,
    poslist: Vec<Span>,
    span: Span,
    value: RefCell<Option<TypeKey>>,
}

impl InstanceDetail {
    pub fn new(base: TypeKey, targs: Vec<TypeKey>, poslist: Vec<Span>, span: Span) -> InstanceDetail {
        InstanceDetail {
            base,
            targs,
            poslist,
            span,
            value: RefCell::new(None),
        }
    }

    pub fn base(&self) -> TypeKey {
        self.base
    }

    pub fn targs(&self) -> &[TypeKey] {
        &self.targs
    }

    pub fn poslist(&self) -> &[Span] {
        &self.poslist
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn value(&self) -> Option<TypeKey> {
        *self.value.borrow()
    }

    pub fn set_value(&self, t: TypeKey) {
        *self.value.borrow_mut() = Some(t);
    }
}

// ----------------------------------------------------------------------------
// Utility functions

pub fn tuple_vars(t: TypeKey, objs: &TCObjects) -> &[ObjKey] {
    objs.types[t].try_as_tuple().map_or(&[], |t| t.vars())
}

/// Follows the memo slots of already expanded instance placeholders.
/// Unexpanded placeholders are returned as they are.
pub fn resolved(t: TypeKey, objs: &TCObjects) -> TypeKey {
    let mut t = t;
    while let Some(v) = objs.types[t].try_as_instance().and_then(|i| i.value()) {
        t = v;
    }
    t
}

/// Structural view of `t`: the underlying type of a named type, `t` itself
/// otherwise. Placeholders are not expanded.
pub fn underlying_type(t: TypeKey, objs: &TCObjects) -> TypeKey {
    let t = resolved(t, objs);
    match &objs.types[t] {
        Type::Named(n) => n.underlying().unwrap_or_else(|| objs.universe().invalid()),
        _ => t,
    }
}

fn basic_info(t: TypeKey, objs: &TCObjects) -> Option<BasicDetail> {
    objs.types[underlying_type(t, objs)].try_as_basic().copied()
}

pub fn is_invalid(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.typ() == BasicType::Invalid)
}

pub fn is_named(t: TypeKey, objs: &TCObjects) -> bool {
    matches!(objs.types[resolved(t, objs)], Type::Basic(_) | Type::Named(_) | Type::TypeParam(_))
}

pub fn is_boolean(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.info() == BasicInfo::IsBoolean)
}

pub fn is_integer(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.info() == BasicInfo::IsInteger)
}

pub fn is_numeric(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.info().is_numeric())
}

pub fn is_ordered(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.info().is_ordered())
}

pub fn is_string(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.info() == BasicInfo::IsString)
}

pub fn is_untyped(t: TypeKey, objs: &TCObjects) -> bool {
    basic_info(t, objs).is_some_and(|b| b.typ().is_untyped())
}

pub fn is_typed(t: TypeKey, objs: &TCObjects) -> bool {
    !is_untyped(t, objs)
}

pub fn is_interface(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[underlying_type(t, objs)].try_as_interface().is_some()
}

pub fn is_type_param(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[resolved(t, objs)].try_as_type_param().is_some()
}

/// A named type declared with type parameters and not yet instantiated.
pub fn is_generic(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[resolved(t, objs)]
        .try_as_named()
        .is_some_and(|n| n.is_generic())
}

/// Reports whether the value set of `t` includes `nil`.
pub fn has_nil(t: TypeKey, objs: &TCObjects) -> bool {
    match &objs.types[underlying_type(t, objs)] {
        Type::Basic(b) => b.typ() == BasicType::UntypedNil,
        Type::Slice(_)
        | Type::Pointer(_)
        | Type::Signature(_)
        | Type::Interface(_)
        | Type::Map(_)
        | Type::Chan(_) => true,
        _ => false,
    }
}

/// Reports whether values of `t` can be compared with `==`.
pub fn comparable(t: TypeKey, objs: &TCObjects) -> bool {
    comparable_impl(t, &mut HashSet::new(), objs)
}

fn comparable_impl(t: TypeKey, seen: &mut HashSet<TypeKey>, objs: &TCObjects) -> bool {
    let u = underlying_type(t, objs);
    if !seen.insert(u) {
        return true;
    }
    match &objs.types[u] {
        Type::Basic(b) => b.typ() != BasicType::UntypedNil,
        Type::Pointer(_) | Type::Interface(_) | Type::Chan(_) => true,
        Type::Struct(s) => s
            .fields()
            .iter()
            .all(|f| objs.lobjs[*f].typ().map_or(true, |ft| comparable_impl(ft, seen, objs))),
        Type::Array(a) => comparable_impl(a.elem(), seen, objs),
        Type::TypeParam(p) => {
            let Some(iface) = bound_interface(p.bound(), objs) else {
                return false;
            };
            let has_eq = iface
                .method_set()
                .iter()
                .any(|m| objs.lobjs[*m].name() == EQUALITY_METHOD);
            let types = iface.type_set();
            has_eq || (!types.is_empty() && types.iter().all(|t| comparable_impl(*t, seen, objs)))
        }
        _ => false,
    }
}

/// The interface underlying a type parameter bound, if it is one.
pub fn bound_interface(bound: TypeKey, objs: &TCObjects) -> Option<&InterfaceDetail> {
    objs.types[underlying_type(bound, objs)].try_as_interface()
}

/// Returns the default type for an untyped type; other types are returned
/// unchanged. The default type of untyped nil is untyped nil.
pub fn untyped_default_type(t: TypeKey, objs: &TCObjects) -> TypeKey {
    let univ = objs.universe();
    match objs.types[t].try_as_basic().map(|b| b.typ()) {
        Some(BasicType::UntypedBool) => univ.basic(BasicType::Bool),
        Some(BasicType::UntypedInt) => univ.basic(BasicType::Int),
        Some(BasicType::UntypedRune) => univ.rune(),
        Some(BasicType::UntypedFloat) => univ.basic(BasicType::Float64),
        Some(BasicType::UntypedString) => univ.basic(BasicType::Str),
        _ => t,
    }
}

/// Strips one pointer level. The flag reports whether a pointer was removed.
pub fn deref(t: TypeKey, objs: &TCObjects) -> (TypeKey, bool) {
    let r = resolved(t, objs);
    match &objs.types[r] {
        Type::Pointer(p) => (p.base(), true),
        _ => (t, false),
    }
}

/// Methods declared on the named type `t`. Instances report the methods of
/// the generic type they were instantiated from.
pub fn named_methods(t: TypeKey, objs: &TCObjects) -> &[ObjKey] {
    let t = resolved(t, objs);
    let Some(named) = objs.types[t].try_as_named() else {
        return &[];
    };
    if named.is_instance() {
        if let Some(orig) = objs.lobjs[named.obj()].typ() {
            if let Some(o) = objs.types[orig].try_as_named() {
                return o.methods();
            }
        }
    }
    named.methods()
}

/// Reports whether `t` is an interface with no methods and no constraint
/// types, looking through embedded interfaces.
pub fn is_empty_interface(t: TypeKey, objs: &TCObjects) -> bool {
    is_empty_interface_impl(t, &mut HashSet::new(), objs)
}

fn is_empty_interface_impl(t: TypeKey, seen: &mut HashSet<TypeKey>, objs: &TCObjects) -> bool {
    let u = underlying_type(t, objs);
    let Some(iface) = objs.types[u].try_as_interface() else {
        return false;
    };
    if !seen.insert(u) {
        return true;
    }
    if iface.is_complete() {
        return iface.method_set().is_empty() && iface.type_set().is_empty();
    }
    iface.methods().is_empty()
        && iface.types().is_empty()
        && iface
            .embeddeds()
            .iter()
            .all(|e| is_empty_interface_impl(*e, seen, objs))
}

/// Reports whether the constraint type list includes a type identical to `t`.
pub fn includes(list: &[TypeKey], t: TypeKey, objs: &TCObjects) -> bool {
    list.iter().any(|x| identical(*x, t, objs))
}

pub fn identical(x: TypeKey, y: TypeKey, objs: &TCObjects) -> bool {
    identical_impl(x, y, &mut HashSet::new(), objs)
}

pub fn identical_o(x: Option<TypeKey>, y: Option<TypeKey>, objs: &TCObjects) -> bool {
    match (x, y) {
        (Some(a), Some(b)) => identical(a, b, objs),
        (None, None) => true,
        _ => false,
    }
}

fn identical_impl(
    x: TypeKey,
    y: TypeKey,
    dup: &mut HashSet<(TypeKey, TypeKey)>,
    objs: &TCObjects,
) -> bool {
    if x == y {
        return true;
    }
    let (x, y) = (resolved(x, objs), resolved(y, objs));
    if x == y {
        return true;
    }

    match (&objs.types[x], &objs.types[y]) {
        (Type::Basic(bx), Type::Basic(by)) => bx.typ().real_type() == by.typ().real_type(),
        (Type::Array(ax), Type::Array(ay)) => {
            ax.len() == ay.len() && identical_impl(ax.elem(), ay.elem(), dup, objs)
        }
        (Type::Slice(sx), Type::Slice(sy)) => identical_impl(sx.elem(), sy.elem(), dup, objs),
        (Type::Struct(sx), Type::Struct(sy)) => {
            sx.fields().len() == sy.fields().len()
                && sx.fields().iter().zip(sy.fields()).enumerate().all(|(i, (f, g))| {
                    let of = &objs.lobjs[*f];
                    let og = &objs.lobjs[*g];
                    of.var_embedded() == og.var_embedded()
                        && sx.tag(i) == sy.tag(i)
                        && of.same_id(og.pkg(), og.name(), objs)
                        && identical_impl_o(of.typ(), og.typ(), dup, objs)
                })
        }
        (Type::Pointer(px), Type::Pointer(py)) => identical_impl(px.base(), py.base(), dup, objs),
        (Type::Tuple(tx), Type::Tuple(ty)) => {
            tx.vars().len() == ty.vars().len()
                && tx.vars().iter().zip(ty.vars()).all(|(v, w)| {
                    identical_impl_o(objs.lobjs[*v].typ(), objs.lobjs[*w].typ(), dup, objs)
                })
        }
        (Type::Signature(sx), Type::Signature(sy)) => {
            sx.variadic() == sy.variadic()
                && sx.tparams().len() == sy.tparams().len()
                && identical_impl(sx.params(), sy.params(), dup, objs)
                && identical_impl(sx.results(), sy.results(), dup, objs)
        }
        (Type::Interface(ix), Type::Interface(iy)) => {
            let (mx, my) = (ix.method_set(), iy.method_set());
            let (tx, ty) = (ix.type_set(), iy.type_set());
            if mx.len() != my.len() || tx.len() != ty.len() {
                return false;
            }
            if !dup.insert((x, y)) {
                return true;
            }
            tx.iter().all(|t| includes(&ty, *t, objs))
                && mx.iter().zip(&my).all(|(a, b)| {
                    let oa = &objs.lobjs[*a];
                    let ob = &objs.lobjs[*b];
                    oa.id(objs) == ob.id(objs) && identical_impl_o(oa.typ(), ob.typ(), dup, objs)
                })
        }
        (Type::Map(mx), Type::Map(my)) => {
            identical_impl(mx.key(), my.key(), dup, objs)
                && identical_impl(mx.elem(), my.elem(), dup, objs)
        }
        (Type::Chan(cx), Type::Chan(cy)) => {
            cx.dir() == cy.dir() && identical_impl(cx.elem(), cy.elem(), dup, objs)
        }
        (Type::Named(nx), Type::Named(ny)) => {
            nx.obj() == ny.obj()
                && nx.targs().len() == ny.targs().len()
                && nx
                    .targs()
                    .iter()
                    .zip(ny.targs())
                    .all(|(a, b)| identical_impl(*a, *b, dup, objs))
        }
        _ => false,
    }
}

fn identical_impl_o(
    x: Option<TypeKey>,
    y: Option<TypeKey>,
    dup: &mut HashSet<(TypeKey, TypeKey)>,
    objs: &TCObjects,
) -> bool {
    match (x, y) {
        (Some(a), Some(b)) => identical_impl(a, b, dup, objs),
        (None, None) => true,
        _ => false,
    }
}

// ----------------------------------------------------------------------------
// Formatting

/// Writes types in source form. In hash mode the output identifies a type
/// uniquely within a session: type parameters carry their id, named types
/// their object key, and alias basic types print as the aliased type.
struct TypeWriter<'a> {
    objs: &'a TCObjects,
    hash: bool,
}

impl TypeWriter<'_> {
    fn write(&self, w: &mut dyn Write, t: TypeKey) -> fmt::Result {
        let objs = self.objs;
        match &objs.types[t] {
            Type::Basic(b) => {
                let typ = if self.hash { b.typ().real_type() } else { b.typ() };
                w.write_str(typ.name())
            }
            Type::Array(a) => {
                match a.len() {
                    Some(n) => write!(w, "[{}]", n)?,
                    None => w.write_str("[unknown]")?,
                }
                self.write(w, a.elem())
            }
            Type::Slice(s) => {
                w.write_str("[]")?;
                self.write(w, s.elem())
            }
            Type::Struct(s) => {
                w.write_str("struct{")?;
                for (i, f) in s.fields().iter().enumerate() {
                    if i > 0 {
                        w.write_str("; ")?;
                    }
                    let field = &objs.lobjs[*f];
                    if !field.var_embedded() {
                        write!(w, "{} ", field.name())?;
                    }
                    self.write_o(w, field.typ())?;
                    if let Some(tag) = s.tag(i) {
                        write!(w, " {:?}", tag)?;
                    }
                }
                w.write_char('}')
            }
            Type::Pointer(p) => {
                w.write_char('*')?;
                self.write(w, p.base())
            }
            Type::Tuple(_) => self.write_tuple(w, t, false),
            Type::Signature(_) => {
                w.write_str("func")?;
                self.write_signature(w, t)
            }
            Type::Interface(i) => {
                w.write_str("interface{")?;
                let mut first = true;
                let mut sep = |w: &mut dyn Write| -> fmt::Result {
                    if !first {
                        w.write_str("; ")?;
                    }
                    first = false;
                    Ok(())
                };
                for m in i.methods() {
                    sep(w)?;
                    let mobj = &objs.lobjs[*m];
                    w.write_str(mobj.name())?;
                    match mobj.typ() {
                        Some(sig) => self.write_signature(w, sig)?,
                        None => w.write_str("()")?,
                    }
                }
                if !i.types().is_empty() {
                    sep(w)?;
                    w.write_str("type ")?;
                    self.write_list(w, i.types())?;
                }
                for e in i.embeddeds() {
                    sep(w)?;
                    self.write(w, *e)?;
                }
                w.write_char('}')
            }
            Type::Map(m) => {
                w.write_str("map[")?;
                self.write(w, m.key())?;
                w.write_char(']')?;
                self.write(w, m.elem())
            }
            Type::Chan(c) => {
                let (prefix, paren) = match c.dir() {
                    ChanDir::SendRecv => (
                        "chan ",
                        objs.types[c.elem()]
                            .try_as_chan()
                            .is_some_and(|e| e.dir() == ChanDir::RecvOnly),
                    ),
                    ChanDir::SendOnly => ("chan<- ", false),
                    ChanDir::RecvOnly => ("<-chan ", false),
                };
                w.write_str(prefix)?;
                if paren {
                    w.write_char('(')?;
                }
                self.write(w, c.elem())?;
                if paren {
                    w.write_char(')')?;
                }
                Ok(())
            }
            Type::Named(n) => {
                w.write_str(objs.lobjs[n.obj()].name())?;
                if self.hash {
                    write!(w, "#{}", n.obj().raw())?;
                }
                if !n.targs().is_empty() {
                    w.write_char('[')?;
                    self.write_list(w, n.targs())?;
                    w.write_char(']')?;
                }
                Ok(())
            }
            Type::TypeParam(p) => {
                w.write_str(objs.lobjs[p.obj()].name())?;
                if self.hash {
                    write!(w, "·{}", p.id())?;
                }
                Ok(())
            }
            Type::Instance(i) => match i.value() {
                Some(v) => self.write(w, v),
                None => {
                    self.write(w, i.base())?;
                    w.write_char('[')?;
                    self.write_list(w, i.targs())?;
                    w.write_char(']')
                }
            },
        }
    }

    fn write_o(&self, w: &mut dyn Write, t: Option<TypeKey>) -> fmt::Result {
        match t {
            Some(t) => self.write(w, t),
            None => w.write_str("<nil>"),
        }
    }

    fn write_list(&self, w: &mut dyn Write, list: &[TypeKey]) -> fmt::Result {
        for (i, t) in list.iter().enumerate() {
            if i > 0 {
                w.write_str(", ")?;
            }
            self.write(w, *t)?;
        }
        Ok(())
    }

    fn write_signature(&self, w: &mut dyn Write, t: TypeKey) -> fmt::Result {
        let Some(sig) = self.objs.types[t].try_as_signature() else {
            return self.write(w, t);
        };
        if !sig.tparams().is_empty() {
            w.write_char('[')?;
            for (i, p) in sig.tparams().iter().enumerate() {
                if i > 0 {
                    w.write_str(", ")?;
                }
                self.write_o(w, self.objs.lobjs[*p].typ())?;
            }
            w.write_char(']')?;
        }
        self.write_tuple(w, sig.params(), sig.variadic())?;
        let results = sig.result_vars(self.objs);
        match results {
            [] => Ok(()),
            [single] if self.objs.lobjs[*single].name().is_empty() => {
                w.write_char(' ')?;
                self.write_o(w, self.objs.lobjs[*single].typ())
            }
            _ => {
                w.write_char(' ')?;
                self.write_tuple(w, sig.results(), false)
            }
        }
    }

    fn write_tuple(&self, w: &mut dyn Write, t: TypeKey, variadic: bool) -> fmt::Result {
        let vars = tuple_vars(t, self.objs);
        w.write_char('(')?;
        for (i, v) in vars.iter().enumerate() {
            if i > 0 {
                w.write_str(", ")?;
            }
            let obj = &self.objs.lobjs[*v];
            if !obj.name().is_empty() {
                write!(w, "{} ", obj.name())?;
            }
            let slice_elem = obj
                .typ()
                .and_then(|vt| self.objs.types[underlying_type(vt, self.objs)].try_as_slice())
                .map(|s| s.elem());
            match (variadic && i + 1 == vars.len(), slice_elem) {
                (true, Some(elem)) => {
                    w.write_str("...")?;
                    self.write(w, elem)?;
                }
                _ => self.write_o(w, obj.typ())?,
            }
        }
        w.write_char(')')
    }
}

pub fn fmt_type(t: TypeKey, w: &mut dyn Write, objs: &TCObjects) -> fmt::Result {
    TypeWriter { objs, hash: false }.write(w, t)
}

pub fn fmt_signature(t: TypeKey, w: &mut dyn Write, objs: &TCObjects) -> fmt::Result {
    TypeWriter { objs, hash: false }.write_signature(w, t)
}

/// Source form of `t`, e.g. `map[string]List[int]`.
pub fn type_string(t: TypeKey, objs: &TCObjects) -> String {
    let mut s = String::new();
    let _ = fmt_type(t, &mut s, objs);
    s
}

pub fn type_list_string(list: &[TypeKey], objs: &TCObjects) -> String {
    let mut s = String::new();
    let _ = TypeWriter { objs, hash: false }.write_list(&mut s, list);
    s
}

/// Name that orders constraint types deterministically and distinguishes
/// every structurally different type.
pub fn sort_name(t: TypeKey, objs: &TCObjects) -> String {
    let mut s = String::new();
    let _ = TypeWriter { objs, hash: true }.write(&mut s, t);
    s
}

/// Canonical key of the instantiation of the generic type declared by `obj`
/// with `targs`. Structurally equal argument lists produce equal keys.
pub fn instance_hash(obj: ObjKey, targs: &[TypeKey], objs: &TCObjects) -> String {
    let writer = TypeWriter { objs, hash: true };
    let mut s = format!("{}#{}(", objs.lobjs[obj].name(), obj.raw());
    let _ = writer.write_list(&mut s, targs);
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(objs: &TCObjects, b: BasicType) -> TypeKey {
        objs.universe().basic(b)
    }

    #[test]
    fn test_byte_is_identical_to_uint8() {
        let objs = TCObjects::new();
        let byte = objs.universe().byte();
        let uint8 = basic(&objs, BasicType::Uint8);
        assert!(identical(byte, uint8, &objs));
        assert_eq!(type_string(byte, &objs), "byte");
        assert_eq!(sort_name(byte, &objs), "uint8");
    }

    #[test]
    fn test_composite_identity_and_format() {
        let mut objs = TCObjects::new();
        let int = basic(&objs, BasicType::Int);
        let string = basic(&objs, BasicType::Str);
        let m1 = objs.new_t_map(string, int);
        let s1 = objs.new_t_slice(m1);
        let m2 = objs.new_t_map(string, int);
        let s2 = objs.new_t_slice(m2);
        assert_ne!(s1, s2);
        assert!(identical(s1, s2, &objs));
        assert_eq!(type_string(s1, &objs), "[]map[string]int");

        let p = objs.new_t_pointer(int);
        assert!(!identical(p, s1, &objs));
        assert_eq!(type_string(p, &objs), "*int");
    }

    #[test]
    fn test_chan_format() {
        let mut objs = TCObjects::new();
        let int = basic(&objs, BasicType::Int);
        let recv = objs.new_t_chan(ChanDir::RecvOnly, int);
        let outer = objs.new_t_chan(ChanDir::SendRecv, recv);
        assert_eq!(type_string(outer, &objs), "chan (<-chan int)");
    }

    #[test]
    fn test_untyped_defaults() {
        let objs = TCObjects::new();
        let univ = objs.universe();
        assert_eq!(
            untyped_default_type(univ.basic(BasicType::UntypedInt), &objs),
            univ.basic(BasicType::Int)
        );
        assert_eq!(untyped_default_type(univ.basic(BasicType::UntypedRune), &objs), univ.rune());
        let nil = univ.basic(BasicType::UntypedNil);
        assert_eq!(untyped_default_type(nil, &objs), nil);
    }

    #[test]
    fn test_comparable_and_has_nil() {
        let mut objs = TCObjects::new();
        let int = basic(&objs, BasicType::Int);
        let slice = objs.new_t_slice(int);
        let arr = objs.new_t_array(slice, Some(2));
        assert!(comparable(int, &objs));
        assert!(!comparable(slice, &objs));
        assert!(!comparable(arr, &objs));
        assert!(has_nil(slice, &objs));
        assert!(!has_nil(int, &objs));
    }

    #[test]
    fn test_empty_interface() {
        let objs = TCObjects::new();
        let any = objs.universe().any();
        assert!(is_empty_interface(any, &objs));
        assert!(!is_empty_interface(objs.universe().error(), &objs));
        assert!(!is_empty_interface(basic(&objs, BasicType::Int), &objs));
    }

    #[test]
    fn test_instance_hash_distinguishes_objects() {
        let mut objs = TCObjects::new();
        let int = basic(&objs, BasicType::Int);
        let a = objs.new_type_name(Span::dummy(), None, "List".to_string(), None);
        let b = objs.new_type_name(Span::dummy(), None, "List".to_string(), None);
        assert_eq!(instance_hash(a, &[int], &objs), instance_hash(a, &[int], &objs));
        assert_ne!(instance_hash(a, &[int], &objs), instance_hash(b, &[int], &objs));
        let byte = objs.universe().byte();
        let uint8 = basic(&objs, BasicType::Uint8);
        assert_eq!(instance_hash(a, &[byte], &objs), instance_hash(a, &[uint8], &objs));
    }
}
