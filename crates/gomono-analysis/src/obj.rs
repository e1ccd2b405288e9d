//! Language objects: the named entities a scope can hold.

use std::borrow::Cow;

use gomono_common::span::Span;

use crate::objects::{PackageKey, ScopeKey, TCObjects, TypeKey};

/// Unique identity of a (package, name) pair. Exported names are global,
/// unexported names are qualified by the package path.
pub fn get_id<'a>(pkg_path: Option<&'a str>, name: &'a str) -> Cow<'a, str> {
    if is_exported(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{}.{}", pkg_path.unwrap_or("_"), name))
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarProperty {
    pub embedded: bool,
    pub is_field: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Close,
    Copy,
    Delete,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
}

impl Builtin {
    pub const ALL: [Builtin; 11] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Close,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Close => "close",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
        }
    }

    /// Minimum argument count and whether more are accepted.
    pub fn arity(self) -> (usize, bool) {
        match self {
            Builtin::Append | Builtin::Make => (1, true),
            Builtin::Print | Builtin::Println => (0, true),
            Builtin::Copy | Builtin::Delete => (2, false),
            Builtin::Cap | Builtin::Close | Builtin::Len | Builtin::New | Builtin::Panic => {
                (1, false)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityType {
    /// A declared constant. Only the predeclared booleans exist; constant
    /// values are not tracked.
    Const,
    /// A type name, including type parameters.
    TypeName,
    /// A variable, parameter, result or struct field.
    Var(VarProperty),
    /// A function, concrete method or interface method.
    Func { has_ptr_recv: bool },
    Builtin(Builtin),
    Nil,
}

/// A named language entity.
#[derive(Clone, Debug)]
pub struct LangObj {
    entity_type: EntityType,
    parent: Option<ScopeKey>,
    span: Span,
    pkg: Option<PackageKey>,
    name: String,
    typ: Option<TypeKey>,
}

impl LangObj {
    fn new(
        entity_type: EntityType,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> LangObj {
        LangObj {
            entity_type,
            parent: None,
            span,
            pkg,
            name,
            typ,
        }
    }

    pub fn new_const(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        LangObj::new(EntityType::Const, span, pkg, name, typ)
    }

    pub fn new_type_name(
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> LangObj {
        LangObj::new(EntityType::TypeName, span, pkg, name, typ)
    }

    pub fn new_var(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        let prop = VarProperty {
            embedded: false,
            is_field: false,
        };
        LangObj::new(EntityType::Var(prop), span, pkg, name, typ)
    }

    pub fn new_field(
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        embedded: bool,
    ) -> LangObj {
        let prop = VarProperty {
            embedded,
            is_field: true,
        };
        LangObj::new(EntityType::Var(prop), span, pkg, name, typ)
    }

    pub fn new_func(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        LangObj::new(EntityType::Func { has_ptr_recv: false }, span, pkg, name, typ)
    }

    pub fn new_builtin(builtin: Builtin, typ: TypeKey) -> LangObj {
        LangObj::new(
            EntityType::Builtin(builtin),
            Span::dummy(),
            None,
            builtin.name().to_string(),
            Some(typ),
        )
    }

    pub fn new_nil(typ: TypeKey) -> LangObj {
        LangObj::new(EntityType::Nil, Span::dummy(), None, "nil".to_string(), Some(typ))
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn parent(&self) -> Option<ScopeKey> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<ScopeKey>) {
        self.parent = parent;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn pkg(&self) -> Option<PackageKey> {
        self.pkg
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> Option<TypeKey> {
        self.typ
    }

    pub fn set_type(&mut self, typ: Option<TypeKey>) {
        self.typ = typ;
    }

    pub fn exported(&self) -> bool {
        is_exported(&self.name)
    }

    pub fn id<'a>(&'a self, objs: &'a TCObjects) -> Cow<'a, str> {
        let path = self.pkg.map(|p| objs.pkgs[p].path());
        get_id(path, &self.name)
    }

    /// Reports whether this object has the identity `(pkg, name)`.
    pub fn same_id(&self, pkg: Option<PackageKey>, name: &str, objs: &TCObjects) -> bool {
        if self.name != name {
            return false;
        }
        if self.exported() {
            return true;
        }
        match (self.pkg, pkg) {
            (Some(a), Some(b)) => objs.pkgs[a].path() == objs.pkgs[b].path(),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self.entity_type, EntityType::TypeName)
    }

    pub fn is_var(&self) -> bool {
        matches!(self.entity_type, EntityType::Var(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self.entity_type, EntityType::Func { .. })
    }

    pub fn var_embedded(&self) -> bool {
        matches!(self.entity_type, EntityType::Var(VarProperty { embedded: true, .. }))
    }

    pub fn func_has_ptr_recv(&self) -> bool {
        matches!(self.entity_type, EntityType::Func { has_ptr_recv: true })
    }

    pub fn set_func_has_ptr_recv(&mut self, has: bool) {
        if let EntityType::Func { has_ptr_recv } = &mut self.entity_type {
            *has_ptr_recv = has;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_names() {
        assert!(is_exported("Pair"));
        assert!(!is_exported("pair"));
        assert!(!is_exported("_"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_get_id_qualifies_unexported() {
        assert_eq!(get_id(Some("main"), "Len"), "Len");
        assert_eq!(get_id(Some("main"), "len"), "main.len");
        assert_eq!(get_id(None, "len"), "_.len");
    }

    #[test]
    fn test_builtin_arity() {
        assert_eq!(Builtin::Len.arity(), (1, false));
        assert_eq!(Builtin::Append.arity(), (1, true));
        assert_eq!(Builtin::ALL.len(), 11);
        for b in Builtin::ALL {
            assert!(!b.name().is_empty());
        }
    }
}
