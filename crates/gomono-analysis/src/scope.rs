//! Lexical scopes.
//!
//! A scope maps names to objects and links to its enclosing scope. Lookups
//! walk outwards until the universe scope.

use std::collections::HashMap;

use gomono_common::span::Span;

use crate::objects::{ObjKey, ScopeKey, TCObjects};

#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeKey>,
    elems: HashMap<String, ObjKey>,
    span: Span,
    comment: String,
    is_func: bool,
}

impl Scope {
    pub fn new(parent: Option<ScopeKey>, span: Span, comment: &str, is_func: bool) -> Scope {
        Scope {
            parent,
            elems: HashMap::new(),
            span,
            comment: comment.to_string(),
            is_func,
        }
    }

    pub fn parent(&self) -> Option<ScopeKey> {
        self.parent
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_func(&self) -> bool {
        self.is_func
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Looks up `name` in this scope only.
    pub fn lookup(&self, name: &str) -> Option<ObjKey> {
        self.elems.get(name).copied()
    }

    /// Inserts `obj` under `name` unless the name is taken, in which case
    /// the existing object is returned and nothing changes.
    pub fn insert(&mut self, name: String, obj: ObjKey) -> Option<ObjKey> {
        match self.elems.get(&name) {
            Some(existing) => Some(*existing),
            None => {
                self.elems.insert(name, obj);
                None
            }
        }
    }

    /// Looks up `name` starting at `key` and walking outwards. Returns the
    /// scope the name was found in together with the object.
    pub fn lookup_parent(key: ScopeKey, name: &str, objs: &TCObjects) -> Option<(ScopeKey, ObjKey)> {
        let mut current = Some(key);
        while let Some(skey) = current {
            let scope = &objs.scopes[skey];
            if let Some(obj) = scope.lookup(name) {
                return Some((skey, obj));
            }
            current = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outwards() {
        let mut objs = TCObjects::new();
        let outer = objs.new_scope(None, Span::dummy(), "outer", false);
        let inner = objs.new_scope(Some(outer), Span::dummy(), "inner", true);
        let x = objs.new_var(Span::dummy(), None, "x".to_string(), None);
        assert!(objs.scopes[outer].insert("x".to_string(), x).is_none());

        assert_eq!(objs.scopes[inner].lookup("x"), None);
        assert_eq!(Scope::lookup_parent(inner, "x", &objs), Some((outer, x)));
        assert_eq!(Scope::lookup_parent(inner, "y", &objs), None);
    }

    #[test]
    fn test_insert_keeps_first() {
        let mut objs = TCObjects::new();
        let s = objs.new_scope(None, Span::dummy(), "s", false);
        let a = objs.new_var(Span::dummy(), None, "a".to_string(), None);
        let b = objs.new_var(Span::dummy(), None, "a".to_string(), None);
        assert!(objs.scopes[s].insert("a".to_string(), a).is_none());
        assert_eq!(objs.scopes[s].insert("a".to_string(), b), Some(a));
        assert_eq!(objs.scopes[s].lookup("a"), Some(a));
        assert_eq!(objs.scopes[s].len(), 1);
    }
}
