//! Synthetic names of instantiated declarations.
//!
//! An instance of `Name` with type arguments `A1, A2` is called
//! `instantiate٠٠Name٠٠A1٠٠A2`. Argument types are printed and every
//! character that cannot appear in an identifier is written as `٠xx٠`,
//! the hex code point between two separators.

use std::collections::HashSet;

use gomono_analysis::objects::ObjKey;
use indexmap::IndexMap;

pub const INSTANCE_PREFIX: &str = "instantiate";
pub const SEPARATOR: char = '٠';

/// Identity of one instantiation: the generic object and the canonical
/// hash of its type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub generic: ObjKey,
    pub hash: String,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '_' || (c.is_alphanumeric() && c != SEPARATOR) {
            out.push(c);
        } else {
            out.push(SEPARATOR);
            out.push_str(&format!("{:x}", c as u32));
            out.push(SEPARATOR);
        }
    }
    out
}

pub fn instance_name(base: &str, args: &[String]) -> String {
    let mut name = String::from(INSTANCE_PREFIX);
    name.push(SEPARATOR);
    name.push(SEPARATOR);
    name.push_str(base);
    for arg in args {
        name.push(SEPARATOR);
        name.push(SEPARATOR);
        name.push_str(&escape(arg));
    }
    name
}

/// Every instance requested in a session, in request order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: IndexMap<InstanceKey, ObjKey>,
    names: HashSet<String>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// The object declared for `key`, if it was requested before.
    pub fn get(&self, key: &InstanceKey) -> Option<ObjKey> {
        self.entries.get(key).copied()
    }

    /// A name for a new instance that is neither handed out yet nor
    /// rejected by `taken`. Clashes get a numeric suffix.
    pub fn fresh_name(&self, base: &str, args: &[String], taken: impl Fn(&str) -> bool) -> String {
        let name = instance_name(base, args);
        if !self.names.contains(&name) && !taken(&name) {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}{}{}{}", name, SEPARATOR, SEPARATOR, n);
            if !self.names.contains(&candidate) && !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn insert(&mut self, key: InstanceKey, name: String, obj: ObjKey) {
        self.names.insert(name);
        self.entries.insert(key, obj);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instance objects in request order.
    pub fn objects(&self) -> impl Iterator<Item = ObjKey> + '_ {
        self.entries.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_arguments() {
        assert_eq!(instance_name("id", &["int".to_string()]), "instantiate٠٠id٠٠int");
        assert_eq!(
            instance_name("Pair", &["int".to_string(), "string".to_string()]),
            "instantiate٠٠Pair٠٠int٠٠string"
        );
    }

    #[test]
    fn test_escaped_arguments() {
        assert_eq!(escape("[]int"), "٠5b٠٠5d٠int");
        assert_eq!(escape("*T"), "٠2a٠T");
        assert_eq!(escape("List[int, string]"), "List٠5b٠int٠2c٠٠20٠string٠5d٠");
        assert_eq!(escape("٠"), "٠660٠");
        assert_eq!(escape("my_type"), "my_type");
    }

    #[test]
    fn test_fresh_names_avoid_clashes() {
        let registry = Registry::new();
        let args = vec!["int".to_string()];
        assert_eq!(registry.fresh_name("id", &args, |_| false), "instantiate٠٠id٠٠int");
        let taken = |name: &str| name == "instantiate٠٠id٠٠int";
        assert_eq!(registry.fresh_name("id", &args, taken), "instantiate٠٠id٠٠int٠٠1");
    }
}
