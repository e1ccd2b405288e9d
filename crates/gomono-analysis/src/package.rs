//! The package being checked.

use std::fmt;

use crate::objects::ScopeKey;

#[derive(Debug)]
pub struct Package {
    path: String,
    name: Option<String>,
    scope: ScopeKey,
}

impl Package {
    pub fn new(path: String, scope: ScopeKey) -> Package {
        Package {
            path,
            name: None,
            scope,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn scope(&self) -> ScopeKey {
        self.scope
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => write!(f, "uninitialized package, path: {}", self.path),
            Some(name) => write!(f, "package {} ({})", name, self.path),
        }
    }
}
