//! Type arguments of one syntax instantiation.

use std::collections::HashMap;

use gomono_analysis::objects::{ObjKey, TCObjects, TypeKey};
use gomono_analysis::SubstMap;
use gomono_syntax::ast::{TypeExpr, P};

/// Replacements used while copying a generic declaration: the syntax that
/// stands in for each type parameter object, and the substitution applied
/// to every type annotation of the copy.
#[derive(Debug, Default)]
pub struct TypeArgs {
    targs: Vec<TypeKey>,
    syntax: HashMap<ObjKey, P<TypeExpr>>,
    smap: SubstMap,
    copy_all: bool,
}

impl TypeArgs {
    /// No replacements: rewriting a declaration that is not generic.
    pub fn empty() -> TypeArgs {
        TypeArgs::default()
    }

    /// No replacements, but every node is copied with fresh ids.
    pub fn renumbering() -> TypeArgs {
        TypeArgs {
            copy_all: true,
            ..TypeArgs::default()
        }
    }

    /// Maps `tparams[i]` to `syntax[i]` and its type to `targs[i]`.
    pub fn new(tparams: &[ObjKey], syntax: Vec<P<TypeExpr>>, targs: &[TypeKey], objs: &TCObjects) -> TypeArgs {
        debug_assert_eq!(tparams.len(), syntax.len());
        TypeArgs {
            targs: targs.to_vec(),
            syntax: tparams.iter().copied().zip(syntax).collect(),
            smap: SubstMap::new(tparams, targs, objs),
            copy_all: false,
        }
    }

    pub fn targs(&self) -> &[TypeKey] {
        &self.targs
    }

    /// Replacement syntax for the type parameter `obj`.
    pub fn syntax(&self, obj: ObjKey) -> Option<&P<TypeExpr>> {
        self.syntax.get(&obj)
    }

    pub fn smap(&self) -> &SubstMap {
        &self.smap
    }

    pub fn copies_all(&self) -> bool {
        self.copy_all
    }
}
