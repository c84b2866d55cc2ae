//! The type environment: names to type schemes, with lexical scoping
//! through a parent chain. Child environments shadow parent bindings;
//! extending clones the current environment into the parent slot, so a
//! child never mutates what its parent could see.

use std::collections::HashMap;
use std::rc::Rc;

use super::ty::{TypeRef, TypeScheme};

#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    bindings: HashMap<String, TypeScheme>,
    parent: Option<Rc<TypeEnv>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a monomorphic type.
    pub fn define(&mut self, name: impl Into<String>, ty: TypeRef) {
        self.bindings
            .insert(name.into(), TypeScheme::monomorphic(ty));
    }

    pub fn define_scheme(&mut self, name: impl Into<String>, scheme: TypeScheme) {
        self.bindings.insert(name.into(), scheme);
    }

    pub fn get_scheme(&self, name: &str) -> Option<TypeScheme> {
        if let Some(scheme) = self.bindings.get(name) {
            return Some(scheme.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_scheme(name))
    }

    /// A child environment whose parent is a snapshot of this one.
    pub fn extend(&self) -> TypeEnv {
        TypeEnv {
            bindings: HashMap::new(),
            parent: Some(Rc::new(self.clone())),
        }
    }

    /// Visit every scheme reachable from this environment, innermost
    /// frames first. Shadowed parent bindings are visited too; that only
    /// widens the free-variable set, which is safe for generalization.
    pub fn for_each_scheme(&self, f: &mut impl FnMut(&TypeScheme)) {
        for scheme in self.bindings.values() {
            f(scheme);
        }
        if let Some(parent) = &self.parent {
            parent.for_each_scheme(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ty::Type;

    #[test]
    fn lookup_walks_parents_and_shadows() {
        let mut outer = TypeEnv::new();
        outer.define("x", Type::int());

        let mut inner = outer.extend();
        assert_eq!(inner.get_scheme("x").unwrap().ty.to_string(), "Int");

        inner.define("x", Type::string());
        assert_eq!(inner.get_scheme("x").unwrap().ty.to_string(), "String");
        assert_eq!(outer.get_scheme("x").unwrap().ty.to_string(), "Int");
    }

    #[test]
    fn missing_names_are_none() {
        let env = TypeEnv::new();
        assert!(env.get_scheme("nope").is_none());
    }
}
