//! Lexically-scoped environments.
//!
//! An environment is a frame of bindings plus a pointer to its parent.
//! Lookup walks the parent chain and the first frame containing the name
//! wins. Frames are shared behind `Rc<RefCell<_>>`: a closure keeps its
//! definition-time frame alive, and later `define`/`set` calls against that
//! frame are visible through the closure (capture by reference, not by
//! snapshot).
//!
//! Besides values, each frame carries the names marked `const`, the type
//! definitions, and the modules registered in its scope; the three tables
//! are walked exactly like the bindings.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::TypeDef;
use crate::error::{Error, Result};

use super::value::Value;

pub type Env = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    consts: HashSet<String>,
    types: HashMap<String, TypeDef>,
    modules: HashMap<String, Env>,
    parent: Option<Env>,
}

impl Environment {
    /// A fresh root frame.
    pub fn root() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A child frame of `parent`.
    pub fn extend(parent: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            parent: Some(parent.clone()),
            ..Environment::default()
        }))
    }

    /// Insert into this frame. Re-declaring a name that is `const` in this
    /// frame is an error; plain shadowing of an outer binding is fine.
    pub fn define(&mut self, name: impl Into<String>, value: Value, is_const: bool) -> Result<()> {
        let name = name.into();
        if self.bindings.contains_key(&name) && self.consts.contains(&name) {
            return Err(Error::runtime(format!(
                "cannot redeclare constant: {name}"
            )));
        }
        if is_const {
            self.consts.insert(name.clone());
        }
        self.bindings.insert(name, value);
        Ok(())
    }

    /// Mutate the first binding found walking the chain. Fails on `const`
    /// names and on names that are not bound anywhere.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        if self.bindings.contains_key(name) {
            if self.consts.contains(name) {
                return Err(Error::runtime(format!(
                    "cannot assign to constant: {name}"
                )));
            }
            self.bindings.insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().set(name, value),
            None => Err(Error::runtime(format!("undefined variable: {name}"))),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.borrow().has(name))
    }

    pub fn is_const(&self, name: &str) -> bool {
        if self.bindings.contains_key(name) {
            return self.consts.contains(name);
        }
        self.parent
            .as_ref()
            .is_some_and(|p| p.borrow().is_const(name))
    }

    pub fn define_type(&mut self, name: impl Into<String>, def: TypeDef) {
        self.types.insert(name.into(), def);
    }

    pub fn get_type(&self, name: &str) -> Option<TypeDef> {
        if let Some(def) = self.types.get(name) {
            return Some(def.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().get_type(name))
    }

    pub fn define_module(&mut self, name: impl Into<String>, module: Env) {
        self.modules.insert(name.into(), module);
    }

    pub fn get_module(&self, name: &str) -> Option<Env> {
        if let Some(module) = self.modules.get(name) {
            return Some(module.clone());
        }
        self.parent
            .as_ref()
            .and_then(|p| p.borrow().get_module(name))
    }
}
