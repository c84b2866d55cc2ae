//! # Tree-walking evaluator
//!
//! The evaluator walks the syntax tree against a chain of environment
//! frames. One [`Evaluator`] instance owns everything a run needs:
//!
//! - the global environment (builtins plus top-level definitions),
//! - the module cache and the set of modules currently loading
//!   (cycle detection),
//! - the base directory and search paths used to resolve `import`s.
//!
//! Submodules:
//! - [`value`] - runtime values, structural equality, canonical printing
//! - [`env`] - environment frames
//! - [`eval`] - expression and declaration evaluation, pattern matching
//! - [`modules`] - the file-backed module loader
//! - [`builtins`] - the builtin function library

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::ast::{Decl, Program};
use crate::error::Result;

pub mod builtins;
pub mod env;
pub mod eval;
pub mod modules;
pub mod value;

pub use env::{Env, Environment};
pub use value::Value;

pub struct Evaluator {
    globals: Env,
    base_dir: PathBuf,
    search_paths: Vec<PathBuf>,
    module_cache: HashMap<String, Env>,
    loading_modules: HashSet<String>,
}

impl Evaluator {
    /// An evaluator over an existing global environment.
    pub fn new(globals: Env) -> Self {
        Self {
            globals,
            base_dir: PathBuf::new(),
            search_paths: Vec::new(),
            module_cache: HashMap::new(),
            loading_modules: HashSet::new(),
        }
    }

    /// An evaluator over a fresh global environment with the builtin
    /// library registered.
    pub fn with_builtins() -> Self {
        let globals = Environment::root();
        builtins::register(&globals);
        Self::new(globals)
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// The directory `import` resolves module files against first.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    pub fn add_search_path(&mut self, dir: impl Into<PathBuf>) {
        self.search_paths.push(dir.into());
    }

    /// Evaluate a program's declarations in source order against the
    /// global environment. The result is the last declaration's value if
    /// it was an expression, unit otherwise.
    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let globals = self.globals.clone();
        self.eval_decls(&program.declarations, &globals)
    }

    pub(crate) fn eval_decls(&mut self, declarations: &[Decl], env: &Env) -> Result<Value> {
        let mut result = Value::Unit;
        for decl in declarations {
            result = self.eval_decl(decl, env)?;
        }
        Ok(result)
    }
}
