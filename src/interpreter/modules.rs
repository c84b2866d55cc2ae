//! File-backed module loading.
//!
//! `import Name` resolves `Name.stsn` against, in order: the evaluator's
//! base directory, the configured search paths, the current directory, and
//! a fixed list of stdlib locations. The first existing file wins. A
//! loaded module is cached under the name it was imported as, so its
//! top-level code runs at most once per evaluator.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, SourceLocation};
use crate::lexer;
use crate::parser;

use super::env::{Env, Environment};
use super::Evaluator;

const DEFAULT_STDLIB_DIRS: &[&str] = &[
    "stdlib",
    "../stdlib",
    "/usr/local/share/setsuna/stdlib",
    "/usr/share/setsuna/stdlib",
];

impl Evaluator {
    /// Returns the environment holding the module's top-level bindings,
    /// loading and evaluating the module file on first use.
    pub(crate) fn load_module(&mut self, name: &str, location: &SourceLocation) -> Result<Env> {
        if let Some(cached) = self.module_cache.get(name) {
            return Ok(cached.clone());
        }

        // A name already being loaded means the import chain came back
        // around to it.
        if self.loading_modules.contains(name) {
            return Err(Error::runtime_at(
                format!("cyclic import detected: {name}"),
                location.clone(),
            ));
        }

        let path = self.resolve_module_path(name).ok_or_else(|| {
            Error::runtime_at(format!("cannot find module: {name}"), location.clone())
        })?;

        self.loading_modules.insert(name.to_string());
        let result = self.eval_module_file(&path);
        self.loading_modules.remove(name);

        let module_env = result?;
        self.module_cache.insert(name.to_string(), module_env.clone());
        Ok(module_env)
    }

    fn resolve_module_path(&self, name: &str) -> Option<PathBuf> {
        let filename = format!("{name}.stsn");

        if !self.base_dir.as_os_str().is_empty() {
            let candidate = self.base_dir.join(&filename);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        for search_path in &self.search_paths {
            let candidate = search_path.join(&filename);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        let candidate = PathBuf::from(&filename);
        if candidate.exists() {
            return Some(candidate);
        }

        for dir in DEFAULT_STDLIB_DIRS {
            let candidate = Path::new(dir).join(&filename);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        None
    }

    /// Reads, parses, and evaluates a module file in a fresh child of the
    /// root environment, with the base directory temporarily rebased to
    /// the file's directory. The previous base directory is restored on
    /// every exit path.
    fn eval_module_file(&mut self, path: &Path) -> Result<Env> {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::runtime(format!("cannot read module file: {}: {e}", path.display()))
        })?;

        let filename = path.display().to_string();
        let tokens = lexer::tokenize(&source, &filename)?;
        let program = parser::parse(tokens)?;

        let module_env = Environment::extend(&self.globals);

        let module_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let saved_base_dir = mem::replace(&mut self.base_dir, module_dir);

        let mut outcome = Ok(());
        for decl in &program.declarations {
            if let Err(e) = self.eval_decl(decl, &module_env) {
                outcome = Err(e);
                break;
            }
        }

        self.base_dir = saved_base_dir;
        outcome?;

        Ok(module_env)
    }
}
