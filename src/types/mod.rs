//! # Type inference
//!
//! A Hindley-Milner, rank-1 inferencer over the same syntax tree the
//! evaluator walks. It assigns a type to each top-level expression
//! declaration and is deliberately best-effort: constructs it does not
//! model fully (module access, assignment, deep pattern types) come back
//! as fresh type variables rather than errors.
//!
//! Type variables carry a mutable union-find back-pointer; unification
//! binds the pointer and `find` resolves chains with path compression.
//!
//! - [`ty`] - types, type variables, type schemes
//! - [`env`] - the name → scheme environment
//! - [`unify`] - `find`, occurs check, structural unification
//! - [`infer`] - the per-construct inference rules

pub mod env;
pub mod infer;
pub mod ty;
pub mod unify;

pub use env::TypeEnv;
pub use infer::Inferencer;
pub use ty::{Type, TypeRef, TypeScheme};
pub use unify::{find, unify};
