//! The inference rules.

use std::collections::{HashMap, HashSet};
use std::mem;

use crate::ast::expression::{BinOp, Expr, InterpolatedPart, UnOp};
use crate::ast::pattern::Pattern;
use crate::ast::ty::TypeExpr;
use crate::ast::{Decl, Program, TypeDef};
use crate::error::{Error, Result};

use super::env::TypeEnv;
use super::ty::{Type, TypeRef, TypeScheme};
use super::unify::{find, unify};

/// Infers types for the top-level expression declarations of a program.
///
/// The inferencer owns a global type environment seeded with signatures
/// for the builtins the checker models; `let` and `fn` extend it as
/// declarations are processed, so later declarations see earlier ones.
pub struct Inferencer {
    env: TypeEnv,
    next_var: u32,
}

impl Default for Inferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Inferencer {
    pub fn new() -> Self {
        let mut env = TypeEnv::new();

        let a = || Type::generic("a");
        env.define("print", Type::function(vec![a()], Type::unit()));
        env.define("println", Type::function(vec![a()], Type::unit()));
        env.define("str", Type::function(vec![a()], Type::string()));
        env.define("int", Type::function(vec![a()], Type::int()));
        env.define("float", Type::function(vec![a()], Type::float()));

        env.define("head", Type::function(vec![Type::list(a())], a()));
        env.define("tail", Type::function(vec![Type::list(a())], Type::list(a())));
        env.define(
            "cons",
            Type::function(vec![a(), Type::list(a())], Type::list(a())),
        );
        env.define("len", Type::function(vec![Type::list(a())], Type::int()));
        env.define("empty", Type::function(vec![Type::list(a())], Type::bool()));

        env.define("abs", Type::function(vec![Type::int()], Type::int()));
        env.define("sqrt", Type::function(vec![Type::float()], Type::float()));
        env.define(
            "pow",
            Type::function(vec![Type::float(), Type::float()], Type::float()),
        );
        env.define(
            "min",
            Type::function(vec![Type::int(), Type::int()], Type::int()),
        );
        env.define(
            "max",
            Type::function(vec![Type::int(), Type::int()], Type::int()),
        );

        env.define(
            "range",
            Type::function(vec![Type::int(), Type::int()], Type::list(Type::int())),
        );
        env.define("input", Type::function(vec![], Type::string()));
        env.define("error", Type::function(vec![Type::string()], a()));

        Self { env, next_var: 0 }
    }

    fn fresh(&mut self) -> TypeRef {
        let id = self.next_var;
        self.next_var += 1;
        Type::var(id)
    }

    /// Infer each top-level expression declaration in order, returning
    /// their resolved types. `type` declarations register their
    /// constructors; other declarations contribute nothing.
    pub fn check(&mut self, program: &Program) -> Result<Vec<TypeRef>> {
        let mut types = Vec::new();
        for decl in &program.declarations {
            match decl {
                Decl::Expr(expr) => types.push(self.infer_expr(expr)?),
                Decl::Type(def) => self.register_type_def(def),
                Decl::Module(_) | Decl::Import(_) => {}
            }
        }
        Ok(types)
    }

    /// Infer a single expression against the global environment.
    pub fn infer_expr(&mut self, expr: &Expr) -> Result<TypeRef> {
        let mut env = mem::take(&mut self.env);
        let result = self.infer(expr, &mut env);
        self.env = env;
        Ok(find(&result?))
    }

    /// Binds each constructor: nullary ones as the ADT type itself,
    /// the rest as functions from their field types to the ADT type.
    fn register_type_def(&mut self, def: &TypeDef) {
        let adt = Type::adt(
            &def.name,
            def.type_params
                .iter()
                .map(|p| Type::generic(p.as_str()))
                .collect(),
        );

        for ctor in &def.constructors {
            if ctor.fields.is_empty() {
                self.env.define(&ctor.name, adt.clone());
            } else {
                let fields = ctor
                    .fields
                    .iter()
                    .map(|f| self.from_annotation(f, &def.type_params))
                    .collect();
                self.env
                    .define(&ctor.name, Type::function(fields, adt.clone()));
            }
        }
    }

    fn infer(&mut self, expr: &Expr, env: &mut TypeEnv) -> Result<TypeRef> {
        match expr {
            Expr::Int(..) => Ok(Type::int()),
            Expr::Float(..) => Ok(Type::float()),
            Expr::Str(..) => Ok(Type::string()),
            Expr::Bool(..) => Ok(Type::bool()),

            Expr::InterpolatedStr(parts, _) => {
                for part in parts {
                    if let InterpolatedPart::Expr(expr) = part {
                        self.infer(expr, env)?;
                    }
                }
                Ok(Type::string())
            }

            Expr::Ident(name, location) => {
                let scheme = env.get_scheme(name).ok_or_else(|| {
                    Error::type_error_at(format!("undefined variable: {name}"), location.clone())
                })?;
                Ok(self.instantiate(&scheme))
            }

            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.infer(left, env)?;
                let right = self.infer(right, env)?;

                match op {
                    BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                        unify(&left, &right)?;
                        Ok(left)
                    }
                    BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => {
                        unify(&left, &right)?;
                        Ok(Type::bool())
                    }
                    BinOp::And | BinOp::Or => {
                        unify(&left, &Type::bool())?;
                        unify(&right, &Type::bool())?;
                        Ok(Type::bool())
                    }
                }
            }

            Expr::Unary { op, operand, .. } => {
                let operand = self.infer(operand, env)?;
                match op {
                    // Negation works on Int and Float alike; leave the
                    // operand type as-is.
                    UnOp::Neg => Ok(operand),
                    UnOp::Not => {
                        unify(&operand, &Type::bool())?;
                        Ok(Type::bool())
                    }
                }
            }

            Expr::Let {
                name, ty, value, ..
            } => {
                let value_ty = self.infer(value, env)?;
                if let Some(annotation) = ty {
                    let annotated = self.from_annotation(annotation, &[]);
                    unify(&value_ty, &annotated)?;
                }
                let scheme = self.generalize(&value_ty, env);
                env.define_scheme(name, scheme);
                Ok(value_ty)
            }

            // Assignment is not modelled; the value still gets inferred.
            Expr::Assign { value, .. } => self.infer(value, env),

            Expr::FnDef {
                name, params, return_ty, body, ..
            } => {
                let mut fn_env = env.extend();

                // Pre-bind the function's own name so recursive calls in
                // the body infer instead of failing as undefined.
                let self_ty = self.fresh();
                fn_env.define(name, self_ty.clone());

                let mut param_types = Vec::with_capacity(params.len());
                for param in params {
                    let param_ty = self.fresh();
                    if let Some(annotation) = &param.ty {
                        let annotated = self.from_annotation(annotation, &[]);
                        unify(&param_ty, &annotated)?;
                    }
                    fn_env.define(&param.name, param_ty.clone());
                    param_types.push(param_ty);
                }

                let body_ty = self.infer(body, &mut fn_env)?;
                if let Some(annotation) = return_ty {
                    let annotated = self.from_annotation(annotation, &[]);
                    unify(&body_ty, &annotated)?;
                }

                let fn_ty = Type::function(param_types, body_ty);
                unify(&self_ty, &fn_ty)?;

                let scheme = self.generalize(&fn_ty, env);
                env.define_scheme(name, scheme);
                Ok(fn_ty)
            }

            Expr::Lambda { params, body, .. } => {
                let mut lambda_env = env.extend();

                let mut param_types = Vec::with_capacity(params.len());
                for param in params {
                    let param_ty = self.fresh();
                    if let Some(annotation) = &param.ty {
                        let annotated = self.from_annotation(annotation, &[]);
                        unify(&param_ty, &annotated)?;
                    }
                    lambda_env.define(&param.name, param_ty.clone());
                    param_types.push(param_ty);
                }

                let body_ty = self.infer(body, &mut lambda_env)?;
                Ok(Type::function(param_types, body_ty))
            }

            Expr::Call { callee, args, .. } => {
                let callee_ty = find(&self.infer(callee, env)?);

                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.infer(arg, env)?);
                }

                let ret = self.fresh();
                let expected = Type::function(arg_types, ret.clone());
                unify(&callee_ty, &expected)?;
                Ok(ret)
            }

            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.infer(condition, env)?;
                unify(&cond, &Type::bool())?;

                let then_ty = self.infer(then_branch, env)?;
                if let Some(else_branch) = else_branch {
                    let else_ty = self.infer(else_branch, env)?;
                    unify(&then_ty, &else_ty)?;
                }
                Ok(then_ty)
            }

            Expr::While {
                condition, body, ..
            } => {
                let cond = self.infer(condition, env)?;
                unify(&cond, &Type::bool())?;
                self.infer(body, env)
            }

            Expr::For {
                var,
                iterable,
                body,
                ..
            } => {
                let iterable = self.infer(iterable, env)?;
                let element = self.fresh();
                unify(&iterable, &Type::list(element.clone()))?;

                let mut loop_env = env.extend();
                loop_env.define(var, element);
                self.infer(body, &mut loop_env)
            }

            Expr::List(elements, _) => {
                if elements.is_empty() {
                    return Ok(Type::list(self.fresh()));
                }
                let element_ty = self.infer(&elements[0], env)?;
                for element in &elements[1..] {
                    let ty = self.infer(element, env)?;
                    unify(&element_ty, &ty)?;
                }
                Ok(Type::list(element_ty))
            }

            Expr::Tuple(elements, _) => {
                // `()` is the unit value.
                if elements.is_empty() {
                    return Ok(Type::unit());
                }
                let mut types = Vec::with_capacity(elements.len());
                for element in elements {
                    types.push(self.infer(element, env)?);
                }
                Ok(Type::tuple(types))
            }

            Expr::Record(fields, _) => {
                let mut field_types = Vec::with_capacity(fields.len());
                for (name, expr) in fields {
                    field_types.push((name.clone(), self.infer(expr, env)?));
                }
                Ok(Type::record(field_types))
            }

            Expr::Map(entries, _) => {
                if entries.is_empty() {
                    return Ok(Type::map(self.fresh(), self.fresh()));
                }
                let key_ty = self.infer(&entries[0].0, env)?;
                let value_ty = self.infer(&entries[0].1, env)?;
                for (key, value) in &entries[1..] {
                    let k = self.infer(key, env)?;
                    let v = self.infer(value, env)?;
                    unify(&key_ty, &k)?;
                    unify(&value_ty, &v)?;
                }
                Ok(Type::map(key_ty, value_ty))
            }

            Expr::FieldAccess {
                object,
                field,
                location,
            } => {
                let object_ty = find(&self.infer(object, env)?);
                match object_ty.as_ref() {
                    Type::Record(fields) => fields
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, ty)| ty.clone())
                        .ok_or_else(|| {
                            Error::type_error_at(
                                format!("unknown field: {field}"),
                                location.clone(),
                            )
                        }),
                    Type::Tuple(elements) => {
                        match field.parse::<usize>().ok().and_then(|i| elements.get(i)) {
                            Some(ty) => Ok(ty.clone()),
                            None => Ok(self.fresh()),
                        }
                    }
                    // Anything else is not modelled deeply enough to say.
                    _ => Ok(self.fresh()),
                }
            }

            Expr::Match {
                scrutinee, arms, ..
            } => {
                self.infer(scrutinee, env)?;

                let mut result: Option<TypeRef> = None;
                for arm in arms {
                    let mut arm_env = env.extend();
                    // Patterns are not checked deeply; their variables
                    // come in as fresh type variables so the body infers.
                    self.bind_pattern_vars(&arm.pattern, &mut arm_env);

                    if let Some(guard) = &arm.guard {
                        let guard_ty = self.infer(guard, &mut arm_env)?;
                        unify(&guard_ty, &Type::bool())?;
                    }

                    let body_ty = self.infer(&arm.body, &mut arm_env)?;
                    match &result {
                        Some(result_ty) => unify(result_ty, &body_ty)?,
                        None => result = Some(body_ty),
                    }
                }

                match result {
                    Some(ty) => Ok(ty),
                    None => Ok(self.fresh()),
                }
            }

            Expr::Block(exprs, _) => {
                let mut block_env = env.extend();
                let mut last = Type::unit();
                for expr in exprs {
                    last = self.infer(expr, &mut block_env)?;
                }
                Ok(last)
            }

            Expr::Constructor { type_name, .. } => Ok(Type::adt(type_name, Vec::new())),

            // Module members are resolved at run time only.
            Expr::ModuleAccess { .. } => Ok(self.fresh()),
        }
    }

    fn bind_pattern_vars(&mut self, pattern: &Pattern, env: &mut TypeEnv) {
        match pattern {
            Pattern::Var(name, _) => {
                let ty = self.fresh();
                env.define(name, ty);
            }
            Pattern::List { elements, rest, .. } => {
                for element in elements {
                    self.bind_pattern_vars(element, env);
                }
                if let Some(rest) = rest {
                    let element = self.fresh();
                    env.define(rest, Type::list(element));
                }
            }
            Pattern::Tuple(elements, _) => {
                for element in elements {
                    self.bind_pattern_vars(element, env);
                }
            }
            Pattern::Record(fields, _) => {
                for (_, pattern) in fields {
                    self.bind_pattern_vars(pattern, env);
                }
            }
            Pattern::Constructor { args, .. } => {
                for arg in args {
                    self.bind_pattern_vars(arg, env);
                }
            }
            Pattern::Wildcard(_) | Pattern::Literal(..) => {}
        }
    }

    /// Quantify the variables free in `ty` but not free anywhere in the
    /// environment.
    fn generalize(&self, ty: &TypeRef, env: &TypeEnv) -> TypeScheme {
        let free_in_ty = free_type_vars(ty);
        let free_in_env = env_free_vars(env);

        let vars: Vec<u32> = free_in_ty
            .into_iter()
            .filter(|id| !free_in_env.contains(id))
            .collect();

        TypeScheme {
            vars,
            ty: ty.clone(),
        }
    }

    /// Replace each quantified variable with a fresh one.
    fn instantiate(&mut self, scheme: &TypeScheme) -> TypeRef {
        let mut subst = HashMap::new();
        for id in &scheme.vars {
            subst.insert(*id, self.fresh());
        }
        substitute(&scheme.ty, &subst)
    }

    /// Convert a surface annotation to an inference type. Names listed in
    /// `type_params` become generic placeholders; unknown names are taken
    /// as ADT references.
    fn from_annotation(&mut self, annotation: &TypeExpr, type_params: &[String]) -> TypeRef {
        match annotation {
            TypeExpr::Name { name, args, .. } => match (name.as_str(), args.len()) {
                ("Int", 0) => Type::int(),
                ("Float", 0) => Type::float(),
                ("Bool", 0) => Type::bool(),
                ("String", 0) => Type::string(),
                ("Unit", 0) => Type::unit(),
                ("Map", 2) => Type::map(
                    self.from_annotation(&args[0], type_params),
                    self.from_annotation(&args[1], type_params),
                ),
                _ if type_params.contains(name) => Type::generic(name),
                _ => Type::adt(
                    name,
                    args.iter()
                        .map(|a| self.from_annotation(a, type_params))
                        .collect(),
                ),
            },
            TypeExpr::Function { params, ret, .. } => Type::function(
                params
                    .iter()
                    .map(|p| self.from_annotation(p, type_params))
                    .collect(),
                self.from_annotation(ret, type_params),
            ),
            TypeExpr::Tuple(elements, _) => Type::tuple(
                elements
                    .iter()
                    .map(|e| self.from_annotation(e, type_params))
                    .collect(),
            ),
            TypeExpr::Record(fields, _) => Type::record(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.from_annotation(ty, type_params)))
                    .collect(),
            ),
            TypeExpr::List(element, _) => Type::list(self.from_annotation(element, type_params)),
        }
    }
}

fn free_type_vars(ty: &TypeRef) -> HashSet<u32> {
    let ty = find(ty);
    let mut result = HashSet::new();
    match ty.as_ref() {
        Type::Var(var) => {
            result.insert(var.id);
        }
        Type::Function(params, ret) => {
            for param in params {
                result.extend(free_type_vars(param));
            }
            result.extend(free_type_vars(ret));
        }
        Type::List(element) => result.extend(free_type_vars(element)),
        Type::Tuple(elements) => {
            for element in elements {
                result.extend(free_type_vars(element));
            }
        }
        Type::Record(fields) => {
            for (_, field) in fields {
                result.extend(free_type_vars(field));
            }
        }
        Type::Map(key, value) => {
            result.extend(free_type_vars(key));
            result.extend(free_type_vars(value));
        }
        Type::Adt(_, args) => {
            for arg in args {
                result.extend(free_type_vars(arg));
            }
        }
        _ => {}
    }
    result
}

fn env_free_vars(env: &TypeEnv) -> HashSet<u32> {
    let mut result = HashSet::new();
    env.for_each_scheme(&mut |scheme| {
        let mut free = free_type_vars(&scheme.ty);
        for quantified in &scheme.vars {
            free.remove(quantified);
        }
        result.extend(free);
    });
    result
}

fn substitute(ty: &TypeRef, subst: &HashMap<u32, TypeRef>) -> TypeRef {
    let ty = find(ty);
    match ty.as_ref() {
        Type::Var(var) => subst.get(&var.id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Function(params, ret) => Type::function(
            params.iter().map(|p| substitute(p, subst)).collect(),
            substitute(ret, subst),
        ),
        Type::List(element) => Type::list(substitute(element, subst)),
        Type::Tuple(elements) => {
            Type::tuple(elements.iter().map(|e| substitute(e, subst)).collect())
        }
        Type::Record(fields) => Type::record(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), substitute(field, subst)))
                .collect(),
        ),
        Type::Map(key, value) => Type::map(substitute(key, subst), substitute(value, subst)),
        Type::Adt(name, args) => Type::adt(
            name.clone(),
            args.iter().map(|a| substitute(a, subst)).collect(),
        ),
        _ => ty,
    }
}
