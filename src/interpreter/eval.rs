//! Expression and declaration evaluation.

use std::rc::Rc;

use crate::ast::expression::{BinOp, Expr, InterpolatedPart, MatchArm, UnOp};
use crate::ast::pattern::{LiteralPattern, Pattern};
use crate::ast::{Decl, ImportDecl, ModuleDef, TypeDef};
use crate::error::{Error, Result, SourceLocation};

use super::env::{Env, Environment};
use super::value::{Closure, MapValue, RecordValue, Value};
use super::Evaluator;

impl Evaluator {
    /// Evaluate one declaration. Expression declarations produce their
    /// value; `type`, `module` and `import` declarations bind into `env`
    /// and produce unit.
    pub fn eval_decl(&mut self, decl: &Decl, env: &Env) -> Result<Value> {
        match decl {
            Decl::Expr(expr) => self.eval_expr(expr, env),
            Decl::Type(def) => {
                self.eval_type_def(def, env)?;
                Ok(Value::Unit)
            }
            Decl::Module(def) => {
                self.eval_module_def(def, env)?;
                Ok(Value::Unit)
            }
            Decl::Import(import) => {
                self.eval_import(import, env)?;
                Ok(Value::Unit)
            }
        }
    }

    /// Registers the type and binds its constructors: nullary constructors
    /// as ready-made ADT values, the rest as builtins of matching arity.
    fn eval_type_def(&mut self, def: &TypeDef, env: &Env) -> Result<()> {
        env.borrow_mut().define_type(&def.name, def.clone());

        for ctor in &def.constructors {
            let value = if ctor.fields.is_empty() {
                Value::adt(&def.name, &ctor.name, Vec::new())
            } else {
                let type_name = def.name.clone();
                let ctor_name = ctor.name.clone();
                Value::builtin(&ctor.name, ctor.fields.len() as i32, move |args| {
                    Ok(Value::adt(&type_name, &ctor_name, args.to_vec()))
                })
            };
            env.borrow_mut()
                .define(&ctor.name, value, false)
                .map_err(|e| e.with_location(def.location.clone()))?;
        }

        Ok(())
    }

    fn eval_module_def(&mut self, def: &ModuleDef, env: &Env) -> Result<()> {
        let module_env = Environment::extend(env);
        for expr in &def.body {
            self.eval_expr(expr, &module_env)?;
        }
        env.borrow_mut().define_module(&def.name, module_env);
        Ok(())
    }

    fn eval_import(&mut self, import: &ImportDecl, env: &Env) -> Result<()> {
        let module_env = self.load_module(&import.module_name, &import.location)?;
        let name = import.alias.as_ref().unwrap_or(&import.module_name);
        env.borrow_mut().define_module(name, module_env);
        Ok(())
    }

    pub fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        match expr {
            Expr::Int(value, _) => Ok(Value::Int(*value)),
            Expr::Float(value, _) => Ok(Value::Float(*value)),
            Expr::Str(value, _) => Ok(Value::string(value.clone())),
            Expr::Bool(value, _) => Ok(Value::Bool(*value)),
            Expr::InterpolatedStr(parts, _) => self.eval_interpolated(parts, env),
            Expr::Ident(name, location) => {
                let value = env.borrow().get(name);
                value.ok_or_else(|| {
                    Error::runtime_at(format!("undefined variable: {name}"), location.clone())
                })
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => self.eval_binary(*op, left, right, env, location),
            Expr::Unary {
                op,
                operand,
                location,
            } => {
                let value = self.eval_expr(operand, env)?;
                match op {
                    UnOp::Neg => match value {
                        Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
                        Value::Float(v) => Ok(Value::Float(-v)),
                        other => Err(Error::runtime_at(
                            format!("cannot negate {}", other.kind_name()),
                            location.clone(),
                        )),
                    },
                    UnOp::Not => {
                        let v = value.as_bool().map_err(|e| e.with_location(location.clone()))?;
                        Ok(Value::Bool(!v))
                    }
                }
            }
            Expr::Let {
                name,
                value,
                is_const,
                location,
                ..
            } => {
                let value = self.eval_expr(value, env)?;
                env.borrow_mut()
                    .define(name, value.clone(), *is_const)
                    .map_err(|e| e.with_location(location.clone()))?;
                Ok(value)
            }
            Expr::Assign {
                name,
                value,
                location,
            } => {
                if !env.borrow().has(name) {
                    return Err(Error::runtime_at(
                        format!("undefined variable: {name}"),
                        location.clone(),
                    ));
                }
                let value = self.eval_expr(value, env)?;
                env.borrow_mut()
                    .set(name, value.clone())
                    .map_err(|e| e.with_location(location.clone()))?;
                Ok(value)
            }
            Expr::FnDef {
                name,
                params,
                body,
                location,
                ..
            } => {
                // The closure captures the current frame; the name is bound
                // afterwards, so recursive calls resolve through the
                // environment at call time.
                let closure = Value::Closure(Rc::new(Closure {
                    params: params.iter().map(|p| p.name.clone()).collect(),
                    body: Rc::new((**body).clone()),
                    env: env.clone(),
                }));
                env.borrow_mut()
                    .define(name, closure.clone(), false)
                    .map_err(|e| e.with_location(location.clone()))?;
                Ok(closure)
            }
            Expr::Lambda { params, body, .. } => Ok(Value::Closure(Rc::new(Closure {
                params: params.iter().map(|p| p.name.clone()).collect(),
                body: Rc::new((**body).clone()),
                env: env.clone(),
            }))),
            Expr::Call {
                callee,
                args,
                location,
            } => self.eval_call(callee, args, env, location),
            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.eval_expr(condition, env)?;
                let cond = cond
                    .as_bool()
                    .map_err(|e| e.with_location(condition.location().clone()))?;
                if cond {
                    self.eval_expr(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval_expr(else_branch, env)
                } else {
                    Ok(Value::Unit)
                }
            }
            Expr::While {
                condition, body, ..
            } => {
                let mut result = Value::Unit;
                loop {
                    let cond = self.eval_expr(condition, env)?;
                    if !cond
                        .as_bool()
                        .map_err(|e| e.with_location(condition.location().clone()))?
                    {
                        break;
                    }
                    let loop_env = Environment::extend(env);
                    result = self.eval_expr(body, &loop_env)?;
                }
                Ok(result)
            }
            Expr::For {
                var,
                iterable,
                body,
                location,
            } => {
                let iterable = self.eval_expr(iterable, env)?;
                let Value::List(items) = iterable else {
                    return Err(Error::runtime_at(
                        "for: expected a list to iterate over",
                        location.clone(),
                    ));
                };

                let mut result = Value::Unit;
                for item in items.iter() {
                    let loop_env = Environment::extend(env);
                    loop_env.borrow_mut().define(var, item.clone(), false)?;
                    result = self.eval_expr(body, &loop_env)?;
                }
                Ok(result)
            }
            Expr::List(elements, _) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::list(values))
            }
            Expr::Tuple(elements, _) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                // Empty parens are the unit value, not a zero-tuple.
                if values.is_empty() {
                    Ok(Value::Unit)
                } else {
                    Ok(Value::tuple(values))
                }
            }
            Expr::Record(fields, _) => {
                let mut record = RecordValue::default();
                for (name, expr) in fields {
                    let value = self.eval_expr(expr, env)?;
                    record.set(name, value);
                }
                Ok(Value::record(record))
            }
            Expr::Map(entries, _) => {
                let mut map = MapValue::default();
                for (key_expr, value_expr) in entries {
                    let key = self.eval_expr(key_expr, env)?;
                    let value = self.eval_expr(value_expr, env)?;
                    map.set(key, value);
                }
                Ok(Value::map(map))
            }
            Expr::FieldAccess {
                object,
                field,
                location,
            } => self.eval_field_access(object, field, env, location),
            Expr::Match {
                scrutinee,
                arms,
                location,
            } => self.eval_match(scrutinee, arms, env, location),
            Expr::Block(exprs, _) => {
                let block_env = Environment::extend(env);
                let mut result = Value::Unit;
                for expr in exprs {
                    result = self.eval_expr(expr, &block_env)?;
                }
                Ok(result)
            }
            Expr::Constructor {
                type_name,
                ctor_name,
                args,
                ..
            } => {
                let mut fields = Vec::with_capacity(args.len());
                for arg in args {
                    fields.push(self.eval_expr(arg, env)?);
                }
                Ok(Value::adt(type_name, ctor_name, fields))
            }
            Expr::ModuleAccess {
                module,
                member,
                location,
            } => {
                let module_env = env.borrow().get_module(module).ok_or_else(|| {
                    Error::runtime_at(format!("unknown module: {module}"), location.clone())
                })?;
                let value = module_env.borrow().get(member);
                value.ok_or_else(|| {
                    Error::runtime_at(
                        format!("unknown member: {member} in module {module}"),
                        location.clone(),
                    )
                })
            }
        }
    }

    fn eval_interpolated(&mut self, parts: &[InterpolatedPart], env: &Env) -> Result<Value> {
        let mut result = String::new();
        for part in parts {
            match part {
                InterpolatedPart::Text(text) => result.push_str(text),
                InterpolatedPart::Expr(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    result.push_str(&value.to_print_string());
                }
            }
        }
        Ok(Value::string(result))
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &Env,
        location: &SourceLocation,
    ) -> Result<Value> {
        // Short-circuit forms evaluate the right side only when the left
        // has not already decided the result.
        if op == BinOp::And {
            let left = self.eval_expr(left, env)?;
            let left = left.as_bool().map_err(|e| e.with_location(location.clone()))?;
            if !left {
                return Ok(Value::Bool(false));
            }
            return self.eval_expr(right, env);
        }
        if op == BinOp::Or {
            let left = self.eval_expr(left, env)?;
            let left = left.as_bool().map_err(|e| e.with_location(location.clone()))?;
            if left {
                return Ok(Value::Bool(true));
            }
            return self.eval_expr(right, env);
        }

        let left = self.eval_expr(left, env)?;
        let right = self.eval_expr(right, env)?;

        match op {
            BinOp::Eq => return Ok(Value::Bool(left.equals(&right))),
            BinOp::Neq => return Ok(Value::Bool(!left.equals(&right))),
            BinOp::Add => {
                if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
                    return Ok(Value::string(format!("{a}{b}")));
                }
            }
            _ => {}
        }

        let use_float = matches!(left, Value::Float(_)) || matches!(right, Value::Float(_));
        let l = left
            .as_number()
            .map_err(|e| e.with_location(location.clone()))?;
        let r = right
            .as_number()
            .map_err(|e| e.with_location(location.clone()))?;

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if matches!(op, BinOp::Div | BinOp::Mod) && r == 0.0 {
                    return Err(Error::runtime_at("division by zero", location.clone()));
                }
                match op {
                    // `%` is always integral: floating-point remainder
                    // truncated back to an integer.
                    BinOp::Mod => Ok(Value::Int((l % r) as i64)),
                    BinOp::Add if use_float => Ok(Value::Float(l + r)),
                    BinOp::Sub if use_float => Ok(Value::Float(l - r)),
                    BinOp::Mul if use_float => Ok(Value::Float(l * r)),
                    BinOp::Div if use_float => Ok(Value::Float(l / r)),
                    BinOp::Add => Ok(Value::Int(int_of(&left)?.wrapping_add(int_of(&right)?))),
                    BinOp::Sub => Ok(Value::Int(int_of(&left)?.wrapping_sub(int_of(&right)?))),
                    BinOp::Mul => Ok(Value::Int(int_of(&left)?.wrapping_mul(int_of(&right)?))),
                    BinOp::Div => Ok(Value::Int(int_of(&left)?.wrapping_div(int_of(&right)?))),
                    _ => unreachable!(),
                }
            }
            BinOp::Lt => Ok(Value::Bool(l < r)),
            BinOp::Gt => Ok(Value::Bool(l > r)),
            BinOp::Lte => Ok(Value::Bool(l <= r)),
            BinOp::Gte => Ok(Value::Bool(l >= r)),
            // Eq/Neq/And/Or returned above.
            BinOp::Eq | BinOp::Neq | BinOp::And | BinOp::Or => unreachable!(),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        env: &Env,
        location: &SourceLocation,
    ) -> Result<Value> {
        let callee = self.eval_expr(callee, env)?;

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg, env)?);
        }

        match callee {
            Value::Builtin(builtin) => {
                if builtin.arity >= 0 && arg_values.len() != builtin.arity as usize {
                    return Err(Error::runtime_at(
                        format!(
                            "{}: wrong number of arguments: expected {}, got {}",
                            builtin.name,
                            builtin.arity,
                            arg_values.len()
                        ),
                        location.clone(),
                    ));
                }
                (builtin.func)(&arg_values).map_err(|e| e.with_location(location.clone()))
            }
            Value::Closure(closure) => {
                if arg_values.len() != closure.params.len() {
                    return Err(Error::runtime_at(
                        format!(
                            "wrong number of arguments: expected {}, got {}",
                            closure.params.len(),
                            arg_values.len()
                        ),
                        location.clone(),
                    ));
                }

                let call_env = Environment::extend(&closure.env);
                for (param, arg) in closure.params.iter().zip(arg_values) {
                    call_env.borrow_mut().define(param, arg, false)?;
                }

                self.eval_expr(&closure.body, &call_env)
            }
            other => Err(Error::runtime_at(
                format!("cannot call non-function value of type {}", other.kind_name()),
                location.clone(),
            )),
        }
    }

    fn eval_field_access(
        &mut self,
        object: &Expr,
        field: &str,
        env: &Env,
        location: &SourceLocation,
    ) -> Result<Value> {
        // A bare identifier naming a module in scope resolves to that
        // module's export, even if a value of the same name exists.
        if let Expr::Ident(name, _) = object {
            let module = env.borrow().get_module(name);
            if let Some(module) = module {
                let value = module.borrow().get(field);
                return value.ok_or_else(|| {
                    Error::runtime_at(
                        format!("unknown member: {field} in module {name}"),
                        location.clone(),
                    )
                });
            }
        }

        let object = self.eval_expr(object, env)?;

        match &object {
            Value::Record(record) => record.get(field).cloned().ok_or_else(|| {
                Error::runtime_at(format!("unknown field: {field}"), location.clone())
            }),
            Value::Tuple(elements) => {
                let index: usize = field.parse().map_err(|_| {
                    Error::runtime_at(format!("invalid tuple index: {field}"), location.clone())
                })?;
                elements.get(index).cloned().ok_or_else(|| {
                    Error::runtime_at("tuple index out of bounds", location.clone())
                })
            }
            other => Err(Error::runtime_at(
                format!("cannot access field on {}", other.kind_name()),
                location.clone(),
            )),
        }
    }

    fn eval_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[MatchArm],
        env: &Env,
        location: &SourceLocation,
    ) -> Result<Value> {
        let scrutinee = self.eval_expr(scrutinee, env)?;

        for arm in arms {
            // Each arm binds into a fresh child scope; a failed guard
            // discards it and moves on.
            let arm_env = Environment::extend(env);
            if !self.match_pattern(&arm.pattern, &scrutinee, &arm_env)? {
                continue;
            }

            if let Some(guard) = &arm.guard {
                let guard_value = self.eval_expr(guard, &arm_env)?;
                let passed = guard_value
                    .as_bool()
                    .map_err(|e| e.with_location(guard.location().clone()))?;
                if !passed {
                    continue;
                }
            }

            return self.eval_expr(&arm.body, &arm_env);
        }

        Err(Error::runtime_at("no matching pattern", location.clone()))
    }

    /// Try to match `value` against `pattern`, binding variables into
    /// `env`. Bindings from a partially-matched pattern may be left in
    /// `env`; callers pass a scratch frame they discard on failure.
    pub fn match_pattern(&mut self, pattern: &Pattern, value: &Value, env: &Env) -> Result<bool> {
        match pattern {
            Pattern::Wildcard(_) => Ok(true),
            Pattern::Var(name, _) => {
                // The parser cannot tell a bare nullary constructor like
                // `None` from a variable. If the name resolves to a
                // nullary ADT value of the same name, the arm
                // discriminates on the constructor; otherwise it binds.
                let existing = env.borrow().get(name);
                if let Some(Value::Adt(ctor)) = existing {
                    if ctor.fields.is_empty() && ctor.ctor_name == *name {
                        let Value::Adt(scrutinee) = value else {
                            return Ok(false);
                        };
                        return Ok(scrutinee.ctor_name == *name && scrutinee.fields.is_empty());
                    }
                }
                env.borrow_mut().define(name, value.clone(), false)?;
                Ok(true)
            }
            Pattern::Literal(literal, _) => Ok(match (literal, value) {
                (LiteralPattern::Int(a), Value::Int(b)) => a == b,
                (LiteralPattern::Float(a), Value::Float(b)) => a == b,
                (LiteralPattern::Str(a), Value::Str(b)) => a.as_str() == b.as_str(),
                (LiteralPattern::Bool(a), Value::Bool(b)) => a == b,
                _ => false,
            }),
            Pattern::List {
                elements, rest, ..
            } => {
                let Value::List(items) = value else {
                    return Ok(false);
                };

                match rest {
                    Some(rest_name) => {
                        if items.len() < elements.len() {
                            return Ok(false);
                        }
                        for (pattern, item) in elements.iter().zip(items.iter()) {
                            if !self.match_pattern(pattern, item, env)? {
                                return Ok(false);
                            }
                        }
                        let remainder = items[elements.len()..].to_vec();
                        env.borrow_mut()
                            .define(rest_name, Value::list(remainder), false)?;
                        Ok(true)
                    }
                    None => {
                        if items.len() != elements.len() {
                            return Ok(false);
                        }
                        for (pattern, item) in elements.iter().zip(items.iter()) {
                            if !self.match_pattern(pattern, item, env)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                }
            }
            Pattern::Tuple(elements, _) => {
                // `()` evaluates to unit, so the empty tuple pattern
                // matches the unit value.
                if elements.is_empty() {
                    return Ok(matches!(value, Value::Unit));
                }
                let Value::Tuple(items) = value else {
                    return Ok(false);
                };
                if items.len() != elements.len() {
                    return Ok(false);
                }
                for (pattern, item) in elements.iter().zip(items.iter()) {
                    if !self.match_pattern(pattern, item, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Pattern::Record(fields, _) => {
                let Value::Record(record) = value else {
                    return Ok(false);
                };
                for (name, pattern) in fields {
                    let Some(field_value) = record.get(name) else {
                        return Ok(false);
                    };
                    let field_value = field_value.clone();
                    if !self.match_pattern(pattern, &field_value, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Pattern::Constructor { name, args, .. } => {
                let Value::Adt(adt) = value else {
                    return Ok(false);
                };
                if adt.ctor_name != *name || adt.fields.len() != args.len() {
                    return Ok(false);
                }
                for (pattern, field) in args.iter().zip(adt.fields.iter()) {
                    if !self.match_pattern(pattern, field, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// Exact integer payload for int-int arithmetic; both operands are known
/// to be numbers at this point.
fn int_of(value: &Value) -> Result<i64> {
    value.as_int()
}
