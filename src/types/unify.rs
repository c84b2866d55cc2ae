//! Union-find resolution and structural unification.

use std::rc::Rc;

use crate::error::{Error, Result};

use super::ty::{Type, TypeRef};

/// Resolve a type to its union-find representative, compressing paths as
/// it goes: every variable on the chain ends up pointing directly at the
/// representative.
pub fn find(ty: &TypeRef) -> TypeRef {
    if let Type::Var(var) = ty.as_ref() {
        let instance = var.instance.borrow().clone();
        if let Some(instance) = instance {
            let representative = find(&instance);
            *var.instance.borrow_mut() = Some(representative.clone());
            return representative;
        }
    }
    ty.clone()
}

/// Does the variable occur anywhere inside `ty`? Guards against building
/// infinite types like `t0 = [t0]`.
pub fn occurs_in(var_id: u32, ty: &TypeRef) -> bool {
    let ty = find(ty);
    match ty.as_ref() {
        Type::Var(var) => var.id == var_id,
        Type::Function(params, ret) => {
            params.iter().any(|p| occurs_in(var_id, p)) || occurs_in(var_id, ret)
        }
        Type::List(element) => occurs_in(var_id, element),
        Type::Tuple(elements) => elements.iter().any(|e| occurs_in(var_id, e)),
        Type::Record(fields) => fields.iter().any(|(_, t)| occurs_in(var_id, t)),
        Type::Map(key, value) => occurs_in(var_id, key) || occurs_in(var_id, value),
        Type::Adt(_, args) => args.iter().any(|a| occurs_in(var_id, a)),
        _ => false,
    }
}

/// Make two types equal, binding type variables as needed. Fails with
/// *infinite type* when the occurs check trips and with *cannot unify*
/// on a structural mismatch.
pub fn unify(t1: &TypeRef, t2: &TypeRef) -> Result<()> {
    let t1 = find(t1);
    let t2 = find(t2);

    if Rc::ptr_eq(&t1, &t2) {
        return Ok(());
    }

    if let Type::Var(var) = t1.as_ref() {
        if occurs_in(var.id, &t2) {
            return Err(Error::type_error(format!(
                "infinite type: t{} = {t2}",
                var.id
            )));
        }
        *var.instance.borrow_mut() = Some(t2);
        return Ok(());
    }

    if let Type::Var(var) = t2.as_ref() {
        if occurs_in(var.id, &t1) {
            return Err(Error::type_error(format!(
                "infinite type: t{} = {t1}",
                var.id
            )));
        }
        *var.instance.borrow_mut() = Some(t1);
        return Ok(());
    }

    match (t1.as_ref(), t2.as_ref()) {
        (Type::Int, Type::Int)
        | (Type::Float, Type::Float)
        | (Type::Bool, Type::Bool)
        | (Type::Str, Type::Str)
        | (Type::Unit, Type::Unit) => Ok(()),

        (Type::Function(params1, ret1), Type::Function(params2, ret2)) => {
            if params1.len() != params2.len() {
                return Err(Error::type_error(format!(
                    "function arity mismatch: expected {} arguments, got {}",
                    params1.len(),
                    params2.len()
                )));
            }
            for (p1, p2) in params1.iter().zip(params2.iter()) {
                unify(p1, p2)?;
            }
            unify(ret1, ret2)
        }

        (Type::List(e1), Type::List(e2)) => unify(e1, e2),

        (Type::Tuple(e1), Type::Tuple(e2)) => {
            if e1.len() != e2.len() {
                return Err(Error::type_error("tuple size mismatch"));
            }
            for (a, b) in e1.iter().zip(e2.iter()) {
                unify(a, b)?;
            }
            Ok(())
        }

        (Type::Record(f1), Type::Record(f2)) => {
            if f1.len() != f2.len() {
                return Err(Error::type_error(format!("cannot unify {t1} with {t2}")));
            }
            for (name, ty1) in f1 {
                let Some((_, ty2)) = f2.iter().find(|(n, _)| n == name) else {
                    return Err(Error::type_error(format!("cannot unify {t1} with {t2}")));
                };
                unify(ty1, ty2)?;
            }
            Ok(())
        }

        (Type::Map(k1, v1), Type::Map(k2, v2)) => {
            unify(k1, k2)?;
            unify(v1, v2)
        }

        (Type::Adt(n1, a1), Type::Adt(n2, a2)) if n1 == n2 && a1.len() == a2.len() => {
            for (x, y) in a1.iter().zip(a2.iter()) {
                unify(x, y)?;
            }
            Ok(())
        }

        // Generic placeholders from builtin signatures unify with anything.
        (Type::Generic(_), _) | (_, Type::Generic(_)) => Ok(()),

        _ => Err(Error::type_error(format!("cannot unify {t1} with {t2}"))),
    }
}
