//! Types, type variables, and type schemes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Types are shared immutably except for the union-find pointer inside
/// type variables.
pub type TypeRef = Rc<Type>;

/// An inference variable. `instance` is the union-find back-pointer: once
/// unification binds the variable, it points at the representative type.
#[derive(Debug)]
pub struct TypeVar {
    pub id: u32,
    pub instance: RefCell<Option<TypeRef>>,
}

#[derive(Debug)]
pub enum Type {
    Var(TypeVar),
    Int,
    Float,
    Bool,
    Str,
    Unit,
    /// `(params) -> ret`, uncurried.
    Function(Vec<TypeRef>, TypeRef),
    List(TypeRef),
    Tuple(Vec<TypeRef>),
    Record(Vec<(String, TypeRef)>),
    Map(TypeRef, TypeRef),
    /// A named ADT with its type arguments.
    Adt(String, Vec<TypeRef>),
    /// A named generic placeholder from a builtin signature or a `type`
    /// parameter list; unifies with anything.
    Generic(String),
}

impl Type {
    pub fn var(id: u32) -> TypeRef {
        Rc::new(Type::Var(TypeVar {
            id,
            instance: RefCell::new(None),
        }))
    }

    pub fn int() -> TypeRef {
        Rc::new(Type::Int)
    }

    pub fn float() -> TypeRef {
        Rc::new(Type::Float)
    }

    pub fn bool() -> TypeRef {
        Rc::new(Type::Bool)
    }

    pub fn string() -> TypeRef {
        Rc::new(Type::Str)
    }

    pub fn unit() -> TypeRef {
        Rc::new(Type::Unit)
    }

    pub fn function(params: Vec<TypeRef>, ret: TypeRef) -> TypeRef {
        Rc::new(Type::Function(params, ret))
    }

    pub fn list(element: TypeRef) -> TypeRef {
        Rc::new(Type::List(element))
    }

    pub fn tuple(elements: Vec<TypeRef>) -> TypeRef {
        Rc::new(Type::Tuple(elements))
    }

    pub fn record(fields: Vec<(String, TypeRef)>) -> TypeRef {
        Rc::new(Type::Record(fields))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> TypeRef {
        Rc::new(Type::Map(key, value))
    }

    pub fn adt(name: impl Into<String>, args: Vec<TypeRef>) -> TypeRef {
        Rc::new(Type::Adt(name.into(), args))
    }

    pub fn generic(name: impl Into<String>) -> TypeRef {
        Rc::new(Type::Generic(name.into()))
    }
}

fn join(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Var(var) => {
                // A bound variable prints as what it resolved to.
                if let Some(instance) = &*var.instance.borrow() {
                    write!(f, "{instance}")
                } else {
                    write!(f, "t{}", var.id)
                }
            }
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::Str => write!(f, "String"),
            Type::Unit => write!(f, "()"),
            Type::Function(params, ret) => write!(f, "({}) -> {ret}", join(params)),
            Type::List(element) => write!(f, "[{element}]"),
            Type::Tuple(elements) => write!(f, "({})", join(elements)),
            Type::Record(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, " }}")
            }
            Type::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Type::Adt(name, args) => {
                if args.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "{name}<{}>", join(args))
                }
            }
            Type::Generic(name) => write!(f, "{name}"),
        }
    }
}

/// A polymorphic type: the quantified variable ids plus the underlying
/// type. Looking a scheme up instantiates each quantified variable with a
/// fresh one.
#[derive(Debug, Clone)]
pub struct TypeScheme {
    pub vars: Vec<u32>,
    pub ty: TypeRef,
}

impl TypeScheme {
    /// A scheme with nothing quantified.
    pub fn monomorphic(ty: TypeRef) -> Self {
        Self {
            vars: Vec::new(),
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Type::int().to_string(), "Int");
        assert_eq!(Type::string().to_string(), "String");
        assert_eq!(Type::unit().to_string(), "()");
        assert_eq!(Type::list(Type::int()).to_string(), "[Int]");
        assert_eq!(
            Type::function(vec![Type::int(), Type::int()], Type::bool()).to_string(),
            "(Int, Int) -> Bool"
        );
        assert_eq!(
            Type::map(Type::string(), Type::int()).to_string(),
            "Map<String, Int>"
        );
        assert_eq!(
            Type::adt("Option", vec![Type::int()]).to_string(),
            "Option<Int>"
        );
    }

    #[test]
    fn bound_variable_displays_as_its_instance() {
        let var = Type::var(0);
        assert_eq!(var.to_string(), "t0");

        if let Type::Var(v) = var.as_ref() {
            *v.instance.borrow_mut() = Some(Type::int());
        }
        assert_eq!(var.to_string(), "Int");
    }
}
