//! Runtime values.
//!
//! Values are conceptually immutable and shared: aggregate payloads live
//! behind `Rc`, so cloning a value is cheap and any value can be referenced
//! from any number of environments, lists, records, or closures.
//! Operations that look like mutation (`map_set`, `cons`, `append`) build
//! fresh values.
//!
//! A closure holds its definition-time environment. When recursion later
//! stores the closure in that same environment, the `Rc`s form a cycle and
//! the pair leaks; the language accepts this trade-off.

use std::fmt;
use std::rc::Rc;

use crate::ast::Expr;
use crate::error::{Error, Result};

use super::env::Env;

/// The callable payload of a builtin. Builtins may capture data (ADT
/// constructors capture their type and constructor names), hence a boxed
/// closure rather than a function pointer.
pub type BuiltinFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A named builtin with a declared arity; `-1` means variadic.
#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub arity: i32,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin:{}>", self.name)
    }
}

/// A user function: parameter names, body, and the captured environment.
#[derive(Clone)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub env: Env,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn>")
    }
}

/// A value of an algebraic data type: `Some(42)` is
/// `{ type_name: "Option", ctor_name: "Some", fields: [42] }`.
#[derive(Debug, Clone)]
pub struct AdtValue {
    pub type_name: String,
    pub ctor_name: String,
    pub fields: Vec<Value>,
}

/// An insertion-ordered record. Overwriting an existing field keeps its
/// original position.
#[derive(Debug, Clone, Default)]
pub struct RecordValue {
    pub fields: Vec<(String, Value)>,
}

impl RecordValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        for (k, v) in &mut self.fields {
            if k == name {
                *v = value;
                return;
            }
        }
        self.fields.push((name.to_string(), value));
    }
}

/// An ordered association list keyed by structural equality. Keys may be
/// arbitrary values; iteration order is insertion order, and overwriting a
/// key keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct MapValue {
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.equals(key))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| k.equals(key))
    }

    pub fn set(&mut self, key: Value, value: Value) {
        for (k, v) in &mut self.entries {
            if k.equals(&key) {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    pub fn remove(&mut self, key: &Value) -> bool {
        match self.entries.iter().position(|(k, _)| k.equals(key)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<String>),
    List(Rc<Vec<Value>>),
    Tuple(Rc<Vec<Value>>),
    Record(Rc<RecordValue>),
    Map(Rc<MapValue>),
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
    Adt(Rc<AdtValue>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(elements))
    }

    pub fn tuple(elements: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(elements))
    }

    pub fn record(record: RecordValue) -> Self {
        Value::Record(Rc::new(record))
    }

    pub fn map(map: MapValue) -> Self {
        Value::Map(Rc::new(map))
    }

    pub fn adt(type_name: impl Into<String>, ctor_name: impl Into<String>, fields: Vec<Value>) -> Self {
        Value::Adt(Rc::new(AdtValue {
            type_name: type_name.into(),
            ctor_name: ctor_name.into(),
            fields,
        }))
    }

    pub fn builtin(
        name: impl Into<String>,
        arity: i32,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Value::Builtin(Rc::new(Builtin {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }))
    }

    /// A short tag name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Map(_) => "map",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Adt(_) => "constructor",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    /// Numeric projection used by arithmetic and comparison.
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            other => Err(Error::runtime(format!(
                "expected a number, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(Error::runtime(format!(
                "expected a boolean, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(Error::runtime(format!(
                "expected an integer, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Error::runtime(format!(
                "expected a string, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Structural equality. Same tag, then shape and contents; callable
    /// values are only equal to themselves by reference.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Record(a), Value::Record(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w)))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.entries.len() == b.entries.len()
                    && a.entries
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w)))
            }
            (Value::Adt(a), Value::Adt(b)) => {
                a.ctor_name == b.ctor_name
                    && a.fields.len() == b.fields.len()
                    && a.fields.iter().zip(b.fields.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The canonical string form, as produced by `str`: strings come back
    /// wrapped in double quotes.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// The form `print`/`println` use: strings print raw, everything else
    /// prints canonically.
    pub fn to_print_string(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

/// Decimal float form with trailing zeros trimmed but always at least one
/// fractional digit: `1.0`, `3.5`, never `1.` or `3`.
fn format_float(value: f64) -> String {
    let mut s = format!("{value:.6}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::List(elements) => write!(f, "[{}]", join_values(elements)),
            Value::Tuple(elements) => write!(f, "({})", join_values(elements)),
            Value::Record(record) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Map(map) => {
                write!(f, "%{{ ")?;
                for (i, (k, v)) in map.entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Closure(_) => write!(f, "<fn>"),
            Value::Builtin(b) => write!(f, "<builtin:{}>", b.name),
            Value::Adt(adt) => {
                if adt.fields.is_empty() {
                    write!(f, "{}", adt.ctor_name)
                } else {
                    write!(f, "{}({})", adt.ctor_name, join_values(&adt.fields))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_printing_keeps_one_fractional_digit() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Float(1500.0).to_string(), "1500.0");
    }

    #[test]
    fn collection_printing() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.to_string(), "[1, 2]");

        let tuple = Value::tuple(vec![Value::Int(1), Value::string("x")]);
        assert_eq!(tuple.to_string(), "(1, \"x\")");

        let empty = Value::tuple(vec![]);
        assert_eq!(empty.to_string(), "()");

        let mut record = RecordValue::default();
        record.set("a", Value::Int(1));
        record.set("b", Value::Bool(true));
        assert_eq!(Value::record(record).to_string(), "{ a: 1, b: true }");

        let mut map = MapValue::default();
        map.set(Value::string("k"), Value::Int(9));
        assert_eq!(Value::map(map).to_string(), "%{ \"k\": 9 }");
    }

    #[test]
    fn adt_printing() {
        assert_eq!(Value::adt("Option", "None", vec![]).to_string(), "None");
        assert_eq!(
            Value::adt("Option", "Some", vec![Value::Int(42)]).to_string(),
            "Some(42)"
        );
    }

    #[test]
    fn structural_equality() {
        let a = Value::list(vec![Value::Int(1), Value::string("x")]);
        let b = Value::list(vec![Value::Int(1), Value::string("x")]);
        assert!(a.equals(&b));

        let c = Value::list(vec![Value::Int(1)]);
        assert!(!a.equals(&c));

        assert!(!Value::Int(1).equals(&Value::Float(1.0)));
    }

    #[test]
    fn record_equality_ignores_field_order() {
        let mut a = RecordValue::default();
        a.set("x", Value::Int(1));
        a.set("y", Value::Int(2));

        let mut b = RecordValue::default();
        b.set("y", Value::Int(2));
        b.set("x", Value::Int(1));

        assert!(Value::record(a).equals(&Value::record(b)));
    }

    #[test]
    fn map_overwrite_preserves_position() {
        let mut map = MapValue::default();
        map.set(Value::Int(1), Value::string("a"));
        map.set(Value::Int(2), Value::string("b"));
        map.set(Value::Int(1), Value::string("c"));

        assert_eq!(map.entries.len(), 2);
        assert!(map.entries[0].0.equals(&Value::Int(1)));
        assert!(map.entries[0].1.equals(&Value::string("c")));
    }

    #[test]
    fn builtins_are_only_reference_equal() {
        let a = Value::builtin("id", 1, |args| Ok(args[0].clone()));
        let b = Value::builtin("id", 1, |args| Ok(args[0].clone()));
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
    }
}
