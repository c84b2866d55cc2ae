//! The builtin function library.
//!
//! Each builtin declares a fixed arity (`-1` for variadic); the evaluator
//! rejects calls with a mismatching argument count before the body runs,
//! so bodies index `args` directly.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::env::Env;
use super::value::{MapValue, Value};

fn define(env: &Env, name: &str, arity: i32, func: impl Fn(&[Value]) -> Result<Value> + 'static) {
    env.borrow_mut()
        .define(name, Value::builtin(name, arity, func), false)
        .expect("the global frame holds no constants during registration");
}

/// Registers the whole library into `env`.
pub fn register(env: &Env) {
    register_core(env);
    register_list_ops(env);
    register_math(env);
    register_string_ops(env);
    register_predicates(env);
    register_map_ops(env);
    register_io(env);
    register_files(env);
    register_ordering(env);
}

fn register_core(env: &Env) {
    define(env, "print", 1, |args| {
        println!("{}", args[0].to_print_string());
        Ok(Value::Unit)
    });

    define(env, "println", 1, |args| {
        println!("{}", args[0].to_print_string());
        Ok(Value::Unit)
    });

    define(env, "str", 1, |args| match &args[0] {
        Value::Str(_) => Ok(args[0].clone()),
        other => Ok(Value::string(other.to_display_string())),
    });

    define(env, "int", 1, |args| match &args[0] {
        Value::Int(_) => Ok(args[0].clone()),
        Value::Float(v) => Ok(Value::Int(*v as i64)),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| Error::runtime(format!("cannot convert to int: \"{s}\""))),
        other => Err(Error::runtime(format!(
            "cannot convert {} to int",
            other.kind_name()
        ))),
    });

    define(env, "float", 1, |args| match &args[0] {
        Value::Float(_) => Ok(args[0].clone()),
        Value::Int(v) => Ok(Value::Float(*v as f64)),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| Error::runtime(format!("cannot convert to float: \"{s}\""))),
        other => Err(Error::runtime(format!(
            "cannot convert {} to float",
            other.kind_name()
        ))),
    });

    define(env, "range", 2, |args| {
        let start = args[0].as_int().map_err(|_| Error::runtime("range: expected int arguments"))?;
        let end = args[1].as_int().map_err(|_| Error::runtime("range: expected int arguments"))?;
        Ok(Value::list((start..end).map(Value::Int).collect()))
    });

    define(env, "error", 1, |args| {
        Err(Error::runtime(args[0].to_print_string()))
    });

    define(env, "assert", 2, |args| {
        let cond = args[0].as_bool()?;
        if !cond {
            return Err(Error::runtime(format!(
                "assertion failed: {}",
                args[1].to_print_string()
            )));
        }
        Ok(Value::Unit)
    });
}

fn expect_list<'a>(value: &'a Value, what: &str) -> Result<&'a [Value]> {
    match value {
        Value::List(items) => Ok(items.as_slice()),
        _ => Err(Error::runtime(format!("{what}: expected list"))),
    }
}

fn register_list_ops(env: &Env) {
    define(env, "head", 1, |args| {
        let items = expect_list(&args[0], "head")?;
        items
            .first()
            .cloned()
            .ok_or_else(|| Error::runtime("head: empty list"))
    });

    define(env, "tail", 1, |args| {
        let items = expect_list(&args[0], "tail")?;
        if items.is_empty() {
            return Err(Error::runtime("tail: empty list"));
        }
        Ok(Value::list(items[1..].to_vec()))
    });

    define(env, "cons", 2, |args| {
        let items = expect_list(&args[1], "cons")?;
        let mut result = Vec::with_capacity(items.len() + 1);
        result.push(args[0].clone());
        result.extend_from_slice(items);
        Ok(Value::list(result))
    });

    define(env, "len", 1, |args| match &args[0] {
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
        _ => Err(Error::runtime("len: expected list, string, or tuple")),
    });

    define(env, "empty", 1, |args| match &args[0] {
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        _ => Err(Error::runtime("empty: expected list or string")),
    });

    define(env, "append", 2, |args| {
        let items = expect_list(&args[0], "append")?;
        let mut result = items.to_vec();
        result.push(args[1].clone());
        Ok(Value::list(result))
    });

    define(env, "concat", 2, |args| {
        let left = expect_list(&args[0], "concat")?;
        let right = expect_list(&args[1], "concat")?;
        let mut result = left.to_vec();
        result.extend_from_slice(right);
        Ok(Value::list(result))
    });

    define(env, "reverse", 1, |args| {
        let items = expect_list(&args[0], "reverse")?;
        let mut result = items.to_vec();
        result.reverse();
        Ok(Value::list(result))
    });

    define(env, "nth", 2, |args| {
        let items = expect_list(&args[0], "nth")?;
        let index = args[1]
            .as_int()
            .map_err(|_| Error::runtime("nth: expected int index"))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| Error::runtime("nth: index out of bounds"))
    });
}

fn register_math(env: &Env) {
    define(env, "abs", 1, |args| match &args[0] {
        Value::Int(v) => Ok(Value::Int(v.wrapping_abs())),
        Value::Float(v) => Ok(Value::Float(v.abs())),
        _ => Err(Error::runtime("abs: expected number")),
    });

    define(env, "floor", 1, |args| {
        Ok(Value::Int(args[0].as_number()?.floor() as i64))
    });

    define(env, "ceil", 1, |args| {
        Ok(Value::Int(args[0].as_number()?.ceil() as i64))
    });

    define(env, "round", 1, |args| {
        Ok(Value::Int(args[0].as_number()?.round() as i64))
    });

    define(env, "sqrt", 1, |args| {
        Ok(Value::Float(args[0].as_number()?.sqrt()))
    });

    define(env, "pow", 2, |args| {
        Ok(Value::Float(args[0].as_number()?.powf(args[1].as_number()?)))
    });

    define(env, "min", 2, |args| min_max(args, true));
    define(env, "max", 2, |args| min_max(args, false));

    define(env, "sin", 1, |args| Ok(Value::Float(args[0].as_number()?.sin())));
    define(env, "cos", 1, |args| Ok(Value::Float(args[0].as_number()?.cos())));
    define(env, "tan", 1, |args| Ok(Value::Float(args[0].as_number()?.tan())));
    define(env, "asin", 1, |args| Ok(Value::Float(args[0].as_number()?.asin())));
    define(env, "acos", 1, |args| Ok(Value::Float(args[0].as_number()?.acos())));
    define(env, "atan", 1, |args| Ok(Value::Float(args[0].as_number()?.atan())));

    define(env, "atan2", 2, |args| {
        Ok(Value::Float(args[0].as_number()?.atan2(args[1].as_number()?)))
    });

    define(env, "log", 1, |args| Ok(Value::Float(args[0].as_number()?.ln())));
    define(env, "log10", 1, |args| Ok(Value::Float(args[0].as_number()?.log10())));
    define(env, "exp", 1, |args| Ok(Value::Float(args[0].as_number()?.exp())));

    let mut globals = env.borrow_mut();
    globals
        .define("pi", Value::Float(std::f64::consts::PI), false)
        .expect("the global frame holds no constants during registration");
    globals
        .define("e", Value::Float(std::f64::consts::E), false)
        .expect("the global frame holds no constants during registration");
}

fn min_max(args: &[Value], want_min: bool) -> Result<Value> {
    let a = args[0].as_number()?;
    let b = args[1].as_number()?;
    if let (Value::Int(x), Value::Int(y)) = (&args[0], &args[1]) {
        let v = if want_min { (*x).min(*y) } else { (*x).max(*y) };
        return Ok(Value::Int(v));
    }
    let v = if want_min { a.min(b) } else { a.max(b) };
    Ok(Value::Float(v))
}

fn register_string_ops(env: &Env) {
    define(env, "substr", 3, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("substr: expected string"))?;
        let start = args[1].as_int()?.max(0) as usize;
        let count = args[2].as_int()?.max(0) as usize;
        Ok(Value::string(
            s.chars().skip(start).take(count).collect::<String>(),
        ))
    });

    define(env, "split", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("split: expected strings"))?;
        let delim = args[1]
            .as_str()
            .map_err(|_| Error::runtime("split: expected strings"))?;
        if delim.is_empty() {
            return Err(Error::runtime("split: empty delimiter"));
        }
        Ok(Value::list(
            s.split(delim).map(Value::string).collect(),
        ))
    });

    define(env, "join", 2, |args| {
        let items = expect_list(&args[0], "join")?;
        let delim = args[1]
            .as_str()
            .map_err(|_| Error::runtime("join: expected string delimiter"))?;
        let joined = items
            .iter()
            .map(|v| v.to_print_string())
            .collect::<Vec<_>>()
            .join(delim);
        Ok(Value::string(joined))
    });

    define(env, "uppercase", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("uppercase: expected string"))?;
        Ok(Value::string(s.to_uppercase()))
    });

    define(env, "lowercase", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("lowercase: expected string"))?;
        Ok(Value::string(s.to_lowercase()))
    });

    define(env, "trim", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("trim: expected string"))?;
        Ok(Value::string(s.trim()))
    });

    define(env, "trim_start", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("trim_start: expected string"))?;
        Ok(Value::string(s.trim_start()))
    });

    define(env, "trim_end", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("trim_end: expected string"))?;
        Ok(Value::string(s.trim_end()))
    });

    define(env, "contains", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("contains: expected strings"))?;
        let needle = args[1]
            .as_str()
            .map_err(|_| Error::runtime("contains: expected strings"))?;
        Ok(Value::Bool(s.contains(needle)))
    });

    define(env, "starts_with", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("starts_with: expected strings"))?;
        let prefix = args[1]
            .as_str()
            .map_err(|_| Error::runtime("starts_with: expected strings"))?;
        Ok(Value::Bool(s.starts_with(prefix)))
    });

    define(env, "ends_with", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("ends_with: expected strings"))?;
        let suffix = args[1]
            .as_str()
            .map_err(|_| Error::runtime("ends_with: expected strings"))?;
        Ok(Value::Bool(s.ends_with(suffix)))
    });

    define(env, "replace", 3, |args| {
        let (s, old, new) = three_strings(args, "replace")?;
        Ok(Value::string(s.replacen(old, new, 1)))
    });

    define(env, "replace_all", 3, |args| {
        let (s, old, new) = three_strings(args, "replace_all")?;
        if old.is_empty() {
            return Ok(Value::string(s));
        }
        Ok(Value::string(s.replace(old, new)))
    });

    define(env, "char_at", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("char_at: expected string"))?;
        let index = args[1]
            .as_int()
            .map_err(|_| Error::runtime("char_at: expected int index"))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::string(c.to_string()))
            .ok_or_else(|| Error::runtime("char_at: index out of bounds"))
    });

    define(env, "chars", 1, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("chars: expected string"))?;
        Ok(Value::list(
            s.chars().map(|c| Value::string(c.to_string())).collect(),
        ))
    });

    define(env, "index_of", 2, |args| {
        let s = args[0]
            .as_str()
            .map_err(|_| Error::runtime("index_of: expected strings"))?;
        let needle = args[1]
            .as_str()
            .map_err(|_| Error::runtime("index_of: expected strings"))?;
        match s.find(needle) {
            Some(byte_pos) => Ok(Value::Int(s[..byte_pos].chars().count() as i64)),
            None => Ok(Value::Int(-1)),
        }
    });
}

fn three_strings<'a>(args: &'a [Value], what: &str) -> Result<(&'a str, &'a str, &'a str)> {
    let err = || Error::runtime(format!("{what}: expected strings"));
    Ok((
        args[0].as_str().map_err(|_| err())?,
        args[1].as_str().map_err(|_| err())?,
        args[2].as_str().map_err(|_| err())?,
    ))
}

fn register_predicates(env: &Env) {
    define(env, "is_int", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Int(_))))
    });
    define(env, "is_float", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Float(_))))
    });
    define(env, "is_string", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Str(_))))
    });
    define(env, "is_bool", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
    });
    define(env, "is_list", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::List(_))))
    });
    define(env, "is_tuple", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Tuple(_))))
    });
    define(env, "is_record", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Record(_))))
    });
    define(env, "is_map", 1, |args| {
        Ok(Value::Bool(matches!(args[0], Value::Map(_))))
    });
    define(env, "is_fn", 1, |args| Ok(Value::Bool(args[0].is_callable())));
}

fn expect_map<'a>(value: &'a Value, what: &str) -> Result<&'a MapValue> {
    match value {
        Value::Map(map) => Ok(map),
        _ => Err(Error::runtime(format!("{what}: expected map"))),
    }
}

fn register_map_ops(env: &Env) {
    define(env, "map_get", 2, |args| {
        let map = expect_map(&args[0], "map_get")?;
        map.get(&args[1])
            .cloned()
            .ok_or_else(|| Error::runtime(format!("map_get: key not found: {}", args[1])))
    });

    define(env, "map_has", 2, |args| {
        let map = expect_map(&args[0], "map_has")?;
        Ok(Value::Bool(map.contains(&args[1])))
    });

    define(env, "map_set", 3, |args| {
        let map = expect_map(&args[0], "map_set")?;
        let mut result = map.clone();
        result.set(args[1].clone(), args[2].clone());
        Ok(Value::map(result))
    });

    define(env, "map_remove", 2, |args| {
        let map = expect_map(&args[0], "map_remove")?;
        let mut result = map.clone();
        result.remove(&args[1]);
        Ok(Value::map(result))
    });

    define(env, "map_keys", 1, |args| {
        let map = expect_map(&args[0], "map_keys")?;
        Ok(Value::list(
            map.entries.iter().map(|(k, _)| k.clone()).collect(),
        ))
    });

    define(env, "map_values", 1, |args| {
        let map = expect_map(&args[0], "map_values")?;
        Ok(Value::list(
            map.entries.iter().map(|(_, v)| v.clone()).collect(),
        ))
    });

    define(env, "map_size", 1, |args| {
        let map = expect_map(&args[0], "map_size")?;
        Ok(Value::Int(map.entries.len() as i64))
    });
}

fn read_line() -> Value {
    let mut line = String::new();
    // EOF or a read error both come back as the empty string.
    let _ = io::stdin().lock().read_line(&mut line);
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Value::string(line)
}

fn register_io(env: &Env) {
    define(env, "input", -1, |args| {
        if let Some(prompt) = args.first() {
            print!("{}", prompt.to_print_string());
            let _ = io::stdout().flush();
        }
        Ok(read_line())
    });

    define(env, "input_prompt", 1, |args| {
        print!("{}", args[0].to_print_string());
        let _ = io::stdout().flush();
        Ok(read_line())
    });
}

fn register_files(env: &Env) {
    define(env, "file_read", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_read: expected string path"))?;
        fs::read_to_string(path)
            .map(Value::string)
            .map_err(|e| Error::runtime(format!("file_read: could not open file: {path}: {e}")))
    });

    define(env, "file_write", 2, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_write: expected string path"))?;
        let content = args[1]
            .as_str()
            .map_err(|_| Error::runtime("file_write: expected string content"))?;
        fs::write(path, content)
            .map_err(|e| Error::runtime(format!("file_write: could not write file: {path}: {e}")))?;
        Ok(Value::Unit)
    });

    define(env, "file_append", 2, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_append: expected string path"))?;
        let content = args[1]
            .as_str()
            .map_err(|_| Error::runtime("file_append: expected string content"))?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::runtime(format!("file_append: could not open file: {path}: {e}")))?;
        file.write_all(content.as_bytes())
            .map_err(|e| Error::runtime(format!("file_append: could not write file: {path}: {e}")))?;
        Ok(Value::Unit)
    });

    define(env, "file_exists", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_exists: expected string path"))?;
        Ok(Value::Bool(Path::new(path).exists()))
    });

    define(env, "file_delete", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_delete: expected string path"))?;
        match fs::remove_file(path) {
            Ok(()) => Ok(Value::Bool(true)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Value::Bool(false)),
            Err(e) => Err(Error::runtime(format!("file_delete: {e}"))),
        }
    });

    define(env, "file_lines", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("file_lines: expected string path"))?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::runtime(format!("file_lines: could not open file: {path}: {e}")))?;
        Ok(Value::list(content.lines().map(Value::string).collect()))
    });

    define(env, "dir_list", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("dir_list: expected string path"))?;
        let entries = fs::read_dir(path)
            .map_err(|e| Error::runtime(format!("dir_list: {e}")))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::runtime(format!("dir_list: {e}")))?;
            names.push(Value::string(entry.file_name().to_string_lossy().into_owned()));
        }
        Ok(Value::list(names))
    });

    define(env, "dir_exists", 1, |args| {
        let path = args[0]
            .as_str()
            .map_err(|_| Error::runtime("dir_exists: expected string path"))?;
        Ok(Value::Bool(Path::new(path).is_dir()))
    });
}

fn register_ordering(env: &Env) {
    define(env, "sort", 1, |args| {
        let items = expect_list(&args[0], "sort")?;
        if items.is_empty() {
            return Ok(args[0].clone());
        }

        if items
            .iter()
            .all(|v| matches!(v, Value::Int(_) | Value::Float(_)))
        {
            let mut result = items.to_vec();
            result.sort_by(|a, b| {
                let a = a.as_number().unwrap_or(f64::NAN);
                let b = b.as_number().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            });
            return Ok(Value::list(result));
        }

        if items.iter().all(|v| matches!(v, Value::Str(_))) {
            let mut result = items.to_vec();
            result.sort_by(|a, b| {
                let a = a.as_str().unwrap_or_default();
                let b = b.as_str().unwrap_or_default();
                a.cmp(b)
            });
            return Ok(Value::list(result));
        }

        Err(Error::runtime(
            "sort: can only sort lists of numbers or strings",
        ))
    });

    define(env, "compare", 2, |args| {
        let ordering = match (&args[0], &args[1]) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (a, b)
                if matches!(a, Value::Int(_) | Value::Float(_))
                    && matches!(b, Value::Int(_) | Value::Float(_)) =>
            {
                let a = a.as_number()?;
                let b = b.as_number()?;
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            }
            _ => {
                return Err(Error::runtime(
                    "compare: can only compare numbers or strings",
                ))
            }
        };
        Ok(Value::Int(match ordering {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }))
    });
}
