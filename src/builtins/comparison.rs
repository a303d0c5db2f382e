//! Comparison operations: <, >, <=, >=, ==, !=, is, is-not, in, not-in, not
//!
//! The relational operators and `==`/`is` are variadic with chained
//! semantics: every adjacent pair must hold. `!=` and `is-not` are binary,
//! matching the host operators they wrap.

use crate::error::{PsilError, ARITY_ONE, ARITY_TWO};
use crate::help::{register_help, HelpEntry};
use crate::scope::Scope;
use crate::value::{values_equal, values_identical, Value};
use std::rc::Rc;

type PairFn = fn(&str, &Value, &Value, usize) -> Result<bool, PsilError>;

/// All adjacent pairs must satisfy `holds`.
fn chained(function: &str, args: &[Value], holds: PairFn) -> Result<Value, PsilError> {
    for i in 0..args.len().saturating_sub(1) {
        if !holds(function, &args[i], &args[i + 1], i)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn as_f64(function: &str, v: &Value, position: usize) -> Result<f64, PsilError> {
    match v {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        Value::Bool(b) => Ok(*b as i64 as f64),
        other => Err(PsilError::type_error(function, "number", other, position)),
    }
}

fn pair_lt(function: &str, a: &Value, b: &Value, i: usize) -> Result<bool, PsilError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x < y),
        _ => Ok(as_f64(function, a, i + 1)? < as_f64(function, b, i + 2)?),
    }
}

fn pair_gt(function: &str, a: &Value, b: &Value, i: usize) -> Result<bool, PsilError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x > y),
        _ => Ok(as_f64(function, a, i + 1)? > as_f64(function, b, i + 2)?),
    }
}

fn pair_le(function: &str, a: &Value, b: &Value, i: usize) -> Result<bool, PsilError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x <= y),
        _ => Ok(as_f64(function, a, i + 1)? <= as_f64(function, b, i + 2)?),
    }
}

fn pair_ge(function: &str, a: &Value, b: &Value, i: usize) -> Result<bool, PsilError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x >= y),
        _ => Ok(as_f64(function, a, i + 1)? >= as_f64(function, b, i + 2)?),
    }
}

fn pair_eq(_: &str, a: &Value, b: &Value, _: usize) -> Result<bool, PsilError> {
    Ok(values_equal(a, b))
}

fn pair_is(_: &str, a: &Value, b: &Value, _: usize) -> Result<bool, PsilError> {
    Ok(values_identical(a, b))
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, PsilError> {
    chained("<", args, pair_lt)
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, PsilError> {
    chained(">", args, pair_gt)
}

pub fn builtin_le(args: &[Value]) -> Result<Value, PsilError> {
    chained("<=", args, pair_le)
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, PsilError> {
    chained(">=", args, pair_ge)
}

/// Structural equality; numbers compare across the int/float divide.
pub fn builtin_eq(args: &[Value]) -> Result<Value, PsilError> {
    chained("==", args, pair_eq)
}

pub fn builtin_ne(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("!=", ARITY_TWO, args.len()));
    }
    Ok(Value::Bool(!values_equal(&args[0], &args[1])))
}

/// Identity: interned id for symbols, pointer identity for sequences and
/// functions, structural for immutable atoms.
pub fn builtin_is(args: &[Value]) -> Result<Value, PsilError> {
    chained("is", args, pair_is)
}

pub fn builtin_is_not(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("is-not", ARITY_TWO, args.len()));
    }
    Ok(Value::Bool(!values_identical(&args[0], &args[1])))
}

fn member(function: &str, needle: &Value, haystack: &Value) -> Result<bool, PsilError> {
    match haystack {
        Value::List(items) => Ok(items.borrow().iter().any(|v| values_equal(v, needle))),
        Value::String(s) => match needle {
            Value::String(sub) => Ok(s.contains(sub.as_str())),
            other => Err(PsilError::type_error(function, "string", other, 1)),
        },
        other => Err(PsilError::type_error(function, "list or string", other, 2)),
    }
}

/// Membership: element of a sequence, or substring of a string.
pub fn builtin_in(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("in", ARITY_TWO, args.len()));
    }
    Ok(Value::Bool(member("in", &args[0], &args[1])?))
}

pub fn builtin_not_in(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("not-in", ARITY_TWO, args.len()));
    }
    Ok(Value::Bool(!member("not-in", &args[0], &args[1])?))
}

/// Logical negation of truthiness.
pub fn builtin_not(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("not", ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// Register all comparison builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    super::bind(scope, "<", builtin_lt);
    super::bind(scope, ">", builtin_gt);
    super::bind(scope, "<=", builtin_le);
    super::bind(scope, ">=", builtin_ge);
    super::bind(scope, "==", builtin_eq);
    super::bind(scope, "!=", builtin_ne);
    super::bind(scope, "is", builtin_is);
    super::bind(scope, "is-not", builtin_is_not);
    super::bind(scope, "in", builtin_in);
    super::bind(scope, "not-in", builtin_not_in);
    super::bind(scope, "not", builtin_not);

    register_help(HelpEntry {
        name: "==".to_string(),
        signature: "(== ...)".to_string(),
        description: "Structural equality over every adjacent pair. Integers and floats compare numerically; symbols by identity.".to_string(),
        examples: vec![
            "(== 1 1 1) => true".to_string(),
            "(== 1 1.0) => true".to_string(),
            "(== '(1 2) '(1 2)) => true".to_string(),
        ],
        related: vec!["!=".to_string(), "is".to_string()],
        category: "Comparison".to_string(),
    });

    register_help(HelpEntry {
        name: "<".to_string(),
        signature: "(< ...)".to_string(),
        description: "True when the arguments are strictly increasing (chained over adjacent pairs). Works on numbers and strings.".to_string(),
        examples: vec!["(< 1 2 3) => true".to_string(), "(< 1 3 2) => false".to_string()],
        related: vec![">".to_string(), "<=".to_string(), ">=".to_string()],
        category: "Comparison".to_string(),
    });

    register_help(HelpEntry {
        name: "is".to_string(),
        signature: "(is ...)".to_string(),
        description: "Identity over every adjacent pair: interned identity for symbols, pointer identity for sequences and functions.".to_string(),
        examples: vec!["(is 'a 'a) => true".to_string(), "(is (list) (list)) => false".to_string()],
        related: vec!["==".to_string(), "is-not".to_string()],
        category: "Comparison".to_string(),
    });

    register_help(HelpEntry {
        name: "in".to_string(),
        signature: "(in x xs)".to_string(),
        description: "Membership: element of a sequence, or substring of a string.".to_string(),
        examples: vec![
            "(in 2 '(1 2 3)) => true".to_string(),
            "(in \"bc\" \"abcd\") => true".to_string(),
        ],
        related: vec!["not-in".to_string()],
        category: "Comparison".to_string(),
    });

    register_help(HelpEntry {
        name: "not".to_string(),
        signature: "(not x)".to_string(),
        description: "Logical negation of truthiness.".to_string(),
        examples: vec!["(not nil) => true".to_string(), "(not 1) => false".to_string()],
        related: vec!["and".to_string(), "or".to_string()],
        category: "Comparison".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_relations() {
        assert_eq!(
            builtin_lt(&[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_lt(&[Value::Int(1), Value::Int(3), Value::Int(2)]).unwrap(),
            Value::Bool(false)
        );
        // Degenerate chains are vacuously true.
        assert_eq!(builtin_lt(&[Value::Int(1)]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_lt(&[]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_relations_on_strings() {
        assert_eq!(
            builtin_lt(&[Value::String("a".into()), Value::String("b".into())]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_ge(&[Value::String("b".into()), Value::String("b".into())]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_equality_crosses_numeric_types() {
        assert_eq!(
            builtin_eq(&[Value::Int(1), Value::Float(1.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_ne(&[Value::Int(1), Value::Int(2)]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_identity_vs_equality_on_lists() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = Value::list(vec![Value::Int(1)]);
        assert_eq!(builtin_eq(&[a.clone(), b.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_is(&[a.clone(), b]).unwrap(), Value::Bool(false));
        assert_eq!(builtin_is(&[a.clone(), a]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_membership() {
        let xs = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(builtin_in(&[Value::Int(2), xs.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_in(&[Value::Int(9), xs.clone()]).unwrap(), Value::Bool(false));
        assert_eq!(
            builtin_not_in(&[Value::Int(9), xs]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_in(&[Value::String("bc".into()), Value::String("abcd".into())]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(builtin_not(&[Value::Nil]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_not(&[Value::Int(3)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_comparing_number_to_list_is_a_type_error() {
        let xs = Value::list(vec![]);
        assert!(builtin_lt(&[Value::Int(1), xs]).is_err());
    }
}
