//! List operations: list, make-list, list?, cons, the car/cdr family,
//! null?, append, reverse, list-tail, list-ref, set-car!
//!
//! Sequences are slices, not cons cells: `cons` prepends into a fresh
//! sequence and `cdr` copies the tail, while `set-car!` mutates in place.

use crate::error::{PsilError, ARITY_ONE, ARITY_TWO};
use crate::help::{register_help, HelpEntry};
use crate::host::index_in;
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<(), PsilError> {
    if args.len() != expected {
        let expected = match expected {
            1 => ARITY_ONE.to_string(),
            2 => ARITY_TWO.to_string(),
            n => n.to_string(),
        };
        return Err(PsilError::arity_error(function, expected, args.len()));
    }
    Ok(())
}

fn items_of(function: &str, v: &Value, position: usize) -> Result<Vec<Value>, PsilError> {
    match v {
        Value::List(items) => Ok(items.borrow().clone()),
        other => Err(PsilError::type_error(function, "list", other, position)),
    }
}

/// First element; an error on the empty sequence.
fn head(function: &str, v: &Value) -> Result<Value, PsilError> {
    let items = items_of(function, v, 1)?;
    items
        .first()
        .cloned()
        .ok_or_else(|| PsilError::runtime_error(function, "empty list"))
}

/// Everything after the first element; the empty sequence slices to itself.
fn tail_from(function: &str, v: &Value, n: usize) -> Result<Value, PsilError> {
    let items = items_of(function, v, 1)?;
    Ok(Value::list(items.get(n..).unwrap_or(&[]).to_vec()))
}

/// Element at `i`; an error when out of range.
fn nth(function: &str, v: &Value, i: usize) -> Result<Value, PsilError> {
    let items = items_of(function, v, 1)?;
    items
        .get(i)
        .cloned()
        .ok_or_else(|| PsilError::runtime_error(function, "index out of range"))
}

/// Creates a sequence of the arguments.
pub fn builtin_list(args: &[Value]) -> Result<Value, PsilError> {
    Ok(Value::list(args.to_vec()))
}

/// Copies a sequence into a fresh one.
pub fn builtin_make_list(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("make-list", args, 1)?;
    Ok(Value::list(items_of("make-list", &args[0], 1)?))
}

pub fn builtin_list_q(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("list?", args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::List(_))))
}

/// Prepends into a fresh sequence; a non-sequence tail is discarded, the
/// way the original's cons behaved.
pub fn builtin_cons(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cons", args, 2)?;
    let mut out = vec![args[0].clone()];
    if let Value::List(rest) = &args[1] {
        out.extend(rest.borrow().iter().cloned());
    }
    Ok(Value::list(out))
}

pub fn builtin_car(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("car", args, 1)?;
    head("car", &args[0])
}

pub fn builtin_cdr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cdr", args, 1)?;
    tail_from("cdr", &args[0], 1)
}

pub fn builtin_caar(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("caar", args, 1)?;
    head("caar", &head("caar", &args[0])?)
}

pub fn builtin_cadr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cadr", args, 1)?;
    nth("cadr", &args[0], 1)
}

pub fn builtin_cdar(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cdar", args, 1)?;
    tail_from("cdar", &head("cdar", &args[0])?, 1)
}

pub fn builtin_cddr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cddr", args, 1)?;
    tail_from("cddr", &args[0], 2)
}

pub fn builtin_caaar(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("caaar", args, 1)?;
    head("caaar", &head("caaar", &head("caaar", &args[0])?)?)
}

pub fn builtin_caadr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("caadr", args, 1)?;
    head("caadr", &nth("caadr", &args[0], 1)?)
}

pub fn builtin_caddr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("caddr", args, 1)?;
    nth("caddr", &args[0], 2)
}

pub fn builtin_cadddr(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("cadddr", args, 1)?;
    nth("cadddr", &args[0], 3)
}

pub fn builtin_caaaar(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("caaaar", args, 1)?;
    let mut v = args[0].clone();
    for _ in 0..4 {
        v = head("caaaar", &v)?;
    }
    Ok(v)
}

/// True only for the empty sequence.
pub fn builtin_null_q(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("null?", args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::List(items) => items.borrow().is_empty(),
        _ => false,
    }))
}

/// Concatenates sequences into a fresh one; `(append)` is the empty sequence.
pub fn builtin_append(args: &[Value]) -> Result<Value, PsilError> {
    let mut out = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::List(items) => out.extend(items.borrow().iter().cloned()),
            other => return Err(PsilError::type_error("append", "list", other, i + 1)),
        }
    }
    Ok(Value::list(out))
}

pub fn builtin_reverse(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("reverse", args, 1)?;
    let mut items = items_of("reverse", &args[0], 1)?;
    items.reverse();
    Ok(Value::list(items))
}

/// The sequence from index n on, with the host's slice conventions for
/// negative and out-of-range starts.
pub fn builtin_list_tail(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("list-tail", args, 2)?;
    let items = items_of("list-tail", &args[0], 1)?;
    let Value::Int(n) = args[1] else {
        return Err(PsilError::type_error("list-tail", "integer", &args[1], 2));
    };
    let len = items.len() as i64;
    let start = if n < 0 { (n + len).max(0) } else { n.min(len) } as usize;
    Ok(Value::list(items[start..].to_vec()))
}

pub fn builtin_list_ref(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("list-ref", args, 2)?;
    let items = items_of("list-ref", &args[0], 1)?;
    let Value::Int(n) = args[1] else {
        return Err(PsilError::type_error("list-ref", "integer", &args[1], 2));
    };
    index_in(n, items.len())
        .map(|i| items[i].clone())
        .ok_or_else(|| PsilError::runtime_error("list-ref", "index out of range"))
}

/// Replaces the first element in place; the mutation is visible through
/// every handle to the sequence.
pub fn builtin_set_car(args: &[Value]) -> Result<Value, PsilError> {
    expect_arity("set-car!", args, 2)?;
    let Value::List(items) = &args[0] else {
        return Err(PsilError::type_error("set-car!", "list", &args[0], 1));
    };
    let mut items = items.borrow_mut();
    if items.is_empty() {
        return Err(PsilError::runtime_error("set-car!", "empty list"));
    }
    items[0] = args[1].clone();
    Ok(Value::Nil)
}

/// Register all list builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    super::bind(scope, "list", builtin_list);
    super::bind(scope, "make-list", builtin_make_list);
    super::bind(scope, "list?", builtin_list_q);
    super::bind(scope, "cons", builtin_cons);
    super::bind(scope, "car", builtin_car);
    super::bind(scope, "cdr", builtin_cdr);
    super::bind(scope, "caar", builtin_caar);
    super::bind(scope, "cadr", builtin_cadr);
    super::bind(scope, "cdar", builtin_cdar);
    super::bind(scope, "cddr", builtin_cddr);
    super::bind(scope, "caaar", builtin_caaar);
    super::bind(scope, "caadr", builtin_caadr);
    super::bind(scope, "caddr", builtin_caddr);
    super::bind(scope, "cadddr", builtin_cadddr);
    super::bind(scope, "caaaar", builtin_caaaar);
    super::bind(scope, "null?", builtin_null_q);
    super::bind(scope, "append", builtin_append);
    super::bind(scope, "reverse", builtin_reverse);
    super::bind(scope, "list-tail", builtin_list_tail);
    super::bind(scope, "list-ref", builtin_list_ref);
    super::bind(scope, "set-car!", builtin_set_car);

    register_help(HelpEntry {
        name: "cons".to_string(),
        signature: "(cons x xs)".to_string(),
        description: "Prepends x into a fresh sequence; the original is not modified.".to_string(),
        examples: vec![
            "(cons 1 '(2 3)) => (1 2 3)".to_string(),
            "(cons 1 '()) => (1)".to_string(),
        ],
        related: vec!["car".to_string(), "cdr".to_string(), "list".to_string()],
        category: "List operations".to_string(),
    });

    register_help(HelpEntry {
        name: "car".to_string(),
        signature: "(car xs)".to_string(),
        description: "First element of a sequence; an error on the empty sequence.".to_string(),
        examples: vec!["(car '(1 2 3)) => 1".to_string()],
        related: vec!["cdr".to_string(), "cadr".to_string(), "list-ref".to_string()],
        category: "List operations".to_string(),
    });

    register_help(HelpEntry {
        name: "cdr".to_string(),
        signature: "(cdr xs)".to_string(),
        description: "Everything after the first element, as a fresh sequence. The empty sequence slices to itself.".to_string(),
        examples: vec!["(cdr '(1 2 3)) => (2 3)".to_string(), "(cdr '()) => ()".to_string()],
        related: vec!["car".to_string(), "list-tail".to_string()],
        category: "List operations".to_string(),
    });

    register_help(HelpEntry {
        name: "append".to_string(),
        signature: "(append ...)".to_string(),
        description: "Concatenates sequences into a fresh one.".to_string(),
        examples: vec!["(append '(1 2) '(3)) => (1 2 3)".to_string()],
        related: vec!["cons".to_string(), "reverse".to_string()],
        category: "List operations".to_string(),
    });

    register_help(HelpEntry {
        name: "set-car!".to_string(),
        signature: "(set-car! xs x)".to_string(),
        description: "Replaces the first element of a sequence in place; visible through every handle to it.".to_string(),
        examples: vec!["(define p '(1 2)) (set-car! p 9) p => (9 2)".to_string()],
        related: vec!["dict-set".to_string()],
        category: "List operations".to_string(),
    });

    register_help(HelpEntry {
        name: "null?".to_string(),
        signature: "(null? x)".to_string(),
        description: "True only for the empty sequence.".to_string(),
        examples: vec!["(null? '()) => true".to_string(), "(null? nil) => false".to_string()],
        related: vec!["list?".to_string()],
        category: "List operations".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::external;

    fn ints(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_cons_and_car_cdr() {
        let xs = builtin_cons(&[Value::Int(1), ints(&[2, 3])]).unwrap();
        assert_eq!(external(&xs), "(1 2 3)");
        assert_eq!(builtin_car(&[xs.clone()]).unwrap(), Value::Int(1));
        assert_eq!(external(&builtin_cdr(&[xs]).unwrap()), "(2 3)");
    }

    #[test]
    fn test_cons_to_non_list_drops_the_tail() {
        let xs = builtin_cons(&[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(external(&xs), "(1)");
    }

    #[test]
    fn test_car_of_empty_errors_but_cdr_slices() {
        assert!(builtin_car(&[ints(&[])]).is_err());
        assert_eq!(external(&builtin_cdr(&[ints(&[])]).unwrap()), "()");
    }

    #[test]
    fn test_compound_accessors() {
        let nested = Value::list(vec![ints(&[1, 2]), ints(&[3, 4]), Value::Int(5), Value::Int(6)]);
        assert_eq!(builtin_caar(&[nested.clone()]).unwrap(), Value::Int(1));
        assert_eq!(external(&builtin_cadr(&[nested.clone()]).unwrap()), "(3 4)");
        assert_eq!(external(&builtin_cdar(&[nested.clone()]).unwrap()), "(2)");
        assert_eq!(external(&builtin_cddr(&[nested.clone()]).unwrap()), "(5 6)");
        assert_eq!(builtin_caddr(&[nested.clone()]).unwrap(), Value::Int(5));
        assert_eq!(builtin_cadddr(&[nested]).unwrap(), Value::Int(6));

        let deep = Value::list(vec![Value::list(vec![Value::list(vec![ints(&[7])])])]);
        assert_eq!(builtin_caaaar(&[deep.clone()]).unwrap(), Value::Int(7));
        assert_eq!(builtin_caaar(&[deep]).unwrap(), Value::list(vec![Value::Int(7)]));
    }

    #[test]
    fn test_null_q() {
        assert_eq!(builtin_null_q(&[ints(&[])]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_null_q(&[ints(&[1])]).unwrap(), Value::Bool(false));
        assert_eq!(builtin_null_q(&[Value::Nil]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_append_reverse() {
        let r = builtin_append(&[ints(&[1, 2]), ints(&[]), ints(&[3])]).unwrap();
        assert_eq!(external(&r), "(1 2 3)");
        assert_eq!(external(&builtin_append(&[]).unwrap()), "()");
        assert_eq!(external(&builtin_reverse(&[ints(&[1, 2, 3])]).unwrap()), "(3 2 1)");
    }

    #[test]
    fn test_list_tail_and_ref() {
        let xs = ints(&[1, 2, 3, 4]);
        assert_eq!(
            external(&builtin_list_tail(&[xs.clone(), Value::Int(2)]).unwrap()),
            "(3 4)"
        );
        assert_eq!(
            external(&builtin_list_tail(&[xs.clone(), Value::Int(-1)]).unwrap()),
            "(4)"
        );
        assert_eq!(
            builtin_list_ref(&[xs.clone(), Value::Int(1)]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            builtin_list_ref(&[xs.clone(), Value::Int(-1)]).unwrap(),
            Value::Int(4)
        );
        assert!(builtin_list_ref(&[xs, Value::Int(9)]).is_err());
    }

    #[test]
    fn test_set_car_mutates_in_place() {
        let xs = ints(&[1, 2]);
        let alias = xs.clone();
        builtin_set_car(&[xs, Value::Int(9)]).unwrap();
        assert_eq!(external(&alias), "(9 2)");
    }

    #[test]
    fn test_make_list_copies() {
        let xs = ints(&[1, 2]);
        let copy = builtin_make_list(&[xs.clone()]).unwrap();
        builtin_set_car(&[copy.clone(), Value::Int(9)]).unwrap();
        assert_eq!(external(&xs), "(1 2)");
        assert_eq!(external(&copy), "(9 2)");
    }
}
