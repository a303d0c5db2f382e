//! Miscellaneous builtins: apply, concat, format, index, slice, dict-set,
//! del, include, and the macroexpand family.

use crate::error::{PsilError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_THREE, ARITY_TWO};
use crate::host::index_in;
use crate::printer::external;
use crate::scope::Scope;
use crate::value::Value;
use psil_macros::builtin;
use std::rc::Rc;

#[builtin(name = "apply", category = "Misc", related(lambda))]
/// Calls a function with a sequence of arguments.
///
/// # Examples
///
/// ```lisp
/// (apply + '(1 2 3)) => 6
/// ```
pub fn builtin_apply(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("apply", ARITY_TWO, args.len()));
    }
    let Value::List(items) = &args[1] else {
        return Err(PsilError::type_error("apply", "list", &args[1], 2));
    };
    let call_args: Vec<Value> = items.borrow().clone();
    match &args[0] {
        Value::Function(f) => f.call(call_args),
        Value::Builtin(b) => (b.func)(&call_args),
        other => Err(PsilError::NotCallable(external(other))),
    }
}

#[builtin(name = "concat", category = "Misc", related(format))]
/// Concatenates the display forms of the arguments into one string.
///
/// # Examples
///
/// ```lisp
/// (concat "x" 1 '(2)) => "x1(2)"
/// ```
///
/// # See Also
///
/// format
pub fn builtin_concat(args: &[Value]) -> Result<Value, PsilError> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_display_string());
    }
    Ok(Value::String(out))
}

#[builtin(name = "format", category = "Misc", related(concat, print))]
/// Formats a string printf-style. Directives: %s (display form),
/// %d (integer), %f (float), %x (hex), %% (literal percent).
///
/// # Examples
///
/// ```lisp
/// (format "%s: %d" "count" 3) => "count: 3"
/// ```
///
/// # See Also
///
/// concat, print
pub fn builtin_format(args: &[Value]) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error("format", ARITY_AT_LEAST_ONE, 0));
    }
    let Value::String(fmt) = &args[0] else {
        return Err(PsilError::type_error("format", "string", &args[0], 1));
    };
    Ok(Value::String(format_with("format", fmt, &args[1..])?))
}

/// The formatting engine shared by `format` and the string `%` operator.
pub(crate) fn format_with(
    function: &str,
    fmt: &str,
    args: &[Value],
) -> Result<String, PsilError> {
    let mut out = String::new();
    let mut chars = fmt.chars();
    let mut next = 0usize;

    let mut take = |next: &mut usize| -> Result<Value, PsilError> {
        let v = args.get(*next).cloned().ok_or_else(|| {
            PsilError::runtime_error(function, "not enough arguments for format string")
        })?;
        *next += 1;
        Ok(v)
    };

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => out.push_str(&take(&mut next)?.to_display_string()),
            Some('d') => match take(&mut next)? {
                Value::Int(n) => out.push_str(&n.to_string()),
                Value::Float(n) => out.push_str(&(n as i64).to_string()),
                Value::Bool(b) => out.push_str(&(b as i64).to_string()),
                other => {
                    return Err(PsilError::type_error(function, "number", &other, next));
                }
            },
            Some('f') => match take(&mut next)? {
                Value::Int(n) => out.push_str(&format!("{:.6}", n as f64)),
                Value::Float(n) => out.push_str(&format!("{:.6}", n)),
                other => {
                    return Err(PsilError::type_error(function, "number", &other, next));
                }
            },
            Some('x') => match take(&mut next)? {
                Value::Int(n) => out.push_str(&format!("{:x}", n)),
                other => {
                    return Err(PsilError::type_error(function, "integer", &other, next));
                }
            },
            Some(other) => {
                return Err(PsilError::runtime_error(
                    function,
                    format!("unsupported format directive %{}", other),
                ));
            }
            None => {
                return Err(PsilError::runtime_error(
                    function,
                    "incomplete format directive",
                ));
            }
        }
    }

    if next < args.len() {
        return Err(PsilError::runtime_error(
            function,
            "not all arguments converted during formatting",
        ));
    }
    Ok(out)
}

#[builtin(name = "index", category = "Misc", related(slice, list-ref))]
/// Element at an index: of a sequence, or a one-character string of a
/// string. Negative indices count from the end.
///
/// # Examples
///
/// ```lisp
/// (index '(a b c) 1) => b
/// (index "abc" -1) => "c"
/// ```
///
/// # See Also
///
/// slice, list-ref
pub fn builtin_index(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("index", ARITY_TWO, args.len()));
    }
    let Value::Int(i) = args[1] else {
        return Err(PsilError::type_error("index", "integer", &args[1], 2));
    };
    match &args[0] {
        Value::List(items) => {
            let items = items.borrow();
            index_in(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| PsilError::runtime_error("index", "index out of range"))
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            index_in(i, chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| PsilError::runtime_error("index", "index out of range"))
        }
        other => Err(PsilError::type_error("index", "list or string", other, 1)),
    }
}

#[builtin(name = "slice", category = "Misc", related(index, list-tail))]
/// Subsequence from start to stop, with the host's clamping and negative
/// index conventions.
///
/// # Examples
///
/// ```lisp
/// (slice '(1 2 3 4) 1 3) => (2 3)
/// (slice "abcd" 0 -1) => "abc"
/// ```
///
/// # See Also
///
/// index, list-tail
pub fn builtin_slice(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 3 {
        return Err(PsilError::arity_error("slice", ARITY_THREE, args.len()));
    }
    let (Value::Int(start), Value::Int(stop)) = (&args[1], &args[2]) else {
        let bad = if matches!(args[1], Value::Int(_)) { 2 } else { 1 };
        return Err(PsilError::type_error("slice", "integer", &args[bad], bad + 1));
    };
    match &args[0] {
        Value::List(items) => {
            let items = items.borrow();
            let (a, b) = slice_bounds(*start, *stop, items.len());
            Ok(Value::list(items[a..b].to_vec()))
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (a, b) = slice_bounds(*start, *stop, chars.len());
            Ok(Value::String(chars[a..b].iter().collect()))
        }
        other => Err(PsilError::type_error("slice", "list or string", other, 1)),
    }
}

/// Resolve slice endpoints the way the host does: negatives from the end,
/// everything clamped into range.
fn slice_bounds(start: i64, stop: i64, len: usize) -> (usize, usize) {
    let len = len as i64;
    let norm = |i: i64| if i < 0 { (i + len).max(0) } else { i.min(len) };
    let a = norm(start);
    let b = norm(stop).max(a);
    (a as usize, b as usize)
}

#[builtin(name = "dict-set", category = "Misc", related(set-car!, del))]
/// Replaces the element at an index in place.
///
/// # Examples
///
/// ```lisp
/// (define xs '(1 2 3)) (dict-set xs 1 9) xs => (1 9 3)
/// ```
///
/// # See Also
///
/// set-car!, del
pub fn builtin_dict_set(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 3 {
        return Err(PsilError::arity_error("dict-set", ARITY_THREE, args.len()));
    }
    let Value::List(items) = &args[0] else {
        return Err(PsilError::type_error("dict-set", "list", &args[0], 1));
    };
    let Value::Int(i) = args[1] else {
        return Err(PsilError::type_error("dict-set", "integer", &args[1], 2));
    };
    let mut items = items.borrow_mut();
    let len = items.len();
    match index_in(i, len) {
        Some(i) => {
            items[i] = args[2].clone();
            Ok(Value::Nil)
        }
        None => Err(PsilError::runtime_error("dict-set", "index out of range")),
    }
}

#[builtin(name = "del", category = "Misc", related(dict-set))]
/// Removes the element at an index in place.
///
/// # Examples
///
/// ```lisp
/// (define xs '(1 2 3)) (del xs 0) xs => (2 3)
/// ```
///
/// # See Also
///
/// dict-set
pub fn builtin_del(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("del", ARITY_TWO, args.len()));
    }
    let Value::List(items) = &args[0] else {
        return Err(PsilError::type_error("del", "list", &args[0], 1));
    };
    let Value::Int(i) = args[1] else {
        return Err(PsilError::type_error("del", "integer", &args[1], 2));
    };
    let mut items = items.borrow_mut();
    let len = items.len();
    match index_in(i, len) {
        Some(i) => {
            items.remove(i);
            Ok(Value::Nil)
        }
        None => Err(PsilError::runtime_error("del", "index out of range")),
    }
}

#[builtin(name = "include", category = "Misc", related(import))]
/// Loads and runs a source file. A leading shebang line is stripped.
///
/// # Examples
///
/// ```lisp
/// (include "prelude.psil")
/// ```
///
/// # See Also
///
/// import
pub fn builtin_include(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("include", ARITY_ONE, args.len()));
    }
    let Value::String(path) = &args[0] else {
        return Err(PsilError::type_error("include", "string", &args[0], 1));
    };
    crate::interp::include(path)?;
    Ok(Value::Nil)
}

#[builtin(name = "macroexpand", category = "Macros", related(macroexpand-1, macroexpand_r))]
/// Expands a form's head macro repeatedly until the head is no longer a
/// macro. The argument is a form, so normally quoted.
///
/// # Examples
///
/// ```lisp
/// (macroexpand '(when a b)) => (if a (begin b))
/// ```
///
/// # See Also
///
/// macroexpand-1, macroexpand_r
pub fn builtin_macroexpand(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("macroexpand", ARITY_ONE, args.len()));
    }
    crate::expand::macroexpand(&args[0], false)
}

#[builtin(name = "macroexpand-1", category = "Macros", related(macroexpand))]
/// Expands a form's head macro exactly once.
///
/// # See Also
///
/// macroexpand
pub fn builtin_macroexpand_1(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("macroexpand-1", ARITY_ONE, args.len()));
    }
    crate::expand::macroexpand(&args[0], true)
}

#[builtin(name = "macroexpand_r", category = "Macros", related(macroexpand))]
/// Recursively expands every macro call in a form, the same pass the
/// pipeline runs before evaluation.
///
/// # See Also
///
/// macroexpand
pub fn builtin_macroexpand_r(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("macroexpand_r", ARITY_ONE, args.len()));
    }
    crate::expand::macroexpand_r(&args[0], 0, false)
}

/// Register the miscellaneous builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    register_builtin_apply(scope);
    register_builtin_concat(scope);
    register_builtin_format(scope);
    register_builtin_index(scope);
    register_builtin_slice(scope);
    register_builtin_dict_set(scope);
    register_builtin_del(scope);
    register_builtin_include(scope);
    register_builtin_macroexpand(scope);
    register_builtin_macroexpand_1(scope);
    register_builtin_macroexpand_r(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::external;

    #[test]
    fn test_concat_uses_display_forms() {
        let r = builtin_concat(&[
            Value::String("x".into()),
            Value::Int(1),
            Value::list(vec![Value::Int(2)]),
        ])
        .unwrap();
        assert_eq!(r, Value::String("x1(2)".into()));
    }

    #[test]
    fn test_format_directives() {
        let r = builtin_format(&[
            Value::String("%s: %d%%, %x".into()),
            Value::String("hits".into()),
            Value::Int(3),
            Value::Int(255),
        ])
        .unwrap();
        assert_eq!(r, Value::String("hits: 3%, ff".into()));
    }

    #[test]
    fn test_format_argument_count_mismatch() {
        assert!(builtin_format(&[Value::String("%d %d".into()), Value::Int(1)]).is_err());
        assert!(builtin_format(&[Value::String("%d".into()), Value::Int(1), Value::Int(2)]).is_err());
    }

    #[test]
    fn test_index_and_slice() {
        let xs = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(builtin_index(&[xs.clone(), Value::Int(-1)]).unwrap(), Value::Int(3));
        assert_eq!(
            builtin_index(&[Value::String("abc".into()), Value::Int(1)]).unwrap(),
            Value::String("b".into())
        );
        assert_eq!(
            external(&builtin_slice(&[xs.clone(), Value::Int(1), Value::Int(3)]).unwrap()),
            "(2 3)"
        );
        assert_eq!(
            builtin_slice(&[Value::String("abcd".into()), Value::Int(0), Value::Int(-1)]).unwrap(),
            Value::String("abc".into())
        );
        // Out-of-range slices clamp instead of failing.
        assert_eq!(
            external(&builtin_slice(&[xs, Value::Int(2), Value::Int(100)]).unwrap()),
            "(3)"
        );
    }

    #[test]
    fn test_dict_set_and_del_mutate_in_place() {
        let xs = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        builtin_dict_set(&[xs.clone(), Value::Int(1), Value::Int(9)]).unwrap();
        assert_eq!(external(&xs), "(1 9 3)");
        builtin_del(&[xs.clone(), Value::Int(0)]).unwrap();
        assert_eq!(external(&xs), "(9 3)");
        assert!(builtin_del(&[xs, Value::Int(5)]).is_err());
    }

    #[test]
    fn test_apply_builtin_and_function() {
        crate::interp::globals();
        let plus = crate::interp::globals()
            .lookup(crate::symbol::Symbol::new("+"))
            .unwrap();
        let r = builtin_apply(&[plus, Value::list(vec![Value::Int(1), Value::Int(2)])]).unwrap();
        assert_eq!(r, Value::Int(3));

        let r = crate::interp::run("(apply (lambda (a b) (* a b)) '(6 7))").unwrap();
        assert_eq!(r, Value::Int(42));
    }
}
