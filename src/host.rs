// ABOUTME: Host method bridge backing the (.attr obj args...) notation

use crate::error::PsilError;
use crate::value::{values_equal, Value};

/// Dispatch host method `attr` on `receiver` with evaluated `args`.
/// Strings and sequences carry the usual host method sets; anything else
/// is an error.
pub fn call_attr(receiver: &Value, attr: &str, args: &[Value]) -> Result<Value, PsilError> {
    match receiver {
        Value::String(s) => string_attr(s, attr, args),
        Value::List(_) => list_attr(receiver, attr, args),
        other => Err(no_attribute(other, attr)),
    }
}

fn no_attribute(receiver: &Value, attr: &str) -> PsilError {
    PsilError::runtime_error(
        &format!(".{}", attr),
        format!("no attribute '{}' on {}", attr, receiver.type_name()),
    )
}

fn function_name(attr: &str) -> String {
    format!(".{}", attr)
}

fn expect_arity(attr: &str, args: &[Value], expected: usize) -> Result<(), PsilError> {
    if args.len() != expected {
        return Err(PsilError::arity_error(
            &function_name(attr),
            (expected + 1).to_string(),
            args.len() + 1,
        ));
    }
    Ok(())
}

fn expect_string<'a>(attr: &str, args: &'a [Value], i: usize) -> Result<&'a str, PsilError> {
    match &args[i] {
        Value::String(s) => Ok(s),
        other => Err(PsilError::type_error(
            &function_name(attr),
            "string",
            other,
            i + 2,
        )),
    }
}

fn string_attr(s: &str, attr: &str, args: &[Value]) -> Result<Value, PsilError> {
    match attr {
        "upper" => {
            expect_arity(attr, args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        "lower" => {
            expect_arity(attr, args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        "strip" => {
            expect_arity(attr, args, 0)?;
            Ok(Value::String(s.trim().to_string()))
        }
        "lstrip" => {
            expect_arity(attr, args, 0)?;
            Ok(Value::String(s.trim_start().to_string()))
        }
        "rstrip" => {
            expect_arity(attr, args, 0)?;
            Ok(Value::String(s.trim_end().to_string()))
        }
        "split" => {
            // With no separator, split on whitespace runs.
            let parts: Vec<Value> = if args.is_empty() {
                s.split_whitespace()
                    .map(|p| Value::String(p.to_string()))
                    .collect()
            } else {
                expect_arity(attr, args, 1)?;
                let sep = expect_string(attr, args, 0)?;
                s.split(sep).map(|p| Value::String(p.to_string())).collect()
            };
            Ok(Value::list(parts))
        }
        "join" => {
            expect_arity(attr, args, 1)?;
            let Value::List(items) = &args[0] else {
                return Err(PsilError::type_error(&function_name(attr), "list", &args[0], 2));
            };
            let mut parts = Vec::new();
            for (i, item) in items.borrow().iter().enumerate() {
                match item {
                    Value::String(p) => parts.push(p.clone()),
                    other => {
                        return Err(PsilError::type_error(
                            &function_name(attr),
                            "string",
                            other,
                            i + 2,
                        ));
                    }
                }
            }
            Ok(Value::String(parts.join(s)))
        }
        "replace" => {
            expect_arity(attr, args, 2)?;
            let from = expect_string(attr, args, 0)?;
            let to = expect_string(attr, args, 1)?;
            Ok(Value::String(s.replace(from, to)))
        }
        "startswith" => {
            expect_arity(attr, args, 1)?;
            Ok(Value::Bool(s.starts_with(expect_string(attr, args, 0)?)))
        }
        "endswith" => {
            expect_arity(attr, args, 1)?;
            Ok(Value::Bool(s.ends_with(expect_string(attr, args, 0)?)))
        }
        "find" => {
            expect_arity(attr, args, 1)?;
            let needle = expect_string(attr, args, 0)?;
            let index = s
                .find(needle)
                .map(|byte| s[..byte].chars().count() as i64)
                .unwrap_or(-1);
            Ok(Value::Int(index))
        }
        _ => Err(no_attribute(&Value::String(s.to_string()), attr)),
    }
}

fn list_attr(receiver: &Value, attr: &str, args: &[Value]) -> Result<Value, PsilError> {
    let Value::List(cell) = receiver else {
        return Err(no_attribute(receiver, attr));
    };
    match attr {
        "append" => {
            expect_arity(attr, args, 1)?;
            cell.borrow_mut().push(args[0].clone());
            Ok(Value::Nil)
        }
        "extend" => {
            expect_arity(attr, args, 1)?;
            let Value::List(other) = &args[0] else {
                return Err(PsilError::type_error(&function_name(attr), "list", &args[0], 2));
            };
            let extra: Vec<Value> = other.borrow().iter().cloned().collect();
            cell.borrow_mut().extend(extra);
            Ok(Value::Nil)
        }
        "insert" => {
            expect_arity(attr, args, 2)?;
            let Value::Int(i) = args[0] else {
                return Err(PsilError::type_error(&function_name(attr), "integer", &args[0], 2));
            };
            let mut items = cell.borrow_mut();
            let i = (i.max(0) as usize).min(items.len());
            items.insert(i, args[1].clone());
            Ok(Value::Nil)
        }
        "pop" => {
            let mut items = cell.borrow_mut();
            let i = match args {
                [] => items.len().checked_sub(1),
                [Value::Int(i)] => index_in(*i, items.len()),
                [other] => {
                    return Err(PsilError::type_error(
                        &function_name(attr),
                        "integer",
                        other,
                        2,
                    ));
                }
                _ => {
                    return Err(PsilError::arity_error(
                        &function_name(attr),
                        crate::error::ARITY_ONE_OR_TWO,
                        args.len() + 1,
                    ));
                }
            };
            match i {
                Some(i) => Ok(items.remove(i)),
                None => Err(PsilError::runtime_error(
                    &function_name(attr),
                    "index out of range",
                )),
            }
        }
        "index" => {
            expect_arity(attr, args, 1)?;
            let items = cell.borrow();
            match items.iter().position(|v| values_equal(v, &args[0])) {
                Some(i) => Ok(Value::Int(i as i64)),
                None => Err(PsilError::runtime_error(
                    &function_name(attr),
                    "value not in list",
                )),
            }
        }
        "count" => {
            expect_arity(attr, args, 1)?;
            let n = cell
                .borrow()
                .iter()
                .filter(|v| values_equal(v, &args[0]))
                .count();
            Ok(Value::Int(n as i64))
        }
        "remove" => {
            expect_arity(attr, args, 1)?;
            let mut items = cell.borrow_mut();
            match items.iter().position(|v| values_equal(v, &args[0])) {
                Some(i) => {
                    items.remove(i);
                    Ok(Value::Nil)
                }
                None => Err(PsilError::runtime_error(
                    &function_name(attr),
                    "value not in list",
                )),
            }
        }
        "reverse" => {
            expect_arity(attr, args, 0)?;
            cell.borrow_mut().reverse();
            Ok(Value::Nil)
        }
        "clear" => {
            expect_arity(attr, args, 0)?;
            cell.borrow_mut().clear();
            Ok(Value::Nil)
        }
        _ => Err(no_attribute(receiver, attr)),
    }
}

/// Resolve a possibly-negative index against `len`.
pub(crate) fn index_in(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if i < 0 { i + len } else { i };
    if i >= 0 && i < len {
        Some(i as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_methods() {
        let s = Value::String("  Hello World  ".into());
        assert_eq!(
            call_attr(&s, "strip", &[]).unwrap(),
            Value::String("Hello World".into())
        );
        assert_eq!(
            call_attr(&Value::String("abc".into()), "upper", &[]).unwrap(),
            Value::String("ABC".into())
        );
        assert_eq!(
            call_attr(
                &Value::String("a-b-c".into()),
                "split",
                &[Value::String("-".into())]
            )
            .unwrap(),
            Value::list(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into()),
            ])
        );
        assert_eq!(
            call_attr(&Value::String("abc".into()), "find", &[Value::String("c".into())]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            call_attr(&Value::String("abc".into()), "find", &[Value::String("z".into())]).unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn test_list_mutation_is_shared() {
        let xs = Value::list(vec![Value::Int(1)]);
        let alias = xs.clone();
        call_attr(&xs, "append", &[Value::Int(2)]).unwrap();
        assert_eq!(crate::printer::external(&alias), "(1 2)");

        let popped = call_attr(&xs, "pop", &[]).unwrap();
        assert_eq!(popped, Value::Int(2));
        assert_eq!(crate::printer::external(&alias), "(1)");
    }

    #[test]
    fn test_unknown_attribute_errors() {
        let result = call_attr(&Value::Int(1), "upper", &[]);
        assert!(matches!(result, Err(PsilError::Runtime { .. })));
        let result = call_attr(&Value::String("x".into()), "bogus", &[]);
        assert!(matches!(result, Err(PsilError::Runtime { .. })));
    }

    #[test]
    fn test_negative_index_resolution() {
        assert_eq!(index_in(-1, 3), Some(2));
        assert_eq!(index_in(0, 3), Some(0));
        assert_eq!(index_in(3, 3), None);
        assert_eq!(index_in(-4, 3), None);
    }
}
