// ABOUTME: Whole-program macro expansion with quote protection and depth tracking

use crate::error::PsilError;
use crate::interp::globals;
use crate::symbol::Symbol;
use crate::value::Value;

/// If `form` is a call whose head symbol resolves in the root scope to a
/// macro, apply the macro to the unevaluated argument forms; repeat until
/// the head is no longer a macro, or once when `once` is set.
pub fn macroexpand(form: &Value, once: bool) -> Result<Value, PsilError> {
    let mut p = form.clone();
    loop {
        let Value::List(cell) = &p else { break };
        let items = cell.borrow().clone();
        let Some(Value::Symbol(head)) = items.first() else {
            break;
        };
        let Some(Value::Macro(m)) = globals().lookup(*head) else {
            break;
        };
        p = m.call(items[1..].to_vec())?;
        if once {
            break;
        }
    }
    Ok(p)
}

/// Recursively expand every macro call in `form`. `quote` bodies are
/// traversed but never expanded; quasiquote adjusts `depth` so only code
/// at depth zero expands; lambda parameter lists are left alone. Children
/// that expand to nil (a macro may legitimately expand to nothing) are
/// dropped from their sequence.
pub fn macroexpand_r(form: &Value, depth: i32, quoted: bool) -> Result<Value, PsilError> {
    if !matches!(form, Value::List(_)) {
        return Ok(form.clone());
    }

    let mut p = form.clone();
    if let Value::List(cell) = &p {
        let items = cell.borrow().clone();
        if let Some(Value::Symbol(head)) = items.first() {
            let head = *head;
            if head == Symbol::LAMBDA {
                // The parameter list is binding structure, not code.
                let mut out: Vec<Value> = items.iter().take(2).cloned().collect();
                for x in items.iter().skip(2) {
                    let expanded = macroexpand_r(x, depth, quoted)?;
                    if !matches!(expanded, Value::Nil) {
                        out.push(expanded);
                    }
                }
                return Ok(Value::list(out));
            }
            if head == Symbol::QUOTE && items.len() == 2 {
                let inner = macroexpand_r(&items[1], depth, true)?;
                return Ok(Value::list(vec![items[0].clone(), inner]));
            }
            if head == Symbol::QUASIQUOTE && items.len() == 2 {
                let inner = macroexpand_r(&items[1], depth + 1, quoted)?;
                return Ok(Value::list(vec![items[0].clone(), inner]));
            }
            if (head == Symbol::UNQUOTE || head == Symbol::UNQUOTE_SPLICING) && items.len() == 2 {
                if depth <= 0 {
                    return Err(PsilError::UnquoteDepth);
                }
                let inner = macroexpand_r(&items[1], depth - 1, false)?;
                return Ok(Value::list(vec![items[0].clone(), inner]));
            }
            if depth == 0 && !quoted {
                p = macroexpand(&p, false)?;
                if !matches!(p, Value::List(_)) {
                    return Ok(p);
                }
            }
        }
    }

    if quoted {
        return Ok(p);
    }
    let Value::List(cell) = &p else {
        return Ok(p);
    };
    let items = cell.borrow().clone();
    let mut out = Vec::with_capacity(items.len());
    for x in &items {
        let expanded = macroexpand_r(x, depth, quoted)?;
        if !matches!(expanded, Value::Nil) {
            out.push(expanded);
        }
    }
    Ok(Value::list(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::run;
    use crate::printer::external;
    use crate::reader::read;

    fn expand(source: &str) -> String {
        // Touch the root scope first so the standard macros are loaded.
        globals();
        external(&macroexpand_r(&read(source).unwrap(), 0, false).unwrap())
    }

    #[test]
    fn test_expansion_is_identity_without_macros() {
        for source in ["(foo bar)", "42", "x", "(f (g 1) \"s\")"] {
            assert_eq!(expand(source), source);
        }
    }

    #[test]
    fn test_expansion_is_idempotent() {
        globals();
        let once = macroexpand_r(&read("(when 1 (print 2))").unwrap(), 0, false).unwrap();
        let twice = macroexpand_r(&once, 0, false).unwrap();
        assert_eq!(external(&once), external(&twice));
    }

    #[test]
    fn test_and_expands_to_nested_ifs() {
        assert_eq!(expand("(and)"), "true");
        assert_eq!(expand("(and a b)"), "(if a (if b true false) false)");
    }

    #[test]
    fn test_quote_protects_subforms() {
        assert_eq!(expand("'(and a b)"), "'(and a b)");
        assert_eq!(expand("(quote (when x y))"), "'(when x y)");
    }

    #[test]
    fn test_lambda_parameter_list_is_protected() {
        // `and` as a parameter name must survive.
        assert_eq!(expand("(lambda (and) a)"), "(lambda (and) a)");
    }

    #[test]
    fn test_quasiquote_depth_gates_expansion() {
        // Inside the template nothing expands; inside the unquote it does.
        assert_eq!(expand("`(when ,(and) b)"), "`(when ,true b)");
    }

    #[test]
    fn test_unquote_at_depth_zero_is_an_error() {
        globals();
        let result = macroexpand_r(&read(",x").unwrap(), 0, false);
        assert!(matches!(result, Err(PsilError::UnquoteDepth)));
        let result = macroexpand_r(&read(",@x").unwrap(), 0, false);
        assert!(matches!(result, Err(PsilError::UnquoteDepth)));
    }

    #[test]
    fn test_children_expanding_to_nil_are_dropped() {
        assert_eq!(expand("(list (comment ignored) 1)"), "(list 1)");
    }

    #[test]
    fn test_macroexpand_once_stops_after_one_step() {
        globals();
        run("(defmacro twice-a () '(twice-b)) (defmacro twice-b () 42)").unwrap();
        let one = macroexpand(&read("(twice-a)").unwrap(), true).unwrap();
        assert_eq!(external(&one), "(twice-b)");
        let full = macroexpand(&read("(twice-a)").unwrap(), false).unwrap();
        assert_eq!(external(&full), "42");
    }

    #[test]
    fn test_macro_arguments_arrive_unevaluated() {
        globals();
        run("(defmacro first-form (a b) `',a)").unwrap();
        // (undefined-symbol) would fail if evaluated.
        assert_eq!(
            expand("(first-form (undefined-symbol) 2)"),
            "'(undefined-symbol)"
        );
    }
}
