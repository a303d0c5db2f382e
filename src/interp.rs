// ABOUTME: Interpreter pipeline: root scope bootstrap, read-expand-eval loop

use crate::error::PsilError;
use crate::eval::eval_toplevel;
use crate::expand::macroexpand_r;
use crate::printer::external;
use crate::reader::{parse, Tokens};
use crate::scope::{GlobalsTable, Scope};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// The standard macro bundle installed at startup: begin, when, let, let*,
/// and, or, cond, for-each, import, comment (plus the map helper they use).
pub const STDMACROS: &str = include_str!("stdmacros.psil");

thread_local! {
    static GLOBALS: RefCell<Option<Rc<Scope>>> = const { RefCell::new(None) };
}

/// The root scope. Created on first use: the builtin library is bound and
/// the standard macro bundle is run through the interpreter. Lives for the
/// rest of the thread.
pub fn globals() -> Rc<Scope> {
    if let Some(scope) = GLOBALS.with(|g| g.borrow().clone()) {
        return scope;
    }
    let root = Scope::root();
    crate::builtins::register_builtins(&root);
    // Publish before running the bundle; the macro bodies resolve against
    // the root scope as they are defined.
    GLOBALS.with(|g| *g.borrow_mut() = Some(root.clone()));
    if let Err(e) = run(STDMACROS) {
        eprintln!("*** failed to load standard macros: {}", e);
    }
    root
}

/// Run a source string: read one form at a time, macro-expand it, and
/// evaluate it in the root scope under the trampoline. Returns the value
/// of the last form, or nil for empty input.
pub fn run(source: &str) -> Result<Value, PsilError> {
    let scope = globals();
    let mut tokens = Tokens::new(source);
    let mut result = Value::Nil;
    while let Some(form) = parse(&mut tokens)? {
        let form = macroexpand_r(&form, 0, false)?;
        if matches!(form, Value::Nil) {
            // A top-level form may expand to nothing at all.
            continue;
        }
        result = eval_toplevel(&form, &scope)?;
    }
    Ok(result)
}

/// Like [`run`], with a host-supplied fallback table installed on the root
/// scope for the duration of the program. Lookups that miss every scope
/// binding consult the table; writes never touch it.
pub fn run_with_globals(
    source: &str,
    table: Option<GlobalsTable>,
) -> Result<Value, PsilError> {
    globals().setglobals(table);
    run(source)
}

/// Read-eval-print for one input: evaluates and prints the external form
/// of the result unless it is nil.
pub fn rep(source: &str) -> Result<(), PsilError> {
    let result = run(source)?;
    if !matches!(result, Value::Nil) {
        println!("{}", external(&result));
    }
    Ok(())
}

/// Load and run a source file. A leading `#!` line is stripped so scripts
/// can be executable.
pub fn include(path: &str) -> Result<Value, PsilError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PsilError::runtime_error("include", format!("cannot read {}: {}", path, e)))?;
    let text = strip_shebang(&text);
    run(text)
}

fn strip_shebang(text: &str) -> &str {
    if text.starts_with("#!") {
        match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        }
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_returns_last_value() {
        assert_eq!(run("1 2 3").unwrap(), Value::Int(3));
        assert_eq!(run("").unwrap(), Value::Nil);
        assert_eq!(run("; only a comment").unwrap(), Value::Nil);
    }

    #[test]
    fn test_run_threads_definitions_across_forms() {
        assert_eq!(
            run("(define (twice x) (* 2 x)) (twice 21)").unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_standard_macros_are_loaded() {
        assert_eq!(run("(let ((x 1) (y 2)) (+ x y))").unwrap(), Value::Int(3));
        assert_eq!(
            run("(cond ((== 1 2) 'a) ((== 2 2) 'b) (else 'c))").unwrap(),
            Value::Symbol(crate::symbol::Symbol::new("b"))
        );
    }

    #[test]
    fn test_macro_defined_then_used_in_one_source() {
        assert_eq!(
            run("(defmacro unless (c . body) `(if ,c nil (begin ,@body))) (unless false 7)")
                .unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_globals_fallback_is_visible_to_programs() {
        use crate::symbol::Symbol;
        let mut table = GlobalsTable::new();
        table.insert(Symbol::new("host-answer"), Value::Int(42));
        assert_eq!(
            run_with_globals("(+ host-answer 1)", Some(table)).unwrap(),
            Value::Int(43)
        );
        // Clean up for other tests on this thread.
        globals().setglobals(None);
        assert!(run("host-answer").is_err());
    }

    #[test]
    fn test_deep_tail_recursion_through_the_pipeline() {
        assert_eq!(
            run("(define (loop n) (if (== n 0) 'done (loop (- n 1)))) (loop 100000)").unwrap(),
            Value::Symbol(crate::symbol::Symbol::new("done"))
        );
    }

    #[test]
    fn test_strip_shebang() {
        assert_eq!(strip_shebang("#!/usr/bin/psil\n(+ 1 2)"), "(+ 1 2)");
        assert_eq!(strip_shebang("(+ 1 2)"), "(+ 1 2)");
        assert_eq!(strip_shebang("#!psil"), "");
    }
}
