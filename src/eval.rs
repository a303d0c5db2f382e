// ABOUTME: Evaluator: special forms, quasiquote, and the tail-call trampoline

use crate::error::{PsilError, ARITY_ONE, ARITY_TWO, ARITY_TWO_OR_THREE};
use crate::host;
use crate::printer::external;
use crate::scope::Scope;
use crate::symbol::Symbol;
use crate::value::{Function, Params, Value};
use std::rc::Rc;

/// The trampoline sentinel: a resolved callable plus already-evaluated
/// arguments, raised instead of recursing when a call happens in tail
/// position.
#[derive(Debug, Clone)]
pub struct TailCall {
    pub func: Value,
    pub args: Vec<Value>,
}

impl TailCall {
    /// Re-enter the callable in tail mode; may surface the next bounce.
    pub fn invoke(self) -> Result<Value, PsilError> {
        match self.func {
            Value::Function(f) => f.apply(self.args, true),
            Value::Builtin(b) => (b.func)(&self.args),
            other => Err(PsilError::NotCallable(external(&other))),
        }
    }
}

/// Evaluate `form` in `scope`. With `tail` set, a call in tail position
/// surfaces as `PsilError::TailCall` for the caller's trampoline; without
/// it, this frame bounces tail calls itself. Any other error unwinding
/// through here prints a one-line `* <form>` diagnostic first.
pub fn eval(form: &Value, scope: &Rc<Scope>, tail: bool) -> Result<Value, PsilError> {
    match eval_form(form, scope, tail) {
        Err(PsilError::TailCall(call)) if !tail => {
            let mut call = call;
            loop {
                match call.invoke() {
                    Err(PsilError::TailCall(next)) => call = next,
                    other => return other,
                }
            }
        }
        Err(PsilError::TailCall(call)) => Err(PsilError::TailCall(call)),
        Err(e) => {
            eprintln!("* {}", external(form));
            Err(e)
        }
        ok => ok,
    }
}

/// Evaluate a form at the outermost (non-tail) level, running the
/// trampoline that turns chains of tail calls into iteration. This is the
/// entry point the pipeline and REPL use.
pub fn eval_toplevel(form: &Value, scope: &Rc<Scope>) -> Result<Value, PsilError> {
    match eval(form, scope, true) {
        Err(PsilError::TailCall(call)) => {
            let mut call = call;
            loop {
                match call.invoke() {
                    Err(PsilError::TailCall(next)) => call = next,
                    other => return other,
                }
            }
        }
        other => other,
    }
}

fn eval_form(form: &Value, scope: &Rc<Scope>, tail: bool) -> Result<Value, PsilError> {
    match form {
        Value::List(cell) => {
            // Work on a snapshot so evaluation survives a body that
            // mutates the sequence it came from.
            let items = cell.borrow().clone();
            if items.is_empty() {
                return Ok(form.clone());
            }

            if let Value::Symbol(head) = &items[0] {
                let head = *head;
                if head == Symbol::DEFINE {
                    return eval_define(&items[1..], scope);
                }
                if head == Symbol::DEFMACRO {
                    return eval_defmacro(&items[1..], scope);
                }
                if head == Symbol::IF {
                    return eval_if(&items[1..], scope, tail);
                }
                if head == Symbol::LAMBDA {
                    return eval_lambda(&items[1..], scope);
                }
                if head == Symbol::QUASIQUOTE {
                    if items.len() != 2 {
                        return Err(PsilError::arity_error("quasiquote", ARITY_ONE, items.len() - 1));
                    }
                    return quasiquote(&items[1], 1, scope);
                }
                if head == Symbol::QUOTE {
                    if items.len() != 2 {
                        return Err(PsilError::arity_error("quote", ARITY_ONE, items.len() - 1));
                    }
                    return Ok(items[1].clone());
                }
                if head == Symbol::SET {
                    return eval_set(&items[1..], scope);
                }
                let name = head.name();
                if let Some(attr) = name.strip_prefix('.') {
                    if !attr.is_empty() {
                        return eval_attr_call(attr, &items[1..], scope);
                    }
                }
            }

            let func = eval(&items[0], scope, false)?;
            if let Value::Macro(m) = &func {
                // Expansion must have replaced macro calls before evaluation.
                return Err(PsilError::runtime_error(
                    "eval",
                    format!("unexpected macro call: {}", m.name),
                ));
            }
            let mut args = Vec::with_capacity(items.len() - 1);
            for arg in &items[1..] {
                args.push(eval(arg, scope, false)?);
            }
            if tail {
                return Err(PsilError::TailCall(Box::new(TailCall { func, args })));
            }
            match func {
                Value::Function(f) => f.apply(args, false),
                Value::Builtin(b) => (b.func)(&args),
                other => Err(PsilError::NotCallable(external(&other))),
            }
        }

        Value::Symbol(sym) => {
            if sym.is_keyword() {
                return Ok(form.clone());
            }
            scope
                .lookup(*sym)
                .ok_or_else(|| PsilError::UndefinedSymbol(sym.to_string()))
        }

        // Atoms evaluate to themselves.
        _ => Ok(form.clone()),
    }
}

/// `(define name value)` and the `(define (name params...) body...)` sugar.
/// Both return the defined value.
fn eval_define(args: &[Value], scope: &Rc<Scope>) -> Result<Value, PsilError> {
    if args.len() < 2 {
        return Err(PsilError::arity_error("define", "at least 2", args.len()));
    }
    match &args[0] {
        Value::Symbol(name) => {
            if args.len() != 2 {
                return Err(PsilError::arity_error("define", ARITY_TWO, args.len()));
            }
            let value = eval(&args[1], scope, false)?;
            Ok(scope.define(*name, value))
        }
        Value::List(sig) => {
            let sig = sig.borrow().clone();
            let Some(Value::Symbol(name)) = sig.first() else {
                return Err(PsilError::runtime_error(
                    "define",
                    "function name must be a symbol",
                ));
            };
            let params = Params::from_slice(&sig[1..])?;
            let function = Function::new(
                name.name().to_string(),
                params,
                args[1..].to_vec(),
                scope.clone(),
            );
            Ok(scope.define(*name, Value::Function(Rc::new(function))))
        }
        other => Err(PsilError::runtime_error(
            "define",
            format!("first argument must be a symbol or list, got {}", other.type_name()),
        )),
    }
}

/// `(defmacro name params body...)` — same shape as a function, different
/// tag; only the expander may apply it.
fn eval_defmacro(args: &[Value], scope: &Rc<Scope>) -> Result<Value, PsilError> {
    if args.len() < 2 {
        return Err(PsilError::arity_error("defmacro", "at least 2", args.len()));
    }
    let Value::Symbol(name) = &args[0] else {
        return Err(PsilError::runtime_error("defmacro", "name must be a symbol"));
    };
    let params = Params::parse(&args[1])?;
    let function = Function::new(
        name.name().to_string(),
        params,
        args[2..].to_vec(),
        scope.clone(),
    );
    Ok(scope.define(*name, Value::Macro(Rc::new(function))))
}

/// Both arms of `if` are in tail position; the condition is not.
fn eval_if(args: &[Value], scope: &Rc<Scope>, tail: bool) -> Result<Value, PsilError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(PsilError::arity_error("if", ARITY_TWO_OR_THREE, args.len()));
    }
    let condition = eval(&args[0], scope, false)?;
    if condition.is_truthy() {
        eval(&args[1], scope, tail)
    } else if args.len() == 3 {
        eval(&args[2], scope, tail)
    } else {
        Ok(Value::Nil)
    }
}

/// `(lambda params body...)` closes over the current scope. An empty body
/// is legal and yields nil when applied.
fn eval_lambda(args: &[Value], scope: &Rc<Scope>) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error("lambda", "at least 1", 0));
    }
    let params = Params::parse(&args[0])?;
    let function = Function::new("lambda", params, args[1..].to_vec(), scope.clone());
    Ok(Value::Function(Rc::new(function)))
}

/// `(set! name value)` assigns to the nearest existing binding.
fn eval_set(args: &[Value], scope: &Rc<Scope>) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("set!", ARITY_TWO, args.len()));
    }
    let Value::Symbol(name) = &args[0] else {
        return Err(PsilError::SetNotSymbol(external(&args[0])));
    };
    let value = eval(&args[1], scope, false)?;
    scope.set(*name, value.clone())?;
    Ok(value)
}

/// `(.attr obj args...)` — evaluate the receiver and dispatch a host
/// method on it.
fn eval_attr_call(attr: &str, args: &[Value], scope: &Rc<Scope>) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error(
            &format!(".{}", attr),
            "at least 1",
            0,
        ));
    }
    let receiver = eval(&args[0], scope, false)?;
    let mut rest = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        rest.push(eval(arg, scope, false)?);
    }
    host::call_attr(&receiver, attr, &rest)
}

/// Quasiquote walk. `depth` starts at 1; unquotes fire only at depth 1,
/// deeper occurrences are preserved with the depth decremented.
fn quasiquote(arg: &Value, depth: usize, scope: &Rc<Scope>) -> Result<Value, PsilError> {
    let Value::List(cell) = arg else {
        return Ok(arg.clone());
    };
    let items = cell.borrow().clone();

    if items.len() == 2 {
        if let Value::Symbol(head) = &items[0] {
            let head = *head;
            if head == Symbol::QUASIQUOTE {
                let inner = quasiquote(&items[1], depth + 1, scope)?;
                return Ok(Value::list(vec![items[0].clone(), inner]));
            }
            if head == Symbol::UNQUOTE {
                if depth == 1 {
                    return eval(&items[1], scope, false);
                }
                let inner = quasiquote(&items[1], depth - 1, scope)?;
                return Ok(Value::list(vec![items[0].clone(), inner]));
            }
        }
    }

    let mut out = Vec::with_capacity(items.len());
    for item in &items {
        match splice_parts(item) {
            Some((head, inner)) => {
                if depth == 1 {
                    match eval(&inner, scope, false)? {
                        Value::List(spliced) => out.extend(spliced.borrow().iter().cloned()),
                        other => {
                            return Err(PsilError::runtime_error(
                                "unquote-splicing",
                                format!("requires a list, got {}", other.type_name()),
                            ));
                        }
                    }
                } else {
                    let walked = quasiquote(&inner, depth - 1, scope)?;
                    out.push(Value::list(vec![head, walked]));
                }
            }
            None => out.push(quasiquote(item, depth, scope)?),
        }
    }
    Ok(Value::list(out))
}

/// `(unquote-splicing x)` as a sequence element.
fn splice_parts(item: &Value) -> Option<(Value, Value)> {
    if let Value::List(cell) = item {
        let items = cell.borrow();
        if items.len() == 2 {
            if let Value::Symbol(head) = &items[0] {
                if *head == Symbol::UNQUOTE_SPLICING {
                    return Some((items[0].clone(), items[1].clone()));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read;

    /// Fresh scope with the builtin library bound, the way the pipeline
    /// sets one up.
    fn setup() -> Rc<Scope> {
        let scope = Scope::root();
        crate::builtins::register_builtins(&scope);
        scope
    }

    fn ev(source: &str, scope: &Rc<Scope>) -> Result<Value, PsilError> {
        eval_toplevel(&read(source).unwrap(), scope)
    }

    fn ev_ok(source: &str, scope: &Rc<Scope>) -> Value {
        ev(source, scope).unwrap()
    }

    #[test]
    fn test_atoms_self_evaluate() {
        let scope = setup();
        assert_eq!(ev_ok("42", &scope), Value::Int(42));
        assert_eq!(ev_ok("2.5", &scope), Value::Float(2.5));
        assert_eq!(ev_ok("\"hi\"", &scope), Value::String("hi".into()));
    }

    #[test]
    fn test_keyword_symbols_self_evaluate() {
        let scope = setup();
        assert_eq!(ev_ok(":key", &scope), Value::Symbol(Symbol::new(":key")));
    }

    #[test]
    fn test_empty_sequence_evaluates_to_itself() {
        let scope = setup();
        match ev_ok("()", &scope) {
            Value::List(items) => assert!(items.borrow().is_empty()),
            other => panic!("expected empty sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_symbol_lookup_and_undefined() {
        let scope = setup();
        ev_ok("(define x 42)", &scope);
        assert_eq!(ev_ok("x", &scope), Value::Int(42));
        assert!(matches!(
            ev("missing", &scope),
            Err(PsilError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn test_define_returns_the_value() {
        let scope = setup();
        assert_eq!(ev_ok("(define x 7)", &scope), Value::Int(7));
    }

    #[test]
    fn test_define_function_sugar() {
        let scope = setup();
        ev_ok("(define (square x) (* x x))", &scope);
        assert_eq!(ev_ok("(square 7)", &scope), Value::Int(49));
        match scope.lookup(Symbol::new("square")) {
            Some(Value::Function(f)) => assert_eq!(f.name, "square"),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_application() {
        let scope = setup();
        assert_eq!(ev_ok("((lambda (x) (* x x)) 7)", &scope), Value::Int(49));
    }

    #[test]
    fn test_closure_captures_defining_scope() {
        let scope = setup();
        ev_ok("(define (make-adder n) (lambda (x) (+ x n)))", &scope);
        ev_ok("(define add5 (make-adder 5))", &scope);
        assert_eq!(ev_ok("(add5 10)", &scope), Value::Int(15));
    }

    #[test]
    fn test_if_branches_and_truthiness() {
        let scope = setup();
        assert_eq!(ev_ok("(if true 1 2)", &scope), Value::Int(1));
        assert_eq!(ev_ok("(if false 1 2)", &scope), Value::Int(2));
        assert_eq!(ev_ok("(if nil 1 2)", &scope), Value::Int(2));
        assert_eq!(ev_ok("(if 0 1 2)", &scope), Value::Int(2));
        assert_eq!(ev_ok("(if '() 1 2)", &scope), Value::Int(2));
        assert_eq!(ev_ok("(if \"\" 1 2)", &scope), Value::Int(1));
        assert_eq!(ev_ok("(if false 1)", &scope), Value::Nil);
    }

    #[test]
    fn test_quote_returns_form_unchanged() {
        let scope = setup();
        assert_eq!(external(&ev_ok("'(a b (c 1))", &scope)), "(a b (c 1))");
        assert_eq!(ev_ok("'x", &scope), Value::Symbol(Symbol::new("x")));
    }

    #[test]
    fn test_set_updates_nearest_binding() {
        let scope = setup();
        ev_ok("(define x 1)", &scope);
        ev_ok("(define (bump) (set! x (+ x 1)))", &scope);
        ev_ok("(bump)", &scope);
        assert_eq!(ev_ok("x", &scope), Value::Int(2));
    }

    #[test]
    fn test_set_requires_symbol_target() {
        let scope = setup();
        assert!(matches!(
            ev("(set! 42 1)", &scope),
            Err(PsilError::SetNotSymbol(_))
        ));
    }

    #[test]
    fn test_set_of_unbound_name_errors() {
        let scope = setup();
        assert!(matches!(
            ev("(set! nowhere 1)", &scope),
            Err(PsilError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn test_not_callable() {
        let scope = setup();
        assert!(matches!(
            ev("(42 1 2)", &scope),
            Err(PsilError::NotCallable(_))
        ));
    }

    #[test]
    fn test_whole_list_params() {
        let scope = setup();
        assert_eq!(external(&ev_ok("((lambda args args) 1 2 3)", &scope)), "(1 2 3)");
    }

    #[test]
    fn test_rest_params() {
        let scope = setup();
        assert_eq!(
            external(&ev_ok("((lambda (a . rest) rest) 1 2 3)", &scope)),
            "(2 3)"
        );
        assert_eq!(
            external(&ev_ok("((lambda (a . rest) rest) 1)", &scope)),
            "()"
        );
    }

    #[test]
    fn test_optional_params_default_to_nil() {
        let scope = setup();
        assert_eq!(
            external(&ev_ok("((lambda (a (o b)) (list a b)) 1)", &scope)),
            "(1 nil)"
        );
        assert_eq!(
            external(&ev_ok("((lambda (a (o b)) (list a b)) 1 2)", &scope)),
            "(1 2)"
        );
    }

    #[test]
    fn test_arity_errors() {
        let scope = setup();
        assert!(matches!(
            ev("((lambda (x) x) 1 2)", &scope),
            Err(PsilError::Arity { .. })
        ));
        assert!(matches!(
            ev("((lambda (x y) x) 1)", &scope),
            Err(PsilError::Arity { .. })
        ));
    }

    #[test]
    fn test_tail_recursion_does_not_grow_the_stack() {
        let scope = setup();
        ev_ok(
            "(define (sum-to n acc) (if (== n 0) acc (sum-to (- n 1) (+ acc n))))",
            &scope,
        );
        assert_eq!(ev_ok("(sum-to 10000 0)", &scope), Value::Int(50_005_000));
    }

    #[test]
    fn test_mutual_tail_recursion() {
        let scope = setup();
        ev_ok("(define (even? n) (if (== n 0) true (odd? (- n 1))))", &scope);
        ev_ok("(define (odd? n) (if (== n 0) false (even? (- n 1))))", &scope);
        assert_eq!(ev_ok("(even? 10001)", &scope), Value::Bool(false));
    }

    #[test]
    fn test_non_tail_recursion_still_works() {
        let scope = setup();
        ev_ok(
            "(define (fact n) (if (== n 0) 1 (* n (fact (- n 1)))))",
            &scope,
        );
        assert_eq!(ev_ok("(fact 6)", &scope), Value::Int(720));
    }

    #[test]
    fn test_quasiquote_without_unquotes() {
        let scope = setup();
        assert_eq!(external(&ev_ok("`(1 2 3)", &scope)), "(1 2 3)");
    }

    #[test]
    fn test_quasiquote_unquote() {
        let scope = setup();
        ev_ok("(define x 42)", &scope);
        assert_eq!(external(&ev_ok("`(1 ,x 3)", &scope)), "(1 42 3)");
    }

    #[test]
    fn test_quasiquote_splicing() {
        let scope = setup();
        assert_eq!(
            external(&ev_ok("`(a ,(+ 1 2) ,@(list 3 4) b)", &scope)),
            "(a 3 3 4 b)"
        );
    }

    #[test]
    fn test_quasiquote_splicing_requires_sequence() {
        let scope = setup();
        assert!(matches!(
            ev("`(a ,@1)", &scope),
            Err(PsilError::Runtime { .. })
        ));
    }

    #[test]
    fn test_nested_quasiquote_depth() {
        let scope = setup();
        ev_ok("(define x 42)", &scope);
        // Only the doubled unquote fires; the inner template survives.
        assert_eq!(
            external(&ev_ok("`(a `(b ,(+ 1 2) ,,x))", &scope)),
            "(a `(b ,(+ 1 2) ,42))"
        );
    }

    #[test]
    fn test_defmacro_value_is_tagged_macro() {
        let scope = setup();
        ev_ok("(defmacro noop (x) x)", &scope);
        assert!(matches!(
            scope.lookup(Symbol::new("noop")),
            Some(Value::Macro(_))
        ));
    }

    #[test]
    fn test_macro_reaching_evaluation_is_an_error() {
        let scope = setup();
        ev_ok("(defmacro noop (x) x)", &scope);
        // Applied without a macro-expansion pass first.
        assert!(matches!(ev("(noop 1)", &scope), Err(PsilError::Runtime { .. })));
    }

    #[test]
    fn test_attr_call_dispatches_host_method() {
        let scope = setup();
        assert_eq!(ev_ok("(.upper \"abc\")", &scope), Value::String("ABC".into()));
        ev_ok("(define xs (list 1 2))", &scope);
        ev_ok("(.append xs 3)", &scope);
        assert_eq!(external(&ev_ok("xs", &scope)), "(1 2 3)");
    }
}
