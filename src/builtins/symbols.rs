//! Symbol operations: symbol?, symbol->string, string->symbol, gensym

use crate::error::{PsilError, ARITY_ONE};
use crate::scope::Scope;
use crate::symbol::Symbol;
use crate::value::Value;
use psil_macros::builtin;
use std::rc::Rc;

#[builtin(name = "symbol?", category = "Symbols", related(symbol->string, string->symbol))]
/// Tests whether the argument is a symbol.
///
/// # Examples
///
/// ```lisp
/// (symbol? 'a) => true
/// (symbol? "a") => false
/// ```
///
/// # See Also
///
/// symbol->string, string->symbol
pub fn builtin_symbol_q(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("symbol?", ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
}

#[builtin(name = "symbol->string", category = "Symbols", related(string->symbol))]
/// Returns the symbol's name as a string.
///
/// # Examples
///
/// ```lisp
/// (symbol->string 'abc) => "abc"
/// ```
///
/// # See Also
///
/// string->symbol
pub fn builtin_symbol_to_string(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("symbol->string", ARITY_ONE, args.len()));
    }
    match &args[0] {
        Value::Symbol(s) => Ok(Value::String(s.name().to_string())),
        other => Err(PsilError::type_error("symbol->string", "symbol", other, 1)),
    }
}

#[builtin(name = "string->symbol", category = "Symbols", related(symbol->string, gensym))]
/// Interns a string as a symbol. Equal strings always yield the same
/// symbol.
///
/// # Examples
///
/// ```lisp
/// (string->symbol "abc") => abc
/// (is (string->symbol "x") 'x) => true
/// ```
///
/// # See Also
///
/// symbol->string, gensym
pub fn builtin_string_to_symbol(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("string->symbol", ARITY_ONE, args.len()));
    }
    match &args[0] {
        Value::String(s) => Ok(Value::Symbol(Symbol::new(s))),
        other => Err(PsilError::type_error("string->symbol", "string", other, 1)),
    }
}

#[builtin(name = "gensym", category = "Symbols", related(string->symbol))]
/// Returns a fresh symbol no reader token can collide with. Macros use it
/// for bindings that must not capture user names.
///
/// # Examples
///
/// ```lisp
/// (gensym) => _g_1
/// ```
///
/// # See Also
///
/// string->symbol
pub fn builtin_gensym(args: &[Value]) -> Result<Value, PsilError> {
    if !args.is_empty() {
        return Err(PsilError::arity_error("gensym", "0", args.len()));
    }
    Ok(Value::Symbol(Symbol::gensym()))
}

/// Register all symbol builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    register_builtin_symbol_q(scope);
    register_builtin_symbol_to_string(scope);
    register_builtin_string_to_symbol(scope);
    register_builtin_gensym(scope);
}
