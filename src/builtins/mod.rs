//! # Built-in Functions Module
//!
//! The host library surface pre-bound in the root scope, organized by
//! category:
//!
//! - **[arithmetic]**: + - * / // ** % << >> & | ^ ~
//! - **[comparison]**: < > <= >= == != is is-not in not-in not
//! - **[lists]**: list, cons, the car/cdr family, append, set-car!, ...
//! - **[symbols]**: symbol?, symbol->string, string->symbol, gensym
//! - **[console]**: print, display
//! - **[misc]**: apply, concat, format, index, slice, dict-set, del,
//!   include, the macroexpand family
//! - **[help_builtins]**: help, doc
//!
//! Each category is a sub-module with a register function that binds the
//! functions and their help entries.

use crate::scope::Scope;
use crate::symbol::Symbol;
use crate::value::{Builtin, BuiltinFn, Value};
use std::rc::Rc;

pub mod arithmetic;
pub mod comparison;
pub mod console;
#[path = "help.rs"]
pub mod help_builtins;
pub mod lists;
pub mod misc;
pub mod symbols;

// Re-export for convenience
pub use arithmetic::register as register_arithmetic;
pub use comparison::register as register_comparison;
pub use console::register as register_console;
pub use help_builtins::register as register_help;
pub use lists::register as register_lists;
pub use misc::register as register_misc;
pub use symbols::register as register_symbols;

/// Bind a named host callable in `scope`.
pub(crate) fn bind(scope: &Rc<Scope>, name: &'static str, func: BuiltinFn) {
    scope.define(Symbol::new(name), Value::Builtin(Builtin { name, func }));
}

/// Register the whole builtin library plus the root constants.
pub fn register_builtins(scope: &Rc<Scope>) {
    register_arithmetic(scope);
    register_comparison(scope);
    register_lists(scope);
    register_symbols(scope);
    register_console(scope);
    register_misc(scope);
    register_help(scope);
    crate::help::register_special_forms();

    // Root constants. The original leaned on the host's builtin namespace
    // for its boolean names; here they are ordinary root bindings.
    scope.define(Symbol::new("true"), Value::Bool(true));
    scope.define(Symbol::new("false"), Value::Bool(false));
    scope.define(Symbol::new("nil"), Value::Nil);
}
