//! Documentation builtins: help, doc
//!
//! `(help)` lists everything the registry knows, grouped by category;
//! `(doc name)` prints one entry in full.

use crate::error::{PsilError, ARITY_ONE};
use crate::help;
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

/// Prints every documented name, grouped by category. Returns nil.
pub fn builtin_help(args: &[Value]) -> Result<Value, PsilError> {
    if !args.is_empty() {
        return Err(PsilError::arity_error("help", "0", args.len()));
    }
    for (category, entries) in help::all_by_category() {
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        println!("{}: {}", category, names.join(" "));
    }
    println!("Use (doc 'name) for details on one entry.");
    Ok(Value::Nil)
}

/// Prints the full entry for one name. Accepts a symbol or string.
pub fn builtin_doc(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("doc", ARITY_ONE, args.len()));
    }
    let name = match &args[0] {
        Value::Symbol(s) => s.name().to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(PsilError::type_error("doc", "symbol or string", other, 1));
        }
    };
    match help::get_help(&name) {
        Some(entry) => {
            println!("{} — {}", entry.signature, entry.category);
            println!("  {}", entry.description);
            for example in &entry.examples {
                println!("  {}", example);
            }
            if !entry.related.is_empty() {
                println!("  see also: {}", entry.related.join(", "));
            }
        }
        None => println!("no documentation for {}", name),
    }
    Ok(Value::Nil)
}

/// Register the documentation builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    super::bind(scope, "help", builtin_help);
    super::bind(scope, "doc", builtin_doc);
}
