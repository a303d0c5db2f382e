//! Console output: print, display
//!
//! `print` writes its arguments space-separated with a trailing newline;
//! `display` writes them without one. Strings print raw, everything else
//! in its external form. Both return nil.

use crate::error::PsilError;
use crate::help::{register_help, HelpEntry};
use crate::scope::Scope;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

fn render(args: &[Value]) -> String {
    args.iter()
        .map(|v| v.to_display_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prints values to stdout with a trailing newline. Returns nil.
pub fn builtin_print(args: &[Value]) -> Result<Value, PsilError> {
    println!("{}", render(args));
    Ok(Value::Nil)
}

/// Prints values to stdout without a newline. Returns nil.
pub fn builtin_display(args: &[Value]) -> Result<Value, PsilError> {
    print!("{}", render(args));
    let _ = std::io::stdout().flush();
    Ok(Value::Nil)
}

/// Register the console builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    super::bind(scope, "print", builtin_print);
    super::bind(scope, "display", builtin_display);

    register_help(HelpEntry {
        name: "print".to_string(),
        signature: "(print ...)".to_string(),
        description: "Writes the arguments space-separated with a trailing newline. Strings print raw.".to_string(),
        examples: vec!["(print \"x is\" 42)".to_string()],
        related: vec!["display".to_string(), "format".to_string()],
        category: "Console".to_string(),
    });

    register_help(HelpEntry {
        name: "display".to_string(),
        signature: "(display ...)".to_string(),
        description: "Like print, without the trailing newline.".to_string(),
        examples: vec!["(display \"> \")".to_string()],
        related: vec!["print".to_string()],
        category: "Console".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_strings_raw_and_values_external() {
        let line = render(&[
            Value::String("x is".into()),
            Value::Int(42),
            Value::list(vec![Value::Int(1)]),
        ]);
        assert_eq!(line, "x is 42 (1)");
    }

    #[test]
    fn test_print_returns_nil() {
        assert_eq!(builtin_print(&[]).unwrap(), Value::Nil);
    }
}
