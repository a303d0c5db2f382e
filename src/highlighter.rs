// ABOUTME: Syntax highlighter for the REPL with ANSI color support
// Implements rustyline's Highlighter trait, preserving display width

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;

// 3-bit/4-bit colors for maximum terminal compatibility
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_QUOTE: &str = "\x1b[1;33m"; // Bold yellow

/// The special-form and standard-macro names worth calling out visually.
const SPECIAL_FORMS: [&str; 19] = [
    "quote",
    "quasiquote",
    "unquote",
    "unquote-splicing",
    "define",
    "defmacro",
    "if",
    "lambda",
    "set!",
    "begin",
    "when",
    "let",
    "let*",
    "and",
    "or",
    "cond",
    "for-each",
    "import",
    "comment",
];

/// rustyline helper providing syntax-aware coloring for PSIL input.
pub struct PsilHelper;

impl PsilHelper {
    pub fn new() -> Self {
        PsilHelper
    }
}

impl Default for PsilHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for PsilHelper {}

impl Completer for PsilHelper {
    type Candidate = String;
}

impl Hinter for PsilHelper {
    type Hint = String;
}

impl Validator for PsilHelper {}

impl Highlighter for PsilHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn paint(out: &mut String, color: &str, text: &str) {
    out.push_str(color);
    out.push_str(text);
    out.push_str(COLOR_RESET);
}

fn highlight_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ';' => {
                // Comment to end of line.
                let rest: String = chars[i..].iter().collect();
                paint(&mut out, COLOR_COMMENT, &rest);
                break;
            }
            '"' => {
                let start = i;
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 2;
                    } else if chars[i] == '"' {
                        i += 1;
                        break;
                    } else {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                paint(&mut out, COLOR_STRING, &text);
            }
            '(' | ')' => {
                paint(&mut out, COLOR_PARENS, &chars[i].to_string());
                i += 1;
            }
            '\'' | '`' | ',' => {
                paint(&mut out, COLOR_QUOTE, &chars[i].to_string());
                i += 1;
            }
            c if c.is_whitespace() => {
                out.push(c);
                i += 1;
            }
            _ => {
                // A token: everything up to whitespace or a paren.
                let start = i;
                while i < chars.len()
                    && !chars[i].is_whitespace()
                    && chars[i] != '('
                    && chars[i] != ')'
                {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                if SPECIAL_FORMS.contains(&token.as_str()) {
                    paint(&mut out, COLOR_SPECIAL_FORM, &token);
                } else if looks_numeric(&token) {
                    paint(&mut out, COLOR_NUMBER, &token);
                } else {
                    out.push_str(&token);
                }
            }
        }
    }
    out
}

fn looks_numeric(token: &str) -> bool {
    let body = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);
    body.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_symbols_pass_through() {
        assert_eq!(highlight_line("foo bar"), "foo bar");
    }

    #[test]
    fn test_special_forms_are_colored() {
        let out = highlight_line("define");
        assert!(out.contains(COLOR_SPECIAL_FORM));
        assert!(out.contains("define"));
    }

    #[test]
    fn test_strings_keep_their_content() {
        let out = highlight_line("\"a (b\"");
        assert!(out.contains("\"a (b\""));
        assert!(out.contains(COLOR_STRING));
        // The paren inside the string is not paren-colored.
        assert!(!out.contains(COLOR_PARENS));
    }

    #[test]
    fn test_comment_swallows_rest_of_line() {
        let out = highlight_line("x ; (define y 1)");
        assert_eq!(out.matches(COLOR_COMMENT).count(), 1);
        assert!(!out.contains(COLOR_SPECIAL_FORM));
    }

    #[test]
    fn test_numbers() {
        assert!(highlight_line("42").contains(COLOR_NUMBER));
        assert!(highlight_line("-1.5").contains(COLOR_NUMBER));
        assert!(!highlight_line("-").contains(COLOR_NUMBER));
    }
}
