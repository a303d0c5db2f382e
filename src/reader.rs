// ABOUTME: Reader module: tokenizer and parser turning source text into forms

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, digit1, hex_digit1, one_of, satisfy},
    combinator::{not, opt, peek, recognize, value},
    sequence::terminated,
    IResult, Parser,
};

use crate::error::PsilError;
use crate::symbol::Symbol;
use crate::value::Value;

/// One lexical token. Positions are 1-based lines and 0-based columns,
/// kept for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: (u32, u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Quote,
    QQuote,
    Comma,
    Splice,
    Str(String),
    Int(i64),
    Float(f64),
    Sym(String),
}

/// A lazy token stream over source text. Whitespace separates tokens; `;`
/// starts a comment running to end of line.
pub struct Tokens<'a> {
    rest: &'a str,
    line: u32,
    col: u32,
}

impl<'a> Tokens<'a> {
    pub fn new(source: &'a str) -> Self {
        Tokens {
            rest: source,
            line: 1,
            col: 0,
        }
    }

    /// Consume `n` bytes, tracking line and column.
    fn advance(&mut self, n: usize) {
        for ch in self.rest[..n].chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.rest = &self.rest[n..];
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let ws = self.rest.len() - self.rest.trim_start().len();
            if ws > 0 {
                self.advance(ws);
            }
            if self.rest.starts_with(';') {
                let skip = self.rest.find('\n').unwrap_or(self.rest.len());
                self.advance(skip);
                continue;
            }
            if ws == 0 {
                break;
            }
        }
    }

    /// Produce the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, PsilError> {
        self.skip_whitespace_and_comments();
        if self.rest.is_empty() {
            return Ok(None);
        }

        let pos = (self.line, self.col);
        let rest = self.rest;
        let kind = match rest.as_bytes()[0] {
            b'(' => {
                self.advance(1);
                TokenKind::LParen
            }
            b')' => {
                self.advance(1);
                TokenKind::RParen
            }
            b'\'' => {
                self.advance(1);
                TokenKind::Quote
            }
            b'`' => {
                self.advance(1);
                TokenKind::QQuote
            }
            b',' => {
                if rest[1..].starts_with('@') {
                    self.advance(2);
                    TokenKind::Splice
                } else {
                    self.advance(1);
                    TokenKind::Comma
                }
            }
            b'"' => {
                let (content, consumed) = lex_string(rest)?;
                self.advance(consumed);
                TokenKind::Str(content)
            }
            _ => {
                if let Ok((remaining, kind)) = lex_number(rest) {
                    let consumed = rest.len() - remaining.len();
                    self.advance(consumed);
                    kind
                } else if let Ok((remaining, sym)) = lex_symbol(rest) {
                    let consumed = rest.len() - remaining.len();
                    self.advance(consumed);
                    TokenKind::Sym(sym.to_string())
                } else {
                    return Err(PsilError::Syntax(format!(
                        "unrecognized input: {}",
                        snippet(rest)
                    )));
                }
            }
        };
        Ok(Some(Token { kind, pos }))
    }
}

/// First few characters of the offending tail, for error messages.
fn snippet(s: &str) -> String {
    let end = s
        .char_indices()
        .take_while(|(i, c)| *i < 24 && *c != '\n')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    if end < s.len() {
        format!("{}...", &s[..end])
    } else {
        s[..end].to_string()
    }
}

// ============================================================================
// Token-level recognizers
// ============================================================================

/// Scan a string literal starting at the opening quote. Handles plain and
/// triple-quoted forms, processing escapes as it goes. Returns the decoded
/// content and the number of bytes consumed.
fn lex_string(input: &str) -> Result<(String, usize), PsilError> {
    let triple = input.starts_with("\"\"\"");
    let quote_len = if triple { 3 } else { 1 };

    let mut out = String::new();
    let mut i = quote_len;
    loop {
        let Some(c) = input[i..].chars().next() else {
            return Err(PsilError::Syntax(format!(
                "unterminated string: {}",
                snippet(input)
            )));
        };
        match c {
            '\\' => {
                let Some(esc) = input[i + 1..].chars().next() else {
                    return Err(PsilError::Syntax(format!(
                        "unterminated string: {}",
                        snippet(input)
                    )));
                };
                match esc {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '\'' => out.push('\''),
                    other => {
                        // Unknown escapes keep their backslash.
                        out.push('\\');
                        out.push(other);
                    }
                }
                i += 1 + esc.len_utf8();
            }
            '"' if !triple => return Ok((out, i + 1)),
            '"' if input[i..].starts_with("\"\"\"") => return Ok((out, i + 3)),
            _ => {
                out.push(c);
                i += c.len_utf8();
            }
        }
    }
}

fn int_digits(input: &str) -> IResult<&str, &str> {
    recognize((opt(one_of("+-")), digit1)).parse(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

/// A numeric token must not run into a word character; `1abc` is a symbol.
fn word_boundary(input: &str) -> IResult<&str, ()> {
    value(
        (),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    )
    .parse(input)
}

fn float_token(text: &str) -> TokenKind {
    TokenKind::Float(text.parse().expect("recognized float literal"))
}

fn int_token(text: &str) -> TokenKind {
    match text.parse::<i64>() {
        Ok(n) => TokenKind::Int(n),
        // literals wider than i64 widen to float
        Err(_) => TokenKind::Float(text.parse().expect("recognized numeric literal")),
    }
}

fn hex_token(text: &str) -> TokenKind {
    let digits = &text[2..];
    match i64::from_str_radix(digits, 16) {
        Ok(n) => TokenKind::Int(n),
        Err(_) => {
            let mut acc = 0.0f64;
            for d in digits.chars() {
                acc = acc * 16.0 + d.to_digit(16).map(f64::from).unwrap_or(0.0);
            }
            TokenKind::Float(acc)
        }
    }
}

/// Number grammar: `[-+]?digits[.digits][e[-+]digits]` or `0x` hex, each
/// alternative guarded so backtracking matches the longest valid literal
/// (`1.5e` lexes as the integer `1` followed by the symbol `.5e`).
fn lex_number(input: &str) -> IResult<&str, TokenKind> {
    alt((
        terminated(
            recognize((int_digits, char('.'), digit1, exponent)),
            word_boundary,
        )
        .map(float_token),
        terminated(recognize((int_digits, char('.'), digit1)), word_boundary).map(float_token),
        terminated(recognize((int_digits, exponent)), word_boundary).map(float_token),
        terminated(recognize((tag_no_case("0x"), hex_digit1)), word_boundary).map(hex_token),
        terminated(int_digits, word_boundary).map(int_token),
    ))
    .parse(input)
}

/// A symbol is a greedy run of anything that is not whitespace or a paren.
fn lex_symbol(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '(' && c != ')').parse(input)
}

// ============================================================================
// Parser
// ============================================================================

/// Parse one top-level form from the token stream. Returns `None` when the
/// stream is exhausted between forms.
pub fn parse(tokens: &mut Tokens) -> Result<Option<Value>, PsilError> {
    match tokens.next_token()? {
        None => Ok(None),
        Some(token) => parse_form(tokens, token).map(Some),
    }
}

fn parse_form(tokens: &mut Tokens, token: Token) -> Result<Value, PsilError> {
    match token.kind {
        TokenKind::LParen => {
            let mut items = Vec::new();
            loop {
                let next = tokens
                    .next_token()?
                    .ok_or_else(|| PsilError::Syntax("unclosed parenthesis".to_string()))?;
                if next.kind == TokenKind::RParen {
                    break;
                }
                items.push(parse_form(tokens, next)?);
            }
            Ok(Value::list(items))
        }
        TokenKind::Str(s) => Ok(Value::String(s)),
        TokenKind::Int(n) => Ok(Value::Int(n)),
        TokenKind::Float(n) => Ok(Value::Float(n)),
        TokenKind::Quote => wrap(Symbol::QUOTE, tokens),
        TokenKind::QQuote => wrap(Symbol::QUASIQUOTE, tokens),
        TokenKind::Comma => wrap(Symbol::UNQUOTE, tokens),
        TokenKind::Splice => wrap(Symbol::UNQUOTE_SPLICING, tokens),
        TokenKind::Sym(name) => Ok(Value::Symbol(Symbol::new(&name))),
        TokenKind::RParen => Err(PsilError::Syntax(format!(
            "unexpected ')' at line {} column {}",
            token.pos.0, token.pos.1
        ))),
    }
}

/// `'x` and friends read one following form and wrap it: `(tag x)`.
fn wrap(tag: Symbol, tokens: &mut Tokens) -> Result<Value, PsilError> {
    let next = tokens
        .next_token()?
        .ok_or_else(|| PsilError::Syntax("unexpected end of input after quote".to_string()))?;
    let form = parse_form(tokens, next)?;
    Ok(Value::list(vec![Value::Symbol(tag), form]))
}

/// Read the first form of `source`; nil when the source holds no forms.
pub fn read(source: &str) -> Result<Value, PsilError> {
    let mut tokens = Tokens::new(source);
    Ok(parse(&mut tokens)?.unwrap_or(Value::Nil))
}
