//! Arithmetic operations: +, -, *, /, //, **, %, <<, >>, &, |, ^, ~
//!
//! Integer/float tower with the host's conventions:
//!
//! - `+`: sum of all arguments (identity: 0)
//! - `-`: subtract subsequent args from first, or negate a single arg
//! - `*`: product of all arguments (identity: 1)
//! - `/`: true division, always a float; reciprocal for a single arg
//! - `//`: floor division
//! - `**`: exponentiation, exactly 2 args
//! - `%`: floor-sign remainder, or printf-style formatting when the left
//!   operand is a string
//! - `<< >> & | ^ ~`: integer bit operations; `&` folds from -1, `|` from 0

use crate::error::{PsilError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_TWO};
use crate::help::{register_help, HelpEntry};
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

/// A number mid-computation. Integer arithmetic stays exact until a float
/// enters or an operation overflows, then the result widens.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn to_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Int(n),
            Num::Float(n) => Value::Float(n),
        }
    }

    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 + b as f64)),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    fn sub(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_sub(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 - b as f64)),
            (a, b) => Num::Float(a.as_f64() - b.as_f64()),
        }
    }

    fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 * b as f64)),
            (a, b) => Num::Float(a.as_f64() * b.as_f64()),
        }
    }

    fn neg(self) -> Num {
        match self {
            Num::Int(n) => n.checked_neg().map(Num::Int).unwrap_or(Num::Float(-(n as f64))),
            Num::Float(n) => Num::Float(-n),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(n) => n == 0.0,
        }
    }
}

/// Extract the numeric argument at `i`. Booleans count as integers, the
/// way the original host treated them.
pub(crate) fn num(function: &str, args: &[Value], i: usize) -> Result<Num, PsilError> {
    match &args[i] {
        Value::Int(n) => Ok(Num::Int(*n)),
        Value::Float(n) => Ok(Num::Float(*n)),
        Value::Bool(b) => Ok(Num::Int(*b as i64)),
        other => Err(PsilError::type_error(function, "number", other, i + 1)),
    }
}

fn int_arg(function: &str, args: &[Value], i: usize) -> Result<i64, PsilError> {
    match &args[i] {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(PsilError::type_error(function, "integer", other, i + 1)),
    }
}

/// Floor division with the remainder sign following the divisor.
fn floor_div_ints(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod_ints(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

/// Returns the sum of all arguments; `(+)` is 0.
pub fn builtin_add(args: &[Value]) -> Result<Value, PsilError> {
    let mut acc = Num::Int(0);
    for i in 0..args.len() {
        acc = acc.add(num("+", args, i)?);
    }
    Ok(acc.to_value())
}

/// Subtracts subsequent arguments from the first; negates a single one.
pub fn builtin_sub(args: &[Value]) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error("-", ARITY_AT_LEAST_ONE, 0));
    }
    let mut acc = num("-", args, 0)?;
    if args.len() == 1 {
        return Ok(acc.neg().to_value());
    }
    for i in 1..args.len() {
        acc = acc.sub(num("-", args, i)?);
    }
    Ok(acc.to_value())
}

/// Returns the product of all arguments; `(*)` is 1.
pub fn builtin_mul(args: &[Value]) -> Result<Value, PsilError> {
    let mut acc = Num::Int(1);
    for i in 0..args.len() {
        acc = acc.mul(num("*", args, i)?);
    }
    Ok(acc.to_value())
}

/// True division, always a float; `(/ x)` is the reciprocal.
pub fn builtin_div(args: &[Value]) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error("/", ARITY_AT_LEAST_ONE, 0));
    }
    let first = num("/", args, 0)?;
    if args.len() == 1 {
        if first.is_zero() {
            return Err(PsilError::runtime_error("/", "division by zero"));
        }
        return Ok(Value::Float(1.0 / first.as_f64()));
    }
    let mut acc = first.as_f64();
    for i in 1..args.len() {
        let d = num("/", args, i)?;
        if d.is_zero() {
            return Err(PsilError::runtime_error("/", "division by zero"));
        }
        acc /= d.as_f64();
    }
    Ok(Value::Float(acc))
}

/// Floor division, folded left over the arguments.
pub fn builtin_floordiv(args: &[Value]) -> Result<Value, PsilError> {
    if args.is_empty() {
        return Err(PsilError::arity_error("//", ARITY_AT_LEAST_ONE, 0));
    }
    let mut acc = num("//", args, 0)?;
    for i in 1..args.len() {
        let d = num("//", args, i)?;
        if d.is_zero() {
            return Err(PsilError::runtime_error("//", "division by zero"));
        }
        acc = match (acc, d) {
            (Num::Int(a), Num::Int(b)) => Num::Int(floor_div_ints(a, b)),
            (a, b) => Num::Float((a.as_f64() / b.as_f64()).floor()),
        };
    }
    Ok(acc.to_value())
}

/// Exponentiation; integer when the base and a non-negative exponent fit.
pub fn builtin_pow(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("**", ARITY_TWO, args.len()));
    }
    let base = num("**", args, 0)?;
    let exp = num("**", args, 1)?;
    if let (Num::Int(b), Num::Int(e)) = (base, exp) {
        if e >= 0 {
            if let Ok(e) = u32::try_from(e) {
                if let Some(n) = b.checked_pow(e) {
                    return Ok(Value::Int(n));
                }
            }
        }
    }
    Ok(Value::Float(base.as_f64().powf(exp.as_f64())))
}

/// Remainder with the divisor's sign, or printf-style string formatting
/// when the left operand is a string.
pub fn builtin_mod(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("%", ARITY_TWO, args.len()));
    }
    if let Value::String(fmt) = &args[0] {
        let fmt_args: Vec<Value> = match &args[1] {
            Value::List(items) => items.borrow().clone(),
            single => vec![single.clone()],
        };
        return Ok(Value::String(super::misc::format_with("%", fmt, &fmt_args)?));
    }
    let a = num("%", args, 0)?;
    let b = num("%", args, 1)?;
    if b.is_zero() {
        return Err(PsilError::runtime_error("%", "division by zero"));
    }
    Ok(match (a, b) {
        (Num::Int(a), Num::Int(b)) => Value::Int(floor_mod_ints(a, b)),
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            let r = a % b;
            Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
        }
    })
}

pub fn builtin_shl(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("<<", ARITY_TWO, args.len()));
    }
    let a = int_arg("<<", args, 0)?;
    let b = int_arg("<<", args, 1)?;
    u32::try_from(b)
        .ok()
        .and_then(|b| a.checked_shl(b))
        .map(Value::Int)
        .ok_or_else(|| PsilError::runtime_error("<<", "shift count out of range"))
}

pub fn builtin_shr(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error(">>", ARITY_TWO, args.len()));
    }
    let a = int_arg(">>", args, 0)?;
    let b = int_arg(">>", args, 1)?;
    u32::try_from(b)
        .ok()
        .and_then(|b| a.checked_shr(b))
        .map(Value::Int)
        .ok_or_else(|| PsilError::runtime_error(">>", "shift count out of range"))
}

/// Bitwise and, folded from -1 so `(&)` is the all-ones identity.
pub fn builtin_bitand(args: &[Value]) -> Result<Value, PsilError> {
    let mut acc = -1i64;
    for i in 0..args.len() {
        acc &= int_arg("&", args, i)?;
    }
    Ok(Value::Int(acc))
}

/// Bitwise or, folded from 0.
pub fn builtin_bitor(args: &[Value]) -> Result<Value, PsilError> {
    let mut acc = 0i64;
    for i in 0..args.len() {
        acc |= int_arg("|", args, i)?;
    }
    Ok(Value::Int(acc))
}

pub fn builtin_bitxor(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 2 {
        return Err(PsilError::arity_error("^", ARITY_TWO, args.len()));
    }
    Ok(Value::Int(int_arg("^", args, 0)? ^ int_arg("^", args, 1)?))
}

pub fn builtin_invert(args: &[Value]) -> Result<Value, PsilError> {
    if args.len() != 1 {
        return Err(PsilError::arity_error("~", ARITY_ONE, args.len()));
    }
    Ok(Value::Int(!int_arg("~", args, 0)?))
}

/// Register all arithmetic builtins in the scope
pub fn register(scope: &Rc<Scope>) {
    super::bind(scope, "+", builtin_add);
    super::bind(scope, "-", builtin_sub);
    super::bind(scope, "*", builtin_mul);
    super::bind(scope, "/", builtin_div);
    super::bind(scope, "//", builtin_floordiv);
    super::bind(scope, "**", builtin_pow);
    super::bind(scope, "%", builtin_mod);
    super::bind(scope, "<<", builtin_shl);
    super::bind(scope, ">>", builtin_shr);
    super::bind(scope, "&", builtin_bitand);
    super::bind(scope, "|", builtin_bitor);
    super::bind(scope, "^", builtin_bitxor);
    super::bind(scope, "~", builtin_invert);

    register_help(HelpEntry {
        name: "+".to_string(),
        signature: "(+ ...)".to_string(),
        description: "Returns the sum of all arguments.".to_string(),
        examples: vec![
            "(+ 1 2 3) => 6".to_string(),
            "(+) => 0".to_string(),
        ],
        related: vec!["-".to_string(), "*".to_string(), "/".to_string()],
        category: "Arithmetic".to_string(),
    });

    register_help(HelpEntry {
        name: "-".to_string(),
        signature: "(- ...)".to_string(),
        description: "Subtracts subsequent arguments from the first. With one argument, returns its negation.".to_string(),
        examples: vec!["(- 10 3 2) => 5".to_string(), "(- 5) => -5".to_string()],
        related: vec!["+".to_string(), "*".to_string(), "/".to_string()],
        category: "Arithmetic".to_string(),
    });

    register_help(HelpEntry {
        name: "*".to_string(),
        signature: "(* ...)".to_string(),
        description: "Returns the product of all arguments.".to_string(),
        examples: vec!["(* 2 3 4) => 24".to_string(), "(*) => 1".to_string()],
        related: vec!["+".to_string(), "-".to_string(), "/".to_string()],
        category: "Arithmetic".to_string(),
    });

    register_help(HelpEntry {
        name: "/".to_string(),
        signature: "(/ ...)".to_string(),
        description: "True division; the result is always a float. With one argument, returns the reciprocal.".to_string(),
        examples: vec!["(/ 20 4) => 5.0".to_string(), "(/ 2) => 0.5".to_string()],
        related: vec!["//".to_string(), "%".to_string()],
        category: "Arithmetic".to_string(),
    });

    register_help(HelpEntry {
        name: "//".to_string(),
        signature: "(// ...)".to_string(),
        description: "Floor division, folded left over the arguments.".to_string(),
        examples: vec!["(// 20 3) => 6".to_string(), "(// -7 2) => -4".to_string()],
        related: vec!["/".to_string(), "%".to_string()],
        category: "Arithmetic".to_string(),
    });

    register_help(HelpEntry {
        name: "%".to_string(),
        signature: "(% a b)".to_string(),
        description: "Remainder with the divisor's sign. When the left operand is a string, formats it printf-style with the right operand (a value or list of values).".to_string(),
        examples: vec![
            "(% 17 5) => 2".to_string(),
            "(% \"x=%d\" 7) => \"x=7\"".to_string(),
        ],
        related: vec!["//".to_string(), "format".to_string()],
        category: "Arithmetic".to_string(),
    });
}
