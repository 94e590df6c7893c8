use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{Signed, Zero};
use thiserror::Error;

use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

/// Print an SmtTerm as SMT-LIB2 format.
pub fn to_smtlib(term: &SmtTerm) -> String {
    match term {
        SmtTerm::Var(name) => name.clone(),
        SmtTerm::RealLit(r) => real_to_smtlib(r),
        SmtTerm::BoolLit(b) => {
            if *b {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        SmtTerm::Add(lhs, rhs) => format!("(+ {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Sub(lhs, rhs) => format!("(- {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Mul(lhs, rhs) => format!("(* {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Neg(inner) => format!("(- {})", to_smtlib(inner)),
        SmtTerm::Eq(lhs, rhs) => format!("(= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Lt(lhs, rhs) => format!("(< {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Le(lhs, rhs) => format!("(<= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Gt(lhs, rhs) => format!("(> {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Ge(lhs, rhs) => format!("(>= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::And(terms) => {
            if terms.is_empty() {
                "true".to_string()
            } else if terms.len() == 1 {
                to_smtlib(&terms[0])
            } else {
                let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
                format!("(and {})", inner.join(" "))
            }
        }
        SmtTerm::Or(terms) => {
            if terms.is_empty() {
                "false".to_string()
            } else if terms.len() == 1 {
                to_smtlib(&terms[0])
            } else {
                let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
                format!("(or {})", inner.join(" "))
            }
        }
        SmtTerm::Not(inner) => format!("(not {})", to_smtlib(inner)),
        SmtTerm::Implies(lhs, rhs) => {
            format!("(=> {} {})", to_smtlib(lhs), to_smtlib(rhs))
        }
        SmtTerm::Ite(cond, then, els) => {
            format!(
                "(ite {} {} {})",
                to_smtlib(cond),
                to_smtlib(then),
                to_smtlib(els)
            )
        }
    }
}

/// Print a sort as SMT-LIB2 format.
pub fn sort_to_smtlib(sort: &SmtSort) -> &'static str {
    match sort {
        SmtSort::Bool => "Bool",
        SmtSort::Real => "Real",
    }
}

/// Print an exact rational as a Real-sorted SMT-LIB2 constant.
///
/// Integral values print as decimals (`200.0`), fractions as `(/ 1.0 2.0)`,
/// and negatives are wrapped in unary minus.
pub fn real_to_smtlib(value: &BigRational) -> String {
    let magnitude = if value.is_integer() {
        format!("{}.0", value.numer().abs())
    } else {
        format!("(/ {}.0 {}.0)", value.numer().abs(), value.denom())
    };
    if value.is_negative() {
        format!("(- {magnitude})")
    } else {
        magnitude
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumeralError {
    #[error("empty numeral")]
    Empty,
    #[error("unbalanced parentheses in numeral `{0}`")]
    Unbalanced(String),
    #[error("malformed decimal `{0}`")]
    Malformed(String),
    #[error("unsupported numeral form `{0}`")]
    Unsupported(String),
    #[error("division by zero in numeral")]
    DivisionByZero,
}

/// Parse a Real numeral as printed by a solver into an exact rational.
///
/// Accepts decimals (`42`, `9588000000.0`, `0.25`), division (`(/ 1.0 2.0)`)
/// and unary or binary minus (`(- 3.0)`, `(- (/ 1 2))`). Approximate forms such
/// as `root-obj` or `1.33?` are rejected rather than rounded.
pub fn parse_real_numeral(text: &str) -> Result<BigRational, NumeralError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(NumeralError::Empty);
    }
    let mut pos = 0;
    let value = parse_expr(&tokens, &mut pos, text, 0)?;
    if pos != tokens.len() {
        return Err(NumeralError::Unbalanced(text.to_string()));
    }
    Ok(value)
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    for ch in text.chars() {
        match ch {
            '(' | ')' => {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() => {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
            }
            other => buf.push(other),
        }
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

/// Solver numerals nest a few levels at most; anything deeper is rejected
/// before it can exhaust the stack.
const MAX_NESTING: usize = 32;

fn parse_expr(
    tokens: &[String],
    pos: &mut usize,
    text: &str,
    depth: usize,
) -> Result<BigRational, NumeralError> {
    if depth > MAX_NESTING {
        return Err(NumeralError::Unsupported(text.to_string()));
    }
    let Some(token) = tokens.get(*pos) else {
        return Err(NumeralError::Unbalanced(text.to_string()));
    };
    *pos += 1;
    if token == ")" {
        return Err(NumeralError::Unbalanced(text.to_string()));
    }
    if token != "(" {
        return parse_decimal_atom(token);
    }

    let head = tokens
        .get(*pos)
        .ok_or_else(|| NumeralError::Unbalanced(text.to_string()))?
        .clone();
    *pos += 1;
    let mut args = Vec::new();
    loop {
        match tokens.get(*pos).map(String::as_str) {
            Some(")") => {
                *pos += 1;
                break;
            }
            Some(_) => args.push(parse_expr(tokens, pos, text, depth + 1)?),
            None => return Err(NumeralError::Unbalanced(text.to_string())),
        }
    }

    match (head.as_str(), args.as_slice()) {
        ("-", [x]) => Ok(-x.clone()),
        ("-", [a, b]) => Ok(a - b),
        ("/", [a, b]) => {
            if b.is_zero() {
                Err(NumeralError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }
        _ => Err(NumeralError::Unsupported(text.to_string())),
    }
}

fn parse_decimal_atom(token: &str) -> Result<BigRational, NumeralError> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(NumeralError::Malformed(token.to_string()));
    }
    let digits = format!("{int_part}{frac_part}");
    let numer: BigInt = digits
        .parse()
        .map_err(|_| NumeralError::Malformed(token.to_string()))?;
    let denom = num::pow(BigInt::from(10), frac_part.len());
    let value = BigRational::new(numer, denom);
    Ok(if negative { -value } else { value })
}
