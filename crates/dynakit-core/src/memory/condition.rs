//! Parser and evaluator for the expression subset the builders emit.
//!
//! The grammar is deliberately small: comparison clauses, `BETWEEN`, and
//! `begins_with`, joined by `AND`. Placeholders are resolved through the
//! request's side tables at parse time, so evaluation works on real
//! attribute names and concrete values.

use std::cmp::Ordering;
use std::collections::HashMap;

use dynakit_model::{AttrValue, StoreError};

use crate::expression::CmpOp;

/// One resolved clause of a parsed expression.
#[derive(Debug, Clone)]
pub(crate) struct Clause {
    /// The real attribute name the clause tests.
    pub attr: String,
    /// The test applied to the attribute's value.
    pub test: ClauseTest,
}

/// The test half of a clause.
#[derive(Debug, Clone)]
pub(crate) enum ClauseTest {
    /// Binary comparison against a concrete value.
    Cmp(CmpOp, AttrValue),
    /// Inclusive range between two concrete values.
    Between(AttrValue, AttrValue),
    /// String prefix match.
    BeginsWith(String),
}

#[derive(Debug, PartialEq)]
enum Token {
    Ident(String),
    Op(CmpOp),
    LParen,
    RParen,
    Comma,
}

fn lex(expr: &str) -> Result<Vec<Token>, StoreError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Op(CmpOp::Eq));
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Op(CmpOp::Le));
                    }
                    Some('>') => {
                        chars.next();
                        tokens.push(Token::Op(CmpOp::Ne));
                    }
                    _ => tokens.push(Token::Op(CmpOp::Lt)),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(CmpOp::Ge));
                } else {
                    tokens.push(Token::Op(CmpOp::Gt));
                }
            }
            '#' | ':' | '_' => {
                tokens.push(Token::Ident(lex_ident(&mut chars)));
            }
            c if c.is_ascii_alphanumeric() => {
                tokens.push(Token::Ident(lex_ident(&mut chars)));
            }
            other => {
                return Err(StoreError::new(format!(
                    "unexpected character '{other}' in expression"
                )));
            }
        }
    }
    Ok(tokens)
}

fn lex_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    if let Some(&c) = chars.peek() {
        if c == '#' || c == ':' {
            ident.push(c);
            chars.next();
        }
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

/// Parses an expression into resolved clauses.
pub(crate) fn parse(
    expr: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttrValue>,
) -> Result<Vec<Clause>, StoreError> {
    let tokens = lex(expr)?;
    let mut pos = 0;
    let mut clauses = Vec::new();

    loop {
        let clause = parse_clause(&tokens, &mut pos, names, values)?;
        clauses.push(clause);

        match tokens.get(pos) {
            None => break,
            Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("and") => {
                pos += 1;
            }
            Some(other) => {
                return Err(StoreError::new(format!(
                    "expected AND between clauses, found {other:?}"
                )));
            }
        }
    }

    Ok(clauses)
}

fn parse_clause(
    tokens: &[Token],
    pos: &mut usize,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttrValue>,
) -> Result<Clause, StoreError> {
    let Some(Token::Ident(first)) = tokens.get(*pos) else {
        return Err(StoreError::new("expected attribute path or function"));
    };
    *pos += 1;

    if first.eq_ignore_ascii_case("begins_with") {
        expect(tokens, pos, &Token::LParen)?;
        let attr = resolve_path(next_ident(tokens, pos)?, names)?;
        expect(tokens, pos, &Token::Comma)?;
        let value = resolve_value(next_ident(tokens, pos)?, values)?;
        expect(tokens, pos, &Token::RParen)?;
        let AttrValue::S(prefix) = value else {
            return Err(StoreError::new("begins_with requires a string operand"));
        };
        return Ok(Clause {
            attr,
            test: ClauseTest::BeginsWith(prefix),
        });
    }

    let attr = resolve_path(first, names)?;
    match tokens.get(*pos) {
        Some(Token::Op(op)) => {
            let op = *op;
            *pos += 1;
            let value = resolve_value(next_ident(tokens, pos)?, values)?;
            Ok(Clause {
                attr,
                test: ClauseTest::Cmp(op, value),
            })
        }
        Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("between") => {
            *pos += 1;
            let low = resolve_value(next_ident(tokens, pos)?, values)?;
            match tokens.get(*pos) {
                Some(Token::Ident(and)) if and.eq_ignore_ascii_case("and") => *pos += 1,
                _ => return Err(StoreError::new("BETWEEN requires AND between boundaries")),
            }
            let high = resolve_value(next_ident(tokens, pos)?, values)?;
            Ok(Clause {
                attr,
                test: ClauseTest::Between(low, high),
            })
        }
        other => Err(StoreError::new(format!(
            "expected comparator or BETWEEN after '{attr}', found {other:?}"
        ))),
    }
}

fn next_ident<'a>(tokens: &'a [Token], pos: &mut usize) -> Result<&'a str, StoreError> {
    match tokens.get(*pos) {
        Some(Token::Ident(id)) => {
            *pos += 1;
            Ok(id)
        }
        other => Err(StoreError::new(format!(
            "expected identifier, found {other:?}"
        ))),
    }
}

fn expect(tokens: &[Token], pos: &mut usize, expected: &Token) -> Result<(), StoreError> {
    if tokens.get(*pos) == Some(expected) {
        *pos += 1;
        Ok(())
    } else {
        Err(StoreError::new(format!(
            "expected {expected:?}, found {:?}",
            tokens.get(*pos)
        )))
    }
}

fn resolve_path(path: &str, names: &HashMap<String, String>) -> Result<String, StoreError> {
    if let Some(stripped) = path.strip_prefix('#') {
        names
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("unresolved name placeholder #{stripped}")))
    } else {
        Ok(path.to_owned())
    }
}

fn resolve_value(
    reference: &str,
    values: &HashMap<String, AttrValue>,
) -> Result<AttrValue, StoreError> {
    if !reference.starts_with(':') {
        return Err(StoreError::new(format!(
            "expected value placeholder, found '{reference}'"
        )));
    }
    values
        .get(reference)
        .cloned()
        .ok_or_else(|| StoreError::new(format!("unresolved value placeholder {reference}")))
}

/// Evaluates all clauses against a record; clauses are joined by AND.
pub(crate) fn eval(clauses: &[Clause], record: &HashMap<String, AttrValue>) -> bool {
    clauses.iter().all(|clause| eval_clause(clause, record))
}

fn eval_clause(clause: &Clause, record: &HashMap<String, AttrValue>) -> bool {
    let Some(actual) = record.get(&clause.attr) else {
        return false;
    };
    match &clause.test {
        ClauseTest::Cmp(op, expected) => match op {
            CmpOp::Eq => compare(actual, expected) == Some(Ordering::Equal),
            CmpOp::Ne => compare(actual, expected) != Some(Ordering::Equal),
            CmpOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            CmpOp::Le => {
                matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal))
            }
            CmpOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            CmpOp::Ge => {
                matches!(
                    compare(actual, expected),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }
        },
        ClauseTest::Between(low, high) => {
            matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
        }
        ClauseTest::BeginsWith(prefix) => {
            matches!(actual, AttrValue::S(s) if s.starts_with(prefix.as_str()))
        }
    }
}

/// Compares two values of the same type; mixed types are incomparable.
///
/// Numbers compare numerically; a number that fails to parse is incomparable,
/// like the store's own treatment of malformed numerics.
fn compare(a: &AttrValue, b: &AttrValue) -> Option<Ordering> {
    match (a, b) {
        (AttrValue::S(x), AttrValue::S(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (AttrValue::N(x), AttrValue::N(y)) => {
            let fx: f64 = x.parse().ok()?;
            let fy: f64 = y.parse().ok()?;
            fx.partial_cmp(&fy)
        }
        (AttrValue::Bool(x), AttrValue::Bool(y)) => Some(x.cmp(y)),
        (AttrValue::Null(_), AttrValue::Null(_)) => Some(Ordering::Equal),
        _ => None,
    }
}
