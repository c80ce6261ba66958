//! Boolean condition language for clinical rules.
//!
//! Grammar: `AND` / `OR` / `NOT`, parentheses, bare flag tokens, and
//! counter comparisons of the shape `<counter> <op> <integer>` with
//! `>= > <= < ==`. Precedence is `NOT` over `AND` over `OR`. The string is
//! tokenized and parsed into an AST evaluated against the derived flags
//! and counters; there is no dynamic evaluation of any kind. A malformed
//! or empty condition is inert: it evaluates to `false` and is logged, so
//! one bad table row cannot take the engine down.

use std::collections::BTreeMap;

use super::flags::FlagSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Cmp(CmpOp),
    Int(i64),
    Ident(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Flag(String),
    Compare {
        counter: String,
        op: CmpOp,
        value: i64,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ExprError {
    #[error("empty condition")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("condition ends unexpectedly")]
    UnexpectedEnd,
    #[error("expected an integer after a comparison operator")]
    ExpectedInteger,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("trailing input after condition")]
    TrailingInput,
}

fn tokenize(raw: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();

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
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Ge));
                } else {
                    tokens.push(Token::Cmp(CmpOp::Gt));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Le));
                } else {
                    tokens.push(Token::Cmp(CmpOp::Lt));
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Eq));
                } else {
                    return Err(ExprError::UnexpectedChar('='));
                }
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits.parse().map_err(|_| ExprError::ExpectedInteger)?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match ident.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Ident(ident),
                });
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(ExprError::UnexpectedToken),
                    None => Err(ExprError::UnbalancedParens),
                }
            }
            Some(Token::Ident(name)) => {
                if let Some(&Token::Cmp(op)) = self.peek() {
                    self.next();
                    match self.next() {
                        Some(Token::Int(value)) => Ok(Expr::Compare {
                            counter: name,
                            op,
                            value,
                        }),
                        _ => Err(ExprError::ExpectedInteger),
                    }
                } else {
                    Ok(Expr::Flag(name))
                }
            }
            Some(_) => Err(ExprError::UnexpectedToken),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

pub(crate) fn parse(raw: &str) -> Result<Expr, ExprError> {
    if raw.trim().is_empty() {
        return Err(ExprError::Empty);
    }
    let tokens = tokenize(raw)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::TrailingInput);
    }
    Ok(expr)
}

impl Expr {
    pub(crate) fn eval(&self, flags: &FlagSet, counters: &BTreeMap<String, u32>) -> bool {
        match self {
            Expr::Flag(name) => flags.contains(name),
            Expr::Compare { counter, op, value } => {
                let actual = counters.get(counter).copied().unwrap_or(0) as i64;
                match op {
                    CmpOp::Ge => actual >= *value,
                    CmpOp::Gt => actual > *value,
                    CmpOp::Le => actual <= *value,
                    CmpOp::Lt => actual < *value,
                    CmpOp::Eq => actual == *value,
                }
            }
            Expr::Not(inner) => !inner.eval(flags, counters),
            Expr::And(left, right) => {
                left.eval(flags, counters) && right.eval(flags, counters)
            }
            Expr::Or(left, right) => left.eval(flags, counters) || right.eval(flags, counters),
        }
    }
}

/// Fail-soft entry point used by the rule resolver: a condition that does
/// not parse never fires.
pub(crate) fn evaluate(raw: &str, flags: &FlagSet, counters: &BTreeMap<String, u32>) -> bool {
    match parse(raw) {
        Ok(expr) => expr.eval(flags, counters),
        Err(ExprError::Empty) => {
            tracing::debug!("empty rule condition treated as inert");
            false
        }
        Err(err) => {
            tracing::warn!(condition = raw, error = %err, "malformed rule condition treated as inert");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(names: &[&str]) -> FlagSet {
        let mut set = FlagSet::default();
        for name in names {
            set.insert(name);
        }
        set
    }

    fn counters(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn bare_flag_checks_membership() {
        let set = flags(&["cog_severe"]);
        assert!(evaluate("cog_severe", &set, &BTreeMap::new()));
        assert!(!evaluate("no_support", &set, &BTreeMap::new()));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let set = flags(&["a"]);
        // NOT b AND a == (NOT b) AND a
        assert!(evaluate("NOT b AND a", &set, &BTreeMap::new()));
        assert!(!evaluate("NOT (b AND a)", &flags(&["a", "b"]), &BTreeMap::new()));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let set = flags(&["a"]);
        // a OR b AND c == a OR (b AND c)
        assert!(evaluate("a OR b AND c", &set, &BTreeMap::new()));
        assert!(!evaluate("(a OR b) AND c", &set, &BTreeMap::new()));
    }

    #[test]
    fn counter_comparisons_cover_all_operators() {
        let counts = counters(&[("badl_count", 4)]);
        let set = FlagSet::default();
        assert!(evaluate("badl_count >= 4", &set, &counts));
        assert!(evaluate("badl_count > 3", &set, &counts));
        assert!(evaluate("badl_count <= 4", &set, &counts));
        assert!(evaluate("badl_count < 5", &set, &counts));
        assert!(evaluate("badl_count == 4", &set, &counts));
        assert!(!evaluate("badl_count > 4", &set, &counts));
    }

    #[test]
    fn missing_counter_reads_as_zero() {
        let set = FlagSet::default();
        assert!(evaluate("behavior_count < 1", &set, &BTreeMap::new()));
        assert!(!evaluate("behavior_count >= 1", &set, &BTreeMap::new()));
    }

    #[test]
    fn mixed_condition_with_parens() {
        let set = flags(&["cog_severe"]);
        let counts = counters(&[("behavior_count", 2)]);
        assert!(evaluate(
            "cog_severe AND (no_support OR behavior_count >= 2)",
            &set,
            &counts
        ));
    }

    #[test]
    fn malformed_conditions_are_inert() {
        let set = flags(&["a"]);
        assert!(!evaluate("", &set, &BTreeMap::new()));
        assert!(!evaluate("AND a", &set, &BTreeMap::new()));
        assert!(!evaluate("a AND", &set, &BTreeMap::new()));
        assert!(!evaluate("(a", &set, &BTreeMap::new()));
        assert!(!evaluate("a = 1", &set, &BTreeMap::new()));
        assert!(!evaluate("count >= x", &set, &BTreeMap::new()));
        assert!(!evaluate("a b", &set, &BTreeMap::new()));
    }

    #[test]
    fn parse_errors_name_the_problem() {
        assert_eq!(parse(""), Err(ExprError::Empty));
        assert_eq!(parse("a ="), Err(ExprError::UnexpectedChar('=')));
        assert_eq!(parse("(a"), Err(ExprError::UnbalancedParens));
        assert_eq!(parse("a b"), Err(ExprError::TrailingInput));
        assert_eq!(parse("count >= x"), Err(ExprError::ExpectedInteger));
    }
}
