//! Parsing and evaluation of `#if`/`#elif` condition expressions.
//!
//! The grammar is the one C# allows in directives: identifiers, `true`,
//! `false`, `!`, `==`, `!=`, `&&`, `||`, and parentheses. Identifiers are
//! boolean toggles — defined or not — so evaluation needs nothing beyond a
//! membership test.

use std::collections::HashSet;

/// A directive condition that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid directive condition {condition:?}: {message}")]
pub struct ConditionError {
    pub condition: String,
    pub message: String,
}

/// A parsed directive condition.
#[derive(Debug, Clone)]
pub struct Condition {
    expr: Expr,
    /// Every identifier referenced by the condition, in source order,
    /// duplicates included. `true`/`false` are literals, not identifiers.
    identifiers: Vec<String>,
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            condition: text,
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.or_expr()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("unexpected trailing tokens"));
        }

        let mut identifiers = Vec::new();
        collect_identifiers(&expr, &mut identifiers);
        Ok(Self { expr, identifiers })
    }

    /// Evaluate under the hypothesis that exactly `defined` symbols are set.
    pub fn eval(&self, defined: &HashSet<String>) -> bool {
        eval_expr(&self.expr, defined)
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Lit(bool),
    Symbol(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
}

fn eval_expr(expr: &Expr, defined: &HashSet<String>) -> bool {
    match expr {
        Expr::Lit(v) => *v,
        Expr::Symbol(name) => defined.contains(name),
        Expr::Not(inner) => !eval_expr(inner, defined),
        Expr::And(a, b) => eval_expr(a, defined) && eval_expr(b, defined),
        Expr::Or(a, b) => eval_expr(a, defined) || eval_expr(b, defined),
        Expr::Eq(a, b) => eval_expr(a, defined) == eval_expr(b, defined),
        Expr::Ne(a, b) => eval_expr(a, defined) != eval_expr(b, defined),
    }
}

fn collect_identifiers(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Lit(_) => {}
        Expr::Symbol(name) => out.push(name.clone()),
        Expr::Not(inner) => collect_identifiers(inner, out),
        Expr::And(a, b) | Expr::Or(a, b) | Expr::Eq(a, b) | Expr::Ne(a, b) => {
            collect_identifiers(a, out);
            collect_identifiers(b, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    True,
    False,
    Not,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let error = |message: &str| ConditionError {
        condition: text.to_string(),
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(at, c)) = chars.peek() {
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
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    tokens.push(Token::EqEq);
                } else {
                    return Err(error("'=' is not an operator; did you mean '=='?"));
                }
            }
            '&' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '&'))) {
                    chars.next();
                    tokens.push(Token::AndAnd);
                } else {
                    return Err(error("'&' is not an operator; did you mean '&&'?"));
                }
            }
            '|' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '|'))) {
                    chars.next();
                    tokens.push(Token::OrOr);
                } else {
                    return Err(error("'|' is not an operator; did you mean '||'?"));
                }
            }
            c if c == '_' || c.is_alphabetic() => {
                let start = at;
                let mut end = at;
                while let Some(&(at, c)) = chars.peek() {
                    if c == '_' || c.is_alphanumeric() {
                        end = at + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match &text[start..end] {
                    "true" => Token::True,
                    "false" => Token::False,
                    name => Token::Ident(name.to_string()),
                });
            }
            c => {
                return Err(error(&format!("unexpected character {c:?}")));
            }
        }
    }
    Ok(tokens)
}

/// Recursive descent, lowest precedence first: `||` < `&&` < `==`/`!=` < `!`.
struct Parser<'a> {
    condition: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> ConditionError {
        ConditionError {
            condition: self.condition.to_string(),
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Some(Token::OrOr)) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.equality_expr()?;
        while matches!(self.peek(), Some(Token::AndAnd)) {
            self.pos += 1;
            let rhs = self.equality_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let eq = match self.peek() {
                Some(Token::EqEq) => true,
                Some(Token::NotEq) => false,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary_expr()?;
            lhs = if eq {
                Expr::Eq(Box::new(lhs), Box::new(rhs))
            } else {
                Expr::Ne(Box::new(lhs), Box::new(rhs))
            };
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, ConditionError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.unary_expr()?)));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Result<Expr, ConditionError> {
        match self.peek() {
            Some(Token::True) => {
                self.pos += 1;
                Ok(Expr::Lit(true))
            }
            Some(Token::False) => {
                self.pos += 1;
                Ok(Expr::Lit(false))
            }
            Some(Token::Ident(name)) => {
                let expr = Expr::Symbol(name.clone());
                self.pos += 1;
                Ok(expr)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(self.error("missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => Err(self.error("expected an identifier, literal, '!' or '('")),
            None => Err(self.error("expected an expression")),
        }
    }
}
