//! Recursive-descent parser for conformance expressions.
//!
//! ```text
//! expr      := term (',' term)*
//! term      := '[' boolExpr ']' | abbrev | boolExpr
//! boolExpr  := andExpr ('|' andExpr)*
//! andExpr   := notExpr ('&' notExpr)*
//! notExpr   := '!' notExpr | '(' boolExpr ')' | operand
//! ```
//!
//! Commas only separate terms at the top level; a comma inside `(...)` or
//! `[...]` is a parse error rather than a term boundary.
use super::ConformanceLevel;
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::ParseError;

/// Maximum nesting of `!`, `(` and `[` accepted by the parser.
pub const MAX_NESTING: usize = 200;

/// Boolean sub-expression over operand states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    /// A named element, feature or protocol operand.
    Operand(String),
    /// Logical negation.
    Not(Box<Self>),
    /// Conjunction of two or more sub-expressions.
    And(Vec<Self>),
    /// Disjunction of two or more sub-expressions.
    Or(Vec<Self>),
}

impl BoolExpr {
    /// Evaluate against a lookup of operand states.
    pub fn eval(&self, lookup: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Operand(name) => lookup(name),
            Self::Not(inner) => !inner.eval(lookup),
            Self::And(items) => items.iter().all(|e| e.eval(lookup)),
            Self::Or(items) => items.iter().any(|e| e.eval(lookup)),
        }
    }
}

/// One comma-separated alternative of an otherwise chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A standalone abbreviation (`M`, `O`, `P`, `D`, `X`).
    Abbreviation(ConformanceLevel),
    /// `[expr]`: optional if `expr` holds, otherwise not supported.
    OptionalIf(BoolExpr),
    /// `expr`: mandatory if `expr` holds, otherwise fall through.
    MandatoryIf(BoolExpr),
}

/// A parsed conformance expression: an ordered otherwise chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Terms in evaluation order.
    pub terms: Vec<Term>,
}

/// Parse `src` into an [`Expression`].
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::parser::{BoolExpr, Term, parse};
///
/// let expr = parse("A, [B]").unwrap();
/// assert_eq!(expr.terms.len(), 2);
/// assert_eq!(expr.terms[1], Term::OptionalIf(BoolExpr::Operand("B".into())));
/// ```
///
/// # Errors
///
/// Returns a [`ParseError`] for illegal characters, unbalanced delimiters,
/// missing sub-expressions, misplaced tokens or excessive nesting.
pub fn parse(src: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: src.len(),
    };
    parser.expression()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<TokenKind<'a>> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn enter(&mut self, offset: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::TooDeep {
                limit: MAX_NESTING,
                offset,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let mut terms = vec![self.term()?];
        while let Some(token) = self.bump() {
            match token.kind {
                TokenKind::Comma => terms.push(self.term()?),
                kind @ (TokenKind::RParen | TokenKind::RBracket) => {
                    return Err(unbalanced(kind, token.offset));
                }
                kind => return Err(unexpected(kind, token.offset)),
            }
        }
        Ok(Expression { terms })
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::LBracket,
                offset,
            }) => {
                self.bump();
                self.enter(offset)?;
                let inner = self.or_expr()?;
                self.close(TokenKind::RBracket, '[', offset)?;
                self.leave();
                Ok(Term::OptionalIf(inner))
            }
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) if matches!(self.peek_kind_at(1), None | Some(TokenKind::Comma)) => {
                self.bump();
                Ok(ConformanceLevel::from_abbreviation(name).map_or_else(
                    || Term::MandatoryIf(BoolExpr::Operand(name.to_string())),
                    Term::Abbreviation,
                ))
            }
            Some(Token {
                kind: TokenKind::Comma,
                offset,
            }) => Err(ParseError::Expected {
                expected: "conformance term",
                offset,
            }),
            _ => self.or_expr().map(Term::MandatoryIf),
        }
    }

    fn or_expr(&mut self) -> Result<BoolExpr, ParseError> {
        let mut items = vec![self.and_expr()?];
        while self.peek_kind_at(0) == Some(TokenKind::Or) {
            self.bump();
            items.push(self.and_expr()?);
        }
        Ok(collapse(items, BoolExpr::Or))
    }

    fn and_expr(&mut self) -> Result<BoolExpr, ParseError> {
        let mut items = vec![self.not_expr()?];
        while self.peek_kind_at(0) == Some(TokenKind::And) {
            self.bump();
            items.push(self.not_expr()?);
        }
        Ok(collapse(items, BoolExpr::And))
    }

    fn not_expr(&mut self) -> Result<BoolExpr, ParseError> {
        let offset = self.offset();
        let Some(token) = self.bump() else {
            return Err(ParseError::Expected {
                expected: "operand",
                offset,
            });
        };
        match token.kind {
            TokenKind::Not => {
                self.enter(offset)?;
                let inner = self.not_expr()?;
                self.leave();
                Ok(BoolExpr::Not(Box::new(inner)))
            }
            TokenKind::LParen => {
                self.enter(offset)?;
                let inner = self.or_expr()?;
                self.close(TokenKind::RParen, '(', offset)?;
                self.leave();
                Ok(inner)
            }
            TokenKind::Ident(name) => Ok(BoolExpr::Operand(name.to_string())),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::Comma => {
                Err(ParseError::Expected {
                    expected: "operand",
                    offset,
                })
            }
            kind => Err(unexpected(kind, offset)),
        }
    }

    /// Consume the closing delimiter matching an opener at `open_offset`.
    fn close(
        &mut self,
        closing: TokenKind<'a>,
        opener: char,
        open_offset: usize,
    ) -> Result<(), ParseError> {
        match self.bump() {
            Some(token) if token.kind == closing => Ok(()),
            Some(token) => Err(unexpected(token.kind, token.offset)),
            None => Err(ParseError::Unbalanced {
                delimiter: opener,
                offset: open_offset,
            }),
        }
    }
}

fn collapse(mut items: Vec<BoolExpr>, join: fn(Vec<BoolExpr>) -> BoolExpr) -> BoolExpr {
    if items.len() == 1
        && let Some(single) = items.pop()
    {
        return single;
    }
    join(items)
}

fn unbalanced(kind: TokenKind<'_>, offset: usize) -> ParseError {
    ParseError::Unbalanced {
        delimiter: kind.text().chars().next().unwrap_or(' '),
        offset,
    }
}

fn unexpected(kind: TokenKind<'_>, offset: usize) -> ParseError {
    ParseError::Unexpected {
        found: kind.text().to_string(),
        offset,
    }
}
