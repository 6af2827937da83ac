//! Tokenizer and operand extraction for conformance expressions.
//!
//! [`Lexer`] is strict and feeds the parser. [`operands`] is lenient: it
//! scans for identifiers the same way regardless of whether the rest of the
//! expression is well-formed, so missing-operand and `desc` detection work
//! on any input.
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::ParseError;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Identifier (`[A-Za-z][A-Za-z0-9_]*`).
    Ident(&'a str),
    /// `&`
    And,
    /// `|`
    Or,
    /// `!`
    Not,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
}

impl TokenKind<'_> {
    /// Source text of the token.
    #[must_use]
    pub const fn text(&self) -> &str {
        match self {
            Self::Ident(name) => *name,
            Self::And => "&",
            Self::Or => "|",
            Self::Not => "!",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
        }
    }
}

/// A token with its byte offset in the source expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What the token is.
    pub kind: TokenKind<'a>,
    /// Byte offset of the first character.
    pub offset: usize,
}

/// Strict tokenizer over an expression string. Whitespace is skipped.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `src`.
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn identifier(&mut self, start: usize) -> &'a str {
        let mut end = start + 1;
        while let Some(&(i, c)) = self.chars.peek() {
            if !is_ident_continue(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        self.src.get(start..end).unwrap_or_default()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, c) = loop {
            let (i, c) = self.chars.next()?;
            if !c.is_whitespace() {
                break (i, c);
            }
        };
        let kind = match c {
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '!' => TokenKind::Not,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            c if c.is_ascii_alphabetic() => TokenKind::Ident(self.identifier(offset)),
            ch => return Some(Err(ParseError::IllegalCharacter { ch, offset })),
        };
        Some(Ok(Token { kind, offset }))
    }
}

/// Tokenize a whole expression.
///
/// # Errors
///
/// Returns [`ParseError::IllegalCharacter`] for any character outside the grammar.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer::new(src).collect()
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Extract every identifier referenced in `expression`, de-duplicated in
/// first-seen order.
///
/// Abbreviations and reserved operands are included; callers filter them as
/// needed. Never fails: characters outside identifiers are skipped.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::lexer::operands;
///
/// assert_eq!(operands("Matter & (PIN | RID), [LT]"), ["Matter", "PIN", "RID", "LT"]);
/// assert_eq!(operands("A & A"), ["A"]);
/// ```
#[must_use]
pub fn operands(expression: &str) -> Vec<&str> {
    let mut found: Vec<&str> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in expression.char_indices() {
        match start {
            Some(s) if !is_ident_continue(c) => {
                push_unique(&mut found, expression.get(s..i));
                start = None;
            }
            None if c.is_ascii_alphabetic() => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        push_unique(&mut found, expression.get(s..));
    }
    found
}

fn push_unique<'a>(found: &mut Vec<&'a str>, name: Option<&'a str>) {
    if let Some(name) = name
        && !found.contains(&name)
    {
        found.push(name);
    }
}
