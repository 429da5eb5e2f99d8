//! Token vocabulary of the quill language.
//!
//! Tokens are the atomic units produced by the [`crate::lexer::Lexer`] and
//! consumed by the [`crate::parser::Parser`]. A token is `(kind, lexeme,
//! span)`: the lexeme is the interned exact source slice (quotes and
//! suffixes included), so concatenating every token's slice together with
//! the skipped whitespace reproduces the input byte for byte.

use once_cell::sync::Lazy;
use quill_base::{Span, Symbol};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Control
    EndStatement,
    Comma,
    OpenScope,
    CloseScope,
    Colon,
    OpenParen,
    CloseParen,
    OpenSubscript,
    CloseSubscript,
    MemberAccess,

    // Literals
    Digits,
    Float,
    Char,
    Str,
    Bool,

    // Operators
    Assign,
    Xor,
    Or,
    And,
    Equal,
    Different,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulus,
    Increment,
    Decrement,
    Ampersand,

    Identifier,

    // Keywords
    Import,
    Export,
    If,
    Else,
    While,
    For,
    Type,
    Let,
    Function,
    Return,
    Const,

    Comment,

    Eof,
}

/// Reserved words, consulted after an identifier has been scanned.
pub static KEYWORDS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("import", TokenKind::Import);
    map.insert("export", TokenKind::Export);
    map.insert("if", TokenKind::If);
    map.insert("else", TokenKind::Else);
    map.insert("while", TokenKind::While);
    map.insert("for", TokenKind::For);
    map.insert("type", TokenKind::Type);
    map.insert("let", TokenKind::Let);
    map.insert("function", TokenKind::Function);
    map.insert("return", TokenKind::Return);
    map.insert("const", TokenKind::Const);
    map.insert("true", TokenKind::Bool);
    map.insert("false", TokenKind::Bool);
    map
});

/// Operator spellings. The lexer scans the longest run of operator
/// characters and backs off until the run matches a key here.
pub static OPERATORS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("=", TokenKind::Assign);
    map.insert("+", TokenKind::Addition);
    map.insert("-", TokenKind::Subtraction);
    map.insert("*", TokenKind::Multiplication);
    map.insert("/", TokenKind::Division);
    map.insert("%", TokenKind::Modulus);
    map.insert("^", TokenKind::Xor);
    map.insert("==", TokenKind::Equal);
    map.insert("!=", TokenKind::Different);
    map.insert("<", TokenKind::Lesser);
    map.insert("<=", TokenKind::LesserOrEqual);
    map.insert(">", TokenKind::Greater);
    map.insert(">=", TokenKind::GreaterOrEqual);
    map.insert("&&", TokenKind::And);
    map.insert("||", TokenKind::Or);
    map.insert("++", TokenKind::Increment);
    map.insert("--", TokenKind::Decrement);
    map.insert("&", TokenKind::Ampersand);
    map
});

/// Precedence of prefix operators (`++` `--` unary `+`/`-` `&` `*`).
pub const UNARY_PRECEDENCE: u8 = 3;

/// Sentinel looser than every real precedence; the entry point for
/// expression parsing.
pub const MAX_PRECEDENCE: u8 = u8::MAX;

impl TokenKind {
    /// Binary operator precedence. Lower binds tighter; `None` for tokens
    /// that are not binary operators.
    pub fn binary_precedence(self) -> Option<u8> {
        use TokenKind::*;
        match self {
            Multiplication | Division | Modulus => Some(5),
            Addition | Subtraction => Some(6),
            Lesser | LesserOrEqual | Greater | GreaterOrEqual => Some(9),
            Equal | Different => Some(10),
            Xor => Some(12),
            And => Some(14),
            Or => Some(15),
            Assign => Some(16),
            _ => None,
        }
    }

    /// `=` groups rightward; every other binary operator groups leftward.
    pub fn is_right_associative(self) -> bool {
        self == TokenKind::Assign
    }

    pub fn is_comparison(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Lesser | LesserOrEqual | Greater | GreaterOrEqual | Equal | Different
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Symbol,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Symbol, span: Span) -> Self {
        Token { kind, lexeme, span }
    }

    /// A position-less token for synthesized AST nodes (root, casts,
    /// imported declarations).
    pub fn synthetic(kind: TokenKind) -> Self {
        Token {
            kind,
            lexeme: Symbol::EMPTY,
            span: Span::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_covers_reserved_words() {
        assert_eq!(KEYWORDS.get("while"), Some(&TokenKind::While));
        assert_eq!(KEYWORDS.get("const"), Some(&TokenKind::Const));
        assert_eq!(KEYWORDS.get("true"), Some(&TokenKind::Bool));
        assert!(KEYWORDS.get("int").is_none());
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let mul = TokenKind::Multiplication.binary_precedence().unwrap();
        let add = TokenKind::Addition.binary_precedence().unwrap();
        assert!(mul < add);
    }

    #[test]
    fn assignment_is_loosest_and_right_associative() {
        let assign = TokenKind::Assign.binary_precedence().unwrap();
        for kind in [
            TokenKind::Or,
            TokenKind::And,
            TokenKind::Xor,
            TokenKind::Equal,
            TokenKind::Lesser,
            TokenKind::Addition,
            TokenKind::Multiplication,
        ] {
            assert!(kind.binary_precedence().unwrap() < assign);
            assert!(!kind.is_right_associative());
        }
        assert!(TokenKind::Assign.is_right_associative());
    }

    #[test]
    fn increment_is_not_a_binary_operator() {
        assert!(TokenKind::Increment.binary_precedence().is_none());
        assert!(TokenKind::Ampersand.binary_precedence().is_none());
    }
}
