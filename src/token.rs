use crate::common::{Error, Span};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum TokenKind {
    Number,
    Ident,
    Eof,

    LeftParen,
    RightParen,
    Bang,

    // binary operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Lesser,
    Greater,
    LesserEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,

    AndAnd,
    OrOr,
}

impl TokenKind {
    pub fn is_prefix_op(&self) -> bool {
        matches!(*self, Self::Minus | Self::Bang)
    }

    pub fn is_binary_op(&self) -> bool {
        *self >= Self::Plus && *self <= Self::OrOr
    }

    pub fn is_comparitive_op(&self) -> bool {
        *self >= Self::Lesser && *self <= Self::BangEqual
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn error_at(&self, message: &str) -> Error {
        Error {
            span: self.span.clone(),
            message: message.into(),
        }
    }
}
