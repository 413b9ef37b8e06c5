use std::ops::Range;

/// Character range into the expression text being lexed.
pub type Span = Range<usize>;

/// Syntax error raised while lexing or parsing an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub message: String,
    pub span: Span,
}
