use crate::{
    common::{Error, Span},
    token::{Token, TokenKind},
};

use unicode_xid::UnicodeXID;

/// Lexer for `math` and `if` expressions.
///
/// Lexing never stops early. Characters outside the expression alphabet and
/// malformed operators are collected in `errors` so that the caller can
/// resolve every variable reference first and report those failures before
/// any syntax problem.
#[derive(Debug, Clone)]
pub struct Lexer {
    pub source: Vec<char>,
    pub errors: Vec<Error>,

    start: usize,
    current: usize,
}

pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_xid_start()
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_xid_continue()
}

impl Lexer {
    pub fn from_str(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            errors: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn lexeme(&self, span: &Span) -> String {
        self.source[span.clone()].iter().collect()
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn get_span(&self) -> Span {
        self.start..self.current
    }

    fn create_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            span: self.get_span(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_is(&self, expected: char) -> bool {
        self.peek() == Some(expected)
    }

    fn error(&mut self, message: String) {
        self.errors.push(Error {
            message,
            span: self.get_span(),
        });
    }

    fn lex_number(&mut self) -> Token {
        let radix = 10;

        while self.peek().map_or(false, |c| c.is_digit(radix)) {
            self.advance()
        }

        if self.peek_is('.') {
            self.current += 1;
            if self.peek().map_or(false, |c| c.is_digit(radix)) {
                while self.peek().map_or(false, |c| c.is_digit(radix)) {
                    self.advance()
                }
            } else {
                self.current -= 1;
            }
        }

        self.create_token(TokenKind::Number)
    }

    fn lex_ident(&mut self) -> Token {
        while self.peek().map_or(false, is_ident_continue) {
            self.advance();
        }

        self.create_token(TokenKind::Ident)
    }

    /// Pushes `double` when `c` is repeated, otherwise records `message`.
    fn lex_doubled(&mut self, c: char, double: TokenKind, tokens: &mut Vec<Token>) {
        if self.peek_is(c) {
            self.advance();
            tokens.push(self.create_token(double));
        } else {
            self.error(format!("expected '{c}' after '{c}'"));
        }
    }

    fn lex_with_equal(
        &mut self,
        single: TokenKind,
        with_equal: TokenKind,
        tokens: &mut Vec<Token>,
    ) {
        if self.peek_is('=') {
            self.advance();
            tokens.push(self.create_token(with_equal));
        } else {
            tokens.push(self.create_token(single));
        }
    }

    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            self.advance();

            match c {
                '(' => tokens.push(self.create_token(TokenKind::LeftParen)),
                ')' => tokens.push(self.create_token(TokenKind::RightParen)),
                '+' => tokens.push(self.create_token(TokenKind::Plus)),
                '-' => tokens.push(self.create_token(TokenKind::Minus)),
                '*' => tokens.push(self.create_token(TokenKind::Star)),
                '/' => tokens.push(self.create_token(TokenKind::Slash)),
                '%' => tokens.push(self.create_token(TokenKind::Percent)),
                '&' => self.lex_doubled('&', TokenKind::AndAnd, &mut tokens),
                '|' => self.lex_doubled('|', TokenKind::OrOr, &mut tokens),
                '=' => {
                    if self.peek_is('=') {
                        self.advance();
                        tokens.push(self.create_token(TokenKind::EqualEqual));
                    } else {
                        self.error("assignment is not allowed in an expression".into());
                    }
                }
                '!' => self.lex_with_equal(TokenKind::Bang, TokenKind::BangEqual, &mut tokens),
                '<' => self.lex_with_equal(TokenKind::Lesser, TokenKind::LesserEqual, &mut tokens),
                '>' => {
                    self.lex_with_equal(TokenKind::Greater, TokenKind::GreaterEqual, &mut tokens)
                }
                '.' => {
                    if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                        tokens.push(self.lex_number());
                    } else {
                        self.error("expected digits after '.'".into());
                    }
                }
                '$' => {
                    // `$name` is accepted as a variable reference; the span skips the sigil
                    if self.peek().map_or(false, is_ident_start) {
                        self.start = self.current;
                        tokens.push(self.lex_ident());
                    } else {
                        self.error("unexpected character '$'".into());
                    }
                }

                _ if c.is_whitespace() => {
                    // do nothing
                }

                _ => {
                    if c.is_ascii_digit() {
                        tokens.push(self.lex_number())
                    } else if is_ident_start(c) {
                        tokens.push(self.lex_ident())
                    } else {
                        self.error(format!("unexpected character '{c}'"));
                    }
                }
            };

            self.start = self.current;
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: self.current..self.current,
        });

        tokens
    }
}
