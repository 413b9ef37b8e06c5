use crate::{
    ast,
    common::Error,
    token::{Token, TokenKind},
};

/// Deepest nesting accepted in one expression. Groups, prefix operators and
/// chained binary operators each add a level.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone)]
struct Parser<'a> {
    tokens: &'a [Token],
    source: &'a [char],
    current: usize,
    depth: usize,
}

impl TokenKind {
    fn precedence(&self) -> u8 {
        match self {
            Self::Star | Self::Slash | Self::Percent => 6,
            Self::Plus | Self::Minus => 5,
            Self::Lesser | Self::LesserEqual | Self::Greater | Self::GreaterEqual => 4,
            Self::EqualEqual | Self::BangEqual => 3,
            Self::AndAnd => 2,
            Self::OrOr => 1,
            _ => 0,
        }
    }
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], source: &'a [char]) -> Self {
        Parser {
            tokens,
            source,
            current: 0,
            depth: 0,
        }
    }

    fn descend(&mut self, token: &Token) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            Err(token.error_at("expression nested too deeply"))
        } else {
            Ok(())
        }
    }

    fn lexeme(&self, token: &Token) -> String {
        self.source[token.span.clone()].iter().collect()
    }

    fn peek(&self) -> Result<&Token, Error> {
        if let Some(token) = self.tokens.get(self.current) {
            Ok(token)
        } else {
            Err(Error {
                message: "unexpected end of expression".into(),
                span: self.source.len()..self.source.len(),
            })
        }
    }

    fn error_at_current(&self, message: &str) -> Error {
        match self.tokens.get(self.current) {
            Some(token) => token.error_at(message),
            None => Error {
                message: message.into(),
                span: self.source.len()..self.source.len(),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<&Token, Error> {
        if let Some(token) = self.tokens.get(self.current) {
            if token.kind == kind {
                self.current += 1;
                Ok(token)
            } else {
                Err(token.error_at(message))
            }
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn parse_primary(&mut self) -> Result<ast::Expr, Error> {
        let token = self.peek()?.clone();

        match &token.kind {
            TokenKind::LeftParen => {
                self.descend(&token)?;
                self.current += 1;
                let inner = self.parse_expr()?;
                let end = self
                    .expect(TokenKind::RightParen, "missing closing ')' in grouping")?
                    .span
                    .end;
                self.depth -= 1;
                Ok(ast::Expr {
                    span: token.span.start..end,
                    kind: inner.kind,
                })
            }
            TokenKind::Number => {
                self.current += 1;
                let lexeme = self.lexeme(&token);
                let value = lexeme
                    .parse::<f64>()
                    .map_err(|_| token.error_at("malformed number"))?;
                Ok(ast::Expr {
                    span: token.span.clone(),
                    kind: ast::NumberLit { value }.into(),
                })
            }
            TokenKind::Ident => {
                self.current += 1;
                Ok(ast::Expr {
                    span: token.span.clone(),
                    kind: ast::VarExpr {
                        name: self.lexeme(&token),
                    }
                    .into(),
                })
            }
            _ if token.kind.is_prefix_op() => {
                self.descend(&token)?;
                self.current += 1;
                let target = self.parse_primary()?;
                self.depth -= 1;
                Ok(ast::Expr {
                    span: token.span.start..target.span.end,
                    kind: ast::UnaryExpr {
                        op: token.clone(),
                        expr: Box::new(target),
                    }
                    .into(),
                })
            }
            TokenKind::Eof => Err(self.error_at_current("expected expression")),
            _ => Err(self.error_at_current("expected operand")),
        }
    }

    // Precedence climbing; every binary operator is left associative.
    fn parse_prec_expr(&mut self, mut lhs: ast::Expr, min_prec: u8) -> Result<ast::Expr, Error> {
        let mut lookahead = self.peek()?.clone();
        // each operator wraps `lhs` one level deeper
        let mut chain = 0;

        while lookahead.kind.is_binary_op() && lookahead.kind.precedence() >= min_prec {
            let op = lookahead;
            self.descend(&op)?;
            chain += 1;
            self.current += 1;
            let mut rhs = self.parse_primary()?;
            lookahead = self.peek()?.clone();

            while lookahead.kind.is_binary_op()
                && lookahead.kind.precedence() > op.kind.precedence()
            {
                rhs = self.parse_prec_expr(rhs, op.kind.precedence() + 1)?;
                lookahead = self.peek()?.clone();
            }

            lhs = ast::Expr {
                span: lhs.span.start..rhs.span.end,
                kind: ast::BinaryExpr {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                }
                .into(),
            };
        }

        self.depth -= chain;
        Ok(lhs)
    }

    fn parse_expr(&mut self) -> Result<ast::Expr, Error> {
        let primary = self.parse_primary()?;
        self.parse_prec_expr(primary, 1)
    }
}

/// Parses a whole expression. `tokens` must end with an `Eof` token.
pub fn parse(tokens: &[Token], source: &[char]) -> Result<ast::Expr, Error> {
    let mut parser = Parser::new(tokens, source);
    let expr = parser.parse_expr()?;
    if parser.peek()?.kind != TokenKind::Eof {
        return Err(parser.error_at_current("unexpected token after expression"));
    }

    Ok(expr)
}
