//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, loosest first:
//!
//! ```text
//! |   ^   &   << >>   + -   * / // %   unary + - ~   **
//! ```
//!
//! `**` is right-associative and binds tighter than a unary operator on its
//! left (`-2 ** 2 == -4`), but its right operand may itself be unary
//! (`2 ** -1 == 0.5`).

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

pub(crate) struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    nesting: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            nesting: 0,
            max_depth,
        }
    }

    /// Parses the whole token stream as a single expression.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        let expr = self.expression()?;
        if let Some(token) = self.tokens.get(self.cursor) {
            return Err(unexpected(token));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.cursor).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.cursor);
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), ParseError> {
        match self.advance() {
            Some(token) if &token.kind == expected => Ok(()),
            Some(token) => Err(unexpected(token)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// Guards recursion so pathological nesting fails before the stack does.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.nesting += 1;
        if self.nesting > self.max_depth {
            return Err(ParseError::TooDeep {
                max: self.max_depth,
            });
        }
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::bit_or)
    }

    /// Parses one left-associative precedence level.
    fn left_assoc(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek().and_then(op_for) {
            self.cursor += 1;
            let rhs = next(self)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_or(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::bit_xor, |t| {
            matches!(t, TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn bit_xor(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::bit_and, |t| {
            matches!(t, TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn bit_and(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::shift, |t| {
            matches!(t, TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn shift(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::arith, |t| match t {
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            _ => None,
        })
    }

    fn arith(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::term, |t| match t {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(Self::unary, |t| match t {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::DoubleSlash => Some(BinaryOp::FloorDiv),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            Some(TokenKind::Tilde) => UnaryOp::Invert,
            _ => return self.power(),
        };
        self.cursor += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::unary(op, operand))
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some(TokenKind::DoubleStar)) {
            self.cursor += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.advance().cloned() else {
            return Err(ParseError::UnexpectedEnd);
        };

        match &token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(*value)),
            TokenKind::Ident(name) => {
                if matches!(self.peek(), Some(TokenKind::LParen)) {
                    self.cursor += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        function: name.clone(),
                        args,
                    })
                } else {
                    Ok(Expr::Variable(name.clone()))
                }
            }
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(&token)),
        }
    }

    /// Parses a call's argument list; the opening parenthesis is consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        loop {
            if matches!(self.peek(), Some(TokenKind::RParen)) {
                self.cursor += 1;
                return Ok(args);
            }
            args.push(self.expression()?);
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(args),
                Some(token) => return Err(unexpected(token)),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.kind.to_string(),
        position: token.position,
    }
}
