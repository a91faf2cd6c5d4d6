use crate::expression::ast::{BinaryOp, Expr, Func, Var};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Token, TokenKind, lex};

/// Parse a size expression. An `expr(...)` wrapper is accepted and stripped.
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let src = src.trim();
    let body = src
        .strip_prefix("expr(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(src);
    let mut parser = Parser {
        tokens: lex(body)?,
        next: 0,
    };
    let expr = parser.binary(0)?;
    match parser.peek() {
        Token {
            kind: TokenKind::End,
            ..
        } => Ok(expr),
        t => Err(ExprError::new(t.at, format!("trailing input {:?}", t.kind))),
    }
}

/// Binding power of an infix operator; higher binds tighter.
fn infix(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::Plus => (BinaryOp::Add, 1),
        TokenKind::Minus => (BinaryOp::Sub, 1),
        TokenKind::Star => (BinaryOp::Mul, 2),
        TokenKind::Slash => (BinaryOp::Div, 2),
        TokenKind::Percent => (BinaryOp::Mod, 2),
        _ => return None,
    })
}

struct Parser {
    tokens: Vec<Token>,
    next: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // `lex` always ends with `End`, and `advance` never moves past it.
        &self.tokens[self.next.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.next += 1;
        }
        token
    }

    fn close_paren(&mut self) -> Result<(), ExprError> {
        let t = self.advance();
        if t.kind == TokenKind::RParen {
            Ok(())
        } else {
            Err(ExprError::new(t.at, format!("expected ')', found {:?}", t.kind)))
        }
    }

    /// Left-associative binary expression whose operators bind tighter than `min_power`.
    fn binary(&mut self, min_power: u8) -> Result<Expr, ExprError> {
        let mut left = self.prefix()?;
        while let Some((op, power)) = infix(&self.peek().kind) {
            if power <= min_power {
                break;
            }
            self.advance();
            let right = self.binary(power)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr, ExprError> {
        let t = self.advance();
        match t.kind {
            TokenKind::Minus => Ok(Expr::Neg(Box::new(self.prefix()?))),
            TokenKind::Plus => self.prefix(),
            TokenKind::Number(v) => Ok(Expr::Num(v)),
            TokenKind::LParen => {
                let inner = self.binary(0)?;
                self.close_paren()?;
                Ok(inner)
            }
            TokenKind::Ident(name) if self.peek().kind == TokenKind::LParen => {
                self.advance();
                self.call(&name, t.at)
            }
            TokenKind::Ident(name) => Var::from_name(&name).map(Expr::Var).ok_or_else(|| {
                ExprError::new(
                    t.at,
                    format!("unknown variable '{name}' (expected width, height or dpr)"),
                )
            }),
            other => Err(ExprError::new(t.at, format!("unexpected token {other:?}"))),
        }
    }

    /// Arguments of a call whose `(` has been consumed.
    fn call(&mut self, name: &str, at: usize) -> Result<Expr, ExprError> {
        let func = Func::from_name(name)
            .ok_or_else(|| ExprError::new(at, format!("unknown function '{name}'")))?;
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.advance();
        } else {
            loop {
                args.push(self.binary(0)?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    self.close_paren()?;
                    break;
                }
            }
        }
        let (min, max) = func.arity();
        if !(min..=max).contains(&args.len()) {
            return Err(ExprError::new(
                at,
                format!("'{name}' called with {} argument(s)", args.len()),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}
