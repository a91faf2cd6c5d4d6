use crate::expression::error::ExprError;

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) at: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    End,
}

impl TokenKind {
    fn punct(c: u8) -> Option<Self> {
        Some(match c {
            b'(' => Self::LParen,
            b')' => Self::RParen,
            b',' => Self::Comma,
            b'+' => Self::Plus,
            b'-' => Self::Minus,
            b'*' => Self::Star,
            b'/' => Self::Slash,
            b'%' => Self::Percent,
            _ => return None,
        })
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn byte(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn digit(&self, ahead: usize) -> bool {
        self.byte(ahead).is_some_and(|b| b.is_ascii_digit())
    }

    fn skip_while(&mut self, f: impl Fn(u8) -> bool) -> usize {
        let from = self.pos;
        while self.byte(0).is_some_and(&f) {
            self.pos += 1;
        }
        self.pos - from
    }

    /// `123`, `1.5`, `.5`, optionally followed by an exponent.
    fn number(&mut self) -> Result<TokenKind, ExprError> {
        let at = self.pos;
        self.skip_while(|b| b.is_ascii_digit());
        if self.byte(0) == Some(b'.') && self.digit(1) {
            self.pos += 1;
            self.skip_while(|b| b.is_ascii_digit());
        }
        if let Some(b'e' | b'E') = self.byte(0) {
            let marker = self.pos;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.byte(0) {
                self.pos += 1;
            }
            if self.skip_while(|b| b.is_ascii_digit()) == 0 {
                return Err(ExprError::new(marker, "exponent needs at least one digit"));
            }
        }
        self.src[at..self.pos]
            .parse()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::new(at, "malformed number"))
    }

    fn ident(&mut self) -> TokenKind {
        let at = self.pos;
        self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        TokenKind::Ident(self.src[at..self.pos].to_owned())
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        self.skip_while(|b| b.is_ascii_whitespace());
        let at = self.pos;
        let kind = match self.byte(0) {
            None => TokenKind::End,
            Some(b) if b.is_ascii_digit() || (b == b'.' && self.digit(1)) => self.number()?,
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.ident(),
            Some(b) => match TokenKind::punct(b) {
                Some(kind) => {
                    self.pos += 1;
                    kind
                }
                None => {
                    let c = self.src[at..].chars().next().unwrap_or(b as char);
                    return Err(ExprError::new(at, format!("unexpected character '{c}'")));
                }
            },
        };
        Ok(Token { kind, at })
    }
}

/// Split `src` into tokens. The last token is always [`TokenKind::End`].
pub(crate) fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let mut cursor = Cursor { src, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        let token = cursor.next_token()?;
        let done = token.kind == TokenKind::End;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
