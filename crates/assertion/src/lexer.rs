//! Tokenizer for assertion strings.

use crate::error::{ParseError, ParseErrorKind, Result};

/// Token class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind<'a> {
    /// `,` or `||`
    Or,
    /// `+` or `&&`
    And,
    LParen,
    RParen,
    /// Raw URL text, escaped names included with their parens.
    Url(&'a str),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub position: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'@' | b':' | b'/')
}

fn is_escaped_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'@' | b'+')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn token(&mut self, kind: TokenKind<'a>, len: usize) -> Token<'a> {
        let position = self.pos;
        self.pos += len;
        Token { kind, position }
    }

    pub fn next_token(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();
        let Some(b) = self.peek(0) else {
            return Ok(self.token(TokenKind::Eof, 0));
        };
        match b {
            b',' => Ok(self.token(TokenKind::Or, 1)),
            b'+' => Ok(self.token(TokenKind::And, 1)),
            b'|' if self.peek(1) == Some(b'|') => Ok(self.token(TokenKind::Or, 2)),
            b'&' if self.peek(1) == Some(b'&') => Ok(self.token(TokenKind::And, 2)),
            b')' => Ok(self.token(TokenKind::RParen, 1)),
            b'(' => {
                let escaped_at = self
                    .escaped_name_end(self.pos)
                    .is_some_and(|end| self.bytes.get(end) == Some(&b'@'));
                if escaped_at {
                    self.lex_url()
                } else {
                    Ok(self.token(TokenKind::LParen, 1))
                }
            }
            b if is_url_byte(b) => self.lex_url(),
            _ => {
                let c = self.input[self.pos..].chars().next().unwrap_or('\u{fffd}');
                Err(ParseError::new(self.pos, ParseErrorKind::UnexpectedChar(c)))
            }
        }
    }

    /// Offset just past the `)` closing an escaped name opened at `open`.
    fn escaped_name_end(&self, open: usize) -> Option<usize> {
        let mut i = open + 1;
        while self.bytes.get(i).is_some_and(|&b| is_escaped_name_byte(b)) {
            i += 1;
        }
        (i > open + 1 && self.bytes.get(i) == Some(&b')')).then_some(i + 1)
    }

    fn lex_url(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let mut i = start;
        loop {
            match self.bytes.get(i) {
                Some(b'(') => {
                    let prefix = &self.input[start..i];
                    if i != start && !prefix.ends_with(':') && !prefix.ends_with("//") {
                        break;
                    }
                    match self.escaped_name_end(i) {
                        Some(end) => i = end,
                        None => {
                            return Err(ParseError::new(i, ParseErrorKind::UnterminatedName));
                        }
                    }
                }
                Some(&b) if is_url_byte(b) => i += 1,
                _ => break,
            }
        }
        let text = &self.input[start..i];
        self.pos = i;
        Ok(Token {
            kind: TokenKind::Url(text),
            position: start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("a && b || c + d , e"),
            vec![Url("a"), And, Url("b"), Or, Url("c"), And, Url("d"), Or, Url("e"), Eof]
        );
    }

    #[test]
    fn test_url_forms() {
        use TokenKind::*;
        assert_eq!(
            kinds("web://maxk.org+bb@twitter"),
            vec![Url("web://maxk.org"), And, Url("bb@twitter"), Eof]
        );
    }

    #[test]
    fn test_escaped_names() {
        use TokenKind::*;
        assert_eq!(kinds("(a+b@c)@twitter"), vec![Url("(a+b@c)@twitter"), Eof]);
        assert_eq!(kinds("twitter:(a@b)"), vec![Url("twitter:(a@b)"), Eof]);
        assert_eq!(kinds("twitter://(a.b)"), vec![Url("twitter://(a.b)"), Eof]);
        assert_eq!(kinds("(max)"), vec![LParen, Url("max"), RParen, Eof]);
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("  max ||  dns:a.io");
        assert_eq!(lexer.next_token().unwrap().position, 2);
        assert_eq!(lexer.next_token().unwrap().position, 6);
        assert_eq!(lexer.next_token().unwrap().position, 10);
        assert_eq!(lexer.next_token().unwrap().position, 18);
    }

    #[test]
    fn test_errors() {
        let err = Lexer::new("| b").next_token().unwrap_err();
        assert_eq!(err, ParseError::new(0, ParseErrorKind::UnexpectedChar('|')));

        let err = Lexer::new("&b").next_token().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('&'));

        let err = Lexer::new("twitter:(a@b").next_token().unwrap_err();
        assert_eq!(err, ParseError::new(8, ParseErrorKind::UnterminatedName));

        let mut lexer = Lexer::new("max!");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Url("max"));
        assert_eq!(
            lexer.next_token().unwrap_err(),
            ParseError::new(3, ParseErrorKind::UnexpectedChar('!'))
        );
    }
}
