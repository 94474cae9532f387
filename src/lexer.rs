//! Tokenizes the ASCII/Unicode LTL surface syntax of the spec's external
//! interface section into a stream of `Token`s, tracking byte offsets so the
//! parser can report precise `ParseError` positions.

use crate::error::LtlError;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Implies,
    Iff,
    Next,
    Globally,
    Finally,
    Until,
    Release,
    Yesterday,
    Since,
    Triggered,
    Past,
    Historically,
    True,
    False,
    Atom(String),
    Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LtlError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn starts_with_at(&self, pos: usize, pat: &str) -> bool {
        self.src[pos..].starts_with(pat)
    }

    fn advance_by(&mut self, bytes: usize) {
        let target = match self.chars.peek() {
            Some(&(p, _)) => p + bytes,
            None => self.src.len(),
        };
        while let Some(&(p, _)) = self.chars.peek() {
            if p >= target {
                break;
            }
            self.chars.next();
        }
    }

    fn next_token(&mut self) -> Result<Token, LtlError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                _ => break,
            }
        }

        let pos = match self.chars.peek() {
            Some(&(p, _)) => p,
            None => self.src.len(),
        };

        macro_rules! lit {
            ($text:expr, $kind:expr) => {
                if self.starts_with_at(pos, $text) {
                    self.advance_by($text.len());
                    return Ok(Token { kind: $kind, pos });
                }
            };
        }

        // Multi-character aliases must be tried longest-first.
        lit!("<->", TokenKind::Iff);
        lit!("<=>", TokenKind::Iff);
        lit!("->", TokenKind::Implies);
        lit!("=>", TokenKind::Implies);
        lit!("&&", TokenKind::And);
        lit!("/\\", TokenKind::And);
        lit!("||", TokenKind::Or);
        lit!("\\/", TokenKind::Or);
        lit!("[]", TokenKind::Globally);
        lit!("<>", TokenKind::Finally);
        lit!("↔", TokenKind::Iff);
        lit!("→", TokenKind::Implies);
        lit!("∧", TokenKind::And);
        lit!("∨", TokenKind::Or);
        lit!("¬", TokenKind::Not);
        lit!("○", TokenKind::Next);
        lit!("□", TokenKind::Globally);
        lit!("◇", TokenKind::Finally);
        lit!("⊤", TokenKind::True);
        lit!("⊥", TokenKind::False);

        let c = match self.peek_char() {
            None => return Ok(Token { kind: TokenKind::Eof, pos }),
            Some(c) => c,
        };

        match c {
            '(' => {
                self.bump();
                Ok(Token { kind: TokenKind::LParen, pos })
            }
            ')' => {
                self.bump();
                Ok(Token { kind: TokenKind::RParen, pos })
            }
            '!' | '~' => {
                self.bump();
                Ok(Token { kind: TokenKind::Not, pos })
            }
            '&' => {
                self.bump();
                Ok(Token { kind: TokenKind::And, pos })
            }
            '|' => {
                self.bump();
                Ok(Token { kind: TokenKind::Or, pos })
            }
            c if c.is_alphabetic() || c == '_' => self.lex_identifier(pos),
            other => Err(LtlError::parse(
                pos,
                format!("unexpected character '{}'", other),
            )),
        }
    }

    fn lex_identifier(&mut self, pos: usize) -> Result<Token, LtlError> {
        let mut end = pos;
        while let Some(&(p, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = p + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.src[pos..end];
        let kind = match text {
            "NOT" => TokenKind::Not,
            "X" => TokenKind::Next,
            "G" => TokenKind::Globally,
            "F" => TokenKind::Finally,
            "U" => TokenKind::Until,
            "R" | "V" => TokenKind::Release,
            "Y" => TokenKind::Yesterday,
            "S" => TokenKind::Since,
            "T" => TokenKind::Triggered,
            "P" => TokenKind::Past,
            "H" => TokenKind::Historically,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Atom(text.to_string()),
        };
        Ok(Token { kind, pos })
    }
}
