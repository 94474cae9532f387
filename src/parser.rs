//! Recursive-descent parser over the token stream produced by `lexer`.
//!
//! Precedence, high to low: unary operators > `U`/`R`/`S`/`T` > `∧` > `∨` >
//! `→` > `↔`. Implication is right-associative; every other binary operator
//! is left-associative.

use crate::error::LtlError;
use crate::formula::{Formula, FormulaPtr};
use crate::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, LtlError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser { tokens, index: 0 })
    }

    pub fn parse_formula(input: &str) -> Result<FormulaPtr, LtlError> {
        let mut parser = Self::new(input)?;
        let formula = parser.parse_iff()?;
        parser.expect_eof()?;
        Ok(formula)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<(), LtlError> {
        match self.peek().kind {
            TokenKind::Eof => Ok(()),
            _ => Err(LtlError::parse(
                self.peek().pos,
                "trailing input after formula",
            )),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), LtlError> {
        if &self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(LtlError::parse(self.peek().pos, format!("expected {}", what)))
        }
    }

    fn parse_iff(&mut self) -> Result<FormulaPtr, LtlError> {
        let mut lhs = self.parse_implies()?;
        while matches!(self.peek().kind, TokenKind::Iff) {
            self.advance();
            let rhs = self.parse_implies()?;
            lhs = Formula::iff(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> Result<FormulaPtr, LtlError> {
        let lhs = self.parse_or()?;
        if matches!(self.peek().kind, TokenKind::Implies) {
            self.advance();
            let rhs = self.parse_implies()?;
            return Ok(Formula::implies(lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<FormulaPtr, LtlError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek().kind, TokenKind::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Formula::or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<FormulaPtr, LtlError> {
        let mut lhs = self.parse_until_family()?;
        while matches!(self.peek().kind, TokenKind::And) {
            self.advance();
            let rhs = self.parse_until_family()?;
            lhs = Formula::and(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_until_family(&mut self) -> Result<FormulaPtr, LtlError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let ctor: fn(FormulaPtr, FormulaPtr) -> FormulaPtr = match self.peek().kind {
                TokenKind::Until => Formula::until,
                TokenKind::Release => Formula::release,
                TokenKind::Since => Formula::since,
                TokenKind::Triggered => Formula::triggered,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = ctor(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<FormulaPtr, LtlError> {
        let ctor: fn(FormulaPtr) -> FormulaPtr = match self.peek().kind {
            TokenKind::Not => Formula::not,
            TokenKind::Next => Formula::next,
            TokenKind::Globally => Formula::globally,
            TokenKind::Finally => Formula::finally,
            TokenKind::Yesterday => Formula::yesterday,
            TokenKind::Past => Formula::past,
            TokenKind::Historically => Formula::historically,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(ctor(operand))
    }

    fn parse_primary(&mut self) -> Result<FormulaPtr, LtlError> {
        match self.peek().kind.clone() {
            TokenKind::True => {
                self.advance();
                Ok(Formula::truth())
            }
            TokenKind::False => {
                self.advance();
                Ok(Formula::falsity())
            }
            TokenKind::Atom(name) => {
                self.advance();
                Ok(Formula::atom(name))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_iff()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Eof => Err(LtlError::parse(self.peek().pos, "unexpected end of input")),
            _ => Err(LtlError::parse(self.peek().pos, "expected a formula")),
        }
    }
}
