//! Pattern grammar for `match` arms.

use crate::ast::pattern::{LiteralPattern, Pattern};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern> {
        let location = self.current().location.clone();

        match self.current().kind.clone() {
            // `_` is lexed as an identifier; it is the wildcard.
            TokenKind::Ident(name) if name == "_" => {
                self.advance();
                Ok(Pattern::Wildcard(location))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Pattern::Literal(LiteralPattern::Int(value), location))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Pattern::Literal(LiteralPattern::Float(value), location))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Pattern::Literal(LiteralPattern::Str(value), location))
            }
            TokenKind::True => {
                self.advance();
                Ok(Pattern::Literal(LiteralPattern::Bool(true), location))
            }
            TokenKind::False => {
                self.advance();
                Ok(Pattern::Literal(LiteralPattern::Bool(false), location))
            }
            TokenKind::LBracket => self.parse_list_pattern(),
            TokenKind::LParen => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_pattern()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(Pattern::Tuple(elements, location))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                if !self.check(&TokenKind::RBrace) {
                    loop {
                        self.skip_newlines();
                        let (name, _) = self.expect_ident("expected field name")?;
                        self.expect(TokenKind::Colon, "expected ':'")?;
                        let pattern = self.parse_pattern()?;
                        fields.push((name, pattern));
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.skip_newlines();
                self.expect(TokenKind::RBrace, "expected '}'")?;
                Ok(Pattern::Record(fields, location))
            }
            TokenKind::Ident(name) => {
                self.advance();

                // `Name(...)` is a constructor pattern, a bare name binds.
                if self.matches(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_pattern()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')'")?;
                    return Ok(Pattern::Constructor {
                        name,
                        args,
                        location,
                    });
                }

                Ok(Pattern::Var(name, location))
            }
            _ => Err(self.error_here("expected pattern")),
        }
    }

    /// `[p1, p2]` or `[p1, ...rest]`; the rest name captures the suffix.
    fn parse_list_pattern(&mut self) -> Result<Pattern> {
        let location = self.current().location.clone();
        self.expect(TokenKind::LBracket, "expected '['")?;

        let mut elements = Vec::new();
        let mut rest = None;

        if !self.check(&TokenKind::RBracket) {
            loop {
                if self.matches(&TokenKind::Ellipsis) {
                    let (name, _) = self.expect_ident("expected identifier after '...'")?;
                    rest = Some(name);
                    break;
                }
                elements.push(self.parse_pattern()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBracket, "expected ']'")?;

        Ok(Pattern::List {
            elements,
            rest,
            location,
        })
    }
}
