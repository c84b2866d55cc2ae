//! Type annotation grammar.

use crate::ast::ty::TypeExpr;
use crate::error::Result;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    pub(crate) fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        let location = self.current().location.clone();

        // `(A, B) -> C` is a function type; without the arrow it is a
        // tuple type.
        if self.matches(&TokenKind::LParen) {
            let mut params = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    params.push(self.parse_type_expr()?);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "expected ')'")?;

            if self.matches(&TokenKind::Arrow) {
                let ret = self.parse_type_expr()?;
                return Ok(TypeExpr::Function {
                    params,
                    ret: Box::new(ret),
                    location,
                });
            }

            return Ok(TypeExpr::Tuple(params, location));
        }

        // `[T]`
        if self.matches(&TokenKind::LBracket) {
            let element = self.parse_type_expr()?;
            self.expect(TokenKind::RBracket, "expected ']'")?;
            return Ok(TypeExpr::List(Box::new(element), location));
        }

        // `{ name: T, ... }`
        if self.matches(&TokenKind::LBrace) {
            let mut fields = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    self.skip_newlines();
                    let (name, _) = self.expect_ident("expected field name")?;
                    self.expect(TokenKind::Colon, "expected ':'")?;
                    fields.push((name, self.parse_type_expr()?));
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.skip_newlines();
            self.expect(TokenKind::RBrace, "expected '}'")?;
            return Ok(TypeExpr::Record(fields, location));
        }

        // `Name` or `Name<T, U>`
        if matches!(self.current().kind, TokenKind::Ident(_)) {
            let (name, _) = self.expect_ident("expected type name")?;

            let mut args = Vec::new();
            if self.matches(&TokenKind::Lt) {
                loop {
                    args.push(self.parse_type_expr()?);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::Gt, "expected '>'")?;
            }

            return Ok(TypeExpr::Name {
                name,
                args,
                location,
            });
        }

        Err(self.error_here("expected type expression"))
    }
}
