//! Expression grammar: statement-like forms, the precedence ladder, and
//! primaries.

use crate::ast::expression::{BinOp, Expr, MatchArm, Param, UnOp};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        self.skip_newlines();

        if self.check(&TokenKind::Let) || self.check(&TokenKind::Const) {
            return self.parse_let();
        }
        if self.check(&TokenKind::Fn) {
            return self.parse_fn_def();
        }
        if self.check(&TokenKind::If) {
            return self.parse_if();
        }
        if self.check(&TokenKind::Match) {
            return self.parse_match();
        }
        if self.check(&TokenKind::While) {
            return self.parse_while();
        }
        if self.check(&TokenKind::For) {
            return self.parse_for();
        }

        // Assignment needs two tokens of lookahead: `name = value`.
        if matches!(self.current().kind, TokenKind::Ident(_))
            && matches!(self.peek(1).kind, TokenKind::Assign)
        {
            return self.parse_assign();
        }

        // A `{` here is a block unless it looks like a record literal, in
        // which case the primary parser picks it up.
        if self.check(&TokenKind::LBrace) && !self.brace_starts_record() {
            return self.parse_block();
        }

        self.parse_or()
    }

    /// `let name [: T] = value` or `const name [: T] = value`.
    fn parse_let(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        let is_const = self.check(&TokenKind::Const);
        self.advance(); // let or const

        let (name, _) = self.expect_ident("expected identifier")?;

        let ty = if self.matches(&TokenKind::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Assign, "expected '='")?;
        let value = self.parse_expr()?;
        self.matches(&TokenKind::Semicolon);

        Ok(Expr::Let {
            name,
            ty,
            value: Box::new(value),
            is_const,
            location,
        })
    }

    /// `name = value`, rebinding an existing variable.
    fn parse_assign(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        let (name, _) = self.expect_ident("expected identifier")?;
        self.expect(TokenKind::Assign, "expected '='")?;
        let value = self.parse_expr()?;

        Ok(Expr::Assign {
            name,
            value: Box::new(value),
            location,
        })
    }

    /// `fn name(params) [: T] { body }` or `fn name(params) [: T] => expr`.
    fn parse_fn_def(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Fn, "expected 'fn'")?;

        let (name, _) = self.expect_ident("expected function name")?;
        let params = self.parse_params()?;

        let return_ty = if self.matches(&TokenKind::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let body = if self.matches(&TokenKind::Arrow) {
            self.parse_expr()?
        } else {
            self.parse_block()?
        };
        self.matches(&TokenKind::Semicolon);

        Ok(Expr::FnDef {
            name,
            params,
            return_ty,
            body: Box::new(body),
            location,
        })
    }

    fn parse_if(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::If, "expected 'if'")?;

        let condition = self.parse_expr()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.matches(&TokenKind::Else) {
            // `else if` chains parse as a nested if in the else slot.
            if self.check(&TokenKind::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
            location,
        })
    }

    fn parse_while(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::While, "expected 'while'")?;

        let condition = self.parse_expr()?;
        let body = self.parse_block()?;

        Ok(Expr::While {
            condition: Box::new(condition),
            body: Box::new(body),
            location,
        })
    }

    fn parse_for(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::For, "expected 'for'")?;

        let (var, _) = self.expect_ident("expected loop variable")?;
        self.expect(TokenKind::In, "expected 'in'")?;
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;

        Ok(Expr::For {
            var,
            iterable: Box::new(iterable),
            body: Box::new(body),
            location,
        })
    }

    fn parse_match(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Match, "expected 'match'")?;

        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();

        let mut arms = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let pattern = self.parse_pattern()?;

            let guard = if self.matches(&TokenKind::If) {
                Some(self.parse_expr()?)
            } else {
                None
            };

            self.expect(TokenKind::Arrow, "expected '=>'")?;
            let body = self.parse_expr()?;

            arms.push(MatchArm {
                pattern,
                guard,
                body,
            });

            if !self.check(&TokenKind::RBrace) {
                self.matches(&TokenKind::Comma);
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            location,
        })
    }

    pub(crate) fn parse_block(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();

        let mut exprs = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            exprs.push(self.parse_expr()?);
            self.skip_newlines();
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(Expr::Block(exprs, location))
    }

    // ---- precedence ladder, lowest binding first ----

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::Or) {
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::And) {
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Neq => BinOp::Neq,
                _ => break,
            };
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Lte => BinOp::Lte,
                TokenKind::Gte => BinOp::Gte,
                _ => break,
            };
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent if !matches!(self.peek(1).kind, TokenKind::LBrace) => {
                    BinOp::Mod
                }
                _ => break,
            };
            let location = self.current().location.clone();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            _ => return self.parse_call(),
        };
        let location = self.current().location.clone();
        self.advance();
        let operand = self.parse_unary()?;

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    /// Postfix call and field access, interleavable: `f(x).g(y).0`.
    fn parse_call(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::LParen) {
                let location = self.current().location.clone();
                let args = self.parse_args()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    location,
                };
            } else if self.check(&TokenKind::Dot) {
                let location = self.current().location.clone();
                self.advance();
                // A field name, or an integer for tuple indexing.
                let field = match &self.current().kind {
                    TokenKind::Ident(name) => {
                        let name = name.clone();
                        self.advance();
                        name
                    }
                    TokenKind::Int(index) => {
                        let index = index.to_string();
                        self.advance();
                        index
                    }
                    _ => return Err(self.error_here("expected field name")),
                };
                expr = Expr::FieldAccess {
                    object: Box::new(expr),
                    field,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();

        match self.current().kind.clone() {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Int(value, location))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::Float(value, location))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::Str(value, location))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, location))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, location))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name, location))
            }
            TokenKind::LParen => self.parse_paren_form(),
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.skip_newlines();
                self.expect(TokenKind::RBracket, "expected ']'")?;
                Ok(Expr::List(elements, location))
            }
            TokenKind::Percent if matches!(self.peek(1).kind, TokenKind::LBrace) => {
                self.parse_map_literal()
            }
            TokenKind::LBrace => {
                if self.brace_starts_record() {
                    self.parse_record_literal()
                } else {
                    self.parse_block()
                }
            }
            _ => Err(self.error_here("unexpected token")),
        }
    }

    /// `(` has four readings: unit `()`, a lambda `(params) => body`, a
    /// tuple `(a, b)`, or a plain parenthesized expression. Lambdas are
    /// found by trial parse; everything else by what follows.
    fn parse_paren_form(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::LParen, "expected '('")?;

        // Unit, or a zero-parameter lambda.
        if self.check(&TokenKind::RParen) {
            self.advance();
            if self.matches(&TokenKind::Arrow) {
                let body = self.parse_expr()?;
                return Ok(Expr::Lambda {
                    params: Vec::new(),
                    body: Box::new(body),
                    location,
                });
            }
            return Ok(Expr::Tuple(Vec::new(), location));
        }

        // Trial parse: identifier parameter list, `)`, `=>`.
        if matches!(self.current().kind, TokenKind::Ident(_)) {
            let saved = self.position();
            if let Some(params) = self.try_parse_lambda_params() {
                let body = self.parse_expr()?;
                return Ok(Expr::Lambda {
                    params,
                    body: Box::new(body),
                    location,
                });
            }
            self.restore(saved);
        }

        // Expression or tuple.
        let first = self.parse_expr()?;

        if self.check(&TokenKind::Comma) {
            let mut elements = vec![first];
            while self.matches(&TokenKind::Comma) {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                elements.push(self.parse_expr()?);
            }
            self.expect(TokenKind::RParen, "expected ')'")?;
            return Ok(Expr::Tuple(elements, location));
        }

        self.expect(TokenKind::RParen, "expected ')'")?;
        Ok(first)
    }

    /// The lambda trial parse body: `ident [: T] ("," ident [: T])* ")" "=>"`.
    /// Returns `None` when the stream does not continue as a lambda; the
    /// caller rewinds.
    fn try_parse_lambda_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();

        loop {
            let name = match &self.current().kind {
                TokenKind::Ident(name) => name.clone(),
                _ => return None,
            };
            self.advance();

            let ty = if self.matches(&TokenKind::Colon) {
                match self.parse_type_expr() {
                    Ok(ty) => Some(ty),
                    Err(_) => return None,
                }
            } else {
                None
            };

            params.push(Param { name, ty });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        if self.matches(&TokenKind::RParen) && self.matches(&TokenKind::Arrow) {
            Some(params)
        } else {
            None
        }
    }

    /// `{ field: value, ... }`, field order preserved.
    fn parse_record_literal(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::LBrace, "expected '{'")?;

        let mut fields = Vec::new();
        loop {
            self.skip_newlines();
            let (name, _) = self.expect_ident("expected field name")?;
            self.expect(TokenKind::Colon, "expected ':'")?;
            let value = self.parse_expr()?;
            fields.push((name, value));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.skip_newlines();
        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(Expr::Record(fields, location))
    }

    /// `%{ key: value, ... }` with arbitrary expression keys.
    fn parse_map_literal(&mut self) -> Result<Expr> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Percent, "expected '%'")?;
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();

        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let key = self.parse_expr()?;
            self.expect(TokenKind::Colon, "expected ':'")?;
            let value = self.parse_expr()?;
            entries.push((key, value));

            if !self.check(&TokenKind::RBrace) {
                self.matches(&TokenKind::Comma);
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(Expr::Map(entries, location))
    }

    /// Looking at `{`: record literal iff the next significant tokens are
    /// `IDENT :`.
    pub(crate) fn brace_starts_record(&self) -> bool {
        let mut offset = 1;
        while matches!(self.peek(offset).kind, TokenKind::Newline) {
            offset += 1;
        }
        matches!(self.peek(offset).kind, TokenKind::Ident(_))
            && matches!(self.peek(offset + 1).kind, TokenKind::Colon)
    }

    /// `(name [: T], ...)` for `fn` definitions.
    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.expect(TokenKind::LParen, "expected '('")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (name, _) = self.expect_ident("expected parameter name")?;
                let ty = if self.matches(&TokenKind::Colon) {
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                params.push(Param { name, ty });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen, "expected ')'")?;
        Ok(params)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LParen, "expected '('")?;

        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.skip_newlines();
        self.expect(TokenKind::RParen, "expected ')'")?;
        Ok(args)
    }
}
