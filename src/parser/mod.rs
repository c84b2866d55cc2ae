//! # Parser
//!
//! A recursive-descent parser over the token stream. Binary operators are
//! handled by precedence climbing (one function per level, all
//! left-associative); the few ambiguous spots are resolved by bounded
//! lookahead or by a trial parse with position save/restore:
//!
//! - `{` starts a record literal when the next significant tokens are
//!   `IDENT :`, otherwise a block.
//! - `(` starts unit, a tuple, a parenthesized expression, or a lambda;
//!   lambdas are detected by trying to read a parameter list followed by
//!   `)` and `=>`, rewinding on failure.
//!
//! The first error aborts the parse and carries the offending token's
//! location.
//!
//! Grammar functions are split by category:
//! - this module: declarations (`type`, `module`, `import`) and the program
//! - [`expression`]: expression forms and the precedence ladder
//! - [`pattern`]: `match` patterns
//! - [`typeexpr`]: type annotations

use std::mem;

use crate::ast::{Decl, ImportDecl, ModuleDef, Program, TypeConstructor, TypeDef};
use crate::error::{Error, Result, SourceLocation};
use crate::lexer::{Token, TokenKind};

mod expression;
mod pattern;
mod typeexpr;

/// Parse a token stream (as produced by [`crate::lexer::tokenize`]) into a
/// program.
pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        ));
        Self { tokens, pos: 0 }
    }

    // ---- primitives ----

    pub(crate) fn current(&self) -> &Token {
        // The stream always ends in EOF, so clamp to the last token.
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream is never empty")
        })
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream is never empty")
        })
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Same token kind, ignoring payloads.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current().kind) == mem::discriminant(kind)
    }

    /// Consume the token if it matches.
    pub(crate) fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, msg: &str) -> Result<Token> {
        if !self.check(&kind) {
            return Err(self.error_here(msg));
        }
        let token = self.current().clone();
        self.advance();
        Ok(token)
    }

    pub(crate) fn expect_ident(&mut self, msg: &str) -> Result<(String, SourceLocation)> {
        match &self.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let loc = self.current().location.clone();
                self.advance();
                Ok((name, loc))
            }
            _ => Err(self.error_here(msg)),
        }
    }

    pub(crate) fn error_here(&self, msg: &str) -> Error {
        Error::parse(
            format!("{msg}, found {}", self.current().kind.describe()),
            self.current().location.clone(),
        )
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Save/restore the stream position for trial parses.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn restore(&mut self, position: usize) {
        self.pos = position;
    }

    // ---- program and declarations ----

    fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::default();
        self.skip_newlines();

        while !self.is_at_end() {
            program.declarations.push(self.parse_decl()?);
            self.skip_newlines();
        }

        Ok(program)
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        self.skip_newlines();

        if self.check(&TokenKind::Type) {
            return Ok(Decl::Type(self.parse_type_def()?));
        }
        if self.check(&TokenKind::Module) {
            return Ok(Decl::Module(self.parse_module_def()?));
        }
        if self.check(&TokenKind::Import) {
            return Ok(Decl::Import(self.parse_import()?));
        }

        Ok(Decl::Expr(self.parse_expr()?))
    }

    /// `type Name[<T, U>] { Ctor, Ctor(T, U), ... }`
    fn parse_type_def(&mut self) -> Result<TypeDef> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Type, "expected 'type'")?;

        let (name, _) = self.expect_ident("expected type name")?;

        let mut type_params = Vec::new();
        if self.matches(&TokenKind::Lt) {
            loop {
                let (param, _) = self.expect_ident("expected type parameter")?;
                type_params.push(param);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "expected '>'")?;
        }

        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();

        let mut constructors = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let (ctor_name, _) = self.expect_ident("expected constructor name")?;
            let mut fields = Vec::new();

            if self.matches(&TokenKind::LParen) {
                if !self.check(&TokenKind::RParen) {
                    loop {
                        fields.push(self.parse_type_expr()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
            }

            constructors.push(TypeConstructor {
                name: ctor_name,
                fields,
            });

            if !self.check(&TokenKind::RBrace) {
                self.matches(&TokenKind::Comma);
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(TypeDef {
            name,
            type_params,
            constructors,
            location,
        })
    }

    /// `module Name { expr* }`
    fn parse_module_def(&mut self) -> Result<ModuleDef> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Module, "expected 'module'")?;

        let (name, _) = self.expect_ident("expected module name")?;

        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();

        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            body.push(self.parse_expr()?);
            self.skip_newlines();
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(ModuleDef {
            name,
            body,
            location,
        })
    }

    /// `import Name [as Alias] [;]`
    fn parse_import(&mut self) -> Result<ImportDecl> {
        let location = self.current().location.clone();
        self.expect(TokenKind::Import, "expected 'import'")?;

        let (module_name, _) = self.expect_ident("expected module name")?;

        let alias = if self.matches(&TokenKind::As) {
            let (alias, _) = self.expect_ident("expected alias name")?;
            Some(alias)
        } else {
            None
        };

        self.matches(&TokenKind::Semicolon);

        Ok(ImportDecl {
            module_name,
            alias,
            location,
        })
    }
}
