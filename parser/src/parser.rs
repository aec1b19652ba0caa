//! Recursive-descent parser for ASDL.
//!
//! ```text
//! module      := "module" NAME ["version" STRING] "{" definition* "}"
//! definition  := NAME "=" (product | sum)
//! product     := fields ["attributes" fields]
//! sum         := constructor ("|" constructor)* ["attributes" fields]
//! constructor := NAME [fields]
//! fields      := "(" [field ("," field)*] ")"
//! field       := NAME ["?" | "*"] NAME
//! ```

use asdl_schema_core::{Constructor, Field, FieldQualifier, Module, Product, Sum, Type};
use tracing::debug;

use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    filename: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens`, which must end with [`TokenKind::Eof`].
    pub fn new(tokens: Vec<Token>, filename: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            filename,
        }
    }

    pub fn parse_module(&mut self) -> Result<Module, SyntaxError> {
        self.expect_keyword("module")?;
        let name = self.expect_name("module name")?;

        if self.at_keyword("version") {
            self.advance();
            match self.peek().kind.clone() {
                TokenKind::String(version) => {
                    self.advance();
                    debug!(module = %name, version = %version, "Module declares a version string");
                }
                _ => return Err(self.unexpected("version string")),
            }
        }

        self.expect(TokenKind::LBrace)?;
        let mut module = Module::new(&name);
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            module.body.push(self.parse_definition()?);
        }
        self.expect(TokenKind::RBrace)?;
        self.expect(TokenKind::Eof)?;
        Ok(module)
    }

    fn parse_definition(&mut self) -> Result<Type, SyntaxError> {
        let name = self.expect_name("type name")?;
        self.expect(TokenKind::Equals)?;

        if self.peek().kind == TokenKind::LParen {
            let fields = self.parse_fields()?;
            let attributes = self.parse_attributes()?;
            return Ok(Type::product(&name, Product { fields, attributes }));
        }

        let mut types = vec![self.parse_constructor()?];
        while self.peek().kind == TokenKind::Pipe {
            self.advance();
            types.push(self.parse_constructor()?);
        }
        let attributes = self.parse_attributes()?;
        Ok(Type::sum(&name, Sum { types, attributes }))
    }

    fn parse_constructor(&mut self) -> Result<Constructor, SyntaxError> {
        let name = self.expect_name("constructor name")?;
        if self.peek().kind == TokenKind::LParen {
            let fields = self.parse_fields()?;
            return Ok(Constructor::with_fields(&name, fields));
        }
        Ok(Constructor::new(&name))
    }

    fn parse_attributes(&mut self) -> Result<Vec<Field>, SyntaxError> {
        if !self.at_keyword("attributes") || self.peek_nth(1).kind != TokenKind::LParen {
            return Ok(Vec::new());
        }
        self.advance();
        self.parse_fields()
    }

    fn parse_fields(&mut self) -> Result<Vec<Field>, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let mut fields = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.advance();
            return Ok(fields);
        }

        loop {
            fields.push(self.parse_field()?);
            match self.peek().kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    return Ok(fields);
                }
                _ => return Err(self.unexpected("`,` or `)`")),
            }
        }
    }

    fn parse_field(&mut self) -> Result<Field, SyntaxError> {
        let kind = self.expect_name("field type")?;
        let qualifier = match self.peek().kind {
            TokenKind::Question => {
                self.advance();
                FieldQualifier::Optional
            }
            TokenKind::Star => {
                self.advance();
                FieldQualifier::Sequence
            }
            _ => FieldQualifier::Required,
        };
        let name = self.expect_name("field name")?;
        Ok(Field::new(&kind, &name, qualifier))
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        // the final Eof token absorbs any lookahead past the end
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(name) if name == keyword)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if self.at_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{keyword}`")))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            self.filename,
            token.line,
            token.column,
            format!("expected {expected}, found {}", token.kind),
        )
    }
}
