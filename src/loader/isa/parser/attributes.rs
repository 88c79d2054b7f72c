//! `key=value` attribute lists shared by directives and body entries.

use crate::isa::error::IsaError;
use crate::isa::literal::{parse_u8_literal, parse_u32_literal};

use super::{Parser, Token, TokenKind};

/// Attributes read from one directive or entry, consumed by typed accessors.
///
/// Whatever is left when [`AttributeSet::finish`] runs is reported as unknown.
pub(super) struct AttributeSet {
    context: String,
    entries: Vec<(String, Token)>,
}

impl AttributeSet {
    pub(super) fn take(&mut self, name: &str) -> Option<Token> {
        let pos = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub(super) fn bool(&mut self, name: &str) -> Result<Option<bool>, IsaError> {
        self.take(name)
            .map(|token| self.parse_bool(name, &token))
            .transpose()
    }

    pub(super) fn bool_or(&mut self, name: &str, default: bool) -> Result<bool, IsaError> {
        Ok(self.bool(name)?.unwrap_or(default))
    }

    pub(super) fn u8(&mut self, name: &str) -> Result<Option<u8>, IsaError> {
        self.take(name)
            .map(|token| {
                let token = self.numeric(name, token)?;
                parse_u8_literal(&token.lexeme).map_err(|err| self.invalid(name, &token, err))
            })
            .transpose()
    }

    pub(super) fn u32(&mut self, name: &str) -> Result<Option<u32>, IsaError> {
        self.take(name)
            .map(|token| {
                let token = self.numeric(name, token)?;
                parse_u32_literal(&token.lexeme).map_err(|err| self.invalid(name, &token, err))
            })
            .transpose()
    }

    pub(super) fn required_u8(&mut self, name: &str) -> Result<u8, IsaError> {
        self.u8(name)?.ok_or_else(|| self.missing(name))
    }

    /// Identifier or string value.
    pub(super) fn text(&mut self, name: &str) -> Result<Option<String>, IsaError> {
        self.take(name)
            .map(|token| match token.kind {
                TokenKind::Identifier | TokenKind::String => Ok(token.lexeme),
                _ => Err(IsaError::Parser(format!(
                    "{name} in {} expects a name, found '{}'",
                    self.context, token.lexeme
                ))),
            })
            .transpose()
    }

    pub(super) fn required_text(&mut self, name: &str) -> Result<String, IsaError> {
        self.text(name)?.ok_or_else(|| self.missing(name))
    }

    pub(super) fn parse_bool(&self, name: &str, token: &Token) -> Result<bool, IsaError> {
        if token.kind == TokenKind::Identifier {
            if token.lexeme.eq_ignore_ascii_case("true") {
                return Ok(true);
            }
            if token.lexeme.eq_ignore_ascii_case("false") {
                return Ok(false);
            }
        }
        Err(IsaError::Parser(format!(
            "{name} in {} expects true or false, found '{}'",
            self.context, token.lexeme
        )))
    }

    pub(super) fn finish(self) -> Result<(), IsaError> {
        match self.entries.first() {
            None => Ok(()),
            Some((key, _)) => Err(IsaError::Parser(format!(
                "unknown attribute '{key}' in {}",
                self.context
            ))),
        }
    }

    fn numeric(&self, name: &str, token: Token) -> Result<Token, IsaError> {
        if token.kind == TokenKind::Number {
            Ok(token)
        } else {
            Err(IsaError::Parser(format!(
                "{name} in {} expects a number, found '{}'",
                self.context, token.lexeme
            )))
        }
    }

    fn invalid(&self, name: &str, token: &Token, err: impl std::fmt::Display) -> IsaError {
        IsaError::Parser(format!(
            "invalid numeric literal '{}' for {name} in {}: {err}",
            token.lexeme, self.context
        ))
    }

    fn missing(&self, name: &str) -> IsaError {
        IsaError::Parser(format!("{} requires a {name} attribute", self.context))
    }
}

impl<'src> Parser<'src> {
    /// Reads `key=value` pairs while the upcoming tokens look like one.
    pub(super) fn parse_attributes(&mut self, context: &str) -> Result<AttributeSet, IsaError> {
        let mut entries: Vec<(String, Token)> = Vec::new();
        while self.at_attribute()? {
            let key = self.expect_identifier("attribute name")?;
            self.expect(TokenKind::Equals, "'=' after attribute name")?;
            let value = self.consume()?;
            if !matches!(
                value.kind,
                TokenKind::Identifier | TokenKind::Number | TokenKind::String
            ) {
                return Err(IsaError::Parser(format!(
                    "attribute '{key}' in {context} is missing a value"
                )));
            }
            let key = key.to_ascii_lowercase();
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(IsaError::Parser(format!(
                    "duplicate attribute '{key}' in {context}"
                )));
            }
            entries.push((key, value));
        }
        Ok(AttributeSet {
            context: context.to_string(),
            entries,
        })
    }

    pub(super) fn expect_identifier(&mut self, context: &str) -> Result<String, IsaError> {
        Ok(self.expect_identifier_token(context)?.lexeme)
    }
}
