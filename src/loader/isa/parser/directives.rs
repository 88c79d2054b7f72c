use crate::isa::ast::{EnumDecl, EnumEntryDecl, GroupDecl, InstructionDecl, IsaItem, LutDecl};
use crate::isa::diagnostic::SourceSpan;
use crate::isa::error::IsaError;
use crate::isa::literal::parse_u32_literal;

use super::body::BodyKind;
use super::spans::span_from_tokens;
use super::{Parser, Token, TokenKind};

impl<'src> Parser<'src> {
    pub(super) fn parse_directive(&mut self) -> Result<IsaItem, IsaError> {
        self.expect(TokenKind::Colon, "directive introducer ':'")?;
        let name = self.expect_identifier("directive name")?;
        let item = match name.as_str() {
            "lut" => self.parse_lut_directive(),
            "enum" => self.parse_enum_directive(),
            "ins" => self.parse_instruction_directive(),
            "group" => self.parse_group_directive(),
            _ => Err(IsaError::Parser(format!("unsupported directive :{name}"))),
        }?;
        self.ensure_directive_boundary(&name)?;
        Ok(item)
    }

    fn parse_lut_directive(&mut self) -> Result<IsaItem, IsaError> {
        let name_token = self.expect_name_token("lookup table name")?;
        if !self.register_lut(&name_token.lexeme) {
            return Err(IsaError::Parser(format!(
                "lookup table '{}' declared more than once",
                name_token.lexeme
            )));
        }
        self.expect(TokenKind::LBrace, "'{' to start :lut block")?;
        let mut values = Vec::new();
        loop {
            let token = self.consume()?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Comma | TokenKind::Semicolon => {}
                TokenKind::Number => {
                    let value = parse_u32_literal(&token.lexeme).map_err(|err| {
                        IsaError::Parser(format!(
                            "invalid numeric literal '{}' in :lut {}: {err}",
                            token.lexeme, name_token.lexeme
                        ))
                    })?;
                    values.push(value);
                }
                TokenKind::EOF => {
                    return Err(IsaError::Parser(":lut block missing closing '}'".into()));
                }
                _ => {
                    return Err(IsaError::Parser(format!(
                        ":lut {} expects numeric values, found '{}'",
                        name_token.lexeme, token.lexeme
                    )));
                }
            }
        }
        let span = self.span_from(&name_token);
        Ok(IsaItem::Lut(LutDecl {
            name: name_token.lexeme,
            values,
            span,
        }))
    }

    fn parse_enum_directive(&mut self) -> Result<IsaItem, IsaError> {
        let name_token = self.expect_name_token("enum name")?;
        self.expect(TokenKind::LBrace, "'{' to start :enum block")?;
        let mut entries = Vec::new();
        loop {
            if self.check(TokenKind::EOF)? {
                return Err(IsaError::Parser(":enum block missing closing '}'".into()));
            }
            if self.eat(TokenKind::RBrace)? {
                break;
            }
            if self.eat(TokenKind::Comma)? || self.eat(TokenKind::Semicolon)? {
                continue;
            }
            let keyword = self.expect_identifier("enum entry ('value' or 'reserved')")?;
            match keyword.as_str() {
                "value" => {
                    let text = self.consume()?;
                    if !matches!(
                        text.kind,
                        TokenKind::Identifier | TokenKind::String | TokenKind::Number
                    ) {
                        return Err(IsaError::Parser(format!(
                            "enum value in {} needs text, found '{}'",
                            name_token.lexeme, text.lexeme
                        )));
                    }
                    let mut attrs = self.parse_attributes("enum value")?;
                    let default = attrs.bool_or("default", false)?;
                    attrs.finish()?;
                    entries.push(EnumEntryDecl::Value {
                        text: text.lexeme,
                        default,
                    });
                }
                "reserved" => entries.push(EnumEntryDecl::Reserved),
                other => {
                    return Err(IsaError::Parser(format!(
                        "unknown enum entry '{other}', expected 'value' or 'reserved'"
                    )));
                }
            }
        }
        let span = self.span_from(&name_token);
        Ok(IsaItem::Enum(EnumDecl {
            name: name_token.lexeme,
            entries,
            span,
        }))
    }

    fn parse_instruction_directive(&mut self) -> Result<IsaItem, IsaError> {
        let name_token = self.expect_name_token("instruction name")?;
        let context = format!(":ins {}", name_token.lexeme);
        let mut attrs = self.parse_attributes(&context)?;
        let opcode = attrs.u32("opcode")?;
        let opcode2 = attrs.u32("opcode2")?;
        let mut shape = self.shape_header(&mut attrs)?;
        attrs.finish()?;
        if self.check(TokenKind::LBrace)? {
            self.parse_body(&context, BodyKind::Instruction, &mut shape)?;
        }
        let span = self.span_from(&name_token);
        Ok(IsaItem::Instruction(InstructionDecl {
            name: name_token.lexeme,
            opcode,
            opcode2,
            shape,
            span,
        }))
    }

    fn parse_group_directive(&mut self) -> Result<IsaItem, IsaError> {
        let start = self.peek()?.clone();
        let name = if matches!(start.kind, TokenKind::Identifier | TokenKind::String)
            && !self.at_attribute()?
        {
            Some(self.consume()?.lexeme)
        } else {
            None
        };
        let context = match &name {
            Some(name) => format!(":group {name}"),
            None => ":group".to_string(),
        };
        let mut attrs = self.parse_attributes(&context)?;
        let opcode = attrs.u32("opcode")?;
        let opcode2 = attrs.u32("opcode2")?;
        let mut shape = self.shape_header(&mut attrs)?;
        attrs.finish()?;
        if !self.check(TokenKind::LBrace)? {
            return Err(IsaError::Parser(format!("expected '{{' to start {context} body")));
        }
        let members = self.parse_body(&context, BodyKind::Group, &mut shape)?;
        if members.is_empty() {
            return Err(IsaError::Parser(format!(
                "{context} must list at least one 'ins' member"
            )));
        }
        let span = self.span_from(&start);
        Ok(IsaItem::Group(GroupDecl {
            name,
            opcode,
            opcode2,
            shape,
            members,
            span,
        }))
    }

    pub(super) fn span_from(&self, start: &Token) -> SourceSpan {
        let end = self.last_consumed_token().unwrap_or(start);
        span_from_tokens(self.file_path(), start, end)
    }

    fn ensure_directive_boundary(&mut self, directive: &str) -> Result<(), IsaError> {
        if self.check(TokenKind::EOF)? || self.check(TokenKind::Colon)? {
            return Ok(());
        }

        let mut extras = Vec::new();
        while !self.check(TokenKind::EOF)? {
            if self.check(TokenKind::Colon)? {
                break;
            }
            extras.push(self.consume()?);
        }

        let snippet = extras
            .into_iter()
            .map(|token| token.lexeme)
            .filter(|lex| !lex.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let message = if snippet.is_empty() {
            format!("unexpected trailing tokens after :{directive}")
        } else {
            format!("unexpected trailing tokens after :{directive}: {snippet}")
        };
        Err(IsaError::Parser(message))
    }
}
