//! Shape bodies: the `{ ... }` block of an instruction or group.

use crate::isa::ast::{
    BodyEntry, DestDecl, GroupMemberDecl, ImmediateDecl, LaneDecl, ShapeDecl, SourceDecl,
    StagingDecl,
};
use crate::isa::error::IsaError;
use crate::isa::literal::parse_u8_literal;
use crate::isa::modifier::ModifierSpec;

use super::attributes::AttributeSet;
use super::{Parser, TokenKind};

/// Whether `ins` members are allowed in the body being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BodyKind {
    Instruction,
    Group,
}

impl<'src> Parser<'src> {
    /// Reads the `srcs=` / `dests=` header attributes into an empty shape.
    pub(super) fn shape_header(&mut self, attrs: &mut AttributeSet) -> Result<ShapeDecl, IsaError> {
        Ok(ShapeDecl {
            implicit_srcs: attrs.u8("srcs")?.unwrap_or(0),
            implicit_dests: attrs.u8("dests")?.unwrap_or(0),
            entries: Vec::new(),
        })
    }

    /// Parses a braced body into `shape`, returning the group members it lists.
    pub(super) fn parse_body(
        &mut self,
        context: &str,
        kind: BodyKind,
        shape: &mut ShapeDecl,
    ) -> Result<Vec<GroupMemberDecl>, IsaError> {
        self.expect(TokenKind::LBrace, &format!("'{{' to start {context} body"))?;
        let mut members = Vec::new();
        loop {
            if self.check(TokenKind::EOF)? {
                return Err(IsaError::Parser(format!("{context} body missing closing '}}'")));
            }
            if self.eat(TokenKind::RBrace)? {
                break;
            }
            if self.eat(TokenKind::Comma)? || self.eat(TokenKind::Semicolon)? {
                continue;
            }
            if self.at_attribute()? {
                let stray = self.expect_identifier("attribute")?;
                return Err(IsaError::Parser(format!(
                    "attribute '{stray}' in {context} body does not follow an entry"
                )));
            }
            let keyword = self.expect_identifier_token("body entry")?;
            match keyword.lexeme.as_str() {
                "src" => shape.entries.push(BodyEntry::Source(self.parse_source()?)),
                "dest" => shape.entries.push(BodyEntry::Dest(DestDecl {
                    name: self.optional_entry_name()?.unwrap_or_default(),
                })),
                "sr" => shape.entries.push(BodyEntry::Staging(self.parse_staging()?)),
                "imm" => shape.entries.push(BodyEntry::Immediate(self.parse_immediate()?)),
                "mod" => shape.entries.push(BodyEntry::Modifier(self.parse_modifier()?)),
                "ins" if kind == BodyKind::Group => {
                    let name_token = self.expect_name_token("group member name")?;
                    let mut attrs = self.parse_attributes(&format!("ins {}", name_token.lexeme))?;
                    let opcode = attrs.u32("opcode")?;
                    let opcode2 = attrs.u32("opcode2")?;
                    attrs.finish()?;
                    let span = self.span_from(&name_token);
                    members.push(GroupMemberDecl {
                        name: name_token.lexeme,
                        opcode,
                        opcode2,
                        span,
                    });
                }
                "ins" => {
                    return Err(IsaError::Parser(format!(
                        "'ins' members are only allowed inside :group, not {context}"
                    )));
                }
                tag => shape.entries.push(BodyEntry::CatalogModifier(tag.to_string())),
            }
        }
        Ok(members)
    }

    /// Optional positional name. Only quoted strings qualify, since a bare identifier would be
    /// read as the next entry.
    fn optional_entry_name(&mut self) -> Result<Option<String>, IsaError> {
        if self.check(TokenKind::String)? {
            return Ok(Some(self.consume()?.lexeme));
        }
        Ok(None)
    }

    fn parse_source(&mut self) -> Result<SourceDecl, IsaError> {
        let name = self.optional_entry_name()?.unwrap_or_default();
        let mut attrs = self.parse_attributes("src")?;
        let lane = match attrs.take("lane") {
            None => None,
            Some(token) if token.kind == TokenKind::Number => {
                let at = parse_u8_literal(&token.lexeme).map_err(|err| {
                    IsaError::Parser(format!(
                        "invalid numeric literal '{}' for lane in src: {err}",
                        token.lexeme
                    ))
                })?;
                Some(LaneDecl::At(at))
            }
            Some(token) => attrs.parse_bool("lane", &token)?.then_some(LaneDecl::Auto),
        };
        let decl = SourceDecl {
            name,
            size: attrs.u8("size")?,
            float: attrs.bool_or("float", false)?,
            swizzle: attrs.bool_or("swizzle", false)?,
            widen: attrs.bool_or("widen", false)?,
            lanes: attrs.bool_or("lanes", false)?,
            lane,
            absneg: attrs.bool_or("absneg", false)?,
            not: attrs.bool_or("not", false)?,
        };
        attrs.finish()?;
        Ok(decl)
    }

    fn parse_staging(&mut self) -> Result<StagingDecl, IsaError> {
        let name = self.optional_entry_name()?.unwrap_or_default();
        let mut attrs = self.parse_attributes("sr")?;
        let decl = StagingDecl {
            name,
            read: attrs.bool_or("read", false)?,
            write: attrs.bool_or("write", false)?,
            count: attrs.u8("count")?.unwrap_or(0),
            flags: attrs.bool_or("flags", true)?,
        };
        attrs.finish()?;
        Ok(decl)
    }

    fn parse_immediate(&mut self) -> Result<ImmediateDecl, IsaError> {
        let mut attrs = self.parse_attributes("imm")?;
        let decl = ImmediateDecl {
            name: attrs.required_text("name")?,
            start: attrs.required_u8("start")?,
            size: attrs.required_u8("size")?,
            signed: attrs.bool_or("signed", false)?,
        };
        attrs.finish()?;
        Ok(decl)
    }

    fn parse_modifier(&mut self) -> Result<ModifierSpec, IsaError> {
        let mut attrs = self.parse_attributes("mod")?;
        let spec = ModifierSpec {
            name: attrs.required_text("name")?,
            start: attrs.required_u8("start")?,
            size: attrs.required_u8("size")?,
            implied: attrs.bool_or("implied", false)?,
        };
        attrs.finish()?;
        Ok(spec)
    }
}
