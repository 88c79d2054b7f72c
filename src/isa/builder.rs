//! Helpers for constructing `IsaDocument`s programmatically without routing through the file parser.
//!
//! The builder keeps source spans consistent so downstream diagnostics can still attach to
//! deterministic locations even when the description is produced in memory.

use std::path::PathBuf;

use crate::isa::ast::{
    BodyEntry, DestDecl, EnumDecl, EnumEntryDecl, GroupDecl, GroupMemberDecl, ImmediateDecl,
    InstructionDecl, IsaDocument, IsaItem, LutDecl, ShapeDecl, SourceDecl, StagingDecl,
};
use crate::isa::diagnostic::{SourcePosition, SourceSpan};
use crate::isa::modifier::ModifierSpec;

/// Convenience wrapper for assembling a full description in memory.
pub struct IsaBuilder {
    path: PathBuf,
    span: SourceSpan,
    items: Vec<IsaItem>,
}

impl IsaBuilder {
    /// Creates a new builder that pretends every element originated from `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let span = SourceSpan::point(path.clone(), SourcePosition::new(1, 1));
        Self {
            path,
            span,
            items: Vec::new(),
        }
    }

    /// Appends a named lookup table of immediate constants.
    pub fn lut(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = u32>,
    ) -> &mut Self {
        self.items.push(IsaItem::Lut(LutDecl {
            name: name.into(),
            values: values.into_iter().collect(),
            span: self.span.clone(),
        }));
        self
    }

    /// Begins an enum declaration; call [`EnumBuilder::finish`] to push it.
    pub fn enumeration(&mut self, name: impl Into<String>) -> EnumBuilder<'_> {
        let decl = EnumDecl {
            name: name.into(),
            entries: Vec::new(),
            span: self.span.clone(),
        };
        EnumBuilder {
            builder: self,
            decl,
        }
    }

    /// Begins an instruction declaration; call [`InstructionDeclBuilder::finish`] to push it.
    pub fn instruction(&mut self, name: impl Into<String>, opcode: u32) -> InstructionDeclBuilder<'_> {
        let decl = InstructionDecl {
            name: name.into(),
            opcode: Some(opcode),
            opcode2: None,
            shape: ShapeDecl::default(),
            span: self.span.clone(),
        };
        InstructionDeclBuilder {
            builder: self,
            decl,
        }
    }

    /// Begins a group declaration; call [`GroupBuilder::finish`] to push it.
    pub fn group(&mut self, name: impl Into<String>) -> GroupBuilder<'_> {
        let decl = GroupDecl {
            name: Some(name.into()),
            opcode: None,
            opcode2: None,
            shape: ShapeDecl::default(),
            members: Vec::new(),
            span: self.span.clone(),
        };
        GroupBuilder {
            builder: self,
            decl,
        }
    }

    /// Finishes building and returns the assembled document.
    pub fn build(self) -> IsaDocument {
        IsaDocument::new(self.path, self.items)
    }
}

pub struct EnumBuilder<'a> {
    builder: &'a mut IsaBuilder,
    decl: EnumDecl,
}

impl<'a> EnumBuilder<'a> {
    pub fn value(mut self, text: impl Into<String>) -> Self {
        self.decl.entries.push(EnumEntryDecl::Value {
            text: text.into(),
            default: false,
        });
        self
    }

    pub fn default_value(mut self, text: impl Into<String>) -> Self {
        self.decl.entries.push(EnumEntryDecl::Value {
            text: text.into(),
            default: true,
        });
        self
    }

    pub fn reserved(mut self) -> Self {
        self.decl.entries.push(EnumEntryDecl::Reserved);
        self
    }

    pub fn finish(self) -> &'a mut IsaBuilder {
        self.builder.items.push(IsaItem::Enum(self.decl));
        self.builder
    }
}

/// Body entry helpers shared by instruction and group builders.
macro_rules! shape_methods {
    () => {
        pub fn source(mut self, source: SourceDecl) -> Self {
            self.decl.shape.entries.push(BodyEntry::Source(source));
            self
        }

        /// Appends `count` plain sources after the explicit ones.
        pub fn implicit_srcs(mut self, count: u8) -> Self {
            self.decl.shape.implicit_srcs = count;
            self
        }

        pub fn implicit_dests(mut self, count: u8) -> Self {
            self.decl.shape.implicit_dests = count;
            self
        }

        pub fn dest(mut self, name: impl Into<String>) -> Self {
            self.decl
                .shape
                .entries
                .push(BodyEntry::Dest(DestDecl { name: name.into() }));
            self
        }

        pub fn staging(mut self, staging: StagingDecl) -> Self {
            self.decl.shape.entries.push(BodyEntry::Staging(staging));
            self
        }

        pub fn immediate(mut self, immediate: ImmediateDecl) -> Self {
            self.decl.shape.entries.push(BodyEntry::Immediate(immediate));
            self
        }

        /// References a modifier catalog entry by tag.
        pub fn modifier(mut self, tag: impl Into<String>) -> Self {
            self.decl
                .shape
                .entries
                .push(BodyEntry::CatalogModifier(tag.into()));
            self
        }

        pub fn explicit_modifier(mut self, spec: ModifierSpec) -> Self {
            self.decl.shape.entries.push(BodyEntry::Modifier(spec));
            self
        }
    };
}

pub struct InstructionDeclBuilder<'a> {
    builder: &'a mut IsaBuilder,
    decl: InstructionDecl,
}

impl<'a> InstructionDeclBuilder<'a> {
    pub fn opcode2(mut self, opcode2: u32) -> Self {
        self.decl.opcode2 = Some(opcode2);
        self
    }

    shape_methods!();

    /// Completes the builder and pushes the instruction into the owning document.
    pub fn finish(self) -> &'a mut IsaBuilder {
        self.builder.items.push(IsaItem::Instruction(self.decl));
        self.builder
    }
}

pub struct GroupBuilder<'a> {
    builder: &'a mut IsaBuilder,
    decl: GroupDecl,
}

impl<'a> GroupBuilder<'a> {
    /// Opcode used by members that do not override it.
    pub fn opcode(mut self, opcode: u32) -> Self {
        self.decl.opcode = Some(opcode);
        self
    }

    pub fn opcode2(mut self, opcode2: u32) -> Self {
        self.decl.opcode2 = Some(opcode2);
        self
    }

    shape_methods!();

    pub fn member(
        mut self,
        name: impl Into<String>,
        opcode: Option<u32>,
        opcode2: Option<u32>,
    ) -> Self {
        let span = self.builder.span.clone();
        self.decl.members.push(GroupMemberDecl {
            name: name.into(),
            opcode,
            opcode2,
            span,
        });
        self
    }

    pub fn finish(self) -> &'a mut IsaBuilder {
        self.builder.items.push(IsaItem::Group(self.decl));
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::modifier::ModifierCatalog;
    use crate::isa::table::InstructionTable;

    #[test]
    fn builds_document_that_assembles_into_a_table() {
        let mut builder = IsaBuilder::new("builder.isa");
        builder.lut("Immediates", vec![0, 0x3F80_0000]);
        builder
            .enumeration("round_mode")
            .default_value("rte")
            .value("rtz")
            .finish();
        builder
            .instruction("FROUND.f32", 0x20)
            .implicit_srcs(1)
            .implicit_dests(1)
            .modifier("roundmode")
            .finish();
        builder
            .group("IADD")
            .implicit_srcs(2)
            .implicit_dests(1)
            .member("IADD.i32", Some(0x30), None)
            .member("IADD.v2i16", Some(0x31), None)
            .finish();
        let doc = builder.build();

        assert_eq!(doc.items.len(), 4);
        let table = InstructionTable::from_document(&doc, &ModifierCatalog::standard())
            .expect("builder-generated doc should build");
        assert_eq!(table.len(), 3);
        assert_eq!(table.immediates(), &[0, 0x3F80_0000]);
    }
}
