//! Declarations produced by the `.isa` parser (or assembled in memory by [`IsaBuilder`]).
//!
//! Every descriptor kind gets a typed declaration with explicit defaults so a misspelled or
//! missing attribute is caught by the parser instead of silently defaulting at build time.
//!
//! [`IsaBuilder`]: crate::isa::builder::IsaBuilder

use std::path::PathBuf;

use super::diagnostic::SourceSpan;
use super::modifier::ModifierSpec;

/// Represents a fully parsed instruction description file.
#[derive(Debug, Clone)]
pub struct IsaDocument {
    pub path: PathBuf,
    pub items: Vec<IsaItem>,
}

impl IsaDocument {
    pub fn new(path: PathBuf, items: Vec<IsaItem>) -> Self {
        Self { path, items }
    }

    pub fn luts(&self) -> impl Iterator<Item = &LutDecl> {
        self.items.iter().filter_map(|item| match item {
            IsaItem::Lut(lut) => Some(lut),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.items.iter().filter_map(|item| match item {
            IsaItem::Enum(decl) => Some(decl),
            _ => None,
        })
    }
}

/// High level items supported by the format.
#[derive(Debug, Clone)]
pub enum IsaItem {
    Lut(LutDecl),
    Enum(EnumDecl),
    Instruction(InstructionDecl),
    Group(GroupDecl),
}

/// Named list of immediate constants.
#[derive(Debug, Clone)]
pub struct LutDecl {
    pub name: String,
    pub values: Vec<u32>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub entries: Vec<EnumEntryDecl>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumEntryDecl {
    Value { text: String, default: bool },
    Reserved,
}

/// Operand/modifier layout shared by an instruction or by every member of a group.
#[derive(Debug, Clone, Default)]
pub struct ShapeDecl {
    /// Plain sources appended after the explicit ones (`srcs=N`).
    pub implicit_srcs: u8,
    /// Unnamed destinations appended after the explicit ones (`dests=N`).
    pub implicit_dests: u8,
    pub entries: Vec<BodyEntry>,
}

impl ShapeDecl {
    pub fn sources(&self) -> impl Iterator<Item = &SourceDecl> {
        self.entries.iter().filter_map(|entry| match entry {
            BodyEntry::Source(src) => Some(src),
            _ => None,
        })
    }

    pub fn dests(&self) -> impl Iterator<Item = &DestDecl> {
        self.entries.iter().filter_map(|entry| match entry {
            BodyEntry::Dest(dest) => Some(dest),
            _ => None,
        })
    }

    pub fn staging(&self) -> impl Iterator<Item = &StagingDecl> {
        self.entries.iter().filter_map(|entry| match entry {
            BodyEntry::Staging(sr) => Some(sr),
            _ => None,
        })
    }

    pub fn immediates(&self) -> impl Iterator<Item = &ImmediateDecl> {
        self.entries.iter().filter_map(|entry| match entry {
            BodyEntry::Immediate(imm) => Some(imm),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum BodyEntry {
    Source(SourceDecl),
    Dest(DestDecl),
    Staging(StagingDecl),
    Immediate(ImmediateDecl),
    /// Explicit bitfield modifier (`mod name=.. start=.. size=..`).
    Modifier(ModifierSpec),
    /// Reference to an entry of the modifier catalog by tag (`roundmode`, `saturate`, ...).
    CatalogModifier(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDecl {
    pub name: String,
    /// Falls back to the width inferred from the mnemonic.
    pub size: Option<u8>,
    pub float: bool,
    pub swizzle: bool,
    pub widen: bool,
    pub lanes: bool,
    pub lane: Option<LaneDecl>,
    pub absneg: bool,
    pub not: bool,
}

/// Lane selector position: the `true` sentinel or a literal bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDecl {
    Auto,
    At(u8),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDecl {
    pub name: String,
    pub read: bool,
    pub write: bool,
    pub count: u8,
    pub flags: bool,
}

impl Default for StagingDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            read: false,
            write: false,
            count: 0,
            flags: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateDecl {
    pub name: String,
    pub start: u8,
    pub size: u8,
    pub signed: bool,
}

#[derive(Debug, Clone)]
pub struct InstructionDecl {
    pub name: String,
    pub opcode: Option<u32>,
    pub opcode2: Option<u32>,
    pub shape: ShapeDecl,
    pub span: SourceSpan,
}

/// Template expanded into one instruction per member.
#[derive(Debug, Clone)]
pub struct GroupDecl {
    pub name: Option<String>,
    pub opcode: Option<u32>,
    pub opcode2: Option<u32>,
    pub shape: ShapeDecl,
    pub members: Vec<GroupMemberDecl>,
    pub span: SourceSpan,
}

/// Per-instruction overrides listed inside a group (`ins NAME opcode=.. opcode2=..`).
#[derive(Debug, Clone)]
pub struct GroupMemberDecl {
    pub name: String,
    pub opcode: Option<u32>,
    pub opcode2: Option<u32>,
    pub span: SourceSpan,
}
