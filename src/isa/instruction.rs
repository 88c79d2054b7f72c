//! Concrete instruction descriptors and the encoding fields derived from their shape.

use serde::Serialize;
use smallvec::SmallVec;

use super::ast::ShapeDecl;
use super::bits::BitRange;
use super::error::IsaError;
use super::modifier::Modifier;
use super::operand::{Dest, Immediate, Source, Staging};

/// Opcode whose secondary field also disambiguates the sign of conversions.
const CONVERSION_SIGN_OPCODE: u32 = 0x90;
/// Mnemonic prefixes whose secondary opcode aliases the memory access size.
const MEMORY_SIZE_PREFIXES: [&str; 2] = ["LOAD.i", "STORE.i"];

/// Everything an instruction is built from, minus the derived encoding fields.
#[derive(Debug, Clone, Default)]
pub struct InstructionParts {
    pub name: String,
    pub opcode: u32,
    pub opcode2: Option<u32>,
    pub sources: SmallVec<[Source; 4]>,
    pub dests: SmallVec<[Dest; 2]>,
    pub staging: SmallVec<[Staging; 2]>,
    pub immediates: SmallVec<[Immediate; 2]>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub name: String,
    pub opcode: u32,
    pub opcode2: Option<u32>,
    pub sources: SmallVec<[Source; 4]>,
    pub dests: SmallVec<[Dest; 2]>,
    pub staging: SmallVec<[Staging; 2]>,
    pub immediates: SmallVec<[Immediate; 2]>,
    pub modifiers: Vec<Modifier>,
    secondary_shift: u32,
    secondary_mask: u32,
}

impl Instruction {
    /// Assembles an instruction and derives its secondary opcode shift and mask.
    pub fn new(parts: InstructionParts) -> Result<Self, IsaError> {
        if !parts.dests.is_empty() && !parts.staging.is_empty() {
            return Err(IsaError::Build(format!(
                "instruction '{}' declares both destinations and staging registers",
                parts.name
            )));
        }
        let (secondary_shift, secondary_mask) = secondary_encoding(
            &parts.name,
            parts.opcode,
            parts.opcode2.is_some(),
            &parts.sources,
            &parts.modifiers,
        );
        Ok(Self {
            name: parts.name,
            opcode: parts.opcode,
            opcode2: parts.opcode2,
            sources: parts.sources,
            dests: parts.dests,
            staging: parts.staging,
            immediates: parts.immediates,
            modifiers: parts.modifiers,
            secondary_shift,
            secondary_mask,
        })
    }

    pub fn secondary_shift(&self) -> u32 {
        self.secondary_shift
    }

    pub fn secondary_mask(&self) -> u32 {
        self.secondary_mask
    }

    /// True when the secondary opcode has no bits outside the secondary mask.
    pub fn opcode2_fits_mask(&self) -> bool {
        self.opcode2
            .is_none_or(|opcode2| opcode2 & self.secondary_mask == opcode2)
    }

    pub fn modifier(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|modifier| modifier.name == name)
    }

    /// Every named bit range claimed by this instruction, in operand order.
    pub fn encoding_fields(&self) -> Vec<(String, BitRange)> {
        let mut fields = Vec::new();
        for source in &self.sources {
            for (label, range) in source.encoding.fields() {
                fields.push((format!("src{}.{label}", source.index), range));
            }
        }
        for staging in &self.staging {
            fields.push((
                format!("sr{}", staging.index),
                BitRange::new(staging.start, 8),
            ));
        }
        for imm in &self.immediates {
            fields.push((format!("imm.{}", imm.name), imm.range()));
        }
        for modifier in &self.modifiers {
            fields.push((format!("mod.{}", modifier.name), modifier.range()));
        }
        fields
    }
}

/// Default operand width inferred from the mnemonic suffix.
///
/// `...128` → 128, `...48` → 48, any other trailing `8` → 8, otherwise the last two characters
/// as a number, falling back to 32.
pub fn typesize(mnemonic: &str) -> u8 {
    if mnemonic.ends_with("128") {
        return 128;
    }
    if mnemonic.ends_with("48") {
        return 48;
    }
    if mnemonic.ends_with('8') {
        return 8;
    }
    let tail: String = {
        let mut chars: Vec<char> = mnemonic.chars().rev().take(2).collect();
        chars.reverse();
        chars.into_iter().collect()
    };
    tail.parse().unwrap_or(32)
}

/// Computes `(secondary_shift, secondary_mask)`.
///
/// The mask rules apply in order and later rules may clear bits set by earlier ones.
pub fn secondary_encoding(
    name: &str,
    opcode: u32,
    has_opcode2: bool,
    sources: &[Source],
    modifiers: &[Modifier],
) -> (u32, u32) {
    let mut shift = (sources.len() as u32 * 8).max(16);
    let mut mask = if has_opcode2 { 0xF } else { 0x0 };
    if modifiers.iter().any(|modifier| modifier.name == "left") {
        mask |= 0x100;
    }
    // The second source's widen/lanes nibble overlaps these bits.
    if sources.len() == 3 && (sources[1].allows_widen() || sources[1].allows_lanes()) {
        mask &= !0xC;
    }
    if opcode == CONVERSION_SIGN_OPCODE {
        mask |= 0x10;
    }
    if MEMORY_SIZE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        shift = 27;
        mask = 0x7;
    }
    (shift, mask)
}

/// Shared header and shape an instruction is stamped from.
#[derive(Debug, Clone, Copy)]
pub struct InstructionTemplate<'a> {
    pub name: Option<&'a str>,
    pub opcode: Option<u32>,
    pub opcode2: Option<u32>,
    pub shape: &'a ShapeDecl,
}

/// Sparse per-instruction overrides applied on top of a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionOverrides<'a> {
    pub name: Option<&'a str>,
    pub opcode: Option<u32>,
    pub opcode2: Option<u32>,
}

/// Header fields after merging overrides onto a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionHeader {
    pub name: String,
    pub opcode: u32,
    pub opcode2: Option<u32>,
}

impl<'a> InstructionTemplate<'a> {
    /// Each override wins when present; otherwise the template's value is kept.
    pub fn merge(&self, overrides: &InstructionOverrides<'_>) -> Result<InstructionHeader, IsaError> {
        let name = overrides
            .name
            .or(self.name)
            .ok_or_else(|| IsaError::Build("instruction is missing a name".into()))?;
        let opcode = overrides.opcode.or(self.opcode).ok_or_else(|| {
            IsaError::Build(format!("instruction '{name}' is missing an opcode"))
        })?;
        Ok(InstructionHeader {
            name: name.to_string(),
            opcode,
            opcode2: overrides.opcode2.or(self.opcode2),
        })
    }
}
