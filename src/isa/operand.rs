//! Operand descriptors: sources, destinations, staging registers, and immediates.
//!
//! Constructors only coerce declared attributes and derive bit offsets from the operand index.
//! Cross-operand checks happen once the whole instruction is assembled.

use bitflags::bitflags;
use serde::Serialize;

use super::ast::{DestDecl, ImmediateDecl, LaneDecl, SourceDecl, StagingDecl};
use super::bits::BitRange;
use super::error::IsaError;

/// Highest source index whose abs/neg and swizzle fields have a defined position.
const MAX_MODIFIED_SOURCE: u8 = 2;

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct SourceFlags: u8 {
        const FLOAT   = 0b00_0001;
        const SWIZZLE = 0b00_0010;
        const WIDEN   = 0b00_0100;
        const LANES   = 0b00_1000;
        const ABSNEG  = 0b01_0000;
        const NOT     = 0b10_0000;
    }
}

/// Bit ranges claimed by a source's active capabilities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceEncoding {
    pub neg: Option<BitRange>,
    pub abs: Option<BitRange>,
    pub not: Option<BitRange>,
    pub widen: Option<BitRange>,
    pub lane: Option<BitRange>,
    pub swizzle: Option<BitRange>,
}

impl SourceEncoding {
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, BitRange)> + '_ {
        [
            ("neg", self.neg),
            ("abs", self.abs),
            ("not", self.not),
            ("widen", self.widen),
            ("lane", self.lane),
            ("swizzle", self.swizzle),
        ]
        .into_iter()
        .filter_map(|(label, range)| range.map(|range| (label, range)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    pub index: u8,
    pub size: u8,
    pub flags: SourceFlags,
    /// Resolved lane selector position, if any.
    pub lane: Option<u8>,
    pub encoding: SourceEncoding,
}

impl Source {
    /// A source with no encoding capabilities.
    pub fn plain(index: u8, size: u8) -> Self {
        Self {
            name: String::new(),
            index,
            size,
            flags: SourceFlags::empty(),
            lane: None,
            encoding: SourceEncoding::default(),
        }
    }

    pub fn from_decl(decl: &SourceDecl, index: u8, default_size: u8) -> Result<Self, IsaError> {
        let size = decl.size.unwrap_or(default_size);
        let mut flags = SourceFlags::empty();
        flags.set(SourceFlags::FLOAT, decl.float || decl.absneg);
        flags.set(SourceFlags::SWIZZLE, decl.swizzle);
        flags.set(SourceFlags::WIDEN, decl.widen);
        flags.set(SourceFlags::LANES, decl.lanes);
        flags.set(SourceFlags::ABSNEG, decl.absneg);
        flags.set(SourceFlags::NOT, decl.not);

        let lane = match decl.lane {
            None | Some(LaneDecl::At(0)) => None,
            Some(LaneDecl::Auto) => Some(if index == 0 { 38 } else { 36 }),
            Some(LaneDecl::At(position)) => Some(position),
        };

        let mut encoding = SourceEncoding::default();
        if decl.absneg {
            let neg = 32 + 2 + modified_slot(index, "abs/neg")? * 2;
            encoding.neg = Some(BitRange::new(neg, 1));
            encoding.abs = Some(BitRange::new(neg + 1, 1));
        }
        if decl.not {
            encoding.not = Some(BitRange::new(35, 1));
        }
        if decl.widen || decl.lanes {
            let start = if index == 1 { 26 } else { 36 };
            encoding.widen = Some(BitRange::new(start, 4));
        }
        if let Some(position) = lane {
            let width = if matches!(size, 8 | 32) { 2 } else { 1 };
            encoding.lane = Some(BitRange::new(position, width));
        }
        if decl.swizzle {
            if !matches!(size, 16 | 32) {
                return Err(IsaError::Build(format!(
                    "source {index} is {size} bits wide; swizzles require 16 or 32"
                )));
            }
            let start = 24 + modified_slot(index, "swizzle")? * 2;
            encoding.swizzle = Some(BitRange::new(start, 2));
        }

        Ok(Self {
            name: decl.name.clone(),
            index,
            size,
            flags,
            lane,
            encoding,
        })
    }

    pub fn is_float(&self) -> bool {
        self.flags.contains(SourceFlags::FLOAT)
    }

    pub fn allows_swizzle(&self) -> bool {
        self.flags.contains(SourceFlags::SWIZZLE)
    }

    pub fn allows_widen(&self) -> bool {
        self.flags.contains(SourceFlags::WIDEN)
    }

    pub fn allows_lanes(&self) -> bool {
        self.flags.contains(SourceFlags::LANES)
    }

    pub fn allows_abs_neg(&self) -> bool {
        self.flags.contains(SourceFlags::ABSNEG)
    }

    pub fn allows_not(&self) -> bool {
        self.flags.contains(SourceFlags::NOT)
    }
}

/// Slot counted down from the last modifiable source: index 2 sits lowest.
fn modified_slot(index: u8, capability: &str) -> Result<u8, IsaError> {
    MAX_MODIFIED_SOURCE.checked_sub(index).ok_or_else(|| {
        IsaError::Build(format!(
            "source {index} cannot carry {capability}; only sources 0..={MAX_MODIFIED_SOURCE} have a {capability} field"
        ))
    })
}

/// Destination operand. Its position is implied by declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dest {
    pub name: String,
}

impl From<&DestDecl> for Dest {
    fn from(decl: &DestDecl) -> Self {
        Self {
            name: decl.name.clone(),
        }
    }
}

/// Register slot with explicit read/write intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Staging {
    pub name: String,
    pub index: u8,
    pub read: bool,
    pub write: bool,
    pub count: u8,
    pub flags_enabled: bool,
    pub start: u8,
    pub encoded_flags: u8,
    pub size: u8,
}

impl Staging {
    /// Staging registers are always 32-bit.
    pub const REGISTER_BITS: u8 = 32;

    pub fn from_decl(index: u8, decl: &StagingDecl) -> Result<Self, IsaError> {
        if index > 1 {
            return Err(IsaError::Build(format!(
                "staging register {index} out of range; at most two are encodable"
            )));
        }
        let start = if index == 0 { 40 } else { 16 };
        let encoded_flags = if !decl.flags {
            0
        } else if index > 0 {
            0xC0
        } else {
            (if decl.write { 0x80 } else { 0 }) | (if decl.read { 0x40 } else { 0 })
        };
        Ok(Self {
            name: decl.name.clone(),
            index,
            read: decl.read,
            write: decl.write,
            count: decl.count,
            flags_enabled: decl.flags,
            start,
            encoded_flags,
            size: Self::REGISTER_BITS,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Immediate {
    pub name: String,
    pub start: u8,
    pub size: u8,
    pub signed: bool,
}

impl Immediate {
    pub fn range(&self) -> BitRange {
        BitRange::new(self.start, self.size)
    }
}

impl From<&ImmediateDecl> for Immediate {
    fn from(decl: &ImmediateDecl) -> Self {
        Self {
            name: decl.name.clone(),
            start: decl.start,
            size: decl.size,
            signed: decl.signed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(index: u8, decl: SourceDecl) -> Source {
        Source::from_decl(&decl, index, 32).expect("source")
    }

    #[test]
    fn absneg_positions_count_down_from_source_two() {
        let decl = SourceDecl {
            absneg: true,
            ..SourceDecl::default()
        };
        let s0 = source(0, decl.clone());
        assert_eq!(s0.encoding.neg, Some(BitRange::new(38, 1)));
        assert_eq!(s0.encoding.abs, Some(BitRange::new(39, 1)));
        let s2 = source(2, decl);
        assert_eq!(s2.encoding.neg, Some(BitRange::new(34, 1)));
        assert_eq!(s2.encoding.abs, Some(BitRange::new(35, 1)));
        assert!(s2.is_float(), "absneg implies float");
    }

    #[test]
    fn widen_and_lanes_share_a_nibble() {
        let widen = source(
            1,
            SourceDecl {
                widen: true,
                ..SourceDecl::default()
            },
        );
        assert_eq!(widen.encoding.widen, Some(BitRange::new(26, 4)));
        let lanes = source(
            0,
            SourceDecl {
                lanes: true,
                ..SourceDecl::default()
            },
        );
        assert_eq!(lanes.encoding.widen, Some(BitRange::new(36, 4)));
        assert!(lanes.allows_lanes() && !lanes.allows_widen());
    }

    #[test]
    fn lane_sentinel_depends_on_index() {
        let auto = SourceDecl {
            lane: Some(LaneDecl::Auto),
            ..SourceDecl::default()
        };
        assert_eq!(source(0, auto.clone()).encoding.lane, Some(BitRange::new(38, 2)));
        let s1 = Source::from_decl(&auto, 1, 16).expect("source");
        assert_eq!(s1.lane, Some(36));
        assert_eq!(s1.encoding.lane, Some(BitRange::new(36, 1)));
        let literal = SourceDecl {
            lane: Some(LaneDecl::At(28)),
            size: Some(8),
            ..SourceDecl::default()
        };
        assert_eq!(source(2, literal).encoding.lane, Some(BitRange::new(28, 2)));
        let zero = SourceDecl {
            lane: Some(LaneDecl::At(0)),
            ..SourceDecl::default()
        };
        assert_eq!(source(0, zero).encoding.lane, None);
    }

    #[test]
    fn swizzle_requires_16_or_32_bits() {
        let decl = SourceDecl {
            swizzle: true,
            size: Some(16),
            ..SourceDecl::default()
        };
        assert_eq!(source(1, decl).encoding.swizzle, Some(BitRange::new(26, 2)));
        let wide = SourceDecl {
            swizzle: true,
            size: Some(64),
            ..SourceDecl::default()
        };
        let err = Source::from_decl(&wide, 0, 32).unwrap_err();
        assert!(err.to_string().contains("swizzles require 16 or 32"), "{err}");
    }

    #[test]
    fn modified_fields_reject_sources_past_two() {
        let decl = SourceDecl {
            absneg: true,
            ..SourceDecl::default()
        };
        assert!(Source::from_decl(&decl, 3, 32).is_err());
    }

    #[test]
    fn not_flag_is_fixed() {
        let s = source(
            1,
            SourceDecl {
                not: true,
                ..SourceDecl::default()
            },
        );
        let fields: Vec<_> = s.encoding.fields().collect();
        assert_eq!(fields, [("not", BitRange::new(35, 1))]);
    }

    #[test]
    fn staging_flags_follow_index_and_intent() {
        let rw = StagingDecl {
            read: true,
            write: true,
            count: 4,
            ..StagingDecl::default()
        };
        let sr0 = Staging::from_decl(0, &rw).expect("sr0");
        assert_eq!((sr0.start, sr0.encoded_flags), (40, 0xC0));
        let read_only = StagingDecl {
            read: true,
            ..StagingDecl::default()
        };
        assert_eq!(Staging::from_decl(0, &read_only).expect("sr0").encoded_flags, 0x40);
        let sr1 = Staging::from_decl(1, &read_only).expect("sr1");
        assert_eq!((sr1.start, sr1.encoded_flags), (16, 0xC0));
        let no_flags = StagingDecl {
            write: true,
            flags: false,
            ..StagingDecl::default()
        };
        assert_eq!(Staging::from_decl(0, &no_flags).expect("sr0").encoded_flags, 0);
        assert!(Staging::from_decl(2, &read_only).is_err());
    }
}
