//! Bit ranges of encoded instruction fields.

use std::fmt;

use serde::Serialize;

/// Contiguous bit range inside an encoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BitRange {
    pub start: u8,
    pub width: u8,
}

impl BitRange {
    pub const fn new(start: u8, width: u8) -> Self {
        Self { start, width }
    }

    /// One past the last bit covered by the range.
    pub fn end(&self) -> u16 {
        self.start as u16 + self.width as u16
    }

    /// Number of distinct values the range can encode, saturated at `usize::MAX`.
    pub fn capacity(&self) -> usize {
        1usize.checked_shl(self.width as u32).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width <= 1 {
            write!(f, "[{}]", self.start)
        } else {
            write!(f, "[{}..{}]", self.start, self.end() - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BitRange;

    #[test]
    fn renders_end_and_display() {
        let range = BitRange::new(24, 2);
        assert_eq!(range.end(), 26);
        assert_eq!(range.to_string(), "[24..25]");
        assert_eq!(BitRange::new(35, 1).to_string(), "[35]");
    }

    #[test]
    fn capacity_follows_width() {
        assert_eq!(BitRange::new(30, 2).capacity(), 4);
        assert_eq!(BitRange::new(33, 3).capacity(), 8);
    }
}
