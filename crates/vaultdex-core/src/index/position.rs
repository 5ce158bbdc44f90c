//! Packed PDF positions
//!
//! A PDF posting position encodes the text item index in the high bits and
//! the character offset within the item in the low [`OFFSET_BITS`] bits.

/// Bits reserved for the character offset
pub const OFFSET_BITS: u32 = 20;

/// Largest representable character offset
pub const MAX_CHAR_OFFSET: u32 = (1 << OFFSET_BITS) - 1;

/// Location of a term inside a PDF page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfPosition {
    pub item_index: u32,
    pub char_offset: u32,
}

impl PdfPosition {
    /// `None` when the offset does not fit the packed layout
    pub fn new(item_index: u32, char_offset: u32) -> Option<Self> {
        (char_offset <= MAX_CHAR_OFFSET).then_some(Self {
            item_index,
            char_offset,
        })
    }

    pub fn pack(self) -> i64 {
        ((self.item_index as i64) << OFFSET_BITS) | self.char_offset as i64
    }

    pub fn unpack(packed: i64) -> Self {
        Self {
            item_index: (packed >> OFFSET_BITS) as u32,
            char_offset: (packed & MAX_CHAR_OFFSET as i64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_orders_by_item_then_offset() {
        let a = PdfPosition::new(0, 900).unwrap().pack();
        let b = PdfPosition::new(1, 0).unwrap().pack();
        let c = PdfPosition::new(1, 5).unwrap().pack();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_offset_limit() {
        assert!(PdfPosition::new(3, MAX_CHAR_OFFSET).is_some());
        assert!(PdfPosition::new(3, MAX_CHAR_OFFSET + 1).is_none());
    }

    proptest! {
        #[test]
        fn prop_unpack_inverts_pack(item in 0u32..1_000_000, offset in 0u32..=MAX_CHAR_OFFSET) {
            let pos = PdfPosition::new(item, offset).unwrap();
            prop_assert_eq!(PdfPosition::unpack(pos.pack()), pos);
        }
    }
}
