//! Niche analysis.
//!
//! Some types never use every bit pattern their storage can hold, a `bool` is only ever `0` or
//! `1`, a reference is never null. When the largest alternative of a list has such unused
//! patterns, and every other alternative takes no space at all, the discriminant can be
//! folded into the largest alternative's bits and the explicit tag byte disappears.
//!
//! Everything in here is a `const fn`. The analysis is what [`Niched`] stores the
//! discriminant with, and it predicts the layout the compiler picks for [`Native`]: whenever it
//! finds a niche, so does the compiler.
//!
//! [`Niched`]: super::discriminant::Niched
//! [`Native`]: super::discriminant::Native

use core::mem;

use crate::traits::Alternative;

/// An inclusive range of bit patterns, which wraps around through the maximum value when
/// `start > end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WrapRange {
    pub start: u128,
    pub end: u128,
}

impl WrapRange {
    pub const fn new(start: u128, end: u128) -> Self {
        WrapRange { start, end }
    }

    /// Number of `bits`-wide patterns that fall outside of the range.
    #[inline]
    pub const fn available(&self, bits: u32) -> u128 {
        self.start.wrapping_sub(self.end).wrapping_sub(1) & mask(bits)
    }

    /// Returns `true` if `value` lies inside of the range.
    #[inline]
    pub const fn contains(&self, value: u128) -> bool {
        if self.start <= self.end {
            self.start <= value && value <= self.end
        } else {
            value >= self.start || value <= self.end
        }
    }
}

/// The scalar an alternative is made of, along with the patterns it's allowed to take.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub bits: u32,
    pub valid: WrapRange,
}

impl Scalar {
    pub const fn new(bits: u32, start: u128, end: u128) -> Self {
        Scalar {
            bits,
            valid: WrapRange::new(start, end),
        }
    }

    /// A pointer sized scalar that's never null.
    pub const fn non_null_pointer() -> Self {
        let bits = (mem::size_of::<usize>() * 8) as u32;
        Scalar::new(bits, 1, mask(bits))
    }

    #[inline]
    pub const fn bytes(&self) -> usize {
        (self.bits / 8) as usize
    }
}

/// What the niche analysis needs to know about one alternative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AltShape {
    pub size: usize,
    pub align: usize,
    pub niche: Option<Scalar>,
}

impl AltShape {
    pub const fn of<T: Alternative>() -> Self {
        AltShape {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            niche: T::NICHE,
        }
    }
}

/// Where the discriminant lives when it's folded into the largest alternative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NicheMapping {
    /// Position of the alternative supplying the niche.
    pub niche_index: usize,
    /// First pattern of the reserved block.
    pub niche_start: u128,
    /// Length of the reserved block.
    pub reserved: u128,
    /// The scalar of the niche bearing alternative.
    pub scalar: Scalar,
}

impl NicheMapping {
    /// Offset inside the reserved block for a status that isn't the niche bearing alternative.
    #[inline]
    pub const fn alt_index_to_niche_index(&self, index: usize) -> u128 {
        debug_assert!(index != self.niche_index);
        if self.niche_index == 0 {
            (index - 1) as u128
        } else {
            index as u128
        }
    }

    #[inline]
    pub const fn niche_index_to_alt_index(&self, offset: u128) -> usize {
        if self.niche_index == 0 {
            offset as usize + 1
        } else {
            offset as usize
        }
    }

    /// The bit pattern that marks status `index`.
    #[inline]
    pub const fn encode(&self, index: usize) -> u128 {
        let offset = self.alt_index_to_niche_index(index);
        self.niche_start.wrapping_add(offset) & mask(self.scalar.bits)
    }

    /// The status a bit pattern read from the storage stands for.
    #[inline]
    pub const fn decode(&self, bits: u128) -> usize {
        let offset = bits.wrapping_sub(self.niche_start) & mask(self.scalar.bits);
        if offset < self.reserved {
            self.niche_index_to_alt_index(offset)
        } else {
            self.niche_index
        }
    }
}

/// Decides whether `shapes`, with `status_count` statuses (alternatives plus an optional
/// valueless state), can keep their discriminant in a niche.
pub const fn analyze(shapes: &[AltShape], status_count: usize) -> Option<NicheMapping> {
    if shapes.is_empty() {
        return None;
    }

    // largest alternative, ties go to the first one
    let mut niche_index = 0;
    let mut i = 1;
    while i < shapes.len() {
        if shapes[i].size > shapes[niche_index].size {
            niche_index = i;
        }
        i += 1;
    }

    let scalar = match shapes[niche_index].niche {
        Some(scalar) => scalar,
        None => return None,
    };

    // every other alternative has to be zero sized, and no more aligned than the largest
    let mut i = 0;
    while i < shapes.len() {
        if i != niche_index
            && (shapes[i].size != 0 || shapes[i].align > shapes[niche_index].align)
        {
            return None;
        }
        i += 1;
    }

    let available = scalar.valid.available(scalar.bits);
    let required = if niche_index == 0 || niche_index == status_count - 1 {
        (status_count - 1) as u128
    } else {
        status_count as u128
    };
    if required > available {
        return None;
    }

    let WrapRange { start, end } = scalar.valid;
    let niche_start = if start >= required {
        start - required
    } else {
        end.wrapping_add(1) & mask(scalar.bits)
    };

    Some(NicheMapping {
        niche_index,
        niche_start,
        reserved: required,
        scalar,
    })
}

/// Width, in bytes, of the smallest unsigned integer that can count `status_count` statuses.
pub const fn discriminant_bytes(status_count: usize) -> usize {
    if status_count <= u8::MAX as usize + 1 {
        1
    } else if status_count <= u16::MAX as usize + 1 {
        2
    } else if status_count as u64 <= u32::MAX as u64 + 1 {
        4
    } else {
        8
    }
}

#[inline(always)]
const fn mask(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1_u128 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use core::cmp::Ordering;
    use core::num::NonZeroU8;
    use core::ptr::NonNull;

    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::Empty;

    fn shapes_of_pointer_and_units(units: usize) -> Vec<AltShape> {
        let mut shapes = vec![AltShape::of::<NonNull<u8>>()];
        shapes.extend(core::iter::repeat(AltShape::of::<()>()).take(units));
        shapes
    }

    #[test_case(WrapRange::new(0, 1), 8 => 254 ; "bool")]
    #[test_case(WrapRange::new(1, u8::MAX as u128), 8 => 1 ; "non zero byte")]
    #[test_case(WrapRange::new(255, 1), 8 => 253 ; "ordering wraps")]
    #[test_case(WrapRange::new(0, 0x10FFFF), 32 => (u32::MAX - 0x10FFFF) as u128 ; "char")]
    #[test_case(WrapRange::new(0, u8::MAX as u128), 8 => 0 ; "full byte")]
    fn test_available(range: WrapRange, bits: u32) -> u128 {
        range.available(bits)
    }

    #[test]
    fn test_pointer_with_one_unit() {
        let shapes = shapes_of_pointer_and_units(1);
        let mapping = analyze(&shapes, 2).unwrap();

        assert_eq!(mapping.niche_index, 0);
        assert_eq!(mapping.niche_start, 0);
        assert_eq!(mapping.reserved, 1);
        assert_eq!(mapping.encode(1), 0);
        assert_eq!(mapping.decode(0), 1);
        assert_eq!(mapping.decode(0xdead_beef), 0);
    }

    #[test]
    fn test_pointer_cannot_hold_two_units() {
        // null is the only invalid pointer
        let shapes = shapes_of_pointer_and_units(2);
        assert!(analyze(&shapes, 3).is_none());
    }

    #[test]
    fn test_bool_grows_from_the_high_end() {
        let shapes = [AltShape::of::<bool>(), AltShape::of::<()>(), AltShape::of::<Empty>()];
        let mapping = analyze(&shapes, 3).unwrap();

        assert_eq!(mapping.niche_start, 2);
        assert_eq!(mapping.encode(1), 2);
        assert_eq!(mapping.encode(2), 3);
        assert_eq!(mapping.decode(0), 0);
        assert_eq!(mapping.decode(1), 0);
        assert_eq!(mapping.decode(2), 1);
        assert_eq!(mapping.decode(3), 2);
    }

    #[test]
    fn test_niche_in_the_middle_reserves_every_status() {
        let shapes = [AltShape::of::<()>(), AltShape::of::<bool>(), AltShape::of::<()>()];
        let mapping = analyze(&shapes, 4).unwrap();

        assert_eq!(mapping.niche_index, 1);
        assert_eq!(mapping.reserved, 4);
        assert_eq!(mapping.decode(mapping.encode(0)), 0);
        assert_eq!(mapping.decode(mapping.encode(2)), 2);
        assert_eq!(mapping.decode(mapping.encode(3)), 3);
        assert_eq!(mapping.decode(1), 1);
    }

    #[test]
    fn test_niche_last_saves_one_pattern() {
        let shapes = [AltShape::of::<()>(), AltShape::of::<NonZeroU8>()];
        let mapping = analyze(&shapes, 2).unwrap();

        assert_eq!(mapping.niche_index, 1);
        assert_eq!(mapping.reserved, 1);
        assert_eq!(mapping.encode(0), 0);
        assert_eq!(mapping.decode(0), 0);
        assert_eq!(mapping.decode(7), 1);
    }

    #[test]
    fn test_wrapping_valid_range() {
        let shapes = [AltShape::of::<Ordering>(), AltShape::of::<()>()];
        let mapping = analyze(&shapes, 3).unwrap();

        // the block sits right below `start`, away from the wrapped high end
        assert_eq!(mapping.niche_start, 253);
        for index in 1..3 {
            let bits = mapping.encode(index);
            assert!(!mapping.scalar.valid.contains(bits));
            assert_eq!(mapping.decode(bits), index);
        }
        for ordering in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
            assert_eq!(mapping.decode(ordering as i8 as u8 as u128), 0);
        }
    }

    #[test]
    fn test_rejections() {
        // largest has no niche
        assert!(analyze(&[AltShape::of::<u32>(), AltShape::of::<()>()], 2).is_none());
        // another alternative takes space
        assert!(analyze(&[AltShape::of::<bool>(), AltShape::of::<u8>()], 2).is_none());
        // nothing but zero sized alternatives
        assert!(analyze(&[AltShape::of::<()>(), AltShape::of::<Empty>()], 2).is_none());
        // ties go to the first, which has no niche
        assert!(analyze(&[AltShape::of::<u8>(), AltShape::of::<bool>()], 2).is_none());
        // a zero sized alternative rounds the size up to its alignment
        let aligned = AltShape {
            size: 0,
            align: 8,
            niche: None,
        };
        assert!(analyze(&[AltShape::of::<bool>(), aligned], 2).is_none());
    }

    #[test]
    fn test_discriminant_bytes() {
        assert_eq!(discriminant_bytes(2), 1);
        assert_eq!(discriminant_bytes(256), 1);
        assert_eq!(discriminant_bytes(257), 2);
        assert_eq!(discriminant_bytes(65_537), 4);
    }

    proptest! {
        #[test]
        #[cfg_attr(miri, ignore)]
        fn proptest_niche_index_round_trips(
            niche_index in 0_usize..4,
            units in 1_usize..4,
            valueless: bool,
        ) {
            let len = units + 1;
            let niche_index = niche_index.min(units);
            let mut shapes = vec![AltShape::of::<()>(); len];
            shapes[niche_index] = AltShape::of::<char>();
            let status_count = len + valueless as usize;

            let mapping = analyze(&shapes, status_count).unwrap();
            for index in (0..status_count).filter(|i| *i != niche_index) {
                let offset = mapping.alt_index_to_niche_index(index);
                prop_assert!(offset < mapping.reserved);
                prop_assert_eq!(mapping.niche_index_to_alt_index(offset), index);

                let bits = mapping.encode(index);
                prop_assert!(!mapping.scalar.valid.contains(bits));
                prop_assert_eq!(mapping.decode(bits), index);
            }
        }

        #[test]
        #[cfg_attr(miri, ignore)]
        fn proptest_valid_chars_decode_to_the_niche(c: char, units in 1_usize..4) {
            let mut shapes = vec![AltShape::of::<char>()];
            shapes.extend(core::iter::repeat(AltShape::of::<()>()).take(units));

            let mapping = analyze(&shapes, units + 1).unwrap();
            prop_assert_eq!(mapping.decode(c as u32 as u128), 0);
        }
    }
}
