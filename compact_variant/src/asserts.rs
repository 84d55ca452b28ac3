use core::cmp::Ordering;
use core::num::NonZeroU32;

use static_assertions::{
    assert_eq_align,
    assert_eq_size,
    const_assert,
    const_assert_eq,
};

use crate::{
    Auto,
    Empty,
    FallbackFirst,
    NeverValueless,
    Niched,
    Tagged,
    Variant,
};

// Tagged: a union of the alternatives plus a byte, rounded up to the alignment
assert_eq_size!(Variant<(u8, u16), Auto, Tagged>, [u16; 2]);
assert_eq_size!(Variant<(u64, u8), Auto, Tagged>, [u64; 2]);
assert_eq_size!(Variant<([u8; 3], u8), Auto, Tagged>, [u8; 4]);
assert_eq_size!(Variant<((), Empty), Auto, Tagged>, u8);
assert_eq_size!(Variant<(String, i32), Auto, Tagged>, [usize; 4]);
assert_eq_size!(Variant<(&'static u8, Empty), NeverValueless, Tagged>, [usize; 2]);
assert_eq_align!(Variant<(u8, u64), Auto, Tagged>, u64);

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        assert_eq_size!(Variant<(usize, bool), Auto, Tagged>, [u64; 2]);
    } else if #[cfg(target_pointer_width = "32")] {
        assert_eq_size!(Variant<(usize, bool), Auto, Tagged>, [u32; 2]);
    }
}

// Native: the largest alternative when there's a niche, a tag otherwise
assert_eq_size!(Variant<(&'static u8, Empty), NeverValueless>, &'static u8);
assert_eq_size!(Variant<(Box<u32>, ()), NeverValueless>, Box<u32>);
assert_eq_size!(Variant<(bool, (), Empty)>, bool);
assert_eq_size!(Variant<(Empty, char), NeverValueless>, char);
assert_eq_size!(Variant<(Ordering, ())>, Ordering);
assert_eq_size!(Variant<(u8, u16)>, [u16; 2]);
assert_eq_size!(Variant<(u64, u8)>, [u64; 2]);
assert_eq_align!(Variant<(u8, u64)>, u64);

// Niched: exactly the largest alternative
assert_eq_size!(Variant<(&'static u8, Empty), NeverValueless, Niched>, &'static u8);
assert_eq_size!(Variant<(Box<u32>, ()), NeverValueless, Niched>, Box<u32>);
assert_eq_size!(Variant<(bool, (), Empty), FallbackFirst, Niched>, bool);
assert_eq_size!(Variant<(Empty, char), NeverValueless, Niched>, char);
assert_eq_size!(Variant<(Ordering, ()), NeverValueless, Niched>, Ordering);
assert_eq_size!(Variant<(NonZeroU32, Empty), NeverValueless, Niched>, u32);

// `Auto` always reserves a status for the valueless state
const_assert_eq!(Variant::<(i32, f64)>::STATUS_COUNT, 3);
const_assert_eq!(Variant::<(i32, String)>::STATUS_COUNT, 3);
const_assert_eq!(Variant::<(i32, String), NeverValueless>::STATUS_COUNT, 2);
const_assert!(Variant::<(char, ())>::NICHE.is_some());
const_assert!(Variant::<(&'static u8, Empty), NeverValueless>::NICHE.is_some());
const_assert!(Variant::<(&'static u8, Empty)>::NICHE.is_none());
const_assert!(Variant::<(u32, ())>::NICHE.is_none());
const_assert!(Variant::<(u8, u16)>::ENCODED_NICHE.is_none());
const_assert!(Variant::<(&'static u8, ()), NeverValueless, Niched>::ENCODED_NICHE.is_some());
