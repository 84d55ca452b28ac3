use core::cmp::Ordering;
use core::marker::PhantomData;
use core::num::{
    NonZeroI128,
    NonZeroI16,
    NonZeroI32,
    NonZeroI64,
    NonZeroI8,
    NonZeroIsize,
    NonZeroU128,
    NonZeroU16,
    NonZeroU32,
    NonZeroU64,
    NonZeroU8,
    NonZeroUsize,
};
use core::ptr::NonNull;

use crate::convert::{
    Class,
    IntKind,
    TextKind,
};
use crate::repr::niche::Scalar;
use crate::Empty;

/// Describes a type to the parts of a [`Variant`](crate::Variant) that need more than its
/// layout: the conversion resolver and the niche analysis.
///
/// Implemented for the primitives, the std string types, pointers and references. Your own
/// types can get an opaque description, one that only ever converts from the type itself,
/// with [`alternative!`](crate::alternative).
///
/// # Safety
/// * when `NICHE` is `Some(scalar)`, the first `scalar.bits / 8` bytes of every valid value
///   must, read as a native endian unsigned integer, fall inside of `scalar.valid`
pub unsafe trait Alternative: Sized {
    /// What kind of value this is, for the purpose of conversions.
    const CLASS: Class;
    /// The bit patterns valid values of this type are limited to, if they're limited at all.
    const NICHE: Option<Scalar> = None;
}

/// FNV-1a hash of `path`, used to tell opaque types apart at compile time.
#[doc(hidden)]
pub const fn opaque_id(path: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let bytes = path.as_bytes();
    let mut hash = OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

/// Implements [`Alternative`] for your own types, giving each an opaque class that only
/// converts from the type itself.
///
/// ```
/// use compact_variant::{alternative, Variant};
///
/// #[derive(Debug, PartialEq)]
/// struct Meters(f64);
/// alternative!(Meters);
///
/// let v: Variant<(i32, Meters)> = Variant::from_value(Meters(3.5));
/// assert_eq!(v.index(), 1);
/// ```
#[macro_export]
macro_rules! alternative {
    ($($ty:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::Alternative for $ty {
                const CLASS: $crate::convert::Class = $crate::convert::Class::Opaque(
                    $crate::traits::opaque_id(concat!(module_path!(), "::", stringify!($ty))),
                );
            }
        )+
    };
}

unsafe impl Alternative for bool {
    const CLASS: Class = Class::Bool;
    const NICHE: Option<Scalar> = Some(Scalar::new(8, 0, 1));
}

unsafe impl Alternative for char {
    const CLASS: Class = Class::Char;
    const NICHE: Option<Scalar> = Some(Scalar::new(32, 0, char::MAX as u128));
}

macro_rules! int_alternatives {
    ($($ty:ty => $signed:literal),+ $(,)?) => {
        $(
            unsafe impl Alternative for $ty {
                const CLASS: Class = Class::Int(IntKind::new($signed, <$ty>::BITS));
            }
        )+
    };
}

int_alternatives! {
    u8 => false,
    u16 => false,
    u32 => false,
    u64 => false,
    u128 => false,
    i8 => true,
    i16 => true,
    i32 => true,
    i64 => true,
    i128 => true,
}

unsafe impl Alternative for usize {
    const CLASS: Class = Class::Int(IntKind::pointer(false));
}

unsafe impl Alternative for isize {
    const CLASS: Class = Class::Int(IntKind::pointer(true));
}

unsafe impl Alternative for f32 {
    const CLASS: Class = Class::Float(32);
}

unsafe impl Alternative for f64 {
    const CLASS: Class = Class::Float(64);
}

unsafe impl Alternative for String {
    const CLASS: Class = Class::Text(TextKind::Owned);
}

unsafe impl Alternative for Box<str> {
    const CLASS: Class = Class::Text(TextKind::Boxed);
}

unsafe impl Alternative for &'static str {
    const CLASS: Class = Class::Text(TextKind::Static);
}

alternative!((), Empty);

unsafe impl Alternative for Ordering {
    const CLASS: Class = Class::Opaque(opaque_id("core::cmp::Ordering"));
    // -1, 0 and 1 as an `i8`
    const NICHE: Option<Scalar> = Some(Scalar::new(8, 255, 1));
}

unsafe impl<T: ?Sized> Alternative for PhantomData<T> {
    const CLASS: Class = Class::Unranked;
}

macro_rules! non_zero_alternatives {
    ($($ty:ty => $bits:expr),+ $(,)?) => {
        $(
            unsafe impl Alternative for $ty {
                const CLASS: Class = Class::Opaque(opaque_id(stringify!($ty)));
                const NICHE: Option<Scalar> = Some(Scalar::new($bits, 1, u128::MAX >> (128 - $bits)));
            }
        )+
    };
}

non_zero_alternatives! {
    NonZeroU8 => 8,
    NonZeroU16 => 16,
    NonZeroU32 => 32,
    NonZeroU64 => 64,
    NonZeroU128 => 128,
    NonZeroUsize => usize::BITS,
    NonZeroI8 => 8,
    NonZeroI16 => 16,
    NonZeroI32 => 32,
    NonZeroI64 => 64,
    NonZeroI128 => 128,
    NonZeroIsize => usize::BITS,
}

// Only thin pointers, the niche has to cover the whole value.
unsafe impl<T> Alternative for NonNull<T> {
    const CLASS: Class = Class::Unranked;
    const NICHE: Option<Scalar> = Some(Scalar::non_null_pointer());
}

unsafe impl<'a, T> Alternative for &'a T {
    const CLASS: Class = Class::Unranked;
    const NICHE: Option<Scalar> = Some(Scalar::non_null_pointer());
}

unsafe impl<'a, T> Alternative for &'a mut T {
    const CLASS: Class = Class::Unranked;
    const NICHE: Option<Scalar> = Some(Scalar::non_null_pointer());
}

unsafe impl<T> Alternative for Box<T> {
    const CLASS: Class = Class::Unranked;
    const NICHE: Option<Scalar> = Some(Scalar::non_null_pointer());
}

#[cfg(test)]
mod tests {
    use core::mem;

    use super::*;

    #[test]
    fn test_opaque_ids_differ() {
        assert_ne!(opaque_id("a::Foo"), opaque_id("a::Bar"));
        assert_eq!(opaque_id(""), 0xcbf2_9ce4_8422_2325);
        assert_ne!(<() as Alternative>::CLASS, <Empty as Alternative>::CLASS);
    }

    #[test]
    fn test_niches_match_layout() {
        fn check<T: Alternative>() {
            if let Some(scalar) = T::NICHE {
                assert_eq!(scalar.bytes(), mem::size_of::<T>());
            }
        }

        check::<bool>();
        check::<char>();
        check::<NonZeroU8>();
        check::<NonZeroU128>();
        check::<NonZeroIsize>();
        check::<NonNull<u64>>();
        check::<&'static str>();
        check::<&'static u8>();
        check::<Box<[u8; 4]>>();
        check::<Ordering>();
    }

    #[test]
    fn test_non_zero_ranges() {
        let scalar = <NonZeroU16 as Alternative>::NICHE.unwrap();
        assert_eq!(scalar.valid.start, 1);
        assert_eq!(scalar.valid.end, u16::MAX as u128);

        let scalar = <NonZeroU128 as Alternative>::NICHE.unwrap();
        assert_eq!(scalar.valid.end, u128::MAX);
    }

    #[test]
    fn test_ordering_wraps() {
        let scalar = <Ordering as Alternative>::NICHE.unwrap();
        assert_eq!(scalar.valid.start, 255);
        assert_eq!(scalar.valid.end, 1);
    }
}
