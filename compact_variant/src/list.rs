//! Alternative lists.
//!
//! The alternatives of a [`Variant`](crate::Variant) are written as a flat tuple, `(A, B, C)`.
//! For every tuple of one to eight elements this module provides:
//!
//! * a `#[repr(C)]` union of all the alternatives, which is what sizes and aligns the storage
//! * a plain enum of all the alternatives, plus a valueless variant, for [`Native`] storage
//! * a table of [`CellInfo`] entries indexed by position, used to destroy the active
//!   alternative
//! * one table per optional capability ([`CloneList`], [`EqList`], ...) implemented when every
//!   alternative has that capability
//! * [`Has`] impls mapping each alternative to its position
//! * the [`Dispatch`] decision for visitation

use core::mem::ManuallyDrop;

use crate::convert::{
    Class,
    ConvertFns,
};
use crate::index::*;
use crate::repr::cell::{
    cmp_fn,
    debug_fn,
    eq_fn,
    hash_fn,
    partial_cmp_fn,
    CellInfo,
    CloneFns,
    CmpFn,
    DebugFn,
    EqFn,
    HashFn,
    PartialCmpFn,
};
use crate::repr::niche::AltShape;
use crate::traits::Alternative;
use crate::visit::{
    Dispatch,
    Handler,
    Mode,
};

/// A fixed, closed list of alternative types.
///
/// # Safety
/// * `Union` must be at least as large and as aligned as every alternative, with every
///   alternative at offset `0`
/// * `CELLS` must have exactly `LEN` entries, entry `i` describing alternative `i`
pub unsafe trait AltList: Sized {
    /// Number of alternatives.
    const LEN: usize;
    /// Per-position layout and destruction table.
    const CELLS: &'static [CellInfo];
    /// The first alternative, the one a default constructed value holds.
    type Head;
    /// A union of all alternatives.
    type Union;
}

/// The alternatives as the variants of a plain enum, followed by a `Valueless(H)` variant.
///
/// The compiler leaves variants out of the layout when they can't be built and take no space,
/// so with `H` uninhabited the enum is exactly as large as one without a valueless variant.
///
/// [`Native`]: crate::repr::discriminant::Native
///
/// # Safety
/// * `position` must return the position of the variant `wrap` built, `LEN` for `Valueless`
/// * `payload` and `payload_mut` must point to the alternative held by the variant
pub unsafe trait NativeList<H>: AltList {
    type Enum;

    /// Moves the alternative at `index` from `src` into a new enum at `dst`.
    ///
    /// # Safety
    /// * `src` must point to a live alternative at `index`, or `index` must be `LEN` and `H`
    ///   inhabited
    /// * `dst` must be valid for writes
    unsafe fn wrap(index: usize, src: *const u8, dst: *mut Self::Enum);

    fn position(value: &Self::Enum) -> usize;

    fn payload(value: &Self::Enum) -> *const u8;

    fn payload_mut(value: &mut Self::Enum) -> *mut u8;
}

/// `T` is the alternative at position `I`.
///
/// Naming `T` lets the compiler infer `I`, naming `I` lets it infer `T`. A type that appears
/// more than once has several positions, in which case the position must be spelled out.
///
/// # Safety
/// * the alternative at position `I::VALUE` of `Self` must be exactly `T`
pub unsafe trait Has<T, I: Index>: AltList {}

/// Every alternative is [`Clone`].
///
/// # Safety
/// * `CLONE[i]` must operate on alternative `i`
pub unsafe trait CloneList: AltList {
    const CLONE: &'static [CloneFns];
}

/// Every alternative is [`PartialEq`].
///
/// # Safety
/// * `EQ[i]` must operate on alternative `i`
pub unsafe trait EqList: AltList {
    const EQ: &'static [EqFn];
}

/// Every alternative is [`Eq`].
///
/// # Safety
/// * every alternative of `Self` must implement [`Eq`]
pub unsafe trait TotalEqList: EqList {}

/// Every alternative is [`PartialOrd`].
///
/// # Safety
/// * `PARTIAL_CMP[i]` must operate on alternative `i`
pub unsafe trait PartialOrdList: EqList {
    const PARTIAL_CMP: &'static [PartialCmpFn];
}

/// Every alternative is [`Ord`].
///
/// # Safety
/// * `CMP[i]` must operate on alternative `i`
pub unsafe trait OrdList: PartialOrdList {
    const CMP: &'static [CmpFn];
}

/// Every alternative is [`Hash`](core::hash::Hash).
///
/// # Safety
/// * `HASH[i]` must operate on alternative `i`
pub unsafe trait HashList: AltList {
    const HASH: &'static [HashFn];
}

/// Every alternative is [`Debug`](core::fmt::Debug).
///
/// # Safety
/// * `DEBUG[i]` must operate on alternative `i`
pub unsafe trait DebugList: AltList {
    const DEBUG: &'static [DebugFn];
}

/// Every alternative describes its representation, which is what the niche analysis needs.
///
/// # Safety
/// * `SHAPES[i]` must describe alternative `i`
pub unsafe trait NicheList: AltList {
    const SHAPES: &'static [AltShape];
}

/// Every alternative has a conversion class, so values can be converted into the list.
///
/// # Safety
/// * `CLASSES[i]` and `CONVERT[i]` must describe alternative `i`
pub unsafe trait ConvertList: AltList {
    const CLASSES: &'static [Class];
    const CONVERT: &'static [ConvertFns];
}

macro_rules! alt_list {
    (
        $len:literal, $Union:ident, $Native:ident {
            $hf:ident: $Head:ident @ $hn:literal / $HI:ident
            $(, $field:ident: $T:ident @ $n:literal / $I:ident)* $(,)?
        }
    ) => {
        #[doc(hidden)]
        #[allow(dead_code)]
        #[repr(C)]
        pub union $Union<$Head, $($T),*> {
            $hf: ManuallyDrop<$Head>,
            $($field: ManuallyDrop<$T>,)*
        }

        #[doc(hidden)]
        #[allow(non_camel_case_types)]
        pub enum $Native<Hole, $Head, $($T),*> {
            $hf(ManuallyDrop<$Head>),
            $($field(ManuallyDrop<$T>),)*
            Valueless(Hole),
        }

        unsafe impl<Hole, $Head, $($T),*> NativeList<Hole> for ($Head, $($T,)*) {
            type Enum = $Native<Hole, $Head, $($T),*>;

            #[inline]
            unsafe fn wrap(index: usize, src: *const u8, dst: *mut Self::Enum) {
                let value = match index {
                    $hn => $Native::$hf(ManuallyDrop::new(src.cast::<$Head>().read())),
                    $($n => $Native::$field(ManuallyDrop::new(src.cast::<$T>().read())),)*
                    _ => $Native::Valueless(src.cast::<Hole>().read()),
                };
                dst.write(value)
            }

            #[inline]
            fn position(value: &Self::Enum) -> usize {
                match value {
                    $Native::$hf(_) => $hn,
                    $($Native::$field(_) => $n,)*
                    $Native::Valueless(_) => $len,
                }
            }

            #[inline]
            fn payload(value: &Self::Enum) -> *const u8 {
                match value {
                    $Native::$hf(x) => (x as *const ManuallyDrop<$Head>).cast(),
                    $($Native::$field(x) => (x as *const ManuallyDrop<$T>).cast(),)*
                    $Native::Valueless(x) => (x as *const Hole).cast(),
                }
            }

            #[inline]
            fn payload_mut(value: &mut Self::Enum) -> *mut u8 {
                match value {
                    $Native::$hf(x) => (x as *mut ManuallyDrop<$Head>).cast(),
                    $($Native::$field(x) => (x as *mut ManuallyDrop<$T>).cast(),)*
                    $Native::Valueless(x) => (x as *mut Hole).cast(),
                }
            }
        }

        unsafe impl<$Head, $($T),*> AltList for ($Head, $($T,)*) {
            const LEN: usize = $len;
            const CELLS: &'static [CellInfo] = &[CellInfo::of::<$Head>(), $(CellInfo::of::<$T>()),*];
            type Head = $Head;
            type Union = $Union<$Head, $($T),*>;
        }

        alt_list!(@has [$Head, $($T),*]; $Head / $HI $(, $T / $I)*);

        unsafe impl<$Head: Clone, $($T: Clone),*> CloneList for ($Head, $($T,)*) {
            const CLONE: &'static [CloneFns] = &[CloneFns::of::<$Head>(), $(CloneFns::of::<$T>()),*];
        }

        unsafe impl<$Head: PartialEq, $($T: PartialEq),*> EqList for ($Head, $($T,)*) {
            const EQ: &'static [EqFn] = &[eq_fn::<$Head>(), $(eq_fn::<$T>()),*];
        }

        unsafe impl<$Head: Eq, $($T: Eq),*> TotalEqList for ($Head, $($T,)*) {}

        unsafe impl<$Head: PartialOrd, $($T: PartialOrd),*> PartialOrdList for ($Head, $($T,)*) {
            const PARTIAL_CMP: &'static [PartialCmpFn] =
                &[partial_cmp_fn::<$Head>(), $(partial_cmp_fn::<$T>()),*];
        }

        unsafe impl<$Head: Ord, $($T: Ord),*> OrdList for ($Head, $($T,)*) {
            const CMP: &'static [CmpFn] = &[cmp_fn::<$Head>(), $(cmp_fn::<$T>()),*];
        }

        unsafe impl<$Head: core::hash::Hash, $($T: core::hash::Hash),*> HashList
            for ($Head, $($T,)*)
        {
            const HASH: &'static [HashFn] = &[hash_fn::<$Head>(), $(hash_fn::<$T>()),*];
        }

        unsafe impl<$Head: core::fmt::Debug, $($T: core::fmt::Debug),*> DebugList
            for ($Head, $($T,)*)
        {
            const DEBUG: &'static [DebugFn] = &[debug_fn::<$Head>(), $(debug_fn::<$T>()),*];
        }

        unsafe impl<$Head: Alternative, $($T: Alternative),*> NicheList for ($Head, $($T,)*) {
            const SHAPES: &'static [AltShape] = &[AltShape::of::<$Head>(), $(AltShape::of::<$T>()),*];
        }

        unsafe impl<$Head: Alternative + 'static, $($T: Alternative + 'static),*> ConvertList
            for ($Head, $($T,)*)
        {
            const CLASSES: &'static [Class] =
                &[<$Head as Alternative>::CLASS, $(<$T as Alternative>::CLASS),*];
            const CONVERT: &'static [ConvertFns] =
                &[ConvertFns::of::<$Head>(), $(ConvertFns::of::<$T>()),*];
        }

        unsafe impl<'a, M, H, $Head: 'a, $($T: 'a),*> Dispatch<'a, M, H> for ($Head, $($T,)*)
        where
            M: Mode,
            H: Handler<(<M as Mode>::Ref<'a, $Head>,)>
                $(+ Handler<
                    (<M as Mode>::Ref<'a, $T>,),
                    Output = <H as Handler<(<M as Mode>::Ref<'a, $Head>,)>>::Output,
                >)*,
        {
            type Output = <H as Handler<(<M as Mode>::Ref<'a, $Head>,)>>::Output;

            #[inline]
            unsafe fn dispatch(ptr: *mut u8, index: usize, handler: H) -> Self::Output {
                match index {
                    $hn => <H as Handler<(<M as Mode>::Ref<'a, $Head>,)>>::call(
                        handler,
                        (<M as Mode>::project::<$Head>(ptr),),
                    ),
                    $(
                        $n => <H as Handler<(<M as Mode>::Ref<'a, $T>,)>>::call(
                            handler,
                            (<M as Mode>::project::<$T>(ptr),),
                        ),
                    )*
                    _ => unreachable!("dispatch on position {} of {} alternatives", index, $len),
                }
            }
        }
    };
    (@has $all:tt; $($T:ident / $I:ident),+) => {
        $( alt_list!(@has_one $all $T $I); )+
    };
    (@has_one [$($all:ident),+ $(,)?] $T:ident $I:ident) => {
        unsafe impl<$($all),+> Has<$T, $I> for ($($all,)+) {}
    };
}

alt_list!(1, Union1, Native1 { a: A @ 0 / U0 });
alt_list!(2, Union2, Native2 { a: A @ 0 / U0, b: B @ 1 / U1 });
alt_list!(3, Union3, Native3 { a: A @ 0 / U0, b: B @ 1 / U1, c: C @ 2 / U2 });
alt_list!(4, Union4, Native4 { a: A @ 0 / U0, b: B @ 1 / U1, c: C @ 2 / U2, d: D @ 3 / U3 });
alt_list!(5, Union5, Native5 {
    a: A @ 0 / U0,
    b: B @ 1 / U1,
    c: C @ 2 / U2,
    d: D @ 3 / U3,
    e: E @ 4 / U4,
});
alt_list!(6, Union6, Native6 {
    a: A @ 0 / U0,
    b: B @ 1 / U1,
    c: C @ 2 / U2,
    d: D @ 3 / U3,
    e: E @ 4 / U4,
    f: F @ 5 / U5,
});
alt_list!(7, Union7, Native7 {
    a: A @ 0 / U0,
    b: B @ 1 / U1,
    c: C @ 2 / U2,
    d: D @ 3 / U3,
    e: E @ 4 / U4,
    f: F @ 5 / U5,
    g: G @ 6 / U6,
});
alt_list!(8, Union8, Native8 {
    a: A @ 0 / U0,
    b: B @ 1 / U1,
    c: C @ 2 / U2,
    d: D @ 3 / U3,
    e: E @ 4 / U4,
    f: F @ 5 / U5,
    g: G @ 6 / U6,
    h: H8 @ 7 / U7,
});

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;

    fn position<L: Has<T, I>, T, I: Index>() -> usize {
        I::VALUE
    }

    #[test]
    fn test_len_and_cells() {
        assert_eq!(<(u8,)>::LEN, 1);
        assert_eq!(<(u8, u16, u32, u64, i8, i16, i32, i64)>::LEN, 8);

        let cells = <(u8, String, ())>::CELLS;
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1].size(), mem::size_of::<String>());
        assert!(cells[2].is_zero_sized());
    }

    #[test]
    fn test_union_layout() {
        type L = (u8, [u16; 5], u32);
        assert_eq!(mem::size_of::<<L as AltList>::Union>(), 12);
        assert_eq!(mem::align_of::<<L as AltList>::Union>(), 4);
    }

    #[test]
    fn test_has_infers_position() {
        assert_eq!(position::<(u8, String, f64), String, _>(), 1);
        assert_eq!(position::<(u8, String, f64), f64, _>(), 2);
        // a repeated type needs its position spelled out
        assert_eq!(position::<(u8, u8), _, U1>(), 1);
    }

    #[test]
    fn test_capability_tables_have_one_entry_per_alternative() {
        type L = (i32, String, Box<str>);
        assert_eq!(<L as CloneList>::CLONE.len(), 3);
        assert_eq!(<L as EqList>::EQ.len(), 3);
        assert_eq!(<L as OrdList>::CMP.len(), 3);
        assert_eq!(<L as HashList>::HASH.len(), 3);
        assert_eq!(<L as DebugList>::DEBUG.len(), 3);
        assert_eq!(<L as ConvertList>::CLASSES.len(), 3);
    }

    #[test]
    fn test_native_enum_wraps_by_position() {
        type L = (u8, u64, ());
        type Enum = <L as NativeList<()>>::Enum;

        let mut value = mem::MaybeUninit::<Enum>::uninit();
        let n = 7_u64;
        unsafe { L::wrap(1, (&n as *const u64).cast(), value.as_mut_ptr()) };
        let mut value = unsafe { value.assume_init() };
        assert_eq!(L::position(&value), 1);
        assert_eq!(unsafe { L::payload(&value).cast::<u64>().read() }, 7);

        unsafe { L::payload_mut(&mut value).cast::<u64>().write(9) };
        assert!(matches!(&value, Native3::b(n) if **n == 9));

        let mut valueless = mem::MaybeUninit::<Enum>::uninit();
        unsafe { L::wrap(3, (&() as *const ()).cast(), valueless.as_mut_ptr()) };
        assert_eq!(L::position(unsafe { valueless.assume_init_ref() }), 3);
    }

    #[test]
    fn test_native_enum_without_a_hole() {
        // an uninhabited hole takes no part in the layout
        type L = (&'static u8, ());
        assert_eq!(
            mem::size_of::<<L as NativeList<core::convert::Infallible>>::Enum>(),
            mem::size_of::<&u8>()
        );
        assert!(mem::size_of::<<L as NativeList<()>>::Enum>() > mem::size_of::<&u8>());
    }
}
