//! Where the index of the active alternative is kept.
//!
//! An [`Encode`] picks the block an alternative is stored in, along with the discriminant:
//!
//! * [`Native`] stores the alternatives as the variants of a plain Rust enum, and lets the
//!   compiler lay it out. When the largest alternative has bit patterns it never uses, and the
//!   others are zero sized, the discriminant goes into those patterns, otherwise it gets a tag
//!   of its own.
//! * [`Tagged`] always keeps an explicit byte next to a union of the alternatives.
//! * [`Niched`] always keeps the discriminant in the unused patterns of the largest
//!   alternative, with the mapping computed by [`analyze`], and rejects lists where that's
//!   impossible at compile time.

use core::marker::PhantomData;
use core::ptr;

use super::niche::{
    analyze,
    discriminant_bytes,
    NicheMapping,
};
use super::RawStorage;
use crate::list::{
    AltList,
    NativeList,
    NicheList,
};
use crate::policy::{
    status_count,
    Policy,
};

/// A way of storing alternatives `L` under policy `P`, along with the discriminant.
///
/// # Safety
/// * after `init(block, index, _)` returns, `index(block)` must return `index`, and `as_ptr`
///   must point to the alternative `write` built, for as long as that alternative is only
///   changed in place
/// * `Block` must not have drop glue
pub unsafe trait Encode<L: AltList, P: Policy<L>> {
    /// The alternative and the discriminant, together.
    type Block;

    /// The niche mapping this encoding stores the discriminant with, if it uses one of its
    /// own.
    const NICHE: Option<NicheMapping>;

    /// Builds the alternative at `index` by calling `write` with a pointer to uninitialized
    /// memory for it, then marks it active. The valueless index marks the block valueless,
    /// `write` has nothing to build then.
    ///
    /// When `write` panics the block is left as it was.
    ///
    /// # Safety
    /// * `block` must be valid for writes, anything live in it is overwritten without being
    ///   dropped
    /// * `write` must initialize the alternative at `index`
    /// * `index` may only be the valueless index when the policy allows for it
    unsafe fn init<F: FnOnce(*mut u8)>(block: *mut Self::Block, index: usize, write: F);

    /// # Safety
    /// * `block` must have been set up by `init`
    unsafe fn index(block: &Self::Block) -> usize;

    /// Pointer to the active alternative.
    ///
    /// # Safety
    /// * `block` must have been set up by `init`, with an alternative
    unsafe fn as_ptr(block: &Self::Block) -> *const u8;

    /// # Safety
    /// * `block` must have been set up by `init`, with an alternative
    unsafe fn as_mut_ptr(block: &mut Self::Block) -> *mut u8;
}

/// A plain Rust enum of the alternatives, laid out however the compiler likes.
///
/// ```
/// use std::mem::size_of;
/// use compact_variant::{Empty, NeverValueless, Variant};
///
/// // the reference is never null, so null marks `Empty`
/// assert_eq!(size_of::<Variant<(&u64, Empty), NeverValueless>>(), size_of::<&u64>());
///
/// // `u32` uses every pattern, so there's a tag
/// assert!(size_of::<Variant<(u32, Empty), NeverValueless>>() > size_of::<u32>());
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct Native;

unsafe impl<L, P> Encode<L, P> for Native
where
    L: NativeList<<P as Policy<L>>::Hole>,
    P: Policy<L>,
{
    type Block = <L as NativeList<P::Hole>>::Enum;

    const NICHE: Option<NicheMapping> = None;

    #[inline]
    unsafe fn init<F: FnOnce(*mut u8)>(block: *mut Self::Block, index: usize, write: F) {
        debug_assert!(index < L::LEN || P::VALUELESS);
        let mut staged = RawStorage::<L>::uninit();
        write(staged.as_mut_ptr());
        L::wrap(index, staged.as_ptr(), block);
    }

    #[inline(always)]
    unsafe fn index(block: &Self::Block) -> usize {
        L::position(block)
    }

    #[inline(always)]
    unsafe fn as_ptr(block: &Self::Block) -> *const u8 {
        L::payload(block)
    }

    #[inline(always)]
    unsafe fn as_mut_ptr(block: &mut Self::Block) -> *mut u8 {
        L::payload_mut(block)
    }
}

/// A union of the alternatives, followed by an explicit `u8` discriminant.
#[derive(Debug, Copy, Clone, Default)]
pub struct Tagged;

#[doc(hidden)]
#[repr(C)]
pub struct TaggedBlock<L: AltList> {
    storage: RawStorage<L>,
    tag: u8,
}

unsafe impl<L: AltList, P: Policy<L>> Encode<L, P> for Tagged {
    type Block = TaggedBlock<L>;

    const NICHE: Option<NicheMapping> = {
        assert!(discriminant_bytes(status_count::<L, P>()) == 1);
        None
    };

    #[inline(always)]
    unsafe fn init<F: FnOnce(*mut u8)>(block: *mut TaggedBlock<L>, index: usize, write: F) {
        // checks the tag width for this list
        let _ = <Self as Encode<L, P>>::NICHE;
        write(ptr::addr_of_mut!((*block).storage).cast());
        ptr::addr_of_mut!((*block).tag).write(index as u8);
    }

    #[inline(always)]
    unsafe fn index(block: &TaggedBlock<L>) -> usize {
        block.tag as usize
    }

    #[inline(always)]
    unsafe fn as_ptr(block: &TaggedBlock<L>) -> *const u8 {
        block.storage.as_ptr()
    }

    #[inline(always)]
    unsafe fn as_mut_ptr(block: &mut TaggedBlock<L>) -> *mut u8 {
        block.storage.as_mut_ptr()
    }
}

/// The discriminant folded into the unused bit patterns of the largest alternative, by the
/// mapping [`analyze`] computes.
///
/// Every other alternative has to be zero sized, and the largest one needs enough unused
/// patterns for all of them, plus the valueless state if the policy has one. Unlike
/// [`Native`], which falls back to a tag, a list that doesn't qualify fails to compile:
///
/// ```compile_fail
/// use compact_variant::{NeverValueless, Niched, Variant};
///
/// // `u32` uses every bit pattern
/// let v: Variant<(u32, ()), NeverValueless, Niched> = Variant::new(1_u32);
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct Niched;

struct Mapping<L, P>(PhantomData<(L, P)>);

impl<L: NicheList, P: Policy<L>> Mapping<L, P> {
    const VALUE: NicheMapping = match analyze(L::SHAPES, status_count::<L, P>()) {
        Some(mapping) => mapping,
        None => panic!("these alternatives have no niche that fits the discriminant"),
    };
}

unsafe impl<L: NicheList, P: Policy<L>> Encode<L, P> for Niched {
    type Block = RawStorage<L>;

    const NICHE: Option<NicheMapping> = Some(Mapping::<L, P>::VALUE);

    #[inline]
    unsafe fn init<F: FnOnce(*mut u8)>(block: *mut RawStorage<L>, index: usize, write: F) {
        let mapping = Mapping::<L, P>::VALUE;
        let dst = block.cast::<u8>();
        write(dst);
        // the niche bearing alternative is its own marker
        if index != mapping.niche_index {
            write_bits(dst, mapping.scalar.bytes(), mapping.encode(index));
        }
    }

    #[inline]
    unsafe fn index(block: &RawStorage<L>) -> usize {
        let mapping = Mapping::<L, P>::VALUE;
        mapping.decode(read_bits(block.as_ptr(), mapping.scalar.bytes()))
    }

    #[inline(always)]
    unsafe fn as_ptr(block: &RawStorage<L>) -> *const u8 {
        block.as_ptr()
    }

    #[inline(always)]
    unsafe fn as_mut_ptr(block: &mut RawStorage<L>) -> *mut u8 {
        block.as_mut_ptr()
    }
}

#[inline(always)]
unsafe fn read_bits(ptr: *const u8, bytes: usize) -> u128 {
    match bytes {
        1 => ptr.read() as u128,
        2 => ptr::read_unaligned(ptr.cast::<u16>()) as u128,
        4 => ptr::read_unaligned(ptr.cast::<u32>()) as u128,
        8 => ptr::read_unaligned(ptr.cast::<u64>()) as u128,
        16 => ptr::read_unaligned(ptr.cast::<u128>()),
        _ => unreachable!("scalar of {} bytes", bytes),
    }
}

#[inline(always)]
unsafe fn write_bits(ptr: *mut u8, bytes: usize, bits: u128) {
    match bytes {
        1 => ptr.write(bits as u8),
        2 => ptr::write_unaligned(ptr.cast::<u16>(), bits as u16),
        4 => ptr::write_unaligned(ptr.cast::<u32>(), bits as u32),
        8 => ptr::write_unaligned(ptr.cast::<u64>(), bits as u64),
        16 => ptr::write_unaligned(ptr.cast::<u128>(), bits),
        _ => unreachable!("scalar of {} bytes", bytes),
    }
}
