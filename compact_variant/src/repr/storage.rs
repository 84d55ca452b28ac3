use core::fmt;
use core::mem::MaybeUninit;

use super::cell::max_size;
use crate::list::AltList;

/// An uninitialized block big enough, and aligned enough, for any alternative of `L`.
///
/// `RawStorage` never runs a destructor on its own. Whoever writes an alternative into it is
/// responsible for tracking which one (if any) is live and for destroying it, the discriminant
/// kept next to the storage in [`super::Repr`] is what does that.
///
/// Every alternative lives at offset `0`, so the by-position accessors below all hand out the
/// same address, the position only selects the type.
#[repr(transparent)]
pub struct RawStorage<L: AltList> {
    bytes: MaybeUninit<L::Union>,
}

impl<L: AltList> RawStorage<L> {
    #[inline(always)]
    pub const fn uninit() -> Self {
        RawStorage {
            bytes: MaybeUninit::uninit(),
        }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr().cast()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr().cast()
    }

    /// Moves `value` into the block, without dropping whatever was there.
    ///
    /// # Safety
    /// * `T` must be one of the alternatives of `L`
    #[inline]
    pub unsafe fn write<T>(&mut self, value: T) {
        debug_assert!(core::mem::size_of::<T>() <= max_size(L::CELLS));
        self.as_mut_ptr().cast::<T>().write(value)
    }

    /// # Safety
    /// * a `T` must be live in the block
    #[inline]
    pub unsafe fn get<T>(&self) -> &T {
        &*self.as_ptr().cast::<T>()
    }

    /// # Safety
    /// * a `T` must be live in the block
    #[inline]
    pub unsafe fn get_mut<T>(&mut self) -> &mut T {
        &mut *self.as_mut_ptr().cast::<T>()
    }

    /// Moves the live `T` out of the block, leaving it logically uninitialized.
    ///
    /// # Safety
    /// * a `T` must be live in the block
    #[inline]
    pub unsafe fn read<T>(&self) -> T {
        self.as_ptr().cast::<T>().read()
    }

    /// Destroys the alternative at position `index`.
    ///
    /// # Safety
    /// * the alternative at `index` must be live in the block
    #[inline]
    pub unsafe fn drop_in_place(&mut self, index: usize) {
        debug_assert!(index < L::LEN);
        L::CELLS[index].drop_in_place(self.as_mut_ptr())
    }
}

impl<L: AltList> fmt::Debug for RawStorage<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("size", &core::mem::size_of::<L::Union>())
            .field("align", &core::mem::align_of::<L::Union>())
            .finish()
    }
}
