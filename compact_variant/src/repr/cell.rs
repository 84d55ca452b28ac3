//! Capability queries and type-erased operations for a single alternative.
//!
//! Every position of an alternative list gets one entry in each table below. The engine only
//! ever sees `*const u8`/`*mut u8` pointing at the start of the storage block, the table entry
//! for the active discriminant restores the concrete type.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{
    Hash,
    Hasher,
};
use core::mem;
use core::ptr;

/// Alternatives no larger than this (and without drop glue) are built in a temporary before
/// they replace the active alternative.
pub const STAGE_LIMIT: usize = 256;

/// Layout and destruction facts about one alternative.
#[derive(Copy, Clone)]
pub struct CellInfo {
    size: usize,
    align: usize,
    needs_drop: bool,
    drop: unsafe fn(*mut u8),
    assign: unsafe fn(*mut u8, *mut u8),
}

impl CellInfo {
    pub const fn of<T>() -> Self {
        CellInfo {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            needs_drop: mem::needs_drop::<T>(),
            drop: drop_erased::<T>,
            assign: assign_erased::<T>,
        }
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    #[inline]
    pub const fn is_zero_sized(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub const fn is_trivially_destructible(&self) -> bool {
        !self.needs_drop
    }

    /// Whether a replacement with this alternative is cheap enough to stage in a temporary.
    ///
    /// Moving a value is a bitwise copy and can never unwind, so staging is always safe, the
    /// question is only whether it's worth keeping two values alive at once.
    #[inline]
    pub const fn is_stageable(&self) -> bool {
        !self.needs_drop && self.size <= STAGE_LIMIT
    }

    /// Runs the destructor of the alternative stored at `ptr`.
    ///
    /// # Safety
    /// * `ptr` must point to a live value of the alternative this entry describes
    /// * the value must not be used afterwards
    #[inline]
    pub(crate) unsafe fn drop_in_place(&self, ptr: *mut u8) {
        if self.needs_drop {
            (self.drop)(ptr)
        }
    }

    /// Moves the value at `src` over the live value at `dst`, dropping the latter.
    ///
    /// # Safety
    /// * both pointers must point to live values of the alternative this entry describes
    /// * `src` is logically uninitialized afterwards
    #[inline]
    pub(crate) unsafe fn assign(&self, dst: *mut u8, src: *mut u8) {
        (self.assign)(dst, src)
    }
}

impl fmt::Debug for CellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellInfo")
            .field("size", &self.size)
            .field("align", &self.align)
            .field("needs_drop", &self.needs_drop)
            .finish()
    }
}

/// Returns the largest size in `cells`.
pub const fn max_size(cells: &[CellInfo]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < cells.len() {
        if cells[i].size > max {
            max = cells[i].size;
        }
        i += 1;
    }
    max
}

unsafe fn drop_erased<T>(ptr: *mut u8) {
    ptr::drop_in_place(ptr.cast::<T>())
}

unsafe fn assign_erased<T>(dst: *mut u8, src: *mut u8) {
    *dst.cast::<T>() = src.cast::<T>().read();
}

/// Copy construction and copy assignment of one alternative.
#[derive(Copy, Clone)]
pub struct CloneFns {
    /// Writes a clone of `*src` into the uninitialized `dst`.
    pub(crate) clone: unsafe fn(*const u8, *mut u8),
    /// Assigns a clone of `*src` into the live `dst`.
    pub(crate) clone_from: unsafe fn(*const u8, *mut u8),
}

impl CloneFns {
    pub const fn of<T: Clone>() -> Self {
        CloneFns {
            clone: clone_erased::<T>,
            clone_from: clone_from_erased::<T>,
        }
    }
}

unsafe fn clone_erased<T: Clone>(src: *const u8, dst: *mut u8) {
    let value = (*src.cast::<T>()).clone();
    dst.cast::<T>().write(value);
}

unsafe fn clone_from_erased<T: Clone>(src: *const u8, dst: *mut u8) {
    (*dst.cast::<T>()).clone_from(&*src.cast::<T>());
}

pub type EqFn = unsafe fn(*const u8, *const u8) -> bool;
pub type PartialCmpFn = unsafe fn(*const u8, *const u8) -> Option<Ordering>;
pub type CmpFn = unsafe fn(*const u8, *const u8) -> Ordering;
pub type HashFn = unsafe fn(*const u8, &mut dyn Hasher);
pub type DebugFn = unsafe fn(*const u8, &mut fmt::Formatter<'_>) -> fmt::Result;

pub const fn eq_fn<T: PartialEq>() -> EqFn {
    eq_erased::<T>
}

pub const fn partial_cmp_fn<T: PartialOrd>() -> PartialCmpFn {
    partial_cmp_erased::<T>
}

pub const fn cmp_fn<T: Ord>() -> CmpFn {
    cmp_erased::<T>
}

pub const fn hash_fn<T: Hash>() -> HashFn {
    hash_erased::<T>
}

pub const fn debug_fn<T: fmt::Debug>() -> DebugFn {
    debug_erased::<T>
}

unsafe fn eq_erased<T: PartialEq>(a: *const u8, b: *const u8) -> bool {
    *a.cast::<T>() == *b.cast::<T>()
}

unsafe fn partial_cmp_erased<T: PartialOrd>(a: *const u8, b: *const u8) -> Option<Ordering> {
    (*a.cast::<T>()).partial_cmp(&*b.cast::<T>())
}

unsafe fn cmp_erased<T: Ord>(a: *const u8, b: *const u8) -> Ordering {
    (*a.cast::<T>()).cmp(&*b.cast::<T>())
}

unsafe fn hash_erased<T: Hash>(a: *const u8, mut state: &mut dyn Hasher) {
    (*a.cast::<T>()).hash(&mut state)
}

unsafe fn debug_erased<T: fmt::Debug>(a: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*a.cast::<T>(), f)
}
