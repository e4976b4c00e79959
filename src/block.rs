//! The block record and the sentinels used to tag its links.
//!
//! A block participates in up to two intrusive linked lists at once: the
//! physical list (`mem_prev`/`mem_next`, ordered by offset) and, while free,
//! a bin's free list (`bin_prev`/`bin_next`). Keeping both pairs of links on
//! the same record avoids a parallel indirection array.

/// Sentinel denoting "no such neighbour" (physical list) or, on an allocated
/// block's bin links, "not a member of any bin list".
pub(crate) const UNUSED: u32 = 0xFFFF_FFFF;

/// Marks `bin_prev` as carrying a bin index rather than a predecessor id.
/// `MAX_ALLOCS` is far below `2^28`, so genuine block ids never collide with
/// a tagged value.
pub(crate) const HEAD_TAG: u32 = 0xF000_0000;
pub(crate) const HEAD_MASK: u32 = 0x0FFF_FFFF;

/// A contiguous byte range within the managed address space.
///
/// Free blocks are reachable from both the physical list and a bin's free
/// list; allocated blocks are reachable only from the physical list, with
/// both bin links set to [`UNUSED`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Block {
    pub offset: u32,
    pub size: u32,
    pub bin_prev: u32,
    pub bin_next: u32,
    pub mem_prev: u32,
    pub mem_next: u32,
}

impl Block {
    pub const EMPTY: Block = Block {
        offset: 0,
        size: 0,
        bin_prev: UNUSED,
        bin_next: UNUSED,
        mem_prev: UNUSED,
        mem_next: UNUSED,
    };

    /// Whether this block is currently allocated (absent from every bin list).
    ///
    /// Sound because a free block's `bin_prev` always carries either
    /// [`HEAD_TAG`] (if it's the head of its bin list) or a genuine
    /// predecessor id; only an allocated block has both links set to
    /// [`UNUSED`] simultaneously.
    #[inline]
    pub fn is_used(&self) -> bool {
        self.bin_prev == UNUSED && self.bin_next == UNUSED
    }

    #[inline]
    pub fn is_bin_head(&self) -> bool {
        self.bin_prev & HEAD_TAG != 0
    }
}

/// A handle to a live allocation, returned by [`Allocator::alloc`](crate::Allocator::alloc)
/// and consumed by [`Allocator::free`](crate::Allocator::free).
///
/// `block_id` is a capability valid only until the handle is passed to
/// `free`; presenting it twice, or after mutating a different allocator
/// instance, is undefined behaviour the same way a double-free or
/// use-after-free of a raw pointer would be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub offset: u32,
    pub size: u32,
    pub(crate) block_id: u32,
}

impl Allocation {
    /// A sentinel allocation holding no memory. Mirrors the "not currently
    /// holding an allocation" idiom of `size == 0`: passing this to `free` is
    /// always a no-op.
    pub const EMPTY: Allocation = Allocation { offset: 0, size: 0, block_id: UNUSED };

    /// Whether this handle represents no allocation (`size == 0`).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl Default for Allocation {
    fn default() -> Self {
        Allocation::EMPTY
    }
}

/// A snapshot of a block in the physical list, returned by iteration.
///
/// Unlike [`Allocation`], this carries no allocating capability — it only
/// describes the range and whether it's currently allocated, for
/// fragmentation inspection and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub offset: u32,
    pub size: u32,
    pub is_used: bool,
    pub(crate) id: u32,
    pub(crate) mem_next: u32,
}
