//! The allocator proper: orchestrates the block pool and the bin index to
//! implement `alloc`, `free`, split and coalesce.

use crate::bins::{floor_bin, Bins};
use crate::block::{Allocation, Block, BlockInfo, HEAD_MASK, HEAD_TAG, UNUSED};
use crate::error::AllocatorError;
use crate::pool::Pool;

/// Upper bound on simultaneously-live blocks (free or allocated). Exceeding
/// it surfaces as [`AllocatorError::OutOfMemory`] from `alloc`, exactly as
/// running out of bins does.
pub const MAX_ALLOCS: usize = 131_072;

/// A two-level segregated-fit allocator over a fixed-size range `[0, total_size)`.
///
/// `Allocator` never touches the bytes of the range it manages — it only
/// hands out and reclaims `(offset, size)` sub-ranges as opaque
/// [`Allocation`] handles. Construct with [`Allocator::new`], sub-allocate
/// with [`Allocator::alloc`]/[`Allocator::free`], and inspect fragmentation
/// with [`Allocator::blocks`].
pub struct Allocator {
    pool: Pool,
    bins: Bins,
    bin_heads: [u32; 256],
    head_block: u32,
    total_size: u32,
    #[cfg(feature = "counters")]
    peak_live: usize,
}

impl Allocator {
    /// Constructs an allocator over `[0, total_size)`.
    ///
    /// # Errors
    /// Returns [`AllocatorError::OutOfMemory`] if `total_size == 0` or if the
    /// backing block-record pool (capacity [`MAX_ALLOCS`]) could not be
    /// allocated.
    pub fn new(total_size: u32) -> Result<Self, AllocatorError> {
        if total_size == 0 {
            log::warn!("offset_allocator: refusing to construct a zero-size allocator");
            return Err(AllocatorError::OutOfMemory);
        }

        let pool = Pool::with_capacity(MAX_ALLOCS)?;
        let mut this = Self {
            pool,
            bins: Bins::new(),
            bin_heads: [UNUSED; 256],
            head_block: UNUSED,
            total_size,
            #[cfg(feature = "counters")]
            peak_live: 0,
        };
        this.insert(0, total_size, UNUSED, UNUSED)?;
        Ok(this)
    }

    /// The size of the managed address space, as given to [`Allocator::new`].
    #[inline]
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Sub-allocates a range of `size` bytes.
    ///
    /// # Errors
    /// Returns [`AllocatorError::OutOfMemory`] if `size == 0`, if no free
    /// block is large enough, or if splitting the chosen block would exceed
    /// [`MAX_ALLOCS`] live blocks. On error no handle is produced and the
    /// allocator's visible state is unchanged for the caller's purposes,
    /// though see the note on split failure in [`Allocator::alloc`]'s source.
    pub fn alloc(&mut self, size: u32) -> Result<Allocation, AllocatorError> {
        if size == 0 {
            return Err(AllocatorError::OutOfMemory);
        }

        let Some(bin) = self.bins.find_ge(size) else {
            log::warn!("offset_allocator: out of memory, no bin >= {size} bytes");
            return Err(AllocatorError::OutOfMemory);
        };

        let id = self.bin_heads[bin];
        let next = self.pool.get(id).bin_next;
        self.bin_heads[bin] = next;
        if next != UNUSED {
            self.pool.get_mut(next).bin_prev = HEAD_TAG | bin as u32;
        } else {
            self.bins.clear(bin);
        }

        let block = self.pool.get_mut(id);
        block.bin_prev = UNUSED;
        block.bin_next = UNUSED;
        let offset = block.offset;
        let block_size = block.size;
        let mem_next = block.mem_next;

        debug_assert!(block_size >= size, "bin index picked a block smaller than the request");
        let remaining = block_size - size;
        if remaining > 0 {
            // NB: if this fails because the pool is full, `id` has already
            // been unlinked from its bin and marked allocated, yet we return
            // an error and write no handle. The range is leaked until the
            // allocator is dropped. See the design notes for why this isn't
            // papered over here: fixing it requires deciding whether to
            // pre-check capacity or restore `id` to its bin, and either
            // changes observable OOM timing.
            self.insert(offset + size, remaining, id, mem_next)?;
        }
        self.pool.get_mut(id).size = size;

        #[cfg(feature = "counters")]
        {
            self.peak_live = self.peak_live.max(self.pool.live_count());
        }

        log::debug!("offset_allocator: alloc {size} bytes at offset {offset} (block {id})");
        Ok(Allocation { offset, size, block_id: id })
    }

    /// Returns the range held by `handle` to the allocator, coalescing with
    /// physically adjacent free neighbours.
    ///
    /// A [`Allocation::EMPTY`] (or any handle with `size == 0`) is a no-op,
    /// matching the "not currently holding an allocation" idiom used
    /// throughout this crate family.
    pub fn free(&mut self, handle: Allocation) {
        if handle.size == 0 {
            return;
        }

        let id = handle.block_id;
        let mut block = *self.pool.get(id);
        self.pool.release(id);

        let prev_id = block.mem_prev;
        if prev_id != UNUSED && !self.pool.get(prev_id).is_used() {
            let prev = *self.pool.get(prev_id);
            block.offset = prev.offset;
            block.size += prev.size;
            self.remove(prev_id);
            block.mem_prev = prev.mem_prev;
        }

        let next_id = block.mem_next;
        if next_id != UNUSED && !self.pool.get(next_id).is_used() {
            let next = *self.pool.get(next_id);
            block.size += next.size;
            self.remove(next_id);
            block.mem_next = next.mem_next;
        }

        log::debug!(
            "offset_allocator: free block {id}, coalesced range offset {} size {}",
            block.offset,
            block.size
        );

        self.insert(block.offset, block.size, block.mem_prev, block.mem_next)
            .expect("a slot just released by this free must be available for the merged block");
    }

    /// The first block in the physical list (lowest offset). Always
    /// `Some` for a constructed allocator; only absent if `total_size` were
    /// somehow zero, which [`Allocator::new`] forbids.
    pub fn head(&self) -> BlockInfo {
        self.describe(self.head_block)
    }

    /// The next block in the physical list after `block`, or `None` at the
    /// top of the address space.
    pub fn next(&self, block: BlockInfo) -> Option<BlockInfo> {
        if block.mem_next == UNUSED {
            None
        } else {
            Some(self.describe(block.mem_next))
        }
    }

    /// An iterator over the physical list from `head()` to the end.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks { allocator: self, next: Some(self.head_block) }
    }

    #[cfg(feature = "counters")]
    /// Number of currently-live blocks (allocated and free), tracked only
    /// when the `counters` feature is enabled.
    pub fn live_block_count(&self) -> usize {
        self.pool.live_count()
    }

    #[cfg(feature = "counters")]
    /// High-water mark of [`Allocator::live_block_count`], tracked only when
    /// the `counters` feature is enabled.
    pub fn peak_live_block_count(&self) -> usize {
        self.peak_live
    }

    fn describe(&self, id: u32) -> BlockInfo {
        let block = self.pool.get(id);
        BlockInfo {
            offset: block.offset,
            size: block.size,
            is_used: block.is_used(),
            id,
            mem_next: block.mem_next,
        }
    }

    /// Creates a new free block and files it into both the physical list
    /// (splicing it between `mem_prev` and `mem_next`) and its floor bin.
    fn insert(
        &mut self,
        offset: u32,
        size: u32,
        mem_prev: u32,
        mem_next: u32,
    ) -> Result<u32, AllocatorError> {
        debug_assert!(size > 0);

        let id = self.pool.acquire()?;
        let bin = floor_bin(size);
        self.bins.set(bin);

        let old_head = self.bin_heads[bin];
        *self.pool.get_mut(id) = Block {
            offset,
            size,
            bin_prev: HEAD_TAG | bin as u32,
            bin_next: old_head,
            mem_prev,
            mem_next,
        };
        if old_head != UNUSED {
            self.pool.get_mut(old_head).bin_prev = id;
        }
        if mem_prev != UNUSED {
            self.pool.get_mut(mem_prev).mem_next = id;
        }
        if mem_next != UNUSED {
            self.pool.get_mut(mem_next).mem_prev = id;
        }
        self.bin_heads[bin] = id;

        if offset == 0 {
            self.head_block = id;
        }

        log::trace!("offset_allocator: insert block {id} into bin {bin} (offset {offset}, size {size})");
        Ok(id)
    }

    /// Removes a free block from its bin list. Physical-list links are left
    /// untouched — callers (`alloc`'s split, `free`'s coalesce) are
    /// responsible for rewiring those themselves.
    fn remove(&mut self, id: u32) {
        let block = *self.pool.get(id);
        self.pool.release(id);

        log::trace!("offset_allocator: remove block {id} from its bin");

        if !block.is_bin_head() {
            self.pool.get_mut(block.bin_prev).bin_next = block.bin_next;
            if block.bin_next != UNUSED {
                self.pool.get_mut(block.bin_next).bin_prev = block.bin_prev;
            }
            return;
        }

        let bin = (block.bin_prev & HEAD_MASK) as usize;
        self.bin_heads[bin] = block.bin_next;
        if block.bin_next != UNUSED {
            self.pool.get_mut(block.bin_next).bin_prev = block.bin_prev;
            return;
        }
        self.bins.clear(bin);
    }
}

/// Iterator over the physical list, from [`Allocator::head`] to the end of
/// the address space. Yields both allocated and free blocks.
pub struct Blocks<'a> {
    allocator: &'a Allocator,
    next: Option<u32>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let info = self.allocator.describe(id);
        self.next = if info.mem_next == UNUSED { None } else { Some(info.mem_next) };
        Some(info)
    }
}
