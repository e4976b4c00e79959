//! Fixed-capacity block-record storage and its index free-list.
//!
//! Records never move once written: a `block_id` handed out by
//! [`Pool::acquire`] stays valid (and stable) until the matching
//! [`Pool::release`], exactly as `Allocation::block_id` promises to callers.

use alloc::vec::Vec;

use crate::block::Block;
use crate::error::AllocatorError;

pub(crate) struct Pool {
    blocks: Vec<Block>,
    /// Stack of currently-unused slot indices; `pop` hands out the next one.
    free_slots: Vec<u32>,
}

impl Pool {
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocatorError> {
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(capacity).map_err(|_| AllocatorError::OutOfMemory)?;
        blocks.resize(capacity, Block::EMPTY);

        let mut free_slots = Vec::new();
        free_slots.try_reserve_exact(capacity).map_err(|_| AllocatorError::OutOfMemory)?;
        free_slots.extend((0..capacity as u32).rev());

        Ok(Self { blocks, free_slots })
    }

    #[inline]
    pub fn acquire(&mut self) -> Result<u32, AllocatorError> {
        self.free_slots.pop().ok_or(AllocatorError::OutOfMemory)
    }

    #[inline]
    pub fn release(&mut self, id: u32) {
        debug_assert!(!self.free_slots.contains(&id), "double release of block {id}");
        self.free_slots.push(id);
    }

    #[inline]
    pub fn get(&self, id: u32) -> &Block {
        &self.blocks[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: u32) -> &mut Block {
        &mut self.blocks[id as usize]
    }

    /// Number of block records currently handed out (not sitting in the
    /// free-slot stack). Equals the physical list's length.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.blocks.len() - self.free_slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_accounting() {
        let mut pool = Pool::with_capacity(4).unwrap();
        assert_eq!(pool.live_count(), 0);

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_eq!(pool.live_count(), 2);

        pool.release(a);
        assert_eq!(pool.live_count(), 1);

        let _c = pool.acquire().unwrap();
        let _d = pool.acquire().unwrap();
        let _e = pool.acquire().unwrap();
        assert_eq!(pool.live_count(), 4);
        assert!(pool.acquire().is_err());

        pool.release(b);
        assert!(pool.acquire().is_ok());
    }
}
