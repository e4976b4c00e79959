//! A two-level segregated-fit (TLSF) offset allocator.
//!
//! This crate sub-allocates disjoint `(offset, size)` ranges out of a single
//! fixed-size logical address space without ever owning or touching the
//! underlying bytes. Layer it over a GPU buffer, a memory-mapped file, a
//! preallocated staging arena, or anything else addressed by an offset and a
//! size — this crate only tracks which ranges are free.
//!
//! ```
//! use offset_allocator::Allocator;
//!
//! let mut alloc = Allocator::new(1024).unwrap();
//! let a = alloc.alloc(300).unwrap();
//! assert_eq!((a.offset, a.size), (0, 300));
//! alloc.free(a);
//! ```
//!
//! # Non-goals
//!
//! This allocator is not thread-safe (wrap it in your own mutex if you need
//! to share it), does not resize its address space after construction, does
//! not defragment by relocation (offsets are stable until freed), and tracks
//! no alignment beyond what the caller folds into the requested size.
#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod allocator;
mod bins;
mod block;
mod error;
mod pool;

pub use allocator::{Allocator, Blocks, MAX_ALLOCS};
pub use block::{Allocation, BlockInfo};
pub use error::AllocatorError;
