use core::fmt;

/// Failure modes of [`Allocator`](crate::Allocator).
///
/// There is presently only one: every fallible operation in this crate fails
/// the same way, by being unable to find or create space for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AllocatorError {
    /// Either no free bin holds a block large enough for the request, or the
    /// block-record pool is exhausted (at most [`MAX_ALLOCS`](crate::MAX_ALLOCS)
    /// live blocks may exist at once).
    OutOfMemory,
}

impl fmt::Display for AllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocatorError::OutOfMemory => f.write_str("offset allocator out of memory"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocatorError {}
