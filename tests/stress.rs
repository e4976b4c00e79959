//! Translation of the original C repository's integrity test: repeatedly
//! free half of a working set of allocations and reallocate fresh ones in
//! their place, checking physical-list invariants after every single
//! `alloc`/`free` call. `fastrand` stands in for the original's `rand()`.

use offset_allocator::{Allocation, Allocator};

const ROUNDS: usize = 1000;
const ALLOCS: usize = 300;
const ALLOC_MAX_SIZE: u32 = 1024 * 1024 * 64;

/// Checks invariants 1 and 2 of the allocator's testable properties:
/// physical contiguity and no two adjacent free blocks.
fn assert_layout_is_sound(alloc: &Allocator) {
    let mut prev: Option<(u32, u32, bool)> = None;
    let mut end = 0u32;
    for block in alloc.blocks() {
        assert_eq!(block.offset, end, "gap or overlap in the physical list");
        if let Some((_, _, prev_used)) = prev {
            assert!(prev_used || block.is_used, "two adjacent free blocks");
        }
        end = block.offset + block.size;
        prev = Some((block.offset, block.size, block.is_used));
    }
    assert_eq!(end, alloc.total_size(), "physical list doesn't cover the whole arena");
}

#[test]
fn free_half_reallocate_half_preserves_invariants() {
    fastrand::seed(0xA110C_57E55);

    let mut alloc = Allocator::new(1024 * 1024 * 1024).unwrap();
    let mut allocs: Vec<Option<Allocation>> = Vec::with_capacity(ALLOCS);

    let random_size = || 256 * (1 + fastrand::u32(0..ALLOC_MAX_SIZE / 256));

    for _ in 0..ALLOCS {
        allocs.push(alloc.alloc(random_size()).ok());
        assert_layout_is_sound(&alloc);
    }

    for round in 0..ROUNDS {
        for i in 0..ALLOCS / 2 {
            let idx = 2 * i + (round % 2);
            if let Some(h) = allocs[idx].take() {
                alloc.free(h);
                assert_layout_is_sound(&alloc);
            }
        }
        for i in 0..ALLOCS / 2 {
            let idx = 2 * i + (round % 2);
            allocs[idx] = alloc.alloc(random_size()).ok();
            assert_layout_is_sound(&alloc);
        }
    }

    for h in allocs.into_iter().flatten() {
        alloc.free(h);
        assert_layout_is_sound(&alloc);
    }

    let head = alloc.head();
    assert_eq!((head.offset, head.size, head.is_used), (0, alloc.total_size(), false));
}

#[test]
fn allocation_failure_only_when_no_bin_is_large_enough() {
    // A small arena where the working set quickly exceeds capacity: every
    // failed `alloc` must correspond to a genuinely unsatisfiable request,
    // not a bug that loses track of free space.
    let mut alloc = Allocator::new(4096).unwrap();
    let mut live = Vec::new();
    let mut failures = 0;
    let mut successes = 0;

    fastrand::seed(7);
    for _ in 0..5000 {
        if fastrand::bool() && !live.is_empty() {
            let i = fastrand::usize(0..live.len());
            let h: Allocation = live.swap_remove(i);
            alloc.free(h);
        } else {
            let size = 1 + fastrand::u32(0..512);
            match alloc.alloc(size) {
                Ok(h) => {
                    successes += 1;
                    live.push(h);
                }
                Err(_) => failures += 1,
            }
        }
        assert_layout_is_sound(&alloc);
    }

    assert!(successes > 0);
    assert!(failures > 0, "a 4KiB arena under sustained pressure should fail sometimes");
}
