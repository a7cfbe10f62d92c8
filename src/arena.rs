//! Defines the [`Arena`] that backs every parser-era allocation: document
//! nodes, list children, and the few strings that are copied out of a source
//! buffer because they must be visible across files (page titles and
//! descriptions).
//!
//! The arena is a thin wrapper over [`bumpalo::Bump`]. Allocations are never
//! freed individually; everything is released together when the arena is
//! dropped at the end of a run. Anything allocated from an [`Arena`] borrows
//! it, so the borrow checker guarantees the arena outlives every document
//! tree built from it.

use bumpalo::Bump;

/// The size of each block the arena grabs from the system allocator. Larger
/// requests get a block of exactly their own size.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Bump allocator for document trees.
///
/// ```rust
/// use quill::arena::Arena;
///
/// let arena = Arena::new();
/// let title = arena.alloc_str("Hello");
/// assert_eq!(title, "Hello");
/// ```
pub struct Arena {
    bump: Bump,
}

impl Arena {
    /// Creates an arena whose first block holds [`DEFAULT_BLOCK_SIZE`] bytes.
    pub fn new() -> Self {
        Arena {
            bump: Bump::with_capacity(DEFAULT_BLOCK_SIZE),
        }
    }

    /// Copies `s` into the arena. Used for strings that must escape the
    /// per-file parse pass.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Copies a slice of `Copy` values into the arena.
    #[inline]
    pub fn alloc_slice_copy<T: Copy>(&self, slice: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(slice)
    }

    /// Total bytes handed out by the arena so far, across all blocks.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
