//! Slab arena backing one parsed document.
//!
//! An [`Arena`] hands out values from fixed-size slabs. A slab is a `Vec<T>`
//! reserved to full capacity when created and never grown past it, so a
//! value never moves once allocated and every [`NodeId`] stays valid until
//! the arena is dropped. Nothing is reclaimed individually: [`Arena::release`]
//! only updates statistics.

use crate::config::{ParseOptions, DEFAULT_SLAB_SIZE};
use crate::error::{Error, Result};
use std::mem;

/// Handle to a value stored in an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slab: u32,
    slot: u32,
}

/// Allocation statistics for an [`Arena`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Allocations made over the arena's lifetime
    pub total_allocs: usize,
    /// Allocations not yet released
    pub current_allocs: usize,
    /// Bytes handed out, after alignment rounding
    pub total_allocated: usize,
    /// Bytes reserved by slabs
    pub reserved: usize,
    /// Number of slabs
    pub slabs: usize,
    /// Slabs created for oversized values
    pub direct_slabs: usize,
}

/// Slab allocator for values of one type
pub struct Arena<T> {
    slabs: Vec<Vec<T>>,
    slab_size: usize,
    per_slab: usize,
    direct: bool,
    limit: Option<usize>,
    stats: ArenaStats,
}

/// Size of `T` rounded up to pointer alignment
fn rounded_size<T>() -> usize {
    let align = mem::align_of::<usize>();
    let size = mem::size_of::<T>().max(1);
    (size + align - 1) & !(align - 1)
}

impl<T> Arena<T> {
    /// Create an arena with the default slab size and no byte limit
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SLAB_SIZE, None)
    }

    /// Create an arena sized by the parse options
    pub fn with_options(options: &ParseOptions) -> Self {
        Self::with_limits(options.slab_size, options.max_arena_bytes)
    }

    /// Create an arena with an explicit slab size and optional byte limit
    pub fn with_limits(slab_size: usize, limit: Option<usize>) -> Self {
        let slab_size = slab_size.max(1);
        let size = rounded_size::<T>();
        let direct = size >= slab_size;
        Arena {
            slabs: Vec::new(),
            slab_size,
            per_slab: if direct { 1 } else { slab_size / size },
            direct,
            limit,
            stats: ArenaStats::default(),
        }
    }

    /// Store `value`, returning its handle
    pub fn alloc(&mut self, value: T) -> Result<NodeId> {
        let needs_slab = self
            .slabs
            .last()
            .map_or(true, |slab| slab.len() == self.per_slab);
        if needs_slab {
            self.grow()?;
        }

        let slab_index = self.slabs.len() - 1;
        let slab = &mut self.slabs[slab_index];
        let slot = slab.len();
        slab.push(value);

        self.stats.total_allocs += 1;
        self.stats.current_allocs += 1;
        self.stats.total_allocated += rounded_size::<T>();

        Ok(NodeId {
            slab: slab_index as u32,
            slot: slot as u32,
        })
    }

    fn grow(&mut self) -> Result<()> {
        let bytes = self.per_slab * rounded_size::<T>();
        if let Some(limit) = self.limit {
            if self.stats.reserved + bytes > limit {
                return Err(Error::OutOfMemory { requested: bytes });
            }
        }

        let mut slab = Vec::new();
        slab.try_reserve_exact(self.per_slab)
            .map_err(|_| Error::OutOfMemory { requested: bytes })?;
        self.slabs
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory { requested: bytes })?;
        self.slabs.push(slab);

        self.stats.reserved += bytes;
        self.stats.slabs += 1;
        if self.direct {
            self.stats.direct_slabs += 1;
        }
        Ok(())
    }

    /// Borrow the value behind `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different arena.
    pub fn get(&self, id: NodeId) -> &T {
        &self.slabs[id.slab as usize][id.slot as usize]
    }

    /// Mark `id` as no longer used. Memory is reclaimed only when the arena drops.
    pub fn release(&mut self, _id: NodeId) {
        self.stats.current_allocs = self.stats.current_allocs.saturating_sub(1);
    }

    /// Number of values allocated
    pub fn len(&self) -> usize {
        self.stats.total_allocs
    }

    /// Whether nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.stats.total_allocs == 0
    }

    /// Slab size in bytes
    pub fn slab_size(&self) -> usize {
        self.slab_size
    }

    /// Current statistics
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
