//! Fixed-capacity bump arena used as per-frame staging memory.
//!
//! Allocations are disjoint byte ranges carved off the front of one
//! owned block. Nothing is freed individually; `reset()` rewinds the
//! cursor and the whole block is reused for the next frame. The arena
//! never grows.

use bytemuck::Pod;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error(
        "Arena `{label}` exhausted: requested {requested} bytes, \
         {remaining} of {capacity} remaining"
    )]
    CapacityExceeded {
        label: &'static str,
        requested: usize,
        remaining: usize,
        capacity: usize,
    },
}

/// Byte range handed out by [`Arena::allocate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaSlot {
    pub offset: usize,
    pub len: usize,
}

impl ArenaSlot {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

pub struct Arena {
    storage: Box<[u8]>,
    cursor: usize,
    label: &'static str,
}

impl Arena {
    pub fn with_capacity(label: &'static str, capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            label,
        }
    }

    /// Reserve `n` zeroed bytes. On failure the cursor is unchanged.
    pub fn allocate(&mut self, n: usize) -> Result<ArenaSlot, ArenaError> {
        self.ensure(n)?;
        let slot = ArenaSlot {
            offset: self.cursor,
            len: n,
        };
        self.storage[slot.offset..slot.end()].fill(0);
        self.cursor = slot.end();
        Ok(slot)
    }

    /// Copy `items` in as raw bytes and return where they landed.
    pub fn append<T: Pod>(&mut self, items: &[T]) -> Result<ArenaSlot, ArenaError> {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        self.ensure(bytes.len())?;
        let slot = ArenaSlot {
            offset: self.cursor,
            len: bytes.len(),
        };
        self.storage[slot.offset..slot.end()].copy_from_slice(bytes);
        self.cursor = slot.end();
        Ok(slot)
    }

    /// Fail unless `n` more bytes fit.
    pub fn ensure(&self, n: usize) -> Result<(), ArenaError> {
        if n > self.remaining() {
            return Err(ArenaError::CapacityExceeded {
                label: self.label,
                requested: n,
                remaining: self.remaining(),
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    pub fn slot(&self, slot: ArenaSlot) -> &[u8] {
        &self.storage[slot.offset..slot.end()]
    }

    pub fn slot_mut(&mut self, slot: ArenaSlot) -> &mut [u8] {
        &mut self.storage[slot.offset..slot.end()]
    }

    /// Everything written since the last reset.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    /// Decode the used region as a sequence of `T`. Trailing bytes that
    /// do not form a whole `T` are ignored.
    pub fn read_all<T: Pod>(&self) -> Vec<T> {
        let size = std::mem::size_of::<T>();
        if size == 0 {
            return Vec::new();
        }
        self.as_bytes()
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn remaining(&self) -> usize {
        self.storage.len() - self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_are_disjoint_and_sequential() {
        let mut arena = Arena::with_capacity("test", 64);
        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(6).unwrap();
        assert_eq!(a, ArenaSlot { offset: 0, len: 10 });
        assert_eq!(b, ArenaSlot { offset: 10, len: 6 });
        assert_eq!(arena.len(), 16);
        assert_eq!(arena.remaining(), 48);
    }

    #[test]
    fn test_allocate_overflow_leaves_cursor() {
        let mut arena = Arena::with_capacity("verts", 16);
        arena.allocate(12).unwrap();
        let err = arena.allocate(5).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                label: "verts",
                requested: 5,
                remaining: 4,
                capacity: 16,
            }
        );
        assert_eq!(arena.len(), 12);
        // Exactly filling the arena is fine.
        arena.allocate(4).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_allocate_returns_zeroed_bytes_after_reset() {
        let mut arena = Arena::with_capacity("test", 8);
        arena.append(&[0xFFu8; 8]).unwrap();
        arena.reset();
        let slot = arena.allocate(8).unwrap();
        assert!(arena.slot(slot).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_append_and_read_back() {
        let mut arena = Arena::with_capacity("test", 64);
        let slot = arena.append(&[1u32, 2, 3]).unwrap();
        assert_eq!(slot.len, 12);
        arena.append(&[7u32]).unwrap();
        assert_eq!(arena.read_all::<u32>(), vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_append_overflow_writes_nothing() {
        let mut arena = Arena::with_capacity("test", 8);
        assert!(arena.append(&[1.0f32, 2.0, 3.0]).is_err());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_slot_mut_writes_through() {
        let mut arena = Arena::with_capacity("test", 8);
        let slot = arena.allocate(4).unwrap();
        arena.slot_mut(slot).copy_from_slice(&9u32.to_ne_bytes());
        assert_eq!(arena.read_all::<u32>(), vec![9]);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut arena = Arena::with_capacity("test", 32);
        arena.allocate(32).unwrap();
        assert!(arena.allocate(1).is_err());
        arena.reset();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.capacity(), 32);
        assert!(arena.allocate(1).is_ok());
    }
}
