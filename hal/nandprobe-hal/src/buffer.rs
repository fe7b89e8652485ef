//! Working buffer allocation
//!
//! Bring-up sizes its read/ECC and spare-area buffers from the discovered
//! geometry, so they cannot be static. The allocator reports failure with
//! `None`; the caller turns that into a fatal error.

/// Allocator for byte buffers
pub trait BufferAllocator {
    /// Owned buffer type
    type Buffer: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocate a zero-initialised buffer of exactly `size` bytes
    fn alloc(&mut self, size: usize) -> Option<Self::Buffer>;
}

impl<A: BufferAllocator + ?Sized> BufferAllocator for &mut A {
    type Buffer = A::Buffer;

    fn alloc(&mut self, size: usize) -> Option<Self::Buffer> {
        (**self).alloc(size)
    }
}

/// Allocator backed by the global heap
///
/// Uses fallible reservation so an exhausted heap surfaces as `None`
/// instead of aborting.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

#[cfg(feature = "alloc")]
impl BufferAllocator for HeapAllocator {
    type Buffer = alloc::vec::Vec<u8>;

    fn alloc(&mut self, size: usize) -> Option<Self::Buffer> {
        let mut buffer = alloc::vec::Vec::new();
        buffer.try_reserve_exact(size).ok()?;
        buffer.resize(size, 0);
        Some(buffer)
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn test_heap_alloc_exact_size() {
        let mut heap = HeapAllocator;
        let buffer = heap.alloc(2048).unwrap();
        assert_eq!(buffer.len(), 2048);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_heap_alloc_refuses_impossible_size() {
        let mut heap = HeapAllocator;
        assert!(heap.alloc(usize::MAX).is_none());
    }
}
