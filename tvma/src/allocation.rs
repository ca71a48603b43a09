use std::{fmt, mem::ManuallyDrop, sync::Arc};

use ash::vk;
use vkm::Alloc;

use crate::GPUError;

/// Move-only owner of a single VMA allocation.
///
/// The memory is returned to the allocator that produced it exactly once, on
/// drop or on an explicit [`clear`](Allocation::clear). The allocator itself is
/// referenced, not owned: dropping an `Allocation` never tears the allocator
/// down, and every `Allocation` must be released before its allocator is.
pub struct Allocation {
    inner: Option<AllocationInner>,
}

struct AllocationInner {
    handle: vkm::Allocation,
    allocator: Arc<ManuallyDrop<vkm::Allocator>>,
}

impl Allocation {
    pub(crate) fn new(
        allocator: Arc<ManuallyDrop<vkm::Allocator>>,
        handle: vkm::Allocation,
    ) -> Self {
        Self {
            inner: Some(AllocationInner { handle, allocator }),
        }
    }

    /// Adopts an allocation handle that was created through `allocator`
    /// outside of this crate. The handle is freed when the wrapper goes away.
    ///
    /// Panics if `allocator` is null.
    pub fn from_raw(allocator: &crate::Allocator, handle: vkm::Allocation) -> Self {
        Self::new(allocator.shared(), handle)
    }

    /// Placeholder that owns nothing. Dropping or clearing it is a no-op.
    pub fn null() -> Self {
        Self { inner: None }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Read-only access to the raw handle, for library calls that do not take
    /// ownership.
    pub fn handle(&self) -> Option<&vkm::Allocation> {
        self.inner.as_ref().map(|inner| &inner.handle)
    }

    pub fn allocator(&self) -> Option<&vkm::Allocator> {
        self.inner.as_ref().map(|inner| &**inner.allocator)
    }

    /// Releases the allocation early. Safe to call repeatedly; only the first
    /// call reaches `vmaFreeMemory`.
    pub fn clear(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            unsafe { inner.allocator.free_memory(&mut inner.handle) };
        }
    }

    /// Exchanges owned state with `other`. No allocator calls are made.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Maps the allocation and returns a CPU pointer, valid until
    /// [`unmap_memory`](Allocation::unmap_memory). Fails if the underlying
    /// memory is not host visible.
    pub fn map_memory(&mut self) -> Result<*mut u8, GPUError> {
        let inner = self.owned_mut();
        unsafe { inner.allocator.map_memory(&mut inner.handle) }
            .map_err(|result| GPUError::vulkan("vmaMapMemory", result))
    }

    /// Releases a mapping obtained from [`map_memory`](Allocation::map_memory).
    /// Must be paired with a prior successful map, per the VMA contract.
    pub fn unmap_memory(&mut self) {
        let inner = self.owned_mut();
        unsafe { inner.allocator.unmap_memory(&mut inner.handle) };
    }

    /// Flushes CPU writes in `[offset, offset + size)` to the device. A no-op
    /// on coherent memory.
    pub fn flush(&self, offset: vk::DeviceSize, size: vk::DeviceSize) -> Result<(), GPUError> {
        let inner = self.owned();
        unsafe {
            inner
                .allocator
                .flush_allocation(&inner.handle, offset as _, size as _)
        }
        .map_err(|result| GPUError::vulkan("vmaFlushAllocation", result))
    }

    /// Invalidates `[offset, offset + size)` before reading device writes from
    /// the CPU. A no-op on coherent memory.
    pub fn invalidate(
        &self,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), GPUError> {
        let inner = self.owned();
        unsafe {
            inner
                .allocator
                .invalidate_allocation(&inner.handle, offset as _, size as _)
        }
        .map_err(|result| GPUError::vulkan("vmaInvalidateAllocation", result))
    }

    /// Current state of the allocation as reported by `vmaGetAllocationInfo`.
    pub fn info(&self) -> vkm::AllocationInfo {
        let inner = self.owned();
        unsafe { inner.allocator.get_allocation_info(&inner.handle) }
    }

    fn owned(&self) -> &AllocationInner {
        self.inner
            .as_ref()
            .expect("memory operation on a null Allocation")
    }

    fn owned_mut(&mut self) -> &mut AllocationInner {
        self.inner
            .as_mut()
            .expect("memory operation on a null Allocation")
    }
}

impl fmt::Debug for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("null", &self.is_null())
            .finish()
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_allocation_is_inert() {
        let mut allocation = Allocation::null();
        assert!(allocation.is_null());
        assert!(allocation.handle().is_none());
        assert!(allocation.allocator().is_none());

        allocation.clear();
        allocation.clear();
        assert!(allocation.is_null());
    }

    #[test]
    fn moving_out_leaves_a_null_source() {
        let mut source = Allocation::null();
        let moved = std::mem::replace(&mut source, Allocation::null());
        assert!(source.is_null());
        drop(moved);
        drop(source);
    }

    #[test]
    fn swap_is_state_only() {
        let mut a = Allocation::null();
        let mut b = Allocation::null();
        a.swap(&mut b);
        assert!(a.is_null());
        assert!(b.is_null());
    }

    #[test]
    #[should_panic(expected = "null Allocation")]
    fn map_on_null_panics() {
        let mut allocation = Allocation::null();
        let _ = allocation.map_memory();
    }
}
