use std::fmt;

use ash::vk;

/// Move-only owner of a raw `vk::Buffer` produced by
/// [`Allocator::create_buffer`](crate::Allocator::create_buffer).
///
/// Destroyed through the device that created it. The backing
/// [`Allocation`](crate::Allocation) is owned separately; the caller keeps the
/// allocation alive for as long as the buffer is in use.
pub struct Buffer {
    inner: Option<BufferInner>,
}

struct BufferInner {
    handle: vk::Buffer,
    device: ash::Device,
}

impl Buffer {
    pub(crate) fn new(device: ash::Device, handle: vk::Buffer) -> Self {
        Self {
            inner: Some(BufferInner { handle, device }),
        }
    }

    /// Placeholder that owns nothing. Dropping or clearing it is a no-op.
    pub fn null() -> Self {
        Self { inner: None }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// The raw handle, or `vk::Buffer::null()` when non-owning. Ownership is
    /// not transferred.
    pub fn handle(&self) -> vk::Buffer {
        match &self.inner {
            Some(inner) => inner.handle,
            None => vk::Buffer::null(),
        }
    }

    /// Destroys the buffer early. Safe to call repeatedly; only the first
    /// call reaches `vkDestroyBuffer`.
    pub fn clear(&mut self) {
        if let Some(inner) = self.inner.take() {
            unsafe { inner.device.destroy_buffer(inner.handle, None) };
        }
    }

    /// Exchanges owned state with `other`. No device calls are made.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Pass-through to `vkGetBufferMemoryRequirements`. A non-memory query,
    /// valid whether or not the backing allocation is still alive.
    pub fn memory_requirements(&self) -> vk::MemoryRequirements {
        let inner = self.inner.as_ref().expect("query on a null Buffer");
        unsafe { inner.device.get_buffer_memory_requirements(inner.handle) }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle())
            .finish()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_buffer_is_inert() {
        let mut buffer = Buffer::null();
        assert!(buffer.is_null());
        assert_eq!(buffer.handle(), vk::Buffer::null());

        buffer.clear();
        buffer.clear();
        assert!(buffer.is_null());
    }

    #[test]
    fn swap_is_state_only() {
        let mut a = Buffer::null();
        let mut b = Buffer::null();
        a.swap(&mut b);
        assert!(a.is_null());
        assert!(b.is_null());
    }
}
