use std::{fmt, mem::ManuallyDrop, sync::Arc};

use ash::vk;
use vkm::Alloc;

use crate::{Allocation, Buffer, GPUError, Image};

/// Move-only owner of a `VmaAllocator` context.
///
/// Created once per device and destroyed exactly once, after every
/// [`Allocation`] it produced has been released. The device passed at
/// construction is borrowed, not owned, and must outlive this wrapper.
pub struct Allocator {
    inner: Option<AllocatorInner>,
}

struct AllocatorInner {
    handle: Arc<ManuallyDrop<vkm::Allocator>>,
    device: ash::Device,
}

impl Allocator {
    /// Creates the allocator context via `vmaCreateAllocator`. On failure no
    /// partial allocator escapes; the error names the call and result code.
    pub fn new(
        create_info: vkm::AllocatorCreateInfo<'_>,
        device: &ash::Device,
    ) -> Result<Self, GPUError> {
        let handle = unsafe { vkm::Allocator::new(create_info) }
            .map_err(|result| GPUError::vulkan("vmaCreateAllocator", result))?;

        log::debug!("vma allocator created");

        Ok(Self {
            inner: Some(AllocatorInner {
                handle: Arc::new(ManuallyDrop::new(handle)),
                device: device.clone(),
            }),
        })
    }

    /// Placeholder that owns nothing. Dropping or clearing it is a no-op.
    pub fn null() -> Self {
        Self { inner: None }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Read-only access to the raw allocator, for VMA calls this crate does
    /// not wrap.
    pub fn handle(&self) -> Option<&vkm::Allocator> {
        self.inner.as_ref().map(|inner| &**inner.handle)
    }

    pub fn device(&self) -> Option<&ash::Device> {
        self.inner.as_ref().map(|inner| &inner.device)
    }

    /// Destroys the allocator context early. Safe to call repeatedly; only the
    /// first call reaches `vmaDestroyAllocator`.
    ///
    /// If allocations produced by this allocator are still alive the context
    /// is leaked instead of destroyed, so the live handles never dangle.
    pub fn clear(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            match Arc::get_mut(&mut inner.handle) {
                Some(allocator) => unsafe { ManuallyDrop::drop(allocator) },
                None => {
                    log::error!(
                        "vma allocator dropped while its allocations are alive, leaking it"
                    );
                }
            }
        }
    }

    /// Exchanges owned state with `other`. No allocator calls are made.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Creates a buffer bound to a fresh allocation in a single
    /// `vmaCreateBuffer` call. The two halves of the returned pair are owned
    /// independently: dropping one never destroys the other.
    pub fn create_buffer(
        &self,
        buffer_info: &vk::BufferCreateInfo,
        create_info: &vkm::AllocationCreateInfo,
    ) -> Result<(Buffer, Allocation), GPUError> {
        let inner = self.owned();
        let (buffer, allocation) = unsafe { inner.handle.create_buffer(buffer_info, create_info) }
            .map_err(|result| GPUError::vulkan("vmaCreateBuffer", result))?;

        Ok((
            Buffer::new(inner.device.clone(), buffer),
            Allocation::new(inner.handle.clone(), allocation),
        ))
    }

    /// Creates an image bound to a fresh allocation in a single
    /// `vmaCreateImage` call. Same ownership contract as
    /// [`create_buffer`](Allocator::create_buffer).
    pub fn create_image(
        &self,
        image_info: &vk::ImageCreateInfo,
        create_info: &vkm::AllocationCreateInfo,
    ) -> Result<(Image, Allocation), GPUError> {
        let inner = self.owned();
        let (image, allocation) = unsafe { inner.handle.create_image(image_info, create_info) }
            .map_err(|result| GPUError::vulkan("vmaCreateImage", result))?;

        Ok((
            Image::new(inner.device.clone(), image),
            Allocation::new(inner.handle.clone(), allocation),
        ))
    }

    pub(crate) fn shared(&self) -> Arc<ManuallyDrop<vkm::Allocator>> {
        self.owned().handle.clone()
    }

    fn owned(&self) -> &AllocatorInner {
        self.inner.as_ref().expect("operation on a null Allocator")
    }
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("null", &self.is_null())
            .finish()
    }
}

impl Drop for Allocator {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_allocator_is_inert() {
        let mut allocator = Allocator::null();
        assert!(allocator.is_null());
        assert!(allocator.handle().is_none());
        assert!(allocator.device().is_none());

        allocator.clear();
        allocator.clear();
        assert!(allocator.is_null());
    }

    #[test]
    fn swap_is_state_only() {
        let mut a = Allocator::null();
        let mut b = Allocator::null();
        a.swap(&mut b);
        assert!(a.is_null());
        assert!(b.is_null());
    }

    #[test]
    #[should_panic(expected = "null Allocator")]
    fn create_buffer_on_null_panics() {
        let allocator = Allocator::null();
        let _ = allocator.create_buffer(
            &vk::BufferCreateInfo::default(),
            &vkm::AllocationCreateInfo::default(),
        );
    }
}
