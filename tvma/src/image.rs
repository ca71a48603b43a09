use std::fmt;

use ash::vk;

/// Move-only owner of a raw `vk::Image` produced by
/// [`Allocator::create_image`](crate::Allocator::create_image).
///
/// Same ownership contract as [`Buffer`](crate::Buffer): destroyed through the
/// device, independent of the paired allocation.
pub struct Image {
    inner: Option<ImageInner>,
}

struct ImageInner {
    handle: vk::Image,
    device: ash::Device,
}

impl Image {
    pub(crate) fn new(device: ash::Device, handle: vk::Image) -> Self {
        Self {
            inner: Some(ImageInner { handle, device }),
        }
    }

    /// Placeholder that owns nothing. Dropping or clearing it is a no-op.
    pub fn null() -> Self {
        Self { inner: None }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// The raw handle, or `vk::Image::null()` when non-owning. Ownership is
    /// not transferred.
    pub fn handle(&self) -> vk::Image {
        match &self.inner {
            Some(inner) => inner.handle,
            None => vk::Image::null(),
        }
    }

    /// Destroys the image early. Safe to call repeatedly; only the first call
    /// reaches `vkDestroyImage`.
    pub fn clear(&mut self) {
        if let Some(inner) = self.inner.take() {
            unsafe { inner.device.destroy_image(inner.handle, None) };
        }
    }

    /// Exchanges owned state with `other`. No device calls are made.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Pass-through to `vkGetImageMemoryRequirements`.
    pub fn memory_requirements(&self) -> vk::MemoryRequirements {
        let inner = self.inner.as_ref().expect("query on a null Image");
        unsafe { inner.device.get_image_memory_requirements(inner.handle) }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.handle())
            .finish()
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_image_is_inert() {
        let mut image = Image::null();
        assert!(image.is_null());
        assert_eq!(image.handle(), vk::Image::null());

        image.clear();
        image.clear();
        assert!(image.is_null());
    }
}
