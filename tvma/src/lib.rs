extern crate vk_mem as vkm;

use std::fmt;

use ash::vk;

mod allocation;
mod allocator;
mod buffer;
mod image;

pub use allocation::Allocation;
pub use allocator::Allocator;
pub use buffer::Buffer;
pub use image::Image;

pub use ash;
pub use vk_mem;

pub enum GPUError {
    Vulkan {
        call: &'static str,
        result: vk::Result,
    },
}

impl GPUError {
    pub(crate) fn vulkan(call: &'static str, result: vk::Result) -> Self {
        Self::Vulkan { call, result }
    }

    /// Name of the external call that failed, e.g. `"vmaCreateBuffer"`.
    pub fn call(&self) -> &'static str {
        match self {
            Self::Vulkan { call, .. } => call,
        }
    }

    pub fn result(&self) -> vk::Result {
        match self {
            Self::Vulkan { result, .. } => *result,
        }
    }
}

impl fmt::Debug for GPUError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vulkan { call, result } => {
                write!(f, "Vulkan error: {} returned {:?}", call, result)
            }
        }
    }
}

impl fmt::Display for GPUError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vulkan { call, result } => {
                write!(f, "Vulkan error: {} returned {:?}", call, result)
            }
        }
    }
}

impl std::error::Error for GPUError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Vulkan { .. } => None,
        }
    }
}
