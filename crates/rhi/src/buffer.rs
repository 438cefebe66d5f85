//! Host-visible GPU buffers.
//!
//! Memory comes from the device's gpu-allocator instance. Buffers live in
//! `CpuToGpu` memory, which is host-visible, host-coherent and persistently
//! mapped, so uploads are plain memory copies with no flush.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapframe_rhi::device::Device;
//! use swapframe_rhi::buffer::{Buffer, BufferUsage};
//!
//! # fn example(device: Arc<Device>) -> swapframe_rhi::RhiResult<()> {
//! let positions: [f32; 6] = [0.0, -0.5, 0.5, 0.5, -0.5, 0.5];
//! let buffer = Buffer::new_with_data(device, BufferUsage::Vertex, bytemuck::cast_slice(&positions))?;
//! assert_eq!(buffer.size(), 24);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex input binding.
    Vertex,
}

impl BufferUsage {
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        }
    }

    pub fn memory_location(self) -> MemoryLocation {
        match self {
            BufferUsage::Vertex => MemoryLocation::CpuToGpu,
        }
    }

    /// Allocation name used for allocator debugging.
    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Vertex => "vertex buffer",
        }
    }
}

/// Buffer with its own allocator-managed memory.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    usage: BufferUsage,
}

impl Buffer {
    /// Creates an uninitialized buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] for a zero size, or an error if
    /// buffer creation, allocation or binding fails.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidArgument(
                "buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .handle()
                .create_buffer(&buffer_info, None)
                .map_err(RhiError::creation(usage.name()))?
        };

        // From here on `Drop` releases the buffer (and allocation, once set) on error.
        let mut this = Self {
            device,
            buffer,
            allocation: None,
            size,
            usage,
        };

        let requirements = unsafe { this.device.handle().get_buffer_memory_requirements(buffer) };
        let allocation = this.device.allocator()?.allocate(&AllocationCreateDesc {
            name: usage.name(),
            requirements,
            location: usage.memory_location(),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        this.allocation = Some(allocation);

        unsafe {
            this.device
                .handle()
                .bind_buffer_memory(buffer, memory, offset)?;
        }

        debug!("Created {}: {} bytes", usage.name(), size);
        Ok(this)
    }

    /// Creates a buffer sized to `data` and copies `data` into it.
    pub fn new_with_data(device: Arc<Device>, usage: BufferUsage, data: &[u8]) -> RhiResult<Self> {
        let buffer = Self::new(device, usage, data.len() as vk::DeviceSize)?;
        buffer.write_data(0, data)?;
        Ok(buffer)
    }

    /// Copies `data` into the mapped memory at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if the write would run past the
    /// end of the buffer or the memory is not mapped.
    pub fn write_data(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidArgument(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            )));
        }

        let mapped_ptr = self
            .allocation
            .as_ref()
            .and_then(Allocation::mapped_ptr)
            .ok_or_else(|| RhiError::InvalidArgument("buffer memory is not mapped".to_string()))?;

        // SAFETY: the range was bounds-checked above and the mapping stays valid
        // for the lifetime of the allocation.
        unsafe {
            let dst = mapped_ptr.as_ptr().cast::<u8>().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free {} allocation: {:?}", self.usage.name(), e);
                    }
                }
                Err(e) => error!("Leaking {} allocation: {}", self.usage.name(), e),
            }
        }

        unsafe { self.device.handle().destroy_buffer(self.buffer, None) };
        debug!("Destroyed {}: {} bytes", self.usage.name(), self.size);
    }
}

// SAFETY: the allocation's mapped pointer is only written through &self by the
// render thread, and the allocator itself is behind a Mutex.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_usage_flags() {
        assert_eq!(
            BufferUsage::Vertex.to_vk_usage(),
            vk::BufferUsageFlags::VERTEX_BUFFER
        );
    }

    #[test]
    fn test_vertex_memory_is_host_visible() {
        assert_eq!(BufferUsage::Vertex.memory_location(), MemoryLocation::CpuToGpu);
    }

    #[test]
    fn test_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Buffer>();
    }
}
