//! Frames-in-flight resources.
//!
//! Each [`FrameSlot`] owns what one outstanding frame needs:
//!
//! ```text
//! 1. wait on in_flight            (host waits for the slot's previous submission)
//! 2. acquire → image_available    (presentation engine signals the image is free)
//! 3. reset + record command_buffer
//! 4. submit: wait image_available, signal render_finished + in_flight
//! 5. present: wait render_finished
//! ```
//!
//! The ring is sized by the frames-in-flight bound, not by the swapchain image
//! count, and is never touched by swapchain recreation.

use std::sync::Arc;

use tracing::debug;

use swapframe_rhi::command::{CommandBuffer, CommandPool};
use swapframe_rhi::device::Device;
use swapframe_rhi::sync::{Fence, Semaphore};
use swapframe_rhi::{RhiError, RhiResult};

/// Synchronization objects and command buffer of one frame in flight.
pub struct FrameSlot {
    command_buffer: CommandBuffer,
    image_available: Semaphore,
    render_finished: Semaphore,
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        Ok(Self {
            command_buffer: CommandBuffer::new(device.clone(), command_pool)?,
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            // Signaled so the first wait on a fresh slot returns immediately.
            in_flight: Fence::new(device, true)?,
        })
    }

    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

/// Fixed ring of [`FrameSlot`]s.
pub struct FrameSlots {
    slots: Vec<FrameSlot>,
}

impl FrameSlots {
    /// Creates `count` slots with command buffers allocated from `command_pool`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] for a zero count, or the first
    /// creation failure.
    pub fn new(device: Arc<Device>, command_pool: &CommandPool, count: usize) -> RhiResult<Self> {
        if count == 0 {
            return Err(RhiError::InvalidArgument(
                "at least one frame in flight is required".to_string(),
            ));
        }

        let slots = (0..count)
            .map(|_| FrameSlot::new(device.clone(), command_pool))
            .collect::<RhiResult<Vec<_>>>()?;

        debug!("Created {} frame slots", slots.len());
        Ok(Self { slots })
    }

    /// Returns slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if `index` is out of range.
    pub fn get(&self, index: usize) -> RhiResult<&FrameSlot> {
        self.slots.get(index).ok_or_else(|| {
            RhiError::InvalidArgument(format!(
                "frame slot {} out of range ({} slots)",
                index,
                self.slots.len()
            ))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
