//! Frame Driver: the per-frame state machine.
//!
//! ```text
//! Idle → Acquiring → Recording → Submitting → Presenting → Idle        (Presented)
//!            │                                     │
//!            │ out of date       out of date, suboptimal or resize flag
//!            ▼                                     ▼
//!         Resizing ─── zero extent ──► Resizing                         (Suspended)
//!            └──────── rebuilt ──────► Idle                             (Recreated)
//! ```
//!
//! The driver never talks to Vulkan directly; every GPU operation goes
//! through [`FrameBackend`], which the Vulkan renderer implements and tests
//! replace with a scripted backend.
//!
//! # Fences
//!
//! The slot fence is waited on before acquiring and only reset by
//! [`FrameBackend::submit`]. An iteration aborted by an out-of-date acquire
//! therefore leaves the fence signaled, and the next wait on the slot cannot
//! deadlock.

use ash::vk;
use tracing::{debug, info, trace, warn};

use swapframe_rhi::swapchain::{AcquireOutcome, PresentOutcome};
use swapframe_rhi::{RhiError, RhiResult};

use crate::resize::{ResizeHandle, ResizeSignal};

/// Where the driver is within an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Recording,
    Submitting,
    Presenting,
    /// The swapchain is stale. Stays here while the framebuffer has a zero extent.
    Resizing,
}

/// What one call to [`FrameDriver::render_frame`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was submitted and queued for presentation.
    Presented,
    /// The swapchain and render targets were rebuilt.
    Recreated,
    /// The window has a zero-sized framebuffer; nothing was rendered or rebuilt.
    Suspended,
}

/// GPU operations the frame driver sequences.
///
/// `slot` is always in `0..frames_in_flight()`.
pub trait FrameBackend {
    /// Size of the frame slot ring.
    fn frames_in_flight(&self) -> usize;

    /// Blocks until the slot's previous submission has retired. Does not reset the fence.
    fn wait_for_slot(&mut self, slot: usize) -> RhiResult<()>;

    /// Acquires the next swapchain image, signaling the slot's `image_available`.
    fn acquire(&mut self, slot: usize) -> RhiResult<AcquireOutcome>;

    /// Resets the slot's command buffer and records the frame for `image_index`.
    fn record(&mut self, slot: usize, image_index: u32) -> RhiResult<()>;

    /// Resets the slot fence and submits the slot's command buffer.
    fn submit(&mut self, slot: usize) -> RhiResult<()>;

    /// Queues `image_index` for presentation after the slot's `render_finished`.
    fn present(&mut self, slot: usize, image_index: u32) -> RhiResult<PresentOutcome>;

    /// Live framebuffer size of the window.
    fn framebuffer_extent(&self) -> vk::Extent2D;

    /// Blocks until the device has no outstanding work.
    fn wait_idle(&mut self) -> RhiResult<()>;

    /// Destroys the framebuffers. Must be a no-op when there are none.
    fn destroy_render_targets(&mut self);

    /// Rebuilds the swapchain (and its image views) for `extent`.
    fn rebuild_swapchain(&mut self, extent: vk::Extent2D) -> RhiResult<()>;

    /// Creates one framebuffer per swapchain image view.
    fn create_render_targets(&mut self) -> RhiResult<()>;

    /// Destroys the swapchain and its image views. Must be a no-op when there is none.
    fn destroy_swapchain(&mut self);
}

/// Drives one frame per call and keeps the swapchain valid across resizes.
pub struct FrameDriver<B: FrameBackend> {
    backend: B,
    frames_in_flight: usize,
    current: usize,
    state: FrameState,
    resize: ResizeSignal,
    shut_down: bool,
}

impl<B: FrameBackend> FrameDriver<B> {
    /// Wraps `backend`, whose swapchain and render targets must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if the backend has no frame slots.
    pub fn new(backend: B) -> RhiResult<Self> {
        let frames_in_flight = backend.frames_in_flight();
        if frames_in_flight == 0 {
            return Err(RhiError::InvalidArgument(
                "frame backend has no frame slots".to_string(),
            ));
        }

        Ok(Self {
            backend,
            frames_in_flight,
            current: 0,
            state: FrameState::Idle,
            resize: ResizeSignal::new(),
            shut_down: false,
        })
    }

    /// Returns a writer for the resize flag, for the window event handler.
    pub fn resize_handle(&self) -> ResizeHandle {
        self.resize.handle()
    }

    /// Index of the slot the next iteration uses.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Runs one iteration.
    ///
    /// Out-of-date and suboptimal swapchains are recovered here; every error
    /// returned is fatal.
    pub fn render_frame(&mut self) -> RhiResult<FrameOutcome> {
        if self.shut_down {
            return Err(RhiError::InvalidArgument(
                "render_frame called after shutdown".to_string(),
            ));
        }

        if self.state == FrameState::Resizing {
            return self.rebuild();
        }

        let slot = self.current;

        self.state = FrameState::Acquiring;
        self.backend.wait_for_slot(slot)?;

        let image_index = match self.backend.acquire(slot)? {
            AcquireOutcome::Acquired {
                image_index,
                suboptimal,
            } => {
                if suboptimal {
                    debug!("Acquired image {} from a suboptimal swapchain", image_index);
                }
                image_index
            }
            AcquireOutcome::OutOfDate => {
                info!("Swapchain out of date on acquire");
                self.state = FrameState::Resizing;
                return self.rebuild();
            }
        };

        self.state = FrameState::Recording;
        self.backend.record(slot, image_index)?;

        self.state = FrameState::Submitting;
        self.backend.submit(slot)?;

        self.state = FrameState::Presenting;
        let presented = self.backend.present(slot, image_index)?;

        self.current = (self.current + 1) % self.frames_in_flight;
        trace!("Presented image {} from slot {}", image_index, slot);

        let resize_requested = self.resize.is_raised();
        if presented.needs_rebuild() || resize_requested {
            info!(
                "Swapchain rebuild needed (present: {:?}, resize requested: {})",
                presented, resize_requested
            );
            self.state = FrameState::Resizing;
            return self.rebuild();
        }

        self.state = FrameState::Idle;
        Ok(FrameOutcome::Presented)
    }

    /// Rebuilds the swapchain and render targets, unless the window is minimized.
    fn rebuild(&mut self) -> RhiResult<FrameOutcome> {
        let extent = self.backend.framebuffer_extent();
        if extent.width == 0 || extent.height == 0 {
            debug!(
                "Framebuffer is {}x{}, postponing swapchain rebuild",
                extent.width, extent.height
            );
            return Ok(FrameOutcome::Suspended);
        }

        self.backend.wait_idle()?;
        self.backend.destroy_render_targets();
        self.backend.rebuild_swapchain(extent)?;
        self.backend.create_render_targets()?;

        self.resize.clear();
        self.state = FrameState::Idle;
        info!("Swapchain rebuilt at {}x{}", extent.width, extent.height);
        Ok(FrameOutcome::Recreated)
    }

    /// Waits for the device to go idle, then destroys the render targets and
    /// the swapchain. Later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns the idle-wait error. The resources are destroyed regardless.
    pub fn shutdown(&mut self) -> RhiResult<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let idle = self.backend.wait_idle();
        if let Err(e) = &idle {
            warn!("Device idle wait failed during shutdown: {}", e);
        }
        self.backend.destroy_render_targets();
        self.backend.destroy_swapchain();
        info!("Frame driver shut down");
        idle
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
