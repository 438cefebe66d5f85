//! Renderer facade used by the application loop.

use tracing::{error, info};

use swapframe_core::RendererConfig;
use swapframe_platform::Window;
use swapframe_rhi::RhiResult;

use crate::backend::VulkanBackend;
use crate::driver::{FrameDriver, FrameOutcome, FrameState};
use crate::resize::ResizeHandle;

/// Draws the triangle once per [`Renderer::render_frame`] call.
///
/// Dropping the renderer shuts the frame driver down before the Vulkan
/// objects are destroyed.
pub struct Renderer {
    driver: FrameDriver<VulkanBackend>,
}

impl Renderer {
    /// Creates every GPU object for `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the Vulkan setup fails.
    pub fn new(window: &Window, config: &RendererConfig) -> RhiResult<Self> {
        let (width, height) = window.framebuffer_size();
        info!("Initializing renderer ({}x{})", width, height);

        let backend = VulkanBackend::new(window, config)?;
        let driver = FrameDriver::new(backend)?;
        Ok(Self { driver })
    }

    /// Runs one frame iteration.
    pub fn render_frame(&mut self) -> RhiResult<FrameOutcome> {
        self.driver.render_frame()
    }

    /// Returns a handle the window event handler uses to report resizes.
    pub fn resize_handle(&self) -> ResizeHandle {
        self.driver.resize_handle()
    }

    /// True while a rebuild is postponed because the framebuffer has a zero extent.
    pub fn is_suspended(&self) -> bool {
        self.driver.state() == FrameState::Resizing
    }

    /// Index of the frame slot the next iteration uses.
    pub fn current_frame(&self) -> usize {
        self.driver.current_frame()
    }

    /// Waits for the GPU and releases the swapchain resources. Safe to call twice.
    pub fn shutdown(&mut self) -> RhiResult<()> {
        self.driver.shutdown()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.driver.shutdown() {
            error!("Renderer shutdown failed: {}", e);
        }
    }
}
