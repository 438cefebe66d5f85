//! Per-image framebuffers.
//!
//! A [`RenderTargetSet`] holds one framebuffer per swapchain image view, in
//! swapchain image order, all bound to the same render pass. It is torn down
//! before the swapchain views it references and rebuilt after them.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::render_pass::RenderPass;

pub struct RenderTargetSet {
    device: Arc<Device>,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
}

impl RenderTargetSet {
    /// Creates one single-attachment framebuffer per view in `image_views`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::DeviceResourceCreationFailed`] on the first failure.
    /// Framebuffers created before it are destroyed.
    pub fn new(
        device: Arc<Device>,
        image_views: &[vk::ImageView],
        render_pass: &RenderPass,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let mut set = Self {
            device,
            framebuffers: Vec::with_capacity(image_views.len()),
            extent,
        };

        for &view in image_views {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            // On error `set` drops and destroys what was already created.
            let framebuffer = unsafe {
                set.device
                    .handle()
                    .create_framebuffer(&create_info, None)
                    .map_err(RhiError::creation("framebuffer"))?
            };
            set.framebuffers.push(framebuffer);
        }

        debug!(
            "Created {} framebuffers at {}x{}",
            set.framebuffers.len(),
            extent.width,
            extent.height
        );
        Ok(set)
    }

    /// Returns the framebuffer for swapchain image `image_index`.
    #[inline]
    pub fn framebuffer(&self, image_index: usize) -> Option<vk::Framebuffer> {
        self.framebuffers.get(image_index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroys every framebuffer. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if self.framebuffers.is_empty() {
            return;
        }
        let count = self.framebuffers.len();
        for framebuffer in self.framebuffers.drain(..) {
            unsafe { self.device.handle().destroy_framebuffer(framebuffer, None) };
        }
        debug!("Destroyed {} framebuffers", count);
    }
}

impl Drop for RenderTargetSet {
    fn drop(&mut self) {
        self.destroy();
    }
}
