//! Swapchain management.
//!
//! This module negotiates VkSwapchainKHR parameters with the surface, owns the
//! swapchain images and their views, and wraps image acquisition and
//! presentation.
//!
//! # Overview
//!
//! The negotiation helpers ([`choose_surface_format`], [`choose_present_mode`],
//! [`choose_extent`], [`determine_image_count`], [`choose_sharing_mode`]) are
//! pure functions over surface query results so they can be tested without a GPU.
//!
//! Out-of-date and suboptimal results are reported as [`AcquireOutcome`] and
//! [`PresentOutcome`] values rather than errors.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use swapframe_rhi::{instance::Instance, device::Device, swapchain::*};
//! # use ash::vk;
//! # fn run(instance: &Instance, device: Arc<Device>, surface: vk::SurfaceKHR, sem: vk::Semaphore) -> swapframe_rhi::RhiResult<()> {
//! let extent = vk::Extent2D { width: 800, height: 600 };
//! let mut swapchain = Swapchain::new(instance, device.clone(), surface, extent)?;
//!
//! match swapchain.acquire_next_image(sem)? {
//!     AcquireOutcome::Acquired { image_index, .. } => {
//!         // ... record and submit work for `image_index` ...
//!         let _ = swapchain.present(device.present_queue(), image_index, sem)?;
//!     }
//!     AcquireOutcome::OutOfDate => swapchain.recreate(instance, surface, extent)?,
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// Swapchain surface support details.
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, etc.)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the surface queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            max_image_count_label(&capabilities)
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Returns true if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Result of [`Swapchain::acquire_next_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired. `suboptimal` images are still rendered and presented.
    Acquired { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be rebuilt.
    OutOfDate,
}

/// Result of [`Swapchain::present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Optimal,
    Suboptimal,
    OutOfDate,
}

impl PresentOutcome {
    /// Returns true if the swapchain should be rebuilt after this present.
    #[inline]
    pub fn needs_rebuild(self) -> bool {
        !matches!(self, Self::Optimal)
    }
}

/// Maps a raw `vkAcquireNextImageKHR` result.
pub fn classify_acquire(result: Result<(u32, bool), vk::Result>) -> RhiResult<AcquireOutcome> {
    match result {
        Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired {
            image_index,
            suboptimal,
        }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
        Err(e) => Err(RhiError::SwapchainAcquireFailed(e)),
    }
}

/// Maps a raw `vkQueuePresentKHR` result.
pub fn classify_present(result: Result<bool, vk::Result>) -> RhiResult<PresentOutcome> {
    match result {
        Ok(false) => Ok(PresentOutcome::Optimal),
        Ok(true) => Ok(PresentOutcome::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
        Err(e) => Err(RhiError::PresentFailed(e)),
    }
}

/// Vulkan swapchain wrapper.
///
/// Owns the swapchain handle and the image views of its images. The images
/// themselves belong to the swapchain and are never destroyed explicitly.
///
/// # Thread Safety
///
/// The swapchain is not thread-safe. Only the render thread touches it.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a new swapchain for `surface`.
    ///
    /// `framebuffer_extent` is the live framebuffer size of the window; it is
    /// only used when the surface leaves the extent up to the application.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::NoSuitableGpu`] if the surface reports no formats or
    /// present modes, or [`RhiError::DeviceResourceCreationFailed`] if the
    /// swapchain or one of its image views cannot be created.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        framebuffer_extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let mut swapchain = Self {
            device,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::Format::UNDEFINED,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            extent: vk::Extent2D::default(),
            present_mode: vk::PresentModeKHR::FIFO,
        };
        swapchain.build(instance, surface, framebuffer_extent)?;
        Ok(swapchain)
    }

    /// Rebuilds the swapchain for a new framebuffer size.
    ///
    /// The old image views are destroyed first, the previous handle is passed
    /// as `old_swapchain`, and it is destroyed once the new one exists.
    ///
    /// The caller must have waited for the device to go idle and destroyed
    /// every framebuffer referencing the old views.
    ///
    /// # Errors
    ///
    /// Same as [`Swapchain::new`]. On failure the swapchain is left empty and
    /// may be rebuilt again.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        framebuffer_extent: vk::Extent2D,
    ) -> RhiResult<()> {
        info!(
            "Recreating swapchain for framebuffer size {}x{}",
            framebuffer_extent.width, framebuffer_extent.height
        );
        self.destroy_image_views();
        self.build(instance, surface, framebuffer_extent)
    }

    fn build(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        framebuffer_extent: vk::Extent2D,
    ) -> RhiResult<()> {
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
        let support =
            SwapchainSupportDetails::query(self.device.physical_device(), surface, &surface_loader)?;

        if !support.is_adequate() {
            warn!("Surface reports no formats or present modes");
            return Err(RhiError::NoSuitableGpu);
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(
            &support.capabilities,
            framebuffer_extent.width,
            framebuffer_extent.height,
        );
        let image_count = determine_image_count(&support.capabilities);

        let (graphics_family, present_family) = self
            .device
            .queue_families()
            .pair()
            .ok_or(RhiError::NoSuitableGpu)?;
        let (sharing_mode, family_indices) = choose_sharing_mode(graphics_family, present_family);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images requested",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        let old_swapchain = self.swapchain;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&family_indices)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let created = unsafe { self.swapchain_loader.create_swapchain(&create_info, None) };

        // The old swapchain is retired either way.
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(old_swapchain, None) };
            self.swapchain = vk::SwapchainKHR::null();
            self.images.clear();
            debug!("Retired previous swapchain");
        }

        self.swapchain = created.map_err(RhiError::creation("swapchain"))?;
        self.images = unsafe { self.swapchain_loader.get_swapchain_images(self.swapchain)? };
        self.image_views = create_image_views(&self.device, &self.images, surface_format.format)?;
        self.format = surface_format.format;
        self.color_space = surface_format.color_space;
        self.extent = extent;
        self.present_mode = present_mode;

        info!("Swapchain created with {} images", self.images.len());
        Ok(())
    }

    /// Acquires the next swapchain image, signaling `semaphore` when it is ready.
    ///
    /// Waits indefinitely for an image.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SwapchainAcquireFailed`] for anything other than
    /// success, suboptimal or out-of-date.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> RhiResult<AcquireOutcome> {
        classify_acquire(unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        })
    }

    /// Queues `image_index` for presentation after `wait_semaphore` is signaled.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::PresentFailed`] for anything other than success,
    /// suboptimal or out-of-date.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<PresentOutcome> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        classify_present(unsafe { self.swapchain_loader.queue_present(queue, &present_info) })
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain color space.
    #[inline]
    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    /// Returns the swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of images the implementation actually created.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    #[inline]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    fn destroy_image_views(&mut self) {
        for view in self.image_views.drain(..) {
            unsafe { self.device.handle().destroy_image_view(view, None) };
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();

        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(self.swapchain, None) };
            self.swapchain = vk::SwapchainKHR::null();
            info!(
                "Swapchain destroyed (was {}x{}, {} images)",
                self.extent.width,
                self.extent.height,
                self.images.len()
            );
        }
    }
}

fn max_image_count_label(capabilities: &vk::SurfaceCapabilitiesKHR) -> String {
    if capabilities.max_image_count == 0 {
        "unlimited".to_string()
    } else {
        capabilities.max_image_count.to_string()
    }
}

/// Chooses the surface format.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR wherever it appears in the list,
/// otherwise takes the first entry.
///
/// # Panics
///
/// Panics if `formats` is empty; callers check [`SwapchainSupportDetails::is_adequate`] first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    warn!(
        "Preferred surface format unavailable, using {:?} / {:?}",
        formats[0].format, formats[0].color_space
    );
    formats[0]
}

/// Chooses the present mode: MAILBOX when offered, otherwise FIFO (always available).
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent.
///
/// Uses the surface's current extent unless its width is `u32::MAX`, in which
/// case the framebuffer size is clamped to the surface's limits.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (framebuffer: {}x{})",
        extent.width, extent.height, width, height
    );
    extent
}

/// Requests one image more than the minimum, capped by the maximum when it is non-zero.
pub fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;
    let image_count = if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    };

    debug!(
        "Image count: {} (min: {}, max: {})",
        image_count,
        capabilities.min_image_count,
        max_image_count_label(capabilities)
    );
    image_count
}

/// Chooses how swapchain images are shared between the graphics and present families.
///
/// Returns the queue family indices to pass to the create info; empty for
/// exclusive ownership.
pub fn choose_sharing_mode(graphics_family: u32, present_family: u32) -> (vk::SharingMode, Vec<u32>) {
    if graphics_family == present_family {
        debug!("Using EXCLUSIVE sharing mode (family {})", graphics_family);
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        debug!(
            "Using CONCURRENT sharing mode between graphics ({}) and present ({}) families",
            graphics_family, present_family
        );
        (
            vk::SharingMode::CONCURRENT,
            vec![graphics_family, present_family],
        )
    }
}

/// Creates one 2D color view per swapchain image.
///
/// Views created before a failure are destroyed before the error is returned.
pub fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut image_views = Vec::with_capacity(images.len());

    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        match unsafe { device.handle().create_image_view(&create_info, None) } {
            Ok(view) => image_views.push(view),
            Err(e) => {
                for view in image_views {
                    unsafe { device.handle().destroy_image_view(view, None) };
                }
                return Err(RhiError::creation("image view")(e));
            }
        }
    }

    debug!("Created {} image views", image_views.len());
    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn indefinite_capabilities(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: min,
                height: min,
            },
            max_image_extent: vk::Extent2D {
                width: max,
                height: max,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_choose_surface_format_prefers_bgra_srgb_anywhere_in_list() {
        let srgb = format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        let others = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];

        for position in 0..=others.len() {
            let mut formats = others.to_vec();
            formats.insert(position, srgb);
            let selected = choose_surface_format(&formats);
            assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
            assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        }
    }

    #[test]
    fn test_choose_surface_format_requires_matching_color_space() {
        let formats = [
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        assert_eq!(choose_surface_format(&formats), formats[0]);
    }

    #[test]
    fn test_choose_surface_format_falls_back_to_first() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(choose_surface_format(&formats).format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_fifo_only() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_choose_present_mode_ignores_immediate() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..indefinite_capabilities(1, 4096)
        };
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (1920, 1080));
    }

    #[test]
    fn test_choose_extent_indefinite_uses_framebuffer_size() {
        let extent = choose_extent(&indefinite_capabilities(1, 4096), 1024, 768);
        assert_eq!((extent.width, extent.height), (1024, 768));
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = indefinite_capabilities(100, 2048);
        let extent = choose_extent(&capabilities, 8000, 10);
        assert_eq!((extent.width, extent.height), (2048, 100));
    }

    #[test]
    fn test_determine_image_count_within_bounds() {
        for (min, max) in [(1, 0), (2, 3), (2, 2), (3, 8), (1, 1)] {
            let capabilities = vk::SurfaceCapabilitiesKHR {
                min_image_count: min,
                max_image_count: max,
                ..Default::default()
            };
            let count = determine_image_count(&capabilities);
            assert!(count >= min);
            if max > 0 {
                assert!(count <= max);
            }
        }
    }

    #[test]
    fn test_determine_image_count_prefers_min_plus_one() {
        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&unbounded), 3);

        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capped), 2);
    }

    #[test]
    fn test_choose_sharing_mode_same_family_is_exclusive() {
        let (mode, indices) = choose_sharing_mode(0, 0);
        assert_eq!(mode, vk::SharingMode::EXCLUSIVE);
        assert!(indices.is_empty());
    }

    #[test]
    fn test_choose_sharing_mode_distinct_families_is_concurrent() {
        let (mode, indices) = choose_sharing_mode(0, 2);
        assert_eq!(mode, vk::SharingMode::CONCURRENT);
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_classify_acquire() {
        assert_eq!(
            classify_acquire(Ok((1, false))).unwrap(),
            AcquireOutcome::Acquired {
                image_index: 1,
                suboptimal: false
            }
        );
        assert_eq!(
            classify_acquire(Ok((0, true))).unwrap(),
            AcquireOutcome::Acquired {
                image_index: 0,
                suboptimal: true
            }
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireOutcome::OutOfDate
        );
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_SURFACE_LOST_KHR)),
            Err(RhiError::SwapchainAcquireFailed(vk::Result::ERROR_SURFACE_LOST_KHR))
        ));
    }

    #[test]
    fn test_classify_present() {
        assert_eq!(classify_present(Ok(false)).unwrap(), PresentOutcome::Optimal);
        assert_eq!(classify_present(Ok(true)).unwrap(), PresentOutcome::Suboptimal);
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentOutcome::OutOfDate
        );
        assert!(matches!(
            classify_present(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(RhiError::PresentFailed(vk::Result::ERROR_DEVICE_LOST))
        ));
    }

    #[test]
    fn test_present_outcome_needs_rebuild() {
        assert!(!PresentOutcome::Optimal.needs_rebuild());
        assert!(PresentOutcome::Suboptimal.needs_rebuild());
        assert!(PresentOutcome::OutOfDate.needs_rebuild());
    }

    #[test]
    fn test_support_adequacy() {
        let mut support = SwapchainSupportDetails::default();
        assert!(!support.is_adequate());
        support.formats.push(format(
            vk::Format::B8G8R8A8_SRGB,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ));
        assert!(!support.is_adequate());
        support.present_modes.push(vk::PresentModeKHR::FIFO);
        assert!(support.is_adequate());
    }
}
