//! Physical device (GPU) selection.
//!
//! A device is suitable when it:
//! 1. exposes a graphics-capable queue family and a family that can present to the surface
//! 2. supports `VK_KHR_swapchain`
//! 3. reports at least one surface format and one present mode
//!
//! Among suitable devices, discrete GPUs are preferred by score; the device
//! type is never a hard requirement.
//!
//! # Example
//!
//! ```no_run
//! use swapframe_rhi::instance::Instance;
//! use swapframe_rhi::physical_device::select_physical_device;
//! use ash::vk;
//!
//! let instance = Instance::new(false, &[]).expect("Failed to create instance");
//! let surface: vk::SurfaceKHR = vk::SurfaceKHR::null(); // placeholder
//! let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
//!
//! let device_info = select_physical_device(instance.handle(), surface, &surface_loader)
//!     .expect("Failed to select physical device");
//! println!("Selected GPU: {}", device_info.device_name());
//! ```

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::{RhiError, RhiResult};
use crate::swapchain::SwapchainSupportDetails;

/// Device extensions every candidate must support.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// Queue family indices for graphics and presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Index of the first queue family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family used for presentation to the surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Checks if both graphics and present families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns `(graphics, present)` once both are known.
    #[inline]
    pub fn pair(&self) -> Option<(u32, u32)> {
        Some((self.graphics_family?, self.present_family?))
    }

    /// Returns the distinct family indices, graphics first.
    ///
    /// One queue is created per entry when building the logical device.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family
            && !families.contains(&present)
        {
            families.push(present);
        }

        families
    }
}

/// Picks the graphics and present queue families.
///
/// The graphics family is the first family with the GRAPHICS bit. The
/// present scan walks every family: a present-capable family equal to the
/// graphics family wins immediately, otherwise the last present-capable
/// family seen is kept.
///
/// `supports_present` is queried with each family index in order.
pub fn pick_queue_families(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> QueueFamilyIndices {
    let graphics_family = families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|i| i as u32);

    let mut present_family = None;
    for index in 0..families.len() as u32 {
        if !supports_present(index) {
            continue;
        }

        present_family = Some(index);
        if Some(index) == graphics_family {
            break;
        }
    }

    QueueFamilyIndices {
        graphics_family,
        present_family,
    }
}

/// Queries present support for families `0..family_count`, in order.
///
/// # Errors
///
/// Returns the first failed query as [`RhiError::Vulkan`].
pub fn query_present_support(
    family_count: usize,
    mut query: impl FnMut(u32) -> Result<bool, vk::Result>,
) -> RhiResult<Vec<bool>> {
    (0..family_count as u32)
        .map(|index| query(index).map_err(RhiError::from))
        .collect()
}

/// Returns true if every entry of [`REQUIRED_DEVICE_EXTENSIONS`] is listed.
pub fn supports_required_extensions(available: &[vk::ExtensionProperties]) -> bool {
    REQUIRED_DEVICE_EXTENSIONS.iter().all(|required| {
        available
            .iter()
            .any(|ext| ext.extension_name_as_c_str().is_ok_and(|name| name == *required))
    })
}

/// Why a device was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unsuitable {
    MissingGraphicsQueue,
    MissingPresentQueue,
    MissingSwapchainExtension,
    NoSurfaceFormats,
    NoPresentModes,
}

impl std::fmt::Display for Unsuitable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Unsuitable::MissingGraphicsQueue => "no graphics queue family",
            Unsuitable::MissingPresentQueue => "no queue family can present to the surface",
            Unsuitable::MissingSwapchainExtension => "VK_KHR_swapchain not supported",
            Unsuitable::NoSurfaceFormats => "surface reports no formats",
            Unsuitable::NoPresentModes => "surface reports no present modes",
        };
        f.write_str(reason)
    }
}

/// Applies the suitability predicate to already-queried device facts.
///
/// `support` is `None` when the extension check failed and the surface was
/// therefore not queried.
pub fn check_suitability(
    queue_families: &QueueFamilyIndices,
    has_required_extensions: bool,
    support: Option<&SwapchainSupportDetails>,
) -> Result<(), Unsuitable> {
    if queue_families.graphics_family.is_none() {
        return Err(Unsuitable::MissingGraphicsQueue);
    }
    if queue_families.present_family.is_none() {
        return Err(Unsuitable::MissingPresentQueue);
    }
    if !has_required_extensions {
        return Err(Unsuitable::MissingSwapchainExtension);
    }

    let Some(support) = support else {
        return Err(Unsuitable::MissingSwapchainExtension);
    };
    if support.formats.is_empty() {
        return Err(Unsuitable::NoSurfaceFormats);
    }
    if support.present_modes.is_empty() {
        return Err(Unsuitable::NoPresentModes);
    }

    Ok(())
}

/// Rates a suitable device. Higher is better.
pub fn rate_device(properties: &vk::PhysicalDeviceProperties) -> u32 {
    match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 10,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

/// Information about the selected physical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Graphics and present queue families.
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        self.properties
            .device_name_as_c_str()
            .ok()
            .and_then(|name| name.to_str().ok())
            .unwrap_or("Unknown Device")
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the highest-rated suitable physical device.
///
/// Ties keep enumeration order.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no enumerated device is suitable.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<PhysicalDeviceInfo> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let mut best: Option<(PhysicalDeviceInfo, u32)> = None;

    for device in devices {
        let Some(info) = evaluate_device(instance, device, surface, surface_loader)? else {
            continue;
        };

        let score = rate_device(&info.properties);
        debug!(
            "GPU '{}' ({}) - Score: {}",
            info.device_name(),
            info.device_type_name(),
            score
        );

        if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
            best = Some((info, score));
        }
    }

    let Some((selected, _)) = best else {
        warn!("No suitable GPU found with required capabilities");
        return Err(RhiError::NoSuitableGpu);
    };

    info!(
        "Selected GPU: '{}' ({}), graphics family {:?}, present family {:?}",
        selected.device_name(),
        selected.device_type_name(),
        selected.queue_families.graphics_family,
        selected.queue_families.present_family
    );

    Ok(selected)
}

/// Queries one device and applies [`check_suitability`].
fn evaluate_device(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<Option<PhysicalDeviceInfo>> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let present_support = query_present_support(families.len(), |index| unsafe {
        surface_loader.get_physical_device_surface_support(device, index, surface)
    })?;
    let queue_families = pick_queue_families(&families, |index| {
        present_support.get(index as usize).copied().unwrap_or(false)
    });

    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };
    let has_extensions = supports_required_extensions(&extensions);

    let support = if has_extensions {
        Some(SwapchainSupportDetails::query(
            device,
            surface,
            surface_loader,
        )?)
    } else {
        None
    };

    let info = PhysicalDeviceInfo {
        device,
        properties,
        queue_families,
    };

    match check_suitability(&queue_families, has_extensions, support.as_ref()) {
        Ok(()) => Ok(Some(info)),
        Err(reason) => {
            debug!("GPU '{}' skipped: {}", info.device_name(), reason);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn extension(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (dst, &src) in props
            .extension_name
            .iter_mut()
            .zip(name.to_bytes_with_nul())
        {
            *dst = src as std::ffi::c_char;
        }
        props
    }

    fn adequate_support() -> SwapchainSupportDetails {
        SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    #[test]
    fn test_queue_family_indices_default() {
        let indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());
        assert_eq!(indices.pair(), None);
        assert!(indices.unique_families().is_empty());
    }

    #[test]
    fn test_unique_families_same_family() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert!(indices.is_complete());
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn test_unique_families_split_families() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(indices.unique_families(), vec![0, 2]);
        assert_eq!(indices.pair(), Some((0, 2)));
    }

    #[test]
    fn test_pick_graphics_takes_first_graphics_family() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let indices = pick_queue_families(&families, |_| false);
        assert_eq!(indices.graphics_family, Some(1));
        assert_eq!(indices.present_family, None);
    }

    #[test]
    fn test_pick_present_prefers_graphics_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = pick_queue_families(&families, |_| true);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(0));
    }

    #[test]
    fn test_pick_present_falls_back_to_last_match() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE),
        ];
        // Families 1 and 2 can present, the graphics family cannot
        let indices = pick_queue_families(&families, |i| i == 1 || i == 2);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(2));
    }

    #[test]
    fn test_pick_present_graphics_match_after_other_match() {
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
        ];
        let mut queried = Vec::new();
        let indices = pick_queue_families(&families, |i| {
            queried.push(i);
            true
        });
        assert_eq!(indices.present_family, Some(1));
        // The scan stops once the graphics family matches
        assert_eq!(queried, vec![0, 1]);
    }

    #[test]
    fn test_query_present_support_collects_in_order() {
        let support = query_present_support(3, |i| Ok(i != 1)).unwrap();
        assert_eq!(support, vec![true, false, true]);
    }

    #[test]
    fn test_query_present_support_propagates_failure() {
        let mut queried = Vec::new();
        let result = query_present_support(3, |i| {
            queried.push(i);
            if i == 1 {
                Err(vk::Result::ERROR_SURFACE_LOST_KHR)
            } else {
                Ok(true)
            }
        });

        assert!(matches!(
            result,
            Err(RhiError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR))
        ));
        // Collection stops at the first failure
        assert_eq!(queried, vec![0, 1]);
    }

    #[test]
    fn test_supports_required_extensions() {
        let with_swapchain = [
            extension(c"VK_KHR_maintenance1"),
            extension(ash::khr::swapchain::NAME),
        ];
        assert!(supports_required_extensions(&with_swapchain));

        let without = [extension(c"VK_KHR_maintenance1")];
        assert!(!supports_required_extensions(&without));
        assert!(!supports_required_extensions(&[]));
    }

    #[test]
    fn test_check_suitability_accepts_integrated_gpu_facts() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert_eq!(
            check_suitability(&indices, true, Some(&adequate_support())),
            Ok(())
        );
    }

    #[test]
    fn test_check_suitability_rejections() {
        let complete = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(1),
        };

        let no_present = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: None,
        };
        assert_eq!(
            check_suitability(&no_present, true, Some(&adequate_support())),
            Err(Unsuitable::MissingPresentQueue)
        );

        assert_eq!(
            check_suitability(&QueueFamilyIndices::default(), true, None),
            Err(Unsuitable::MissingGraphicsQueue)
        );

        assert_eq!(
            check_suitability(&complete, false, None),
            Err(Unsuitable::MissingSwapchainExtension)
        );

        let mut no_formats = adequate_support();
        no_formats.formats.clear();
        assert_eq!(
            check_suitability(&complete, true, Some(&no_formats)),
            Err(Unsuitable::NoSurfaceFormats)
        );

        let mut no_modes = adequate_support();
        no_modes.present_modes.clear();
        assert_eq!(
            check_suitability(&complete, true, Some(&no_modes)),
            Err(Unsuitable::NoPresentModes)
        );
    }

    #[test]
    fn test_rate_device_prefers_discrete() {
        let discrete = vk::PhysicalDeviceProperties {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            ..Default::default()
        };
        let integrated = vk::PhysicalDeviceProperties {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            ..Default::default()
        };
        assert!(rate_device(&discrete) > rate_device(&integrated));
    }
}
