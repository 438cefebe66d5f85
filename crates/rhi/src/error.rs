//! RHI error types.
//!
//! Out-of-date and suboptimal swapchain results are not errors: they are
//! reported through [`AcquireOutcome`](crate::swapchain::AcquireOutcome) and
//! [`PresentOutcome`](crate::swapchain::PresentOutcome). Everything here is fatal.

use ash::vk;
use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// A GPU object (buffer, view, framebuffer, semaphore, fence, pipeline, ...) could not be created
    #[error("Failed to create {resource}: {result:?}")]
    DeviceResourceCreationFailed {
        resource: &'static str,
        result: vk::Result,
    },

    /// No physical device satisfies the suitability predicate
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Acquiring a swapchain image failed for a reason other than out-of-date
    #[error("Failed to acquire swapchain image: {0:?}")]
    SwapchainAcquireFailed(vk::Result),

    /// Queue submission failed
    #[error("Queue submit failed: {0:?}")]
    QueueSubmitFailed(vk::Result),

    /// Presentation failed for a reason other than out-of-date or suboptimal
    #[error("Present failed: {0:?}")]
    PresentFailed(vk::Result),

    /// Beginning, ending or resetting a command buffer failed
    #[error("Command recording failed: {0:?}")]
    CommandRecordingFailed(vk::Result),

    /// Any other Vulkan API error (waits, queries)
    #[error("Vulkan error: {0:?}")]
    Vulkan(#[from] vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    /// Window or surface error from the platform layer
    #[error(transparent)]
    Platform(#[from] swapframe_core::Error),

    /// SPIR-V loading error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Pipeline description error
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Invalid argument passed to a wrapper
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RhiError {
    /// Returns a mapper turning a `vk::Result` into [`RhiError::DeviceResourceCreationFailed`].
    ///
    /// ```
    /// use ash::vk;
    /// use swapframe_rhi::RhiError;
    ///
    /// let err = Err::<(), _>(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
    ///     .map_err(RhiError::creation("framebuffer"))
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Failed to create framebuffer: ERROR_OUT_OF_DEVICE_MEMORY"
    /// );
    /// ```
    pub fn creation(resource: &'static str) -> impl FnOnce(vk::Result) -> RhiError {
        move |result| RhiError::DeviceResourceCreationFailed { resource, result }
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_mapper() {
        let err = RhiError::creation("semaphore")(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        match err {
            RhiError::DeviceResourceCreationFailed { resource, result } => {
                assert_eq!(resource, "semaphore");
                assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_vk_result_conversion() {
        let err: RhiError = vk::Result::ERROR_DEVICE_LOST.into();
        assert!(matches!(err, RhiError::Vulkan(vk::Result::ERROR_DEVICE_LOST)));
    }

    #[test]
    fn test_platform_error_is_transparent() {
        let err: RhiError = swapframe_core::Error::Window("gone".to_string()).into();
        assert_eq!(err.to_string(), "Window error: gone");
    }

    #[test]
    fn test_fatal_frame_errors_display() {
        assert_eq!(
            RhiError::PresentFailed(vk::Result::ERROR_SURFACE_LOST_KHR).to_string(),
            "Present failed: ERROR_SURFACE_LOST_KHR"
        );
        assert_eq!(
            RhiError::QueueSubmitFailed(vk::Result::ERROR_DEVICE_LOST).to_string(),
            "Queue submit failed: ERROR_DEVICE_LOST"
        );
    }
}
