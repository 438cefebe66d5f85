//! Fixed renderer configuration.
//!
//! The demo has no command line surface: window size, frames in flight and
//! shader locations are compile-time constants gathered into
//! [`RendererConfig`]. The only runtime knob is `RUST_LOG`.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Initial window width in physical pixels.
pub const WINDOW_WIDTH: u32 = 800;

/// Initial window height in physical pixels.
pub const WINDOW_HEIGHT: u32 = 600;

/// Window title.
pub const WINDOW_TITLE: &str = "swapframe";

/// Number of frames whose GPU work may be outstanding at once.
///
/// Sizes the frame slot ring, independently of the swapchain image count.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// SPIR-V vertex shader, relative to the working directory.
pub const VERTEX_SHADER_PATH: &str = "shaders/vshader.spv";

/// SPIR-V fragment shader, relative to the working directory.
pub const FRAGMENT_SHADER_PATH: &str = "shaders/fshader.spv";

/// Configuration consumed by the window and renderer setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
    pub frames_in_flight: usize,
    pub vertex_shader_path: PathBuf,
    pub fragment_shader_path: PathBuf,
    /// Enables `VK_LAYER_KHRONOS_validation` and the debug messenger when available.
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            window_title: WINDOW_TITLE.to_string(),
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            vertex_shader_path: PathBuf::from(VERTEX_SHADER_PATH),
            fragment_shader_path: PathBuf::from(FRAGMENT_SHADER_PATH),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl RendererConfig {
    /// Checks that the configuration can drive a renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero window dimensions, zero frames in
    /// flight, or an empty shader path.
    pub fn validate(&self) -> Result<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }

        if self.frames_in_flight == 0 {
            return Err(Error::Config(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }

        if self.vertex_shader_path.as_os_str().is_empty()
            || self.fragment_shader_path.as_os_str().is_empty()
        {
            return Err(Error::Config("shader paths must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = RendererConfig::default();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 600);
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.vertex_shader_path, PathBuf::from("shaders/vshader.spv"));
        assert_eq!(
            config.fragment_shader_path,
            PathBuf::from("shaders/fshader.spv")
        );
        assert_eq!(config.enable_validation, cfg!(debug_assertions));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = RendererConfig {
            window_height: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_frames_in_flight() {
        let config = RendererConfig {
            frames_in_flight: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_shader_path() {
        let config = RendererConfig {
            fragment_shader_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
