//! Platform layer for swapframe.
//!
//! This crate provides:
//! - Window management via winit
//! - Vulkan surface creation from raw window handles

mod window;

pub use window::{Surface, Window, get_required_extensions};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
