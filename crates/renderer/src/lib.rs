//! Frame lifecycle for swapframe.
//!
//! This crate drives rendering one frame at a time:
//! - Frames-in-flight slots (fence, semaphores, command buffer)
//! - The fixed per-frame command sequence
//! - The frame state machine and swapchain recreation
//! - The Vulkan backend and the [`Renderer`] facade

pub mod backend;
pub mod driver;
pub mod frame;
pub mod recorder;
pub mod renderer;
pub mod resize;

pub use driver::{FrameBackend, FrameDriver, FrameOutcome, FrameState};
pub use renderer::Renderer;
pub use resize::{ResizeHandle, ResizeSignal};

/// Maximum number of frames that can be in flight simultaneously.
pub use swapframe_core::config::MAX_FRAMES_IN_FLIGHT;
