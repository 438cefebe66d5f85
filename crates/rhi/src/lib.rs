//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! This crate provides thin RAII wrappers over Vulkan using the `ash` crate.
//! Every wrapper pairs its handle with the `Arc<Device>` needed to destroy it.
//! It handles:
//! - Instance creation, GPU selection and logical device creation
//! - Swapchain negotiation, image views and presentation
//! - Render pass and per-image framebuffers
//! - Command pools and command buffer recording
//! - Host-visible buffers, shaders and the graphics pipeline
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
