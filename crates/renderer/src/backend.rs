//! Vulkan implementation of [`FrameBackend`].
//!
//! # Resource Destruction Order
//!
//! 1. Wait for the device to go idle
//! 2. Framebuffers, then the swapchain and its image views
//! 3. Frame slots, command pool and vertex buffer
//! 4. Pipeline, pipeline layout and render pass
//! 5. Logical device (and its allocator)
//! 6. Surface, then instance
//!
//! `ManuallyDrop` and `Option` fields are released explicitly in that order.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use swapframe_core::RendererConfig;
use swapframe_platform::{Surface, Window};
use swapframe_rhi::buffer::{Buffer, BufferUsage};
use swapframe_rhi::command::CommandPool;
use swapframe_rhi::device::Device;
use swapframe_rhi::framebuffer::RenderTargetSet;
use swapframe_rhi::instance::Instance;
use swapframe_rhi::physical_device::select_physical_device;
use swapframe_rhi::pipeline::{
    CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout, PrimitiveTopology,
};
use swapframe_rhi::render_pass::RenderPass;
use swapframe_rhi::shader::{Shader, ShaderStage};
use swapframe_rhi::swapchain::{AcquireOutcome, PresentOutcome, Swapchain};
use swapframe_rhi::vertex::{TRIANGLE_VERTICES, Vertex};
use swapframe_rhi::{RhiError, RhiResult};

use crate::driver::FrameBackend;
use crate::frame::FrameSlots;
use crate::recorder::{FrameRecording, record_frame};

/// Owns every Vulkan object the frame loop touches.
pub struct VulkanBackend {
    window: Window,
    config: RendererConfig,

    render_targets: Option<RenderTargetSet>,
    swapchain: Option<Swapchain>,

    frames: ManuallyDrop<FrameSlots>,
    command_pool: ManuallyDrop<CommandPool>,
    vertex_buffer: ManuallyDrop<Buffer>,
    vertex_count: u32,

    pipeline: ManuallyDrop<Pipeline>,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    render_pass: ManuallyDrop<RenderPass>,

    device: ManuallyDrop<Arc<Device>>,
    surface: ManuallyDrop<Surface>,
    instance: ManuallyDrop<Instance>,
}

impl VulkanBackend {
    /// Performs the one-shot setup: instance, surface, GPU, device, swapchain,
    /// render pass, pipeline, framebuffers, command pool, frame slots and
    /// vertex buffer.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure. Objects created before it are
    /// destroyed in reverse order.
    pub fn new(window: &Window, config: &RendererConfig) -> RhiResult<Self> {
        let surface_extensions = window.required_extensions()?;
        let instance = Instance::new(config.enable_validation, &surface_extensions)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        info!(
            "Selected GPU: {} ({})",
            physical_device.device_name(),
            physical_device.device_type_name()
        );

        let device = Device::new(&instance, &physical_device)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            framebuffer_extent(window),
        )?;

        let render_pass = RenderPass::new(device.clone(), swapchain.format())?;
        let pipeline_layout = PipelineLayout::empty(device.clone())?;
        let pipeline = build_pipeline(&device, &render_pass, &pipeline_layout, config)?;

        let render_targets = RenderTargetSet::new(
            device.clone(),
            swapchain.image_views(),
            &render_pass,
            swapchain.extent(),
        )?;

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let frames = FrameSlots::new(device.clone(), &command_pool, config.frames_in_flight)?;

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&TRIANGLE_VERTICES),
        )?;

        info!(
            "Vulkan backend ready: {} swapchain images, {} frames in flight",
            swapchain.image_count(),
            frames.len()
        );

        Ok(Self {
            window: window.clone(),
            config: config.clone(),
            render_targets: Some(render_targets),
            swapchain: Some(swapchain),
            frames: ManuallyDrop::new(frames),
            command_pool: ManuallyDrop::new(command_pool),
            vertex_buffer: ManuallyDrop::new(vertex_buffer),
            vertex_count: TRIANGLE_VERTICES.len() as u32,
            pipeline: ManuallyDrop::new(pipeline),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            render_pass: ManuallyDrop::new(render_pass),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            instance: ManuallyDrop::new(instance),
        })
    }

    fn swapchain(&self) -> RhiResult<&Swapchain> {
        self.swapchain
            .as_ref()
            .ok_or_else(|| RhiError::InvalidArgument("swapchain has been destroyed".to_string()))
    }

    /// Recreates the render pass and pipeline when a rebuilt swapchain changed format.
    fn match_render_pass_to_swapchain(&mut self) -> RhiResult<()> {
        let format = self.swapchain()?.format();
        if !self.render_pass.needs_rebuild_for(format) {
            return Ok(());
        }

        info!(
            "Swapchain format changed from {:?} to {:?}, rebuilding render pass",
            self.render_pass.color_format(),
            format
        );
        let render_pass = RenderPass::new((*self.device).clone(), format)?;
        let pipeline = build_pipeline(&self.device, &render_pass, &self.pipeline_layout, &self.config)?;

        // Old pipeline first: it was built against the old render pass.
        *self.pipeline = pipeline;
        *self.render_pass = render_pass;
        Ok(())
    }
}

impl FrameBackend for VulkanBackend {
    fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    fn wait_for_slot(&mut self, slot: usize) -> RhiResult<()> {
        self.frames.get(slot)?.in_flight().wait(u64::MAX)
    }

    fn acquire(&mut self, slot: usize) -> RhiResult<AcquireOutcome> {
        let semaphore = self.frames.get(slot)?.image_available().handle();
        self.swapchain()?.acquire_next_image(semaphore)
    }

    fn record(&mut self, slot: usize, image_index: u32) -> RhiResult<()> {
        let targets = self.render_targets.as_ref().ok_or_else(|| {
            RhiError::InvalidArgument("render targets have been destroyed".to_string())
        })?;
        let framebuffer = targets.framebuffer(image_index as usize).ok_or_else(|| {
            RhiError::InvalidArgument(format!(
                "no framebuffer for image {} ({} framebuffers)",
                image_index,
                targets.len()
            ))
        })?;

        let frame = FrameRecording {
            framebuffer,
            render_pass: self.render_pass.handle(),
            pipeline: self.pipeline.handle(),
            vertex_buffer: self.vertex_buffer.handle(),
            vertex_count: self.vertex_count,
            extent: targets.extent(),
        };

        let cmd = self.frames.get(slot)?.command_buffer();
        cmd.reset()?;
        record_frame(cmd, &frame)
    }

    fn submit(&mut self, slot: usize) -> RhiResult<()> {
        let frame = self.frames.get(slot)?;
        frame.in_flight().reset()?;

        let wait_semaphores = [frame.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_finished().handle()];
        let command_buffers = [frame.command_buffer().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was fully recorded by `record`, and the
        // fence was just reset after `wait_for_slot` saw it signaled.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.in_flight().handle())
        }
    }

    fn present(&mut self, slot: usize, image_index: u32) -> RhiResult<PresentOutcome> {
        let wait = self.frames.get(slot)?.render_finished().handle();
        self.swapchain()?
            .present(self.device.present_queue(), image_index, wait)
    }

    fn framebuffer_extent(&self) -> vk::Extent2D {
        framebuffer_extent(&self.window)
    }

    fn wait_idle(&mut self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    fn destroy_render_targets(&mut self) {
        if let Some(mut targets) = self.render_targets.take() {
            targets.destroy();
        }
    }

    fn rebuild_swapchain(&mut self, extent: vk::Extent2D) -> RhiResult<()> {
        match self.swapchain.as_mut() {
            Some(swapchain) => swapchain.recreate(&self.instance, self.surface.handle(), extent)?,
            None => {
                self.swapchain = Some(Swapchain::new(
                    &self.instance,
                    (*self.device).clone(),
                    self.surface.handle(),
                    extent,
                )?);
            }
        }
        self.match_render_pass_to_swapchain()
    }

    fn create_render_targets(&mut self) -> RhiResult<()> {
        let swapchain = self.swapchain()?;
        let targets = RenderTargetSet::new(
            (*self.device).clone(),
            swapchain.image_views(),
            &self.render_pass,
            swapchain.extent(),
        )?;
        debug_assert_eq!(targets.len(), swapchain.image_count());
        debug!(
            "Render targets match swapchain: {} images, {} views, {} framebuffers",
            swapchain.image_count(),
            swapchain.image_views().len(),
            targets.len()
        );
        self.render_targets = Some(targets);
        Ok(())
    }

    fn destroy_swapchain(&mut self) {
        if self.swapchain.take().is_some() {
            debug!("Swapchain released");
        }
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during backend drop: {}", e);
        }

        self.destroy_render_targets();
        self.destroy_swapchain();

        // SAFETY: each field is dropped exactly once, here, and never used again.
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.vertex_buffer);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Vulkan backend destroyed");
    }
}

fn framebuffer_extent(window: &Window) -> vk::Extent2D {
    let (width, height) = window.framebuffer_size();
    vk::Extent2D { width, height }
}

/// Loads both shader stages and builds the triangle pipeline against subpass 0.
///
/// The shader modules are dropped on return.
fn build_pipeline(
    device: &Arc<Device>,
    render_pass: &RenderPass,
    layout: &PipelineLayout,
    config: &RendererConfig,
) -> RhiResult<Pipeline> {
    let vertex_shader = Shader::from_spirv_file(
        device.clone(),
        &config.vertex_shader_path,
        ShaderStage::Vertex,
        "main",
    )?;
    let fragment_shader = Shader::from_spirv_file(
        device.clone(),
        &config.fragment_shader_path,
        ShaderStage::Fragment,
        "main",
    )?;

    GraphicsPipelineBuilder::new()
        .vertex_shader(&vertex_shader)
        .fragment_shader(&fragment_shader)
        .vertex_binding(Vertex::binding_description())
        .vertex_attributes(&Vertex::attribute_descriptions())
        .topology(PrimitiveTopology::TriangleList)
        .cull_mode(CullMode::Back)
        .front_face(FrontFace::Clockwise)
        .render_pass(render_pass.handle(), 0)
        .build(device.clone(), layout)
}
