//! Per-frame command recording.
//!
//! Every frame records the same fixed sequence into the slot's command
//! buffer: clear the swapchain image to opaque black and draw the vertex
//! buffer with the graphics pipeline. Viewport and scissor always cover the
//! current swapchain extent, so the sequence is valid across rebuilds.

use ash::vk;

use swapframe_rhi::RhiResult;
use swapframe_rhi::command::CommandBuffer;

/// Opaque black.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Handles and sizes a frame is recorded against.
#[derive(Debug, Clone, Copy)]
pub struct FrameRecording {
    pub framebuffer: vk::Framebuffer,
    pub render_pass: vk::RenderPass,
    pub pipeline: vk::Pipeline,
    pub vertex_buffer: vk::Buffer,
    pub vertex_count: u32,
    pub extent: vk::Extent2D,
}

/// The subset of command buffer operations a frame uses.
pub trait CommandSink {
    fn begin(&self) -> RhiResult<()>;
    fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    );
    fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline);
    fn set_viewport(&self, viewport: &vk::Viewport);
    fn set_scissor(&self, scissor: &vk::Rect2D);
    fn bind_vertex_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize);
    fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn end_render_pass(&self);
    fn end(&self) -> RhiResult<()>;
}

impl CommandSink for CommandBuffer {
    fn begin(&self) -> RhiResult<()> {
        CommandBuffer::begin(self)
    }

    fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) {
        CommandBuffer::begin_render_pass(self, render_pass, framebuffer, render_area, clear_values);
    }

    fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline) {
        CommandBuffer::bind_graphics_pipeline(self, pipeline);
    }

    fn set_viewport(&self, viewport: &vk::Viewport) {
        CommandBuffer::set_viewport(self, viewport);
    }

    fn set_scissor(&self, scissor: &vk::Rect2D) {
        CommandBuffer::set_scissor(self, scissor);
    }

    fn bind_vertex_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize) {
        self.bind_vertex_buffers(0, &[buffer], &[offset]);
    }

    fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        CommandBuffer::draw(self, vertex_count, instance_count, first_vertex, first_instance);
    }

    fn end_render_pass(&self) {
        CommandBuffer::end_render_pass(self);
    }

    fn end(&self) -> RhiResult<()> {
        CommandBuffer::end(self)
    }
}

/// Viewport covering `extent` with depth range 0..1.
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Scissor covering `extent`.
pub fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

/// Records one frame into `cmd`, which must be in the initial state.
///
/// # Errors
///
/// Returns [`swapframe_rhi::RhiError::CommandRecordingFailed`] if the buffer
/// cannot begin or end recording. The failure is not retried.
pub fn record_frame<C: CommandSink + ?Sized>(cmd: &C, frame: &FrameRecording) -> RhiResult<()> {
    let clear_values = [vk::ClearValue {
        color: vk::ClearColorValue {
            float32: CLEAR_COLOR,
        },
    }];
    let area = full_scissor(frame.extent);

    cmd.begin()?;
    cmd.begin_render_pass(frame.render_pass, frame.framebuffer, area, &clear_values);
    cmd.bind_graphics_pipeline(frame.pipeline);
    cmd.set_viewport(&full_viewport(frame.extent));
    cmd.set_scissor(&area);
    cmd.bind_vertex_buffer(frame.vertex_buffer, 0);
    cmd.draw(frame.vertex_count, 1, 0, 0);
    cmd.end_render_pass();
    cmd.end()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ash::vk::Handle;
    use swapframe_rhi::RhiError;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Op {
        Begin,
        BeginRenderPass {
            render_pass: u64,
            framebuffer: u64,
            area: vk::Extent2D,
            clear: [f32; 4],
        },
        BindPipeline(u64),
        Viewport(f32, f32, f32, f32),
        Scissor(vk::Extent2D),
        BindVertexBuffer(u64, vk::DeviceSize),
        Draw(u32, u32, u32, u32),
        EndRenderPass,
        End,
    }

    #[derive(Default)]
    struct RecordingSink {
        ops: RefCell<Vec<Op>>,
        fail_begin: Option<vk::Result>,
        fail_end: Option<vk::Result>,
    }

    impl CommandSink for RecordingSink {
        fn begin(&self) -> RhiResult<()> {
            self.ops.borrow_mut().push(Op::Begin);
            self.fail_begin
                .map_or(Ok(()), |e| Err(RhiError::CommandRecordingFailed(e)))
        }

        fn begin_render_pass(
            &self,
            render_pass: vk::RenderPass,
            framebuffer: vk::Framebuffer,
            render_area: vk::Rect2D,
            clear_values: &[vk::ClearValue],
        ) {
            let clear = unsafe { clear_values[0].color.float32 };
            self.ops.borrow_mut().push(Op::BeginRenderPass {
                render_pass: render_pass.as_raw(),
                framebuffer: framebuffer.as_raw(),
                area: render_area.extent,
                clear,
            });
        }

        fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline) {
            self.ops.borrow_mut().push(Op::BindPipeline(pipeline.as_raw()));
        }

        fn set_viewport(&self, v: &vk::Viewport) {
            self.ops
                .borrow_mut()
                .push(Op::Viewport(v.width, v.height, v.min_depth, v.max_depth));
        }

        fn set_scissor(&self, scissor: &vk::Rect2D) {
            self.ops.borrow_mut().push(Op::Scissor(scissor.extent));
        }

        fn bind_vertex_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize) {
            self.ops
                .borrow_mut()
                .push(Op::BindVertexBuffer(buffer.as_raw(), offset));
        }

        fn draw(&self, a: u32, b: u32, c: u32, d: u32) {
            self.ops.borrow_mut().push(Op::Draw(a, b, c, d));
        }

        fn end_render_pass(&self) {
            self.ops.borrow_mut().push(Op::EndRenderPass);
        }

        fn end(&self) -> RhiResult<()> {
            self.ops.borrow_mut().push(Op::End);
            self.fail_end
                .map_or(Ok(()), |e| Err(RhiError::CommandRecordingFailed(e)))
        }
    }

    fn recording(extent: vk::Extent2D) -> FrameRecording {
        FrameRecording {
            framebuffer: vk::Framebuffer::from_raw(0x10),
            render_pass: vk::RenderPass::from_raw(0x20),
            pipeline: vk::Pipeline::from_raw(0x30),
            vertex_buffer: vk::Buffer::from_raw(0x40),
            vertex_count: 3,
            extent,
        }
    }

    #[test]
    fn test_record_frame_sequence() {
        let extent = vk::Extent2D {
            width: 1024,
            height: 768,
        };
        let sink = RecordingSink::default();
        record_frame(&sink, &recording(extent)).unwrap();

        assert_eq!(
            sink.ops.into_inner(),
            vec![
                Op::Begin,
                Op::BeginRenderPass {
                    render_pass: 0x20,
                    framebuffer: 0x10,
                    area: extent,
                    clear: [0.0, 0.0, 0.0, 1.0],
                },
                Op::BindPipeline(0x30),
                Op::Viewport(1024.0, 768.0, 0.0, 1.0),
                Op::Scissor(extent),
                Op::BindVertexBuffer(0x40, 0),
                Op::Draw(3, 1, 0, 0),
                Op::EndRenderPass,
                Op::End,
            ]
        );
    }

    #[test]
    fn test_record_frame_begin_failure_stops_recording() {
        let sink = RecordingSink {
            fail_begin: Some(vk::Result::ERROR_OUT_OF_HOST_MEMORY),
            ..Default::default()
        };
        let err = record_frame(&sink, &recording(vk::Extent2D::default())).unwrap_err();

        assert!(matches!(
            err,
            RhiError::CommandRecordingFailed(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
        ));
        assert_eq!(sink.ops.into_inner(), vec![Op::Begin]);
    }

    #[test]
    fn test_record_frame_end_failure_is_reported() {
        let sink = RecordingSink {
            fail_end: Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
            ..Default::default()
        };
        let err = record_frame(&sink, &recording(vk::Extent2D::default())).unwrap_err();
        assert!(matches!(err, RhiError::CommandRecordingFailed(_)));
    }

    #[test]
    fn test_full_viewport() {
        let viewport = full_viewport(vk::Extent2D {
            width: 800,
            height: 600,
        });
        assert_eq!((viewport.x, viewport.y), (0.0, 0.0));
        assert_eq!((viewport.width, viewport.height), (800.0, 600.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
    }

    #[test]
    fn test_full_scissor() {
        let extent = vk::Extent2D {
            width: 640,
            height: 480,
        };
        let scissor = full_scissor(extent);
        assert_eq!((scissor.offset.x, scissor.offset.y), (0, 0));
        assert_eq!(scissor.extent, extent);
    }
}
