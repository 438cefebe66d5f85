//! swapframe - Main Entry Point
//!
//! Opens a resizable window and draws a single colored triangle, keeping the
//! swapchain valid across resizes and minimization until the window closes.

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use swapframe_core::RendererConfig;
use swapframe_platform::Window;
use swapframe_renderer::{FrameOutcome, Renderer, ResizeHandle};

struct App {
    config: RendererConfig,
    // Declared before `window` so the renderer is dropped first.
    renderer: Option<Renderer>,
    resize: Option<ResizeHandle>,
    window: Option<Window>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            renderer: None,
            resize: None,
            window: None,
            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(
            event_loop,
            self.config.window_width,
            self.config.window_height,
            &self.config.window_title,
        )
        .context("failed to create window")?;

        let renderer =
            Renderer::new(&window, &self.config).context("failed to create renderer")?;

        self.resize = Some(renderer.resize_handle());
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    /// Logs `err`, keeps it for `main` and stops the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }

    /// Shuts the renderer down and releases it. Redraws queued behind the
    /// close request find no renderer and do nothing.
    fn close(&mut self) {
        self.resize = None;
        if let Some(mut renderer) = self.renderer.take()
            && let Err(e) = renderer.shutdown()
        {
            error!("Shutdown failed: {}", e);
        }
    }

    /// Renders one frame, if a renderer is still alive.
    fn redraw(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        match renderer.render_frame() {
            Ok(FrameOutcome::Recreated) => debug!("Swapchain recreated"),
            Ok(_) => {}
            Err(e) => {
                self.close();
                return Err(anyhow::Error::new(e).context("frame failed"));
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        info!("Initialization complete, entering main loop");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(resize) = &self.resize {
                    resize.notify();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (&self.window, &self.renderer) else {
            return;
        };

        // Sleep while minimized; the next resize event wakes the loop.
        if renderer.is_suspended() {
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.set_control_flow(ControlFlow::Poll);
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    swapframe_core::init_logging();
    info!("Starting swapframe");

    let config = RendererConfig::default();
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redraw_after_close_is_not_an_error() {
        let mut app = App::new(RendererConfig::default());

        app.close();
        assert!(app.redraw().is_ok(), "queued redraw after close must be ignored");
        assert!(app.renderer.is_none());
        assert!(app.resize.is_none());
        assert!(app.fatal.is_none());
    }

    #[test]
    fn test_close_twice() {
        let mut app = App::new(RendererConfig::default());

        app.close();
        app.close();
        assert!(app.redraw().is_ok());
        assert!(app.fatal.is_none());
    }
}
