use std::num::NonZeroU32;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::Key;
use winit::window::{Window, WindowId};
use softbuffer::Surface;

use crate::ui::render::Canvas;
use crate::ui::state::BrowserState;

pub mod render;
pub mod state;

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub state: BrowserState,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<Surface<Arc<Window>, Arc<Window>>>,
}

impl App {
    pub fn new(state: BrowserState) -> Self {
        Self {
            state,
            window: None,
            context: None,
            surface: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("ibrowse")
            .with_inner_size(LogicalSize::new(1200u32, 600u32));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let surface = softbuffer::Context::new(Arc::clone(&window)).and_then(|context| {
            let surface = Surface::new(&context, Arc::clone(&window))?;
            Ok((context, surface))
        });
        let (context, surface) = match surface {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("Failed to create drawing surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                let w = width.max(1);
                let h = height.max(1);
                if let (Some(surface), Some(nw), Some(nh)) =
                    (self.surface.as_mut(), NonZeroU32::new(w), NonZeroU32::new(h))
                {
                    if let Err(e) = surface.resize(nw, nh) {
                        log::warn!("Surface resize failed: {}", e);
                    }
                }
                self.state.set_size(w, h);
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match &event.logical_key {
                    Key::Named(named) => {
                        self.state.keys_pressed.insert(*named);
                    }
                    Key::Character(s) => {
                        if let Some(c) = s.chars().next() {
                            self.state.chars_pressed.insert(c.to_ascii_lowercase());
                        }
                    }
                    _ => {}
                }
                self.request_redraw();
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left && state == ElementState::Pressed {
                    let (x, y) = self.state.mouse_pos;
                    if self.state.click(x, y) {
                        event_loop.exit();
                        return;
                    }
                    self.request_redraw();
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.state.mouse_pos = (x, y);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32 / 40.0,
                };
                self.state.wheel_y += y;
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let Some(window) = self.window.as_ref() else { return };
                let size = window.inner_size();
                let fb_w = size.width.max(1);
                let fb_h = size.height.max(1);
                self.state.set_size(fb_w, fb_h);

                if self.state.update() {
                    event_loop.exit();
                    return;
                }

                if let Some(ref mut surface) = self.surface {
                    // inner_size can run ahead of the last Resized event.
                    if let (Some(nw), Some(nh)) = (NonZeroU32::new(fb_w), NonZeroU32::new(fb_h)) {
                        if let Err(e) = surface.resize(nw, nh) {
                            log::warn!("Surface resize failed: {}", e);
                        }
                    }
                    match surface.buffer_mut() {
                        Ok(mut buffer) => {
                            let mut canvas = Canvas {
                                buf: &mut buffer,
                                width: fb_w,
                                height: fb_h,
                            };
                            self.state.render(&mut canvas);
                            if let Err(e) = buffer.present() {
                                log::warn!("Present failed: {}", e);
                            }
                        }
                        Err(e) => log::warn!("No framebuffer: {}", e),
                    }
                }
            }

            _ => {}
        }
    }
}
