use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, NamedKey, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::control::{Command, Controller};

mod constants;
mod control;
mod fs;
mod graphics;

struct State {
    window: Arc<Window>,

    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,
    surface_format: wgpu::TextureFormat,
    pipeline: graphics::Pipeline,

    controller: Controller,
}

impl State {
    async fn new(flags: &flags::Main, window: Arc<Window>) -> State {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptionsBase {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .unwrap();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .unwrap();

        let size = window.inner_size();

        let surface = instance.create_surface(window.clone()).unwrap();
        let cap = surface.get_capabilities(&adapter);
        let surface_format = cap.formats[0];

        let settings_filename = flags.settings.clone().unwrap_or("settings.json".into());
        let settings_file = fs::SettingsFile::read_or_default(settings_filename);
        let pipeline =
            graphics::Pipeline::new(&device, &queue, size, surface_format, settings_file);

        let mut state = State {
            window,
            device,
            queue,
            size,
            surface,
            surface_format,
            pipeline,
            controller: Controller::new(),
        };

        // Configure surface for the first time
        state.configure_surface();

        state
    }

    fn get_window(&self) -> &Window {
        &self.window
    }

    fn configure_surface(&mut self) {
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            // Request compatibility with the sRGB-format texture view we‘re going to create later.
            view_formats: vec![self.surface_format.add_srgb_suffix()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: self.size.width,
            height: self.size.height,
            desired_maximum_frame_latency: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
        self.pipeline.resize(&self.queue, self.size);
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.size = new_size;

        // reconfigure the surface
        self.configure_surface();
    }

    fn render(&mut self) {
        if let Ok(surface_texture) = self.surface.get_current_texture() {
            // Drain the command queue only once we know the frame will
            // actually run; otherwise queued commands carry over.
            let tick = self.controller.tick();
            self.pipeline.render(
                &self.device,
                &self.queue,
                &surface_texture.texture,
                self.surface_format,
                tick,
                self.controller.state(),
            );

            self.window.pre_present_notify();
            surface_texture.present();
        } else {
            // Surface texture creation failed for whatever reason; on Linux, this usually means
            // that the window was drawn over by something else.
        }
    }

    /// The play-control keys. Everything here goes through the command queue
    /// and takes effect at the next frame tick.
    fn handle_control_key(&mut self, key: KeyCode, repeat: bool) {
        match key {
            KeyCode::Space if !repeat => self.controller.push(Command::TogglePlay),
            KeyCode::KeyR if !repeat => self.controller.push(Command::Reset),
            KeyCode::KeyN if !repeat => self.controller.push(Command::Step),
            // Held advance: key repeat keeps re-triggering single steps.
            KeyCode::ArrowRight => self.controller.push(Command::Step),
            _ => (),
        }
    }
}

struct App {
    flags: flags::Main,
    close_requested: bool,
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Create window object
        let window_attributes = Window::default_attributes().with_title("shallow-water-rs");
        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let state = pollster::block_on(State::new(&self.flags, window.clone()));
        self.state = Some(state);

        window.request_redraw();
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let state = self.state.as_mut().unwrap();
        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                self.close_requested = true;
            }
            WindowEvent::RedrawRequested => {
                state.render();

                // Request another redraw after this one so we keep a consistent framerate
                state.get_window().request_redraw();
            }
            WindowEvent::Resized(size) => {
                // Reconfigures the size of the surface. We do not re-render
                // here as this event is always followed up by redraw request.
                state.resize(size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::F11),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                // Toggle fullscreen
                let window = state.get_window();
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                if state.pipeline.handle_keypress(key) {
                    return;
                }
                state.handle_control_key(key, repeat);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
        }
    }
}

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        cmd main {
            optional --settings file: PathBuf
        }
    }
}

fn main() {
    // wgpu uses `log` for all of our logging, so we initialize a logger with the `env_logger` crate.
    //
    // To change the log level, set the `RUST_LOG` environment variable. See the `env_logger`
    // documentation for more information.
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    // When the current loop iteration finishes, immediately begin a new
    // iteration regardless of whether or not new events are available to
    // process. Preferred for applications that want to render as fast as
    // possible, like games.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        flags: flags::Main::from_env_or_exit(),
        state: None,
        close_requested: false,
    };
    event_loop.run_app(&mut app).unwrap();
}
