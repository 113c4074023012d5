use winit::dpi::PhysicalSize;
use winit::keyboard::KeyCode;

use crate::constants::SIMULATION_WORK_GROUP_SIZE;
use crate::control::{PlayState, Tick};
use crate::fs::{Param, SettingsFile};

mod camera_2d;
mod text;
mod water;

#[derive(Copy, Clone)]
pub enum Mode {
    Normal,
    /// Arrow keys adjust the given parameter until Escape (or the same
    /// parameter key again) leaves the mode.
    Adjust(Param),
}

pub struct Pipeline {
    mode: Mode,
    settings_file: SettingsFile,

    water: water::Pipeline,
    text: text::Pipeline<'static>,
}

impl Pipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
        settings_file: SettingsFile,
    ) -> Self {
        let settings = &settings_file.settings;
        let (rem_x, rem_y) = settings.dropped_cells();
        if rem_x != 0 || rem_y != 0 {
            log::warn!(
                "grid {}x{} is not a multiple of the {}-cell workgroup; \
                 the trailing {} column(s) and {} row(s) will never be simulated",
                settings.width,
                settings.height,
                SIMULATION_WORK_GROUP_SIZE,
                rem_x,
                rem_y,
            );
        }

        let water = water::Pipeline::new(device, queue, settings, surface_format);
        let text = text::Pipeline::new(device, queue, size, surface_format);

        let out = Self {
            mode: Mode::Normal,
            settings_file,
            water,
            text,
        };

        // Seed the grid once, before the first frame is ever rendered.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("init_encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("init_pass"),
                timestamp_writes: None,
            });
            out.water.initialize(&mut compute_pass);
        }
        queue.submit([encoder.finish()]);

        out
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        self.water
            .resize(queue, new_size, self.settings_file.settings.displacement);
        self.text.resize(queue, new_size);
    }

    /// Handles the parameter-editing keys. Returns whether the key was
    /// consumed; everything else falls through to the play controls.
    pub fn handle_keypress(&mut self, key: KeyCode) -> bool {
        use Mode::*;
        match self.mode {
            Normal => {
                if let Some(param) = Param::activate(key) {
                    self.mode = Adjust(param);
                    return true;
                }
                if key == KeyCode::Enter {
                    self.settings_file.save();
                    return true;
                }
                false
            }
            Adjust(param) => {
                if key == KeyCode::Escape {
                    self.mode = Normal;
                    return true;
                }
                // No GPU write here: the current values are pushed to the
                // kernels every frame anyways.
                if param.apply(&mut self.settings_file.settings.params, key) {
                    return true;
                }
                if let Some(new_param) = Param::activate(key) {
                    if new_param == param {
                        self.mode = Normal;
                    } else {
                        self.mode = Adjust(new_param);
                    }
                    return true;
                }
                false
            }
        }
    }

    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_texture: &wgpu::Texture,
        surface_format: wgpu::TextureFormat,
        tick: Tick,
        state: PlayState,
    ) {
        let settings = &self.settings_file.settings;

        // Re-push the configured values unconditionally, so the kernels never
        // see a stale frame.
        let params = settings
            .params
            .current
            .to_params(settings.width, settings.height);
        self.water.set_params(queue, &params);

        self.text.set_status(&settings.params, state, self.mode);
        self.text.prepare(device, queue);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        if tick.reinitialize || tick.steps > 0 {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });

            if tick.reinitialize {
                self.water.initialize(&mut compute_pass);
            }
            for _ in 0..tick.steps {
                self.water.step(&mut compute_pass);
            }
        }

        let surface_texture_view = surface_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("surface_texture_view"),
            format: Some(surface_format.add_srgb_suffix()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            usage: Some(wgpu::TextureUsages::RENDER_ATTACHMENT),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: None,
        });

        {
            // Create the renderpass which will clear the screen before drawing anything
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.water.render_pass(&mut render_pass);
            self.text.render_pass(&mut render_pass);
        }

        queue.submit([encoder.finish()]);
    }
}
