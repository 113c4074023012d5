use bytemuck::NoUninit;
use winit::dpi::PhysicalSize;

use crate::constants::{HEADER_HEIGHT, SIMULATION_WORK_GROUP_SIZE, SimParams};
use crate::fs::Settings;
use crate::graphics::camera_2d;

/// Owns the ping-pong render target pair, the static base height map, the six
/// compute kernels, and the display pass that presents the current target.
///
/// `tex_a` is the "current" grid state and is what gets displayed; `tex_b` is
/// the "next" state. Every kernel reads one and writes the other, and the
/// `swap` kernel copies next back into current, so `tex_a` is canonical again
/// after each kernel pair.
pub struct Pipeline {
    params_buffer: wgpu::Buffer,
    display_uniforms_buffer: wgpu::Buffer,

    params_bind_group: wgpu::BindGroup,
    terrain_bind_group: wgpu::BindGroup,
    /// Reads `tex_a`, writes `tex_b`.
    current_read_bind_group: wgpu::BindGroup,
    /// Reads `tex_b`, writes `tex_a`.
    current_write_bind_group: wgpu::BindGroup,

    init_pipeline: wgpu::ComputePipeline,
    advect_pipeline: wgpu::ComputePipeline,
    height_pipeline: wgpu::ComputePipeline,
    velocity_pipeline: wgpu::ComputePipeline,
    /// Resolved at startup like the others, but not dispatched in the active
    /// sequence; see `step`.
    #[allow(dead_code)]
    boundary_pipeline: wgpu::ComputePipeline,
    swap_pipeline: wgpu::ComputePipeline,

    display_bind_group: wgpu::BindGroup,
    display_pipeline: wgpu::RenderPipeline,

    width: u32,
    height: u32,
}

/// MUST exactly match the definition in display.wgsl
#[repr(C)]
#[derive(NoUninit, Copy, Clone)]
struct DisplayUniforms {
    scale: glam::Vec2,
    offset: glam::Vec2,
    lower_bound: glam::Vec2,
    upper_bound: glam::Vec2,
    displacement: f32,
    _pad: f32,
}

impl Pipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: &Settings,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let width = settings.width;
        let height = settings.height;

        let buffer = |name: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{name}_buffer")),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let params_buffer = buffer("params", size_of::<SimParams>() as u64);
        let initial_params = settings.params.current.to_params(width, height);
        queue.write_buffer(&params_buffer, 0, bytemuck::bytes_of(&initial_params));

        let display_uniforms_buffer = buffer("display_uniforms", size_of::<DisplayUniforms>() as u64);
        // Written on every resize

        let texture = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label}_texture")),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                format,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                usage,
                view_formats: &[],
            })
        };

        // The current half of the pair doubles as the display input.
        let tex_a = texture(
            "sim_current",
            wgpu::TextureFormat::Rgba32Float,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let tex_b = texture(
            "sim_next",
            wgpu::TextureFormat::Rgba32Float,
            wgpu::TextureUsages::STORAGE_BINDING,
        );
        let terrain_texture = texture(
            "base_height_map",
            wgpu::TextureFormat::R32Float,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );

        let terrain = generate_base_height_map(width, height);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &terrain_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&terrain),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let params_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("params_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let storage_texture_entry = |i: u32, access: wgpu::StorageTextureAccess| {
            wgpu::BindGroupLayoutEntry {
                binding: i,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access,
                    format: wgpu::TextureFormat::Rgba32Float,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            }
        };
        let tex_pair_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tex_pair_bind_group_layout"),
                entries: &[
                    // tex_src
                    storage_texture_entry(0, wgpu::StorageTextureAccess::ReadOnly),
                    // tex_dst
                    storage_texture_entry(1, wgpu::StorageTextureAccess::WriteOnly),
                ],
            });

        let terrain_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("terrain_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sim_pipeline_layout"),
            bind_group_layouts: &[
                &params_bind_group_layout,
                &tex_pair_bind_group_layout,
                &terrain_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        fn texture_view(
            label: &str,
            texture: &wgpu::Texture,
            usage: wgpu::TextureUsages,
        ) -> wgpu::TextureView {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label}_texture_view")),
                format: None,
                dimension: Some(wgpu::TextureViewDimension::D2),
                usage: Some(usage),
                aspect: wgpu::TextureAspect::All,
                base_mip_level: 0,
                mip_level_count: None,
                base_array_layer: 0,
                array_layer_count: None,
            })
        }
        fn texture_resource<'a>(
            i: u32,
            texture_view: &'a wgpu::TextureView,
        ) -> wgpu::BindGroupEntry<'a> {
            wgpu::BindGroupEntry {
                binding: i,
                resource: wgpu::BindingResource::TextureView(texture_view),
            }
        }

        let tex_a_storage_view = texture_view("sim_current", &tex_a, wgpu::TextureUsages::STORAGE_BINDING);
        let tex_b_storage_view = texture_view("sim_next", &tex_b, wgpu::TextureUsages::STORAGE_BINDING);
        let terrain_view = texture_view(
            "base_height_map",
            &terrain_texture,
            wgpu::TextureUsages::TEXTURE_BINDING,
        );

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("params_bind_group"),
            layout: &params_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });
        let terrain_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain_bind_group"),
            layout: &terrain_bind_group_layout,
            entries: &[texture_resource(0, &terrain_view)],
        });
        let current_read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("current_read_bind_group"),
            layout: &tex_pair_bind_group_layout,
            entries: &[
                texture_resource(0, &tex_a_storage_view),
                texture_resource(1, &tex_b_storage_view),
            ],
        });
        let current_write_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("current_write_bind_group"),
            layout: &tex_pair_bind_group_layout,
            entries: &[
                texture_resource(0, &tex_b_storage_view),
                texture_resource(1, &tex_a_storage_view),
            ],
        });

        let compute_shader_module =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/swe.wgsl"));

        // Entry points are resolved here, once; a missing name fails pipeline
        // creation and takes the process down with it.
        let compute_pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("{entry_point}_pipeline")),
                layout: Some(&pipeline_layout),
                module: &compute_shader_module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let init_pipeline = compute_pipeline("init");
        let advect_pipeline = compute_pipeline("advect");
        let height_pipeline = compute_pipeline("integrate_height");
        let velocity_pipeline = compute_pipeline("integrate_velocity");
        let boundary_pipeline = compute_pipeline("boundary");
        let swap_pipeline = compute_pipeline("swap");

        let display_shader_module =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/display.wgsl"));

        let display_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("display_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        // Rgba32Float is not filterable without an extra
                        // device feature, so the sampler stays non-filtering.
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            });
        let display_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("display_pipeline_layout"),
                bind_group_layouts: &[&display_bind_group_layout],
                push_constant_ranges: &[],
            });

        let display_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("display_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            lod_min_clamp: 0.,
            lod_max_clamp: 32.,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });

        let tex_a_display_view =
            texture_view("sim_display", &tex_a, wgpu::TextureUsages::TEXTURE_BINDING);
        let display_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("display_bind_group"),
            layout: &display_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: display_uniforms_buffer.as_entire_binding(),
                },
                texture_resource(1, &tex_a_display_view),
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&display_sampler),
                },
            ],
        });

        let display_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("display_pipeline"),
            layout: Some(&display_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &display_shader_module,
                entry_point: Some("vs"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &display_shader_module,
                entry_point: Some("fs"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: Default::default(),
            depth_stencil: Default::default(),
            multisample: Default::default(),
            multiview: Default::default(),
            cache: Default::default(),
        });

        Self {
            params_buffer,
            display_uniforms_buffer,

            params_bind_group,
            terrain_bind_group,
            current_read_bind_group,
            current_write_bind_group,

            init_pipeline,
            advect_pipeline,
            height_pipeline,
            velocity_pipeline,
            boundary_pipeline,
            swap_pipeline,

            display_bind_group,
            display_pipeline,

            width,
            height,
        }
    }

    /// Integer division: cells beyond the last full workgroup in either
    /// direction are never covered by a dispatch. Deliberate, and warned
    /// about at startup.
    fn workgroups(&self) -> (u32, u32) {
        (
            self.width / SIMULATION_WORK_GROUP_SIZE,
            self.height / SIMULATION_WORK_GROUP_SIZE,
        )
    }

    /// Pushed before every frame's dispatches, so the kernels always see the
    /// values currently configured.
    pub fn set_params(&self, queue: &wgpu::Queue, params: &SimParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>, displacement: f32) {
        let placement = camera_2d::Placement::source_to_screen(
            new_size.into(),
            camera_2d::SourceRect {
                width: self.width as f32,
                height: self.height as f32,
            },
            camera_2d::DestinationRect {
                x: 0.0,
                y: HEADER_HEIGHT as f32,
                width: new_size.width as f32,
                height: new_size.height.saturating_sub(HEADER_HEIGHT) as f32,
            },
            camera_2d::Mode::Fit,
        );
        let uniforms = DisplayUniforms {
            scale: placement.scale,
            offset: placement.offset,
            lower_bound: placement.lower_bound,
            upper_bound: placement.upper_bound,
            displacement,
            _pad: 0.0,
        };
        queue.write_buffer(
            &self.display_uniforms_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );
    }

    /// Seeds the grid from the base height map. Runs once at startup, before
    /// any simulation step, and again on reset.
    pub fn initialize(&self, compute_pass: &mut wgpu::ComputePass) {
        let (x_groups, y_groups) = self.workgroups();
        compute_pass.set_bind_group(0, &self.params_bind_group, &[]);
        compute_pass.set_bind_group(2, &self.terrain_bind_group, &[]);

        // init writes the current texture directly...
        compute_pass.set_pipeline(&self.init_pipeline);
        compute_pass.set_bind_group(1, &self.current_write_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        // ...then the seeded state is mirrored into the other half of the
        // pair so both targets start out identical.
        compute_pass.set_pipeline(&self.swap_pipeline);
        compute_pass.set_bind_group(1, &self.current_read_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);
    }

    /// One simulation step: advect, swap, integrate height, swap, integrate
    /// velocity, swap. The order never changes; each kernel reads the current
    /// texture and the swap that follows copies its output back, so the
    /// current texture is canonical again after every pair.
    pub fn step(&self, compute_pass: &mut wgpu::ComputePass) {
        let (x_groups, y_groups) = self.workgroups();
        compute_pass.set_bind_group(0, &self.params_bind_group, &[]);
        compute_pass.set_bind_group(2, &self.terrain_bind_group, &[]);

        // The boundary kernel stays out of the active sequence; the clamped
        // reads inside the kernels keep the border stable on their own.
        // Would otherwise run here, as a boundary/swap pair ahead of advection:
        // compute_pass.set_pipeline(&self.boundary_pipeline);
        // compute_pass.set_bind_group(1, &self.current_read_bind_group, &[]);
        // compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.advect_pipeline);
        compute_pass.set_bind_group(1, &self.current_read_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.swap_pipeline);
        compute_pass.set_bind_group(1, &self.current_write_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.height_pipeline);
        compute_pass.set_bind_group(1, &self.current_read_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.swap_pipeline);
        compute_pass.set_bind_group(1, &self.current_write_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.velocity_pipeline);
        compute_pass.set_bind_group(1, &self.current_read_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);

        compute_pass.set_pipeline(&self.swap_pipeline);
        compute_pass.set_bind_group(1, &self.current_write_bind_group, &[]);
        compute_pass.dispatch_workgroups(x_groups, y_groups, 1);
    }

    pub fn render_pass(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.display_pipeline);
        render_pass.set_bind_group(0, &self.display_bind_group, &[]);
        render_pass.draw(0..6, 0..1);
    }
}

/// Rolling-hills terrain for the static base height map: a coarse random
/// lattice upsampled bilinearly, rescaled into [0, 0.5]. Good enough that the
/// init kernel has something interesting to flood.
fn generate_base_height_map(width: u32, height: u32) -> Vec<f32> {
    const LATTICE: usize = 17;
    let lattice: Vec<f32> = (0..LATTICE * LATTICE)
        .map(|_| rand::random_range(0.0..1.0f32))
        .collect();
    let at = |x: usize, y: usize| lattice[y.min(LATTICE - 1) * LATTICE + x.min(LATTICE - 1)];

    let mut heights = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / (width - 1).max(1) as f32 * (LATTICE - 1) as f32;
            let v = y as f32 / (height - 1).max(1) as f32 * (LATTICE - 1) as f32;
            let (x0, y0) = (u as usize, v as usize);
            let (tx, ty) = (u - x0 as f32, v - y0 as f32);
            let top = at(x0, y0) * (1.0 - tx) + at(x0 + 1, y0) * tx;
            let bottom = at(x0, y0 + 1) * (1.0 - tx) + at(x0 + 1, y0 + 1) * tx;
            heights.push((top * (1.0 - ty) + bottom * ty) * 0.5);
        }
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_height_map_covers_the_grid_within_range() {
        let heights = generate_base_height_map(64, 48);
        assert_eq!(heights.len(), 64 * 48);
        assert!(heights.iter().all(|&h| (0.0..=0.5).contains(&h)));
    }

    #[test]
    fn display_uniforms_layout_matches_shader() {
        assert_eq!(size_of::<DisplayUniforms>(), 40);
    }
}
