//! GPU resources and draw submission for one emitter.
//!
//! Each frame the live particles are staged into a storage buffer and drawn
//! with a single indexed draw of `live_count * 6` indices. The index buffer
//! is built once for the whole capacity: particle `p` uses corners
//! `4p..4p+4` as two triangles `(0, 1, 2)` and `(0, 2, 3)`.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::camera::CameraView;
use crate::emitter::Emitter;
use crate::error::{EmitterError, GpuError};
use crate::particle::PARTICLE_STRIDE;
use crate::textures::TextureConfig;
use crate::upload::{stage_alive, staged_size};
use crate::visuals::{read_only_depth_state, BlendMode};

/// WGSL source for the particle quad pipeline.
pub const PARTICLE_SHADER: &str = include_str!("particle.wgsl");

/// Indices per particle quad.
pub const INDICES_PER_PARTICLE: u32 = 6;

/// Per-draw shader constants, matching `Uniforms` in `particle.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct EmitterUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub acceleration: [f32; 3],
    pub current_time: f32,
    pub lifetime: f32,
    pub flicker: f32,
    pub _padding: [f32; 2],
}

impl EmitterUniforms {
    pub fn new(emitter: &Emitter, camera: &impl CameraView) -> Self {
        let shape = emitter.shape();
        Self {
            view: camera.view().to_cols_array_2d(),
            projection: camera.projection().to_cols_array_2d(),
            start_color: shape.start_color.to_array(),
            end_color: shape.end_color.to_array(),
            acceleration: shape.acceleration.to_array(),
            current_time: emitter.elapsed(),
            lifetime: emitter.max_lifetime(),
            flicker: shape.flicker.clamp(0.0, 1.0),
            _padding: [0.0; 2],
        }
    }
}

/// Quad-expansion indices for `capacity` particles.
pub fn quad_indices(capacity: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(capacity as usize * INDICES_PER_PARTICLE as usize);
    for p in 0..capacity {
        let v = p * 4;
        indices.extend_from_slice(&[v, v + 1, v + 2, v, v + 2, v + 3]);
    }
    indices
}

/// Buffers, bind groups and pipelines that draw one [`Emitter`].
///
/// Resources are sized for the emitter's capacity at construction and
/// released when the renderer is dropped.
pub struct EmitterRenderer {
    particle_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    particle_bind_group: wgpu::BindGroup,
    sprite_layout: wgpu::BindGroupLayout,
    sprite_bind_group: wgpu::BindGroup,
    sprite: wgpu::TextureView,
    sampler: wgpu::Sampler,
    /// One pipeline per [`BlendMode`], indexed by [`BlendMode::index`].
    pipelines: Vec<wgpu::RenderPipeline>,
    capacity: u32,
    staged: u32,
    blend: BlendMode,
}

impl EmitterRenderer {
    /// Create GPU resources for `emitter`, rendering into `surface_format`.
    ///
    /// The sprite starts as a soft radial dot. Capacities the device cannot
    /// hold are rejected before anything is allocated, and validation or
    /// out-of-memory errors raised while creating resources are returned
    /// instead of reaching the device's uncaptured error handler.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        emitter: &Emitter,
    ) -> Result<Self, GpuError> {
        let capacity = emitter.capacity() as u32;
        check_capacity(capacity, &device.limits())?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let renderer = Self::create(device, queue, surface_format, emitter, capacity);
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        let validation = pollster::block_on(device.pop_error_scope());

        match out_of_memory.or(validation) {
            Some(e) => Err(GpuError::ResourceCreation(e)),
            None => Ok(renderer),
        }
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        emitter: &Emitter,
        capacity: u32,
    ) -> Self {
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: (capacity as usize * PARTICLE_STRIDE) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Index Buffer"),
            contents: bytemuck::cast_slice(&quad_indices(capacity)),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Uniform Buffer"),
            size: std::mem::size_of::<EmitterUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let particle_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let particle_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &particle_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: particle_buffer.as_entire_binding(),
                },
            ],
        });

        let sprite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let default_sprite = TextureConfig::radial(64);
        let sprite = default_sprite.upload(device, queue);
        let sampler = default_sprite.create_sampler(device);
        let sprite_bind_group = create_sprite_bind_group(device, &sprite_layout, &sprite, &sampler);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&particle_layout, &sprite_layout],
            push_constant_ranges: &[],
        });

        let pipelines = BlendMode::ALL
            .iter()
            .map(|&mode| create_pipeline(device, &pipeline_layout, &shader, surface_format, mode))
            .collect();

        log::debug!("particle renderer created for {capacity} particles");

        Self {
            particle_buffer,
            index_buffer,
            uniform_buffer,
            particle_bind_group,
            sprite_layout,
            sprite_bind_group,
            sprite,
            sampler,
            pipelines,
            capacity,
            staged: 0,
            blend: emitter.shape().blend,
        }
    }

    /// Replace the sprite texture.
    pub fn set_texture(&mut self, device: &wgpu::Device, view: wgpu::TextureView) {
        self.sprite = view;
        self.rebuild_sprite_bind_group(device);
    }

    /// Replace the sprite sampler.
    pub fn set_sampler(&mut self, device: &wgpu::Device, sampler: wgpu::Sampler) {
        self.sampler = sampler;
        self.rebuild_sprite_bind_group(device);
    }

    fn rebuild_sprite_bind_group(&mut self, device: &wgpu::Device) {
        self.sprite_bind_group =
            create_sprite_bind_group(device, &self.sprite_layout, &self.sprite, &self.sampler);
    }

    /// Upload this frame's constants and live particles.
    ///
    /// Must run before the render pass that calls [`draw`](Self::draw) is
    /// submitted. The staging view is released when this returns, whether
    /// staging succeeded or not.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        emitter: &Emitter,
        camera: &impl CameraView,
    ) -> Result<(), GpuError> {
        self.staged = 0;
        self.blend = emitter.shape().blend;

        let uniforms = EmitterUniforms::new(emitter, camera);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bytes = staged_size(emitter.ring());
        let Some(size) = NonZeroU64::new(bytes as u64) else {
            return Ok(());
        };
        if bytes as u64 > self.particle_buffer.size() {
            return Err(EmitterError::StagingTooSmall {
                needed: bytes,
                available: self.particle_buffer.size() as usize,
            }
            .into());
        }

        let mut view = queue
            .write_buffer_with(&self.particle_buffer, 0, size)
            .ok_or_else(|| GpuError::BufferMapping(format!("{bytes} bytes of particle data")))?;
        let written = stage_alive(emitter.ring(), &mut view)?;
        drop(view);

        self.staged = written as u32;
        Ok(())
    }

    /// Record the draw for the particles staged by the last
    /// [`prepare`](Self::prepare). Draws nothing when no particle is alive.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.staged == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipelines[self.blend.index()]);
        render_pass.set_bind_group(0, &self.particle_bind_group, &[]);
        render_pass.set_bind_group(1, &self.sprite_bind_group, &[]);
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count(), 0, 0..1);
    }

    /// Indices the next [`draw`](Self::draw) will submit.
    pub fn index_count(&self) -> u32 {
        self.staged * INDICES_PER_PARTICLE
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Reject capacities whose buffers the device cannot allocate or bind.
pub fn check_capacity(capacity: u32, limits: &wgpu::Limits) -> Result<(), GpuError> {
    let storage_bytes = u64::from(capacity) * PARTICLE_STRIDE as u64;
    let index_bytes =
        u64::from(capacity) * u64::from(INDICES_PER_PARTICLE) * std::mem::size_of::<u32>() as u64;

    let checks = [
        (
            "particle storage",
            storage_bytes,
            u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size),
        ),
        ("quad index", index_bytes, limits.max_buffer_size),
    ];
    for (buffer, bytes, limit) in checks {
        if bytes > limit {
            return Err(GpuError::CapacityExceedsLimits {
                capacity,
                buffer,
                bytes,
                limit,
            });
        }
    }
    Ok(())
}

fn create_sprite_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sprite Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(blend.pipeline_label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend.blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(read_only_depth_state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn parse_shader() -> naga::Module {
        let module = naga::front::wgsl::parse_str(PARTICLE_SHADER)
            .unwrap_or_else(|e| panic!("WGSL parse error: {:?}", e));

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .unwrap_or_else(|e| panic!("WGSL validation error: {:?}", e));
        module
    }

    fn struct_size(module: &naga::Module, name: &str) -> u32 {
        module
            .types
            .iter()
            .find_map(|(_, ty)| match &ty.inner {
                naga::TypeInner::Struct { span, .. } if ty.name.as_deref() == Some(name) => {
                    Some(*span)
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("struct {name} not found"))
    }

    #[test]
    fn test_shader_validates() {
        let module = parse_shader();
        assert!(module.entry_points.iter().any(|ep| ep.name == "vs_main"));
        assert!(module.entry_points.iter().any(|ep| ep.name == "fs_main"));
    }

    #[test]
    fn test_particle_layout_matches_shader() {
        let module = parse_shader();
        assert_eq!(struct_size(&module, "Particle") as usize, PARTICLE_STRIDE);
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        let module = parse_shader();
        assert_eq!(
            struct_size(&module, "Uniforms") as usize,
            std::mem::size_of::<EmitterUniforms>()
        );
    }

    #[test]
    fn test_capacity_checked_against_limits() {
        let limits = wgpu::Limits::default();
        assert!(check_capacity(10_000, &limits).is_ok());

        let err = check_capacity(crate::config::MAX_CAPACITY, &limits).unwrap_err();
        assert!(matches!(
            err,
            GpuError::CapacityExceedsLimits { buffer: "particle storage", .. }
        ));

        let fits = limits.max_storage_buffer_binding_size / PARTICLE_STRIDE as u32;
        assert!(check_capacity(fits, &limits).is_ok());
        assert!(check_capacity(fits + 1, &limits).is_err());
    }

    #[test]
    fn test_max_buffer_size_bounds_storage() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: u32::MAX,
            max_buffer_size: 48 * 100,
            ..wgpu::Limits::default()
        };
        let err = check_capacity(101, &limits).unwrap_err();
        assert!(matches!(
            err,
            GpuError::CapacityExceedsLimits { buffer: "particle storage", .. }
        ));

        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: u32::MAX,
            max_buffer_size: u64::MAX,
            ..wgpu::Limits::default()
        };
        assert!(check_capacity(crate::config::MAX_CAPACITY, &limits).is_ok());
    }

    #[test]
    fn test_quad_indices() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&indices[12..], &[8, 9, 10, 8, 10, 11]);
        assert_eq!(*indices.iter().max().unwrap(), 11);
    }

    #[test]
    fn test_uniforms_carry_emitter_state() {
        use crate::config::EmitterConfig;
        use crate::gpu::Camera;
        use glam::{Vec3, Vec4};

        let mut emitter = Emitter::new(
            EmitterConfig::new(10, 10.0, 2.0)
                .with_acceleration(Vec3::new(0.0, -9.8, 0.0))
                .with_colors(Vec4::ONE, Vec4::ZERO)
                .with_flicker(0.5)
                .with_seed(3),
        )
        .unwrap();
        emitter.update(0.25);

        let u = EmitterUniforms::new(&emitter, &Camera::new());
        assert_eq!(u.lifetime, 2.0);
        assert_eq!(u.current_time, 0.25);
        assert_eq!(u.acceleration, [0.0, -9.8, 0.0]);
        assert_eq!(u.end_color, [0.0; 4]);
        assert_eq!(u.flicker, 0.5);

        emitter.shape_mut().flicker = 4.0;
        assert_eq!(EmitterUniforms::new(&emitter, &Camera::new()).flicker, 1.0);
    }
}
