//! Compositing state for particle quads.
//!
//! Particles are drawn after opaque geometry. They test against the depth
//! buffer so walls hide them, but never write to it, so particles don't
//! occlude each other or anything drawn later.

/// Depth format shared by the scene and the particle pipelines.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Blend mode for particle rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BlendMode {
    /// Standard alpha blending (default).
    ///
    /// Good for smoke, dust and other particles that should darken or
    /// cover what is behind them.
    #[default]
    Alpha,

    /// Additive blending.
    ///
    /// Overlapping particles get brighter. Fire, sparks, magic.
    Additive,
}

impl BlendMode {
    /// Both modes, in pipeline slot order.
    pub const ALL: [BlendMode; 2] = [BlendMode::Alpha, BlendMode::Additive];

    /// Pipeline slot used by [`crate::gpu::EmitterRenderer`].
    pub(crate) fn index(self) -> usize {
        match self {
            BlendMode::Alpha => 0,
            BlendMode::Additive => 1,
        }
    }

    /// The wgpu blend state for this mode.
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }

    pub(crate) fn pipeline_label(self) -> &'static str {
        match self {
            BlendMode::Alpha => "Particle Pipeline (alpha)",
            BlendMode::Additive => "Particle Pipeline (additive)",
        }
    }
}

/// Depth test against opaque geometry without writing depth.
pub fn read_only_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
