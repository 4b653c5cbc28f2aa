//! Per-frame particle evaluation and GPU instance generation.
//!
//! Every frame, every particle of every class is recomputed from its
//! immutable record:
//! - position blended between scatter and tree by the eased progress
//! - continuous spin, damped wobble and scale pulse for instanced classes
//! - sinusoidal drift for dust, written into a flat point buffer
//!
//! Buffers are sized from the dataset when the updater is created and are
//! overwritten wholesale each frame.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::particle::{AnimationProfile, ParticleClass, ParticleDataset, ParticleRecord};

/// Dust drift frequency (radians per second).
const DUST_DRIFT_RATE: f32 = 0.3;
/// Dust drift amplitude, applied identically to x, y and z.
const DUST_DRIFT_AMPLITUDE: f32 = 0.08;

/// GPU instance data for mesh particles.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuInstance {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// RGBA color.
    pub color: [f32; 4],
}

impl GpuInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = [
        // model matrix columns
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 3, // After mesh vertex attributes (0, 1, 2)
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 16,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 32,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 48,
            shader_location: 6,
            format: wgpu::VertexFormat::Float32x4,
        },
        // color: vec4<f32>
        wgpu::VertexAttribute {
            offset: 64,
            shader_location: 7,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    /// Returns the vertex buffer layout for instanced rendering.
    /// This should be used as the second vertex buffer (slot 1) with step_mode::Instance.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// World-space translation encoded in the model matrix.
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }
}

/// Vertex layout for the dust point buffer (one `vec3<f32>` per point).
pub fn dust_vertex_desc<'a>() -> wgpu::VertexBufferLayout<'a> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }];

    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Evaluation context for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Elapsed session time in seconds.
    pub time: f32,
    /// Smoothstep-eased morph progress.
    pub eased: f32,
}

/// Transform of the particle currently being evaluated.
///
/// Written and consumed within a single iteration, then overwritten by the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceScratch {
    pub position: Vec3,
    /// Euler (XYZ) angles in radians.
    pub rotation: Vec3,
    pub scale: f32,
}

impl InstanceScratch {
    /// Evaluate the animated transform of `record` at slot `index`.
    pub fn evaluate(
        &mut self,
        record: &ParticleRecord,
        index: usize,
        animation: &AnimationProfile,
        ctx: &FrameContext,
    ) {
        let t = ctx.time;
        let phase = t + index as f32;

        self.position = record.position_at(ctx.eased);

        let wobble = animation.wobble * (1.0 - ctx.eased) * phase.sin();
        self.rotation = record.rotation_offset + animation.spin * t + Vec3::new(0.0, wobble, 0.0);

        let pulse = (t * animation.pulse_rate + index as f32).sin() * animation.pulse_amplitude;
        self.scale = record.scale * (1.0 + pulse);
    }

    pub fn to_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// Dust position at slot `index`: interpolated base plus drift.
pub fn dust_position(record: &ParticleRecord, index: usize, ctx: &FrameContext) -> Vec3 {
    let drift = (ctx.time * DUST_DRIFT_RATE + index as f32).sin() * DUST_DRIFT_AMPLITUDE;
    record.position_at(ctx.eased) + Vec3::splat(drift)
}

/// Instance buffer for one mesh class.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    class: ParticleClass,
    instances: Vec<GpuInstance>,
}

impl InstanceBuffer {
    pub fn class(&self) -> ParticleClass {
        self.class
    }

    pub fn instances(&self) -> &[GpuInstance] {
        &self.instances
    }

    /// Raw bytes for upload into a GPU vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Owns the dataset and the per-frame output buffers derived from it.
///
/// Buffers are allocated from the dataset it holds, so every buffer slot has
/// exactly one record for the lifetime of the updater.
#[derive(Debug, Clone)]
pub struct ParticleUpdater {
    dataset: ParticleDataset,
    buffers: Vec<InstanceBuffer>,
    dust: Vec<[f32; 3]>,
    scratch: InstanceScratch,
}

impl ParticleUpdater {
    /// Allocate buffers matching the dataset. Colors are static and written once.
    pub fn new(dataset: ParticleDataset) -> Self {
        let buffers = ParticleClass::INSTANCED
            .iter()
            .map(|&class| {
                let instances = dataset
                    .set(class)
                    .records()
                    .iter()
                    .map(|record| GpuInstance {
                        model: Mat4::IDENTITY.to_cols_array_2d(),
                        color: [record.color[0], record.color[1], record.color[2], 1.0],
                    })
                    .collect();
                InstanceBuffer { class, instances }
            })
            .collect();

        let dust = dataset
            .set(ParticleClass::Dust)
            .records()
            .iter()
            .map(|record| record.scatter_position.to_array())
            .collect();

        Self {
            dataset,
            buffers,
            dust,
            scratch: InstanceScratch::default(),
        }
    }

    pub fn dataset(&self) -> &ParticleDataset {
        &self.dataset
    }

    /// Recompute every instance transform and dust point for this frame.
    pub fn update(&mut self, ctx: &FrameContext) {
        let Self {
            dataset,
            buffers,
            dust,
            scratch,
        } = self;

        for buffer in buffers.iter_mut() {
            let set = dataset.set(buffer.class);
            let animation = set.class().profile().animation;

            for (index, (record, instance)) in set
                .records()
                .iter()
                .zip(buffer.instances.iter_mut())
                .enumerate()
            {
                scratch.evaluate(record, index, &animation, ctx);
                instance.model = scratch.to_matrix().to_cols_array_2d();
            }
        }

        let records = dataset.set(ParticleClass::Dust).records();
        for (index, (record, slot)) in records.iter().zip(dust.iter_mut()).enumerate() {
            *slot = dust_position(record, index, ctx).to_array();
        }
    }

    /// Instance buffer of a mesh class. None for dust.
    pub fn buffer(&self, class: ParticleClass) -> Option<&InstanceBuffer> {
        self.buffers.iter().find(|b| b.class == class)
    }

    pub fn buffers(&self) -> &[InstanceBuffer] {
        &self.buffers
    }

    pub fn dust_points(&self) -> &[[f32; 3]] {
        &self.dust
    }

    /// Dust positions as `[x0, y0, z0, x1, ...]`.
    pub fn dust_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.dust)
    }
}
