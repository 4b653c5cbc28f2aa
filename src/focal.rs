//! Focal ornament: the star that crowns the assembled tree.
//!
//! It holds no animation state of its own. Its transform is a pure function
//! of eased progress and elapsed time.

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::Serialize;

use crate::config::FocalConfig;
use crate::sampler::TreeVolume;

/// Derived transform of the focal ornament for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocalTransform {
    /// World-space y. The ornament stays on the vertical axis.
    pub height: f32,
    pub scale: f32,
    /// Rotation around the vertical axis in radians.
    pub rotation_y: f32,
}

impl FocalTransform {
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, self.height, 0.0)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.rotation_y),
            self.position(),
        )
    }
}

/// Animator for the apex marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalOrnament {
    config: FocalConfig,
    summit_height: f32,
}

impl FocalOrnament {
    pub fn new(config: FocalConfig, tree: &TreeVolume) -> Self {
        Self {
            config,
            summit_height: tree.apex_y() + config.summit_offset,
        }
    }

    /// Height the ornament settles at once the tree is assembled.
    pub fn summit_height(&self) -> f32 {
        self.summit_height
    }

    pub fn transform(&self, eased: f32, time: f32) -> FocalTransform {
        let c = &self.config;
        let pulse = 1.0 + (time * c.pulse_rate).sin() * c.pulse_amplitude;

        FocalTransform {
            height: lerp(c.rest_height, self.summit_height, eased),
            scale: lerp(0.0, c.target_scale, eased) * pulse,
            rotation_y: time * c.spin_rate,
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Closed outline of a star with `points` tips, first tip pointing down (-y).
///
/// Returns `2 * points` vertices alternating between the outer and inner radius.
pub fn star_outline(points: usize, outer_radius: f32, inner_radius: f32) -> Vec<Vec2> {
    (0..points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            let angle = (i as f32 * PI) / points as f32 - PI / 2.0;
            Vec2::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}
