//! Random point generators for the two particle configurations.
//!
//! Both samplers are stateless: every call draws fresh values from the
//! supplied random source and returns an independent point.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

/// Cone volume the assembled tree occupies.
///
/// The cone stands on its base at `h = 0` and narrows linearly to its apex at
/// `h = height`. Sampled points are shifted down by `height / 2.5` so the
/// visual mass sits near the scene origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeVolume {
    pub height: f32,
    pub radius: f32,
}

impl TreeVolume {
    pub fn new(height: f32, radius: f32) -> Self {
        Self { height, radius }
    }

    /// Vertical shift applied to every sampled point.
    pub fn vertical_offset(&self) -> f32 {
        self.height / 2.5
    }

    /// World-space y of the apex.
    pub fn apex_y(&self) -> f32 {
        self.height - self.vertical_offset()
    }

    /// Cone radius at height `h` measured from the base.
    pub fn radius_at(&self, h: f32) -> f32 {
        ((self.height - h) / self.height) * self.radius
    }

    /// Random point inside the cone, uniform over each cross-sectional disk.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let h = rng.random_range(0.0..self.height);
        let max_radius = self.radius_at(h);
        // sqrt keeps the disk uniform instead of clustering at the axis
        let radius = rng.random::<f32>().sqrt() * max_radius;
        let theta = rng.random_range(0.0..TAU);

        Vec3::new(
            radius * theta.cos(),
            h - self.vertical_offset(),
            radius * theta.sin(),
        )
    }
}

/// Solid ball the particles drift in while scattered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterVolume {
    pub radius: f32,
}

impl ScatterVolume {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Random point inside the ball with uniform density.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let u: f32 = rng.random();
        let v: f32 = rng.random();
        let theta = TAU * u;
        let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
        // cbrt compensates for volume growing with r^3
        let r = rng.random::<f32>().cbrt() * self.radius;

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
    }
}

/// Random point inside the tree cone. See [`TreeVolume::sample`].
pub fn tree_position<R: Rng + ?Sized>(rng: &mut R, height: f32, radius: f32) -> Vec3 {
    TreeVolume::new(height, radius).sample(rng)
}

/// Random point inside the scatter ball. See [`ScatterVolume::sample`].
pub fn scatter_position<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    ScatterVolume::new(radius).sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLES: usize = 40_000;

    #[test]
    fn test_tree_samples_stay_inside_cone() {
        let mut rng = StdRng::seed_from_u64(1);
        let volume = TreeVolume::new(12.0, 5.0);

        for _ in 0..SAMPLES {
            let p = volume.sample(&mut rng);
            let h = p.y + volume.vertical_offset();
            assert!(h >= 0.0 && h <= volume.height + 1e-4, "height {} out of range", h);

            let horizontal = (p.x * p.x + p.z * p.z).sqrt();
            assert!(
                horizontal <= volume.radius_at(h) + 1e-4,
                "point {:?} outside cone radius {}",
                p,
                volume.radius_at(h)
            );
        }
    }

    #[test]
    fn test_scatter_samples_stay_inside_ball() {
        let mut rng = StdRng::seed_from_u64(2);
        let volume = ScatterVolume::new(18.0);

        for _ in 0..SAMPLES {
            let p = volume.sample(&mut rng);
            assert!(p.length() <= 18.0 + 1e-3, "point {:?} outside ball", p);
        }
    }

    #[test]
    fn test_scatter_density_is_uniform_in_volume() {
        let mut rng = StdRng::seed_from_u64(3);
        let volume = ScatterVolume::new(10.0);

        // inner ball of half radius holds 1/8 of the volume
        let inner = (0..SAMPLES)
            .filter(|_| volume.sample(&mut rng).length() < 5.0)
            .count();
        let fraction = inner as f32 / SAMPLES as f32;
        assert!((fraction - 0.125).abs() < 0.015, "inner fraction {}", fraction);

        // octants should be evenly filled
        let mut octants = [0usize; 8];
        for _ in 0..SAMPLES {
            let p = volume.sample(&mut rng);
            let idx =
                (p.x > 0.0) as usize | ((p.y > 0.0) as usize) << 1 | ((p.z > 0.0) as usize) << 2;
            octants[idx] += 1;
        }
        for count in octants {
            let fraction = count as f32 / SAMPLES as f32;
            assert!((fraction - 0.125).abs() < 0.015, "octant fraction {}", fraction);
        }
    }

    #[test]
    fn test_tree_cross_sections_are_uniform() {
        let mut rng = StdRng::seed_from_u64(4);
        let volume = TreeVolume::new(12.0, 5.0);

        let mut lower_half = 0usize;
        let mut inner_disk = 0usize;
        for _ in 0..SAMPLES {
            let p = volume.sample(&mut rng);
            let h = p.y + volume.vertical_offset();
            if h < volume.height / 2.0 {
                lower_half += 1;
            }
            let max_r = volume.radius_at(h);
            if max_r > 0.0 {
                let r = (p.x * p.x + p.z * p.z).sqrt() / max_r;
                // disk of radius 1/sqrt(2) holds half the cross-section area
                if r < std::f32::consts::FRAC_1_SQRT_2 {
                    inner_disk += 1;
                }
            }
        }

        let height_fraction = lower_half as f32 / SAMPLES as f32;
        let disk_fraction = inner_disk as f32 / SAMPLES as f32;
        assert!((height_fraction - 0.5).abs() < 0.02, "height fraction {}", height_fraction);
        assert!((disk_fraction - 0.5).abs() < 0.02, "disk fraction {}", disk_fraction);
    }

    #[test]
    fn test_same_seed_same_samples() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(tree_position(&mut a, 12.0, 5.0), tree_position(&mut b, 12.0, 5.0));
        assert_eq!(scatter_position(&mut a, 18.0), scatter_position(&mut b, 18.0));
    }

    #[test]
    fn test_apex_y() {
        let volume = TreeVolume::new(12.0, 5.0);
        assert!((volume.apex_y() - 7.2).abs() < 1e-5);
        assert_eq!(volume.radius_at(12.0), 0.0);
        assert_eq!(volume.radius_at(0.0), 5.0);
    }
}
