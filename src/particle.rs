//! Particle classes, records and the startup dataset builder.
//!
//! Every record pairs a fixed point in the scatter ball with a fixed point in
//! the tree cone. Records are generated once per session and never mutated;
//! only the transforms derived from them change from frame to frame.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::config::MorphConfig;
use crate::palette;
use crate::sampler::{ScatterVolume, TreeVolume};

/// The five fixed categories of decorative particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleClass {
    /// Fine pine needles.
    Needle,
    /// Small gold spheres.
    Ornament,
    /// Large decorative cubes.
    Cube,
    /// Tiny bright filler cubes.
    Spark,
    /// Background stardust, rendered as loose points.
    Dust,
}

impl ParticleClass {
    pub const ALL: [ParticleClass; 5] = [
        ParticleClass::Needle,
        ParticleClass::Ornament,
        ParticleClass::Cube,
        ParticleClass::Spark,
        ParticleClass::Dust,
    ];

    /// Classes rendered as oriented mesh instances.
    pub const INSTANCED: [ParticleClass; 4] = [
        ParticleClass::Needle,
        ParticleClass::Ornament,
        ParticleClass::Cube,
        ParticleClass::Spark,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ParticleClass::Needle => "needle",
            ParticleClass::Ornament => "ornament",
            ParticleClass::Cube => "cube",
            ParticleClass::Spark => "spark",
            ParticleClass::Dust => "dust",
        }
    }

    /// Dotted config path of this class's count, used in error messages.
    pub fn count_field(self) -> &'static str {
        match self {
            ParticleClass::Needle => "counts.needle",
            ParticleClass::Ornament => "counts.ornament",
            ParticleClass::Cube => "counts.cube",
            ParticleClass::Spark => "counts.spark",
            ParticleClass::Dust => "counts.dust",
        }
    }

    pub fn is_instanced(self) -> bool {
        self != ParticleClass::Dust
    }

    pub fn profile(self) -> &'static ClassProfile {
        &PROFILES[self.index()]
    }
}

impl std::fmt::Display for ParticleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Class Profiles
// ============================================================================

/// How a class draws its static rotation offset at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationRule {
    /// No offset; any visible rotation comes from per-frame animation.
    Zero,
    /// Small tilt on x/z with a full random turn around y.
    Jitter { tilt: f32 },
    /// Independent random angle in `[0, PI)` on every axis.
    Full,
}

/// How a class picks each record's colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorRule {
    Solid([f32; 3]),
    /// `primary` with the given probability, otherwise `secondary`.
    Mix {
        primary: [f32; 3],
        secondary: [f32; 3],
        primary_chance: f64,
    },
}

/// Continuous per-frame animation applied on top of the interpolated position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationProfile {
    /// Rotation advance per second on each axis (radians).
    pub spin: Vec3,
    /// Amplitude of the y-axis wobble. Damped by `1 - eased` so it stops once assembled.
    pub wobble: f32,
    /// Scale pulse frequency (radians per second).
    pub pulse_rate: f32,
    /// Relative scale pulse amplitude.
    pub pulse_amplitude: f32,
}

/// Per-class generation and animation constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProfile {
    /// Base scale drawn uniformly from `[min, max)`.
    pub scale_range: [f32; 2],
    pub rotation: RotationRule,
    pub color: ColorRule,
    pub animation: AnimationProfile,
}

const SETTLING: AnimationProfile = AnimationProfile {
    spin: Vec3::new(0.1, 0.0, 0.0),
    wobble: 0.2,
    pulse_rate: 1.5,
    pulse_amplitude: 0.05,
};

const TUMBLING: AnimationProfile = AnimationProfile {
    spin: Vec3::new(1.0, 1.5, 0.5),
    wobble: 0.0,
    pulse_rate: 4.0,
    pulse_amplitude: 0.05,
};

/// Dust is never oriented; only its drift matters.
const STATIC: AnimationProfile = AnimationProfile {
    spin: Vec3::ZERO,
    wobble: 0.0,
    pulse_rate: 0.0,
    pulse_amplitude: 0.0,
};

static PROFILES: [ClassProfile; 5] = [
    ClassProfile {
        scale_range: [0.12, 0.27],
        rotation: RotationRule::Jitter { tilt: 0.4 },
        color: ColorRule::Mix {
            primary: palette::EMERALD,
            secondary: palette::EMERALD_LIGHT,
            primary_chance: 0.6,
        },
        animation: SETTLING,
    },
    ClassProfile {
        scale_range: [0.22, 0.40],
        rotation: RotationRule::Zero,
        color: ColorRule::Solid(palette::GOLD_BRIGHT),
        animation: SETTLING,
    },
    ClassProfile {
        scale_range: [0.25, 0.60],
        rotation: RotationRule::Full,
        color: ColorRule::Mix {
            primary: palette::GOLD,
            secondary: palette::EMERALD_LIGHT,
            primary_chance: 0.5,
        },
        animation: SETTLING,
    },
    ClassProfile {
        scale_range: [0.05, 0.13],
        rotation: RotationRule::Full,
        color: ColorRule::Solid(palette::GOLD),
        animation: TUMBLING,
    },
    ClassProfile {
        scale_range: [0.0, 1.0],
        rotation: RotationRule::Zero,
        color: ColorRule::Solid(palette::GOLD_BRIGHT),
        animation: STATIC,
    },
];

impl RotationRule {
    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> Vec3 {
        match self {
            RotationRule::Zero => Vec3::ZERO,
            RotationRule::Jitter { tilt } => Vec3::new(
                (rng.random::<f32>() - 0.5) * tilt,
                rng.random::<f32>() * TAU,
                (rng.random::<f32>() - 0.5) * tilt,
            ),
            RotationRule::Full => Vec3::new(
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
            ),
        }
    }
}

impl ColorRule {
    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> [f32; 3] {
        match self {
            ColorRule::Solid(color) => color,
            ColorRule::Mix {
                primary,
                secondary,
                primary_chance,
            } => {
                if rng.random_bool(primary_chance) {
                    primary
                } else {
                    secondary
                }
            }
        }
    }
}

// ============================================================================
// Records and Dataset
// ============================================================================

/// One generated particle. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    /// Fixed point inside the scatter ball.
    pub scatter_position: Vec3,
    /// Fixed point inside the tree cone.
    pub tree_position: Vec3,
    /// Static Euler (XYZ) rotation bias in radians.
    pub rotation_offset: Vec3,
    /// Base scale multiplier.
    pub scale: f32,
    /// RGB colour.
    pub color: [f32; 3],
}

impl ParticleRecord {
    /// Position blended between the two configurations by `t` (already eased).
    #[inline]
    pub fn position_at(&self, t: f32) -> Vec3 {
        self.scatter_position.lerp(self.tree_position, t)
    }
}

/// The fixed, ordered records of a single class.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    class: ParticleClass,
    records: Vec<ParticleRecord>,
}

impl ParticleSet {
    /// Generate `count` records for `class`.
    pub fn generate<R: Rng + ?Sized>(
        class: ParticleClass,
        count: usize,
        tree: &TreeVolume,
        scatter: &ScatterVolume,
        rng: &mut R,
    ) -> Self {
        let profile = class.profile();
        let [min_scale, max_scale] = profile.scale_range;

        let records = (0..count)
            .map(|_| ParticleRecord {
                scatter_position: scatter.sample(rng),
                tree_position: tree.sample(rng),
                rotation_offset: profile.rotation.draw(rng),
                scale: min_scale + rng.random::<f32>() * (max_scale - min_scale),
                color: profile.color.draw(rng),
            })
            .collect();

        Self { class, records }
    }

    pub fn class(&self) -> ParticleClass {
        self.class
    }

    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// All particle records for a session, one [`ParticleSet`] per class.
#[derive(Debug, Clone)]
pub struct ParticleDataset {
    sets: Vec<ParticleSet>,
    tree: TreeVolume,
    scatter: ScatterVolume,
}

impl ParticleDataset {
    /// Build every class from an already validated config.
    pub fn build<R: Rng + ?Sized>(config: &MorphConfig, rng: &mut R) -> Self {
        let tree = TreeVolume::new(config.tree_height, config.tree_radius);
        let scatter = ScatterVolume::new(config.scatter_radius);

        let sets = ParticleClass::ALL
            .iter()
            .map(|&class| {
                ParticleSet::generate(class, config.counts.get(class), &tree, &scatter, rng)
            })
            .collect::<Vec<_>>();

        log::info!(
            "Built particle dataset: {}",
            sets.iter()
                .map(|s| format!("{}={}", s.class(), s.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self { sets, tree, scatter }
    }

    pub fn set(&self, class: ParticleClass) -> &ParticleSet {
        &self.sets[class.index()]
    }

    pub fn sets(&self) -> impl Iterator<Item = &ParticleSet> {
        self.sets.iter()
    }

    pub fn tree_volume(&self) -> &TreeVolume {
        &self.tree
    }

    pub fn scatter_volume(&self) -> &ScatterVolume {
        &self.scatter
    }

    pub fn total_len(&self) -> usize {
        self.sets.iter().map(ParticleSet::len).sum()
    }
}
