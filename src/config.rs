//! Engine configuration and validation.
//!
//! All values are fixed at initialization. Changing any of them requires
//! building a new [`MorphEngine`](crate::engine::MorphEngine), since the
//! particle dataset is generated from them exactly once.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::morph::MorphState;
use crate::particle::ParticleClass;

fn default_tree_height() -> f32 {
    12.0
}

fn default_tree_radius() -> f32 {
    5.0
}

fn default_scatter_radius() -> f32 {
    18.0
}

fn default_damping() -> f32 {
    0.04
}

/// Number of particles generated per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCounts {
    pub needle: usize,
    pub ornament: usize,
    pub cube: usize,
    pub spark: usize,
    pub dust: usize,
}

impl Default for ParticleCounts {
    fn default() -> Self {
        Self {
            needle: 6500,
            ornament: 30,
            cube: 600,
            spark: 1500,
            dust: 2000,
        }
    }
}

impl ParticleCounts {
    /// Count configured for a class.
    pub fn get(&self, class: ParticleClass) -> usize {
        match class {
            ParticleClass::Needle => self.needle,
            ParticleClass::Ornament => self.ornament,
            ParticleClass::Cube => self.cube,
            ParticleClass::Spark => self.spark,
            ParticleClass::Dust => self.dust,
        }
    }

    /// Total particle count across all classes.
    pub fn total(&self) -> usize {
        ParticleClass::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

/// Focal ornament (apex marker) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FocalConfig {
    /// Height the ornament rests at while the particles are scattered.
    pub rest_height: f32,
    /// Distance above the cone apex the ornament settles at.
    pub summit_offset: f32,
    /// Fully assembled scale.
    pub target_scale: f32,
    /// Spin around the vertical axis, radians per second.
    pub spin_rate: f32,
    /// Pulse frequency, radians per second.
    pub pulse_rate: f32,
    /// Relative pulse amplitude.
    pub pulse_amplitude: f32,
}

impl Default for FocalConfig {
    fn default() -> Self {
        Self {
            rest_height: 18.0,
            summit_offset: 0.8,
            target_scale: 1.8,
            spin_rate: 1.2,
            pulse_rate: 3.0,
            pulse_amplitude: 0.05,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphConfig {
    /// Particles per class.
    #[serde(default)]
    pub counts: ParticleCounts,

    /// Height of the tree cone.
    #[serde(default = "default_tree_height")]
    pub tree_height: f32,

    /// Base radius of the tree cone.
    #[serde(default = "default_tree_radius")]
    pub tree_radius: f32,

    /// Radius of the scatter sphere.
    #[serde(default = "default_scatter_radius")]
    pub scatter_radius: f32,

    /// Fraction of the remaining distance to the target covered per frame.
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// Seed for dataset generation. None draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Snap progress onto its target once the residual drops below this value.
    /// None keeps the approach purely asymptotic.
    #[serde(default)]
    pub settle_epsilon: Option<f32>,

    /// Mode the engine starts in.
    #[serde(default)]
    pub initial_state: MorphState,

    #[serde(default)]
    pub focal: FocalConfig,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            counts: ParticleCounts::default(),
            tree_height: default_tree_height(),
            tree_radius: default_tree_radius(),
            scatter_radius: default_scatter_radius(),
            damping: default_damping(),
            seed: None,
            settle_epsilon: None,
            initial_state: MorphState::default(),
            focal: FocalConfig::default(),
        }
    }
}

impl MorphConfig {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MorphConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Check every parameter that feeds geometry or the progress controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in ParticleClass::ALL {
            if self.counts.get(class) == 0 {
                return Err(ConfigError::invalid(
                    class.count_field(),
                    "particle count must be positive",
                ));
            }
        }

        positive("treeHeight", self.tree_height)?;
        positive("treeRadius", self.tree_radius)?;
        positive("scatterRadius", self.scatter_radius)?;

        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err(ConfigError::invalid(
                "damping",
                format!("must be in (0, 1], got {}", self.damping),
            ));
        }

        if let Some(eps) = self.settle_epsilon {
            if !eps.is_finite() || eps < 0.0 {
                return Err(ConfigError::invalid(
                    "settleEpsilon",
                    format!("must be a non-negative finite number, got {}", eps),
                ));
            }
        }

        let focal = &self.focal;
        for (field, value) in [
            ("focal.restHeight", focal.rest_height),
            ("focal.summitOffset", focal.summit_offset),
            ("focal.targetScale", focal.target_scale),
            ("focal.spinRate", focal.spin_rate),
            ("focal.pulseRate", focal.pulse_rate),
            ("focal.pulseAmplitude", focal.pulse_amplitude),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be a positive finite number, got {}", value),
        ))
    }
}

/// Configuration rejected at initialization.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration text is not valid JSON for [`MorphConfig`].
    Parse(serde_json::Error),
    /// A field holds a value that would produce degenerate geometry.
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {:?}: {}", path, source)
            }
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
            ConfigError::Invalid { field, message } => {
                write!(f, "invalid config field `{}`: {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}
