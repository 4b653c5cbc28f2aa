pub mod config;
pub mod engine;
pub mod focal;
pub mod morph;
pub mod palette;
pub mod particle;
pub mod particle_eval;
pub mod perf_profiling;
pub mod sampler;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{ConfigError, MorphConfig, ParticleCounts};
pub use engine::MorphEngine;
pub use morph::MorphState;
pub use particle::ParticleClass;
