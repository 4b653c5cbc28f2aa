//! The morph engine: dataset, progress controller, particle updater and focal
//! ornament wired into a single frame loop.
//!
//! Presentation code drives it by calling [`MorphEngine::frame`] once per
//! display refresh and reading the buffers afterwards. The mode may be
//! changed between frames with [`MorphEngine::toggle`] or
//! [`MorphEngine::set_state`]; it is only read at the start of the next frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, MorphConfig};
use crate::focal::{FocalOrnament, FocalTransform};
use crate::morph::{MorphController, MorphState};
use crate::particle::{ParticleClass, ParticleDataset};
use crate::particle_eval::{FrameContext, InstanceBuffer, ParticleUpdater};
use crate::perf_profiling::{self, FrameStats};

pub struct MorphEngine {
    config: MorphConfig,
    controller: MorphController,
    updater: ParticleUpdater,
    focal: FocalOrnament,
    focal_transform: FocalTransform,
    frame: u64,
    time: f32,
}

impl std::fmt::Debug for MorphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MorphEngine")
            .field("controller", &self.controller)
            .field("particles", &self.updater.dataset().total_len())
            .field("frame", &self.frame)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl MorphEngine {
    /// Validate `config` and build the session's dataset.
    ///
    /// Uses `config.seed` when set, OS entropy otherwise.
    pub fn new(config: MorphConfig) -> Result<Self, ConfigError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, &mut rng)
    }

    /// Validate `config` and build the dataset from the supplied random source.
    pub fn with_rng<R: Rng + ?Sized>(
        config: MorphConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let dataset = ParticleDataset::build(&config, rng);
        let controller = MorphController::new(config.initial_state, config.damping)
            .with_settle_epsilon(config.settle_epsilon);
        let focal = FocalOrnament::new(config.focal, dataset.tree_volume());
        let mut updater = ParticleUpdater::new(dataset);

        let eased = controller.eased();
        updater.update(&FrameContext { time: 0.0, eased });
        let focal_transform = focal.transform(eased, 0.0);

        log::info!(
            "Morph engine ready: {} particles, initial state {}",
            updater.dataset().total_len(),
            config.initial_state
        );

        Ok(Self {
            config,
            controller,
            updater,
            focal,
            focal_transform,
            frame: 0,
            time: 0.0,
        })
    }

    // ========================================================================
    // Mode input
    // ========================================================================

    pub fn state(&self) -> MorphState {
        self.controller.state()
    }

    pub fn set_state(&mut self, state: MorphState) {
        self.controller.set_state(state);
    }

    /// Flip between scattered and tree shape. Returns the new state.
    pub fn toggle(&mut self) -> MorphState {
        let state = self.controller.toggle();
        log::info!("Toggled morph state to {}", state);
        state
    }

    /// Register a callback for mode changes.
    pub fn subscribe(&mut self, listener: impl FnMut(MorphState) + 'static) {
        self.controller.subscribe(listener);
    }

    /// Mode change counter, for polling.
    pub fn revision(&self) -> u64 {
        self.controller.revision()
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Advance one frame at `elapsed_secs` since the session started.
    ///
    /// Steps progress once, then rewrites every buffer.
    pub fn frame(&mut self, elapsed_secs: f32) {
        let eased = self.controller.step();
        let ctx = FrameContext {
            time: elapsed_secs,
            eased,
        };

        let updater = &mut self.updater;
        crate::perf_time!("particles.update", updater.update(&ctx));
        self.focal_transform = self.focal.transform(eased, elapsed_secs);

        self.time = elapsed_secs;
        self.frame += 1;

        if perf_profiling::should_log_stats() {
            self.stats().log();
        }
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    pub fn progress(&self) -> f32 {
        self.controller.progress()
    }

    pub fn eased_progress(&self) -> f32 {
        self.controller.eased()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.time
    }

    /// Instance buffer for a mesh class; None for dust.
    pub fn instances(&self, class: ParticleClass) -> Option<&InstanceBuffer> {
        self.updater.buffer(class)
    }

    pub fn instance_buffers(&self) -> &[InstanceBuffer] {
        self.updater.buffers()
    }

    /// Dust positions as a flat `[x0, y0, z0, x1, ...]` slice.
    pub fn dust_positions(&self) -> &[f32] {
        self.updater.dust_flat()
    }

    pub fn focal_transform(&self) -> FocalTransform {
        self.focal_transform
    }

    pub fn dataset(&self) -> &ParticleDataset {
        self.updater.dataset()
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frame: self.frame,
            state: self.state(),
            progress: self.progress(),
            eased: self.eased_progress(),
            instances: self
                .instance_buffers()
                .iter()
                .map(|b| (b.class().name(), b.instances().len()))
                .collect(),
            dust_points: self.updater.dust_points().len(),
        }
    }
}
