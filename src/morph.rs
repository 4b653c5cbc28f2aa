//! Morph mode and progress controller.
//!
//! The mode is the single externally mutable input of the engine. The
//! controller turns it into a smoothly approaching progress scalar:
//! each frame closes a fixed fraction of the remaining distance to the
//! target, and consumers read the smoothstep-eased value.

use serde::{Deserialize, Serialize};

/// Which configuration the particles are heading towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MorphState {
    #[default]
    Scattered,
    TreeShape,
}

impl MorphState {
    /// Progress target for this state: 0 for scattered, 1 for the tree.
    pub fn target(self) -> f32 {
        match self {
            MorphState::Scattered => 0.0,
            MorphState::TreeShape => 1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MorphState::Scattered => MorphState::TreeShape,
            MorphState::TreeShape => MorphState::Scattered,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MorphState::Scattered => "SCATTERED",
            MorphState::TreeShape => "TREE SHAPE",
        }
    }
}

impl std::fmt::Display for MorphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cubic smoothstep `3t^2 - 2t^3`, with `t` clamped to `[0, 1]`.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Callback invoked with the new state whenever the mode changes.
pub type StateListener = Box<dyn FnMut(MorphState)>;

/// Owns the mode and the progress scalar derived from it.
pub struct MorphController {
    state: MorphState,
    progress: f32,
    damping: f32,
    settle_epsilon: Option<f32>,
    /// Bumped on every actual mode change, so presenters can poll for changes.
    revision: u64,
    listeners: Vec<StateListener>,
}

impl std::fmt::Debug for MorphController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MorphController")
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("damping", &self.damping)
            .field("settle_epsilon", &self.settle_epsilon)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MorphController {
    /// Start at rest in `state`: progress already equals its target.
    pub fn new(state: MorphState, damping: f32) -> Self {
        Self {
            state,
            progress: state.target(),
            damping,
            settle_epsilon: None,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Snap progress onto the target once closer than `epsilon`.
    pub fn with_settle_epsilon(mut self, epsilon: Option<f32>) -> Self {
        self.settle_epsilon = epsilon;
        self
    }

    pub fn state(&self) -> MorphState {
        self.state
    }

    pub fn target(&self) -> f32 {
        self.state.target()
    }

    /// Raw (un-eased) progress.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress passed through [`smoothstep`].
    pub fn eased(&self) -> f32 {
        smoothstep(self.progress)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True if the mode changed after `revision` was observed.
    pub fn changed_since(&self, revision: u64) -> bool {
        self.revision != revision
    }

    /// Register a callback run synchronously on every mode change.
    pub fn subscribe(&mut self, listener: impl FnMut(MorphState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Set the mode. Setting the current mode again changes nothing.
    pub fn set_state(&mut self, state: MorphState) {
        if state == self.state {
            return;
        }
        log::debug!("Morph state {} -> {}", self.state, state);
        self.state = state;
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(state);
        }
    }

    /// Flip the mode and return the new one.
    pub fn toggle(&mut self) -> MorphState {
        self.set_state(self.state.toggled());
        self.state
    }

    /// Advance progress by one frame and return the eased value.
    pub fn step(&mut self) -> f32 {
        let target = self.target();
        self.progress += (target - self.progress) * self.damping;

        if let Some(eps) = self.settle_epsilon {
            if (target - self.progress).abs() < eps {
                self.progress = target;
            }
        }

        self.eased()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_smoothstep_boundaries() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(4.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_smoothstep_monotonic() {
        let mut prev = smoothstep(0.0);
        for i in 1..=1000 {
            let v = smoothstep(i as f32 / 1000.0);
            assert!(v >= prev, "smoothstep decreased at {}", i);
            prev = v;
        }
    }

    #[test]
    fn test_initial_progress_matches_state() {
        assert_eq!(MorphController::new(MorphState::Scattered, 0.04).progress(), 0.0);
        assert_eq!(MorphController::new(MorphState::TreeShape, 0.04).progress(), 1.0);
    }

    #[test]
    fn test_progress_converges_monotonically() {
        let mut controller = MorphController::new(MorphState::Scattered, 0.04);
        controller.set_state(MorphState::TreeShape);

        let mut prev = controller.progress();
        for _ in 0..2000 {
            controller.step();
            let p = controller.progress();
            assert!(p >= prev, "progress went backwards");
            assert!((0.0..=1.0).contains(&p), "progress {} left [0, 1]", p);
            prev = p;
        }
        assert!(prev > 0.999);
    }

    #[test]
    fn test_hundred_frames_exceed_threshold() {
        let mut controller = MorphController::new(MorphState::Scattered, 0.04);
        controller.toggle();
        for _ in 0..100 {
            controller.step();
        }
        assert!(controller.progress() > 0.98, "progress {}", controller.progress());
        assert!(controller.progress() < 1.0);
    }

    #[test]
    fn test_settle_epsilon_snaps_to_target() {
        let mut controller =
            MorphController::new(MorphState::Scattered, 0.04).with_settle_epsilon(Some(1e-3));
        controller.toggle();
        for _ in 0..500 {
            controller.step();
        }
        assert_eq!(controller.progress(), 1.0);
        assert_eq!(controller.eased(), 1.0);
    }

    #[test]
    fn test_toggle_twice_restores_target() {
        for start in [MorphState::Scattered, MorphState::TreeShape] {
            let mut controller = MorphController::new(start, 0.04);
            let original = controller.target();
            controller.toggle();
            assert_ne!(controller.target(), original);
            controller.toggle();
            assert_eq!(controller.target(), original);
        }
    }

    #[test]
    fn test_revision_and_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut controller = MorphController::new(MorphState::Scattered, 0.04);
        controller.subscribe(move |state| sink.borrow_mut().push(state));

        let rev = controller.revision();
        controller.set_state(MorphState::Scattered);
        assert!(!controller.changed_since(rev));

        controller.toggle();
        controller.toggle();
        assert!(controller.changed_since(rev));
        assert_eq!(controller.revision(), 2);
        assert_eq!(*seen.borrow(), vec![MorphState::TreeShape, MorphState::Scattered]);
    }
}
