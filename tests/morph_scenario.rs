//! End-to-end behaviour of the morph engine over many frames.
//!
//! Run with: cargo test --test morph_scenario

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use evergreen::config::{ConfigError, MorphConfig, ParticleCounts};
use evergreen::engine::MorphEngine;
use evergreen::morph::{smoothstep, MorphController, MorphState};
use evergreen::particle::{ParticleClass, ParticleRecord};
use evergreen::particle_eval::{FrameContext, InstanceScratch};
use evergreen::palette;

fn small_config() -> MorphConfig {
    MorphConfig {
        counts: ParticleCounts {
            needle: 120,
            ornament: 8,
            cube: 40,
            spark: 60,
            dust: 90,
        },
        seed: Some(42),
        ..MorphConfig::default()
    }
}

#[test]
fn hundred_frames_after_toggle_nearly_assembled() {
    let mut controller = MorphController::new(MorphState::Scattered, 0.04);
    controller.toggle();

    let mut eased = 0.0;
    for _ in 0..100 {
        eased = controller.step();
    }
    assert!(controller.progress() > 0.98);

    let record = ParticleRecord {
        scatter_position: Vec3::new(5.0, 0.0, 0.0),
        tree_position: Vec3::ZERO,
        rotation_offset: Vec3::ZERO,
        scale: 1.0,
        color: palette::GOLD,
    };
    let mut scratch = InstanceScratch::default();
    scratch.evaluate(
        &record,
        0,
        &ParticleClass::Needle.profile().animation,
        &FrameContext { time: 100.0 / 60.0, eased },
    );
    // within 2% of the 5-unit travel distance
    assert!(scratch.position.x.abs() < 0.1, "x = {}", scratch.position.x);
}

#[test]
fn engine_assembles_tree_and_crowns_it() {
    let mut engine = MorphEngine::new(small_config()).unwrap();
    assert_eq!(engine.state(), MorphState::Scattered);

    engine.toggle();
    for frame in 0..400 {
        engine.frame(frame as f32 / 60.0);
    }

    let eased = engine.eased_progress();
    assert!(eased > 0.9999);

    let tree = *engine.dataset().tree_volume();
    for class in ParticleClass::INSTANCED {
        let records = engine.dataset().set(class).records();
        let instances = engine.instances(class).unwrap().instances();
        for (record, instance) in records.iter().zip(instances) {
            assert!(instance.translation().distance(record.tree_position) < 0.01);
        }
    }

    let focal = engine.focal_transform();
    assert!((focal.height - (tree.apex_y() + 0.8)).abs() < 0.01);
    assert!(focal.scale > 1.8 * 0.94);
}

#[test]
fn dataset_positions_stable_across_frames() {
    let mut engine = MorphEngine::new(small_config()).unwrap();
    let before: Vec<(Vec3, Vec3)> = engine
        .dataset()
        .sets()
        .flat_map(|s| s.records().iter().map(|r| (r.scatter_position, r.tree_position)))
        .collect();

    for frame in 0..240 {
        if frame % 60 == 0 {
            engine.toggle();
        }
        engine.frame(frame as f32 / 60.0);
    }

    let after: Vec<(Vec3, Vec3)> = engine
        .dataset()
        .sets()
        .flat_map(|s| s.records().iter().map(|r| (r.scatter_position, r.tree_position)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn dust_buffer_tracks_progress_with_drift() {
    let mut engine = MorphEngine::new(small_config()).unwrap();
    engine.toggle();
    for frame in 0..50 {
        engine.frame(frame as f32 / 60.0);
    }

    let eased = engine.eased_progress();
    let time = engine.elapsed();
    let records = engine.dataset().set(ParticleClass::Dust).records();
    let flat = engine.dust_positions();
    assert_eq!(flat.len(), records.len() * 3);

    for (i, (record, point)) in records.iter().zip(flat.chunks_exact(3)).enumerate() {
        let drift = (time * 0.3 + i as f32).sin() * 0.08;
        let expected = record.position_at(eased) + Vec3::splat(drift);
        assert!(Vec3::from_slice(point).distance(expected) < 1e-4);
    }
}

#[test]
fn progress_never_leaves_unit_interval_under_rapid_toggling() {
    let mut engine = MorphEngine::new(small_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    use rand::Rng;

    for frame in 0..1000 {
        if rng.random_bool(0.1) {
            engine.toggle();
        }
        engine.frame(frame as f32 / 60.0);
        let p = engine.progress();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(engine.eased_progress(), smoothstep(p));
    }
}

#[test]
fn subscribers_see_every_change() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut engine = MorphEngine::new(small_config()).unwrap();
    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    engine.subscribe(move |_| counter.set(counter.get() + 1));

    engine.toggle();
    engine.set_state(MorphState::TreeShape);
    engine.set_state(MorphState::Scattered);
    assert_eq!(changes.get(), 2);
    assert_eq!(engine.revision(), 2);
}

#[test]
fn config_rejection() {
    let negative = MorphConfig::from_json_str(r#"{ "counts": { "needle": -1 } }"#);
    assert!(negative.is_err());

    let mut flat = small_config();
    flat.tree_height = 0.0;
    match MorphEngine::new(flat) {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "treeHeight"),
        other => panic!("expected tree height rejection, got {:?}", other.map(|_| ())),
    }
}
