use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::config::MorphConfig;
use crate::engine::MorphEngine;
use crate::morph::MorphState;
use crate::palette;
use crate::particle::ParticleClass;
use crate::perf_profiling;

#[wasm_bindgen]
pub struct WasmMorphEngine {
    inner: Rc<RefCell<MorphEngine>>,
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Create an engine from a JSON config. An empty string uses the defaults.
#[wasm_bindgen]
pub fn create(config_json: &str) -> Result<WasmMorphEngine, JsValue> {
    let config = if config_json.trim().is_empty() {
        MorphConfig::default()
    } else {
        MorphConfig::from_json_str(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let engine = MorphEngine::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(WasmMorphEngine {
        inner: Rc::new(RefCell::new(engine)),
    })
}

#[wasm_bindgen]
impl WasmMorphEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        panic!("Use create(configJson)");
    }

    /// Flip the mode. Returns true if the new mode is the tree shape.
    pub fn toggle(&self) -> bool {
        self.inner.borrow_mut().toggle() == MorphState::TreeShape
    }

    pub fn set_tree_shape(&self, tree_shape: bool) {
        let state = if tree_shape {
            MorphState::TreeShape
        } else {
            MorphState::Scattered
        };
        self.inner.borrow_mut().set_state(state);
    }

    pub fn is_tree_shape(&self) -> bool {
        self.inner.borrow().state() == MorphState::TreeShape
    }

    /// Display label of the current mode, e.g. "TREE SHAPE".
    pub fn state_label(&self) -> String {
        self.inner.borrow().state().label().to_string()
    }

    /// Mode change counter. Compare against a stored value to detect changes.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision()
    }

    /// Advance one frame. Call once per animation frame.
    pub fn frame(&self, elapsed_secs: f32) {
        self.inner.borrow_mut().frame(elapsed_secs);
    }

    /// Raw damped progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.inner.borrow().progress()
    }

    /// Smoothstep-eased progress, the value positions are blended by.
    pub fn eased_progress(&self) -> f32 {
        self.inner.borrow().eased_progress()
    }

    /// Number of instances in a mesh class (0 = needle .. 3 = spark).
    pub fn instance_count(&self, class_index: usize) -> usize {
        let inner = self.inner.borrow();
        ParticleClass::from_index(class_index)
            .and_then(|class| inner.instances(class))
            .map(|b| b.instances().len())
            .unwrap_or(0)
    }

    /// Interleaved instance data (16 matrix floats + 4 color floats per instance).
    /// Empty for dust or an unknown class.
    pub fn instance_data(&self, class_index: usize) -> Vec<f32> {
        let inner = self.inner.borrow();
        ParticleClass::from_index(class_index)
            .and_then(|class| inner.instances(class))
            .map(|b| bytemuck::cast_slice::<_, f32>(b.instances()).to_vec())
            .unwrap_or_default()
    }

    /// Flat dust positions `[x0, y0, z0, x1, ...]`.
    pub fn dust_positions(&self) -> Vec<f32> {
        self.inner.borrow().dust_positions().to_vec()
    }

    /// Focal ornament model matrix (16 floats, column-major).
    pub fn focal_transform(&self) -> Vec<f32> {
        self.inner
            .borrow()
            .focal_transform()
            .to_matrix()
            .to_cols_array()
            .to_vec()
    }

    /// Scene clear color as RGB.
    pub fn background_color(&self) -> Vec<f32> {
        palette::BG_DARK.to_vec()
    }

    pub fn set_profiling_enabled(&self, enabled: bool) {
        perf_profiling::set_profiling_enabled(enabled);
        perf_profiling::reset_frame_counter();
    }
}
