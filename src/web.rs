//! Browser bindings
//!
//! A page reads its sliders and toggles each frame, hands them to
//! [`LevitasSim::set_controls`], calls [`LevitasSim::advance`] from its
//! animation callback and paints the JSON from [`LevitasSim::scene_json`].

use wasm_bindgen::prelude::*;

use crate::config::{Revision, SimConfig};
use crate::driver::FixedStepper;
use crate::scene::Scene;
use crate::sim::{Controls, Phase, Simulation, step};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Logger already installed by an earlier module instance
        return;
    }
    log::info!("Levitas starting...");
}

fn default_seed() -> u64 {
    js_sys::Date::now() as u64
}

/// Simulation handle owned by the page
#[wasm_bindgen]
pub struct LevitasSim {
    sim: Simulation,
    stepper: FixedStepper,
    controls: Controls,
}

#[wasm_bindgen]
impl LevitasSim {
    /// `revision` is one of basic, gravity, actuated (or v1..v3)
    #[wasm_bindgen(constructor)]
    pub fn new(revision: &str, seed: Option<f64>) -> Result<LevitasSim, JsError> {
        let revision: Revision = revision.parse()?;
        Ok(Self::with_config(
            SimConfig::preset(revision),
            seed.map_or_else(default_seed, |s| s as u64),
        ))
    }

    /// Build from a JSON override document
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(json: &str, seed: Option<f64>) -> Result<LevitasSim, JsError> {
        let config = SimConfig::from_json_str(json)?;
        Ok(Self::with_config(
            config,
            seed.map_or_else(default_seed, |s| s as u64),
        ))
    }

    /// Controls for the following ticks
    #[wasm_bindgen(js_name = setControls)]
    pub fn set_controls(
        &mut self,
        control_enabled: bool,
        gain: f64,
        noise: f64,
        gravity_enabled: bool,
    ) {
        self.controls = Controls {
            control_enabled,
            gain,
            noise,
            gravity_enabled,
        };
    }

    /// One fixed tick; returns true once the object is lost
    pub fn step(&mut self) -> bool {
        step(&mut self.sim, &self.controls) == Phase::Failed
    }

    /// Run the ticks covered by a frame of `frame_dt` seconds
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        self.stepper.advance(&mut self.sim, &self.controls, frame_dt)
    }

    pub fn reset(&mut self) {
        self.sim.reset();
        self.stepper.clear();
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> f64 {
        self.sim.state().pos.x
    }

    #[wasm_bindgen(getter)]
    pub fn y(&self) -> f64 {
        self.sim.state().pos.y
    }

    #[wasm_bindgen(getter)]
    pub fn vx(&self) -> f64 {
        self.sim.state().vel.x
    }

    #[wasm_bindgen(getter)]
    pub fn vy(&self) -> f64 {
        self.sim.state().vel.y
    }

    #[wasm_bindgen(getter)]
    pub fn failed(&self) -> bool {
        self.sim.is_failed()
    }

    #[wasm_bindgen(getter)]
    pub fn ticks(&self) -> f64 {
        self.sim.time_ticks() as f64
    }

    /// Draw list for the current frame
    #[wasm_bindgen(js_name = sceneJson)]
    pub fn scene_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&Scene::build(&self.sim, &self.controls))?)
    }
}

impl LevitasSim {
    fn with_config(config: SimConfig, seed: u64) -> Self {
        Self {
            sim: Simulation::new(config, seed),
            stepper: FixedStepper::new(),
            controls: Controls::default(),
        }
    }
}
