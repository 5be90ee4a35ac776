use config::{Config, ConfigError, Environment, File};
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::VivariumError;

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub tank_half_width: f64,
    pub tank_half_height: f64,
    pub tank_half_depth: f64,

    pub predator_speed: f64,
    pub prey_speed: f64,
    pub food_fall_speed: f64,

    pub creature_radius: f64,
    pub food_radius: f64,

    pub default_predators: usize,
    pub default_prey: usize,

    pub perception_radius: f64,
    pub prey_evasion_weight: f64,
    pub prey_flocking: bool,
    pub cohesion_weight: f64,
    pub alignment_weight: f64,

    pub remove_consumed_predators: bool,
    pub seed: Option<u64>,

    pub tick_ms: u64,
    pub max_ticks: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tank_half_width: 2.0,
            tank_half_height: 2.0,
            tank_half_depth: 2.0,
            predator_speed: 0.01,
            prey_speed: 0.01,
            food_fall_speed: 0.004,
            creature_radius: 0.4,
            food_radius: 0.05,
            default_predators: 1,
            default_prey: 2,
            perception_radius: 1.0,
            prey_evasion_weight: 0.005,
            prey_flocking: false,
            cohesion_weight: 0.002,
            alignment_weight: 0.1,
            remove_consumed_predators: false,
            seed: None,
            tick_ms: 30,
            max_ticks: 0,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        let config = Config::builder()
            .set_default("tank_half_width", defaults.tank_half_width)?
            .set_default("tank_half_height", defaults.tank_half_height)?
            .set_default("tank_half_depth", defaults.tank_half_depth)?
            .set_default("predator_speed", defaults.predator_speed)?
            .set_default("prey_speed", defaults.prey_speed)?
            .set_default("food_fall_speed", defaults.food_fall_speed)?
            .set_default("creature_radius", defaults.creature_radius)?
            .set_default("food_radius", defaults.food_radius)?
            .set_default("default_predators", defaults.default_predators as i64)?
            .set_default("default_prey", defaults.default_prey as i64)?
            .set_default("perception_radius", defaults.perception_radius)?
            .set_default("prey_evasion_weight", defaults.prey_evasion_weight)?
            .set_default("prey_flocking", defaults.prey_flocking)?
            .set_default("cohesion_weight", defaults.cohesion_weight)?
            .set_default("alignment_weight", defaults.alignment_weight)?
            .set_default(
                "remove_consumed_predators",
                defaults.remove_consumed_predators,
            )?
            .set_default("tick_ms", defaults.tick_ms as i64)?
            .set_default("max_ticks", defaults.max_ticks as i64)?
            .add_source(File::with_name("vivarium.yaml").required(false))
            .add_source(Environment::with_prefix("VIVARIUM"))
            .build()?;

        config.try_deserialize()
    }

    // Rejects values the simulation cannot run with. Called once when a
    // vivarium is built, never mid-simulation.
    pub fn validate(&self) -> Result<(), VivariumError> {
        for half in [
            self.tank_half_width,
            self.tank_half_height,
            self.tank_half_depth,
        ] {
            if !(half > 0.0) {
                return Err(VivariumError::NonPositiveTank(half));
            }
        }
        for radius in [self.creature_radius, self.food_radius] {
            if !(radius >= 0.0) {
                return Err(VivariumError::NegativeRadius(radius));
            }
        }
        let smallest = self
            .tank_half_width
            .min(self.tank_half_height)
            .min(self.tank_half_depth);
        if self.creature_radius >= smallest || self.food_radius >= smallest {
            return Err(VivariumError::InvalidConfig(
                "bounding radius does not fit inside the tank",
            ));
        }
        if !(self.predator_speed > 0.0 && self.prey_speed > 0.0) {
            return Err(VivariumError::InvalidConfig("creature speeds must be positive"));
        }
        if !(self.food_fall_speed >= 0.0) {
            return Err(VivariumError::InvalidConfig("food fall speed must be non-negative"));
        }
        Ok(())
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}
