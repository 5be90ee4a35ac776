use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use vivarium_core::scenegraph::RenderContext;
use vivarium_core::{Settings, VivariumError};

use crate::vivarium::Vivarium;

// ticks between population summaries
const CENSUS_INTERVAL: u64 = 100;

/// Headless driver: ticks the vivarium at a fixed rate.
pub struct SimulationServer {
    vivarium: Vivarium,
    tick_duration: Duration,
    max_ticks: u64,
    ticks: u64,
}

impl SimulationServer {
    pub fn new(settings: Settings) -> Result<SimulationServer, VivariumError> {
        let tick_duration = Duration::from_millis(settings.tick_ms);
        let max_ticks = settings.max_ticks;
        let mut vivarium = Vivarium::new(settings, RenderContext::default())?;
        vivarium.reset_population()?;

        Ok(SimulationServer {
            vivarium,
            tick_duration,
            max_ticks,
            ticks: 0,
        })
    }

    pub fn vivarium(&self) -> &Vivarium {
        &self.vivarium
    }

    fn is_finished(&self) -> bool {
        self.max_ticks != 0 && self.ticks >= self.max_ticks
    }

    pub fn step(&mut self) {
        self.vivarium.tick();
        self.ticks += 1;
        if self.ticks % CENSUS_INTERVAL == 0 {
            info!("tick {}: {}", self.ticks, self.vivarium.census());
        }
    }

    pub fn start_loop(&mut self) {
        info!(
            "starting vivarium loop at {}ms per tick: {}",
            self.tick_duration.as_millis(),
            self.vivarium.census()
        );

        while !self.is_finished() {
            let start_time = Instant::now();
            self.step();

            // wait until the tick time has elapsed
            match self.tick_duration.checked_sub(start_time.elapsed()) {
                Some(remaining) => thread::sleep(remaining),
                None if !self.tick_duration.is_zero() => {
                    warn!("tick {} took longer than {:?}", self.ticks, self.tick_duration)
                }
                None => {}
            }
        }

        info!("stopped after {} ticks: {}", self.ticks, self.vivarium.census());
    }
}
