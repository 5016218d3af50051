//! Simulation context: the governing clock for every weapon/aim tick.
//!
//! Replaces global pause/time singletons: every tick reads `SimContext`
//! (resource in the App, plain value in unit tests). All countdowns in the
//! crate (delays, reloads, charge steps, scan intervals, suspended tasks)
//! use `delta`/`elapsed` from here, never wall-clock time.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Which clock drives the countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum ClockMode {
    /// Fixed step multiplied by `time_scale` (slow-mo affects weapons)
    #[default]
    Scaled,
    /// Fixed step, `time_scale` ignored
    Unscaled,
}

#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct SimContext {
    /// Fixed simulation step (seconds)
    pub step: f32,
    pub time_scale: f32,
    pub clock: ClockMode,
    /// Paused → delta = 0, elapsed frozen
    pub paused: bool,
    /// Delta of the current tick (seconds)
    pub delta: f32,
    /// Simulation time since start (seconds)
    pub elapsed: f32,
    pub tick: u64,
}

impl Default for SimContext {
    fn default() -> Self {
        Self::from_hz(60.0)
    }
}

impl SimContext {
    pub fn from_hz(hz: f32) -> Self {
        Self {
            step: 1.0 / hz.max(1.0),
            time_scale: 1.0,
            clock: ClockMode::Scaled,
            paused: false,
            delta: 0.0,
            elapsed: 0.0,
            tick: 0,
        }
    }

    /// Context frozen at a given moment (unit tests drive logic with it).
    pub fn at(elapsed: f32, delta: f32) -> Self {
        Self {
            delta,
            elapsed,
            ..Self::default()
        }
    }

    /// Advance by one fixed step.
    pub fn advance(&mut self) {
        if self.paused {
            self.delta = 0.0;
            return;
        }

        self.delta = match self.clock {
            ClockMode::Scaled => self.step * self.time_scale.max(0.0),
            ClockMode::Unscaled => self.step,
        };
        self.elapsed += self.delta;
        self.tick += 1;
    }

    pub fn now(&self) -> f32 {
        self.elapsed
    }
}

/// System: первый шаг каждого FixedUpdate тика.
pub fn advance_sim_context(mut ctx: ResMut<SimContext>) {
    ctx.advance();
}

/// Run condition: weapon/aim logic is frozen while paused.
pub fn simulation_running(ctx: Res<SimContext>) -> bool {
    !ctx.paused
}
