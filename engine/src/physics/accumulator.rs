//! Fixed timestep accumulator for physics updates
//!
//! Turns variable frame times into a whole number of fixed simulation steps
//! and keeps the remainder for interpolation.

use tracing::warn;

/// Accumulates frame time and hands out fixed physics steps
#[derive(Debug, Clone)]
pub struct PhysicsAccumulator {
    /// Accumulated time since last physics update
    accumulator: f32,
    /// Fixed timestep for physics updates
    pub fixed_timestep: f32,
    /// Upper bound on steps handed out per frame
    pub max_steps: u32,
}

impl PhysicsAccumulator {
    /// Create a new physics accumulator with the given fixed timestep
    pub fn new(fixed_timestep: f32, max_steps: u32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_timestep,
            max_steps,
        }
    }

    /// Add delta time to the accumulator
    /// Returns the number of physics steps to perform
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        self.accumulator += delta_time;

        // Prevent spiral of death
        let cap = self.fixed_timestep * self.max_steps as f32;
        if self.accumulator > cap {
            warn!(
                accumulated = self.accumulator,
                max_steps = self.max_steps,
                "Physics accumulator too large, clamping"
            );
            self.accumulator = cap;
        }

        let steps = (self.accumulator / self.fixed_timestep) as u32;
        self.accumulator -= steps as f32 * self.fixed_timestep;
        steps
    }

    /// Interpolation alpha in [0, 1] between the last and next physics step
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator / self.fixed_timestep
    }

    /// Reset the accumulator to zero
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Get the current accumulated time
    pub fn accumulated_time(&self) -> f32 {
        self.accumulator
    }
}

impl Default for PhysicsAccumulator {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 8)
    }
}
