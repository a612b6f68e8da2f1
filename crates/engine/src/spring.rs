use std::time::Duration;

use tokio::time::Instant;

use crate::config::SpringConfig;

/// Largest integration step; keeps stiff springs stable on slow frames.
const MAX_STEP_SECS: f32 = 0.004;
/// Frame gaps longer than this are treated as a stall, not as simulated time.
const MAX_FRAME_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpringStatus {
    Moving(f32),
    AtRest,
}

/// Damped spring pulling a position back to 0.
#[derive(Debug, Clone)]
pub struct SpringAnimation {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    last_tick: Instant,
}

impl SpringAnimation {
    pub fn start(config: SpringConfig, position: f32, now: Instant) -> Self {
        Self {
            config,
            position,
            velocity: 0.0,
            last_tick: now,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Integrates up to `now` and reports where the spring is.
    ///
    /// Once both distance and speed fall under the rest thresholds the position is
    /// snapped to exactly 0.
    pub fn advance(&mut self, now: Instant) -> SpringStatus {
        let elapsed = now
            .saturating_duration_since(self.last_tick)
            .min(MAX_FRAME_GAP);
        self.last_tick = now;

        let mut remaining = elapsed.as_secs_f32();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP_SECS);
            self.step(step);
            remaining -= step;
        }

        if self.is_settled() {
            self.position = 0.0;
            self.velocity = 0.0;
            SpringStatus::AtRest
        } else {
            SpringStatus::Moving(self.position)
        }
    }

    fn step(&mut self, dt: f32) {
        let spring_force = -self.config.stiffness * self.position;
        let damping_force = -self.config.damping * self.velocity;
        let acceleration = (spring_force + damping_force) / self.config.mass;

        // Semi-implicit Euler: velocity first, then position from the new velocity.
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    fn is_settled(&self) -> bool {
        self.position.abs() <= self.config.rest_delta
            && self.velocity.abs() <= self.config.rest_speed
    }
}
