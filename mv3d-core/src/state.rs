//! Per-frame animation state.

/// The only mutable state of the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Model rotation about the vertical axis, in radians.
    pub rotation_angle: f64,
    /// Clock reading of the previous tick, in seconds.
    pub last_tick_time: f64,
}

impl RenderState {
    pub fn new(now: f64) -> Self {
        Self {
            rotation_angle: 0.0,
            last_tick_time: now,
        }
    }

    /// Advances the rotation by the time elapsed since the previous tick and returns the new
    /// angle. `speed` is in radians per second.
    pub fn advance(&mut self, now: f64, speed: f64) -> f64 {
        let elapsed = now - self.last_tick_time;
        self.last_tick_time = now;
        self.rotation_angle += elapsed * speed;
        self.rotation_angle
    }
}
