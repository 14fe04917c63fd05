// autopilot/start_gate.rs
use crate::autopilot::types::{StartGate, TIMER_EPSILON};

/// Advances the warm-up clock. Returns true once the race is on; the tick that
/// crosses the delay already counts as started.
pub fn update(gate: &mut StartGate, start_delay: f32, dt: f32) -> bool {
    if gate.started {
        return true;
    }
    gate.elapsed += dt;
    if gate.elapsed + TIMER_EPSILON >= start_delay {
        gate.started = true;
    }
    gate.started
}
