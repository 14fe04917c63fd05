//! Core shared types for `autopilot` (engine-agnostic).
// autopilot/types.rs
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f32>;

/// Planar vectors shorter than this are treated as "no direction".
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// Slack for accumulated fixed-step timers (0.02 summed 150 times is not 3.0).
pub const TIMER_EPSILON: f32 = 1e-4;

#[inline]
pub fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Drop the vertical component and normalize. `None` for degenerate input.
#[inline]
pub fn planar(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    let len = flat.magnitude();
    if len > DIRECTION_EPSILON && len.is_finite() {
        Some(flat / len)
    } else {
        None
    }
}

/// Signed angle in degrees from `from` to `to` around world up, right-handed
/// (counter-clockwise seen from above is positive). Range (-180, 180].
pub fn signed_angle_deg(from: Vec3, to: Vec3) -> f32 {
    let cross = from.cross(&to).dot(&up());
    let dot = from.dot(&to);
    let deg = cross.atan2(dot).to_degrees();
    if deg <= -180.0 { deg + 360.0 } else { deg }
}

/// Unsigned angle in degrees between two directions, 0..=180.
pub fn unsigned_angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = a.magnitude() * b.magnitude();
    if denom <= DIRECTION_EPSILON {
        return 0.0;
    }
    (a.dot(&b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    clamp01((v - a) / (b - a))
}

// ============================================
// ----- command surface ----------------------
// ============================================

/// The only thing a driver hands to the drivetrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub vertical: f32,   // -1..1 (throttle > 0, brake / reverse < 0)
    pub horizontal: f32, // -1..1 (positive = yaw counter-clockwise)
}

impl Command {
    pub const NEUTRAL: Command = Command { vertical: 0.0, horizontal: 0.0 };

    pub fn new(vertical: f32, horizontal: f32) -> Self {
        Self {
            vertical: vertical.clamp(-1.0, 1.0),
            horizontal: horizontal.clamp(-1.0, 1.0),
        }
    }
}

// ============================================
// ----- per-tick readback --------------------
// ============================================

/// What the physics side reports back to a driver every tick.
#[derive(Debug, Clone, Copy)]
pub struct VehicleSample {
    pub position: Vec3,
    pub forward: Vec3,  // chassis forward, world space
    pub velocity: Vec3, // linear velocity, world space
    pub steering_range: f32, // degrees, from the drivetrain
}

impl VehicleSample {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }

    #[inline]
    pub fn forward_speed(&self) -> f32 {
        self.forward.dot(&self.velocity)
    }
}

// ============================================
// ----- navigation state ---------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    Normal,
    Reversing { elapsed: f32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StartGate {
    pub elapsed: f32,
    pub started: bool,
}

/// Everything one agent carries from tick to tick.
#[derive(Debug, Clone, Copy)]
pub struct NavigationState {
    pub active_waypoint: usize,
    pub steer: f32, // smoothed, persisted
    pub stuck_timer: f32,
    pub mode: DriveMode,
    pub gate: StartGate,
    pub last_command: Command,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active_waypoint: 0,
            steer: 0.0,
            stuck_timer: 0.0,
            mode: DriveMode::Normal,
            gate: StartGate::default(),
            last_command: Command::NEUTRAL,
        }
    }
}

impl NavigationState {
    pub fn is_reversing(&self) -> bool {
        matches!(self.mode, DriveMode::Reversing { .. })
    }
}
