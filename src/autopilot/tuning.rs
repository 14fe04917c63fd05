// autopilot/tuning.rs
use serde::{Deserialize, Serialize};

/// Static per-agent tunables. Set before the race, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    // --- waypoints ---
    pub waypoint_reach_distance: f32, // m

    // --- driving ---
    pub target_speed: f32,      // m/s
    pub steering_power: f32,    // gain on normalized heading error
    pub braking_distance: f32,  // m, accepted for compatibility; unused by the policy
    pub throttle_strength: f32, // 0..1

    // --- corner detection ---
    pub corner_lookahead: f32,      // m
    pub sharp_corner_angle: f32,    // deg
    pub moderate_corner_angle: f32, // deg

    // --- stuck recovery ---
    pub stuck_speed_threshold: f32, // m/s
    pub stuck_time_threshold: f32,  // s
    pub reverse_time: f32,          // s

    // --- race start ---
    pub start_delay: f32, // s
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            waypoint_reach_distance: 5.0,
            target_speed: 15.0,
            steering_power: 1.5,
            braking_distance: 10.0,
            throttle_strength: 1.0,
            corner_lookahead: 20.0,
            sharp_corner_angle: 45.0,
            moderate_corner_angle: 25.0,
            stuck_speed_threshold: 1.0,
            stuck_time_threshold: 3.0,
            reverse_time: 2.5,
            start_delay: 5.0,
        }
    }
}

impl AutopilotConfig {
    /// Returns a description of the first bad field, if any.
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("waypoint_reach_distance", self.waypoint_reach_distance),
            ("target_speed", self.target_speed),
            ("corner_lookahead", self.corner_lookahead),
            ("reverse_time", self.reverse_time),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be > 0 (got {value})"));
            }
        }

        let non_negative = [
            ("steering_power", self.steering_power),
            ("braking_distance", self.braking_distance),
            ("stuck_speed_threshold", self.stuck_speed_threshold),
            ("stuck_time_threshold", self.stuck_time_threshold),
            ("start_delay", self.start_delay),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{name} must be >= 0 (got {value})"));
            }
        }

        if !(0.0..=1.0).contains(&self.throttle_strength) {
            return Err(format!(
                "throttle_strength must be in [0, 1] (got {})",
                self.throttle_strength
            ));
        }
        if self.moderate_corner_angle > self.sharp_corner_angle {
            return Err(format!(
                "moderate_corner_angle ({}) > sharp_corner_angle ({})",
                self.moderate_corner_angle, self.sharp_corner_angle
            ));
        }
        Ok(())
    }
}
