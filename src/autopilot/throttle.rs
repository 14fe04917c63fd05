// ==============================================================================
// throttle.rs — CORNER-AWARE THROTTLE POLICY
// ==============================================================================
// Looks one waypoint ahead:
//
//   severity  = angle( agent -> active , active -> next )        0..180 deg
//   proximity = 1 - clamp01( distance_to_active / lookahead )    0 far, 1 at corner
//   tier      = 0.5 (> sharp) | 0.7 (> moderate) | 1.0            no interpolation
//   target    = lerp( base, base * tier, proximity )
//
// Decision with a +/-10% hysteresis band:
//   speed > 1.1 * target -> lift: -0.2 * clamp01((speed - target) / base)
//   speed < 0.9 * target -> throttle_strength
//   otherwise            -> 0 (coast)
//
// `base` is the configured target speed, scaled by the active waypoint's brake
// zone multiplier when it has one.
// ==============================================================================

use crate::autopilot::tuning::AutopilotConfig;
use crate::autopilot::types::{Vec3, clamp01, lerp, planar, unsigned_angle_deg};

pub const SHARP_TIER: f32 = 0.5;
pub const MODERATE_TIER: f32 = 0.7;

pub const BAND_HIGH: f32 = 1.1;
pub const BAND_LOW: f32 = 0.9;

/// Strongest lift-off the policy ever asks for.
pub const MAX_LIFT: f32 = -0.2;

/// Everything the throttle decision was based on, kept for telemetry/tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerOutlook {
    pub severity_deg: f32,
    pub proximity: f32,
    pub tier: f32,
    pub target_speed: f32,
}

/// Unsigned angle between the approach heading and the exit heading.
/// Degenerate legs (agent on the waypoint, duplicated waypoints) count as straight.
pub fn corner_severity(position: Vec3, active: Vec3, next: Vec3) -> f32 {
    match (planar(active - position), planar(next - active)) {
        (Some(approach), Some(exit)) => unsigned_angle_deg(approach, exit),
        _ => 0.0,
    }
}

pub fn severity_tier(cfg: &AutopilotConfig, severity_deg: f32) -> f32 {
    if severity_deg > cfg.sharp_corner_angle {
        SHARP_TIER
    } else if severity_deg > cfg.moderate_corner_angle {
        MODERATE_TIER
    } else {
        1.0
    }
}

pub fn corner_outlook(
    cfg: &AutopilotConfig,
    base_speed: f32,
    distance_to_active: f32,
    severity_deg: f32,
) -> CornerOutlook {
    let proximity = 1.0 - clamp01(distance_to_active / cfg.corner_lookahead);
    let tier = severity_tier(cfg, severity_deg);
    let target_speed = base_speed * lerp(1.0, tier, proximity);

    CornerOutlook { severity_deg, proximity, tier, target_speed }
}

/// Throttle command for the current speed against a corner-adjusted target.
pub fn throttle_command(cfg: &AutopilotConfig, base_speed: f32, speed: f32, target: f32) -> f32 {
    if speed > target * BAND_HIGH {
        let overshoot = if base_speed > f32::EPSILON {
            (speed - target) / base_speed
        } else {
            1.0
        };
        lerp(0.0, MAX_LIFT, overshoot)
    } else if speed < target * BAND_LOW {
        cfg.throttle_strength
    } else {
        0.0 // sweet spot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AutopilotConfig {
        AutopilotConfig::default()
    }

    #[test]
    fn straight_line_has_no_severity() {
        let s = corner_severity(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -50.0),
            Vec3::new(0.0, 0.0, -100.0),
        );
        assert!(s < 1e-3);
    }

    #[test]
    fn right_angle_is_sharp() {
        let s = corner_severity(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -50.0),
            Vec3::new(50.0, 0.0, -50.0),
        );
        assert!((s - 90.0).abs() < 1e-3);
        assert_eq!(severity_tier(&cfg(), s), SHARP_TIER);
    }

    #[test]
    fn tiers_are_discrete() {
        let c = cfg();
        assert_eq!(severity_tier(&c, 25.0), 1.0);
        assert_eq!(severity_tier(&c, 25.1), MODERATE_TIER);
        assert_eq!(severity_tier(&c, 45.0), MODERATE_TIER);
        assert_eq!(severity_tier(&c, 45.1), SHARP_TIER);
    }

    #[test]
    fn target_blends_with_proximity() {
        let c = cfg();
        let far = corner_outlook(&c, 15.0, 40.0, 90.0);
        assert_eq!(far.proximity, 0.0);
        assert_eq!(far.target_speed, 15.0);

        let mid = corner_outlook(&c, 15.0, 10.0, 90.0);
        assert!((mid.proximity - 0.5).abs() < 1e-6);
        assert!((mid.target_speed - 11.25).abs() < 1e-4);

        let at = corner_outlook(&c, 15.0, 0.0, 90.0);
        assert!((at.target_speed - 7.5).abs() < 1e-4);
    }

    #[test]
    fn below_band_is_full_throttle() {
        let c = AutopilotConfig { throttle_strength: 0.8, ..cfg() };
        assert_eq!(throttle_command(&c, 15.0, 0.0, 15.0), 0.8);
    }

    #[test]
    fn band_is_coast() {
        let c = cfg();
        for speed in [13.6_f32, 14.0, 15.0, 16.0, 16.4] {
            assert_eq!(throttle_command(&c, 15.0, speed, 15.0), 0.0, "speed {speed}");
        }
    }

    #[test]
    fn overshoot_lifts_gently() {
        let c = cfg();
        let lift = throttle_command(&c, 15.0, 18.0, 15.0);
        assert!((lift - (-0.2 * 0.2)).abs() < 1e-6);
        let huge = throttle_command(&c, 15.0, 100.0, 15.0);
        assert_eq!(huge, MAX_LIFT);
    }
}
