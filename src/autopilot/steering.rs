// ==============================================================================
// steering.rs — WAYPOINT STEERING POLICY
// ==============================================================================
// Responsibilities:
// - Heading error between chassis forward and the active waypoint (planar)
// - Dead-band around zero so the car does not chatter on a straight
// - Normalize against the drivetrain steering range, apply steering power
// - Exponential smoothing into the persisted steer value
// ------------------------------------------------------------------------------
//   target = clamp( clamp(angle / range, -1, 1) * power, -1, 1 )
//   steer += (target - steer) * min(1, dt * SMOOTHING_RATE)
//
// Sign: positive angle / positive output = yaw counter-clockwise (seen from
// above, right-handed around +Y). The drivetrain uses the same convention.
// ==============================================================================

use crate::autopilot::types::{Vec3, planar, signed_angle_deg};

/// Heading errors inside +/- this many degrees count as zero.
pub const DEAD_BAND_DEG: f32 = 5.0;

/// 1/s
pub const SMOOTHING_RATE: f32 = 5.0;

/// Raw (unsmoothed) steer target in [-1, 1].
///
/// Degenerate vectors (target on top of the car, car pointing straight up)
/// give 0: no correction this tick.
pub fn target_steer(forward: Vec3, to_target: Vec3, steering_range_deg: f32, power: f32) -> f32 {
    let (Some(fwd), Some(dir)) = (planar(forward), planar(to_target)) else {
        return 0.0;
    };

    let mut angle = signed_angle_deg(fwd, dir);
    if angle.abs() < DEAD_BAND_DEG {
        angle = 0.0;
    }

    if steering_range_deg <= f32::EPSILON {
        return 0.0;
    }

    let normalized = (angle / steering_range_deg).clamp(-1.0, 1.0);
    (normalized * power).clamp(-1.0, 1.0)
}

/// Exponential approach toward `target`. Result is clamped to [-1, 1].
pub fn smooth(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    let alpha = (dt * rate).clamp(0.0, 1.0);
    (current + (target - current) * alpha).clamp(-1.0, 1.0)
}

/// One tick of the steering policy; updates `steer` in place and returns it.
pub fn update_steering(
    steer: &mut f32,
    forward: Vec3,
    to_target: Vec3,
    steering_range_deg: f32,
    power: f32,
    dt: f32,
) -> f32 {
    let target = target_steer(forward, to_target, steering_range_deg, power);
    *steer = smooth(*steer, target, dt, SMOOTHING_RATE);
    *steer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fwd() -> Vec3 {
        Vec3::new(0.0, 0.0, -1.0)
    }

    #[test]
    fn dead_band_zeroes_small_errors() {
        // ~4 degrees to the left
        let dir = Vec3::new(-0.07, 0.0, -1.0);
        assert_eq!(target_steer(fwd(), dir, 30.0, 1.5), 0.0);
    }

    #[test]
    fn sign_follows_side_of_target() {
        let left = Vec3::new(-1.0, 0.0, -1.0);
        let right = Vec3::new(1.0, 0.0, -1.0);
        assert!(target_steer(fwd(), left, 30.0, 1.0) > 0.0);
        assert!(target_steer(fwd(), right, 30.0, 1.0) < 0.0);
    }

    #[test]
    fn gain_never_escapes_unit_range() {
        for i in 0..360 {
            let a = (i as f32).to_radians();
            let dir = Vec3::new(a.sin(), 0.0, -a.cos());
            let t = target_steer(fwd(), dir, 30.0, 4.0);
            assert!((-1.0..=1.0).contains(&t), "angle {i}: {t}");
        }
    }

    #[test]
    fn smoothing_converges_without_overshoot() {
        let mut steer = 0.0;
        let mut prev = 0.0;
        for _ in 0..200 {
            steer = smooth(steer, 0.8, 0.02, SMOOTHING_RATE);
            assert!(steer >= prev && steer <= 0.8 + 1e-6);
            prev = steer;
        }
        assert!((steer - 0.8).abs() < 1e-3);
    }

    #[test]
    fn large_dt_snaps_to_target() {
        assert_eq!(smooth(-1.0, 0.5, 1.0, SMOOTHING_RATE), 0.5);
    }

    #[test]
    fn degenerate_direction_means_no_correction() {
        assert_eq!(target_steer(fwd(), Vec3::zeros(), 30.0, 1.5), 0.0);
        assert_eq!(target_steer(Vec3::new(0.0, 1.0, 0.0), fwd(), 30.0, 1.5), 0.0);
    }

    #[test]
    fn update_persists_state() {
        let mut steer = 0.0;
        let out = update_steering(&mut steer, fwd(), Vec3::new(-1.0, 0.0, 0.0), 30.0, 1.5, 0.02);
        assert_eq!(out, steer);
        assert!((steer - 0.1).abs() < 1e-5); // (1.0 - 0) * 0.1
    }
}
