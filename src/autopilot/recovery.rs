// ==============================================================================
// recovery.rs — STUCK DETECTION + REVERSE-AND-WIGGLE
// ------------------------------------------------------------------------------
// Two states: Normal, Reversing { elapsed }.
//
// Normal -> Reversing:
//   stuck_timer accumulates dt while speed < stuck_speed_threshold and snaps to
//   0 as soon as speed rises above it, in both states. Transition on the first
//   Normal tick where stuck_timer >= stuck_time_threshold; entering Reversing
//   zeroes it.
//
// Reversing:
//   vertical = -1, horizontal = sin(elapsed * 3) * 0.5. Always runs the full
//   reverse_time, then hands back to Normal; normal control resumes next tick.
// ==============================================================================

use tracing::debug;

use crate::autopilot::tuning::AutopilotConfig;
use crate::autopilot::types::{Command, DriveMode, NavigationState, TIMER_EPSILON};

pub const WIGGLE_FREQUENCY: f32 = 3.0; // rad/s
pub const WIGGLE_AMPLITUDE: f32 = 0.5;

/// Updates the stuck timer and flips into Reversing when it runs out.
/// The timer keeps running during a reversal; only the transition waits for
/// Normal mode. Returns true on the tick the transition happens.
pub fn check_stuck(state: &mut NavigationState, cfg: &AutopilotConfig, speed: f32, dt: f32) -> bool {
    if speed >= cfg.stuck_speed_threshold {
        state.stuck_timer = 0.0;
        return false;
    }

    state.stuck_timer += dt;
    if state.is_reversing() || state.stuck_timer + TIMER_EPSILON < cfg.stuck_time_threshold {
        return false;
    }

    debug!(stuck_for = state.stuck_timer, "stuck, reversing");
    state.mode = DriveMode::Reversing { elapsed: 0.0 };
    state.stuck_timer = 0.0;
    true
}

/// One tick of the reverse manoeuvre. Call only while Reversing.
pub fn reverse_step(state: &mut NavigationState, cfg: &AutopilotConfig, dt: f32) -> Command {
    let DriveMode::Reversing { elapsed } = state.mode else {
        return Command::NEUTRAL;
    };

    let elapsed = elapsed + dt;
    let wiggle = (elapsed * WIGGLE_FREQUENCY).sin() * WIGGLE_AMPLITUDE;

    state.mode = if elapsed + TIMER_EPSILON >= cfg.reverse_time {
        debug!(reversed_for = elapsed, "recovery finished");
        DriveMode::Normal
    } else {
        DriveMode::Reversing { elapsed }
    };

    Command::new(-1.0, wiggle)
}
