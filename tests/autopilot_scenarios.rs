use std::sync::Arc;

use race_autopilot::autopilot::{
    Autopilot, AutopilotConfig, Command, Route, Vec3, VehicleSample, Waypoint,
};

const DT: f32 = 0.02;

fn square() -> Arc<Route> {
    Arc::new(Route::new(vec![
        Waypoint::at(0.0, 0.0, 0.0),
        Waypoint::at(0.0, 0.0, -60.0),
        Waypoint::at(60.0, 0.0, -60.0),
        Waypoint::at(60.0, 0.0, 0.0),
    ]))
}

fn long_straight() -> Arc<Route> {
    Arc::new(Route::new(vec![
        Waypoint::at(0.0, 0.0, -200.0),
        Waypoint::at(0.0, 0.0, -400.0),
    ]))
}

fn no_delay() -> AutopilotConfig {
    AutopilotConfig { start_delay: 0.0, ..AutopilotConfig::default() }
}

/// Car facing -Z at `position`, moving forward at `speed`.
fn sample(position: Vec3, speed: f32) -> VehicleSample {
    VehicleSample {
        position,
        forward: Vec3::new(0.0, 0.0, -1.0),
        velocity: Vec3::new(0.0, 0.0, -speed),
        steering_range: 30.0,
    }
}

#[test]
fn standing_start_on_square_goes_straight_at_full_throttle() {
    let mut ap = Autopilot::new("a", no_delay(), square());
    let cmd = ap.step(&sample(Vec3::zeros(), 0.0), DT);

    assert_eq!(ap.state().active_waypoint, 1);
    assert!(cmd.horizontal.abs() < 1e-6);
    assert_eq!(cmd.vertical, ap.config().throttle_strength);
}

#[test]
fn double_target_speed_lifts_gently() {
    let mut ap = Autopilot::new("b", no_delay(), long_straight());
    let cmd = ap.step(&sample(Vec3::zeros(), 30.0), DT);

    assert!(cmd.vertical < 0.0);
    assert!(cmd.vertical >= -0.2);
}

#[test]
fn in_band_speed_coasts_every_tick() {
    let mut ap = Autopilot::new("band", no_delay(), long_straight());
    for speed in [13.6_f32, 15.0, 16.4] {
        for _ in 0..50 {
            let cmd = ap.step(&sample(Vec3::zeros(), speed), DT);
            assert_eq!(cmd.vertical, 0.0, "speed {speed}");
        }
    }
}

#[test]
fn stuck_transition_happens_on_tick_150() {
    let mut ap = Autopilot::new("c", no_delay(), square());
    let pos = Vec3::new(0.0, 0.0, -30.0);

    for tick in 1..=149 {
        let cmd = ap.step(&sample(pos, 0.5), DT);
        assert!(!ap.is_recovering(), "recovering early on tick {tick}");
        assert!(cmd.vertical > 0.0);
    }

    let cmd = ap.step(&sample(pos, 0.5), DT);
    assert!(ap.is_recovering());
    assert_eq!(cmd.vertical, -1.0);
}

#[test]
fn reverse_runs_exactly_reverse_time_then_drives_again() {
    let mut ap = Autopilot::new("r", no_delay(), square());
    let pos = Vec3::new(0.0, 0.0, -30.0);

    while !ap.is_recovering() {
        ap.step(&sample(pos, 0.0), DT);
    }
    // the transition tick already produced the first reverse command
    let mut reverse_ticks = 1;
    loop {
        let cmd = ap.step(&sample(pos, 0.0), DT);
        if cmd.vertical != -1.0 {
            // normal control straight away; the stuck timer kept running
            // through the reversal (125 ticks) plus this tick
            assert_eq!(cmd.vertical, 1.0);
            assert!(!ap.is_recovering());
            assert!((ap.state().stuck_timer - 2.5).abs() < 1e-3, "{}", ap.state().stuck_timer);
            break;
        }
        assert!(cmd.horizontal.abs() <= 0.5);
        reverse_ticks += 1;
        assert!(reverse_ticks <= 125, "reversal overran");
    }
    assert_eq!(reverse_ticks, 125);
}

#[test]
fn pinned_car_reverses_again_half_a_second_after_resuming() {
    let mut ap = Autopilot::new("pinned", no_delay(), square());
    let pos = Vec3::new(0.0, 0.0, -30.0);

    let mut entries = Vec::new();
    let mut was_recovering = false;
    for tick in 1..=400 {
        ap.step(&sample(pos, 0.0), DT);
        if ap.is_recovering() && !was_recovering {
            entries.push(tick);
        }
        was_recovering = ap.is_recovering();
    }
    assert_eq!(entries, vec![150, 300]);
}

#[test]
fn start_delay_holds_neutral_until_five_seconds() {
    let cfg = AutopilotConfig { start_delay: 5.0, ..AutopilotConfig::default() };
    let mut ap = Autopilot::new("d", cfg, square());
    let dt = 0.01;

    for _ in 1..=499 {
        assert_eq!(ap.step(&sample(Vec3::zeros(), 0.0), dt), Command::NEUTRAL);
        assert!(!ap.race_started());
    }
    ap.step(&sample(Vec3::zeros(), 0.0), dt); // 5.00 s
    let cmd = ap.step(&sample(Vec3::zeros(), 0.0), dt); // 5.01 s
    assert!(ap.race_started());
    assert_eq!(cmd.vertical, 1.0);
}

#[test]
fn stuck_timer_starts_with_the_race() {
    let cfg = AutopilotConfig { start_delay: 5.0, ..AutopilotConfig::default() };
    let mut ap = Autopilot::new("grid", cfg, square());
    for _ in 0..249 {
        ap.step(&sample(Vec3::zeros(), 0.0), DT);
    }
    assert!(!ap.race_started());
    assert_eq!(ap.state().stuck_timer, 0.0);

    // gate opens on tick 250 and the stuck check runs on that same tick
    ap.step(&sample(Vec3::zeros(), 0.0), DT);
    assert!(ap.race_started());
    assert_eq!(ap.state().stuck_timer, DT);
    assert!(!ap.is_recovering());
}

#[test]
fn steering_stays_in_range_for_every_heading() {
    let route = Arc::new(Route::new(vec![
        Waypoint::at(0.0, 0.0, -100.0),
        Waypoint::at(0.0, 0.0, -200.0),
    ]));
    for deg in (0..360).step_by(5) {
        let mut ap = Autopilot::new("h", no_delay(), Arc::clone(&route));
        let yaw = (deg as f32).to_radians();
        let s = VehicleSample {
            position: Vec3::zeros(),
            forward: Vec3::new(-yaw.sin(), 0.0, -yaw.cos()),
            velocity: Vec3::zeros(),
            steering_range: 30.0,
        };
        for _ in 0..100 {
            let cmd = ap.step(&s, DT);
            assert!((-1.0..=1.0).contains(&cmd.horizontal), "heading {deg}");
        }
    }
}

#[test]
fn waypoint_on_the_left_steers_positive() {
    let route = Arc::new(Route::new(vec![
        Waypoint::at(-50.0, 0.0, -50.0),
        Waypoint::at(-100.0, 0.0, -100.0),
    ]));
    let mut ap = Autopilot::new("l", no_delay(), route);
    let cmd = ap.step(&sample(Vec3::zeros(), 5.0), DT);
    assert!(cmd.horizontal > 0.0);
}

#[test]
fn reach_radius_boundary_does_not_advance() {
    let mut ap = Autopilot::new("t", no_delay(), square());
    for _ in 0..10 {
        ap.step(&sample(Vec3::new(0.0, 0.0, 5.0), 5.0), DT);
    }
    assert_eq!(ap.state().active_waypoint, 0);
}

#[test]
fn active_index_cycles_back_to_zero() {
    let route = square();
    let mut ap = Autopilot::new("loop", no_delay(), Arc::clone(&route));
    let mut seen = Vec::new();

    for lap in 0..2 {
        for wp in route.waypoints() {
            ap.step(&sample(wp.pos(), 10.0), DT);
            let idx = ap.state().active_waypoint;
            assert!(idx < route.len(), "lap {lap}");
            seen.push(idx);
        }
    }
    assert_eq!(&seen[..4], &[1, 2, 3, 0]);
    assert_eq!(seen[..4], seen[4..]);
}
