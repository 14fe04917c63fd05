use std::sync::Arc;

use race_autopilot::autopilot::{Autopilot, AutopilotConfig, Route, Vec3, Waypoint};
use race_autopilot::config::WallConfig;
use race_autopilot::drivetrain::DrivetrainConfig;
use race_autopilot::physics::{PhysicsWorld, yaw_facing};
use race_autopilot::vehicle::Pilot;

const DT: f32 = 0.02;

fn square() -> Arc<Route> {
    Arc::new(Route::new(vec![
        Waypoint::at(0.0, 0.0, 0.0),
        Waypoint::at(0.0, 0.0, -60.0),
        Waypoint::at(60.0, 0.0, -60.0),
        Waypoint::at(60.0, 0.0, 0.0),
    ]))
}

fn spawn_bot(world: &mut PhysicsWorld, id: &str, route: Arc<Route>) {
    let cfg = AutopilotConfig { start_delay: 0.0, ..AutopilotConfig::default() };
    world.spawn_vehicle(
        id.into(),
        DrivetrainConfig::default(),
        Pilot::Autopilot(Autopilot::new(id, cfg, route)),
        Vec3::zeros(),
        yaw_facing(Vec3::new(0.0, 0.0, -1.0)),
    );
}

#[test]
fn autopilot_drives_the_first_leg() {
    let mut world = PhysicsWorld::new();
    spawn_bot(&mut world, "orange", square());

    let mut top_speed = 0.0_f32;
    for _ in 0..500 {
        world.step(DT);
        let car = world.vehicle("orange").unwrap();
        top_speed = top_speed.max(world.sample(car).unwrap().speed());
    }

    let car = world.vehicle("orange").unwrap();
    assert!(!car.disabled);
    let idx = car.active_waypoint().unwrap();
    assert!(idx >= 2, "still heading for waypoint {idx}");
    assert!(top_speed > 8.0 && top_speed < 25.0, "top speed {top_speed}");
}

#[test]
fn wall_ahead_triggers_recovery() {
    let mut world = PhysicsWorld::new();
    world.add_wall(&WallConfig {
        center: [0.0, 1.0, -15.0],
        half_extents: [10.0, 1.0, 0.5],
        yaw_deg: 0.0,
    });
    spawn_bot(&mut world, "stuck", square());

    let mut saw_recovery = false;
    let mut z_at_recovery = None;
    for _ in 0..500 {
        world.step(DT);
        let car = world.vehicle("stuck").unwrap();
        if car.is_recovering() && !saw_recovery {
            saw_recovery = true;
            z_at_recovery = Some(world.sample(car).unwrap().position.z);
        }
    }

    assert!(saw_recovery);
    // never went through the wall
    let z = z_at_recovery.unwrap();
    assert!(z > -14.5, "z {z}");
}
