use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::physics::PhysicsWorld;
use crate::vehicle::{PilotKind, Vehicle};

#[derive(Debug, Clone, Serialize)]
pub struct VehicleTelemetry {
    pub id: String,
    pub kind: PilotKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub speed: f32,    // m/s
    pub throttle: f32, // last vertical command
    pub steer: f32,    // last horizontal command
    pub is_recovering: bool,
    pub is_overtaking: bool,
    pub race_started: bool,
    pub active_waypoint: Option<usize>,
    pub hard_brake: bool,
    pub disabled: bool,
}

impl VehicleTelemetry {
    pub fn read(world: &PhysicsWorld, vehicle: &Vehicle) -> Self {
        let sample = world.sample(vehicle);
        let position = sample.map(|s| s.position).unwrap_or(vehicle.spawn_position);

        Self {
            id: vehicle.id.clone(),
            kind: vehicle.pilot.kind(),
            x: position.x,
            y: position.y,
            z: position.z,
            speed: sample.map_or(0.0, |s| s.speed()),
            throttle: vehicle.last_command.vertical,
            steer: vehicle.last_command.horizontal,
            is_recovering: vehicle.is_recovering(),
            is_overtaking: vehicle.is_overtaking(),
            race_started: vehicle.race_started(),
            active_waypoint: vehicle.active_waypoint(),
            hard_brake: vehicle.drivetrain.hard_brake_engaged(),
            disabled: vehicle.disabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub kind: &'static str, // always "snapshot"
    pub tick: u64,
    pub vehicles: Vec<VehicleTelemetry>,
}

impl Snapshot {
    pub fn capture(tick: u64, world: &PhysicsWorld) -> Self {
        Self {
            kind: "snapshot",
            tick,
            vehicles: world.vehicles().map(|v| VehicleTelemetry::read(world, v)).collect(),
        }
    }
}

pub struct SharedSimState {
    pub tick: u64,
    pub clients: Vec<UnboundedSender<String>>,
    pub human_id: Option<String>, // vehicle that network input drives
}

impl SharedSimState {
    pub fn new(human_id: Option<String>) -> Self {
        Self {
            tick: 0,
            clients: Vec::new(),
            human_id,
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) {
        self.clients.push(tx);
        debug!(clients = self.clients.len(), "client registered");
    }

    /// Build and send a snapshot of every vehicle to all clients. Clients whose
    /// channel has closed are dropped.
    pub fn broadcast_snapshot(&mut self, world: &PhysicsWorld) {
        if self.clients.is_empty() {
            return;
        }

        let json = match serde_json::to_string(&Snapshot::capture(self.tick, world)) {
            Ok(json) => json,
            Err(e) => {
                warn!(tick = self.tick, "snapshot not serializable: {e}");
                return;
            }
        };

        self.clients.retain(|tx| tx.send(json.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autopilot::{Autopilot, AutopilotConfig, Route, Vec3, Waypoint};
    use crate::drivetrain::DrivetrainConfig;
    use crate::vehicle::Pilot;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn world_with_bot() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        let route = Arc::new(Route::new(vec![
            Waypoint::at(0.0, 0.0, 0.0),
            Waypoint::at(0.0, 0.0, -50.0),
        ]));
        world.spawn_vehicle(
            "orange".into(),
            DrivetrainConfig::default(),
            Pilot::Autopilot(Autopilot::new("orange", AutopilotConfig::default(), route)),
            Vec3::zeros(),
            0.0,
        );
        world
    }

    #[test]
    fn snapshot_reports_autopilot_flags() {
        let mut world = world_with_bot();
        world.step(0.02);

        let snap = Snapshot::capture(1, &world);
        let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["type"], "snapshot");
        let car = &json["vehicles"][0];
        assert_eq!(car["id"], "orange");
        assert_eq!(car["kind"], "autopilot");
        assert_eq!(car["is_overtaking"], false);
        assert_eq!(car["race_started"], false); // 5 s start delay
        assert_eq!(car["throttle"], 0.0);
    }

    #[test]
    fn closed_clients_are_dropped() {
        let world = world_with_bot();
        let mut state = SharedSimState::new(None);

        let (tx_open, mut rx_open) = mpsc::unbounded_channel();
        let (tx_closed, rx_closed) = mpsc::unbounded_channel();
        drop(rx_closed);
        state.register_client(tx_open);
        state.register_client(tx_closed);

        state.broadcast_snapshot(&world);
        assert_eq!(state.clients.len(), 1);
        assert!(rx_open.try_recv().unwrap().contains("\"orange\""));
    }
}
