use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;

use crate::autopilot::{Autopilot, Command, Vec3, VehicleSample};
use crate::drivetrain::Drivetrain;

/// Latest axes received from a human client.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HumanInput {
    pub command: Command,
    pub handbrake: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PilotKind {
    Autopilot,
    Human,
}

/// Who produces the command each tick. Both feed the same drivetrain.
pub enum Pilot {
    Autopilot(Autopilot),
    Human(HumanInput),
}

impl Pilot {
    pub fn kind(&self) -> PilotKind {
        match self {
            Pilot::Autopilot(_) => PilotKind::Autopilot,
            Pilot::Human(_) => PilotKind::Human,
        }
    }

    pub fn autopilot(&self) -> Option<&Autopilot> {
        match self {
            Pilot::Autopilot(ap) => Some(ap),
            Pilot::Human(_) => None,
        }
    }

    fn decide(&mut self, sample: &VehicleSample, dt: f32) -> Command {
        match self {
            Pilot::Autopilot(ap) => ap.step(sample, dt),
            Pilot::Human(input) => input.command,
        }
    }

    fn hard_brake(&self) -> bool {
        match self {
            Pilot::Autopilot(_) => false,
            Pilot::Human(input) => input.handbrake,
        }
    }
}

pub struct Vehicle {
    pub id: String,
    pub body: RigidBodyHandle,      // the chassis body
    pub drivetrain: Drivetrain,     // command -> wheel actuation
    pub pilot: Pilot,               // autopilot or human
    pub spawn_position: Vec3,       // reset target for runaway bodies
    pub spawn_yaw: f32,             // rad
    pub last_command: Command,
    pub last_sample: Option<VehicleSample>,
    pub disabled: bool,             // set once a collaborator went missing
}

impl Vehicle {
    pub fn new(id: String, body: RigidBodyHandle, drivetrain: Drivetrain, pilot: Pilot) -> Self {
        Self {
            id,
            body,
            drivetrain,
            pilot,
            spawn_position: Vec3::zeros(),
            spawn_yaw: 0.0,
            last_command: Command::NEUTRAL,
            last_sample: None,
            disabled: false,
        }
    }

    /// One control tick: pilot decides, drivetrain turns it into wheel actuation.
    pub fn drive(&mut self, sample: VehicleSample, dt: f32) -> Command {
        let command = self.pilot.decide(&sample, dt);
        self.drivetrain.set_hard_brake(self.pilot.hard_brake());
        self.drivetrain.apply(command, sample.forward_speed());
        self.last_command = command;
        self.last_sample = Some(sample);
        command
    }

    pub fn is_recovering(&self) -> bool {
        self.pilot.autopilot().is_some_and(Autopilot::is_recovering)
    }

    pub fn is_overtaking(&self) -> bool {
        self.pilot.autopilot().is_some_and(Autopilot::is_overtaking)
    }

    pub fn race_started(&self) -> bool {
        self.pilot.autopilot().map_or(true, Autopilot::race_started)
    }

    pub fn active_waypoint(&self) -> Option<usize> {
        self.pilot.autopilot().map(|ap| ap.state().active_waypoint)
    }
}
