// ==============================================================================
// drivetrain.rs — COMMAND -> PER-WHEEL ACTUATION (motor / brake / steer)
// ==============================================================================
// Shared by computer-driven and human-driven cars. Consumes one Command plus the
// measured forward speed each tick and writes, per wheel:
//   - steer_angle  (deg)  steerable wheels only
//   - motor_torque (N*m)  motorized wheels only
//   - brake_torque (N*m)
//
//   speed_frac  = inverse_lerp(0, max_speed, |v_fwd|)
//   torque      = lerp(motor_torque, 0, speed_frac)       fades out at max speed
//   steer_range = lerp(range_at_rest, range_at_max, speed_frac)
//
// Vertical command beyond the dead-band:
//   sign(cmd) == sign(v_fwd) -> accelerate (motor = cmd * torque, brake = 0)
//   otherwise                -> brake      (motor = 0, brake = |cmd| * brake_torque)
// Inside the dead-band the wheels freewheel.
//
// Hard brake (handbrake) overrides everything after the regular pass:
//   motor = 0, brake = brake_torque * HARD_BRAKE_MULTIPLIER, damping raised.
// ==============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::autopilot::types::{Command, inverse_lerp, lerp};

pub const HARD_BRAKE_MULTIPLIER: f32 = 7.5;

/// Below this forward speed the car counts as standing: any vertical command
/// drives in its own direction instead of braking.
pub const STANDSTILL_SPEED: f32 = 0.05;

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }

    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// ----- configs ------------------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSpec {
    pub id: WheelId,
    pub offset: [f32; 3], // chassis local, metres (-Z is forward)
    pub radius: f32,      // m
    pub steerable: bool,
    pub motorized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub motor_torque: f32,                // N*m per motorized wheel at rest
    pub brake_torque: f32,                // N*m per wheel at full brake
    pub max_speed: f32,                   // m/s, torque reaches 0 here
    pub steering_range: f32,              // deg at rest
    pub steering_range_at_max_speed: f32, // deg
    pub centre_of_gravity_offset: f32,    // m, vertical, applied at spawn
    pub throttle_deadzone: f32,
    pub steering_deadzone: f32,
    pub linear_damping: f32,
    pub hard_brake_damping: f32,

    // --- chassis ---
    pub mass: f32,                      // kg
    pub chassis_half_extents: [f32; 3], // [hx, hy, hz] metres
    pub wheels: Vec<WheelSpec>,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        let wheel = |id: WheelId, x: f32, z: f32| WheelSpec {
            id,
            offset: [x, -0.3, z],
            radius: 0.35,
            steerable: id.is_front(),
            motorized: !id.is_front(),
        };
        Self {
            motor_torque: 2000.0,
            brake_torque: 2000.0,
            max_speed: 20.0,
            steering_range: 30.0,
            steering_range_at_max_speed: 10.0,
            centre_of_gravity_offset: -1.0,
            throttle_deadzone: 0.05,
            steering_deadzone: 0.05,
            linear_damping: 0.05,
            hard_brake_damping: 0.8,

            mass: 1500.0,
            chassis_half_extents: [0.9, 0.5, 2.1],
            wheels: vec![
                wheel(WheelId::FL, -0.8, -1.3),
                wheel(WheelId::FR, 0.8, -1.3),
                wheel(WheelId::RL, -0.8, 1.3),
                wheel(WheelId::RR, 0.8, 1.3),
            ],
        }
    }
}

impl DrivetrainConfig {
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("motor_torque", self.motor_torque),
            ("brake_torque", self.brake_torque),
            ("max_speed", self.max_speed),
            ("steering_range", self.steering_range),
            ("mass", self.mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be > 0 (got {value})"));
            }
        }
        if self.steering_range_at_max_speed < 0.0 {
            return Err("steering_range_at_max_speed must be >= 0".into());
        }
        if self.chassis_half_extents.iter().any(|h| !(*h > 0.0)) {
            return Err("chassis_half_extents must all be > 0".into());
        }
        if self.wheels.is_empty() {
            return Err("at least one wheel is required".into());
        }
        if let Some(w) = self.wheels.iter().find(|w| !(w.radius > 0.0)) {
            return Err(format!("wheel {} radius must be > 0", w.id));
        }
        Ok(())
    }
}

// ============================================
// ----- runtime state ------------------------
// ============================================

/// What the physics side reads for one wheel between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelActuation {
    pub motor_torque: f32, // N*m, signed
    pub brake_torque: f32, // N*m, >= 0
    pub steer_angle: f32,  // deg, positive = counter-clockwise
}

#[derive(Debug, Clone)]
pub struct DriveWheel {
    pub spec: WheelSpec,
    pub actuation: WheelActuation,
}

pub struct Drivetrain {
    config: DrivetrainConfig,
    wheels: Vec<DriveWheel>,
    hard_brake: bool,
    speed_frac: f32,
}

impl Drivetrain {
    pub fn new(config: DrivetrainConfig) -> Self {
        let wheels = config
            .wheels
            .iter()
            .map(|spec| DriveWheel { spec: *spec, actuation: WheelActuation::default() })
            .collect();
        Self { config, wheels, hard_brake: false, speed_frac: 0.0 }
    }

    pub fn config(&self) -> &DrivetrainConfig {
        &self.config
    }

    pub fn wheels(&self) -> &[DriveWheel] {
        &self.wheels
    }

    /// Steering range the driver normalizes against (at-rest value, deg).
    pub fn steering_range(&self) -> f32 {
        self.config.steering_range
    }

    /// Range actually available at the last applied speed (deg).
    pub fn current_steering_range(&self) -> f32 {
        lerp(
            self.config.steering_range,
            self.config.steering_range_at_max_speed,
            self.speed_frac,
        )
    }

    pub fn current_motor_torque(&self) -> f32 {
        lerp(self.config.motor_torque, 0.0, self.speed_frac)
    }

    pub fn hard_brake_engaged(&self) -> bool {
        self.hard_brake
    }

    pub fn set_hard_brake(&mut self, engaged: bool) {
        self.hard_brake = engaged;
    }

    pub fn linear_damping(&self) -> f32 {
        if self.hard_brake {
            self.config.hard_brake_damping
        } else {
            self.config.linear_damping
        }
    }

    /// Regular pass, then the hard-brake override if engaged.
    pub fn apply(&mut self, command: Command, forward_speed: f32) {
        let v_input = command.vertical.clamp(-1.0, 1.0);
        let h_input = command.horizontal.clamp(-1.0, 1.0);

        self.speed_frac = inverse_lerp(0.0, self.config.max_speed, forward_speed.abs());
        let torque = self.current_motor_torque();
        let steer_range = self.current_steering_range();

        let steer = if h_input.abs() > self.config.steering_deadzone { h_input } else { 0.0 };
        let throttle_active = v_input.abs() > self.config.throttle_deadzone;
        let accelerating = forward_speed.abs() < STANDSTILL_SPEED
            || v_input.signum() == forward_speed.signum();

        for wheel in self.wheels.iter_mut() {
            let act = &mut wheel.actuation;

            if wheel.spec.steerable {
                act.steer_angle = steer * steer_range;
            }

            if !throttle_active {
                act.motor_torque = 0.0;
                act.brake_torque = 0.0;
            } else if accelerating {
                if wheel.spec.motorized {
                    act.motor_torque = v_input * torque;
                }
                act.brake_torque = 0.0;
            } else {
                act.motor_torque = 0.0;
                act.brake_torque = v_input.abs() * self.config.brake_torque;
            }
        }

        if self.hard_brake {
            let sharp = self.config.brake_torque * HARD_BRAKE_MULTIPLIER;
            for wheel in self.wheels.iter_mut() {
                wheel.actuation.motor_torque = 0.0;
                wheel.actuation.brake_torque = sharp;
            }
        }
    }
}
