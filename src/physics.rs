// src/physics.rs
//
// Rigid-body side of the simulation. Each car is one dynamic chassis box that
// slides on a frictionless contact; all grip comes from the per-wheel impulses
// below, driven by the drivetrain's actuation.

use std::collections::{BTreeMap, HashSet};

use rapier3d::prelude::*;
use tracing::{error, info, warn};

use crate::autopilot::{Command, Vec3, VehicleSample};
use crate::config::WallConfig;
use crate::drivetrain::{Drivetrain, DrivetrainConfig};
use crate::error::SimError;
use crate::vehicle::{HumanInput, Pilot, Vehicle};

const GROUP_TRACK: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

const GRAVITY: f32 = 9.81; // m/s^2
const TYRE_MU: f32 = 1.0; // flat-ground grip coefficient
const LATERAL_GRIP: f32 = 0.8; // share of sideways wheel velocity removed per tick
const ANGULAR_DAMPING: f32 = 2.0;
const SPAWN_CLEARANCE: f32 = 0.02; // m above the ground
const RUNAWAY_LIMIT: f32 = 1_000.0; // m from origin

#[inline]
fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
fn to_rapier(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn read_sample(body: &RigidBody, steering_range: f32) -> VehicleSample {
    let forward = body.rotation() * vector![0.0, 0.0, -1.0];
    VehicleSample {
        position: to_vec3(body.translation()),
        forward: to_vec3(&forward),
        velocity: to_vec3(body.linvel()),
        steering_range,
    }
}

/// Yaw (rad about +Y) that points chassis forward (-Z) along `dir`.
pub fn yaw_facing(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    vehicles: BTreeMap<String, Vehicle>, // vehicle id -> vehicle
    track_body: RigidBodyHandle,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -GRAVITY, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Static ground box whose top surface sits exactly at y = 0.
        let track_body = bodies.insert(RigidBodyBuilder::fixed().build());
        let ground = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .translation(vector![0.0, -1.0, 0.0])
            .collision_groups(InteractionGroups::new(GROUP_TRACK, GROUP_CHASSIS))
            .friction(0.0)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground, track_body, &mut bodies);

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: BTreeMap::new(),
            track_body,
        }
    }

    pub fn add_wall(&mut self, wall: &WallConfig) {
        let [hx, hy, hz] = wall.half_extents;
        let [cx, cy, cz] = wall.center;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz])
            .rotation(vector![0.0, wall.yaw_deg.to_radians(), 0.0])
            .collision_groups(InteractionGroups::new(GROUP_TRACK, GROUP_CHASSIS))
            .friction(0.0)
            .restitution(0.0)
            .build();
        self.colliders.insert_with_parent(collider, self.track_body, &mut self.bodies);
    }

    /// Dynamic chassis box, yaw-only rotation, centre of gravity lowered by the
    /// drivetrain's offset.
    pub fn spawn_vehicle(
        &mut self,
        id: String,
        config: DrivetrainConfig,
        pilot: Pilot,
        position: Vec3,
        yaw: f32,
    ) -> RigidBodyHandle {
        let [hx, hy, hz] = config.chassis_half_extents;
        let mass = config.mass;

        // solid box inertia, COM moved down to the configured height
        let inertia = vector![
            mass / 3.0 * (hy * hy + hz * hz),
            mass / 3.0 * (hx * hx + hz * hz),
            mass / 3.0 * (hx * hx + hy * hy)
        ];
        let mprops = MassProperties::new(
            point![0.0, config.centre_of_gravity_offset, 0.0],
            mass,
            inertia,
        );

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, hy + SPAWN_CLEARANCE, position.z])
            .rotation(vector![0.0, yaw, 0.0])
            .enabled_rotations(false, true, false)
            .additional_mass_properties(mprops)
            .linear_damping(config.linear_damping)
            .angular_damping(ANGULAR_DAMPING)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_TRACK | GROUP_CHASSIS))
            .density(0.0)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        let kind = pilot.kind();
        let mut vehicle = Vehicle::new(id.clone(), handle, Drivetrain::new(config), pilot);
        vehicle.spawn_position = Vec3::new(position.x, hy + SPAWN_CLEARANCE, position.z);
        vehicle.spawn_yaw = yaw;

        info!(vehicle = %id, ?kind, x = position.x, z = position.z, yaw, "spawned vehicle");
        self.vehicles.insert(id, vehicle);
        handle
    }

    /// Stores the latest human axes; forces are applied in `step`.
    pub fn apply_player_input(&mut self, id: &str, input: HumanInput) -> bool {
        match self.vehicles.get_mut(id).map(|v| &mut v.pilot) {
            Some(Pilot::Human(current)) => {
                *current = HumanInput {
                    command: Command::new(input.command.vertical, input.command.horizontal),
                    handbrake: input.handbrake,
                };
                true
            }
            _ => false,
        }
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn sample(&self, vehicle: &Vehicle) -> Option<VehicleSample> {
        let body = self.bodies.get(vehicle.body)?;
        Some(read_sample(body, vehicle.drivetrain.steering_range()))
    }

    // --------------------------------------------------------------
    // 1) pilots -> drivetrain actuation
    // --------------------------------------------------------------
    fn drive_vehicles(&mut self, dt: Real) {
        let mut lost = HashSet::new();

        for vehicle in self.vehicles.values_mut().filter(|v| !v.disabled) {
            let Some(body) = self.bodies.get_mut(vehicle.body) else {
                lost.insert(vehicle.id.clone());
                continue;
            };

            let sample = read_sample(body, vehicle.drivetrain.steering_range());
            vehicle.drive(sample, dt);
            body.set_linear_damping(vehicle.drivetrain.linear_damping());
        }

        for id in lost {
            if let Some(vehicle) = self.vehicles.get_mut(&id) {
                let err = SimError::MissingDependency { agent: id.clone(), what: "rigid body".into() };
                error!("{err}; vehicle disabled");
                vehicle.disabled = true;
                vehicle.last_command = Command::NEUTRAL;
            }
        }
    }

    // --------------------------------------------------------------
    // 2) wheel actuation -> impulses on the chassis
    // --------------------------------------------------------------
    fn apply_wheel_impulses(&mut self, dt: Real) {
        for vehicle in self.vehicles.values().filter(|v| !v.disabled) {
            let Some(body) = self.bodies.get_mut(vehicle.body) else {
                continue;
            };

            let wheels = vehicle.drivetrain.wheels();
            let n = wheels.len().max(1) as f32;
            let mass = body.mass();
            let wheel_mass = mass / n;
            let grip = TYRE_MU * wheel_mass * GRAVITY * dt; // max impulse per wheel

            let rot = *body.rotation();
            let origin = *body.translation();
            let com_y = body.center_of_mass().y;

            for wheel in wheels {
                let [ox, _, oz] = wheel.spec.offset;
                let mut point = Point::from(origin + rot * vector![ox, 0.0, oz]);
                point.y = com_y; // no pitch/roll moment

                let steer = wheel.actuation.steer_angle.to_radians();
                let (s, c) = steer.sin_cos();
                let fwd = rot * vector![-s, 0.0, -c];
                let lat = rot * vector![c, 0.0, -s];

                let v = body.velocity_at_point(&point);
                let v_long = v.dot(&fwd);
                let v_lat = v.dot(&lat);

                // longitudinal: motor pushes, brake never reverses the wheel
                let drive = wheel.actuation.motor_torque / wheel.spec.radius * dt;
                let brake_cap = v_long.abs() * wheel_mass;
                let brake = (wheel.actuation.brake_torque / wheel.spec.radius * dt).min(brake_cap)
                    * -v_long.signum();
                let long = (drive + if v_long.abs() > 1e-4 { brake } else { 0.0 })
                    .clamp(-grip, grip);

                // lateral: kill sideways slide within what is left of the grip
                let lat_budget = (grip * grip - long * long).max(0.0).sqrt();
                let side = (-v_lat * wheel_mass * LATERAL_GRIP).clamp(-lat_budget, lat_budget);

                body.apply_impulse_at_point(fwd * long + lat * side, point, true);
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        self.drive_vehicles(dt);
        self.apply_wheel_impulses(dt);

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // Safety: runaway bodies go back to their grid slot
        for vehicle in self.vehicles.values() {
            let Some(body) = self.bodies.get_mut(vehicle.body) else {
                continue;
            };
            let pos = *body.translation();
            let bad = !(pos.x.is_finite() && pos.y.is_finite() && pos.z.is_finite())
                || pos.abs().max() > RUNAWAY_LIMIT;

            if bad {
                body.set_translation(to_rapier(vehicle.spawn_position), true);
                body.set_rotation(
                    Rotation::from_axis_angle(&Vector::y_axis(), vehicle.spawn_yaw),
                    true,
                );
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);
                warn!(vehicle = %vehicle.id, "reset runaway body to its spawn slot");
            }
        }
    }

    /// Removes a chassis body from the world (the vehicle entry stays).
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }
}
