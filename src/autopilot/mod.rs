//! autopilot - engine-agnostic driving decision loop (pure types + step)
//!
//! One `Autopilot` per computer-driven car. The host calls [`Autopilot::step`]
//! exactly once per fixed physics tick with a fresh [`VehicleSample`] and
//! writes the returned [`Command`] into the car's drivetrain.

pub mod types;
pub mod tuning;
pub mod route;
pub mod steering;
pub mod throttle;
pub mod recovery;
pub mod start_gate;

pub use route::{Route, Waypoint};
pub use tuning::AutopilotConfig;
pub use types::*;

use std::sync::Arc;

use tracing::{info, trace, warn};

use crate::autopilot::throttle::CornerOutlook;
use crate::error::SimError;

pub struct Autopilot {
    id: String,
    config: AutopilotConfig,
    route: Arc<Route>,
    state: NavigationState,
    outlook: Option<CornerOutlook>,
    warned_empty_route: bool,
}

impl Autopilot {
    pub fn new(id: impl Into<String>, config: AutopilotConfig, route: Arc<Route>) -> Self {
        Self {
            id: id.into(),
            config,
            route,
            state: NavigationState::default(),
            outlook: None,
            warned_empty_route: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Corner read from the last normal-driving tick.
    pub fn outlook(&self) -> Option<CornerOutlook> {
        self.outlook
    }

    pub fn is_recovering(&self) -> bool {
        self.state.is_reversing()
    }

    /// Reserved for passing logic; nothing sets it.
    pub fn is_overtaking(&self) -> bool {
        false
    }

    pub fn race_started(&self) -> bool {
        self.state.gate.started
    }

    /// One fixed tick: gate -> stuck check -> reverse | (tracker -> steer + throttle).
    pub fn step(&mut self, sample: &VehicleSample, dt: f32) -> Command {
        let cmd = self.decide(sample, dt);
        self.state.last_command = cmd;
        cmd
    }

    fn decide(&mut self, sample: &VehicleSample, dt: f32) -> Command {
        if self.route.is_empty() {
            if !self.warned_empty_route {
                let err = SimError::EmptyRoute { agent: self.id.clone() };
                warn!("{err}; holding neutral");
                self.warned_empty_route = true;
            }
            return Command::NEUTRAL;
        }

        // --------------------------------------------------
        // race start gate
        // --------------------------------------------------
        let was_started = self.state.gate.started;
        if !start_gate::update(&mut self.state.gate, self.config.start_delay, dt) {
            return Command::NEUTRAL;
        }
        if !was_started {
            info!(agent = %self.id, "race started");
        }

        // --------------------------------------------------
        // stuck / recovery
        // --------------------------------------------------
        let speed = sample.speed();
        recovery::check_stuck(&mut self.state, &self.config, speed, dt);
        if self.state.is_reversing() {
            return recovery::reverse_step(&mut self.state, &self.config, dt);
        }

        // --------------------------------------------------
        // waypoint tracker
        // --------------------------------------------------
        let before = self.state.active_waypoint;
        if route::advance_if_reached(
            &self.route,
            &mut self.state.active_waypoint,
            sample.position,
            self.config.waypoint_reach_distance,
        ) {
            trace!(agent = %self.id, from = before, to = self.state.active_waypoint, "waypoint reached");
        }

        let active_index = self.state.active_waypoint;
        let next_index = self.route.next_index(active_index);
        let (Some(active), Some(next)) = (self.route.get(active_index), self.route.get(next_index))
        else {
            return Command::NEUTRAL;
        };

        let to_active = active.pos() - sample.position;

        // --------------------------------------------------
        // steering
        // --------------------------------------------------
        let steer = steering::update_steering(
            &mut self.state.steer,
            sample.forward,
            to_active,
            sample.steering_range,
            self.config.steering_power,
            dt,
        );

        // --------------------------------------------------
        // corner-aware throttle
        // --------------------------------------------------
        let base_speed = self.config.target_speed * active.speed_scale();
        let severity = throttle::corner_severity(sample.position, active.pos(), next.pos());
        let outlook =
            throttle::corner_outlook(&self.config, base_speed, to_active.magnitude(), severity);
        let throttle =
            throttle::throttle_command(&self.config, base_speed, speed, outlook.target_speed);
        self.outlook = Some(outlook);

        Command::new(throttle, steer)
    }
}
