// ==============================================================================
// route.rs — WAYPOINT LOOP + TRACKER
// ------------------------------------------------------------------------------
// A Route is an authored, ordered, circular list of waypoints. It is built once
// before any agent spawns and shared read-only (Arc<Route>) between agents.
//
// advance_if_reached(...):
// - Moves the active index forward by one when the agent is inside the reach
//   radius of the active waypoint, wrapping past the last one.
// - Touches nothing but the index.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::autopilot::types::Vec3;

pub const MIN_SPEED_MULTIPLIER: f32 = 0.1;
pub const MAX_SPEED_MULTIPLIER: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Waypoint {
    pub position: [f32; 3],
    pub brake_zone: bool,
    pub target_speed_multiplier: f32, // 0.1..1.0, only read when brake_zone
}

impl Default for Waypoint {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            brake_zone: false,
            target_speed_multiplier: 0.5,
        }
    }
}

impl Waypoint {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z], ..Self::default() }
    }

    pub fn brake_zone(mut self, multiplier: f32) -> Self {
        self.brake_zone = true;
        self.target_speed_multiplier = multiplier;
        self
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    /// Scale applied to the base target speed while this waypoint is active.
    pub fn speed_scale(&self) -> f32 {
        if self.brake_zone {
            self.target_speed_multiplier
                .clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER)
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Index after `index`, wrapping. Returns 0 on an empty route.
    pub fn next_index(&self, index: usize) -> usize {
        if self.waypoints.is_empty() {
            return 0;
        }
        (index + 1) % self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

/// Returns true when the index moved.
pub fn advance_if_reached(
    route: &Route,
    active: &mut usize,
    position: Vec3,
    reach_radius: f32,
) -> bool {
    let Some(target) = route.get(*active) else {
        // out of range can only mean the route is empty
        *active = 0;
        return false;
    };

    let distance = (target.pos() - position).magnitude();
    if distance < reach_radius {
        *active = route.next_index(*active);
        return true;
    }
    false
}
