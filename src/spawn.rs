use std::sync::Arc;

use tracing::{error, info};

use crate::autopilot::{Autopilot, Route, Vec3, planar};
use crate::config::{GridConfig, SimConfig};
use crate::error::SimError;
use crate::physics::{PhysicsWorld, yaw_facing};
use crate::vehicle::{HumanInput, Pilot};

// ---------------------------------------------
// GRID SLOT RETURNED TO THE WORLD
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSlot {
    pub position: Vec3,
    pub yaw: f32, // rad about +Y
}

// ---------------------------------------------
// STARTING GRID
// ---------------------------------------------
/// Two-wide grid behind the first waypoint, facing the second.
#[derive(Debug, Clone)]
pub struct StartingGrid {
    origin: Vec3,
    forward: Vec3, // planar, unit
    right: Vec3,   // planar, unit
    spacing: GridConfig,
    allocated: usize,
}

impl StartingGrid {
    pub fn new(route: &Route, spacing: GridConfig) -> Self {
        let origin = route.get(0).map(|w| w.pos()).unwrap_or_else(Vec3::zeros);
        let forward = route
            .get(1)
            .and_then(|next| planar(next.pos() - origin))
            .unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0));
        let right = Vec3::new(-forward.z, 0.0, forward.x);

        Self { origin, forward, right, spacing, allocated: 0 }
    }

    pub fn slot(&self, index: usize) -> GridSlot {
        let row = (index / 2) as f32;
        let side = if index % 2 == 0 { -0.5 } else { 0.5 };
        let back = self.spacing.setback + row * self.spacing.row_spacing;

        GridSlot {
            position: self.origin - self.forward * back
                + self.right * (side * self.spacing.column_spacing),
            yaw: yaw_facing(self.forward),
        }
    }

    pub fn allocate(&mut self) -> GridSlot {
        let slot = self.slot(self.allocated);
        self.allocated += 1;
        slot
    }
}

// ---------------------------------------------------------
// Full population pipeline called from main
// ---------------------------------------------------------
/// Spawns every configured agent (and the human car, if any) onto the grid.
/// An agent whose drivetrain preset is missing is logged and skipped; the rest
/// still race.
pub fn populate(world: &mut PhysicsWorld, config: &SimConfig) -> Vec<SimError> {
    for wall in &config.track.walls {
        world.add_wall(wall);
    }

    let route = Arc::new(Route::new(config.track.waypoints.clone()));
    let mut grid = StartingGrid::new(&route, config.grid);
    let mut failures = Vec::new();

    for agent in &config.agents {
        let Some(drivetrain) = config.drivetrains.get(&agent.drivetrain) else {
            let err = SimError::MissingDependency {
                agent: agent.id.clone(),
                what: format!("drivetrain preset {:?}", agent.drivetrain),
            };
            error!("{err}; agent skipped");
            failures.push(err);
            continue;
        };

        let slot = grid.allocate();
        let pilot = Pilot::Autopilot(Autopilot::new(
            agent.id.clone(),
            agent.autopilot,
            Arc::clone(&route),
        ));
        world.spawn_vehicle(agent.id.clone(), drivetrain.clone(), pilot, slot.position, slot.yaw);
    }

    if let Some(human) = &config.human {
        match config.drivetrains.get(&human.drivetrain) {
            Some(drivetrain) => {
                let slot = grid.allocate();
                let pilot = Pilot::Human(HumanInput::default());
                world.spawn_vehicle(human.id.clone(), drivetrain.clone(), pilot, slot.position, slot.yaw);
            }
            None => {
                let err = SimError::MissingDependency {
                    agent: human.id.clone(),
                    what: format!("drivetrain preset {:?}", human.drivetrain),
                };
                error!("{err}; human car skipped");
                failures.push(err);
            }
        }
    }

    info!(
        vehicles = world.vehicles().count(),
        waypoints = route.len(),
        skipped = failures.len(),
        "grid populated"
    );
    failures
}
