//! Computer-driven race cars on a shared drivetrain model.
//!
//! `autopilot` is the engine-agnostic decision loop; everything else wires it
//! to a rapier world, a config file and a telemetry socket.

pub mod autopilot;
pub mod config;
pub mod drivetrain;
pub mod error;
pub mod net;
pub mod physics;
pub mod spawn;
pub mod state;
pub mod vehicle;
