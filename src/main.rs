use std::sync::Arc;

use race_autopilot::config::SimConfig;
use race_autopilot::net::start_websocket_server;
use race_autopilot::physics::PhysicsWorld;
use race_autopilot::spawn;
use race_autopilot::state::SharedSimState;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("race_autopilot=info")),
        )
        .init();

    let config = SimConfig::from_env().context("failed to load race config")?;
    info!(
        fixed_dt = config.fixed_dt,
        agents = config.agents.len(),
        waypoints = config.track.waypoints.len(),
        "starting race simulation"
    );

    let mut world = PhysicsWorld::new();
    spawn::populate(&mut world, &config);

    let human_id = config.human.as_ref().map(|h| h.id.clone());
    let state = Arc::new(Mutex::new(SharedSimState::new(human_id)));
    let physics = Arc::new(Mutex::new(world));

    // WebSocket server
    let server = tokio::spawn({
        let (state, physics, bind) = (Arc::clone(&state), Arc::clone(&physics), config.bind.clone());
        async move {
            if let Err(e) = start_websocket_server(bind, state, physics).await {
                error!("websocket server stopped: {e}");
            }
        }
    });

    // Fixed timestep
    let mut ticker = interval(Duration::from_secs_f32(config.fixed_dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        ticker.tick().await;

        let mut phys = physics.lock().await;
        let mut sim = state.lock().await;

        phys.step(config.fixed_dt);
        sim.tick += 1;

        if sim.tick % config.telemetry_every_ticks == 0 {
            sim.broadcast_snapshot(&phys);
        }

        if config.max_ticks.is_some_and(|max| sim.tick >= max) {
            for v in phys.vehicles() {
                info!(
                    vehicle = %v.id,
                    waypoint = ?v.active_waypoint(),
                    recovering = v.is_recovering(),
                    disabled = v.disabled,
                    "final state"
                );
            }
            info!(ticks = sim.tick, seconds = sim.tick as f32 * config.fixed_dt, "run complete");
            break;
        }
    }

    server.abort();
    Ok(())
}
