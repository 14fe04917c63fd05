use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::autopilot::route::{MAX_SPEED_MULTIPLIER, MIN_SPEED_MULTIPLIER};
use crate::autopilot::{AutopilotConfig, Waypoint};
use crate::drivetrain::DrivetrainConfig;
use crate::error::{ConfigError, SimError};

pub const DEFAULT_BIND: &str = "0.0.0.0:9001";
pub const DEFAULT_FIXED_DT: f32 = 0.02; // 50 Hz
pub const DEFAULT_DRIVETRAIN: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub fixed_dt: f32,
    pub bind: String,
    pub telemetry_every_ticks: u64,
    pub max_ticks: Option<u64>, // headless runs stop here
    pub drivetrains: BTreeMap<String, DrivetrainConfig>,
    pub track: TrackConfig,
    pub agents: Vec<AgentConfig>,
    pub human: Option<HumanConfig>,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub waypoints: Vec<Waypoint>,
    pub walls: Vec<WallConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WallConfig {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default)]
    pub yaw_deg: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    #[serde(default = "default_drivetrain")]
    pub drivetrain: String,
    #[serde(default)]
    pub autopilot: AutopilotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanConfig {
    pub id: String,
    #[serde(default = "default_drivetrain")]
    pub drivetrain: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub setback: f32,        // m behind the first waypoint for the pole slot
    pub row_spacing: f32,    // m between rows
    pub column_spacing: f32, // m between the two columns
}

fn default_drivetrain() -> String {
    DEFAULT_DRIVETRAIN.to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { setback: 0.0, row_spacing: 8.0, column_spacing: 4.0 }
    }
}

impl Default for TrackConfig {
    /// 120 x 80 rectangle with chamfered corners, driven counter-clockwise.
    fn default() -> Self {
        let w = |x: f32, z: f32| Waypoint::at(x, 0.0, z);
        Self {
            waypoints: vec![
                w(0.0, 0.0),
                w(0.0, -50.0),
                w(10.0, -70.0),
                w(60.0, -80.0),
                w(110.0, -70.0),
                w(120.0, -50.0).brake_zone(0.7),
                w(120.0, 0.0),
                w(110.0, 20.0),
                w(60.0, 30.0),
                w(10.0, 20.0),
            ],
            walls: Vec::new(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut drivetrains = BTreeMap::new();
        drivetrains.insert(DEFAULT_DRIVETRAIN.to_string(), DrivetrainConfig::default());

        let agent = |id: &str| AgentConfig {
            id: id.to_string(),
            drivetrain: default_drivetrain(),
            autopilot: AutopilotConfig::default(),
        };

        Self {
            fixed_dt: DEFAULT_FIXED_DT,
            bind: DEFAULT_BIND.to_string(),
            telemetry_every_ticks: 5,
            max_ticks: None,
            drivetrains,
            track: TrackConfig::default(),
            agents: vec![agent("orange"), agent("apexgrip"), agent("gforce")],
            human: None,
            grid: GridConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: SimConfig = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// `RACE_CONFIG` (file) first, then single-value overrides:
    /// `RACE_BIND`, `RACE_FIXED_DT`, `RACE_MAX_TICKS`.
    pub fn from_env() -> Result<Self, SimError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`SimConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, SimError> {
        let mut config = match get("RACE_CONFIG") {
            Some(path) if !path.trim().is_empty() => Self::load(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Some(bind) = get("RACE_BIND") {
            config.bind = bind;
        }
        if let Some(dt) = get("RACE_FIXED_DT") {
            config.fixed_dt = dt
                .parse()
                .map_err(|_| ConfigError::Env { var: "RACE_FIXED_DT", value: dt.clone() })?;
        }
        if let Some(ticks) = get("RACE_MAX_TICKS") {
            let parsed = ticks
                .parse()
                .map_err(|_| ConfigError::Env { var: "RACE_MAX_TICKS", value: ticks.clone() })?;
            config.max_ticks = Some(parsed);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: String, reason: String| ConfigError::Invalid { field, reason };

        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0 && self.fixed_dt <= 0.1) {
            return Err(invalid("fixed_dt".into(), format!("must be in (0, 0.1] (got {})", self.fixed_dt)));
        }
        if self.telemetry_every_ticks == 0 {
            return Err(invalid("telemetry_every_ticks".into(), "must be >= 1".into()));
        }

        for (i, wp) in self.track.waypoints.iter().enumerate() {
            if wp.position.iter().any(|c| !c.is_finite()) {
                return Err(invalid(format!("track.waypoints[{i}].position"), "must be finite".into()));
            }
            let m = wp.target_speed_multiplier;
            if wp.brake_zone && !(MIN_SPEED_MULTIPLIER..=MAX_SPEED_MULTIPLIER).contains(&m) {
                return Err(invalid(
                    format!("track.waypoints[{i}].target_speed_multiplier"),
                    format!("must be in [{MIN_SPEED_MULTIPLIER}, {MAX_SPEED_MULTIPLIER}] (got {m})"),
                ));
            }
        }
        for (i, wall) in self.track.walls.iter().enumerate() {
            if wall.half_extents.iter().any(|h| !(*h > 0.0)) {
                return Err(invalid(format!("track.walls[{i}].half_extents"), "must all be > 0".into()));
            }
        }

        for (name, dt) in &self.drivetrains {
            dt.check().map_err(|reason| invalid(format!("drivetrains.{name}"), reason))?;
        }

        let mut seen = HashSet::new();
        let human_id = self.human.as_ref().map(|h| h.id.as_str());
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(invalid("agents[].id".into(), "must not be empty".into()));
            }
            if !seen.insert(agent.id.as_str()) || Some(agent.id.as_str()) == human_id {
                return Err(invalid(format!("agents.{}", agent.id), "duplicate id".into()));
            }
            agent
                .autopilot
                .check()
                .map_err(|reason| invalid(format!("agents.{}.autopilot", agent.id), reason))?;
        }

        if self.grid.row_spacing < 0.0 || self.grid.column_spacing < 0.0 {
            return Err(invalid("grid".into(), "spacing must be >= 0".into()));
        }
        Ok(())
    }
}
