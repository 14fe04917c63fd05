use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Env { var: &'static str, value: String },
    Invalid { field: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "malformed config {}: {source}", path.display())
            }
            Self::Env { var, value } => write!(f, "{var}={value:?} is not valid"),
            Self::Invalid { field, reason } => write!(f, "{field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum SimError {
    /// A collaborator the agent cannot run without is absent. Fatal for that
    /// agent only.
    MissingDependency { agent: String, what: String },
    /// No waypoints: the agent holds neutral instead of failing.
    EmptyRoute { agent: String },
    Config(ConfigError),
    Io(std::io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency { agent, what } => {
                write!(f, "agent {agent}: missing {what}")
            }
            Self::EmptyRoute { agent } => write!(f, "agent {agent}: route has no waypoints"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_names_agent() {
        let e = SimError::MissingDependency { agent: "orange".into(), what: "drivetrain \"gt\"".into() };
        assert_eq!(e.to_string(), "agent orange: missing drivetrain \"gt\"");
    }

    #[test]
    fn config_error_chains_source() {
        let e: SimError = ConfigError::Invalid { field: "fixed_dt".into(), reason: "must be > 0".into() }.into();
        assert!(std::error::Error::source(&e).is_some());
        assert_eq!(e.to_string(), "config: fixed_dt: must be > 0");
    }
}
