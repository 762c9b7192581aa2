use crate::errors::{GovernanceError, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;
use surety_types::Amount;

/// Prefix for environment overrides, e.g. `SURETY_MIN_FUNDING=25`.
pub const ENV_PREFIX: &str = "SURETY";

/// Governance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Cumulative funding that activates a registered participant
    pub min_funding: u64,
    /// Smallest accepted single contribution
    pub min_contribution: u64,
    /// Active population at which new registrations need a vote
    pub multiparty_threshold: u64,
    /// Events retained in the in-memory journal
    pub event_capacity: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_funding: 10,
            min_contribution: 10,
            multiparty_threshold: 4,
            event_capacity: 1024,
        }
    }
}

impl GovernanceConfig {
    /// Load from an optional file (format picked by extension) layered under
    /// `SURETY_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Same as [`GovernanceConfig::load`] with an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(GovernanceError::InvalidConfig(format!(
                    "configuration file {} not found",
                    path.display()
                )));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(env);

        let config: GovernanceConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_funding == 0 {
            return Err(GovernanceError::InvalidConfig(
                "min_funding must be positive".into(),
            ));
        }
        if self.min_contribution == 0 {
            return Err(GovernanceError::InvalidConfig(
                "min_contribution must be positive".into(),
            ));
        }
        if self.min_contribution > self.min_funding {
            return Err(GovernanceError::InvalidConfig(format!(
                "min_contribution ({}) exceeds min_funding ({})",
                self.min_contribution, self.min_funding
            )));
        }
        if self.multiparty_threshold == 0 {
            return Err(GovernanceError::InvalidConfig(
                "multiparty_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn min_funding(&self) -> Amount {
        Amount::from(self.min_funding)
    }

    pub fn min_contribution(&self) -> Amount {
        Amount::from(self.min_contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let config = GovernanceConfig::load_with_env(None, no_env()).unwrap();
        assert_eq!(config, GovernanceConfig::default());
        assert_eq!(config.min_funding(), Amount(10));
        assert_eq!(config.multiparty_threshold, 4);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "min_funding = 25\nmin_contribution = 5").unwrap();

        let config = GovernanceConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.min_funding, 25);
        assert_eq!(config.min_contribution, 5);
        assert_eq!(config.multiparty_threshold, 4);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "min_funding = 25").unwrap();

        let env = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(HashMap::from([(
                "SURETY_MULTIPARTY_THRESHOLD".to_string(),
                "6".to_string(),
            )])));
        let config = GovernanceConfig::load_with_env(Some(file.path()), env).unwrap();
        assert_eq!(config.min_funding, 25);
        assert_eq!(config.multiparty_threshold, 6);
    }

    #[test]
    fn missing_file_is_reported() {
        let err =
            GovernanceConfig::load_with_env(Some(Path::new("/nonexistent/surety.toml")), no_env())
                .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidConfig(_)));
    }

    #[test]
    fn contribution_above_funding_rejected() {
        let config = GovernanceConfig {
            min_contribution: 11,
            ..GovernanceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GovernanceError::InvalidConfig(_))
        ));
    }
}
