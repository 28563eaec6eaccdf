//! Sweep configuration.
//!
//! A single file describes the whole sweep: how jobs are dispatched and
//! every axis of the parameter grid. Default values reproduce a typical
//! landscape sweep, so a config file only needs to list what differs.
//!
//! ```toml
//! [dispatch]
//! parallelism = 8
//! strategy = "poll"
//! poll_interval = 500
//!
//! [grid]
//! mode = "simulate"
//! correlations = [-0.9, 0.0, 0.9]
//! epistasis = [0.5, 0.9]
//! ```

use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::grid::GridConfig;
use crate::util;

/// Default name of the sweep configuration file.
pub const CONFIG_FILE: &str = "sweep.toml";

/// How the dispatcher learns about terminated jobs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Periodically check every active job, sleeping between idle cycles
    Poll,
    /// Every job gets a waiter thread that reports its termination
    Notify,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Notify
    }
}

impl std::str::FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "poll" => Ok(Strategy::Poll),
            "notify" => Ok(Strategy::Notify),
            _ => Err(Error::config(
                "strategy",
                format!("unknown strategy `{}`, expected `poll` or `notify`", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of concurrently running jobs
    pub parallelism: usize,
    /// Sleep between idle polling cycles, in milliseconds
    pub poll_interval: u64,
    pub strategy: Strategy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            parallelism: 4,
            poll_interval: 1000,
            strategy: Strategy::default(),
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::config("parallelism", "at least one job has to run at a time"));
        }
        if self.strategy == Strategy::Poll && self.poll_interval == 0 {
            warn!("polling without a sleep interval will busy-spin while jobs are running");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub dispatch: DispatchConfig,
    pub grid: GridConfig,
}

impl SweepConfig {
    /// Reads the configuration from a `toml` (or `yaml`) file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("reading sweep config at: {}", path.to_string_lossy());
        let config: SweepConfig = util::deser_struct_from_path(path)?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()?;
        self.grid.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Mode, Variant};

    #[test]
    fn empty_file_gives_defaults() {
        let config = SweepConfig::from_toml_str("").unwrap();
        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.dispatch.parallelism, 4);
        assert_eq!(config.dispatch.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_overrides_selected_values() {
        let config = SweepConfig::from_toml_str(
            r#"
            [dispatch]
            parallelism = 2
            strategy = "poll"

            [grid]
            mode = "create_landscapes"
            variants = ["full"]
            correlations = [0.5]
            fitness_model = "hoc"

            [grid.executables]
            create_landscapes = "/usr/local/bin/create_landscape"
            "#,
        )
        .unwrap();
        assert_eq!(config.dispatch.parallelism, 2);
        assert_eq!(config.dispatch.strategy, Strategy::Poll);
        assert_eq!(config.grid.mode, Mode::CreateLandscapes);
        assert_eq!(config.grid.variants, vec![Variant::Full]);
        assert_eq!(config.grid.correlations, vec![0.5]);
        assert_eq!(config.grid.sigma, 0.1);
        assert_eq!(
            config.grid.executables.create_landscapes.to_str(),
            Some("/usr/local/bin/create_landscape")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let config = SweepConfig::from_toml_str("[dispatch]\nparallelism = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigurationError { .. })
        ));
    }

    #[test]
    fn unknown_mode_fails_deserialization() {
        assert!(SweepConfig::from_toml_str("[grid]\nmode = \"sideways\"").is_err());
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("poll".parse::<Strategy>().unwrap(), Strategy::Poll);
        assert!("both".parse::<Strategy>().is_err());
    }

    #[test]
    fn unsupported_extension() {
        let path = std::env::temp_dir().join("sweep-config-test.ini");
        std::fs::write(&path, "parallelism = 2").unwrap();
        assert!(matches!(
            SweepConfig::from_path(&path),
            Err(Error::UnsupportedConfigFormat(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
