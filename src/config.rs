use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::solver::StoppingRule;

// Hyperparameters and outputs of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    // Upper bound on training episodes, whatever the stopping rule
    pub episodes: u64,
    // Step size α of the value update
    pub alpha: f64,
    // Weight γ of the successor state's estimate
    pub discount: f64,
    // Probability ε of acting at random
    pub epsilon: f64,
    // Seed for dealing and exploration; entropy when absent
    pub seed: Option<u64>,
    pub stopping: StoppingRule,
    // Episodes per progress report and learning-curve point
    pub report_every: u64,
    // Hands played when comparing the learned policy against the baseline
    pub evaluation_hands: u64,
    // Where the learned strategy is written
    pub output: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 5_000_000,
            alpha: 0.1,
            discount: 0.9,
            epsilon: 0.1,
            seed: None,
            stopping: StoppingRule::Episodes,
            report_every: 100_000,
            evaluation_hands: 100_000,
            output: PathBuf::from("q_table.json"),
        }
    }
}

impl TrainingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("{:<32}{:<32}", "loading config", path.display());
        let config: TrainingConfig = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.episodes == 0 {
            return Err(Error::Config("episodes must be > 0".into()));
        }
        if self.report_every == 0 {
            return Err(Error::Config("report_every must be > 0".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::Config("alpha must be in (0, 1]".into()));
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(Error::Config("discount must be in (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::Config("epsilon must be in [0, 1]".into()));
        }
        if let StoppingRule::Converged { threshold } = self.stopping {
            if !(threshold > 0.0) {
                return Err(Error::Config("convergence threshold must be > 0".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TrainingConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_episodes_is_invalid() {
        let config = TrainingConfig {
            episodes: 0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_hyperparameters_are_invalid() {
        let configs = vec![
            TrainingConfig {
                alpha: 0.0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                alpha: 1.5,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                discount: 0.0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                epsilon: -0.1,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                epsilon: f64::NAN,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                report_every: 0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                stopping: StoppingRule::Converged { threshold: 0.0 },
                ..TrainingConfig::default()
            },
        ];
        for config in configs {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{"episodes": 1000, "seed": 7, "stopping": {"rule": "budget", "seconds": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.episodes, 1000);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.stopping, StoppingRule::Budget { seconds: 60 });
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.output, PathBuf::from("q_table.json"));
        config.validate().unwrap();
    }
}
