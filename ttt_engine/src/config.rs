use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const EXPLORATION_RATE: f64 = 0.1;
pub const LEARNING_RATE: f64 = 0.5;
pub const DISCOUNT_RATE: f64 = 0.9;

pub const NUM_EPISODES: usize = 50_000_usize;
pub const LOG_EVERY: usize = 10_000_usize;

pub const Q_TABLE_PATH: &str = "q_table_archive/qtable.pickle";
pub const Q_TABLE_ARCHIVE: &str = "q_table_archive";
pub const AI_HISTORY_FILE: &str = "AI_game_history.json";
pub const TWO_PLAYER_HISTORY_FILE: &str = "TwoPlayer_game_history.json";

/// Which agent moves get a value update.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CreditAssignment {
    /// One-step update after every agent move, once its successor state is seen.
    #[default]
    EveryMove,
    /// Only the agent's last move of each game is updated.
    TerminalOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub exploration_rate: f64,
    pub learning_rate: f64,
    pub discount_rate: f64,
    pub credit: CreditAssignment,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            exploration_rate: EXPLORATION_RATE,
            learning_rate: LEARNING_RATE,
            discount_rate: DISCOUNT_RATE,
            credit: CreditAssignment::default(),
        }
    }
}

impl LearnerConfig {
    pub fn greedy(self) -> Self {
        LearnerConfig {
            exploration_rate: 0.0,
            ..self
        }
    }

    /// Rejects non-finite rates and probabilities outside `[0, 1]`.
    pub fn validate(self) -> Result<Self> {
        check_rate("exploration_rate", self.exploration_rate)?;
        check_rate("learning_rate", self.learning_rate)?;
        check_rate("discount_rate", self.discount_rate)?;
        Ok(self)
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidConfig {
            name,
            value,
            reason: "must be a finite number",
        });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidConfig {
            name,
            value,
            reason: "must lie in [0, 1]",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(LearnerConfig::default().validate().unwrap(), LearnerConfig::default());
        assert!(LearnerConfig::default().greedy().validate().is_ok());
    }

    #[test]
    fn nan_and_infinite_rates_are_rejected() {
        let nan = LearnerConfig {
            exploration_rate: f64::NAN,
            ..LearnerConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(Error::InvalidConfig { name: "exploration_rate", .. })
        ));
        let inf = LearnerConfig {
            learning_rate: f64::INFINITY,
            ..LearnerConfig::default()
        };
        assert!(matches!(
            inf.validate(),
            Err(Error::InvalidConfig { name: "learning_rate", .. })
        ));
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        let config = LearnerConfig {
            discount_rate: 1.5,
            ..LearnerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { name: "discount_rate", .. })
        ));
    }
}
