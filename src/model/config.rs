use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VeidtError};

/// A named training option a model may recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOption {
    LearningRate,
    Epochs,
    L2,
    Tolerance,
}

impl FitOption {
    pub const ALL: [FitOption; 4] = [
        FitOption::LearningRate,
        FitOption::Epochs,
        FitOption::L2,
        FitOption::Tolerance,
    ];

    /// Key used in JSON configuration files.
    pub fn key(self) -> &'static str {
        match self {
            FitOption::LearningRate => "learning_rate",
            FitOption::Epochs => "epochs",
            FitOption::L2 => "l2",
            FitOption::Tolerance => "tolerance",
        }
    }
}

impl fmt::Display for FitOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Training options passed to [`Model::fit`](super::Model::fit).
///
/// Every field is optional; a model applies its own default for options
/// left unset. Setting an option the model does not recognize is an error,
/// never silently ignored. Loaded from JSON with unknown keys rejected:
///
/// ```json
/// { "learning_rate": 0.05, "epochs": 2000 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    /// Gradient step size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    /// Number of passes over the training data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<usize>,
    /// L2 penalty on the weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2: Option<f64>,
    /// Stop early once the loss changes by less than this between epochs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl FitConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = Some(epochs);
        self
    }

    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = Some(l2);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn is_set(&self, option: FitOption) -> bool {
        match option {
            FitOption::LearningRate => self.learning_rate.is_some(),
            FitOption::Epochs => self.epochs.is_some(),
            FitOption::L2 => self.l2.is_some(),
            FitOption::Tolerance => self.tolerance.is_some(),
        }
    }

    /// Options that carry a value.
    pub fn set_options(&self) -> Vec<FitOption> {
        FitOption::ALL
            .into_iter()
            .filter(|o| self.is_set(*o))
            .collect()
    }

    /// Reject any set option outside `supported`.
    pub fn validate_for(&self, estimator: &'static str, supported: &[FitOption]) -> Result<()> {
        match self.set_options().into_iter().find(|o| !supported.contains(o)) {
            Some(option) => Err(VeidtError::InvalidOption {
                estimator,
                option: option.key().to_string(),
                reason: "not recognized by this model".to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_options_in_declaration_order() {
        let config = FitConfig::default().with_tolerance(1e-6).with_learning_rate(0.1);
        assert_eq!(config.set_options(), vec![FitOption::LearningRate, FitOption::Tolerance]);
    }

    #[test]
    fn unsupported_option_is_rejected() {
        let config = FitConfig::default().with_epochs(10);
        let err = config.validate_for("Test", &[FitOption::LearningRate]).unwrap_err();
        assert!(matches!(err, VeidtError::InvalidOption { ref option, .. } if option == "epochs"));
        assert!(FitConfig::default().validate_for("Test", &[]).is_ok());
    }

    #[test]
    fn json_rejects_unknown_keys() {
        let ok: FitConfig = serde_json::from_str(r#"{"learning_rate": 0.5, "epochs": 3}"#).unwrap();
        assert_eq!(ok, FitConfig::default().with_learning_rate(0.5).with_epochs(3));
        assert!(serde_json::from_str::<FitConfig>(r#"{"momentum": 0.9}"#).is_err());
    }
}
