use log::{debug, info, warn};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{FitConfig, FitOption, Model, check_fit_input, check_predict_input};
use crate::error::{Result, VeidtError};
use crate::persist::Persist;

const DEFAULT_LEARNING_RATE: f64 = 0.01;
const DEFAULT_EPOCHS: usize = 1000;

const OPTIONS: [FitOption; 4] = [
    FitOption::LearningRate,
    FitOption::Epochs,
    FitOption::L2,
    FitOption::Tolerance,
];

/// Resolved training options.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    learning_rate: f64,
    epochs: usize,
    l2: f64,
    tolerance: Option<f64>,
}

impl Schedule {
    fn from_config(config: &FitConfig) -> Result<Self> {
        let invalid = |option: FitOption, reason: &str| VeidtError::InvalidOption {
            estimator: LinearModel::NAME,
            option: option.key().to_string(),
            reason: reason.to_string(),
        };

        let learning_rate = config.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE);
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(invalid(FitOption::LearningRate, "must be finite and positive"));
        }
        let epochs = config.epochs.unwrap_or(DEFAULT_EPOCHS);
        if epochs == 0 {
            return Err(invalid(FitOption::Epochs, "must be at least 1"));
        }
        let l2 = config.l2.unwrap_or(0.0);
        if !(l2.is_finite() && l2 >= 0.0) {
            return Err(invalid(FitOption::L2, "must be finite and non-negative"));
        }
        if let Some(tol) = config.tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(invalid(FitOption::Tolerance, "must be finite and non-negative"));
            }
        }

        Ok(Schedule {
            learning_rate,
            epochs,
            l2,
            tolerance: config.tolerance,
        })
    }
}

/// Linear regression with intercept, trained by full-batch gradient descent
/// on mean squared error plus an optional L2 penalty on the weights.
///
/// Recognized options: `learning_rate` (default 0.01), `epochs` (default
/// 1000), `l2` (default 0) and `tolerance` (no early stop by default).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    coef: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted weights, one per feature.
    pub fn coef(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Persist for LinearModel {
    const CLASS: &'static str = "LinearModel";
}

impl Model for LinearModel {
    const NAME: &'static str = "LinearModel";

    fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        config: &FitConfig,
    ) -> Result<()> {
        self.coef = None;
        self.intercept = 0.0;
        check_fit_input(features, targets)?;
        config.validate_for(Self::NAME, self.supported_options())?;
        let schedule = Schedule::from_config(config)?;

        let m = targets.len() as f64;
        let mut w = Array1::<f64>::zeros(features.ncols());
        let mut b = 0.0;
        let mut prev_loss = f64::INFINITY;
        let mut epochs_run = 0;

        for _ in 0..schedule.epochs {
            let residual = features.dot(&w) + b - &targets;
            let loss = residual.dot(&residual) / m + schedule.l2 * w.dot(&w);
            if !loss.is_finite() {
                warn!("{}: loss diverged after {epochs_run} epochs", Self::NAME);
                return Err(VeidtError::InvalidOption {
                    estimator: Self::NAME,
                    option: FitOption::LearningRate.key().to_string(),
                    reason: format!(
                        "training diverged with learning rate {}",
                        schedule.learning_rate
                    ),
                });
            }
            if let Some(tol) = schedule.tolerance {
                if (prev_loss - loss).abs() < tol {
                    debug!("{}: converged after {epochs_run} epochs, loss {loss:.3e}", Self::NAME);
                    break;
                }
            }
            prev_loss = loss;

            let grad_w = features.t().dot(&residual) * (2.0 / m) + &w * (2.0 * schedule.l2);
            let grad_b = residual.sum() * 2.0 / m;
            w.scaled_add(-schedule.learning_rate, &grad_w);
            b -= schedule.learning_rate * grad_b;
            epochs_run += 1;
        }

        if w.iter().any(|v| !v.is_finite()) || !b.is_finite() {
            return Err(VeidtError::InvalidOption {
                estimator: Self::NAME,
                option: FitOption::LearningRate.key().to_string(),
                reason: format!("training diverged with learning rate {}", schedule.learning_rate),
            });
        }

        info!(
            "{}: fitted {} weights on {} rows in {epochs_run} epochs",
            Self::NAME,
            w.len(),
            targets.len()
        );
        self.coef = Some(w);
        self.intercept = b;
        Ok(())
    }

    fn predict(&self, inputs: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let coef = self.coef.as_ref().ok_or(VeidtError::NotFitted {
            estimator: Self::NAME,
        })?;
        check_predict_input(inputs, coef.len())?;
        Ok(inputs.dot(coef) + self.intercept)
    }

    fn is_fitted(&self) -> bool {
        self.coef.is_some()
    }

    fn supported_options(&self) -> &'static [FitOption] {
        &OPTIONS
    }
}
