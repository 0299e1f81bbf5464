//! Models wrap a fit/predict learning procedure over numeric features.
//!
//! Features are an m×n matrix, targets and predictions length-m vectors.
//! Nothing here knows about describers; feeding a describer's `transform`
//! output into a model is up to the caller.

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{Result, VeidtError};
use crate::persist::Persist;

pub mod config;
pub mod linear;
pub mod mean;

pub use config::{FitConfig, FitOption};
pub use linear::LinearModel;
pub use mean::MeanModel;

pub trait Model: Persist {
    /// Short name used in errors and logs.
    const NAME: &'static str;

    /// Train on `features` (m×n) and `targets` (m).
    ///
    /// Implementations drop any previous fit before validating, so a failed
    /// call always leaves the model unfitted.
    fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        config: &FitConfig,
    ) -> Result<()>;

    /// One prediction per input row, in input order.
    fn predict(&self, inputs: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    fn is_fitted(&self) -> bool;

    /// Options `fit` understands. Anything else set in a [`FitConfig`] is
    /// rejected.
    fn supported_options(&self) -> &'static [FitOption] {
        &[]
    }

    /// Coefficient of determination (R²) of the predictions on `features`.
    fn score(&self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<f64> {
        check_fit_input(features, targets)?;
        let predictions = self.predict(features)?;
        Ok(r2_score(targets, predictions.view()))
    }
}

/// Fail unless there is one target per feature row and at least one row.
pub fn check_fit_input(features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
    if features.nrows() != targets.len() {
        return Err(VeidtError::DimensionMismatch {
            context: "fit targets",
            expected: features.nrows(),
            found: targets.len(),
        });
    }
    if targets.is_empty() {
        return Err(VeidtError::DimensionMismatch {
            context: "fit needs at least one row",
            expected: 1,
            found: 0,
        });
    }
    Ok(())
}

/// Fail unless `inputs` has the training feature count.
pub fn check_predict_input(inputs: ArrayView2<'_, f64>, n_features: usize) -> Result<()> {
    if inputs.ncols() != n_features {
        return Err(VeidtError::DimensionMismatch {
            context: "predict features",
            expected: n_features,
            found: inputs.ncols(),
        });
    }
    Ok(())
}

/// R² of `predicted` against `actual`. A constant `actual` scores 1 when
/// matched exactly and 0 otherwise.
pub fn r2_score(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let mean = actual.mean().unwrap_or(0.0);
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
