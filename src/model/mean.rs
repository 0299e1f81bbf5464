use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{FitConfig, Model, check_fit_input, check_predict_input};
use crate::error::{Result, VeidtError};
use crate::persist::Persist;

/// Baseline: always predicts the mean of the training targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanModel {
    mean: Option<f64>,
    n_features: usize,
}

impl MeanModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}

impl Persist for MeanModel {
    const CLASS: &'static str = "MeanModel";
}

impl Model for MeanModel {
    const NAME: &'static str = "MeanModel";

    fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        config: &FitConfig,
    ) -> Result<()> {
        self.mean = None;
        check_fit_input(features, targets)?;
        config.validate_for(Self::NAME, self.supported_options())?;

        self.n_features = features.ncols();
        self.mean = targets.mean();
        debug!("{}: mean {:?} over {} targets", Self::NAME, self.mean, targets.len());
        Ok(())
    }

    fn predict(&self, inputs: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or(VeidtError::NotFitted {
            estimator: Self::NAME,
        })?;
        check_predict_input(inputs, self.n_features)?;
        Ok(Array1::from_elem(inputs.nrows(), mean))
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }
}
