use log::{debug, info};
use ndarray::Axis;
use serde::{Deserialize, Serialize};

use super::Describer;
use crate::data::model::Descriptor;
use crate::error::{Result, VeidtError};
use crate::persist::Persist;

/// Per-column statistics learned from training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    /// Population standard deviation, or 1 for constant columns.
    pub scale: Vec<f64>,
}

/// Wraps a describer and rescales each of its columns to zero mean and unit
/// variance over the training set.
///
/// `fit` first fits the inner describer, then describes the training
/// objects and stores [`ColumnStats`]. Describing before `fit` is
/// `NotFitted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardized<D> {
    pub inner: D,
    stats: Option<ColumnStats>,
}

impl<D> Standardized<D> {
    pub fn new(inner: D) -> Self {
        Standardized { inner, stats: None }
    }

    pub fn stats(&self) -> Option<&ColumnStats> {
        self.stats.as_ref()
    }

    fn apply(&self, table: Descriptor) -> Result<Descriptor> {
        let stats = self.stats.as_ref().ok_or(VeidtError::NotFitted {
            estimator: "Standardized",
        })?;
        if table.is_empty() {
            return Descriptor::empty(stats.columns.clone());
        }
        if table.columns() != stats.columns.as_slice() {
            return Err(VeidtError::ColumnMismatch {
                expected: stats.columns.clone(),
                found: table.columns().to_vec(),
            });
        }

        let (columns, mut values) = table.into_parts();
        for mut row in values.rows_mut() {
            for ((v, mean), scale) in row.iter_mut().zip(&stats.mean).zip(&stats.scale) {
                *v = (*v - mean) / scale;
            }
        }
        Descriptor::new(columns, values)
    }
}

impl<D: Describer> Persist for Standardized<D> {
    const CLASS: &'static str = "Standardized";

    fn class_name() -> String {
        format!("{}<{}>", Self::CLASS, D::class_name())
    }
}

impl<D> Describer for Standardized<D>
where
    D: Describer,
{
    type Object = D::Object;

    const NAME: &'static str = "Standardized";

    /// Stores the mean and standard deviation of every inner column.
    fn fit(&mut self, objects: &[D::Object], targets: Option<&[f64]>) -> Result<&mut Self> {
        self.stats = None;
        self.inner.fit(objects, targets)?;

        let table = self.inner.describe_all(objects)?;
        if table.is_empty() {
            return Err(VeidtError::DimensionMismatch {
                context: "standardization needs at least one training row",
                expected: 1,
                found: 0,
            });
        }

        let values = table.values();
        let mean = values
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_default();
        let scale: Vec<f64> = values
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();
        debug!("{}: mean {:?} scale {:?}", Self::NAME, mean, scale);
        info!(
            "{}: fitted {} columns on {} rows",
            Self::NAME,
            table.n_cols(),
            table.n_rows()
        );

        self.stats = Some(ColumnStats {
            columns: table.columns().to_vec(),
            mean,
            scale,
        });
        Ok(self)
    }

    fn describe(&self, object: &D::Object) -> Result<Descriptor> {
        if self.stats.is_none() {
            return Err(VeidtError::NotFitted {
                estimator: Self::NAME,
            });
        }
        self.apply(self.inner.describe(object)?)
    }

    /// Scaling is row-wise, so scaling the inner batch equals scaling each
    /// object's table.
    fn describe_all(&self, objects: &[D::Object]) -> Result<Descriptor> {
        if self.stats.is_none() {
            return Err(VeidtError::NotFitted {
                estimator: Self::NAME,
            });
        }
        self.apply(self.inner.describe_all(objects)?)
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        match &self.stats {
            Some(stats) => Some(stats.columns.clone()),
            None => self.inner.feature_names(),
        }
    }
}
