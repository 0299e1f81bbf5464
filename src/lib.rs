//! Describer and model interfaces for machine learning on atomic structures.
//!
//! A [`Describer`] converts structures into a labeled numeric
//! [`Descriptor`]; a [`Model`] fits and predicts on plain feature matrices.
//! The two are independent: a typical pipeline calls
//! [`Describer::transform`] and hands the matrix to [`Model::fit`].
//!
//! ```no_run
//! use veidt::{CompositionDescriber, Describer, FitConfig, LinearModel, Model};
//! # fn run(structures: &[veidt::Structure], energies: &[f64]) -> veidt::Result<()> {
//! let mut describer = CompositionDescriber::learned();
//! let features = describer.fit_transform(structures, None)?;
//!
//! let mut model = LinearModel::new();
//! let targets = ndarray::ArrayView1::from(energies);
//! model.fit(features.view(), targets, &FitConfig::default())?;
//! let predicted = model.predict(features.view())?;
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod describer;
pub mod error;
pub mod model;
pub mod persist;

pub use data::model::{Descriptor, Structure};
pub use describer::{
    CompositionDescriber, Describer, FracCoordsDescriber, Standardized, StructureDescriber,
};
pub use error::{Result, VeidtError};
pub use model::{FitConfig, FitOption, LinearModel, MeanModel, Model};
pub use persist::Persist;
