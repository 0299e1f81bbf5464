//! Describers turn domain objects into labeled numeric tables.
//!
//! A concrete describer supplies [`Describer::describe`] for one object;
//! batching, the unlabeled `transform` view and the no-op `fit` come from
//! the trait. Overrides of [`Describer::describe_all`] must return exactly
//! the rows the per-object loop would, in the same order, with the same
//! columns.

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::model::{Descriptor, Structure};
use crate::error::{Result, VeidtError};
use crate::persist::Persist;

pub mod composition;
pub mod scaled;
pub mod site;

pub use composition::CompositionDescriber;
pub use scaled::Standardized;
pub use site::FracCoordsDescriber;

/// Turns objects of one kind into a [`Descriptor`].
///
/// Implementors provide [`Describer::describe`]; everything else has a
/// default. Stateful describers override [`Describer::fit`] and must accept
/// being fitted any number of times, including never.
pub trait Describer: Persist {
    /// The domain object this describer consumes.
    type Object;

    /// Short name used in errors and logs.
    const NAME: &'static str;

    /// Learn whatever parameters `describe` depends on.
    ///
    /// The default stores nothing and hands back the same instance. When
    /// `targets` is given it must have one entry per object.
    fn fit(&mut self, objects: &[Self::Object], targets: Option<&[f64]>) -> Result<&mut Self> {
        check_targets(objects.len(), targets)?;
        Ok(self)
    }

    /// Describe a single object.
    fn describe(&self, object: &Self::Object) -> Result<Descriptor>;

    /// Describe every object in order and stack the tables row-wise.
    fn describe_all(&self, objects: &[Self::Object]) -> Result<Descriptor> {
        let parts = objects
            .iter()
            .map(|o| self.describe(o))
            .collect::<Result<Vec<_>>>()?;
        let table = Descriptor::concat(parts)?;
        debug!(
            "{}: described {} objects into {} rows",
            Self::NAME,
            objects.len(),
            table.n_rows()
        );
        Ok(table)
    }

    /// `describe_all` without the column labels.
    fn transform(&self, objects: &[Self::Object]) -> Result<Array2<f64>> {
        Ok(self.describe_all(objects)?.into_values())
    }

    /// `fit` on the objects, then `transform` the same objects.
    fn fit_transform(
        &mut self,
        objects: &[Self::Object],
        targets: Option<&[f64]>,
    ) -> Result<Array2<f64>> {
        self.fit(objects, targets)?;
        self.transform(objects)
    }

    /// Column names, when they are known without describing anything.
    fn feature_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Fail unless `targets` (when present) has one entry per object.
pub fn check_targets(n_objects: usize, targets: Option<&[f64]>) -> Result<()> {
    match targets {
        Some(t) if t.len() != n_objects => Err(VeidtError::DimensionMismatch {
            context: "describer fit targets",
            expected: n_objects,
            found: t.len(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// StructureDescriber – runtime choice among the structure describers
// ---------------------------------------------------------------------------

/// One of the built-in structure describers, picked at runtime (e.g. from
/// the command line) and persisted with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StructureDescriber {
    FracCoords(FracCoordsDescriber),
    Composition(CompositionDescriber),
}

impl Persist for StructureDescriber {
    const CLASS: &'static str = "StructureDescriber";
}

impl Describer for StructureDescriber {
    type Object = Structure;

    const NAME: &'static str = "StructureDescriber";

    fn fit(&mut self, objects: &[Structure], targets: Option<&[f64]>) -> Result<&mut Self> {
        match self {
            StructureDescriber::FracCoords(d) => {
                d.fit(objects, targets)?;
            }
            StructureDescriber::Composition(d) => {
                d.fit(objects, targets)?;
            }
        }
        Ok(self)
    }

    fn describe(&self, object: &Structure) -> Result<Descriptor> {
        match self {
            StructureDescriber::FracCoords(d) => d.describe(object),
            StructureDescriber::Composition(d) => d.describe(object),
        }
    }

    fn describe_all(&self, objects: &[Structure]) -> Result<Descriptor> {
        match self {
            StructureDescriber::FracCoords(d) => d.describe_all(objects),
            StructureDescriber::Composition(d) => d.describe_all(objects),
        }
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        match self {
            StructureDescriber::FracCoords(d) => d.feature_names(),
            StructureDescriber::Composition(d) => d.feature_names(),
        }
    }
}
