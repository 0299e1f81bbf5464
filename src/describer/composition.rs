use std::collections::BTreeSet;

use log::info;
use serde::{Deserialize, Serialize};

use super::{Describer, check_targets};
use crate::data::model::{Descriptor, Structure};
use crate::error::{Result, VeidtError};
use crate::persist::Persist;

/// One row per structure: the atomic fraction of each element.
///
/// Columns are the element list, in order. Built with [`CompositionDescriber::new`]
/// the list is fixed and `fit` is a no-op. Built with
/// [`CompositionDescriber::learned`] (the default) the list is empty until
/// `fit`, which replaces it with the sorted set of elements seen in the
/// training structures; every call recomputes it from scratch, so refitting
/// on the same data gives the same columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionDescriber {
    pub elements: Vec<String>,
    pub learn_elements: bool,
}

impl Default for CompositionDescriber {
    fn default() -> Self {
        Self::learned()
    }
}

impl CompositionDescriber {
    /// Fixed element columns.
    pub fn new<S: Into<String>>(elements: impl IntoIterator<Item = S>) -> Self {
        CompositionDescriber {
            elements: elements.into_iter().map(Into::into).collect(),
            learn_elements: false,
        }
    }

    /// Element columns learned by `fit`.
    pub fn learned() -> Self {
        CompositionDescriber {
            elements: Vec::new(),
            learn_elements: true,
        }
    }
}

impl Persist for CompositionDescriber {
    const CLASS: &'static str = "CompositionDescriber";
}

impl Describer for CompositionDescriber {
    type Object = Structure;

    const NAME: &'static str = "CompositionDescriber";

    fn fit(&mut self, structures: &[Structure], targets: Option<&[f64]>) -> Result<&mut Self> {
        check_targets(structures.len(), targets)?;
        if self.learn_elements {
            let seen: BTreeSet<&str> = structures.iter().flat_map(|s| s.elements()).collect();
            self.elements = seen.into_iter().map(str::to_string).collect();
            info!("{}: learned {} elements {:?}", Self::NAME, self.elements.len(), self.elements);
        }
        Ok(self)
    }

    fn describe(&self, structure: &Structure) -> Result<Descriptor> {
        if self.elements.is_empty() {
            return Err(VeidtError::NotFitted {
                estimator: Self::NAME,
            });
        }
        let n_sites = structure.num_sites();
        if n_sites == 0 {
            return Err(VeidtError::UnsupportedObject {
                describer: Self::NAME,
                reason: "structure has no sites".to_string(),
            });
        }

        let mut row = vec![0.0; self.elements.len()];
        for (species, count) in structure.composition() {
            let idx = self
                .elements
                .iter()
                .position(|e| e == species)
                .ok_or_else(|| VeidtError::UnsupportedObject {
                    describer: Self::NAME,
                    reason: format!("species `{species}` is not among the known elements"),
                })?;
            row[idx] = count as f64 / n_sites as f64;
        }

        Descriptor::from_rows(self.elements.iter().cloned(), &[row])
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        (!self.elements.is_empty()).then(|| self.elements.clone())
    }
}
