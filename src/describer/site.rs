use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::Describer;
use crate::persist::Persist;
use crate::data::model::{Descriptor, Structure};
use crate::error::{Result, VeidtError};

const COLUMNS: [&str; 3] = ["a", "b", "c"];

fn columns() -> Vec<String> {
    COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// One row per site holding its fractional coordinates, columns `a`, `b`,
/// `c`.
///
/// Rarely a good feature on its own; mostly useful as a reference describer
/// and for inspecting structures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FracCoordsDescriber {
    /// Map coordinates into `[0, 1)` before reporting them.
    #[serde(default)]
    pub wrap: bool,
}

impl FracCoordsDescriber {
    pub fn new(wrap: bool) -> Self {
        FracCoordsDescriber { wrap }
    }

    fn coord(&self, x: f64) -> f64 {
        if self.wrap {
            x - x.floor()
        } else {
            x
        }
    }

    fn check(&self, structure: &Structure) -> Result<()> {
        if structure.num_sites() == 0 {
            return Err(VeidtError::UnsupportedObject {
                describer: Self::NAME,
                reason: "structure has no sites".to_string(),
            });
        }
        Ok(())
    }
}

impl Persist for FracCoordsDescriber {
    const CLASS: &'static str = "FracCoordsDescriber";
}

impl Describer for FracCoordsDescriber {
    type Object = Structure;

    const NAME: &'static str = "FracCoordsDescriber";

    fn describe(&self, structure: &Structure) -> Result<Descriptor> {
        self.check(structure)?;
        let flat: Vec<f64> = structure
            .frac_coords
            .iter()
            .flat_map(|site| site.iter().map(|&x| self.coord(x)))
            .collect();
        let values = Array2::from_shape_vec((structure.num_sites(), COLUMNS.len()), flat)?;
        Descriptor::new(columns(), values)
    }

    /// Fills a single preallocated buffer for the whole batch instead of
    /// concatenating per-structure tables.
    fn describe_all(&self, structures: &[Structure]) -> Result<Descriptor> {
        let total: usize = structures.iter().map(Structure::num_sites).sum();
        let mut flat = Vec::with_capacity(total * COLUMNS.len());
        for structure in structures {
            self.check(structure)?;
            for site in &structure.frac_coords {
                flat.extend(site.iter().map(|&x| self.coord(x)));
            }
        }
        let values = Array2::from_shape_vec((total, COLUMNS.len()), flat)?;
        Descriptor::new(columns(), values)
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        Some(columns())
    }
}
