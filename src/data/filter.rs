use ndarray::Array1;

use super::model::Structure;

// ---------------------------------------------------------------------------
// Target selection: which structures carry a given property
// ---------------------------------------------------------------------------

/// Return indices of structures that carry a finite value for `property`.
///
/// A structure passes when:
/// * the property is present, and
/// * its value is neither NaN nor infinite
pub fn labeled_indices(structures: &[Structure], property: &str) -> Vec<usize> {
    structures
        .iter()
        .enumerate()
        .filter(|(_, s)| s.property(property).is_some_and(f64::is_finite))
        .map(|(i, _)| i)
        .collect()
}

/// Split structures into the labeled subset and its target vector, both in
/// input order.
pub fn labeled_subset(structures: &[Structure], property: &str) -> (Vec<Structure>, Array1<f64>) {
    let indices = labeled_indices(structures, property);
    let subset: Vec<Structure> = indices.iter().map(|&i| structures[i].clone()).collect();
    let targets: Array1<f64> = subset
        .iter()
        .filter_map(|s| s.property(property))
        .collect();
    (subset, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(energy: Option<f64>) -> Structure {
        let s = Structure::cubic(3.0, ["Cu"], vec![[0.0; 3]]).unwrap();
        match energy {
            Some(e) => s.with_property("energy", e),
            None => s,
        }
    }

    #[test]
    fn skips_missing_and_non_finite_targets() {
        let structures = vec![site(Some(-1.0)), site(None), site(Some(f64::NAN)), site(Some(2.5))];
        assert_eq!(labeled_indices(&structures, "energy"), vec![0, 3]);

        let (subset, targets) = labeled_subset(&structures, "energy");
        assert_eq!(subset.len(), 2);
        assert_eq!(targets.to_vec(), vec![-1.0, 2.5]);
    }
}
