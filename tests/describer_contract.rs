//! Properties every structure describer must satisfy: batch-of-one
//! equivalence, order preservation, `transform` equal to the numeric view
//! of `describe_all`, and a `fit` that does not break describing.

use ndarray::array;
use veidt::{
    CompositionDescriber, Describer, Descriptor, FracCoordsDescriber, Standardized, Structure,
    StructureDescriber, VeidtError,
};

fn single(coords: [f64; 3]) -> Structure {
    Structure::cubic(3.0, ["Li"], vec![coords]).unwrap()
}

fn training_set() -> Vec<Structure> {
    vec![
        Structure::cubic(4.1, ["Li", "F"], vec![[0.0; 3], [0.5; 3]]).unwrap(),
        Structure::cubic(
            5.6,
            ["Na", "Cl", "Na", "Cl"],
            vec![[0.0; 3], [0.5; 3], [0.5, 0.5, 0.0], [0.0, 0.0, 0.5]],
        )
        .unwrap(),
        Structure::cubic(4.6, ["Li", "Li", "O"], vec![[0.25; 3], [0.75; 3], [0.0; 3]]).unwrap(),
    ]
}

fn check_contract<D: Describer<Object = Structure>>(describer: &D, objects: &[Structure]) {
    for o in objects {
        assert_eq!(
            describer.describe_all(std::slice::from_ref(o)).unwrap(),
            describer.describe(o).unwrap(),
            "batch of one differs from describe"
        );
    }

    let expected =
        Descriptor::concat(objects.iter().map(|o| describer.describe(o).unwrap())).unwrap();
    let all = describer.describe_all(objects).unwrap();
    assert_eq!(all, expected, "describe_all differs from the per-object loop");

    let raw = describer.transform(objects).unwrap();
    assert_eq!(&raw, all.values(), "transform differs from describe_all values");

    assert_eq!(
        describer.describe_all(objects).unwrap().columns(),
        all.columns(),
        "columns changed between calls"
    );
}

#[test]
fn frac_coords_example_scenario() {
    let d = FracCoordsDescriber::default();
    let objs = [single([0.0, 0.0, 0.0]), single([0.75, 0.75, 0.75])];

    let table = d.describe_all(&objs).unwrap();
    assert_eq!(table.columns(), ["a", "b", "c"]);
    assert_eq!(table.values(), &array![[0.0, 0.0, 0.0], [0.75, 0.75, 0.75]]);
    assert_eq!(d.transform(&objs).unwrap(), array![[0.0, 0.0, 0.0], [0.75, 0.75, 0.75]]);
}

#[test]
fn frac_coords_contract() {
    check_contract(&FracCoordsDescriber::default(), &training_set());
    check_contract(&FracCoordsDescriber::new(true), &training_set());
}

#[test]
fn composition_contract() {
    let mut d = CompositionDescriber::learned();
    d.fit(&training_set(), None).unwrap();
    check_contract(&d, &training_set());
}

#[test]
fn standardized_contract() {
    let mut d = Standardized::new(CompositionDescriber::learned());
    d.fit(&training_set(), None).unwrap();
    check_contract(&d, &training_set());

    let mut d = Standardized::new(FracCoordsDescriber::default());
    d.fit(&training_set(), None).unwrap();
    check_contract(&d, &training_set());
}

#[test]
fn runtime_describer_contract() {
    let mut d = StructureDescriber::Composition(CompositionDescriber::learned());
    d.fit(&training_set(), Some(&[1.0, 2.0, 3.0])).unwrap();
    check_contract(&d, &training_set());
    assert_eq!(d.feature_names().unwrap(), ["Cl", "F", "Li", "Na", "O"]);
}

#[test]
fn default_fit_keeps_describing() {
    let mut d = FracCoordsDescriber::default();
    let before = d.describe_all(&training_set()).unwrap();
    d.fit(&training_set(), None).unwrap().fit(&[], None).unwrap();
    assert_eq!(d.describe_all(&training_set()).unwrap(), before);
}

#[test]
fn order_of_two_is_preserved() {
    let d = FracCoordsDescriber::default();
    let (o1, o2) = (single([0.1, 0.2, 0.3]), single([0.4, 0.5, 0.6]));
    let forward = d.describe_all(&[o1.clone(), o2.clone()]).unwrap();
    let backward = d.describe_all(&[o2, o1]).unwrap();
    assert_eq!(forward.row(0), backward.row(1));
    assert_eq!(forward.row(1), backward.row(0));
}

#[test]
fn failure_propagates_from_batch() {
    let d = CompositionDescriber::new(["Li", "F"]);
    let err = d.describe_all(&training_set()).unwrap_err();
    assert!(matches!(err, VeidtError::UnsupportedObject { .. }));
    assert!(matches!(d.transform(&training_set()), Err(VeidtError::UnsupportedObject { .. })));
}
