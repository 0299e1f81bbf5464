//! Integration tests for the `veidt` binary.
//!
//! Each test writes a small structure file into a temporary directory,
//! runs a subcommand and checks the files it leaves behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use veidt::data::loader::load_descriptor;
use veidt::{
    CompositionDescriber, Describer, LinearModel, Model, Persist, Standardized, Structure,
    StructureDescriber,
};

fn run_veidt(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_veidt"))
        .args(args)
        .output()
        .expect("Failed to execute veidt")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Rock-salt cells whose energy is linear in the Li fraction, plus one
/// unlabeled cell that `fit` must skip.
fn labeled_structures() -> Vec<Structure> {
    let mut structures: Vec<Structure> = (0..=4)
        .map(|n_li| {
            let mut species = vec!["Li"; n_li];
            species.extend(vec!["Na"; 4 - n_li]);
            species.extend(["Cl"; 4]);
            let coords = vec![[0.0; 3]; 8];
            let x_li = n_li as f64 / 8.0;
            Structure::cubic(5.5, species, coords)
                .unwrap()
                .with_property("energy", -1.6 - 0.3 * x_li)
        })
        .collect();
    structures.push(Structure::cubic(5.6, ["Na", "Cl"], vec![[0.0; 3], [0.5; 3]]).unwrap());
    structures
}

fn write_structures(dir: &Path) -> PathBuf {
    let path = dir.join("structures.json");
    fs::write(&path, serde_json::to_string_pretty(&labeled_structures()).unwrap()).unwrap();
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// describe
// =============================================================================

#[test]
fn describe_writes_every_table_format() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());

    for name in ["table.csv", "table.json", "table.parquet"] {
        let output_path = temp.path().join(name);
        let output = run_veidt(&["describe", "-i", path_str(&input), "-o", path_str(&output_path)]);
        assert!(output.status.success(), "{name}: {}", stderr(&output));

        let table = load_descriptor(&output_path).unwrap();
        assert_eq!(table.columns(), ["Cl", "Li", "Na"], "{name}");
        assert_eq!(table.n_rows(), 6, "{name}");
        assert_eq!(table.row(0).unwrap().to_vec(), vec![0.5, 0.0, 0.5], "{name}");
    }
}

#[test]
fn describe_standardized_saves_a_reusable_describer() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());
    let table_path = temp.path().join("sites.csv");
    let describer_path = temp.path().join("describer.json");

    let output = run_veidt(&[
        "describe",
        "-i",
        path_str(&input),
        "-o",
        path_str(&table_path),
        "--describer",
        "frac-coords",
        "--standardize",
        "--save-describer",
        path_str(&describer_path),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let table = load_descriptor(&table_path).unwrap();
    assert_eq!(table.columns(), ["a", "b", "c"]);
    assert_eq!(table.n_rows(), 5 * 8 + 2);

    let describer = Standardized::<StructureDescriber>::load(&describer_path).unwrap();
    let again = describer.transform(&labeled_structures()).unwrap();
    for (x, y) in again.iter().zip(table.values().iter()) {
        assert!((x - y).abs() < 1e-12, "{x} vs {y}");
    }
}

#[test]
fn describe_with_fixed_elements_rejects_unknown_species() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());
    let output_path = temp.path().join("table.csv");

    let output = run_veidt(&[
        "describe",
        "-i",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "--elements",
        "Li,Cl",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("`Na`"), "{}", stderr(&output));
    assert!(!output_path.exists());
}

// =============================================================================
// fit
// =============================================================================

#[test]
fn fit_rejects_per_site_describer() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());

    let output = run_veidt(&[
        "fit",
        "-i",
        path_str(&input),
        "-t",
        "energy",
        "--describer",
        "frac-coords",
    ]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("one row per structure"), "{err}");
    assert!(err.contains("StructureDescriber"), "{err}");
}

#[test]
fn fit_linear_saves_a_loadable_model() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());
    let config_path = temp.path().join("fit.json");
    fs::write(&config_path, r#"{"learning_rate": 0.5, "epochs": 20000}"#).unwrap();
    let model_path = temp.path().join("model.json");

    let output = run_veidt(&[
        "fit",
        "-i",
        path_str(&input),
        "-t",
        "energy",
        "--model",
        "linear",
        "--config",
        path_str(&config_path),
        "--save-model",
        path_str(&model_path),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("LinearModel fitted on 5 rows"), "{stdout}");

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&model_path).unwrap()).unwrap();
    assert_eq!(document["@class"], "LinearModel");

    let model = LinearModel::load(&model_path).unwrap();
    assert!(model.is_fitted());
    assert_eq!(model.coef().unwrap().len(), 3);

    let labeled = &labeled_structures()[..5];
    let mut describer = CompositionDescriber::learned();
    let features = describer.fit_transform(labeled, None).unwrap();
    let targets: ndarray::Array1<f64> =
        labeled.iter().map(|s| s.property("energy").unwrap()).collect();
    assert!(model.score(features.view(), targets.view()).unwrap() > 0.999);
}

#[test]
fn fit_mean_with_standardized_features() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());

    let output = run_veidt(&[
        "fit",
        "-i",
        path_str(&input),
        "-t",
        "energy",
        "--model",
        "mean",
        "--standardize",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("MeanModel fitted on 5 rows"));
}

#[test]
fn fit_refuses_options_the_model_does_not_take() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());
    let config_path = temp.path().join("fit.json");
    fs::write(&config_path, r#"{"epochs": 10}"#).unwrap();
    let model_path = temp.path().join("model.json");

    let output = run_veidt(&[
        "fit",
        "-i",
        path_str(&input),
        "-t",
        "energy",
        "--model",
        "mean",
        "--config",
        path_str(&config_path),
        "--save-model",
        path_str(&model_path),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("`epochs`"), "{}", stderr(&output));
    assert!(!model_path.exists());
}

#[test]
fn fit_refuses_unknown_config_keys() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());
    let config_path = temp.path().join("fit.json");
    fs::write(&config_path, r#"{"momentum": 0.9}"#).unwrap();

    let output = run_veidt(&[
        "fit",
        "-i",
        path_str(&input),
        "-t",
        "energy",
        "--config",
        path_str(&config_path),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("momentum"), "{}", stderr(&output));
}

#[test]
fn fit_needs_a_labeled_structure() {
    let temp = TempDir::new().unwrap();
    let input = write_structures(temp.path());

    let output = run_veidt(&["fit", "-i", path_str(&input), "-t", "band_gap"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("band_gap"), "{}", stderr(&output));
}
