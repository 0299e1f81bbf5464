//! Writes `sample_structures.json`: rock-salt (Li,Na)Cl cells with a
//! composition-linear `energy` plus noise, for trying the `veidt` CLI.

use anyhow::{Context, Result};
use veidt::Structure;

/// Seeded splitmix64 stream; only used for small Gaussian jitter.
struct Jitter(u64);

impl Jitter {
    fn uniform(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Zero-mean normal sample (Box-Muller).
    fn normal(&mut self, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Cation and anion sublattices of the conventional rock-salt cell.
const CATION_SITES: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.5],
    [0.5, 0.5, 0.0],
];
const ANION_SITES: [[f64; 3]; 4] = [
    [0.5, 0.5, 0.5],
    [0.5, 0.0, 0.0],
    [0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5],
];

/// Per-cation energy contribution (eV), a made-up linear model.
const LI_ENERGY: f64 = -3.4;
const NA_ENERGY: f64 = -3.1;

fn rock_salt(n_li: usize, jitter: &mut Jitter) -> Result<Structure> {
    // Vegard-like lattice parameter between LiCl (5.14 Å) and NaCl (5.64 Å).
    let x_li = n_li as f64 / CATION_SITES.len() as f64;
    let a = 5.64 - 0.50 * x_li + jitter.normal(0.01);

    let mut species = Vec::new();
    let mut coords = Vec::new();
    for (i, site) in CATION_SITES.iter().enumerate() {
        species.push(if i < n_li { "Li" } else { "Na" });
        coords.push(*site);
    }
    for site in ANION_SITES {
        species.push("Cl");
        coords.push(site);
    }

    let energy = n_li as f64 * LI_ENERGY
        + (CATION_SITES.len() - n_li) as f64 * NA_ENERGY
        + jitter.normal(0.02);
    let per_atom = energy / species.len() as f64;

    Ok(Structure::cubic(a, species, coords)?.with_property("energy", per_atom))
}

fn main() -> Result<()> {
    env_logger::init();
    let mut jitter = Jitter(42);

    let mut structures = Vec::new();
    for n_li in 0..=CATION_SITES.len() {
        for _ in 0..6 {
            structures.push(rock_salt(n_li, &mut jitter)?);
        }
    }

    let output_path = "sample_structures.json";
    let text = serde_json::to_string_pretty(&structures).context("encoding structures")?;
    std::fs::write(output_path, text).context("writing sample structures")?;

    println!("Wrote {} structures to {output_path}", structures.len());
    Ok(())
}
