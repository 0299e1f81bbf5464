/// Data layer: core types, loading, and target selection.
///
/// Architecture:
/// ```text
///  .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<Structure>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  structures carrying a target property → (subset, targets)
///   └──────────┘
///        │  Describer
///        ▼
///   ┌────────────┐
///   │ Descriptor  │  named columns + Array2<f64>
///   └────────────┘
///        │
///        ▼
///   loader::save_descriptor → .csv / .json / .parquet
/// ```

pub mod loader;
pub mod model;
pub mod filter;
