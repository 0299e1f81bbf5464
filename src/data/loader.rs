use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use ndarray::Array2;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{Descriptor, Structure};

/// Keys of a JSON structure record that are not properties.
const STRUCTURE_KEYS: [&str; 3] = ["lattice", "species", "frac_coords"];

/// Columns of a site-per-row CSV file that are not properties.
const SITE_COLUMNS: [&str; 6] = ["structure", "species", "a", "b", "c", "lattice"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load structures from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – array of records
///   `{ "lattice": [[..],[..],[..]], "species": [..], "frac_coords": [[..], ..], ...props }`
/// * `.csv`  – one row per site, see [`load_structures_csv`]
pub fn load_structures(path: &Path) -> Result<Vec<Structure>> {
    let structures = match extension(path).as_str() {
        "json" => load_structures_json(path)?,
        "csv" => load_structures_csv(path)?,
        other => bail!("Unsupported structure file extension: .{other}"),
    };
    info!("loaded {} structures from {}", structures.len(), path.display());
    Ok(structures)
}

/// Write a descriptor table.  Dispatch by extension: `.csv`, `.json` or
/// `.parquet` / `.pq`.
pub fn save_descriptor(path: &Path, descriptor: &Descriptor) -> Result<()> {
    match extension(path).as_str() {
        "csv" => save_descriptor_csv(path, descriptor)?,
        "json" => save_descriptor_json(path, descriptor)?,
        "parquet" | "pq" => save_descriptor_parquet(path, descriptor)?,
        other => bail!("Unsupported descriptor file extension: .{other}"),
    }
    info!(
        "wrote {}x{} descriptor to {}",
        descriptor.n_rows(),
        descriptor.n_cols(),
        path.display()
    );
    Ok(())
}

/// Read a descriptor table written by [`save_descriptor`].
pub fn load_descriptor(path: &Path) -> Result<Descriptor> {
    match extension(path).as_str() {
        "csv" => load_descriptor_csv(path),
        "json" => load_descriptor_json(path),
        "parquet" | "pq" => load_descriptor_parquet(path),
        other => bail!("Unsupported descriptor file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Structures: JSON
// ---------------------------------------------------------------------------

fn load_structures_json(path: &Path) -> Result<Vec<Structure>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut structures = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let lattice_rows = json_triples(obj.get("lattice"), i, "lattice")?;
        let lattice: [[f64; 3]; 3] = lattice_rows
            .try_into()
            .map_err(|rows: Vec<[f64; 3]>| {
                anyhow::anyhow!("Row {i}: lattice has {} vectors, expected 3", rows.len())
            })?;

        let species = obj
            .get("species")
            .and_then(|v| v.as_array())
            .with_context(|| format!("Row {i}: missing or invalid 'species' array"))?
            .iter()
            .enumerate()
            .map(|(j, v)| {
                v.as_str()
                    .map(str::to_string)
                    .with_context(|| format!("Row {i}, species[{j}]: not a string"))
            })
            .collect::<Result<Vec<_>>>()?;

        let frac_coords = json_triples(obj.get("frac_coords"), i, "frac_coords")?;

        let mut structure = Structure::new(lattice, species, frac_coords)
            .with_context(|| format!("Row {i}"))?;

        for (key, val) in obj {
            if STRUCTURE_KEYS.contains(&key.as_str()) {
                continue;
            }
            match val.as_f64() {
                Some(v) => {
                    structure.properties.insert(key.clone(), v);
                }
                None => debug!("Row {i}: skipping non-numeric property '{key}'"),
            }
        }

        structures.push(structure);
    }

    Ok(structures)
}

fn json_triples(val: Option<&JsonValue>, row: usize, key: &str) -> Result<Vec<[f64; 3]>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{key}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            let items = v
                .as_array()
                .filter(|a| a.len() == 3)
                .with_context(|| format!("Row {row}, {key}[{j}]: expected 3 numbers"))?;
            let mut out = [0.0; 3];
            for (k, item) in items.iter().enumerate() {
                out[k] = item
                    .as_f64()
                    .with_context(|| format!("Row {row}, {key}[{j}][{k}]: not a number"))?;
            }
            Ok(out)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Structures: CSV
// ---------------------------------------------------------------------------

/// CSV layout: one row per site, header row with column names.
///
/// * `structure` – identifier; consecutive rows with the same id form one structure
/// * `species`, `a`, `b`, `c` – the site
/// * `lattice` – nine semicolon-separated floats, row-major: `"4;0;0;0;4;0;0;0;4"`
///
/// Any other column is a numeric property, read from the first row of
/// each structure. Empty and non-numeric cells are skipped.
pub fn load_structures_csv(path: &Path) -> Result<Vec<Structure>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let id_idx = position("structure")?;
    let species_idx = position("species")?;
    let coord_idx = [position("a")?, position("b")?, position("c")?];
    let lattice_idx = position("lattice")?;

    let mut structures = Vec::new();
    let mut current: Option<(String, Structure)> = None;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let id = record.get(id_idx).unwrap_or("");

        let mut coords = [0.0; 3];
        for (k, idx) in coord_idx.iter().enumerate() {
            let cell = record.get(*idx).unwrap_or("").trim();
            coords[k] = cell.parse::<f64>().with_context(|| {
                format!("Row {row_no}, {}: '{cell}' is not a number", SITE_COLUMNS[2 + k])
            })?;
        }
        let species = record.get(species_idx).unwrap_or("").to_string();

        let same_structure = matches!(&current, Some((current_id, _)) if current_id == id);
        match current.as_mut() {
            Some((_, structure)) if same_structure => {
                structure.species.push(species);
                structure.frac_coords.push(coords);
            }
            _ => {
                let lattice = parse_lattice(record.get(lattice_idx).unwrap_or(""), row_no)?;
                let mut structure = Structure::new(lattice, vec![species], vec![coords])
                    .with_context(|| format!("Row {row_no}"))?;
                for (col_name, value) in headers.iter().zip(record.iter()) {
                    let value = value.trim();
                    if SITE_COLUMNS.contains(&col_name.as_str()) || value.is_empty() {
                        continue;
                    }
                    match value.parse::<f64>() {
                        Ok(v) => {
                            structure.properties.insert(col_name.clone(), v);
                        }
                        Err(_) => {
                            debug!("Row {row_no}: skipping non-numeric property '{col_name}'")
                        }
                    }
                }
                if let Some((_, done)) = current.replace((id.to_string(), structure)) {
                    structures.push(done);
                }
            }
        }
    }

    if let Some((_, done)) = current {
        structures.push(done);
    }

    Ok(structures)
}

fn parse_lattice(s: &str, row: usize) -> Result<[[f64; 3]; 3]> {
    let flat = parse_semicolon_floats(s, row, "lattice")?;
    if flat.len() != 9 {
        bail!("Row {row}: lattice has {} values, expected 9", flat.len());
    }
    let mut lattice = [[0.0; 3]; 3];
    for (i, v) in flat.into_iter().enumerate() {
        lattice[i / 3][i % 3] = v;
    }
    Ok(lattice)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Descriptors: CSV
// ---------------------------------------------------------------------------

/// Header row of column names, then one record per row. A table without
/// columns has no header to write and is refused.
fn save_descriptor_csv(path: &Path, descriptor: &Descriptor) -> Result<()> {
    if descriptor.n_cols() == 0 {
        bail!("Cannot write a descriptor without columns to CSV");
    }

    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer
        .write_record(descriptor.columns())
        .context("writing CSV header")?;
    for row in descriptor.values().rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn load_descriptor_csv(path: &Path) -> Result<Descriptor> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = record
            .iter()
            .zip(&columns)
            .map(|(cell, col)| {
                cell.trim()
                    .parse::<f64>()
                    .with_context(|| format!("Row {row_no}, {col}: '{cell}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(Descriptor::from_rows(columns, &rows)?)
}

// ---------------------------------------------------------------------------
// Descriptors: JSON
// ---------------------------------------------------------------------------

/// Split-oriented table (`df.to_json(orient='split')` without the index),
/// which keeps column order intact.
#[derive(Serialize, Deserialize)]
struct SplitTable {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

fn save_descriptor_json(path: &Path, descriptor: &Descriptor) -> Result<()> {
    let table = SplitTable {
        columns: descriptor.columns().to_vec(),
        data: descriptor.values().rows().into_iter().map(|r| r.to_vec()).collect(),
    };
    let text = serde_json::to_string_pretty(&table).context("encoding JSON")?;
    std::fs::write(path, text).context("writing JSON file")?;
    Ok(())
}

fn load_descriptor_json(path: &Path) -> Result<Descriptor> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let table: SplitTable = serde_json::from_str(&text).context("parsing JSON table")?;
    Ok(Descriptor::from_rows(table.columns, &table.data)?)
}

// ---------------------------------------------------------------------------
// Descriptors: Parquet
// ---------------------------------------------------------------------------

/// One non-nullable Float64 column per descriptor column.
fn save_descriptor_parquet(path: &Path, descriptor: &Descriptor) -> Result<()> {
    if descriptor.n_cols() == 0 {
        bail!("Cannot write a descriptor without columns to parquet");
    }

    let schema = Arc::new(Schema::new(
        descriptor
            .columns()
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));

    let arrays: Vec<ArrayRef> = descriptor
        .values()
        .columns()
        .into_iter()
        .map(|col| Arc::new(Float64Array::from(col.to_vec())) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn load_descriptor_parquet(path: &Path) -> Result<Descriptor> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut n_rows = 0;
    let mut flat = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_columns = (0..batch.num_columns())
            .map(|i| {
                extract_f64_column(batch.column(i))
                    .with_context(|| format!("column '{}'", columns[i]))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            flat.extend(batch_columns.iter().map(|col| col[row]));
        }
        n_rows += batch.num_rows();
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)
        .context("assembling descriptor values")?;
    Ok(Descriptor::new(columns, values)?)
}

/// Read a Float64 or Float32 column; nulls become NaN.
fn extract_f64_column(col: &ArrayRef) -> Result<Vec<f64>> {
    if let Some(f64_arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!("column type is {:?}, expected Float64 or Float32", col.data_type())
    }
}
