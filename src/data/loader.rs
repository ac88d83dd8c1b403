use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{guess_cell, Cell, Table};
use super::schema::columns;
use super::time::{hhmmss_to_seconds, iso_duration_to_seconds};
use crate::error::{PipelineError, PipelineResult};

/// Extensions accepted by [`discover`] and [`load_file`].
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["xlsx", "xlsm", "xls", "ods", "csv", "parquet", "pq", "json"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// List the spreadsheet files of `<root>/<category>/`, sorted by file name.
pub fn discover(root: &Path, category: &str) -> Result<Vec<PathBuf>> {
    let dir = root.join(category);
    let entries =
        fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading entry of {}", dir.display()))?
            .path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load one export file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row, cell types guessed per field
/// * `.parquet` – flat columns (strings, ints, floats, bools, Date32)
/// * `.json`    – `[{ "Nom": ..., "Date": ..., ... }, ...]`
///
/// The `LapTime` column, when present, is normalised to integer seconds.
pub fn load_file(path: &Path) -> Result<Table> {
    let mut table = match extension(path).as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    normalize_lap_times(&mut table)
        .with_context(|| format!("normalising lap times of {}", path.display()))?;
    debug!("{}: {} rows", path.display(), table.len());
    Ok(table)
}

/// Load and concatenate every file of a category.
///
/// When `save_dir` is given the concatenated table is also written to
/// `<save_dir>/<category>.csv`. A failed save is logged and otherwise ignored.
pub fn load_category(root: &Path, category: &str, save_dir: Option<&Path>) -> Result<Table> {
    let files = discover(root, category)?;
    if files.is_empty() {
        warn!("no spreadsheet found in {}", root.join(category).display());
    }

    let tables = files
        .iter()
        .map(|f| load_file(f))
        .collect::<Result<Vec<_>>>()?;
    let table = Table::concat(tables);
    info!(
        "category '{category}': {} rows from {} files",
        table.len(),
        files.len()
    );

    if let Some(dir) = save_dir {
        match save_table(&table, dir, category) {
            Ok(path) => info!("wrote {}", path.display()),
            Err(e) => warn!("{e}"),
        }
    }

    Ok(table)
}

/// Write a table as `<dir>/<name>.csv`, overwriting any previous export.
///
/// `dir` is created if missing, but its parent must already exist.
pub fn save_table(table: &Table, dir: &Path, name: &str) -> PipelineResult<PathBuf> {
    match fs::create_dir(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {}
        Err(source) => {
            return Err(PipelineError::Filesystem {
                path: dir.to_path_buf(),
                source,
            })
        }
    }

    let path = dir.join(format!("{name}.csv"));
    write_csv(table, &path).map_err(|e| PipelineError::Filesystem {
        path: path.clone(),
        source: e.into(),
    })?;
    Ok(path)
}

/// Replace `LapTime` cells by integer seconds.
pub fn normalize_lap_times(table: &mut Table) -> PipelineResult<()> {
    let Some(idx) = table.column_index(columns::LAP_TIME) else {
        return Ok(());
    };
    for (row_no, row) in table.rows.iter_mut().enumerate() {
        let seconds = lap_time_cell(&row[idx]).map_err(|reason| PipelineError::MalformedInput {
            column: columns::LAP_TIME.to_string(),
            row: row_no,
            value: row[idx].to_string(),
            reason,
        })?;
        row[idx] = seconds;
    }
    Ok(())
}

fn lap_time_cell(cell: &Cell) -> std::result::Result<Cell, String> {
    match cell {
        Cell::Null => Ok(Cell::Null),
        Cell::Text(s) => hhmmss_to_seconds(s)
            .map(|secs| Cell::Integer(secs as i64))
            .map_err(|e| e.to_string()),
        Cell::Integer(i) if *i >= 0 => Ok(Cell::Integer(*i)),
        Cell::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Ok(Cell::Integer(*f as i64)),
        Cell::DateTime(dt) => {
            use chrono::Timelike;
            Ok(Cell::Integer(dt.time().num_seconds_from_midnight() as i64))
        }
        other => Err(format!("not a lap time: {other:?}")),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

fn write_csv(table: &Table, path: &Path) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Only the first worksheet is read; exports carry one table per file.
fn load_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheet")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let columns: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();

    let body = rows
        .filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)))
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Table::new(columns, body))
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => {
            Cell::Integer((dt.as_f64() * 86_400.0).round() as i64)
        }
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => guess_cell(s),
        Data::DurationIso(s) => match iso_duration_to_seconds(s) {
            Ok(secs) => Cell::Integer(secs as i64),
            Err(_) => Cell::Text(s.clone()),
        },
        Data::Error(_) => Cell::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names; every field is typed with [`guess_cell`].
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell).collect());
    }

    Ok(Table::new(columns, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns are the
/// union of the record keys in first-seen order.
fn load_json(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let tables = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let columns = obj.keys().cloned().collect();
            let row = obj.values().map(json_cell).collect();
            Ok(Table::new(columns, vec![row]))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table::concat(tables))
}

fn json_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet export, as written by `df.to_parquet()` or by the
/// `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, name)| {
                    arrow_cell(col, row).with_context(|| format!("Row {row}, column '{name}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(Table::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = any.downcast_ref::<Int32Array>().context("expected Int32Array")?;
            Cell::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = any.downcast_ref::<Int64Array>().context("expected Int64Array")?;
            Cell::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = any
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Cell::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = any
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Cell::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = any
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            Cell::Bool(arr.value(row))
        }
        DataType::Date32 => {
            let arr = any.downcast_ref::<Date32Array>().context("expected Date32Array")?;
            arr.value_as_date(row).map_or(Cell::Null, Cell::Date)
        }
        other => bail!("unsupported parquet column type {other:?}"),
    };
    Ok(cell)
}
