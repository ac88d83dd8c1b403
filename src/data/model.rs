use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{PipelineError, PipelineResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Cell – a single value of a loaded spreadsheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, the common denominator of xlsx / csv / parquet /
/// json exports.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            // Debug keeps the fractional part ("3.0"), so a written float
            // reads back as a float.
            Cell::Float(v) => write!(f, "{v:?}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Cell::Null => Ok(()),
        }
    }
}

impl Cell {
    /// Interpret the cell as a number. `Ok(None)` for empty cells.
    pub fn as_f64(&self) -> Result<Option<f64>, String> {
        match self {
            Cell::Float(v) if v.is_nan() => Ok(None),
            Cell::Float(v) => Ok(Some(*v)),
            Cell::Integer(i) => Ok(Some(*i as f64)),
            Cell::Null => Ok(None),
            Cell::Text(s) if s.trim().is_empty() => Ok(None),
            Cell::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| "not a number".to_string()),
            other => Err(format!("expected a number, got {other:?}")),
        }
    }

    /// Interpret the cell as a calendar date. `Ok(None)` for empty cells.
    pub fn as_date(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            Cell::Date(d) => Ok(Some(*d)),
            Cell::DateTime(dt) => Ok(Some(dt.date())),
            Cell::Null => Ok(None),
            Cell::Text(s) if s.trim().is_empty() => Ok(None),
            Cell::Text(s) => parse_date(s.trim())
                .map(Some)
                .ok_or_else(|| "unrecognised date format".to_string()),
            other => Err(format!("expected a date, got {other:?}")),
        }
    }

    /// Interpret the cell as text. `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Accepts ISO dates, ISO date-times and French `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
}

/// Best-effort typing of a text field (CSV cells).
pub fn guess_cell(s: &str) -> Cell {
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Cell::Float(f);
    }
    if s == "true" || s == "false" {
        return Cell::Bool(s == "true");
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Cell::Date(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Cell::DateTime(dt);
    }
    Cell::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Table – the concatenated, row-oriented dataset
// ---------------------------------------------------------------------------

/// Named columns plus rows of cells. Every row has `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding or truncating ragged rows to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`] but fails for absent columns.
    pub fn require_column(&self, name: &str) -> PipelineResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Iterate over the cells of one column.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Append a column, or overwrite it if it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Stack tables vertically, preserving table order then row order.
    ///
    /// The result's columns are the union of all inputs in first-seen order;
    /// cells a table does not have are `Null`.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for col in &table.columns {
                if !positions.contains_key(col) {
                    positions.insert(col.clone(), columns.len());
                    columns.push(col.clone());
                }
            }
        }

        let total = tables.iter().map(Table::len).sum();
        let mut rows = Vec::with_capacity(total);
        for table in tables {
            let mapping: Vec<usize> = table.columns.iter().map(|c| positions[c]).collect();
            for row in table.rows {
                let mut out = vec![Cell::Null; columns.len()];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    out[target] = cell;
                }
                rows.push(out);
            }
        }

        Table { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn concat_unions_columns_in_first_seen_order() {
        let a = Table::new(
            vec!["Nom".into(), "Distance".into()],
            vec![vec![text("Lea"), Cell::Float(4200.5)]],
        );
        let b = Table::new(
            vec!["Nom".into(), "Sprints".into(), "Distance".into()],
            vec![
                vec![text("Ines"), Cell::Integer(3), Cell::Float(3900.0)],
                vec![text("Zoe"), Cell::Integer(1), Cell::Null],
            ],
        );

        let merged = Table::concat(vec![a, b]);
        assert_eq!(merged.columns, vec!["Nom", "Distance", "Sprints"]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.rows[0], vec![text("Lea"), Cell::Float(4200.5), Cell::Null]);
        assert_eq!(
            merged.rows[1],
            vec![text("Ines"), Cell::Float(3900.0), Cell::Integer(3)]
        );
        assert_eq!(merged.rows[2][0], text("Zoe"));
    }

    #[test]
    fn new_pads_ragged_rows() {
        let t = Table::new(vec!["a".into(), "b".into()], vec![vec![Cell::Integer(1)]]);
        assert_eq!(t.rows[0], vec![Cell::Integer(1), Cell::Null]);
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut t = Table::new(vec!["Nom".into()], vec![vec![text("Lea")], vec![text("Zoe")]]);
        t.set_column("Position", vec![text("AV"), Cell::Null]);
        assert_eq!(t.columns, vec!["Nom", "Position"]);
        t.set_column("Position", vec![text("AR"), text("AV")]);
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.rows[0][1], text("AR"));
    }

    #[test]
    fn guess_cell_types_text_fields() {
        assert_eq!(guess_cell(""), Cell::Null);
        assert_eq!(guess_cell("42"), Cell::Integer(42));
        assert_eq!(guess_cell("4.5"), Cell::Float(4.5));
        assert_eq!(guess_cell("true"), Cell::Bool(true));
        assert_eq!(
            guess_cell("2020-02-05"),
            Cell::Date(NaiveDate::from_ymd_opt(2020, 2, 5).unwrap())
        );
        assert_eq!(guess_cell("Lea Martin"), text("Lea Martin"));
    }

    #[test]
    fn display_round_trips_through_guess() {
        let cells = [
            Cell::Float(3.0),
            Cell::Float(0.1),
            Cell::Integer(-7),
            Cell::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()),
            Cell::DateTime(
                NaiveDate::from_ymd_opt(2020, 1, 31)
                    .unwrap()
                    .and_hms_opt(18, 30, 0)
                    .unwrap(),
            ),
            Cell::Null,
        ];
        for cell in cells {
            assert_eq!(guess_cell(&cell.to_string()), cell);
        }
    }

    #[test]
    fn csv_text_is_retyped_but_still_reads_as_text() {
        let reloaded = guess_cell(&text("007").to_string());
        assert_eq!(reloaded, Cell::Integer(7));
        assert_eq!(guess_cell(&text("true").to_string()), Cell::Bool(true));
        // names keep working, minus leading zeros
        assert_eq!(reloaded.as_text(), Some("7".to_string()));
        assert_eq!(guess_cell(&text("Lea Martin").to_string()), text("Lea Martin"));
    }

    #[test]
    fn dates_parse_from_several_layouts() {
        let d = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        assert_eq!(text("2020-02-05").as_date(), Ok(Some(d)));
        assert_eq!(text("2020-02-05 09:15:00").as_date(), Ok(Some(d)));
        assert_eq!(text("05/02/2020").as_date(), Ok(Some(d)));
        assert_eq!(Cell::Null.as_date(), Ok(None));
        assert!(text("yesterday").as_date().is_err());
        assert!(Cell::Integer(3).as_date().is_err());
    }

    #[test]
    fn numbers_accept_decimal_commas() {
        assert_eq!(text("12,5").as_f64(), Ok(Some(12.5)));
        assert_eq!(Cell::Float(f64::NAN).as_f64(), Ok(None));
        assert!(text("n/a").as_f64().is_err());
    }
}
