use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use super::model::{Cell, Table};
use super::roster::Position;
use crate::error::{PipelineError, PipelineResult};

/// Column vocabulary of the exports.
pub mod columns {
    pub const ATHLETE: &str = "Nom";
    pub const DATE: &str = "Date";
    pub const POSITION: &str = "Position";

    pub const LAP_TIME: &str = "LapTime";
    pub const DISTANCE: &str = "Distance";
    pub const METERS_PER_MINUTE: &str = "mmin";
    pub const SPEED_MEAN: &str = "Vmoy";
    pub const SPEED_MAX: &str = "Vmax";
    pub const HR_MEAN: &str = "Fcmoy";
    pub const HR_MIN: &str = "Fcmin";
    pub const HR_MAX: &str = "Fcmax";
    pub const SPEED_ZONES: [&str; 5] =
        ["DPZV0e6", "DPZV6e14", "DPZV14e19", "DPZV19e24", "DPZV24e40"];
    pub const HEART_RATE_ZONES: [&str; 5] =
        ["Tzfc0e70", "Tzfc70e110", "Tzfc110e150", "Tzfc150e180", "Tzfc180e250"];
    pub const SPRINTS: &str = "Sprints";
    pub const HRV_HIGH: &str = "RrHfMoy";
    pub const HRV_LOW: &str = "RrBfMoy";
    pub const HRV_RATIO: &str = "HfBfMoy";
    pub const POWER: &str = "Power";

    pub const MENTAL_FATIGUE: &str = "RpeMenAp";
    pub const PHYSICAL_RPE: &str = "RpePhyAp";
}

// ---------------------------------------------------------------------------
// Record trait – typed view of one table row
// ---------------------------------------------------------------------------

/// Accessors the filter and aggregate stages rely on.
pub trait Record {
    fn athlete(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn position(&self) -> Option<Position>;
}

impl<R: Record + ?Sized> Record for &R {
    fn athlete(&self) -> &str {
        (**self).athlete()
    }
    fn date(&self) -> NaiveDate {
        (**self).date()
    }
    fn position(&self) -> Option<Position> {
        (**self).position()
    }
}

/// A record type that can be decoded from an assembled [`Table`].
pub trait FromTable: Sized {
    /// Columns that must be present; checked once per table.
    const REQUIRED: &'static [&'static str];

    fn from_row(row: &RowReader<'_>) -> PipelineResult<Self>;

    /// Decode every row, failing on the first missing column or bad cell.
    fn from_table(table: &Table) -> PipelineResult<Vec<Self>> {
        for col in Self::REQUIRED {
            table.require_column(col)?;
        }
        (0..table.len())
            .map(|row| Self::from_row(&RowReader { table, row }))
            .collect()
    }
}

/// One row of a table, read by column name.
pub struct RowReader<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: &str) -> PipelineResult<&'a Cell> {
        let idx = self.table.require_column(column)?;
        Ok(&self.table.rows[self.row][idx])
    }

    fn malformed(&self, column: &str, cell: &Cell, reason: impl Into<String>) -> PipelineError {
        PipelineError::MalformedInput {
            column: column.to_string(),
            row: self.row,
            value: cell.to_string(),
            reason: reason.into(),
        }
    }

    pub fn text(&self, column: &str) -> PipelineResult<Option<String>> {
        Ok(self.cell(column)?.as_text())
    }

    /// Athlete name. A blank name keeps the row with an empty athlete, which
    /// never matches the roster.
    pub fn athlete(&self) -> PipelineResult<String> {
        match self.text(columns::ATHLETE)? {
            Some(name) => Ok(name),
            None => {
                warn!("row {}: blank athlete name, kept without position", self.row);
                Ok(String::new())
            }
        }
    }

    pub fn date(&self, column: &str) -> PipelineResult<NaiveDate> {
        let cell = self.cell(column)?;
        cell.as_date()
            .map_err(|reason| self.malformed(column, cell, reason))?
            .ok_or_else(|| self.malformed(column, cell, "empty date"))
    }

    pub fn number(&self, column: &str) -> PipelineResult<Option<f64>> {
        let cell = self.cell(column)?;
        cell.as_f64().map_err(|reason| self.malformed(column, cell, reason))
    }

    pub fn seconds(&self, column: &str) -> PipelineResult<Option<u32>> {
        let cell = self.cell(column)?;
        match cell {
            Cell::Null => Ok(None),
            Cell::Integer(i) => u32::try_from(*i)
                .map(Some)
                .map_err(|_| self.malformed(column, cell, "out of range")),
            other => Err(self.malformed(column, other, "lap time was not normalised")),
        }
    }

    /// Heart-rate style metric: values `<= 0` mean "not recorded".
    pub fn recorded(&self, column: &str) -> PipelineResult<Option<f64>> {
        Ok(self.number(column)?.filter(|v| *v > 0.0))
    }

    /// `Position` is optional: absent column and empty cell both mean no match.
    pub fn position(&self) -> PipelineResult<Option<Position>> {
        let Some(idx) = self.table.column_index(columns::POSITION) else {
            return Ok(None);
        };
        match self.table.rows[self.row][idx].as_text() {
            Some(label) => label.parse().map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Session record – GPS / heart-rate telemetry
// ---------------------------------------------------------------------------

/// One athlete, one training session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub athlete: String,
    pub date: NaiveDate,
    pub position: Option<Position>,
    /// Seconds.
    pub lap_time: Option<u32>,
    pub distance: Option<f64>,
    pub meters_per_minute: Option<f64>,
    pub speed_mean: Option<f64>,
    pub speed_max: Option<f64>,
    /// `None` when the monitor recorded nothing (exports write 0).
    pub hr_mean: Option<f64>,
    pub hr_min: Option<f64>,
    pub hr_max: Option<f64>,
    /// Indexed by [`crate::controls::SpeedZone::index`].
    pub speed_zones: [Option<f64>; 5],
    /// Indexed by [`crate::controls::HeartRateZone::index`].
    pub hr_zones: [Option<f64>; 5],
    pub sprints: Option<f64>,
    pub hrv_high: Option<f64>,
    pub hrv_low: Option<f64>,
    pub hrv_ratio: Option<f64>,
    pub power: Option<f64>,
}

impl Record for SessionRecord {
    fn athlete(&self) -> &str {
        &self.athlete
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn position(&self) -> Option<Position> {
        self.position
    }
}

fn zones(row: &RowReader<'_>, names: [&str; 5]) -> PipelineResult<[Option<f64>; 5]> {
    let mut out = [None; 5];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = row.number(name)?;
    }
    Ok(out)
}

impl FromTable for SessionRecord {
    const REQUIRED: &'static [&'static str] = &[
        columns::ATHLETE,
        columns::DATE,
        columns::LAP_TIME,
        columns::DISTANCE,
        columns::METERS_PER_MINUTE,
        columns::SPEED_MEAN,
        columns::SPEED_MAX,
        columns::HR_MEAN,
        columns::HR_MIN,
        columns::HR_MAX,
        columns::SPEED_ZONES[0],
        columns::SPEED_ZONES[1],
        columns::SPEED_ZONES[2],
        columns::SPEED_ZONES[3],
        columns::SPEED_ZONES[4],
        columns::HEART_RATE_ZONES[0],
        columns::HEART_RATE_ZONES[1],
        columns::HEART_RATE_ZONES[2],
        columns::HEART_RATE_ZONES[3],
        columns::HEART_RATE_ZONES[4],
        columns::SPRINTS,
        columns::HRV_HIGH,
        columns::HRV_LOW,
        columns::HRV_RATIO,
        columns::POWER,
    ];

    fn from_row(row: &RowReader<'_>) -> PipelineResult<Self> {
        Ok(SessionRecord {
            athlete: row.athlete()?,
            date: row.date(columns::DATE)?,
            position: row.position()?,
            lap_time: row.seconds(columns::LAP_TIME)?,
            distance: row.number(columns::DISTANCE)?,
            meters_per_minute: row.number(columns::METERS_PER_MINUTE)?,
            speed_mean: row.number(columns::SPEED_MEAN)?,
            speed_max: row.number(columns::SPEED_MAX)?,
            hr_mean: row.recorded(columns::HR_MEAN)?,
            hr_min: row.recorded(columns::HR_MIN)?,
            hr_max: row.recorded(columns::HR_MAX)?,
            speed_zones: zones(row, columns::SPEED_ZONES)?,
            hr_zones: zones(row, columns::HEART_RATE_ZONES)?,
            sprints: row.number(columns::SPRINTS)?,
            hrv_high: row.number(columns::HRV_HIGH)?,
            hrv_low: row.number(columns::HRV_LOW)?,
            hrv_ratio: row.number(columns::HRV_RATIO)?,
            power: row.number(columns::POWER)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Load record – post-session questionnaire
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRecord {
    pub athlete: String,
    pub date: NaiveDate,
    pub position: Option<Position>,
    pub mental_fatigue: Option<f64>,
    /// Rate of perceived exertion.
    pub physical_rpe: Option<f64>,
}

impl Record for LoadRecord {
    fn athlete(&self) -> &str {
        &self.athlete
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn position(&self) -> Option<Position> {
        self.position
    }
}

impl FromTable for LoadRecord {
    const REQUIRED: &'static [&'static str] = &[
        columns::ATHLETE,
        columns::DATE,
        columns::MENTAL_FATIGUE,
        columns::PHYSICAL_RPE,
    ];

    fn from_row(row: &RowReader<'_>) -> PipelineResult<Self> {
        Ok(LoadRecord {
            athlete: row.athlete()?,
            date: row.date(columns::DATE)?,
            position: row.position()?,
            mental_fatigue: row.number(columns::MENTAL_FATIGUE)?,
            physical_rpe: row.number(columns::PHYSICAL_RPE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn load_table(rows: Vec<Vec<Cell>>) -> Table {
        Table::new(
            vec![
                columns::ATHLETE.into(),
                columns::DATE.into(),
                columns::MENTAL_FATIGUE.into(),
                columns::PHYSICAL_RPE.into(),
                columns::POSITION.into(),
            ],
            rows,
        )
    }

    #[test]
    fn decodes_load_records() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        let table = load_table(vec![
            vec![text("Lea"), Cell::Date(date), Cell::Integer(4), Cell::Float(6.5), text("AV")],
            vec![text("Guest"), Cell::Date(date), Cell::Null, Cell::Integer(7), Cell::Null],
        ]);
        let records = LoadRecord::from_table(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mental_fatigue, Some(4.0));
        assert_eq!(records[0].position, Some(Position::Forwards));
        assert_eq!(records[1].mental_fatigue, None);
        assert_eq!(records[1].position, None);
    }

    #[test]
    fn missing_column_is_reported_before_any_row() {
        let table = Table::new(
            vec![columns::ATHLETE.into(), columns::DATE.into()],
            vec![],
        );
        assert!(matches!(
            LoadRecord::from_table(&table),
            Err(PipelineError::MissingColumn(c)) if c == columns::MENTAL_FATIGUE
        ));
    }

    #[test]
    fn non_numeric_metric_is_malformed() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        let table = load_table(vec![vec![
            text("Lea"),
            Cell::Date(date),
            text("tired"),
            Cell::Integer(6),
            Cell::Null,
        ]]);
        let err = LoadRecord::from_table(&table).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedInput { ref column, row: 0, .. }
                if column == columns::MENTAL_FATIGUE
        ));
    }

    #[test]
    fn empty_date_is_malformed() {
        let table = load_table(vec![vec![
            text("Lea"),
            Cell::Null,
            Cell::Integer(3),
            Cell::Integer(6),
            Cell::Null,
        ]]);
        assert!(LoadRecord::from_table(&table).is_err());
    }

    #[test]
    fn blank_athlete_is_kept_without_position() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        let table = load_table(vec![
            vec![text("Lea"), Cell::Date(date), Cell::Integer(4), Cell::Integer(6), text("AV")],
            vec![text("  "), Cell::Date(date), Cell::Integer(2), Cell::Integer(3), Cell::Null],
            vec![Cell::Null, Cell::Date(date), Cell::Integer(5), Cell::Integer(5), Cell::Null],
        ]);
        let records = LoadRecord::from_table(&table).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].athlete, "");
        assert_eq!(records[1].position, None);
        assert_eq!(records[2].athlete, "");
        assert_eq!(records[2].physical_rpe, Some(5.0));
    }

    #[test]
    fn zero_heart_rate_is_not_recorded() {
        let mut names: Vec<String> =
            SessionRecord::REQUIRED.iter().map(|s| s.to_string()).collect();
        names.push(columns::POSITION.into());
        let mut row: Vec<Cell> = names.iter().map(|_| Cell::Integer(0)).collect();
        let at = |n: &str| names.iter().position(|c| c == n).unwrap();
        row[at(columns::ATHLETE)] = text("Lea");
        row[at(columns::DATE)] = Cell::Date(NaiveDate::from_ymd_opt(2020, 2, 5).unwrap());
        row[at(columns::HR_MAX)] = Cell::Integer(187);
        row[at(columns::POSITION)] = Cell::Null;

        let table = Table::new(names.clone(), vec![row]);
        let rec = &SessionRecord::from_table(&table).unwrap()[0];
        assert_eq!(rec.hr_mean, None);
        assert_eq!(rec.hr_min, None);
        assert_eq!(rec.hr_max, Some(187.0));
        assert_eq!(rec.lap_time, Some(0));
        assert_eq!(rec.distance, Some(0.0));
    }
}
