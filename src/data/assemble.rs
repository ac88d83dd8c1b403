use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use super::loader;
use super::model::{Cell, Table};
use super::roster::Roster;
use super::schema::columns;
use crate::error::{PipelineError, PipelineResult};

/// Load each category, coerce its dates and join it to the roster.
///
/// Tables come back in the order of `categories`.
pub fn assemble(
    root: &Path,
    categories: &[&str],
    roster: &Roster,
    save_dir: Option<&Path>,
) -> Result<Vec<Table>> {
    categories
        .iter()
        .map(|category| {
            let mut table = loader::load_category(root, category, save_dir)?;
            prepare(&mut table, roster)
                .with_context(|| format!("assembling category '{category}'"))?;
            Ok(table)
        })
        .collect()
}

/// Date coercion followed by the roster left join.
pub fn prepare(table: &mut Table, roster: &Roster) -> PipelineResult<()> {
    if table.is_empty() && table.columns.is_empty() {
        return Ok(());
    }
    coerce_dates(table)?;
    roster.join(table)?;
    debug!("assembled {} rows", table.len());
    Ok(())
}

/// Replace every `Date` cell by a calendar date. Empty cells stay empty.
pub fn coerce_dates(table: &mut Table) -> PipelineResult<()> {
    let idx = table.require_column(columns::DATE)?;
    for (row_no, row) in table.rows.iter_mut().enumerate() {
        let cell = &row[idx];
        let coerced = match cell.as_date() {
            Ok(Some(d)) => Cell::Date(d),
            Ok(None) => Cell::Null,
            Err(reason) => {
                return Err(PipelineError::MalformedInput {
                    column: columns::DATE.to_string(),
                    row: row_no,
                    value: cell.to_string(),
                    reason,
                })
            }
        };
        row[idx] = coerced;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::roster::Position;
    use chrono::NaiveDate;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn coerces_mixed_date_cells() {
        let d = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        let mut table = Table::new(
            vec![columns::DATE.into()],
            vec![
                vec![text("2020-02-05")],
                vec![text("05/02/2020")],
                vec![Cell::DateTime(d.and_hms_opt(18, 0, 0).unwrap())],
                vec![Cell::Null],
            ],
        );
        coerce_dates(&mut table).unwrap();
        let dates: Vec<_> = table.column(columns::DATE).unwrap().cloned().collect();
        assert_eq!(
            dates,
            vec![Cell::Date(d), Cell::Date(d), Cell::Date(d), Cell::Null]
        );
    }

    #[test]
    fn bad_date_names_the_row() {
        let mut table = Table::new(
            vec![columns::DATE.into()],
            vec![vec![text("2020-02-05")], vec![text("tomorrow")]],
        );
        let err = coerce_dates(&mut table).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { row: 1, .. }));
    }

    #[test]
    fn assembles_categories_in_request_order() {
        let tmp = tempfile::tempdir().unwrap();
        for (cat, body) in [
            ("RPE", "Nom,Date,RpeMenAp,RpePhyAp\nLea,2020-02-05,3,6\nGuest,2020-02-05,2,4\n"),
            ("Seances", "Nom,Date,LapTime\nLea,2020-02-05,1:00:00\n"),
        ] {
            std::fs::create_dir(tmp.path().join(cat)).unwrap();
            std::fs::write(tmp.path().join(cat).join("a.csv"), body).unwrap();
        }
        let roster = Roster::from_entries([("Lea", Position::Forwards)]);

        let tables = assemble(tmp.path(), &["Seances", "RPE"], &roster, None).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 1);
        assert_eq!(tables[1].len(), 2);

        let positions: Vec<_> = tables[1].column(columns::POSITION).unwrap().cloned().collect();
        assert_eq!(positions, vec![text("AV"), Cell::Null]);
    }
}
