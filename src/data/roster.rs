use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::loader;
use super::model::{Cell, Table};
use super::schema::columns;
use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Position – the closed set of squad groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "AV")]
    Forwards,
    #[serde(rename = "AR")]
    Backs,
}

impl Position {
    pub fn key(self) -> &'static str {
        match self {
            Position::Forwards => "AV",
            Position::Backs => "AR",
        }
    }
}

impl FromStr for Position {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AV" => Ok(Position::Forwards),
            "AR" => Ok(Position::Backs),
            _ => Err(PipelineError::UnknownPosition(s.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Roster – athlete name → position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    positions: HashMap<String, Position>,
}

impl Roster {
    /// Load the roster spreadsheet (any format [`loader::load_file`] reads).
    pub fn load(path: &Path) -> Result<Self> {
        let table = loader::load_file(path)?;
        let roster = Roster::from_table(&table)
            .with_context(|| format!("reading roster {}", path.display()))?;
        info!("roster: {} athletes from {}", roster.len(), path.display());
        Ok(roster)
    }

    /// Build from a table with `Nom` and `Position` columns.
    ///
    /// Rows without a name are skipped; a repeated name keeps its first
    /// position.
    pub fn from_table(table: &Table) -> PipelineResult<Self> {
        let name_idx = table.require_column(columns::ATHLETE)?;
        let pos_idx = table.require_column(columns::POSITION)?;

        let mut positions = HashMap::new();
        for row in &table.rows {
            let Some(name) = row[name_idx].as_text() else {
                continue;
            };
            let label = row[pos_idx]
                .as_text()
                .ok_or_else(|| PipelineError::UnknownPosition(String::new()))?;
            let position: Position = label.parse()?;
            if positions.contains_key(&name) {
                warn!("roster lists '{name}' more than once, keeping the first entry");
                continue;
            }
            positions.insert(name, position);
        }
        Ok(Roster { positions })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Position)>,
        S: Into<String>,
    {
        Roster {
            positions: entries.into_iter().map(|(n, p)| (n.into(), p)).collect(),
        }
    }

    pub fn position_of(&self, athlete: &str) -> Option<Position> {
        self.positions.get(athlete.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Left join on `Nom`: every row is kept and gains a `Position` cell,
    /// empty when the athlete is not on the roster.
    pub fn join(&self, table: &mut Table) -> PipelineResult<()> {
        let name_idx = table.require_column(columns::ATHLETE)?;
        let mut unmatched = 0usize;
        let values: Vec<Cell> = table
            .rows
            .iter()
            .map(|row| {
                match row[name_idx]
                    .as_text()
                    .and_then(|name| self.position_of(&name))
                {
                    Some(p) => Cell::Text(p.key().to_string()),
                    None => {
                        unmatched += 1;
                        Cell::Null
                    }
                }
            })
            .collect();
        if unmatched > 0 {
            warn!("{unmatched} rows have no roster match");
        }
        table.set_column(columns::POSITION, values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn roster_table() -> Table {
        Table::new(
            vec!["Id".into(), columns::ATHLETE.into(), columns::POSITION.into()],
            vec![
                vec![Cell::Integer(1), text("Lea"), text("AV")],
                vec![Cell::Integer(2), text("Zoe"), text("ar")],
                vec![Cell::Integer(3), Cell::Null, Cell::Null],
                vec![Cell::Integer(4), text("Lea"), text("AR")],
            ],
        )
    }

    #[test]
    fn builds_from_named_columns() {
        let roster = Roster::from_table(&roster_table()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.position_of("Lea"), Some(Position::Forwards));
        assert_eq!(roster.position_of("Zoe"), Some(Position::Backs));
        assert_eq!(roster.position_of("Ina"), None);
    }

    #[test]
    fn rejects_unknown_positions() {
        let table = Table::new(
            vec![columns::ATHLETE.into(), columns::POSITION.into()],
            vec![vec![text("Lea"), text("GK")]],
        );
        assert!(matches!(
            Roster::from_table(&table),
            Err(PipelineError::UnknownPosition(_))
        ));
    }

    #[test]
    fn missing_position_column_fails_fast() {
        let table = Table::new(vec![columns::ATHLETE.into()], vec![vec![text("Lea")]]);
        assert!(matches!(
            Roster::from_table(&table),
            Err(PipelineError::MissingColumn(c)) if c == columns::POSITION
        ));
    }

    #[test]
    fn join_keeps_unmatched_rows() {
        let roster = Roster::from_entries([("Lea", Position::Forwards)]);
        let mut sessions = Table::new(
            vec![columns::ATHLETE.into(), "Distance".into()],
            vec![
                vec![text("Lea"), Cell::Float(4000.0)],
                vec![text("Guest"), Cell::Float(3500.0)],
            ],
        );
        roster.join(&mut sessions).unwrap();

        assert_eq!(sessions.len(), 2);
        let pos: Vec<_> = sessions.column(columns::POSITION).unwrap().cloned().collect();
        assert_eq!(pos, vec![text("AV"), Cell::Null]);
    }
}
