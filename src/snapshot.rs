use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::DashboardConfig;
use crate::data::assemble;
use crate::data::model::Table;
use crate::data::roster::Roster;
use crate::data::schema::{FromTable, LoadRecord, SessionRecord};

/// Everything the dashboard reads, built once at startup.
///
/// Handlers only ever see `&Snapshot` (through an `Arc`), so concurrent
/// requests share it without locking. Refreshing the data means building a
/// new snapshot and swapping the `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub roster: Roster,
    pub sessions: Vec<SessionRecord>,
    pub loads: Vec<LoadRecord>,
}

impl Snapshot {
    /// Read roster and both categories from disk (blocking).
    pub fn load(config: &DashboardConfig) -> Result<Arc<Self>> {
        let roster = Roster::load(&config.roster_file)?;
        let categories = [
            config.session_category.as_str(),
            config.load_category.as_str(),
        ];
        let mut tables =
            assemble::assemble(&config.data_root, &categories, &roster, config.save_dir())?
                .into_iter();
        let sessions = tables.next().context("no session table assembled")?;
        let loads = tables.next().context("no load table assembled")?;

        let snapshot = Snapshot::from_tables(roster, &sessions, &loads)?;
        info!(
            "snapshot ready: {} session rows, {} load rows, {} athletes",
            snapshot.sessions.len(),
            snapshot.loads.len(),
            snapshot.roster.len()
        );
        Ok(Arc::new(snapshot))
    }

    /// Decode assembled tables into typed records.
    pub fn from_tables(roster: Roster, sessions: &Table, loads: &Table) -> Result<Self> {
        Ok(Snapshot {
            roster,
            sessions: decode(sessions).context("decoding session table")?,
            loads: decode(loads).context("decoding load table")?,
        })
    }

    pub fn from_records(
        roster: Roster,
        sessions: Vec<SessionRecord>,
        loads: Vec<LoadRecord>,
    ) -> Arc<Self> {
        Arc::new(Snapshot {
            roster,
            sessions,
            loads,
        })
    }
}

/// A category with no files has no columns either; that is an empty
/// dataset, not a schema violation.
fn decode<R: FromTable>(table: &Table) -> Result<Vec<R>> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }
    Ok(R::from_table(table)?)
}
