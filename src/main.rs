use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pitchside::dashboard::DEFAULT_PAGE_SIZE;
use pitchside::{
    Dashboard, DashboardConfig, Population, Selection, Snapshot, SpeedZone, TimeFrame,
};

/// Build the training dashboard data and print it as JSON.
#[derive(Debug, Parser)]
#[command(name = "pitchside", version, about)]
struct Cli {
    /// TOML configuration file (defaults to the ./data layout).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SHORT (last session), MEDIUM (7 days) or LONG (31 days).
    #[arg(short, long, default_value = "SHORT")]
    time_frame: TimeFrame,

    /// ALL, AV (forwards) or AR (backs).
    #[arg(short, long, default_value = "ALL")]
    population: Population,

    /// Speed zone of the per-athlete bar chart, e.g. DPZV14e19.
    #[arg(short, long, default_value = "DPZV0e6")]
    zone: SpeedZone,

    /// Skip writing the processed CSV exports.
    #[arg(long)]
    no_save: bool,

    /// Zero-based page of the raw session table.
    #[arg(long, default_value_t = 0)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if cli.no_save {
        config.save_processed = false;
    }

    let snapshot = Snapshot::load(&config)?;
    let dashboard = Dashboard::new(snapshot);

    let selection = Selection::new(cli.time_frame, cli.population);
    info!(
        "report for {} / {}",
        selection.time_frame, selection.population
    );
    let report = dashboard.report(selection, cli.zone, cli.page, cli.page_size);

    let json = serde_json::to_string_pretty(&report).context("serialising report")?;
    println!("{json}");
    Ok(())
}
