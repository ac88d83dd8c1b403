//! Writes a synthetic squad data tree:
//!
//! ```text
//! <out>/postes.csv            roster (Id, Nom, Position)
//! <out>/Seances/<date>.parquet GPS / heart-rate sessions
//! <out>/RPE/<date>.csv         post-session questionnaires
//! <out>/pitchside.toml         config pointing at the above
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use log::info;
use parquet::arrow::ArrowWriter;

use pitchside::data::schema::columns;

const SQUAD: [(&str, &str); 8] = [
    ("Lea Martin", "AV"),
    ("Ines Bernard", "AV"),
    ("Chloe Petit", "AV"),
    ("Manon Roux", "AV"),
    ("Zoe Girard", "AR"),
    ("Jade Moreau", "AR"),
    ("Lina Fournier", "AR"),
    ("Emma Lefevre", "AR"),
];

/// Session days relative to the first one; a short block then a match week.
const SESSION_DAYS: [u64; 8] = [0, 2, 4, 7, 9, 11, 14, 16];

/// Deterministic splitmix64 stream.
struct Noise(u64);

impl Noise {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn session_batch(date: NaiveDate, noise: &mut Noise) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let days_since_epoch = (date - epoch).num_days() as i32;
    let n = SQUAD.len();

    let mut float_cols: Vec<(&str, Vec<f64>)> = Vec::new();
    let mut push = |name: &'static str, values: Vec<f64>| float_cols.push((name, values));

    let distance: Vec<f64> = (0..n).map(|_| noise.range(3500.0, 7500.0)).collect();
    let minutes: Vec<f64> = (0..n).map(|_| noise.range(60.0, 90.0)).collect();
    let lap_times: Vec<String> = minutes
        .iter()
        .map(|m| {
            let secs = (m * 60.0) as u32;
            format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
        })
        .collect();

    push(columns::DISTANCE, distance.clone());
    push(
        columns::METERS_PER_MINUTE,
        distance.iter().zip(&minutes).map(|(d, m)| d / m).collect(),
    );
    push(columns::SPEED_MEAN, (0..n).map(|_| noise.range(3.5, 6.0)).collect());
    push(columns::SPEED_MAX, (0..n).map(|_| noise.range(22.0, 31.0)).collect());

    // One athlete in eight plays without a monitor: exports write zeros.
    let monitored: Vec<bool> = (0..n).map(|_| noise.next_f64() > 0.125).collect();
    let hr = |lo: f64, hi: f64, noise: &mut Noise| -> Vec<f64> {
        monitored
            .iter()
            .map(|&m| if m { noise.range(lo, hi).round() } else { 0.0 })
            .collect()
    };
    push(columns::HR_MEAN, hr(120.0, 160.0, &mut *noise));
    push(columns::HR_MIN, hr(55.0, 75.0, &mut *noise));
    push(columns::HR_MAX, hr(175.0, 205.0, &mut *noise));

    for (&zone, share) in columns::SPEED_ZONES.iter().zip([0.1, 0.45, 0.25, 0.13, 0.07]) {
        push(zone, distance.iter().map(|d| d * share * noise.range(0.8, 1.2)).collect());
    }
    for (&zone, share) in columns::HEART_RATE_ZONES.iter().zip([0.05, 0.25, 0.4, 0.22, 0.08]) {
        push(
            zone,
            minutes
                .iter()
                .zip(&monitored)
                .map(|(m, &on)| if on { m * 60.0 * share } else { 0.0 })
                .collect(),
        );
    }
    push(columns::HRV_HIGH, (0..n).map(|_| noise.range(10.0, 45.0)).collect());
    push(columns::HRV_LOW, (0..n).map(|_| noise.range(20.0, 70.0)).collect());
    push(columns::HRV_RATIO, (0..n).map(|_| noise.range(0.3, 1.5)).collect());
    // Occasional power spikes above the plausibility ceiling.
    push(
        columns::POWER,
        (0..n)
            .map(|_| {
                if noise.next_f64() < 0.05 {
                    noise.range(250.0, 900.0)
                } else {
                    noise.range(60.0, 180.0)
                }
            })
            .collect(),
    );
    let sprints: Vec<i64> = (0..n).map(|_| noise.range(0.0, 12.0) as i64).collect();

    let mut fields = vec![
        Field::new(columns::ATHLETE, DataType::Utf8, false),
        Field::new(columns::DATE, DataType::Date32, false),
        Field::new(columns::LAP_TIME, DataType::Utf8, false),
        Field::new(columns::SPRINTS, DataType::Int64, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(SQUAD.iter().map(|(name, _)| *name).collect::<Vec<_>>())),
        Arc::new(Date32Array::from(vec![days_since_epoch; n])),
        Arc::new(StringArray::from(lap_times)),
        Arc::new(Int64Array::from(sprints)),
    ];
    for (name, values) in float_cols {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(values)));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building session batch")
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn write_rpe(date: NaiveDate, path: &Path, noise: &mut Noise) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        columns::ATHLETE,
        columns::DATE,
        columns::MENTAL_FATIGUE,
        columns::PHYSICAL_RPE,
    ])?;
    let day = date.format("%Y-%m-%d").to_string();
    for (name, _) in SQUAD {
        let mental = noise.range(1.0, 10.0).round().to_string();
        let physical = noise.range(2.0, 10.0).round().to_string();
        writer.write_record([name, day.as_str(), mental.as_str(), physical.as_str()])?;
    }
    // A trialist who is not on the roster yet.
    writer.write_record(["Guest Trialist", day.as_str(), "5", "6"])?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let sessions_dir = out.join("Seances");
    let rpe_dir = out.join("RPE");
    fs::create_dir_all(&sessions_dir)?;
    fs::create_dir_all(&rpe_dir)?;

    let mut roster = csv::Writer::from_path(out.join("postes.csv"))?;
    roster.write_record(["Id", columns::ATHLETE, columns::POSITION])?;
    for (i, &(name, position)) in SQUAD.iter().enumerate() {
        roster.write_record([(i + 1).to_string().as_str(), name, position])?;
    }
    roster.flush()?;

    let mut noise = Noise(42);
    let start = NaiveDate::from_ymd_opt(2020, 1, 6).context("start date")?;
    for offset in SESSION_DAYS {
        let date = start + Days::new(offset);
        let stem = date.format("%Y%m%d").to_string();

        let batch = session_batch(date, &mut noise)?;
        write_parquet(&batch, &sessions_dir.join(format!("{stem}.parquet")))?;
        write_rpe(date, &rpe_dir.join(format!("{stem}.csv")), &mut noise)?;
    }

    let config = pitchside::DashboardConfig {
        data_root: out.clone(),
        roster_file: out.join("postes.csv"),
        processed_dir: out.join("_processed"),
        ..Default::default()
    };
    fs::write(out.join("pitchside.toml"), toml::to_string_pretty(&config)?)?;

    info!("sample data written to {}", out.display());
    println!(
        "Wrote {} sessions for {} athletes to {}",
        SESSION_DAYS.len(),
        SQUAD.len(),
        out.display()
    );
    Ok(())
}
