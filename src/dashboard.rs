//! Chart-ready payloads, one handler per dashboard panel.
//!
//! Every handler takes the current [`Selection`] and reads the shared
//! [`Snapshot`]; nothing here mutates it. Empty payloads are a normal "no
//! data" state and render with [`NO_DATA_MESSAGE`].

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::controls::{HeartRateZone, Population, SpeedZone, TimeFrame};
use crate::data::aggregate::{
    group_reduce, group_rows, histogram, mean, per_entity_then_per_period, plausible_power,
    recorded, round2, Bin, Reducer, Series,
};
use crate::data::filter::{View, Window};
use crate::data::schema::{LoadRecord, SessionRecord};
use crate::snapshot::Snapshot;

pub const NO_DATA_MESSAGE: &str = "Pas de données disponibles";

/// Diameter of the largest scatter marker.
pub const MAX_MARKER_DIAMETER: f64 = 40.0;
pub const MIN_MARKER_DIAMETER: f64 = 4.0;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_POWER_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub time_frame: TimeFrame,
    pub population: Population,
}

impl Selection {
    pub fn new(time_frame: TimeFrame, population: Population) -> Self {
        Selection {
            time_frame,
            population,
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.time_frame.days(), self.population.position())
    }

    /// Window for time-series panels, see [`TimeFrame::trend_days`].
    pub fn trend_window(&self) -> Window {
        Window::new(self.time_frame.trend_days(), self.population.position())
    }

    /// Caption fragment: "le Dernier Entraînement" or "7 Jours".
    pub fn period_label(&self) -> String {
        match self.time_frame.days() {
            0 => "le Dernier Entraînement".to_string(),
            d => format!("{d} Jours"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Headline numbers, rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub mental_fatigue: Option<f64>,
    pub physical_rpe: Option<f64>,
    pub hr_mean: Option<f64>,
    pub hr_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatigueTrend {
    pub window_days: u32,
    pub physical: Series<NaiveDate>,
    pub mental: Series<NaiveDate>,
}

impl FatigueTrend {
    pub fn is_empty(&self) -> bool {
        self.physical.is_empty() && self.mental.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneBars {
    pub zone: SpeedZone,
    pub label: &'static str,
    pub per_athlete: Series<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub athlete: String,
    /// Low-frequency heart-rate variability (x).
    pub hrv_low: Option<f64>,
    /// High-frequency heart-rate variability (y).
    pub hrv_high: Option<f64>,
    /// Marker size and colour.
    pub hr_max: f64,
}

/// Area-proportional marker sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerScale {
    pub size_ref: f64,
    pub size_min: f64,
}

impl MarkerScale {
    /// Scale such that the largest value gets the reference area.
    pub fn for_max(max_size: f64) -> Option<Self> {
        (max_size > 0.0).then(|| MarkerScale {
            size_ref: 2.0 * max_size / MAX_MARKER_DIAMETER.powi(2),
            size_min: MIN_MARKER_DIAMETER,
        })
    }

    /// Rendered diameter of a marker of `value`.
    pub fn diameter(&self, value: f64) -> f64 {
        (value.max(0.0) / self.size_ref).sqrt().max(self.size_min)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardiacScatter {
    pub points: Vec<ScatterPoint>,
    pub marker: Option<MarkerScale>,
}

impl CardiacScatter {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<Z> {
    pub zone: Z,
    pub label: &'static str,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneBreakdown {
    /// Mean distance per speed zone.
    pub speed: Vec<Slice<SpeedZone>>,
    /// Mean time per heart-rate zone, monitored sessions only.
    pub heart_rate: Vec<Slice<HeartRateZone>>,
}

impl ZoneBreakdown {
    pub fn is_empty(&self) -> bool {
        self.speed.iter().all(|s| s.value.is_none())
            && self.heart_rate.iter().all(|s| s.value.is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerDistribution {
    pub samples: usize,
    pub mean: Option<f64>,
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub rows: Vec<SessionRecord>,
}

/// Every panel for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub selection: Selection,
    pub period: String,
    pub summary: Summary,
    pub fatigue_trend: FatigueTrend,
    pub speed_zone_bars: ZoneBars,
    pub cardiac_variability: CardiacScatter,
    pub zone_breakdown: ZoneBreakdown,
    pub sprint_trend: Series<NaiveDate>,
    pub power_trend: Series<NaiveDate>,
    pub power_distribution: PowerDistribution,
    pub table: TablePage,
}

// ---------------------------------------------------------------------------
// Dashboard – request handlers over the shared snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Dashboard {
    snapshot: Arc<Snapshot>,
}

impl Dashboard {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Dashboard { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn sessions(&self, window: Window) -> View<'_, SessionRecord> {
        View::all(&self.snapshot.sessions).filter(window)
    }

    pub fn loads(&self, window: Window) -> View<'_, LoadRecord> {
        View::all(&self.snapshot.loads).filter(window)
    }

    pub fn summary(&self, sel: Selection) -> Summary {
        let loads = self.loads(sel.window());
        let sessions = self.sessions(sel.window());
        Summary {
            mental_fatigue: mean(loads.iter().filter_map(|r| r.mental_fatigue)).map(round2),
            physical_rpe: mean(loads.iter().filter_map(|r| r.physical_rpe)).map(round2),
            hr_mean: mean(sessions.iter().filter_map(|r| recorded(r.hr_mean))).map(round2),
            hr_max: mean(sessions.iter().filter_map(|r| recorded(r.hr_max))).map(round2),
        }
    }

    /// Squad mean of RPE and mental fatigue per date.
    pub fn fatigue_trend(&self, sel: Selection) -> FatigueTrend {
        let window = sel.trend_window();
        let loads = self.loads(window);
        FatigueTrend {
            window_days: window.days,
            physical: group_reduce(loads.iter(), |r| r.date, |r| r.physical_rpe, Reducer::Mean),
            mental: group_reduce(loads.iter(), |r| r.date, |r| r.mental_fatigue, Reducer::Mean),
        }
    }

    /// Total distance covered in `zone`, per athlete.
    pub fn speed_zone_by_athlete(&self, sel: Selection, zone: SpeedZone) -> ZoneBars {
        let sessions = self.sessions(sel.window());
        ZoneBars {
            zone,
            label: zone.label(),
            per_athlete: group_reduce(
                sessions.iter(),
                |r| r.athlete.clone(),
                |r| r.speed_zones[zone.index()],
                Reducer::Sum,
            ),
        }
    }

    /// Per-athlete heart-rate variability, monitored sessions only.
    pub fn cardiac_variability(&self, sel: Selection) -> CardiacScatter {
        let monitored = self
            .sessions(sel.window())
            .retain(|r| recorded(r.hr_max).is_some());

        let points: Vec<ScatterPoint> = group_rows(monitored.iter(), |r| r.athlete.clone())
            .into_iter()
            .filter_map(|(athlete, rows)| {
                let hr_max = mean(rows.iter().filter_map(|r| recorded(r.hr_max)))?;
                Some(ScatterPoint {
                    athlete,
                    hrv_low: mean(rows.iter().filter_map(|r| r.hrv_low)),
                    hrv_high: mean(rows.iter().filter_map(|r| r.hrv_high)),
                    hr_max,
                })
            })
            .collect();

        let marker = points
            .iter()
            .map(|p| p.hr_max)
            .reduce(f64::max)
            .and_then(MarkerScale::for_max);
        CardiacScatter { points, marker }
    }

    pub fn zone_breakdown(&self, sel: Selection) -> ZoneBreakdown {
        let sessions = self.sessions(sel.window());
        let monitored = sessions.retain(|r| recorded(r.hr_max).is_some());

        ZoneBreakdown {
            speed: SpeedZone::ALL
                .iter()
                .map(|&zone| Slice {
                    zone,
                    label: zone.label(),
                    value: mean(sessions.iter().filter_map(|r| r.speed_zones[zone.index()])),
                })
                .collect(),
            heart_rate: HeartRateZone::ALL
                .iter()
                .map(|&zone| Slice {
                    zone,
                    label: zone.label(),
                    value: mean(monitored.iter().filter_map(|r| r.hr_zones[zone.index()])),
                })
                .collect(),
        }
    }

    /// Average sprints per athlete per date.
    pub fn sprint_trend(&self, sel: Selection) -> Series<NaiveDate> {
        let sessions = self.sessions(sel.trend_window());
        per_entity_then_per_period(
            sessions.iter(),
            |r| r.athlete.clone(),
            |r| r.date,
            |r| r.sprints,
        )
    }

    /// Average power per athlete per date, artefacts excluded.
    pub fn power_trend(&self, sel: Selection) -> Series<NaiveDate> {
        let sessions = self.sessions(sel.trend_window());
        per_entity_then_per_period(
            sessions.iter(),
            |r| r.athlete.clone(),
            |r| r.date,
            |r| plausible_power(r.power),
        )
    }

    pub fn power_distribution(&self, sel: Selection, bins: usize) -> PowerDistribution {
        let values: Vec<f64> = self
            .sessions(sel.window())
            .iter()
            .filter_map(|r| plausible_power(r.power))
            .collect();
        PowerDistribution {
            samples: values.len(),
            mean: mean(values.iter().copied()).map(round2),
            bins: histogram(&values, bins),
        }
    }

    /// Zero-based page of the filtered session rows.
    pub fn raw_table(&self, sel: Selection, page: usize, page_size: usize) -> TablePage {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        let sessions = self.sessions(sel.window());
        let total_rows = sessions.len();
        TablePage {
            page,
            page_size,
            page_count: total_rows.div_ceil(page_size),
            total_rows,
            rows: sessions
                .iter()
                .skip(page.saturating_mul(page_size))
                .take(page_size)
                .cloned()
                .collect(),
        }
    }

    pub fn report(
        &self,
        sel: Selection,
        zone: SpeedZone,
        page: usize,
        page_size: usize,
    ) -> DashboardReport {
        DashboardReport {
            selection: sel,
            period: sel.period_label(),
            summary: self.summary(sel),
            fatigue_trend: self.fatigue_trend(sel),
            speed_zone_bars: self.speed_zone_by_athlete(sel, zone),
            cardiac_variability: self.cardiac_variability(sel),
            zone_breakdown: self.zone_breakdown(sel),
            sprint_trend: self.sprint_trend(sel),
            power_trend: self.power_trend(sel),
            power_distribution: self.power_distribution(sel, DEFAULT_POWER_BINS),
            table: self.raw_table(sel, page, page_size),
        }
    }
}
