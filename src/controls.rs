//! Selector vocabularies shared by the pipeline and the presentation layer.
//!
//! Each enum parses from its short key (`SHORT`, `AV`, `DPZV0e6`, ...) and
//! carries the French label displayed in the dashboard controls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::roster::Position;
use crate::data::schema::columns;

/// Window used by the fatigue trend when the selector asks for the last
/// session only; a single-date trend line carries no information.
pub const TREND_FALLBACK_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseControlError {
    pub kind: &'static str,
    pub value: String,
}

fn lookup<T: Copy>(
    kind: &'static str,
    all: &[T],
    key: impl Fn(T) -> &'static str,
    s: &str,
) -> Result<T, ParseControlError> {
    all.iter()
        .copied()
        .find(|v| key(*v).eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| ParseControlError {
            kind,
            value: s.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Time frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFrame {
    /// Most recent session date only.
    #[default]
    #[serde(rename = "SHORT")]
    Short,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LONG")]
    Long,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 3] = [TimeFrame::Short, TimeFrame::Medium, TimeFrame::Long];

    /// Trailing window length in days.
    pub fn days(self) -> u32 {
        match self {
            TimeFrame::Short => 0,
            TimeFrame::Medium => 7,
            TimeFrame::Long => 31,
        }
    }

    /// Window for trend charts: never narrower than [`TREND_FALLBACK_DAYS`]
    /// when the selector means "last session".
    pub fn trend_days(self) -> u32 {
        match self.days() {
            0 => TREND_FALLBACK_DAYS,
            d => d,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TimeFrame::Short => "SHORT",
            TimeFrame::Medium => "MEDIUM",
            TimeFrame::Long => "LONG",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeFrame::Short => "Dernier Entraînement",
            TimeFrame::Medium => "7 jours",
            TimeFrame::Long => "31 jours",
        }
    }
}

impl FromStr for TimeFrame {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("time frame", &Self::ALL, Self::key, s)
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Population {
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "AV")]
    Forwards,
    #[serde(rename = "AR")]
    Backs,
}

impl Population {
    pub const ALL: [Population; 3] = [Population::All, Population::Forwards, Population::Backs];

    /// The roster position this selector restricts to, `None` for everyone.
    pub fn position(self) -> Option<Position> {
        match self {
            Population::All => None,
            Population::Forwards => Some(Position::Forwards),
            Population::Backs => Some(Position::Backs),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Population::All => "ALL",
            Population::Forwards => Position::Forwards.key(),
            Population::Backs => Position::Backs.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Population::All => "Tout",
            Population::Forwards => "Avants",
            Population::Backs => "Arrières",
        }
    }
}

impl FromStr for Population {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("population", &Self::ALL, Self::key, s)
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Speed zones (DPZV) and heart-rate zones (TZFC)
// ---------------------------------------------------------------------------

/// Distance covered within a speed band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpeedZone {
    #[default]
    #[serde(rename = "DPZV0e6")]
    Walk,
    #[serde(rename = "DPZV6e14")]
    Jog,
    #[serde(rename = "DPZV14e19")]
    Run,
    #[serde(rename = "DPZV19e24")]
    HighSpeed,
    #[serde(rename = "DPZV24e40")]
    Sprint,
}

impl SpeedZone {
    pub const ALL: [SpeedZone; 5] = [
        SpeedZone::Walk,
        SpeedZone::Jog,
        SpeedZone::Run,
        SpeedZone::HighSpeed,
        SpeedZone::Sprint,
    ];

    pub fn column(self) -> &'static str {
        columns::SPEED_ZONES[self.index()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedZone::Walk => "0-6km/h",
            SpeedZone::Jog => "6-14km/h",
            SpeedZone::Run => "14-19km/h",
            SpeedZone::HighSpeed => "19-24km/h",
            SpeedZone::Sprint => "24-40km/h",
        }
    }
}

impl FromStr for SpeedZone {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("speed zone", &Self::ALL, Self::column, s)
    }
}

/// Time spent within a heart-rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeartRateZone {
    #[serde(rename = "Tzfc0e70")]
    Rest,
    #[serde(rename = "Tzfc70e110")]
    Light,
    #[serde(rename = "Tzfc110e150")]
    Moderate,
    #[serde(rename = "Tzfc150e180")]
    Hard,
    #[serde(rename = "Tzfc180e250")]
    Maximal,
}

impl HeartRateZone {
    pub const ALL: [HeartRateZone; 5] = [
        HeartRateZone::Rest,
        HeartRateZone::Light,
        HeartRateZone::Moderate,
        HeartRateZone::Hard,
        HeartRateZone::Maximal,
    ];

    pub fn column(self) -> &'static str {
        columns::HEART_RATE_ZONES[self.index()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            HeartRateZone::Rest => "0-70bpm",
            HeartRateZone::Light => "70-110bpm",
            HeartRateZone::Moderate => "110-150bpm",
            HeartRateZone::Hard => "150-180bpm",
            HeartRateZone::Maximal => "180-250bpm",
        }
    }
}

impl FromStr for HeartRateZone {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("heart-rate zone", &Self::ALL, Self::column, s)
    }
}
