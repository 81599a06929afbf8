// LMP price domain models
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use super::error::DashboardError;

pub type ZoneId = String;

/// The four price variants reported for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Da,
    Rt,
    Net,
    Congestion,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Da => "da",
            PriceType::Rt => "rt",
            PriceType::Net => "net",
            PriceType::Congestion => "congestion",
        }
    }

    /// Net and congestion are signed around zero and use the diverging scale.
    pub fn is_diverging(&self) -> bool {
        matches!(self, PriceType::Net | PriceType::Congestion)
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "da" => Ok(PriceType::Da),
            "rt" => Ok(PriceType::Rt),
            "net" => Ok(PriceType::Net),
            "congestion" => Ok(PriceType::Congestion),
            other => Err(DashboardError::InvalidPriceType(other.to_string())),
        }
    }
}

/// Prices for one zone at one timestamp. Missing values stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    pub da: Option<f64>,
    pub rt: Option<f64>,
    pub net: Option<f64>,
    pub congestion: Option<f64>,
}

impl Reading {
    pub fn new(da: Option<f64>, rt: Option<f64>, net: Option<f64>, congestion: Option<f64>) -> Self {
        Self {
            da,
            rt,
            net,
            congestion,
        }
    }

    pub fn get(&self, price_type: PriceType) -> Option<f64> {
        match price_type {
            PriceType::Da => self.da,
            PriceType::Rt => self.rt,
            PriceType::Net => self.net,
            PriceType::Congestion => self.congestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    pub timestamp: NaiveDateTime,
    pub readings: HashMap<ZoneId, Reading>,
}

impl TimeStep {
    pub fn new(timestamp: NaiveDateTime, readings: HashMap<ZoneId, Reading>) -> Self {
        Self {
            timestamp,
            readings,
        }
    }
}

/// Hourly steps in strictly increasing timestamp order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    steps: Vec<TimeStep>,
}

impl TimeSeries {
    /// Callers must hand over steps already sorted and free of duplicates.
    pub(crate) fn from_sorted(steps: Vec<TimeStep>) -> Self {
        debug_assert!(steps.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { steps }
    }

    pub fn steps(&self) -> &[TimeStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&TimeStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    /// Every zone reported in at least one step, sorted by name.
    pub fn zones(&self) -> BTreeSet<ZoneId> {
        self.steps
            .iter()
            .flat_map(|step| step.readings.keys().cloned())
            .collect()
    }
}

/// Per-zone mean of each price variant; a variant with no observations stays `None`.
pub type ZoneAverage = HashMap<ZoneId, Reading>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    pub name: String,
    pub timestamp: Option<NaiveDateTime>,
    pub shadow_price: f64,
}

/// One row of the ranked constraint list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintEntry {
    pub name: String,
    pub price: f64,
}

impl ConstraintEntry {
    pub fn new(name: String, price: f64) -> Self {
        Self { name, price }
    }
}

/// Constraint averaged over the whole filtered window.
pub type GlobalConstraintStat = ConstraintEntry;

// Wire shapes returned by the LMP query backend

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LmpRangeResponse {
    #[serde(default)]
    pub zones: HashMap<ZoneId, Vec<ZoneObservation>>,
    #[serde(default)]
    pub constraints: Vec<RawConstraint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneObservation {
    pub datetime_beginning_ept: String,
    #[serde(default)]
    pub lmp_values: RawPriceValues,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPriceValues {
    #[serde(default)]
    pub da: Option<f64>,
    #[serde(default)]
    pub rt: Option<f64>,
    #[serde(default)]
    pub net: Option<f64>,
    #[serde(default)]
    pub congestion: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConstraint {
    #[serde(default, alias = "monitored_facility")]
    pub name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub shadow_price: Option<f64>,
}
