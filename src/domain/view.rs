// View state and the data source the resolver reads from
use serde::Serialize;

use super::lmp::{PriceType, Reading, TimeStep, ZoneAverage, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Average,
    Stepped,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub mode: ViewMode,
    pub current_index: usize,
    pub price_type: PriceType,
    pub reference_zone: Option<ZoneId>,
}

impl ViewState {
    /// Reference zone that is in effect for the active price type.
    pub fn active_reference(&self) -> Option<&str> {
        match self.price_type {
            PriceType::Congestion => self.reference_zone.as_deref(),
            _ => None,
        }
    }
}

/// Where zone readings come from for the current view.
#[derive(Debug, Clone, Copy)]
pub enum DataSource<'a> {
    Stepped(&'a TimeStep),
    Averaged(&'a ZoneAverage),
}

impl<'a> DataSource<'a> {
    pub fn reading(&self, zone: &str) -> Option<&'a Reading> {
        match self {
            DataSource::Stepped(step) => step.readings.get(zone),
            DataSource::Averaged(averages) => averages.get(zone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum DataStatus {
    Idle,
    Loading,
    Ready,
    NoData,
    Error(String),
}

impl DataStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, DataStatus::Ready)
    }
}
