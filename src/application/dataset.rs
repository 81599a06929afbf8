// Derived model for one filter application
use crate::application::aggregation::{calculate_global_stats, calculate_zone_averages};
use crate::application::ingestion::{ingest_constraints, ingest_zones};
use crate::domain::lmp::{
    ConstraintRecord, GlobalConstraintStat, LmpRangeResponse, TimeSeries, ZoneAverage, ZoneId,
};
use std::collections::BTreeSet;

/// Built once per successful load and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub series: TimeSeries,
    pub averages: ZoneAverage,
    pub constraints: Vec<ConstraintRecord>,
    pub global_constraints: Vec<GlobalConstraintStat>,
    pub zones: BTreeSet<ZoneId>,
}

impl Dataset {
    pub fn build(response: &LmpRangeResponse) -> Self {
        let series = ingest_zones(&response.zones);
        let constraints = ingest_constraints(&response.constraints);
        // One step per hour in the filtered window
        let global_constraints = calculate_global_stats(&constraints, series.len());
        let averages = calculate_zone_averages(&series);
        let zones = series.zones();

        Self {
            series,
            averages,
            constraints,
            global_constraints,
            zones,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
