// Reading ingestion - zone-keyed observations to a sorted time series
use crate::domain::lmp::{
    ConstraintRecord, RawConstraint, Reading, TimeSeries, TimeStep, ZoneId, ZoneObservation,
};
use chrono::{DateTime, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a backend timestamp. Offsets are dropped so every value stays in
/// market-local (EPT) wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Group observations by timestamp and return steps in ascending order.
///
/// Grouping is keyed on the parsed timestamp, so `2025-07-14 15:00:00` and
/// `2025-07-14T15:00:00` land in the same step. Observations with an
/// unparseable timestamp are dropped.
pub fn ingest_zones(zones: &HashMap<ZoneId, Vec<ZoneObservation>>) -> TimeSeries {
    let mut by_time: BTreeMap<NaiveDateTime, HashMap<ZoneId, Reading>> = BTreeMap::new();
    let mut dropped = 0usize;

    for (zone, observations) in zones {
        for obs in observations {
            let Some(timestamp) = parse_timestamp(&obs.datetime_beginning_ept) else {
                dropped += 1;
                continue;
            };
            let values = &obs.lmp_values;
            let previous = by_time.entry(timestamp).or_default().insert(
                zone.clone(),
                Reading::new(values.da, values.rt, values.net, values.congestion),
            );
            // Repeated wall-clock hour, e.g. the DST fall-back day; the later row wins
            if previous.is_some() {
                tracing::warn!("Zone {} has more than one reading at {}", zone, timestamp);
            }
        }
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} observations with unparseable timestamps", dropped);
    }

    let steps = by_time
        .into_iter()
        .map(|(timestamp, readings)| TimeStep::new(timestamp, readings))
        .collect();
    TimeSeries::from_sorted(steps)
}

/// Constraint rows keep their order; a missing price counts as zero cost.
pub fn ingest_constraints(raw: &[RawConstraint]) -> Vec<ConstraintRecord> {
    raw.iter()
        .filter_map(|c| {
            let name = c.name.clone()?;
            Some(ConstraintRecord {
                name,
                timestamp: c.timestamp.as_deref().and_then(parse_timestamp),
                shadow_price: c.shadow_price.unwrap_or(0.0),
            })
        })
        .collect()
}
