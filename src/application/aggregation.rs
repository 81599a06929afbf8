// Aggregation engine - zone averages and ranked constraints
use crate::domain::lmp::{
    ConstraintEntry, ConstraintRecord, GlobalConstraintStat, PriceType, Reading, TimeSeries,
    ZoneAverage, ZoneId,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub const TOP_CONSTRAINTS: usize = 10;

const VARIANTS: [PriceType; 4] = [
    PriceType::Da,
    PriceType::Rt,
    PriceType::Net,
    PriceType::Congestion,
];

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean of each variant per zone, divided by that zone's own non-null count
/// so zones with gaps are not pulled toward zero.
pub fn calculate_zone_averages(series: &TimeSeries) -> ZoneAverage {
    let mut sums: HashMap<&ZoneId, [Accumulator; 4]> = HashMap::new();

    for step in series.steps() {
        for (zone, reading) in &step.readings {
            let acc = sums.entry(zone).or_default();
            for (slot, variant) in acc.iter_mut().zip(VARIANTS) {
                slot.add(reading.get(variant));
            }
        }
    }

    sums.into_iter()
        .map(|(zone, [da, rt, net, congestion])| {
            (
                zone.clone(),
                Reading::new(da.mean(), rt.mean(), net.mean(), congestion.mean()),
            )
        })
        .collect()
}

fn rank(mut entries: Vec<ConstraintEntry>) -> Vec<ConstraintEntry> {
    // Shadow prices are costs, so the most negative binds hardest.
    entries.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(TOP_CONSTRAINTS);
    entries
}

/// Summed shadow price per constraint divided by the hours in the window.
pub fn calculate_global_stats(
    constraints: &[ConstraintRecord],
    total_hours: usize,
) -> Vec<GlobalConstraintStat> {
    let hours = total_hours.max(1) as f64;
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for c in constraints {
        *totals.entry(c.name.as_str()).or_default() += c.shadow_price;
    }

    rank(
        totals
            .into_iter()
            .map(|(name, sum)| ConstraintEntry::new(name.to_string(), sum / hours))
            .collect(),
    )
}

/// Constraints binding at exactly `timestamp`, most negative first.
pub fn active_constraints_at(
    constraints: &[ConstraintRecord],
    timestamp: NaiveDateTime,
) -> Vec<ConstraintEntry> {
    rank(
        constraints
            .iter()
            .filter(|c| c.timestamp == Some(timestamp))
            .map(|c| ConstraintEntry::new(c.name.clone(), c.shadow_price))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lmp::TimeStep;
    use chrono::NaiveDate;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 14)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn rt(value: Option<f64>) -> Reading {
        Reading::new(None, value, None, None)
    }

    fn series(rows: Vec<Vec<(&str, Reading)>>) -> TimeSeries {
        let steps = rows
            .into_iter()
            .enumerate()
            .map(|(i, zones)| {
                TimeStep::new(
                    hour(i as u32),
                    zones.into_iter().map(|(z, r)| (z.to_string(), r)).collect(),
                )
            })
            .collect();
        TimeSeries::from_sorted(steps)
    }

    fn record(name: &str, h: u32, price: f64) -> ConstraintRecord {
        ConstraintRecord {
            name: name.to_string(),
            timestamp: Some(hour(h)),
            shadow_price: price,
        }
    }

    #[test]
    fn test_single_zone_mean() {
        let s = series(vec![
            vec![("A", rt(Some(10.0)))],
            vec![("A", rt(Some(20.0)))],
            vec![("A", rt(Some(30.0)))],
        ]);
        let averages = calculate_zone_averages(&s);
        assert_eq!(averages["A"].rt, Some(20.0));
        assert_eq!(averages["A"].da, None);
    }

    #[test]
    fn test_gaps_do_not_dilute() {
        let s = series(vec![
            vec![("A", rt(Some(10.0))), ("B", rt(Some(40.0)))],
            vec![("A", rt(Some(10.0)))],
            vec![("A", rt(Some(10.0))), ("B", rt(Some(60.0)))],
            vec![("A", rt(Some(10.0))), ("B", rt(None))],
        ]);
        let averages = calculate_zone_averages(&s);
        assert_eq!(averages["A"].rt, Some(10.0));
        assert_eq!(averages["B"].rt, Some(50.0));
    }

    #[test]
    fn test_global_stats_divides_by_hours() {
        let records = vec![
            record("X", 0, -10.0),
            record("X", 1, -30.0),
            record("Y", 0, -5.0),
            record("Z", 1, 4.0),
        ];
        let stats = calculate_global_stats(&records, 4);
        assert_eq!(
            stats,
            vec![
                ConstraintEntry::new("X".to_string(), -10.0),
                ConstraintEntry::new("Y".to_string(), -1.25),
                ConstraintEntry::new("Z".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_global_stats_top_ten() {
        let records: Vec<_> = (0..15)
            .map(|i| record(&format!("C{i:02}"), 0, -(i as f64)))
            .collect();
        let stats = calculate_global_stats(&records, 1);
        assert_eq!(stats.len(), TOP_CONSTRAINTS);
        assert_eq!(stats[0].name, "C14");
        assert_eq!(stats[9].name, "C05");
    }

    #[test]
    fn test_active_constraints_match_exact_hour() {
        let records = vec![
            record("X", 1, -3.0),
            record("Y", 2, -50.0),
            record("Z", 1, -8.0),
            ConstraintRecord {
                name: "undated".to_string(),
                timestamp: None,
                shadow_price: -99.0,
            },
        ];
        let active = active_constraints_at(&records, hour(1));
        let names: Vec<_> = active.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "X"]);
    }
}
