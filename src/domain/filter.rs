// Query filter sent to the LMP backend
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{DashboardError, Result};

/// Days use the `DAYOFWEEK` convention: 1 = Sunday ... 7 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmpFilter {
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub days_of_week: Vec<u8>,
    pub start_hour: u8,
    pub end_hour: u8,
    #[serde(default)]
    pub monitored_facility: Option<String>,
}

impl LmpFilter {
    pub fn validate(&self) -> Result<()> {
        if self.start_day > self.end_day {
            return Err(DashboardError::InvalidFilter(format!(
                "start_day {} is after end_day {}",
                self.start_day, self.end_day
            )));
        }
        if let Some(day) = self.days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(DashboardError::InvalidFilter(format!(
                "day of week {} outside 1..=7",
                day
            )));
        }
        if self.end_hour > 24 || self.start_hour > self.end_hour {
            return Err(DashboardError::InvalidFilter(format!(
                "hour range {}..{} outside 0..=24",
                self.start_hour, self.end_hour
            )));
        }
        Ok(())
    }

    pub fn hours_per_day(&self) -> u32 {
        u32::from(self.end_hour.saturating_sub(self.start_hour))
    }

    /// Calendar estimate of the hours the filter selects, before any data arrives.
    pub fn estimated_hours(&self) -> u32 {
        let mut total = 0;
        let mut day = self.start_day;
        while day <= self.end_day {
            let dow = day.weekday().number_from_sunday() as u8;
            if self.days_of_week.contains(&dow) {
                total += self.hours_per_day();
            }
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        total
    }
}

impl Default for LmpFilter {
    fn default() -> Self {
        let day = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or_default();
        Self {
            start_day: day,
            end_day: day,
            days_of_week: vec![2, 3, 4, 5, 6],
            start_hour: 15,
            end_hour: 20,
            monitored_facility: None,
        }
    }
}
