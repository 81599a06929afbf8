// In-memory display consumers read by the HTTP layer
use crate::application::render_sync::{ConstraintPanel, MapLayer, Sidebar, StatusPanel};
use crate::domain::color::{Color, LegendEntry};
use crate::domain::lmp::ConstraintEntry;
use crate::domain::view::DataStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Serialize)]
pub struct SidebarValue {
    pub formatted: String,
    pub color: Color,
}

/// What a browser would currently be showing.
#[derive(Debug, Clone, Serialize)]
pub struct DisplaySnapshot {
    pub status: DataStatus,
    pub time_label: String,
    pub zone_colors: BTreeMap<String, Color>,
    pub highlighted_zones: Vec<String>,
    pub sidebar: BTreeMap<String, SidebarValue>,
    pub constraints: Vec<ConstraintEntry>,
    pub constraint_unit: String,
    pub legend: Vec<LegendEntry>,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            status: DataStatus::Idle,
            time_label: String::new(),
            zone_colors: BTreeMap::new(),
            highlighted_zones: Vec::new(),
            sidebar: BTreeMap::new(),
            constraints: Vec::new(),
            constraint_unit: String::new(),
            legend: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotDisplay {
    inner: Arc<RwLock<DisplaySnapshot>>,
}

impl SnapshotDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update<F: FnOnce(&mut DisplaySnapshot)>(&self, f: F) {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl MapLayer for SnapshotDisplay {
    fn set_zone_color(&self, zone: &str, color: Color) {
        self.update(|s| {
            s.zone_colors.insert(zone.to_string(), color);
        });
    }

    fn set_zone_border_highlight(&self, zone: &str, highlighted: bool) {
        self.update(|s| {
            s.highlighted_zones.retain(|z| z != zone);
            if highlighted {
                s.highlighted_zones.push(zone.to_string());
            }
        });
    }
}

impl Sidebar for SnapshotDisplay {
    fn set_zone_display_value(&self, zone: &str, formatted: &str, color: Color) {
        self.update(|s| {
            s.sidebar.insert(
                zone.to_string(),
                SidebarValue {
                    formatted: formatted.to_string(),
                    color,
                },
            );
        });
    }
}

impl ConstraintPanel for SnapshotDisplay {
    fn set_constraint_list(&self, entries: &[ConstraintEntry], unit_label: &str) {
        self.update(|s| {
            s.constraints = entries.to_vec();
            s.constraint_unit = unit_label.to_string();
        });
    }
}

impl StatusPanel for SnapshotDisplay {
    fn set_time_label(&self, label: &str, status: &DataStatus) {
        self.update(|s| {
            s.time_label = label.to_string();
            s.status = status.clone();
        });
    }

    fn set_legend(&self, legend: &[LegendEntry]) {
        self.update(|s| s.legend = legend.to_vec());
    }
}
