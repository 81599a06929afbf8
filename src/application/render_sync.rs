// Render sync - fan-out of resolved values to the display consumers
use crate::application::aggregation::active_constraints_at;
use crate::application::dataset::Dataset;
use crate::application::resolver::ValueResolver;
use crate::domain::color::{Color, ColorScale, LegendEntry, NO_DATA_COLOR};
use crate::domain::lmp::{ConstraintEntry, PriceType, ZoneId};
use crate::domain::view::{DataSource, DataStatus, ViewMode, ViewState};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const SHADOW_PRICE_LABEL: &str = "Shadow Price";
pub const AVERAGE_PRICE_LABEL: &str = "Avg $/MWHr";

pub trait MapLayer: Send + Sync {
    fn set_zone_color(&self, zone: &str, color: Color);
    fn set_zone_border_highlight(&self, zone: &str, highlighted: bool);
}

pub trait Sidebar: Send + Sync {
    fn set_zone_display_value(&self, zone: &str, formatted: &str, color: Color);
}

pub trait ConstraintPanel: Send + Sync {
    fn set_constraint_list(&self, entries: &[ConstraintEntry], unit_label: &str);
}

/// Time display and legend above the map.
pub trait StatusPanel: Send + Sync {
    fn set_time_label(&self, label: &str, status: &DataStatus);
    fn set_legend(&self, legend: &[LegendEntry]);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDisplay {
    pub zone: ZoneId,
    pub value: Option<f64>,
    pub formatted: String,
    pub color: Color,
    pub highlighted: bool,
}

/// Everything the consumers need after one state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub status: DataStatus,
    pub mode: ViewMode,
    pub current_index: usize,
    pub step_count: usize,
    pub playing: bool,
    pub price_type: PriceType,
    pub reference_zone: Option<ZoneId>,
    pub time_label: String,
    pub zones: Vec<ZoneDisplay>,
    pub network: ZoneDisplay,
    pub constraints: Vec<ConstraintEntry>,
    pub constraint_unit: &'static str,
    pub legend: Vec<LegendEntry>,
}

impl RenderFrame {
    pub fn zone(&self, zone: &str) -> Option<&ZoneDisplay> {
        self.zones
            .iter()
            .chain(std::iter::once(&self.network))
            .find(|z| z.zone == zone)
    }
}

pub fn format_price(value: Option<f64>) -> String {
    value.map(|v| format!("${:.2}", v)).unwrap_or_default()
}

fn time_label(status: &DataStatus, view: &ViewState, dataset: Option<&Dataset>) -> String {
    match status {
        DataStatus::Idle => String::new(),
        DataStatus::Loading => "Querying Data...".to_string(),
        DataStatus::NoData => "No Data Found".to_string(),
        DataStatus::Error(_) => "Data Error".to_string(),
        DataStatus::Ready => match view.mode {
            ViewMode::Average => "All Filtered Hours".to_string(),
            ViewMode::Stepped => dataset
                .and_then(|ds| ds.series.get(view.current_index))
                .map(|step| step.timestamp.format("%a, %b %-d | %H:%M").to_string())
                .unwrap_or_default(),
        },
    }
}

/// Resolve and colour every known zone for the current state.
pub fn build_frame(
    status: &DataStatus,
    view: &ViewState,
    dataset: Option<&Dataset>,
    known_zones: &BTreeSet<ZoneId>,
    network_zone: &str,
    playing: bool,
) -> RenderFrame {
    let scale = ColorScale::for_price_type(view.price_type);
    let reference = view.active_reference();
    let resolver = ValueResolver::new(view.price_type, reference);

    let ready = dataset.filter(|_| status.is_ready());
    let step = ready.and_then(|ds| match view.mode {
        ViewMode::Stepped => ds.series.get(view.current_index),
        ViewMode::Average => None,
    });
    let source = ready.and_then(|ds| match view.mode {
        ViewMode::Average => Some(DataSource::Averaged(&ds.averages)),
        ViewMode::Stepped => step.map(DataSource::Stepped),
    });

    let display = |zone: &str, value: Option<f64>| ZoneDisplay {
        zone: zone.to_string(),
        value,
        formatted: format_price(value),
        color: scale.color_for(value),
        highlighted: reference == Some(zone),
    };

    let zones = known_zones
        .iter()
        .map(|zone| display(zone, source.and_then(|s| resolver.resolve(zone, &s))))
        .collect();

    let network_value = source.and_then(|s| {
        resolver.network_aggregate(known_zones.iter().map(String::as_str), &s)
    });

    let (constraints, constraint_unit) = match (ready, view.mode) {
        (Some(ds), ViewMode::Average) => (ds.global_constraints.clone(), AVERAGE_PRICE_LABEL),
        (Some(ds), ViewMode::Stepped) => (
            step.map(|s| active_constraints_at(&ds.constraints, s.timestamp))
                .unwrap_or_default(),
            SHADOW_PRICE_LABEL,
        ),
        (None, ViewMode::Average) => (Vec::new(), AVERAGE_PRICE_LABEL),
        (None, ViewMode::Stepped) => (Vec::new(), SHADOW_PRICE_LABEL),
    };

    RenderFrame {
        status: status.clone(),
        mode: view.mode,
        current_index: view.current_index,
        step_count: dataset.map(|ds| ds.series.len()).unwrap_or(0),
        playing,
        price_type: view.price_type,
        reference_zone: view.reference_zone.clone(),
        time_label: time_label(status, view, dataset),
        zones,
        network: display(network_zone, network_value),
        constraints,
        constraint_unit,
        legend: scale.legend(),
    }
}

/// Pushes frames to the external consumers, synchronously and in order.
#[derive(Clone)]
pub struct RenderSync {
    map: Arc<dyn MapLayer>,
    sidebar: Arc<dyn Sidebar>,
    constraints: Arc<dyn ConstraintPanel>,
    status: Arc<dyn StatusPanel>,
    /// Zones the consumers currently show a value for.
    painted: BTreeSet<ZoneId>,
}

impl RenderSync {
    pub fn new(
        map: Arc<dyn MapLayer>,
        sidebar: Arc<dyn Sidebar>,
        constraints: Arc<dyn ConstraintPanel>,
        status: Arc<dyn StatusPanel>,
    ) -> Self {
        Self {
            map,
            sidebar,
            constraints,
            status,
            painted: BTreeSet::new(),
        }
    }

    /// Zones painted by an earlier frame but absent from this one go back to
    /// the neutral no-data display.
    pub fn publish(&mut self, frame: &RenderFrame) {
        let current: BTreeSet<ZoneId> = frame.zones.iter().map(|z| z.zone.clone()).collect();
        for stale in self.painted.difference(&current) {
            tracing::debug!("Clearing zone {} dropped from the display", stale);
            self.map.set_zone_color(stale, NO_DATA_COLOR);
            self.map.set_zone_border_highlight(stale, false);
            self.sidebar.set_zone_display_value(stale, "", NO_DATA_COLOR);
        }
        self.painted = current;

        for zone in &frame.zones {
            self.map.set_zone_color(&zone.zone, zone.color);
            self.map.set_zone_border_highlight(&zone.zone, zone.highlighted);
            self.sidebar
                .set_zone_display_value(&zone.zone, &zone.formatted, zone.color);
        }
        self.sidebar.set_zone_display_value(
            &frame.network.zone,
            &frame.network.formatted,
            frame.network.color,
        );
        self.constraints
            .set_constraint_list(&frame.constraints, frame.constraint_unit);
        self.status.set_time_label(&frame.time_label, &frame.status);
        self.status.set_legend(&frame.legend);

        tracing::debug!(
            "Rendered {:?} frame {} for {} zones ({})",
            frame.mode,
            frame.current_index,
            frame.zones.len(),
            frame.price_type
        );
    }
}
