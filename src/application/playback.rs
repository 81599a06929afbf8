// Playback controller - owns the dataset, view state and the single playback timer
use crate::application::dataset::Dataset;
use crate::application::render_sync::{RenderFrame, RenderSync, ZoneDisplay, build_frame};
use crate::domain::error::{DashboardError, Result};
use crate::domain::filter::LmpFilter;
use crate::domain::lmp::{LmpRangeResponse, PriceType, ZoneId};
use crate::domain::view::{DataStatus, ViewMode, ViewState};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::task::AbortHandle;

pub type TimerId = u64;
pub type RequestToken = u64;

/// Starts repeating timers that report `TimerId` ticks back to the controller.
pub trait TickScheduler: Send {
    fn start(&self, timer: TimerId, every: Duration) -> TimerHandle;
}

/// Live repeating timer. Cancelling or dropping the handle stops it.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    task: Option<AbortHandle>,
}

impl TimerHandle {
    pub fn new(id: TimerId, task: Option<AbortHandle>) -> Self {
        Self { id, task }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Maps the speed control onto a frame interval: higher control, shorter interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedCurve {
    pub offset_ms: u64,
    pub min_control: u64,
    pub max_control: u64,
}

impl SpeedCurve {
    pub fn interval_for(&self, control: u64) -> Duration {
        let control = control.clamp(self.min_control, self.max_control);
        Duration::from_millis(self.offset_ms.saturating_sub(control).max(1))
    }
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self {
            offset_ms: 3100,
            min_control: 100,
            max_control: 3000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    pub default_interval: Duration,
    pub speed: SpeedCurve,
    pub network_zone: String,
    /// Zones drawn on the map even before any data arrives.
    pub zones: BTreeSet<ZoneId>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_millis(1000),
            speed: SpeedCurve::default(),
            network_zone: "PJM".to_string(),
            zones: BTreeSet::new(),
        }
    }
}

pub struct PlaybackController<S: TickScheduler> {
    scheduler: S,
    render: RenderSync,
    settings: PlaybackSettings,
    dataset: Option<Dataset>,
    known_zones: BTreeSet<ZoneId>,
    status: DataStatus,
    view: ViewState,
    timer: Option<TimerHandle>,
    interval: Duration,
    next_timer: TimerId,
    latest_request: RequestToken,
    frame: RenderFrame,
}

impl<S: TickScheduler> PlaybackController<S> {
    pub fn new(scheduler: S, render: RenderSync, settings: PlaybackSettings) -> Self {
        let status = DataStatus::Idle;
        let view = ViewState::default();
        let known_zones = settings.zones.clone();
        let frame = build_frame(&status, &view, None, &known_zones, &settings.network_zone, false);

        Self {
            scheduler,
            render,
            interval: settings.default_interval,
            settings,
            dataset: None,
            known_zones,
            status,
            view,
            timer: None,
            next_timer: 0,
            latest_request: 0,
            frame,
        }
    }

    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub(crate) fn status(&self) -> &DataStatus {
        &self.status
    }

    pub(crate) fn view(&self) -> &ViewState {
        &self.view
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn zone_value(&self, zone: &str) -> Option<&ZoneDisplay> {
        self.frame.zone(zone)
    }

    fn last_index(&self) -> Option<usize> {
        self.dataset
            .as_ref()
            .filter(|_| self.status.is_ready())
            .and_then(|ds| ds.series.last_index())
    }

    /// Recompute every consumer value from the current state and push it out.
    fn sync(&mut self) {
        self.frame = build_frame(
            &self.status,
            &self.view,
            self.dataset.as_ref(),
            &self.known_zones,
            &self.settings.network_zone,
            self.timer.is_some(),
        );
        self.render.publish(&self.frame);
    }

    fn start_timer(&mut self) {
        self.next_timer += 1;
        let handle = self.scheduler.start(self.next_timer, self.interval);
        tracing::debug!("Started playback timer {} every {:?}", handle.id(), self.interval);
        self.timer = Some(handle);
    }

    fn stop_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(handle) => {
                tracing::debug!("Cancelled playback timer {}", handle.id());
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Replace a running timer with a fresh one so no tick from the old one lands.
    fn rearm_timer(&mut self) {
        if self.stop_timer() {
            self.start_timer();
        }
    }

    /// Validate the filter and enter the loading state. The returned token must
    /// accompany the backend result passed to [`Self::complete_load`].
    pub fn begin_load(&mut self, filter: &LmpFilter) -> Result<RequestToken> {
        filter.validate()?;

        self.stop_timer();
        self.latest_request += 1;
        self.dataset = None;
        self.known_zones = self.settings.zones.clone();
        self.status = DataStatus::Loading;
        self.view.mode = ViewMode::Average;
        self.view.current_index = 0;

        tracing::info!(
            "Loading LMP data {}..{} (request {}, ~{} hours)",
            filter.start_day,
            filter.end_day,
            self.latest_request,
            filter.estimated_hours()
        );
        self.sync();
        Ok(self.latest_request)
    }

    /// Apply a backend result. Results for anything but the latest request are
    /// discarded and `false` is returned.
    pub fn complete_load(
        &mut self,
        token: RequestToken,
        result: anyhow::Result<LmpRangeResponse>,
    ) -> bool {
        if token != self.latest_request {
            tracing::warn!(
                "Discarding stale LMP response for request {} (latest {})",
                token,
                self.latest_request
            );
            return false;
        }

        self.stop_timer();
        self.view.mode = ViewMode::Average;
        self.view.current_index = 0;

        match result {
            Ok(response) => {
                let dataset = Dataset::build(&response);
                if dataset.is_empty() {
                    tracing::info!("LMP query returned no data");
                    self.dataset = None;
                    self.status = DataStatus::NoData;
                } else {
                    tracing::info!(
                        "Loaded {} hourly steps across {} zones, {} constraint rows",
                        dataset.series.len(),
                        dataset.zones.len(),
                        dataset.constraints.len()
                    );
                    self.known_zones = self.settings.zones.union(&dataset.zones).cloned().collect();
                    self.dataset = Some(dataset);
                    self.status = DataStatus::Ready;
                }
            }
            Err(e) => {
                tracing::error!("LMP query failed: {:#}", e);
                self.dataset = None;
                self.status = DataStatus::Error(DashboardError::Backend(e.to_string()).to_string());
            }
        }

        if let Some(zone) = &self.view.reference_zone {
            if !self.known_zones.contains(zone) {
                tracing::info!("Reference zone {} not in new dataset, clearing", zone);
                self.view.reference_zone = None;
            }
        }

        self.sync();
        true
    }

    pub fn play(&mut self) {
        let Some(last) = self.last_index() else {
            tracing::debug!("Play ignored: no data loaded");
            return;
        };
        if self.timer.is_some() {
            return;
        }
        if self.view.current_index >= last {
            self.view.current_index = 0;
        }
        self.view.mode = ViewMode::Stepped;
        self.start_timer();
        tracing::info!("Playback started at step {}", self.view.current_index);
        self.sync();
    }

    pub fn pause(&mut self) {
        if self.stop_timer() {
            tracing::info!("Playback paused at step {}", self.view.current_index);
        }
        self.sync();
    }

    /// Explicit scrub: stops playback and shows the clamped step.
    pub fn seek(&mut self, index: usize) {
        let Some(last) = self.last_index() else {
            tracing::debug!("Seek ignored: no data loaded");
            return;
        };
        self.stop_timer();
        self.view.mode = ViewMode::Stepped;
        self.view.current_index = index.min(last);
        self.sync();
    }

    pub fn set_speed(&mut self, control: u64) {
        self.interval = self.settings.speed.interval_for(control);
        tracing::debug!("Playback interval set to {:?}", self.interval);
        self.rearm_timer();
        self.sync();
    }

    pub fn set_price_type(&mut self, price_type: PriceType) {
        self.rearm_timer();
        self.view.price_type = price_type;
        self.sync();
    }

    pub fn set_reference_zone(&mut self, zone: Option<ZoneId>) -> Result<()> {
        if let Some(z) = &zone {
            if !self.known_zones.contains(z) {
                return Err(DashboardError::UnknownZone(z.clone()));
            }
        }
        self.rearm_timer();
        self.view.reference_zone = zone;
        self.sync();
        Ok(())
    }

    pub fn show_average(&mut self) {
        self.stop_timer();
        self.view.mode = ViewMode::Average;
        self.sync();
    }

    /// Advance one step for the live timer; ticks from any other timer are ignored.
    pub fn on_tick(&mut self, timer: TimerId) -> bool {
        if self.timer.as_ref().map(TimerHandle::id) != Some(timer) {
            tracing::debug!("Ignoring tick from stale timer {}", timer);
            return false;
        }
        let next = self.view.current_index + 1;
        match self.last_index() {
            Some(last) if next <= last => {
                self.view.current_index = next;
            }
            _ => {
                self.stop_timer();
                tracing::info!("Playback reached the end at step {}", self.view.current_index);
            }
        }
        self.sync();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render_sync::tests::{RecordingDisplay, render_sync, sample_response};
    use crate::domain::color::NO_DATA_COLOR;
    use crate::infrastructure::display_snapshot::SnapshotDisplay;
    use std::sync::{Arc, Mutex};

    /// Records started timers; ticks are delivered by calling `on_tick` directly.
    #[derive(Clone, Default)]
    struct FakeScheduler {
        started: Arc<Mutex<Vec<(TimerId, Duration)>>>,
    }

    impl TickScheduler for FakeScheduler {
        fn start(&self, timer: TimerId, every: Duration) -> TimerHandle {
            self.started.lock().unwrap().push((timer, every));
            TimerHandle::new(timer, None)
        }
    }

    impl FakeScheduler {
        fn last(&self) -> (TimerId, Duration) {
            *self.started.lock().unwrap().last().unwrap()
        }

        fn count(&self) -> usize {
            self.started.lock().unwrap().len()
        }
    }

    struct Harness {
        controller: PlaybackController<FakeScheduler>,
        scheduler: FakeScheduler,
        display: Arc<RecordingDisplay>,
    }

    fn harness() -> Harness {
        let scheduler = FakeScheduler::default();
        let display = Arc::new(RecordingDisplay::default());
        let controller =
            PlaybackController::new(scheduler.clone(), render_sync(&display), PlaybackSettings::default());
        Harness {
            controller,
            scheduler,
            display,
        }
    }

    fn loaded(response: LmpRangeResponse) -> Harness {
        let mut h = harness();
        let token = h.controller.begin_load(&LmpFilter::default()).unwrap();
        assert!(h.controller.complete_load(token, Ok(response)));
        h
    }

    fn tick(h: &mut Harness) -> bool {
        let (id, _) = h.scheduler.last();
        h.controller.on_tick(id)
    }

    #[test]
    fn test_load_starts_in_average_mode() {
        let h = loaded(sample_response());
        assert_eq!(h.controller.status(), &DataStatus::Ready);
        assert_eq!(h.controller.view().mode, ViewMode::Average);
        assert_eq!(h.controller.frame().time_label, "All Filtered Hours");
        assert!(!h.controller.is_playing());
        assert_eq!(h.display.labels.lock().unwrap().last().unwrap(), "All Filtered Hours");
    }

    #[test]
    fn test_play_advances_and_stops_at_end() {
        let mut h = loaded(sample_response());
        h.controller.play();
        assert!(h.controller.is_playing());
        assert_eq!(h.controller.view().mode, ViewMode::Stepped);
        assert_eq!(h.controller.view().current_index, 0);

        assert!(tick(&mut h));
        assert_eq!(h.controller.view().current_index, 1);
        assert!(tick(&mut h));
        assert_eq!(h.controller.view().current_index, 2);
        assert!(h.controller.is_playing());

        // No wraparound past the last step
        assert!(tick(&mut h));
        assert_eq!(h.controller.view().current_index, 2);
        assert!(!h.controller.is_playing());
        assert!(!h.controller.frame().playing);
    }

    #[test]
    fn test_play_at_end_restarts_from_zero() {
        let mut h = loaded(sample_response());
        h.controller.seek(2);
        h.controller.play();
        assert_eq!(h.controller.view().current_index, 0);
        assert!(h.controller.is_playing());
    }

    #[test]
    fn test_seek_pauses_and_clamps() {
        let mut h = loaded(sample_response());
        h.controller.play();
        h.controller.seek(99);
        assert!(!h.controller.is_playing());
        assert_eq!(h.controller.view().current_index, 2);
        assert_eq!(h.controller.view().mode, ViewMode::Stepped);
    }

    #[test]
    fn test_stale_tick_is_ignored() {
        let mut h = loaded(sample_response());
        h.controller.play();
        let (old, _) = h.scheduler.last();
        h.controller.pause();
        h.controller.play();

        assert!(!h.controller.on_tick(old));
        assert_eq!(h.controller.view().current_index, 0);
    }

    #[test]
    fn test_set_speed_while_playing_keeps_index() {
        let mut h = loaded(sample_response());
        h.controller.play();
        tick(&mut h);
        let (before, _) = h.scheduler.last();

        h.controller.set_speed(2100);

        let (after, every) = h.scheduler.last();
        assert_ne!(before, after);
        assert_eq!(every, Duration::from_millis(1000));
        assert_eq!(h.controller.view().current_index, 1);
        assert!(!h.controller.on_tick(before));
        assert!(h.controller.on_tick(after));
        assert_eq!(h.controller.view().current_index, 2);
    }

    #[test]
    fn test_set_speed_while_stopped_does_not_start_timer() {
        let mut h = loaded(sample_response());
        h.controller.set_speed(5000);
        assert_eq!(h.scheduler.count(), 0);
        assert_eq!(h.controller.interval(), Duration::from_millis(100));
        h.controller.set_speed(0);
        assert_eq!(h.controller.interval(), Duration::from_millis(3000));
    }

    #[test]
    fn test_price_type_change_rearms_running_timer() {
        let mut h = loaded(sample_response());
        h.controller.play();
        let (before, _) = h.scheduler.last();
        h.controller.set_price_type(PriceType::Rt);
        assert!(h.controller.is_playing());
        assert!(!h.controller.on_tick(before));
        assert_eq!(h.controller.frame().price_type, PriceType::Rt);
    }

    #[test]
    fn test_reference_zone_must_be_known() {
        let mut h = loaded(sample_response());
        assert_eq!(
            h.controller.set_reference_zone(Some("ZZZ".to_string())),
            Err(DashboardError::UnknownZone("ZZZ".to_string()))
        );
        h.controller.set_price_type(PriceType::Congestion);
        h.controller.set_reference_zone(Some("A".to_string())).unwrap();
        // Average rt: A = 20, B = 15
        assert_eq!(h.controller.zone_value("B").unwrap().value, Some(5.0));
        assert_eq!(h.controller.zone_value("A").unwrap().value, Some(0.0));
        assert!(h.display.borders.lock().unwrap()["A"]);

        h.controller.set_reference_zone(None).unwrap();
        assert_eq!(h.controller.zone_value("B").unwrap().value, None);
    }

    #[test]
    fn test_show_average_pauses() {
        let mut h = loaded(sample_response());
        h.controller.play();
        tick(&mut h);
        h.controller.show_average();
        assert!(!h.controller.is_playing());
        assert_eq!(h.controller.view().mode, ViewMode::Average);
        assert_eq!(h.controller.view().current_index, 1);
    }

    #[test]
    fn test_empty_result_is_no_data() {
        let mut h = loaded(LmpRangeResponse::default());
        assert_eq!(h.controller.status(), &DataStatus::NoData);

        h.controller.play();
        assert!(!h.controller.is_playing());
        h.controller.seek(1);
        assert_eq!(h.controller.view().mode, ViewMode::Average);
        assert_eq!(h.scheduler.count(), 0);
    }

    #[test]
    fn test_failed_load_drops_previous_dataset() {
        let mut h = loaded(sample_response());
        h.controller.play();

        let token = h.controller.begin_load(&LmpFilter::default()).unwrap();
        assert!(!h.controller.is_playing());
        h.controller
            .complete_load(token, Err(anyhow::anyhow!("connection refused")));

        assert!(matches!(h.controller.status(), DataStatus::Error(_)));
        assert_eq!(h.controller.frame().time_label, "Data Error");
        assert_eq!(h.controller.frame().step_count, 0);
        h.controller.seek(1);
        assert_eq!(h.controller.view().mode, ViewMode::Average);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut h = harness();
        let first = h.controller.begin_load(&LmpFilter::default()).unwrap();
        let second = h.controller.begin_load(&LmpFilter::default()).unwrap();

        assert!(h.controller.complete_load(second, Ok(LmpRangeResponse::default())));
        assert!(!h.controller.complete_load(first, Ok(sample_response())));
        assert_eq!(h.controller.status(), &DataStatus::NoData);
    }

    #[test]
    fn test_invalid_filter_rejected_before_loading() {
        let mut h = loaded(sample_response());
        let mut filter = LmpFilter::default();
        filter.end_hour = 30;
        assert!(matches!(
            h.controller.begin_load(&filter),
            Err(DashboardError::InvalidFilter(_))
        ));
        assert_eq!(h.controller.status(), &DataStatus::Ready);
    }

    #[test]
    fn test_reload_clears_zones_from_previous_dataset() {
        let display = SnapshotDisplay::new();
        let shared = Arc::new(display.clone());
        let render = RenderSync::new(shared.clone(), shared.clone(), shared.clone(), shared);
        let mut controller =
            PlaybackController::new(FakeScheduler::default(), render, PlaybackSettings::default());

        let token = controller.begin_load(&LmpFilter::default()).unwrap();
        controller.complete_load(token, Ok(sample_response()));
        controller.set_price_type(PriceType::Congestion);
        controller.set_reference_zone(Some("A".to_string())).unwrap();
        assert_eq!(display.snapshot().highlighted_zones, vec!["A"]);

        let mut only_c = sample_response();
        let rows = only_c.zones.remove("A").unwrap();
        only_c.zones.clear();
        only_c.zones.insert("C".to_string(), rows);
        let token = controller.begin_load(&LmpFilter::default()).unwrap();
        controller.complete_load(token, Ok(only_c));

        assert_eq!(controller.view().reference_zone, None);
        let snapshot = display.snapshot();
        assert!(snapshot.highlighted_zones.is_empty());
        for zone in ["A", "B", "C"] {
            assert_eq!(snapshot.zone_colors[zone], NO_DATA_COLOR);
            assert_eq!(snapshot.sidebar[zone].formatted, "");
        }
    }
}
