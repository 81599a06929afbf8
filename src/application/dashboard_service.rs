// Dashboard service - single task owning the playback controller
use crate::application::lmp_repository::LmpRepository;
use crate::application::playback::{
    PlaybackController, PlaybackSettings, RequestToken, TickScheduler, TimerId,
};
use crate::application::render_sync::{RenderFrame, RenderSync};
use crate::domain::error::{DashboardError, Result};
use crate::domain::filter::LmpFilter;
use crate::domain::lmp::{LmpRangeResponse, PriceType, ZoneId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

const REQUEST_BUFFER: usize = 64;
const FRAME_BUFFER: usize = 100;

pub type TickSender = mpsc::UnboundedSender<TimerId>;

#[derive(Debug, Clone)]
pub enum Operation {
    LoadData(LmpFilter),
    Play,
    Pause,
    Seek(usize),
    SetSpeed(u64),
    SetPriceType(PriceType),
    SetReferenceZone(Option<ZoneId>),
    ShowAverage,
    Snapshot,
}

struct Request {
    op: Operation,
    reply: oneshot::Sender<Result<RenderFrame>>,
}

/// Cheap, cloneable front door to the dashboard task.
#[derive(Clone)]
pub struct DashboardHandle {
    requests: mpsc::Sender<Request>,
    frames: broadcast::Sender<RenderFrame>,
}

impl DashboardHandle {
    pub async fn execute(&self, op: Operation) -> Result<RenderFrame> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request { op, reply })
            .await
            .map_err(|_| DashboardError::ServiceUnavailable)?;
        rx.await.map_err(|_| DashboardError::ServiceUnavailable)?
    }

    pub async fn load_data(&self, filter: LmpFilter) -> Result<RenderFrame> {
        self.execute(Operation::LoadData(filter)).await
    }

    pub async fn snapshot(&self) -> Result<RenderFrame> {
        self.execute(Operation::Snapshot).await
    }

    /// Every frame published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderFrame> {
        self.frames.subscribe()
    }
}

pub struct DashboardService<S: TickScheduler> {
    repository: Arc<dyn LmpRepository>,
    controller: PlaybackController<S>,
    frames: broadcast::Sender<RenderFrame>,
    loads: mpsc::UnboundedSender<(RequestToken, anyhow::Result<LmpRangeResponse>)>,
}

impl<S: TickScheduler + 'static> DashboardService<S> {
    /// Spawn the dashboard task. `scheduler` receives the sender its timers tick into.
    pub fn spawn<F>(
        repository: Arc<dyn LmpRepository>,
        scheduler: F,
        render: RenderSync,
        settings: PlaybackSettings,
    ) -> DashboardHandle
    where
        F: FnOnce(TickSender) -> S,
    {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (frames, _) = broadcast::channel(FRAME_BUFFER);

        let service = Self {
            repository,
            controller: PlaybackController::new(scheduler(tick_tx), render, settings),
            frames: frames.clone(),
            loads: load_tx,
        };
        tokio::spawn(service.run(request_rx, tick_rx, load_rx));

        DashboardHandle {
            requests: request_tx,
            frames,
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut ticks: mpsc::UnboundedReceiver<TimerId>,
        mut loads: mpsc::UnboundedReceiver<(RequestToken, anyhow::Result<LmpRangeResponse>)>,
    ) {
        tracing::info!("Dashboard service started");
        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(Request { op, reply }) = request else { break };
                    let result = self.apply(op);
                    let _ = reply.send(result);
                }
                Some(timer) = ticks.recv() => {
                    if self.controller.on_tick(timer) {
                        self.broadcast();
                    }
                }
                Some((token, result)) = loads.recv() => {
                    if self.controller.complete_load(token, result) {
                        self.broadcast();
                    }
                }
            }
        }
        tracing::info!("Dashboard service stopped");
    }

    fn broadcast(&self) {
        // No subscribers is fine
        let _ = self.frames.send(self.controller.frame().clone());
    }

    fn apply(&mut self, op: Operation) -> Result<RenderFrame> {
        tracing::debug!("Applying {:?}", op);
        match op {
            Operation::LoadData(filter) => {
                let token = self.controller.begin_load(&filter)?;
                let repository = self.repository.clone();
                let loads = self.loads.clone();
                tokio::spawn(async move {
                    let result = repository.query_range(&filter).await;
                    let _ = loads.send((token, result));
                });
            }
            Operation::Play => self.controller.play(),
            Operation::Pause => self.controller.pause(),
            Operation::Seek(index) => self.controller.seek(index),
            Operation::SetSpeed(value) => self.controller.set_speed(value),
            Operation::SetPriceType(price_type) => self.controller.set_price_type(price_type),
            Operation::SetReferenceZone(zone) => self.controller.set_reference_zone(zone)?,
            Operation::ShowAverage => self.controller.show_average(),
            Operation::Snapshot => return Ok(self.controller.frame().clone()),
        }
        self.broadcast();
        Ok(self.controller.frame().clone())
    }
}
