// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardHandle;
use crate::infrastructure::display_snapshot::SnapshotDisplay;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardHandle,
    pub display: SnapshotDisplay,
}
