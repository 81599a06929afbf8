// Application layer - Dashboard state machine and data pipeline
pub mod aggregation;
pub mod dashboard_service;
pub mod dataset;
pub mod ingestion;
pub mod lmp_repository;
pub mod playback;
pub mod render_sync;
pub mod resolver;
