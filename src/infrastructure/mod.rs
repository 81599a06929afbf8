// Infrastructure layer - External dependencies and adapters
pub mod chunked_stream;
pub mod config;
pub mod display_snapshot;
pub mod http_response;
pub mod lmp_http_repository;
pub mod tokio_scheduler;
