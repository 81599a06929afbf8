// Dashboard error taxonomy
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    #[error("Invalid price type: {0}")]
    InvalidPriceType(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Dashboard service unavailable")]
    ServiceUnavailable,
}

pub type Result<T> = std::result::Result<T, DashboardError>;
