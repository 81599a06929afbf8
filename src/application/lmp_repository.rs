// Repository trait for LMP data access
use crate::domain::filter::LmpFilter;
use crate::domain::lmp::LmpRangeResponse;
use async_trait::async_trait;

#[async_trait]
pub trait LmpRepository: Send + Sync {
    /// Zone price history and constraint rows for the filtered window.
    /// An empty response means no rows matched; `Err` is a transport failure.
    async fn query_range(&self, filter: &LmpFilter) -> anyhow::Result<LmpRangeResponse>;
}
