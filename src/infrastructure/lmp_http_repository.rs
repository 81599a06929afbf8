// HTTP repository for the LMP query backend
use crate::application::lmp_repository::LmpRepository;
use crate::domain::filter::LmpFilter;
use crate::domain::lmp::LmpRangeResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LmpHttpRepository {
    base_url: String,
    client: reqwest::Client,
}

impl LmpHttpRepository {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn range_url(&self) -> String {
        format!("{}/api/lmp/range", self.base_url)
    }
}

#[async_trait]
impl LmpRepository for LmpHttpRepository {
    async fn query_range(&self, filter: &LmpFilter) -> Result<LmpRangeResponse> {
        let url = self.range_url();
        tracing::debug!("POST {} {:?}", url, filter);

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(filter)
            .send()
            .await
            .context("Failed to send request to LMP backend")?;

        // The backend answers 404 when no rows match the filter
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("LMP backend found no rows for filter");
            return Ok(LmpRangeResponse::default());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LMP query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<LmpRangeResponse>()
            .await
            .context("Failed to parse LMP backend response")?;

        tracing::debug!(
            "LMP backend returned {} zones and {} constraint rows",
            data.zones.len(),
            data.constraints.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_url_trims_trailing_slash() {
        let repo =
            LmpHttpRepository::new("http://lmp.local:8000/".to_string(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(repo.range_url(), "http://lmp.local:8000/api/lmp/range");
    }
}
