// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of WindTwin.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::client::ServiceClient;
use crate::errors::AdapterResult;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use windtwin_core::ForecastSource;
use windtwin_types::ForecastPoint;

/// Weather forecast feed returning a JSON array of forecast points
#[derive(Debug, Clone)]
pub struct HttpForecastSource {
    url: String,
    client: ServiceClient,
}

impl HttpForecastSource {
    pub fn new(url: impl Into<String>) -> AdapterResult<Self> {
        Ok(Self {
            url: url.into(),
            client: ServiceClient::new("FORECAST", Duration::from_secs(10))?,
        })
    }

    pub async fn fetch(&self) -> AdapterResult<Vec<ForecastPoint>> {
        debug!("🌬️ [FORECAST] Fetching {}", self.url);
        let response = self
            .client
            .send(|| async { self.client.http().get(&self.url).send().await })
            .await?;
        let points: Vec<ForecastPoint> = self.client.check_status(response).await?.json().await?;

        info!("✅ [FORECAST] {} points", points.len());
        Ok(points)
    }
}

#[async_trait]
impl ForecastSource for HttpForecastSource {
    async fn read_forecast(&self) -> Result<Vec<ForecastPoint>> {
        Ok(self.fetch().await?)
    }

    fn name(&self) -> &str {
        "http-forecast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdapterError;
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn test_reads_forecast_points() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/forecast")
            .with_status(200)
            .with_body(
                json!([
                    {"forecastDateTime": "2020-10-29T00:00:00", "windspeed": 5.9, "winddirection": -1,
                     "yawposition": -131.48, "bladepitch1": 2, "bladepitch2": 2, "bladepitch3": 2},
                    {"forecastDateTime": "2020-10-29T03:00:00", "windspeed": 6.8, "winddirection": 3,
                     "yawposition": -109.37, "bladepitch1": 2, "bladepitch2": 2, "bladepitch3": 2}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let source = HttpForecastSource::new(format!("{}/forecast", server.url())).unwrap();
        let points = source.read_forecast().await.unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[1].yaw_position, -109.37);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_feed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/forecast")
            .with_status(200)
            .with_body(json!([{"windspeed": "calm"}]).to_string())
            .create_async()
            .await;

        let source = HttpForecastSource::new(format!("{}/forecast", server.url())).unwrap();
        assert!(matches!(
            source.fetch().await,
            Err(AdapterError::HttpError(_))
        ));
    }
}
