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

//! Clients for the two power prediction services

use crate::client::ServiceClient;
use crate::errors::AdapterResult;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use windtwin_core::PowerModel;
use windtwin_types::{ModelKind, TurbineConditions};

#[derive(Deserialize)]
struct MlResponse {
    result: Vec<f64>,
}

/// Machine-learning model endpoint (DM).
///
/// Takes the ordered conditions array and answers `{"result": [...]}`.
#[derive(Debug, Clone)]
pub struct MlModelClient {
    url: String,
    api_key: Option<String>,
    client: ServiceClient,
}

impl MlModelClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AdapterResult<Self> {
        Ok(Self {
            url: url.into(),
            api_key: None,
            client: ServiceClient::new("ML MODEL", timeout)?,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    pub async fn score(&self, samples: &[TurbineConditions]) -> AdapterResult<Vec<f64>> {
        debug!("🤖 [ML MODEL] Scoring {} samples", samples.len());

        let response = self
            .client
            .send(|| async {
                let mut request = self.client.http().post(&self.url).json(samples);
                if let Some(key) = &self.api_key {
                    request = request.bearer_auth(key);
                }
                request.send().await
            })
            .await?;
        let body: MlResponse = self.client.check_status(response).await?.json().await?;

        info!("✅ [ML MODEL] {} values", body.result.len());
        Ok(body.result)
    }
}

#[async_trait]
impl PowerModel for MlModelClient {
    async fn predict(&self, samples: &[TurbineConditions]) -> Result<Vec<f64>> {
        Ok(self.score(samples).await?)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::MachineLearning
    }

    fn name(&self) -> &str {
        "ml-model"
    }
}

/// Request body accepted by the physics model deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestShape {
    /// Full conditions array
    #[default]
    Full,
    /// `{"windSpeed": [...]}` only
    WindSpeedOnly,
}

/// Physics model endpoint (PM). Answers a bare array; empty means no estimate.
#[derive(Debug, Clone)]
pub struct PhysicsModelClient {
    url: String,
    shape: RequestShape,
    client: ServiceClient,
}

impl PhysicsModelClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AdapterResult<Self> {
        Ok(Self {
            url: url.into(),
            shape: RequestShape::Full,
            client: ServiceClient::new("PHYSICS MODEL", timeout)?,
        })
    }

    pub fn with_request_shape(mut self, shape: RequestShape) -> Self {
        self.shape = shape;
        self
    }

    pub async fn evaluate(&self, samples: &[TurbineConditions]) -> AdapterResult<Vec<f64>> {
        let body = match self.shape {
            RequestShape::Full => serde_json::to_value(samples)?,
            RequestShape::WindSpeedOnly => {
                let speeds: Vec<f64> = samples.iter().map(|s| s.wind_speed).collect();
                json!({ "windSpeed": speeds })
            }
        };
        debug!(
            "⚙️ [PHYSICS MODEL] Evaluating {} samples ({:?})",
            samples.len(),
            self.shape
        );

        let response = self
            .client
            .send(|| async { self.client.http().post(&self.url).json(&body).send().await })
            .await?;
        let values: Vec<f64> = self.client.check_status(response).await?.json().await?;

        if values.is_empty() {
            info!("⚙️ [PHYSICS MODEL] No estimate");
        } else {
            info!("✅ [PHYSICS MODEL] {} values", values.len());
        }
        Ok(values)
    }
}

#[async_trait]
impl PowerModel for PhysicsModelClient {
    async fn predict(&self, samples: &[TurbineConditions]) -> Result<Vec<f64>> {
        Ok(self.evaluate(samples).await?)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Physics
    }

    fn name(&self) -> &str {
        "physics-model"
    }
}
