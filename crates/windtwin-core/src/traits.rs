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

use anyhow::Result;
use async_trait::async_trait;
use windtwin_types::{ForecastPoint, JsonPatch, ModelKind, TurbineConditions};

// ============= External Collaborator Traits =============

/// A power prediction service.
///
/// Batch contract: submit an ordered sequence, receive an ordered sequence of the
/// same length, index-aligned. A physics model may answer with an empty sequence
/// when it has no estimate.
#[async_trait]
pub trait PowerModel: Send + Sync {
    async fn predict(&self, samples: &[TurbineConditions]) -> Result<Vec<f64>>;

    /// Which of the two models this is
    fn kind(&self) -> ModelKind;

    /// Get data source name (for logging)
    fn name(&self) -> &str;
}

/// The digital-twin graph store.
/// Business logic uses this trait, never knows about the REST details.
#[async_trait]
pub trait TwinStore: Send + Sync {
    /// Run a twin query and return the matching documents in result order
    async fn query(&self, query: &str) -> Result<Vec<serde_json::Value>>;

    /// Apply a JSON-Patch document to one twin
    async fn update_twin(&self, twin_id: &str, patch: &JsonPatch) -> Result<()>;

    fn name(&self) -> &str;
}

/// Source of weather forecast points for the prediction endpoint
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn read_forecast(&self) -> Result<Vec<ForecastPoint>>;

    fn name(&self) -> &str;
}
