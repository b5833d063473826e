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

use crate::traits::PowerModel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use windtwin_types::{Estimate, ModelEstimates, ModelKind, PowerEstimate, TurbineConditions};

pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Queries both power models for a batch of samples.
///
/// The models run concurrently, each under its own timeout. A model failure
/// never fails the batch: its answers turn into [`Estimate::Unavailable`].
#[derive(Clone)]
pub struct PowerEstimator {
    physics: Arc<dyn PowerModel>,
    ml: Arc<dyn PowerModel>,
    timeout: Duration,
}

impl std::fmt::Debug for PowerEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerEstimator")
            .field("physics", &self.physics.name())
            .field("ml", &self.ml.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PowerEstimator {
    pub fn new(physics: Arc<dyn PowerModel>, ml: Arc<dyn PowerModel>) -> Self {
        Self {
            physics,
            ml,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One [`ModelEstimates`] per input sample, index-aligned
    pub async fn estimate(&self, samples: &[TurbineConditions]) -> Vec<ModelEstimates> {
        if samples.is_empty() {
            return Vec::new();
        }

        let (pm, dm) = tokio::join!(
            run_model(self.physics.as_ref(), samples, self.timeout),
            run_model(self.ml.as_ref(), samples, self.timeout),
        );

        pm.into_iter()
            .zip(dm)
            .map(|(pm, dm)| ModelEstimates { pm, dm })
            .collect()
    }

    /// Estimate for a single live reading
    pub async fn estimate_one(&self, conditions: &TurbineConditions, power_observed: f64) -> PowerEstimate {
        let estimates = self
            .estimate(std::slice::from_ref(conditions))
            .await
            .pop()
            .unwrap_or_else(|| ModelEstimates {
                pm: Estimate::NoEstimate,
                dm: Estimate::NoEstimate,
            });
        PowerEstimate::new(power_observed, estimates)
    }
}

async fn run_model(model: &dyn PowerModel, samples: &[TurbineConditions], timeout: Duration) -> Vec<Estimate> {
    let unavailable = |reason: String| {
        vec![Estimate::Unavailable { reason }; samples.len()]
    };

    let values = match tokio::time::timeout(timeout, model.predict(samples)).await {
        Ok(Ok(values)) => values,
        Ok(Err(e)) => {
            warn!("❌ [{}] {} failed: {:#}", model.kind().short_name(), model.name(), e);
            return unavailable(e.to_string());
        }
        Err(_) => {
            warn!(
                "⏱️ [{}] {} timed out after {:?}",
                model.kind().short_name(),
                model.name(),
                timeout
            );
            return unavailable(format!("timed out after {}s", timeout.as_secs_f64()));
        }
    };

    if values.is_empty() && model.kind() == ModelKind::Physics {
        debug!("{} returned no estimate for {} samples", model.name(), samples.len());
        return vec![Estimate::NoEstimate; samples.len()];
    }
    if values.len() != samples.len() {
        warn!(
            "⚠️ [{}] {} returned {} values for {} samples",
            model.kind().short_name(),
            model.name(),
            values.len(),
            samples.len()
        );
    }

    (0..samples.len())
        .map(|i| match values.get(i) {
            Some(value) => Estimate::Available { value: *value },
            None => Estimate::Unavailable {
                reason: "missing from model response".to_owned(),
            },
        })
        .collect()
}
