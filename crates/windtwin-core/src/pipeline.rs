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

//! Telemetry-to-twin pipeline

use crate::error::CoreError;
use crate::estimator::PowerEstimator;
use crate::event_bus::TwinEventSender;
use crate::patch::PatchBuilder;
use crate::resolver::TwinIdResolver;
use crate::traits::TwinStore;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use windtwin_types::{
    ModelKind, PowerUpdated, SensorReading, TelemetryEvent, TwinEvent, logical_device_id,
};

/// Result of processing one telemetry event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Both twins were patched
    #[serde(rename_all = "camelCase")]
    Updated {
        device_id: String,
        sensor_twin_id: String,
        turbine_twin_id: String,
        /// Models whose value was written as a default
        #[serde(skip_serializing_if = "Vec::is_empty")]
        unavailable: Vec<ModelKind>,
    },
    /// No twin is bound to the device yet
    #[serde(rename_all = "camelCase")]
    NotProvisioned { device_id: String },
    /// The event itself was malformed
    #[serde(rename_all = "camelCase")]
    Rejected { device_id: String, reason: String },
    /// The twin store refused a query or patch
    #[serde(rename_all = "camelCase")]
    Failed { device_id: String, reason: String },
}

/// Per-event outcomes of a batch plus counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub updated: usize,
    pub not_provisioned: usize,
    pub rejected: usize,
    pub failed: usize,
    pub outcomes: Vec<EventOutcome>,
}

impl BatchReport {
    fn push(&mut self, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Updated { .. } => self.updated += 1,
            EventOutcome::NotProvisioned { .. } => self.not_provisioned += 1,
            EventOutcome::Rejected { .. } => self.rejected += 1,
            EventOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Processes sensor telemetry into sensor and turbine twin updates
pub struct SensorEventHandler {
    resolver: TwinIdResolver,
    store: Arc<dyn TwinStore>,
    estimator: PowerEstimator,
    events: Option<TwinEventSender>,
}

impl std::fmt::Debug for SensorEventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorEventHandler")
            .field("resolver", &self.resolver)
            .field("store", &self.store.name())
            .field("estimator", &self.estimator)
            .field("publishes_events", &self.events.is_some())
            .finish()
    }
}

impl SensorEventHandler {
    pub fn new(resolver: TwinIdResolver, store: Arc<dyn TwinStore>, estimator: PowerEstimator) -> Self {
        Self {
            resolver,
            store,
            estimator,
            events: None,
        }
    }

    /// Publish a `PowerUpdated` event after every successful turbine update
    pub fn with_event_sender(mut self, sender: TwinEventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Process each event to completion; one failure never aborts the batch
    pub async fn handle_batch(&self, events: &[TelemetryEvent]) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            report.push(self.handle_event(event).await);
        }
        info!(
            "Processed {} telemetry events: {} updated, {} not provisioned, {} rejected, {} failed",
            events.len(),
            report.updated,
            report.not_provisioned,
            report.rejected,
            report.failed
        );
        report
    }

    pub async fn handle_event(&self, event: &TelemetryEvent) -> EventOutcome {
        let reading = match SensorReading::from_event(event) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Rejected telemetry from {}: {}", event.connection_device_id, e);
                return EventOutcome::Rejected {
                    device_id: logical_device_id(&event.connection_device_id).to_owned(),
                    reason: e.to_string(),
                };
            }
        };
        let device_id = reading.device_id.clone();

        let identity = match self.resolver.resolve(&device_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return EventOutcome::NotProvisioned { device_id },
            Err(CoreError::Validation(e)) => {
                warn!("Rejected telemetry from {}: {}", device_id, e);
                return EventOutcome::Rejected {
                    device_id,
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                error!("❌ Twin lookup for {} failed: {:#}", device_id, e);
                return EventOutcome::Failed {
                    device_id,
                    reason: e.to_string(),
                };
            }
        };
        debug!(
            "{} -> sensor {} observes {}",
            device_id, identity.sensor_twin_id, identity.turbine_twin_id
        );

        let sensor_patch = PatchBuilder::sensor_patch(&reading.conditions, reading.temperatures);
        if let Err(e) = self
            .store
            .update_twin(&identity.sensor_twin_id, &sensor_patch)
            .await
        {
            error!("❌ Sensor twin {} update failed: {:#}", identity.sensor_twin_id, e);
            return EventOutcome::Failed {
                device_id,
                reason: format!("sensor twin update failed: {e}"),
            };
        }

        let estimate = self
            .estimator
            .estimate_one(&reading.conditions, reading.power_observed)
            .await;
        let turbine_patch = PatchBuilder::turbine_patch(&estimate);
        if let Err(e) = self
            .store
            .update_twin(&identity.turbine_twin_id, &turbine_patch)
            .await
        {
            error!("❌ Turbine twin {} update failed: {:#}", identity.turbine_twin_id, e);
            return EventOutcome::Failed {
                device_id,
                reason: format!("turbine twin update failed: {e}"),
            };
        }

        if let Some(events) = &self.events {
            let published = events.publish(TwinEvent::PowerUpdated(PowerUpdated {
                twin_id: identity.turbine_twin_id.clone(),
                power_observed: estimate.power_observed,
                power_pm: estimate.power_pm.value(),
                power_dm: estimate.power_dm.value(),
                last_update_time: Utc::now(),
                unavailable: estimate.unavailable(),
            }));
            if let Err(e) = published {
                warn!("Power update for {} not published: {}", identity.turbine_twin_id, e);
            }
        }

        info!(
            "✅ Updated twins {} / {} from {}",
            identity.sensor_twin_id, identity.turbine_twin_id, device_id
        );
        EventOutcome::Updated {
            device_id,
            sensor_twin_id: identity.sensor_twin_id,
            turbine_twin_id: identity.turbine_twin_id,
            unavailable: estimate.unavailable(),
        }
    }
}
