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

use crate::aggregator::{AggregateOutcome, ErrorAggregator};
use crate::discrepancy::DiscrepancyCalculator;
use crate::event_bus::TwinEventHandler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use windtwin_types::{
    Discrepancy, ErrorKind, ModelKind, PowerDifference, PowerUpdated, SensorUpdated, TwinEvent,
};

/// Turns turbine power updates into discrepancy results for the aggregator
#[derive(Debug)]
pub struct PowerEventListener {
    calculator: DiscrepancyCalculator,
    aggregator: Arc<ErrorAggregator>,
}

impl PowerEventListener {
    pub fn new(calculator: DiscrepancyCalculator, aggregator: Arc<ErrorAggregator>) -> Self {
        Self {
            calculator,
            aggregator,
        }
    }

    /// `None` when neither model had a value and the reading was skipped
    pub fn on_power_updated(&self, event: &PowerUpdated) -> Option<AggregateOutcome> {
        let simulating = self.aggregator.is_simulating(&event.twin_id);
        let power_observed = if simulating { 0.0 } else { event.power_observed };

        let discrepancy = match self.calculator.calculate_available(
            power_observed,
            event.model_value(ModelKind::Physics),
            event.model_value(ModelKind::MachineLearning),
        ) {
            Some(discrepancy) => discrepancy,
            // simulated errors do not depend on the models
            None if simulating => Discrepancy {
                percentage_pm_diff: 0.0,
                percentage_dm_diff: 0.0,
                is_error: false,
            },
            None => {
                warn!(
                    "⚠️ No model estimate for {} at {}, skipping discrepancy check",
                    event.twin_id, event.last_update_time
                );
                return None;
            }
        };
        debug!(
            "{}: PM {:.2}% DM {:.2}% error={}",
            event.twin_id,
            discrepancy.percentage_pm_diff,
            discrepancy.percentage_dm_diff,
            discrepancy.is_error
        );

        Some(self.aggregator.record_reading(
            ErrorKind::PowerAlert,
            PowerDifference {
                entity_id: event.twin_id.clone(),
                discrepancy,
                power_observed,
                power_pm: event.power_pm,
                power_dm: event.power_dm,
                timestamp: event.last_update_time,
            },
        ))
    }
}

impl TwinEventHandler for PowerEventListener {
    fn handle(&self, event: &TwinEvent) {
        if let TwinEvent::PowerUpdated(power) = event {
            self.on_power_updated(power);
        }
    }

    fn name(&self) -> &str {
        "power-discrepancy"
    }
}

/// Latest pitch/yaw state per turbine, keyed by the observed turbine twin
#[derive(Debug, Default)]
pub struct SensorStateListener {
    latest: RwLock<HashMap<String, SensorUpdated>>,
}

impl SensorStateListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, turbine_twin_id: &str) -> Option<SensorUpdated> {
        self.latest.read().get(turbine_twin_id).cloned()
    }

    pub fn tracked_turbines(&self) -> usize {
        self.latest.read().len()
    }
}

impl TwinEventHandler for SensorStateListener {
    fn handle(&self, event: &TwinEvent) {
        if let TwinEvent::SensorUpdated(sensor) = event {
            self.latest
                .write()
                .insert(sensor.observes.clone(), sensor.clone());
        }
    }

    fn name(&self) -> &str {
        "sensor-state"
    }
}
