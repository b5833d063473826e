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

//! Percentage discrepancy between observed and modelled power

use windtwin_types::Discrepancy;

/// Default alert threshold (percent)
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;

/// Percentage difference relative to the mean of both values:
/// `100 * |a - b| / ((a + b) / 2)`.
///
/// When `a + b == 0` the formula is undefined. Two zeros are treated as
/// identical (0 %), any other pair summing to zero as infinitely apart.
pub fn pct_diff(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum == 0.0 {
        return if a == b { 0.0 } else { f64::INFINITY };
    }
    100.0 * ((a - b).abs() / (sum / 2.0))
}

/// Flags readings whose modelled power deviates too far from the observed one
#[derive(Debug, Clone, Copy)]
pub struct DiscrepancyCalculator {
    threshold_percent: f64,
}

impl Default for DiscrepancyCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl DiscrepancyCalculator {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    pub fn calculate(&self, observed: f64, physics_model: f64, ml_model: f64) -> Discrepancy {
        let percentage_pm_diff = pct_diff(observed, physics_model);
        let percentage_dm_diff = pct_diff(observed, ml_model);

        Discrepancy {
            percentage_pm_diff,
            percentage_dm_diff,
            is_error: percentage_dm_diff >= self.threshold_percent
                || percentage_pm_diff >= self.threshold_percent,
        }
    }

    /// Like [`Self::calculate`], leaving out models that produced no value.
    ///
    /// A missing model reports 0 % and never trips the threshold. `None` when
    /// neither model answered.
    pub fn calculate_available(
        &self,
        observed: f64,
        physics_model: Option<f64>,
        ml_model: Option<f64>,
    ) -> Option<Discrepancy> {
        if physics_model.is_none() && ml_model.is_none() {
            return None;
        }
        let percentage_pm_diff = physics_model.map(|pm| pct_diff(observed, pm));
        let percentage_dm_diff = ml_model.map(|dm| pct_diff(observed, dm));
        let trips = |pct: Option<f64>| pct.is_some_and(|pct| pct >= self.threshold_percent);

        Some(Discrepancy {
            percentage_pm_diff: percentage_pm_diff.unwrap_or_default(),
            percentage_dm_diff: percentage_dm_diff.unwrap_or_default(),
            is_error: trips(percentage_dm_diff) || trips(percentage_pm_diff),
        })
    }
}
