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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two power prediction services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Physics-based model (PM)
    Physics,
    /// Data / machine-learning model (DM)
    MachineLearning,
}

impl ModelKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Physics => "PM",
            Self::MachineLearning => "DM",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physics => write!(f, "physics model"),
            Self::MachineLearning => write!(f, "ML model"),
        }
    }
}

/// Outcome of asking one model for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate {
    Available { value: f64 },
    /// The model answered but had nothing to say; reported as 0
    NoEstimate,
    /// The model failed or timed out; reported as 0
    Unavailable { reason: String },
}

impl Estimate {
    /// Numeric value, 0 when no estimate exists
    pub fn value(&self) -> f64 {
        match self {
            Self::Available { value } => *value,
            Self::NoEstimate | Self::Unavailable { .. } => 0.0,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Both model answers for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEstimates {
    pub pm: Estimate,
    pub dm: Estimate,
}

impl ModelEstimates {
    /// Models that failed for this sample
    pub fn unavailable(&self) -> Vec<ModelKind> {
        let mut kinds = Vec::new();
        if self.pm.is_unavailable() {
            kinds.push(ModelKind::Physics);
        }
        if self.dm.is_unavailable() {
            kinds.push(ModelKind::MachineLearning);
        }
        kinds
    }
}

/// Observed power plus both modelled values for one reading
#[derive(Debug, Clone, PartialEq)]
pub struct PowerEstimate {
    pub power_observed: f64,
    pub power_pm: Estimate,
    pub power_dm: Estimate,
}

impl PowerEstimate {
    pub fn new(power_observed: f64, estimates: ModelEstimates) -> Self {
        Self {
            power_observed,
            power_pm: estimates.pm,
            power_dm: estimates.dm,
        }
    }

    pub fn unavailable(&self) -> Vec<ModelKind> {
        ModelEstimates {
            pm: self.power_pm.clone(),
            dm: self.power_dm.clone(),
        }
        .unavailable()
    }
}

/// Percentage differences between observed and modelled power
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    #[serde(rename = "percentagePMDiff")]
    pub percentage_pm_diff: f64,
    #[serde(rename = "percentageDMDiff")]
    pub percentage_dm_diff: f64,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// One entry of an entity's discrepancy history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerDifference {
    pub entity_id: String,
    #[serde(flatten)]
    pub discrepancy: Discrepancy,
    pub power_observed: f64,
    #[serde(rename = "powerPM")]
    pub power_pm: f64,
    #[serde(rename = "powerDM")]
    pub power_dm: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-sample prediction answer returned by the HTTP surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerResult {
    #[serde(rename = "originSysTime")]
    pub origin_sys_time: String,
    #[serde(rename = "powerDM")]
    pub power_dm: f64,
    #[serde(rename = "powerPM")]
    pub power_pm: f64,
    /// Models whose value is a default because the call failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<ModelKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerResultSet {
    #[serde(rename = "powerResults")]
    pub power_results: Vec<PowerResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimate_values() {
        assert_eq!(Estimate::Available { value: 12.5 }.value(), 12.5);
        assert_eq!(Estimate::NoEstimate.value(), 0.0);
        let failed = Estimate::Unavailable {
            reason: "timeout".to_owned(),
        };
        assert_eq!(failed.value(), 0.0);
        assert!(failed.is_unavailable());
        assert!(!Estimate::NoEstimate.is_unavailable());
    }

    #[test]
    fn test_unavailable_models_are_listed() {
        let estimate = PowerEstimate::new(
            480.0,
            ModelEstimates {
                pm: Estimate::NoEstimate,
                dm: Estimate::Unavailable {
                    reason: "HTTP 500".to_owned(),
                },
            },
        );
        assert_eq!(estimate.unavailable(), vec![ModelKind::MachineLearning]);
    }

    #[test]
    fn test_power_result_wire_shape() {
        let result = PowerResult {
            origin_sys_time: "2020-10-29T00:00:00".to_owned(),
            power_dm: 410.0,
            power_pm: 395.5,
            unavailable: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"originSysTime": "2020-10-29T00:00:00", "powerDM": 410.0, "powerPM": 395.5})
        );
    }
}
