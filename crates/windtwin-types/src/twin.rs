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

use crate::error::{ValidationError, ValidationResult};
use crate::power::ModelKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Twin ids resolved for one physical device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwinIdentity {
    pub sensor_twin_id: String,
    /// Turbine twin the sensor `observes`
    pub turbine_twin_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
}

/// A single JSON-Patch operation on a twin property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: f64,
}

/// Ordered JSON-Patch document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPatch(Vec<PatchOperation>);

impl JsonPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_replace(&mut self, path: impl Into<String>, value: f64) -> &mut Self {
        self.0.push(PatchOperation {
            op: PatchOp::Replace,
            path: path.into(),
            value,
        });
        self
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the operation targeting `path`, if any
    pub fn value_at(&self, path: &str) -> Option<f64> {
        self.0.iter().find(|op| op.path == path).map(|op| op.value)
    }
}

/// Power properties of a turbine twin changed
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUpdated {
    pub twin_id: String,
    pub power_observed: f64,
    pub power_pm: f64,
    pub power_dm: f64,
    /// Last update time of `powerObserved`, used as the event timestamp
    pub last_update_time: DateTime<Utc>,
    /// Models whose value is a default because the call failed
    pub unavailable: Vec<ModelKind>,
}

impl PowerUpdated {
    /// Modelled value, `None` when the model was unavailable
    pub fn model_value(&self, kind: ModelKind) -> Option<f64> {
        if self.unavailable.contains(&kind) {
            return None;
        }
        Some(match kind {
            ModelKind::Physics => self.power_pm,
            ModelKind::MachineLearning => self.power_dm,
        })
    }
}

/// Pitch/yaw properties of a sensor twin changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorUpdated {
    /// Turbine twin this sensor observes
    pub observes: String,
    pub blade1_pitch_angle: f64,
    pub blade2_pitch_angle: f64,
    pub blade3_pitch_angle: f64,
    pub yaw_position: f64,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
}

/// Change notifications coming out of the twin store
#[derive(Debug, Clone, PartialEq)]
pub enum TwinEvent {
    SensorUpdated(SensorUpdated),
    PowerUpdated(PowerUpdated),
}

#[derive(Deserialize)]
struct PowerTwinDocument {
    #[serde(rename = "$dtId")]
    dt_id: String,
    #[serde(rename = "powerObserved")]
    power_observed: f64,
    #[serde(rename = "powerPM")]
    power_pm: f64,
    #[serde(rename = "powerDM")]
    power_dm: f64,
    #[serde(rename = "$metadata")]
    metadata: PowerTwinMetadata,
}

#[derive(Deserialize)]
struct PowerTwinMetadata {
    #[serde(rename = "powerObserved")]
    power_observed: PropertyMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyMetadata {
    last_update_time: DateTime<Utc>,
}

impl TwinEvent {
    /// Decode a twin document as published by the change feed.
    ///
    /// Sensor twins carry `observes`; turbine twins carry `powerObserved`.
    pub fn from_notification(document: &serde_json::Value) -> ValidationResult<Self> {
        if document.get("observes").is_some() {
            let sensor: SensorUpdated = serde_json::from_value(document.clone())?;
            return Ok(Self::SensorUpdated(sensor));
        }
        if document.get("powerObserved").is_some() {
            let twin: PowerTwinDocument = serde_json::from_value(document.clone())?;
            return Ok(Self::PowerUpdated(PowerUpdated {
                twin_id: twin.dt_id,
                power_observed: twin.power_observed,
                power_pm: twin.power_pm,
                power_dm: twin.power_dm,
                last_update_time: twin.metadata.power_observed.last_update_time,
                unavailable: Vec::new(),
            }));
        }
        Err(ValidationError::MissingTwinField("observes or powerObserved"))
    }

    /// Entity the event is about (turbine twin id)
    pub fn entity_id(&self) -> &str {
        match self {
            Self::SensorUpdated(event) => &event.observes,
            Self::PowerUpdated(event) => &event.twin_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_wire_shape() {
        let mut patch = JsonPatch::new();
        patch
            .append_replace("/powerObserved", 500.0)
            .append_replace("/powerPM", 100.0);

        assert_eq!(patch.len(), 2);
        assert_eq!(patch.value_at("/powerPM"), Some(100.0));
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!([
                {"op": "replace", "path": "/powerObserved", "value": 500.0},
                {"op": "replace", "path": "/powerPM", "value": 100.0}
            ])
        );
    }

    #[test]
    fn test_power_notification() {
        let event = TwinEvent::from_notification(&json!({
            "$dtId": "WTG003",
            "powerObserved": 500.0,
            "powerPM": 100.0,
            "powerDM": 490.0,
            "$metadata": {
                "powerObserved": {"lastUpdateTime": "2020-10-29T11:43:00Z"}
            }
        }))
        .unwrap();

        let TwinEvent::PowerUpdated(power) = event else {
            panic!("expected a power update");
        };
        assert_eq!(power.twin_id, "WTG003");
        assert_eq!(power.power_dm, 490.0);
        assert_eq!(power.last_update_time.to_rfc3339(), "2020-10-29T11:43:00+00:00");
        assert!(power.unavailable.is_empty());
        assert_eq!(power.model_value(ModelKind::Physics), Some(100.0));
    }

    #[test]
    fn test_unavailable_model_has_no_value() {
        let power = PowerUpdated {
            twin_id: "WTG003".to_owned(),
            power_observed: 500.0,
            power_pm: 495.0,
            power_dm: 0.0,
            last_update_time: Utc::now(),
            unavailable: vec![ModelKind::MachineLearning],
        };
        assert_eq!(power.model_value(ModelKind::Physics), Some(495.0));
        assert_eq!(power.model_value(ModelKind::MachineLearning), None);
    }

    #[test]
    fn test_sensor_notification() {
        let event = TwinEvent::from_notification(&json!({
            "$dtId": "WTG003-S",
            "observes": "WTG003",
            "blade1PitchAngle": 1.99,
            "blade2PitchAngle": 2.02,
            "blade3PitchAngle": 1.92,
            "yawPosition": 5.05
        }))
        .unwrap();

        assert_eq!(event.entity_id(), "WTG003");
        assert!(matches!(event, TwinEvent::SensorUpdated(ref s) if s.wind_speed.is_none()));
    }

    #[test]
    fn test_power_notification_without_metadata_is_rejected() {
        let result = TwinEvent::from_notification(&json!({
            "$dtId": "WTG003",
            "powerObserved": 500.0,
            "powerPM": 100.0,
            "powerDM": 490.0
        }));
        assert!(matches!(result, Err(ValidationError::Payload(_))));
    }

    #[test]
    fn test_unknown_document_is_rejected() {
        let result = TwinEvent::from_notification(&json!({"$dtId": "WTG003"}));
        assert!(matches!(result, Err(ValidationError::MissingTwinField(_))));
    }
}
