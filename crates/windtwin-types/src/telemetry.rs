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
use serde::{Deserialize, Serialize};

/// One inbound message from the IoT hub.
///
/// The device identity travels next to the body (connection metadata), not inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    /// Connection device id, e.g. "building1.WTG003"
    #[serde(alias = "iothub-connection-device-id")]
    pub connection_device_id: String,
    /// Raw JSON body, validated by [`SensorReading::from_event`]
    pub body: serde_json::Value,
}

/// Telemetry body as emitted by the turbine gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub pitch_angle1: f64,
    pub pitch_angle2: f64,
    pub pitch_angle3: f64,
    pub origin_sys_time: String,
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub yaw_position: f64,
    pub nacelle_temp: f64,
    pub gearbox_temp: f64,
    /// Converter temperature, stored on the twin as the generator temperature
    pub conv_temp: f64,
    /// Observed power (kW)
    pub power: f64,
}

/// Operating conditions the power models take as input.
///
/// Produced either from a live reading or from an interpolated forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurbineConditions {
    #[serde(alias = "Blade1PitchPosition")]
    pub blade_pitch1: f64,
    #[serde(alias = "Blade2PitchPosition")]
    pub blade_pitch2: f64,
    #[serde(alias = "Blade3PitchPosition")]
    pub blade_pitch3: f64,
    #[serde(alias = "OriginSysTime")]
    pub origin_sys_time: String,
    #[serde(alias = "WindDir")]
    pub wind_direction: f64,
    #[serde(alias = "WindSpeed")]
    pub wind_speed: f64,
    #[serde(alias = "YawPosition")]
    pub yaw_position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureValues {
    pub nacelle: f64,
    pub gear_box: f64,
    pub generator: f64,
}

/// A validated sensor reading. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Logical device id (connection prefix stripped)
    pub device_id: String,
    pub conditions: TurbineConditions,
    pub temperatures: TemperatureValues,
    pub power_observed: f64,
}

impl SensorReading {
    /// Validate an inbound event and build a reading from it
    pub fn from_event(event: &TelemetryEvent) -> ValidationResult<Self> {
        let device_id = logical_device_id(&event.connection_device_id);
        let payload: TelemetryPayload = serde_json::from_value(event.body.clone())?;
        Self::from_payload(device_id, payload)
    }

    pub fn from_payload(device_id: &str, payload: TelemetryPayload) -> ValidationResult<Self> {
        if device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        if device_id.contains(['\'', '"', '\\']) {
            return Err(ValidationError::UnsafeDeviceId(device_id.to_owned()));
        }

        Ok(Self {
            device_id: device_id.to_owned(),
            conditions: TurbineConditions {
                blade_pitch1: payload.pitch_angle1,
                blade_pitch2: payload.pitch_angle2,
                blade_pitch3: payload.pitch_angle3,
                origin_sys_time: payload.origin_sys_time,
                wind_direction: payload.wind_direction,
                wind_speed: payload.wind_speed,
                yaw_position: payload.yaw_position,
            },
            temperatures: TemperatureValues {
                nacelle: payload.nacelle_temp,
                gear_box: payload.gearbox_temp,
                generator: payload.conv_temp,
            },
            power_observed: payload.power,
        })
    }
}

/// Strip everything up to and including the first `.` of a connection device id
pub fn logical_device_id(connection_device_id: &str) -> &str {
    connection_device_id
        .split_once('.')
        .map_or(connection_device_id, |(_, device)| device)
}
