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

use crate::telemetry::TurbineConditions;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used when a sample is handed to the power models
pub const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One point of the weather forecast feed (3-hour cadence).
/// Field names follow the feed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "forecastDateTime")]
    pub forecast_date_time: NaiveDateTime,
    #[serde(rename = "windspeed")]
    pub wind_speed: f64,
    #[serde(rename = "winddirection")]
    pub wind_direction: f64,
    #[serde(rename = "yawposition")]
    pub yaw_position: f64,
    #[serde(rename = "bladepitch1")]
    pub blade_pitch1: f64,
    #[serde(rename = "bladepitch2")]
    pub blade_pitch2: f64,
    #[serde(rename = "bladepitch3")]
    pub blade_pitch3: f64,
}

/// A densified forecast sample between two forecast points
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedSample {
    pub timestamp: NaiveDateTime,
    pub blade_pitch1: f64,
    pub blade_pitch2: f64,
    pub blade_pitch3: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub yaw_position: f64,
}

impl InterpolatedSample {
    /// Model input for this sample
    pub fn to_conditions(&self) -> TurbineConditions {
        TurbineConditions {
            blade_pitch1: self.blade_pitch1,
            blade_pitch2: self.blade_pitch2,
            blade_pitch3: self.blade_pitch3,
            origin_sys_time: self.timestamp.format(SAMPLE_TIME_FORMAT).to_string(),
            wind_direction: self.wind_direction,
            wind_speed: self.wind_speed,
            yaw_position: self.yaw_position,
        }
    }
}
