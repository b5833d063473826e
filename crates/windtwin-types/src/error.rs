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

//! Boundary validation errors for inbound payloads

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed telemetry payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("device id is empty")]
    EmptyDeviceId,

    #[error("device id '{0}' contains characters not allowed in a twin query")]
    UnsafeDeviceId(String),

    #[error("forecast point {index} at {timestamp} is earlier than the point before it")]
    UnorderedForecast { index: usize, timestamp: String },

    #[error("forecast point {index} at {timestamp} is too close to the end of the supported time range")]
    TimestampOutOfRange { index: usize, timestamp: String },

    #[error("twin event is missing '{0}'")]
    MissingTwinField(&'static str),
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
