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

pub mod alerts;
pub mod error;
pub mod forecast;
pub mod power;
pub mod telemetry;
pub mod twin;

// Re-export common types for convenience
pub use alerts::{ErrorKind, ErrorWindow};
pub use error::{ValidationError, ValidationResult};
pub use forecast::{ForecastPoint, InterpolatedSample, SAMPLE_TIME_FORMAT};
pub use power::{
    Discrepancy, Estimate, ModelEstimates, ModelKind, PowerDifference, PowerEstimate,
    PowerResult, PowerResultSet,
};
pub use telemetry::{
    SensorReading, TelemetryEvent, TelemetryPayload, TemperatureValues, TurbineConditions,
    logical_device_id,
};
pub use twin::{
    JsonPatch, PatchOp, PatchOperation, PowerUpdated, SensorUpdated, TwinEvent, TwinIdentity,
};
