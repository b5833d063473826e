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

pub mod aggregator;
pub mod discrepancy;
pub mod error;
pub mod estimator;
pub mod event_bus;
pub mod interpolation;
pub mod listeners;
pub mod patch;
pub mod pipeline;
pub mod prediction;
pub mod resolver;
pub mod traits;

pub use aggregator::{AggregateOutcome, DEFAULT_HISTORY_LIMIT, EntitySnapshot, ErrorAggregator};
pub use discrepancy::{DEFAULT_THRESHOLD_PERCENT, DiscrepancyCalculator, pct_diff};
pub use error::{CoreError, CoreResult};
pub use estimator::{DEFAULT_MODEL_TIMEOUT, PowerEstimator};
pub use event_bus::{EventDispatcher, TwinEventChannel, TwinEventHandler, TwinEventSender};
pub use interpolation::{
    DEFAULT_STEP_MINUTES, DEFAULT_STEPS, Interpolator, Samples, interpolate_value,
};
pub use listeners::{PowerEventListener, SensorStateListener};
pub use patch::PatchBuilder;
pub use pipeline::{BatchReport, EventOutcome, SensorEventHandler};
pub use prediction::{PredictionService, StaticForecast};
pub use resolver::{DEFAULT_SENSOR_MODEL_ID, TwinIdResolver};
pub use traits::{ForecastSource, PowerModel, TwinStore};
