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

//! Builds the service graph from configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use windtwin_adapters::{DigitalTwinsClient, HttpForecastSource, MlModelClient, PhysicsModelClient};
use windtwin_core::{
    DiscrepancyCalculator, ErrorAggregator, EventDispatcher, ForecastSource, Interpolator,
    PowerEstimator, PowerEventListener, PowerModel, PredictionService, SensorEventHandler,
    SensorStateListener, StaticForecast, TwinEventChannel, TwinEventSender, TwinIdResolver,
    TwinStore,
};

use crate::api::AppState;
use crate::config::ServiceConfig;

/// External collaborators the service talks to
#[derive(Clone)]
pub struct Collaborators {
    pub twin_store: Arc<dyn TwinStore>,
    pub physics_model: Arc<dyn PowerModel>,
    pub ml_model: Arc<dyn PowerModel>,
    pub forecast: Arc<dyn ForecastSource>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("twin_store", &self.twin_store.name())
            .field("physics_model", &self.physics_model.name())
            .field("ml_model", &self.ml_model.name())
            .field("forecast", &self.forecast.name())
            .finish()
    }
}

/// Router state plus the event dispatcher that still has to be spawned
#[derive(Debug)]
pub struct Service {
    pub state: AppState,
    pub dispatcher: EventDispatcher,
    pub channel: TwinEventChannel,
}

impl Service {
    /// Spawn the event dispatcher and return the router state
    pub fn start(self) -> AppState {
        tokio::spawn(self.dispatcher.run(self.channel));
        self.state
    }
}

/// HTTP-backed collaborators as configured
pub fn http_collaborators(config: &ServiceConfig) -> Result<Collaborators> {
    let twins = DigitalTwinsClient::new(&config.twins.base_url, config.twins_token())
        .context("Failed to create digital twins client")?
        .with_api_version(&config.twins.api_version)
        .with_retry_config(config.twins.max_retries, Duration::from_millis(500));

    let ml = MlModelClient::new(&config.models.ml.url, config.models.ml.timeout())
        .context("Failed to create ML model client")?
        .with_api_key(config.models.ml.api_key.clone());

    let physics = PhysicsModelClient::new(&config.models.physics.url, config.models.physics.timeout())
        .context("Failed to create physics model client")?
        .with_request_shape(config.models.physics.request_shape);

    let forecast: Arc<dyn ForecastSource> = match &config.forecast.url {
        Some(url) => {
            info!("Forecast feed: {}", url);
            Arc::new(HttpForecastSource::new(url).context("Failed to create forecast client")?)
        }
        None => {
            info!("No forecast feed configured, serving the built-in sample day");
            Arc::new(StaticForecast::sample_day())
        }
    };

    Ok(Collaborators {
        twin_store: Arc::new(twins),
        physics_model: Arc::new(physics),
        ml_model: Arc::new(ml),
        forecast,
    })
}

pub fn assemble(collaborators: Collaborators, config: &ServiceConfig) -> Service {
    let model_timeout = config
        .models
        .ml
        .timeout()
        .max(config.models.physics.timeout());
    let estimator = PowerEstimator::new(collaborators.physics_model, collaborators.ml_model)
        .with_timeout(model_timeout);

    let interpolator = Interpolator::new(
        config.interpolation.steps,
        config.interpolation.step_interval(),
    );
    let predictions = PredictionService::new(interpolator, estimator.clone());

    let (events, channel) = TwinEventSender::new();
    let resolver = TwinIdResolver::with_sensor_model(
        Arc::clone(&collaborators.twin_store),
        &config.twins.sensor_model_id,
    );
    let pipeline = SensorEventHandler::new(resolver, collaborators.twin_store, estimator)
        .with_event_sender(events.clone());

    let aggregator = Arc::new(ErrorAggregator::new(config.discrepancy.history_limit));
    let sensors = Arc::new(SensorStateListener::new());
    let mut dispatcher = EventDispatcher::new();
    dispatcher
        .register(Arc::new(PowerEventListener::new(
            DiscrepancyCalculator::new(config.discrepancy.threshold_percent),
            Arc::clone(&aggregator),
        )))
        .register(sensors.clone());

    Service {
        state: AppState {
            predictions,
            forecast: collaborators.forecast,
            pipeline: Arc::new(pipeline),
            events,
            aggregator,
            sensors,
        },
        dispatcher,
        channel,
    }
}
