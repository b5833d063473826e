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

//! Power predictions for raw condition batches and weather forecasts

use crate::error::{CoreError, CoreResult};
use crate::estimator::PowerEstimator;
use crate::interpolation::Interpolator;
use crate::traits::ForecastSource;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;
use windtwin_types::{
    ForecastPoint, InterpolatedSample, PowerResult, PowerResultSet, TurbineConditions,
};

/// Runs interpolated forecasts and raw batches through both models
#[derive(Debug, Clone)]
pub struct PredictionService {
    interpolator: Interpolator,
    estimator: PowerEstimator,
}

impl PredictionService {
    pub fn new(interpolator: Interpolator, estimator: PowerEstimator) -> Self {
        Self {
            interpolator,
            estimator,
        }
    }

    /// One result per input, in input order
    pub async fn predict_conditions(&self, samples: &[TurbineConditions]) -> Vec<PowerResult> {
        let estimates = self.estimator.estimate(samples).await;
        samples
            .iter()
            .zip(estimates)
            .map(|(sample, estimate)| PowerResult {
                origin_sys_time: sample.origin_sys_time.clone(),
                power_dm: estimate.dm.value(),
                power_pm: estimate.pm.value(),
                unavailable: estimate.unavailable(),
            })
            .collect()
    }

    /// Densify the forecast and predict every sample
    pub async fn predict_forecast(&self, forecast: &[ForecastPoint]) -> CoreResult<PowerResultSet> {
        let conditions: Vec<TurbineConditions> = self
            .interpolator
            .samples(forecast)?
            .map(|sample: InterpolatedSample| sample.to_conditions())
            .collect();
        info!(
            "Predicting {} samples from {} forecast points",
            conditions.len(),
            forecast.len()
        );

        Ok(PowerResultSet {
            power_results: self.predict_conditions(&conditions).await,
        })
    }

    /// Pull the forecast from `source` and predict it
    pub async fn predict_from_source(&self, source: &dyn ForecastSource) -> CoreResult<PowerResultSet> {
        let forecast = source
            .read_forecast()
            .await
            .map_err(|source_error| CoreError::Forecast {
                source_name: source.name().to_owned(),
                source: source_error,
            })?;
        if forecast.is_empty() {
            return Err(CoreError::EmptyForecast);
        }
        self.predict_forecast(&forecast).await
    }
}

/// Fixed one-day forecast used when no forecast feed is configured
#[derive(Debug, Clone)]
pub struct StaticForecast {
    points: Vec<ForecastPoint>,
}

impl StaticForecast {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// Eight 3-hourly points for 2020-10-29
    pub fn sample_day() -> Self {
        // (hour, wind speed, wind direction, yaw)
        const POINTS: [(u32, f64, f64, f64); 8] = [
            (0, 5.9, -1.0, -131.48),
            (3, 6.8, 3.0, -109.37),
            (6, 6.3, 5.0, -104.41),
            (9, 5.9, 5.0, -104.41),
            (12, 6.9, 2.0, -109.37),
            (15, 7.1, -4.0, -131.48),
            (18, 6.8, -4.0, -131.48),
            (21, 6.8, -3.0, -131.48),
        ];

        let day = NaiveDate::from_ymd_opt(2020, 10, 29).unwrap_or_default();
        let points = POINTS
            .iter()
            .filter_map(|&(hour, wind_speed, wind_direction, yaw_position)| {
                Some(ForecastPoint {
                    forecast_date_time: day.and_hms_opt(hour, 0, 0)?,
                    wind_speed,
                    wind_direction,
                    yaw_position,
                    blade_pitch1: 2.0,
                    blade_pitch2: 2.0,
                    blade_pitch3: 2.0,
                })
            })
            .collect();
        Self { points }
    }
}

#[async_trait]
impl ForecastSource for StaticForecast {
    async fn read_forecast(&self) -> Result<Vec<ForecastPoint>> {
        Ok(self.points.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PowerModel;
    use anyhow::anyhow;
    use std::sync::Arc;
    use windtwin_types::{ModelKind, ValidationError};

    struct WindSpeedModel {
        kind: ModelKind,
        factor: f64,
    }

    #[async_trait]
    impl PowerModel for WindSpeedModel {
        async fn predict(&self, samples: &[TurbineConditions]) -> Result<Vec<f64>> {
            Ok(samples.iter().map(|s| s.wind_speed * self.factor).collect())
        }

        fn kind(&self) -> ModelKind {
            self.kind
        }

        fn name(&self) -> &str {
            "wind-speed"
        }
    }

    struct BrokenFeed;

    #[async_trait]
    impl ForecastSource for BrokenFeed {
        async fn read_forecast(&self) -> Result<Vec<ForecastPoint>> {
            Err(anyhow!("connection refused"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn service() -> PredictionService {
        PredictionService::new(
            Interpolator::default(),
            PowerEstimator::new(
                Arc::new(WindSpeedModel {
                    kind: ModelKind::Physics,
                    factor: 10.0,
                }),
                Arc::new(WindSpeedModel {
                    kind: ModelKind::MachineLearning,
                    factor: 20.0,
                }),
            ),
        )
    }

    #[tokio::test]
    async fn test_sample_day_prediction() {
        let results = service()
            .predict_from_source(&StaticForecast::sample_day())
            .await
            .unwrap();

        assert_eq!(results.power_results.len(), 48);
        let first = &results.power_results[0];
        assert_eq!(first.origin_sys_time, "2020-10-29T00:00:00");
        assert!((first.power_pm - 59.0).abs() < 1e-9);
        assert!((first.power_dm - 118.0).abs() < 1e-9);
        assert_eq!(
            results.power_results[47].origin_sys_time,
            "2020-10-29T23:30:00"
        );
    }

    #[tokio::test]
    async fn test_feed_failure_is_reported() {
        let result = service().predict_from_source(&BrokenFeed).await;
        assert!(matches!(result, Err(CoreError::Forecast { .. })));
    }

    #[tokio::test]
    async fn test_empty_feed_is_reported() {
        let result = service()
            .predict_from_source(&StaticForecast::new(Vec::new()))
            .await;
        assert!(matches!(result, Err(CoreError::EmptyForecast)));
    }

    #[tokio::test]
    async fn test_unordered_forecast_is_rejected() {
        let mut points = StaticForecast::sample_day().points;
        points.swap(0, 1);

        let result = service().predict_forecast(&points).await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::UnorderedForecast { .. }))
        ));
    }

    #[tokio::test]
    async fn test_raw_conditions_keep_order() {
        let samples: Vec<TurbineConditions> = [4.0, 8.0]
            .iter()
            .enumerate()
            .map(|(i, speed)| TurbineConditions {
                blade_pitch1: 2.0,
                blade_pitch2: 2.0,
                blade_pitch3: 2.0,
                origin_sys_time: format!("t{i}"),
                wind_direction: 0.0,
                wind_speed: *speed,
                yaw_position: 0.0,
            })
            .collect();

        let results = service().predict_conditions(&samples).await;
        assert_eq!(results[0].origin_sys_time, "t0");
        assert_eq!(results[1].power_dm, 160.0);
        assert!(results[1].unavailable.is_empty());
    }
}
