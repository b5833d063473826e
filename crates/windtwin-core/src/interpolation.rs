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

//! Densifies a 3-hourly weather forecast into model-sized samples

use chrono::{Duration, NaiveDateTime};
use windtwin_types::{
    ForecastPoint, InterpolatedSample, SAMPLE_TIME_FORMAT, ValidationError, ValidationResult,
};

pub const DEFAULT_STEPS: usize = 6;
pub const DEFAULT_STEP_MINUTES: i64 = 30;

/// Value `j` steps from `current` towards `next`.
///
/// The gap is split into `steps + 1` parts, so with `j < steps` the result
/// never reaches `next`.
pub fn interpolate_value(current: f64, next: f64, steps: usize, j: usize) -> f64 {
    let step = (next - current).abs() / (steps as f64 + 1.0);
    if current < next {
        current + step * j as f64
    } else {
        current - step * j as f64
    }
}

/// `start + j * interval`, `None` when it leaves chrono's range
fn sample_time(start: NaiveDateTime, interval: Duration, j: usize) -> Option<NaiveDateTime> {
    let j = i32::try_from(j).ok()?;
    start.checked_add_signed(interval.checked_mul(j)?)
}

#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    steps: usize,
    step_interval: Duration,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS, Duration::minutes(DEFAULT_STEP_MINUTES))
    }
}

impl Interpolator {
    pub fn new(steps: usize, step_interval: Duration) -> Self {
        Self {
            steps,
            step_interval,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Lazily produce `forecast.len() * steps` samples
    pub fn samples<'a>(&self, forecast: &'a [ForecastPoint]) -> ValidationResult<Samples<'a>> {
        validate_order(forecast)?;
        self.validate_range(forecast)?;
        Ok(Samples {
            forecast,
            steps: self.steps,
            step_interval: self.step_interval,
            index: 0,
            step: 0,
        })
    }

    pub fn interpolate(&self, forecast: &[ForecastPoint]) -> ValidationResult<Vec<InterpolatedSample>> {
        Ok(self.samples(forecast)?.collect())
    }

    fn validate_range(&self, forecast: &[ForecastPoint]) -> ValidationResult<()> {
        let Some(last_step) = self.steps.checked_sub(1) else {
            return Ok(());
        };
        for (index, point) in forecast.iter().enumerate() {
            if sample_time(point.forecast_date_time, self.step_interval, last_step).is_none() {
                return Err(ValidationError::TimestampOutOfRange {
                    index,
                    timestamp: point.forecast_date_time.format(SAMPLE_TIME_FORMAT).to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_order(forecast: &[ForecastPoint]) -> ValidationResult<()> {
    for (index, pair) in forecast.windows(2).enumerate() {
        if pair[1].forecast_date_time < pair[0].forecast_date_time {
            return Err(ValidationError::UnorderedForecast {
                index: index + 1,
                timestamp: pair[1]
                    .forecast_date_time
                    .format(SAMPLE_TIME_FORMAT)
                    .to_string(),
            });
        }
    }
    Ok(())
}

/// Iterator returned by [`Interpolator::samples`]
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    forecast: &'a [ForecastPoint],
    steps: usize,
    step_interval: Duration,
    index: usize,
    step: usize,
}

impl Iterator for Samples<'_> {
    type Item = InterpolatedSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.steps == 0 {
            return None;
        }
        let current = self.forecast.get(self.index)?;
        let j = self.step;
        let timestamp = sample_time(current.forecast_date_time, self.step_interval, j)?;

        let sample = match self.forecast.get(self.index + 1) {
            Some(next) => InterpolatedSample {
                timestamp,
                blade_pitch1: current.blade_pitch1,
                blade_pitch2: current.blade_pitch2,
                blade_pitch3: current.blade_pitch3,
                wind_speed: interpolate_value(current.wind_speed, next.wind_speed, self.steps, j),
                wind_direction: interpolate_value(
                    current.wind_direction,
                    next.wind_direction,
                    self.steps,
                    j,
                ),
                yaw_position: interpolate_value(
                    current.yaw_position,
                    next.yaw_position,
                    self.steps,
                    j,
                ),
            },
            // Last point: hold values
            None => InterpolatedSample {
                timestamp,
                blade_pitch1: current.blade_pitch1,
                blade_pitch2: current.blade_pitch2,
                blade_pitch3: current.blade_pitch3,
                wind_speed: current.wind_speed,
                wind_direction: current.wind_direction,
                yaw_position: current.yaw_position,
            },
        };

        self.step += 1;
        if self.step == self.steps {
            self.step = 0;
            self.index += 1;
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.steps == 0 {
            0
        } else {
            (self.forecast.len().saturating_sub(self.index)) * self.steps - self.step
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: &str, wind_speed: f64, wind_direction: f64, yaw: f64) -> ForecastPoint {
        ForecastPoint {
            forecast_date_time: time.parse::<NaiveDateTime>().unwrap(),
            wind_speed,
            wind_direction,
            yaw_position: yaw,
            blade_pitch1: 2.0,
            blade_pitch2: 2.5,
            blade_pitch3: 3.0,
        }
    }

    fn two_points() -> Vec<ForecastPoint> {
        vec![
            point("2020-10-29T00:00:00", 5.9, -1.0, -131.48),
            point("2020-10-29T03:00:00", 6.8, 3.0, -109.37),
        ]
    }

    #[test]
    fn test_two_points_give_twelve_samples() {
        let samples = Interpolator::default().interpolate(&two_points()).unwrap();
        assert_eq!(samples.len(), 12);
    }

    #[test]
    fn test_first_sample_matches_first_point() {
        let forecast = two_points();
        let samples = Interpolator::default().interpolate(&forecast).unwrap();

        let first = &samples[0];
        assert_eq!(first.timestamp, forecast[0].forecast_date_time);
        assert_eq!(first.wind_speed, 5.9);
        assert_eq!(first.wind_direction, -1.0);
        assert_eq!(first.yaw_position, -131.48);
    }

    #[test]
    fn test_pitch_is_copied_and_timestamps_step() {
        let samples = Interpolator::default().interpolate(&two_points()).unwrap();

        for sample in &samples {
            assert_eq!(sample.blade_pitch1, 2.0);
            assert_eq!(sample.blade_pitch2, 2.5);
            assert_eq!(sample.blade_pitch3, 3.0);
        }
        assert_eq!(
            samples[1].to_conditions().origin_sys_time,
            "2020-10-29T00:30:00"
        );
        assert_eq!(
            samples[5].to_conditions().origin_sys_time,
            "2020-10-29T02:30:00"
        );
        assert_eq!(
            samples[6].to_conditions().origin_sys_time,
            "2020-10-29T03:00:00"
        );
    }

    #[test]
    fn test_values_move_towards_next_point() {
        let samples = Interpolator::default().interpolate(&two_points()).unwrap();

        // (6.8 - 5.9) / 7 per step, rising
        assert!((samples[1].wind_speed - (5.9 + 0.9 / 7.0)).abs() < 1e-9);
        // (3 - -1) / 7 per step, rising
        assert!((samples[3].wind_direction - (-1.0 + 3.0 * 4.0 / 7.0)).abs() < 1e-9);
        // Never reaches the next point inside the span
        assert!(samples[5].wind_speed < 6.8);
    }

    #[test]
    fn test_descending_values() {
        let forecast = vec![
            point("2020-10-29T00:00:00", 7.1, 10.0, 0.0),
            point("2020-10-29T03:00:00", 6.4, 3.0, 0.0),
        ];
        let samples = Interpolator::default().interpolate(&forecast).unwrap();

        assert!((samples[2].wind_speed - (7.1 - 2.0 * 0.7 / 7.0)).abs() < 1e-9);
        assert!((samples[2].wind_direction - (10.0 - 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_last_point_is_held() {
        let forecast = two_points();
        let samples = Interpolator::default().interpolate(&forecast).unwrap();

        for sample in &samples[6..] {
            assert_eq!(sample.wind_speed, 6.8);
            assert_eq!(sample.wind_direction, 3.0);
            assert_eq!(sample.yaw_position, -109.37);
        }
        assert_eq!(
            samples[11].to_conditions().origin_sys_time,
            "2020-10-29T05:30:00"
        );
    }

    #[test]
    fn test_empty_forecast() {
        let interpolator = Interpolator::default();
        assert!(interpolator.interpolate(&[]).unwrap().is_empty());
        assert_eq!(interpolator.samples(&[]).unwrap().len(), 0);
    }

    #[test]
    fn test_lazy_iterator_matches_eager() {
        let forecast = two_points();
        let interpolator = Interpolator::new(3, Duration::minutes(60));

        let lazy = interpolator.samples(&forecast).unwrap();
        assert_eq!(lazy.len(), 6);
        assert_eq!(lazy.collect::<Vec<_>>(), interpolator.interpolate(&forecast).unwrap());
    }

    #[test]
    fn test_unordered_forecast_is_rejected() {
        let mut forecast = two_points();
        forecast.reverse();

        let result = Interpolator::default().interpolate(&forecast);
        assert!(matches!(
            result,
            Err(ValidationError::UnorderedForecast { index: 1, .. })
        ));
    }

    #[test]
    fn test_two_points_from_five_to_seven() {
        let forecast = [
            point("2020-10-29T00:00:00", 5.0, 0.0, 0.0),
            point("2020-10-29T03:00:00", 7.0, 0.0, 0.0),
        ];
        let samples = Interpolator::default().interpolate(&forecast).unwrap();

        assert_eq!(samples.len(), 12);
        assert_eq!(samples[0].wind_speed, 5.0);
        assert!((samples[1].wind_speed - (5.0 + 2.0 / 7.0)).abs() < 1e-9);
        assert_eq!(samples[6].wind_speed, 7.0);
    }

    #[test]
    fn test_timestamp_at_end_of_range_is_rejected() {
        let mut forecast = two_points();
        forecast[1].forecast_date_time = NaiveDateTime::MAX - Duration::hours(1);

        let err = Interpolator::default().samples(&forecast).unwrap_err();
        assert!(matches!(err, ValidationError::TimestampOutOfRange { index: 1, .. }));

        // one step still fits
        let single = Interpolator::new(1, Duration::minutes(30));
        assert_eq!(single.interpolate(&forecast).unwrap().len(), 2);
    }

    #[test]
    fn test_interpolate_value() {
        assert_eq!(interpolate_value(0.0, 7.0, 6, 0), 0.0);
        assert_eq!(interpolate_value(0.0, 7.0, 6, 3), 3.0);
        assert_eq!(interpolate_value(7.0, 0.0, 6, 3), 4.0);
        assert_eq!(interpolate_value(5.0, 5.0, 6, 4), 5.0);
    }
}
