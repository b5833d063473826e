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

use windtwin_types::{JsonPatch, PowerEstimate, TemperatureValues, TurbineConditions};

/// Builds the JSON-Patch documents sent to the sensor and turbine twins
#[derive(Debug)]
pub struct PatchBuilder;

impl PatchBuilder {
    /// Nine replace operations: pitches, yaw, wind, then temperatures
    pub fn sensor_patch(conditions: &TurbineConditions, temperatures: TemperatureValues) -> JsonPatch {
        let mut patch = JsonPatch::new();
        patch
            .append_replace("/blade1PitchAngle", conditions.blade_pitch1)
            .append_replace("/blade2PitchAngle", conditions.blade_pitch2)
            .append_replace("/blade3PitchAngle", conditions.blade_pitch3)
            .append_replace("/yawPosition", conditions.yaw_position)
            .append_replace("/windDirection", conditions.wind_direction)
            .append_replace("/windSpeed", conditions.wind_speed)
            .append_replace("/temperatureNacelle", temperatures.nacelle)
            .append_replace("/temperatureGenerator", temperatures.generator)
            .append_replace("/temperatureGearBox", temperatures.gear_box);
        patch
    }

    /// Observed and modelled power; unavailable estimates are written as 0
    pub fn turbine_patch(estimate: &PowerEstimate) -> JsonPatch {
        let mut patch = JsonPatch::new();
        patch
            .append_replace("/powerObserved", estimate.power_observed)
            .append_replace("/powerPM", estimate.power_pm.value())
            .append_replace("/powerDM", estimate.power_dm.value());
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windtwin_types::{Estimate, ModelEstimates};

    fn conditions() -> TurbineConditions {
        TurbineConditions {
            blade_pitch1: 1.99,
            blade_pitch2: 2.02,
            blade_pitch3: 1.92,
            origin_sys_time: "2020-10-29T11:43:00".to_owned(),
            wind_direction: -1.0,
            wind_speed: 5.9,
            yaw_position: 5.05,
        }
    }

    #[test]
    fn test_sensor_patch_has_nine_ordered_ops() {
        let temperatures = TemperatureValues {
            nacelle: 30.0,
            gear_box: 41.8,
            generator: 45.2,
        };
        let patch = PatchBuilder::sensor_patch(&conditions(), temperatures);

        assert_eq!(patch.len(), 9);
        let paths: Vec<&str> = patch.operations().iter().map(|op| op.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/blade1PitchAngle",
                "/blade2PitchAngle",
                "/blade3PitchAngle",
                "/yawPosition",
                "/windDirection",
                "/windSpeed",
                "/temperatureNacelle",
                "/temperatureGenerator",
                "/temperatureGearBox",
            ]
        );
        assert_eq!(patch.value_at("/temperatureNacelle"), Some(30.0));
        assert_eq!(patch.value_at("/temperatureGenerator"), Some(45.2));
        assert_eq!(patch.value_at("/temperatureGearBox"), Some(41.8));
    }

    #[test]
    fn test_turbine_patch_defaults_unavailable_to_zero() {
        let estimate = PowerEstimate::new(
            500.0,
            ModelEstimates {
                pm: Estimate::Unavailable {
                    reason: "timeout".to_owned(),
                },
                dm: Estimate::Available { value: 490.0 },
            },
        );
        let patch = PatchBuilder::turbine_patch(&estimate);

        assert_eq!(patch.len(), 3);
        assert_eq!(patch.value_at("/powerObserved"), Some(500.0));
        assert_eq!(patch.value_at("/powerPM"), Some(0.0));
        assert_eq!(patch.value_at("/powerDM"), Some(490.0));
    }
}
