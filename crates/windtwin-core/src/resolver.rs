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

use crate::error::{CoreError, CoreResult};
use crate::traits::TwinStore;
use std::sync::Arc;
use tracing::{debug, info};
use windtwin_types::{TwinIdentity, ValidationError};

pub const DEFAULT_SENSOR_MODEL_ID: &str = "dtmi:adt:chb:Sensor;1";

/// Maps a logical device id to the sensor twin and the turbine twin it observes
#[derive(Clone)]
pub struct TwinIdResolver {
    store: Arc<dyn TwinStore>,
    sensor_model_id: String,
}

impl std::fmt::Debug for TwinIdResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwinIdResolver")
            .field("store", &self.store.name())
            .field("sensor_model_id", &self.sensor_model_id)
            .finish()
    }
}

impl TwinIdResolver {
    pub fn new(store: Arc<dyn TwinStore>) -> Self {
        Self::with_sensor_model(store, DEFAULT_SENSOR_MODEL_ID)
    }

    pub fn with_sensor_model(store: Arc<dyn TwinStore>, sensor_model_id: impl Into<String>) -> Self {
        Self {
            store,
            sensor_model_id: sensor_model_id.into(),
        }
    }

    /// Twin query selecting the sensor twin bound to `device_id`
    pub fn build_query(&self, device_id: &str) -> CoreResult<String> {
        if device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        if device_id.contains(['\'', '"', '\\']) {
            return Err(ValidationError::UnsafeDeviceId(device_id.to_owned()).into());
        }
        Ok(format!(
            "SELECT * FROM DigitalTwins T WHERE IS_OF_MODEL(T, '{}') AND T.deviceId = '{}'",
            self.sensor_model_id, device_id
        ))
    }

    /// `Ok(None)` when the device has no twin yet
    pub async fn resolve(&self, device_id: &str) -> CoreResult<Option<TwinIdentity>> {
        let query = self.build_query(device_id)?;
        debug!("Resolving twins for {}: {}", device_id, query);

        let documents = self
            .store
            .query(&query)
            .await
            .map_err(|source| CoreError::TwinStore {
                store: self.store.name().to_owned(),
                source,
            })?;

        let Some(document) = documents.first() else {
            info!("Node not found for device {}", device_id);
            return Ok(None);
        };

        let sensor = document.get("$dtId").and_then(|v| v.as_str());
        let turbine = document.get("observes").and_then(|v| v.as_str());
        match (sensor, turbine) {
            (Some(sensor), Some(turbine)) if !sensor.is_empty() && !turbine.is_empty() => {
                Ok(Some(TwinIdentity {
                    sensor_twin_id: sensor.to_owned(),
                    turbine_twin_id: turbine.to_owned(),
                }))
            }
            _ => {
                info!("Sensor twin for {} is not bound to a turbine yet", device_id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use windtwin_types::JsonPatch;

    struct QueryOnlyStore {
        answer: Option<Vec<Value>>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TwinStore for QueryOnlyStore {
        async fn query(&self, query: &str) -> Result<Vec<Value>> {
            self.queries.lock().push(query.to_owned());
            self.answer.clone().ok_or_else(|| anyhow!("401 Unauthorized"))
        }

        async fn update_twin(&self, _twin_id: &str, _patch: &JsonPatch) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "query-only"
        }
    }

    fn store(answer: Option<Vec<Value>>) -> Arc<QueryOnlyStore> {
        Arc::new(QueryOnlyStore {
            answer,
            queries: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_resolves_first_document() {
        let store = store(Some(vec![
            json!({"$dtId": "WTG003-S", "observes": "WTG003", "deviceId": "WTG003"}),
            json!({"$dtId": "other", "observes": "other"}),
        ]));
        let resolver = TwinIdResolver::new(store.clone());

        let identity = resolver.resolve("WTG003").await.unwrap().unwrap();
        assert_eq!(identity.sensor_twin_id, "WTG003-S");
        assert_eq!(identity.turbine_twin_id, "WTG003");
        assert_eq!(
            store.queries.lock()[0],
            "SELECT * FROM DigitalTwins T WHERE IS_OF_MODEL(T, 'dtmi:adt:chb:Sensor;1') AND T.deviceId = 'WTG003'"
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_not_provisioned() {
        let resolver = TwinIdResolver::new(store(Some(vec![])));
        assert_eq!(resolver.resolve("WTG003").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_observes_is_not_provisioned() {
        let resolver = TwinIdResolver::new(store(Some(vec![json!({"$dtId": "WTG003-S"})])));
        assert_eq!(resolver.resolve("WTG003").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quoted_device_id_never_reaches_store() {
        let store = store(Some(vec![]));
        let resolver = TwinIdResolver::new(store.clone());

        let result = resolver.resolve("WTG' OR '1'='1").await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::UnsafeDeviceId(_)))
        ));
        assert!(store.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let resolver = TwinIdResolver::new(store(None));
        let result = resolver.resolve("WTG003").await;
        assert!(matches!(result, Err(CoreError::TwinStore { .. })));
    }

    #[test]
    fn test_custom_sensor_model() {
        let resolver = TwinIdResolver::with_sensor_model(store(None), "dtmi:test:Sensor;2");
        assert!(
            resolver
                .build_query("D1")
                .unwrap()
                .contains("IS_OF_MODEL(T, 'dtmi:test:Sensor;2')")
        );
    }
}
