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

use crate::client::ServiceClient;
use crate::errors::{AdapterError, AdapterResult};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info};
use windtwin_core::TwinStore;
use windtwin_types::JsonPatch;

pub const DEFAULT_API_VERSION: &str = "2020-10-31";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(default)]
    continuation_token: Option<String>,
}

/// Digital-twin graph REST client authenticated with a static bearer token
#[derive(Clone)]
pub struct DigitalTwinsClient {
    base_url: String,
    token: String,
    api_version: String,
    client: ServiceClient,
}

impl std::fmt::Debug for DigitalTwinsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalTwinsClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl DigitalTwinsClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> AdapterResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(AdapterError::ConfigError(
                "digital twins token is empty".to_owned(),
            ));
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            api_version: DEFAULT_API_VERSION.to_owned(),
            client: ServiceClient::new("TWINS", Duration::from_secs(10))?,
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.client = self.client.with_retry_config(max_retries, retry_delay);
        self
    }

    /// Run a twin query, following continuation tokens until exhausted
    pub async fn query_twins(&self, query: &str) -> AdapterResult<Vec<Value>> {
        let url = format!("{}/query?api-version={}", self.base_url, self.api_version);
        debug!("🔍 [TWINS QUERY] {}", query);

        let mut documents = Vec::new();
        let mut body = json!({ "query": query });
        loop {
            let response = self
                .client
                .send(|| async {
                    self.client
                        .http()
                        .post(&url)
                        .bearer_auth(&self.token)
                        .json(&body)
                        .send()
                        .await
                })
                .await?;
            let page: QueryPage = self.client.check_status(response).await?.json().await?;
            documents.extend(page.value);

            match page.continuation_token {
                Some(token) if !token.is_empty() => {
                    debug!("   continuing query ({} documents so far)", documents.len());
                    body = json!({ "continuationToken": token });
                }
                _ => break,
            }
        }

        debug!("✅ [TWINS RESULT] {} documents", documents.len());
        Ok(documents)
    }

    /// Apply a JSON-Patch document to one twin
    pub async fn patch_twin(&self, twin_id: &str, patch: &JsonPatch) -> AdapterResult<()> {
        let url = format!(
            "{}/digitaltwins/{}?api-version={}",
            self.base_url,
            urlencoding::encode(twin_id),
            self.api_version
        );
        let body = serde_json::to_vec(patch)?;
        debug!("📝 [TWINS PATCH] {} ({} ops)", twin_id, patch.len());

        let response = self
            .client
            .send(|| async {
                self.client
                    .http()
                    .patch(&url)
                    .bearer_auth(&self.token)
                    .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
                    .body(body.clone())
                    .send()
                    .await
            })
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            error!("❌ [TWINS ERROR] Twin not found: {}", twin_id);
            return Err(AdapterError::TwinNotFound(twin_id.to_owned()));
        }
        self.client.check_status(response).await?;
        info!("✅ [TWINS PATCH] {} updated", twin_id);
        Ok(())
    }
}

#[async_trait]
impl TwinStore for DigitalTwinsClient {
    async fn query(&self, query: &str) -> Result<Vec<Value>> {
        Ok(self.query_twins(query).await?)
    }

    async fn update_twin(&self, twin_id: &str, patch: &JsonPatch) -> Result<()> {
        Ok(self.patch_twin(twin_id, patch).await?)
    }

    fn name(&self) -> &str {
        "DigitalTwins"
    }
}
