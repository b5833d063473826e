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

use crate::errors::{AdapterError, AdapterResult};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{error, warn};

/// reqwest client bound to one upstream service, with a request timeout and
/// optional retry on transport errors
#[derive(Clone)]
pub struct ServiceClient {
    service: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.service)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    pub fn new(service: impl Into<String>, timeout: Duration) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            service: service.into(),
            client,
            max_retries: 1,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Set custom retry configuration; `max_retries` counts the first attempt
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Send a request, retrying transport failures with exponential backoff
    pub async fn send<F, Fut>(&self, mut request_fn: F) -> AdapterResult<Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!(
                        "{} request failed after {} attempts: {}",
                        self.service, attempts, e
                    );
                    return Err(AdapterError::HttpError(e));
                }
                Err(e) => {
                    warn!(
                        "{} request failed (attempt {}/{}): {}. Retrying in {:?}",
                        self.service, attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    /// Pass 2xx responses through, map everything else to an error
    pub async fn check_status(&self, response: Response) -> AdapterResult<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [{}] Authentication failed", self.service);
                Err(AdapterError::AuthenticationFailed(self.service.clone()))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                error!("❌ [{}] Status {}: {}", self.service, status, message);
                Err(AdapterError::ApiError {
                    service: self.service.clone(),
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
