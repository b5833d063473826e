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

use thiserror::Error;
use windtwin_types::ValidationError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("twin store '{store}' failed: {source}")]
    TwinStore {
        store: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("forecast source '{source_name}' failed: {source}")]
    Forecast {
        source_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("forecast is empty")]
    EmptyForecast,

    #[error("event channel closed")]
    ChannelClosed,
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
