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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of alert an entity can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ErrorKind {
    #[default]
    #[serde(rename = "Power Alert")]
    PowerAlert,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerAlert => write!(f, "Power Alert"),
        }
    }
}

/// A time interval during which one entity was continuously flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorWindow {
    pub entity_id: String,
    pub error_type: ErrorKind,
    pub timestamp_start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_stop: Option<DateTime<Utc>>,
    pub is_current: bool,
}

impl ErrorWindow {
    /// A freshly opened window
    pub fn open(entity_id: impl Into<String>, error_type: ErrorKind, start: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            error_type,
            timestamp_start: start,
            timestamp_stop: None,
            is_current: true,
        }
    }

    pub fn close(&mut self, stop: DateTime<Utc>) {
        self.is_current = false;
        self.timestamp_stop = Some(stop);
    }

    pub fn matches(&self, entity_id: &str, error_type: ErrorKind) -> bool {
        self.entity_id == entity_id && self.error_type == error_type
    }
}
