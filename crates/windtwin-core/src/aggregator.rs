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
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};
use windtwin_types::{ErrorKind, ErrorWindow, PowerDifference};

/// Default number of history entries kept per entity
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// What a single reading did to the aggregate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOutcome {
    /// A new error window was opened for the entity
    Opened,
    /// The entity was already in an open window
    AlreadyOpen,
    /// The entity's open window was closed
    Closed,
    /// Nothing to close
    Clear,
    /// Reading is older than the last one seen for the entity and was dropped
    Stale,
}

/// Per-entity view returned by [`ErrorAggregator::entity_snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub entity_id: String,
    pub is_power_error: bool,
    pub simulate_error: bool,
    /// Newest first
    pub history: Vec<PowerDifference>,
}

#[derive(Debug, Default)]
struct EntityState {
    /// Newest first
    history: VecDeque<PowerDifference>,
    last_timestamp: Option<DateTime<Utc>>,
    is_power_error: bool,
    simulate_error: bool,
}

#[derive(Debug, Default)]
struct AggregatorState {
    /// Display order: open windows first, newest first
    windows: Vec<ErrorWindow>,
    entities: HashMap<String, EntityState>,
}

/// Process-wide list of error windows plus per-entity discrepancy history.
///
/// Cheap to share behind an `Arc`; every operation takes the internal lock once
/// and performs no I/O while holding it.
#[derive(Debug)]
pub struct ErrorAggregator {
    state: Mutex<AggregatorState>,
    history_limit: usize,
}

impl Default for ErrorAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl ErrorAggregator {
    pub fn new(history_limit: usize) -> Self {
        Self {
            state: Mutex::new(AggregatorState::default()),
            history_limit: history_limit.max(1),
        }
    }

    /// Fold one discrepancy result into the aggregate.
    ///
    /// The entity and the event timestamp are taken from `difference`.
    pub fn record_reading(&self, kind: ErrorKind, mut difference: PowerDifference) -> AggregateOutcome {
        let timestamp = difference.timestamp;
        let entity_id = difference.entity_id.clone();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let entity = state.entities.entry(entity_id.clone()).or_default();

        if let Some(last) = entity.last_timestamp.filter(|last| timestamp < *last) {
            warn!(
                "Dropping stale reading for {}: {} is older than {}",
                entity_id, timestamp, last
            );
            return AggregateOutcome::Stale;
        }
        let timestamp_changed = entity.last_timestamp != Some(timestamp);
        entity.last_timestamp = Some(timestamp);

        if difference.discrepancy.is_error || entity.simulate_error {
            if entity.simulate_error {
                difference.power_observed = 0.0;
            }
            if entity.history.is_empty() || timestamp_changed {
                entity.history.push_front(difference);
                while entity.history.len() > self.history_limit {
                    entity.history.pop_back();
                }
            }
            entity.is_power_error = true;

            let already_open = state
                .windows
                .iter()
                .any(|w| w.is_current && w.matches(&entity_id, kind));
            if already_open {
                debug!("{} still in {} window", entity_id, kind);
                return AggregateOutcome::AlreadyOpen;
            }

            info!("🚨 {} opened for {} at {}", kind, entity_id, timestamp);
            state
                .windows
                .insert(0, ErrorWindow::open(entity_id, kind, timestamp));
            return AggregateOutcome::Opened;
        }

        entity.is_power_error = false;
        if close_window(&mut state.windows, &entity_id, kind, timestamp) {
            info!("✅ {} closed for {} at {}", kind, entity_id, timestamp);
            AggregateOutcome::Closed
        } else {
            AggregateOutcome::Clear
        }
    }

    /// Open windows in display order
    pub fn current_errors(&self) -> Vec<ErrorWindow> {
        self.state
            .lock()
            .windows
            .iter()
            .filter(|w| w.is_current)
            .cloned()
            .collect()
    }

    /// Every window, open ones first
    pub fn error_list(&self) -> Vec<ErrorWindow> {
        self.state.lock().windows.clone()
    }

    /// Discrepancy history for one entity, newest first
    pub fn history_for(&self, entity_id: &str) -> Vec<PowerDifference> {
        self.state
            .lock()
            .entities
            .get(entity_id)
            .map(|e| e.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_power_error(&self, entity_id: &str) -> bool {
        self.state
            .lock()
            .entities
            .get(entity_id)
            .is_some_and(|e| e.is_power_error)
    }

    /// Force every following reading of `entity_id` into the error branch,
    /// recording observed power as 0
    pub fn set_error_simulation(&self, entity_id: &str, enabled: bool) {
        info!(
            "Error simulation for {} {}",
            entity_id,
            if enabled { "enabled" } else { "disabled" }
        );
        self.state
            .lock()
            .entities
            .entry(entity_id.to_owned())
            .or_default()
            .simulate_error = enabled;
    }

    pub fn is_simulating(&self, entity_id: &str) -> bool {
        self.state
            .lock()
            .entities
            .get(entity_id)
            .is_some_and(|e| e.simulate_error)
    }

    /// Everything known about one entity, `None` if it was never seen
    pub fn entity_snapshot(&self, entity_id: &str) -> Option<EntitySnapshot> {
        let state = self.state.lock();
        state.entities.get(entity_id).map(|e| EntitySnapshot {
            entity_id: entity_id.to_owned(),
            is_power_error: e.is_power_error,
            simulate_error: e.simulate_error,
            history: e.history.iter().cloned().collect(),
        })
    }
}

/// Close the entity's open window and move it in front of the first closed
/// window that follows it, or to the end when there is none.
///
/// Only the first entry for the entity is considered; returns false when it is
/// missing, already closed or of another kind.
fn close_window(
    windows: &mut Vec<ErrorWindow>,
    entity_id: &str,
    kind: ErrorKind,
    stop: DateTime<Utc>,
) -> bool {
    let Some(index) = windows.iter().position(|w| w.entity_id == entity_id) else {
        return false;
    };
    if !windows[index].is_current || windows[index].error_type != kind {
        return false;
    }

    windows[index].close(stop);
    let first_closed = windows
        .iter()
        .skip(index + 1)
        .position(|w| !w.is_current)
        .map(|offset| index + 1 + offset);

    let window = windows.remove(index);
    match first_closed {
        Some(target) => windows.insert(target - 1, window),
        None => windows.push(window),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use windtwin_types::Discrepancy;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 29, 11, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn reading(entity: &str, is_error: bool, minute: i64) -> PowerDifference {
        PowerDifference {
            entity_id: entity.to_owned(),
            discrepancy: Discrepancy {
                percentage_pm_diff: if is_error { 133.33 } else { 2.0 },
                percentage_dm_diff: 2.02,
                is_error,
            },
            power_observed: 500.0,
            power_pm: if is_error { 100.0 } else { 490.0 },
            power_dm: 490.0,
            timestamp: at(minute),
        }
    }

    fn entities(windows: &[ErrorWindow]) -> Vec<(&str, bool)> {
        windows
            .iter()
            .map(|w| (w.entity_id.as_str(), w.is_current))
            .collect()
    }

    #[test]
    fn test_error_opens_single_window() {
        let aggregator = ErrorAggregator::default();

        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 0)),
            AggregateOutcome::Opened
        );
        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 1)),
            AggregateOutcome::AlreadyOpen
        );

        assert_eq!(aggregator.current_errors().len(), 1);
        assert!(aggregator.is_power_error("WTG003"));
        assert_eq!(aggregator.history_for("WTG003").len(), 2);
    }

    #[test]
    fn test_alternating_events_never_open_two_windows() {
        let aggregator = ErrorAggregator::default();

        for minute in 0..20 {
            let is_error = minute % 3 != 2;
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", is_error, minute));

            let open = aggregator
                .error_list()
                .iter()
                .filter(|w| w.is_current && w.matches("WTG003", ErrorKind::PowerAlert))
                .count();
            assert!(open <= 1, "minute {minute}: {open} open windows");
        }
    }

    #[test]
    fn test_close_sets_stop_timestamp() {
        let aggregator = ErrorAggregator::default();
        aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 0));

        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", false, 5)),
            AggregateOutcome::Closed
        );
        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", false, 6)),
            AggregateOutcome::Clear
        );

        let list = aggregator.error_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].timestamp_stop, Some(at(5)));
        assert!(!aggregator.is_power_error("WTG003"));
        assert!(aggregator.current_errors().is_empty());
    }

    #[test]
    fn test_closing_preserves_order_of_closed_windows() {
        let aggregator = ErrorAggregator::default();

        // Three closed windows: C, B, A (newest first)
        for (i, entity) in ["A", "B", "C"].iter().enumerate() {
            let minute = i as i64 * 10;
            aggregator.record_reading(ErrorKind::PowerAlert, reading(entity, true, minute));
            aggregator.record_reading(ErrorKind::PowerAlert, reading(entity, false, minute + 1));
        }
        aggregator.record_reading(ErrorKind::PowerAlert, reading("D", true, 40));
        assert_eq!(
            entities(&aggregator.error_list()),
            vec![("D", true), ("C", false), ("B", false), ("A", false)]
        );

        aggregator.record_reading(ErrorKind::PowerAlert, reading("D", false, 41));

        assert_eq!(
            entities(&aggregator.error_list()),
            vec![("D", false), ("C", false), ("B", false), ("A", false)]
        );
    }

    #[test]
    fn test_closed_window_moves_behind_open_ones() {
        let aggregator = ErrorAggregator::default();

        aggregator.record_reading(ErrorKind::PowerAlert, reading("A", true, 0));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("A", false, 1));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("B", true, 2));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("C", true, 3));
        assert_eq!(
            entities(&aggregator.error_list()),
            vec![("C", true), ("B", true), ("A", false)]
        );

        aggregator.record_reading(ErrorKind::PowerAlert, reading("C", false, 4));

        assert_eq!(
            entities(&aggregator.error_list()),
            vec![("B", true), ("C", false), ("A", false)]
        );
    }

    #[test]
    fn test_last_window_without_closed_successor_stays_put() {
        let aggregator = ErrorAggregator::default();
        aggregator.record_reading(ErrorKind::PowerAlert, reading("A", true, 0));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("B", true, 1));

        aggregator.record_reading(ErrorKind::PowerAlert, reading("A", false, 2));

        assert_eq!(
            entities(&aggregator.error_list()),
            vec![("B", true), ("A", false)]
        );
    }

    #[test]
    fn test_history_skips_repeated_timestamp() {
        let aggregator = ErrorAggregator::default();
        aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 0));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 0));
        aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 1));

        let history = aggregator.history_for("WTG003");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, at(1));
    }

    #[test]
    fn test_stale_reading_is_dropped() {
        let aggregator = ErrorAggregator::default();
        aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, 5));

        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", false, 4)),
            AggregateOutcome::Stale
        );
        assert_eq!(aggregator.current_errors().len(), 1);

        // Other entities keep their own clock
        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG004", true, 1)),
            AggregateOutcome::Opened
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let aggregator = ErrorAggregator::new(3);
        for minute in 0..10 {
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", true, minute));
        }

        let history = aggregator.history_for("WTG003");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].timestamp, at(9));
        assert_eq!(history[2].timestamp, at(7));
    }

    #[test]
    fn test_error_simulation_forces_error() {
        let aggregator = ErrorAggregator::default();
        aggregator.set_error_simulation("WTG003", true);

        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", false, 0)),
            AggregateOutcome::Opened
        );
        assert_eq!(aggregator.history_for("WTG003")[0].power_observed, 0.0);

        aggregator.set_error_simulation("WTG003", false);
        assert_eq!(
            aggregator.record_reading(ErrorKind::PowerAlert, reading("WTG003", false, 1)),
            AggregateOutcome::Closed
        );

        let snapshot = aggregator.entity_snapshot("WTG003").unwrap();
        assert!(!snapshot.simulate_error);
        assert!(!snapshot.is_power_error);
        assert!(aggregator.entity_snapshot("WTG999").is_none());
    }
}
