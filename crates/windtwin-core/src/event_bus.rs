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
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use windtwin_types::TwinEvent;

/// Receiving end of the twin event bus
pub struct TwinEventChannel {
    pub receiver: mpsc::UnboundedReceiver<TwinEvent>,
}

/// Clonable sender for twin events
#[derive(Clone)]
pub struct TwinEventSender {
    sender: mpsc::UnboundedSender<TwinEvent>,
}

impl std::fmt::Debug for TwinEventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwinEventChannel").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TwinEventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwinEventSender")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl TwinEventSender {
    /// Create a new sender/channel pair
    pub fn new() -> (Self, TwinEventChannel) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, TwinEventChannel { receiver })
    }

    pub fn publish(&self, event: TwinEvent) -> CoreResult<()> {
        trace!("Publishing twin event for {}", event.entity_id());
        self.sender
            .send(event)
            .map_err(|_| CoreError::ChannelClosed)
    }
}

/// Subscriber to twin change events.
///
/// Handlers run on the dispatcher task and must not block.
pub trait TwinEventHandler: Send + Sync {
    fn handle(&self, event: &TwinEvent);

    /// Get handler name (for logging)
    fn name(&self) -> &str;
}

/// Fans twin events out to every registered handler
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn TwinEventHandler>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &names)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn TwinEventHandler>) -> &mut Self {
        debug!("Registered twin event handler '{}'", handler.name());
        self.handlers.push(handler);
        self
    }

    /// Deliver one event to every handler, in registration order
    pub fn dispatch(&self, event: &TwinEvent) {
        for handler in &self.handlers {
            trace!("{} <- event for {}", handler.name(), event.entity_id());
            handler.handle(event);
        }
    }

    /// Drain the channel until every sender is dropped
    pub async fn run(self, mut channel: TwinEventChannel) {
        info!(
            "📡 Twin event dispatcher started with {} handlers",
            self.handlers.len()
        );
        while let Some(event) = channel.receiver.recv().await {
            self.dispatch(&event);
        }
        info!("📡 Twin event channel closed, dispatcher stopped");
    }
}
