// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notification dispatch.
//
// `register` opens one standing registration per channel and spawns a pump
// per channel that feeds each inbound payload through `route`. Generic
// channels resolve the event's action against the listener registry; the chat
// media channel uses a fixed match over its own action set. Anything that does
// not resolve is dropped, never raised.

use std::sync::Arc;

use kandy_core::types::{ChatPluginAction, Listener, NotificationChannel, NotificationEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::listeners::BridgeContext;
use crate::services::Services;

/// Routes native notifications into the bridge context.
#[derive(Clone)]
pub struct NotificationDispatcher {
    context: Arc<BridgeContext>,
}

impl NotificationDispatcher {
    pub fn new(context: Arc<BridgeContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.context
    }

    /// Open every notification channel and start pumping its events.
    ///
    /// Must be called inside a tokio runtime. Pumps end when the native side
    /// closes a channel; the bridge itself never unsubscribes.
    pub fn register(&self, services: &Services) -> Vec<JoinHandle<()>> {
        let mut pumps = Vec::with_capacity(NotificationChannel::GENERIC.len() + 1);
        for channel in NotificationChannel::GENERIC
            .into_iter()
            .chain([NotificationChannel::ChatPlugin])
        {
            let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
            services.register(channel.command_name(), tx);

            let dispatcher = self.clone();
            pumps.push(tokio::spawn(async move {
                while let Some(payload) = rx.recv().await {
                    dispatcher.route(channel, payload);
                }
                debug!(channel = channel.command_name(), "notification channel closed");
            }));
        }
        info!(channels = pumps.len(), "notification listeners registered");
        pumps
    }

    /// Route one raw payload from `channel`. Returns whether a handler ran.
    pub fn route(&self, channel: NotificationChannel, payload: Value) -> bool {
        let event: NotificationEvent = match serde_json::from_value(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(channel = channel.command_name(), error = %e, "malformed notification dropped");
                return false;
            }
        };
        match channel {
            NotificationChannel::ChatPlugin => self.dispatch_chat_plugin(event),
            _ => self.dispatch(event),
        }
    }

    /// Resolve `event.action` to a listener and run it with `event.data`.
    pub fn dispatch(&self, event: NotificationEvent) -> bool {
        let Some(listener) = Listener::from_action(&event.action) else {
            debug!(action = %event.action, "no listener for action; dropped");
            return false;
        };
        let handled = self.context.listeners.notify(listener, event.data);
        if !handled {
            debug!(%listener, "listener unbound; dropped");
        }
        handled
    }

    /// Chat media channel.
    ///
    /// `onChatReceived` goes to the receiver a chat widget installed (the
    /// generic chat channel already reaches the application listener).
    /// Delivery and media auto-download events go to the matching application
    /// listener. Other actions are ignored.
    pub fn dispatch_chat_plugin(&self, event: NotificationEvent) -> bool {
        let Some(action) = ChatPluginAction::from_action(&event.action) else {
            debug!(action = %event.action, "unknown chat media action ignored");
            return false;
        };
        match action {
            ChatPluginAction::Received => match self.context.receiver(action) {
                Some(receiver) => {
                    receiver(event.data);
                    true
                }
                None => false,
            },
            other => self.context.listeners.notify(other.listener(), event.data),
        }
    }
}
