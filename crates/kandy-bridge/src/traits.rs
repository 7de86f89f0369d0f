// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic boundary to the native communications SDK.
//
// The native side is an opaque command executor: it receives a plugin id, a
// command name and positional JSON arguments, and answers through the
// completion handed to it. One-shot commands answer exactly once; standing
// notification registrations push any number of events.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Outcome of a native command: the success payload or the error payload,
/// both passed through untouched.
pub type NativeResult = Result<Value, Value>;

/// Completion for a one-shot command. Sending consumes it, so a command can
/// only ever resolve once.
pub type Responder = oneshot::Sender<NativeResult>;

/// Completion for a standing registration, fed once per native event.
pub type EventSink = mpsc::UnboundedSender<Value>;

/// A single call across the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// Plugin identifier, constant for the lifetime of the bridge.
    pub plugin: String,
    /// Native command or notification channel name.
    pub command: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl CommandRequest {
    pub fn new(plugin: impl Into<String>, command: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            plugin: plugin.into(),
            command: command.into(),
            args,
        }
    }
}

/// The native command executor.
///
/// Implementations must not block: both methods hand the work off and return
/// immediately, resolving the completion later.
pub trait CommandInvoker: Send + Sync {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;

    /// Run a one-shot command and answer through `responder`.
    ///
    /// Dropping the responder without sending is reported to the caller as
    /// `KandyError::InvokerClosed`.
    fn invoke(&self, request: CommandRequest, responder: Responder);

    /// Open a standing notification registration. Events are pushed into
    /// `sink` until the native side drops it.
    fn register(&self, request: CommandRequest, sink: EventSink);
}
