// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Kandy: native bridge.
//!
//! Everything above this crate talks to the native SDK through one
//! [`traits::CommandInvoker`]: the service facade marshals positional
//! arguments under fixed command names, and the notification dispatcher keeps
//! one standing registration per channel and routes each inbound event to the
//! listener slot it names.

pub mod dispatcher;
pub mod listeners;
pub mod services;
pub mod shell;
pub mod stub;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dispatcher::NotificationDispatcher;
pub use listeners::{Alerter, BridgeContext, Handler, HookRegistry, ListenerRegistry, LogAlerter};
pub use services::{Pending, Services};
pub use traits::{CommandInvoker, CommandRequest, EventSink, NativeResult, Responder};

/// Invoker used when the host supplies none: the stub on desktop/CI builds.
pub fn default_invoker() -> std::sync::Arc<dyn CommandInvoker> {
    std::sync::Arc::new(stub::StubInvoker)
}
