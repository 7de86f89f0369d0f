// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub invoker for desktop/CI builds where the native SDK is unavailable.
//
// Every command fails with the `PlatformUnavailable` message and every
// notification registration is closed immediately.

use kandy_core::KandyError;
use serde_json::Value;

use crate::traits::{CommandInvoker, CommandRequest, EventSink, Responder};

/// No-op invoker returned when no native SDK is linked.
pub struct StubInvoker;

impl CommandInvoker for StubInvoker {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn invoke(&self, request: CommandRequest, responder: Responder) {
        tracing::warn!(command = %request.command, "native command called on stub invoker");
        let payload = Value::String(KandyError::PlatformUnavailable.to_string());
        // A dropped receiver means the caller stopped waiting; nothing to report.
        let _ = responder.send(Err(payload));
    }

    fn register(&self, request: CommandRequest, sink: EventSink) {
        tracing::warn!(channel = %request.command, "notification channel opened on stub invoker");
        drop(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, oneshot};

    #[tokio::test]
    async fn commands_fail_as_unavailable() {
        let (tx, rx) = oneshot::channel();
        StubInvoker.invoke(CommandRequest::new("KandyPlugin", "login", vec![]), tx);
        let answer = rx.await.unwrap();
        assert_eq!(
            answer,
            Err(Value::String("feature not available on this platform".into()))
        );
    }

    #[tokio::test]
    async fn registrations_close_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        StubInvoker.register(
            CommandRequest::new("KandyPlugin", "callServiceNotificationCallback", vec![]),
            tx,
        );
        assert!(rx.recv().await.is_none());
    }
}
