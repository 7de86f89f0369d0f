// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Channel-backed invoker for hosts that resolve native commands themselves.
//
// The bridge emits a `ShellRequest` per command or registration; the host
// shell (a platform runtime, or a simulator on desktop) drains the receiver,
// performs the work and answers through the completion carried in the request.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::traits::{CommandInvoker, CommandRequest, EventSink, NativeResult, Responder};

/// How the shell should answer a request.
#[derive(Debug)]
pub enum Reply {
    /// One-shot command: answer exactly once.
    Once(Responder),
    /// Notification channel: push events for as long as the channel lives.
    Stream(EventSink),
}

/// A request handed to the host shell.
#[derive(Debug)]
pub struct ShellRequest {
    pub request: CommandRequest,
    pub reply: Reply,
}

impl ShellRequest {
    /// Answer a one-shot request. Returns `false` if this is a stream request
    /// or the caller has stopped waiting.
    pub fn resolve(self, result: NativeResult) -> bool {
        match self.reply {
            Reply::Once(responder) => responder.send(result).is_ok(),
            Reply::Stream(_) => false,
        }
    }
}

/// Invoker that forwards everything to a host shell over an mpsc channel.
pub struct ShellInvoker {
    platform: String,
    requests: mpsc::UnboundedSender<ShellRequest>,
}

impl ShellInvoker {
    /// Create the invoker and the receiver the shell must drain.
    pub fn new(platform: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<ShellRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        let invoker = Self {
            platform: platform.into(),
            requests,
        };
        (invoker, rx)
    }

    fn forward(&self, request: CommandRequest, reply: Reply) {
        debug!(command = %request.command, args = request.args.len(), "forwarding to shell");
        if let Err(mpsc::error::SendError(lost)) = self.requests.send(ShellRequest { request, reply }) {
            // Dropping `lost` drops its completion, which the caller observes
            // as a closed invoker.
            warn!(command = %lost.request.command, "shell has gone away; request dropped");
        }
    }
}

impl CommandInvoker for ShellInvoker {
    fn platform_name(&self) -> &str {
        &self.platform
    }

    fn invoke(&self, request: CommandRequest, responder: Responder) {
        self.forward(request, Reply::Once(responder));
    }

    fn register(&self, request: CommandRequest, sink: EventSink) {
        self.forward(request, Reply::Stream(sink));
    }
}
