// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-memory invoker for tests.
//
// Records every request, answers one-shot commands from a per-command script
// (success with `null` unless told otherwise), and keeps registration sinks so
// a test can push notifications into a channel by name.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::traits::{CommandInvoker, CommandRequest, EventSink, NativeResult, Responder};

#[derive(Default)]
pub struct ScriptedInvoker {
    requests: Mutex<Vec<CommandRequest>>,
    script: Mutex<HashMap<String, NativeResult>>,
    silent: Mutex<Vec<String>>,
    parked: Mutex<Vec<Responder>>,
    sinks: Mutex<HashMap<String, EventSink>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every future `command` with `result`.
    pub fn respond(&self, command: &str, result: NativeResult) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .insert(command.to_string(), result);
    }

    /// Never answer `command`; its responders are parked instead.
    pub fn hold(&self, command: &str) {
        self.silent
            .lock()
            .expect("hold lock poisoned")
            .push(command.to_string());
    }

    /// All requests seen so far, in order (registrations included).
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    /// Requests for one command.
    pub fn requests_for(&self, command: &str) -> Vec<CommandRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.command == command)
            .collect()
    }

    /// Push a raw event into a registered channel. Returns `false` if the
    /// channel was never registered or its receiver is gone.
    pub fn push(&self, channel: &str, event: Value) -> bool {
        let sinks = self.sinks.lock().expect("sinks lock poisoned");
        sinks
            .get(channel)
            .is_some_and(|sink| sink.send(event).is_ok())
    }

    /// Close a registered channel.
    pub fn close(&self, channel: &str) {
        self.sinks.lock().expect("sinks lock poisoned").remove(channel);
    }

    fn record(&self, request: &CommandRequest) {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());
    }
}

impl CommandInvoker for ScriptedInvoker {
    fn platform_name(&self) -> &str {
        "Scripted"
    }

    fn invoke(&self, request: CommandRequest, responder: Responder) {
        self.record(&request);
        let held = self
            .silent
            .lock()
            .expect("hold lock poisoned")
            .contains(&request.command);
        if held {
            self.parked.lock().expect("parked lock poisoned").push(responder);
            return;
        }
        let result = self
            .script
            .lock()
            .expect("script lock poisoned")
            .get(&request.command)
            .cloned()
            .unwrap_or(Ok(Value::Null));
        let _ = responder.send(result);
    }

    fn register(&self, request: CommandRequest, sink: EventSink) {
        self.record(&request);
        self.sinks
            .lock()
            .expect("sinks lock poisoned")
            .insert(request.command, sink);
    }
}
