// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated native shell for desktop builds.
//
// Drains the `ShellInvoker` request channel, answers one-shot commands with
// plausible results, and pushes the notifications a real SDK would send in
// response (connection changes after login, call state after dialing, an echo
// reply after a chat message).

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use kandy_bridge::shell::{Reply, ShellRequest};
use kandy_bridge::{EventSink, NativeResult};
use kandy_core::types::{CallState, ConnectionState, NotificationChannel};
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ECHO_DELAY: Duration = Duration::from_millis(600);
const PICKED_FILE: &str = "file:///tmp/kandy-demo.txt";

/// What the shell does for one command.
#[derive(Debug)]
pub struct Answer {
    pub result: NativeResult,
    /// Pushed right after the answer.
    pub events: Vec<(NotificationChannel, Value)>,
    /// Pushed after `ECHO_DELAY`.
    pub delayed: Vec<(NotificationChannel, Value)>,
}

impl Answer {
    fn ok(value: Value) -> Self {
        Self {
            result: Ok(value),
            events: Vec::new(),
            delayed: Vec::new(),
        }
    }

    fn err(message: &str) -> Self {
        Self {
            result: Err(json!(message)),
            events: Vec::new(),
            delayed: Vec::new(),
        }
    }

    fn then(mut self, channel: NotificationChannel, action: &str, data: Value) -> Self {
        self.events.push((channel, event(action, data)));
        self
    }

    fn later(mut self, channel: NotificationChannel, action: &str, data: Value) -> Self {
        self.delayed.push((channel, event(action, data)));
        self
    }
}

fn event(action: &str, data: Value) -> Value {
    json!({ "action": action, "data": data })
}

#[derive(Default)]
pub struct DesktopShell {
    channels: HashMap<String, EventSink>,
    user: Option<String>,
}

impl DesktopShell {
    pub async fn run(mut self, mut requests: UnboundedReceiver<ShellRequest>) {
        info!("simulated native shell running");
        while let Some(ShellRequest { request, reply }) = requests.recv().await {
            match reply {
                Reply::Stream(sink) => {
                    debug!(channel = %request.command, "notification channel opened");
                    self.channels.insert(request.command, sink);
                }
                Reply::Once(responder) => {
                    let answer = self.answer(&request.command, &request.args);
                    if responder.send(answer.result).is_err() {
                        debug!(command = %request.command, "caller stopped waiting");
                    }
                    for (channel, event) in answer.events {
                        self.emit(channel, event);
                    }
                    for (channel, event) in answer.delayed {
                        if let Some(sink) = self.channels.get(channel.command_name()).cloned() {
                            tokio::spawn(async move {
                                tokio::time::sleep(ECHO_DELAY).await;
                                let _ = sink.send(event);
                            });
                        }
                    }
                }
            }
        }
        info!("simulated native shell stopped");
    }

    fn emit(&self, channel: NotificationChannel, event: Value) {
        match self.channels.get(channel.command_name()) {
            Some(sink) => {
                if sink.send(event).is_err() {
                    warn!(channel = channel.command_name(), "listener gone");
                }
            }
            None => debug!(channel = channel.command_name(), "channel not registered"),
        }
    }

    /// Decide the answer to `command`.
    pub fn answer(&mut self, command: &str, args: &[Value]) -> Answer {
        let arg = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or_default().to_string();

        match command {
            "configurations" => Answer::ok(json!({ "configured": true })),
            "request" => Answer::ok(json!({ "sent": true, "to": arg(0) })),
            "validate" if arg(1).is_empty() => Answer::err("OTP code is required"),
            "validate" | "deactivate" | "pullEvents" | "markAsReceived" | "sendSMS" => {
                Answer::ok(Value::Null)
            }
            "login" => {
                let user = arg(0);
                if user.is_empty() {
                    return Answer::err("Username is required");
                }
                self.user = Some(user.clone());
                Answer::ok(json!({ "user": user }))
                    .then(NotificationChannel::Connect, "onSocketConnected", Value::Null)
                    .then(
                        NotificationChannel::Connect,
                        "onConnectionStateChanged",
                        json!(ConnectionState::Connected),
                    )
            }
            "logout" => {
                self.user = None;
                Answer::ok(Value::Null).then(
                    NotificationChannel::Connect,
                    "onConnectionStateChanged",
                    json!(ConnectionState::Disconnected),
                )
            }
            "getConnectionState" => Answer::ok(json!(if self.user.is_some() {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            })),
            "getSession" => Answer::ok(json!({ "user": self.user })),
            "createPSTNCall" | "createVoipCall" => {
                let callee = arg(0);
                if callee.is_empty() {
                    return Answer::err("Callee is required");
                }
                Answer::ok(json!({ "callee": callee })).then(
                    NotificationChannel::Call,
                    "onCallStateChanged",
                    json!({ "callee": callee, "state": CallState::Dialing }),
                )
            }
            "sendChat" => {
                let recipient = arg(0);
                let text = arg(1);
                let sent_id = Uuid::new_v4().to_string();
                Answer::ok(json!({ "UUID": sent_id }))
                    .then(NotificationChannel::Chat, "onChatDelivered", json!({ "UUID": sent_id }))
                    .later(
                        NotificationChannel::ChatPlugin,
                        "onChatReceived",
                        json!({
                            "message": {
                                "UUID": Uuid::new_v4().to_string(),
                                "sender": recipient,
                                "message": { "text": format!("echo: {text}") },
                                "timestamp": Utc::now().timestamp_millis(),
                            }
                        }),
                    )
            }
            "pickFile" => Answer::ok(json!(PICKED_FILE)),
            "sendFile" => Answer::ok(json!({ "uri": arg(2) })),
            other => {
                debug!(command = other, "no simulation; answering null");
                Answer::ok(Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kandy_bridge::Services;
    use kandy_bridge::shell::ShellInvoker;
    use std::sync::Arc;

    #[test]
    fn empty_login_is_rejected() {
        let mut shell = DesktopShell::default();
        let answer = shell.answer("login", &[json!(""), json!("pw")]);
        assert_eq!(answer.result, Err(json!("Username is required")));
        assert!(answer.events.is_empty());
    }

    #[test]
    fn login_reports_the_connection() {
        let mut shell = DesktopShell::default();
        let answer = shell.answer("login", &[json!("bob@example.com"), json!("pw")]);
        assert_eq!(answer.result, Ok(json!({"user": "bob@example.com"})));
        assert_eq!(answer.events.len(), 2);
        assert_eq!(answer.events[1].1["data"], json!("CONNECTED"));
        assert_eq!(
            shell.answer("getConnectionState", &[]).result,
            Ok(json!("CONNECTED"))
        );
    }

    #[test]
    fn chat_is_echoed_back_later() {
        let mut shell = DesktopShell::default();
        let answer = shell.answer("sendChat", &[json!("alice@example.com"), json!("hi")]);
        let (channel, echo) = &answer.delayed[0];
        assert_eq!(*channel, NotificationChannel::ChatPlugin);
        assert_eq!(echo["action"], "onChatReceived");
        assert_eq!(echo["data"]["message"]["sender"], "alice@example.com");
        assert_eq!(echo["data"]["message"]["message"]["text"], "echo: hi");
    }

    #[tokio::test]
    async fn services_round_trip_through_the_shell() {
        let (invoker, requests) = ShellInvoker::new("Desktop (simulated)");
        tokio::spawn(DesktopShell::default().run(requests));
        let services = Services::new(Arc::new(invoker), "KandyPlugin");

        assert_eq!(services.chat().pick_file().await.unwrap(), json!(PICKED_FILE));
        let err = services.call().create_pstn_call("").await.unwrap_err();
        assert_eq!(err.payload(), json!("Callee is required"));
    }
}
