// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: starts the simulated shell, brings the Kandy plugin
// up, and funnels alerts, notifications and hook calls to the UI.

use std::sync::{Arc, Mutex};

use kandy_bridge::Alerter;
use kandy_bridge::shell::ShellInvoker;
use kandy_core::BridgeConfig;
use kandy_core::types::{Listener, WidgetKind};
use kandy_widgets::{KandyPlugin, LogLoader, WidgetConfig};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::desktop_shell::DesktopShell;

/// Hooks the demo widgets name in their attributes.
const DEMO_HOOKS: [&str; 3] = ["onLogin", "onLogout", "onChatSent"];

/// Something the UI shows outside the widgets themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Alert(String),
    Notification { listener: Listener, data: Value },
    Hook { name: String, data: Value },
}

/// Alerts become status messages instead of modal dialogs.
struct StatusAlerter(mpsc::UnboundedSender<UiEvent>);

impl Alerter for StatusAlerter {
    fn alert(&self, message: &str) {
        let _ = self.0.send(UiEvent::Alert(message.to_string()));
    }
}

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
#[derive(Clone)]
pub struct AppServices {
    plugin: Arc<KandyPlugin>,
    ui_events: Arc<Mutex<Option<mpsc::UnboundedReceiver<UiEvent>>>>,
}

impl AppServices {
    /// Start the shell and initialize the plugin. Call once at app startup,
    /// inside the tokio runtime.
    pub fn init() -> Self {
        let config = load_config();
        let (invoker, requests) = ShellInvoker::new("Desktop (simulated)");
        tokio::spawn(DesktopShell::default().run(requests));

        let (tx, rx) = mpsc::unbounded_channel();
        let plugin = Arc::new(KandyPlugin::new(
            Arc::new(invoker),
            config,
            Arc::new(StatusAlerter(tx.clone())),
            Arc::new(LogLoader),
        ));

        for listener in Listener::ALL {
            let tx = tx.clone();
            plugin.context().listeners.set(listener, move |data| {
                let _ = tx.send(UiEvent::Notification { listener, data });
            });
        }
        for name in DEMO_HOOKS {
            let tx = tx.clone();
            plugin.context().hooks.register(name, move |data| {
                let _ = tx.send(UiEvent::Hook {
                    name: name.to_string(),
                    data,
                });
            });
        }

        match plugin.initialize(Some(sdk_config()), demo_widgets()) {
            Ok(init) => info!(widgets = ?init.widget_ids, "demo widgets ready"),
            Err(e) => error!(error = %e, "plugin initialization failed"),
        }

        Self {
            plugin,
            ui_events: Arc::new(Mutex::new(Some(rx))),
        }
    }

    pub fn plugin(&self) -> &KandyPlugin {
        &self.plugin
    }

    /// The UI event stream. Only the first caller gets it.
    pub fn take_ui_events(&self) -> Option<mpsc::UnboundedReceiver<UiEvent>> {
        self.ui_events.lock().expect("ui event lock poisoned").take()
    }
}

/// Bridge config from `KANDY_CONFIG` (a JSON file), or the defaults.
fn load_config() -> BridgeConfig {
    let Ok(path) = std::env::var("KANDY_CONFIG") else {
        return BridgeConfig::default();
    };
    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| BridgeConfig::from_json_str(&json).map_err(|e| e.to_string()))
    {
        Ok(config) => {
            info!(%path, "bridge config loaded");
            config
        }
        Err(e) => {
            warn!(%path, error = %e, "bridge config unusable; using defaults");
            BridgeConfig::default()
        }
    }
}

fn sdk_config() -> Value {
    json!({
        "apiKey": std::env::var("KANDY_API_KEY").unwrap_or_else(|_| "demo-key".into()),
        "secretKey": std::env::var("KANDY_SECRET").unwrap_or_else(|_| "demo-secret".into()),
        "downloadMediaPath": "/tmp/kandy",
    })
}

fn demo_widgets() -> Vec<WidgetConfig> {
    vec![
        WidgetConfig::new(WidgetKind::Provisioning).with_attr("country-code", "US"),
        WidgetConfig::new(WidgetKind::Access)
            .with_attr("login-success", "onLogin")
            .with_attr("logout-success", "onLogout"),
        WidgetConfig::new(WidgetKind::Call).with_attr("call-type", "pstn"),
        WidgetConfig::new(WidgetKind::Call),
        WidgetConfig::new(WidgetKind::Sms),
        WidgetConfig::new(WidgetKind::Chat).with_attr("send-success", "onChatSent"),
    ]
}
