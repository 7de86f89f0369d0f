// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin entry point: wires services, dispatcher and widget host around one
// invoker and runs the initialization sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kandy_bridge::{
    Alerter, BridgeContext, CommandInvoker, LogAlerter, NotificationDispatcher, Services,
};
use kandy_core::BridgeConfig;
use kandy_core::error::{KandyError, Result};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::descriptor::WidgetConfig;
use crate::host::{Continuation, WidgetHost};
use crate::resources::{LogLoader, ResourceLoader, load_plugin_resources};

/// What `initialize` set up.
#[derive(Debug)]
pub struct Initialized {
    /// Ids of the materialized widgets, in config order.
    pub widget_ids: Vec<String>,
    /// One pump per notification channel.
    pub pumps: Vec<JoinHandle<()>>,
}

pub struct KandyPlugin {
    config: BridgeConfig,
    services: Services,
    dispatcher: NotificationDispatcher,
    host: WidgetHost,
    loader: Arc<dyn ResourceLoader>,
    initialized: AtomicBool,
}

impl KandyPlugin {
    pub fn new(
        invoker: Arc<dyn CommandInvoker>,
        config: BridgeConfig,
        alerter: Arc<dyn Alerter>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Self {
        let services = Services::new(invoker, &config.plugin_id);
        let context = Arc::new(BridgeContext::new(alerter));
        let dispatcher = NotificationDispatcher::new(context.clone());
        let host = WidgetHost::new(services.clone(), context, config.id_prefix.clone());
        Self {
            config,
            services,
            dispatcher,
            host,
            loader,
            initialized: AtomicBool::new(false),
        }
    }

    /// Default config, alerts to the log, resources to the log.
    pub fn with_defaults(invoker: Arc<dyn CommandInvoker>) -> Self {
        Self::new(
            invoker,
            BridgeConfig::default(),
            Arc::new(LogAlerter),
            Arc::new(LogLoader),
        )
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Listener slots, hooks and alerts shared by everything in the plugin.
    pub fn context(&self) -> &Arc<BridgeContext> {
        self.dispatcher.context()
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn host(&self) -> &WidgetHost {
        &self.host
    }

    /// Bring the plugin up. Runs once; must be called inside a tokio runtime.
    ///
    /// 1. Push `sdk_config` (if any) under the configuration command. The
    ///    answer is only logged and nothing waits for it.
    /// 2. Register every notification channel.
    /// 3. Load plugin resources, then materialize `widgets`.
    #[instrument(skip_all, fields(platform = %self.services.platform_name(), widgets = widgets.len()))]
    pub fn initialize(&self, sdk_config: Option<Value>, widgets: Vec<WidgetConfig>) -> Result<Initialized> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(KandyError::AlreadyInitialized);
        }

        if let Some(sdk_config) = sdk_config {
            let pending = self
                .services
                .execute(&self.config.configuration_command, vec![sdk_config]);
            tokio::spawn(async move {
                match pending.await {
                    Ok(answer) => info!(%answer, "SDK configuration applied"),
                    Err(e) => warn!(error = %e, "SDK configuration failed; continuing"),
                }
            });
        }

        let pumps = self.dispatcher.register(&self.services);

        load_plugin_resources(&self.config, self.loader.as_ref());
        let widget_ids = self.host.materialize(widgets);

        info!(widgets = widget_ids.len(), channels = pumps.len(), "Kandy plugin initialized");
        Ok(Initialized { widget_ids, pumps })
    }

    /// Tell the SDK a message was seen and clear its unread mark.
    pub fn mark_message_as_received(&self, uuid: &str) -> Continuation {
        self.host.mark_message_as_received(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Control;
    use kandy_bridge::testing::ScriptedInvoker;
    use kandy_core::types::{Listener, WidgetKind};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Loaded(Mutex<Vec<String>>);

    impl ResourceLoader for Loaded {
        fn load_stylesheet(&self, href: &str) {
            self.0.lock().unwrap().push(href.to_string());
        }
        fn load_script(&self, src: &str) {
            self.0.lock().unwrap().push(src.to_string());
        }
    }

    fn plugin() -> (Arc<ScriptedInvoker>, Arc<Loaded>, KandyPlugin) {
        let invoker = Arc::new(ScriptedInvoker::new());
        let loaded = Arc::new(Loaded::default());
        let plugin = KandyPlugin::new(
            invoker.clone(),
            BridgeConfig::default(),
            Arc::new(LogAlerter),
            loaded.clone(),
        );
        (invoker, loaded, plugin)
    }

    #[tokio::test]
    async fn initialize_configures_registers_then_materializes() {
        let (invoker, loaded, plugin) = plugin();
        let sdk = json!({"apiKey": "key", "secret": "s"});

        let init = plugin
            .initialize(Some(sdk.clone()), vec![WidgetConfig::new(WidgetKind::Access)])
            .unwrap();

        let commands: Vec<_> = invoker.requests().into_iter().map(|r| r.command).collect();
        assert_eq!(commands[0], "configurations");
        assert_eq!(commands[1..].len(), 6);
        assert_eq!(invoker.requests()[0].args, vec![sdk]);
        assert_eq!(init.widget_ids, ["kandy-access-0"]);
        assert_eq!(init.pumps.len(), 6);
        assert_eq!(
            *loaded.0.lock().unwrap(),
            vec!["plugins/com.kandy.phonegap/www/css/kandy.css".to_string()]
        );
    }

    #[tokio::test]
    async fn configuration_failure_does_not_block_the_rest() {
        let (invoker, _, plugin) = plugin();
        invoker.respond("configurations", Err(json!("bad key")));

        let init = plugin
            .initialize(Some(json!({})), vec![WidgetConfig::new(WidgetKind::Sms)])
            .unwrap();

        assert_eq!(init.widget_ids, ["kandy-sms-0"]);
        assert_eq!(invoker.requests_for("chatServiceNotificationPluginCallback").len(), 1);
    }

    #[tokio::test]
    async fn missing_sdk_config_skips_the_configuration_push() {
        let (invoker, _, plugin) = plugin();
        plugin.initialize(None, vec![]).unwrap();
        assert!(invoker.requests_for("configurations").is_empty());
        assert_eq!(invoker.requests().len(), 6);
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let (invoker, _, plugin) = plugin();
        plugin
            .initialize(None, vec![WidgetConfig::new(WidgetKind::Chat)])
            .unwrap();
        let before = invoker.requests().len();

        let again = plugin.initialize(None, vec![WidgetConfig::new(WidgetKind::Chat)]);

        assert!(matches!(again, Err(KandyError::AlreadyInitialized)));
        assert_eq!(invoker.requests().len(), before);
        assert_eq!(plugin.host().document().widgets().len(), 1);
    }

    #[tokio::test]
    async fn generic_notifications_reach_the_bound_listener() {
        let (invoker, _, plugin) = plugin();
        let (tx, mut rx) = mpsc::unbounded_channel();
        plugin.context().listeners.set(Listener::IncomingCall, move |data| {
            let _ = tx.send(data);
        });
        plugin.initialize(None, vec![]).unwrap();

        invoker.push(
            "callServiceNotificationCallback",
            json!({"action": "onIncomingCall", "data": {"caller": "alice"}}),
        );

        assert_eq!(rx.recv().await, Some(json!({"caller": "alice"})));
    }

    #[tokio::test]
    async fn chat_media_channel_feeds_the_chat_widget() {
        let (invoker, _, plugin) = plugin();
        plugin
            .initialize(None, vec![WidgetConfig::new(WidgetKind::Chat)])
            .unwrap();
        let mut revisions = plugin.host().subscribe();

        invoker.push(
            "chatServiceNotificationPluginCallback",
            json!({
                "action": "onChatReceived",
                "data": {"message": {
                    "UUID": "m-7",
                    "sender": "alice@example.com",
                    "message": {"text": "ping"},
                    "timestamp": "yesterday"
                }}
            }),
        );
        revisions.changed().await.unwrap();

        let doc = plugin.host().document();
        let Some(Control::MessageList { entries }) =
            doc.element("kandy-chat-0-messages").map(|e| &e.control)
        else {
            panic!("chat list missing");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "ping");
        assert_eq!(entries[0].timestamp, "yesterday");

        plugin.mark_message_as_received("m-7").await;
        assert_eq!(invoker.requests_for("markAsReceived").len(), 1);
    }
}
