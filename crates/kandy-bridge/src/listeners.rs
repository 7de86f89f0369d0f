// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Listener bindings shared by the dispatcher and the widget host.
//
// `BridgeContext` replaces a global handler namespace: it is built once,
// passed to whoever needs it, and holds
//   - one slot per known listener (`Listener`), overridable at any time,
//   - the chat media receivers installed by widgets,
//   - named hooks referenced from widget attributes,
//   - the alert channel used by the default error action.
// Every map is last-write-wins. Handlers are cloned out of the lock before
// they run, so a handler may rebind listeners without deadlocking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kandy_core::types::{ChatPluginAction, Listener};
use serde_json::Value;
use tracing::{debug, error};

/// A callable bound to a listener, receiver, or hook name.
pub type Handler = Arc<dyn Fn(Value) + Send + Sync>;

/// Where the default error action sends its user-facing message.
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alerter for hosts without a UI: the message only goes to the log.
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, message: &str) {
        tracing::debug!(%message, "alert");
    }
}

/// Listener slots keyed by the closed `Listener` set.
#[derive(Default)]
pub struct ListenerRegistry {
    slots: RwLock<HashMap<Listener, Handler>>,
}

impl ListenerRegistry {
    /// Bind `listener`, replacing whatever was there.
    pub fn set(&self, listener: Listener, handler: impl Fn(Value) + Send + Sync + 'static) {
        self.slots
            .write()
            .expect("listener lock poisoned")
            .insert(listener, Arc::new(handler));
    }

    /// Unbind `listener`; it goes back to doing nothing.
    pub fn clear(&self, listener: Listener) {
        self.slots
            .write()
            .expect("listener lock poisoned")
            .remove(&listener);
    }

    pub fn get(&self, listener: Listener) -> Option<Handler> {
        self.slots
            .read()
            .expect("listener lock poisoned")
            .get(&listener)
            .cloned()
    }

    /// Run the handler bound to `listener` with `data`. Returns whether one
    /// was bound; unbound slots behave as no-op listeners.
    pub fn notify(&self, listener: Listener, data: Value) -> bool {
        match self.get(listener) {
            Some(handler) => {
                handler(data);
                true
            }
            None => false,
        }
    }
}

/// Hooks referenced by name from widget attributes (`login-success="onLogin"`).
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, Handler>>,
}

impl HookRegistry {
    pub fn register(&self, name: impl Into<String>, hook: impl Fn(Value) + Send + Sync + 'static) {
        self.hooks
            .write()
            .expect("hook lock poisoned")
            .insert(name.into(), Arc::new(hook));
    }

    pub fn unregister(&self, name: &str) {
        self.hooks.write().expect("hook lock poisoned").remove(name);
    }

    /// Exact-name lookup; names are never split on dots.
    pub fn resolve(&self, name: &str) -> Option<Handler> {
        self.hooks
            .read()
            .expect("hook lock poisoned")
            .get(name)
            .cloned()
    }
}

/// The single context threaded through dispatcher and widgets.
pub struct BridgeContext {
    pub listeners: ListenerRegistry,
    pub hooks: HookRegistry,
    receivers: RwLock<HashMap<ChatPluginAction, Handler>>,
    alerter: Arc<dyn Alerter>,
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new(Arc::new(LogAlerter))
    }
}

impl BridgeContext {
    pub fn new(alerter: Arc<dyn Alerter>) -> Self {
        Self {
            listeners: ListenerRegistry::default(),
            hooks: HookRegistry::default(),
            receivers: RwLock::new(HashMap::new()),
            alerter,
        }
    }

    /// Install the receiver for a chat media action. The last one installed wins.
    pub fn set_receiver(&self, action: ChatPluginAction, handler: impl Fn(Value) + Send + Sync + 'static) {
        self.receivers
            .write()
            .expect("receiver lock poisoned")
            .insert(action, Arc::new(handler));
    }

    pub fn receiver(&self, action: ChatPluginAction) -> Option<Handler> {
        self.receivers
            .read()
            .expect("receiver lock poisoned")
            .get(&action)
            .cloned()
    }

    pub fn alert(&self, message: &str) {
        self.alerter.alert(message);
    }

    /// Alert with an arbitrary payload: strings as themselves, anything else
    /// as compact JSON.
    pub fn alert_value(&self, value: &Value) {
        match value {
            Value::String(s) => self.alert(s),
            other => self.alert(&other.to_string()),
        }
    }

    /// Default success action: log only.
    pub fn default_success(&self, value: &Value) {
        debug!(%value, "action succeeded");
    }

    /// Default error action: log, then raise a user-facing alert.
    pub fn default_error(&self, value: &Value) {
        error!(%value, "action failed");
        self.alert_value(value);
    }

    /// Run the hook named `hook` if it is non-empty and registered, otherwise
    /// the default success action.
    pub fn succeed(&self, hook: Option<&str>, value: Value) {
        match self.named_hook(hook) {
            Some(handler) => handler(value),
            None => self.default_success(&value),
        }
    }

    /// Error counterpart of [`Self::succeed`].
    pub fn fail(&self, hook: Option<&str>, value: Value) {
        match self.named_hook(hook) {
            Some(handler) => handler(value),
            None => self.default_error(&value),
        }
    }

    fn named_hook(&self, hook: Option<&str>) -> Option<Handler> {
        let name = hook.filter(|n| !n.is_empty())?;
        let handler = self.hooks.resolve(name);
        if handler.is_none() {
            debug!(hook = name, "hook not registered; using default action");
        }
        handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Alerter for Recorder {
        fn alert(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn rebinding_a_listener_replaces_it() {
        let registry = ListenerRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        registry.set(Listener::IncomingCall, move |_| first.lock().unwrap().push("first"));
        let second = seen.clone();
        registry.set(Listener::IncomingCall, move |_| second.lock().unwrap().push("second"));

        assert!(registry.notify(Listener::IncomingCall, Value::Null));
        assert_eq!(*seen.lock().unwrap(), vec!["second"]);

        registry.clear(Listener::IncomingCall);
        assert!(!registry.notify(Listener::IncomingCall, Value::Null));
    }

    #[test]
    fn handler_may_rebind_its_own_slot() {
        let registry = Arc::new(ListenerRegistry::default());
        let inner = registry.clone();
        registry.set(Listener::SessionExpired, move |_| {
            inner.set(Listener::SessionExpired, |_| {});
        });
        assert!(registry.notify(Listener::SessionExpired, Value::Null));
    }

    #[test]
    fn registered_hook_runs_instead_of_default() {
        let alerts = Arc::new(Recorder::default());
        let ctx = BridgeContext::new(alerts.clone());
        let got = Arc::new(Mutex::new(None));
        let sink = got.clone();
        ctx.hooks.register("onLoginFailed", move |v| *sink.lock().unwrap() = Some(v));

        ctx.fail(Some("onLoginFailed"), json!("denied"));

        assert_eq!(*got.lock().unwrap(), Some(json!("denied")));
        assert!(alerts.0.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_or_empty_hook_falls_back_to_alert() {
        let alerts = Arc::new(Recorder::default());
        let ctx = BridgeContext::new(alerts.clone());

        ctx.fail(None, json!("no network"));
        ctx.fail(Some(""), json!({"code": 7}));
        ctx.fail(Some("window.app.notRegistered"), json!("x"));
        ctx.succeed(Some("alsoMissing"), json!("ok"));

        assert_eq!(
            *alerts.0.lock().unwrap(),
            vec!["no network".to_string(), r#"{"code":7}"#.to_string(), "x".to_string()]
        );
    }

    #[derive(Clone, Default)]
    struct Levels(Arc<Mutex<Vec<tracing::Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Levels {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn default_error_through_the_log_alerter_is_logged_once() {
        use tracing_subscriber::layer::SubscriberExt;

        let levels = Levels::default();
        let subscriber = tracing_subscriber::registry().with(levels.clone());
        tracing::subscriber::with_default(subscriber, || {
            BridgeContext::new(Arc::new(LogAlerter)).default_error(&json!("no network"));
        });

        let seen = levels.0.lock().unwrap();
        let loud: Vec<_> = seen.iter().filter(|l| **l <= tracing::Level::INFO).collect();
        assert_eq!(loud, vec![&tracing::Level::ERROR]);
    }
}
