// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Widget host: materializes widget configs into the document and runs their
// controls.
//
// Each widget is a root in the `Document` plus a table of bound controls.
// A click is split in two: `begin` reads the sibling inputs and issues the
// native command immediately, and the returned continuation applies the
// answer (re-render, hook, list update) when it is awaited. `click` spawns the
// continuation; `activate` awaits it in place.
//
// Locks are always taken document first, then instances.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use kandy_bridge::{BridgeContext, Pending, Services};
use kandy_core::error::{KandyError, Result};
use kandy_core::types::{ChatPluginAction, ReceivedChat, WidgetKind};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::descriptor::WidgetConfig;
use crate::dom::{Document, Element, InputType, MessageEntry};

/// The second half of a click: applies the native answer when awaited.
pub type Continuation = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

const SENT_SENDER: &str = "You: ";
const ATTACHMENT_SENT: &str = "The file was sent successful.";

/// What a bound control does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    RequestCode,
    ValidateCode,
    Deactivate,
    Login,
    Logout,
    PstnCall,
    VoipCall,
    SendSms,
    SendChat,
    SendAttachment,
    PullEvents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Provisioning,
    Access { user: Option<String> },
    Call { pstn: bool },
    Sms,
    Chat,
}

impl View {
    fn initial(config: &WidgetConfig) -> Self {
        match config.kind {
            WidgetKind::Provisioning => Self::Provisioning,
            WidgetKind::Access => Self::Access { user: None },
            // Decided once here; the call widget never re-renders.
            WidgetKind::Call => Self::Call {
                pstn: config
                    .attr("call-type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("pstn")),
            },
            WidgetKind::Sms => Self::Sms,
            WidgetKind::Chat => Self::Chat,
        }
    }
}

struct WidgetInstance {
    config: WidgetConfig,
    view: View,
    bindings: HashMap<String, Binding>,
}

struct Rendered {
    content: Vec<Element>,
    bindings: HashMap<String, Binding>,
}

struct HostInner {
    services: Services,
    context: Arc<BridgeContext>,
    id_prefix: String,
    document: Mutex<Document>,
    instances: Mutex<HashMap<String, WidgetInstance>>,
    revision: watch::Sender<u64>,
}

/// Owns the widget document and everything bound into it. Clones share state.
#[derive(Clone)]
pub struct WidgetHost {
    inner: Arc<HostInner>,
}

impl WidgetHost {
    pub fn new(services: Services, context: Arc<BridgeContext>, id_prefix: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(HostInner {
                services,
                context,
                id_prefix: id_prefix.into(),
                document: Mutex::new(Document::new()),
                instances: Mutex::new(HashMap::new()),
                revision,
            }),
        }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.inner.context
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    /// Receiver that ticks whenever the document changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> Document {
        self.doc().clone()
    }

    pub fn markup(&self, widget_id: &str) -> Option<String> {
        self.doc().markup(widget_id)
    }

    /// Materialize `configs` in order and return the ids they received.
    ///
    /// Widgets without an explicit id get `<prefix>-<kind>-<n>` with the
    /// smallest `n` not already taken, explicit ids in this batch included.
    /// A widget that cannot be placed is logged and skipped.
    #[instrument(skip_all, fields(count = configs.len()))]
    pub fn materialize(&self, configs: Vec<WidgetConfig>) -> Vec<String> {
        let reserved: HashSet<String> = configs
            .iter()
            .filter_map(|c| c.explicit_id().map(str::to_string))
            .collect();

        let mut ids = Vec::with_capacity(configs.len());
        for config in configs {
            let kind = config.kind;
            match self.place(config, &reserved) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(%kind, error = %e, "widget skipped"),
            }
        }
        self.bump();
        info!(widgets = ids.len(), "widgets materialized");
        ids
    }

    fn place(&self, config: WidgetConfig, reserved: &HashSet<String>) -> Result<String> {
        let kind = config.kind;
        let view = View::initial(&config);
        let mut document = self.doc();
        let id = match config.explicit_id() {
            Some(id) => id.to_string(),
            None => next_id(&document, reserved, &self.inner.id_prefix, &config, &view),
        };
        // Every control must land, or the widget is not placed at all.
        if let Some(taken) = claimed_ids(&id, &config, &view)
            .into_iter()
            .find(|c| document.contains(c))
        {
            return Err(KandyError::DuplicateId(taken));
        }
        document.add_widget(&id, kind)?;
        let rendered = render(&id, &config, &view);
        document.replace_content(&id, rendered.content)?;
        self.instances().insert(
            id.clone(),
            WidgetInstance {
                config,
                view,
                bindings: rendered.bindings,
            },
        );
        drop(document);

        if kind == WidgetKind::Chat {
            self.install_chat_receiver(&id);
        }
        debug!(widget = %id, %kind, "materialized");
        Ok(id)
    }

    /// Remove a materialized widget and unbind its controls. Returns whether
    /// it existed. Incoming chat moves to the newest remaining chat widget.
    pub fn teardown(&self, widget_id: &str) -> bool {
        let mut document = self.doc();
        let Some(node) = document.remove_widget(widget_id) else {
            return false;
        };
        self.instances().remove(widget_id);
        let newest_chat = document
            .widgets()
            .iter()
            .rev()
            .find(|w| w.kind == WidgetKind::Chat)
            .map(|w| w.id.clone());
        drop(document);

        if node.kind == WidgetKind::Chat {
            if let Some(id) = newest_chat {
                self.install_chat_receiver(&id);
            }
        }
        self.bump();
        debug!(widget = widget_id, kind = %node.kind, "torn down");
        true
    }

    /// Add a page element outside any widget, e.g. a phone-number input
    /// rendered next to a validate-only provisioning widget.
    pub fn insert_host_element(&self, element: Element) -> Result<()> {
        self.doc().insert_host_element(element)?;
        self.bump();
        Ok(())
    }

    pub fn set_value(&self, id: &str, value: &str) -> Result<()> {
        self.doc().set_value(id, value)?;
        self.bump();
        Ok(())
    }

    pub fn set_checked(&self, id: &str, checked: bool) -> Result<()> {
        self.doc().set_checked(id, checked)?;
        self.bump();
        Ok(())
    }

    /// User shown by an access widget after a successful login.
    pub fn logged_in_user(&self, widget_id: &str) -> Option<String> {
        match &self.instances().get(widget_id)?.view {
            View::Access { user } => user.clone(),
            _ => None,
        }
    }

    /// Ids of the controls currently bound in a widget, sorted.
    pub fn bound_controls(&self, widget_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances()
            .get(widget_id)
            .map(|i| i.bindings.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Run the first half of a click on `element_id`: read inputs and issue
    /// the native command. The returned continuation handles the answer.
    pub fn begin(&self, element_id: &str) -> Result<Continuation> {
        let (widget_id, config, binding) = self.binding(element_id)?;
        debug!(widget = %widget_id, control = element_id, ?binding, "control activated");

        let services = &self.inner.services;
        let read = |part: &str| self.read(&widget_id, part);

        let continuation: Continuation = match binding {
            Binding::RequestCode => {
                let pending = services
                    .provisioning()
                    .request_code(&read("phone-number"), &read("region-code"));
                self.report(config, "request", pending)
            }
            Binding::ValidateCode => {
                let pending = services.provisioning().validate(
                    &read("phone-number"),
                    &read("otp-code"),
                    &read("region-code"),
                );
                self.report(config, "validate", pending)
            }
            Binding::Deactivate => self.report(config, "deactivate", services.provisioning().deactivate()),
            Binding::Login => {
                let username = read("username");
                let pending = services.access().login(&username, &read("password"));
                self.transition(widget_id, config, "login", pending, Some(username))
            }
            Binding::Logout => {
                let pending = services.access().logout();
                self.transition(widget_id, config, "logout", pending, None)
            }
            Binding::PstnCall => {
                let pending = services.call().create_pstn_call(&read("callee"));
                self.report(config, "call", pending)
            }
            Binding::VoipCall => {
                let video = self
                    .doc()
                    .checked(&child(&widget_id, "start-with-video"))
                    .unwrap_or(false);
                let pending = services.call().create_voip_call(&read("callee"), video);
                self.report(config, "call", pending)
            }
            Binding::SendSms => {
                let pending = services.chat().send_sms(&read("recipient"), &read("message"));
                self.report(config, "send-sms", pending)
            }
            Binding::SendChat => {
                let message = read("message");
                let pending = services.chat().send_chat(&read("recipient"), &message);
                let host = self.clone();
                let list = child(&widget_id, "messages");
                Box::pin(async move {
                    match pending.await {
                        Ok(value) => {
                            host.inner.context.succeed(config.success_hook("send"), value);
                            host.prepend(
                                &list,
                                MessageEntry {
                                    id: None,
                                    sender: SENT_SENDER.to_string(),
                                    text: message,
                                    timestamp: String::new(),
                                    unread: false,
                                },
                            );
                        }
                        Err(e) => host.inner.context.fail(config.error_hook("send"), e.payload()),
                    }
                })
            }
            Binding::SendAttachment => {
                let recipient = read("recipient");
                let caption = read("message");
                let pick = services.chat().pick_file();
                let services = services.clone();
                let context = self.inner.context.clone();
                Box::pin(async move {
                    let uri = match pick.await {
                        Ok(uri) => text_of(uri),
                        Err(e) => return context.alert_value(&e.payload()),
                    };
                    let send = services.chat().send_file(&recipient, &caption, &uri);
                    match send.await {
                        Ok(_) => context.alert(ATTACHMENT_SENT),
                        Err(e) => context.alert_value(&e.payload()),
                    }
                })
            }
            Binding::PullEvents => self.report(config, "pull", services.chat().pull_events()),
        };
        Ok(continuation)
    }

    /// Click `element_id` and let the answer be handled in the background.
    pub fn click(&self, element_id: &str) -> Result<JoinHandle<()>> {
        let continuation = self.begin(element_id)?;
        Ok(tokio::spawn(continuation))
    }

    /// Click `element_id` and wait until its answer has been handled.
    pub async fn activate(&self, element_id: &str) -> Result<()> {
        self.begin(element_id)?.await;
        Ok(())
    }

    /// Tell the SDK a received message was seen; on success the entry loses
    /// its unread mark. Errors go to the default error action.
    pub fn mark_message_as_received(&self, uuid: &str) -> Continuation {
        let pending = self.inner.services.chat().mark_as_received(uuid);
        let host = self.clone();
        let uuid = uuid.to_string();
        Box::pin(async move {
            match pending.await {
                Ok(_) => {
                    if host.doc().mark_read(&uuid) {
                        host.bump();
                    }
                }
                Err(e) => host.inner.context.default_error(&e.payload()),
            }
        })
    }

    /// Render an `onChatReceived` payload into a chat message list.
    fn receive_chat(&self, list_id: &str, data: Value) -> bool {
        let received: ReceivedChat = match serde_json::from_value(data) {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "malformed chat message dropped");
                return false;
            }
        };
        let message = received.message;
        let timestamp = message.display_timestamp();
        self.prepend(
            list_id,
            MessageEntry {
                id: Some(message.uuid),
                sender: message.sender,
                text: message.message.text,
                timestamp,
                unread: true,
            },
        )
    }

    /// The most recently materialized chat widget receives incoming messages.
    fn install_chat_receiver(&self, widget_id: &str) {
        let host = Arc::downgrade(&self.inner);
        let list = child(widget_id, "messages");
        self.inner
            .context
            .set_receiver(ChatPluginAction::Received, move |data| {
                if let Some(inner) = host.upgrade() {
                    WidgetHost { inner }.receive_chat(&list, data);
                }
            });
    }

    fn prepend(&self, list_id: &str, entry: MessageEntry) -> bool {
        let added = self.doc().prepend_entry(list_id, entry);
        match added {
            Ok(true) => {
                self.bump();
                true
            }
            Ok(false) => {
                debug!(list = list_id, "message already shown");
                false
            }
            Err(e) => {
                warn!(list = list_id, error = %e, "message list gone");
                false
            }
        }
    }

    /// Success re-renders the access widget for `user` before running the
    /// hook; failure leaves it as it is.
    fn transition(
        &self,
        widget_id: String,
        config: WidgetConfig,
        action: &'static str,
        pending: Pending,
        user: Option<String>,
    ) -> Continuation {
        let host = self.clone();
        Box::pin(async move {
            match pending.await {
                Ok(value) => {
                    host.rerender(&widget_id, View::Access { user });
                    host.inner.context.succeed(config.success_hook(action), value);
                }
                Err(e) => host.inner.context.fail(config.error_hook(action), e.payload()),
            }
        })
    }

    fn report(&self, config: WidgetConfig, action: &'static str, pending: Pending) -> Continuation {
        let context = self.inner.context.clone();
        Box::pin(async move {
            match pending.await {
                Ok(value) => context.succeed(config.success_hook(action), value),
                Err(e) => context.fail(config.error_hook(action), e.payload()),
            }
        })
    }

    /// Replace a widget's content and bindings with a fresh render of `view`.
    fn rerender(&self, widget_id: &str, view: View) {
        {
            let mut document = self.doc();
            let mut instances = self.instances();
            let Some(instance) = instances.get_mut(widget_id) else {
                warn!(widget = widget_id, "re-render of unknown widget");
                return;
            };
            let rendered = render(widget_id, &instance.config, &view);
            if let Err(e) = document.replace_content(widget_id, rendered.content) {
                warn!(widget = widget_id, error = %e, "re-render failed");
                return;
            }
            instance.view = view;
            instance.bindings = rendered.bindings;
        }
        self.bump();
    }

    fn binding(&self, element_id: &str) -> Result<(String, WidgetConfig, Binding)> {
        self.instances()
            .iter()
            .find_map(|(id, instance)| {
                instance
                    .bindings
                    .get(element_id)
                    .map(|b| (id.clone(), instance.config.clone(), *b))
            })
            .ok_or_else(|| KandyError::UnknownElement(element_id.to_string()))
    }

    /// Value of a widget's sibling input; missing inputs read as empty.
    fn read(&self, widget_id: &str, part: &str) -> String {
        self.doc()
            .value(&child(widget_id, part))
            .unwrap_or_default()
            .to_string()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    fn doc(&self) -> std::sync::MutexGuard<'_, Document> {
        self.inner.document.lock().expect("document lock poisoned")
    }

    fn instances(&self) -> std::sync::MutexGuard<'_, HashMap<String, WidgetInstance>> {
        self.inner.instances.lock().expect("instance lock poisoned")
    }
}

/// First `<prefix>-<kind>-<n>` whose root and rendered ids are all free.
fn next_id(
    document: &Document,
    reserved: &HashSet<String>,
    prefix: &str,
    config: &WidgetConfig,
    view: &View,
) -> String {
    let mut n = 0usize;
    loop {
        let id = format!("{prefix}-{}-{n}", config.kind);
        let free = claimed_ids(&id, config, view)
            .iter()
            .all(|c| !document.contains(c) && !reserved.contains(c));
        if free {
            return id;
        }
        n += 1;
    }
}

/// Every id a widget placed at `id` can occupy: the root, its first render,
/// and for the access widget the logged-in variant too.
fn claimed_ids(id: &str, config: &WidgetConfig, view: &View) -> Vec<String> {
    let mut ids = vec![id.to_string()];
    ids.extend(render(id, config, view).content.into_iter().map(|e| e.id));
    if let View::Access { user: None } = view {
        ids.extend(logout_button(id, "").content.into_iter().map(|e| e.id));
    }
    ids
}

fn child(widget_id: &str, part: &str) -> String {
    format!("{widget_id}-{part}")
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Per-kind renderers
// ---------------------------------------------------------------------------

fn render(id: &str, config: &WidgetConfig, view: &View) -> Rendered {
    match view {
        View::Provisioning => provisioning(id, config),
        View::Access { user: None } => login_form(id),
        View::Access { user: Some(user) } => logout_button(id, user),
        View::Call { pstn: true } => pstn_call(id),
        View::Call { pstn: false } => voip_call(id),
        View::Sms => sms(id),
        View::Chat => chat(id),
    }
}

/// The `action` attribute picks which forms are shown; all three buttons are
/// bound either way, so separately rendered controls still work.
fn provisioning(id: &str, config: &WidgetConfig) -> Rendered {
    let (request, validate, deactivate) = match config.action() {
        Some("request") => (true, false, false),
        Some("validate") => (false, true, false),
        Some("deactivate") => (false, false, true),
        _ => (true, true, true),
    };

    let mut content = Vec::new();
    if request {
        let country = config.attr("country-code").unwrap_or_default();
        content.extend([
            Element::input(child(id, "phone-number"), InputType::Tel, "Enter your number"),
            Element::input(child(id, "region-code"), InputType::Text, "2-letters country code")
                .with_value(country)
                .with_max_length(2),
            Element::button(child(id, "btn-request"), "Request code"),
        ]);
    }
    if validate {
        content.extend([
            Element::input(child(id, "otp-code"), InputType::Text, "Enter the OTP code"),
            Element::button(child(id, "btn-validate"), "Validate"),
        ]);
    }
    if deactivate {
        content.push(Element::button(child(id, "btn-deactivate"), "Deactivate"));
    }

    Rendered {
        content,
        bindings: HashMap::from([
            (child(id, "btn-request"), Binding::RequestCode),
            (child(id, "btn-validate"), Binding::ValidateCode),
            (child(id, "btn-deactivate"), Binding::Deactivate),
        ]),
    }
}

fn login_form(id: &str) -> Rendered {
    Rendered {
        content: vec![
            Element::input(child(id, "username"), InputType::Text, "userID@domain.com"),
            Element::input(child(id, "password"), InputType::Password, "Password"),
            Element::button(child(id, "btn-login"), "Login"),
        ],
        bindings: HashMap::from([(child(id, "btn-login"), Binding::Login)]),
    }
}

fn logout_button(id: &str, user: &str) -> Rendered {
    Rendered {
        content: vec![Element::button(child(id, "btn-logout"), user)],
        bindings: HashMap::from([(child(id, "btn-logout"), Binding::Logout)]),
    }
}

fn pstn_call(id: &str) -> Rendered {
    Rendered {
        content: vec![
            Element::input(child(id, "callee"), InputType::Text, "Number phone"),
            Element::button(child(id, "btn-pstn-call"), "Call"),
        ],
        bindings: HashMap::from([(child(id, "btn-pstn-call"), Binding::PstnCall)]),
    }
}

fn voip_call(id: &str) -> Rendered {
    Rendered {
        content: vec![
            Element::input(child(id, "callee"), InputType::Text, "userID@domain.com"),
            Element::checkbox(child(id, "start-with-video"), "Start with video"),
            Element::button(child(id, "btn-voip-call"), "Call"),
        ],
        bindings: HashMap::from([(child(id, "btn-voip-call"), Binding::VoipCall)]),
    }
}

fn sms(id: &str) -> Rendered {
    Rendered {
        content: vec![
            Element::input(child(id, "recipient"), InputType::Text, "Enter number phone"),
            Element::input(child(id, "message"), InputType::Text, "Message"),
            Element::button(child(id, "btn-send"), "Send"),
        ],
        bindings: HashMap::from([(child(id, "btn-send"), Binding::SendSms)]),
    }
}

fn chat(id: &str) -> Rendered {
    Rendered {
        content: vec![
            Element::input(child(id, "recipient"), InputType::Text, "recipientID@domain.com"),
            Element::input(child(id, "message"), InputType::Text, "Message"),
            Element::button(child(id, "btn-send"), "Send"),
            Element::button(child(id, "btn-send-attachment"), "Attachment"),
            Element::button(child(id, "btn-pull"), "Pull pending events"),
            Element::message_list(child(id, "messages")),
        ],
        bindings: HashMap::from([
            (child(id, "btn-send"), Binding::SendChat),
            (child(id, "btn-send-attachment"), Binding::SendAttachment),
            (child(id, "btn-pull"), Binding::PullEvents),
        ]),
    }
}
