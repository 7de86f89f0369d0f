// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service facade: one method per native command, grouped by domain.
//
// Methods do no validation of their own: they marshal their positional
// arguments under a fixed command name and pass the native answer through.
// Nothing is retried, cached, deduplicated or serialized here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use kandy_core::error::{KandyError, Result};
use kandy_core::types::{DeviceContactsFilter, DomainContactFilter, ThumbnailSize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use crate::traits::{CommandInvoker, CommandRequest, EventSink, NativeResult};

/// Entry point to every service namespace.
///
/// Cheap to clone; all clones share the same invoker.
#[derive(Clone)]
pub struct Services {
    invoker: Arc<dyn CommandInvoker>,
    plugin: Arc<str>,
}

impl Services {
    pub fn new(invoker: Arc<dyn CommandInvoker>, plugin: &str) -> Self {
        Self {
            invoker,
            plugin: Arc::from(plugin),
        }
    }

    /// Platform the underlying invoker talks to.
    pub fn platform_name(&self) -> &str {
        self.invoker.platform_name()
    }

    /// Issue a native command now and return the pending answer.
    ///
    /// The command has been handed to the invoker by the time this returns;
    /// dropping the `Pending` only discards the answer.
    #[instrument(skip(self, args), fields(plugin = %self.plugin))]
    pub fn execute(&self, command: &str, args: Vec<Value>) -> Pending {
        let (tx, rx) = oneshot::channel();
        debug!(args = args.len(), "issuing native command");
        self.invoker.invoke(self.request(command, args), tx);
        Pending {
            command: command.to_string(),
            rx,
        }
    }

    /// Open a standing notification registration for `channel`.
    pub fn register(&self, channel: &str, sink: EventSink) {
        self.invoker.register(self.request(channel, Vec::new()), sink);
    }

    fn request(&self, command: &str, args: Vec<Value>) -> CommandRequest {
        CommandRequest::new(self.plugin.as_ref(), command, args)
    }

    pub fn provisioning(&self) -> Provisioning<'_> {
        Provisioning { svc: self }
    }

    pub fn access(&self) -> Access<'_> {
        Access { svc: self }
    }

    pub fn call(&self) -> Call<'_> {
        Call { svc: self }
    }

    pub fn chat(&self) -> Chat<'_> {
        Chat { svc: self }
    }

    pub fn group(&self) -> Group<'_> {
        Group { svc: self }
    }

    pub fn presence(&self) -> Presence<'_> {
        Presence { svc: self }
    }

    pub fn location(&self) -> Location<'_> {
        Location { svc: self }
    }

    pub fn push(&self) -> Push<'_> {
        Push { svc: self }
    }

    pub fn address_book(&self) -> AddressBook<'_> {
        AddressBook { svc: self }
    }
}

/// Answer to a native command that has already been issued.
///
/// Resolves exactly once: the success payload, or `KandyError::Native` with
/// the error payload untouched, or `KandyError::InvokerClosed` if the invoker
/// dropped the command.
#[derive(Debug)]
pub struct Pending {
    command: String,
    rx: oneshot::Receiver<NativeResult>,
}

impl Pending {
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Future for Pending {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let answer = ready!(Pin::new(&mut this.rx).poll(cx));
        let command = std::mem::take(&mut this.command);
        Poll::Ready(match answer {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => {
                debug!(%command, %payload, "native command failed");
                Err(KandyError::Native { command, payload })
            }
            Err(_) => Err(KandyError::InvokerClosed(command)),
        })
    }
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect())
}

// -- Provisioning ------------------------------------------------------------

/// Phone-number registration and deactivation.
pub struct Provisioning<'a> {
    svc: &'a Services,
}

impl Provisioning<'_> {
    /// Request a verification code for `phone_number` in the two-letter ISO
    /// region `country_code`.
    pub fn request_code(&self, phone_number: &str, country_code: &str) -> Pending {
        self.svc.execute("request", vec![phone_number.into(), country_code.into()])
    }

    /// Send the received OTP back to finish registration.
    pub fn validate(&self, phone_number: &str, otp: &str, country_code: &str) -> Pending {
        self.svc.execute(
            "validate",
            vec![phone_number.into(), otp.into(), country_code.into()],
        )
    }

    /// Sign the registered number off.
    pub fn deactivate(&self) -> Pending {
        self.svc.execute("deactivate", Vec::new())
    }
}

// -- Access ------------------------------------------------------------------

/// Login, logout and session state.
pub struct Access<'a> {
    svc: &'a Services,
}

impl Access<'_> {
    pub fn login(&self, username: &str, password: &str) -> Pending {
        self.svc.execute("login", vec![username.into(), password.into()])
    }

    pub fn logout(&self) -> Pending {
        self.svc.execute("logout", Vec::new())
    }

    pub fn get_connection_state(&self) -> Pending {
        self.svc.execute("getConnectionState", Vec::new())
    }

    pub fn get_session(&self) -> Pending {
        self.svc.execute("getSession", Vec::new())
    }
}

// -- Call --------------------------------------------------------------------

/// Call control.
pub struct Call<'a> {
    svc: &'a Services,
}

impl Call<'_> {
    /// Start a VoIP call. The flag crosses the bridge as `1`/`0`.
    pub fn create_voip_call(&self, user: &str, start_with_video: bool) -> Pending {
        self.svc.execute(
            "createVoipCall",
            vec![user.into(), u8::from(start_with_video).into()],
        )
    }

    pub fn create_pstn_call(&self, phone_number: &str) -> Pending {
        self.svc.execute("createPSTNCall", vec![phone_number.into()])
    }

    pub fn hangup(&self) -> Pending {
        self.svc.execute("hangupCall", Vec::new())
    }

    pub fn mute(&self) -> Pending {
        self.svc.execute("muteCall", Vec::new())
    }

    pub fn unmute(&self) -> Pending {
        self.svc.execute("UnMuteCall", Vec::new())
    }

    pub fn hold(&self) -> Pending {
        self.svc.execute("holdCall", Vec::new())
    }

    pub fn unhold(&self) -> Pending {
        self.svc.execute("unHoldCall", Vec::new())
    }

    pub fn enable_video(&self) -> Pending {
        self.svc.execute("enableVideo", Vec::new())
    }

    pub fn disable_video(&self) -> Pending {
        self.svc.execute("disableVideo", Vec::new())
    }

    pub fn accept(&self) -> Pending {
        self.svc.execute("acceptCall", Vec::new())
    }

    pub fn reject(&self) -> Pending {
        self.svc.execute("rejectCall", Vec::new())
    }

    pub fn ignore(&self) -> Pending {
        self.svc.execute("ignoreCall", Vec::new())
    }
}

// -- Chat --------------------------------------------------------------------

/// Chat, SMS and media messages.
pub struct Chat<'a> {
    svc: &'a Services,
}

impl Chat<'_> {
    pub fn send_chat(&self, recipient: &str, message: &str) -> Pending {
        self.svc.execute("sendChat", vec![recipient.into(), message.into()])
    }

    pub fn send_sms(&self, recipient: &str, message: &str) -> Pending {
        self.svc.execute("sendSMS", vec![recipient.into(), message.into()])
    }

    pub fn pick_audio(&self) -> Pending {
        self.svc.execute("pickAudio", Vec::new())
    }

    pub fn send_audio(&self, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.send_media("sendAudio", recipient, caption, uri)
    }

    pub fn pick_video(&self) -> Pending {
        self.svc.execute("pickVideo", Vec::new())
    }

    pub fn send_video(&self, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.send_media("sendVideo", recipient, caption, uri)
    }

    pub fn pick_image(&self) -> Pending {
        self.svc.execute("pickImage", Vec::new())
    }

    pub fn send_image(&self, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.send_media("sendImage", recipient, caption, uri)
    }

    pub fn pick_file(&self) -> Pending {
        self.svc.execute("pickFile", Vec::new())
    }

    pub fn send_file(&self, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.send_media("sendFile", recipient, caption, uri)
    }

    pub fn pick_contact(&self) -> Pending {
        self.svc.execute("pickContact", Vec::new())
    }

    pub fn send_contact(&self, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.send_media("sendContact", recipient, caption, uri)
    }

    pub fn send_current_location(&self, recipient: &str, caption: &str) -> Pending {
        self.svc.execute("sendCurrentLocation", vec![recipient.into(), caption.into()])
    }

    /// Send an explicit location; its shape is whatever the SDK expects.
    pub fn send_location(&self, recipient: &str, caption: &str, location: Value) -> Pending {
        self.svc.execute(
            "sendLocation",
            vec![recipient.into(), caption.into(), location],
        )
    }

    pub fn cancel_media_transfer(&self, uuid: &str) -> Pending {
        self.svc.execute("cancelMediaTransfer", vec![uuid.into()])
    }

    pub fn download_media(&self, uuid: &str) -> Pending {
        self.svc.execute("downloadMedia", vec![uuid.into()])
    }

    pub fn download_media_thumbnail(&self, uuid: &str, size: ThumbnailSize) -> Pending {
        self.svc.execute("downloadMediaThumbnail", vec![uuid.into(), size.as_str().into()])
    }

    pub fn mark_as_received(&self, uuid: &str) -> Pending {
        self.svc.execute("markAsReceived", vec![uuid.into()])
    }

    pub fn pull_events(&self) -> Pending {
        self.svc.execute("pullEvents", Vec::new())
    }

    fn send_media(&self, command: &str, recipient: &str, caption: &str, uri: &str) -> Pending {
        self.svc.execute(command, vec![recipient.into(), caption.into(), uri.into()])
    }
}

// -- Group -------------------------------------------------------------------

/// Group chat management.
pub struct Group<'a> {
    svc: &'a Services,
}

impl Group<'_> {
    pub fn create_group(&self, name: &str) -> Pending {
        self.svc.execute("createGroup", vec![name.into()])
    }

    pub fn get_my_groups(&self) -> Pending {
        self.svc.execute("getMyGroups", Vec::new())
    }

    pub fn get_group_by_id(&self, id: &str) -> Pending {
        self.by_id("getGroupById", id)
    }

    pub fn update_group_name(&self, id: &str, new_name: &str) -> Pending {
        self.svc.execute("updateGroupName", vec![id.into(), new_name.into()])
    }

    pub fn update_group_image(&self, id: &str, uri: &str) -> Pending {
        self.svc.execute("updateGroupImage", vec![id.into(), uri.into()])
    }

    pub fn remove_group_image(&self, id: &str) -> Pending {
        self.by_id("removeGroupImage", id)
    }

    pub fn download_group_image(&self, id: &str) -> Pending {
        self.by_id("downloadGroupImage", id)
    }

    pub fn download_group_image_thumbnail(&self, id: &str, size: ThumbnailSize) -> Pending {
        self.svc.execute(
            "downloadGroupImageThumbnail",
            vec![id.into(), size.as_str().into()],
        )
    }

    pub fn mute_group(&self, id: &str) -> Pending {
        self.by_id("muteGroup", id)
    }

    pub fn unmute_group(&self, id: &str) -> Pending {
        self.by_id("unmuteGroup", id)
    }

    pub fn destroy_group(&self, id: &str) -> Pending {
        self.by_id("destroyGroup", id)
    }

    pub fn leave_group(&self, id: &str) -> Pending {
        self.by_id("leaveGroup", id)
    }

    pub fn remove_participants(&self, id: &str, participants: &[String]) -> Pending {
        self.with_participants("removeParticipants", id, participants)
    }

    pub fn mute_participants(&self, id: &str, participants: &[String]) -> Pending {
        self.with_participants("muteParticipants", id, participants)
    }

    pub fn unmute_participants(&self, id: &str, participants: &[String]) -> Pending {
        self.with_participants("unmuteParticipants", id, participants)
    }

    pub fn add_participants(&self, id: &str, participants: &[String]) -> Pending {
        self.with_participants("addParticipants", id, participants)
    }

    fn by_id(&self, command: &str, id: &str) -> Pending {
        self.svc.execute(command, vec![id.into()])
    }

    fn with_participants(&self, command: &str, id: &str, participants: &[String]) -> Pending {
        self.svc.execute(command, vec![id.into(), strings(participants)])
    }
}

// -- Presence ----------------------------------------------------------------

pub struct Presence<'a> {
    svc: &'a Services,
}

impl Presence<'_> {
    /// Watch presence of `users`. The user list is the argument list itself.
    pub fn start_watch(&self, users: &[String]) -> Pending {
        let args = users.iter().map(|u| Value::from(u.as_str())).collect();
        self.svc.execute("presence", args)
    }
}

// -- Location ----------------------------------------------------------------

pub struct Location<'a> {
    svc: &'a Services,
}

impl Location<'_> {
    pub fn get_country_info(&self) -> Pending {
        self.svc.execute("getCountryInfo", Vec::new())
    }

    pub fn get_current_location(&self) -> Pending {
        self.svc.execute("getCurrentLocation", Vec::new())
    }
}

// -- Push --------------------------------------------------------------------

pub struct Push<'a> {
    svc: &'a Services,
}

impl Push<'_> {
    pub fn enable(&self) -> Pending {
        self.svc.execute("pushEnable", Vec::new())
    }

    pub fn disable(&self) -> Pending {
        self.svc.execute("pushDisable", Vec::new())
    }
}

// -- Address book ------------------------------------------------------------

/// Device and domain directory contacts.
pub struct AddressBook<'a> {
    svc: &'a Services,
}

impl AddressBook<'_> {
    pub fn get_device_contacts(&self, filters: &[DeviceContactsFilter]) -> Pending {
        let filters = filters.iter().map(|f| Value::from(f.as_str())).collect();
        self.svc.execute("getDeviceContacts", vec![Value::Array(filters)])
    }

    pub fn get_domain_contacts(&self, filter: DomainContactFilter) -> Pending {
        self.svc.execute("getDomainContacts", vec![filter.as_str().into()])
    }

    pub fn get_filtered_domain_directory_contacts(
        &self,
        filter: DomainContactFilter,
        search: &str,
    ) -> Pending {
        self.svc.execute(
            "getFilteredDomainDirectoryContacts",
            vec![filter.as_str().into(), search.into()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;
    use serde_json::json;

    fn services() -> (Arc<ScriptedInvoker>, Services) {
        let invoker = Arc::new(ScriptedInvoker::new());
        let svc = Services::new(invoker.clone(), "KandyPlugin");
        (invoker, svc)
    }

    #[tokio::test]
    async fn pstn_call_marshals_one_argument() {
        let (invoker, svc) = services();
        invoker.respond("createPSTNCall", Ok(json!({"callId": "c-1"})));

        let result = svc.call().create_pstn_call("15551234567").await.unwrap();

        assert_eq!(result, json!({"callId": "c-1"}));
        let requests = invoker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            CommandRequest::new("KandyPlugin", "createPSTNCall", vec![json!("15551234567")])
        );
    }

    #[tokio::test]
    async fn command_is_issued_before_the_answer_is_awaited() {
        let (invoker, svc) = services();
        let pending = svc.call().hangup();
        assert_eq!(pending.command(), "hangupCall");
        assert_eq!(invoker.requests().len(), 1);
        assert_eq!(pending.await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn native_errors_pass_through_verbatim() {
        let (invoker, svc) = services();
        invoker.respond("login", Err(json!({"code": 403})));

        let err = svc.access().login("bob@example.com", "pw").await.unwrap_err();

        match err {
            KandyError::Native { command, payload } => {
                assert_eq!(command, "login");
                assert_eq!(payload, json!({"code": 403}));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stub_and_closed_shell_fail_differently() {
        let svc = Services::new(Arc::new(crate::stub::StubInvoker), "KandyPlugin");
        assert!(matches!(
            svc.push().enable().await,
            Err(KandyError::Native { .. })
        ));

        let (invoker, closed) = crate::shell::ShellInvoker::new("gone");
        drop(closed);
        let svc = Services::new(Arc::new(invoker), "KandyPlugin");
        assert!(matches!(
            svc.push().enable().await,
            Err(KandyError::InvokerClosed(cmd)) if cmd == "pushEnable"
        ));
    }

    #[tokio::test]
    async fn command_names_follow_the_native_table() {
        let (invoker, svc) = services();
        svc.call().unmute().await.unwrap();
        svc.call().unhold().await.unwrap();
        svc.call().hangup().await.unwrap();
        svc.push().disable().await.unwrap();

        let commands: Vec<_> = invoker.requests().into_iter().map(|r| r.command).collect();
        assert_eq!(commands, ["UnMuteCall", "unHoldCall", "hangupCall", "pushDisable"]);
    }

    #[tokio::test]
    async fn voip_flag_crosses_as_integer() {
        let (invoker, svc) = services();
        svc.call().create_voip_call("alice@example.com", true).await.unwrap();
        svc.call().create_voip_call("alice@example.com", false).await.unwrap();

        let reqs = invoker.requests_for("createVoipCall");
        assert_eq!(reqs[0].args, vec![json!("alice@example.com"), json!(1)]);
        assert_eq!(reqs[1].args, vec![json!("alice@example.com"), json!(0)]);
    }

    #[tokio::test]
    async fn presence_uses_user_list_as_arguments() {
        let (invoker, svc) = services();
        let users = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        svc.presence().start_watch(&users).await.unwrap();

        assert_eq!(
            invoker.requests_for("presence")[0].args,
            vec![json!("a@x.com"), json!("b@x.com")]
        );
    }

    #[tokio::test]
    async fn list_arguments_are_nested_arrays() {
        let (invoker, svc) = services();
        svc.group()
            .add_participants("g-1", &["carol@x.com".to_string()])
            .await
            .unwrap();
        svc.address_book()
            .get_device_contacts(&[DeviceContactsFilter::IsFavorite, DeviceContactsFilter::HasPhoneNumber])
            .await
            .unwrap();
        svc.chat()
            .download_media_thumbnail("m-9", ThumbnailSize::Medium)
            .await
            .unwrap();

        assert_eq!(
            invoker.requests_for("addParticipants")[0].args,
            vec![json!("g-1"), json!(["carol@x.com"])]
        );
        assert_eq!(
            invoker.requests_for("getDeviceContacts")[0].args,
            vec![json!(["IS_FAVORITE", "HAS_PHONE_NUMBER"])]
        );
        assert_eq!(
            invoker.requests_for("downloadMediaThumbnail")[0].args,
            vec![json!("m-9"), json!("MEDIUM")]
        );
    }

    #[tokio::test]
    async fn concurrent_calls_are_not_deduplicated() {
        let (invoker, svc) = services();
        let (a, b) = tokio::join!(
            svc.call().create_voip_call("x@y.com", false),
            svc.call().create_voip_call("x@y.com", false)
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(invoker.requests_for("createVoipCall").len(), 2);
    }
}
