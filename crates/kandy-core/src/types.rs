// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Kandy bridge: the constant tables exposed to
// application code, listener and widget kinds, and notification payloads.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::KandyError;

// ---------------------------------------------------------------------------
// Constant tables
// ---------------------------------------------------------------------------

/// Filters accepted by `addressBook.getDeviceContacts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceContactsFilter {
    All,
    IsFavorite,
    HasPhoneNumber,
    HasEmailAddress,
}

impl DeviceContactsFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::IsFavorite => "IS_FAVORITE",
            Self::HasPhoneNumber => "HAS_PHONE_NUMBER",
            Self::HasEmailAddress => "HAS_EMAIL_ADDRESS",
        }
    }
}

/// Filters accepted by the domain directory lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainContactFilter {
    All,
    FirstAndLastName,
    UserId,
    Phone,
}

impl DomainContactFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::FirstAndLastName => "FIRST_AND_LAST_NAME",
            Self::UserId => "USER_ID",
            Self::Phone => "PHONE",
        }
    }
}

/// Thumbnail sizes for media and group image downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThumbnailSize {
    Large,
    Medium,
    Small,
}

impl ThumbnailSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Large => "LARGE",
            Self::Medium => "MEDIUM",
            Self::Small => "SMALL",
        }
    }
}

/// Connection state reported by `access.getConnectionState` and
/// `onConnectionStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Unknown,
    Disconnected,
    Connected,
    Disconnecting,
    Connecting,
    Failed,
}

/// Call state reported by `onCallStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Initial,
    Ringing,
    Dialing,
    Talking,
    Terminated,
    OnDoubleHold,
    RemotelyHeld,
    OnHold,
}

/// Network type the SDK is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    None,
    Mobile,
    Wifi,
    All,
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

/// The kinds of declarative widget the materializer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Provisioning,
    Access,
    Call,
    Chat,
    Sms,
}

impl WidgetKind {
    /// Markup name of the kind, also used in generated ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Access => "access",
            Self::Call => "call",
            Self::Chat => "chat",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = KandyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(Self::Provisioning),
            "access" => Ok(Self::Access),
            "call" => Ok(Self::Call),
            "chat" => Ok(Self::Chat),
            "sms" => Ok(Self::Sms),
            other => Err(KandyError::UnknownWidget(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Standing notification channels registered with the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    Connect,
    Call,
    AddressBook,
    Chat,
    Group,
    /// Chat media events, delivered separately from the generic chat channel.
    ChatPlugin,
}

impl NotificationChannel {
    /// The channels whose events resolve through the listener registry.
    pub const GENERIC: [Self; 5] = [
        Self::Connect,
        Self::Call,
        Self::AddressBook,
        Self::Chat,
        Self::Group,
    ];

    /// Native command that opens the channel.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Connect => "connectServiceNotificationCallback",
            Self::Call => "callServiceNotificationCallback",
            Self::AddressBook => "addressBookServiceNotificationCallback",
            Self::Chat => "chatServiceNotificationCallback",
            Self::Group => "groupServiceNotificationCallback",
            Self::ChatPlugin => "chatServiceNotificationPluginCallback",
        }
    }
}

/// An event pushed by the native layer on a notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Name of the listener that should receive `data`.
    pub action: String,
    /// Opaque payload, forwarded verbatim.
    #[serde(default)]
    pub data: Value,
}

impl NotificationEvent {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

/// Every listener application code may install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    // Access
    ConnectionStateChanged,
    SocketConnected,
    SocketConnecting,
    SocketDisconnected,
    SocketFailedWithError,
    InvalidUser,
    SessionExpired,
    SdkNotSupported,
    // Call
    IncomingCall,
    MissedCall,
    CallStateChanged,
    VideoStateChanged,
    AudioStateChanged,
    GsmCallIncoming,
    GsmCallConnected,
    GsmCallDisconnected,
    // Chat
    ChatReceived,
    ChatDelivered,
    ChatMediaAutoDownloadProgress,
    ChatMediaAutoDownloadSucceeded,
    ChatMediaAutoDownloadFailed,
    // Group
    GroupDestroyed,
    GroupUpdated,
    ParticipantJoined,
    ParticipantKicked,
    ParticipantLeft,
    // Address book
    DeviceAddressBookChanged,
}

impl Listener {
    pub const ALL: [Self; 27] = [
        Self::ConnectionStateChanged,
        Self::SocketConnected,
        Self::SocketConnecting,
        Self::SocketDisconnected,
        Self::SocketFailedWithError,
        Self::InvalidUser,
        Self::SessionExpired,
        Self::SdkNotSupported,
        Self::IncomingCall,
        Self::MissedCall,
        Self::CallStateChanged,
        Self::VideoStateChanged,
        Self::AudioStateChanged,
        Self::GsmCallIncoming,
        Self::GsmCallConnected,
        Self::GsmCallDisconnected,
        Self::ChatReceived,
        Self::ChatDelivered,
        Self::ChatMediaAutoDownloadProgress,
        Self::ChatMediaAutoDownloadSucceeded,
        Self::ChatMediaAutoDownloadFailed,
        Self::GroupDestroyed,
        Self::GroupUpdated,
        Self::ParticipantJoined,
        Self::ParticipantKicked,
        Self::ParticipantLeft,
        Self::DeviceAddressBookChanged,
    ];

    /// Action name the native layer uses for this listener.
    ///
    /// `onChatMediaAutoDownloadSucceded` keeps the SDK's spelling.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::ConnectionStateChanged => "onConnectionStateChanged",
            Self::SocketConnected => "onSocketConnected",
            Self::SocketConnecting => "onSocketConnecting",
            Self::SocketDisconnected => "onSocketDisconnected",
            Self::SocketFailedWithError => "onSocketFailedWithError",
            Self::InvalidUser => "onInvalidUser",
            Self::SessionExpired => "onSessionExpired",
            Self::SdkNotSupported => "onSDKNotSupported",
            Self::IncomingCall => "onIncomingCall",
            Self::MissedCall => "onMissedCall",
            Self::CallStateChanged => "onCallStateChanged",
            Self::VideoStateChanged => "onVideoStateChanged",
            Self::AudioStateChanged => "onAudioStateChanged",
            Self::GsmCallIncoming => "onGSMCallIncoming",
            Self::GsmCallConnected => "onGSMCallConnected",
            Self::GsmCallDisconnected => "onGSMCallDisconnected",
            Self::ChatReceived => "onChatReceived",
            Self::ChatDelivered => "onChatDelivered",
            Self::ChatMediaAutoDownloadProgress => "onChatMediaAutoDownloadProgress",
            Self::ChatMediaAutoDownloadSucceeded => "onChatMediaAutoDownloadSucceded",
            Self::ChatMediaAutoDownloadFailed => "onChatMediaAutoDownloadFailed",
            Self::GroupDestroyed => "onGroupDestroyed",
            Self::GroupUpdated => "onGroupUpdated",
            Self::ParticipantJoined => "onParticipantJoined",
            Self::ParticipantKicked => "onParticipantKicked",
            Self::ParticipantLeft => "onParticipantLeft",
            Self::DeviceAddressBookChanged => "onDeviceAddressBookChanged",
        }
    }

    /// Resolve an action name. Unknown names, including dotted paths, are
    /// rejected here rather than walked.
    pub fn from_action(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.action_name() == action)
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Actions understood on the chat media channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatPluginAction {
    Received,
    Delivered,
    MediaDownloadProgress,
    MediaDownloadSucceeded,
    MediaDownloadFailed,
}

impl ChatPluginAction {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "onChatReceived" => Some(Self::Received),
            "onChatDelivered" => Some(Self::Delivered),
            "onChatMediaAutoDownloadProgress" => Some(Self::MediaDownloadProgress),
            "onChatMediaAutoDownloadSucceded" => Some(Self::MediaDownloadSucceeded),
            "onChatMediaAutoDownloadFailed" => Some(Self::MediaDownloadFailed),
            _ => None,
        }
    }

    /// The application listener that mirrors this action.
    pub fn listener(&self) -> Listener {
        match self {
            Self::Received => Listener::ChatReceived,
            Self::Delivered => Listener::ChatDelivered,
            Self::MediaDownloadProgress => Listener::ChatMediaAutoDownloadProgress,
            Self::MediaDownloadSucceeded => Listener::ChatMediaAutoDownloadSucceeded,
            Self::MediaDownloadFailed => Listener::ChatMediaAutoDownloadFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat payloads
// ---------------------------------------------------------------------------

/// Payload of an `onChatReceived` event on the chat media channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedChat {
    pub message: ChatMessage,
}

/// A single chat message as reported by the SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: ChatContent,
    /// Epoch milliseconds or a preformatted string, depending on platform.
    #[serde(default)]
    pub timestamp: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContent {
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    /// Timestamp for display: epoch milliseconds become RFC 3339 UTC, strings
    /// pass through, anything else renders empty.
    pub fn display_timestamp(&self) -> String {
        match &self.timestamp {
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| n.to_string()),
            Value::String(s) => s.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constant_tables_use_wire_names() {
        assert_eq!(serde_json::to_value(CallState::OnDoubleHold).unwrap(), json!("ON_DOUBLE_HOLD"));
        assert_eq!(
            serde_json::to_value(ConnectionState::Disconnecting).unwrap(),
            json!("DISCONNECTING")
        );
        assert_eq!(
            serde_json::to_value(DeviceContactsFilter::HasEmailAddress).unwrap(),
            json!(DeviceContactsFilter::HasEmailAddress.as_str())
        );
        assert_eq!(serde_json::to_value(ThumbnailSize::Small).unwrap(), json!("SMALL"));
    }

    #[test]
    fn widget_kind_parses_markup_names() {
        assert_eq!("sms".parse::<WidgetKind>().unwrap(), WidgetKind::Sms);
        assert!(matches!(
            "video".parse::<WidgetKind>(),
            Err(KandyError::UnknownWidget(kind)) if kind == "video"
        ));
    }

    #[test]
    fn listener_names_are_unique() {
        for (i, a) in Listener::ALL.iter().enumerate() {
            assert_eq!(Listener::from_action(a.action_name()), Some(*a));
            for b in &Listener::ALL[i + 1..] {
                assert_ne!(a.action_name(), b.action_name());
            }
        }
    }

    #[test]
    fn dotted_and_unknown_actions_do_not_resolve() {
        assert_eq!(Listener::from_action("Kandy.onIncomingCall"), None);
        assert_eq!(Listener::from_action("onSomethingElse"), None);
        assert_eq!(Listener::from_action(""), None);
    }

    #[test]
    fn chat_plugin_actions_mirror_listeners() {
        let action = ChatPluginAction::from_action("onChatMediaAutoDownloadFailed").unwrap();
        assert_eq!(action.listener(), Listener::ChatMediaAutoDownloadFailed);
        assert_eq!(ChatPluginAction::from_action("onIncomingCall"), None);
    }

    #[test]
    fn received_chat_parses_sdk_shape() {
        let chat: ReceivedChat = serde_json::from_value(json!({
            "message": {
                "UUID": "m-1",
                "sender": "alice@example.com",
                "message": {"text": "hi"},
                "timestamp": 0
            }
        }))
        .unwrap();
        assert_eq!(chat.message.uuid, "m-1");
        assert_eq!(chat.message.message.text, "hi");
        assert_eq!(chat.message.display_timestamp(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn notification_event_data_defaults_to_null() {
        let event: NotificationEvent =
            serde_json::from_value(json!({"action": "onSocketConnected"})).unwrap();
        assert_eq!(event.data, Value::Null);
    }
}
