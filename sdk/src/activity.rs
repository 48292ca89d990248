//! Channel activity types
//!
//! An `Activity` is the envelope exchanged between a messaging channel and
//! the bot. The JSON shape follows the Bot Framework activity schema
//! (camelCase field names), restricted to the fields the relay reads or
//! writes. Unknown fields are ignored on input.

use serde::{Deserialize, Serialize};

/// Value type attached to error trace activities
pub const ERROR_TRACE_VALUE_TYPE: &str = "https://www.botframework.com/schemas/error";

/// Kind of activity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    /// A chat message
    Message,

    /// Conversation membership or metadata changed
    ConversationUpdate,

    /// Diagnostic trace, only rendered by developer tooling
    Trace,

    /// Any activity type the relay does not handle
    #[default]
    #[serde(other)]
    Unknown,
}

/// A participant in a conversation (user or bot)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelAccount {
    /// Channel-specific identifier
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Conversation reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationAccount {
    pub id: String,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Activity envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Required on the wire; an envelope without it is rejected
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Alternate text rendering (spoken or accessibility text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,

    // Trace fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

impl Activity {
    /// Plain text message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Text message with an alternate rendering
    pub fn text_with_speak(text: impl Into<String>, speak: impl Into<String>) -> Self {
        Self {
            speak: Some(speak.into()),
            ..Self::text(text)
        }
    }

    /// Diagnostic trace activity
    pub fn trace(
        name: impl Into<String>,
        value: serde_json::Value,
        value_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            activity_type: ActivityType::Trace,
            name: Some(name.into()),
            value: Some(value),
            value_type: Some(value_type.into()),
            label: Some(label.into()),
            ..Default::default()
        }
    }

    /// Inbound message (used by adapters and tests)
    pub fn incoming_message(
        from: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: Some(ChannelAccount::new(from)),
            recipient: Some(ChannelAccount::new(recipient)),
            ..Self::text(text)
        }
    }

    /// Inbound membership update
    pub fn members_added(recipient: impl Into<String>, members: Vec<ChannelAccount>) -> Self {
        Self {
            activity_type: ActivityType::ConversationUpdate,
            recipient: Some(ChannelAccount::new(recipient)),
            members_added: members,
            ..Default::default()
        }
    }

    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation = Some(ConversationAccount::new(id));
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Address an outgoing activity as a reply to `incoming`.
    ///
    /// Swaps sender and recipient and copies the conversation, channel and
    /// service URL so the adapter can route it back.
    pub fn reply_to(mut self, incoming: &Activity) -> Self {
        self.from = incoming.recipient.clone();
        self.recipient = incoming.from.clone();
        self.conversation = incoming.conversation.clone();
        self.channel_id = incoming.channel_id.clone();
        self.service_url = incoming.service_url.clone();
        self.reply_to_id = incoming.id.clone();
        self
    }

    /// Text content, empty when absent
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether the sender asked for replies in the HTTP response body
    pub fn expects_replies(&self) -> bool {
        self.delivery_mode.as_deref() == Some("expectReplies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_emulator_message() {
        let json = r#"{
            "type": "message",
            "id": "abc",
            "channelId": "emulator",
            "serviceUrl": "http://localhost:5000",
            "from": {"id": "user-1", "name": "User"},
            "recipient": {"id": "bot-1"},
            "conversation": {"id": "conv-1"},
            "text": "Hello",
            "locale": "en-US"
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Message);
        assert_eq!(activity.text_or_empty(), "Hello");
        assert_eq!(activity.from.unwrap().id, "user-1");
        assert_eq!(activity.channel_id.as_deref(), Some("emulator"));
        assert_eq!(activity.service_url.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn test_parse_members_added() {
        let json = r#"{
            "type": "conversationUpdate",
            "recipient": {"id": "bot-1"},
            "membersAdded": [{"id": "bot-1"}, {"id": "user-1"}]
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type, ActivityType::ConversationUpdate);
        assert_eq!(activity.members_added.len(), 2);
        assert_eq!(activity.members_added[1].id, "user-1");
    }

    #[test]
    fn test_unknown_activity_type() {
        let activity: Activity = serde_json::from_str(r#"{"type": "typing"}"#).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Unknown);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let json = r#"{"from": {"id": "u"}, "recipient": {"id": "b"}, "text": "hi"}"#;
        let err = serde_json::from_str::<Activity>(json).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_text_with_speak_serialization() {
        let json = serde_json::to_value(Activity::text_with_speak("Hi", "Hi")).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["text"], "Hi");
        assert_eq!(json["speak"], "Hi");
        assert!(json.get("membersAdded").is_none());
        assert!(json.get("from").is_none());
    }

    #[test]
    fn test_trace_serialization() {
        let trace = Activity::trace(
            "OnTurnError Trace",
            serde_json::json!("boom"),
            ERROR_TRACE_VALUE_TYPE,
            "TurnError",
        );
        let json = serde_json::to_value(trace).unwrap();
        assert_eq!(json["type"], "trace");
        assert_eq!(json["valueType"], ERROR_TRACE_VALUE_TYPE);
        assert_eq!(json["label"], "TurnError");
    }

    #[test]
    fn test_reply_to_swaps_accounts() {
        let mut incoming = Activity::incoming_message("user-1", "bot-1", "Hello")
            .with_conversation("conv-1")
            .with_channel("emulator");
        incoming.id = Some("act-9".to_string());

        let reply = Activity::text("Hi").reply_to(&incoming);
        assert_eq!(reply.from.unwrap().id, "bot-1");
        assert_eq!(reply.recipient.unwrap().id, "user-1");
        assert_eq!(reply.conversation.unwrap().id, "conv-1");
        assert_eq!(reply.reply_to_id.as_deref(), Some("act-9"));
        assert_eq!(reply.channel_id.as_deref(), Some("emulator"));
    }

    #[test]
    fn test_expects_replies() {
        let mut activity = Activity::text("x");
        assert!(!activity.expects_replies());
        activity.delivery_mode = Some("expectReplies".to_string());
        assert!(activity.expects_replies());
    }
}
