//! Bot Framework connector client
//!
//! Delivers replies for activities that arrived with a `serviceUrl`. Each
//! reply is posted to
//! `{serviceUrl}/v3/conversations/{conversationId}/activities/{activityId}`,
//! or to `.../activities` when the inbound activity carried no id.
//!
//! Requests are sent without channel authentication.

use async_trait::async_trait;
use reqwest::Client;
use sdk::{Activity, EngineError};
use std::time::Duration;
use tracing::debug;

use crate::bot::TurnContext;
use crate::secrets::scrub;

/// HTTP client for the connector REST API
#[derive(Debug, Clone)]
pub struct ConnectorClient {
    client: Client,
}

impl Default for ConnectorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build the activities URL for a conversation
    pub fn activities_url(
        service_url: &str,
        conversation_id: &str,
        reply_to_id: Option<&str>,
    ) -> String {
        let base = format!(
            "{}/v3/conversations/{}/activities",
            service_url.trim_end_matches('/'),
            conversation_id
        );
        match reply_to_id {
            Some(id) => format!("{}/{}", base, id),
            None => base,
        }
    }

    /// Post one activity into a conversation
    pub async fn send_to_conversation(
        &self,
        service_url: &str,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<(), EngineError> {
        let url = Self::activities_url(
            service_url,
            conversation_id,
            activity.reply_to_id.as_deref(),
        );
        debug!("Posting {:?} activity to {}", activity.activity_type, url);

        let response = self
            .client
            .post(&url)
            .json(activity)
            .send()
            .await
            .map_err(|e| EngineError::Network(format!("Connector request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "Connector returned {}: {}",
                status,
                scrub(&body)
            )));
        }

        Ok(())
    }
}

/// Turn context that posts every reply back through the connector
#[derive(Debug)]
pub struct ConnectorTurnContext {
    client: ConnectorClient,
    activity: Activity,
    service_url: String,
    conversation_id: String,
}

impl ConnectorTurnContext {
    /// Fails when the activity has no `serviceUrl` or conversation id
    pub fn new(client: ConnectorClient, activity: Activity) -> Result<Self, EngineError> {
        let service_url = activity
            .service_url
            .clone()
            .ok_or_else(|| EngineError::InvalidActivity("activity has no serviceUrl".to_string()))?;
        let conversation_id = activity
            .conversation
            .as_ref()
            .map(|c| c.id.clone())
            .ok_or_else(|| {
                EngineError::InvalidActivity("activity has no conversation".to_string())
            })?;

        Ok(Self {
            client,
            activity,
            service_url,
            conversation_id,
        })
    }
}

#[async_trait]
impl TurnContext for ConnectorTurnContext {
    fn activity(&self) -> &Activity {
        &self.activity
    }

    async fn send_activity(&mut self, activity: Activity) -> Result<(), EngineError> {
        let reply = activity.reply_to(&self.activity);
        self.client
            .send_to_conversation(&self.service_url, &self.conversation_id, &reply)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::ChannelAccount;

    #[test]
    fn test_activities_url() {
        assert_eq!(
            ConnectorClient::activities_url("https://smba.example.com/", "conv-1", Some("act-9")),
            "https://smba.example.com/v3/conversations/conv-1/activities/act-9"
        );
        assert_eq!(
            ConnectorClient::activities_url("https://smba.example.com", "conv-1", None),
            "https://smba.example.com/v3/conversations/conv-1/activities"
        );
    }

    #[test]
    fn test_context_requires_service_url() {
        let activity = Activity::incoming_message("user-1", "bot", "Hello").with_conversation("c");
        let err = ConnectorTurnContext::new(ConnectorClient::new(), activity).unwrap_err();
        assert!(matches!(err, EngineError::InvalidActivity(_)));
    }

    #[test]
    fn test_context_requires_conversation() {
        let mut activity = Activity::members_added("bot", vec![ChannelAccount::new("user-1")]);
        activity.service_url = Some("http://localhost".to_string());
        let err = ConnectorTurnContext::new(ConnectorClient::new(), activity).unwrap_err();
        assert!(matches!(err, EngineError::InvalidActivity(_)));
    }
}
