use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::core::config::AssistantConfig;
use crate::core::error::{AppError, Result};

/// Reply streamed when no runtime is configured
const MOCK_REPLY: &str =
    "This is a mock assistant reply. Configure ASSISTANT_RUNTIME_URL to connect a real runtime.";

/// One event in a chat response stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Delta { text: String },
    Completed { thread_id: Uuid },
}

#[derive(Debug, Deserialize)]
struct RuntimeSyncResponse {
    reply: String,
}

/// Pass-through to the external assistant runtime. Without a configured
/// runtime URL every chat gets a canned mock reply, so the thread API stays
/// usable in deployments that have not wired up an assistant yet.
pub struct AssistantRuntimeService {
    runtime_url: Option<String>,
    http_client: reqwest::Client,
}

impl AssistantRuntimeService {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            runtime_url: config
                .runtime_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.runtime_url.is_none()
    }

    /// Start a streaming chat; events arrive on the returned receiver and the
    /// stream always ends with `Completed`
    pub async fn chat_stream(
        &self,
        thread_id: Uuid,
        message: &str,
    ) -> Result<mpsc::Receiver<ChatEvent>> {
        match &self.runtime_url {
            None => Ok(Self::mock_stream(thread_id)),
            Some(url) => self.forward_stream(url, thread_id, message).await,
        }
    }

    /// Single-shot chat; returns the full reply text
    pub async fn chat_sync(&self, thread_id: Uuid, message: &str) -> Result<String> {
        let url = match &self.runtime_url {
            None => return Ok(MOCK_REPLY.to_string()),
            Some(url) => url,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/sync", url))
            .json(&json!({ "thread_id": thread_id, "message": message }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Assistant runtime unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Assistant runtime returned {}",
                response.status()
            )));
        }

        let body: RuntimeSyncResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid assistant runtime response: {}", e))
        })?;

        Ok(body.reply)
    }

    fn mock_stream(thread_id: Uuid) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            for word in MOCK_REPLY.split_inclusive(' ') {
                if tx
                    .send(ChatEvent::Delta {
                        text: word.to_string(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = tx.send(ChatEvent::Completed { thread_id }).await;
        });

        rx
    }

    async fn forward_stream(
        &self,
        url: &str,
        thread_id: Uuid,
        message: &str,
    ) -> Result<mpsc::Receiver<ChatEvent>> {
        let response = self
            .http_client
            .post(format!("{}/chat", url))
            .json(&json!({ "thread_id": thread_id, "message": message }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Assistant runtime unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Assistant runtime returned {}",
                response.status()
            )));
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes).to_string();
                        if text.is_empty() {
                            continue;
                        }
                        if tx.send(ChatEvent::Delta { text }).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        // Client already has partial output; terminate the stream
                        warn!("Assistant runtime stream error: {}", e);
                        break;
                    }
                }
            }
            let _ = tx.send(ChatEvent::Completed { thread_id }).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_service() -> AssistantRuntimeService {
        AssistantRuntimeService::new(&AssistantConfig {
            runtime_url: None,
            rate_limit_max_requests: 30,
            rate_limit_window_secs: 3600,
        })
    }

    #[tokio::test]
    async fn test_mock_stream_terminates_with_completion() {
        let service = mock_service();
        assert!(service.is_mock());

        let thread_id = Uuid::now_v7();
        let mut rx = service.chat_stream(thread_id, "hello").await.unwrap();

        let mut reply = String::new();
        let mut completed = None;
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Delta { text } => reply.push_str(&text),
                ChatEvent::Completed { thread_id } => completed = Some(thread_id),
            }
        }

        assert_eq!(reply, MOCK_REPLY);
        assert_eq!(completed, Some(thread_id));
    }

    #[tokio::test]
    async fn test_mock_sync_matches_streamed_reply() {
        let service = mock_service();
        let reply = service.chat_sync(Uuid::now_v7(), "hello").await.unwrap();
        assert_eq!(reply, MOCK_REPLY);
    }
}
