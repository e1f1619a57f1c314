use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::threads::dtos::{
    CreateThreadDto, ListThreadsQuery, ThreadResponseDto, UpdateThreadDto,
};
use crate::shared::types::{ApiResponse, Meta};

/// Typed HTTP client for the thread API: the same contract the server
/// serves, for programmatic consumers and integration tests.
#[allow(dead_code)]
pub struct ThreadsClient {
    base_url: String,
    token: String,
    http_client: reqwest::Client,
}

#[allow(dead_code)]
impl ThreadsClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unwrap the ApiResponse envelope, surfacing its message on failure
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>> {
        let status = response.status();
        let envelope = response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Invalid response body: {}", e)))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string());
            return Err(match status {
                StatusCode::NOT_FOUND => AppError::NotFound(message),
                StatusCode::BAD_REQUEST => AppError::BadRequest(message),
                StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
                _ => AppError::ExternalServiceError(message),
            });
        }

        Ok(envelope)
    }

    pub async fn create(&self, dto: &CreateThreadDto) -> Result<ThreadResponseDto> {
        let response = self
            .http_client
            .post(self.url("/api/threads"))
            .bearer_auth(&self.token)
            .json(dto)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        let envelope = Self::read_envelope::<ThreadResponseDto>(response).await?;
        envelope
            .data
            .ok_or_else(|| AppError::ExternalServiceError("Missing thread in response".to_string()))
    }

    pub async fn get(&self, id: Uuid) -> Result<ThreadResponseDto> {
        let response = self
            .http_client
            .get(self.url(&format!("/api/threads/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        let envelope = Self::read_envelope::<ThreadResponseDto>(response).await?;
        envelope
            .data
            .ok_or_else(|| AppError::ExternalServiceError("Missing thread in response".to_string()))
    }

    pub async fn list(&self, query: &ListThreadsQuery) -> Result<(Vec<ThreadResponseDto>, Meta)> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(ref search) = query.search {
            params.push(("search", search.clone()));
        }
        params.push((
            "order_by",
            serde_json::to_value(query.order_by)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_else(|| "updated_at".to_string()),
        ));
        params.push((
            "sort_order",
            serde_json::to_value(query.sort_order)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_else(|| "desc".to_string()),
        ));

        let response = self
            .http_client
            .get(self.url("/api/threads"))
            .query(&params)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        let envelope = Self::read_envelope::<Vec<ThreadResponseDto>>(response).await?;
        let meta = envelope
            .meta
            .ok_or_else(|| AppError::ExternalServiceError("Missing meta in response".to_string()))?;
        Ok((envelope.data.unwrap_or_default(), meta))
    }

    pub async fn update(&self, id: Uuid, dto: &UpdateThreadDto) -> Result<ThreadResponseDto> {
        let response = self
            .http_client
            .put(self.url(&format!("/api/threads/{}", id)))
            .bearer_auth(&self.token)
            .json(dto)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        let envelope = Self::read_envelope::<ThreadResponseDto>(response).await?;
        envelope
            .data
            .ok_or_else(|| AppError::ExternalServiceError("Missing thread in response".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url(&format!("/api/threads/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        Self::read_envelope::<()>(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::threads::routes;
    use crate::features::threads::services::ThreadService;
    use crate::modules::storage::MemoryThreadStore;
    use crate::shared::test_helpers::{test_user_context, with_user_context};
    use std::future::IntoFuture;
    use std::sync::Arc;

    /// Spawn the thread routes on an ephemeral port and return a client
    /// pointed at it. Auth is injected by the test middleware; the bearer
    /// token is carried but not checked.
    async fn spawn_server() -> ThreadsClient {
        let service = Arc::new(ThreadService::new(Arc::new(MemoryThreadStore::new())));
        let app = with_user_context(routes::routes(service), test_user_context());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(axum::serve(listener, app).into_future());

        ThreadsClient::new(format!("http://{}", addr), "test-token")
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let client = spawn_server().await;

        let created = client
            .create(&CreateThreadDto {
                title: Some("from the client".to_string()),
                metadata: None,
            })
            .await
            .unwrap();
        assert_eq!(created.title.as_deref(), Some("from the client"));

        let fetched = client.get(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);

        let updated = client
            .update(
                created.id,
                &UpdateThreadDto {
                    title: Some("renamed".to_string()),
                    metadata: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("renamed"));

        let (threads, meta) = client.list(&ListThreadsQuery::default()).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(meta.total, 1);
        assert_eq!(meta.has_more, Some(false));

        client.delete(created.id).await.unwrap();
        assert!(matches!(
            client.get(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_client_surfaces_envelope_errors() {
        let client = spawn_server().await;

        let err = client.get(Uuid::nil()).await.unwrap_err();
        match err {
            AppError::NotFound(message) => assert!(message.contains("not found")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
