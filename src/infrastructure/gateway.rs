#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header;
use reqwest::Method;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::models::GatewayError;
use crate::domain::services::SessionManager;

/// Pulls the human readable reason out of an error body. The backend uses
/// `detail` (plain or as a validation list), the dashboard API `message`.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(detail) = value.get("detail") {
        if let Some(text) = detail.as_str() {
            return Some(text.to_string());
        }
        if let Some(first) = detail.as_array().and_then(|e| return e.first()) {
            if let Some(msg) = first.get("msg").and_then(|e| return e.as_str()) {
                return Some(msg.to_string());
            }
        }
    }

    return value
        .get("message")
        .and_then(|e| return e.as_str())
        .map(|e| return e.to_string());
}

/// Every backend call goes through here.
pub struct RequestGateway {
    url: String,
    client: reqwest::Client,
    session: Arc<SessionManager>,
}

impl RequestGateway {
    pub fn new(url: &str, timeout: Duration, session: Arc<SessionManager>) -> Result<RequestGateway> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        return Ok(RequestGateway {
            url: url.trim_end_matches('/').to_string(),
            client,
            session,
        });
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        return self.send::<Value, T>(Method::GET, path, &[], None).await;
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, GatewayError> {
        return self.send::<Value, T>(Method::GET, path, query, None).await;
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        return self.send(Method::POST, path, &[], Some(body)).await;
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        return self.send(Method::PATCH, path, &[], Some(body)).await;
    }

    pub async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        self.send::<Value, Value>(Method::DELETE, path, &[], None)
            .await?;
        return Ok(());
    }

    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut req = self
            .client
            .request(method.clone(), format!("{url}{path}", url = self.url))
            .header(header::CONTENT_TYPE, "application/json");

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        if let Some(payload) = body {
            req = req.json(payload);
        }

        tracing::debug!(method = %method, path = path, "Backend request");

        let res = match req.send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, path = path, "Backend is not reachable");
                return Err(GatewayError::NetworkError(err.to_string()));
            }
        };

        let status = res.status();
        let text = match res.text().await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = ?err, path = path, "Response body was cut off");
                return Err(GatewayError::NetworkError(err.to_string()));
            }
        };

        if status.is_success() {
            let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str::<T>(payload).map_err(|err| {
                tracing::error!(error = ?err, path = path, "Undecodable response body");
                return GatewayError::RequestFailed {
                    status: status.as_u16(),
                    message: format!("Invalid response body: {err}"),
                };
            });
        }

        let message = server_message(&text);
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = path, "Credential rejected");
            self.session.handle_unauthorized();
            return Err(GatewayError::Unauthorized {
                message: message.unwrap_or_else(|| return "Login expired".to_string()),
            });
        }

        tracing::error!(status = status.as_u16(), path = path, "Backend request failed");
        return Err(GatewayError::RequestFailed {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| return "Request failed".to_string()),
        });
    }
}
