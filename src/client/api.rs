// HTTP client for the auth and user endpoints

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::auth::models::{
    AuthResponse, LoginRequest, RegisterRequest, UserEnvelope, ValidateResponse,
};
use crate::auth::token::{Claims, TokenPair};
use crate::client::error::ClientError;
use crate::response::ApiResponse;
use crate::users::UserResponse;

/// Default API location, matching the server's default port
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Thin typed wrapper over the JSON envelope API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and unwraps the envelope
    ///
    /// Failure envelopes become `ClientError::Api`, carrying the server's
    /// message so callers can show it as is.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status,
                    code: None,
                    message: status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string(),
                })
            }
            Err(e) => return Err(ClientError::InvalidResponse(e.to_string())),
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status,
                code: envelope.code,
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "Request failed".to_string()),
            });
        }
        Ok(envelope.data)
    }

    async fn send_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .ok_or_else(|| ClientError::InvalidResponse("missing data".to_string()))
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send_data(self.http.post(self.url("/api/auth/login")).json(credentials))
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.send_data(self.http.post(self.url("/api/auth/register")).json(request))
            .await
    }

    pub async fn me(&self, access_token: &str) -> Result<UserResponse, ClientError> {
        let envelope: UserEnvelope = self
            .send_data(
                self.http
                    .get(self.url("/api/auth/me"))
                    .bearer_auth(access_token),
            )
            .await?;
        Ok(envelope.user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        self.send_data(
            self.http
                .post(self.url("/api/auth/refresh"))
                .json(&json!({ "refreshToken": refresh_token })),
        )
        .await
    }

    pub async fn validate(&self, token: &str) -> Result<Claims, ClientError> {
        let response: ValidateResponse = self
            .send_data(
                self.http
                    .post(self.url("/api/auth/validate"))
                    .json(&json!({ "token": token })),
            )
            .await?;
        Ok(response.payload)
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), ClientError> {
        self.send::<Value>(
            self.http
                .post(self.url("/api/auth/logout"))
                .bearer_auth(access_token),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3001/");
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(client.url("/api/auth/me"), "http://localhost:3001/api/auth/me");
        assert_eq!(ApiClient::default().base_url(), DEFAULT_BASE_URL);
    }
}
