use crate::domain::model::{
    Credentials, DirectGenerateRequest, DirectOrder, DirectStatus, ErrorBody, GenerateRequest,
    LoginResponse, MeResponse, Order, Quota,
};
use crate::domain::ports::{AccountBackend, DirectBackend, OrderBackend};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// 轉售商後端 REST API 的客戶端
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        tracing::debug!("{} {}", response.status(), response.url().path());
        Ok(response)
    }

    /// 成功回應解析為 `T`；401 為 Unauthorized；其餘取 `{message}`
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        Self::check_status(response, true).await
    }

    /// `expires_session` 為 false 時，401 與其他錯誤一樣帶回伺服器訊息
    async fn check_status(response: Response, expires_session: bool) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if expires_session && status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        tracing::debug!("API error {}: {:?}", status, message);
        Err(match message {
            Some(message) => AppError::ApiError {
                status: status.as_u16(),
                message,
            },
            None => AppError::Rejected {
                status: status.as_u16(),
            },
        })
    }
}

#[async_trait]
impl AccountBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response = self
            .send(self.client.post(self.url("/api/login")).json(credentials))
            .await?;
        // 登入失敗的 401 是帳密錯誤，不是 session 過期
        let response = Self::check_status(response, false).await?;
        Ok(response.json().await?)
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .send(self.client.post(self.url("/api/register")).json(credentials))
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_quota(&self, token: &str) -> Result<Quota> {
        let response = self
            .send(self.client.get(self.url("/api/me")).bearer_auth(token))
            .await?;
        let me: MeResponse = Self::decode(response).await?;
        Ok(me.quota)
    }

    async fn generate_number(
        &self,
        token: &str,
        service_id: &str,
        country_id: &str,
    ) -> Result<Order> {
        let body = GenerateRequest {
            service_id,
            country_id,
        };
        let response = self
            .send(
                self.client
                    .post(self.url("/api/generate-number"))
                    .bearer_auth(token)
                    .json(&body),
            )
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl OrderBackend for ApiClient {
    async fn list_orders(&self, token: &str) -> Result<Vec<Order>> {
        let response = self
            .send(self.client.get(self.url("/api/orders")).bearer_auth(token))
            .await?;
        Self::decode(response).await
    }

    async fn check_order_status(&self, token: &str, provider_order_id: &str) -> Result<()> {
        let path = format!("/api/order/{}/status", provider_order_id);
        let response = self
            .send(self.client.get(self.url(&path)).bearer_auth(token))
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectBackend for ApiClient {
    async fn direct_generate(
        &self,
        token: &str,
        service_id: &str,
        country_id: &str,
    ) -> Result<DirectOrder> {
        let body = DirectGenerateRequest {
            token,
            service_id,
            country_id,
        };
        let response = self
            .send(self.client.post(self.url("/api/direct/generate")).json(&body))
            .await?;
        // 連結 token 無效的 401 帶有伺服器訊息
        let response = Self::check_status(response, false).await?;
        Ok(response.json().await?)
    }

    async fn direct_status(&self, token: &str, order_id: &str) -> Result<DirectStatus> {
        let response = self
            .send(
                self.client
                    .get(self.url("/api/direct/status"))
                    .query(&[("token", token), ("order_id", order_id)]),
            )
            .await?;
        Self::decode(response).await
    }
}
