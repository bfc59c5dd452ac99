use crate::domain::ports::GeoLookup;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country_code: Option<String>,
}

/// 以 IP 查詢訪客所在國家（ipapi.co 格式）
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: Client,
    endpoint: String,
}

impl GeoClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl GeoLookup for GeoClient {
    async fn country_code(&self) -> Result<Option<String>> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ApiError {
                status: status.as_u16(),
                message: format!("location lookup failed with {}", status),
            });
        }

        let body: GeoResponse = response.json().await?;
        Ok(body
            .country_code
            .map(|code| code.trim().to_ascii_uppercase())
            .filter(|code| !code.is_empty()))
    }
}

/// 停用定位時使用，永遠回傳未知
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeo;

#[async_trait]
impl GeoLookup for NoGeo {
    async fn country_code(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
