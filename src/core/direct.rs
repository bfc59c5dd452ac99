//! Token 連結的直購流程：不需要登入，連結本身帶有 token、服務與國家。

use crate::core::catalog::{find_country, find_service};
use crate::core::polling::PollTarget;
use crate::domain::model::{Country, DirectOrder, OrderStatus, Service};
use crate::domain::ports::DirectBackend;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use url::Url;

pub const MISSING_DETAILS: &str = "Missing purchase details (token, service, or country).";
pub const START_FAILED: &str = "Failed to start purchase";
pub const CONNECTION_ERROR: &str = "Connection error";
pub const ORDER_CANCELLED: &str = "Order was cancelled";

/// `?token=...&service=...&country=...`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectLink {
    pub token: Option<String>,
    pub service_id: Option<String>,
    pub country_id: Option<String>,
}

impl DirectLink {
    pub fn new(
        token: Option<String>,
        service_id: Option<String>,
        country_id: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            token: non_empty(token),
            service_id: non_empty(service_id),
            country_id: non_empty(country_id),
        }
    }

    pub fn parse(link: &str) -> Result<Self> {
        let url = Url::parse(link).map_err(|e| AppError::ValidationError {
            message: format!("Invalid purchase link '{}': {}", link, e),
        })?;

        let mut token = None;
        let mut service_id = None;
        let mut country_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" => token = Some(value.into_owned()),
                "service" => service_id = Some(value.into_owned()),
                "country" => country_id = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(Self::new(token, service_id, country_id))
    }

    pub fn service(&self) -> Option<&'static Service> {
        self.service_id.as_deref().and_then(find_service)
    }

    pub fn country(&self) -> Option<&'static Country> {
        self.country_id.as_deref().and_then(find_country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectState {
    Idle,
    Generating,
    Waiting(DirectOrder),
    Received {
        order: DirectOrder,
        sms_code: Option<String>,
    },
    Error(String),
}

pub struct DirectPurchase<B> {
    backend: B,
    link: DirectLink,
    state: DirectState,
}

impl<B: DirectBackend> DirectPurchase<B> {
    pub fn new(backend: B, link: DirectLink) -> Self {
        Self {
            backend,
            link,
            state: DirectState::Idle,
        }
    }

    pub fn link(&self) -> &DirectLink {
        &self.link
    }

    pub fn state(&self) -> &DirectState {
        &self.state
    }

    /// 沒有 token 的連結無效
    pub fn has_access(&self) -> bool {
        self.link.token.is_some()
    }

    pub fn sms_code(&self) -> Option<&str> {
        match &self.state {
            DirectState::Received { sms_code, .. } => sms_code.as_deref(),
            _ => None,
        }
    }

    pub async fn start(&mut self) -> &DirectState {
        let (Some(token), Some(service_id), Some(country_id)) = (
            self.link.token.as_deref(),
            self.link.service_id.as_deref(),
            self.link.country_id.as_deref(),
        ) else {
            self.state = DirectState::Error(MISSING_DETAILS.to_string());
            return &self.state;
        };

        self.state = DirectState::Generating;
        let result = self
            .backend
            .direct_generate(token, service_id, country_id)
            .await;
        self.state = match result {
            Ok(order) => {
                tracing::info!("Direct order {} started", order.order_id);
                DirectState::Waiting(order)
            }
            Err(AppError::ApiError { message, .. }) => DirectState::Error(message),
            Err(AppError::Rejected { status }) => {
                tracing::warn!("Direct generate rejected with {}", status);
                DirectState::Error(START_FAILED.to_string())
            }
            Err(AppError::HttpError(e)) => {
                tracing::warn!("Direct generate failed: {}", e);
                DirectState::Error(CONNECTION_ERROR.to_string())
            }
            Err(e) => {
                tracing::warn!("Direct generate failed: {}", e);
                DirectState::Error(START_FAILED.to_string())
            }
        };
        &self.state
    }

    /// 單次狀態檢查；received / cancelled 進入終止狀態
    pub async fn check_once(&mut self) -> Result<()> {
        let DirectState::Waiting(order) = &self.state else {
            return Ok(());
        };
        let Some(token) = self.link.token.as_deref() else {
            return Ok(());
        };

        let status = self.backend.direct_status(token, &order.order_id).await?;
        match status.order_status() {
            OrderStatus::Received => {
                let order = order.clone();
                tracing::info!("SMS received for direct order {}", order.order_id);
                self.state = DirectState::Received {
                    order,
                    sms_code: status.sms_code,
                };
            }
            OrderStatus::Cancelled => {
                self.state = DirectState::Error(ORDER_CANCELLED.to_string());
            }
            OrderStatus::Waiting => {}
        }
        Ok(())
    }
}

#[async_trait]
impl<B: DirectBackend> PollTarget for DirectPurchase<B> {
    fn is_settled(&self) -> bool {
        !matches!(self.state, DirectState::Waiting(_))
    }

    async fn poll_once(&mut self) -> Result<()> {
        self.check_once().await
    }

    fn label(&self) -> &str {
        "direct purchase"
    }
}
