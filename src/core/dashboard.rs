use crate::core::catalog::{find_country_for_order, find_service};
use crate::core::polling::PollTarget;
use crate::domain::model::{Order, Quota};
use crate::domain::ports::{AccountBackend, OrderBackend};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use futures_util::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshReport {
    pub checked: usize,
    pub failed: usize,
}

/// 已登入使用者的訂單列表與批次狀態刷新
pub struct Dashboard<B> {
    backend: B,
    token: String,
    orders: Vec<Order>,
    quota: Option<Quota>,
}

impl<B: OrderBackend + AccountBackend> Dashboard<B> {
    pub fn new(backend: B, token: impl Into<String>) -> Self {
        Self {
            backend,
            token: token.into(),
            orders: Vec::new(),
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: Option<Quota>) -> Self {
        self.quota = quota;
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn quota(&self) -> Option<Quota> {
        self.quota
    }

    pub fn waiting_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_waiting())
    }

    pub fn has_waiting(&self) -> bool {
        self.waiting_orders().next().is_some()
    }

    /// 失敗時保留原本的列表
    pub async fn fetch_orders(&mut self) -> Result<()> {
        self.orders = self.backend.list_orders(&self.token).await?;
        tracing::debug!("Loaded {} orders", self.orders.len());
        Ok(())
    }

    pub async fn refresh_quota(&mut self) -> Result<()> {
        self.quota = Some(self.backend.fetch_quota(&self.token).await?);
        Ok(())
    }

    /// 刷新單一訂單；成功後重新載入列表與配額
    pub async fn check_status(&mut self, provider_order_id: &str) -> Result<()> {
        self.backend
            .check_order_status(&self.token, provider_order_id)
            .await?;
        self.reload_after_check().await;
        Ok(())
    }

    /// 同時檢查所有等待中的訂單
    pub async fn refresh_all(&mut self) -> RefreshReport {
        let waiting: Vec<String> = self
            .waiting_orders()
            .map(|o| o.order_id_provider.clone())
            .collect();
        if waiting.is_empty() {
            return RefreshReport::default();
        }

        let backend = &self.backend;
        let token = self.token.as_str();
        let results = join_all(
            waiting
                .iter()
                .map(|id| async move { (id, backend.check_order_status(token, id).await) }),
        )
        .await;

        let mut report = RefreshReport {
            checked: results.len(),
            failed: 0,
        };
        for (id, result) in &results {
            if let Err(e) = result {
                report.failed += 1;
                tracing::warn!("Failed to check status of {}: {}", id, e);
            }
        }

        if report.failed < report.checked {
            self.reload_after_check().await;
        }
        report
    }

    async fn reload_after_check(&mut self) {
        if let Err(e) = self.fetch_orders().await {
            tracing::warn!("Failed to fetch orders: {}", e);
        }
        if let Err(e) = self.refresh_quota().await {
            tracing::warn!("Failed to refresh quota: {}", e);
        }
    }
}

#[async_trait]
impl<B: OrderBackend + AccountBackend> PollTarget for Dashboard<B> {
    fn is_settled(&self) -> bool {
        !self.has_waiting()
    }

    async fn poll_once(&mut self) -> Result<()> {
        let report = self.refresh_all().await;
        if report.checked > 0 && report.failed == report.checked {
            return Err(AppError::ApiError {
                status: 0,
                message: format!("all {} status checks failed", report.checked),
            });
        }
        Ok(())
    }

    fn label(&self) -> &str {
        "dashboard"
    }
}

/// 列表顯示用的一行摘要
pub fn describe_order(order: &Order) -> String {
    let service = find_service(&order.service_id)
        .map(|s| s.name.to_string())
        .unwrap_or_else(|| order.service_id.clone());
    let country = find_country_for_order(&order.country_id)
        .map(|c| format!("{} {}", c.flag, c.name))
        .unwrap_or_else(|| order.country_id.clone());
    let code = match (&order.sms_code, order.is_waiting()) {
        (Some(code), _) => code.clone(),
        (None, true) => "Waiting for SMS...".to_string(),
        (None, false) => "-".to_string(),
    };
    let placed = order
        .placed_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| order.timestamp.clone());
    format!(
        "#{:<5} {:<16} {:<10} {:<22} {:<16} {:<9} {}",
        order.id, placed, service, country, order.phone_number, order.status, code
    )
}

/// 訂單列表轉為 CSV（含標題列）
pub fn orders_csv(orders: &[Order]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for order in orders {
        writer.serialize(order)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::IoError(e.into_error()))
}
