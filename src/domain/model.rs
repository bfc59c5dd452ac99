use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Social,
    Messenger,
    Other,
}

/// 目錄中的服務（WhatsApp、Telegram…），價格以 KES 與 USD 表示
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub price: u32,
    pub price_usd: u32,
    pub category: ServiceCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub dial_code: &'static str,
    pub flag: &'static str,
}

/// 有名稱即可被目錄篩選
pub trait Named {
    fn display_name(&self) -> &str;
}

impl Named for Service {
    fn display_name(&self) -> &str {
        self.name
    }
}

impl Named for Country {
    fn display_name(&self) -> &str {
        self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Waiting,
    Received,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Received => "received",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 後端擁有的訂單；客戶端只讀取與輪詢
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub service_id: String,
    pub country_id: String,
    pub phone_number: String,
    pub order_id_provider: String,
    pub status: OrderStatus,
    pub sms_code: Option<String>,
    pub timestamp: String,
}

impl Order {
    pub fn is_waiting(&self) -> bool {
        self.status == OrderStatus::Waiting
    }

    /// 後端時間戳可能是 RFC 3339 或 `YYYY-MM-DD HH:MM:SS`
    pub fn placed_at(&self) -> Option<chrono::NaiveDateTime> {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.naive_utc())
            .or_else(|_| {
                chrono::NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S")
            })
            .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub allowed: i64,
    pub used: i64,
}

impl Quota {
    pub fn remaining(&self) -> i64 {
        self.allowed - self.used
    }

    pub fn can_generate(&self) -> bool {
        self.remaining() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub quota: Quota,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub service_id: &'a str,
    pub country_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectGenerateRequest<'a> {
    pub token: &'a str,
    pub service_id: &'a str,
    pub country_id: &'a str,
}

/// `/api/direct/generate` 成功回應
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectOrder {
    pub order_id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// `/api/direct/status` 回應；status 以字串保留，未知值視為仍在等待
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sms_code: Option<String>,
}

impl DirectStatus {
    pub fn order_status(&self) -> OrderStatus {
        match self.status.as_deref() {
            Some("received") => OrderStatus::Received,
            Some("cancelled") => OrderStatus::Cancelled,
            _ => OrderStatus::Waiting,
        }
    }
}

/// 錯誤回應本體 `{message}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "KES")]
    Kes,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn toggled(self) -> Self {
        match self {
            Currency::Kes => Currency::Usd,
            Currency::Usd => Currency::Kes,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Kes => "KES",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KES" | "KSH" => Ok(Currency::Kes),
            "USD" | "$" => Ok(Currency::Usd),
            other => Err(format!("unsupported currency '{}', expected KES or USD", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_backend_shape() {
        let json = serde_json::json!({
            "id": 7,
            "service_id": "wa",
            "country_id": "KE",
            "phone_number": "+254700000001",
            "order_id_provider": "prov-7",
            "status": "waiting",
            "sms_code": null,
            "timestamp": "2026-03-01 10:15:00"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.status, OrderStatus::Waiting);
        assert!(order.sms_code.is_none());
        assert!(order.placed_at().is_some());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Waiting.is_terminal());
        assert!(OrderStatus::Received.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_quota_remaining_and_gate() {
        let quota = Quota { allowed: 3, used: 1 };
        assert_eq!(quota.remaining(), 2);
        assert!(quota.can_generate());

        let spent = Quota { allowed: 3, used: 3 };
        assert_eq!(spent.remaining(), 0);
        assert!(!spent.can_generate());

        let over = Quota { allowed: 1, used: 4 };
        assert_eq!(over.remaining(), -3);
        assert!(!over.can_generate());
    }

    #[test]
    fn test_direct_status_unknown_is_waiting() {
        let status: DirectStatus =
            serde_json::from_value(serde_json::json!({"status": "pending"})).unwrap();
        assert_eq!(status.order_status(), OrderStatus::Waiting);

        let received: DirectStatus =
            serde_json::from_value(serde_json::json!({"status": "received", "sms_code": "123456"}))
                .unwrap();
        assert_eq!(received.order_status(), OrderStatus::Received);
    }

    #[test]
    fn test_currency_toggle_and_parse() {
        assert_eq!(Currency::default(), Currency::Kes);
        assert_eq!(Currency::Kes.toggled(), Currency::Usd);
        assert_eq!(Currency::Usd.toggled(), Currency::Kes);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("EUR".parse::<Currency>().is_err());
    }
}
