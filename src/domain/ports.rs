use crate::domain::model::{
    Credentials, DirectOrder, DirectStatus, LoginResponse, Order, Quota,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 持久化的鍵值檔案（對應瀏覽器 localStorage）
pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn whatsapp_contact(&self) -> &str;
    fn geo_endpoint(&self) -> &str;
    fn geo_enabled(&self) -> bool;
    fn session_dir(&self) -> &str;
    fn sms_text_endpoint(&self) -> &str;
    fn sms_text_model(&self) -> &str;
    fn sms_text_api_key(&self) -> Option<&str>;
    fn signup_webhook_url(&self) -> &str;
}

/// 帳號相關端點：登入、註冊、配額與產生號碼
#[async_trait]
pub trait AccountBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;
    async fn register(&self, credentials: &Credentials) -> Result<()>;
    async fn fetch_quota(&self, token: &str) -> Result<Quota>;
    async fn generate_number(&self, token: &str, service_id: &str, country_id: &str)
        -> Result<Order>;
}

#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn list_orders(&self, token: &str) -> Result<Vec<Order>>;
    /// 觸發後端刷新該訂單狀態；回應本體不使用
    async fn check_order_status(&self, token: &str, provider_order_id: &str) -> Result<()>;
}

/// 一次性連結 token 的直購流程
#[async_trait]
pub trait DirectBackend: Send + Sync {
    async fn direct_generate(
        &self,
        token: &str,
        service_id: &str,
        country_id: &str,
    ) -> Result<DirectOrder>;
    async fn direct_status(&self, token: &str, order_id: &str) -> Result<DirectStatus>;
}

#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// 以 IP 推斷的 ISO 國碼；服務未回傳時為 `None`
    async fn country_code(&self) -> Result<Option<String>>;
}
