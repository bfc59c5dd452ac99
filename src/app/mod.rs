//! 組裝：依設定建立各個 adapter，並交給核心流程使用。

use crate::adapters::geo::{GeoClient, NoGeo};
use crate::adapters::http::ApiClient;
use crate::adapters::sms_text::SmsTextGenerator;
use crate::adapters::webhook::SignupWebhook;
use crate::config::cli::LocalStorage;
use crate::core::currency::CurrencySelector;
use crate::core::dashboard::Dashboard;
use crate::core::direct::{DirectLink, DirectPurchase};
use crate::core::session::SessionManager;
use crate::core::signup::SignupFlow;
use crate::domain::model::Currency;
use crate::domain::ports::{ConfigProvider, GeoLookup};
use crate::utils::error::Result;
use std::time::Duration;

/// 定位查詢不應拖慢啟動
const GEO_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AppContext {
    api: ApiClient,
    storage: LocalStorage,
    geo: Box<dyn GeoLookup>,
    sms_text: SmsTextGenerator,
    webhook: SignupWebhook,
    whatsapp_contact: String,
}

impl AppContext {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let timeout = config.request_timeout();
        let api = ApiClient::new(config.api_base_url(), timeout)?;
        let storage = LocalStorage::new(config.session_dir());

        let geo: Box<dyn GeoLookup> = if config.geo_enabled() {
            Box::new(GeoClient::new(config.geo_endpoint(), GEO_TIMEOUT.min(timeout))?)
        } else {
            Box::new(NoGeo)
        };

        let sms_text = SmsTextGenerator::new(
            config.sms_text_endpoint(),
            config.sms_text_model(),
            config.sms_text_api_key().map(str::to_string),
            timeout,
        )?;
        let webhook = SignupWebhook::new(config.signup_webhook_url().to_string(), timeout)?;

        tracing::debug!(
            "App context ready (api: {}, session dir: {})",
            config.api_base_url(),
            config.session_dir()
        );

        Ok(Self {
            api,
            storage,
            geo,
            sms_text,
            webhook,
            whatsapp_contact: config.whatsapp_contact().to_string(),
        })
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn sms_text(&self) -> &SmsTextGenerator {
        &self.sms_text
    }

    pub fn webhook(&self) -> &SignupWebhook {
        &self.webhook
    }

    pub fn whatsapp_contact(&self) -> &str {
        &self.whatsapp_contact
    }

    /// 建立 session 並從儲存還原
    pub async fn session(&self) -> Result<SessionManager<LocalStorage, ApiClient>> {
        let mut session = SessionManager::new(self.storage.clone(), self.api.clone());
        session.restore().await?;
        Ok(session)
    }

    pub fn dashboard(&self, token: &str) -> Dashboard<ApiClient> {
        Dashboard::new(self.api.clone(), token)
    }

    pub fn direct_purchase(&self, link: DirectLink) -> DirectPurchase<ApiClient> {
        DirectPurchase::new(self.api.clone(), link)
    }

    pub fn signup(&self) -> SignupFlow<LocalStorage> {
        SignupFlow::new(self.storage.clone())
    }

    /// 指定幣別時不查詢定位；否則依 IP 判斷
    pub async fn currency(&self, forced: Option<Currency>) -> CurrencySelector {
        match forced {
            Some(currency) => CurrencySelector::new(currency),
            None => {
                let mut selector = CurrencySelector::default();
                selector.detect(self.geo.as_ref()).await;
                selector
            }
        }
    }
}
