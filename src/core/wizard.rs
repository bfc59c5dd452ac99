use crate::core::catalog::{
    default_country, filter, find_country, find_service, COUNTRIES, SERVICES,
};
use crate::core::concierge::order_link;
use crate::core::currency::CurrencySelector;
use crate::domain::model::{Country, Service};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    ChooseService,
    ChooseCountry,
}

/// 開啟時可帶入的初始值（來自目前的 URL 或命令列）
#[derive(Debug, Clone, Default)]
pub struct WizardSeed<'a> {
    pub service_id: Option<&'a str>,
    pub country_id: Option<&'a str>,
    pub detected_country: Option<&'a str>,
}

/// 結帳時的帳號狀態：已登入且剩餘配額
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountStanding {
    pub authenticated: bool,
    pub remaining: i64,
}

impl AccountStanding {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            remaining: 0,
        }
    }

    pub fn can_generate(&self) -> bool {
        self.authenticated && self.remaining > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Checkout {
    /// 人工流程：開啟 WhatsApp 連結
    Concierge { url: String, price: String },
    /// 已登入：呼叫 generate-number 後前往儀表板
    Generate {
        service: &'static Service,
        country: &'static Country,
        price: String,
    },
}

/// 兩步驟選購：先選服務，再選國家
#[derive(Debug, Clone)]
pub struct CatalogWizard {
    open: bool,
    step: WizardStep,
    service: Option<&'static Service>,
    country: Option<&'static Country>,
    service_query: String,
    country_query: String,
}

impl Default for CatalogWizard {
    fn default() -> Self {
        Self {
            open: false,
            step: WizardStep::ChooseService,
            service: None,
            country: None,
            service_query: String::new(),
            country_query: String::new(),
        }
    }
}

impl CatalogWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selected_service(&self) -> Option<&'static Service> {
        self.service
    }

    pub fn selected_country(&self) -> Option<&'static Country> {
        self.country
    }

    /// 已知服務直接跳到第二步；國家依序取初始值、定位結果、預設 Kenya
    pub fn open(&mut self, seed: WizardSeed<'_>) {
        self.open = true;

        if let Some(service) = seed.service_id.and_then(find_service) {
            self.service = Some(service);
            self.step = WizardStep::ChooseCountry;
        }

        let seeded = match (seed.country_id, seed.detected_country) {
            (Some(code), _) => find_country(code),
            (None, Some(detected)) => find_country(detected),
            (None, None) => None,
        };
        if let Some(country) = seeded {
            self.country = Some(country);
        }
        if self.country.is_none() {
            self.country = Some(default_country());
        }
    }

    /// 關閉時重設步驟、服務與搜尋字串；國家保留
    pub fn close(&mut self) {
        self.open = false;
        self.step = WizardStep::ChooseService;
        self.service = None;
        self.service_query.clear();
        self.country_query.clear();
    }

    pub fn set_service_query(&mut self, query: impl Into<String>) {
        self.service_query = query.into();
    }

    pub fn set_country_query(&mut self, query: impl Into<String>) {
        self.country_query = query.into();
    }

    pub fn visible_services(&self) -> Vec<&'static Service> {
        filter(SERVICES, &self.service_query)
    }

    pub fn visible_countries(&self) -> Vec<&'static Country> {
        filter(COUNTRIES, &self.country_query)
    }

    pub fn select_service(&mut self, id: &str) -> Result<&'static Service> {
        let service = find_service(id).ok_or_else(|| AppError::NotFound {
            kind: "service".to_string(),
            id: id.to_string(),
        })?;
        self.service = Some(service);
        self.step = WizardStep::ChooseCountry;
        Ok(service)
    }

    pub fn select_country(&mut self, code: &str) -> Result<&'static Country> {
        let country = find_country(code).ok_or_else(|| AppError::NotFound {
            kind: "country".to_string(),
            id: code.to_string(),
        })?;
        self.country = Some(country);
        Ok(country)
    }

    /// 決定下單方式；尚未選齊時回傳 ValidationError
    pub fn checkout(
        &self,
        currency: &CurrencySelector,
        standing: AccountStanding,
        whatsapp_contact: &str,
    ) -> Result<Checkout> {
        let (Some(service), Some(country)) = (self.service, self.country) else {
            return Err(AppError::ValidationError {
                message: "Pick an app and a country first".to_string(),
            });
        };

        let price = currency.format_price(service);
        if standing.can_generate() {
            return Ok(Checkout::Generate {
                service,
                country,
                price,
            });
        }

        Ok(Checkout::Concierge {
            url: order_link(whatsapp_contact, service, country, currency.currency()),
            price,
        })
    }
}
