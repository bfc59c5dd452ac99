use crate::domain::model::{Currency, Service};
use crate::domain::ports::GeoLookup;

/// 目前顯示幣別，並記住地理定位偵測到的國家
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencySelector {
    currency: Currency,
    detected_country: Option<String>,
}

impl CurrencySelector {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            detected_country: None,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn detected_country(&self) -> Option<&str> {
        self.detected_country.as_deref()
    }

    pub fn toggle(&mut self) -> Currency {
        self.currency = self.currency.toggled();
        self.currency
    }

    /// KE 用 KES，其他國家用 USD
    pub fn apply_detected_country(&mut self, country_code: &str) {
        self.currency = if country_code == "KE" {
            Currency::Kes
        } else {
            Currency::Usd
        };
        self.detected_country = Some(country_code.to_string());
    }

    /// 盡力而為：查詢失敗只記錄，不改變目前幣別
    pub async fn detect<G: GeoLookup + ?Sized>(&mut self, geo: &G) {
        match geo.country_code().await {
            Ok(Some(code)) => {
                tracing::debug!("Geolocation reports country {}", code);
                self.apply_detected_country(&code);
            }
            Ok(None) => tracing::debug!("Geolocation returned no country code"),
            Err(e) => tracing::warn!("Error detecting location: {}", e),
        }
    }

    pub fn format_price(&self, service: &Service) -> String {
        format_price(service, self.currency)
    }

    pub fn order_price_text(&self, service: &Service) -> String {
        order_price_text(service, self.currency)
    }
}

/// 顯示用價格：KES 帶千分位，USD 為整數美元
pub fn format_price(service: &Service, currency: Currency) -> String {
    match currency {
        Currency::Kes => format!("KSh {}", group_thousands(service.price)),
        Currency::Usd => format!("${}", group_thousands(service.price_usd)),
    }
}

/// 訂單訊息中的價格，不加千分位
pub fn order_price_text(service: &Service, currency: Currency) -> String {
    match currency {
        Currency::Kes => format!("KSh {}", service.price),
        Currency::Usd => format!("${}", service.price_usd),
    }
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
