use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔；每個區段與欄位都可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: Option<ApiSection>,
    pub concierge: Option<ConciergeSection>,
    pub geo: Option<GeoSection>,
    pub sms_text: Option<SmsTextSection>,
    pub signup: Option<SignupSection>,
    pub session: Option<SessionSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeSection {
    pub whatsapp_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoSection {
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsTextSection {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupSection {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    pub dir: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn api_base_url(&self) -> Option<&str> {
        self.api.as_ref()?.base_url.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.api.as_ref()?.timeout_seconds
    }

    pub fn whatsapp_contact(&self) -> Option<&str> {
        self.concierge.as_ref()?.whatsapp_contact.as_deref()
    }

    pub fn geo_endpoint(&self) -> Option<&str> {
        self.geo.as_ref()?.endpoint.as_deref()
    }

    pub fn geo_enabled(&self) -> Option<bool> {
        self.geo.as_ref()?.enabled
    }

    pub fn sms_text_endpoint(&self) -> Option<&str> {
        self.sms_text.as_ref()?.endpoint.as_deref()
    }

    pub fn sms_text_model(&self) -> Option<&str> {
        self.sms_text.as_ref()?.model.as_deref()
    }

    /// 未替換的 `${VAR}` 視為沒有設定
    pub fn sms_text_api_key(&self) -> Option<&str> {
        self.sms_text
            .as_ref()?
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    pub fn signup_webhook_url(&self) -> Option<&str> {
        self.signup.as_ref()?.webhook_url.as_deref()
    }

    pub fn session_dir(&self) -> Option<&str> {
        self.session.as_ref()?.dir.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = self.api_base_url() {
            validate_url("api.base_url", url)?;
        }
        if let Some(timeout) = self.timeout_seconds() {
            validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }
        if let Some(url) = self.geo_endpoint() {
            validate_url("geo.endpoint", url)?;
        }
        if let Some(url) = self.sms_text_endpoint() {
            validate_url("sms_text.endpoint", url)?;
        }
        if let Some(url) = self.signup_webhook_url() {
            validate_url("signup.webhook_url", url)?;
        }
        if let Some(dir) = self.session_dir() {
            validate_path("session.dir", dir)?;
        }
        if let Some(contact) = self.whatsapp_contact() {
            if contact.is_empty() || !contact.chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::InvalidConfigValueError {
                    field: "concierge.whatsapp_contact".to_string(),
                    value: contact.to_string(),
                    reason: "WhatsApp contact must be digits only, with country code".to_string(),
                });
            }
        }
        Ok(())
    }
}
