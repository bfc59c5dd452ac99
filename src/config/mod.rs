pub mod cli;
pub mod toml_config;

use crate::core::catalog::WHATSAPP_CONTACT;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_url, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::domain::model::Currency;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_GEO_ENDPOINT: &str = "https://ipapi.co/json/";
pub const DEFAULT_SMS_TEXT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SMS_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SIGNUP_WEBHOOK: &str = "http://77.221.151.8:5678/webhook/smskenya-signup";
pub const SMS_TEXT_KEY_ENV: &str = "API_KEY";

/// 命令列覆蓋設定檔的值
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub session_dir: Option<String>,
    pub no_geo: bool,
}

/// 合併預設值、設定檔與命令列後的最終設定
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub timeout: Duration,
    pub whatsapp_contact: String,
    pub geo_endpoint: String,
    pub geo_enabled: bool,
    pub session_dir: String,
    pub sms_text_endpoint: String,
    pub sms_text_model: String,
    pub sms_text_api_key: Option<String>,
    pub signup_webhook_url: String,
}

impl Settings {
    pub fn resolve(file: &TomlConfig, overrides: Overrides) -> Self {
        let api_key = file
            .sms_text_api_key()
            .map(str::to_string)
            .or_else(|| std::env::var(SMS_TEXT_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            api_base_url: overrides
                .api_base
                .or_else(|| file.api_base_url().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(
                file.timeout_seconds().unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ),
            whatsapp_contact: file
                .whatsapp_contact()
                .unwrap_or(WHATSAPP_CONTACT)
                .to_string(),
            geo_endpoint: file
                .geo_endpoint()
                .unwrap_or(DEFAULT_GEO_ENDPOINT)
                .to_string(),
            geo_enabled: !overrides.no_geo && file.geo_enabled().unwrap_or(true),
            session_dir: overrides
                .session_dir
                .or_else(|| file.session_dir().map(str::to_string))
                .unwrap_or_else(default_session_dir),
            sms_text_endpoint: file
                .sms_text_endpoint()
                .unwrap_or(DEFAULT_SMS_TEXT_ENDPOINT)
                .to_string(),
            sms_text_model: file
                .sms_text_model()
                .unwrap_or(DEFAULT_SMS_TEXT_MODEL)
                .to_string(),
            sms_text_api_key: api_key,
            signup_webhook_url: file
                .signup_webhook_url()
                .unwrap_or(DEFAULT_SIGNUP_WEBHOOK)
                .to_string(),
        }
    }
}

/// 平台資料目錄，取不到時用目前目錄下的 `.smskenya`
pub fn default_session_dir() -> String {
    directories::ProjectDirs::from("", "", "smskenya")
        .map(|dirs| dirs.data_dir().to_string_lossy().into_owned())
        .unwrap_or_else(|| ".smskenya".to_string())
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api_base_url)?;
        validate_url("geo.endpoint", &self.geo_endpoint)?;
        validate_url("sms_text.endpoint", &self.sms_text_endpoint)?;
        validate_url("signup.webhook_url", &self.signup_webhook_url)?;
        validate_path("session.dir", &self.session_dir)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    fn whatsapp_contact(&self) -> &str {
        &self.whatsapp_contact
    }

    fn geo_endpoint(&self) -> &str {
        &self.geo_endpoint
    }

    fn geo_enabled(&self) -> bool {
        self.geo_enabled
    }

    fn session_dir(&self) -> &str {
        &self.session_dir
    }

    fn sms_text_endpoint(&self) -> &str {
        &self.sms_text_endpoint
    }

    fn sms_text_model(&self) -> &str {
        &self.sms_text_model
    }

    fn sms_text_api_key(&self) -> Option<&str> {
        self.sms_text_api_key.as_deref()
    }

    fn signup_webhook_url(&self) -> &str {
        &self.signup_webhook_url
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "smskenya")]
#[command(about = "Order virtual numbers and receive SMS verification codes")]
pub struct CliConfig {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the saved session
    #[arg(long, global = true)]
    pub session_dir: Option<String>,

    /// Display currency (KES or USD); skips location detection
    #[arg(long, global = true)]
    pub currency: Option<Currency>,

    /// Do not look up the visitor country to pick a currency
    #[arg(long, global = true)]
    pub no_geo: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List services, optionally filtered by name
    Services {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// List countries, optionally filtered by name
    Countries {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Show the price of a service
    Price { service: String },
    /// Order a number: generates it when logged in with quota, else prints a WhatsApp link
    Order {
        service: String,
        country: Option<String>,
        /// Always use the WhatsApp concierge flow
        #[arg(long)]
        whatsapp: bool,
    },
    Login {
        #[arg(short, long)]
        username: String,
        /// Falls back to SMSKENYA_PASSWORD
        #[arg(short, long)]
        password: Option<String>,
    },
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    Logout,
    /// Show the logged-in user and remaining quota
    Whoami,
    /// Generate a number for the logged-in user
    Generate {
        service: String,
        country: String,
        /// Keep polling until the SMS arrives
        #[arg(long)]
        watch: bool,
    },
    /// List orders of the logged-in user
    Orders {
        /// Write the orders to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Poll waiting orders every 10 seconds until none is waiting
    Watch,
    /// Buy with a one-time purchase link
    Direct {
        /// Full link, e.g. https://.../direct?token=..&service=wa&country=KE
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Produce a sample verification SMS for a service and country
    DemoSms { service: String, country: String },
    /// Join the mailing list
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Print the support WhatsApp link
    Contact,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_base: self.api_base.clone(),
            session_dir: self.session_dir.clone(),
            no_geo: self.no_geo || self.currency.is_some(),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                file
            }
            None => TomlConfig::default(),
        };
        let settings = Settings::resolve(&file, self.overrides());
        settings.validate()?;
        Ok(settings)
    }
}
