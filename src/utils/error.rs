use thiserror::Error;

/// 伺服器拒絕請求但沒有附上訊息時顯示
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Session expired or invalid (401)")]
    Unauthorized,

    #[error("Server rejected request ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 非 2xx 且回應本體沒有 `{message}`
    #[error("Server rejected request ({status})")]
    Rejected { status: u16 },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("No numbers left on quota ({allowed} allowed, {used} used)")]
    QuotaExhausted { allowed: i64, used: i64 },

    #[error("Quota could not be loaded")]
    QuotaUnavailable,

    #[error("Unknown {kind}: {id}")]
    NotFound { kind: String, id: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Session storage error: {message}")]
    SessionError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Server,
    Configuration,
    Input,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::HttpError(_) => ErrorCategory::Network,
            AppError::Unauthorized | AppError::NotAuthenticated => ErrorCategory::Authentication,
            AppError::ApiError { .. }
            | AppError::Rejected { .. }
            | AppError::QuotaExhausted { .. }
            | AppError::QuotaUnavailable => ErrorCategory::Server,
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AppError::ValidationError { .. } | AppError::NotFound { .. } => ErrorCategory::Input,
            AppError::CsvError(_)
            | AppError::IoError(_)
            | AppError::SerializationError(_)
            | AppError::SessionError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 伺服器回傳的錯誤訊息是否需要顯示「聯絡管理員」
    pub fn needs_admin_contact(&self) -> bool {
        match self {
            AppError::QuotaExhausted { .. } => true,
            AppError::ApiError { message, .. } => mentions_admin_limit(message),
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::HttpError(_) => "Failed to connect to server".to_string(),
            AppError::Unauthorized => "Your session has expired, please log in again".to_string(),
            AppError::NotAuthenticated => "You need to log in first".to_string(),
            AppError::ApiError { message, .. } => message.clone(),
            AppError::Rejected { .. } => DEFAULT_ERROR_MESSAGE.to_string(),
            AppError::QuotaUnavailable => {
                "Could not load your remaining numbers, please try again".to_string()
            }
            AppError::QuotaExhausted { allowed, .. } => {
                format!("You have used all {} numbers on your plan", allowed)
            }
            AppError::NotFound { kind, id } => format!("No {} matches '{}'", kind, id),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if self.needs_admin_contact() {
            return "Contact the admin via WhatsApp or Telegram with your username to raise your limit";
        }
        match self.category() {
            ErrorCategory::Network => "Check your connection and the --api-base setting, then try again",
            ErrorCategory::Authentication => "Run `smskenya login` to start a new session",
            ErrorCategory::Server => "Try again later or contact support",
            ErrorCategory::Configuration => "Check the config file and command-line flags",
            ErrorCategory::Input => "Run `smskenya services` or `smskenya countries` to see valid choices",
            ErrorCategory::Storage => "Check that the session directory is writable",
        }
    }
}

/// 錯誤訊息內含 quota / whitelist 關鍵字
pub fn mentions_admin_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("quota") || lower.contains("whitelist")
}

pub type Result<T> = std::result::Result<T, AppError>;
