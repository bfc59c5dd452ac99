use crate::adapters::webhook::SignupWebhook;
use crate::domain::model::SignupForm;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::validation::{validate_email, validate_non_empty_string, validate_phone};

pub const POPUP_SHOWN_KEY: &str = "smskenya_popup_shown";

/// 行銷名單：只提示一次，送出結果一律視為成功
pub struct SignupFlow<S: Storage> {
    storage: S,
}

impl<S: Storage> SignupFlow<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn should_prompt(&self) -> Result<bool> {
        Ok(self.storage.read_file(POPUP_SHOWN_KEY).await?.is_none())
    }

    pub async fn dismiss(&self) -> Result<()> {
        self.storage.write_file(POPUP_SHOWN_KEY, b"true").await
    }

    /// 只有表單驗證會失敗；webhook 的錯誤只記錄
    pub async fn submit(&self, webhook: &SignupWebhook, form: &SignupForm) -> Result<()> {
        validate_non_empty_string("name", &form.name)?;
        validate_email("email", &form.email)?;
        validate_phone("phone", &form.phone)?;

        if let Err(e) = webhook.submit(form).await {
            tracing::warn!("Error submitting form: {}", e);
        }
        self.dismiss().await
    }
}
