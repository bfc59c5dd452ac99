use crate::domain::model::SignupForm;
use crate::utils::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;

/// 行銷名單的 webhook
#[derive(Debug, Clone)]
pub struct SignupWebhook {
    client: Client,
    url: String,
}

impl SignupWebhook {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub async fn submit(&self, form: &SignupForm) -> Result<()> {
        tracing::debug!("Posting signup for {} to {}", form.email, self.url);
        let response = self.client.post(&self.url).json(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ApiError {
                status: status.as_u16(),
                message: format!("signup webhook responded with {}", status),
            });
        }
        Ok(())
    }
}
