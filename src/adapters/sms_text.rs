use crate::utils::error::{AppError, Result};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .reduce(|mut acc, text| {
                acc.push_str(&text);
                acc
            })
    }
}

/// 以生成式文字 API 產生示範驗證簡訊
#[derive(Debug, Clone)]
pub struct SmsTextGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl SmsTextGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// 不會失敗：空回應或任何錯誤都改用本地產生的訊息
    pub async fn generate_otp_message(&self, service_name: &str, country_name: &str) -> String {
        match self.request_message(service_name, country_name).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => format!("Code: {}", random_code()),
            Err(e) => {
                tracing::error!("SMS text generation failed: {}", e);
                format!("Your {} code is {}.", service_name, random_code())
            }
        }
    }

    async fn request_message(&self, service_name: &str, country_name: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AppError::ConfigError {
            message: "no API key configured for SMS text generation".to_string(),
        })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(service_name, country_name)),
                }],
            }],
        };

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ApiError {
                status: status.as_u16(),
                message: format!("generateContent responded with {}", status),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed.text().unwrap_or_default())
    }
}

fn build_prompt(service_name: &str, country_name: &str) -> String {
    format!(
        "Generate a realistic SMS verification message for \"{service}\".\n\
         The recipient is in \"{country}\".\n\
         Include a realistic 4-8 digit verification code.\n\
         The message should be in the language appropriate for {country} (or English if commonly used there).\n\
         Only return the message text, nothing else.\n\
         Do not include quotes.",
        service = service_name,
        country = country_name
    )
}

/// 六位數
fn random_code() -> u32 {
    rand::rng().random_range(100_000..1_000_000)
}
