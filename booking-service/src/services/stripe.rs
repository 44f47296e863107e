//! Stripe payment-intents client.

use crate::config::StripeConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::gateway::{GatewayError, IntentMetadata, PaymentGateway, PaymentIntent};

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

/// Stripe API error envelope.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.expose_secret().is_empty()
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<PaymentIntent, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let url = format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, path = %path, "Stripe response");

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            let message = match serde_json::from_str::<StripeErrorBody>(&body) {
                Ok(parsed) => {
                    tracing::warn!(
                        status = %status,
                        code = ?parsed.error.code,
                        kind = ?parsed.error.kind,
                        "Stripe request rejected"
                    );
                    parsed
                        .error
                        .message
                        .unwrap_or_else(|| format!("Stripe request failed with status {}", status))
                }
                Err(_) => {
                    tracing::warn!(status = %status, "Stripe returned an unparseable error body");
                    format!("Stripe request failed with status {}: {}", status, body)
                }
            };
            Err(GatewayError::Rejected(message))
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_intent(
        &self,
        amount: u64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "automatic_payment_methods[allow_redirects]".to_string(),
                "never".to_string(),
            ),
        ];
        form.extend(
            metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
        );

        let intent = self.post_form("/payment_intents", &form).await?;
        tracing::info!(
            intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Stripe payment intent created"
        );
        Ok(intent)
    }

    async fn confirm_intent(
        &self,
        intent_id: &str,
        payment_method: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let form = [("payment_method".to_string(), payment_method.to_string())];
        let intent = self
            .post_form(&format!("/payment_intents/{}/confirm", intent_id), &form)
            .await?;
        tracing::info!(
            intent_id = %intent.id,
            status = %intent.status,
            "Stripe payment intent confirmed"
        );
        Ok(intent)
    }
}
