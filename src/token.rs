use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    config::AmadeusConfig,
    error::PriceError,
    model::TokenResponse,
    transport::{HttpRequest, HttpTransport},
};

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Exchanges client credentials for a bearer token. Tokens are not cached.
pub struct TokenProvider {
    config: AmadeusConfig,
    transport: Arc<dyn HttpTransport>,
}

impl TokenProvider {
    pub fn new(config: AmadeusConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn credentials(&self) -> Result<(&str, &str), PriceError> {
        match (
            present(&self.config.client_id),
            present(&self.config.client_secret),
        ) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(PriceError::Configuration(
                "Missing AMADEUS_CLIENT_ID or AMADEUS_CLIENT_SECRET".to_string(),
            )),
        }
    }

    pub async fn acquire_token(&self) -> Result<String, PriceError> {
        let (client_id, client_secret) = self.credentials()?;

        let form = vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), client_id.to_string()),
            ("client_secret".to_string(), client_secret.to_string()),
        ];
        let request = HttpRequest::post_form(&self.config.token_url, form, self.config.timeout());

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            error!(
                status = response.status,
                body = %response.body,
                "token endpoint rejected credentials"
            );
        }
        let response = response.error_for_status()?;

        let token: TokenResponse = serde_json::from_str(&response.body)?;
        debug!("acquired access token");
        token
            .access_token
            .ok_or_else(|| PriceError::Data("token response has no access_token".to_string()))
    }
}
