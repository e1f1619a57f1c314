use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;

use super::model::UserContext;
use crate::core::config::AuthConfig;
use crate::core::error::AppError;

/// Validates bearer JWTs (HS256, shared secret) minted by an external
/// identity provider and extracts the tenant-scoping claims.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    issuer: Option<String>,
    audience: Option<String>,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    tenant: Option<String>,
}

impl TokenValidator {
    pub fn new(
        secret: &str,
        issuer: Option<String>,
        audience: Option<String>,
        leeway: Duration,
    ) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.issuer.clone(),
            config.audience.clone(),
            config.jwt_leeway,
        )
    }

    pub fn validate_token(&self, token: &str) -> Result<UserContext, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        Ok(UserContext {
            user_id: data.claims.sub,
            organization_id: data.claims.org,
            tenant_id: data.claims.tenant,
        })
    }
}
