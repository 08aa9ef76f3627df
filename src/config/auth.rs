//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (JWT issuance and validation)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign and verify access tokens (HS256)
    pub jwt_secret: Secret<String>,

    /// Access token lifetime in minutes
    #[serde(default = "default_token_expiry_minutes")]
    pub token_expiry_minutes: i64,

    /// Invitation codes accepted at registration (comma-separated)
    #[serde(default = "default_invitation_codes")]
    pub invitation_codes: String,
}

impl AuthConfig {
    /// Expose the JWT signing secret.
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.expose_secret()
    }

    /// Get accepted invitation codes as a vector.
    pub fn invitation_codes_list(&self) -> Vec<String> {
        self.invitation_codes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate authentication configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret().len() < 16 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        if self.token_expiry_minutes <= 0 {
            return Err(ValidationError::InvalidTokenExpiry);
        }
        // The development fallback secret must never reach production.
        if *environment == Environment::Production && self.jwt_secret().contains("change-me") {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        Ok(())
    }
}

fn default_token_expiry_minutes() -> i64 {
    // 7 days
    60 * 24 * 7
}

fn default_invitation_codes() -> String {
    "FORGE2024,EARLY2024,BETA2024".to_string()
}
