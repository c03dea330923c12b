//! Helpdesk Single Sign-On
//!
//! Signs callback URLs that log an exchange user into a third-party
//! helpdesk. Freshdesk takes an HMAC-signed query string; Zendesk takes an
//! HS256 JWT.

use std::env;
use std::fmt;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use platform::crypto::{hmac_sha256, to_hex};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::collaborator::SsoSigner;
use crate::domain::model::UserRecord;
use crate::domain::value_object::sso_service::SsoService;
use crate::error::{AccountError, AccountResult};

/// Base URL and shared secret of one helpdesk
#[derive(Clone)]
pub struct SsoEndpoint {
    pub endpoint: String,
    pub key: String,
}

impl fmt::Debug for SsoEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoEndpoint")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SsoEndpoint {
    fn from_env(endpoint_var: &str, key_var: &str) -> Option<Self> {
        let endpoint = env::var(endpoint_var).ok().filter(|v| !v.trim().is_empty())?;
        let key = env::var(key_var).ok().filter(|v| !v.is_empty())?;
        Some(Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            key,
        })
    }

    fn url(&self, path: &str) -> AccountResult<Url> {
        Url::parse(&format!("{}{}", self.endpoint.trim_end_matches('/'), path))
            .map_err(|e| AccountError::Internal(format!("Invalid SSO endpoint: {e}")))
    }
}

/// Configured helpdesks; an unconfigured one is not supported
#[derive(Debug, Clone, Default)]
pub struct SsoConfig {
    pub freshdesk: Option<SsoEndpoint>,
    pub zendesk: Option<SsoEndpoint>,
}

impl SsoConfig {
    /// Read `FRESHDESK_ENDPOINT`/`FRESHDESK_KEY` and `ZENDESK_ENDPOINT`/`ZENDESK_KEY`
    pub fn from_env() -> Self {
        Self {
            freshdesk: SsoEndpoint::from_env("FRESHDESK_ENDPOINT", "FRESHDESK_KEY"),
            zendesk: SsoEndpoint::from_env("ZENDESK_ENDPOINT", "ZENDESK_KEY"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ZendeskClaims {
    iat: i64,
    jti: String,
    name: String,
    email: String,
    external_id: String,
}

/// `SsoSigner` backed by shared helpdesk secrets
#[derive(Debug, Clone)]
pub struct HmacSsoSigner {
    config: SsoConfig,
}

impl HmacSsoSigner {
    pub fn new(config: SsoConfig) -> Self {
        Self { config }
    }

    fn freshdesk(&self, endpoint: &SsoEndpoint, user: &UserRecord) -> AccountResult<String> {
        let name = display_name(user);
        let timestamp = Utc::now().timestamp().to_string();
        let message = format!("{name}{}{timestamp}", user.email);
        let hash = to_hex(&hmac_sha256(endpoint.key.as_bytes(), message.as_bytes()));

        let mut url = endpoint.url("/login/sso")?;
        url.query_pairs_mut()
            .append_pair("name", &name)
            .append_pair("email", &user.email)
            .append_pair("timestamp", &timestamp)
            .append_pair("hash", &hash);
        Ok(url.into())
    }

    fn zendesk(&self, endpoint: &SsoEndpoint, user: &UserRecord) -> AccountResult<String> {
        let claims = ZendeskClaims {
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
            name: display_name(user),
            email: user.email.clone(),
            external_id: user.id.to_string(),
        };
        let jwt = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(endpoint.key.as_bytes()),
        )
        .map_err(|e| AccountError::Internal(format!("Failed to sign SSO token: {e}")))?;

        let mut url = endpoint.url("/access/jwt")?;
        url.query_pairs_mut().append_pair("jwt", &jwt);
        Ok(url.into())
    }
}

impl SsoSigner for HmacSsoSigner {
    fn callback_url(&self, service: SsoService, user: &UserRecord) -> AccountResult<String> {
        match service {
            SsoService::Freshdesk => {
                let endpoint = self
                    .config
                    .freshdesk
                    .as_ref()
                    .ok_or(AccountError::ServiceNotSupported)?;
                self.freshdesk(endpoint, user)
            }
            SsoService::Zendesk => {
                let endpoint = self
                    .config
                    .zendesk
                    .as_ref()
                    .ok_or(AccountError::ServiceNotSupported)?;
                self.zendesk(endpoint, user)
            }
        }
    }
}

/// Username, or the local part of the email when none is set
fn display_name(user: &UserRecord) -> String {
    user.username.clone().unwrap_or_else(|| {
        user.email
            .split_once('@')
            .map_or(user.email.as_str(), |(local, _)| local)
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::claim::RoleFlags;
    use crate::domain::model::UserSettings;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

    fn user() -> UserRecord {
        UserRecord {
            id: 42,
            email: "jane+desk@example.io".to_string(),
            username: None,
            network_id: 10_042,
            verification_level: 1,
            email_verified: true,
            activated: true,
            affiliation_code: None,
            roles: RoleFlags::default(),
            settings: UserSettings::new(),
            created_at: Utc::now(),
            password: None,
        }
    }

    fn signer() -> HmacSsoSigner {
        HmacSsoSigner::new(SsoConfig {
            freshdesk: Some(SsoEndpoint {
                endpoint: "https://help.example.io/".to_string(),
                key: "fd-secret".to_string(),
            }),
            zendesk: Some(SsoEndpoint {
                endpoint: "https://example.zendesk.com".to_string(),
                key: "zd-secret".to_string(),
            }),
        })
    }

    #[test]
    fn test_freshdesk_url_carries_valid_hash() {
        let url = signer().callback_url(SsoService::Freshdesk, &user()).unwrap();
        let url = Url::parse(&url).unwrap();
        assert_eq!(url.path(), "/login/sso");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["name"], "jane+desk");
        assert_eq!(pairs["email"], "jane+desk@example.io");

        let message = format!("{}{}{}", pairs["name"], pairs["email"], pairs["timestamp"]);
        let expected = to_hex(&hmac_sha256(b"fd-secret", message.as_bytes()));
        assert_eq!(pairs["hash"], expected);
    }

    #[test]
    fn test_zendesk_url_carries_signed_jwt() {
        let url = signer().callback_url(SsoService::Zendesk, &user()).unwrap();
        let url = Url::parse(&url).unwrap();
        assert_eq!(url.path(), "/access/jwt");

        let jwt = url
            .query_pairs()
            .find(|(k, _)| k == "jwt")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let claims = decode::<ZendeskClaims>(
            &jwt,
            &DecodingKey::from_secret(b"zd-secret"),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(claims.email, "jane+desk@example.io");
        assert_eq!(claims.external_id, "42");
    }

    #[test]
    fn test_unconfigured_service_is_not_supported() {
        let signer = HmacSsoSigner::new(SsoConfig::default());
        let err = signer
            .callback_url(SsoService::Zendesk, &user())
            .unwrap_err();
        assert!(matches!(err, AccountError::ServiceNotSupported));
    }
}
