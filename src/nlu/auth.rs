//! 服务账号 OAuth2 认证（JWT bearer 断言）
//!
//! 用私钥对 RS256 断言签名，在 token 端点换取 access token；缓存到过期前一分钟。

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::Credentials;
use crate::core::NluError;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DIALOGFLOW_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS > now
    }
}

pub struct ServiceAccountAuth {
    http: reqwest::Client,
    credentials: Credentials,
    token_uri: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            cached: RwLock::new(None),
        }
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// 取可用的 access token，必要时重新换取
    pub async fn access_token(&self) -> Result<String, NluError> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let mut cached = self.cached.write().await;
        // 等写锁期间可能已被其他请求刷新
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let assertion = self.sign_assertion(now)?;
        let resp = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NluError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = now + token.expires_in.unwrap_or(ASSERTION_TTL_SECS);
        tracing::debug!(
            client_email = %self.credentials.client_email,
            expires_at,
            "obtained dialogflow access token"
        );
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, NluError> {
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| NluError::Auth(format!("invalid private key: {}", e)))?;
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: DIALOGFLOW_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| NluError::Auth(format!("failed to sign assertion: {}", e)))
    }
}
