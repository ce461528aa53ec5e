//! JWT 令牌校验（HS256）

use crate::config::AuthSettings;
use crate::config::Settings;
use crate::errors::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// JWT Claims（载荷）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 主体
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// 过期时间（Unix 时间戳）
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
}

/// JWT 管理器
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtManager {
    /// 使用环境变量 JWT_SECRET 创建
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let secret = Settings::jwt_secret()?;
        Ok(Self::from_secret(secret.expose_secret(), &settings.auth))
    }

    pub fn from_secret(secret: &str, auth: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: auth.issuer.clone(),
            audience: auth.audience.clone(),
        }
    }

    /// 签发令牌（运维脚本与测试使用）
    pub fn issue(
        &self,
        subject: &str,
        role: Option<&str>,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            role: role.map(str::to_string),
            preferred_username: None,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("令牌生成失败: {}", e)))
    }

    /// 验证令牌签名、过期时间、签发者与受众
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("令牌验证失败: {}", e);
                AppError::Unauthorized("无效的令牌".to_string())
            })
    }
}
