//! 服务器密码的对称加密（AES-256-GCM）

use crate::config::Settings;
use crate::errors::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{self, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::ExposeSecret;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 密码加解密器
///
/// 密文格式：Base64(nonce || ciphertext || tag)
pub struct PasswordCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl PasswordCipher {
    /// 从 Base64 编码的 32 字节密钥创建
    pub fn new(key_base64: &str) -> Result<Self, AppError> {
        let key_bytes = BASE64
            .decode(key_base64.trim())
            .map_err(|e| AppError::ConfigError(format!("ENCRYPTION_KEY 格式无效: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(AppError::ConfigError(
                "ENCRYPTION_KEY 必须是 32 字节（256 位）".to_string(),
            ));
        }

        let unbound_key = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| AppError::ConfigError("无法创建加密密钥".to_string()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound_key),
            rng: SystemRandom::new(),
        })
    }

    /// 使用环境变量 ENCRYPTION_KEY 创建
    pub fn from_env() -> Result<Self, AppError> {
        let key = Settings::encryption_key()?;
        Self::new(key.expose_secret())
    }

    /// 加密明文密码
    pub fn seal(&self, plaintext: &str) -> Result<String, AppError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| AppError::InternalError("随机数生成失败".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                aead::Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| AppError::InternalError("加密失败".to_string()))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend(in_out);
        Ok(BASE64.encode(sealed))
    }

    /// 解密已存储的密码
    pub fn open(&self, sealed: &str) -> Result<String, AppError> {
        let bytes = BASE64
            .decode(sealed)
            .map_err(|_| AppError::InternalError("密文不是有效的 Base64".to_string()))?;

        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(AppError::InternalError("密文长度无效".to_string()));
        }

        let (nonce_bytes, encrypted) = bytes.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| AppError::InternalError("Nonce 格式错误".to_string()))?;

        let mut in_out = encrypted.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
            .map_err(|_| AppError::InternalError("解密失败：密钥不匹配或数据被篡改".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| AppError::InternalError("解密结果不是 UTF-8".to_string()))
    }
}

/// 生成随机的 32 字节密钥（Base64 编码）
pub fn generate_encryption_key() -> Result<String, AppError> {
    let mut bytes = [0u8; 32];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::InternalError("随机数生成失败".to_string()))?;
    Ok(BASE64.encode(bytes))
}
