//! 应用配置加载和管理

use crate::errors::AppError;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;

/// 应用配置结构
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub require_ssl: bool,
    /// 单条语句的超时时间，检索与统计查询受此限制（0 表示不限制）
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
    /// 启动时执行内嵌迁移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// `json` 或 `pretty`
    pub format: String,
}

/// 认证配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// 关闭时请求以匿名身份通过
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

fn default_issuer() -> String { "sensorhub".to_string() }
fn default_audience() -> String { "sensorhub-api".to_string() }
fn default_true() -> bool { true }

/// 查询与分页配置
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    /// 计算 today / yesterday 等日历边界所用的时区（IANA 名称）
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_statement_timeout() -> u64 { 30 }
fn default_timezone() -> String { "UTC".to_string() }
fn default_page_size() -> i64 { 10 }
fn default_max_page_size() -> i64 { 100 }

impl QuerySettings {
    /// 解析配置的时区
    pub fn tz(&self) -> Result<Tz, AppError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::ConfigError(format!("无效的时区 {}: {}", self.timezone, e)))
    }
}

impl Settings {
    /// 从配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let settings = Config::builder()
            // 加载默认配置
            .add_source(File::with_name("config/development"))
            // 根据环境加载对应配置
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // 环境变量覆盖，前缀 SENSORHUB，分隔符 __
            .add_source(
                Environment::with_prefix("SENSORHUB")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// 获取数据库连接 URL（从环境变量）
    pub fn database_url() -> Result<SecretString, AppError> {
        required_secret("DATABASE_URL")
    }

    /// 获取服务器密码加密密钥（从环境变量，Base64 编码的 32 字节）
    pub fn encryption_key() -> Result<SecretString, AppError> {
        required_secret("ENCRYPTION_KEY")
    }

    /// 获取 JWT 密钥（从环境变量）
    pub fn jwt_secret() -> Result<SecretString, AppError> {
        required_secret("JWT_SECRET")
    }

    /// 获取服务器地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn required_secret(name: &str) -> Result<SecretString, AppError> {
    env::var(name)
        .map(SecretString::new)
        .map_err(|_| AppError::ConfigError(format!("{} 未设置", name)))
}
