//! 消息服务器数据模型

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// 默认主题模板
pub const DEFAULT_TOPIC_FORMAT: &str = "/{apikey}/{serial}/{type}";

/// `host:port`，端口 1-65535
pub static ENDPOINT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.-]+:(6553[0-5]|655[0-2]\d|65[0-4]\d{2}|6[0-4]\d{3}|[1-5]\d{0,4}|[6-9]\d{0,3})$")
        .expect("static regex")
});

/// 消息服务器实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: i32,
    pub name: String,
    pub endpoint: String,
    pub username: String,
    /// 加密后的密码（不返回给客户端）
    #[serde(skip_serializing)]
    pub password: String,
    pub topic_format: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建 / 更新服务器请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServerRequest {
    #[validate(length(min = 1, max = 255, message = "name 不能为空"))]
    pub name: String,

    #[validate(regex(path = "ENDPOINT_REGEX", message = "endpoint 必须为 host:port 格式"))]
    pub endpoint: String,

    #[validate(length(min = 1, max = 255, message = "username 不能为空"))]
    pub username: String,

    #[validate(length(min = 1, message = "password 不能为空"))]
    pub password: String,

    /// 缺省时创建使用默认模板，更新保留原值
    pub topic_format: Option<String>,
}

/// 写入仓库的服务器数据（密码已加密）
#[derive(Debug, Clone)]
pub struct NewServer {
    pub name: String,
    pub endpoint: String,
    pub username: String,
    pub encrypted_password: String,
    pub topic_format: String,
}
