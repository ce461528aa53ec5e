//! 遥测消息数据模型

use crate::errors::AppError;
use crate::models::PageMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// 消息实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    /// 所属设备序列号（按值关联 devices.serial）
    pub serial: String,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建 / 更新消息请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    #[validate(length(min = 1, max = 255, message = "serial 不能为空"))]
    pub serial: String,

    pub timestamp: DateTime<Utc>,

    #[validate(length(min = 1, max = 255, message = "topic 不能为空"))]
    pub topic: String,

    pub content: serde_json::Value,
}

impl MessageRequest {
    /// 完整校验：字段规则 + content 必须是 JSON 对象
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        ensure_object(&self.content, "content")
    }
}

/// 写入仓库的消息数据
#[derive(Debug, Clone, PartialEq)]
pub struct MessageInput {
    pub serial: String,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub content: serde_json::Value,
}

impl From<MessageRequest> for MessageInput {
    fn from(request: MessageRequest) -> Self {
        Self {
            serial: request.serial,
            timestamp: request.timestamp,
            topic: request.topic,
            content: request.content,
        }
    }
}

/// 原始主题消息上报请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[validate(range(min = 1, message = "serverId 必须为正整数"))]
    pub server_id: i32,

    #[validate(length(min = 1, max = 1024, message = "topic 不能为空"))]
    pub topic: String,

    pub payload: serde_json::Value,

    /// 缺省使用服务器接收时间
    pub timestamp: Option<DateTime<Utc>>,
}

impl IngestRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        ensure_object(&self.payload, "payload")
    }
}

fn ensure_object(value: &serde_json::Value, field: &str) -> Result<(), AppError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{} 必须是 JSON 对象", field)))
    }
}

/// 统计图表用的 (id, timestamp) 点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MessagePoint {
    pub id: i32,
    pub timestamp: DateTime<Utc>,
}

/// 消息检索结果
#[derive(Debug, Clone, Serialize)]
pub struct MessageSearchResult {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub meta: PageMeta,
}
