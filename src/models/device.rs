//! 设备数据模型

use crate::models::PageMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// 设备实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i32,
    /// 设备序列号（业务主键，全局唯一）
    pub serial: String,
    pub apikey: String,
    pub last_communication: DateTime<Utc>,
    pub server_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建 / 全量更新设备请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    #[validate(length(min = 1, max = 255, message = "serial 不能为空"))]
    pub serial: String,

    #[validate(length(min = 1, max = 255, message = "apikey 不能为空"))]
    pub apikey: String,

    pub last_communication: DateTime<Utc>,

    #[validate(range(min = 1, message = "serverId 必须为正整数"))]
    pub server_id: i32,
}

/// 部分更新设备请求
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatchRequest {
    #[validate(length(min = 1, max = 255, message = "serial 不能为空"))]
    pub serial: Option<String>,

    #[validate(length(min = 1, max = 255, message = "apikey 不能为空"))]
    pub apikey: Option<String>,

    pub last_communication: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "serverId 必须为正整数"))]
    pub server_id: Option<i32>,
}

impl DevicePatchRequest {
    pub fn is_empty(&self) -> bool {
        self.serial.is_none()
            && self.apikey.is_none()
            && self.last_communication.is_none()
            && self.server_id.is_none()
    }

    /// 合并到已有设备，得到完整的写入数据
    pub fn merge_into(self, device: &Device) -> DeviceInput {
        DeviceInput {
            serial: self.serial.unwrap_or_else(|| device.serial.clone()),
            apikey: self.apikey.unwrap_or_else(|| device.apikey.clone()),
            last_communication: self.last_communication.unwrap_or(device.last_communication),
            server_id: self.server_id.unwrap_or(device.server_id),
        }
    }
}

/// 写入仓库的设备数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    pub serial: String,
    pub apikey: String,
    pub last_communication: DateTime<Utc>,
    pub server_id: i32,
}

impl From<DeviceRequest> for DeviceInput {
    fn from(request: DeviceRequest) -> Self {
        Self {
            serial: request.serial,
            apikey: request.apikey,
            last_communication: request.last_communication,
            server_id: request.server_id,
        }
    }
}

/// 活跃度报表中的单个设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActivity {
    pub id: i32,
    pub serial: String,
    pub last_communication: DateTime<Utc>,
    pub server_id: i32,
    /// 同一时间范围内该设备的消息数
    pub message_count: i64,
}

/// 仓库返回的一页活跃度数据
#[derive(Debug, Clone)]
pub struct ActivityPage {
    pub devices: Vec<DeviceActivity>,
    pub total_devices: i64,
    pub total_messages: i64,
}

/// 设备活跃度报表
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub devices: Vec<DeviceActivity>,
    pub total_messages: i64,
    #[serde(flatten)]
    pub meta: PageMeta,
}
