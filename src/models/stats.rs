//! 仪表盘统计模型

use crate::errors::AppError;
use serde::Serialize;

/// 子查询失败时记录的错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
}

impl From<&AppError> for ErrorInfo {
    fn from(err: &AppError) -> Self {
        Self {
            name: err.kind().to_string(),
            message: err.public_message(),
        }
    }
}

/// 最近一周覆盖情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub total_devices: i64,
    pub total_items: i64,
    pub total_messages: i64,
}

/// 各子查询的错误（成功时为 null）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsErrors {
    pub active_devices: Option<ErrorInfo>,
    pub recent_messages: Option<ErrorInfo>,
    pub weekly_stats: Option<ErrorInfo>,
}

/// 仪表盘快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStats {
    pub active_devices: Option<i64>,
    pub recent_messages: Option<i64>,
    pub weekly_stats: Option<WeeklyStats>,
    pub errors: StatsErrors,
}
