//! 检索类接口的查询参数（未校验的原始形式）

use serde::Deserialize;
use validator::Validate;

/// `/messages/search`、`/messages/stats`、`/devices/activity` 共用的查询串
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    /// 序列号前缀
    #[validate(length(min = 1, max = 255, message = "serial 不能为空"))]
    pub serial: Option<String>,

    #[validate(length(min = 1, max = 255, message = "apikey 不能为空"))]
    pub apikey: Option<String>,

    /// 逗号分隔的服务器 ID，如 `1,2,3`
    pub server_ids: Option<String>,

    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_range: Option<String>,

    #[validate(range(min = 1, message = "页码应大于 0"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, message = "每页数量应大于 0"))]
    pub limit: Option<i64>,
}
