//! 数据验证工具

use crate::errors::AppError;

/// 验证数据库 ID（正整数）
pub fn validate_id(s: &str) -> Result<i32, AppError> {
    match s.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!(
            "ID 无效: {}，必须为正整数",
            s
        ))),
    }
}

/// 解析逗号分隔的服务器 ID 列表，如 `1,2,3`
///
/// 结果去重并升序排列；空串或包含非正整数时报错。
pub fn parse_server_ids(s: &str) -> Result<Vec<i32>, AppError> {
    let mut ids = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<i32>() {
            Ok(id) if id > 0 => ids.push(id),
            _ => {
                return Err(AppError::BadRequest(format!(
                    "serverIds 中包含无效的服务器 ID: {}",
                    part
                )))
            }
        }
    }

    if ids.is_empty() {
        return Err(AppError::BadRequest("serverIds 不能为空".to_string()));
    }

    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
