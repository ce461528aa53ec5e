//! 检索条件：时间范围解析、过滤参数与谓词

mod date_range;
mod filter;
mod predicate;
pub mod sql;

pub use date_range::*;
pub use filter::*;
pub use predicate::*;

use crate::config::Settings;
use crate::errors::AppError;
use chrono_tz::Tz;

/// 检索相关的运行期选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// 解析日历边界和无时区日期时使用的时区
    pub tz: Tz,
    pub default_limit: i64,
    pub max_limit: i64,
}

impl QueryOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            tz: settings.query.tz()?,
            default_limit: settings.query.default_page_size,
            max_limit: settings.query.max_page_size,
        })
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            tz: chrono_tz::UTC,
            default_limit: 10,
            max_limit: 100,
        }
    }
}
