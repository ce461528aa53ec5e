//! 时间处理工具

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 指定时区中某天的 0 点（UTC 表示）
///
/// 夏令时跳变导致 0 点不存在时，取该日第一个存在的整点。
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    (0..24)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::default()).and_utc())
}

/// 解析 ISO 8601 时间字符串
///
/// 支持 RFC 3339（带时区）、不带时区的 `YYYY-MM-DDTHH:MM:SS[.fff]`
/// 以及纯日期 `YYYY-MM-DD`；后两者按 `tz` 解释。
pub fn parse_iso8601(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| local_midnight(date, tz))
}
