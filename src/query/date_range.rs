//! 相对时间范围解析
//!
//! 所有边界均为左闭右开区间 `[start, end)`。

use crate::errors::AppError;
use crate::utils::{local_midnight, parse_iso8601};
use chrono::{DateTime, Days, Duration, Months, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// 命名的相对时间范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRangeToken {
    Last5Minutes,
    Last15Minutes,
    Last30Minutes,
    LastHour,
    Last24Hours,
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    LastYear,
}

impl DateRangeToken {
    pub const ALL: [DateRangeToken; 10] = [
        DateRangeToken::Last5Minutes,
        DateRangeToken::Last15Minutes,
        DateRangeToken::Last30Minutes,
        DateRangeToken::LastHour,
        DateRangeToken::Last24Hours,
        DateRangeToken::Today,
        DateRangeToken::Yesterday,
        DateRangeToken::LastWeek,
        DateRangeToken::LastMonth,
        DateRangeToken::LastYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRangeToken::Last5Minutes => "last_5_minutes",
            DateRangeToken::Last15Minutes => "last_15_minutes",
            DateRangeToken::Last30Minutes => "last_30_minutes",
            DateRangeToken::LastHour => "last_hour",
            DateRangeToken::Last24Hours => "last_24_hours",
            DateRangeToken::Today => "today",
            DateRangeToken::Yesterday => "yesterday",
            DateRangeToken::LastWeek => "last_week",
            DateRangeToken::LastMonth => "last_month",
            DateRangeToken::LastYear => "last_year",
        }
    }

    /// 以 `now` 为锚点解析为绝对时间范围，日历边界按 `tz` 计算
    pub fn resolve(&self, now: DateTime<Utc>, tz: Tz) -> DateBounds {
        let local = now.with_timezone(&tz);
        let today = local.date_naive();

        let (start, end) = match self {
            DateRangeToken::Last5Minutes => (now - Duration::minutes(5), now),
            DateRangeToken::Last15Minutes => (now - Duration::minutes(15), now),
            DateRangeToken::Last30Minutes => (now - Duration::minutes(30), now),
            DateRangeToken::LastHour => (now - Duration::hours(1), now),
            DateRangeToken::Last24Hours => (now - Duration::hours(24), now),
            DateRangeToken::Today => {
                let tomorrow = today.succ_opt().unwrap_or(today);
                (local_midnight(today, tz), local_midnight(tomorrow, tz))
            }
            DateRangeToken::Yesterday => {
                let yesterday = today.pred_opt().unwrap_or(today);
                (local_midnight(yesterday, tz), local_midnight(today, tz))
            }
            DateRangeToken::LastWeek => {
                let start = local
                    .checked_sub_days(Days::new(7))
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| now - Duration::days(7));
                (start, now)
            }
            DateRangeToken::LastMonth => {
                let start = local
                    .checked_sub_months(Months::new(1))
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| now - Duration::days(30));
                (start, now)
            }
            DateRangeToken::LastYear => {
                let start = local
                    .checked_sub_months(Months::new(12))
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| now - Duration::days(365));
                (start, now)
            }
        };

        DateBounds { start, end }
    }
}

impl fmt::Display for DateRangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRangeToken {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateRangeToken::ALL
            .iter()
            .copied()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = DateRangeToken::ALL.iter().map(|t| t.as_str()).collect();
                AppError::BadRequest(format!(
                    "无效的时间范围 {}，dateRange 必须是以下值之一: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// 绝对时间范围 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateBounds {
    /// 构造显式时间范围，要求 `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::BadRequest(
                "startDate 必须早于 endDate".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// 按名称解析相对时间范围
pub fn resolve(token: &str, now: DateTime<Utc>, tz: Tz) -> Result<DateBounds, AppError> {
    Ok(token.parse::<DateRangeToken>()?.resolve(now, tz))
}

/// 请求中的时间条件：不限、命名范围或显式起止
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Unbounded,
    Named(DateRangeToken),
    Explicit(DateBounds),
}

impl DateSelection {
    /// 校验 dateRange 与 startDate/endDate 的互斥关系
    ///
    /// 空字符串视为未提供。
    pub fn from_query(
        date_range: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        tz: Tz,
    ) -> Result<Self, AppError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }
        let date_range = present(date_range);
        let start_date = present(start_date);
        let end_date = present(end_date);

        match (date_range, start_date, end_date) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(AppError::BadRequest(
                "dateRange 不能与 startDate 或 endDate 同时提供".to_string(),
            )),
            (Some(token), None, None) => Ok(DateSelection::Named(token.parse()?)),
            (None, Some(start), Some(end)) => {
                let start = parse_date_param("startDate", start, tz)?;
                let end = parse_date_param("endDate", end, tz)?;
                Ok(DateSelection::Explicit(DateBounds::new(start, end)?))
            }
            (None, Some(_), None) | (None, None, Some(_)) => Err(AppError::BadRequest(
                "startDate 与 endDate 必须同时提供".to_string(),
            )),
            (None, None, None) => Ok(DateSelection::Unbounded),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, DateSelection::Unbounded)
    }

    /// 解析为绝对时间范围；不限时返回 `None`
    pub fn bounds(&self, now: DateTime<Utc>, tz: Tz) -> Option<DateBounds> {
        match self {
            DateSelection::Unbounded => None,
            DateSelection::Named(token) => Some(token.resolve(now, tz)),
            DateSelection::Explicit(bounds) => Some(*bounds),
        }
    }
}

fn parse_date_param(field: &str, value: &str, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    parse_iso8601(value, tz)
        .ok_or_else(|| AppError::BadRequest(format!("{} 必须是 ISO 8601 格式的日期", field)))
}
