//! 查询串到检索条件的转换

use crate::errors::AppError;
use crate::models::{FilterQuery, PageRequest};
use crate::query::{Clause, DateBounds, DateSelection, Field, Predicate, QueryOptions, Value};
use crate::utils::parse_server_ids;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use validator::Validate;

/// 检索对象，决定时间条件作用在哪个字段上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Messages,
    Devices,
}

impl Target {
    pub fn date_field(self) -> Field {
        match self {
            Target::Messages => Field::Timestamp,
            Target::Devices => Field::LastCommunication,
        }
    }
}

/// 校验后的过滤参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub serial: Option<String>,
    pub apikey: Option<String>,
    pub server_ids: Option<Vec<i32>>,
    pub dates: DateSelection,
}

impl FilterParams {
    /// 校验原始查询串，得到过滤参数与分页请求
    pub fn from_query(
        query: &FilterQuery,
        options: &QueryOptions,
    ) -> Result<(Self, PageRequest), AppError> {
        let query = normalize(query);
        query
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let server_ids = query
            .server_ids
            .as_deref()
            .map(parse_server_ids)
            .transpose()?;

        let dates = DateSelection::from_query(
            query.date_range.as_deref(),
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            options.tz,
        )?;

        let page = PageRequest::from_query(
            query.page,
            query.limit,
            options.default_limit,
            options.max_limit,
        )?;

        Ok((
            Self {
                serial: query.serial,
                apikey: query.apikey,
                server_ids,
                dates,
            },
            page,
        ))
    }

    /// 要求提供 serverIds
    pub fn require_server_ids(&self) -> Result<&[i32], AppError> {
        self.server_ids
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("serverIds 为必填项".to_string()))
    }

    /// 要求提供时间条件（dateRange 或 startDate/endDate）并解析
    pub fn require_bounds(&self, now: DateTime<Utc>, tz: Tz) -> Result<DateBounds, AppError> {
        self.dates.bounds(now, tz).ok_or_else(|| {
            AppError::BadRequest("必须提供 dateRange 或 startDate 与 endDate".to_string())
        })
    }

    /// 生成检索条件，时间条件使用已解析的 `bounds`
    pub fn predicate(&self, bounds: Option<DateBounds>, target: Target) -> Predicate {
        let mut clauses = Vec::new();

        if let Some(serial) = &self.serial {
            clauses.push(Clause::Prefix(Field::Serial, serial.clone()));
        }
        if let Some(apikey) = &self.apikey {
            clauses.push(Clause::Eq(Field::ApiKey, Value::Text(apikey.clone())));
        }
        if let Some(ids) = &self.server_ids {
            clauses.push(Clause::In(Field::ServerId, ids.clone()));
        }
        if let Some(bounds) = bounds {
            clauses.push(Clause::Between(target.date_field(), bounds));
        }

        Predicate::all(clauses)
    }
}

// 前端会把未填写的字段作为空串发送
fn normalize(query: &FilterQuery) -> FilterQuery {
    let keep = |v: &Option<String>| {
        v.as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    FilterQuery {
        serial: keep(&query.serial),
        apikey: keep(&query.apikey),
        server_ids: keep(&query.server_ids),
        start_date: keep(&query.start_date),
        end_date: keep(&query.end_date),
        date_range: keep(&query.date_range),
        page: query.page,
        limit: query.limit,
    }
}
