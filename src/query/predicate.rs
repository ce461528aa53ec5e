//! 检索条件的与后端无关的表示
//!
//! 同一个 [`Predicate`] 既可以翻译成 SQL（见 `sql` 模块），
//! 也可以直接在内存记录上求值。

use crate::models::{Device, Message};
use crate::query::DateBounds;
use chrono::{DateTime, Utc};

/// 可参与过滤的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// 设备序列号（消息检索时同样取设备一侧）
    Serial,
    ApiKey,
    ServerId,
    /// 消息时间
    Timestamp,
    /// 设备最后通信时间
    LastCommunication,
}

/// 等值比较的取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i32),
}

/// 单个条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Eq(Field, Value),
    /// 区分大小写的前缀匹配
    Prefix(Field, String),
    /// 左闭右开时间区间
    Between(Field, DateBounds),
    In(Field, Vec<i32>),
}

/// 所有条件同时成立
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// 在内存记录上求值；记录缺少某字段时该条件不成立
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, Value::Text(expected)) => {
                record.text(*field).map_or(false, |v| v == expected)
            }
            Clause::Eq(field, Value::Int(expected)) => {
                record.int(*field).map_or(false, |v| v == *expected)
            }
            Clause::Prefix(field, prefix) => record
                .text(*field)
                .map_or(false, |v| v.starts_with(prefix.as_str())),
            Clause::Between(field, bounds) => {
                record.time(*field).map_or(false, |t| bounds.contains(t))
            }
            Clause::In(field, ids) => record.int(*field).map_or(false, |v| ids.contains(&v)),
        })
    }
}

/// 可被 [`Predicate`] 求值的记录
pub trait Record {
    fn text(&self, field: Field) -> Option<&str>;
    fn int(&self, field: Field) -> Option<i32>;
    fn time(&self, field: Field) -> Option<DateTime<Utc>>;
}

impl Record for Device {
    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Serial => Some(&self.serial),
            Field::ApiKey => Some(&self.apikey),
            _ => None,
        }
    }

    fn int(&self, field: Field) -> Option<i32> {
        match field {
            Field::ServerId => Some(self.server_id),
            _ => None,
        }
    }

    fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        match field {
            Field::LastCommunication => Some(self.last_communication),
            _ => None,
        }
    }
}

/// 消息与其所属设备的联接视图
#[derive(Debug, Clone, Copy)]
pub struct JoinedMessage<'a> {
    pub message: &'a Message,
    pub device: &'a Device,
}

impl Record for JoinedMessage<'_> {
    fn text(&self, field: Field) -> Option<&str> {
        self.device.text(field)
    }

    fn int(&self, field: Field) -> Option<i32> {
        self.device.int(field)
    }

    fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        match field {
            Field::Timestamp => Some(self.message.timestamp),
            other => self.device.time(other),
        }
    }
}
