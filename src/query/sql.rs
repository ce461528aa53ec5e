//! 将 [`Predicate`] 翻译为 Postgres WHERE 子句
//!
//! 约定设备表别名为 `d`、消息表别名为 `m`。

use crate::query::{Clause, Field, Predicate, Value};
use sqlx::{Postgres, QueryBuilder};

fn column(field: Field) -> &'static str {
    match field {
        Field::Serial => "d.serial",
        Field::ApiKey => "d.apikey",
        Field::ServerId => "d.server_id",
        Field::Timestamp => "m.timestamp",
        Field::LastCommunication => "d.last_communication",
    }
}

/// 转义 LIKE 通配符后追加 `%`
pub fn like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 追加 ` WHERE ...`，条件为空时追加 ` WHERE TRUE`
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    qb.push(" WHERE TRUE");
    for clause in predicate.clauses() {
        qb.push(" AND ");
        push_clause(qb, clause);
    }
}

fn push_clause(qb: &mut QueryBuilder<'_, Postgres>, clause: &Clause) {
    match clause {
        Clause::Eq(field, Value::Text(v)) => {
            qb.push(column(*field)).push(" = ").push_bind(v.clone());
        }
        Clause::Eq(field, Value::Int(v)) => {
            qb.push(column(*field)).push(" = ").push_bind(*v);
        }
        Clause::Prefix(field, prefix) => {
            qb.push(column(*field))
                .push(" LIKE ")
                .push_bind(like_prefix(prefix))
                .push(" ESCAPE '\\'");
        }
        Clause::Between(field, bounds) => {
            let col = column(*field);
            qb.push(col)
                .push(" >= ")
                .push_bind(bounds.start)
                .push(" AND ")
                .push(col)
                .push(" < ")
                .push_bind(bounds.end);
        }
        Clause::In(field, ids) => {
            qb.push(column(*field))
                .push(" = ANY(")
                .push_bind(ids.clone())
                .push(")");
        }
    }
}
