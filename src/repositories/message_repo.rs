//! 消息数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{Message, MessageInput, MessagePoint, PageRequest};
use crate::query::{sql, Predicate};
use crate::repositories::MessageStore;
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

const JOINED: &str = " FROM messages m JOIN devices d ON d.serial = m.serial";

/// 消息数据仓库
#[derive(Clone)]
pub struct MessageRepository {
    pool: PostgresPool,
}

impl MessageRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    fn joined<'a>(select: &str, predicate: &Predicate) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(select);
        qb.push(JOINED);
        sql::push_where(&mut qb, predicate);
        qb
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn find_all(&self) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY id")
            .fetch_all(self.pool.pool())
            .await?;

        Ok(messages)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(message)
    }

    async fn create(&self, message: &MessageInput) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (serial, timestamp, topic, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&message.serial)
        .bind(message.timestamp)
        .bind(&message.topic)
        .bind(&message.content)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(message)
    }

    async fn update(&self, id: i32, message: &MessageInput) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET serial = $2,
                timestamp = $3,
                topic = $4,
                content = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&message.serial)
        .bind(message.timestamp)
        .bind(&message.topic)
        .bind(&message.content)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(message)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_page(
        &self,
        predicate: &Predicate,
        page: PageRequest,
    ) -> Result<Vec<Message>, AppError> {
        let mut qb = Self::joined("SELECT m.*", predicate);
        qb.push(" ORDER BY m.timestamp DESC, m.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let messages = qb
            .build_query_as::<Message>()
            .fetch_all(self.pool.pool())
            .await?;

        Ok(messages)
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64, AppError> {
        let mut qb = Self::joined("SELECT COUNT(*)", predicate);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await?;

        Ok(total)
    }

    async fn count_distinct_devices(&self, predicate: &Predicate) -> Result<i64, AppError> {
        let mut qb = Self::joined("SELECT COUNT(DISTINCT m.serial)", predicate);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await?;

        Ok(total)
    }

    async fn timeline(&self, predicate: &Predicate) -> Result<Vec<MessagePoint>, AppError> {
        let mut qb = Self::joined("SELECT m.id, m.timestamp", predicate);
        qb.push(" ORDER BY m.timestamp ASC, m.id ASC");

        let points = qb
            .build_query_as::<MessagePoint>()
            .fetch_all(self.pool.pool())
            .await?;

        Ok(points)
    }
}
