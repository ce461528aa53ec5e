//! 服务器数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{NewServer, Server};
use crate::repositories::ServerStore;
use async_trait::async_trait;

/// 服务器数据仓库
#[derive(Clone)]
pub struct ServerRepository {
    pool: PostgresPool,
}

impl ServerRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerStore for ServerRepository {
    async fn find_all(&self) -> Result<Vec<Server>, AppError> {
        let servers = sqlx::query_as::<_, Server>("SELECT * FROM servers ORDER BY id")
            .fetch_all(self.pool.pool())
            .await?;

        Ok(servers)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Server>, AppError> {
        let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(server)
    }

    async fn find_by_endpoint_and_username(
        &self,
        endpoint: &str,
        username: &str,
    ) -> Result<Option<Server>, AppError> {
        let server = sqlx::query_as::<_, Server>(
            "SELECT * FROM servers WHERE endpoint = $1 AND username = $2",
        )
        .bind(endpoint)
        .bind(username)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(server)
    }

    async fn find_existing_ids(&self, ids: &[i32]) -> Result<Vec<i32>, AppError> {
        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM servers WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(existing)
    }

    async fn create(&self, server: &NewServer) -> Result<Server, AppError> {
        let server = sqlx::query_as::<_, Server>(
            r#"
            INSERT INTO servers (name, endpoint, username, password, topic_format)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&server.name)
        .bind(&server.endpoint)
        .bind(&server.username)
        .bind(&server.encrypted_password)
        .bind(&server.topic_format)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(server)
    }

    async fn update(&self, id: i32, server: &NewServer) -> Result<Option<Server>, AppError> {
        let server = sqlx::query_as::<_, Server>(
            r#"
            UPDATE servers
            SET name = $2,
                endpoint = $3,
                username = $4,
                password = $5,
                topic_format = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&server.name)
        .bind(&server.endpoint)
        .bind(&server.username)
        .bind(&server.encrypted_password)
        .bind(&server.topic_format)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(server)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM servers WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
