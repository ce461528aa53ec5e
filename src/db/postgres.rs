//! PostgreSQL 连接池

use crate::config::{DatabaseSettings, Settings};
use crate::db::DatabaseProbe;
use crate::errors::AppError;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

const APPLICATION_NAME: &str = "sensorhub";

/// PostgreSQL 连接池包装
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// 按配置建立连接池，连接串来自 DATABASE_URL
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        let database_url = Settings::database_url()?;
        let options = connect_options(database_url.expose_secret(), &settings.database)?;
        let db = &settings.database;

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .acquire_timeout(Duration::from_secs(db.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(db.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "无法连接数据库");
                AppError::DatabaseError(e)
            })?;

        tracing::info!(
            max_connections = db.max_connections,
            statement_timeout_seconds = db.statement_timeout_seconds,
            "数据库连接池已创建"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 执行内嵌的 migrations/ 目录
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(format!("迁移失败: {}", e)))
    }
}

#[async_trait]
impl DatabaseProbe for PostgresPool {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::DatabaseError)
    }
}

fn connect_options(url: &str, db: &DatabaseSettings) -> Result<PgConnectOptions, AppError> {
    let mut options = PgConnectOptions::from_str(url)
        .map_err(|e| AppError::ConfigError(format!("DATABASE_URL 无效: {}", e)))?
        .application_name(APPLICATION_NAME);

    if db.require_ssl {
        options = options.ssl_mode(PgSslMode::Require);
    }
    // 大范围检索不能无限占用连接
    if db.statement_timeout_seconds > 0 {
        let timeout = format!("{}s", db.statement_timeout_seconds);
        options = options.options([("statement_timeout", timeout.as_str())]);
    }
    Ok(options)
}
