//! 数据库连接模块

mod postgres;

pub use postgres::PostgresPool;

use crate::errors::AppError;
use async_trait::async_trait;

/// 健康检查使用的数据库探针
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
}
