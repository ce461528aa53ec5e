//! 设备数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{ActivityPage, Device, DeviceActivity, DeviceInput, PageRequest};
use crate::query::{sql, DateBounds, Predicate};
use crate::repositories::DeviceStore;
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

/// 设备数据仓库
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PostgresPool,
}

impl DeviceRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

/// 追加某设备在时间窗口内的消息计数子查询
fn push_message_count(qb: &mut QueryBuilder<'_, Postgres>, window: Option<DateBounds>) {
    qb.push("(SELECT COUNT(*) FROM messages m WHERE m.serial = d.serial");
    if let Some(window) = window {
        qb.push(" AND m.timestamp >= ")
            .push_bind(window.start)
            .push(" AND m.timestamp < ")
            .push_bind(window.end);
    }
    qb.push(")");
}

#[async_trait]
impl DeviceStore for DeviceRepository {
    async fn find_all(&self) -> Result<Vec<Device>, AppError> {
        let devices = sqlx::query_as::<_, Device>("SELECT * FROM devices ORDER BY id")
            .fetch_all(self.pool.pool())
            .await?;

        Ok(devices)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(device)
    }

    async fn find_by_serial(&self, serial: &str) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE serial = $1")
            .bind(serial)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(device)
    }

    async fn create(&self, device: &DeviceInput) -> Result<Device, AppError> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (serial, apikey, last_communication, server_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&device.serial)
        .bind(&device.apikey)
        .bind(device.last_communication)
        .bind(device.server_id)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(device)
    }

    async fn update(&self, id: i32, device: &DeviceInput) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices
            SET serial = $2,
                apikey = $3,
                last_communication = $4,
                server_id = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&device.serial)
        .bind(&device.apikey)
        .bind(device.last_communication)
        .bind(device.server_id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(device)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_communication(&self, device: &DeviceInput) -> Result<Device, AppError> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (serial, apikey, last_communication, server_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (serial) DO UPDATE
            SET last_communication = GREATEST(devices.last_communication, EXCLUDED.last_communication),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&device.serial)
        .bind(&device.apikey)
        .bind(device.last_communication)
        .bind(device.server_id)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(device)
    }

    async fn activity_page(
        &self,
        predicate: &Predicate,
        window: Option<DateBounds>,
        page: PageRequest,
    ) -> Result<ActivityPage, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT d.id, d.serial, d.last_communication, d.server_id, ",
        );
        push_message_count(&mut qb, window);
        qb.push(" AS message_count FROM devices d");
        sql::push_where(&mut qb, predicate);
        qb.push(" ORDER BY d.last_communication DESC, d.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let devices = qb
            .build_query_as::<DeviceActivity>()
            .fetch_all(self.pool.pool())
            .await?;

        let mut totals = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*), COALESCE(SUM(c.message_count), 0)::BIGINT FROM (SELECT ",
        );
        push_message_count(&mut totals, window);
        totals.push(" AS message_count FROM devices d");
        sql::push_where(&mut totals, predicate);
        totals.push(") c");

        let (total_devices, total_messages) = totals
            .build_query_as::<(i64, i64)>()
            .fetch_one(self.pool.pool())
            .await?;

        tracing::debug!(
            page = page.page,
            returned = devices.len(),
            total_devices,
            total_messages,
            "活跃度报表查询完成"
        );

        Ok(ActivityPage {
            devices,
            total_devices,
            total_messages,
        })
    }
}
