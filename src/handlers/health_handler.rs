//! 健康检查 API 处理器

use crate::db::DatabaseProbe;
use crate::models::{HealthCheckResponse, ServiceStatus};
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

/// 应用启动时间
static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// 简单健康检查（用于负载均衡器）
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok"
    }))
}

/// 详细健康检查
pub async fn health_detailed(db: web::Data<Arc<dyn DatabaseProbe>>) -> HttpResponse {
    let db_start = Instant::now();
    let database = match db.ping().await {
        Ok(_) => ServiceStatus::healthy(db_start.elapsed().as_millis() as u64),
        Err(_) => ServiceStatus::unhealthy(),
    };

    let status = if database.status == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        uptime_seconds: START_TIME.elapsed().as_secs(),
    })
}

/// 就绪检查：数据库不可达时返回 503
pub async fn ready(db: web::Data<Arc<dyn DatabaseProbe>>) -> HttpResponse {
    match db.ping().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "ready": true })),
        Err(e) => {
            tracing::warn!(error = %e, "数据库不可达");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "database": false
            }))
        }
    }
}

/// 存活检查
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "alive": true
    }))
}

/// 在启动时记录时间，使 uptime 从进程启动算起
pub fn mark_started() {
    once_cell::sync::Lazy::force(&START_TIME);
}
