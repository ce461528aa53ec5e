//! 消息服务器 API 处理器

use crate::errors::AppError;
use crate::middleware::AuthInfo;
use crate::models::{MessageResponse, ServerRequest};
use crate::services::{ServerService, StatsService};
use crate::utils::validate_id;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// 获取全部服务器
pub async fn list_servers(
    server_service: web::Data<Arc<ServerService>>,
) -> Result<HttpResponse, AppError> {
    let servers = server_service.get_all().await?;
    Ok(HttpResponse::Ok().json(servers))
}

/// 获取服务器详情
pub async fn get_server(
    server_service: web::Data<Arc<ServerService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let server = server_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(server))
}

/// 创建服务器
pub async fn create_server(
    server_service: web::Data<Arc<ServerService>>,
    body: web::Json<ServerRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let server = server_service.create(body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), server_id = server.id, "创建服务器");
    Ok(HttpResponse::Created().json(server))
}

/// 更新服务器
pub async fn update_server(
    server_service: web::Data<Arc<ServerService>>,
    path: web::Path<String>,
    body: web::Json<ServerRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let server = server_service.update(id, body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), server_id = id, "更新服务器");
    Ok(HttpResponse::Ok().json(server))
}

/// 删除服务器
pub async fn delete_server(
    server_service: web::Data<Arc<ServerService>>,
    path: web::Path<String>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    server_service.delete(id).await?;
    tracing::info!(actor = %auth.actor(), server_id = id, "删除服务器");
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("服务器 {} 已删除", id))))
}

/// 仪表盘统计
pub async fn general_stats(
    stats_service: web::Data<Arc<StatsService>>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_service.general_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
