//! 消息 API 处理器

use crate::errors::AppError;
use crate::middleware::AuthInfo;
use crate::models::{FilterQuery, IngestRequest, MessageRequest, MessageResponse};
use crate::query::{FilterParams, QueryOptions};
use crate::services::MessageService;
use crate::utils::validate_id;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// 获取全部消息
pub async fn list_messages(
    message_service: web::Data<Arc<MessageService>>,
) -> Result<HttpResponse, AppError> {
    let messages = message_service.get_all().await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// 获取消息详情
pub async fn get_message(
    message_service: web::Data<Arc<MessageService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let message = message_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// 创建消息
pub async fn create_message(
    message_service: web::Data<Arc<MessageService>>,
    body: web::Json<MessageRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let message = message_service.create(body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), message_id = message.id, "创建消息");
    Ok(HttpResponse::Created().json(message))
}

/// 更新消息
pub async fn update_message(
    message_service: web::Data<Arc<MessageService>>,
    path: web::Path<String>,
    body: web::Json<MessageRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let message = message_service.update(id, body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), message_id = id, "更新消息");
    Ok(HttpResponse::Ok().json(message))
}

/// 删除消息
pub async fn delete_message(
    message_service: web::Data<Arc<MessageService>>,
    path: web::Path<String>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    message_service.delete(id).await?;
    tracing::info!(actor = %auth.actor(), message_id = id, "删除消息");
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("消息 {} 已删除", id))))
}

/// 检索消息
pub async fn search_messages(
    message_service: web::Data<Arc<MessageService>>,
    options: web::Data<QueryOptions>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let (params, page) = FilterParams::from_query(&query, &options)?;
    let result = message_service.search(&params, page).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// 消息时间分布
pub async fn message_stats(
    message_service: web::Data<Arc<MessageService>>,
    options: web::Data<QueryOptions>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let (params, _) = FilterParams::from_query(&query, &options)?;
    let points = message_service.stats(&params).await?;
    Ok(HttpResponse::Ok().json(points))
}

/// 按主题写入消息
pub async fn ingest_message(
    message_service: web::Data<Arc<MessageService>>,
    body: web::Json<IngestRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let message = message_service.ingest(body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), message_id = message.id, serial = %message.serial, "写入主题消息");
    Ok(HttpResponse::Created().json(message))
}
