//! 设备管理 API 处理器

use crate::errors::AppError;
use crate::middleware::AuthInfo;
use crate::models::{DevicePatchRequest, DeviceRequest, FilterQuery, MessageResponse};
use crate::query::{FilterParams, QueryOptions};
use crate::services::DeviceService;
use crate::utils::validate_id;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// 获取全部设备
pub async fn list_devices(
    device_service: web::Data<Arc<DeviceService>>,
) -> Result<HttpResponse, AppError> {
    let devices = device_service.get_all().await?;
    Ok(HttpResponse::Ok().json(devices))
}

/// 获取设备详情
pub async fn get_device(
    device_service: web::Data<Arc<DeviceService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let device = device_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(device))
}

/// 按序列号获取设备
pub async fn get_device_by_serial(
    device_service: web::Data<Arc<DeviceService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let device = device_service.get_by_serial(&path).await?;
    Ok(HttpResponse::Ok().json(device))
}

/// 创建设备
pub async fn create_device(
    device_service: web::Data<Arc<DeviceService>>,
    body: web::Json<DeviceRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let device = device_service.create(body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), device_id = device.id, "创建设备");
    Ok(HttpResponse::Created().json(device))
}

/// 全量更新设备
pub async fn update_device(
    device_service: web::Data<Arc<DeviceService>>,
    path: web::Path<String>,
    body: web::Json<DeviceRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let device = device_service.update(id, body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), device_id = id, "更新设备");
    Ok(HttpResponse::Ok().json(device))
}

/// 部分更新设备
pub async fn patch_device(
    device_service: web::Data<Arc<DeviceService>>,
    path: web::Path<String>,
    body: web::Json<DevicePatchRequest>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    let device = device_service.update_partial(id, body.into_inner()).await?;
    tracing::info!(actor = %auth.actor(), device_id = id, "部分更新设备");
    Ok(HttpResponse::Ok().json(device))
}

/// 删除设备
pub async fn delete_device(
    device_service: web::Data<Arc<DeviceService>>,
    path: web::Path<String>,
    auth: web::ReqData<AuthInfo>,
) -> Result<HttpResponse, AppError> {
    let id = validate_id(&path)?;
    device_service.delete(id).await?;
    tracing::info!(actor = %auth.actor(), device_id = id, "删除设备");
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("设备 {} 已删除", id))))
}

/// 设备活跃度报表
pub async fn device_activity(
    device_service: web::Data<Arc<DeviceService>>,
    options: web::Data<QueryOptions>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let (params, page) = FilterParams::from_query(&query, &options)?;
    let report = device_service.activity_report(&params, page).await?;
    Ok(HttpResponse::Ok().json(report))
}
