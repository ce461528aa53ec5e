//! 路由配置模块

use crate::errors::AppError;
use crate::handlers;
use crate::middleware::JwtAuth;
use actix_web::web;

/// 配置所有路由
///
/// 资源路由由 `jwt_auth` 保护，健康检查公开。
pub fn configure(cfg: &mut web::ServiceConfig, jwt_auth: JwtAuth) {
    cfg
        // 请求体 / 查询串 / 路径解析失败统一返回 400
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(format!("请求体无效: {}", err)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(format!("查询参数无效: {}", err)).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(format!("路径参数无效: {}", err)).into()
        }))
        // 健康检查路由（公开）
        .service(
            web::scope("/health")
                .route("", web::get().to(handlers::health))
                .route("/detailed", web::get().to(handlers::health_detailed))
                .route("/ready", web::get().to(handlers::ready))
                .route("/live", web::get().to(handlers::live)),
        )
        .service(
            web::scope("/servers")
                .wrap(jwt_auth.clone())
                .route("", web::get().to(handlers::list_servers))
                .route("", web::post().to(handlers::create_server))
                .route("/stats", web::get().to(handlers::general_stats))
                .route("/{id}", web::get().to(handlers::get_server))
                .route("/{id}", web::put().to(handlers::update_server))
                .route("/{id}", web::delete().to(handlers::delete_server)),
        )
        .service(
            web::scope("/devices")
                .wrap(jwt_auth.clone())
                .route("", web::get().to(handlers::list_devices))
                .route("", web::post().to(handlers::create_device))
                .route("/activity", web::get().to(handlers::device_activity))
                .route("/serial/{serial}", web::get().to(handlers::get_device_by_serial))
                .route("/{id}", web::get().to(handlers::get_device))
                .route("/{id}", web::put().to(handlers::update_device))
                .route("/{id}", web::patch().to(handlers::patch_device))
                .route("/{id}", web::delete().to(handlers::delete_device)),
        )
        .service(
            web::scope("/messages")
                .wrap(jwt_auth)
                .route("", web::get().to(handlers::list_messages))
                .route("", web::post().to(handlers::create_message))
                .route("/search", web::get().to(handlers::search_messages))
                .route("/stats", web::get().to(handlers::message_stats))
                .route("/ingest", web::post().to(handlers::ingest_message))
                .route("/{id}", web::get().to(handlers::get_message))
                .route("/{id}", web::put().to(handlers::update_message))
                .route("/{id}", web::delete().to(handlers::delete_message)),
        );
}
