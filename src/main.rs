//! SensorHub - 物联网消息服务器、设备与遥测消息管理后端

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorhub::{
    config::{LoggingSettings, Settings},
    db::{DatabaseProbe, PostgresPool},
    handlers,
    middleware::{JwtAuth, RequestLogger, SecurityHeaders},
    query::QueryOptions,
    repositories::{
        DeviceRepository, DeviceStore, MessageRepository, MessageStore, ServerRepository,
        ServerStore,
    },
    routes,
    security::{JwtManager, PasswordCipher},
    services::{DeviceService, MessageService, ServerService, StatsService},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("配置加载失败")?;
    init_tracing(&settings.logging);
    handlers::mark_started();

    info!("SensorHub 服务启动中...");

    let options = QueryOptions::from_settings(&settings).context("查询配置无效")?;
    let cipher = Arc::new(PasswordCipher::from_env().context("加密密钥初始化失败")?);

    // 连接数据库
    let pg_pool = PostgresPool::new(&settings)
        .await
        .context("数据库连接失败")?;
    if settings.database.run_migrations {
        pg_pool.run_migrations().await.context("数据库迁移失败")?;
        info!("数据库迁移完成");
    }

    let jwt_auth = if settings.auth.enabled {
        let manager = JwtManager::new(&settings).context("JWT 初始化失败")?;
        info!(issuer = %settings.auth.issuer, "已启用 JWT 认证");
        JwtAuth::new(Arc::new(manager))
    } else {
        info!("未启用认证，请求以匿名身份处理");
        JwtAuth::disabled()
    };

    // 初始化仓库
    let server_store: Arc<dyn ServerStore> = Arc::new(ServerRepository::new(pg_pool.clone()));
    let device_store: Arc<dyn DeviceStore> = Arc::new(DeviceRepository::new(pg_pool.clone()));
    let message_store: Arc<dyn MessageStore> = Arc::new(MessageRepository::new(pg_pool.clone()));
    let db_probe: Arc<dyn DatabaseProbe> = Arc::new(pg_pool);

    // 初始化服务
    let server_service = Arc::new(ServerService::new(server_store.clone(), cipher));
    let device_service = Arc::new(DeviceService::new(
        device_store.clone(),
        server_store.clone(),
        options,
    ));
    let message_service = Arc::new(MessageService::new(
        message_store,
        device_store,
        server_store.clone(),
        options,
    ));
    let stats_service = Arc::new(StatsService::new(
        server_store,
        device_service.clone(),
        message_service.clone(),
    ));

    let server_addr = settings.server_addr();
    let workers = if settings.server.workers == 0 {
        num_cpus::get()
    } else {
        settings.server.workers
    };

    info!(addr = %server_addr, workers, timezone = %options.tz, "服务已就绪");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _req_head| {
                origin.as_bytes().starts_with(b"http://localhost")
                    || origin.as_bytes().starts_with(b"https://")
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec!["Authorization", "Content-Type", "X-Request-ID"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(SecurityHeaders::new())
            .wrap(RequestLogger::new())
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(db_probe.clone()))
            .app_data(web::Data::new(server_service.clone()))
            .app_data(web::Data::new(device_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(stats_service.clone()))
            .configure(|cfg| routes::configure(cfg, jwt_auth.clone()))
    })
    .workers(workers)
    .bind(&server_addr)
    .with_context(|| format!("无法绑定 {}", server_addr))?
    .run()
    .await?;

    Ok(())
}

/// 初始化日志系统：RUST_LOG 优先，其次使用配置的级别
fn init_tracing(logging: &LoggingSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
