//! 测试辅助工具

#![allow(dead_code)]

use crate::mocks::InMemoryDb;
use chrono::{DateTime, Duration, Utc};
use sensorhub::models::{DeviceRequest, MessageRequest, ServerRequest};
use sensorhub::query::QueryOptions;
use sensorhub::repositories::{DeviceStore, MessageStore, ServerStore};
use sensorhub::security::{generate_encryption_key, PasswordCipher};
use sensorhub::services::{DeviceService, MessageService, ServerService, StatsService};
use std::sync::Arc;

/// 断言结果是成功的
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// 断言结果是错误的
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(e) => e,
        }
    };
}

/// 基于同一个内存数据库的全部服务
pub struct TestServices {
    pub db: Arc<InMemoryDb>,
    pub options: QueryOptions,
    pub servers: Arc<ServerService>,
    pub devices: Arc<DeviceService>,
    pub messages: Arc<MessageService>,
    pub stats: Arc<StatsService>,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_options(QueryOptions::default())
    }

    pub fn with_options(options: QueryOptions) -> Self {
        let db = Arc::new(InMemoryDb::new());
        let server_store: Arc<dyn ServerStore> = db.clone();
        let device_store: Arc<dyn DeviceStore> = db.clone();
        let message_store: Arc<dyn MessageStore> = db.clone();

        let cipher = Arc::new(
            PasswordCipher::new(&generate_encryption_key().expect("生成密钥失败"))
                .expect("创建加密器失败"),
        );

        let servers = Arc::new(ServerService::new(server_store.clone(), cipher));
        let devices = Arc::new(DeviceService::new(
            device_store.clone(),
            server_store.clone(),
            options,
        ));
        let messages = Arc::new(MessageService::new(
            message_store,
            device_store,
            server_store.clone(),
            options,
        ));
        let stats = Arc::new(StatsService::new(
            server_store,
            devices.clone(),
            messages.clone(),
        ));

        Self {
            db,
            options,
            servers,
            devices,
            messages,
            stats,
        }
    }

    /// 创建一台服务器并返回其 ID
    pub async fn seed_server(&self, endpoint: &str) -> i32 {
        self.servers
            .create(server_request("broker", endpoint))
            .await
            .expect("创建服务器失败")
            .id
    }

    /// 创建一台设备并返回其 ID
    pub async fn seed_device(&self, serial: &str, server_id: i32, last: DateTime<Utc>) -> i32 {
        self.devices
            .create(device_request(serial, server_id, last))
            .await
            .expect("创建设备失败")
            .id
    }

    /// 为设备写入一条消息
    pub async fn seed_message(&self, serial: &str, timestamp: DateTime<Utc>) -> i32 {
        self.messages
            .create(message_request(serial, timestamp))
            .await
            .expect("创建消息失败")
            .id
    }
}

pub fn server_request(name: &str, endpoint: &str) -> ServerRequest {
    ServerRequest {
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        username: "admin".to_string(),
        password: "s3cret".to_string(),
        topic_format: None,
    }
}

pub fn device_request(serial: &str, server_id: i32, last: DateTime<Utc>) -> DeviceRequest {
    DeviceRequest {
        serial: serial.to_string(),
        apikey: format!("key-{}", serial),
        last_communication: last,
        server_id,
    }
}

pub fn message_request(serial: &str, timestamp: DateTime<Utc>) -> MessageRequest {
    MessageRequest {
        serial: serial.to_string(),
        timestamp,
        topic: "temperature".to_string(),
        content: serde_json::json!({ "value": 21.5 }),
    }
}

/// 当前时间之前若干分钟
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}
