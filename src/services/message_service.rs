//! 消息业务服务

use crate::errors::AppError;
use crate::models::{
    DeviceInput, IngestRequest, Message, MessageInput, MessagePoint, MessageRequest,
    MessageSearchResult, PageMeta, PageRequest,
};
use crate::query::{FilterParams, QueryOptions, Target};
use crate::repositories::{DeviceStore, MessageStore, ServerStore};
use crate::utils::TopicTemplate;
use chrono::Utc;
use std::sync::Arc;

/// 消息业务服务
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    devices: Arc<dyn DeviceStore>,
    servers: Arc<dyn ServerStore>,
    options: QueryOptions,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        devices: Arc<dyn DeviceStore>,
        servers: Arc<dyn ServerStore>,
        options: QueryOptions,
    ) -> Self {
        Self {
            messages,
            devices,
            servers,
            options,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Message>, AppError> {
        self.messages.find_all().await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Message, AppError> {
        self.messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("消息 {} 不存在", id)))
    }

    pub async fn create(&self, request: MessageRequest) -> Result<Message, AppError> {
        request.check()?;
        self.ensure_device(&request.serial).await?;

        let message = self.messages.create(&MessageInput::from(request)).await?;
        tracing::info!(message_id = message.id, serial = %message.serial, "消息已创建");
        Ok(message)
    }

    pub async fn update(&self, id: i32, request: MessageRequest) -> Result<Message, AppError> {
        request.check()?;
        self.get_by_id(id).await?;
        self.ensure_device(&request.serial).await?;

        let message = self
            .messages
            .update(id, &MessageInput::from(request))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("消息 {} 不存在", id)))?;

        tracing::info!(message_id = id, "消息已更新");
        Ok(message)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.messages.delete(id).await? {
            return Err(AppError::NotFound(format!("消息 {} 不存在", id)));
        }
        tracing::info!(message_id = id, "消息已删除");
        Ok(())
    }

    /// 分页检索消息，同时统计命中消息数与涉及的设备数
    pub async fn search(
        &self,
        params: &FilterParams,
        page: PageRequest,
    ) -> Result<MessageSearchResult, AppError> {
        let bounds = params.dates.bounds(Utc::now(), self.options.tz);
        let predicate = params.predicate(bounds, Target::Messages);
        tracing::debug!(?predicate, page = page.page, "检索消息");

        let (total_items, total_devices, messages) = tokio::try_join!(
            self.messages.count(&predicate),
            self.messages.count_distinct_devices(&predicate),
            self.messages.search_page(&predicate, page),
        )?;

        if total_items == 0 {
            return Err(AppError::NotFound("没有符合条件的消息".to_string()));
        }

        Ok(MessageSearchResult {
            messages,
            meta: PageMeta::new(page, total_items, total_devices),
        })
    }

    /// 图表用的全部命中点，按时间正序
    pub async fn stats(&self, params: &FilterParams) -> Result<Vec<MessagePoint>, AppError> {
        let bounds = params.dates.bounds(Utc::now(), self.options.tz);
        let predicate = params.predicate(bounds, Target::Messages);

        let points = self.messages.timeline(&predicate).await?;
        if points.is_empty() {
            return Err(AppError::NotFound("没有符合条件的消息".to_string()));
        }
        Ok(points)
    }

    /// 按服务器的主题模板解析原始主题并写入消息
    ///
    /// 设备不存在时自动创建；存在时只推进其最后通信时间。
    pub async fn ingest(&self, request: IngestRequest) -> Result<Message, AppError> {
        request.check()?;

        let server = self
            .servers
            .find_by_id(request.server_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("服务器 {} 不存在", request.server_id)))?;

        let fields = TopicTemplate::parse(&server.topic_format)?.extract(&request.topic)?;
        let timestamp = request.timestamp.unwrap_or_else(Utc::now);

        let device = self
            .devices
            .record_communication(&DeviceInput {
                serial: fields.serial,
                apikey: fields.apikey,
                last_communication: timestamp,
                server_id: server.id,
            })
            .await?;

        let message = self
            .messages
            .create(&MessageInput {
                serial: device.serial,
                timestamp,
                topic: fields.kind.unwrap_or_default(),
                content: request.payload,
            })
            .await?;

        tracing::info!(
            message_id = message.id,
            serial = %message.serial,
            server_id = server.id,
            "主题消息已写入"
        );
        Ok(message)
    }

    async fn ensure_device(&self, serial: &str) -> Result<(), AppError> {
        match self.devices.find_by_serial(serial).await? {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest(format!(
                "序列号为 {} 的设备不存在",
                serial
            ))),
        }
    }
}
