//! 消息服务器业务服务

use crate::errors::AppError;
use crate::models::{NewServer, Server, ServerRequest, DEFAULT_TOPIC_FORMAT};
use crate::repositories::ServerStore;
use crate::security::PasswordCipher;
use crate::utils::TopicTemplate;
use std::sync::Arc;
use validator::Validate;

/// 消息服务器业务服务
pub struct ServerService {
    servers: Arc<dyn ServerStore>,
    cipher: Arc<PasswordCipher>,
}

impl ServerService {
    pub fn new(servers: Arc<dyn ServerStore>, cipher: Arc<PasswordCipher>) -> Self {
        Self { servers, cipher }
    }

    pub async fn get_all(&self) -> Result<Vec<Server>, AppError> {
        self.servers.find_all().await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Server, AppError> {
        self.servers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("服务器 {} 不存在", id)))
    }

    /// 创建服务器
    pub async fn create(&self, request: ServerRequest) -> Result<Server, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let topic_format = request
            .topic_format
            .clone()
            .unwrap_or_else(|| DEFAULT_TOPIC_FORMAT.to_string());
        TopicTemplate::parse(&topic_format)?;

        self.ensure_unique(&request.endpoint, &request.username, None)
            .await?;

        let server = self
            .servers
            .create(&self.seal(request, topic_format)?)
            .await?;

        tracing::info!(server_id = server.id, endpoint = %server.endpoint, "服务器已创建");
        Ok(server)
    }

    /// 全量更新服务器；未提供 topicFormat 时保留原模板
    pub async fn update(&self, id: i32, request: ServerRequest) -> Result<Server, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let current = self.get_by_id(id).await?;
        let topic_format = request
            .topic_format
            .clone()
            .unwrap_or(current.topic_format);
        TopicTemplate::parse(&topic_format)?;

        self.ensure_unique(&request.endpoint, &request.username, Some(id))
            .await?;

        let server = self
            .servers
            .update(id, &self.seal(request, topic_format)?)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("服务器 {} 不存在", id)))?;

        tracing::info!(server_id = id, "服务器已更新");
        Ok(server)
    }

    /// 删除服务器（其下设备一并删除）
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.servers.delete(id).await? {
            return Err(AppError::NotFound(format!("服务器 {} 不存在", id)));
        }
        tracing::info!(server_id = id, "服务器已删除");
        Ok(())
    }

    /// 解密服务器密码，供连接消息服务器时使用
    pub fn reveal_password(&self, server: &Server) -> Result<String, AppError> {
        self.cipher.open(&server.password)
    }

    async fn ensure_unique(
        &self,
        endpoint: &str,
        username: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        let existing = self
            .servers
            .find_by_endpoint_and_username(endpoint, username)
            .await?;

        match existing {
            Some(other) if Some(other.id) != exclude_id => Err(AppError::Conflict(format!(
                "endpoint {} 与 username {} 的组合已被服务器 {} 使用",
                endpoint, username, other.id
            ))),
            _ => Ok(()),
        }
    }

    fn seal(&self, request: ServerRequest, topic_format: String) -> Result<NewServer, AppError> {
        Ok(NewServer {
            encrypted_password: self.cipher.seal(&request.password)?,
            name: request.name,
            endpoint: request.endpoint,
            username: request.username,
            topic_format,
        })
    }
}
