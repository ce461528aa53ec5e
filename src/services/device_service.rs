//! 设备业务服务

use crate::errors::AppError;
use crate::models::{
    ActivityReport, Device, DeviceInput, DevicePatchRequest, DeviceRequest, PageMeta,
    PageRequest,
};
use crate::query::{FilterParams, QueryOptions, Target};
use crate::repositories::{DeviceStore, ServerStore};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

/// 设备业务服务
pub struct DeviceService {
    devices: Arc<dyn DeviceStore>,
    servers: Arc<dyn ServerStore>,
    options: QueryOptions,
}

impl DeviceService {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        servers: Arc<dyn ServerStore>,
        options: QueryOptions,
    ) -> Self {
        Self {
            devices,
            servers,
            options,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Device>, AppError> {
        self.devices.find_all().await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Device, AppError> {
        self.devices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("设备 {} 不存在", id)))
    }

    pub async fn get_by_serial(&self, serial: &str) -> Result<Device, AppError> {
        self.devices
            .find_by_serial(serial)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("序列号为 {} 的设备不存在", serial)))
    }

    /// 创建设备
    pub async fn create(&self, request: DeviceRequest) -> Result<Device, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let input = DeviceInput::from(request);
        self.check_write(&input, None).await?;

        let device = self.devices.create(&input).await?;
        tracing::info!(device_id = device.id, serial = %device.serial, "设备已创建");
        Ok(device)
    }

    /// 全量更新设备
    pub async fn update(&self, id: i32, request: DeviceRequest) -> Result<Device, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.get_by_id(id).await?;
        self.write(id, DeviceInput::from(request)).await
    }

    /// 部分更新设备，未提供的字段保持不变
    pub async fn update_partial(
        &self,
        id: i32,
        request: DevicePatchRequest,
    ) -> Result<Device, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if request.is_empty() {
            return Err(AppError::BadRequest("至少需要提供一个待更新的字段".to_string()));
        }

        let current = self.get_by_id(id).await?;
        self.write(id, request.merge_into(&current)).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.devices.delete(id).await? {
            return Err(AppError::NotFound(format!("设备 {} 不存在", id)));
        }
        tracing::info!(device_id = id, "设备已删除");
        Ok(())
    }

    /// 设备活跃度报表
    ///
    /// 需要 serverIds 与时间条件；返回最后通信时间落在范围内的设备，
    /// 并附带同一范围内每个设备的消息数。
    pub async fn activity_report(
        &self,
        params: &FilterParams,
        page: PageRequest,
    ) -> Result<ActivityReport, AppError> {
        let server_ids = params.require_server_ids()?;
        let bounds = params.require_bounds(Utc::now(), self.options.tz)?;

        let existing = self.servers.find_existing_ids(server_ids).await?;
        let missing: Vec<String> = server_ids
            .iter()
            .filter(|id| !existing.contains(id))
            .map(|id| id.to_string())
            .collect();

        if existing.is_empty() {
            return Err(AppError::NotFound(format!(
                "未找到服务器: {}",
                missing.join(", ")
            )));
        }
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "以下服务器不存在: {}",
                missing.join(", ")
            )));
        }

        let predicate = params.predicate(Some(bounds), Target::Devices);
        tracing::debug!(?predicate, page = page.page, "查询设备活跃度");

        let activity = self
            .devices
            .activity_page(&predicate, Some(bounds), page)
            .await?;

        if activity.total_devices == 0 {
            return Err(AppError::NotFound(
                "没有符合条件的设备活动记录".to_string(),
            ));
        }

        Ok(ActivityReport {
            devices: activity.devices,
            total_messages: activity.total_messages,
            meta: PageMeta::new(page, activity.total_devices, activity.total_devices),
        })
    }

    async fn write(&self, id: i32, input: DeviceInput) -> Result<Device, AppError> {
        self.check_write(&input, Some(id)).await?;

        let device = self
            .devices
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("设备 {} 不存在", id)))?;

        tracing::info!(device_id = id, "设备已更新");
        Ok(device)
    }

    /// 写入前检查：序列号唯一、serverId 存在
    async fn check_write(&self, input: &DeviceInput, exclude_id: Option<i32>) -> Result<(), AppError> {
        if let Some(other) = self.devices.find_by_serial(&input.serial).await? {
            if Some(other.id) != exclude_id {
                return Err(AppError::Conflict(format!(
                    "序列号 {} 已被设备 {} 使用",
                    input.serial, other.id
                )));
            }
        }

        if self.servers.find_by_id(input.server_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "serverId {} 对应的服务器不存在",
                input.server_id
            )));
        }

        Ok(())
    }
}
