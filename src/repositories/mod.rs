//! 数据访问层（Repository）
//!
//! 服务层只依赖这里定义的存储 trait，Postgres 实现与测试用的内存实现可互换。

mod device_repo;
mod message_repo;
mod server_repo;

pub use device_repo::DeviceRepository;
pub use message_repo::MessageRepository;
pub use server_repo::ServerRepository;

use crate::errors::AppError;
use crate::models::{
    ActivityPage, Device, DeviceInput, Message, MessageInput, MessagePoint, NewServer,
    PageRequest, Server,
};
use crate::query::{DateBounds, Predicate};
use async_trait::async_trait;

/// 服务器存储
#[async_trait]
pub trait ServerStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Server>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Server>, AppError>;

    async fn find_by_endpoint_and_username(
        &self,
        endpoint: &str,
        username: &str,
    ) -> Result<Option<Server>, AppError>;

    /// 返回 `ids` 中实际存在的 ID
    async fn find_existing_ids(&self, ids: &[i32]) -> Result<Vec<i32>, AppError>;

    async fn create(&self, server: &NewServer) -> Result<Server, AppError>;

    /// 记录不存在时返回 `None`
    async fn update(&self, id: i32, server: &NewServer) -> Result<Option<Server>, AppError>;

    /// 返回是否删除了记录
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

/// 设备存储
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Device>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Device>, AppError>;

    async fn find_by_serial(&self, serial: &str) -> Result<Option<Device>, AppError>;

    async fn create(&self, device: &DeviceInput) -> Result<Device, AppError>;

    async fn update(&self, id: i32, device: &DeviceInput) -> Result<Option<Device>, AppError>;

    async fn delete(&self, id: i32) -> Result<bool, AppError>;

    /// 按序列号插入设备；已存在时只把最后通信时间向后推进
    async fn record_communication(&self, device: &DeviceInput) -> Result<Device, AppError>;

    /// 活跃度报表的一页
    ///
    /// `window` 同时约束每个设备的消息计数；排序为最后通信时间倒序、ID 倒序。
    async fn activity_page(
        &self,
        predicate: &Predicate,
        window: Option<DateBounds>,
        page: PageRequest,
    ) -> Result<ActivityPage, AppError>;
}

/// 消息存储
///
/// 检索类方法都经由 `serial` 关联设备，没有对应设备的消息不会被检索到。
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Message>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Message>, AppError>;

    async fn create(&self, message: &MessageInput) -> Result<Message, AppError>;

    async fn update(&self, id: i32, message: &MessageInput) -> Result<Option<Message>, AppError>;

    async fn delete(&self, id: i32) -> Result<bool, AppError>;

    /// 按时间倒序、ID 倒序分页
    async fn search_page(
        &self,
        predicate: &Predicate,
        page: PageRequest,
    ) -> Result<Vec<Message>, AppError>;

    async fn count(&self, predicate: &Predicate) -> Result<i64, AppError>;

    /// 命中消息中不同序列号的数量
    async fn count_distinct_devices(&self, predicate: &Predicate) -> Result<i64, AppError>;

    /// 全部命中消息的 (id, timestamp)，按时间正序
    async fn timeline(&self, predicate: &Predicate) -> Result<Vec<MessagePoint>, AppError>;
}
