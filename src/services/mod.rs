//! 业务逻辑层（Service）

mod device_service;
mod message_service;
mod server_service;
mod stats_service;

pub use device_service::DeviceService;
pub use message_service::MessageService;
pub use server_service::ServerService;
pub use stats_service::StatsService;
