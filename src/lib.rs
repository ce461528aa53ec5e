//! SensorHub - 物联网消息服务器、设备与遥测消息管理后端
//!
//! 支持：
//! - 消息服务器、设备、消息的增删改查
//! - 按序列号前缀、API Key、服务器、时间范围检索消息
//! - 设备活跃度报表与仪表盘统计
//! - 按服务器主题模板写入原始主题消息

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod repositories;
pub mod routes;
pub mod security;
pub mod services;
pub mod utils;

pub use errors::AppError;
