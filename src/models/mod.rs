//! 数据模型模块

mod common;
mod device;
mod filter;
mod message;
mod server;
mod stats;

pub use common::*;
pub use device::*;
pub use filter::*;
pub use message::*;
pub use server::*;
pub use stats::*;
