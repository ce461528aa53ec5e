//! 工具函数模块

mod time;
mod topic;
mod validators;

pub use time::*;
pub use topic::*;
pub use validators::*;
