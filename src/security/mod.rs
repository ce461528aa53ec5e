//! 安全模块

mod crypto;
mod jwt;

pub use crypto::*;
pub use jwt::*;
