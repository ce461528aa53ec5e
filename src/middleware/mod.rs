//! 中间件模块

mod auth;
mod logging;
mod security_headers;

pub use auth::*;
pub use logging::*;
pub use security_headers::*;
