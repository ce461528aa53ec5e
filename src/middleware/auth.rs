//! 认证中间件
//!
//! 未配置 [`JwtManager`] 时所有请求以匿名身份放行。

use crate::errors::AppError;
use crate::security::JwtManager;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// 认证信息（存储在请求扩展中）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub subject: String,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl AuthInfo {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            username: None,
            role: None,
        }
    }

    /// 日志中使用的操作者名称
    pub fn actor(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.subject)
    }
}

/// 不需要认证的路径前缀
const PUBLIC_PREFIXES: [&str; 1] = ["/health"];

/// JWT 认证中间件
#[derive(Clone)]
pub struct JwtAuth {
    jwt_manager: Option<Arc<JwtManager>>,
}

impl JwtAuth {
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self {
            jwt_manager: Some(jwt_manager),
        }
    }

    pub fn disabled() -> Self {
        Self { jwt_manager: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthMiddleware {
            service: Rc::new(service),
            jwt_manager: self.jwt_manager.clone(),
        })
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    jwt_manager: Option<Arc<JwtManager>>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_manager = self.jwt_manager.clone();

        Box::pin(async move {
            let is_public = PUBLIC_PREFIXES.iter().any(|p| req.path().starts_with(p));

            let auth_info = match jwt_manager {
                Some(manager) if !is_public => {
                    let token = req
                        .headers()
                        .get(AUTHORIZATION)
                        .and_then(|h| h.to_str().ok())
                        .and_then(|h| h.strip_prefix("Bearer "))
                        .ok_or_else(|| AppError::Unauthorized("缺少认证令牌".to_string()))?;

                    let claims = manager.validate_token(token)?;
                    AuthInfo {
                        subject: claims.sub,
                        username: claims.preferred_username,
                        role: claims.role,
                    }
                }
                _ => AuthInfo::anonymous(),
            };

            req.extensions_mut().insert(auth_info);
            service.call(req).await
        })
    }
}
