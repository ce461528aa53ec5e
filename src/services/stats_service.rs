//! 仪表盘统计服务
//!
//! 三个子查询并发执行，任何一个失败只影响自身字段。

use crate::errors::AppError;
use crate::models::{ErrorInfo, GeneralStats, PageRequest, StatsErrors, WeeklyStats};
use crate::query::{DateRangeToken, DateSelection, FilterParams};
use crate::repositories::ServerStore;
use crate::services::{DeviceService, MessageService};
use std::sync::Arc;

/// 仪表盘统计服务
pub struct StatsService {
    servers: Arc<dyn ServerStore>,
    devices: Arc<DeviceService>,
    messages: Arc<MessageService>,
}

impl StatsService {
    pub fn new(
        servers: Arc<dyn ServerStore>,
        devices: Arc<DeviceService>,
        messages: Arc<MessageService>,
    ) -> Self {
        Self {
            servers,
            devices,
            messages,
        }
    }

    /// 汇总最近一小时活跃设备、最近 24 小时消息数与最近一周覆盖情况
    pub async fn general_stats(&self) -> Result<GeneralStats, AppError> {
        let server_ids: Vec<i32> = self
            .servers
            .find_all()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let params = |token| FilterParams {
            serial: None,
            apikey: None,
            server_ids: Some(server_ids.clone()),
            dates: DateSelection::Named(token),
        };
        let last_hour = params(DateRangeToken::LastHour);
        let last_day = params(DateRangeToken::Last24Hours);
        let last_week = params(DateRangeToken::LastWeek);
        let page = PageRequest::default();

        let (active, recent, weekly) = tokio::join!(
            self.devices.activity_report(&last_hour, page),
            self.messages.search(&last_day, page),
            self.devices.activity_report(&last_week, page),
        );

        let (active_devices, active_err) = settle("activeDevices", active.map(|r| r.meta.total_devices));
        let (recent_messages, recent_err) = settle("recentMessages", recent.map(|r| r.meta.total_items));
        let (weekly_stats, weekly_err) = settle(
            "weeklyStats",
            weekly.map(|r| WeeklyStats {
                total_devices: r.meta.total_devices,
                total_items: r.meta.total_items,
                total_messages: r.total_messages,
            }),
        );

        Ok(GeneralStats {
            active_devices,
            recent_messages,
            weekly_stats,
            errors: StatsErrors {
                active_devices: active_err,
                recent_messages: recent_err,
                weekly_stats: weekly_err,
            },
        })
    }
}

fn settle<T>(slot: &str, result: Result<T, AppError>) -> (Option<T>, Option<ErrorInfo>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(e) => {
            tracing::warn!(slot, error = %e, "统计子查询失败");
            (None, Some(ErrorInfo::from(&e)))
        }
    }
}
