//! 仪表盘统计测试

#[path = "../mocks/mod.rs"]
mod mocks;

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{Duration, Utc};
use helpers::{minutes_ago, TestServices};

async fn seeded() -> TestServices {
    let s = TestServices::new();
    let a = s.seed_server("localhost:1883").await;
    let b = s.seed_server("localhost:1884").await;

    s.seed_device("AB01", a, minutes_ago(10)).await;
    s.seed_device("AB02", b, minutes_ago(90)).await;
    s.seed_device("CC01", b, Utc::now() - Duration::days(3)).await;

    s.seed_message("AB01", minutes_ago(20)).await;
    s.seed_message("AB01", minutes_ago(300)).await;
    s.seed_message("AB02", minutes_ago(95)).await;
    s.seed_message("CC01", Utc::now() - Duration::days(2)).await;
    s
}

#[tokio::test]
async fn test_all_slots_filled() {
    let s = seeded().await;
    let stats = assert_ok!(s.stats.general_stats().await);

    assert_eq!(stats.active_devices, Some(1));
    assert_eq!(stats.recent_messages, Some(3));

    let weekly = stats.weekly_stats.expect("weeklyStats 应存在");
    assert_eq!(weekly.total_devices, 3);
    assert_eq!(weekly.total_items, 3);
    assert_eq!(weekly.total_messages, 4);

    assert!(stats.errors.active_devices.is_none());
    assert!(stats.errors.recent_messages.is_none());
    assert!(stats.errors.weekly_stats.is_none());
}

#[tokio::test]
async fn test_one_failing_query_only_clears_its_slot() {
    let s = seeded().await;
    s.db.fail_message_queries(true);

    let stats = assert_ok!(s.stats.general_stats().await);
    assert_eq!(stats.active_devices, Some(1));
    assert!(stats.weekly_stats.is_some());
    assert!(stats.recent_messages.is_none());

    let err = stats.errors.recent_messages.expect("应记录失败原因");
    assert_eq!(err.name, "InternalError");
    assert!(stats.errors.active_devices.is_none());
    assert!(stats.errors.weekly_stats.is_none());
}

#[tokio::test]
async fn test_no_recent_messages_keeps_other_slots() {
    let s = TestServices::new();
    let server_id = s.seed_server("localhost:1883").await;
    s.seed_device("AB01", server_id, minutes_ago(5)).await;
    // 只有两天前的消息，最近 24 小时为空
    s.seed_message("AB01", Utc::now() - Duration::days(2)).await;

    let stats = assert_ok!(s.stats.general_stats().await);
    assert_eq!(stats.active_devices, Some(1));
    assert!(stats.recent_messages.is_none());

    let weekly = stats.weekly_stats.expect("weeklyStats 应存在");
    assert_eq!(weekly.total_devices, 1);
    assert_eq!(weekly.total_messages, 1);

    assert_eq!(
        stats.errors.recent_messages.map(|e| e.name),
        Some("NotFoundError".to_string())
    );
    assert!(stats.errors.active_devices.is_none());
    assert!(stats.errors.weekly_stats.is_none());
}

#[tokio::test]
async fn test_no_servers_reports_every_slot_as_error() {
    let s = TestServices::new();
    let stats = assert_ok!(s.stats.general_stats().await);

    assert!(stats.active_devices.is_none());
    assert!(stats.recent_messages.is_none());
    assert!(stats.weekly_stats.is_none());
    assert!(stats.errors.active_devices.is_some());
    assert!(stats.errors.recent_messages.is_some());
    assert!(stats.errors.weekly_stats.is_some());
}

#[tokio::test]
async fn test_quiet_hour_is_not_found() {
    let s = TestServices::new();
    let server_id = s.seed_server("localhost:1883").await;
    s.seed_device("AB01", server_id, minutes_ago(180)).await;
    s.seed_message("AB01", minutes_ago(180)).await;

    let stats = assert_ok!(s.stats.general_stats().await);
    assert!(stats.active_devices.is_none());
    assert_eq!(
        stats.errors.active_devices.map(|e| e.name),
        Some("NotFoundError".to_string())
    );
    assert_eq!(stats.recent_messages, Some(1));
    assert_eq!(stats.weekly_stats.map(|w| w.total_devices), Some(1));
}
