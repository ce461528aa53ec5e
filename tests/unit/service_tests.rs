//! 服务层测试（基于内存数据库）

#[path = "../mocks/mod.rs"]
mod mocks;

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{Duration, Utc};
use helpers::{device_request, message_request, minutes_ago, server_request, TestServices};
use sensorhub::models::{DevicePatchRequest, FilterQuery, IngestRequest, PageRequest};
use sensorhub::query::{DateRangeToken, DateSelection, FilterParams};

fn filter(query: FilterQuery, services: &TestServices) -> (FilterParams, PageRequest) {
    FilterParams::from_query(&query, &services.options).expect("查询参数应合法")
}

mod servers {
    use super::*;

    #[tokio::test]
    async fn test_create_encrypts_password_and_defaults_template() {
        let s = TestServices::new();
        let server = assert_ok!(s.servers.create(server_request("broker", "localhost:1883")).await);

        assert_eq!(server.topic_format, "/{apikey}/{serial}/{type}");
        let stored = s.db.stored_password(server.id).unwrap();
        assert_ne!(stored, "s3cret");
        assert_eq!(assert_ok!(s.servers.reveal_password(&server)), "s3cret");
    }

    #[tokio::test]
    async fn test_endpoint_username_conflict() {
        let s = TestServices::new();
        let first = s.seed_server("localhost:1883").await;

        let err = assert_err!(s.servers.create(server_request("other", "localhost:1883")).await);
        assert_eq!(err.kind(), "ConflictError");

        // 同一 endpoint、不同 username 允许
        let mut request = server_request("other", "localhost:1883");
        request.username = "guest".to_string();
        let second = assert_ok!(s.servers.create(request).await);

        // 更新自身不算冲突，改成他人的组合则冲突
        assert_ok!(s.servers.update(first, server_request("renamed", "localhost:1883")).await);
        let err = assert_err!(s.servers.update(second.id, server_request("x", "localhost:1883")).await);
        assert_eq!(err.kind(), "ConflictError");
    }

    #[tokio::test]
    async fn test_invalid_template_and_endpoint() {
        let s = TestServices::new();
        let mut request = server_request("broker", "localhost:1883");
        request.topic_format = Some("/{serial}/data".to_string());
        let err = assert_err!(s.servers.create(request).await);
        assert_eq!(err.kind(), "BadRequestError");

        let err = assert_err!(s.servers.create(server_request("broker", "localhost:70000")).await);
        assert_eq!(err.kind(), "BadRequestError");
    }

    #[tokio::test]
    async fn test_update_keeps_template_when_absent() {
        let s = TestServices::new();
        let mut request = server_request("broker", "localhost:1883");
        request.topic_format = Some("/devices/{apikey}/{serial}".to_string());
        let server = assert_ok!(s.servers.create(request).await);

        let updated = assert_ok!(s.servers.update(server.id, server_request("renamed", "localhost:1883")).await);
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.topic_format, "/devices/{apikey}/{serial}");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_devices() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        s.seed_device("AB01", server_id, minutes_ago(1)).await;
        assert_eq!(s.db.device_count(), 1);

        assert_ok!(s.servers.delete(server_id).await);
        assert_eq!(s.db.device_count(), 0);

        let err = assert_err!(s.servers.delete(server_id).await);
        assert_eq!(err.kind(), "NotFoundError");
    }
}

mod devices {
    use super::*;

    #[tokio::test]
    async fn test_create_checks_serial_and_server() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        s.seed_device("AB01", server_id, minutes_ago(1)).await;

        let err = assert_err!(s.devices.create(device_request("AB01", server_id, Utc::now())).await);
        assert_eq!(err.kind(), "ConflictError");

        let err = assert_err!(s.devices.create(device_request("AB02", 999, Utc::now())).await);
        assert_eq!(err.kind(), "BadRequestError");
    }

    #[tokio::test]
    async fn test_lookup_and_delete() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        let id = s.seed_device("AB01", server_id, minutes_ago(1)).await;

        assert_eq!(assert_ok!(s.devices.get_by_serial("AB01").await).id, id);
        assert_eq!(assert_ok!(s.devices.get_by_id(id).await).serial, "AB01");
        assert_eq!(assert_err!(s.devices.get_by_serial("ZZ").await).kind(), "NotFoundError");

        assert_ok!(s.devices.delete(id).await);
        assert_eq!(assert_err!(s.devices.get_by_id(id).await).kind(), "NotFoundError");
        assert_eq!(assert_err!(s.devices.delete(id).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_update_serial_uniqueness_is_scoped_to_other_rows() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        let a = s.seed_device("AB01", server_id, minutes_ago(1)).await;
        s.seed_device("AB02", server_id, minutes_ago(1)).await;

        // 保留自身序列号
        assert_ok!(s.devices.update(a, device_request("AB01", server_id, Utc::now())).await);

        let err = assert_err!(s.devices.update(a, device_request("AB02", server_id, Utc::now())).await);
        assert_eq!(err.kind(), "ConflictError");

        let patch = DevicePatchRequest {
            serial: Some("AB02".to_string()),
            ..Default::default()
        };
        assert_eq!(assert_err!(s.devices.update_partial(a, patch).await).kind(), "ConflictError");

        let patch = DevicePatchRequest {
            server_id: Some(42),
            ..Default::default()
        };
        assert_eq!(assert_err!(s.devices.update_partial(a, patch).await).kind(), "BadRequestError");

        let err = assert_err!(s.devices.update_partial(a, DevicePatchRequest::default()).await);
        assert_eq!(err.kind(), "BadRequestError");
    }

    #[tokio::test]
    async fn test_partial_update_merges() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        let id = s.seed_device("AB01", server_id, minutes_ago(5)).await;

        let patch = DevicePatchRequest {
            apikey: Some("rotated".to_string()),
            ..Default::default()
        };
        let device = assert_ok!(s.devices.update_partial(id, patch).await);
        assert_eq!(device.apikey, "rotated");
        assert_eq!(device.serial, "AB01");
    }
}

mod activity {
    use super::*;

    async fn seeded() -> (TestServices, i32) {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        let other = s.seed_server("localhost:1884").await;

        s.seed_device("AB01", server_id, minutes_ago(10)).await;
        s.seed_device("AB02", server_id, minutes_ago(30)).await;
        s.seed_device("CC01", other, minutes_ago(20)).await;
        s.seed_device("OLD1", server_id, Utc::now() - Duration::days(3)).await;

        s.seed_message("AB01", minutes_ago(12)).await;
        s.seed_message("AB01", minutes_ago(11)).await;
        s.seed_message("AB02", minutes_ago(40)).await;
        // 时间范围之外
        s.seed_message("AB01", minutes_ago(120)).await;
        (s, server_id)
    }

    #[tokio::test]
    async fn test_report_counts_and_order() {
        let (s, server_id) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(server_id.to_string()),
                date_range: Some("last_hour".to_string()),
                ..Default::default()
            },
            &s,
        );

        let report = assert_ok!(s.devices.activity_report(&params, page).await);
        let serials: Vec<&str> = report.devices.iter().map(|d| d.serial.as_str()).collect();
        assert_eq!(serials, vec!["AB01", "AB02"]);
        assert_eq!(report.devices[0].message_count, 2);
        assert_eq!(report.devices[1].message_count, 1);
        assert_eq!(report.meta.total_items, 2);
        assert_eq!(report.meta.total_devices, 2);
        assert_eq!(report.total_messages, 3);
    }

    #[tokio::test]
    async fn test_requires_server_ids_and_dates() {
        let (s, server_id) = seeded().await;

        let (params, page) = filter(
            FilterQuery {
                date_range: Some("last_hour".to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.devices.activity_report(&params, page).await).kind(), "BadRequestError");

        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(server_id.to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.devices.activity_report(&params, page).await).kind(), "BadRequestError");
    }

    #[tokio::test]
    async fn test_missing_server_ids() {
        let (s, server_id) = seeded().await;

        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(format!("{},98,97", server_id)),
                date_range: Some("last_hour".to_string()),
                ..Default::default()
            },
            &s,
        );
        let err = assert_err!(s.devices.activity_report(&params, page).await);
        assert_eq!(err.kind(), "BadRequestError");
        assert!(err.public_message().contains("97, 98"));

        let (params, page) = filter(
            FilterQuery {
                server_ids: Some("98".to_string()),
                date_range: Some("last_hour".to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.devices.activity_report(&params, page).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let (s, server_id) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(server_id.to_string()),
                date_range: Some("last_5_minutes".to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.devices.activity_report(&params, page).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_pagination() {
        let (s, server_id) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(server_id.to_string()),
                date_range: Some("last_week".to_string()),
                page: Some(2),
                limit: Some(2),
                ..Default::default()
            },
            &s,
        );
        let report = assert_ok!(s.devices.activity_report(&params, page).await);
        assert_eq!(report.meta.total_items, 3);
        assert_eq!(report.meta.total_pages, 2);
        assert!(report.meta.has_previous_page);
        assert!(!report.meta.has_next_page);
        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.devices[0].serial, "OLD1");
    }
}

mod messages {
    use super::*;

    async fn seeded() -> (TestServices, i32, i32) {
        let s = TestServices::new();
        let a = s.seed_server("localhost:1883").await;
        let b = s.seed_server("localhost:1884").await;
        s.seed_device("AB01", a, minutes_ago(1)).await;
        s.seed_device("AB99", a, minutes_ago(1)).await;
        s.seed_device("CC01", b, minutes_ago(1)).await;

        for minutes in [5, 15, 25] {
            s.seed_message("AB01", minutes_ago(minutes)).await;
        }
        s.seed_message("AB99", minutes_ago(7)).await;
        s.seed_message("CC01", minutes_ago(3)).await;
        (s, a, b)
    }

    #[tokio::test]
    async fn test_create_requires_existing_device() {
        let s = TestServices::new();
        let err = assert_err!(s.messages.create(message_request("NOPE", Utc::now())).await);
        assert_eq!(err.kind(), "BadRequestError");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (s, _, _) = seeded().await;
        let id = s.seed_message("AB01", minutes_ago(1)).await;

        let mut request = message_request("AB99", minutes_ago(2));
        request.topic = "humidity".to_string();
        let updated = assert_ok!(s.messages.update(id, request).await);
        assert_eq!(updated.serial, "AB99");
        assert_eq!(updated.topic, "humidity");

        let err = assert_err!(s.messages.update(id, message_request("NOPE", Utc::now())).await);
        assert_eq!(err.kind(), "BadRequestError");

        assert_ok!(s.messages.delete(id).await);
        assert_eq!(assert_err!(s.messages.get_by_id(id).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_prefix_search_counts_distinct_devices() {
        let (s, _, _) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                serial: Some("AB".to_string()),
                ..Default::default()
            },
            &s,
        );

        let result = assert_ok!(s.messages.search(&params, page).await);
        assert_eq!(result.meta.total_items, 4);
        assert_eq!(result.meta.total_devices, 2);
        assert!(result.meta.total_devices <= result.meta.total_items);
        assert!(result.messages.iter().all(|m| m.serial.starts_with("AB")));

        // 时间倒序
        let times: Vec<_> = result.messages.iter().map(|m| m.timestamp).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_search_by_server_and_apikey() {
        let (s, a, b) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                server_ids: Some(b.to_string()),
                ..Default::default()
            },
            &s,
        );
        let result = assert_ok!(s.messages.search(&params, page).await);
        assert_eq!(result.meta.total_items, 1);
        assert_eq!(result.messages[0].serial, "CC01");

        let (params, page) = filter(
            FilterQuery {
                apikey: Some("key-AB99".to_string()),
                server_ids: Some(a.to_string()),
                ..Default::default()
            },
            &s,
        );
        let result = assert_ok!(s.messages.search(&params, page).await);
        assert_eq!(result.meta.total_items, 1);

        // apikey 精确匹配
        let (params, page) = filter(
            FilterQuery {
                apikey: Some("key-AB".to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.messages.search(&params, page).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_search_pagination_metadata() {
        let (s, _, _) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                limit: Some(2),
                page: Some(2),
                ..Default::default()
            },
            &s,
        );
        let result = assert_ok!(s.messages.search(&params, page).await);
        assert_eq!(result.meta.total_items, 5);
        assert_eq!(result.meta.total_pages, 3);
        assert_eq!(result.messages.len(), 2);
        assert!(result.meta.has_next_page);
        assert!(result.meta.has_previous_page);
    }

    #[tokio::test]
    async fn test_search_with_date_range() {
        let (s, _, _) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                date_range: Some("last_15_minutes".to_string()),
                ..Default::default()
            },
            &s,
        );
        let result = assert_ok!(s.messages.search(&params, page).await);
        // 5、7、3 分钟前的三条
        assert_eq!(result.meta.total_items, 3);
        assert_eq!(result.meta.total_devices, 3);
    }

    #[tokio::test]
    async fn test_repeated_search_is_stable() {
        let (s, _, _) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                limit: Some(3),
                ..Default::default()
            },
            &s,
        );
        let first = assert_ok!(s.messages.search(&params, page).await);
        let second = assert_ok!(s.messages.search(&params, page).await);

        let ids = |r: &sensorhub::models::MessageSearchResult| -> Vec<i32> {
            r.messages.iter().map(|m| m.id).collect()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.meta, second.meta);
    }

    #[tokio::test]
    async fn test_empty_search_is_not_found() {
        let (s, _, _) = seeded().await;
        let (params, page) = filter(
            FilterQuery {
                serial: Some("ZZ".to_string()),
                ..Default::default()
            },
            &s,
        );
        assert_eq!(assert_err!(s.messages.search(&params, page).await).kind(), "NotFoundError");
        assert_eq!(assert_err!(s.messages.stats(&params).await).kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_stats_timeline_is_ascending() {
        let (s, _, _) = seeded().await;
        let params = FilterParams {
            serial: Some("AB01".to_string()),
            apikey: None,
            server_ids: None,
            dates: DateSelection::Named(DateRangeToken::Last24Hours),
        };
        let points = assert_ok!(s.messages.stats(&params).await);
        assert_eq!(points.len(), 3);
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_deleted_device_drops_out_of_search() {
        let (s, _, b) = seeded().await;
        assert_ok!(s.servers.delete(b).await);

        let (params, page) = filter(FilterQuery::default(), &s);
        let result = assert_ok!(s.messages.search(&params, page).await);
        assert_eq!(result.meta.total_items, 4);
        assert!(result.messages.iter().all(|m| m.serial != "CC01"));
    }
}

mod ingest {
    use super::*;

    #[tokio::test]
    async fn test_ingest_creates_device_and_message() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;

        let message = assert_ok!(
            s.messages
                .ingest(IngestRequest {
                    server_id,
                    topic: "/k1/AB01/temperature".to_string(),
                    payload: serde_json::json!({ "value": 20 }),
                    timestamp: Some(minutes_ago(3)),
                })
                .await
        );
        assert_eq!(message.serial, "AB01");
        assert_eq!(message.topic, "temperature");

        let device = assert_ok!(s.devices.get_by_serial("AB01").await);
        assert_eq!(device.apikey, "k1");
        assert_eq!(device.server_id, server_id);
        assert_eq!(device.last_communication, message.timestamp);
    }

    #[tokio::test]
    async fn test_ingest_never_moves_last_communication_backwards() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;
        let recent = minutes_ago(1);
        s.seed_device("AB01", server_id, recent).await;

        assert_ok!(
            s.messages
                .ingest(IngestRequest {
                    server_id,
                    topic: "/key-AB01/AB01/temperature".to_string(),
                    payload: serde_json::json!({}),
                    timestamp: Some(minutes_ago(30)),
                })
                .await
        );
        let device = assert_ok!(s.devices.get_by_serial("AB01").await);
        assert_eq!(device.last_communication, recent);
    }

    #[tokio::test]
    async fn test_ingest_errors() {
        let s = TestServices::new();
        let server_id = s.seed_server("localhost:1883").await;

        let err = assert_err!(
            s.messages
                .ingest(IngestRequest {
                    server_id: 999,
                    topic: "/k/AB01/t".to_string(),
                    payload: serde_json::json!({}),
                    timestamp: None,
                })
                .await
        );
        assert_eq!(err.kind(), "NotFoundError");

        let err = assert_err!(
            s.messages
                .ingest(IngestRequest {
                    server_id,
                    topic: "no-slashes".to_string(),
                    payload: serde_json::json!({}),
                    timestamp: None,
                })
                .await
        );
        assert_eq!(err.kind(), "BadRequestError");
    }
}
