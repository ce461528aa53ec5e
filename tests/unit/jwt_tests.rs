//! JWT 单元测试

use chrono::Duration;
use sensorhub::config::AuthSettings;
use sensorhub::security::{Claims, JwtManager};

const SECRET: &str = "test-secret-with-enough-entropy-0123456789";

fn manager() -> JwtManager {
    JwtManager::from_secret(SECRET, &AuthSettings::default())
}

mod claims {
    use super::*;

    #[test]
    fn test_optional_fields_are_skipped() {
        let claims = Claims {
            sub: "ops".to_string(),
            iss: "sensorhub".to_string(),
            aud: "sensorhub-api".to_string(),
            exp: 9999999999,
            iat: 1234567800,
            role: None,
            preferred_username: None,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"sub\":\"ops\""));
        assert!(!json.contains("role"));
        assert!(!json.contains("preferred_username"));
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "sub": "user123",
            "iss": "sensorhub",
            "aud": "sensorhub-api",
            "exp": 9999999999,
            "iat": 1234567800
        }"#;

        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user123");
        assert!(claims.role.is_none());
    }
}

mod manager {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let jwt = manager();
        let token = jwt.issue("ops", Some("admin"), Duration::minutes(5)).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "ops");
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.iss, "sensorhub");
        assert_eq!(claims.aud, "sensorhub-api");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = manager().issue("ops", None, Duration::minutes(5)).unwrap();
        let other = JwtManager::from_secret("another-secret", &AuthSettings::default());

        let err = other.validate_token(&token).unwrap_err();
        assert_eq!(err.kind(), "UnauthorizedError");
    }

    #[test]
    fn test_wrong_issuer_or_audience_is_rejected() {
        let token = manager().issue("ops", None, Duration::minutes(5)).unwrap();

        let foreign_issuer = AuthSettings {
            issuer: "someone-else".to_string(),
            ..AuthSettings::default()
        };
        assert!(JwtManager::from_secret(SECRET, &foreign_issuer)
            .validate_token(&token)
            .is_err());

        let foreign_audience = AuthSettings {
            audience: "another-api".to_string(),
            ..AuthSettings::default()
        };
        assert!(JwtManager::from_secret(SECRET, &foreign_audience)
            .validate_token(&token)
            .is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = manager();
        let token = jwt.issue("ops", None, Duration::minutes(-10)).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(manager().validate_token("not.a.token").is_err());
        assert!(manager().validate_token("").is_err());
    }
}
