mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use url_redirector::domain::alphabet::Alphabet;
use url_redirector::domain::repositories::{AliasRepository, MappingRepository, PathAlias};

#[tokio::test]
async fn test_shorten_success() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/some/long/path" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    let expected_code = Alphabet::default().encode(147);
    assert_eq!(json["code"], expected_code.as_str());
    assert_eq!(
        json["short_url"],
        format!("{}/{expected_code}", common::BASE_URL)
    );
    assert_eq!(json["destination"], "https://example.com/some/long/path");
    assert!(json.get("expires_at").is_none());

    let stored = app
        .mappings
        .find_by_code(&expected_code, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.visits, 0);
}

#[tokio::test]
async fn test_shorten_then_redirect() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/target" }))
        .await;
    let code = response.json::<Value>()["code"].as_str().unwrap().to_string();

    let redirect = app.server.get(&format!("/{code}")).await;

    redirect.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        redirect.header(axum::http::header::LOCATION),
        "https://example.com/target"
    );
}

#[tokio::test]
async fn test_shorten_consecutive_codes_differ() {
    let app = common::spawn_app();

    let first = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/1" }))
        .await
        .json::<Value>();
    let second = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/2" }))
        .await
        .json::<Value>();

    assert_ne!(first["code"], second["code"]);
    assert_eq!(second["code"], Alphabet::default().encode(148).as_str());
}

#[tokio::test]
async fn test_shorten_skips_alias_path() {
    let app = common::spawn_app();
    let alphabet = Alphabet::default();
    app.aliases
        .upsert(PathAlias {
            alias: alphabet.encode(147),
            target: "/node/1".to_string(),
        })
        .await
        .unwrap();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/page" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["code"], alphabet.encode(148).as_str());
}

#[tokio::test]
async fn test_shorten_skips_code_already_in_use() {
    let app = common::spawn_app();
    let alphabet = Alphabet::default();
    app.mappings
        .insert_raw(common::blocked_mapping(
            &alphabet.encode(147),
            "https://example.com/old",
        ))
        .await;

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/new" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["code"], alphabet.encode(148).as_str());
}

#[tokio::test]
async fn test_shorten_with_relative_expiration() {
    let app = common::spawn_app();
    let before = Utc::now();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/x", "expires_in_days": 7 }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    let expires_at: DateTime<Utc> = json["expires_at"].as_str().unwrap().parse().unwrap();
    assert!(expires_at >= before + Duration::days(7));
    assert!(expires_at <= Utc::now() + Duration::days(7));
}

#[tokio::test]
async fn test_shorten_with_absolute_expiration() {
    let app = common::spawn_app();
    let at = Utc::now() + Duration::days(2);

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/x", "expires_at": at.to_rfc3339() }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    let expires_at: DateTime<Utc> = json["expires_at"].as_str().unwrap().parse().unwrap();
    assert_eq!(expires_at, at);
}

#[tokio::test]
async fn test_shorten_rejects_both_expirations() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({
            "url": "https://example.com/x",
            "expires_in_days": 7,
            "expires_at": (Utc::now() + Duration::days(7)).to_rfc3339(),
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_rejects_past_expiration() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({
            "url": "https://example.com/x",
            "expires_at": (Utc::now() - Duration::days(1)).to_rfc3339(),
        }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_rejects_expiration_beyond_maximum() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/x", "expires_in_days": 400 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let app = common::spawn_app();

    for url in ["not-a-url", "ftp://example.com/file", "javascript:alert(1)"] {
        let response = app
            .server
            .post("/api/shorten")
            .json(&json!({ "url": url }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_shorten_empty_url() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_duplicate_destination_conflicts() {
    let app = common::spawn_app();

    let first = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/dup" }))
        .await;
    first.assert_status(StatusCode::CREATED);
    let code = first.json::<Value>()["code"].clone();

    let second = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/dup" }))
        .await;

    second.assert_status(StatusCode::CONFLICT);
    let json = second.json::<Value>();
    assert_eq!(json["error"]["code"], "conflict");
    assert_eq!(json["error"]["details"]["existing_code"], code);
}

#[tokio::test]
async fn test_shorten_duplicate_allowed_when_detection_disabled() {
    let mut settings = common::test_settings();
    settings.creation.detect_duplicates = false;
    let app = common::spawn_app_with(settings);

    for _ in 0..2 {
        app.server
            .post("/api/shorten")
            .json(&json!({ "url": "https://example.com/dup" }))
            .await
            .assert_status(StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_shorten_duplicate_of_blocked_mapping_is_allowed() {
    let app = common::spawn_app();

    let first = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/again" }))
        .await
        .json::<Value>();
    let code = first["code"].as_str().unwrap();
    app.mappings.set_blocked(code).await.unwrap();

    app.server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/again" }))
        .await
        .assert_status(StatusCode::CREATED);
}
