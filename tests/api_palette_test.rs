//! Integration tests for POST /api/palette and reference table handling.

mod common;

use axum::http::StatusCode;
use common::fixtures::{checkerboard_png, gradient_png, BLACK_WHITE_CSV};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::collections::HashSet;
use stitchpal::models::{AppConfig, ReferenceCacheConfig};
use stitchpal::services::parse_reference_table;

fn colors(response: &TestResponse) -> Vec<Value> {
    let json: Value = response.json();
    json["colors"].as_array().expect("colors array").clone()
}

#[tokio::test]
async fn test_palette_counts_cover_image() {
    let app = TestApp::new();

    let response = app
        .upload("/api/palette?size=20&colors=5", &gradient_png(40, 20))
        .await;

    assert_ok(&response);
    let json: Value = response.json();
    assert_eq!(json["width"], 20);
    assert_eq!(json["height"], 10);

    let colors = colors(&response);
    assert_eq!(colors.len(), 5);
    let total: u64 = colors.iter().map(|c| c["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 200);
    for color in &colors {
        let hex = color["hex"].as_str().unwrap();
        assert!(hex.starts_with('#') && hex.len() == 7, "{hex}");
        assert!(color.get("reference").is_none());
    }
}

#[tokio::test]
async fn test_palette_with_builtin_reference() {
    let app = TestApp::new();
    let basic = parse_reference_table(include_str!("../palettes/basic.csv")).unwrap();
    let allowed: HashSet<String> = basic.iter().map(|c| c.to_hex()).collect();
    let labels: HashSet<String> = basic.iter().map(|c| c.label().to_string()).collect();

    let response = app
        .upload("/api/palette?colors=6&reference=basic", &gradient_png(24, 24))
        .await;

    assert_ok(&response);
    for color in colors(&response) {
        let hex = color["hex"].as_str().unwrap();
        let label = color["reference"].as_str().expect("reference label");
        assert!(allowed.contains(hex), "{hex} not in basic palette");
        assert!(labels.contains(label), "unknown label {label}");
    }
}

#[tokio::test]
async fn test_reference_url_fetched_once() {
    let mock = MockPaletteServer::start().await;
    mock.mock_csv("/palette.csv", BLACK_WHITE_CSV, 1).await;
    let app = TestApp::new();
    let path = format!(
        "/api/palette?colors=2&reference_url={}",
        mock.url_for("/palette.csv")
    );

    for _ in 0..2 {
        let response = app.upload(&path, &checkerboard_png(4, 4)).await;
        assert_ok(&response);

        let labels: HashSet<String> = colors(&response)
            .iter()
            .map(|c| c["reference"].as_str().unwrap().to_string())
            .collect();
        assert!(labels.is_subset(&HashSet::from(["black".to_string(), "white".to_string()])));
    }

    assert_eq!(app.state.quantizer.references().cache().len().await, 1);
}

#[tokio::test]
async fn test_reference_url_wins_over_builtin() {
    let mock = MockPaletteServer::start().await;
    mock.mock_csv("/bw.csv", BLACK_WHITE_CSV, 1).await;
    let app = TestApp::new();

    let path = format!(
        "/api/palette?colors=2&reference=basic&reference_url={}",
        mock.url_for("/bw.csv")
    );
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_ok(&response);
    for color in colors(&response) {
        let hex = color["hex"].as_str().unwrap();
        assert!(hex == "#000000" || hex == "#ffffff", "{hex}");
    }
}

#[tokio::test]
async fn test_reference_url_failure_is_bad_gateway() {
    let mock = MockPaletteServer::start().await;
    mock.mock_status("/missing.csv", 404).await;
    let app = TestApp::new();

    let path = format!(
        "/api/palette?reference_url={}",
        mock.url_for("/missing.csv")
    );
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_json_error(&response, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_oversized_reference_table_rejected() {
    let mock = MockPaletteServer::start().await;
    let big: String = (0..200).map(|i| format!("c{i},#{:06x}\n", i * 1000)).collect();
    mock.mock_csv("/big.csv", &big, 1).await;
    let app = TestApp::with_config(AppConfig {
        reference_cache: ReferenceCacheConfig {
            max_table_bytes: 256,
            ..ReferenceCacheConfig::default()
        },
        ..AppConfig::default()
    });

    let path = format!("/api/palette?reference_url={}", mock.url_for("/big.csv"));
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_json_error(&response, StatusCode::BAD_GATEWAY);
    assert!(response.text().contains("exceeds 256 bytes"), "{}", response.text());
    assert!(app.state.quantizer.references().cache().is_empty().await);
}

#[tokio::test]
async fn test_reference_host_not_allowed() {
    let mock = MockPaletteServer::start().await;
    mock.mock_csv("/bw.csv", BLACK_WHITE_CSV, 0).await;
    let app = TestApp::with_config(AppConfig {
        reference_hosts: vec!["palettes.example.test".to_string()],
        ..AppConfig::default()
    });

    let path = format!("/api/palette?reference_url={}", mock.url_for("/bw.csv"));
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_json_error(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_reference_table() {
    let mock = MockPaletteServer::start().await;
    mock.mock_csv("/bad.csv", "black,#000000\nthis line is not a color\n", 1)
        .await;
    let app = TestApp::new();

    let path = format!("/api/palette?reference_url={}", mock.url_for("/bad.csv"));
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_json_error(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().contains("Line 2"), "{}", response.text());
}

#[tokio::test]
async fn test_empty_reference_table() {
    let mock = MockPaletteServer::start().await;
    mock.mock_csv("/empty.csv", "# nothing here\n\n", 1).await;
    let app = TestApp::new();

    let path = format!("/api/palette?reference_url={}", mock.url_for("/empty.csv"));
    let response = app.upload(&path, &checkerboard_png(4, 4)).await;

    assert_json_error(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_non_http_reference_url_rejected() {
    let app = TestApp::new();

    let response = app
        .upload(
            "/api/palette?reference_url=ftp://example.test/p.csv",
            &checkerboard_png(4, 4),
        )
        .await;

    assert_json_error(&response, StatusCode::BAD_REQUEST);
}
