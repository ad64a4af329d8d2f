//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::assets::AssetLoader;
use crate::error::ApiError;
use crate::models::{AppConfig, QuantizeQuery};
use crate::services::{
    HttpReferenceSource, QuantizeService, ReferenceCache, ReferencePalettes, ReferenceSource,
    RenderService,
};

/// Timeout for fetching `reference_url` tables
const REFERENCE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub quantizer: Arc<QuantizeService>,
}

/// Create application state from an asset loader.
pub fn create_app_state(asset_loader: Arc<AssetLoader>) -> anyhow::Result<AppState> {
    let config = AppConfig::load_from_assets(&asset_loader);
    create_app_state_with_config(config, asset_loader)
}

/// Create application state with an explicit config (tests, CLI overrides).
pub fn create_app_state_with_config(
    config: AppConfig,
    asset_loader: Arc<AssetLoader>,
) -> anyhow::Result<AppState> {
    let source = HttpReferenceSource::new(
        REFERENCE_FETCH_TIMEOUT,
        config.reference_cache.max_table_bytes,
    )
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
    Ok(create_app_state_with_source(
        config,
        asset_loader,
        Arc::new(source),
    ))
}

/// Create application state with a custom reference table source.
pub fn create_app_state_with_source(
    config: AppConfig,
    asset_loader: Arc<AssetLoader>,
    source: Arc<dyn ReferenceSource>,
) -> AppState {
    let config = Arc::new(config);
    let references = Arc::new(ReferencePalettes::new(
        asset_loader,
        source,
        ReferenceCache::from_config(&config.reference_cache),
    ));
    let renderer = Arc::new(RenderService::new(config.jpeg_quality));
    let quantizer = Arc::new(QuantizeService::new(config.clone(), references, renderer));

    AppState { config, quantizer }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
/// Responses carry `Cache-Control: no-store` unless a handler set one.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/quantize", post(handle_quantize))
        .route("/api/palette", post(handle_palette))
        .route("/api/palettes", get(handle_list_palettes))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_quantize(
    State(state): State<AppState>,
    query: Query<QuantizeQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    api::handle_quantize(State(state.quantizer), query, multipart).await
}

async fn handle_palette(
    State(state): State<AppState>,
    query: Query<QuantizeQuery>,
    multipart: Multipart,
) -> Result<Json<api::PaletteResponse>, ApiError> {
    api::handle_palette(State(state.quantizer), query, multipart).await
}

async fn handle_list_palettes(State(state): State<AppState>) -> Json<api::PaletteListResponse> {
    api::handle_list_palettes(State(state.quantizer)).await
}
