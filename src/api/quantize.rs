use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::QuantizeQuery;
use crate::services::QuantizeService;

/// Response header carrying the final palette as comma-separated `#rrggbb`
pub const PALETTE_HEADER: &str = "x-palette";

/// Multipart upload form
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The image to quantize (PNG, JPEG, GIF, BMP, WebP, ...)
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// One palette entry of a `/api/palette` response
#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteColor {
    /// Color as `#rrggbb`
    pub hex: String,
    /// Pixels using this color
    pub count: usize,
    /// Label of the matched reference color, when a reference was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Response from `/api/palette`
#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteResponse {
    /// Width of the downsampled image
    pub width: usize,
    /// Height of the downsampled image
    pub height: usize,
    /// Palette entries in codebook order
    pub colors: Vec<PaletteColor>,
}

/// Response from `/api/palettes`
#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteListResponse {
    /// Names usable as the `reference` query parameter
    pub palettes: Vec<String>,
}

/// Reduce an uploaded image to K colors
///
/// Downsamples the upload to fit `size`, clusters its colors into `colors`
/// representatives (optionally snapped to a reference palette) and returns
/// the rebuilt image.
#[utoipa::path(
    post,
    path = "/api/quantize",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(QuantizeQuery),
    responses(
        (status = 200, description = "Palette-reduced image", content_type = "image/png"),
        (status = 400, description = "Invalid parameter, missing field or undecodable image"),
        (status = 404, description = "Unknown built-in reference palette"),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Reference table empty or malformed"),
        (status = 502, description = "Reference table could not be fetched"),
    ),
    tag = "Quantize"
)]
pub async fn handle_quantize(
    State(service): State<Arc<QuantizeService>>,
    Query(query): Query<QuantizeQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let params = service.params(&query)?;
    let upload = read_image_field(multipart).await?;

    tracing::info!(
        upload_bytes = upload.len(),
        size = params.size,
        colors = params.colors,
        reference = ?params.reference,
        "Quantize request received"
    );

    let outcome = service.quantize(upload, &params).await?;
    let bytes = service.render(&outcome, params.format).await?;

    tracing::info!(
        width = outcome.image.width(),
        height = outcome.image.height(),
        size_bytes = bytes.len(),
        "Image quantized"
    );

    let palette = HeaderValue::from_str(&outcome.palette_hex().join(","))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(params.format.content_type())),
            (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
            (header::HeaderName::from_static(PALETTE_HEADER), palette),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}

/// Compute the palette of an uploaded image
///
/// Same inputs as `/api/quantize`; returns the K colors with pixel counts
/// instead of an image.
#[utoipa::path(
    post,
    path = "/api/palette",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(QuantizeQuery),
    responses(
        (status = 200, description = "Palette of the reduced image", body = PaletteResponse),
        (status = 400, description = "Invalid parameter, missing field or undecodable image"),
        (status = 404, description = "Unknown built-in reference palette"),
        (status = 422, description = "Reference table empty or malformed"),
        (status = 502, description = "Reference table could not be fetched"),
    ),
    tag = "Quantize"
)]
pub async fn handle_palette(
    State(service): State<Arc<QuantizeService>>,
    Query(query): Query<QuantizeQuery>,
    multipart: Multipart,
) -> Result<Json<PaletteResponse>, ApiError> {
    let params = service.params(&query)?;
    let upload = read_image_field(multipart).await?;

    tracing::info!(
        upload_bytes = upload.len(),
        colors = params.colors,
        "Palette request received"
    );

    let outcome = service.quantize(upload, &params).await?;
    let counts = outcome.image.color_counts();
    let mut labels = outcome.reference_labels().map(Vec::into_iter);

    let colors = outcome
        .palette_hex()
        .into_iter()
        .zip(counts)
        .map(|(hex, count)| PaletteColor {
            hex,
            count,
            reference: labels.as_mut().and_then(Iterator::next),
        })
        .collect();

    Ok(Json(PaletteResponse {
        width: outcome.image.width(),
        height: outcome.image.height(),
        colors,
    }))
}

/// List built-in reference palettes
#[utoipa::path(
    get,
    path = "/api/palettes",
    responses(
        (status = 200, description = "Available reference palettes", body = PaletteListResponse),
    ),
    tag = "Palettes"
)]
pub async fn handle_list_palettes(
    State(service): State<Arc<QuantizeService>>,
) -> Json<PaletteListResponse> {
    Json(PaletteListResponse {
        palettes: service.references().list(),
    })
}

/// Pull the `image` field out of a multipart body, skipping other fields
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("image") {
            let data = field.bytes().await.map_err(multipart_error)?;
            return Ok(data.to_vec());
        }
    }
    Err(ApiError::MissingField("image"))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidParameter {
            name: "image",
            reason: e.body_text(),
        }
    }
}
