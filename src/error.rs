use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kmeans_palette::QuantizeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Missing multipart field: {0}")]
    MissingField(&'static str),

    #[error("Could not decode image: {0}")]
    ImageDecode(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Quantization failed: {0}")]
    Quantize(#[from] QuantizeError),

    #[error("Reference palette error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Unknown built-in palette: {0}")]
    UnknownPalette(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: usize, height: usize },

    #[error("Unsupported channel count: {0}")]
    UnsupportedDepth(usize),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("JPEG encode error: {0}")]
    JpegEncode(String),

    #[error("Reconstruction failed: {0}")]
    Reconstruct(#[from] QuantizeError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter { .. }
            | ApiError::MissingField(_)
            | ApiError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Quantize(e) => match e {
                QuantizeError::InvalidParameter { .. } | QuantizeError::EmptyInput => {
                    StatusCode::BAD_REQUEST
                }
                QuantizeError::EmptyReferenceTable => StatusCode::UNPROCESSABLE_ENTITY,
                QuantizeError::ShapeMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Reference(e) => match e {
                ReferenceError::UnknownPalette(_) => StatusCode::NOT_FOUND,
                ReferenceError::Fetch { .. } => StatusCode::BAD_GATEWAY,
                ReferenceError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ReferenceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_invalid_parameter() {
        let error = ApiError::InvalidParameter {
            name: "size",
            reason: "must be between 1 and 1024".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid parameter size: must be between 1 and 1024"
        );
    }

    #[test]
    fn test_api_error_missing_field() {
        let error = ApiError::MissingField("image");
        assert_eq!(error.to_string(), "Missing multipart field: image");
    }

    #[test]
    fn test_api_error_from_quantize_error() {
        let api_error: ApiError = QuantizeError::EmptyInput.into();
        assert_eq!(
            api_error.to_string(),
            "Quantization failed: input contains no pixels"
        );
    }

    #[test]
    fn test_reference_error_parse() {
        let error = ReferenceError::Parse {
            line: 3,
            reason: "expected 3 channels".to_string(),
        };
        assert_eq!(error.to_string(), "Line 3: expected 3 channels");
    }

    #[test]
    fn test_render_error_unsupported_dimensions() {
        let error = RenderError::UnsupportedDimensions {
            width: 0,
            height: 12,
        };
        assert_eq!(error.to_string(), "Unsupported dimensions: 0x12");
    }

    #[test]
    fn test_api_error_into_response_status_codes() {
        let cases = [
            (
                ApiError::InvalidParameter {
                    name: "colors",
                    reason: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::MissingField("image"), StatusCode::BAD_REQUEST),
            (ApiError::ImageDecode("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                ApiError::PayloadTooLarge("big".to_string()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ApiError::Quantize(QuantizeError::EmptyInput),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Quantize(QuantizeError::EmptyReferenceTable),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Quantize(QuantizeError::ShapeMismatch {
                    what: "labels",
                    expected: 4,
                    actual: 3,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Reference(ReferenceError::UnknownPalette("nope".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Reference(ReferenceError::Fetch {
                    url: "http://x".to_string(),
                    reason: "timeout".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Render(RenderError::PngEncode("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Internal("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let message = error.to_string();
            let response = error.into_response();
            assert_eq!(response.status(), expected, "{message}");
        }
    }
}
