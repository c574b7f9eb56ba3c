// HTTP response utilities for JSON bodies with optional Brotli encoding
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// True when the client lists `br` in `Accept-Encoding`.
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|encoding| encoding.split(';').next().map(str::trim) == Some("br"))
}

pub async fn brotli_compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = BrotliEncoder::new(bytes);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Serialize `data` as JSON, Brotli-compressing the body when `compress`.
pub async fn json_response<T: Serialize>(
    status: StatusCode,
    data: &T,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let json = serde_json::to_vec(data).map_err(|e| {
        tracing::error!(error = %e, "JSON serialization failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (body, encoding) = if compress {
        let compressed = brotli_compress(&json).await.map_err(|e| {
            tracing::error!(error = %e, "Brotli compression failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!(raw = json.len(), compressed = compressed.len(), "compressed response body");
        (compressed, Some("br"))
    } else {
        (json, None)
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    if let Some(encoding) = encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    builder.body(Body::from(body)).map_err(|e| {
        tracing::error!(error = %e, "response build failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
