use crate::body::CompressionBody;
use crate::codec::Codec;
use crate::config::CompressionConfig;
use crate::eligibility::SkipReason;
use crate::response_body::ResponseBody;
use http::header::{self, HeaderMap, HeaderValue};
use http::response::Parts;

/// Replaces the body with its compressed stream and fixes up the headers.
///
/// Returns a passthrough body, leaving `parts` untouched, when the body is
/// smaller than the configured threshold.
pub(crate) fn transform(
    parts: &mut Parts,
    body: ResponseBody,
    codec: Codec,
    config: &CompressionConfig,
) -> CompressionBody<ResponseBody> {
    // JSON has to be text before it can be measured
    let body = body.normalize();

    let length = measured_len(&parts.headers, &body);
    if length.is_some_and(|len| len < config.threshold() as u64) {
        tracing::trace!(
            reason = %SkipReason::BelowThreshold,
            length = ?length,
            threshold = config.threshold(),
            "response left uncompressed"
        );
        return CompressionBody::passthrough(body);
    }

    let always_flush = is_always_flush(&parts.headers);

    parts.headers.insert(
        header::CONTENT_ENCODING,
        HeaderValue::from_static(codec.content_encoding()),
    );

    // Compressed size is unknown, the response goes out chunked
    parts.headers.remove(header::CONTENT_LENGTH);

    // Byte ranges of the encoded body would not match the original
    parts.headers.remove(header::ACCEPT_RANGES);

    // In-memory payloads are written in one go, streams are piped chunk by chunk
    let feed = match &body {
        ResponseBody::Stream(_) => "piped",
        _ => "buffered",
    };
    tracing::debug!(
        encoding = codec.content_encoding(),
        body = body.kind(),
        length = ?length,
        feed,
        always_flush,
        "compressing response body"
    );

    let encoder = codec.encoder(config.codec());
    CompressionBody::compressed(body, codec, encoder, always_flush)
}

/// Byte length the threshold is compared against, if known up front.
fn measured_len(headers: &HeaderMap, body: &ResponseBody) -> Option<u64> {
    match body {
        ResponseBody::Stream(_) => content_length(headers).or_else(|| body.exact_len()),
        _ => body.exact_len(),
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Checks whether every chunk must be flushed as soon as it is compressed.
fn is_always_flush(headers: &HeaderMap) -> bool {
    headers
        .get("x-accel-buffering")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("no"))
        || is_streaming_content_type(headers)
}

/// Checks if the content type is an incremental event stream.
fn is_streaming_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.starts_with("text/event-stream") || ct.starts_with("application/grpc-web")
        })
}
