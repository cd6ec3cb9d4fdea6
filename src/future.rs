use crate::body::CompressionBody;
use crate::config::CompressionConfig;
use crate::eligibility::{Candidate, SkipReason, evaluate, is_bodyless_status};
use crate::error::CompressionError;
use crate::negotiate::negotiate;
use crate::response_body::ResponseBody;
use crate::transform::transform;
use http::response::Parts;
use http::{Method, Response, header};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

pin_project! {
    /// Future for compression service responses.
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        method: Method,
        accept_encoding: Option<String>,
        config: Arc<CompressionConfig>,
    }
}

impl<F> ResponseFuture<F> {
    pub(crate) fn new(
        inner: F,
        method: Method,
        accept_encoding: Option<String>,
        config: Arc<CompressionConfig>,
    ) -> Self {
        Self {
            inner,
            method,
            accept_encoding,
            config,
        }
    }
}

impl<F, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<ResponseBody>, E>>,
{
    type Output = Result<Response<CompressionBody<ResponseBody>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.inner.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Ready(Ok(response)) => {
                let response = compress_response(
                    response,
                    this.method,
                    this.accept_encoding.as_deref(),
                    this.config,
                );
                Poll::Ready(Ok(response))
            }
        }
    }
}

/// Decides whether and how to compress a response, then applies it.
pub(crate) fn compress_response(
    response: Response<ResponseBody>,
    method: &Method,
    accept_encoding: Option<&str>,
    config: &CompressionConfig,
) -> Response<CompressionBody<ResponseBody>> {
    let (mut parts, body) = response.into_parts();

    // Caches must key on Accept-Encoding whatever the outcome
    add_vary_accept_encoding(&mut parts.headers);
    add_implied_content_type(&mut parts, &body);

    if let Err(reason) = evaluate(&Candidate::new(method, &parts, &body, config)) {
        return skip(parts, body, reason);
    }

    let encoding = match negotiate(accept_encoding) {
        Ok(encoding) => encoding,
        Err(err) => return reject(parts, err),
    };

    let Some(codec) = encoding.codec() else {
        return skip(parts, body, SkipReason::IdentityEncoding);
    };

    let body = transform(&mut parts, body, codec, config);
    Response::from_parts(parts, body)
}

/// Sends the response on uncompressed.
fn skip(
    parts: Parts,
    body: ResponseBody,
    reason: SkipReason,
) -> Response<CompressionBody<ResponseBody>> {
    tracing::trace!(reason = %reason, "response left uncompressed");
    Response::from_parts(parts, CompressionBody::passthrough(body.normalize()))
}

/// Replaces the response with an error the client caused.
fn reject(mut parts: Parts, err: CompressionError) -> Response<CompressionBody<ResponseBody>> {
    tracing::debug!(error = %err, "no acceptable content encoding");

    parts.status = err.status();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_ENCODING);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    let body = ResponseBody::Text(err.to_string());
    Response::from_parts(parts, CompressionBody::passthrough(body))
}

/// Writes the body's implied `Content-Type` when the handler set none.
fn add_implied_content_type(parts: &mut Parts, body: &ResponseBody) {
    if parts.headers.contains_key(header::CONTENT_TYPE) || is_bodyless_status(parts.status) {
        return;
    }
    if let Some(content_type) = body.implied_content_type() {
        parts.headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(content_type),
        );
    }
}

/// Adds Accept-Encoding to the Vary header if not already present.
fn add_vary_accept_encoding(headers: &mut header::HeaderMap) {
    // Check all Vary headers to see if Accept-Encoding is already present
    for vary in headers.get_all(header::VARY) {
        if let Ok(vary_str) = vary.to_str() {
            let covered = vary_str.split(',').any(|v| {
                let v = v.trim();
                v == "*" || v.eq_ignore_ascii_case("accept-encoding")
            });
            if covered {
                return;
            }
        }
    }

    headers.append(
        header::VARY,
        header::HeaderValue::from_static("Accept-Encoding"),
    );
}
