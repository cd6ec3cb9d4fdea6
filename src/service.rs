use crate::body::CompressionBody;
use crate::config::CompressionConfig;
use crate::future::ResponseFuture;
use crate::response_body::ResponseBody;
use http::{HeaderMap, Request, Response, header};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that compresses HTTP response bodies.
#[derive(Debug, Clone)]
pub struct CompressionService<S> {
    inner: S,
    config: Arc<CompressionConfig>,
}

impl<S> CompressionService<S> {
    /// Creates a new compression service wrapping the given inner service.
    pub fn new(inner: S, config: Arc<CompressionConfig>) -> Self {
        Self { inner, config }
    }

    /// Returns the shared configuration.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for CompressionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResponseBody>>,
{
    type Response = Response<CompressionBody<ResponseBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let accept_encoding = accept_encoding(req.headers());
        let method = req.method().clone();

        let inner = self.inner.call(req);

        ResponseFuture::new(inner, method, accept_encoding, Arc::clone(&self.config))
    }
}

/// Joins every `Accept-Encoding` header into a single list.
fn accept_encoding(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_accept_encoding_missing() {
        assert_eq!(accept_encoding(&HeaderMap::new()), None);
    }

    #[test]
    fn test_accept_encoding_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT_ENCODING, HeaderValue::from_static("br"));
        headers.append(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip;q=0.5"));

        assert_eq!(
            accept_encoding(&headers).as_deref(),
            Some("br, gzip;q=0.5")
        );
    }
}
