use crate::codec::CodecOptions;
use crate::config::CompressionConfig;
use crate::service::CompressionService;
use compression_core::Level;
use std::sync::Arc;
use tower::Layer;

/// A Tower layer that compresses HTTP response bodies.
///
/// This layer wraps services and compresses response bodies with gzip or
/// deflate, as negotiated from the client's `Accept-Encoding` header.
#[derive(Debug, Clone, Default)]
pub struct CompressionLayer {
    config: Arc<CompressionConfig>,
}

impl CompressionLayer {
    /// Creates a new compression layer with default settings.
    ///
    /// The default threshold is 1024 bytes and the default compressibility
    /// check is [`is_compressible`](crate::is_compressible).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum body size required for compression.
    ///
    /// Bodies whose length is known and smaller than this value are sent
    /// uncompressed, even when compression is forced.
    pub fn threshold(mut self, size: usize) -> Self {
        Arc::make_mut(&mut self.config).set_threshold(size);
        self
    }

    /// Replaces the check deciding which media types get compressed.
    ///
    /// The predicate receives the media type without parameters,
    /// e.g. `application/json`.
    pub fn compressible<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.config).set_compressible(Arc::new(predicate));
        self
    }

    /// Sets the compression level used by every encoder.
    pub fn level(mut self, level: Level) -> Self {
        Arc::make_mut(&mut self.config).set_codec(CodecOptions::new(level));
        self
    }

    /// Returns the configuration services built by this layer share.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }
}

impl<S> Layer<S> for CompressionLayer {
    type Service = CompressionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CompressionService::new(inner, Arc::clone(&self.config))
    }
}
