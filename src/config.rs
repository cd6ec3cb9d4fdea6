use crate::codec::CodecOptions;
use crate::compressible::is_compressible;
use std::fmt;
use std::sync::Arc;

/// Default minimum body size for compression, in bytes.
pub const DEFAULT_THRESHOLD: usize = 1024;

/// Decides from a media type (`type/subtype`, no parameters) whether to compress.
pub type CompressiblePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Process-wide compression settings.
///
/// Built once through [`CompressionLayer`](crate::CompressionLayer) and shared
/// read-only by every service clone and in-flight response.
#[derive(Clone)]
pub struct CompressionConfig {
    compressible: CompressiblePredicate,
    threshold: usize,
    codec: CodecOptions,
}

impl CompressionConfig {
    /// Returns whether responses of `content_type` should be compressed.
    pub fn is_compressible(&self, content_type: &str) -> bool {
        (self.compressible)(content_type)
    }

    /// Returns the minimum body size that gets compressed.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the options passed to every encoder.
    pub fn codec(&self) -> &CodecOptions {
        &self.codec
    }

    pub(crate) fn set_compressible(&mut self, predicate: CompressiblePredicate) {
        self.compressible = predicate;
    }

    pub(crate) fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold;
    }

    pub(crate) fn set_codec(&mut self, codec: CodecOptions) {
        self.codec = codec;
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            compressible: Arc::new(is_compressible),
            threshold: DEFAULT_THRESHOLD,
            codec: CodecOptions::default(),
        }
    }
}

impl fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionConfig")
            .field("threshold", &self.threshold)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compression_core::Level;

    #[test]
    fn test_defaults() {
        let config = CompressionConfig::default();
        assert_eq!(config.threshold(), 1024);
        assert!(config.is_compressible("application/json"));
        assert!(!config.is_compressible("image/png"));
        assert!(matches!(config.codec().level(), Level::Default));
    }

    #[test]
    fn test_custom_predicate() {
        let mut config = CompressionConfig::default();
        config.set_compressible(Arc::new(|ct: &str| ct == "image/png"));
        assert!(config.is_compressible("image/png"));
        assert!(!config.is_compressible("text/plain"));
    }
}
