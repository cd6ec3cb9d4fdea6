use http::StatusCode;
use std::io;

/// Boxed error type carried by streamed response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while negotiating or compressing a response.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The client's `Accept-Encoding` excludes every supported encoding.
    #[error("supported encodings: gzip, deflate, identity")]
    NotAcceptable,

    /// The encoder failed while compressing or finishing the stream.
    #[error("compression failed: {0}")]
    Codec(#[source] io::Error),

    /// The original response body failed while being read.
    #[error("response body failed: {0}")]
    UpstreamBody(#[source] BoxError),
}

impl CompressionError {
    /// Returns the HTTP status this error maps to when surfaced to the client.
    ///
    /// Only [`CompressionError::NotAcceptable`] is ever turned into a response;
    /// the other variants occur after headers are committed and abort the
    /// connection instead.
    pub fn status(&self) -> StatusCode {
        match self {
            CompressionError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            CompressionError::Codec(_) | CompressionError::UpstreamBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_acceptable_message_names_supported_encodings() {
        let err = CompressionError::NotAcceptable;
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(err.to_string(), "supported encodings: gzip, deflate, identity");
    }

    #[test]
    fn test_codec_error_keeps_source() {
        let err = CompressionError::Codec(io::Error::other("corrupt state"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "corrupt state");
    }
}
