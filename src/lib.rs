//! HTTP response compression middleware for Tower.
//!
//! This crate provides a Tower layer that decides, per response, whether the
//! body should be compressed, negotiates gzip or deflate from the client's
//! `Accept-Encoding` header, and streams the encoded body to the transport.
//!
//! # Example
//!
//! ```ignore
//! use http_compress_negotiate::{CompressionLayer, ResponseBody};
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .layer(CompressionLayer::new().threshold(2048))
//!     .service_fn(|_req| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(ResponseBody::from(
//!             serde_json::json!({ "message": "hello" }),
//!         )))
//!     });
//! ```
//!
//! # Compression Rules
//!
//! Guards run in this order and the first match leaves the response
//! uncompressed:
//! - The body is empty
//! - The response was already committed downstream ([`ResponseCommitted`] or `101`)
//! - A handler set [`CompressOverride`]`(false)`
//! - The request method is `HEAD`
//! - The status is `204`, `205`, `304` or informational
//! - `Content-Encoding` header is already set
//! - The content type is not compressible, unless [`CompressOverride`]`(true)` is set
//!
//! Then the encoding is negotiated. A request naming no acceptable encoding
//! gets `406 Not Acceptable`, and `identity` sends the body as is. Bodies whose
//! length is known and below the threshold (default: 1024 bytes) are left alone.
//!
//! The middleware will **always flush** after each chunk when:
//! - `X-Accel-Buffering: no` header is present
//! - `Content-Type` is `text/event-stream`
//! - `Content-Type` starts with `application/grpc-web`
//!
//! # Response Modifications
//!
//! Every response gets `Accept-Encoding` in its `Vary` header, and a body
//! without `Content-Type` gets the type it implies (`text/plain` for text,
//! `application/json` for JSON, `application/octet-stream` for bytes and
//! streams). When compression is applied:
//! - `Content-Encoding` header is set to the codec used
//! - `Content-Length` header is removed (compressed size is unknown)
//! - `Accept-Ranges` header is removed
//!
//! JSON bodies are serialized to text on every path, compressed or not.

#![deny(missing_docs)]

mod body;
mod codec;
mod compressible;
mod config;
mod eligibility;
mod error;
mod future;
mod layer;
mod negotiate;
mod response_body;
mod service;
mod transform;

pub use body::CompressionBody;
pub use codec::{Codec, CodecOptions};
pub use compressible::is_compressible;
pub use compression_core::Level;
pub use config::{CompressiblePredicate, CompressionConfig, DEFAULT_THRESHOLD};
pub use eligibility::{CompressOverride, ResponseCommitted, SkipReason, is_bodyless_status};
pub use error::{BoxError, CompressionError};
pub use future::ResponseFuture;
pub use layer::CompressionLayer;
pub use negotiate::{Encoding, accepts_encodings, negotiate};
pub use response_body::ResponseBody;
pub use service::CompressionService;
