use crate::error::BoxError;
use bytes::Bytes;
use futures_util::{TryStream, TryStreamExt};
use http_body::{Body, Frame, SizeHint};
use http_body_util::{BodyExt, StreamBody, combinators::UnsyncBoxBody};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The body a handler hands to the compression layer.
///
/// Each variant is measured and fed to the compressor in its own way:
/// in-memory variants are written in one piece, `Stream` is piped chunk by
/// chunk as the transport pulls.
pub enum ResponseBody {
    /// No body at all.
    Empty,
    /// UTF-8 text held in memory.
    Text(String),
    /// Structured data, serialized to JSON text before it is sent.
    Json(serde_json::Value),
    /// Raw bytes held in memory.
    Binary(Bytes),
    /// An open stream of body frames.
    Stream(UnsyncBoxBody<Bytes, BoxError>),
}

impl ResponseBody {
    /// Creates an empty body.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Wraps any HTTP body as a streamed body.
    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::Stream(body.map_err(Into::into).boxed_unsync())
    }

    /// Creates a streamed body from a fallible stream of byte chunks.
    pub fn from_try_stream<S>(stream: S) -> Self
    where
        S: TryStream<Ok = Bytes> + Send + 'static,
        S::Error: Into<BoxError>,
    {
        Self::stream(StreamBody::new(stream.map_ok(Frame::data).into_stream()))
    }

    /// Returns true if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Empty => true,
            ResponseBody::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Returns the `Content-Type` value the body implies when none is set.
    pub(crate) fn implied_content_type(&self) -> Option<&'static str> {
        match self {
            ResponseBody::Empty => None,
            ResponseBody::Text(_) => Some("text/plain; charset=utf-8"),
            ResponseBody::Json(_) => Some("application/json; charset=utf-8"),
            ResponseBody::Binary(_) | ResponseBody::Stream(_) => {
                Some("application/octet-stream")
            }
        }
    }

    /// Serializes structured bodies to their canonical text form.
    pub(crate) fn normalize(self) -> Self {
        match self {
            ResponseBody::Json(value) => ResponseBody::Text(value.to_string()),
            other => other,
        }
    }

    /// Returns the exact byte length, if it is known without reading the body.
    pub(crate) fn exact_len(&self) -> Option<u64> {
        match self {
            ResponseBody::Json(_) => None,
            other => other.size_hint().exact(),
        }
    }

    /// Short name of the variant, for logging.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Empty => "empty",
            ResponseBody::Text(_) => "text",
            ResponseBody::Json(_) => "json",
            ResponseBody::Binary(_) => "binary",
            ResponseBody::Stream(_) => "stream",
        }
    }

    /// Takes an in-memory payload out, leaving `Empty` behind.
    fn take_payload(&mut self) -> Option<Bytes> {
        match std::mem::replace(self, ResponseBody::Empty) {
            ResponseBody::Text(text) => Some(Bytes::from(text)),
            ResponseBody::Binary(bytes) => Some(bytes),
            ResponseBody::Json(value) => Some(Bytes::from(value.to_string())),
            other => {
                *self = other;
                None
            }
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("Empty"),
            ResponseBody::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            ResponseBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ResponseBody::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<()> for ResponseBody {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for ResponseBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if let ResponseBody::Stream(inner) = this {
            return Pin::new(inner).poll_frame(cx);
        }

        // In-memory payloads go out as a single frame
        match this.take_payload() {
            Some(data) if !data.is_empty() => Poll::Ready(Some(Ok(Frame::data(data)))),
            _ => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            ResponseBody::Empty => true,
            ResponseBody::Text(text) => text.is_empty(),
            ResponseBody::Json(_) => false,
            ResponseBody::Binary(bytes) => bytes.is_empty(),
            ResponseBody::Stream(inner) => inner.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            ResponseBody::Empty => SizeHint::with_exact(0),
            ResponseBody::Text(text) => SizeHint::with_exact(text.len() as u64),
            ResponseBody::Binary(bytes) => SizeHint::with_exact(bytes.len() as u64),
            ResponseBody::Json(_) => SizeHint::default(),
            ResponseBody::Stream(inner) => inner.size_hint(),
        }
    }
}
