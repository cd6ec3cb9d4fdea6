use crate::codec::Codec;
use crate::error::{BoxError, CompressionError};
use bytes::{Buf, Bytes};
use compression_codecs::EncodeV2;
use compression_core::util::{PartialBuffer, WriteBuffer};
use http_body::{Body, Frame};
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

pin_project! {
    /// A response body that may be compressed.
    ///
    /// This type wraps an inner body and either compresses it with a streaming
    /// encoder or passes it through unchanged. Compression is driven by the
    /// consumer polling for frames, so a slow transport pauses reads from the
    /// inner body, and dropping this body releases both encoder and source.
    #[project = CompressionBodyProj]
    #[allow(missing_docs)]
    pub enum CompressionBody<B> {
        /// Compressed body with encoder.
        Compressed {
            #[pin]
            inner: B,
            state: CompressedBody,
        },
        /// Passthrough body without compression.
        Passthrough {
            #[pin]
            inner: B,
        },
    }
}

/// State and buffers for an actively compressed body.
pub(crate) struct CompressedBody {
    codec: Codec,
    encoder: Box<dyn EncodeV2 + Send>,
    output_buffer: Vec<u8>,
    /// Input taken from the inner body that the encoder has not consumed yet.
    pending_input: Bytes,
    always_flush: bool,
    needs_flush: bool,
    state: CompressState,
    pending_trailers: Option<http::HeaderMap>,
}

/// State machine for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompressState {
    /// Reading data from inner body and compressing.
    Reading,
    /// Finishing compression after inner body is done.
    Finishing,
    /// Emitting buffered trailers.
    Trailers,
    /// Compression is complete, or failed.
    Done,
}

impl CompressedBody {
    fn new(codec: Codec, encoder: Box<dyn EncodeV2 + Send>, always_flush: bool) -> Self {
        Self {
            codec,
            encoder,
            output_buffer: vec![0u8; OUTPUT_BUFFER_SIZE],
            pending_input: Bytes::new(),
            always_flush,
            needs_flush: false,
            state: CompressState::Reading,
            pending_trailers: None,
        }
    }

    /// Returns the current compression state.
    pub(crate) fn state(&self) -> CompressState {
        self.state
    }

    /// Returns whether every chunk is flushed as soon as it is compressed.
    #[cfg(test)]
    pub(crate) fn always_flush(&self) -> bool {
        self.always_flush
    }

    fn after_finish(&self) -> CompressState {
        if self.pending_trailers.is_some() {
            CompressState::Trailers
        } else {
            CompressState::Done
        }
    }

    fn fail(
        &mut self,
        err: CompressionError,
    ) -> Poll<Option<Result<Frame<Bytes>, CompressionError>>> {
        tracing::warn!(
            encoding = self.codec.content_encoding(),
            error = %err,
            "aborting compressed response body"
        );
        self.state = CompressState::Done;
        Poll::Ready(Some(Err(err)))
    }

    /// Polls the inner body and compresses data.
    fn poll_compressed<B>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut B>,
    ) -> Poll<Option<Result<Frame<Bytes>, CompressionError>>>
    where
        B: Body,
        B::Data: Buf,
        B::Error: Into<BoxError>,
    {
        loop {
            match self.state {
                CompressState::Done => return Poll::Ready(None),

                CompressState::Trailers => {
                    self.state = CompressState::Done;
                    if let Some(trailers) = self.pending_trailers.take() {
                        return Poll::Ready(Some(Ok(Frame::trailers(trailers))));
                    }
                    return Poll::Ready(None);
                }

                CompressState::Finishing => {
                    let finished = {
                        let mut output =
                            WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
                        self.encoder
                            .finish(&mut output)
                            .map(|done| (done, output.written_len()))
                    };

                    match finished {
                        Ok((done, written)) => {
                            if done {
                                self.state = self.after_finish();
                            }
                            if written > 0 {
                                let data = Bytes::copy_from_slice(&self.output_buffer[..written]);
                                return Poll::Ready(Some(Ok(Frame::data(data))));
                            }
                            // Loop until the encoder reports completion
                        }
                        Err(e) => return self.fail(CompressionError::Codec(e)),
                    }
                }

                CompressState::Reading => {
                    // Drain what was already read before pulling more from the inner body
                    if !self.pending_input.is_empty() || self.needs_flush {
                        match self.fill_output() {
                            Ok(0) => {}
                            Ok(written) => {
                                let data = Bytes::copy_from_slice(&self.output_buffer[..written]);
                                return Poll::Ready(Some(Ok(Frame::data(data))));
                            }
                            Err(e) => return self.fail(CompressionError::Codec(e)),
                        }
                        continue;
                    }

                    match inner.as_mut().poll_frame(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(None) => {
                            self.state = CompressState::Finishing;
                        }
                        Poll::Ready(Some(Err(e))) => {
                            return self.fail(CompressionError::UpstreamBody(e.into()));
                        }
                        Poll::Ready(Some(Ok(frame))) => match frame.into_data() {
                            Ok(mut data) => {
                                self.pending_input = data.copy_to_bytes(data.remaining());
                                self.needs_flush =
                                    self.always_flush && !self.pending_input.is_empty();
                            }
                            Err(frame) => {
                                if let Ok(trailers) = frame.into_trailers() {
                                    // Buffer trailers and finish compression first
                                    self.pending_trailers = Some(trailers);
                                    self.state = CompressState::Finishing;
                                }
                            }
                        },
                    }
                }
            }
        }
    }

    /// Runs pending input, then any pending flush, through the encoder.
    ///
    /// Stops once the output buffer is full, so a single call never produces
    /// more than `OUTPUT_BUFFER_SIZE` bytes. Returns the number of bytes written
    /// to the output buffer; unconsumed input stays in `pending_input`.
    fn fill_output(&mut self) -> io::Result<usize> {
        let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());

        let mut input = PartialBuffer::new(&self.pending_input[..]);
        while !input.unwritten().is_empty() && !output.has_no_spare_space() {
            let progress = (input.written_len(), output.written_len());
            self.encoder.encode(&mut input, &mut output)?;
            if (input.written_len(), output.written_len()) == progress {
                return Err(io::Error::other("encoder made no progress"));
            }
        }
        let consumed = input.written_len();
        self.pending_input.advance(consumed);

        if self.pending_input.is_empty() && self.needs_flush {
            while !output.has_no_spare_space() {
                let written = output.written_len();
                if self.encoder.flush(&mut output)? {
                    self.needs_flush = false;
                    break;
                }
                if output.written_len() == written {
                    return Err(io::Error::other("encoder made no progress"));
                }
            }
        }

        Ok(output.written_len())
    }
}

impl<B> CompressionBody<B> {
    /// Creates a body that compresses `inner` with the given encoder.
    pub(crate) fn compressed(
        inner: B,
        codec: Codec,
        encoder: Box<dyn EncodeV2 + Send>,
        always_flush: bool,
    ) -> Self {
        Self::Compressed {
            inner,
            state: CompressedBody::new(codec, encoder, always_flush),
        }
    }

    /// Creates a passthrough body without compression.
    pub fn passthrough(inner: B) -> Self {
        Self::Passthrough { inner }
    }

    /// Returns true if this body is being compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(self, CompressionBody::Compressed { .. })
    }
}

impl<B> Body for CompressionBody<B>
where
    B: Body,
    B::Data: Buf,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = CompressionError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            CompressionBodyProj::Passthrough { inner } => match inner.poll_frame(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Ready(Some(Ok(frame))) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Poll::Ready(Some(Err(e))) => {
                    Poll::Ready(Some(Err(CompressionError::UpstreamBody(e.into()))))
                }
            },
            CompressionBodyProj::Compressed { inner, state } => state.poll_compressed(cx, inner),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            CompressionBody::Passthrough { inner } => inner.is_end_stream(),
            CompressionBody::Compressed { state, .. } => state.state() == CompressState::Done,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            CompressionBody::Passthrough { inner } => inner.size_hint(),
            // Compressed size is unknown
            CompressionBody::Compressed { .. } => http_body::SizeHint::default(),
        }
    }
}
