use compression_codecs::{EncodeV2, gzip::GzipEncoder, zlib::ZlibEncoder};
use compression_core::Level;

/// Compression codecs this middleware can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Gzip compression.
    Gzip,
    /// Deflate compression (zlib-wrapped, as HTTP defines it).
    Deflate,
}

impl Codec {
    /// Returns the Content-Encoding header value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Deflate => "deflate",
        }
    }

    /// Creates a new streaming encoder for this codec.
    pub fn encoder(&self, options: &CodecOptions) -> Box<dyn EncodeV2 + Send> {
        match self {
            Codec::Gzip => Box::new(GzipEncoder::new(options.level.into())),
            Codec::Deflate => Box::new(ZlibEncoder::new(options.level.into())),
        }
    }
}

/// Tuning options handed to the encoder unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    level: Level,
}

impl CodecOptions {
    /// Creates options with the given compression level.
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Returns the configured compression level.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::new(Level::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compression_core::util::{PartialBuffer, WriteBuffer};
    use std::io::Read;

    fn encode_all(codec: Codec, options: &CodecOptions, input: &[u8]) -> Vec<u8> {
        let mut encoder = codec.encoder(options);
        let mut scratch = vec![0u8; 4096];
        let mut out = Vec::new();
        let mut input_buf = PartialBuffer::new(input);

        while input_buf.written_len() < input.len() {
            let mut output = WriteBuffer::new_initialized(scratch.as_mut_slice());
            encoder.encode(&mut input_buf, &mut output).unwrap();
            let written = output.written_len();
            out.extend_from_slice(&scratch[..written]);
        }
        loop {
            let mut output = WriteBuffer::new_initialized(scratch.as_mut_slice());
            let done = encoder.finish(&mut output).unwrap();
            let written = output.written_len();
            out.extend_from_slice(&scratch[..written]);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_content_encoding() {
        assert_eq!(Codec::Gzip.content_encoding(), "gzip");
        assert_eq!(Codec::Deflate.content_encoding(), "deflate");
    }

    #[test]
    fn test_gzip_encoder_output_is_gzip() {
        let out = encode_all(Codec::Gzip, &CodecOptions::default(), b"hello gzip");
        assert_eq!(&out[..2], &[0x1f, 0x8b]);

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(out.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello gzip");
    }

    #[test]
    fn test_deflate_encoder_output_is_zlib() {
        let out = encode_all(Codec::Deflate, &CodecOptions::default(), b"hello deflate");

        let mut decoded = String::new();
        flate2::read::ZlibDecoder::new(out.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello deflate");
    }

    #[test]
    fn test_level_is_passed_through() {
        let input = "abcdefgh".repeat(4096);
        let stored_options = CodecOptions::new(Level::Precise(0));
        let stored = encode_all(Codec::Gzip, &stored_options, input.as_bytes());
        let default = encode_all(Codec::Gzip, &CodecOptions::default(), input.as_bytes());

        // Level 0 emits stored blocks, so the output cannot shrink.
        assert!(stored.len() > input.len());
        assert!(default.len() < input.len());
    }
}
