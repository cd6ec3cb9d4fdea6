use crate::config::CompressionConfig;
use crate::response_body::ResponseBody;
use http::{Method, StatusCode, header, response::Parts};
use std::fmt;

/// Per-response compression override.
///
/// Handlers insert this into the response extensions: `CompressOverride(true)`
/// compresses regardless of content type, `CompressOverride(false)` never
/// compresses. Without it the configured policy decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOverride(pub bool);

/// Marks a response whose connection was already taken over downstream.
///
/// Insert into the response extensions when headers were written or the
/// transport handed off elsewhere, so nothing may be changed any more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseCommitted;

/// Why a response is sent uncompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// There is no body to compress.
    EmptyBody,
    /// Headers were already transmitted or the transport is not writable.
    AlreadySent,
    /// A handler set `CompressOverride(false)`.
    ExplicitOverride,
    /// HEAD responses carry no body.
    HeadMethod,
    /// The status code never carries a body.
    NoContentStatus,
    /// Another layer already set `Content-Encoding`.
    AlreadyEncoded,
    /// The content type is not worth compressing.
    NotCompressible,
    /// The client negotiated `identity`.
    IdentityEncoding,
    /// The body is smaller than the configured threshold.
    BelowThreshold,
}

impl SkipReason {
    /// Returns a stable short name for the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyBody => "empty-body",
            SkipReason::AlreadySent => "already-sent",
            SkipReason::ExplicitOverride => "explicit-override",
            SkipReason::HeadMethod => "head-method",
            SkipReason::NoContentStatus => "no-content-status",
            SkipReason::AlreadyEncoded => "already-encoded",
            SkipReason::NotCompressible => "not-compressible",
            SkipReason::IdentityEncoding => "identity-encoding",
            SkipReason::BelowThreshold => "below-threshold",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the guards look at for one response.
pub(crate) struct Candidate<'a> {
    method: &'a Method,
    parts: &'a Parts,
    body: &'a ResponseBody,
    override_flag: Option<bool>,
    config: &'a CompressionConfig,
}

impl<'a> Candidate<'a> {
    pub(crate) fn new(
        method: &'a Method,
        parts: &'a Parts,
        body: &'a ResponseBody,
        config: &'a CompressionConfig,
    ) -> Self {
        Self {
            method,
            parts,
            body,
            override_flag: parts.extensions.get::<CompressOverride>().map(|o| o.0),
            config,
        }
    }

    /// Media type used for the compressibility check, without parameters.
    fn content_type(&self) -> String {
        let value = match self.parts.headers.get(header::CONTENT_TYPE) {
            Some(value) => value.to_str().ok(),
            None => self.body.implied_content_type(),
        };
        value
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

type Guard = fn(&Candidate<'_>) -> bool;

/// Guards in evaluation order; the first one that fires decides.
const GUARDS: [(Guard, SkipReason); 7] = [
    (has_empty_body, SkipReason::EmptyBody),
    (is_already_sent, SkipReason::AlreadySent),
    (is_overridden_off, SkipReason::ExplicitOverride),
    (is_head_request, SkipReason::HeadMethod),
    (has_bodyless_status, SkipReason::NoContentStatus),
    (has_content_encoding, SkipReason::AlreadyEncoded),
    (is_not_compressible, SkipReason::NotCompressible),
];

/// Runs the guards in order, returning the first reason to skip compression.
pub(crate) fn evaluate(candidate: &Candidate<'_>) -> Result<(), SkipReason> {
    for (guard, reason) in GUARDS {
        if guard(candidate) {
            return Err(reason);
        }
    }
    Ok(())
}

fn has_empty_body(c: &Candidate<'_>) -> bool {
    c.body.is_empty()
}

fn is_already_sent(c: &Candidate<'_>) -> bool {
    c.parts.extensions.get::<ResponseCommitted>().is_some()
        || c.parts.status == StatusCode::SWITCHING_PROTOCOLS
}

fn is_overridden_off(c: &Candidate<'_>) -> bool {
    c.override_flag == Some(false)
}

fn is_head_request(c: &Candidate<'_>) -> bool {
    *c.method == Method::HEAD
}

fn has_bodyless_status(c: &Candidate<'_>) -> bool {
    is_bodyless_status(c.parts.status)
}

fn has_content_encoding(c: &Candidate<'_>) -> bool {
    c.parts.headers.contains_key(header::CONTENT_ENCODING)
}

fn is_not_compressible(c: &Candidate<'_>) -> bool {
    !(c.override_flag == Some(true) || c.config.is_compressible(&c.content_type()))
}

/// Status codes whose responses never carry a body.
pub fn is_bodyless_status(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED
}
