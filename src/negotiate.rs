use crate::codec::Codec;
use crate::error::CompressionError;

/// Content codings the negotiator can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Gzip compression.
    Gzip,
    /// Deflate compression.
    Deflate,
    /// No compression.
    Identity,
}

impl Encoding {
    /// Every encoding this middleware can answer with, in server preference order.
    pub const SUPPORTED: [Encoding; 3] = [Encoding::Gzip, Encoding::Deflate, Encoding::Identity];

    /// Returns the token used for this encoding in HTTP headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
            Encoding::Identity => "identity",
        }
    }

    /// Returns the codec that produces this encoding, or `None` for identity.
    pub fn codec(&self) -> Option<Codec> {
        match self {
            Encoding::Gzip => Some(Codec::Gzip),
            Encoding::Deflate => Some(Codec::Deflate),
            Encoding::Identity => None,
        }
    }

    fn matches(&self, coding: &str) -> bool {
        match self {
            Encoding::Gzip => {
                coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip")
            }
            Encoding::Deflate => coding.eq_ignore_ascii_case("deflate"),
            Encoding::Identity => coding.eq_ignore_ascii_case("identity"),
        }
    }
}

/// How well one candidate matched the client's header.
#[derive(Debug, Clone, Copy)]
struct Preference {
    quality: f32,
    exact: bool,
    position: usize,
}

impl Preference {
    fn beats(&self, other: &Preference) -> bool {
        if self.quality != other.quality {
            return self.quality > other.quality;
        }
        if self.exact != other.exact {
            return self.exact;
        }
        self.position < other.position
    }
}

/// Picks the best of `candidates` for the given `Accept-Encoding` header value.
///
/// The header is comma-separated codings with optional quality values
/// (e.g. "gzip, deflate;q=0.5, *;q=0"). A missing or blank header accepts only
/// `identity`. Ties on quality go to an exact match over `*`, then to the coding
/// the client listed first, then to the earlier candidate.
pub fn accepts_encodings(header: Option<&str>, candidates: &[Encoding]) -> Option<Encoding> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return candidates.iter().copied().find(|e| *e == Encoding::Identity);
    };

    let entries: Vec<(&str, f32)> = header
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_encoding_with_quality)
        .collect();

    let mut best: Option<(Encoding, Preference)> = None;

    for candidate in candidates {
        let Some(preference) = preference_for(*candidate, &entries) else {
            continue;
        };

        // q=0 means "not acceptable"
        if preference.quality <= 0.0 {
            continue;
        }

        match &best {
            Some((_, current)) if !preference.beats(current) => {}
            _ => best = Some((*candidate, preference)),
        }
    }

    best.map(|(encoding, _)| encoding)
}

/// Selects the encoding for a response from the client's `Accept-Encoding`.
///
/// Returns [`CompressionError::NotAcceptable`] when the client excludes every
/// supported encoding, identity included.
pub fn negotiate(header: Option<&str>) -> Result<Encoding, CompressionError> {
    accepts_encodings(header, &Encoding::SUPPORTED).ok_or(CompressionError::NotAcceptable)
}

fn preference_for(candidate: Encoding, entries: &[(&str, f32)]) -> Option<Preference> {
    let exact = entries
        .iter()
        .enumerate()
        .find(|(_, (coding, _))| candidate.matches(coding));
    if let Some((position, (_, quality))) = exact {
        return Some(Preference {
            quality: *quality,
            exact: true,
            position,
        });
    }

    entries
        .iter()
        .enumerate()
        .find(|(_, (coding, _))| *coding == "*")
        .map(|(position, (_, quality))| Preference {
            quality: *quality,
            exact: false,
            position,
        })
}

/// Parses an encoding entry like "gzip" or "deflate;q=0.8" into (encoding, quality).
fn parse_encoding_with_quality(s: &str) -> (&str, f32) {
    let mut parts = s.split(';');
    let encoding = parts.next().unwrap_or("").trim();

    let quality = parts
        .filter_map(|param| {
            let param = param.trim();
            param
                .strip_prefix("q=")
                .or_else(|| param.strip_prefix("Q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
        })
        // "nan" and "inf" parse as floats but are not valid weights
        .map(|q| if q.is_finite() { q } else { 0.0 })
        .next()
        .unwrap_or(1.0)
        .clamp(0.0, 1.0);

    (encoding, quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        assert_eq!(Encoding::Gzip.as_str(), "gzip");
        assert_eq!(Encoding::Deflate.as_str(), "deflate");
        assert_eq!(Encoding::Identity.as_str(), "identity");
    }

    #[test]
    fn test_codec_mapping() {
        assert_eq!(Encoding::Gzip.codec(), Some(Codec::Gzip));
        assert_eq!(Encoding::Deflate.codec(), Some(Codec::Deflate));
        assert_eq!(Encoding::Identity.codec(), None);
    }

    #[test]
    fn test_negotiate_simple() {
        assert_eq!(negotiate(Some("gzip")).unwrap(), Encoding::Gzip);
        assert_eq!(negotiate(Some("deflate")).unwrap(), Encoding::Deflate);
        assert_eq!(negotiate(Some("identity")).unwrap(), Encoding::Identity);
        assert_eq!(negotiate(Some("x-gzip")).unwrap(), Encoding::Gzip);
        assert_eq!(negotiate(Some("GZIP")).unwrap(), Encoding::Gzip);
    }

    #[test]
    fn test_negotiate_missing_header_is_identity() {
        assert_eq!(negotiate(None).unwrap(), Encoding::Identity);
        assert_eq!(negotiate(Some("")).unwrap(), Encoding::Identity);
        assert_eq!(negotiate(Some("   ")).unwrap(), Encoding::Identity);
    }

    #[test]
    fn test_negotiate_header_order_breaks_ties() {
        assert_eq!(negotiate(Some("gzip, deflate")).unwrap(), Encoding::Gzip);
        assert_eq!(negotiate(Some("deflate, gzip")).unwrap(), Encoding::Deflate);
        assert_eq!(
            negotiate(Some("gzip, deflate, br")).unwrap(),
            Encoding::Gzip
        );
    }

    #[test]
    fn test_negotiate_with_quality() {
        assert_eq!(
            negotiate(Some("gzip;q=0.5, deflate;q=1.0")).unwrap(),
            Encoding::Deflate
        );
        assert_eq!(
            negotiate(Some("gzip;q=1.0, deflate;q=0.5")).unwrap(),
            Encoding::Gzip
        );
        assert_eq!(
            negotiate(Some("identity;q=0.9, gzip;q=0.1")).unwrap(),
            Encoding::Identity
        );
    }

    #[test]
    fn test_negotiate_quality_zero_excludes() {
        assert_eq!(
            negotiate(Some("gzip;q=0, deflate")).unwrap(),
            Encoding::Deflate
        );
        assert!(matches!(
            negotiate(Some("gzip;q=0")),
            Err(CompressionError::NotAcceptable)
        ));
    }

    #[test]
    fn test_negotiate_wildcard() {
        assert_eq!(negotiate(Some("*")).unwrap(), Encoding::Gzip);
        assert_eq!(
            negotiate(Some("gzip;q=0, *")).unwrap(),
            Encoding::Deflate
        );
        // An exact match wins over the wildcard at equal quality.
        assert_eq!(
            negotiate(Some("*, deflate")).unwrap(),
            Encoding::Deflate
        );
        assert!(matches!(
            negotiate(Some("*;q=0")),
            Err(CompressionError::NotAcceptable)
        ));
    }

    #[test]
    fn test_negotiate_unsupported_only_is_not_acceptable() {
        assert!(matches!(
            negotiate(Some("br")),
            Err(CompressionError::NotAcceptable)
        ));
        assert!(matches!(
            negotiate(Some("zstd, compress")),
            Err(CompressionError::NotAcceptable)
        ));
        assert!(matches!(
            negotiate(Some("identity;q=0")),
            Err(CompressionError::NotAcceptable)
        ));
    }

    #[test]
    fn test_accepts_encodings_respects_candidate_list() {
        assert_eq!(
            accepts_encodings(Some("gzip, deflate"), &[Encoding::Deflate]),
            Some(Encoding::Deflate)
        );
        assert_eq!(accepts_encodings(None, &[Encoding::Gzip]), None);
    }

    #[test]
    fn test_parse_encoding_with_quality() {
        assert_eq!(parse_encoding_with_quality("gzip"), ("gzip", 1.0));
        assert_eq!(parse_encoding_with_quality("gzip;q=0.8"), ("gzip", 0.8));
        assert_eq!(parse_encoding_with_quality("gzip ; Q=0.25"), ("gzip", 0.25));
        assert_eq!(parse_encoding_with_quality("gzip;q=7"), ("gzip", 1.0));
        assert_eq!(parse_encoding_with_quality("gzip;q=oops"), ("gzip", 1.0));
        assert_eq!(parse_encoding_with_quality("gzip;q=nan"), ("gzip", 0.0));
        assert_eq!(parse_encoding_with_quality("gzip;q=inf"), ("gzip", 0.0));
    }

    #[test]
    fn test_negotiate_rejects_nan_quality() {
        assert!(matches!(
            negotiate(Some("gzip;q=nan")),
            Err(CompressionError::NotAcceptable)
        ));
        assert_eq!(
            negotiate(Some("gzip;q=nan, deflate;q=0.5")).unwrap(),
            Encoding::Deflate
        );
        assert!(matches!(
            negotiate(Some("br, identity;q=NaN")),
            Err(CompressionError::NotAcceptable)
        ));
    }
}
