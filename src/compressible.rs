use mime::Mime;

/// Media types outside `text/*` that are worth compressing.
const COMPRESSIBLE_TYPES: &[&str] = &[
    "application/ecmascript",
    "application/graphql",
    "application/grpc-web",
    "application/javascript",
    "application/json",
    "application/manifest+json",
    "application/rtf",
    "application/vnd.ms-fontobject",
    "application/wasm",
    "application/x-javascript",
    "application/x-www-form-urlencoded",
    "application/xml",
    "font/otf",
    "font/ttf",
    "image/bmp",
    "image/svg+xml",
    "image/vnd.microsoft.icon",
    "image/x-icon",
];

/// Reports whether a response of the given media type is worth compressing.
///
/// This is the default compressibility predicate. It accepts everything under
/// `text/`, anything with a `+json`, `+xml` or `+text` suffix, and a fixed table
/// of common textual and font types. Parameters such as `charset` are ignored.
/// Already-compressed formats (most images, archives, gRPC framing) and
/// unparseable or empty values are rejected.
pub fn is_compressible(content_type: &str) -> bool {
    let Ok(mime) = content_type.trim().parse::<Mime>() else {
        return false;
    };

    if mime.type_() == mime::TEXT {
        return true;
    }

    if mime
        .suffix()
        .is_some_and(|suffix| matches!(suffix.as_str(), "json" | "xml" | "text"))
    {
        return true;
    }

    let essence = mime.essence_str();
    COMPRESSIBLE_TYPES
        .iter()
        .any(|known| essence.eq_ignore_ascii_case(known))
        // grpc-web carries its serialization as a suffix (+proto, +json)
        || essence.starts_with("application/grpc-web")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_types() {
        assert!(is_compressible("text/plain"));
        assert!(is_compressible("text/html; charset=utf-8"));
        assert!(is_compressible("text/event-stream"));
    }

    #[test]
    fn test_structured_suffixes() {
        assert!(is_compressible("application/ld+json"));
        assert!(is_compressible("application/problem+json"));
        assert!(is_compressible("application/atom+xml"));
        assert!(is_compressible("application/rss+xml"));
    }

    #[test]
    fn test_table_entries() {
        assert!(is_compressible("application/json"));
        assert!(is_compressible("application/json; charset=utf-8"));
        assert!(is_compressible("application/javascript"));
        assert!(is_compressible("image/svg+xml"));
        assert!(is_compressible("font/ttf"));
        assert!(is_compressible("application/wasm"));
        assert!(is_compressible("application/grpc-web"));
        assert!(is_compressible("application/grpc-web+proto"));
    }

    #[test]
    fn test_images_are_not_compressible() {
        assert!(!is_compressible("image/png"));
        assert!(!is_compressible("image/jpeg"));
        assert!(!is_compressible("image/gif"));
        assert!(!is_compressible("image/webp"));
    }

    #[test]
    fn test_grpc_is_not_compressible() {
        assert!(!is_compressible("application/grpc"));
        assert!(!is_compressible("application/grpc+proto"));
    }

    #[test]
    fn test_binary_and_invalid_types() {
        assert!(!is_compressible("application/octet-stream"));
        assert!(!is_compressible("application/zip"));
        assert!(!is_compressible("video/mp4"));
        assert!(!is_compressible(""));
        assert!(!is_compressible("not a mime type"));
    }
}
