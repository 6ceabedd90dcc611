//! Request path canonicalization.
//!
//! The guard classifies, and the proxy forwards, the same canonical form of
//! the request path. Without that, `/images/../admin` would be classified as
//! an image and then resolved to `/admin` by the upstream URL parser.
//!
//! Canonical form:
//! - percent-encoded unreserved characters (`A-Z a-z 0-9 - . _ ~`) are decoded,
//!   other escapes are kept with uppercase hex
//! - empty segments (`//`) and `.` segments are removed, `..` pops the previous
//!   segment and stops at the root
//! - a trailing `/` is kept, and added when the last segment was `.` or `..`
//!
//! Paths that cannot be made unambiguous are rejected. That covers a raw or
//! encoded backslash, an encoded `/`, control bytes, and malformed escapes.

/// Returns the canonical form of `raw`, or `None` when it must be refused.
pub fn canonical_path(raw: &str) -> Option<String> {
    let decoded = decode_unreserved(raw)?;

    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = decoded.ends_with('/');
    for segment in decoded.split('/') {
        match segment {
            "" => {}
            "." => trailing_slash = true,
            ".." => {
                segments.pop();
                trailing_slash = true;
            }
            s => {
                segments.push(s);
                trailing_slash = decoded.ends_with('/');
            }
        }
    }

    if segments.is_empty() {
        return Some("/".to_string());
    }

    let mut canonical = String::with_capacity(decoded.len() + 1);
    for segment in &segments {
        canonical.push('/');
        canonical.push_str(segment);
    }
    if trailing_slash {
        canonical.push('/');
    }
    Some(canonical)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_unreserved(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'%' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                let value = (hi << 4) | lo;
                if is_unreserved(value) {
                    out.push(value as char);
                } else if matches!(value, b'/' | b'\\') || value.is_ascii_control() {
                    return None;
                } else {
                    out.push('%');
                    out.push(char::from(b"0123456789ABCDEF"[usize::from(hi)]));
                    out.push(char::from(b"0123456789ABCDEF"[usize::from(lo)]));
                }
                i += 3;
            }
            b'\\' => return None,
            _ if b.is_ascii_control() => return None,
            _ => {
                // `raw` is a &str, so a multi-byte character starts here; copy it whole.
                let ch = raw[i..].chars().next()?;
                out.push(ch);
                i += ch.len_utf8();
                continue;
            }
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_canonical_paths_alone() {
        for path in ["/", "/cart", "/admin/orders", "/login/", "/menu/item-1_a~b.png"] {
            assert_eq!(canonical_path(path).as_deref(), Some(path));
        }
    }

    #[test]
    fn resolves_dot_segments() {
        let cases = [
            ("/images/../admin/orders", "/admin/orders"),
            ("/images/./logo.png", "/images/logo.png"),
            ("/../../admin", "/admin"),
            ("/images/..", "/"),
            ("/admin/.", "/admin/"),
            ("/a/b/../../c", "/c"),
        ];
        for (raw, expected) in cases {
            assert_eq!(canonical_path(raw).as_deref(), Some(expected), "path {raw}");
        }
    }

    #[test]
    fn decodes_unreserved_escapes_before_resolving() {
        assert_eq!(canonical_path("/images/%2e%2e/admin/orders").as_deref(), Some("/admin/orders"));
        assert_eq!(canonical_path("/images/.%2E/admin").as_deref(), Some("/admin"));
        assert_eq!(canonical_path("/%61dmin/orders").as_deref(), Some("/admin/orders"));
        assert_eq!(canonical_path("/menu/hot%20dog").as_deref(), Some("/menu/hot%20dog"));
        assert_eq!(canonical_path("/menu/a%3fb").as_deref(), Some("/menu/a%3Fb"));
    }

    #[test]
    fn collapses_repeated_slashes() {
        assert_eq!(canonical_path("//admin/orders").as_deref(), Some("/admin/orders"));
        assert_eq!(canonical_path("/admin//orders///").as_deref(), Some("/admin/orders/"));
        assert_eq!(canonical_path("").as_deref(), Some("/"));
    }

    #[test]
    fn refuses_ambiguous_paths() {
        for raw in [
            "/images\\..\\admin",
            "/images/..%2Fadmin",
            "/images/%5c../admin",
            "/admin%00",
            "/bad%zz",
            "/truncated%2",
        ] {
            assert_eq!(canonical_path(raw), None, "path {raw}");
        }
    }

    #[test]
    fn keeps_non_ascii_characters() {
        assert_eq!(canonical_path("/menu/caf\u{e9}").as_deref(), Some("/menu/caf\u{e9}"));
    }
}
