//! URI split/resolve/relativize (RFC 3986 §3/§5.2), file-URI encoding, and
//! the `strtod`/base64 primitives `Node`'s numeric and blob constructors
//! build on (spec §4.1).

/// The five components of an RFC 3986 URI reference. Malformed
/// percent-escapes are tolerated: the literal bytes are preserved rather
/// than rejected, per spec §4.1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UriParts {
    /// Splits `uri` into its five components. Delegates to [`oxiri::Iri`]
    /// when `uri` is a valid absolute IRI (its job is exactly this split);
    /// falls back to a lenient hand-rolled Appendix B grammar split for
    /// schemeless relative references and malformed input, which `oxiri`
    /// rejects outright.
    pub fn parse(uri: &str) -> Self {
        match oxiri::Iri::parse(uri) {
            Ok(iri) => Self {
                scheme: Some(iri.scheme().to_string()),
                authority: iri.authority().map(str::to_string),
                path: iri.path().to_string(),
                query: iri.query().map(str::to_string),
                fragment: iri.fragment().map(str::to_string),
            },
            Err(_) => Self::parse_lenient(uri),
        }
    }

    /// `^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?`, tolerant
    /// of malformed percent-escapes (the literal bytes are preserved rather
    /// than rejected, per spec §4.1).
    fn parse_lenient(uri: &str) -> Self {
        let mut rest = uri;
        let mut scheme = None;
        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            if !candidate.is_empty()
                && candidate.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            {
                scheme = Some(candidate.to_string());
                rest = &rest[colon + 1..];
            }
        }

        let mut authority = None;
        if let Some(stripped) = rest.strip_prefix("//") {
            let end = stripped.find(['/', '?', '#']).unwrap_or(stripped.len());
            authority = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        }

        let (path_and_query, fragment) = match rest.find('#') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };
        let (path, query) = match path_and_query.find('?') {
            Some(i) => (
                path_and_query[..i].to_string(),
                Some(path_and_query[i + 1..].to_string()),
            ),
            None => (path_and_query.to_string(), None),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    pub fn has_scheme(&self) -> bool {
        self.scheme.is_some()
    }
}

/// RFC 3986 §5.2 "transform references", via [`oxiri::Iri::resolve`]. Fails
/// if `base` has no scheme (or is otherwise not a valid absolute IRI).
pub fn resolve(rel: &str, base: &str) -> Option<String> {
    let base = oxiri::Iri::parse(base).ok()?;
    base.resolve(rel).ok().map(oxiri::Iri::into_inner)
}

/// Returns the shortest relative reference `r` such that
/// `resolve(r, base) == abs`. If `root` is given, never returns a reference
/// that would require `resolve` to ascend above it; the absolute form of
/// `abs` is returned instead in that case.
pub fn relativize(abs: &str, base: &str, root: Option<&str>) -> String {
    let a = UriParts::parse(abs);
    let b = UriParts::parse(base);

    if a.scheme != b.scheme || a.authority != b.authority || a.scheme.is_none() {
        return abs.to_string();
    }

    if let Some(root) = root {
        if !abs.starts_with(root) {
            return abs.to_string();
        }
    }

    let a_segments: Vec<&str> = a.path.split('/').collect();
    let b_segments: Vec<&str> = b.path.split('/').collect();
    // Directory segments only: drop the final (file) component of each path.
    let a_dirs = &a_segments[..a_segments.len().saturating_sub(1)];
    let b_dirs = &b_segments[..b_segments.len().saturating_sub(1)];

    let common = a_dirs
        .iter()
        .zip(b_dirs.iter())
        .take_while(|(x, y)| x == y)
        .count();

    let ascents = b_dirs.len() - common;
    if let Some(root) = root {
        let root_parts = UriParts::parse(root);
        let root_dirs: Vec<&str> = root_parts.path.split('/').collect();
        let root_dirs = &root_dirs[..root_dirs.len().saturating_sub(1)];
        if ascents > b_dirs.len().saturating_sub(root_dirs.len().min(b_dirs.len())) {
            return abs.to_string();
        }
    }

    let mut out = String::new();
    for _ in 0..ascents {
        out.push_str("../");
    }
    for seg in &a_dirs[common..] {
        out.push_str(seg);
        out.push('/');
    }
    out.push_str(a_segments.last().copied().unwrap_or(""));
    if let Some(q) = &a.query {
        out.push('?');
        out.push_str(q);
    }
    if let Some(frag) = &a.fragment {
        out.push('#');
        out.push_str(frag);
    }
    if out.is_empty() {
        "./".to_string()
    } else {
        out
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/' | b':')
}

/// Percent-encodes all bytes outside the URI unreserved set (plus `/` and
/// `:`, kept literal for path and drive-letter readability); backslashes
/// become `/`. Windows drive letters (`C:`) are preserved as-is.
pub fn file_uri_encode(path: &str, host: Option<&str>) -> String {
    let mut out = String::from("file://");
    if let Some(host) = host {
        out.push_str(host);
    }
    if path.as_bytes().first() != Some(&b'/') {
        out.push('/');
    }
    for b in path.bytes() {
        let b = if b == b'\\' { b'/' } else { b };
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Inverts [`file_uri_encode`], tolerating truncated or non-hex escapes by
/// passing the bytes through unchanged rather than failing.
pub fn file_uri_decode(uri: &str) -> String {
    let rest = uri.strip_prefix("file://").unwrap_or(uri);
    let path = match rest.find('/') {
        Some(i) => &rest[i..],
        None => rest,
    };
    let decoded = percent_decode_lossy(path);
    // A leading `/C:/...` is the URI-path form of a Windows drive root;
    // strip the slash back off so the decode inverts `file_uri_encode`.
    let bytes = decoded.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
        decoded[1..].to_string()
    } else {
        decoded
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_decode_lossy(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(&h), Some(&l)) = (bytes.get(i + 1), bytes.get(i + 2)) {
                if let (Some(h), Some(l)) = (hex_val(h), hex_val(l)) {
                    out.push(h * 16 + l);
                    i += 3;
                    continue;
                }
            }
            out.push(bytes[i]);
            i += 1;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses a decimal with optional sign, exponent, and case-insensitive
/// `NaN`/`Inf`/`-Inf` tokens. Leading whitespace is skipped. Returns the
/// parsed value and the offset one past the consumed prefix.
pub fn strtod(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;

    let lower_rest = s[i..].to_ascii_lowercase();
    if let Some(rest) = lower_rest.strip_prefix('-') {
        if rest.starts_with("inf") {
            return Some((f64::NEG_INFINITY, i + 4));
        }
    }
    if lower_rest.starts_with("inf") {
        return Some((f64::INFINITY, i + 3));
    }
    if lower_rest.starts_with("nan") {
        return Some((f64::NAN, i + 3));
    }

    if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i == digits_start || (i == digits_start + 1 && bytes[digits_start] == b'.') {
        return None;
    }
    let mantissa_end = i;
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits_start {
            i = j;
        }
    }

    let parsed = s[start..i].parse::<f64>().or_else(|_| s[start..mantissa_end].parse::<f64>());
    match parsed {
        Ok(v) => Some((v, i)),
        Err(_) => None,
    }
}

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encodes `bytes` as base64, inserting a newline every `wrap` output
/// characters when given.
pub fn base64_encode(bytes: &[u8], wrap: Option<usize>) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    let mut since_wrap = 0;
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();

        let n = (b0 as u32) << 16 | (b1.unwrap_or(0) as u32) << 8 | (b2.unwrap_or(0) as u32);
        let c0 = BASE64_ALPHABET[(n >> 18 & 0x3f) as usize];
        let c1 = BASE64_ALPHABET[(n >> 12 & 0x3f) as usize];
        let c2 = if b1.is_some() {
            BASE64_ALPHABET[(n >> 6 & 0x3f) as usize]
        } else {
            b'='
        };
        let c3 = if b2.is_some() {
            BASE64_ALPHABET[(n & 0x3f) as usize]
        } else {
            b'='
        };
        for c in [c0, c1, c2, c3] {
            out.push(c as char);
            since_wrap += 1;
            if let Some(wrap) = wrap {
                if since_wrap == wrap {
                    out.push('\n');
                    since_wrap = 0;
                }
            }
        }
    }
    out
}

fn base64_val(b: u8) -> Option<u8> {
    BASE64_ALPHABET.iter().position(|&c| c == b).map(|p| p as u8)
}

/// Decodes base64, skipping whitespace and `=` padding, tolerating garbage
/// input by skipping bytes that are not in the alphabet rather than failing.
pub fn base64_decode(s: &str) -> Vec<u8> {
    let mut acc = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(decoded_size_upper_bound(s.len()));
    for &b in s.as_bytes() {
        if b.is_ascii_whitespace() || b == b'=' {
            continue;
        }
        let Some(v) = base64_val(b) else { continue };
        acc = acc << 6 | v as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }
    out
}

/// Upper bound on the decoded size for an encoded input of `encoded_len`
/// bytes, for callers that want to preallocate.
pub fn decoded_size_upper_bound(encoded_len: usize) -> usize {
    encoded_len / 4 * 3 + 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_path() {
        assert_eq!(
            resolve("b/c", "http://example.org/a/x").unwrap(),
            "http://example.org/a/b/c"
        );
        assert_eq!(resolve("#frag", "http://example.org/a").unwrap(), "http://example.org/a#frag");
        assert!(resolve("b/c", "/no/scheme").is_none());
    }

    #[test]
    fn relativize_ascends_to_common_root() {
        assert_eq!(
            relativize(
                "http://example.org/a/",
                "http://example.org/a/b/c/",
                None
            ),
            "../../"
        );
    }

    #[test]
    fn relativize_refuses_to_ascend_above_root() {
        assert_eq!(
            relativize(
                "http://example.org/a/",
                "http://example.org/a/b/c/",
                Some("http://example.org/a/b/")
            ),
            "http://example.org/a/"
        );
    }

    #[test]
    fn resolve_relativize_roundtrip() {
        let base = "http://example.org/a/b/c/";
        let abs = "http://example.org/a/d/e";
        let rel = relativize(abs, base, None);
        assert_eq!(resolve(&rel, base).unwrap(), abs);
    }

    #[test]
    fn file_uri_roundtrip() {
        let encoded = file_uri_encode("C:/My 100%", None);
        assert_eq!(encoded, "file:///C:/My%20100%25");
        assert_eq!(file_uri_decode(&encoded), "C:/My 100%");
    }

    #[test]
    fn base64_roundtrip() {
        for data in [&b""[..], b"f", b"fo", b"foo", b"foob", b"fooba", b"foobar"] {
            let encoded = base64_encode(data, None);
            assert_eq!(base64_decode(&encoded), data);
        }
    }

    #[test]
    fn strtod_parses_signs_exponents_and_specials() {
        assert_eq!(strtod("  -1.5e2rest").map(|(v, _)| v), Some(-150.0));
        assert_eq!(strtod("Inf").map(|(v, _)| v), Some(f64::INFINITY));
        assert_eq!(strtod("-inf").map(|(v, _)| v), Some(f64::NEG_INFINITY));
        assert!(strtod("nan").unwrap().0.is_nan());
        assert_eq!(strtod("3").unwrap(), (3.0, 1));
    }
}
