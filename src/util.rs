//! # Bounded Copy Utilities
//!
//! Helpers for moving borrowed caller data into fixed-capacity `heapless`
//! storage. Every copy is all-or-nothing: a value that does not fit is
//! rejected, never truncated.

use core::fmt::Write;

use heapless::{String, Vec};

/// Copies `value` into a `String<N>`, or returns `None` if it does not fit.
pub fn bounded_str<const N: usize>(value: &str) -> Option<String<N>> {
    if value.len() > N {
        return None;
    }
    let mut owned = String::new();
    owned.push_str(value).ok()?;
    Some(owned)
}

/// Copies `value` into a `Vec<u8, N>`, or returns `None` if it does not fit.
pub fn bounded_bytes<const N: usize>(value: &[u8]) -> Option<Vec<u8, N>> {
    if value.len() > N {
        return None;
    }
    Vec::from_slice(value).ok()
}

/// Returns the part of a publish payload that is actually sent.
///
/// A single trailing line feed is stripped, so `b"hello\n"` becomes
/// `b"hello"` and `b"\n"` becomes empty.
pub fn effective_payload(payload: &[u8]) -> &[u8] {
    match payload.split_last() {
        Some((b'\n', rest)) => rest,
        _ => payload,
    }
}

/// Writes `prefix` followed by the lowercase hex digits of `bytes`.
///
/// Returns `None` if the result does not fit in `N` bytes.
pub fn hex_with_prefix<const N: usize>(prefix: &str, bytes: &[u8]) -> Option<String<N>> {
    let mut out: String<N> = bounded_str(prefix)?;
    for byte in bytes {
        write!(out, "{byte:02x}").ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_str_rejects_instead_of_truncating() {
        assert_eq!(bounded_str::<4>("abcd").as_deref(), Some("abcd"));
        assert!(bounded_str::<4>("abcde").is_none());
        assert_eq!(bounded_str::<4>("").as_deref(), Some(""));
    }

    #[test]
    fn bounded_bytes_rejects_instead_of_truncating() {
        assert_eq!(bounded_bytes::<3>(b"abc").as_deref(), Some(&b"abc"[..]));
        assert!(bounded_bytes::<3>(b"abcd").is_none());
    }

    #[test]
    fn trailing_line_feed_is_stripped_once() {
        assert_eq!(effective_payload(b"hello\n"), b"hello");
        assert_eq!(effective_payload(b"hello"), b"hello");
        assert_eq!(effective_payload(b"\n"), b"");
        assert_eq!(effective_payload(b""), b"");
        assert_eq!(effective_payload(b"a\n\n"), b"a\n");
        assert_eq!(effective_payload(b"a\r\n"), b"a\r");
    }

    #[test]
    fn hex_with_prefix_formats_lowercase() {
        let id: String<16> = hex_with_prefix("pub-", &[0xde, 0xad, 0x00, 0x0f]).unwrap();
        assert_eq!(id.as_str(), "pub-dead000f");
        assert!(hex_with_prefix::<6>("pub-", &[0xde, 0xad]).is_none());
    }
}
