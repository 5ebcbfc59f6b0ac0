//! Query-string parsing and serialization for attribution payloads.
//!
//! The decoded attribution payload is `application/x-www-form-urlencoded`.
//! Serialization is always in ascending key order so a payload re-encodes
//! deterministically.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
    #[error("query is not valid UTF-8")]
    InvalidUtf8,
}

/// An ordered multimap of query keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `key`, or the empty string.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .and_then(|list| list.first())
            .map_or("", String::as_str)
    }

    /// Replace all values of `key` with a single value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), vec![value.to_string()]);
    }

    /// Append an additional value for `key`.
    pub fn append(&mut self, key: &str, value: &str) {
        self.values
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Remove every value of `key`.
    pub fn del(&mut self, key: &str) {
        self.values.remove(key);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Form-encode in ascending key order (`a=1&b=2`), escaping keys and
    /// values with `+` for spaces.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.values {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// Escape a string as a form-urlencoded component (space becomes `+`).
#[must_use]
pub fn query_escape(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Inverse of [`query_escape`]: decode `+` and percent escapes.
pub fn query_unescape(s: &str) -> Result<String, QueryParseError> {
    unescape(s)
}

fn unescape(s: &str) -> Result<String, QueryParseError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(QueryParseError::InvalidEscape(s[i..].to_string()));
                }
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                    _ => {
                        return Err(QueryParseError::InvalidEscape(
                            String::from_utf8_lossy(&bytes[i..i + 3]).into_owned(),
                        ));
                    }
                }
                i += 3;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| QueryParseError::InvalidUtf8)
}

/// Strict form-urlencoded parse; any invalid escape fails the whole parse.
pub fn parse_query(query: &str) -> Result<QueryValues, QueryParseError> {
    let mut values = QueryValues::new();
    for piece in query.split(['&', ';']) {
        if piece.is_empty() {
            continue;
        }
        let (key, value) = match piece.split_once('=') {
            Some((key, value)) => (key, value),
            None => (piece, ""),
        };
        values.append(&unescape(key)?, &unescape(value)?);
    }
    Ok(values)
}

/// Parse a request query string, keeping the `attribution_code` value in
/// its raw escaped form.
///
/// The attribution code is treated as opaque: it is signed as transmitted,
/// so decoding it here would break HMAC verification for payloads
/// containing escaped characters. Pairs with invalid escapes are skipped,
/// everything else is still returned.
#[must_use]
pub fn parse_query_no_escape(query: &str) -> QueryValues {
    let mut values = QueryValues::new();
    for piece in query.split(['&', ';']) {
        if piece.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = match piece.split_once('=') {
            Some((key, value)) => (key, value),
            None => (piece, ""),
        };
        let key = match unescape(raw_key) {
            Ok(key) => key,
            Err(_) => continue,
        };
        if key == "attribution_code" {
            values.append(&key, raw_value);
            continue;
        }
        match unescape(raw_value) {
            Ok(value) => values.append(&key, &value),
            Err(_) => continue,
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_get() {
        let values = parse_query("source=mozilla.com&medium=organic&campaign=(not%20set)").unwrap();
        assert_eq!(values.get("source"), "mozilla.com");
        assert_eq!(values.get("medium"), "organic");
        assert_eq!(values.get("campaign"), "(not set)");
        assert_eq!(values.get("missing"), "");
    }

    #[test]
    fn plus_decodes_to_space() {
        let values = parse_query("campaign=(not+set)").unwrap();
        assert_eq!(values.get("campaign"), "(not set)");
    }

    #[test]
    fn invalid_escape_is_an_error() {
        assert!(parse_query("a=%zz").is_err());
        assert!(parse_query("a=%2").is_err());
        assert!(parse_query("%zz=1").is_err());
    }

    #[test]
    fn encode_sorts_keys() {
        let mut values = QueryValues::new();
        values.set("medium", "organic");
        values.set("source", "www.google.com");
        values.set("campaign", "(not set)");
        assert_eq!(
            values.encode(),
            "campaign=%28not+set%29&medium=organic&source=www.google.com"
        );
    }

    #[test]
    fn query_escape_matches_form_encoding() {
        assert_eq!(query_escape("a=b&c d"), "a%3Db%26c+d");
    }

    #[test]
    fn no_escape_parse_preserves_attribution_code() {
        let values = parse_query_no_escape(
            "product=test-stub&os=win&lang=en-US&attribution_code=source%3Dgoogle%26medium%3Dpaidsearch%26campaign%3Dfoopy%26content%3D%28not+set%29%26timestamp%3D1482358230",
        );
        assert_eq!(
            values.get("attribution_code"),
            "source%3Dgoogle%26medium%3Dpaidsearch%26campaign%3Dfoopy%26content%3D%28not+set%29%26timestamp%3D1482358230"
        );
        assert_eq!(values.get("product"), "test-stub");
        assert_eq!(values.get("os"), "win");
    }

    #[test]
    fn no_escape_parse_skips_broken_pairs() {
        let values = parse_query_no_escape("good=1&bad=%zz&also=2");
        assert_eq!(values.get("good"), "1");
        assert_eq!(values.get("also"), "2");
        assert!(!values.contains("bad"));
    }
}
