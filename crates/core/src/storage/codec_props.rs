//! Property-based tests for the identifier codec.
//!
//! - Round trip: `decode(encode(p)) == p` for every valid native path
//! - URL safety: identifiers never need escaping
//! - Rejection: arbitrary text either decodes to a valid path or fails

use proptest::prelude::*;

use super::codec::{decode, encode, validate_path};
use super::error::StorageError;

/// Strategy for a single path segment: printable Unicode, spaces included,
/// without separators and not `.`/`..`.
fn segment() -> impl Strategy<Value = String> {
    "[^/\\\\\\x00]{1,24}".prop_filter("dot segments are not valid", |s| s != "." && s != "..")
}

/// Strategy for a native path of 1 to 6 segments.
fn native_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..6).prop_map(|segments| segments.join("/"))
}

proptest! {
    #[test]
    fn prop_round_trip(path in native_path()) {
        prop_assume!(validate_path(&path).is_ok());
        let id = encode(&path);
        prop_assert_eq!(decode(id.as_str()).unwrap(), path);
    }

    #[test]
    fn prop_identifier_is_url_path_safe(path in ".*") {
        let id = encode(&path);
        for c in id.as_str().chars() {
            let safe = c.is_ascii_alphanumeric() || c == '-' || c == '_';
            prop_assert!(safe, "Unexpected character in identifier: {}", c);
        }
    }

    #[test]
    fn prop_distinct_paths_distinct_identifiers(a in native_path(), b in native_path()) {
        prop_assume!(a != b);
        prop_assert_ne!(encode(&a), encode(&b));
    }

    #[test]
    fn prop_arbitrary_text_never_yields_invalid_path(text in "[A-Za-z0-9_=+/.-]{0,32}") {
        match decode(&text) {
            Ok(path) => {
                prop_assert!(validate_path(&path).is_ok());
                let reencoded = encode(&path);
                prop_assert_eq!(reencoded.as_str(), text.as_str());
            }
            Err(err) => {
                let malformed = matches!(err, StorageError::MalformedIdentifier(_));
                prop_assert!(malformed, "Expected MalformedIdentifier");
            }
        }
    }

    #[test]
    fn prop_traversal_never_decodes(prefix in native_path(), suffix in native_path()) {
        let escaping = format!("{prefix}/../../{suffix}");
        let result = decode(encode(&escaping).as_str());
        let malformed = matches!(result, Err(StorageError::MalformedIdentifier(_)));
        prop_assert!(malformed, "Expected MalformedIdentifier");
    }
}
