//! Integration tests for JsonPointer.

use pinpoint::path::{escape, unescape};
use pinpoint::{ConfigError, JsonPointer, PathSegment};
use proptest::prelude::*;

#[test]
fn test_pointer_construction_and_display() {
    // Root pointer
    assert_eq!(JsonPointer::root().to_string(), "");

    // Simple field
    assert_eq!(JsonPointer::root().push("name").to_string(), "/name");

    // Simple index
    assert_eq!(JsonPointer::root().push(0).to_string(), "/0");

    // Complex nested pointer
    let mut pointer = JsonPointer::root();
    pointer.push("users").push(0).push("address").push("city");
    assert_eq!(pointer.to_string(), "/users/0/address/city");
}

#[test]
fn test_segments_convert() {
    assert_eq!(PathSegment::from("a"), PathSegment::field("a"));
    assert_eq!(PathSegment::from(3), PathSegment::index(3));
    assert_eq!(PathSegment::from("a".to_string()), PathSegment::Field("a".to_string()));
}

#[test]
fn test_sibling_traversal() {
    let mut pointer = JsonPointer::root();
    pointer.push("person").push("children");

    let mut seen = Vec::new();
    for index in 0..3 {
        pointer.push(index);
        seen.push(pointer.to_string());
        pointer.pop();
    }

    assert_eq!(
        seen,
        vec![
            "/person/children/0",
            "/person/children/1",
            "/person/children/2"
        ]
    );
    assert_eq!(pointer.to_string(), "/person/children");
}

#[test]
fn test_push_many_returns_count_for_pop_n() {
    let mut pointer = JsonPointer::parse("/base").unwrap();
    let pushed = pointer.push_many("/a/b/c").unwrap();
    assert_eq!(pushed, 3);

    pointer.pop_n(pushed);
    assert_eq!(pointer.to_string(), "/base");
}

#[test]
fn test_fragments_and_last() {
    let pointer = JsonPointer::parse("/a~1b/0/c").unwrap();
    assert_eq!(pointer.fragments().collect::<Vec<_>>(), vec!["a~1b", "0", "c"]);
    assert_eq!(pointer.last(), Some("c"));
    assert_eq!(unescape(pointer.fragment_at(0).unwrap()), "a/b");
    assert_eq!(JsonPointer::root().last(), None);
}

#[test]
fn test_malformed_escapes() {
    for bad in ["/~", "/a~2", "/~~0", "/x/~a"] {
        assert!(
            matches!(
                JsonPointer::parse(bad),
                Err(ConfigError::MalformedLocation { .. })
            ),
            "expected {bad:?} to be rejected"
        );
    }
}

fn fragment() -> impl Strategy<Value = String> {
    "[a-z~/0-9]{0,6}"
}

proptest! {
    #[test]
    fn prop_push_then_pop_restores(
        base in prop::collection::vec(fragment(), 0..4),
        extra in fragment(),
    ) {
        let mut pointer = JsonPointer::root();
        for f in &base {
            pointer.push(f.as_str());
        }
        let before = pointer.clone();

        pointer.push(extra.as_str()).pop();
        prop_assert_eq!(pointer, before);
    }

    #[test]
    fn prop_render_parse_roundtrip(fragments in prop::collection::vec(fragment(), 0..5)) {
        let mut pointer = JsonPointer::root();
        for f in &fragments {
            pointer.push(f.as_str());
        }

        let rendered = pointer.to_string();
        let reparsed = JsonPointer::parse(&rendered).unwrap();
        prop_assert_eq!(reparsed.to_string(), rendered);
        prop_assert_eq!(reparsed.len(), fragments.len());
    }

    #[test]
    fn prop_escape_unescape_inverse(raw in "[a-z~/]{0,10}") {
        let escaped = escape(&raw);
        prop_assert_eq!(unescape(&escaped), raw.as_str());
    }
}
