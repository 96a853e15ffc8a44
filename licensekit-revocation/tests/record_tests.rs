use licensekit_revocation::{RevocationError, RevocationRecord, RECORD_FORMAT};
use licensekit_types::LicenseId;
use proptest::prelude::*;

fn id(s: &str) -> LicenseId {
    LicenseId::parse(s).unwrap()
}

// ── Encoding ─────────────────────────────────────────────────────

#[test]
fn empty_record_encoding() {
    let bytes = RevocationRecord::new().encode().unwrap();
    assert_eq!(bytes, br#"{"format":1,"revoked":[]}"#);
}

#[test]
fn encoding_is_sorted() {
    let mut record = RevocationRecord::new();
    record.insert(&id("b"));
    record.insert(&id("a"));
    let bytes = record.encode().unwrap();
    assert_eq!(bytes, br#"{"format":1,"revoked":["a","b"]}"#);
}

#[test]
fn insert_reports_duplicates() {
    let mut record = RevocationRecord::new();
    assert!(record.insert(&id("abc123")));
    assert!(!record.insert(&id("abc123")));
    assert_eq!(record.len(), 1);
}

// ── Decoding ─────────────────────────────────────────────────────

#[test]
fn decode_empty_bytes() {
    let record = RevocationRecord::decode(b"").unwrap();
    assert!(record.is_empty());
}

#[test]
fn decode_json_document() {
    let record = RevocationRecord::decode(br#"{"format":1,"revoked":["x","y"]}"#).unwrap();
    assert!(record.contains("x"));
    assert!(record.contains("y"));
    assert_eq!(record.iter().collect::<Vec<_>>(), vec!["x", "y"]);
}

#[test]
fn decode_legacy_newline_format() {
    // Legacy records prefix every appended ID with a newline.
    let record = RevocationRecord::decode(b"\nabc123\ndef456\r\n\n").unwrap();
    assert_eq!(record.iter().collect::<Vec<_>>(), vec!["abc123", "def456"]);
}

#[test]
fn decode_legacy_duplicates_collapse() {
    let record = RevocationRecord::decode(b"a\na\nb").unwrap();
    assert_eq!(record.len(), 2);
}

#[test]
fn decode_unknown_format_is_corrupt() {
    let result = RevocationRecord::decode(br#"{"format":2,"revoked":[]}"#);
    assert!(matches!(result, Err(RevocationError::CorruptRecord(_))));
}

#[test]
fn decode_truncated_json_is_corrupt() {
    let result = RevocationRecord::decode(br#"{"format":1,"revoked":["a""#);
    assert!(matches!(result, Err(RevocationError::CorruptRecord(_))));
}

#[test]
fn decode_non_utf8_is_corrupt() {
    let result = RevocationRecord::decode(&[0xff, 0xfe, 0x00]);
    assert!(matches!(result, Err(RevocationError::CorruptRecord(_))));
}

#[test]
fn decode_json_array_is_corrupt() {
    let result = RevocationRecord::decode(br#"["aaa","bbb"]"#);
    assert!(matches!(result, Err(RevocationError::CorruptRecord(_))));
}

#[test]
fn decode_bom_prefixed_document_is_corrupt() {
    let bytes = "\u{feff}{\"format\":1,\"revoked\":[\"aaa\",\"bbb\"]}".as_bytes();
    let result = RevocationRecord::decode(bytes);
    assert!(matches!(result, Err(RevocationError::CorruptRecord(_))));
}

#[test]
fn decode_free_text_is_corrupt() {
    for text in ["revoked: aaa, bbb", "abc123\nnot an id\n", "<html>oops</html>"] {
        let result = RevocationRecord::decode(text.as_bytes());
        assert!(
            matches!(result, Err(RevocationError::CorruptRecord(_))),
            "{text:?} should be rejected"
        );
    }
}

#[test]
fn format_constant() {
    assert_eq!(RECORD_FORMAT, 1);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    /// Growing a record never loses earlier members across a store cycle.
    #[test]
    fn growth_preserves_membership(
        ids in prop::collection::vec("[A-Za-z0-9_-]{1,40}", 0..50),
        extra in "[A-Za-z0-9_-]{1,40}",
    ) {
        let ids: Vec<LicenseId> = ids.iter().map(|s| id(s)).collect();
        let record: RevocationRecord = ids.iter().collect();

        let mut grown = RevocationRecord::decode(&record.encode().unwrap()).unwrap();
        grown.insert(&id(&extra));
        let reloaded = RevocationRecord::decode(&grown.encode().unwrap()).unwrap();

        for i in &ids {
            prop_assert!(reloaded.contains(i.as_str()));
        }
        prop_assert!(reloaded.contains(&extra));
    }
}
