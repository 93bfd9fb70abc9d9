use livepeek::document::ingest::parse_update;
use livepeek::document::{IngestError, SharedDocument, UpdateRecord, ingest};
use std::io::Cursor;
use std::path::Path;

#[test]
fn test_parse_named_record() {
    let record = parse_update(r##"{"content": "# Hi", "directory": "/tmp/assets"}"##)
        .unwrap()
        .unwrap();

    assert_eq!(
        record,
        UpdateRecord::Named {
            content: "# Hi".to_string(),
            directory: "/tmp/assets".to_string(),
        }
    );
}

#[test]
fn test_parse_positional_record() {
    let record = parse_update(r##"["# Hi", "/tmp/assets"]"##).unwrap().unwrap();

    assert_eq!(
        record,
        UpdateRecord::Positional("# Hi".to_string(), "/tmp/assets".to_string())
    );
    assert_eq!(
        record.into_parts(),
        ("# Hi".to_string(), "/tmp/assets".to_string())
    );
}

#[test]
fn test_parse_blank_line_is_skipped() {
    assert!(parse_update("").unwrap().is_none());
    assert!(parse_update("   \t").unwrap().is_none());
}

#[test]
fn test_parse_rejects_malformed_records() {
    assert!(parse_update("not json").is_err());
    assert!(parse_update(r#"{"content": "x"}"#).is_err());
    assert!(parse_update(r#"["only one"]"#).is_err());
    assert!(parse_update(r#"["a", "b", "c"]"#).is_err());
    assert!(parse_update(r#"{"content": 1, "directory": "/d"}"#).is_err());
}

#[test]
fn test_ingest_applies_in_order() {
    let input = concat!(
        r#"{"content": "first", "directory": "/one"}"#,
        "\n",
        "\n",
        r#"["second", "/two"]"#,
        "\n",
    );
    let doc = SharedDocument::new();

    let applied = ingest(Cursor::new(input), &doc).unwrap();

    assert_eq!(applied, 2);
    let snap = doc.blocking_snapshot();
    assert_eq!(&snap.content[..], b"second");
    assert_eq!(snap.directory, Path::new("/two"));
    assert_eq!(snap.generation, 2);
}

#[test]
fn test_ingest_keeps_unicode_content() {
    let input = r#"{"content": "café ☃", "directory": "/d"}"#;
    let doc = SharedDocument::new();

    ingest(Cursor::new(input), &doc).unwrap();

    assert_eq!(&doc.blocking_snapshot().content[..], "café ☃".as_bytes());
}

#[test]
fn test_ingest_malformed_line_is_fatal() {
    let input = "[\"ok\", \"/d\"]\n{broken\n[\"never\", \"/x\"]\n";
    let doc = SharedDocument::new();

    let err = ingest(Cursor::new(input), &doc).unwrap_err();

    assert!(matches!(err, IngestError::Malformed { line: 2, .. }));
    // Lines before the bad one were applied, lines after it were not
    assert_eq!(&doc.blocking_snapshot().content[..], b"ok");
}

#[test]
fn test_ingest_empty_stream() {
    let doc = SharedDocument::new();
    assert_eq!(ingest(Cursor::new(""), &doc).unwrap(), 0);
    assert_eq!(doc.blocking_snapshot().generation, 0);
}
