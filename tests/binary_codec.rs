use std::fs;

use tempfile::tempdir;
use user_history::context::NgramContext;
use user_history::persistence::{BinaryCodec, CodecError, DictionaryCodec};
use user_history::types::WordEntry;

fn entries() -> Vec<WordEntry> {
    vec![
        WordEntry {
            word: "hello".into(),
            context: NgramContext::EMPTY,
            score: 64,
            last_touched: 10,
        },
        WordEntry {
            word: "world".into(),
            context: NgramContext::beginning_of_sentence().next("hello", 2),
            score: 111,
            last_touched: -3,
        },
    ]
}

#[test]
fn invariant_save_then_load_preserves_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("UserHistory.en.dict");

    BinaryCodec.save(&path, &entries()).unwrap();
    assert_eq!(BinaryCodec.load(&path).unwrap(), entries());
}

#[test]
fn invariant_save_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("UserHistory.en.dict");

    BinaryCodec.save(&path, &entries()).unwrap();
    BinaryCodec.save(&path, &[]).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("UserHistory.en.dict")]);
    assert!(BinaryCodec.load(&path).unwrap().is_empty());
}

#[test]
fn invariant_missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let err = BinaryCodec.load(&dir.path().join("absent.dict")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn invariant_flipped_payload_byte_fails_checksum() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("UserHistory.en.dict");
    BinaryCodec.save(&path, &entries()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, bytes).unwrap();

    match BinaryCodec.load(&path) {
        Err(CodecError::ChecksumMismatch { expected, actual }) => {
            assert_eq!(expected.len(), 64);
            assert_ne!(expected, actual);
        }
        other => panic!("expected checksum mismatch, got {other:?}"),
    }
}

#[test]
fn invariant_foreign_files_are_rejected() {
    let dir = tempdir().unwrap();
    let short = dir.path().join("short.dict");
    let foreign = dir.path().join("foreign.dict");
    fs::write(&short, b"UHD").unwrap();
    fs::write(&foreign, vec![b'x'; 128]).unwrap();

    assert!(matches!(BinaryCodec.load(&short), Err(CodecError::Truncated(3))));
    assert!(matches!(BinaryCodec.load(&foreign), Err(CodecError::BadMagic)));
}

#[test]
fn invariant_unknown_format_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("UserHistory.en.dict");
    BinaryCodec.save(&path, &entries()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    assert!(matches!(
        BinaryCodec.load(&path),
        Err(CodecError::UnsupportedVersion(7))
    ));
}
