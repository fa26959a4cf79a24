use std::fs;
use std::hash::Hasher;
use tempfile::TempDir;
use twox_hash::XxHash64;

use docqa_core::config::SplitterMode;
use docqa_core::types::{ChunkConfig, Language};
use docqa_core::Error;
use docqa_embed::TfidfEmbedder;
use docqa_text::Chunker;
use docqa_vector::storage::{decode, encode, SCHEMA_VERSION};
use docqa_vector::{load, save, Index};

const HANDBOOK: &str = "The handbook covers vacation policy and benefits.\n\
    Holidays include Nowruz and other national days.\n\
    Employees may request leave via the HR portal.\n";

fn sample_index() -> Index {
    let chunker = Chunker::new(Language::English, ChunkConfig::new(8, 2).unwrap(), SplitterMode::Basic).unwrap();
    Index::build(HANDBOOK, "handbook.txt", &chunker, &TfidfEmbedder::default()).expect("build")
}

/// Rewrite the JSON header of an encoded index and recompute the checksum,
/// so only the header contents are wrong.
fn with_header(bytes: &[u8], edit: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
    let header_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
    let mut header: serde_json::Value = serde_json::from_slice(&bytes[16..16 + header_len]).unwrap();
    edit(&mut header);
    let header = serde_json::to_vec(&header).unwrap();

    let mut out = bytes[..8].to_vec();
    out.extend_from_slice(&(header.len() as u64).to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&bytes[16 + header_len..bytes.len() - 8]);
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&out);
    out.extend_from_slice(&hasher.finish().to_le_bytes());
    out
}

#[test]
fn save_then_load_is_exact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/dir/handbook.dqix");
    let index = sample_index();
    save(&index, &path).expect("save");
    let loaded = load(&path).expect("load");
    assert_eq!(loaded, index);
    assert_eq!(loaded.config().source_name.as_deref(), Some("handbook.txt"));
    assert_eq!(loaded.config().splitter, "punctuation-en");
}

#[test]
fn save_replaces_existing_file_without_leftovers() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("idx.dqix");
    fs::write(&path, b"old").unwrap();
    save(&sample_index(), &path).unwrap();
    assert!(load(&path).is_ok());
    let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "temp file was renamed into place");
}

#[test]
fn other_schema_version_is_incompatible() {
    let mut bytes = encode(&sample_index()).unwrap();
    bytes[4..8].copy_from_slice(&(SCHEMA_VERSION + 1).to_le_bytes());
    let err = decode(std::path::Path::new("v2.dqix"), &bytes).unwrap_err();
    assert!(matches!(err, Error::IncompatibleIndex { .. }), "{err}");
}

#[test]
fn foreign_file_is_incompatible() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("not-an-index.json");
    fs::write(&path, br#"{"chunks": []}"#).unwrap();
    assert!(matches!(load(&path), Err(Error::IncompatibleIndex { .. })));
}

#[test]
fn flipped_byte_fails_checksum() {
    let mut bytes = encode(&sample_index()).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x01;
    let err = decode(std::path::Path::new("x.dqix"), &bytes).unwrap_err();
    assert!(matches!(err, Error::CorruptIndex { ref reason, .. } if reason.contains("checksum")), "{err}");
}

#[test]
fn truncated_file_is_corrupt() {
    let bytes = encode(&sample_index()).unwrap();
    for cut in [6, 20, bytes.len() - 3] {
        let err = decode(std::path::Path::new("x.dqix"), &bytes[..cut]).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }), "cut at {cut}: {err}");
    }
}

#[test]
fn failed_load_leaves_loaded_index_alone() {
    let tmp = TempDir::new().unwrap();
    let good = tmp.path().join("good.dqix");
    let bad = tmp.path().join("bad.dqix");
    let index = sample_index();
    save(&index, &good).unwrap();
    let mut bytes = fs::read(&good).unwrap();
    bytes[4] = 9;
    fs::write(&bad, &bytes).unwrap();

    let mut current = load(&good).unwrap();
    if let Ok(replacement) = load(&bad) {
        current = replacement;
    }
    assert_eq!(current, index);
}

#[test]
fn missing_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(load(&tmp.path().join("nope.dqix")), Err(Error::Io(_))));
}

#[test]
fn resealed_header_without_changes_loads() {
    let index = sample_index();
    let bytes = with_header(&encode(&index).unwrap(), |_| {});
    assert_eq!(decode(std::path::Path::new("x.dqix"), &bytes).unwrap(), index);
}

#[test]
fn chunk_in_another_language_is_corrupt() {
    let bytes = with_header(&encode(&sample_index()).unwrap(), |h| {
        h["chunks"][1]["language"] = serde_json::to_value(Language::Persian).unwrap();
    });
    let err = decode(std::path::Path::new("x.dqix"), &bytes).unwrap_err();
    assert!(matches!(err, Error::CorruptIndex { ref reason, .. } if reason.contains("chunk 1 is fa")), "{err}");
}

#[test]
fn chunks_out_of_source_order_are_corrupt() {
    let index = sample_index();
    assert!(index.chunks()[1].char_span.start > 0);
    let bytes = with_header(&encode(&index).unwrap(), |h| {
        h["chunks"][2]["char_span"]["start"] = 0.into();
    });
    let err = decode(std::path::Path::new("x.dqix"), &bytes).unwrap_err();
    assert!(matches!(err, Error::CorruptIndex { ref reason, .. } if reason.contains("chunk 2 starts at 0")), "{err}");
}
