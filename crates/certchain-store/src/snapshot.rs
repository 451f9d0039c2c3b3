//! Snapshot file format.
//!
//! ```json
//! { "version": 1, "entries": [ { "hash": "<64 hex>", "record": { ... } } ] }
//! ```
//!
//! Entries are written in insertion order. A flat `{ "<hash>": { ... } }`
//! object (the pre-versioned layout) is also accepted on load, in file
//! order; it is rewritten in the versioned layout on the next `put`. Its
//! records were hashed as legacy JSON text and are tagged
//! [`HashScheme::LegacyJson`] so they keep verifying after the rewrite.

use std::path::Path;

use certchain_core::{ContentHash, HashScheme, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::index::Index;

pub(crate) const SNAPSHOT_VERSION: u64 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u64,
    entries: Vec<EntryRef<'a>>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    hash: &'a ContentHash,
    record: &'a Record,
}

#[derive(Deserialize)]
struct Snapshot {
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    hash: ContentHash,
    record: Record,
}

/// Serialize entries in the given order.
pub(crate) fn encode<'a>(
    entries: impl Iterator<Item = (&'a ContentHash, &'a Record)>,
) -> Result<Vec<u8>, serde_json::Error> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        entries: entries
            .map(|(hash, record)| EntryRef { hash, record })
            .collect(),
    };
    serde_json::to_vec_pretty(&snapshot)
}

/// Parse a snapshot file. Duplicate hashes keep their first position and
/// their last value.
pub(crate) fn decode(path: &Path, bytes: &[u8]) -> Result<Index, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let value: Value = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(corrupt("expected a JSON object".into()));
    };

    let mut index = Index::default();
    match map.get("version") {
        Some(version) => {
            let version = version
                .as_u64()
                .ok_or_else(|| corrupt("version is not an unsigned integer".into()))?;
            if version != SNAPSHOT_VERSION {
                return Err(StoreError::UnsupportedVersion {
                    path: path.to_path_buf(),
                    version,
                });
            }
            let snapshot: Snapshot =
                serde_json::from_value(Value::Object(map)).map_err(|e| corrupt(e.to_string()))?;
            for entry in snapshot.entries {
                index.insert(entry.hash, entry.record);
            }
        }
        None => {
            // `map` is key-sorted; re-read to keep the file's entry order.
            let entries: IndexMap<String, Value> =
                serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
            for (key, value) in entries {
                let hash = ContentHash::parse(&key).map_err(|e| corrupt(e.to_string()))?;
                let record: Record = serde_json::from_value(value)
                    .map_err(|e| corrupt(format!("entry {key}: {e}")))?;
                index.insert(hash, record.with_hash_scheme(HashScheme::LegacyJson));
            }
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certchain_core::{BlobKind, BlobRef, RecordFields, Timestamp};

    fn record(name: &str) -> Record {
        Record::issue(
            RecordFields {
                name: Some(name.into()),
                course_name: Some("Data Structures".into()),
                institute_name: Some("Tech U".into()),
            }
            .validate()
            .unwrap(),
            BlobRef::new(BlobKind::Pdf, "pdf-1").unwrap(),
            BlobRef::new(BlobKind::Photo, "photo-1").unwrap(),
            Timestamp::parse("2026-01-15T12:00:00.000Z").unwrap(),
        )
    }

    #[test]
    fn encode_then_decode_keeps_order() {
        let a = record("A");
        let b = record("B");
        let (ha, hb) = (a.content_hash(), b.content_hash());
        let bytes = encode([(&hb, &b), (&ha, &a)].into_iter()).unwrap();
        let index = decode(Path::new("db.json"), &bytes).unwrap();
        assert_eq!(index.hashes(), vec![hb, ha]);
        assert_eq!(index.get(&ha), Some(&a));
    }

    #[test]
    fn encoded_layout() {
        let a = record("A");
        let h = a.content_hash();
        let bytes = encode([(&h, &a)].into_iter()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["entries"][0]["hash"], h.to_hex());
        assert_eq!(value["entries"][0]["record"]["name"], "A");
    }

    #[test]
    fn duplicate_entries_last_value_wins() {
        let a = record("A");
        let b = record("B");
        let h = a.content_hash();
        let bytes = encode([(&h, &a), (&h, &b)].into_iter()).unwrap();
        let index = decode(Path::new("db.json"), &bytes).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&h), Some(&b));
    }

    #[test]
    fn decodes_legacy_flat_object() {
        let hash = "ab".repeat(32);
        let json = format!(
            r#"{{ "{hash}": {{
                "name": "Alice Tan",
                "courseName": "Data Structures",
                "instituteName": "Tech U",
                "pdfFilename": "pdf-1700000000000-1.pdf",
                "photoFilename": "photo-1700000000000-2.png",
                "createdAt": "2026-01-15T12:00:00.000Z"
            }} }}"#
        );
        let index = decode(Path::new("db.json"), json.as_bytes()).unwrap();
        let record = index.get(&ContentHash::parse(&hash).unwrap()).unwrap();
        assert_eq!(record.pdf_ref().as_str(), "pdf-1700000000000-1.pdf");
        assert_eq!(record.hash_scheme(), HashScheme::LegacyJson);
    }

    #[test]
    fn legacy_entries_keep_file_order() {
        let keys = ["ff".repeat(32), "00".repeat(32), "7a".repeat(32)];
        let body: Vec<String> = keys
            .iter()
            .zip(["Zed", "Amy", "Kim"])
            .map(|(key, name)| {
                format!(
                    r#""{key}": {{
                        "name": "{name}",
                        "courseName": "C",
                        "instituteName": "I",
                        "pdfFilename": "p.pdf",
                        "photoFilename": "q.png",
                        "createdAt": "2026-01-15T12:00:00.000Z"
                    }}"#
                )
            })
            .collect();
        let json = format!("{{ {} }}", body.join(","));

        let index = decode(Path::new("db.json"), json.as_bytes()).unwrap();
        let expected: Vec<ContentHash> =
            keys.iter().map(|k| ContentHash::parse(k).unwrap()).collect();
        assert_eq!(index.hashes(), expected);
    }

    #[test]
    fn v1_entries_keep_their_scheme() {
        let legacy = record("A").with_hash_scheme(HashScheme::LegacyJson);
        let current = record("B");
        let (hl, hc) = (legacy.content_hash(), current.content_hash());
        let bytes = encode([(&hl, &legacy), (&hc, &current)].into_iter()).unwrap();
        let index = decode(Path::new("db.json"), &bytes).unwrap();
        assert_eq!(index.get(&hl).unwrap().hash_scheme(), HashScheme::LegacyJson);
        assert_eq!(index.get(&hc).unwrap().hash_scheme(), HashScheme::V1);
    }

    #[test]
    fn empty_legacy_object_is_empty_index() {
        let index = decode(Path::new("db.json"), b"{}").unwrap();
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn rejects_garbage_and_unknown_versions() {
        let path = Path::new("db.json");
        assert!(matches!(
            decode(path, b""),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            decode(path, b"[1,2]"),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            decode(path, br#"{"version": 2, "entries": []}"#),
            Err(StoreError::UnsupportedVersion { version: 2, .. })
        ));
        assert!(matches!(
            decode(path, br#"{"not-a-hash": {}}"#),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
