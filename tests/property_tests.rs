//! Property-based checks for the fingerprinter, the index, and input
//! normalization.

use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

use dupmove::index::IndexBuilder;
use dupmove::prompt::normalize_input;
use dupmove::scanner::{Hasher, WalkerConfig};

proptest! {
    #[test]
    fn test_digest_determinism(content in prop::collection::vec(any::<u8>(), 0..16384)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let d1 = hasher.digest(&path).unwrap();
        let d2 = hasher.digest(&path).unwrap();

        prop_assert_eq!(d1, d2);
        // Streaming must agree with one-shot hashing of the same bytes
        prop_assert_eq!(d1, blake3::hash(&content));
    }

    #[test]
    fn test_size_index_invariants(sizes in prop::collection::vec(0usize..512, 0..20)) {
        let dir = TempDir::new().unwrap();
        for (i, size) in sizes.iter().enumerate() {
            fs::write(dir.path().join(format!("f{i:03}.bin")), vec![0u8; *size]).unwrap();
        }

        let index = IndexBuilder::new(dir.path(), WalkerConfig::default())
            .build()
            .unwrap();

        // Every file is indexed exactly once
        prop_assert_eq!(index.file_count(), sizes.len());

        // Each file is findable under its own size, and bucket members
        // really have the bucket's size
        for (i, size) in sizes.iter().enumerate() {
            let name = format!("f{i:03}.bin");
            let bucket = index.bucket(*size as u64).unwrap();
            let found = bucket.iter().any(|p| p.ends_with(&name));
            prop_assert!(found, "{} missing from its size bucket", name);
            for member in bucket {
                prop_assert_eq!(fs::metadata(member).unwrap().len(), *size as u64);
            }
        }
    }

    #[test]
    fn test_normalize_input_trims_edges(raw in "\\PC{0,40}") {
        let normalized = normalize_input(&raw);
        // Output carries no surrounding whitespace and is a substring of
        // the input (normalization only ever removes characters)
        prop_assert_eq!(normalized.trim(), normalized.as_str());
        prop_assert!(raw.contains(&normalized));
    }
}
