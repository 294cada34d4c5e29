//! Definition hashing for plan fingerprints.
//!
//! A plan shows the fingerprint of the records it was computed from so two
//! reviews of the same definitions can be recognized at a glance.

use sha2::{Digest, Sha256};

use crate::resource::Record;

/// Hasher for computing definition fingerprints.
#[derive(Debug, Default)]
pub struct DefinitionHasher;

impl DefinitionHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash over all records, in definition order.
    #[must_use]
    pub fn hash_records(&self, records: &[Record]) -> String {
        let mut hasher = Sha256::new();
        for record in records {
            hasher.update(self.hash_record(record).as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single record.
    #[must_use]
    pub fn hash_record(&self, record: &Record) -> String {
        let mut hasher = Sha256::new();
        hasher.update(record.kind().api_resource().as_bytes());
        hasher.update(b"\0");
        hasher.update(record.tracking_id().as_bytes());
        hasher.update(b"\0");
        // Attribute order is part of the definition, serialization keeps it.
        hasher.update(serde_json::Value::Object(record.attributes().clone()).to_string());
        hex::encode(hasher.finalize())
    }

    /// Returns a short version of a hash (first 8 characters).
    #[must_use]
    pub fn short_hash<'a>(&self, hash: &'a str) -> &'a str {
        &hash[..8.min(hash.len())]
    }
}
