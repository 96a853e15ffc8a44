//! The revocation record and its serialized form.

use crate::error::{RevocationError, RevocationResult};
use licensekit_types::LicenseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current on-disk format number.
pub const RECORD_FORMAT: u32 = 1;

#[derive(Serialize)]
struct RecordDocumentRef<'a> {
    format: u32,
    revoked: &'a BTreeSet<String>,
}

#[derive(Deserialize)]
struct RecordDocument {
    format: u32,
    revoked: BTreeSet<String>,
}

/// Set of revoked license IDs. Membership only, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationRecord {
    revoked: BTreeSet<String>,
}

impl RevocationRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a stored record.
    ///
    /// Accepts the JSON document form and the legacy newline-delimited
    /// form. Empty input is an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::CorruptRecord`] if the bytes are neither,
    /// including legacy text with a line that is not a valid license ID.
    pub fn decode(bytes: &[u8]) -> RevocationResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RevocationError::CorruptRecord(format!("not UTF-8: {e}")))?;
        let trimmed = text.trim_start();

        if trimmed.starts_with('{') {
            let doc: RecordDocument = serde_json::from_str(trimmed)
                .map_err(|e| RevocationError::CorruptRecord(format!("invalid JSON: {e}")))?;
            if doc.format != RECORD_FORMAT {
                return Err(RevocationError::CorruptRecord(format!(
                    "unsupported record format {}",
                    doc.format
                )));
            }
            return Ok(Self {
                revoked: doc.revoked,
            });
        }

        // Legacy: one ID per line, blank lines ignored. Every line must be a
        // valid ID, so stray text is reported instead of absorbed.
        let mut revoked = BTreeSet::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let id = LicenseId::parse(line).map_err(|e| {
                RevocationError::CorruptRecord(format!("legacy line {}: {e}", number + 1))
            })?;
            revoked.insert(id.into_string());
        }
        Ok(Self { revoked })
    }

    /// Serializes the record as a JSON document with sorted IDs.
    pub fn encode(&self) -> RevocationResult<Vec<u8>> {
        serde_json::to_vec(&RecordDocumentRef {
            format: RECORD_FORMAT,
            revoked: &self.revoked,
        })
        .map_err(|e| RevocationError::CorruptRecord(format!("failed to encode record: {e}")))
    }

    /// Returns true if `id` is revoked.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.revoked.contains(id)
    }

    /// Adds `id`. Returns false if it was already present.
    pub fn insert(&mut self, id: &LicenseId) -> bool {
        if self.revoked.contains(id.as_str()) {
            return false;
        }
        self.revoked.insert(id.as_str().to_string())
    }

    /// Number of revoked IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// Returns true if nothing is revoked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    /// Iterates over revoked IDs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.revoked.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a LicenseId> for RevocationRecord {
    fn from_iter<I: IntoIterator<Item = &'a LicenseId>>(iter: I) -> Self {
        Self {
            revoked: iter.into_iter().map(|id| id.as_str().to_string()).collect(),
        }
    }
}
