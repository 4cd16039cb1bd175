use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SchemaError;

/// Length of a hex-encoded SHA-1 digest.
pub const HASH_LEN: usize = 40;

/// Prefix of every key used against a blob store.
pub const BLOB_KEY_PREFIX: &str = "/blob/";

/// Manifest value for a file that is tracked but not hashed yet.
pub const UNHASHED_SENTINEL: &str = "<to be hashed>";

/// Returns true if `s` looks like a blob hash: exactly 40 lowercase hex characters.
pub fn is_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A validated blob hash (hex SHA-1, 40 lowercase characters).
///
/// Blobs are addressed by this value. Equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BlobHash(String);

impl BlobHash {
    /// Create a new `BlobHash`, validating the input.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidHash`] unless `s` is exactly 40 lowercase hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, SchemaError> {
        let s = s.into();
        if is_hash(&s) {
            Ok(Self(s))
        } else {
            Err(SchemaError::InvalidHash(s))
        }
    }

    /// Build a hash from a raw 20-byte SHA-1 digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// The storage key for this blob.
    pub fn key(&self) -> BlobKey {
        BlobKey::from(self)
    }

    /// Abbreviated form for messages (first seven characters).
    pub fn short(&self) -> &str {
        &self.0[..7]
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for BlobHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for BlobHash {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for BlobHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BlobHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Storage key of a blob: `/blob/<hash>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Return the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hash component of the key.
    pub fn hash(&self) -> Option<BlobHash> {
        self.0
            .strip_prefix(BLOB_KEY_PREFIX)
            .and_then(|h| BlobHash::new(h).ok())
    }
}

impl From<&BlobHash> for BlobKey {
    fn from(hash: &BlobHash) -> Self {
        Self(format!("{BLOB_KEY_PREFIX}{hash}"))
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Value stored against a path in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ManifestEntry {
    /// Tracked, waiting to be hashed.
    #[default]
    Unhashed,
    /// Hashed; the blob is addressed by this hash.
    Hashed(BlobHash),
}

impl ManifestEntry {
    /// The hash, if this entry has one.
    pub fn hash(&self) -> Option<&BlobHash> {
        match self {
            Self::Hashed(h) => Some(h),
            Self::Unhashed => None,
        }
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Hashed(h) => h.as_str(),
            Self::Unhashed => UNHASHED_SENTINEL,
        }
    }
}

impl Serialize for ManifestEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Anything that is not a valid hash reads back as unhashed. Older manifests
// used the single letter `h` as the sentinel.
impl<'de> Deserialize<'de> for ManifestEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(BlobHash::new(s).map_or(Self::Unhashed, Self::Hashed))
    }
}

impl std::fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn recognizes_hashes() {
        assert!(is_hash(EMPTY_SHA1));
        assert!(!is_hash(&EMPTY_SHA1.to_uppercase()));
        assert!(!is_hash(&EMPTY_SHA1[..39]));
        assert!(!is_hash(UNHASHED_SENTINEL));
        assert!(!is_hash("zz39a3ee5e6b4b0d3255bfef95601890afd80709"));
    }

    #[test]
    fn blob_key_has_fixed_prefix() {
        let hash = BlobHash::new(EMPTY_SHA1).unwrap();
        assert_eq!(
            hash.key().as_str(),
            "/blob/da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(hash.key().hash(), Some(hash));
    }

    #[test]
    fn rejects_invalid_hash() {
        assert!(matches!(
            BlobHash::new("not-a-hash"),
            Err(SchemaError::InvalidHash(_))
        ));
    }

    #[test]
    fn from_digest_is_lowercase_hex() {
        let hash = BlobHash::from_digest(&[0xab; 20]);
        assert_eq!(hash.as_str(), "ab".repeat(20));
        assert!(is_hash(hash.as_str()));
    }

    #[test]
    fn entry_reads_legacy_sentinel_as_unhashed() {
        let entry: ManifestEntry = serde_yaml::from_str("h").unwrap();
        assert_eq!(entry, ManifestEntry::Unhashed);

        let entry: ManifestEntry = serde_yaml::from_str(EMPTY_SHA1).unwrap();
        assert_eq!(entry.hash().map(BlobHash::as_str), Some(EMPTY_SHA1));
    }

    #[test]
    fn entry_writes_sentinel() {
        let out = serde_yaml::to_string(&ManifestEntry::Unhashed).unwrap();
        assert_eq!(serde_yaml::from_str::<String>(&out).unwrap(), UNHASHED_SENTINEL);
    }
}
