use serde::{Serialize, Serializer};
use std::fmt;

/// A 32-byte Blake3 hash over a record's serialized content.
///
/// Digests serialize as lowercase hex strings, the same form `Display` produces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Digest {
    /// Computes the digest of the given data.
    pub fn from_data(data: &[u8]) -> Self {
        Digest(*blake3::hash(data).as_bytes())
    }

    /// Computes the digest of a value's compact JSON form.
    ///
    /// When `suffix` is given it is appended as `_<suffix>` before hashing,
    /// which is how per-locale nodes of one entry get distinct digests.
    pub fn of_json<T>(value: &T, suffix: Option<&str>) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, value)?;
        if let Some(suffix) = suffix {
            hasher.update(b"_");
            hasher.update(suffix.as_bytes());
        }
        Ok(Digest(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
