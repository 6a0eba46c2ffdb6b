//! Cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deterministic signature of an operation and its parameters.
///
/// Parameters are sorted and deduplicated, so `stops` for `[Red, Blue]` and
/// `[Blue, Red, Red]` share one entry.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for `operation` over `params`.
    pub fn new<S: AsRef<str>>(operation: &str, params: &[S]) -> Self {
        let mut params: Vec<&str> = params.iter().map(|p| p.as_ref().trim()).collect();
        params.retain(|p| !p.is_empty());
        params.sort_unstable();
        params.dedup();

        if params.is_empty() {
            Self(operation.to_string())
        } else {
            Self(format!("{}:{}", operation, params.join(",")))
        }
    }

    /// Key for a parameterless operation.
    pub fn operation(operation: &str) -> Self {
        Self::new::<&str>(operation, &[])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A file name that maps back to exactly one key.
    ///
    /// ASCII alphanumerics and `-` pass through; every other byte becomes
    /// `_xx` (lowercase hex).
    pub fn file_name(&self) -> String {
        let mut name = String::with_capacity(self.0.len() + 5);
        for b in self.0.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' {
                name.push(b as char);
            } else {
                name.push_str(&format!("_{b:02x}"));
            }
        }
        name.push_str(".json");
        name
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
