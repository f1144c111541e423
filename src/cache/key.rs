//! Cache key derivation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::options::RequestOptions;

/// Method assumed when a request does not name one
pub const DEFAULT_METHOD: &str = "GET";

/// Joins method, URL and body. Cannot appear unescaped in a URL or a method.
pub const KEY_SEPARATOR: char = ' ';

// == Cache Key ==
/// Opaque key identifying one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-derived key, e.g. one read back from a snapshot.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the key for `(method, url, body)`.
///
/// Pure function of its inputs. The body is serialized as compact JSON; a
/// `null` body counts as no body, while `false`, `0` and `""` are bodies of
/// their own. Header case and query order are not normalized.
pub fn build_key(method: Option<&str>, url: &str, body: Option<&Value>) -> CacheKey {
    let method = method.filter(|m| !m.is_empty()).unwrap_or(DEFAULT_METHOD);
    let body = body
        .filter(|b| !b.is_null())
        .map(Value::to_string)
        .unwrap_or_default();

    CacheKey(format!("{method}{KEY_SEPARATOR}{url}{KEY_SEPARATOR}{body}"))
}

/// Key for `url` requested with `options`.
pub fn key_for(url: &str, options: &RequestOptions) -> CacheKey {
    build_key(options.method.as_deref(), url, options.body.as_ref())
}
