//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{CacheOptions, RequestOptions};

/// Upper bound on the length of a pattern accepted over HTTP
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Request body for POST /invalidate/tags and
/// POST /namespace/:name/invalidate/tags
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateTagsRequest {
    /// Entries carrying any of these tags are removed
    pub tags: Vec<String>,
}

impl InvalidateTagsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tags.iter().any(|t| t.is_empty()) {
            return Some("Tags cannot be empty strings".to_string());
        }
        None
    }
}

/// Request body for POST /invalidate/pattern
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    /// Regular expression matched against entry URLs
    pub pattern: String,
}

impl InvalidatePatternRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_PATTERN_LENGTH {
            return Some(format!(
                "Pattern exceeds maximum length of {} characters",
                MAX_PATTERN_LENGTH
            ));
        }
        None
    }
}

/// Request body for POST /fetch
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Upstream URL
    pub url: String,
    #[serde(default)]
    pub options: RequestOptions,
    #[serde(default)]
    pub cache: CacheOptions,
}

impl FetchRequest {
    pub fn validate(&self) -> Option<String> {
        if self.url.is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /entries/delete
///
/// Names the entry by the request that produced it.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEntryRequest {
    pub url: String,
    #[serde(default)]
    pub options: RequestOptions,
}

impl DeleteEntryRequest {
    pub fn validate(&self) -> Option<String> {
        if self.url.is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_request_defaults() {
        let json = r#"{"url": "https://api.example.com/planets"}"#;
        let req: FetchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.url, "https://api.example.com/planets");
        assert_eq!(req.options.method(), "GET");
        assert!(req.cache.enabled);
        assert!(req.cache.tags.is_empty());
    }

    #[test]
    fn test_fetch_request_full() {
        let json = r#"{
            "url": "/search",
            "options": {"method": "POST", "body": {"q": "mars"}},
            "cache": {"ttlMs": 1000, "tags": ["planet"], "namespace": "astro", "enabled": false}
        }"#;
        let req: FetchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.options.method(), "POST");
        assert_eq!(req.options.body, Some(json!({"q": "mars"})));
        assert_eq!(req.cache.ttl_ms, Some(1000));
        assert_eq!(req.cache.namespace_or_default(), "astro");
        assert!(!req.cache.enabled);
    }

    #[test]
    fn test_validate_empty_url() {
        let req: FetchRequest = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(req.validate().is_some());

        let req: DeleteEntryRequest = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_pattern() {
        let empty = InvalidatePatternRequest {
            pattern: String::new(),
        };
        assert!(empty.validate().is_some());

        let long = InvalidatePatternRequest {
            pattern: "a".repeat(MAX_PATTERN_LENGTH + 1),
        };
        assert!(long.validate().is_some());

        let ok = InvalidatePatternRequest {
            pattern: "^/planets/".to_string(),
        };
        assert!(ok.validate().is_none());
    }

    #[test]
    fn test_validate_tags() {
        let req = InvalidateTagsRequest {
            tags: vec!["planet".to_string(), "".to_string()],
        };
        assert!(req.validate().is_some());

        let req = InvalidateTagsRequest { tags: vec![] };
        assert!(req.validate().is_none());
    }
}
