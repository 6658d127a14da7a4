//! Page identity used as the fragment cache key.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Identifier of a requested page (normally the request URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a page identifier from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a page identifier from a request URL using the given policy.
    ///
    /// An empty URL always maps to `/`.
    pub fn from_url(url: &str, policy: KeyPolicy) -> Self {
        let key = match policy {
            KeyPolicy::Raw => url,
            KeyPolicy::PathOnly => strip_query_and_fragment(url),
        };

        if key.is_empty() {
            Self("/".to_string())
        } else {
            Self(key.to_string())
        }
    }

    /// Get the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How a request URL is turned into a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Use the URL verbatim.
    #[default]
    Raw,
    /// Drop the query string and fragment.
    PathOnly,
}

fn strip_query_and_fragment(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
