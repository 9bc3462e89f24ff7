use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Serialize, Deserialize)]
pub struct HeaderItem {
    pub key: String,
    pub value: String,
}

impl fmt::Debug for HeaderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_lower = self.key.to_lowercase();
        let value = if key_lower.contains("auth")
            || key_lower.contains("cookie")
            || key_lower.contains("secret")
            || key_lower.contains("token")
        {
            "***REDACTED***"
        } else {
            &self.value
        };

        f.debug_struct("HeaderItem")
            .field("key", &self.key)
            .field("value", &value)
            .finish()
    }
}

/// Ordered header set with case-insensitive keys.
#[derive(Clone, Serialize, Deserialize)]
pub struct Headers {
    pub headers: Vec<HeaderItem>,
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Headers")
            .field("headers", &self.headers)
            .finish()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl Headers {
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Inserts or overwrites a header, keyed case-insensitively.
    pub fn add(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        if let Some(v) = self
            .headers
            .iter_mut()
            .find(|h| h.key.eq_ignore_ascii_case(key.as_ref()))
        {
            v.value = value.as_ref().into();
        } else {
            self.headers.push(HeaderItem {
                key: key.as_ref().into(),
                value: value.as_ref().into(),
            })
        }
    }

    /// Fills in entries from `defaults` without touching existing keys.
    pub fn merge_under(&mut self, defaults: &Headers) {
        for item in &defaults.headers {
            if !self.contains(&item.key) {
                self.headers.push(item.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.headers
            .iter()
            .any(|h| h.key.eq_ignore_ascii_case(key.as_ref()))
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<String> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(key.as_ref()))
            .map(|h| h.value.clone())
    }
}

impl From<Headers> for Vec<(String, String)> {
    fn from(value: Headers) -> Self {
        value
            .headers
            .into_iter()
            .map(|h| (h.key, h.value))
            .collect()
    }
}

impl From<&Headers> for HeaderMap {
    fn from(value: &Headers) -> Self {
        let mut header_map = HeaderMap::new();

        for item in &value.headers {
            match (
                item.key.parse::<reqwest::header::HeaderName>(),
                HeaderValue::from_str(&item.value),
            ) {
                (Ok(name), Ok(value)) => {
                    // Multi-valued headers are appended, the rest overwritten.
                    if matches!(name.as_str(), "set-cookie" | "cookie" | "accept") {
                        header_map.append(name, value);
                    } else {
                        header_map.insert(name, value);
                    }
                }
                _ => continue,
            }
        }

        header_map
    }
}

impl From<&HeaderMap> for Headers {
    fn from(value: &HeaderMap) -> Self {
        let headers = value
            .iter()
            .map(|(key, value)| HeaderItem {
                key: key.as_str().to_string(),
                value: value.to_str().unwrap_or("").to_string(),
            })
            .collect();

        Headers { headers }
    }
}
