//! Cookie records and the client-side cookie jar
//!
//! Cookies are opaque pass-through values sourced from the engine's
//! response view and replayed on later requests; only `name`, `value` and
//! `path` are ever inspected here.

use std::collections::HashMap;
use std::fmt;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name
    pub name: String,

    /// Cookie value
    pub value: String,

    /// Path the cookie is scoped to, when the server sent one
    pub path: Option<String>,

    /// Domain the cookie is scoped to, when the server sent one
    pub domain: Option<String>,

    /// Seconds until the cookie expires, when the server sent a Max-Age
    pub max_age: Option<u64>,
}

impl Cookie {
    /// Make a new cookie with no attributes
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
        }
    }

    /// Set the path attribute
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the domain attribute
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the max-age attribute
    #[must_use]
    pub const fn max_age(mut self, max_age: u64) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

impl fmt::Display for Cookie {
    // The `name=value` form used on a request `Cookie` header
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl From<reqwest::cookie::Cookie<'_>> for Cookie {
    fn from(raw: reqwest::cookie::Cookie<'_>) -> Self {
        Self {
            name: raw.name().to_string(),
            value: raw.value().to_string(),
            path: raw.path().map(str::to_string),
            domain: raw.domain().map(str::to_string),
            max_age: raw.max_age().map(|age| age.as_secs()),
        }
    }
}

/// Client-held mapping of cookie name to the most recent cookie record
///
/// Names are unique; storing a cookie under an existing name replaces it. A
/// response cookie with an empty value and a path of exactly `/` is a
/// deletion instruction rather than a real cookie: storing it removes the
/// same-named entry instead.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: HashMap<String, Cookie>,
}

impl CookieJar {
    /// Make an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one response cookie, applying the deletion-marker rule
    pub fn store(&mut self, cookie: Cookie) {
        if cookie.value.is_empty() && cookie.path.as_deref() == Some("/") {
            self.entries.remove(&cookie.name);
        } else {
            self.entries.insert(cookie.name.clone(), cookie);
        }
    }

    /// Look up a cookie by name
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.entries.get(name)
    }

    /// Drop a cookie by name, returning it if it was held
    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.entries.remove(name)
    }

    /// Number of cookies held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the jar holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the held cookies
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries.values()
    }

    /// Render the jar as a request `Cookie` header value (`a=1; b=2`)
    pub fn header_value(&self) -> String {
        self.entries
            .values()
            .map(Cookie::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
