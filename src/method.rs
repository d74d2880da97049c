//! HTTP verb enumeration
//!
//! The closed set of methods the client can issue. Conversion into the
//! engine's method type happens at the request-builder boundary.

use std::fmt;

/// Methods for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET request
    Get,
    /// HEAD request
    Head,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// TRACE request
    Trace,
    /// OPTIONS request
    Options,
    /// PATCH request
    Patch,
}

impl Method {
    /// Every method the client can issue
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Trace,
        Self::Options,
        Self::Patch,
    ];

    /// Uppercase wire name of the method
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Head => Self::HEAD,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Trace => Self::TRACE,
            Method::Options => Self::OPTIONS,
            Method::Patch => Self::PATCH,
        }
    }
}
