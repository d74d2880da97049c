//! Outgoing-response contract implemented by server engines
//!
//! A handler mutates this state while it runs; once the handler returns,
//! the hosting engine reads everything back and serializes it onto the
//! wire. The fields are buffers waiting to be dumped, not the wire
//! representation itself.

use std::collections::HashMap;

use crate::cookie::Cookie;

/// Payload carried by an outgoing response
///
/// Replaced wholesale by [`Response::set_body`]; no merging semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No payload
    #[default]
    Empty,
    /// Textual payload
    Text(String),
    /// Raw byte payload
    Bytes(Vec<u8>),
}

impl Body {
    /// Payload bytes, regardless of variant
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// True when there is no payload
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Mutable state of the response a handler is building
///
/// Storage belongs to the implementing engine; this trait only fixes the
/// operations a handler can rely on. Status codes are taken as given, with
/// no validation.
pub trait Response {
    /// Current payload
    fn body(&self) -> &Body;

    /// Replace the payload wholesale
    fn set_body(&mut self, body: Body);

    /// Current HTTP status code
    fn status(&self) -> u16;

    /// Replace the status code
    fn set_status(&mut self, status: u16);

    /// Current Content-Type
    fn content_type(&self) -> &str;

    /// Replace the Content-Type
    fn set_content_type(&mut self, content_type: &str);

    /// Cookies queued on the response, keyed by name
    fn cookies(&self) -> &HashMap<String, Cookie>;

    /// Mutable view of the queued cookies
    fn cookies_mut(&mut self) -> &mut HashMap<String, Cookie>;

    /// Append a header; repeated names are kept in call order
    fn add_header(&mut self, name: &str, value: &str);

    /// Queue a cookie, overwriting any same-named one
    fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies_mut().insert(cookie.name.clone(), cookie);
    }

    /// Drop a queued cookie by name; an unknown name does nothing
    fn remove_cookie(&mut self, name: &str) {
        self.cookies_mut().remove(name);
    }

    /// Send the client to `url` with a 302 status and a `Location` header
    fn redirect(&mut self, url: &str) {
        self.set_status(302);
        self.add_header("Location", url);
    }
}
