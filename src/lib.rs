#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

//! # Gantry Web
//!
//! Client and response primitives for the Gantry web framework.
//!
//! ## Architecture
//!
//! This library is organized into several key modules:
//!
//! - **[`error`]** - Error types and error handling
//! - **[`method`]** - HTTP verb enumeration
//! - **[`cookie`]** - Cookie records and the client cookie jar
//! - **[`client`]** - Synchronous HTTP client over the wrapped async engine
//! - **[`response`]** - Outgoing-response contract implemented by server engines

pub mod client;
pub mod cookie;
pub mod error;
pub mod method;
pub mod response;

pub use client::{BodyPart, Client, ClientResponse};
pub use cookie::{Cookie, CookieJar};
pub use error::{ClientError, Result};
pub use method::Method;
pub use response::{Body, Response};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "gantry-web";
