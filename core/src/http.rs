//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe the compile request and its response as plain data.
//! `CompilerClient::build_compile` produces an `HttpRequest` and
//! `CompilerClient::parse_compile` consumes an `HttpResponse`; neither touches
//! the network. `CompilerClient::compile` glues the two together through a
//! `Transport`, and hosts that already own an HTTP stack (the C wrapper, for
//! one) can execute the request themselves.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

/// Content type of every compile request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A form-encoded POST request described as plain data.
///
/// The service only accepts POST, so the method is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after the full body has been read, then
/// passed to `CompilerClient::parse_compile`. The body is kept as raw bytes;
/// whether it is text at all is for the decoder to judge.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
