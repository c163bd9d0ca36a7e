//! Synchronous client for the Closure Compiler web service.
//!
//! # Overview
//! Sends JavaScript source to a remote compile endpoint as a form-encoded
//! POST and decodes the JSON answer into compiled code, diagnostics, and
//! statistics. Nothing is compiled locally.
//!
//! # Design
//! - `CompilerClient` is stateless; it holds only a `CompilerConfig`.
//! - The call is split into `build_compile` (produces request) and
//!   `parse_compile` (consumes response), so the I/O boundary is explicit.
//!   `compile` runs both through a blocking `Transport`.
//! - Failures of the call are `ApiError`; diagnostics and server errors are
//!   data on `CompileOutput`.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::CompilerClient;
pub use config::{CompilerConfig, ResolvedConfig};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{CompileOutput, OutputError, OutputWarning, ServerError, Statistics};
