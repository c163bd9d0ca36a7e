//! Request builder and response parser for the compile service.
//!
//! # Design
//! `CompilerClient` holds only its configuration and carries no mutable state
//! between calls, so one value can be shared across threads. The compile
//! operation is split into `build_compile`, which produces an `HttpRequest`,
//! and `parse_compile`, which consumes an `HttpResponse`. `compile` runs the
//! pair through a `Transport` for callers that just want the result.

use tracing::{debug, warn};

use crate::config::{CompilerConfig, ResolvedConfig};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, FORM_CONTENT_TYPE};
use crate::transport::{Transport, UreqTransport};
use crate::types::CompileOutput;

/// Output sections requested from the service, in wire order. All four are
/// always requested.
pub const OUTPUT_INFO: [&str; 4] = ["compiled_code", "statistics", "warnings", "errors"];

/// The only output format this client can decode.
pub const OUTPUT_FORMAT: &str = "json";

/// Synchronous, stateless client for the compile service.
#[derive(Debug, Clone, Default)]
pub struct CompilerClient {
    config: CompilerConfig,
}

impl CompilerClient {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Build the POST request for `source` with defaults applied.
    ///
    /// Empty source is valid and is sent as-is.
    pub fn build_compile(&self, source: &[u8]) -> HttpRequest {
        build_request(&self.config.resolve(), source)
    }

    /// Decode a compile response.
    ///
    /// Any body with the shape of a compile response is a success, whatever
    /// the status code; callers inspect `errors` and `server_errors` on the
    /// result.
    pub fn parse_compile(&self, response: HttpResponse) -> Result<CompileOutput, ApiError> {
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode {
            status: response.status,
            message: e.to_string(),
        })
    }

    /// Compile `source` with one blocking request over the default transport.
    pub fn compile(&self, source: &[u8]) -> Result<CompileOutput, ApiError> {
        self.compile_with(&UreqTransport, source)
    }

    /// Compile `source` with one blocking request over `transport`.
    pub fn compile_with<T: Transport + ?Sized>(
        &self,
        transport: &T,
        source: &[u8],
    ) -> Result<CompileOutput, ApiError> {
        self.compile_with_status(transport, source).map(|(_, output)| output)
    }

    /// Like `compile_with`, also returning the HTTP status of the response
    /// the output was decoded from.
    pub fn compile_with_status<T: Transport + ?Sized>(
        &self,
        transport: &T,
        source: &[u8],
    ) -> Result<(u16, CompileOutput), ApiError> {
        let resolved = self.config.resolve();
        let request = build_request(&resolved, source);
        debug!(
            endpoint = %resolved.endpoint,
            language = %resolved.language,
            compilation_level = %resolved.compilation_level,
            source_len = source.len(),
            "sending compile request"
        );

        let response = transport.execute(&request, resolved.timeout)?;
        let status = response.status;
        let output = self.parse_compile(response)?;

        if let Some(server_error) = &output.server_errors {
            warn!(status, code = server_error.code, error = %server_error.error, "service rejected request");
        } else if let Some(stats) = &output.statistics {
            debug!(
                status,
                errors = output.errors.len(),
                warnings = output.warnings.len(),
                original_size = stats.original_size,
                compressed_size = stats.compressed_size,
                compile_time = stats.compile_time,
                "compile finished"
            );
        }
        Ok((status, output))
    }
}

fn build_request(config: &ResolvedConfig, source: &[u8]) -> HttpRequest {
    // Keys are emitted sorted, output_info values in their fixed order.
    let mut fields: Vec<(&str, &[u8])> = vec![
        ("compilation_level", config.compilation_level.as_bytes()),
        ("js_code", source),
        ("language", config.language.as_bytes()),
        ("output_format", OUTPUT_FORMAT.as_bytes()),
    ];
    fields.extend(OUTPUT_INFO.iter().map(|info| ("output_info", info.as_bytes())));

    HttpRequest {
        url: config.endpoint.clone(),
        headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
        body: encode_form(&fields),
    }
}

/// `application/x-www-form-urlencoded` encoding of raw byte values.
fn encode_form(fields: &[(&str, &[u8])]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            let key: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
            let value: String = form_urlencoded::byte_serialize(value).collect();
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join("&")
}
