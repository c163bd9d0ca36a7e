//! Client configuration and default resolution.
//!
//! `CompilerConfig` is what callers construct or deserialize; every field is
//! optional. `CompilerConfig::resolve` runs once per call and yields a
//! `ResolvedConfig` with every default substituted, so the request builder
//! never has to reason about missing values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Endpoint of the public Closure Compiler web service.
pub const DEFAULT_ENDPOINT: &str = "http://closure-compiler.appspot.com/compile";

/// Dialects accepted by the service in the `language` field.
pub mod language {
    pub const ECMASCRIPT3: &str = "ECMASCRIPT3";
    pub const ECMASCRIPT5: &str = "ECMASCRIPT5";
    pub const ECMASCRIPT5_STRICT: &str = "ECMASCRIPT5_STRICT";

    pub const DEFAULT: &str = ECMASCRIPT5_STRICT;
}

/// Optimization levels accepted by the service in the `compilation_level` field.
pub mod compilation_level {
    pub const WHITESPACE_ONLY: &str = "WHITESPACE_ONLY";
    pub const SIMPLE_OPTIMIZATIONS: &str = "SIMPLE_OPTIMIZATIONS";
    pub const ADVANCED_OPTIMIZATIONS: &str = "ADVANCED_OPTIMIZATIONS";

    /// Whitespace removal only. Callers wanting minification must ask for
    /// a stronger level explicitly.
    pub const DEFAULT: &str = WHITESPACE_ONLY;
}

/// Caller-facing configuration. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Service URL. Defaults to [`DEFAULT_ENDPOINT`].
    pub endpoint: Option<String>,

    /// One of `ECMASCRIPT3`, `ECMASCRIPT5`, `ECMASCRIPT5_STRICT`.
    /// Defaults to `ECMASCRIPT5_STRICT`.
    pub language: Option<String>,

    /// One of `WHITESPACE_ONLY`, `SIMPLE_OPTIMIZATIONS`,
    /// `ADVANCED_OPTIMIZATIONS`. Defaults to `WHITESPACE_ONLY`.
    pub compilation_level: Option<String>,

    /// Upper bound on the whole exchange, in milliseconds. `None` waits
    /// for as long as the transport does.
    pub timeout_ms: Option<u64>,
}

impl CompilerConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_compilation_level(mut self, level: impl Into<String>) -> Self {
        self.compilation_level = Some(level.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Substitute defaults for every unset or empty option.
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            endpoint: non_empty_or(&self.endpoint, DEFAULT_ENDPOINT),
            language: non_empty_or(&self.language, language::DEFAULT),
            compilation_level: non_empty_or(&self.compilation_level, compilation_level::DEFAULT),
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Fully-populated configuration for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub language: String,
    pub compilation_level: String,
    pub timeout: Option<Duration>,
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
