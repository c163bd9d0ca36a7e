//! Response DTOs for the compile service.
//!
//! # Design
//! Field names follow the service's JSON (camelCase at the top level, short
//! lowercase keys inside diagnostics). Keys the service omits when empty
//! (`errors`, `warnings`, `statistics`, and `compiledCode` after a server
//! error) default instead of failing the decode, so only a body of the wrong
//! shape is a `DecodeError`.

use serde::{Deserialize, Deserializer, Serialize};

/// A fatal diagnostic about the submitted source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputError {
    pub charno: i64,
    pub error: String,
    pub lineno: i64,
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// The offending source line, when the service can quote it.
    pub line: Option<String>,
}

impl OutputError {
    /// Render as a coloured terminal line: `[line, col] error: message`
    /// followed by the quoted source line.
    pub fn as_log_line(&self) -> String {
        log_line("\x1b[31m", "error", self.lineno, self.charno, &self.error, self.line.as_deref())
    }
}

/// A non-fatal diagnostic about the submitted source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputWarning {
    pub charno: i64,
    pub warning: String,
    pub lineno: i64,
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub line: Option<String>,
}

impl OutputWarning {
    pub fn as_log_line(&self) -> String {
        log_line("\x1b[33m", "warning", self.lineno, self.charno, &self.warning, self.line.as_deref())
    }
}

fn log_line(color: &str, label: &str, lineno: i64, charno: i64, message: &str, line: Option<&str>) -> String {
    format!(
        "\x1b[36;1m[{lineno}, {charno}]{color} {label}: \x1b[0m{message}\n\t{}\n",
        line.unwrap_or_default()
    )
}

/// Failure of the service itself, e.g. a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerError {
    pub code: i64,
    pub error: String,
}

/// Size and timing figures, reported only for a successful compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    pub original_size: u64,
    pub compressed_size: u64,
    pub compile_time: u64,
}

/// Decoded body of a compile response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOutput {
    pub compiled_code: String,
    pub errors: Vec<OutputError>,
    pub warnings: Vec<OutputWarning>,
    #[serde(deserialize_with = "single_or_first")]
    pub server_errors: Option<ServerError>,
    pub statistics: Option<Statistics>,
}

/// The live service sends `serverErrors` as a list; accept a lone object too.
fn single_or_first<'de, D>(deserializer: D) -> Result<Option<ServerError>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(ServerError),
        Many(Vec<ServerError>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(err)) => Some(err),
        Some(OneOrMany::Many(list)) => list.into_iter().next(),
        None => None,
    })
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when the service compiled the source: no server error and no
    /// error diagnostics. Warnings do not count.
    pub fn is_success(&self) -> bool {
        self.server_errors.is_none() && self.errors.is_empty()
    }
}
