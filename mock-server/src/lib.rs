//! In-process stand-in for the Closure Compiler web service.
//!
//! Accepts the same form-encoded `POST /compile` request and answers with the
//! same JSON document shape. "Compiling" means stripping `//` comments and
//! collapsing whitespace; unbalanced brackets are reported as a parse error
//! and `debugger` statements as a warning. Request problems are reported in
//! `serverErrors` with a 200 status, as the real service does.

use axum::{http::header, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const LANGUAGES: [&str; 3] = ["ECMASCRIPT3", "ECMASCRIPT5", "ECMASCRIPT5_STRICT"];
pub const COMPILATION_LEVELS: [&str; 3] =
    ["WHITESPACE_ONLY", "SIMPLE_OPTIMIZATIONS", "ADVANCED_OPTIMIZATIONS"];

/// Body served by `POST /binary`: JSON-looking, but not UTF-8.
pub const BINARY_BODY: [u8; 4] = [0xff, 0xfe, b'{', b'}'];

/// Length of the compiled code served by `POST /oversized`, past the 10 MiB
/// that common HTTP clients buffer by default.
pub const OVERSIZED_CODE_LEN: usize = 11 * 1024 * 1024;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    pub charno: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub lineno: i64,
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub line: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerError {
    pub code: i64,
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub original_size: usize,
    pub compressed_size: usize,
    pub compile_time: u64,
}

/// Response document. Sections the request did not ask for are omitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiled_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Diagnostic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<Diagnostic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_errors: Option<ServerError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

/// Form fields of a compile request. `output_info` may repeat.
#[derive(Debug, Default)]
pub struct CompileForm {
    pub js_code: Option<String>,
    pub output_format: Option<String>,
    pub output_info: Vec<String>,
    pub language: Option<String>,
    pub compilation_level: Option<String>,
}

impl CompileForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut form = CompileForm::default();
        for (key, value) in form_urlencoded::parse(body) {
            let value = value.into_owned();
            match key.as_ref() {
                "js_code" => form.js_code = Some(value),
                "output_format" => form.output_format = Some(value),
                "output_info" => form.output_info.push(value),
                "language" => form.language = Some(value),
                "compilation_level" => form.compilation_level = Some(value),
                _ => {}
            }
        }
        form
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/compile", post(compile))
        .route("/garbage", post(garbage))
        .route("/binary", post(binary))
        .route("/oversized", post(oversized))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn compile(body: String) -> Json<CompileResponse> {
    let form = CompileForm::parse(body.as_bytes());
    Json(respond(&form))
}

async fn garbage() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], "<html><body>502 Bad Gateway</body></html>")
}

async fn binary() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], BINARY_BODY.to_vec())
}

async fn oversized() -> Json<CompileResponse> {
    Json(CompileResponse {
        compiled_code: Some("a".repeat(OVERSIZED_CODE_LEN)),
        errors: Some(Vec::new()),
        warnings: Some(Vec::new()),
        ..Default::default()
    })
}

/// Build the response document for a parsed form.
pub fn respond(form: &CompileForm) -> CompileResponse {
    if let Some(err) = validate(form) {
        tracing::debug!(code = err.code, error = %err.error, "rejecting compile request");
        return CompileResponse {
            server_errors: Some(err),
            ..Default::default()
        };
    }

    let source = form.js_code.as_deref().unwrap_or_default();
    let (compiled, errors, warnings) = compile_source(source);
    let wants = |section: &str| form.output_info.iter().any(|s| s == section);

    let statistics = Statistics {
        original_size: source.len(),
        compressed_size: compiled.len(),
        compile_time: 0,
    };
    CompileResponse {
        compiled_code: wants("compiled_code").then_some(compiled),
        errors: (wants("errors") && !errors.is_empty()).then_some(errors),
        warnings: (wants("warnings") && !warnings.is_empty()).then_some(warnings),
        server_errors: None,
        statistics: wants("statistics").then_some(statistics),
    }
}

fn validate(form: &CompileForm) -> Option<ServerError> {
    if form.output_format.as_deref().is_some_and(|f| f != "json") {
        return Some(ServerError {
            code: 400,
            error: "Unknown output mode.".to_string(),
        });
    }
    if form.js_code.is_none() {
        return Some(ServerError {
            code: 400,
            error: "No js_code provided.".to_string(),
        });
    }
    if form.output_info.is_empty() {
        return Some(ServerError {
            code: 400,
            error: "No output information to produce.".to_string(),
        });
    }
    if let Some(language) = form.language.as_deref() {
        if !LANGUAGES.contains(&language) {
            return Some(ServerError {
                code: 400,
                error: format!("Unknown language: {language}"),
            });
        }
    }
    if let Some(level) = form.compilation_level.as_deref() {
        if !COMPILATION_LEVELS.contains(&level) {
            return Some(ServerError {
                code: 400,
                error: format!("Unknown compilation level: {level}"),
            });
        }
    }
    None
}

fn compile_source(source: &str) -> (String, Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut depth: i64 = 0;

    for (idx, line) in source.lines().enumerate() {
        let code = strip_comment(line);
        for (charno, ch) in code.char_indices() {
            match ch {
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => depth -= 1,
                _ => {}
            }
            if depth < 0 && errors.is_empty() {
                errors.push(Diagnostic {
                    charno: charno as i64,
                    error: Some(format!("Parse error. syntax error: unexpected '{ch}'")),
                    lineno: idx as i64 + 1,
                    file: "Input_0".to_string(),
                    kind: "JSC_PARSE_ERROR".to_string(),
                    line: line.to_string(),
                    ..Default::default()
                });
            }
        }
        if let Some(charno) = code.find("debugger") {
            warnings.push(Diagnostic {
                charno: charno as i64,
                warning: Some("debugger statement".to_string()),
                lineno: idx as i64 + 1,
                file: "Input_0".to_string(),
                kind: "JSC_DEBUGGER_STATEMENT_PRESENT".to_string(),
                line: line.to_string(),
                ..Default::default()
            });
        }
    }

    if depth > 0 && errors.is_empty() {
        let lineno = source.lines().count().max(1) as i64;
        errors.push(Diagnostic {
            charno: 0,
            error: Some("Parse error. missing closing bracket".to_string()),
            lineno,
            file: "Input_0".to_string(),
            kind: "JSC_PARSE_ERROR".to_string(),
            line: source.lines().last().unwrap_or_default().to_string(),
            ..Default::default()
        });
    }

    if !errors.is_empty() {
        return (String::new(), errors, warnings);
    }
    (collapse_whitespace(source), errors, warnings)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Remove comments and every space not needed between two identifier
/// characters.
fn collapse_whitespace(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;
    for line in source.lines() {
        for ch in strip_comment(line).chars() {
            if ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            if pending_space && out.ends_with(is_word) && is_word(ch) {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
        pending_space = true;
    }
    out
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
