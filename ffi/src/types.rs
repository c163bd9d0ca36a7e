//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`,
//! nullable pointers instead of `Option`. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use compilerapi_core::{ApiError, CompileOutput, OutputError, OutputWarning};

/// Opaque handle to a `CompilerClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCompilerClient {
    pub(crate) inner: compilerapi_core::CompilerClient,
}

/// Convert to a C string, dropping interior NULs the service might echo back.
pub(crate) fn to_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

/// Free a pointer produced by `to_c_string`. Null is ignored.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Hand a `Vec` to C as pointer + length. Empty vectors become null.
fn into_raw_parts<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let boxed = items.into_boxed_slice();
    (Box::into_raw(boxed) as *mut T, len)
}

/// Reclaim a pointer + length produced by `into_raw_parts`.
unsafe fn from_raw_parts<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A form-encoded POST request described as C-compatible plain data.
///
/// Built by `compiler_build_compile`. The C caller executes the request
/// and passes the response back through `compiler_parse_compile`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: compilerapi_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_parts(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            url: to_c_string(req.url),
            headers,
            headers_len,
            body: to_c_string(req.body),
        }))
    }

    /// Release everything owned by a request built with `from_core`.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            free_c_string(req.body);
            for h in from_raw_parts(req.headers, req.headers_len) {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing the request,
/// then passes a pointer to `compiler_parse_compile`. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiCompileResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Decode = 2,
    Panic = 3,
    NullArg = 4,
}

/// An error or warning about the submitted source. `line` may be null.
#[repr(C)]
pub struct FfiDiagnostic {
    pub charno: i64,
    pub lineno: i64,
    pub message: *mut c_char,
    pub file: *mut c_char,
    pub kind: *mut c_char,
    pub line: *mut c_char,
}

impl FfiDiagnostic {
    fn from_error(e: OutputError) -> Self {
        Self::new(e.charno, e.lineno, e.error, e.file, e.kind, e.line)
    }

    fn from_warning(w: OutputWarning) -> Self {
        Self::new(w.charno, w.lineno, w.warning, w.file, w.kind, w.line)
    }

    fn new(charno: i64, lineno: i64, message: String, file: String, kind: String, line: Option<String>) -> Self {
        FfiDiagnostic {
            charno,
            lineno,
            message: to_c_string(message),
            file: to_c_string(file),
            kind: to_c_string(kind),
            line: line.map_or(std::ptr::null_mut(), to_c_string),
        }
    }

    unsafe fn free_fields(&self) {
        unsafe {
            free_c_string(self.message);
            free_c_string(self.file);
            free_c_string(self.kind);
            free_c_string(self.line);
        }
    }
}

/// Failure reported by the service itself.
#[repr(C)]
pub struct FfiServerError {
    pub code: i64,
    pub error: *mut c_char,
}

/// Size and timing figures. Only meaningful when
/// `FfiCompileOutput::has_statistics` is true.
#[repr(C)]
#[derive(Default)]
pub struct FfiStatistics {
    pub original_size: u64,
    pub compressed_size: u64,
    pub compile_time: u64,
}

/// A decoded compile response exposed to C.
#[repr(C)]
pub struct FfiCompileOutput {
    pub compiled_code: *mut c_char,
    pub errors: *mut FfiDiagnostic,
    pub errors_len: u32,
    pub warnings: *mut FfiDiagnostic,
    pub warnings_len: u32,
    /// Null unless the service rejected the request.
    pub server_error: *mut FfiServerError,
    pub has_statistics: bool,
    pub statistics: FfiStatistics,
}

impl FfiCompileOutput {
    fn from_core(output: CompileOutput) -> Self {
        let (errors, errors_len) =
            into_raw_parts(output.errors.into_iter().map(FfiDiagnostic::from_error).collect());
        let (warnings, warnings_len) =
            into_raw_parts(output.warnings.into_iter().map(FfiDiagnostic::from_warning).collect());
        let server_error = match output.server_errors {
            Some(e) => Box::into_raw(Box::new(FfiServerError {
                code: e.code,
                error: to_c_string(e.error),
            })),
            None => std::ptr::null_mut(),
        };
        let statistics = output
            .statistics
            .map(|s| FfiStatistics {
                original_size: s.original_size,
                compressed_size: s.compressed_size,
                compile_time: s.compile_time,
            })
            .unwrap_or_default();

        FfiCompileOutput {
            compiled_code: to_c_string(output.compiled_code),
            errors,
            errors_len,
            warnings,
            warnings_len,
            server_error,
            has_statistics: output.statistics.is_some(),
            statistics,
        }
    }

    unsafe fn free(output: *mut Self) {
        let output = unsafe { Box::from_raw(output) };
        unsafe {
            free_c_string(output.compiled_code);
            for d in from_raw_parts(output.errors, output.errors_len) {
                d.free_fields();
            }
            for d in from_raw_parts(output.warnings, output.warnings_len) {
                d.free_fields();
            }
            if !output.server_error.is_null() {
                let server_error = Box::from_raw(output.server_error);
                free_c_string(server_error.error);
            }
        }
    }
}

/// Result envelope for parse and compile operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `output`
/// points to the decoded response. On failure `error_code` describes the
/// category, `error_message` is a human-readable C string, and `output` is
/// null. `http_status` carries the status of the response that was decoded
/// (or failed to decode); it is zero for transport failures, null arguments,
/// and panics.
#[repr(C)]
pub struct FfiCompileResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub output: *mut FfiCompileOutput,
}

impl FfiCompileResult {
    /// Build a success result carrying the decoded output.
    pub(crate) fn ok(output: CompileOutput, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiCompileResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
            output: Box::into_raw(Box::new(FfiCompileOutput::from_core(output))),
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Decode { status, .. } => (FfiErrorCode::Decode, *status),
        };
        Self::failure(error_code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string())
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiCompileResult {
            error_code,
            error_message: to_c_string(msg),
            http_status,
            output: std::ptr::null_mut(),
        }))
    }

    /// Release a result and everything it owns.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            free_c_string(result.error_message);
            if !result.output.is_null() {
                FfiCompileOutput::free(result.output);
            }
        }
    }
}
