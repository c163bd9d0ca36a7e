//! C-ABI wrapper around `compilerapi-core`.
//!
//! # Overview
//! Exposes the compile client through `extern "C"` functions so any language
//! with a C FFI can either let this library perform the blocking call
//! (`compiler_compile`) or build the request and parse the response around
//! its own HTTP stack (`compiler_build_compile` / `compiler_parse_compile`).
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiCompileResult` envelope conveys decoded output and errors
//!   uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `compiler_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use compilerapi_core::{CompilerClient, CompilerConfig, HttpResponse, UreqTransport};

use types::*;

/// Read an optional C string. Null and invalid UTF-8 both mean "unset".
fn opt_string(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok().map(str::to_string)
}

/// View `len` bytes at `source`. Null is accepted for an empty source.
fn source_bytes<'a>(source: *const u8, len: usize) -> Option<&'a [u8]> {
    if source.is_null() {
        return (len == 0).then_some(&[][..]);
    }
    Some(unsafe { std::slice::from_raw_parts(source, len) })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client. Any argument may be null to use its default:
/// the public endpoint, `ECMASCRIPT5_STRICT`, and `WHITESPACE_ONLY`.
///
/// Returns null only if an internal panic occurs.
/// The caller must free the returned pointer with `compiler_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_client_new(
    endpoint: *const c_char,
    language: *const c_char,
    compilation_level: *const c_char,
) -> *mut FfiCompilerClient {
    catch_unwind(|| {
        let config = CompilerConfig {
            endpoint: opt_string(endpoint),
            language: opt_string(language),
            compilation_level: opt_string(compilation_level),
            timeout_ms: None,
        };
        Box::into_raw(Box::new(FfiCompilerClient {
            inner: CompilerClient::new(config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Bound every subsequent `compiler_compile` call on `client` to
/// `timeout_ms` milliseconds. Zero removes the bound.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_client_set_timeout(client: *mut FfiCompilerClient, timeout_ms: u64) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let client = unsafe { &mut *client };
        let mut config = client.inner.config().clone();
        config.timeout_ms = (timeout_ms > 0).then_some(timeout_ms);
        client.inner = CompilerClient::new(config);
    });
}

/// Free a client created by `compiler_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_client_free(client: *mut FfiCompilerClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Build the compile request for `len` bytes at `source`.
///
/// Returns null if `client` is null, or if `source` is null with a non-zero
/// `len`. The caller must free the returned pointer with
/// `compiler_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_build_compile(
    client: *const FfiCompilerClient,
    source: *const u8,
    len: usize,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match source_bytes(source, len) {
            Some(bytes) => FfiHttpRequest::from_core(client.inner.build_compile(bytes)),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// read as empty. Bytes are passed through untouched so that invalid UTF-8
/// is reported by the decoder.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        Vec::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_bytes().to_vec()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Decode the response to a compile request.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_parse_compile(
    client: *const FfiCompilerClient,
    response: *const FfiHttpResponse,
) -> *mut FfiCompileResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCompileResult::null_arg("client");
        }
        if response.is_null() {
            return FfiCompileResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let core_resp = ffi_response_to_core(unsafe { &*response });
        let status = core_resp.status;
        match client.inner.parse_compile(core_resp) {
            Ok(output) => FfiCompileResult::ok(output, status),
            Err(e) => FfiCompileResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCompileResult::panic("panic in compiler_parse_compile"))
}

/// Compile `len` bytes at `source` with one blocking request.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_compile(
    client: *const FfiCompilerClient,
    source: *const u8,
    len: usize,
) -> *mut FfiCompileResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCompileResult::null_arg("client");
        }
        let Some(bytes) = source_bytes(source, len) else {
            return FfiCompileResult::null_arg("source");
        };
        let client = unsafe { &*client };
        match client.inner.compile_with_status(&UreqTransport, bytes) {
            Ok((status, output)) => FfiCompileResult::ok(output, status),
            Err(e) => FfiCompileResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCompileResult::panic("panic in compiler_compile"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `compiler_build_compile`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiCompileResult` returned by `compiler_parse_compile` or
/// `compiler_compile`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_free_result(result: *mut FfiCompileResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiCompileResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn compiler_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_client(endpoint: &str) -> *mut FfiCompilerClient {
        let url = CString::new(endpoint).unwrap();
        compiler_client_new(url.as_ptr(), std::ptr::null(), std::ptr::null())
    }

    fn c_str<'a>(ptr: *const c_char) -> &'a str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn form_fields(req: &FfiHttpRequest) -> Vec<(String, String)> {
        form_urlencoded::parse(c_str(req.body).as_bytes()).into_owned().collect()
    }

    fn parse(client: *const FfiCompilerClient, status: u16, body: &str) -> *mut FfiCompileResult {
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        compiler_parse_compile(client, &resp)
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client("http://localhost:3000/compile");
        assert!(!client.is_null());
        compiler_client_free(client);
    }

    #[test]
    fn client_new_all_null_uses_defaults() {
        let client = compiler_client_new(std::ptr::null(), std::ptr::null(), std::ptr::null());
        assert!(!client.is_null());

        let source = b"var i = 0;";
        let req = compiler_build_compile(client, source.as_ptr(), source.len());
        let req_ref = unsafe { &*req };
        assert_eq!(c_str(req_ref.url), "http://closure-compiler.appspot.com/compile");
        let fields = form_fields(req_ref);
        assert!(fields.contains(&("language".to_string(), "ECMASCRIPT5_STRICT".to_string())));
        assert!(fields.contains(&("compilation_level".to_string(), "WHITESPACE_ONLY".to_string())));

        compiler_free_request(req);
        compiler_client_free(client);
    }

    #[test]
    fn client_free_null_is_safe() {
        compiler_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_compile_returns_form_request() {
        let url = CString::new("http://localhost:3000/compile").unwrap();
        let lang = CString::new("ECMASCRIPT3").unwrap();
        let level = CString::new("SIMPLE_OPTIMIZATIONS").unwrap();
        let client = compiler_client_new(url.as_ptr(), lang.as_ptr(), level.as_ptr());

        let source = b"var i = 0 // test";
        let req = compiler_build_compile(client, source.as_ptr(), source.len());
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert_eq!(c_str(req_ref.url), "http://localhost:3000/compile");
        assert_eq!(req_ref.headers_len, 1);
        let header = unsafe { &*req_ref.headers };
        assert_eq!(c_str(header.key), "content-type");
        assert_eq!(c_str(header.value), "application/x-www-form-urlencoded");

        let fields = form_fields(req_ref);
        assert!(fields.contains(&("js_code".to_string(), "var i = 0 // test".to_string())));
        assert!(fields.contains(&("language".to_string(), "ECMASCRIPT3".to_string())));
        assert!(fields.contains(&("compilation_level".to_string(), "SIMPLE_OPTIMIZATIONS".to_string())));
        let infos: Vec<&str> = fields
            .iter()
            .filter(|(k, _)| k == "output_info")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(infos, vec!["compiled_code", "statistics", "warnings", "errors"]);

        compiler_free_request(req);
        compiler_client_free(client);
    }

    #[test]
    fn build_compile_null_empty_source() {
        let client = new_client("http://localhost:3000/compile");
        let req = compiler_build_compile(client, std::ptr::null(), 0);
        assert!(!req.is_null());
        let fields = form_fields(unsafe { &*req });
        assert!(fields.contains(&("js_code".to_string(), String::new())));

        compiler_free_request(req);
        compiler_client_free(client);
    }

    #[test]
    fn build_compile_null_source_with_len_returns_null() {
        let client = new_client("http://localhost:3000/compile");
        let req = compiler_build_compile(client, std::ptr::null(), 4);
        assert!(req.is_null());
        compiler_client_free(client);
    }

    #[test]
    fn build_compile_null_client_returns_null() {
        let req = compiler_build_compile(std::ptr::null(), b"1".as_ptr(), 1);
        assert!(req.is_null());
    }

    #[test]
    fn parse_compile_success() {
        let client = new_client("http://localhost:3000/compile");
        let result = parse(
            client,
            200,
            r#"{"compiledCode":"var i=0;","errors":[],"warnings":[],"serverErrors":null,"statistics":{"originalSize":17,"compressedSize":8,"compileTime":5}}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.http_status, 200);

        let output = unsafe { &*r.output };
        assert_eq!(c_str(output.compiled_code), "var i=0;");
        assert_eq!(output.errors_len, 0);
        assert!(output.errors.is_null());
        assert!(output.server_error.is_null());
        assert!(output.has_statistics);
        assert_eq!(output.statistics.original_size, 17);
        assert_eq!(output.statistics.compressed_size, 8);
        assert_eq!(output.statistics.compile_time, 5);

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn parse_compile_diagnostics() {
        let client = new_client("http://localhost:3000/compile");
        let result = parse(
            client,
            200,
            r#"{"compiledCode":"","errors":[{"charno":7,"error":"Parse error","lineno":1,"file":"Input_0","type":"JSC_PARSE_ERROR","line":"var i ="}],"warnings":[{"charno":0,"warning":"unused","lineno":2,"file":"Input_0","type":"JSC_UNUSED","line":null}]}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);

        let output = unsafe { &*r.output };
        assert_eq!(output.errors_len, 1);
        let errors = unsafe { std::slice::from_raw_parts(output.errors, output.errors_len as usize) };
        assert_eq!(c_str(errors[0].message), "Parse error");
        assert_eq!(c_str(errors[0].kind), "JSC_PARSE_ERROR");
        assert_eq!(c_str(errors[0].line), "var i =");
        assert_eq!(errors[0].charno, 7);

        let warnings = unsafe { std::slice::from_raw_parts(output.warnings, output.warnings_len as usize) };
        assert_eq!(c_str(warnings[0].message), "unused");
        assert!(warnings[0].line.is_null());
        assert!(!output.has_statistics);

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn parse_compile_server_error() {
        let client = new_client("http://localhost:3000/compile");
        let result = parse(client, 400, r#"{"serverErrors":{"code":400,"error":"bad request"}}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.http_status, 400);

        let output = unsafe { &*r.output };
        let server_error = unsafe { &*output.server_error };
        assert_eq!(server_error.code, 400);
        assert_eq!(c_str(server_error.error), "bad request");
        assert!(!output.has_statistics);

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn parse_compile_bad_json() {
        let client = new_client("http://localhost:3000/compile");
        let result = parse(client, 502, "<html>Bad Gateway</html>");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Decode);
        assert_eq!(r.http_status, 502);
        assert!(!r.error_message.is_null());
        assert!(r.output.is_null());

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn parse_compile_non_utf8_body_is_decode() {
        let client = new_client("http://localhost:3000/compile");
        let body = CString::new(vec![0xff, 0xfe, b'{', b'}']).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = compiler_parse_compile(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Decode);
        assert_eq!(r.http_status, 200);
        assert!(r.output.is_null());

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let result = parse(std::ptr::null(), 200, "{}");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(c_str(r.error_message), "null argument: client");

        compiler_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client("http://localhost:3000/compile");
        let result = compiler_parse_compile(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn compile_against_mock_server() {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });

        let client = new_client(&format!("http://{addr}/compile"));
        compiler_client_set_timeout(client, 10_000);
        let source = b"var i = 0 // test";
        let result = compiler_compile(client, source.as_ptr(), source.len());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.http_status, 200);
        let output = unsafe { &*r.output };
        assert_eq!(c_str(output.compiled_code), "var i=0");
        assert!(output.has_statistics);

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn compile_connection_refused_is_transport() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = new_client(&format!("http://{addr}/compile"));
        let result = compiler_compile(client, b"1".as_ptr(), 1);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Transport);
        assert!(r.output.is_null());

        compiler_free_result(result);
        compiler_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        compiler_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        compiler_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        compiler_free_string(std::ptr::null_mut());
    }
}
