//! Compile a one-line script with default options and print the outcome.
//!
//! Set `COMPILER_ENDPOINT` to point at a mock server instead of the public
//! service, and `RUST_LOG=debug` to see the request log.

use compilerapi_core::{CompilerClient, CompilerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = CompilerConfig::default();
    if let Ok(endpoint) = std::env::var("COMPILER_ENDPOINT") {
        config = config.with_endpoint(endpoint);
    }
    let client = CompilerClient::new(config);

    let output = client.compile(b"var i = 0 // test")?;
    if let Some(server_error) = &output.server_errors {
        tracing::error!(code = server_error.code, "{}", server_error.error);
    }
    for error in &output.errors {
        eprint!("{}", error.as_log_line());
    }
    for warning in &output.warnings {
        eprint!("{}", warning.as_log_line());
    }
    if let Some(stats) = output.statistics {
        tracing::info!(
            original_size = stats.original_size,
            compressed_size = stats.compressed_size,
            compile_time = stats.compile_time,
            "compiled"
        );
    }
    println!("{}", output.compiled_code);
    Ok(())
}
