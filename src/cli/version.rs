//! Version and usage text.

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "\
Start a repository analysis and follow its progress.

Usage: analysis-progress <repository> [--commit <sha>] [-v...]

Options:
  -c, --commit <sha>  Analyse a specific commit
  -v, --verbose       More log output (repeat for more)
  -h, --help          Print help
  -V, --version       Print version

Environment:
  ANALYSIS_API_URL             Server base URL (default http://localhost:8000)
  ANALYSIS_API_TOKEN           Bearer token
  ANALYSIS_MAX_RETRIES         Reconnect attempts (default 5)
  ANALYSIS_INITIAL_DELAY_MS    First reconnect delay (default 1000)
  ANALYSIS_MAX_DELAY_MS        Reconnect delay cap (default 30000)
  ANALYSIS_BACKOFF_MULTIPLIER  Delay growth factor (default 2.0)
  RUST_LOG                     Log filter, overrides -v";

/// Version line printed by `--version`.
pub fn version_line() -> String {
    format!("analysis-progress {}", VERSION)
}
