//! Terminal front end.
//!
//! # Usage
//!
//! The dispatcher is called first thing in `main()`; only `Watch` falls
//! through to the async part:
//!
//! ```ignore
//! use analysis_progress::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_cli_command(&command) {
//!     if let Err(e) = result {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(2);
//!     }
//!     std::process::exit(0);
//! }
//! ```

pub mod args;
pub mod follow;
pub mod report;
pub mod version;

pub use args::{parse_args, CliCommand, WatchArgs};
pub use follow::{follow, FollowOutcome};
pub use report::progress_line;
pub use version::{version_line, USAGE, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;

/// Run a CLI command if applicable.
///
/// # Returns
///
/// * `None` - If the command is `Watch` (the caller starts the analysis)
/// * `Some(Ok(()))` - If an informational command was printed
/// * `Some(Err(e))` - If the arguments were invalid
pub fn run_cli_command(command: &CliCommand) -> Option<Result<()>> {
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            Some(Ok(()))
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(Ok(()))
        }
        CliCommand::Invalid(reason) => Some(Err(eyre!("{}\n\n{}", reason, USAGE))),
        CliCommand::Watch(_) => None,
    }
}
