//! Command-line argument parsing.
//!
//! Arguments are few enough to match by hand.

use crate::traits::JobTarget;

/// What to watch and how loudly.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchArgs {
    pub target: JobTarget,
    /// Number of `-v` flags seen
    pub verbosity: u8,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Start an analysis and follow its progress (default)
    Watch(WatchArgs),
    /// Arguments could not be understood
    Invalid(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// `--version` and `--help` win wherever they appear.
///
/// # Examples
///
/// ```
/// use analysis_progress::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["analysis-progress".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut repository: Option<String> = None;
    let mut commit: Option<String> = None;
    let mut verbosity: u8 = 0;

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--commit" | "-c" => match args.next() {
                Some(sha) if !sha.starts_with('-') => commit = Some(sha),
                _ => return CliCommand::Invalid("--commit needs a value".to_string()),
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            flag if flag.starts_with("-v") && flag[1..].chars().all(|c| c == 'v') => {
                let count = u8::try_from(flag.len() - 1).unwrap_or(u8::MAX);
                verbosity = verbosity.saturating_add(count);
            }
            flag if flag.starts_with('-') => {
                return CliCommand::Invalid(format!("unknown option: {}", flag));
            }
            positional => {
                if repository.is_some() {
                    return CliCommand::Invalid(format!("unexpected argument: {}", positional));
                }
                repository = Some(positional.to_string());
            }
        }
    }

    match repository {
        Some(repository) => {
            let mut target = JobTarget::new(repository);
            target.commit_sha = commit;
            CliCommand::Watch(WatchArgs { target, verbosity })
        }
        None => CliCommand::Invalid("missing <repository>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let mut all = vec!["analysis-progress".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["org/repo", "-V"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), CliCommand::Help);
        assert_eq!(parse(&["--help"]), CliCommand::Help);
    }

    #[test]
    fn test_parse_repository_only() {
        assert_eq!(
            parse(&["org/repo"]),
            CliCommand::Watch(WatchArgs {
                target: JobTarget::new("org/repo"),
                verbosity: 0,
            })
        );
    }

    #[test]
    fn test_parse_commit_and_verbosity() {
        assert_eq!(
            parse(&["-v", "org/repo", "--commit", "abc123", "-vv"]),
            CliCommand::Watch(WatchArgs {
                target: JobTarget::new("org/repo").with_commit("abc123"),
                verbosity: 3,
            })
        );
    }

    #[test]
    fn test_parse_missing_repository() {
        assert!(matches!(parse(&[]), CliCommand::Invalid(_)));
        assert!(matches!(parse(&["-v"]), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_commit_without_value() {
        assert!(matches!(parse(&["org/repo", "--commit"]), CliCommand::Invalid(_)));
        assert!(matches!(
            parse(&["org/repo", "--commit", "-v"]),
            CliCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["org/repo", "--unknown"]),
            CliCommand::Invalid("unknown option: --unknown".to_string())
        );
    }

    #[test]
    fn test_parse_second_positional() {
        assert!(matches!(parse(&["a", "b"]), CliCommand::Invalid(_)));
    }
}
