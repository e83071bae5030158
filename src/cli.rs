use anyhow::{bail, Result};
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub dry_run: bool,
    pub json: bool,
    pub config: Option<PathBuf>,
    pub help: bool,
}

/// Parse process arguments (without the program name).
///
/// Supported forms:
///   jira-mirror
///   jira-mirror --dry-run
///   jira-mirror --json --config ./mirror.toml
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--dry-run" => parsed.dry_run = true,
            "--json" => parsed.json = true,
            "-c" | "--config" => {
                i += 1;
                match args.get(i) {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => bail!("Missing value for -c/--config flag"),
                }
            }
            "-h" | "--help" | "help" => parsed.help = true,
            other => bail!("Unknown argument: {other}\n\nRun `jira-mirror --help` for usage."),
        }
        i += 1;
    }

    Ok(parsed)
}

pub fn print_help() {
    println!("jira-mirror — mirror open Jira issues into GitHub issues\n");
    println!("USAGE:");
    println!("  jira-mirror [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -n, --dry-run        Plan the sync without writing to GitHub");
    println!("      --json           Print the run report as JSON");
    println!("  -c, --config <path>  Read settings from a TOML file (default ~/.jira-mirror/config.toml)");
    println!("  -h, --help           Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("  JIRA_BASE_URL, JIRA_EMAIL, JIRA_API_TOKEN, JIRA_PROJECT_KEY   required");
    println!("  GITHUB_TOKEN, GITHUB_REPOSITORY (owner/name)                  required");
    println!("  JIRA_EPIC_FIELD, GITHUB_API_URL                               optional");
    println!("  SYNC_REQUEST_TIMEOUT_SECS, SYNC_MAX_RETRIES,");
    println!("  SYNC_RETRY_BASE_DELAY_MS, SYNC_CONCURRENCY                    optional");
    println!("  RUST_LOG                                                      log filter (default info)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_is_a_plain_sync() {
        assert_eq!(parse_args(&args(&[])).unwrap(), CliArgs::default());
    }

    #[test]
    fn parse_dry_run_short_and_long() {
        assert!(parse_args(&args(&["-n"])).unwrap().dry_run);
        assert!(parse_args(&args(&["--dry-run"])).unwrap().dry_run);
    }

    #[test]
    fn parse_config_path_and_json() {
        let parsed = parse_args(&args(&["--json", "--config", "mirror.toml"])).unwrap();
        assert!(parsed.json);
        assert_eq!(parsed.config, Some(PathBuf::from("mirror.toml")));
        assert!(!parsed.dry_run);
    }

    #[test]
    fn parse_missing_config_value_fails() {
        let result = parse_args(&args(&["-c"]));
        assert!(result.unwrap_err().to_string().contains("Missing value"));
    }

    #[test]
    fn parse_unknown_flag_fails() {
        let result = parse_args(&args(&["--force"]));
        assert!(result.unwrap_err().to_string().contains("Unknown argument: --force"));
    }

    #[test]
    fn parse_help() {
        assert!(parse_args(&args(&["help"])).unwrap().help);
        assert!(parse_args(&args(&["-h"])).unwrap().help);
    }
}
