// tests/logging_level.rs

use clap::Parser;
use tracing::Level;

use devloop::cli::{CliArgs, LogLevel};
use devloop::logging::resolve_level;

#[test]
fn cli_flag_wins_over_env() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
    assert_eq!(resolve_level(Some(LogLevel::Trace), None), Level::TRACE);
}

#[test]
fn env_value_is_used_without_flag() {
    assert_eq!(resolve_level(None, Some("warn")), Level::WARN);
    assert_eq!(resolve_level(None, Some(" Warning ")), Level::WARN);
    assert_eq!(resolve_level(None, Some("TRACE")), Level::TRACE);
}

#[test]
fn unknown_or_missing_env_defaults_to_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
}

#[test]
fn cli_flags_parse() {
    let args = CliArgs::try_parse_from([
        "devloop",
        "--project",
        "/srv/app",
        "--binary",
        "server",
        "--debounce-ms",
        "200",
        "--log-level",
        "debug",
        "--no-initial-build",
        "--dry-run",
    ])
    .expect("valid flags");

    assert_eq!(args.project.as_deref(), Some("/srv/app"));
    assert_eq!(args.binary.as_deref(), Some("server"));
    assert_eq!(args.debounce_ms, Some(200));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.no_initial_build);
    assert!(args.dry_run);
    assert!(args.config.is_none());
}

#[test]
fn cli_rejects_bad_values() {
    assert!(CliArgs::try_parse_from(["devloop", "--debounce-ms", "soon"]).is_err());
    assert!(CliArgs::try_parse_from(["devloop", "--log-level", "loud"]).is_err());
}
