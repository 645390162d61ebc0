// tests/cli.rs

use assetpipe::cli::{CliArgs, Command, DEFAULT_CONFIG};
use assetpipe::types::BuildMode;
use clap::Parser;

#[test]
fn no_subcommand_means_build() {
    let args = CliArgs::try_parse_from(["assetpipe"]).unwrap();
    assert_eq!(args.global.config, DEFAULT_CONFIG);
    assert!(args.command.is_none());
    assert!(matches!(
        args.command.unwrap_or_default(),
        Command::Build { once: false, group: None }
    ));
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let args = CliArgs::try_parse_from([
        "assetpipe",
        "build",
        "--once",
        "--group",
        "assets",
        "--production",
        "--config",
        "site/Assetpipe.toml",
    ])
    .unwrap();
    assert!(args.global.production);
    assert_eq!(args.global.config, "site/Assetpipe.toml");
    match args.command {
        Some(Command::Build { once, group }) => {
            assert!(once);
            assert_eq!(group.as_deref(), Some("assets"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn lint_fix_and_run_parse() {
    let args = CliArgs::try_parse_from(["assetpipe", "fix", "--task", "eslint"]).unwrap();
    assert!(matches!(args.command, Some(Command::Fix { task: Some(ref t) }) if t == "eslint"));

    let args = CliArgs::try_parse_from(["assetpipe", "run", "css", "--dry-run"]).unwrap();
    assert!(args.global.dry_run);
    assert!(matches!(args.command, Some(Command::Run { ref name }) if name == "css"));

    assert!(CliArgs::try_parse_from(["assetpipe", "run"]).is_err());
    assert!(CliArgs::try_parse_from(["assetpipe", "--log-level", "loud"]).is_err());
}

#[test]
fn production_flag_wins_over_environment() {
    assert_eq!(
        BuildMode::resolve(true, "ASSETPIPE_TEST_UNSET_VARIABLE"),
        BuildMode::Production
    );
    assert_eq!(
        BuildMode::resolve(false, "ASSETPIPE_TEST_UNSET_VARIABLE"),
        BuildMode::Development
    );
}
