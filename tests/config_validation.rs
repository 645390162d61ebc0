// tests/config_validation.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder, binding};
use crate::common::init_tracing;

use assetpipe::config::{
    ASSETS_GROUP, BUILD_GROUP, ConfigFile, GroupConfig, default_raw_config, parse_str,
};
use assetpipe::errors::PipelineError;
use assetpipe::types::{ReloadKind, TaskKind};

fn css_task() -> assetpipe::config::TaskConfig {
    TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build()
}

#[test]
fn built_in_layout_gets_default_groups_and_bindings() {
    init_tracing();
    let cfg = ConfigFile::try_from(default_raw_config()).expect("built-in config is valid");

    let build = cfg.groups().get(BUILD_GROUP).expect("build group");
    assert_eq!(build.series.as_deref(), Some(&["clean".to_string(), ASSETS_GROUP.to_string()][..]));

    let assets = cfg.groups().get(ASSETS_GROUP).expect("assets group");
    let members = assets.parallel.clone().expect("assets is parallel");
    assert_eq!(members, vec!["css", "fonts", "html", "images", "js"]);

    // One binding per transform, none for clean or lint tasks.
    let bound: Vec<&String> = cfg.bindings().keys().collect();
    assert_eq!(bound, vec!["css", "fonts", "html", "images", "js"]);
    assert_eq!(cfg.bindings()["css"].watch, vec!["src/css/**/*.css"]);
    assert_eq!(cfg.lint_tasks(), vec!["eslint", "stylelint"]);
}

#[test]
fn parses_toml_sections() {
    init_tracing();
    let raw = parse_str(
        r#"
        [config]
        dist = "public"
        sourcemaps = false

        [server]
        port = 4000

        [task.styles]
        kind = "sass"
        src = ["src/scss/**/*.scss"]
        dest = "public/css"
        reload = "reload"

        [task.wipe]
        kind = "clean"

        [group.build]
        series = ["wipe", "styles"]

        [watch.styles]
        watch = ["src/scss/**/*.scss"]
        run = "styles"
        queue = false
        use_hash = true
        "#,
    )
    .expect("valid toml");
    let cfg = ConfigFile::try_from(raw).expect("valid config");

    assert_eq!(cfg.settings().dist, "public");
    assert!(!cfg.settings().sourcemaps);
    assert_eq!(cfg.server().port, 4000);
    assert_eq!(cfg.server().host, "127.0.0.1");
    assert_eq!(cfg.task("styles").map(|t| t.effective_reload()), Some(ReloadKind::Reload));
    assert_eq!(cfg.task("wipe").map(|t| t.effective_reload()), Some(ReloadKind::None));

    let styles = &cfg.bindings()["styles"];
    assert!(!cfg.binding_queues(styles));
    assert!(styles.use_hash);
    // Declared groups are kept as written.
    assert_eq!(
        cfg.groups()[BUILD_GROUP].series.as_deref(),
        Some(&["wipe".to_string(), "styles".to_string()][..])
    );
}

#[test]
fn unknown_task_kind_is_a_toml_error() {
    let err = parse_str(
        r#"
        [task.x]
        kind = "coffee"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::TomlError(_)), "{err:?}");
}

#[test]
fn reload_kind_comes_from_the_task_section() {
    let raw = parse_str(
        r#"
        [task.styles]
        kind = "css"
        src = ["src/css/**/*.css"]
        dest = "dist/css"
        reload = "none"
        "#,
    )
    .expect("valid toml");
    let cfg = ConfigFile::try_from(raw).expect("valid config");
    assert_eq!(cfg.task("styles").map(|t| t.effective_reload()), Some(ReloadKind::None));

    let err = parse_str(
        r#"
        [task.styles]
        kind = "css"
        reload = "Inject"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::TomlError(_)), "{err:?}");
}

#[test]
fn empty_config_is_rejected() {
    let err = ConfigFileBuilder::new().try_build().unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn lint_task_in_group_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_task(
            "eslint",
            TaskConfigBuilder::new(TaskKind::Lint).src("src/js/**/*.js").build(),
        )
        .with_group("build", GroupConfig::series(["css", "eslint"]))
        .try_build()
        .unwrap_err();

    match err {
        PipelineError::ConfigError(msg) => assert!(msg.contains("lint task 'eslint'"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn group_cycle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_group("a", GroupConfig::series(["css", "b"]))
        .with_group("b", GroupConfig::parallel(["a"]))
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::GroupCycle(_)), "{err:?}");
}

#[test]
fn unknown_group_member_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_group("build", GroupConfig::series(["css", "missing"]))
        .try_build()
        .unwrap_err();
    match err {
        PipelineError::ConfigError(msg) => assert!(msg.contains("unknown member 'missing'"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn group_with_both_modes_is_rejected() {
    let group = GroupConfig {
        series: Some(vec!["css".to_string()]),
        parallel: Some(vec!["css".to_string()]),
    };
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_group("build", group)
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn duplicate_src_and_dest_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", css_task())
        .with_task("b", css_task())
        .try_build()
        .unwrap_err();
    match err {
        PipelineError::ConfigError(msg) => assert!(msg.contains("'a' and 'b'"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn transform_without_dest_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("css", TaskConfigBuilder::new(TaskKind::Css).src("src/**/*.css").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn bundle_without_entry_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("app", TaskConfigBuilder::new(TaskKind::Bundle).dest("dist/js").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn binding_must_target_a_runnable_non_lint_name() {
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_binding("styles", binding(&["src/**/*.css"], "nope"))
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");

    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_task(
            "eslint",
            TaskConfigBuilder::new(TaskKind::Lint).src("src/js/**/*.js").build(),
        )
        .with_binding("scripts", binding(&["src/js/**/*.js"], "eslint"))
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn dist_must_be_a_dedicated_directory() {
    let err = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .dist(".")
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
}

#[test]
fn declared_bindings_replace_the_derived_ones() {
    let cfg = ConfigFileBuilder::new()
        .with_task("css", css_task())
        .with_task(
            "js",
            TaskConfigBuilder::transform(TaskKind::Js, "src/js/**/*.js", "dist/js").build(),
        )
        .with_binding("everything", binding(&["src/**/*"], ASSETS_GROUP))
        .build();

    let names: Vec<&String> = cfg.bindings().keys().collect();
    assert_eq!(names, vec!["everything"]);
    assert!(cfg.is_runnable(ASSETS_GROUP));
    assert!(cfg.is_runnable(BUILD_GROUP));
}
