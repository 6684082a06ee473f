//! Loading `RenderLoopConfig` from TOML.

use std::io::Write;

use lumen_layout::Alignment;
use lumen_runtime::{ConfigError, RenderLoopConfig};

#[test]
fn partial_file_keeps_defaults() {
    let config = RenderLoopConfig::from_toml_str(
        r#"
        status_bar_height = 2
        escape_releases_focus = false
        status_bar_alignment = "center"
        "#,
    )
    .unwrap();

    assert_eq!(config.status_bar_height, 2);
    assert!(!config.escape_releases_focus);
    assert_eq!(config.status_bar_alignment, Alignment::Center);
    assert!(config.autofocus);
    assert_eq!(config.reset_code, "\x1b[0m");
}

#[test]
fn empty_file_is_default() {
    assert_eq!(
        RenderLoopConfig::from_toml_str("").unwrap(),
        RenderLoopConfig::default()
    );
}

#[test]
fn loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "background_code = \"\\u001b[48;5;235m\"").unwrap();
    writeln!(file, "tab_navigation = false").unwrap();

    let config = RenderLoopConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.background_code, "\x1b[48;5;235m");
    assert!(!config.tab_navigation);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RenderLoopConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)), "{err}");
}

#[test]
fn bad_syntax_is_toml_error() {
    let err = RenderLoopConfig::from_toml_str("status_bar_height = [").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn wrong_type_is_toml_error() {
    let err = RenderLoopConfig::from_toml_str("autofocus = \"yes\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let err = RenderLoopConfig::from_toml_str(
        r#"
        status_bar_height = 99
        background_code = "red"
        "#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors[0].contains("status_bar_height"));
            assert!(errors[1].contains("background_code"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn serialized_config_loads_back() {
    let config = RenderLoopConfig::default()
        .status_bar_height(3)
        .dim_main_content(true)
        .status_bar_alignment(Alignment::Trailing);
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("status_bar_alignment = \"trailing\""), "{text}");
    assert_eq!(RenderLoopConfig::from_toml_str(&text).unwrap(), config);
}
