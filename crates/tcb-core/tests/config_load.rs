use std::fs;
use std::path::PathBuf;

use tcb_core::config::{BridgeConfig, DefaultParamStruct, DefaultParams};
use tcb_core::trace::TraceLevel;

#[test]
fn full_document_parses() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tcb.toml");
    fs::write(
        &path,
        r#"
plugin_name = "demo"
trace_level = "verbose"

[settings]
root = "C:\\archives"
"#,
    )
    .expect("write config");

    let config = BridgeConfig::load(&path).expect("config loads");
    assert_eq!(config.plugin_name, "demo");
    assert_eq!(config.trace_level, TraceLevel::Verbose);
    assert_eq!(config.setting("root"), Some("C:\\archives"));
    assert_eq!(config.setting("missing"), None);
}

#[test]
fn omitted_fields_take_defaults() {
    let config = BridgeConfig::from_toml_str("").expect("empty config");
    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.trace_level, TraceLevel::Info);
}

#[test]
fn parse_errors_carry_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "trace_level = \"loud\"").expect("write config");

    let err = BridgeConfig::load(&path).expect_err("unknown level");
    assert_eq!(err.code(), "tcb.config.parse");
    assert_eq!(
        err.info().context.get("path").map(String::as_str),
        Some(path.display().to_string().as_str())
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = BridgeConfig::load(&dir.path().join("absent.toml")).expect_err("missing file");
    assert_eq!(err.code(), "tcb.config.read");
}

#[test]
fn default_params_decode_version_and_ini_path() {
    let raw = DefaultParamStruct::new(2, 10, "C:\\tc\\wcx.ini");
    let params = unsafe { DefaultParams::read(&raw) }.expect("decodes");
    assert_eq!(params.interface_version, (2, 10));
    assert_eq!(params.default_ini, PathBuf::from("C:\\tc\\wcx.ini"));
}

#[test]
fn undersized_default_params_are_rejected() {
    let mut raw = DefaultParamStruct::new(2, 10, "x.ini");
    raw.size = 8;
    let err = unsafe { DefaultParams::read(&raw) }.expect_err("too small");
    assert_eq!(err.code(), "tcb.marshal.struct_size");
    let err = unsafe { DefaultParams::read(std::ptr::null()) }.expect_err("null");
    assert_eq!(err.code(), "tcb.marshal.missing_argument");
}
