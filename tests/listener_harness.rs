use std::fs::File;
use std::io::Write;
use std::path::Path;

use scene_listener::config::ListenerConfig;
use scene_listener::harness::{load_fixture, run_fixture, run_fixture_with_config, HarnessOutput};
use tempfile::NamedTempFile;

const DOOR_AND_BUTTON: &str = "tests/fixtures/listener_harness/door_and_button.json";

#[test]
fn door_and_button_fixture_matches_golden() {
    assert_fixture_matches(DOOR_AND_BUTTON, "tests/fixtures/listener_harness/door_and_button.golden.json");
}

#[test]
fn fixture_is_stable_across_runs() {
    let fixture = load_fixture(DOOR_AND_BUTTON).expect("load fixture");
    let first = run_fixture(&fixture).expect("run fixture first time");
    let second = run_fixture(&fixture).expect("run fixture second time");
    assert_eq!(first, second, "the same fixture should produce identical output across runs");
}

#[test]
fn prewarmed_pool_reuses_instead_of_creating() {
    let mut config_file = NamedTempFile::new().expect("temp config");
    write!(config_file, r#"{{"pool":{{"prewarm_records":4,"prewarm_collections":2}}}}"#).expect("write config");
    let config = ListenerConfig::load(config_file.path()).expect("load config");

    let fixture = load_fixture(DOOR_AND_BUTTON).expect("load fixture");
    let cold = run_fixture(&fixture).expect("cold run");
    let warm = run_fixture_with_config(&fixture, &config).expect("warm run");

    assert_eq!(cold.steps, warm.steps, "prewarming must not change observable dispatch");
    assert_eq!(warm.pool.records_created, 20, "4 records per payload shape, nothing created on demand");
    assert_eq!(warm.pool.collections_created, 10);
    assert_eq!(warm.pool.records_reused, 8);
    assert_eq!(warm.pool.collections_reused, 4);
}

#[test]
fn cursor_config_changes_textures() {
    let mut config_file = NamedTempFile::new().expect("temp config");
    write!(config_file, r#"{{"cursor":{{"textures":["arrow.png","grab.png"],"initial":"normal"}}}}"#)
        .expect("write config");
    let config = ListenerConfig::load(config_file.path()).expect("load config");
    let fixture = load_fixture(DOOR_AND_BUTTON).expect("load fixture");
    let output = run_fixture_with_config(&fixture, &config).expect("run fixture");
    assert_eq!(output.initial_cursor, "arrow.png");
    assert_eq!(output.steps[14].cursor.as_deref(), Some("grab.png"));
    assert_eq!(output.steps[15].cursor, None);
}

#[test]
fn missing_fixture_reports_the_path() {
    let err = load_fixture("tests/fixtures/listener_harness/missing.json").unwrap_err();
    assert!(format!("{err:#}").contains("missing.json"));
}

fn assert_fixture_matches(fixture_path: &str, golden_path: &str) {
    let fixture = load_fixture(fixture_path).expect("load fixture");
    let output = run_fixture(&fixture).expect("run fixture");
    let golden_file = File::open(Path::new(golden_path)).expect("open golden");
    let golden: HarnessOutput = serde_json::from_reader(golden_file).expect("parse golden");
    assert_eq!(output, golden, "fixture {} diverged from golden {}", fixture_path, golden_path);
}
