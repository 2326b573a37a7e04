use std::io::Write;

use scene_listener::config::{ListenerConfig, ListenerConfigOverrides};
use scene_listener::{CursorState, PayloadKind, PoolHandle};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn partial_config_file_keeps_other_defaults() {
    let mut temp = NamedTempFile::new().expect("temp config");
    write!(temp, r#"{{"dispatch":{{"log_dispatch":true}},"cursor":{{"initial":"handle"}}}}"#).expect("write config");

    let config = ListenerConfig::load(temp.path()).expect("load config");
    assert!(config.dispatch.log_dispatch);
    assert_eq!(config.cursor.initial, CursorState::Handle);
    assert_eq!(config.pool, ListenerConfig::default().pool);
}

#[test]
fn missing_or_broken_config_falls_back_to_defaults() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("listener.json");
    assert!(ListenerConfig::load(&missing).is_err());
    assert_eq!(ListenerConfig::load_or_default(&missing), ListenerConfig::default());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").expect("write broken config");
    let err = ListenerConfig::load(&broken).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
    assert_eq!(ListenerConfig::load_or_default(&broken), ListenerConfig::default());
}

#[test]
fn cli_overrides_win_over_the_file() {
    let mut temp = NamedTempFile::new().expect("temp config");
    write!(temp, r#"{{"pool":{{"prewarm_records":2,"prewarm_collections":1}}}}"#).expect("write config");
    let mut config = ListenerConfig::load(temp.path()).expect("load config");

    let mut overrides = ListenerConfigOverrides::default();
    for (flag, value) in [("--prewarm-records", "6"), ("--log-dispatch", "on")] {
        overrides.apply_flag(flag, value).expect("override flag");
    }
    config.apply_overrides(&overrides);

    assert_eq!(config.pool.prewarm_records, 6);
    assert_eq!(config.pool.prewarm_collections, 1);
    assert!(config.dispatch.log_dispatch);
}

#[test]
fn pool_from_config_is_prewarmed_per_payload_shape() {
    let mut config = ListenerConfig::default();
    config.pool.prewarm_records = 3;
    config.pool.prewarm_collections = 2;
    let pool = PoolHandle::from_config(&config.pool);

    for kind in PayloadKind::ALL {
        let stats = pool.borrow().stats_for(kind);
        assert_eq!(stats.records_idle, 3, "{kind} records");
        assert_eq!(stats.collections_idle, 2, "{kind} collections");
    }
    assert_eq!(pool.stats().records_created, 15);
}
